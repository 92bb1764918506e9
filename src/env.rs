use fnv::FnvHashMap;
use tracing::trace;

use crate::rt::Value;

/// The state of a declared variable.
/// `None` means it was declared without an initializer and nothing has been assigned to it yet.
pub type Binding = Option<Value>;

#[derive(Debug, Clone, Default)]
struct Scope {
    symbols: FnvHashMap<String, Binding>,
}

impl Scope {
    fn find_symbol(&self, identifier: &str) -> Option<&Binding> {
        self.symbols.get(identifier)
    }

    fn find_symbol_mut(&mut self, identifier: &str) -> Option<&mut Binding> {
        self.symbols.get_mut(identifier)
    }

    fn declare_symbol(&mut self, identifier: &str, binding: Binding) {
        self.symbols.insert(identifier.to_owned(), binding);
    }
}

/// A stack of scopes.
///
/// Identifiers are owned since the environment outlives the source it was built from when running a REPL.
#[derive(Debug, Clone)]
pub struct Environment {
    // INVARIANT: The first scope is the global one, it is always present
    scopes: Vec<Scope>,
}

impl Environment {
    pub fn new() -> Self {
        Environment {
            scopes: vec![Scope::default()],
        }
    }

    /// Declares `identifier` in the innermost scope, replacing any binding it already had there.
    pub fn define(&mut self, identifier: &str, binding: Binding) {
        self.current_scope().declare_symbol(identifier, binding);
    }

    /// Finds the nearest binding of `identifier`, searching from the innermost scope outward.
    pub fn get(&self, identifier: &str) -> Option<&Binding> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.find_symbol(identifier))
    }

    pub fn get_mut(&mut self, identifier: &str) -> Option<&mut Binding> {
        self.scopes
            .iter_mut()
            .rev()
            .find_map(|scope| scope.find_symbol_mut(identifier))
    }

    pub fn push_scope(&mut self) {
        self.scopes.push(Scope::default());
        trace!(depth = self.depth(), "entered scope");
    }

    /// Leaves the innermost scope. The global scope is never popped.
    pub fn pop_scope(&mut self) {
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
        trace!(depth = self.depth(), "left scope");
    }

    /// How many scopes are nested above the global one.
    pub fn depth(&self) -> usize {
        self.scopes.len() - 1
    }

    /// Drops every scope but the global one.
    pub fn unwind(&mut self) {
        self.scopes.truncate(1);
    }

    fn current_scope(&mut self) -> &mut Scope {
        let last = self.scopes.len() - 1;
        &mut self.scopes[last]
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}
