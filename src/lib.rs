pub mod ast;
pub mod env;
pub mod lex;
pub mod lox;
pub mod report;
pub mod rt;
pub mod span;

pub use lox::Lox;

/// The representation used by all Lox numbers and their arithmetic operations.
pub type LoxNumber = f64;
