use std::fmt::Display;

use tracing::{debug, trace};

use crate::{
    ast::{BinaryOp, Expr, Literal, Stmt, UnaryOp, VarDecl},
    env::Environment,
    lex::TokenInfo,
    report::{ErrorReporter, Positioned},
    span::SourcePosition,
    LoxNumber,
};

/// A runtime representation of a Lox value.
///
/// Equality is structural: values of different types are never equal, and numbers compare as IEEE floats
/// so `NaN` is not equal to itself.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// A Lox boolean.
    Bool(bool),

    /// A Lox number.
    Number(LoxNumber),

    /// A Lox string.
    String(String),

    /// The Lox `nil` value.
    Nil,
}

impl Value {
    fn add(&self, right: &Value) -> Option<Value> {
        use Value::*;
        match (self, right) {
            (Number(a), Number(b)) => Some(Number(a + b)),
            (String(a), String(b)) => Some(String(format!("{a}{b}"))),
            _ => None,
        }
    }

    fn sub(&self, right: &Value) -> Option<Value> {
        self.arithmetic(right, |a, b| a - b)
    }

    fn mul(&self, right: &Value) -> Option<Value> {
        self.arithmetic(right, |a, b| a * b)
    }

    fn div(&self, right: &Value) -> Option<Value> {
        // Dividing by zero yields an infinity or NaN, as floats do
        self.arithmetic(right, |a, b| a / b)
    }

    fn arithmetic(&self, right: &Value, f: fn(LoxNumber, LoxNumber) -> LoxNumber) -> Option<Value> {
        match (self, right) {
            (Value::Number(a), Value::Number(b)) => Some(Value::Number(f(*a, *b))),
            _ => None,
        }
    }

    fn greater_than(&self, right: &Value) -> Option<bool> {
        self.compare(right, |a, b| a > b)
    }

    fn greater_than_equal(&self, right: &Value) -> Option<bool> {
        self.compare(right, |a, b| a >= b)
    }

    fn less_than(&self, right: &Value) -> Option<bool> {
        self.compare(right, |a, b| a < b)
    }

    fn less_than_equal(&self, right: &Value) -> Option<bool> {
        self.compare(right, |a, b| a <= b)
    }

    fn compare(&self, right: &Value, f: fn(&LoxNumber, &LoxNumber) -> bool) -> Option<bool> {
        match (self, right) {
            (Value::Number(a), Value::Number(b)) => Some(f(a, b)),
            _ => None,
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Bool(b) => *b,
            Value::Nil => false,
            _ => true,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Nil => "nil",
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Bool(true) => write!(f, "TRUE"),
            Value::Bool(false) => write!(f, "FALSE"),
            Value::Number(n) if n.is_nan() => write!(f, "nan"),
            Value::Number(n) if n.is_infinite() => write!(f, "{n}"),
            Value::Number(n) => write!(f, "{n:.6}"),
            Value::String(s) => write!(f, "{s}"),
            Value::Nil => write!(f, "NIL"),
        }
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum RuntimeError<'a> {
    #[error("Operand of '{op}' must be a number, found {found}.")]
    InvalidOperand {
        op: UnaryOp,
        found: &'static str,
        operator: &'a TokenInfo<'a>,
    },

    #[error("Operands of '{op}' must be {expected}, found {left} and {right}.")]
    InvalidOperands {
        op: BinaryOp,
        expected: &'static str,
        left: &'static str,
        right: &'static str,
        operator: &'a TokenInfo<'a>,
    },

    #[error("Undeclared variable '{}'.", .identifier.lexeme)]
    UndeclaredVariable { identifier: &'a TokenInfo<'a> },

    #[error("Undefined variable '{}', it was declared without a value.", .identifier.lexeme)]
    UninitializedVariable { identifier: &'a TokenInfo<'a> },
}

impl<'a> Positioned for RuntimeError<'a> {
    fn position(&self) -> Option<SourcePosition> {
        match self {
            RuntimeError::InvalidOperand { operator, .. }
            | RuntimeError::InvalidOperands { operator, .. } => Some(operator.position),
            RuntimeError::UndeclaredVariable { identifier }
            | RuntimeError::UninitializedVariable { identifier } => Some(identifier.position),
        }
    }
}

type Execution<'a> = Result<(), RuntimeError<'a>>;
type Evaluation<'a> = Result<Value, RuntimeError<'a>>;

/// Our tree-walk interpreter.
///
/// The environment persists between runs, so a REPL can keep using what earlier lines declared.
#[derive(Debug, Clone, Default)]
pub struct TreeWalker {
    environment: Environment,
    output: Vec<String>,
}

impl TreeWalker {
    pub fn new() -> Self {
        Self {
            environment: Environment::new(),
            output: Vec::new(),
        }
    }

    /// Runs `statements`, sending the first runtime error to `reporter`.
    /// Returns every printed line, or `None` on failure, in which case the lines printed before it are left
    /// in place for `take_output`.
    pub fn interpret<'a>(
        &mut self,
        statements: &[Stmt<'a>],
        reporter: &mut ErrorReporter,
    ) -> Option<Vec<String>> {
        self.output.clear();

        match self.execute(statements) {
            Ok(()) => Some(self.take_output()),
            Err(error) => {
                debug!(%error, printed = self.output.len(), "runtime error");
                reporter.report(&error);
                None
            }
        }
    }

    pub fn execute<'a>(&mut self, statements: &[Stmt<'a>]) -> Execution<'a> {
        for statement in statements {
            self.execute_statement(statement)?;
        }
        Ok(())
    }

    /// Takes the lines printed so far.
    pub fn take_output(&mut self) -> Vec<String> {
        std::mem::take(&mut self.output)
    }

    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    /// Drops any scope left open by a run that did not finish, keeping the globals.
    pub fn unwind(&mut self) {
        self.environment.unwind();
    }

    fn execute_statement<'a>(&mut self, statement: &Stmt<'a>) -> Execution<'a> {
        match statement {
            Stmt::Expr(expr) => self.execute_expression(expr),
            Stmt::Print(expr) => self.execute_print(expr),
            Stmt::VarDecl(var_decl) => self.execute_var_decl(var_decl),
            Stmt::Block(statements) => self.execute_block(statements),
        }
    }

    fn execute_expression<'a>(&mut self, expr: &Expr<'a>) -> Execution<'a> {
        self.evaluate_expression(expr)?;
        Ok(())
    }

    fn execute_print<'a>(&mut self, expr: &Expr<'a>) -> Execution<'a> {
        let value = self.evaluate_expression(expr)?;
        trace!(%value, "print");
        self.output.push(value.to_string());
        Ok(())
    }

    fn execute_var_decl<'a>(&mut self, var_decl: &VarDecl<'a>) -> Execution<'a> {
        let value = var_decl
            .expr
            .as_ref()
            .map(|expr| self.evaluate_expression(expr))
            .transpose()?;

        self.environment.define(var_decl.identifier.lexeme, value);
        Ok(())
    }

    fn execute_block<'a>(&mut self, statements: &[Stmt<'a>]) -> Execution<'a> {
        self.environment.push_scope();
        let result = self.execute(statements);
        self.environment.pop_scope();

        result
    }

    fn evaluate_expression<'a>(&mut self, expr: &Expr<'a>) -> Evaluation<'a> {
        match expr {
            Expr::Literal(literal) => Ok(self.evaluate_literal(literal)),
            Expr::Variable { identifier } => self.evaluate_variable(*identifier),
            Expr::Grouping(expr) => self.evaluate_expression(expr),
            Expr::Assignment { identifier, expr } => self.evaluate_assignment(*identifier, expr),
            Expr::Binary {
                left,
                op,
                operator,
                right,
            } => self.evaluate_binary(left, *op, *operator, right),
            Expr::Unary { op, operator, expr } => self.evaluate_unary(*op, *operator, expr),
            Expr::Ternary {
                condition,
                then_branch,
                else_branch,
            } => self.evaluate_ternary(condition, then_branch, else_branch),
        }
    }

    fn evaluate_literal(&self, literal: &Literal) -> Value {
        match literal {
            Literal::Nil => Value::Nil,
            Literal::False => Value::Bool(false),
            Literal::True => Value::Bool(true),
            Literal::Number(n) => Value::Number(*n),
            Literal::String(s) => Value::String(s.to_string()),
        }
    }

    fn evaluate_variable<'a>(&self, identifier: &'a TokenInfo<'a>) -> Evaluation<'a> {
        match self.environment.get(identifier.lexeme) {
            Some(Some(value)) => Ok(value.clone()),
            Some(None) => Err(RuntimeError::UninitializedVariable { identifier }),
            None => Err(RuntimeError::UndeclaredVariable { identifier }),
        }
    }

    fn evaluate_assignment<'a>(
        &mut self,
        identifier: &'a TokenInfo<'a>,
        expr: &Expr<'a>,
    ) -> Evaluation<'a> {
        let value = self.evaluate_expression(expr)?;

        match self.environment.get_mut(identifier.lexeme) {
            Some(binding) => {
                *binding = Some(value.clone());
                Ok(value)
            }
            None => Err(RuntimeError::UndeclaredVariable { identifier }),
        }
    }

    fn evaluate_binary<'a>(
        &mut self,
        left: &Expr<'a>,
        op: BinaryOp,
        operator: &'a TokenInfo<'a>,
        right: &Expr<'a>,
    ) -> Evaluation<'a> {
        let left = self.evaluate_expression(left)?;
        let right = self.evaluate_expression(right)?;

        let result = match op {
            // The left value is only evaluated for its side effects
            BinaryOp::Comma => Some(right.clone()),

            // Relational
            BinaryOp::Equal => Some(Value::Bool(left == right)),
            BinaryOp::NotEqual => Some(Value::Bool(left != right)),
            BinaryOp::GreaterThan => left.greater_than(&right).map(Value::Bool),
            BinaryOp::GreaterThanEqual => left.greater_than_equal(&right).map(Value::Bool),
            BinaryOp::LessThan => left.less_than(&right).map(Value::Bool),
            BinaryOp::LessThanEqual => left.less_than_equal(&right).map(Value::Bool),

            // Arithmetic
            BinaryOp::Add => left.add(&right),
            BinaryOp::Sub => left.sub(&right),
            BinaryOp::Mul => left.mul(&right),
            BinaryOp::Div => left.div(&right),
        };

        result.ok_or_else(|| RuntimeError::InvalidOperands {
            op,
            expected: op.expected_operands(),
            left: left.type_name(),
            right: right.type_name(),
            operator,
        })
    }

    fn evaluate_unary<'a>(
        &mut self,
        op: UnaryOp,
        operator: &'a TokenInfo<'a>,
        expr: &Expr<'a>,
    ) -> Evaluation<'a> {
        let value = self.evaluate_expression(expr)?;
        match op {
            UnaryOp::Minus => match value {
                Value::Number(n) => Ok(Value::Number(-n)),
                value => Err(RuntimeError::InvalidOperand {
                    op,
                    found: value.type_name(),
                    operator,
                }),
            },
            UnaryOp::LogicalNot => Ok(Value::Bool(!value.is_truthy())),
        }
    }

    fn evaluate_ternary<'a>(
        &mut self,
        condition: &Expr<'a>,
        then_branch: &Expr<'a>,
        else_branch: &Expr<'a>,
    ) -> Evaluation<'a> {
        if self.evaluate_expression(condition)?.is_truthy() {
            self.evaluate_expression(then_branch)
        } else {
            self.evaluate_expression(else_branch)
        }
    }
}
