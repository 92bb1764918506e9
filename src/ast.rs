use core::slice::Iter;
use std::{fmt::Display, iter::Peekable};

use tracing::debug;

use crate::{
    lex::{Token, TokenInfo},
    report::{ErrorReporter, Positioned},
    span::SourcePosition,
    LoxNumber,
};

/// How deeply expressions and blocks may nest before the parser gives up.
pub const MAX_NESTING: usize = 256;

/// A literal value in the Lox language.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Literal<'a> {
    Number(LoxNumber),
    String(&'a str),
    True,
    False,
    Nil,
}

/// The unary operators in the Lox language.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum UnaryOp {
    Minus,
    LogicalNot,
}

impl<'a> From<&Token<'a>> for UnaryOp {
    /// Constructs a `UnaryOp` from it's equivalent `Token` counterpart.
    /// Panics if the token is not a valid unary operator.
    fn from(token: &Token<'a>) -> Self {
        match token {
            Token::Minus => UnaryOp::Minus,
            Token::Bang => UnaryOp::LogicalNot,
            _ => unreachable!("Invalid token for unary operator"),
        }
    }
}

impl Display for UnaryOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UnaryOp::Minus => write!(f, "-"),
            UnaryOp::LogicalNot => write!(f, "!"),
        }
    }
}

/// The binary operators in the Lox language.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BinaryOp {
    // Relational
    Equal,
    NotEqual,
    GreaterThan,
    GreaterThanEqual,
    LessThan,
    LessThanEqual,
    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    // Sequencing
    Comma,
}

impl BinaryOp {
    /// Describes the operands the operator accepts, for error messages.
    pub fn expected_operands(&self) -> &'static str {
        match self {
            BinaryOp::Add => "two numbers or two strings",
            BinaryOp::Equal | BinaryOp::NotEqual | BinaryOp::Comma => "any values",
            _ => "numbers",
        }
    }
}

impl<'a> From<&Token<'a>> for BinaryOp {
    /// Constructs a `BinaryOp` from it's equivalent `Token` counterpart.
    /// Panics if the token is not a valid binary operator.
    fn from(token: &Token<'a>) -> Self {
        match token {
            Token::BangEqual => BinaryOp::NotEqual,
            Token::EqualEqual => BinaryOp::Equal,
            Token::Greater => BinaryOp::GreaterThan,
            Token::GreaterEqual => BinaryOp::GreaterThanEqual,
            Token::Less => BinaryOp::LessThan,
            Token::LessEqual => BinaryOp::LessThanEqual,
            Token::Plus => BinaryOp::Add,
            Token::Minus => BinaryOp::Sub,
            Token::Star => BinaryOp::Mul,
            Token::Slash => BinaryOp::Div,
            Token::Comma => BinaryOp::Comma,
            _ => unreachable!("Invalid token for binary operator"),
        }
    }
}

impl Display for BinaryOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let symbol = match self {
            BinaryOp::Equal => "==",
            BinaryOp::NotEqual => "!=",
            BinaryOp::GreaterThan => ">",
            BinaryOp::GreaterThanEqual => ">=",
            BinaryOp::LessThan => "<",
            BinaryOp::LessThanEqual => "<=",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Comma => ",",
        };
        write!(f, "{symbol}")
    }
}

/// An expression in the Lox language.
///
/// Nodes that may fail at runtime keep a reference to the token they came from, so that errors can
/// point back at the source. Those tokens are owned by the lexer's output, which must outlive the tree.
#[derive(Debug, Clone)]
pub enum Expr<'a> {
    /// A literal value.
    Literal(Literal<'a>),

    /// An identifier referring to an in-scope variable.
    Variable { identifier: &'a TokenInfo<'a> },

    /// A parenthesised expression.
    Grouping(Box<Expr<'a>>),

    /// An assignment to an existing variable.
    Assignment {
        identifier: &'a TokenInfo<'a>,
        expr: Box<Expr<'a>>,
    },

    /// A binary operation. Includes relational and arithmetic operations, and the comma operator.
    Binary {
        left: Box<Expr<'a>>,
        op: BinaryOp,
        operator: &'a TokenInfo<'a>,
        right: Box<Expr<'a>>,
    },

    /// A unary operation. Includes negation and logical NOT.
    Unary {
        op: UnaryOp,
        operator: &'a TokenInfo<'a>,
        expr: Box<Expr<'a>>,
    },

    /// The conditional `condition ? then_branch : else_branch` operator.
    Ternary {
        condition: Box<Expr<'a>>,
        then_branch: Box<Expr<'a>>,
        else_branch: Box<Expr<'a>>,
    },
}

pub type Block<'a> = Vec<Stmt<'a>>;

#[derive(Debug, Clone)]
pub struct VarDecl<'a> {
    pub identifier: &'a TokenInfo<'a>,
    pub expr: Option<Expr<'a>>,
}

/// A statement in the Lox language.
#[derive(Debug, Clone)]
pub enum Stmt<'a> {
    /// An expression statement, evaluated for its side effects.
    Expr(Expr<'a>),

    /// The `print` statement.
    /// Appends the stringified result of the expression to the program output.
    Print(Expr<'a>),

    /// The `var`iable declaration statement.
    /// Inserts a new symbol in the current scope with an optional initial value. Without one the symbol
    /// is left uninitialized (not `nil`) and reading it is an error until something is assigned to it.
    VarDecl(VarDecl<'a>),

    /// A block of statements that get executed in a new scope.
    Block(Block<'a>),
}

/// Where a syntax error was found: at a token, or past the last one.
#[derive(Debug, Clone, Copy)]
pub enum Location<'a> {
    Token(&'a TokenInfo<'a>),
    End(SourcePosition),
}

impl<'a> Location<'a> {
    pub fn position(&self) -> SourcePosition {
        match self {
            Location::Token(info) => info.position,
            Location::End(position) => *position,
        }
    }
}

impl<'a> Display for Location<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Location::Token(info) => write!(f, "at \"{}\"", info.lexeme),
            Location::End(_) => write!(f, "at end"),
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ParseError<'a> {
    #[error("Expected ';' after {after} {found}.")]
    ExpectedSemicolon {
        after: &'static str,
        found: Location<'a>,
    },

    #[error("Expected ')' after expression {0}.")]
    UnmatchedParens(Location<'a>),

    #[error("Expected ':' after expression {0}.")]
    MissingColon(Location<'a>),

    #[error("Expected '}}' after block {0}.")]
    UnclosedBlock(Location<'a>),

    #[error("Expected variable name {0}.")]
    ExpectedIdentifier(Location<'a>),

    #[error("Expected expression {0}.")]
    ExpectedExpression(Location<'a>),

    #[error("Invalid assignment target.")]
    InvalidAssignment(&'a TokenInfo<'a>),

    #[error("Nesting is deeper than {max} levels {0}.", max = MAX_NESTING)]
    TooDeep(Location<'a>),
}

impl<'a> Positioned for ParseError<'a> {
    fn position(&self) -> Option<SourcePosition> {
        match self {
            ParseError::ExpectedSemicolon { found, .. } => Some(found.position()),
            ParseError::UnmatchedParens(location)
            | ParseError::MissingColon(location)
            | ParseError::UnclosedBlock(location)
            | ParseError::ExpectedIdentifier(location)
            | ParseError::ExpectedExpression(location)
            | ParseError::TooDeep(location) => Some(location.position()),
            ParseError::InvalidAssignment(equal) => Some(equal.position),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Parser<'a> {
    tokens: Peekable<Iter<'a, TokenInfo<'a>>>,
    previous: Option<&'a TokenInfo<'a>>,
    // Reported by errors found after the last token
    end: SourcePosition,
    depth: usize,
}

/// Takes the parser and a pattern, consuming and returning the next token if it matches the pattern - otherwise returns where the next token is.
macro_rules! chase {
    ($parser:expr, $pattern:pat $(if $guard:expr)? $(,)?) => {{
        if let Some(info) = $parser
            .tokens
            .next_if(|next| matches!(next.token, $pattern $(if $guard)?))
        {
            $parser.previous = Some(info);
            Found(info)
        } else {
            NotFound($parser.location())
        }
    }};
}

/// The type returned by the `chase!` macro.
enum Chased<'a> {
    Found(&'a TokenInfo<'a>),
    NotFound(Location<'a>),
}
use Chased::*;

type ParseStmt<'a> = Result<Stmt<'a>, ParseError<'a>>;
type ParseExpr<'a> = Result<Expr<'a>, ParseError<'a>>;

impl<'a> Parser<'a> {
    pub fn new(tokens: &'a [TokenInfo<'a>]) -> Self {
        let end = tokens.last().map_or(SourcePosition::new(1, 1, 0, 0), |info| {
            info.position.collapsed_at_end()
        });

        Parser {
            tokens: tokens.iter().peekable(),
            previous: None,
            end,
            depth: 0,
        }
    }

    /// Parses every declaration, sending each syntax error to `reporter`.
    /// No statements are returned if a single error was found.
    pub fn parse_with(self, reporter: &mut ErrorReporter) -> Option<Vec<Stmt<'a>>> {
        let (statements, errors) = self.parse();

        if errors.is_empty() {
            debug!(statements = statements.len(), "parsed program");
            Some(statements)
        } else {
            for error in &errors {
                reporter.report(error);
            }
            None
        }
    }

    /// Parses every declaration, recovering after each syntax error at the next statement boundary.
    pub fn parse(mut self) -> (Vec<Stmt<'a>>, Vec<ParseError<'a>>) {
        let mut statements = Vec::new();
        let mut errors = Vec::new();

        while self.tokens.peek().is_some() {
            if let Err(error) = self.parse_declaration(&mut statements) {
                debug!(%error, "synchronizing after syntax error");
                errors.push(error);
                self.synchronize();
            }
        }

        (statements, errors)
    }

    /// Parses a declaration into `statements`.
    /// A `var` declaring several names produces one statement per name.
    fn parse_declaration(&mut self, statements: &mut Vec<Stmt<'a>>) -> Result<(), ParseError<'a>> {
        match chase!(self, Token::Var) {
            Found(_) => self.parse_var_decl(statements),
            NotFound(_) => {
                statements.push(self.parse_statement()?);
                Ok(())
            }
        }
    }

    fn parse_var_decl(&mut self, statements: &mut Vec<Stmt<'a>>) -> Result<(), ParseError<'a>> {
        loop {
            let identifier = match chase!(self, Token::Identifier(_)) {
                Found(info) => info,
                NotFound(location) => return Err(ParseError::ExpectedIdentifier(location)),
            };

            let expr = if let Found(_) = chase!(self, Token::Equal) {
                Some(self.parse_assignment()?)
            } else {
                None
            };

            statements.push(Stmt::VarDecl(VarDecl { identifier, expr }));

            if let NotFound(_) = chase!(self, Token::Comma) {
                break;
            }
        }

        match chase!(self, Token::Semicolon) {
            Found(_) => Ok(()),
            NotFound(found) => Err(ParseError::ExpectedSemicolon {
                after: "variable declaration",
                found,
            }),
        }
    }

    fn parse_statement(&mut self) -> ParseStmt<'a> {
        match chase!(self, Token::Print | Token::LeftBrace) {
            Found(TokenInfo {
                token: Token::Print,
                ..
            }) => self.parse_print(),
            Found(_) => self.parse_block(),
            NotFound(_) => self.parse_expr(),
        }
    }

    fn parse_print(&mut self) -> ParseStmt<'a> {
        let expr = self.parse_expression()?;

        match chase!(self, Token::Semicolon) {
            Found(_) => Ok(Stmt::Print(expr)),
            NotFound(found) => Err(ParseError::ExpectedSemicolon {
                after: "value",
                found,
            }),
        }
    }

    fn parse_block(&mut self) -> ParseStmt<'a> {
        self.nested(|parser| {
            let mut statements = Vec::new();
            loop {
                match chase!(parser, Token::RightBrace) {
                    Found(_) => return Ok(Stmt::Block(statements)),
                    NotFound(location @ Location::End(_)) => {
                        return Err(ParseError::UnclosedBlock(location))
                    }
                    NotFound(_) => parser.parse_declaration(&mut statements)?,
                }
            }
        })
    }

    fn parse_expr(&mut self) -> ParseStmt<'a> {
        let expr = self.parse_expression()?;

        match chase!(self, Token::Semicolon) {
            Found(_) => Ok(Stmt::Expr(expr)),
            NotFound(found) => Err(ParseError::ExpectedSemicolon {
                after: "expression",
                found,
            }),
        }
    }

    fn parse_expression(&mut self) -> ParseExpr<'a> {
        self.nested(|parser| {
            let expr = parser.parse_assignment()?;

            match chase!(parser, Token::Comma) {
                Found(operator) => {
                    let right = parser.parse_expression()?;
                    Ok(Expr::Binary {
                        left: Box::new(expr),
                        op: BinaryOp::Comma,
                        operator,
                        right: Box::new(right),
                    })
                }
                NotFound(_) => Ok(expr),
            }
        })
    }

    fn parse_assignment(&mut self) -> ParseExpr<'a> {
        self.nested(|parser| {
            let expr = parser.parse_ternary()?;

            match chase!(parser, Token::Equal) {
                Found(equal) => {
                    let Expr::Variable { identifier } = expr else {
                        return Err(ParseError::InvalidAssignment(equal));
                    };

                    let value = parser.parse_assignment()?;
                    Ok(Expr::Assignment {
                        identifier,
                        expr: Box::new(value),
                    })
                }
                NotFound(_) => Ok(expr),
            }
        })
    }

    fn parse_ternary(&mut self) -> ParseExpr<'a> {
        let mut expr = self.parse_equality()?;

        while let Found(_) = chase!(self, Token::Question) {
            let then_branch = self.parse_assignment()?;

            if let NotFound(location) = chase!(self, Token::Colon) {
                return Err(ParseError::MissingColon(location));
            }

            let else_branch = self.parse_assignment()?;
            expr = Expr::Ternary {
                condition: Box::new(expr),
                then_branch: Box::new(then_branch),
                else_branch: Box::new(else_branch),
            };
        }

        Ok(expr)
    }

    fn parse_equality(&mut self) -> ParseExpr<'a> {
        let mut expr = self.parse_comparison()?;

        while let Found(operator) = chase!(self, Token::BangEqual | Token::EqualEqual) {
            let right = self.parse_comparison()?;
            expr = Self::binary(expr, operator, right);
        }

        Ok(expr)
    }

    fn parse_comparison(&mut self) -> ParseExpr<'a> {
        let mut expr = self.parse_term()?;

        while let Found(operator) = chase!(
            self,
            Token::Greater | Token::GreaterEqual | Token::Less | Token::LessEqual
        ) {
            let right = self.parse_term()?;
            expr = Self::binary(expr, operator, right);
        }

        Ok(expr)
    }

    fn parse_term(&mut self) -> ParseExpr<'a> {
        let mut expr = self.parse_factor()?;

        while let Found(operator) = chase!(self, Token::Minus | Token::Plus) {
            let right = self.parse_factor()?;
            expr = Self::binary(expr, operator, right);
        }

        Ok(expr)
    }

    fn parse_factor(&mut self) -> ParseExpr<'a> {
        let mut expr = self.parse_unary()?;

        while let Found(operator) = chase!(self, Token::Slash | Token::Star) {
            let right = self.parse_unary()?;
            expr = Self::binary(expr, operator, right);
        }

        Ok(expr)
    }

    fn parse_unary(&mut self) -> ParseExpr<'a> {
        if let Found(operator) = chase!(self, Token::Bang | Token::Minus) {
            return self.nested(|parser| {
                let right = parser.parse_unary()?;
                Ok(Expr::Unary {
                    op: UnaryOp::from(&operator.token),
                    operator,
                    expr: Box::new(right),
                })
            });
        }

        self.parse_primary()
    }

    fn parse_primary(&mut self) -> ParseExpr<'a> {
        match chase!(
            self,
            Token::Number(_)
                | Token::String(_)
                | Token::Identifier(_)
                | Token::True
                | Token::False
                | Token::Nil
                | Token::LeftParen
        ) {
            Found(info) => match info.token {
                Token::Number(num) => Ok(Expr::Literal(Literal::Number(num))),
                Token::String(str) => Ok(Expr::Literal(Literal::String(str))),
                Token::Identifier(_) => Ok(Expr::Variable { identifier: info }),
                Token::True => Ok(Expr::Literal(Literal::True)),
                Token::False => Ok(Expr::Literal(Literal::False)),
                Token::Nil => Ok(Expr::Literal(Literal::Nil)),
                Token::LeftParen => {
                    let expr = self.parse_expression()?;
                    match chase!(self, Token::RightParen) {
                        Found(_) => Ok(Expr::Grouping(Box::new(expr))),
                        NotFound(location) => Err(ParseError::UnmatchedParens(location)),
                    }
                }
                _ => unreachable!(),
            },
            NotFound(location) => Err(ParseError::ExpectedExpression(location)),
        }
    }

    fn binary(left: Expr<'a>, operator: &'a TokenInfo<'a>, right: Expr<'a>) -> Expr<'a> {
        Expr::Binary {
            left: Box::new(left),
            op: BinaryOp::from(&operator.token),
            operator,
            right: Box::new(right),
        }
    }

    /// Runs `f` one nesting level deeper, failing once `MAX_NESTING` is reached.
    fn nested<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T, ParseError<'a>>,
    ) -> Result<T, ParseError<'a>> {
        if self.depth >= MAX_NESTING {
            return Err(ParseError::TooDeep(self.location()));
        }

        self.depth += 1;
        let result = f(self);
        self.depth -= 1;

        result
    }

    fn location(&mut self) -> Location<'a> {
        match self.tokens.peek() {
            Some(&info) => Location::Token(info),
            None => Location::End(self.end),
        }
    }

    fn advance(&mut self) {
        if let Some(info) = self.tokens.next() {
            self.previous = Some(info);
        }
    }

    fn synchronize(&mut self) {
        // Skip the token the error was found at
        self.advance();

        // Then consume tokens until either a semicolon was passed or the beginning of a statement is next
        while let Some(info) = self.tokens.peek() {
            if let Some(TokenInfo {
                token: Token::Semicolon,
                ..
            }) = self.previous
            {
                return;
            }

            if Self::begins_statement(&info.token) {
                return;
            }

            self.advance();
        }
    }

    fn begins_statement(token: &Token) -> bool {
        matches!(
            token,
            Token::Class
                | Token::Fun
                | Token::Var
                | Token::For
                | Token::If
                | Token::While
                | Token::Print
                | Token::Return
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lex::Lexer;

    /// Prints an expression as a fully parenthesised s-expression.
    fn sexpr(expr: &Expr) -> String {
        match expr {
            Expr::Literal(Literal::Number(n)) => n.to_string(),
            Expr::Literal(Literal::String(s)) => format!("{s:?}"),
            Expr::Literal(Literal::True) => "true".to_string(),
            Expr::Literal(Literal::False) => "false".to_string(),
            Expr::Literal(Literal::Nil) => "nil".to_string(),
            Expr::Variable { identifier } => identifier.lexeme.to_string(),
            Expr::Grouping(expr) => format!("(group {})", sexpr(expr)),
            Expr::Assignment { identifier, expr } => {
                format!("(= {} {})", identifier.lexeme, sexpr(expr))
            }
            Expr::Binary {
                left, op, right, ..
            } => format!("({op} {} {})", sexpr(left), sexpr(right)),
            Expr::Unary { op, expr, .. } => format!("({op} {})", sexpr(expr)),
            Expr::Ternary {
                condition,
                then_branch,
                else_branch,
            } => format!(
                "(? {} {} {})",
                sexpr(condition),
                sexpr(then_branch),
                sexpr(else_branch)
            ),
        }
    }

    fn sstmt(stmt: &Stmt) -> String {
        match stmt {
            Stmt::Expr(expr) => format!("(expr {})", sexpr(expr)),
            Stmt::Print(expr) => format!("(print {})", sexpr(expr)),
            Stmt::VarDecl(VarDecl { identifier, expr }) => match expr {
                Some(expr) => format!("(var {} {})", identifier.lexeme, sexpr(expr)),
                None => format!("(var {})", identifier.lexeme),
            },
            Stmt::Block(statements) => {
                let inner: Vec<String> = statements.iter().map(sstmt).collect();
                format!("(block {})", inner.join(" "))
            }
        }
    }

    /// Parses `source`, returning the printed statements and the error messages.
    fn parse(source: &str) -> (Vec<String>, Vec<String>) {
        let (tokens, errors) = Lexer::new(source).lex();
        assert!(errors.is_empty(), "lexing failed: {errors:?}");

        let (statements, errors) = Parser::new(&tokens).parse();
        (
            statements.iter().map(sstmt).collect(),
            errors.iter().map(ToString::to_string).collect(),
        )
    }

    fn parse_ok(source: &str) -> Vec<String> {
        let (statements, errors) = parse(source);
        assert!(errors.is_empty(), "parsing failed: {errors:?}");
        statements
    }

    #[test]
    fn precedence_and_associativity() {
        assert_eq!(
            parse_ok("1 + 2 * 3 - 4 / -5;"),
            ["(expr (- (+ 1 (* 2 3)) (/ 4 (- 5))))"]
        );
        assert_eq!(
            parse_ok("1 < 2 == 3 >= 4 != !true;"),
            ["(expr (!= (== (< 1 2) (>= 3 4)) (! true)))"]
        );
        assert_eq!(parse_ok("(1 + 2) * 3;"), ["(expr (* (group (+ 1 2)) 3))"]);
    }

    #[test]
    fn comma_expression() {
        assert_eq!(
            parse_ok("1 + 2, 2 + 1;"),
            ["(expr (, (+ 1 2) (+ 2 1)))"]
        );
        assert_eq!(parse_ok("a, b, c;"), ["(expr (, a (, b c)))"]);
    }

    #[test]
    fn ternary_is_right_associative() {
        assert_eq!(
            parse_ok("a ? b : c ? d : e;"),
            ["(expr (? a b (? c d e)))"]
        );
        assert_eq!(
            parse_ok("x = a == b ? \"yes\" : nil;"),
            ["(expr (= x (? (== a b) \"yes\" nil)))"]
        );
    }

    #[test]
    fn assignment_is_right_associative() {
        assert_eq!(parse_ok("a = b = 3;"), ["(expr (= a (= b 3)))"]);
        assert_eq!(
            parse_ok("c ? a = 1 : b = 2;"),
            ["(expr (? c (= a 1) (= b 2)))"]
        );
    }

    #[test]
    fn declarations_and_blocks() {
        assert_eq!(
            parse_ok("var a = 1, b, c = a; { var a = 2; print a; } print \"s\";"),
            [
                "(var a 1)",
                "(var b)",
                "(var c a)",
                "(block (var a 2) (print a))",
                "(print \"s\")",
            ]
        );
        assert_eq!(parse_ok("{}"), ["(block )"]);
    }

    #[test]
    fn declaration_initializers_stop_at_commas() {
        assert_eq!(parse_ok("var a = 1, b = 2;"), ["(var a 1)", "(var b 2)"]);
    }

    #[test]
    fn invalid_assignment_target() {
        let (_, errors) = parse("1 + a = 3;");
        assert_eq!(errors, ["Invalid assignment target."]);

        let (_, errors) = parse("(a) = 3;");
        assert_eq!(errors, ["Invalid assignment target."]);
    }

    #[test]
    fn missing_semicolon_at_end() {
        let source = "print \"missing semicolon\"";
        let (tokens, _) = Lexer::new(source).lex();
        let (statements, errors) = Parser::new(&tokens).parse();

        assert!(statements.is_empty());
        assert_eq!(errors.len(), 1);
        assert_eq!(
            errors[0].to_string(),
            "Expected ';' after value at end."
        );
        assert_eq!(
            errors[0].position(),
            Some(SourcePosition::new(1, 1, 25, 25))
        );
    }

    #[test]
    fn structural_errors() {
        assert_eq!(parse("(1 + 2;").1, ["Expected ')' after expression at \";\"."]);
        assert_eq!(parse("a ? b;").1, ["Expected ':' after expression at \";\"."]);
        assert_eq!(parse("{ print 1;").1, ["Expected '}' after block at end."]);
        assert_eq!(parse("var 1;").1, ["Expected variable name at \"1\"."]);
        assert_eq!(parse("var a = 1").1, ["Expected ';' after variable declaration at end."]);
        assert_eq!(parse("if;").1, ["Expected expression at \"if\"."]);
    }

    #[test]
    fn recovers_at_statement_boundaries() {
        let (statements, errors) = parse("print 1 +; print 2; var = 3; print 4;");

        assert_eq!(statements, ["(print 2)", "(print 4)"]);
        assert_eq!(
            errors,
            [
                "Expected expression at \";\".",
                "Expected variable name at \"=\".",
            ]
        );
    }

    #[test]
    fn recovers_before_a_statement_keyword() {
        let (statements, errors) = parse("1 + * 2 print 3;");

        assert_eq!(statements, ["(print 3)"]);
        assert_eq!(errors, ["Expected expression at \"*\"."]);
    }

    #[test]
    fn reports_excessive_nesting() {
        // Debug builds need more than the default test stack to get this deep
        let handle = std::thread::Builder::new()
            .stack_size(16 * 1024 * 1024)
            .spawn(|| {
                let source =
                    format!("{}1{};", "(".repeat(MAX_NESTING), ")".repeat(MAX_NESTING));
                let (statements, errors) = parse(&source);

                assert!(statements.is_empty());
                assert!(errors[0].starts_with("Nesting is deeper than 256 levels"));

                let source = format!("{}1; print 1;", "-".repeat(MAX_NESTING * 2));
                let (statements, errors) = parse(&source);
                assert_eq!(statements, ["(print 1)"]);
                assert_eq!(errors.len(), 1);
            })
            .unwrap();

        handle.join().unwrap();
    }

    #[test]
    fn empty_program() {
        assert!(parse_ok("").is_empty());
        assert!(parse_ok("// only a comment").is_empty());
    }
}
