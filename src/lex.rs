use std::{fmt::Display, iter::Peekable, str::CharIndices};

use tracing::{debug, trace};

use crate::{
    report::{ErrorReporter, Positioned},
    span::SourcePosition,
    LoxNumber,
};

#[derive(Debug, Clone)]
pub struct Lexer<'src> {
    source_data: &'src str,
    source: Peekable<CharIndices<'src>>,
    line: u32,
    column: u32,
    // Where the token currently being scanned started
    token_line: u32,
    token_column: u32,
}

type Lexed<'src> = Result<Option<Token<'src>>, LexError<'src>>;

impl<'src> Lexer<'src> {
    pub fn new(source: &'src str) -> Self {
        Lexer {
            source_data: source,
            source: source.char_indices().peekable(),
            line: 1,
            column: 0,
            token_line: 1,
            token_column: 0,
        }
    }

    /// Lexes the whole source, sending every error to `reporter`.
    /// No tokens are returned if a single error was found.
    pub fn scan(self, reporter: &mut ErrorReporter) -> Option<Vec<TokenInfo<'src>>> {
        let (tokens, errors) = self.lex();

        if errors.is_empty() {
            debug!(tokens = tokens.len(), "lexed source");
            Some(tokens)
        } else {
            debug!(errors = errors.len(), "lexing failed");
            for error in &errors {
                reporter.report(error);
            }
            None
        }
    }

    pub fn lex(mut self) -> (Vec<TokenInfo<'src>>, Vec<LexError<'src>>) {
        let mut tokens = Vec::new();
        let mut errors = Vec::new();

        loop {
            // Mark the token start before consuming its first character
            self.token_line = self.line;
            self.token_column = self.column;

            let Some((start, c)) = self.advance() else {
                break;
            };

            match self.process_char(start, c) {
                Ok(Some(token)) => {
                    let end = self.offset();
                    let info = TokenInfo {
                        token,
                        lexeme: &self.source_data[start..end],
                        position: self.position(),
                    };
                    trace!(%info, "token");
                    tokens.push(info);
                }
                Ok(None) => {}
                Err(error) => {
                    errors.push(error);
                }
            }
        }

        (tokens, errors)
    }

    fn process_char(&mut self, start: usize, c: char) -> Lexed<'src> {
        match c {
            // Single characters
            '(' => Ok(Some(Token::LeftParen)),
            ')' => Ok(Some(Token::RightParen)),
            '{' => Ok(Some(Token::LeftBrace)),
            '}' => Ok(Some(Token::RightBrace)),
            ',' => Ok(Some(Token::Comma)),
            '.' => Ok(Some(Token::Dot)),
            ';' => Ok(Some(Token::Semicolon)),
            '+' => Ok(Some(Token::Plus)),
            '-' => Ok(Some(Token::Minus)),
            '*' => Ok(Some(Token::Star)),
            '?' => Ok(Some(Token::Question)),
            ':' => Ok(Some(Token::Colon)),

            // One to two characters
            '!' if self.chase('=') => Ok(Some(Token::BangEqual)),
            '!' => Ok(Some(Token::Bang)),

            '=' if self.chase('=') => Ok(Some(Token::EqualEqual)),
            '=' => Ok(Some(Token::Equal)),

            '<' if self.chase('=') => Ok(Some(Token::LessEqual)),
            '<' => Ok(Some(Token::Less)),

            '>' if self.chase('=') => Ok(Some(Token::GreaterEqual)),
            '>' => Ok(Some(Token::Greater)),

            // Single-line comment
            '/' if self.chase('/') => {
                self.consume_while(|c| *c != '\n');
                Ok(None)
            }
            // Multi-line comment, does not nest
            '/' if self.chase('*') => {
                while let Some((_, c)) = self.advance() {
                    if c == '*' && self.chase('/') {
                        break;
                    }
                }
                Ok(None)
            }
            '/' => Ok(Some(Token::Slash)),

            '"' => self.string(start),

            c if c.is_ascii_digit() => self.number(start),

            // Newlines are accounted for by `advance`
            c if c.is_whitespace() => Ok(None),

            // Identifiers | Keywords
            c if c.is_ascii_alphabetic() || c == '_' => {
                self.consume_while(Self::is_valid_for_identifier);
                let end = self.offset();
                let identifier = &self.source_data[start..end];

                Ok(Some(
                    Self::as_keyword(identifier).unwrap_or(Token::Identifier(identifier)),
                ))
            }

            character => Err(LexError::UnexpectedCharacter {
                character,
                position: self.position(),
            }),
        }
    }

    fn string(&mut self, start: usize) -> Lexed<'src> {
        // Strings may span several lines and have no escape sequences
        self.consume_while(|c| *c != '"');

        match self.advance() {
            Some((end, _)) => Ok(Some(Token::String(&self.source_data[start + 1..end]))),
            None => Err(LexError::UnterminatedString {
                position: SourcePosition::new(
                    self.token_line,
                    self.token_line,
                    self.token_column,
                    self.token_column + 1,
                ),
            }),
        }
    }

    fn number(&mut self, start: usize) -> Lexed<'src> {
        self.consume_while(char::is_ascii_digit);

        // A trailing dot is not part of the number
        if self.peek() == Some('.') && self.peek_next().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
            self.consume_while(char::is_ascii_digit);
        }

        let end = self.offset();
        let lexeme = &self.source_data[start..end];
        match lexeme.parse::<LoxNumber>() {
            Ok(number) if number.is_finite() => Ok(Some(Token::Number(number))),
            Ok(_) => Err(LexError::NumberOutOfRange {
                lexeme,
                position: self.position(),
            }),
            // Digits with an optional fraction always parse, so this only fires if scanning changes
            Err(_) => Err(LexError::InvalidNumber {
                lexeme,
                position: self.position(),
            }),
        }
    }

    fn advance(&mut self) -> Option<(usize, char)> {
        let next = self.source.next();
        if let Some((_, c)) = next {
            self.track(c);
        }
        next
    }

    fn advance_if(&mut self, f: impl Fn(&char) -> bool) -> Option<(usize, char)> {
        let next = self.source.next_if(|(_, c)| f(c));
        if let Some((_, c)) = next {
            self.track(c);
        }
        next
    }

    fn track(&mut self, c: char) {
        if c == '\n' {
            self.line += 1;
            self.column = 0;
        } else {
            self.column += 1;
        }
    }

    fn chase(&mut self, expected: char) -> bool {
        self.advance_if(|c| *c == expected).is_some()
    }

    fn consume_while(&mut self, f: impl Fn(&char) -> bool) {
        while self.advance_if(&f).is_some() {}
    }

    fn peek(&mut self) -> Option<char> {
        self.source.peek().map(|(_, c)| *c)
    }

    fn peek_next(&mut self) -> Option<char> {
        let data = self.source_data;
        self.source
            .peek()
            .and_then(|&(i, c)| data[i + c.len_utf8()..].chars().next())
    }

    /// Byte offset of the next unconsumed character.
    fn offset(&mut self) -> usize {
        self.source
            .peek()
            .map_or(self.source_data.len(), |(i, _)| *i)
    }

    /// The span from the start of the current token up to the cursor.
    fn position(&self) -> SourcePosition {
        SourcePosition::new(self.token_line, self.line, self.token_column, self.column)
    }

    fn as_keyword(text: &str) -> Option<Token<'src>> {
        match text {
            "and" => Some(Token::And),
            "class" => Some(Token::Class),
            "else" => Some(Token::Else),
            "false" => Some(Token::False),
            "for" => Some(Token::For),
            "fun" => Some(Token::Fun),
            "if" => Some(Token::If),
            "nil" => Some(Token::Nil),
            "or" => Some(Token::Or),
            "print" => Some(Token::Print),
            "return" => Some(Token::Return),
            "super" => Some(Token::Super),
            "this" => Some(Token::This),
            "true" => Some(Token::True),
            "var" => Some(Token::Var),
            "while" => Some(Token::While),
            _ => None,
        }
    }

    fn is_valid_for_identifier(c: &char) -> bool {
        c.is_ascii_alphanumeric() || *c == '_'
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Token<'src> {
    // One character
    LeftParen,
    RightParen,
    LeftBrace,
    RightBrace,
    Comma,
    Dot,
    Minus,
    Plus,
    Semicolon,
    Slash,
    Star,
    Question,
    Colon,
    Bang,
    Equal,
    Greater,
    Less,
    // Two characters
    BangEqual,
    EqualEqual,
    GreaterEqual,
    LessEqual,
    // Literals
    Identifier(&'src str),
    String(&'src str),
    Number(LoxNumber),
    // Keywords
    And,
    Class,
    Else,
    False,
    Fun,
    For,
    If,
    Nil,
    Or,
    Print,
    Return,
    Super,
    This,
    True,
    Var,
    While,
}

/// A token together with the text it was lexed from and where that text is.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct TokenInfo<'src> {
    pub token: Token<'src>,
    pub lexeme: &'src str,
    pub position: SourcePosition,
}

impl<'src> Display for TokenInfo<'src> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "\"{}\" @ {}", self.lexeme, self.position)
    }
}

#[derive(Debug, Clone, Copy, thiserror::Error)]
pub enum LexError<'src> {
    #[error("Unterminated string.")]
    UnterminatedString { position: SourcePosition },

    #[error("Invalid number literal \"{lexeme}\".")]
    InvalidNumber {
        lexeme: &'src str,
        position: SourcePosition,
    },

    #[error("Number literal \"{lexeme}\" is out of range.")]
    NumberOutOfRange {
        lexeme: &'src str,
        position: SourcePosition,
    },

    #[error("Unexpected character '{character}'.")]
    UnexpectedCharacter {
        character: char,
        position: SourcePosition,
    },
}

impl<'src> Positioned for LexError<'src> {
    fn position(&self) -> Option<SourcePosition> {
        match self {
            LexError::UnterminatedString { position }
            | LexError::InvalidNumber { position, .. }
            | LexError::NumberOutOfRange { position, .. }
            | LexError::UnexpectedCharacter { position, .. } => Some(*position),
        }
    }
}

#[cfg(test)]
mod tests {
    use expect_test::expect;

    use super::*;

    fn tokens(source: &str) -> Vec<Token> {
        let (tokens, errors) = Lexer::new(source).lex();
        assert!(errors.is_empty(), "unexpected errors: {errors:?}");
        tokens.into_iter().map(|info| info.token).collect()
    }

    #[test]
    fn empty_sources() {
        assert!(tokens("").is_empty());
        assert!(tokens("\n    \t  \x0B \n\n\n       \r \n \n").is_empty());
        assert!(tokens("// nothing here\n/* nor\nhere */  // or here").is_empty());
    }

    #[test]
    fn unterminated_block_comment_runs_to_the_end() {
        assert_eq!(tokens("1 /* open\n2"), vec![Token::Number(1.0)]);
        assert!(tokens("/* open").is_empty());
    }

    #[test]
    fn comma_separated_sums() {
        assert_eq!(
            tokens("1 + 2, 2 + 1"),
            vec![
                Token::Number(1.0),
                Token::Plus,
                Token::Number(2.0),
                Token::Comma,
                Token::Number(2.0),
                Token::Plus,
                Token::Number(1.0),
            ]
        );
    }

    #[test]
    fn maximal_munch() {
        assert_eq!(
            tokens("! != = == < <= > >= ?:"),
            vec![
                Token::Bang,
                Token::BangEqual,
                Token::Equal,
                Token::EqualEqual,
                Token::Less,
                Token::LessEqual,
                Token::Greater,
                Token::GreaterEqual,
                Token::Question,
                Token::Colon,
            ]
        );
    }

    #[test]
    fn strings() {
        assert_eq!(tokens("\"\""), vec![Token::String("")]);
        assert_eq!(tokens("\"ok\""), vec![Token::String("ok")]);
        assert_eq!(
            tokens("\"hello\n\nworld\""),
            vec![Token::String("hello\n\nworld")]
        );
        // No escape sequences
        assert_eq!(tokens(r#""a\n""#), vec![Token::String(r"a\n")]);
    }

    #[test]
    fn unterminated_string() {
        let (tokens, errors) = Lexer::new("print \"test\n").lex();
        assert_eq!(tokens.len(), 1);
        assert_eq!(errors.len(), 1);
        assert!(matches!(
            errors[0],
            LexError::UnterminatedString {
                position: SourcePosition {
                    start_line: 1,
                    start_col: 6,
                    ..
                }
            }
        ));
    }

    #[test]
    fn numbers() {
        assert_eq!(
            tokens("123\n0\n1.23\n0.00123"),
            vec![
                Token::Number(123.0),
                Token::Number(0.0),
                Token::Number(1.23),
                Token::Number(0.00123),
            ]
        );
    }

    #[test]
    fn trailing_dot_is_not_part_of_a_number() {
        assert_eq!(
            tokens("12.;1.x"),
            vec![
                Token::Number(12.0),
                Token::Dot,
                Token::Semicolon,
                Token::Number(1.0),
                Token::Dot,
                Token::Identifier("x"),
            ]
        );
    }

    #[test]
    fn numbers_round_trip() {
        for text in ["0", "7", "42.5", "3.14159", "1000000", "0.1", "123456789.987654321"] {
            let expected: f64 = text.parse().unwrap();
            assert_eq!(tokens(text), vec![Token::Number(expected)], "{text}");
        }
    }

    #[test]
    fn number_overflow() {
        let huge = format!("1{}.0", "0".repeat(400));
        let (tokens, errors) = Lexer::new(&huge).lex();
        assert!(tokens.is_empty());
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], LexError::NumberOutOfRange { .. }));
    }

    #[test]
    fn keywords_and_identifiers() {
        assert_eq!(
            tokens("var _x1 = nil; print true and false or this;"),
            vec![
                Token::Var,
                Token::Identifier("_x1"),
                Token::Equal,
                Token::Nil,
                Token::Semicolon,
                Token::Print,
                Token::True,
                Token::And,
                Token::False,
                Token::Or,
                Token::This,
                Token::Semicolon,
            ]
        );
        assert_eq!(tokens("printer"), vec![Token::Identifier("printer")]);
    }

    #[test]
    fn unexpected_characters_are_all_collected() {
        let (tokens, errors) = Lexer::new("1 @ 2 # 3").lex();
        assert_eq!(tokens.len(), 3);
        let messages: Vec<String> = errors.iter().map(ToString::to_string).collect();
        assert_eq!(
            messages,
            ["Unexpected character '@'.", "Unexpected character '#'."]
        );
    }

    #[test]
    fn positions() {
        let (tokens, _) = Lexer::new("var x = 10;\n/* a\nb */ print \"a\nb\";").lex();
        let dump = tokens
            .iter()
            .map(|info| {
                let p = info.position;
                format!(
                    "{:?} {}:{}-{}:{}",
                    info.lexeme, p.start_line, p.start_col, p.end_line, p.end_col
                )
            })
            .collect::<Vec<_>>()
            .join("\n");

        expect![[r#"
            "var" 1:0-1:3
            "x" 1:4-1:5
            "=" 1:6-1:7
            "10" 1:8-1:10
            ";" 1:10-1:11
            "print" 3:5-3:10
            "\"a\nb\"" 3:11-4:2
            ";" 4:2-4:3"#]]
        .assert_eq(&dump);
    }
}
