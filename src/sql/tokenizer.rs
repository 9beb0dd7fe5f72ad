//! Lexical analysis
//!
//! Turns a query string into a token sequence terminated by an end-of-input
//! token. Tokenizing never fails outright: unrecognised characters and
//! unterminated strings are reported as lexical diagnostics and scanning
//! carries on with the rest of the input.
//!
//! # Example
//! ```
//! use minisql::sql::tokenizer::tokenize;
//!
//! let tokenized = tokenize("SELECT name FROM users;");
//! assert!(tokenized.diagnostics.is_empty());
//! assert_eq!(tokenized.tokens.len(), 6);
//! ```

use super::diagnostic::CompilerDiagnostic;
use super::token::{Keyword, Operator, Position, Punctuation, Token, TokenKind};
use regex::Regex;
use std::sync::OnceLock;
use tracing::{debug, info};

fn number_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    // The fraction is only taken when a digit follows the dot.
    PATTERN.get_or_init(|| Regex::new(r"^[0-9]+(\.[0-9]+)?").expect("valid number pattern"))
}

fn word_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*").expect("valid word pattern"))
}

/// Output of the tokenizer: the tokens plus any lexical diagnostics
#[derive(Debug, Clone, Default)]
pub struct Tokenized {
    pub tokens: Vec<Token>,
    pub diagnostics: Vec<CompilerDiagnostic>,
}

impl Tokenized {
    pub fn has_errors(&self) -> bool {
        !self.diagnostics.is_empty()
    }
}

/// Converts a SQL string into a vector of tokens
pub fn tokenize(source: &str) -> Tokenized {
    let tokenized = Tokenizer::new(source).run();
    info!(
        "Lexical analysis: {} token(s), {} error(s)",
        tokenized.tokens.len(),
        tokenized.diagnostics.len()
    );
    tokenized
}

struct Tokenizer<'a> {
    source: &'a str,
    offset: usize,
    line: usize,
    column: usize,
    tokens: Vec<Token>,
    diagnostics: Vec<CompilerDiagnostic>,
}

impl<'a> Tokenizer<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            offset: 0,
            line: 1,
            column: 1,
            tokens: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    fn run(mut self) -> Tokenized {
        while let Some(c) = self.peek() {
            let start = self.position();
            match c {
                ' ' | '\t' | '\r' | '\n' => {
                    self.advance();
                }
                '*' => self.punctuation(Punctuation::Star, start),
                ',' => self.punctuation(Punctuation::Comma, start),
                ';' => self.punctuation(Punctuation::Semicolon, start),
                '(' => self.punctuation(Punctuation::LeftParen, start),
                ')' => self.punctuation(Punctuation::RightParen, start),
                '=' => {
                    self.advance();
                    self.operator(Operator::Eq, start);
                }
                '!' => {
                    self.advance();
                    if self.eat('=') {
                        self.operator(Operator::NotEq, start);
                    } else {
                        self.error("Unexpected character '!', did you mean '!='?", start);
                    }
                }
                '<' => {
                    self.advance();
                    let op = if self.eat('=') { Operator::LtEq } else { Operator::Lt };
                    self.operator(op, start);
                }
                '>' => {
                    self.advance();
                    let op = if self.eat('=') { Operator::GtEq } else { Operator::Gt };
                    self.operator(op, start);
                }
                '\'' => self.scan_string(start),
                c if c.is_ascii_digit() => self.scan_number(start),
                c if c.is_ascii_alphabetic() || c == '_' => self.scan_word(start),
                other => {
                    self.advance();
                    self.error(format!("Unexpected character '{}'", other), start);
                }
            }
        }

        let end = self.position();
        self.push(TokenKind::EndOfInput, "", end);

        Tokenized {
            tokens: self.tokens,
            diagnostics: self.diagnostics,
        }
    }

    fn position(&self) -> Position {
        Position::new(self.line, self.column)
    }

    fn rest(&self) -> &'a str {
        &self.source[self.offset..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.offset += c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn push(&mut self, kind: TokenKind, lexeme: impl Into<String>, start: Position) {
        let token = Token::new(kind, lexeme, start);
        debug!("Token {:?} '{}' at {}:{}", token.kind, token.lexeme, start.line, start.column);
        self.tokens.push(token);
    }

    fn punctuation(&mut self, punctuation: Punctuation, start: Position) {
        self.advance();
        self.push(TokenKind::Punctuation(punctuation), punctuation.as_str(), start);
    }

    /// Pushes an operator whose characters were already consumed
    fn operator(&mut self, op: Operator, start: Position) {
        self.push(TokenKind::Operator(op), op.as_str(), start);
    }

    fn error(&mut self, message: impl Into<String>, start: Position) {
        let diagnostic = CompilerDiagnostic::lexical(message, start);
        debug!("{}", diagnostic);
        self.diagnostics.push(diagnostic);
    }

    /// Consumes the text matched by an anchored pattern and returns it
    fn take_match(&mut self, pattern: &Regex) -> &'a str {
        let rest = self.rest();
        let len = pattern.find(rest).map_or(0, |m| m.end());
        let text = &rest[..len];
        for _ in text.chars() {
            self.advance();
        }
        text
    }

    fn scan_number(&mut self, start: Position) {
        let text = self.take_match(number_pattern());
        self.push(TokenKind::Number, text, start);
    }

    fn scan_word(&mut self, start: Position) {
        let text = self.take_match(word_pattern());
        let upper = text.to_ascii_uppercase();
        match Keyword::lookup(&upper) {
            Some(keyword) => self.push(TokenKind::Keyword(keyword), keyword.as_str(), start),
            None => self.push(TokenKind::Identifier, text, start),
        }
    }

    fn scan_string(&mut self, start: Position) {
        self.advance(); // opening quote
        let content_start = self.offset;

        while let Some(c) = self.peek() {
            if c == '\'' {
                break;
            }
            self.advance();
        }

        if self.peek().is_none() {
            self.error("Unterminated string literal", start);
            return;
        }

        let content = &self.source[content_start..self.offset];
        self.advance(); // closing quote
        self.push(TokenKind::StringLiteral, content, start);
    }
}
