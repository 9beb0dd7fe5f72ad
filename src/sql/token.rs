//! Tokens produced by the tokenizer and consumed by the parser.

use itertools::Itertools;
use std::fmt::{self, Display};

/// A 1-indexed location in the query source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

/// Reserved words, matched case-insensitively
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    Select,
    From,
    Where,
    And,
    Or,
    Insert,
    Into,
    Values,
    Update,
    Set,
    Delete,
    Create,
    Table,
}

impl Keyword {
    /// Looks up an already upper-cased word in the keyword table
    pub fn lookup(upper: &str) -> Option<Self> {
        let keyword = match upper {
            "SELECT" => Keyword::Select,
            "FROM" => Keyword::From,
            "WHERE" => Keyword::Where,
            "AND" => Keyword::And,
            "OR" => Keyword::Or,
            "INSERT" => Keyword::Insert,
            "INTO" => Keyword::Into,
            "VALUES" => Keyword::Values,
            "UPDATE" => Keyword::Update,
            "SET" => Keyword::Set,
            "DELETE" => Keyword::Delete,
            "CREATE" => Keyword::Create,
            "TABLE" => Keyword::Table,
            _ => return None,
        };
        Some(keyword)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Keyword::Select => "SELECT",
            Keyword::From => "FROM",
            Keyword::Where => "WHERE",
            Keyword::And => "AND",
            Keyword::Or => "OR",
            Keyword::Insert => "INSERT",
            Keyword::Into => "INTO",
            Keyword::Values => "VALUES",
            Keyword::Update => "UPDATE",
            Keyword::Set => "SET",
            Keyword::Delete => "DELETE",
            Keyword::Create => "CREATE",
            Keyword::Table => "TABLE",
        }
    }
}

/// Relational operators allowed in a WHERE condition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
}

impl Operator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::NotEq => "!=",
            Operator::Lt => "<",
            Operator::LtEq => "<=",
            Operator::Gt => ">",
            Operator::GtEq => ">=",
        }
    }

    /// Parses the literal operator text stored in a syntax tree
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        let op = match symbol {
            "=" => Operator::Eq,
            "!=" => Operator::NotEq,
            "<" => Operator::Lt,
            "<=" => Operator::LtEq,
            ">" => Operator::Gt,
            ">=" => Operator::GtEq,
            _ => return None,
        };
        Some(op)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Punctuation {
    /// The wildcard `*`
    Star,
    Comma,
    Semicolon,
    LeftParen,
    RightParen,
}

impl Punctuation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Punctuation::Star => "*",
            Punctuation::Comma => ",",
            Punctuation::Semicolon => ";",
            Punctuation::LeftParen => "(",
            Punctuation::RightParen => ")",
        }
    }
}

/// Represents different kinds of SQL tokens
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Keywords in SQL (SELECT, FROM, etc)
    Keyword(Keyword),
    /// Identifiers like table names, column names
    Identifier,
    /// Integer or decimal literal
    Number,
    /// Text between single quotes
    StringLiteral,
    /// Relational operators
    Operator(Operator),
    /// `*`, `,`, `;`, `(` and `)`
    Punctuation(Punctuation),
    /// Synthetic token closing every sequence
    EndOfInput,
}

/// A single lexical unit with its source position
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub position: Position,
}

impl Token {
    pub fn new(kind: TokenKind, lexeme: impl Into<String>, position: Position) -> Self {
        Self {
            kind,
            lexeme: lexeme.into(),
            position,
        }
    }

    /// Identifiers, numbers and string literals can all stand as a value
    pub fn is_value(&self) -> bool {
        matches!(
            self.kind,
            TokenKind::Identifier | TokenKind::Number | TokenKind::StringLiteral
        )
    }

    /// Text used when a diagnostic quotes this token
    pub fn describe(&self) -> &str {
        match self.kind {
            TokenKind::EndOfInput => "end of input",
            _ => &self.lexeme,
        }
    }
}

impl Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenKind::StringLiteral => write!(f, "'{}'", self.lexeme),
            _ => write!(f, "{}", self.lexeme),
        }
    }
}

/// Renders a token sequence back to query text, one space between lexemes
///
/// # Example
/// `select Name from Users;` renders as `SELECT Name FROM Users ;`
pub fn render(tokens: &[Token]) -> String {
    tokens
        .iter()
        .filter(|token| token.kind != TokenKind::EndOfInput)
        .join(" ")
}
