//! SQL Statement Parser
//!
//! A one-token-lookahead recursive-descent parser over the token sequence
//! produced by the tokenizer. The grammar it accepts:
//!
//! ```text
//! query       ::= select_stmt | insert_stmt | update_stmt | delete_stmt
//! select_stmt ::= SELECT select_list FROM table_name [where_clause] ';'
//! select_list ::= '*' | column { ',' column }
//! insert_stmt ::= INSERT INTO table_name '(' column {',' column} ')'
//!                 VALUES '(' value {',' value} ')' ';'
//! update_stmt ::= UPDATE table_name SET column '=' value [where_clause] ';'
//! delete_stmt ::= DELETE FROM table_name [where_clause] ';'
//! where_clause::= WHERE condition
//! condition   ::= column rel_op value
//! rel_op      ::= '=' | '!=' | '<' | '<=' | '>' | '>='
//! value       ::= identifier | number | string_literal
//! ```
//!
//! Parsing stops at the first production that does not match and reports a
//! single syntax diagnostic naming what was expected and what was found.
//! The parser never consults the schema.
//!
//! # Example
//! ```
//! use minisql::sql::{parser, tokenizer};
//!
//! let tokens = tokenizer::tokenize("DELETE FROM users WHERE id = 3;").tokens;
//! let root = parser::parse(&tokens).unwrap();
//! assert_eq!(root.kind, parser::NodeKind::DeleteQuery);
//! ```

pub mod syntax;

pub use syntax::{NodeKind, SyntaxNode};

use crate::sql::diagnostic::CompilerDiagnostic;
use crate::sql::token::{Keyword, Operator, Position, Punctuation, Token, TokenKind};
use tracing::info;

type ParseResult<T> = Result<T, CompilerDiagnostic>;

/// Parses a token sequence into the syntax tree of one statement
pub fn parse(tokens: &[Token]) -> ParseResult<SyntaxNode> {
    let result = Parser::new(tokens).parse_query();
    match &result {
        Ok(root) => info!("Syntax analysis: {} parsed", root.kind.as_str()),
        Err(diagnostic) => info!("Syntax analysis failed: {}", diagnostic),
    }
    result
}

struct Parser<'a> {
    tokens: &'a [Token],
    position: usize,
    end: Token,
}

impl<'a> Parser<'a> {
    fn new(tokens: &'a [Token]) -> Self {
        let end_position = tokens.last().map_or(Position::new(1, 1), |t| t.position);
        Self {
            tokens,
            position: 0,
            end: Token::new(TokenKind::EndOfInput, "", end_position),
        }
    }

    fn parse_query(&mut self) -> ParseResult<SyntaxNode> {
        match self.peek().kind {
            TokenKind::Keyword(Keyword::Insert) => self.parse_insert(),
            TokenKind::Keyword(Keyword::Update) => self.parse_update(),
            TokenKind::Keyword(Keyword::Delete) => self.parse_delete(),
            _ => self.parse_select(),
        }
    }

    fn parse_select(&mut self) -> ParseResult<SyntaxNode> {
        let mut query = SyntaxNode::new(NodeKind::Query, self.peek().position);
        query.push(self.parse_select_clause()?);
        query.push(self.parse_from_clause()?);
        if let Some(where_clause) = self.parse_optional_where()? {
            query.push(where_clause);
        }
        self.expect_punctuation(Punctuation::Semicolon, "Expected ';' at end of query")?;
        Ok(query)
    }

    fn parse_select_clause(&mut self) -> ParseResult<SyntaxNode> {
        let select = self.expect_keyword(
            Keyword::Select,
            "Expected 'SELECT' keyword at beginning of query",
        )?;
        let mut clause = SyntaxNode::leaf(NodeKind::SelectClause, "SELECT", select.position);
        clause.push(self.parse_select_list()?);
        Ok(clause)
    }

    fn parse_select_list(&mut self) -> ParseResult<SyntaxNode> {
        let mut list = SyntaxNode::new(NodeKind::ColumnList, self.peek().position);

        if self.check_punctuation(Punctuation::Star) {
            let star = self.advance();
            list.push(SyntaxNode::leaf(NodeKind::Column, "*", star.position));
            return Ok(list);
        }

        let first = self.expect_identifier("Expected column name or '*' after SELECT")?;
        list.push(column(&first));
        while self.eat_punctuation(Punctuation::Comma) {
            let next = self.expect_identifier("Expected column name after ','")?;
            list.push(column(&next));
        }
        Ok(list)
    }

    fn parse_from_clause(&mut self) -> ParseResult<SyntaxNode> {
        let from = self.expect_keyword(Keyword::From, "Expected 'FROM' keyword")?;
        let table = self.expect_identifier("Expected table name after 'FROM'")?;
        let mut clause = SyntaxNode::leaf(NodeKind::FromClause, "FROM", from.position);
        clause.push(table_name(&table));
        Ok(clause)
    }

    /// WHERE is optional everywhere it appears
    fn parse_optional_where(&mut self) -> ParseResult<Option<SyntaxNode>> {
        if !self.check_keyword(Keyword::Where) {
            return Ok(None);
        }
        let where_token = self.advance();
        let mut clause = SyntaxNode::leaf(NodeKind::WhereClause, "WHERE", where_token.position);
        clause.push(self.parse_condition()?);
        Ok(Some(clause))
    }

    fn parse_condition(&mut self) -> ParseResult<SyntaxNode> {
        let name = self.expect_identifier("Expected column name in WHERE condition")?;
        let mut condition = SyntaxNode::new(NodeKind::Condition, name.position);
        condition.push(column(&name));

        if !matches!(self.peek().kind, TokenKind::Operator(_)) {
            return Err(self.error(
                "Expected relational operator (=, !=, <, <=, >, >=) in condition",
            ));
        }
        let op = self.advance();
        condition.push(SyntaxNode::leaf(NodeKind::Operator, op.lexeme, op.position));

        let value = self.expect_value("Expected value (identifier, number, or string) in condition")?;
        condition.push(value_node(&value));
        Ok(condition)
    }

    fn parse_insert(&mut self) -> ParseResult<SyntaxNode> {
        let insert = self.expect_keyword(Keyword::Insert, "Expected 'INSERT' keyword")?;
        let mut node = SyntaxNode::new(NodeKind::InsertQuery, insert.position);

        self.expect_keyword(Keyword::Into, "Expected 'INTO' after 'INSERT'")?;
        let table = self.expect_identifier("Expected table name after 'INSERT INTO'")?;
        node.push(table_name(&table));

        self.expect_punctuation(Punctuation::LeftParen, "Expected '(' after table name")?;
        let mut columns = SyntaxNode::new(NodeKind::ColumnList, self.peek().position);
        let first = self.expect_identifier("Expected column name in column list")?;
        columns.push(column(&first));
        while self.eat_punctuation(Punctuation::Comma) {
            let next = self.expect_identifier("Expected column name after ','")?;
            columns.push(column(&next));
        }
        self.expect_punctuation(Punctuation::RightParen, "Expected ')' after column list")?;
        node.push(columns);

        self.expect_keyword(Keyword::Values, "Expected 'VALUES' keyword")?;
        self.expect_punctuation(Punctuation::LeftParen, "Expected '(' after VALUES")?;
        node.push(self.parse_value_list()?);
        self.expect_punctuation(Punctuation::RightParen, "Expected ')' after value list")?;

        self.expect_punctuation(
            Punctuation::Semicolon,
            "Expected ';' at end of INSERT statement",
        )?;
        Ok(node)
    }

    fn parse_value_list(&mut self) -> ParseResult<SyntaxNode> {
        let mut values = SyntaxNode::new(NodeKind::ValueList, self.peek().position);
        let first = self.expect_value("Expected value in VALUES list")?;
        values.push(value_node(&first));
        while self.eat_punctuation(Punctuation::Comma) {
            let next = self.expect_value("Expected value after ',' in VALUES list")?;
            values.push(value_node(&next));
        }
        Ok(values)
    }

    fn parse_update(&mut self) -> ParseResult<SyntaxNode> {
        let update = self.expect_keyword(Keyword::Update, "Expected 'UPDATE' keyword")?;
        let mut node = SyntaxNode::new(NodeKind::UpdateQuery, update.position);

        let table = self.expect_identifier("Expected table name after 'UPDATE'")?;
        node.push(table_name(&table));

        let set = self.expect_keyword(Keyword::Set, "Expected 'SET' keyword after table name")?;
        let target = self.expect_identifier("Expected column name in SET clause")?;
        self.expect(TokenKind::Operator(Operator::Eq), "Expected '=' in SET clause")?;
        let value = self.expect_value("Expected value in SET clause")?;

        let mut assignment = SyntaxNode::new(NodeKind::Assignment, target.position);
        assignment.push(column(&target));
        assignment.push(value_node(&value));
        let mut clause = SyntaxNode::leaf(NodeKind::SetClause, "SET", set.position);
        clause.push(assignment);
        node.push(clause);

        if let Some(where_clause) = self.parse_optional_where()? {
            node.push(where_clause);
        }
        self.expect_punctuation(
            Punctuation::Semicolon,
            "Expected ';' at end of UPDATE statement",
        )?;
        Ok(node)
    }

    fn parse_delete(&mut self) -> ParseResult<SyntaxNode> {
        let delete = self.expect_keyword(Keyword::Delete, "Expected 'DELETE' keyword")?;
        let mut node = SyntaxNode::new(NodeKind::DeleteQuery, delete.position);
        node.push(self.parse_from_clause()?);
        if let Some(where_clause) = self.parse_optional_where()? {
            node.push(where_clause);
        }
        self.expect_punctuation(
            Punctuation::Semicolon,
            "Expected ';' at end of DELETE statement",
        )?;
        Ok(node)
    }

    fn peek(&self) -> &Token {
        self.tokens.get(self.position).unwrap_or(&self.end)
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if token.kind != TokenKind::EndOfInput {
            self.position += 1;
        }
        token
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.peek().kind == kind
    }

    fn check_keyword(&self, keyword: Keyword) -> bool {
        self.check(TokenKind::Keyword(keyword))
    }

    fn check_punctuation(&self, punctuation: Punctuation) -> bool {
        self.check(TokenKind::Punctuation(punctuation))
    }

    fn eat_punctuation(&mut self, punctuation: Punctuation) -> bool {
        if self.check_punctuation(punctuation) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind, expected: &str) -> ParseResult<Token> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(self.error(expected))
        }
    }

    fn expect_keyword(&mut self, keyword: Keyword, expected: &str) -> ParseResult<Token> {
        self.expect(TokenKind::Keyword(keyword), expected)
    }

    fn expect_punctuation(&mut self, punctuation: Punctuation, expected: &str) -> ParseResult<Token> {
        self.expect(TokenKind::Punctuation(punctuation), expected)
    }

    fn expect_identifier(&mut self, expected: &str) -> ParseResult<Token> {
        self.expect(TokenKind::Identifier, expected)
    }

    fn expect_value(&mut self, expected: &str) -> ParseResult<Token> {
        if self.peek().is_value() {
            Ok(self.advance())
        } else {
            Err(self.error(expected))
        }
    }

    fn error(&self, expected: &str) -> CompilerDiagnostic {
        let found = self.peek();
        CompilerDiagnostic::syntax(
            format!("{} (found '{}')", expected, found.describe()),
            found.position,
        )
    }
}

fn column(token: &Token) -> SyntaxNode {
    SyntaxNode::leaf(NodeKind::Column, token.lexeme.as_str(), token.position)
}

fn table_name(token: &Token) -> SyntaxNode {
    SyntaxNode::leaf(NodeKind::TableName, token.lexeme.as_str(), token.position)
}

fn value_node(token: &Token) -> SyntaxNode {
    SyntaxNode::leaf(NodeKind::Value, token.lexeme.as_str(), token.position)
}
