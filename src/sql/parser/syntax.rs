use crate::sql::token::Position;
use std::fmt::{self, Display};

/// Represents the grammatical role of a syntax tree node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// Root of a SELECT statement
    Query,
    InsertQuery,
    UpdateQuery,
    DeleteQuery,
    SelectClause,
    ColumnList,
    /// A column reference, or `*`
    Column,
    FromClause,
    TableName,
    WhereClause,
    /// `column rel_op value`
    Condition,
    Operator,
    Value,
    ValueList,
    SetClause,
    /// `column = value` inside SET
    Assignment,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Query => "QUERY",
            NodeKind::InsertQuery => "INSERT_QUERY",
            NodeKind::UpdateQuery => "UPDATE_QUERY",
            NodeKind::DeleteQuery => "DELETE_QUERY",
            NodeKind::SelectClause => "SELECT_CLAUSE",
            NodeKind::ColumnList => "COLUMN_LIST",
            NodeKind::Column => "COLUMN",
            NodeKind::FromClause => "FROM_CLAUSE",
            NodeKind::TableName => "TABLE_NAME",
            NodeKind::WhereClause => "WHERE_CLAUSE",
            NodeKind::Condition => "CONDITION",
            NodeKind::Operator => "OPERATOR",
            NodeKind::Value => "VALUE",
            NodeKind::ValueList => "VALUE_LIST",
            NodeKind::SetClause => "SET_CLAUSE",
            NodeKind::Assignment => "ASSIGNMENT",
        }
    }
}

/// A node of the syntax tree. Parents own their children outright.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxNode {
    pub kind: NodeKind,
    /// Literal payload: a name, operator symbol or value
    pub value: Option<String>,
    pub children: Vec<SyntaxNode>,
    /// Where the node's first token started
    pub position: Position,
}

impl SyntaxNode {
    pub fn new(kind: NodeKind, position: Position) -> Self {
        Self {
            kind,
            value: None,
            children: Vec::new(),
            position,
        }
    }

    pub fn leaf(kind: NodeKind, value: impl Into<String>, position: Position) -> Self {
        Self {
            kind,
            value: Some(value.into()),
            children: Vec::new(),
            position,
        }
    }

    pub fn push(&mut self, child: SyntaxNode) {
        self.children.push(child);
    }

    /// The payload, or an empty string for structural nodes
    pub fn text(&self) -> &str {
        self.value.as_deref().unwrap_or("")
    }

    /// First direct child of the given kind
    pub fn child(&self, kind: NodeKind) -> Option<&SyntaxNode> {
        self.children.iter().find(|child| child.kind == kind)
    }

    /// All direct children of the given kind, in order
    pub fn children_of(&self, kind: NodeKind) -> impl Iterator<Item = &SyntaxNode> {
        self.children.iter().filter(move |child| child.kind == kind)
    }

    fn write_indented(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        write!(f, "{}|-- {}", "  ".repeat(depth), self.kind.as_str())?;
        if let Some(value) = self.value.as_deref().filter(|v| !v.is_empty()) {
            write!(f, ": \"{}\"", value)?;
        }
        writeln!(f)?;
        for child in &self.children {
            child.write_indented(f, depth + 1)?;
        }
        Ok(())
    }
}

impl Display for SyntaxNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_indented(f, 0)
    }
}
