//! Semantic validation
//!
//! Walks a syntax tree against the [`SchemaCatalog`]. The table a statement
//! targets is resolved first and carried as an explicit [`Context`] into
//! every column check that depends on it. Problems accumulate: one unknown
//! column does not hide the next.

use crate::sql::core::schema::{SchemaCatalog, TableSchema};
use crate::sql::diagnostic::CompilerDiagnostic;
use crate::sql::parser::{NodeKind, SyntaxNode};
use crate::sql::token::Position;
use itertools::Itertools;
use tracing::{debug, info, warn};

/// A non-blocking remark that does not affect validity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warning {
    pub message: String,
    pub position: Position,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Validation {
    pub diagnostics: Vec<CompilerDiagnostic>,
    pub warnings: Vec<Warning>,
}

impl Validation {
    pub fn is_valid(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

/// The table established by a statement's target, if it resolved
#[derive(Debug, Clone, Copy, Default)]
pub struct Context<'c> {
    table: Option<&'c TableSchema>,
}

impl<'c> Context<'c> {
    pub fn with_table(table: &'c TableSchema) -> Self {
        Self { table: Some(table) }
    }

    pub fn table(&self) -> Option<&'c TableSchema> {
        self.table
    }
}

pub struct Validator<'c> {
    catalog: &'c SchemaCatalog,
}

impl<'c> Validator<'c> {
    pub fn new(catalog: &'c SchemaCatalog) -> Self {
        Self { catalog }
    }

    pub fn validate(&self, root: &SyntaxNode) -> Validation {
        let mut out = Validation::default();

        match root.kind {
            NodeKind::Query => self.validate_select(root, &mut out),
            NodeKind::InsertQuery => self.validate_insert(root, &mut out),
            NodeKind::UpdateQuery => self.validate_update(root, &mut out),
            NodeKind::DeleteQuery => self.validate_delete(root, &mut out),
            _ => out.diagnostics.push(CompilerDiagnostic::semantic(
                "Unknown query type for semantic analysis",
                root.position,
            )),
        }

        info!(
            "Semantic analysis: {} error(s), {} warning(s)",
            out.diagnostics.len(),
            out.warnings.len()
        );
        out
    }

    fn validate_select(&self, node: &SyntaxNode, out: &mut Validation) {
        // FROM first: the column list means nothing without a table.
        let context = self.resolve_target(node.child(NodeKind::FromClause), out);
        if context.table().is_none() {
            return;
        }

        let columns = node
            .child(NodeKind::SelectClause)
            .and_then(|select| select.child(NodeKind::ColumnList));
        for column in columns.into_iter().flat_map(|list| list.children_of(NodeKind::Column)) {
            self.validate_column(&context, column, out);
        }

        if let Some(where_clause) = node.child(NodeKind::WhereClause) {
            self.validate_where(&context, where_clause, out);
        }
    }

    fn validate_insert(&self, node: &SyntaxNode, out: &mut Validation) {
        let context = self.resolve_table(node.child(NodeKind::TableName), out);

        let columns: Vec<&SyntaxNode> = node
            .child(NodeKind::ColumnList)
            .map(|list| list.children_of(NodeKind::Column).collect())
            .unwrap_or_default();
        for column in &columns {
            self.validate_column(&context, column, out);
        }

        let values = node
            .child(NodeKind::ValueList)
            .map_or(0, |list| list.children_of(NodeKind::Value).count());
        if !columns.is_empty() && values > 0 && columns.len() != values {
            out.diagnostics.push(CompilerDiagnostic::semantic(
                format!(
                    "Column count ({}) does not match value count ({})",
                    columns.len(),
                    values
                ),
                node.position,
            ));
        }
    }

    fn validate_update(&self, node: &SyntaxNode, out: &mut Validation) {
        let context = self.resolve_table(node.child(NodeKind::TableName), out);

        let targets = node
            .child(NodeKind::SetClause)
            .into_iter()
            .flat_map(|set| set.children_of(NodeKind::Assignment))
            .flat_map(|assignment| assignment.children_of(NodeKind::Column));
        for column in targets {
            self.validate_column(&context, column, out);
        }

        if let Some(where_clause) = node.child(NodeKind::WhereClause) {
            self.validate_where(&context, where_clause, out);
        }
    }

    fn validate_delete(&self, node: &SyntaxNode, out: &mut Validation) {
        let context = self.resolve_target(node.child(NodeKind::FromClause), out);
        if let Some(where_clause) = node.child(NodeKind::WhereClause) {
            self.validate_where(&context, where_clause, out);
        }
    }

    fn resolve_target(&self, from: Option<&SyntaxNode>, out: &mut Validation) -> Context<'c> {
        self.resolve_table(from.and_then(|f| f.child(NodeKind::TableName)), out)
    }

    /// Looks a TABLE_NAME node up in the catalog and establishes context
    pub fn resolve_table(&self, table: Option<&SyntaxNode>, out: &mut Validation) -> Context<'c> {
        let Some(table) = table else {
            return Context::default();
        };

        match self.catalog.table(table.text()) {
            Some(schema) => {
                debug!("Table '{}' resolved", table.text());
                Context::with_table(schema)
            }
            None => {
                out.diagnostics.push(CompilerDiagnostic::semantic(
                    format!(
                        "Table '{}' does not exist. Available tables: {}",
                        table.text(),
                        self.catalog.table_names().join(", ")
                    ),
                    table.position,
                ));
                Context::default()
            }
        }
    }

    /// Checks a COLUMN node against the context table. Without a table
    /// there is nothing to check against, so the column is skipped.
    pub fn validate_column(&self, context: &Context<'c>, column: &SyntaxNode, out: &mut Validation) {
        let Some(table) = context.table() else {
            return;
        };
        let name = column.text();
        if name == "*" {
            return;
        }

        if table.has_column(name) {
            debug!("Column '{}' resolved in table '{}'", name, table.name);
            return;
        }

        out.diagnostics.push(CompilerDiagnostic::semantic(
            format!(
                "Column '{}' does not exist in table '{}'. Available columns: {}",
                name,
                table.name,
                table.columns.iter().map(|c| c.name.as_str()).join(", ")
            ),
            column.position,
        ));
    }

    fn validate_where(&self, context: &Context<'c>, where_clause: &SyntaxNode, out: &mut Validation) {
        if context.table().is_none() {
            return;
        }
        for condition in where_clause.children_of(NodeKind::Condition) {
            self.validate_condition(context, condition, out);
        }
    }

    fn validate_condition(&self, context: &Context<'c>, condition: &SyntaxNode, out: &mut Validation) {
        let Some(column) = condition.child(NodeKind::Column) else {
            return;
        };
        self.validate_column(context, column, out);

        let Some(value) = condition.child(NodeKind::Value) else {
            return;
        };
        let declared = context
            .table()
            .and_then(|table| table.find_column(column.text()));
        if let Some(info) = declared {
            if info.column_type.is_numeric() && !looks_numeric(value.text()) {
                let warning = Warning {
                    message: format!(
                        "Comparing numeric column '{}' with non-numeric value '{}'",
                        column.text(),
                        value.text()
                    ),
                    position: value.position,
                };
                warn!("{}", warning.message);
                out.warnings.push(warning);
            }
        }
    }
}

/// Starts with a digit, or a sign directly followed by a digit
pub fn looks_numeric(value: &str) -> bool {
    let mut chars = value.chars();
    match chars.next() {
        Some(c) if c.is_ascii_digit() => true,
        Some('-') | Some('+') => chars.next().is_some_and(|c| c.is_ascii_digit()),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql::diagnostic::DiagnosticKind;
    use crate::sql::parser::parse;
    use crate::sql::tokenizer::tokenize;

    fn validate(sql: &str) -> Validation {
        let catalog = SchemaCatalog::sample();
        let tokens = tokenize(sql).tokens;
        let root = parse(&tokens).expect("query should parse");
        Validator::new(&catalog).validate(&root)
    }

    fn messages(validation: &Validation) -> Vec<&str> {
        validation
            .diagnostics
            .iter()
            .map(|d| d.message.as_str())
            .collect()
    }

    #[test]
    fn test_valid_select() {
        let validation = validate("SELECT name, age FROM employees WHERE salary > 50000;");
        assert!(validation.is_valid());
        assert!(validation.warnings.is_empty());
    }

    #[test]
    fn test_names_are_case_insensitive() {
        assert!(validate("SELECT NAME FROM Employees WHERE ID = 1;").is_valid());
    }

    #[test]
    fn test_unknown_table_lists_known_tables() {
        let validation = validate("SELECT * FROM customers;");
        assert_eq!(validation.diagnostics.len(), 1);
        let diagnostic = &validation.diagnostics[0];
        assert_eq!(diagnostic.kind, DiagnosticKind::Semantic);
        assert_eq!(
            diagnostic.message,
            "Table 'customers' does not exist. Available tables: departments, employees, products, users"
        );
        assert_eq!((diagnostic.line, diagnostic.column), (1, 15));
    }

    #[test]
    fn test_unknown_table_skips_column_checks() {
        let validation = validate("SELECT nope FROM customers WHERE nada = 1;");
        assert_eq!(validation.diagnostics.len(), 1);
    }

    #[test]
    fn test_unknown_column_lists_table_columns() {
        let validation = validate("SELECT invalid_col FROM employees;");
        assert_eq!(
            messages(&validation),
            vec!["Column 'invalid_col' does not exist in table 'employees'. Available columns: id, name, age, salary, department"]
        );
        assert_eq!(validation.diagnostics[0].column, 8);
    }

    #[test]
    fn test_errors_accumulate() {
        let validation = validate("SELECT a, b, name FROM users WHERE c = 1;");
        assert_eq!(validation.diagnostics.len(), 4);
        assert!(messages(&validation)[3].starts_with("Column 'c'"));
    }

    #[test]
    fn test_type_warning_is_not_an_error() {
        let validation = validate("SELECT * FROM employees WHERE age = 'old';");
        assert!(validation.is_valid());
        assert_eq!(validation.warnings.len(), 1);
        assert_eq!(
            validation.warnings[0].message,
            "Comparing numeric column 'age' with non-numeric value 'old'"
        );

        let validation = validate("SELECT * FROM employees WHERE name = 'old';");
        assert!(validation.warnings.is_empty());
        let validation = validate("SELECT * FROM products WHERE price > 10.5;");
        assert!(validation.warnings.is_empty());
    }

    #[test]
    fn test_insert_count_mismatch() {
        let validation = validate("INSERT INTO employees (id,name) VALUES (1,'A','extra');");
        assert_eq!(
            messages(&validation),
            vec!["Column count (2) does not match value count (3)"]
        );
    }

    #[test]
    fn test_insert_unknown_column_and_count() {
        let validation = validate("INSERT INTO users (id, nickname) VALUES (9);");
        assert_eq!(validation.diagnostics.len(), 2);
        assert!(messages(&validation)[0].starts_with("Column 'nickname'"));
    }

    #[test]
    fn test_insert_unknown_table() {
        let validation = validate("INSERT INTO ghosts (id) VALUES (1);");
        assert_eq!(validation.diagnostics.len(), 1);
        assert!(messages(&validation)[0].starts_with("Table 'ghosts' does not exist."));
    }

    #[test]
    fn test_insert_unknown_table_still_checks_counts() {
        let validation = validate("INSERT INTO ghosts (id) VALUES (1, 2);");
        assert_eq!(validation.diagnostics.len(), 2);
        assert!(messages(&validation)[0].starts_with("Table 'ghosts' does not exist."));
        assert_eq!(
            messages(&validation)[1],
            "Column count (1) does not match value count (2)"
        );
    }

    #[test]
    fn test_unknown_table_hint_for_every_statement() {
        let hint = "Available tables: departments, employees, products, users";
        for sql in [
            "SELECT * FROM ghosts;",
            "INSERT INTO ghosts (id) VALUES (1);",
            "UPDATE ghosts SET id = 1 WHERE id = 2;",
            "DELETE FROM ghosts WHERE id = 2;",
        ] {
            let validation = validate(sql);
            assert_eq!(validation.diagnostics.len(), 1, "{}", sql);
            let message = messages(&validation)[0];
            assert!(message.starts_with("Table 'ghosts' does not exist."), "{}", sql);
            assert!(message.ends_with(hint), "{}", sql);
        }
    }

    #[test]
    fn test_update_checks_set_and_where_columns() {
        assert!(validate("UPDATE employees SET salary = 1 WHERE id = 3;").is_valid());
        let validation = validate("UPDATE employees SET wage = 1 WHERE uid = 3;");
        assert_eq!(validation.diagnostics.len(), 2);
        assert!(messages(&validation)[0].starts_with("Column 'wage'"));
        assert!(messages(&validation)[1].starts_with("Column 'uid'"));
    }

    #[test]
    fn test_update_without_where_passes_validation() {
        assert!(validate("UPDATE employees SET salary = 1;").is_valid());
    }

    #[test]
    fn test_delete() {
        assert!(validate("DELETE FROM users WHERE status = 'inactive';").is_valid());
        assert!(validate("DELETE FROM users;").is_valid());
        let validation = validate("DELETE FROM users WHERE colour = 'red';");
        assert_eq!(validation.diagnostics.len(), 1);
    }

    #[test]
    fn test_non_statement_root() {
        let catalog = SchemaCatalog::sample();
        let node = SyntaxNode::new(NodeKind::WhereClause, Position::new(1, 1));
        let validation = Validator::new(&catalog).validate(&node);
        assert!(!validation.is_valid());
    }

    #[test]
    fn test_column_check_needs_context() {
        let catalog = SchemaCatalog::sample();
        let validator = Validator::new(&catalog);
        let column = SyntaxNode::leaf(NodeKind::Column, "anything", Position::new(1, 1));

        let mut out = Validation::default();
        validator.validate_column(&Context::default(), &column, &mut out);
        assert!(out.is_valid());

        let employees = catalog.table("employees").expect("employees");
        validator.validate_column(&Context::with_table(employees), &column, &mut out);
        assert_eq!(out.diagnostics.len(), 1);
    }

    #[test]
    fn test_looks_numeric() {
        assert!(looks_numeric("42"));
        assert!(looks_numeric("-3"));
        assert!(looks_numeric("+3.5"));
        assert!(!looks_numeric("-"));
        assert!(!looks_numeric("abc"));
        assert!(!looks_numeric(""));
    }
}
