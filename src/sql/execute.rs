//! Query execution
//!
//! Walks a validated syntax tree and applies it to the [`RowStore`].
//! Failures at this stage (a table missing from the store, an UPDATE
//! without WHERE) come back as a failed [`QueryResult`] rather than a
//! diagnostic: the tree already passed validation.

use crate::sql::parser::{NodeKind, SyntaxNode};
use crate::sql::storage::table::{Predicate, Row, RowStore, StoreError};
use itertools::Itertools;
use std::fmt::Display;
use tracing::{info, warn};

/// Result of executing a statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryResult {
    pub success: bool,
    pub message: String,
    /// Reported column names, SELECT only
    pub columns: Option<Vec<String>>,
    /// Returned rows, SELECT only
    pub rows: Option<Vec<Row>>,
    pub affected_rows: usize,
}

impl QueryResult {
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            columns: None,
            rows: None,
            affected_rows: 0,
        }
    }

    fn affected(count: usize, message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            columns: None,
            rows: None,
            affected_rows: count,
        }
    }

    fn selected(columns: Vec<String>, rows: Vec<Row>) -> Self {
        Self {
            success: true,
            message: format!("Query executed successfully. {} row(s) returned.", rows.len()),
            affected_rows: rows.len(),
            columns: Some(columns),
            rows: Some(rows),
        }
    }
}

impl From<StoreError> for QueryResult {
    fn from(err: StoreError) -> Self {
        QueryResult::failure(err.to_string())
    }
}

impl Display for QueryResult {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        if let (Some(columns), Some(rows)) = (&self.columns, &self.rows) {
            writeln!(f, "{}", columns.iter().join("|"))?;
            for row in rows {
                let fields = columns
                    .iter()
                    .map(|column| field(row, column).unwrap_or(""))
                    .join("|");
                writeln!(f, "{}", fields)?;
            }
        }
        write!(f, "{}", self.message)
    }
}

/// Case-insensitive field lookup on a stored row
fn field<'r>(row: &'r Row, column: &str) -> Option<&'r str> {
    row.get(column)
        .or_else(|| {
            row.iter()
                .find(|(name, _)| name.eq_ignore_ascii_case(column))
                .map(|(_, value)| value)
        })
        .map(String::as_str)
}

pub struct Executor<'s> {
    store: &'s mut RowStore,
}

impl<'s> Executor<'s> {
    pub fn new(store: &'s mut RowStore) -> Self {
        Self { store }
    }

    /// Executes a validated statement tree
    pub fn execute(&mut self, root: &SyntaxNode) -> QueryResult {
        info!("Executing {}", root.kind.as_str());
        let result = match root.kind {
            NodeKind::Query => self.execute_select(root),
            NodeKind::InsertQuery => self.execute_insert(root),
            NodeKind::UpdateQuery => self.execute_update(root),
            NodeKind::DeleteQuery => self.execute_delete(root),
            _ => Ok(QueryResult::failure("Unknown query type")),
        };
        result.unwrap_or_else(QueryResult::from)
    }

    fn execute_select(&self, root: &SyntaxNode) -> Result<QueryResult, StoreError> {
        let table = target_table(root.child(NodeKind::FromClause));
        let requested: Vec<String> = root
            .child(NodeKind::SelectClause)
            .and_then(|select| select.child(NodeKind::ColumnList))
            .map(|list| {
                list.children_of(NodeKind::Column)
                    .map(|column| column.text().to_string())
                    .collect()
            })
            .unwrap_or_default();

        let columns = if requested.iter().any(|c| c == "*") {
            self.store.column_names(&table)?
        } else {
            requested
        };

        let rows = match self.predicate(&table, root.child(NodeKind::WhereClause)) {
            Some(predicate) => self.store.filtered_rows(&table, &predicate)?,
            None => self.store.rows(&table)?,
        };

        Ok(QueryResult::selected(columns, rows))
    }

    fn execute_insert(&mut self, root: &SyntaxNode) -> Result<QueryResult, StoreError> {
        let table = root
            .child(NodeKind::TableName)
            .map(|t| t.text().to_lowercase())
            .unwrap_or_default();
        let columns = texts(root.child(NodeKind::ColumnList), NodeKind::Column);
        let values = texts(root.child(NodeKind::ValueList), NodeKind::Value);

        self.store.insert_row(&table, &columns, &values)?;
        Ok(QueryResult::affected(1, "1 row inserted successfully."))
    }

    fn execute_update(&mut self, root: &SyntaxNode) -> Result<QueryResult, StoreError> {
        let table = root
            .child(NodeKind::TableName)
            .map(|t| t.text().to_lowercase())
            .unwrap_or_default();

        let Some(predicate) = self.predicate(&table, root.child(NodeKind::WhereClause)) else {
            warn!("Rejected UPDATE on '{}' without WHERE", table);
            return Ok(QueryResult::failure(
                "UPDATE without WHERE is not supported for safety.",
            ));
        };

        let assignment = root
            .child(NodeKind::SetClause)
            .and_then(|set| set.child(NodeKind::Assignment));
        let column = assignment
            .and_then(|a| a.child(NodeKind::Column))
            .map(|c| self.resolve_column(&table, c.text()))
            .unwrap_or_default();
        let value = assignment
            .and_then(|a| a.child(NodeKind::Value))
            .map(|v| v.text().to_string())
            .unwrap_or_default();

        let count = self.store.update_rows(&table, &column, &value, &predicate)?;
        Ok(QueryResult::affected(
            count,
            format!("{} row(s) updated successfully.", count),
        ))
    }

    fn execute_delete(&mut self, root: &SyntaxNode) -> Result<QueryResult, StoreError> {
        let table = target_table(root.child(NodeKind::FromClause));
        let count = match self.predicate(&table, root.child(NodeKind::WhereClause)) {
            Some(predicate) => self.store.delete_rows(&table, &predicate)?,
            None => self.store.delete_all_rows(&table)?,
        };
        Ok(QueryResult::affected(
            count,
            format!("{} row(s) deleted successfully.", count),
        ))
    }

    /// Builds the row filter from a WHERE clause's first condition
    fn predicate(&self, table: &str, where_clause: Option<&SyntaxNode>) -> Option<Predicate> {
        let condition = where_clause?.child(NodeKind::Condition)?;
        let column = condition.child(NodeKind::Column)?;
        let op = condition.child(NodeKind::Operator)?;
        let value = condition.child(NodeKind::Value)?;
        Some(Predicate::new(
            self.resolve_column(table, column.text()),
            op.text(),
            value.text(),
        ))
    }

    /// Maps a column name onto the schema's spelling, when the table knows it
    fn resolve_column(&self, table: &str, column: &str) -> String {
        self.store
            .table(table)
            .and_then(|t| t.schema().find_column(column))
            .map_or_else(|| column.to_string(), |c| c.name.clone())
    }
}

fn target_table(from: Option<&SyntaxNode>) -> String {
    from.and_then(|f| f.child(NodeKind::TableName))
        .map(|t| t.text().to_lowercase())
        .unwrap_or_default()
}

fn texts(list: Option<&SyntaxNode>, kind: NodeKind) -> Vec<String> {
    list.into_iter()
        .flat_map(|l| l.children_of(kind))
        .map(|node| node.text().to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql::core::schema::SchemaCatalog;
    use crate::sql::parser::parse;
    use crate::sql::tokenizer::tokenize;
    use anyhow::Result;

    fn run(store: &mut RowStore, sql: &str) -> Result<QueryResult> {
        let root = parse(&tokenize(sql).tokens)?;
        Ok(Executor::new(store).execute(&root))
    }

    fn sample_store() -> RowStore {
        RowStore::with_sample_rows(&SchemaCatalog::sample())
    }

    #[test]
    fn test_select_all() -> Result<()> {
        let mut store = sample_store();
        let result = run(&mut store, "SELECT * FROM employees;")?;
        assert!(result.success);
        assert_eq!(
            result.columns,
            Some(vec!["id", "name", "age", "salary", "department"].into_iter().map(String::from).collect())
        );
        assert_eq!(result.rows, Some(store.rows("employees")?));
        assert_eq!(result.message, "Query executed successfully. 8 row(s) returned.");
        Ok(())
    }

    #[test]
    fn test_select_where_numeric() -> Result<()> {
        let mut store = sample_store();
        let result = run(&mut store, "SELECT name FROM employees WHERE salary > 80000;")?;
        assert_eq!(result.columns, Some(vec!["name".to_string()]));
        let rows = result.rows.unwrap_or_default();
        assert_eq!(rows.len(), 3);
        // Rows keep every field even when fewer columns are requested.
        assert_eq!(rows[0].len(), 5);
        Ok(())
    }

    #[test]
    fn test_select_column_case_follows_schema() -> Result<()> {
        let mut store = sample_store();
        let result = run(&mut store, "SELECT NAME FROM Employees WHERE Department = 'HR';")?;
        assert_eq!(result.rows.as_ref().map(|r| r.len()), Some(2));
        assert_eq!(
            result.to_string(),
            "NAME\nSneha Gupta\nDeepa Iyer\nQuery executed successfully. 2 row(s) returned."
        );
        Ok(())
    }

    #[test]
    fn test_insert() -> Result<()> {
        let mut store = sample_store();
        let result = run(
            &mut store,
            "INSERT INTO departments (id, name) VALUES (4, 'Legal');",
        )?;
        assert!(result.success);
        assert_eq!(result.affected_rows, 1);
        assert_eq!(result.message, "1 row inserted successfully.");

        let rows = store.rows("departments")?;
        let last = rows.last().expect("inserted row");
        assert_eq!(last.get("name").map(String::as_str), Some("Legal"));
        assert_eq!(last.get("budget").map(String::as_str), Some(""));
        Ok(())
    }

    #[test]
    fn test_insert_count_mismatch_fails() -> Result<()> {
        let mut store = sample_store();
        let result = run(&mut store, "INSERT INTO departments (id) VALUES (4, 'x');")?;
        assert!(!result.success);
        assert_eq!(store.row_count("departments")?, 3);
        Ok(())
    }

    #[test]
    fn test_update_with_where() -> Result<()> {
        let mut store = sample_store();
        let sql = "UPDATE employees SET salary = 60000 WHERE department = 'Engineering';";
        let first = run(&mut store, sql)?;
        assert_eq!(first.affected_rows, 3);
        assert_eq!(first.message, "3 row(s) updated successfully.");
        let snapshot = store.clone();

        let second = run(&mut store, sql)?;
        assert_eq!(second.affected_rows, 3);
        assert_eq!(store, snapshot);
        Ok(())
    }

    #[test]
    fn test_update_without_where_is_rejected() -> Result<()> {
        let mut store = sample_store();
        let before = store.clone();
        let result = run(&mut store, "UPDATE employees SET salary = 1;")?;
        assert!(!result.success);
        assert_eq!(result.affected_rows, 0);
        assert_eq!(result.message, "UPDATE without WHERE is not supported for safety.");
        assert_eq!(store, before);
        Ok(())
    }

    #[test]
    fn test_delete() -> Result<()> {
        let mut store = sample_store();
        let result = run(&mut store, "DELETE FROM users WHERE status = 'inactive';")?;
        assert_eq!(result.message, "1 row(s) deleted successfully.");

        let remaining = store.row_count("users")?;
        let result = run(&mut store, "DELETE FROM users;")?;
        assert_eq!(result.affected_rows, remaining);
        assert_eq!(store.row_count("users")?, 0);
        Ok(())
    }

    #[test]
    fn test_missing_table_is_failed_result() -> Result<()> {
        let mut store = RowStore::default();
        let result = run(&mut store, "SELECT * FROM employees;")?;
        assert!(!result.success);
        assert_eq!(result.message, "Table not found: employees");
        Ok(())
    }
}
