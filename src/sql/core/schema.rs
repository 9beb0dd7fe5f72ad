//! Schema catalog
//!
//! A fixed registry of tables and their ordered, typed columns. The catalog
//! is built once and only read afterwards; table and column names are
//! matched case-insensitively.

use itertools::Itertools;
use std::collections::BTreeMap;
use std::fmt::{self, Display};
use std::str::FromStr;
use thiserror::Error;

/// Declared column types. Advisory only: values are always stored as text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Int,
    Float,
    Varchar,
}

impl ColumnType {
    pub fn is_numeric(&self) -> bool {
        matches!(self, ColumnType::Int | ColumnType::Float)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown column type: {0}")]
pub struct UnknownColumnType(pub String);

impl FromStr for ColumnType {
    type Err = UnknownColumnType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "INT" => Ok(ColumnType::Int),
            "FLOAT" => Ok(ColumnType::Float),
            "VARCHAR" => Ok(ColumnType::Varchar),
            _ => Err(UnknownColumnType(s.to_string())),
        }
    }
}

impl Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnType::Int => write!(f, "INT"),
            ColumnType::Float => write!(f, "FLOAT"),
            ColumnType::Varchar => write!(f, "VARCHAR"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnInfo {
    pub name: String,
    pub column_type: ColumnType,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    pub name: String,
    pub columns: Vec<ColumnInfo>,
}

impl TableSchema {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
        }
    }

    pub fn column(mut self, name: impl Into<String>, column_type: ColumnType) -> Self {
        self.columns.push(ColumnInfo {
            name: name.into(),
            column_type,
        });
        self
    }

    /// Case-insensitive column lookup
    pub fn find_column(&self, name: &str) -> Option<&ColumnInfo> {
        self.columns
            .iter()
            .find(|column| column.name.eq_ignore_ascii_case(name))
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.find_column(name).is_some()
    }

    /// Column names in declaration order
    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|column| column.name.clone()).collect()
    }
}

impl Display for TableSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({})",
            self.name,
            self.columns
                .iter()
                .map(|c| format!("{} {}", c.name, c.column_type))
                .join(", ")
        )
    }
}

/// Table name -> schema, keyed by lower-cased name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaCatalog {
    tables: BTreeMap<String, TableSchema>,
}

impl SchemaCatalog {
    pub fn new(tables: impl IntoIterator<Item = TableSchema>) -> Self {
        let tables = tables
            .into_iter()
            .map(|table| (table.name.to_lowercase(), table))
            .collect();
        Self { tables }
    }

    /// The bundled demonstration schema
    pub fn sample() -> Self {
        use ColumnType::*;

        Self::new([
            TableSchema::new("employees")
                .column("id", Int)
                .column("name", Varchar)
                .column("age", Int)
                .column("salary", Float)
                .column("department", Varchar),
            TableSchema::new("departments")
                .column("id", Int)
                .column("name", Varchar)
                .column("budget", Float),
            TableSchema::new("users")
                .column("id", Int)
                .column("username", Varchar)
                .column("email", Varchar)
                .column("age", Int)
                .column("status", Varchar),
            TableSchema::new("products")
                .column("id", Int)
                .column("name", Varchar)
                .column("price", Float)
                .column("quantity", Int),
        ])
    }

    /// Case-insensitive table lookup
    pub fn table(&self, name: &str) -> Option<&TableSchema> {
        self.tables.get(&name.to_lowercase())
    }

    pub fn table_exists(&self, name: &str) -> bool {
        self.table(name).is_some()
    }

    pub fn column_exists(&self, table: &str, column: &str) -> bool {
        self.table(table).is_some_and(|schema| schema.has_column(column))
    }

    /// Every table name, in sorted order
    pub fn table_names(&self) -> Vec<String> {
        self.tables.values().map(|table| table.name.clone()).collect()
    }

    pub fn tables(&self) -> impl Iterator<Item = &TableSchema> {
        self.tables.values()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_catalog() {
        let catalog = SchemaCatalog::sample();
        assert_eq!(catalog.len(), 4);
        assert_eq!(
            catalog.table_names(),
            vec!["departments", "employees", "products", "users"]
        );
        let employees = catalog.table("employees").expect("employees");
        assert_eq!(
            employees.column_names(),
            vec!["id", "name", "age", "salary", "department"]
        );
    }

    #[test]
    fn test_lookups_ignore_case() {
        let catalog = SchemaCatalog::sample();
        assert!(catalog.table_exists("EMPLOYEES"));
        assert!(catalog.column_exists("Employees", "Salary"));
        assert!(!catalog.column_exists("employees", "budget"));
        assert!(!catalog.table_exists("customers"));
        let column = catalog
            .table("products")
            .and_then(|t| t.find_column("PRICE"))
            .expect("price");
        assert_eq!(column.name, "price");
        assert_eq!(column.column_type, ColumnType::Float);
    }

    #[test]
    fn test_column_type_parsing() {
        assert_eq!("int".parse::<ColumnType>(), Ok(ColumnType::Int));
        assert_eq!("VarChar".parse::<ColumnType>(), Ok(ColumnType::Varchar));
        assert!("BLOB".parse::<ColumnType>().is_err());
        assert!(ColumnType::Float.is_numeric());
        assert!(!ColumnType::Varchar.is_numeric());
    }

    #[test]
    fn test_schema_display() {
        let schema = TableSchema::new("t")
            .column("a", ColumnType::Int)
            .column("b", ColumnType::Varchar);
        assert_eq!(schema.to_string(), "t (a INT, b VARCHAR)");
    }
}
