use crate::sql::core::schema::{SchemaCatalog, TableSchema};
use crate::sql::token::Operator;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Column name -> value. Every value is stored as text.
pub type Row = BTreeMap<String, String>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("Table not found: {0}")]
    UnknownTable(String),
    #[error("Column count ({columns}) does not match value count ({values})")]
    ColumnCountMismatch { columns: usize, values: usize },
}

/// A single `column op value` filter over rows
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Predicate {
    pub column: String,
    pub op: String,
    pub value: String,
}

impl Predicate {
    pub fn new(column: impl Into<String>, op: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            op: op.into(),
            value: value.into(),
        }
    }

    /// Rows without the named field never match
    pub fn matches(&self, row: &Row) -> bool {
        row.get(&self.column)
            .is_some_and(|field| compare_values(field, &self.op, &self.value))
    }
}

/// Compares two stored values
///
/// Both sides are tried as floating-point numbers first; if either does not
/// parse, the comparison falls back to plain string ordering. An operator
/// outside `= != < <= > >=` never matches.
pub fn compare_values(left: &str, op: &str, right: &str) -> bool {
    let Some(op) = Operator::from_symbol(op) else {
        return false;
    };

    let ordering = match (left.trim().parse::<f64>(), right.trim().parse::<f64>()) {
        (Ok(l), Ok(r)) => l.partial_cmp(&r),
        _ => Some(left.cmp(right)),
    };

    match op {
        Operator::Eq => ordering == Some(Ordering::Equal),
        Operator::NotEq => ordering != Some(Ordering::Equal),
        Operator::Lt => ordering == Some(Ordering::Less),
        Operator::LtEq => matches!(ordering, Some(Ordering::Less | Ordering::Equal)),
        Operator::Gt => ordering == Some(Ordering::Greater),
        Operator::GtEq => matches!(ordering, Some(Ordering::Greater | Ordering::Equal)),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    schema: TableSchema,
    rows: Vec<Row>,
}

impl Table {
    pub fn new(schema: TableSchema) -> Self {
        Self {
            schema,
            rows: Vec::new(),
        }
    }

    pub fn schema(&self) -> &TableSchema {
        &self.schema
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }
}

/// The mutable, in-memory table data. Keyed by lower-cased table name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowStore {
    tables: BTreeMap<String, Table>,
}

impl RowStore {
    /// One empty table per catalog entry
    pub fn new(catalog: &SchemaCatalog) -> Self {
        let tables = catalog
            .tables()
            .map(|schema| (schema.name.to_lowercase(), Table::new(schema.clone())))
            .collect();
        Self { tables }
    }

    /// Tables from the catalog pre-loaded with the bundled sample rows
    pub fn with_sample_rows(catalog: &SchemaCatalog) -> Self {
        let mut store = Self::new(catalog);
        for (table, rows) in sample_rows() {
            // Sample tables missing from a custom catalog are skipped.
            if let Ok(loaded) = store.load_rows(table, rows) {
                info!("Loaded {} sample row(s) into {}", loaded, table);
            }
        }
        store
    }

    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.get(&name.to_lowercase())
    }

    fn table_mut(&mut self, name: &str) -> Result<&mut Table, StoreError> {
        self.tables
            .get_mut(&name.to_lowercase())
            .ok_or_else(|| StoreError::UnknownTable(name.to_string()))
    }

    /// All tables in name order, for serialization
    pub fn tables(&self) -> impl Iterator<Item = (&str, &Table)> {
        self.tables.iter().map(|(name, table)| (name.as_str(), table))
    }

    pub fn row_count(&self, table: &str) -> Result<usize, StoreError> {
        self.get(table).map(|t| t.rows.len())
    }

    pub fn column_names(&self, table: &str) -> Result<Vec<String>, StoreError> {
        self.get(table).map(|t| t.schema.column_names())
    }

    fn get(&self, table: &str) -> Result<&Table, StoreError> {
        self.table(table)
            .ok_or_else(|| StoreError::UnknownTable(table.to_string()))
    }

    /// Inserts one row built positionally from `columns` and `values`
    ///
    /// Column names are stored in the schema's spelling. Schema columns the
    /// statement does not mention are filled with an empty string.
    pub fn insert_row(
        &mut self,
        table: &str,
        columns: &[String],
        values: &[String],
    ) -> Result<(), StoreError> {
        if columns.len() != values.len() {
            return Err(StoreError::ColumnCountMismatch {
                columns: columns.len(),
                values: values.len(),
            });
        }
        let target = self.table_mut(table)?;

        let mut row: Row = target
            .schema
            .columns
            .iter()
            .map(|column| (column.name.clone(), String::new()))
            .collect();
        for (column, value) in columns.iter().zip(values) {
            let name = target
                .schema
                .find_column(column)
                .map_or_else(|| column.clone(), |c| c.name.clone());
            row.insert(name, value.clone());
        }

        debug!("Inserting into {}: {:?}", table, row);
        target.rows.push(row);
        Ok(())
    }

    /// Bulk-loads positional rows in schema column order, without any
    /// semantic checking
    ///
    /// Rows whose field count differs from the schema are dropped. Returns
    /// the number of rows actually loaded.
    pub fn load_rows<I>(&mut self, table: &str, rows: I) -> Result<usize, StoreError>
    where
        I: IntoIterator<Item = Vec<String>>,
    {
        let target = self.table_mut(table)?;
        let names = target.schema.column_names();
        let mut loaded = 0;

        for values in rows {
            if values.len() != names.len() {
                warn!(
                    "Dropping row with {} field(s) for {} ({} expected)",
                    values.len(),
                    table,
                    names.len()
                );
                continue;
            }
            target.rows.push(names.iter().cloned().zip(values).collect());
            loaded += 1;
        }

        Ok(loaded)
    }

    pub fn rows(&self, table: &str) -> Result<Vec<Row>, StoreError> {
        self.get(table).map(|t| t.rows.clone())
    }

    pub fn filtered_rows(&self, table: &str, predicate: &Predicate) -> Result<Vec<Row>, StoreError> {
        let rows = self
            .get(table)?
            .rows
            .iter()
            .filter(|row| predicate.matches(row))
            .cloned()
            .collect();
        Ok(rows)
    }

    /// Sets `column` to `value` on every matching row and returns how many
    /// rows were touched
    pub fn update_rows(
        &mut self,
        table: &str,
        column: &str,
        value: &str,
        predicate: &Predicate,
    ) -> Result<usize, StoreError> {
        let target = self.table_mut(table)?;
        let mut count = 0;
        for row in target.rows.iter_mut().filter(|row| predicate.matches(row)) {
            row.insert(column.to_string(), value.to_string());
            count += 1;
        }
        Ok(count)
    }

    pub fn delete_rows(&mut self, table: &str, predicate: &Predicate) -> Result<usize, StoreError> {
        let target = self.table_mut(table)?;
        let before = target.rows.len();
        target.rows.retain(|row| !predicate.matches(row));
        Ok(before - target.rows.len())
    }

    pub fn delete_all_rows(&mut self, table: &str) -> Result<usize, StoreError> {
        let target = self.table_mut(table)?;
        let count = target.rows.len();
        target.rows.clear();
        Ok(count)
    }
}

fn sample_rows() -> Vec<(&'static str, Vec<Vec<String>>)> {
    fn rows(data: &[&[&str]]) -> Vec<Vec<String>> {
        data.iter()
            .map(|row| row.iter().map(|v| v.to_string()).collect())
            .collect()
    }

    vec![
        (
            "employees",
            rows(&[
                &["1", "Rahul Sharma", "28", "55000", "Engineering"],
                &["2", "Priya Patel", "32", "72000", "Marketing"],
                &["3", "Amit Kumar", "45", "95000", "Engineering"],
                &["4", "Sneha Gupta", "26", "48000", "HR"],
                &["5", "Vikram Singh", "38", "82000", "Sales"],
                &["6", "Anjali Verma", "29", "61000", "Engineering"],
                &["7", "Rajesh Nair", "41", "88000", "Marketing"],
                &["8", "Deepa Iyer", "35", "75000", "HR"],
            ]),
        ),
        (
            "departments",
            rows(&[
                &["1", "Engineering", "500000"],
                &["2", "Marketing", "300000"],
                &["3", "HR", "200000"],
                &["4", "Sales", "350000"],
            ]),
        ),
        (
            "users",
            rows(&[
                &["1", "rahul_dev", "rahul@example.com", "28", "active"],
                &["2", "priya_m", "priya@example.com", "32", "active"],
                &["3", "amit_k", "amit@example.com", "45", "inactive"],
                &["4", "sneha_g", "sneha@example.com", "26", "active"],
                &["5", "vikram_s", "vikram@example.com", "38", "active"],
            ]),
        ),
        (
            "products",
            rows(&[
                &["1", "Laptop", "75000.50", "25"],
                &["2", "Mouse", "500.00", "150"],
                &["3", "Keyboard", "1500.00", "80"],
                &["4", "Monitor", "22000.00", "40"],
                &["5", "Headphones", "3500.00", "100"],
            ]),
        ),
    ]
}
