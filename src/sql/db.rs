//! In-memory database
//!
//! Owns the schema catalog and the row store, and drives a query string
//! through every phase:
//!
//! - Tokenize. Any lexical diagnostic stops here.
//! - Parse. The first syntax error stops here.
//! - Validate against the catalog. Semantic errors stop here.
//! - Execute against the row store.
//!
//! # Example
//! ```
//! use minisql::sql::db::Database;
//!
//! let mut db = Database::with_sample_data();
//! let result = db.execute("SELECT name FROM employees WHERE age < 30;").unwrap();
//! assert!(result.success);
//! assert_eq!(result.rows.map(|rows| rows.len()), Some(3));
//! ```

use super::core::schema::SchemaCatalog;
use super::diagnostic::CompileError;
use super::execute::{Executor, QueryResult};
use super::parser::{self, SyntaxNode};
use super::semantic::{Validator, Warning};
use super::storage::table::{RowStore, StoreError};
use super::tokenizer;
use tracing::{debug, info, warn};

/// A statement that made it through every compile phase
///
/// Only [`Database::compile`] builds one, so its tree has always passed
/// validation against some catalog.
#[derive(Debug, Clone)]
pub struct Compiled {
    root: SyntaxNode,
    warnings: Vec<Warning>,
}

impl Compiled {
    pub fn root(&self) -> &SyntaxNode {
        &self.root
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }
}

#[derive(Debug, Clone)]
pub struct Database {
    catalog: SchemaCatalog,
    store: RowStore,
}

impl Database {
    /// Creates a database with one empty table per catalog entry
    pub fn new(catalog: SchemaCatalog) -> Self {
        if catalog.is_empty() {
            warn!("Database created with an empty catalog; every query will fail validation");
        } else {
            info!("Database created with {} table(s)", catalog.len());
        }
        let store = RowStore::new(&catalog);
        Self { catalog, store }
    }

    /// The bundled schema, pre-loaded with its sample rows
    pub fn with_sample_data() -> Self {
        let catalog = SchemaCatalog::sample();
        let store = RowStore::with_sample_rows(&catalog);
        Self { catalog, store }
    }

    pub fn catalog(&self) -> &SchemaCatalog {
        &self.catalog
    }

    pub fn store(&self) -> &RowStore {
        &self.store
    }

    /// Bulk-loads pre-validated rows, bypassing the compiler
    pub fn load_rows<I>(&mut self, table: &str, rows: I) -> Result<usize, StoreError>
    where
        I: IntoIterator<Item = Vec<String>>,
    {
        self.store.load_rows(table, rows)
    }

    /// Runs the tokenizer, parser and validator without touching any rows
    pub fn compile(&self, sql: &str) -> Result<Compiled, CompileError> {
        debug!("Compiling: {}", sql);

        let tokenized = tokenizer::tokenize(sql);
        if tokenized.has_errors() {
            return Err(CompileError::Lexical(tokenized.diagnostics));
        }

        let root = parser::parse(&tokenized.tokens).map_err(CompileError::Syntax)?;

        let validation = Validator::new(&self.catalog).validate(&root);
        if !validation.is_valid() {
            return Err(CompileError::Semantic(validation.diagnostics));
        }

        Ok(Compiled {
            root,
            warnings: validation.warnings,
        })
    }

    /// Compiles and, if every phase passes, executes one statement
    pub fn execute(&mut self, sql: &str) -> Result<QueryResult, CompileError> {
        let compiled = self.compile(sql)?;
        Ok(self.run(&compiled))
    }

    /// Executes a statement returned by [`Database::compile`]
    ///
    /// The tree is not re-validated. The caller must pass a statement
    /// compiled by this database (or one sharing its catalog); a tree
    /// validated elsewhere may name tables this store does not hold, which
    /// comes back as a failed result.
    pub fn run(&mut self, compiled: &Compiled) -> QueryResult {
        let result = Executor::new(&mut self.store).execute(&compiled.root);
        info!("{}", result.message);
        result
    }
}

impl Default for Database {
    fn default() -> Self {
        Self::with_sample_data()
    }
}
