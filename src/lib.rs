//! minisql compiles a small SQL dialect (SELECT, INSERT, UPDATE and DELETE
//! with a single-condition WHERE) and runs it against in-memory tables.

pub mod sql;

pub use sql::db::{Compiled, Database};
pub use sql::diagnostic::{render_report, CompileError, CompilerDiagnostic, DiagnosticKind};
pub use sql::execute::QueryResult;
