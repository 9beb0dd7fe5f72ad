use anyhow::{anyhow, Result};
use clap::Parser;
use minisql::sql::core::schema::SchemaCatalog;
use minisql::{render_report, Database};
use tracing::info;

/// Compile and run restricted SQL queries against in-memory tables
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Queries to run in order, each terminated by ';'
    #[arg(value_name = "QUERY", required = true)]
    pub queries: Vec<String>,

    /// Stop after semantic validation
    #[arg(long)]
    pub check: bool,

    /// Start with empty tables instead of the sample rows
    #[arg(long)]
    pub empty: bool,

    /// Print the syntax tree of each accepted query
    #[arg(long)]
    pub tree: bool,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, value_name = "FILTER", default_value = "warn")]
    pub log: String,
}

impl Args {
    pub fn database(&self) -> Database {
        if self.empty {
            Database::new(SchemaCatalog::sample())
        } else {
            Database::with_sample_data()
        }
    }
}

/// Compiles one query and prints its tree, warnings and result
///
/// Returns whether the query got through every phase.
pub fn handle_query(db: &mut Database, sql: &str, args: &Args) -> bool {
    info!("Query: {}", sql);

    let compiled = match db.compile(sql) {
        Ok(compiled) => compiled,
        Err(err) => {
            eprint!("{}", render_report(sql, err.diagnostics()));
            eprintln!("{}", err);
            return false;
        }
    };

    for warning in compiled.warnings() {
        eprintln!(
            "Warning at Line {}, Column {}: {}",
            warning.position.line, warning.position.column, warning.message
        );
    }
    if args.tree {
        print!("{}", compiled.root());
    }
    if args.check {
        println!("valid");
        return true;
    }

    let result = db.run(&compiled);
    println!("{}", result);
    result.success
}

pub fn run(args: Args) -> Result<()> {
    let mut db = args.database();
    let mut failed = 0;
    for sql in &args.queries {
        if !handle_query(&mut db, sql, &args) {
            failed += 1;
        }
    }

    if failed > 0 {
        return Err(anyhow!("{} of {} queries failed", failed, args.queries.len()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_args() -> Result<()> {
        let args = Args::try_parse_from(["minisql", "--check", "--tree", "SELECT * FROM users;"])?;
        assert!(args.check && args.tree && !args.empty);
        assert_eq!(args.log, "warn");
        assert_eq!(args.queries, vec!["SELECT * FROM users;"]);
        assert!(Args::try_parse_from(["minisql"]).is_err());
        Ok(())
    }

    #[test]
    fn test_empty_database() -> Result<()> {
        let args = Args::try_parse_from(["minisql", "--empty", "SELECT * FROM users;"])?;
        let mut db = args.database();
        assert!(handle_query(&mut db, &args.queries[0], &args));
        assert_eq!(db.store().row_count("users")?, 0);
        Ok(())
    }

    #[test]
    fn test_failed_queries_are_counted() {
        let args = Args::try_parse_from([
            "minisql",
            "SELECT * FROM users;",
            "UPDATE users SET age = 1;",
        ])
        .expect("valid args");
        assert!(run(args).is_err());
    }
}
