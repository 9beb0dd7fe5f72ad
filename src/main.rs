use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

pub mod cli;

fn main() -> Result<()> {
    let args = cli::Args::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log));
    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    cli::run(args)
}
