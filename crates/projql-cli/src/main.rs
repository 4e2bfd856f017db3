//! projql command-line runner
//!
//! Loads a JSON fixture into the in-memory backend and runs projection
//! queries described in JSON files against it.

mod error;
mod formatter;
mod query_file;

#[cfg(feature = "mimalloc")]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use projql_core::{Fixture, ProcessorConfig, ProjectionProcessor};
use projql_proto::JoinKind;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::error::Result;
use crate::formatter::OutputFormat;
use crate::query_file::QueryFile;

/// projql command-line runner
#[derive(Parser, Debug)]
#[command(name = "projql")]
#[command(version, about = "Run projection queries against a JSON fixture")]
pub struct Args {
    /// Fixture with the schema and records
    #[arg(short = 'd', long)]
    pub fixture: PathBuf,

    /// Query files, run in order
    #[arg(short = 'q', long = "query", required = true)]
    pub queries: Vec<PathBuf>,

    /// Output format
    #[arg(long, default_value = "table", value_enum)]
    pub format: OutputFormat,

    /// Join kind for relations without a declaration
    #[arg(long, default_value = "inner", value_enum)]
    pub default_join: JoinArg,

    /// Maximum alias rewrites applied to one path
    #[arg(long, default_value_t = projql_core::config::DEFAULT_MAX_ALIAS_REWRITES)]
    pub max_alias_rewrites: usize,

    /// Read `relation.<identifier>` through the foreign key on LEFT to-one joins
    #[arg(long)]
    pub skip_identifier_joins: bool,
}

/// Join kind accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum JoinArg {
    Inner,
    Left,
}

impl From<JoinArg> for JoinKind {
    fn from(arg: JoinArg) -> Self {
        match arg {
            JoinArg::Inner => JoinKind::Inner,
            JoinArg::Left => JoinKind::Left,
        }
    }
}

impl Args {
    fn processor_config(&self) -> ProcessorConfig {
        ProcessorConfig::new()
            .with_default_join_kind(self.default_join.into())
            .with_max_alias_rewrites(self.max_alias_rewrites)
            .with_skip_identifier_joins(self.skip_identifier_joins)
    }
}

fn main() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("projql=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    if let Err(e) = run(&args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(args: &Args) -> Result<()> {
    let backend = Fixture::from_path(&args.fixture)?.into_backend()?;
    let processor = ProjectionProcessor::new(backend).with_config(args.processor_config());
    let formatter = formatter::create_formatter(args.format);

    for path in &args.queries {
        let file = QueryFile::load(path)?;
        let columns = file.columns();
        let query = file.to_query();

        let output = if file.paging.is_some() {
            let page = processor.execute_page(&query)?;
            info!(query = %file.name, rows = page.content.len(), total = page.total_elements, "query finished");
            formatter.format_page(&columns, &page)
        } else {
            let rows = processor.execute(&query)?;
            info!(query = %file.name, rows = rows.len(), "query finished");
            formatter.format_rows(&columns, &rows)
        };
        println!("{}", output);
    }

    Ok(())
}
