//! quire CLI - query and prune spreadsheet tables from the shell
//!
//! Usage:
//!   quire get Users                         Print every row as JSON
//!   quire get Users -w "Age >= 30" -l 10    Filtered, at most 10 rows
//!   quire count Users -w "Name contains li" Count matching rows
//!   quire delete Users 0                    Delete the first data row
//!   quire delete-where Users "Status = done"
//!
//! Connection settings come from `--config quire.toml`, then the
//! `QUIRE_SPREADSHEET_ID` / `QUIRE_ACCESS_TOKEN` / `QUIRE_BASE_URL`
//! environment variables, then flags.

mod config;
mod expr;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use quire::{Cell, Db, Query, RowSet};
use serde_json::{Map, Value};
use std::path::PathBuf;

use config::CliConfig;
use expr::parse_filter;

#[derive(Parser)]
#[command(name = "quire")]
#[command(about = "Document-style access to Google Sheets", long_about = None)]
#[command(version)]
struct Cli {
    #[command(flatten)]
    connection: ConnectionArgs,

    /// Log level (error, warn, info, debug, trace); RUST_LOG takes precedence
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug, Default)]
struct ConnectionArgs {
    /// TOML file with spreadsheet_id, access_token, base_url, timeout_secs
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Spreadsheet ID
    #[arg(long, global = true)]
    spreadsheet_id: Option<String>,

    /// OAuth2 bearer token
    #[arg(long, global = true)]
    access_token: Option<String>,

    /// Sheets API endpoint
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Request timeout in seconds
    #[arg(long, global = true, allow_negative_numbers = true)]
    timeout: Option<f64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print matching rows, one JSON object per line
    Get {
        /// Sheet name
        table: String,

        /// Filter expression `COL OP VALUE` (repeatable, ANDed)
        #[arg(short = 'w', long = "where")]
        filters: Vec<String>,

        /// Maximum number of rows (0 = unlimited)
        #[arg(short, long, default_value_t = 0)]
        limit: i64,
    },
    /// Print the number of matching rows
    Count {
        /// Sheet name
        table: String,

        /// Filter expression `COL OP VALUE` (repeatable, ANDed)
        #[arg(short = 'w', long = "where")]
        filters: Vec<String>,
    },
    /// Delete one data row by 0-based index (header excluded)
    Delete {
        /// Sheet name
        table: String,

        /// Row index
        #[arg(allow_negative_numbers = true)]
        row: i64,
    },
    /// Delete every row matching a filter expression
    DeleteWhere {
        /// Sheet name
        table: String,

        /// Filter expression `COL OP VALUE`
        filter: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level)?;

    let rt = tokio::runtime::Runtime::new().context("Failed to create tokio runtime")?;
    rt.block_on(run(cli))
}

async fn run(cli: Cli) -> Result<()> {
    let db = open(&cli.connection)?;

    match cli.command {
        Commands::Get {
            table,
            filters,
            limit,
        } => {
            let query = build_query(&db, &table, &filters)?.limit(limit);
            let set = query
                .fetch_rows()
                .await
                .with_context(|| format!("Failed to read {}", table))?;
            for line in render_rows(&set) {
                println!("{}", line);
            }
        }
        Commands::Count { table, filters } => {
            let count = build_query(&db, &table, &filters)?
                .count()
                .await
                .with_context(|| format!("Failed to read {}", table))?;
            println!("{}", count);
        }
        Commands::Delete { table, row } => {
            db.table(&table)
                .delete(row)
                .await
                .with_context(|| format!("Failed to delete row {} of {}", row, table))?;
            println!("Deleted row {} of {}", row, table);
        }
        Commands::DeleteWhere { table, filter } => {
            let filter = parse_filter(&filter)?;
            let deleted = db
                .table(&table)
                .delete_where(&filter.column, filter.operator.as_str(), filter.value)
                .await
                .with_context(|| format!("Failed to delete from {}", table))?;
            println!("Deleted {} row(s) from {}", deleted, table);
        }
    }

    Ok(())
}

fn open(args: &ConnectionArgs) -> Result<Db> {
    let file = match &args.config {
        Some(path) => CliConfig::load(path)?,
        None => CliConfig::default(),
    };
    let flags = CliConfig {
        spreadsheet_id: args.spreadsheet_id.clone(),
        access_token: args.access_token.clone(),
        base_url: args.base_url.clone(),
        timeout_secs: args.timeout,
    };

    let config = file
        .merge(CliConfig::from_env())
        .merge(flags)
        .into_sheets_config()
        .context("Invalid configuration")?;
    quire_sheets::connect(config).context("Failed to connect")
}

fn build_query(db: &Db, table: &str, filters: &[String]) -> Result<Query> {
    filters.iter().try_fold(db.table(table).query(), |query, expr| {
        Ok(query.filter(parse_filter(expr)?))
    })
}

/// One JSON object per row, keyed by header text.
fn render_rows(set: &RowSet) -> Vec<String> {
    set.rows
        .iter()
        .map(|row| {
            let object: Map<String, Value> = set
                .header
                .iter()
                .enumerate()
                .map(|(i, name)| {
                    let value = row.get(i).map(Cell::to_json).unwrap_or(Value::Null);
                    (name.to_text().into_owned(), value)
                })
                .collect();
            Value::Object(object).to_string()
        })
        .collect()
}

fn init_logging(level: &str) -> Result<()> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init()
        .ok(); // Ignore error if already initialized

    Ok(())
}
