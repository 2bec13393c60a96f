use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::{Parser, Subcommand, ValueEnum};
use securityhub_aws::client::SecurityHubClient;
use securityhub_aws::config::AdapterConfig;
use securityhub_aws::export::{
    rows_to_record_batch, write_json_lines, write_parquet, JsonLinesSink,
};
use securityhub_aws::logging::{init_logging, LogFormat};
use securityhub_core::query::{parse_filter_expression, QueryContext};
use securityhub_core::schema::{key_column, COLUMNS, TABLE_DESCRIPTION, TABLE_NAME};
use securityhub_core::table::{resolve_columns, CollectingSink, FindingsTable};

#[derive(Parser)]
#[command(
    name = "securityhub_findings",
    about = "Query AWS Security Hub findings as table rows"
)]
struct Cli {
    /// AWS region [default: SECURITYHUB_REGION, then the AWS configuration chain]
    #[arg(long, global = true)]
    region: Option<String>,
    /// Security Hub endpoint URL [default: SECURITYHUB_ENDPOINT]
    #[arg(long, global = true)]
    endpoint: Option<String>,
    /// Log output format on stderr
    #[arg(value_enum, long, global = true, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List findings, pushing supported filters down to Security Hub
    List {
        /// Predicate such as `record_state<>ARCHIVED` (repeatable)
        #[arg(long = "filter", short = 'f')]
        filters: Vec<String>,
        /// Maximum number of rows to return
        #[arg(long)]
        limit: Option<i64>,
        /// Comma-separated output columns (default: all)
        #[arg(long, value_delimiter = ',')]
        columns: Vec<String>,
        #[arg(value_enum, long, default_value_t = OutputFormat::Json)]
        format: OutputFormat,
        /// Output file (required for parquet, stdout otherwise)
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Fetch a single finding by id
    Get {
        id: String,
        /// Comma-separated output columns (default: all)
        #[arg(long, value_delimiter = ',')]
        columns: Vec<String>,
    },
    /// Print the table schema
    Columns,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// JSON lines
    Json,
    Parquet,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_format);

    let config = AdapterConfig::from_env().with_overrides(cli.region, cli.endpoint);

    match cli.command {
        Commands::Columns => print_columns(),
        Commands::Get { id, columns } => {
            let client = SecurityHubClient::connect(&config)?;
            let row = FindingsTable::get(&client, &id, &columns)?;
            write_json_lines(io::stdout().lock(), row.as_slice())?;
            Ok(())
        }
        Commands::List {
            filters,
            limit,
            columns,
            format,
            output,
        } => {
            let mut ctx = QueryContext {
                columns,
                limit,
                ..QueryContext::default()
            };
            for expression in &filters {
                let (name, qual) = parse_filter_expression(expression)
                    .with_context(|| format!("invalid filter '{expression}'"))?;
                ctx = ctx.with_qual(&name, qual);
            }

            if matches!(format, OutputFormat::Parquet) && output.is_none() {
                bail!("--output is required for parquet output");
            }

            let client = SecurityHubClient::connect(&config)?;
            match (format, output) {
                (OutputFormat::Json, output) => stream_json(&client, &ctx, output),
                (OutputFormat::Parquet, Some(path)) => write_parquet_file(&client, &ctx, &path),
                (OutputFormat::Parquet, None) => bail!("--output is required for parquet output"),
            }
        }
    }
}

/// Rows are written as each page is projected; nothing beyond the current
/// page is held in memory.
fn stream_json(
    client: &SecurityHubClient,
    ctx: &QueryContext,
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    let writer: Box<dyn Write> = match output {
        Some(path) => {
            let file = std::fs::File::create(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            Box::new(io::BufWriter::new(file))
        }
        None => Box::new(io::stdout().lock()),
    };

    let mut sink = JsonLinesSink::new(writer, ctx.limit);
    FindingsTable::scan(client, ctx, &mut sink)?;
    let written = sink.finish()?;
    tracing::info!(rows = written, region = client.region(), "listed findings");
    Ok(())
}

/// Parquet needs the whole batch, so rows are collected first.
fn write_parquet_file(
    client: &SecurityHubClient,
    ctx: &QueryContext,
    path: &Path,
) -> anyhow::Result<()> {
    let mut sink = CollectingSink::for_limit(ctx.limit);
    FindingsTable::scan(client, ctx, &mut sink)?;
    let rows = sink.into_rows();
    tracing::info!(rows = rows.len(), region = client.region(), "listed findings");

    let columns = resolve_columns(&ctx.columns)?;
    let batch = rows_to_record_batch(&columns, &rows)?;
    write_parquet(path, &batch).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

fn print_columns() -> anyhow::Result<()> {
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{TABLE_NAME}: {TABLE_DESCRIPTION}")?;
    for column in COLUMNS {
        let operators = key_column(column.name)
            .map(|key| {
                key.operators
                    .iter()
                    .map(|operator| operator.as_str())
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .unwrap_or_default();
        writeln!(
            stdout,
            "{:<24} {:<10} {:<8} {}",
            column.name,
            column.column_type.as_str(),
            operators,
            column.description
        )?;
    }
    Ok(())
}
