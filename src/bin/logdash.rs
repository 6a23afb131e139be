//! logdash - command-line front end for the log query engine

use clap::{Args, Parser, Subcommand, ValueEnum};
use logdash::config::Config;
use logdash::logging::{apply_logging_config, init_early_logging};
use logdash::{
    DashboardView, DistinctValues, FilterCriteria, LogColumn, LogQueryEngine, LogRecord, PageRequest,
    Statistics,
};
use serde::Serialize;
use std::{path::PathBuf, process};

#[derive(Parser)]
#[command(name = "logdash")]
#[command(about = "logdash - browse unified system logs kept in SQLite or PostgreSQL", long_about = None)]
struct Cli {
    /// Configuration file (defaults to the per-user config directory)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Override the store location: a database file or a connection string
    #[arg(long, global = true)]
    store: Option<String>,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Args)]
struct FilterArgs {
    /// Substring of the host address
    #[arg(long)]
    ip: Option<String>,
    /// Exact operating system family
    #[arg(long)]
    os: Option<String>,
    /// Exact log level
    #[arg(long)]
    level: Option<String>,
    /// Substring of the source
    #[arg(long)]
    source: Option<String>,
    /// Page number; missing or invalid values show the first page
    #[arg(short, long)]
    page: Option<String>,
}

impl FilterArgs {
    fn criteria(&self) -> FilterCriteria {
        FilterCriteria {
            ip_address: self.ip.clone(),
            os_type: self.os.clone(),
            log_level: self.level.clone(),
            source: self.source.clone(),
        }
        .normalized()
    }

    fn page(&self) -> PageRequest {
        PageRequest::from_param(self.page.as_deref())
    }
}

#[derive(Subcommand)]
enum Commands {
    /// List one page of records, newest first
    Logs {
        #[command(flatten)]
        filters: FilterArgs,
    },

    /// Show statistics over the whole log table
    Stats,

    /// Show the distinct values available for each filter
    Values,

    /// Everything a dashboard page shows: records, statistics and filter values
    Dashboard {
        #[command(flatten)]
        filters: FilterArgs,
    },
}

fn main() {
    if let Err(e) = run_application() {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

fn run_application() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_early_logging()?;
    let mut config = match cli.config.clone().or_else(Config::default_path) {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    if let Some(store) = &cli.store {
        config.store.url = store.clone();
        config.validate()?;
    }

    apply_logging_config(&config.logging);
    let engine = LogQueryEngine::from_config(&config)?;

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(execute(&engine, &cli))
}

async fn execute(engine: &LogQueryEngine, cli: &Cli) -> anyhow::Result<()> {
    match &cli.command {
        Commands::Logs { filters } => {
            let page = filters.page();
            let logs = engine
                .fetch_page(&filters.criteria(), page.limit(), page.offset())
                .await?;
            emit(cli.format, &logs, || print_logs(&logs))
        }
        Commands::Stats => {
            let stats = engine.compute_statistics().await?;
            emit(cli.format, &stats, || print_stats(&stats))
        }
        Commands::Values => {
            let values = engine.list_distinct_values().await?;
            emit(cli.format, &values, || print_values(&values))
        }
        Commands::Dashboard { filters } => {
            let view = engine.dashboard(&filters.criteria(), filters.page()).await?;
            emit(cli.format, &view, || print_dashboard(&view))
        }
    }
}

fn emit<T: Serialize>(format: OutputFormat, value: &T, text: impl FnOnce()) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
        OutputFormat::Text => text(),
    }
    Ok(())
}

fn print_logs(logs: &[LogRecord]) {
    if logs.is_empty() {
        println!("No records on this page.");
        return;
    }
    for record in logs {
        let column = |c| record.field(c).unwrap_or("-");
        println!(
            "{:<19} {:<8} {:<8} {:<15} {:<20} {}",
            display_timestamp(record),
            column(LogColumn::LogLevel),
            column(LogColumn::OsType),
            column(LogColumn::IpAddress),
            column(LogColumn::Source),
            record.message().unwrap_or(""),
        );
    }
}

/// Timestamps in one layout (UTC, to the second) whatever format the store used.
fn display_timestamp(record: &LogRecord) -> String {
    match record.parsed_timestamp() {
        Some(ts) => ts.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => record.field(LogColumn::Timestamp).unwrap_or("-").to_string(),
    }
}

fn print_stats(stats: &Statistics) {
    println!("Log Statistics");
    println!("==============\n");
    println!("Total records: {}", stats.total);
    println!("Unique hosts:  {}", stats.unique_hosts);
    println!("\nBy OS:");
    for (os, count) in &stats.by_os {
        println!("  {:<16} {}", os, count);
    }
    println!("\nBy level:");
    for (level, count) in &stats.by_level {
        println!("  {:<16} {}", level, count);
    }
}

fn print_values(values: &DistinctValues) {
    for (title, list) in [
        ("IP addresses", &values.ips),
        ("OS types", &values.os_types),
        ("Levels", &values.levels),
        ("Sources", &values.sources),
    ] {
        println!("{} ({}):", title, list.len());
        for value in list {
            println!("  {}", value);
        }
    }
}

fn print_dashboard(view: &DashboardView) {
    print_stats(&view.stats);
    println!();
    print_logs(&view.logs);
    println!(
        "\nPage {} of {} ({} per page)",
        view.page,
        view.total_pages.max(1),
        view.limit
    );
}
