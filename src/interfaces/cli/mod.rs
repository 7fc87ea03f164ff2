/// CLI Interface Module
///
/// Command-line entry point for the price index. Builds a book from a JSON
/// config file and/or flags, optionally restores a snapshot, replays a JSON
/// command file through `PriceIndexService` and prints one JSON output per
/// line.
///
/// ## Responsibilities
/// - Parse command-line arguments
/// - Initialize logging
/// - Resolve the book configuration (file, then flag overrides)
/// - Replay commands, write snapshots, dump metrics
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::application::{IndexCommand, PriceIndexService};
use crate::domain::error::{ConfigError, PriceIndexError};
use crate::domain::orderbook::{BookConfig, BookSnapshot, PriceBook};
use crate::shared::metrics::METRICS;

/// Price index command-line configuration
#[derive(Parser, Debug, Clone)]
#[command(name = "price-index")]
#[command(version)]
#[command(about = "Radix-15 tiered bitmap price index", long_about = None)]
pub struct CliConfig {
    /// JSON book configuration file
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,

    /// Mapped price stored at internal price 0 (overrides the file)
    #[arg(short = 'b', long)]
    pub base_price: Option<u64>,

    /// Fixed-point digits of the external price unit (overrides the file)
    #[arg(short = 'd', long)]
    pub decimal_scale: Option<u8>,

    /// JSON file holding an array of commands to replay
    #[arg(short = 'f', long)]
    pub commands: Option<PathBuf>,

    /// Restore the book from a snapshot before replaying
    #[arg(long)]
    pub snapshot_in: Option<PathBuf>,

    /// Write a snapshot of the book after replaying
    #[arg(long)]
    pub snapshot_out: Option<PathBuf>,

    /// Print Prometheus metrics after replaying
    #[arg(long, default_value_t = false)]
    pub metrics: bool,

    /// Log level
    #[arg(short = 'l', long, default_value = "info", value_parser = ["trace", "debug", "info", "warn", "error"])]
    pub log_level: String,

    /// Only print the resolved configuration
    #[arg(long, default_value_t = false)]
    pub dry_run: bool,
}

/// CLI failures
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Index(#[from] PriceIndexError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Runs the CLI application
pub fn run() -> ExitCode {
    let config = CliConfig::parse();
    init_logging(&config.log_level);

    info!(?config, "price index starting");

    let stdout = io::stdout();
    match execute(&config, &mut stdout.lock()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "price index failed");
            eprintln!("error: {}", err);
            ExitCode::FAILURE
        }
    }
}

/// Config file (or defaults) with flag overrides applied, validated
pub fn resolve_book_config(config: &CliConfig) -> Result<BookConfig, ConfigError> {
    let mut book = match &config.config {
        Some(path) => BookConfig::from_json_file(path)?,
        None => BookConfig::default(),
    };
    if let Some(base_price) = config.base_price {
        book.base_price = base_price;
    }
    if let Some(decimal_scale) = config.decimal_scale {
        book.decimal_scale = decimal_scale;
    }
    book.validate()?;
    Ok(book)
}

/// Does everything `run` does, writing results to `out`
pub fn execute(config: &CliConfig, out: &mut impl Write) -> Result<(), CliError> {
    let book_config = resolve_book_config(config)?;

    if config.dry_run {
        writeln!(out, "{}", serde_json::to_string(&book_config)?)?;
        return Ok(());
    }

    let book = match &config.snapshot_in {
        Some(path) => {
            let snapshot = BookSnapshot::from_bytes(&fs::read(path)?)?;
            let overridden = config.config.is_some()
                || config.base_price.is_some()
                || config.decimal_scale.is_some();
            if overridden && snapshot.config != book_config {
                warn!(snapshot = ?snapshot.config, "snapshot configuration wins over flags");
            }
            PriceBook::restore(&snapshot)?
        }
        None => PriceBook::new(book_config)?,
    };
    info!(
        base_price = book.config().base_price,
        decimal_scale = book.config().decimal_scale,
        "book ready"
    );

    let mut service = PriceIndexService::new(book);
    if let Some(path) = &config.commands {
        let commands: Vec<IndexCommand> = serde_json::from_str(&fs::read_to_string(path)?)?;
        for output in service.run(commands) {
            writeln!(out, "{}", serde_json::to_string(&output)?)?;
        }
        info!(
            applied = service.applied(),
            rejected = service.rejected(),
            "command replay finished"
        );
    }

    if let Some(path) = &config.snapshot_out {
        fs::write(path, service.index().snapshot().to_bytes()?)?;
        info!(path = %path.display(), "snapshot written");
    }

    if config.metrics {
        write!(out, "{}", METRICS.export())?;
    }
    Ok(())
}

/// Initialize logging; `RUST_LOG` overrides `level`
fn init_logging(level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    if tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .try_init()
        .is_err()
    {
        eprintln!("logging already initialised");
    }
}
