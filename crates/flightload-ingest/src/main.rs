//! Flightload Ingest - load flat-file flight data into a document store

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use flightload_common::logging::{init_logging, LogConfig, LogLevel};
use flightload_common::EntityKind;
use flightload_ingest::store::HttpStoreConfig;
use flightload_ingest::{
    DocumentStore, ErrorSink, HttpDocumentStore, IngestConfig, IngestReport, MemoryStore,
    Pipeline, WriteMode,
};
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(name = "flightload-ingest")]
#[command(author, version, about = "Load airline, airport, country and route data")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Directory containing the .dat files
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Append-only failure log
    #[arg(long, global = true)]
    error_log: Option<PathBuf>,

    /// Write mode: batched or per_record
    #[arg(long, global = true)]
    mode: Option<WriteMode>,

    /// Documents per batch in batched mode
    #[arg(long, global = true)]
    batch_size: Option<usize>,

    /// Pause between batches, in milliseconds
    #[arg(long, global = true)]
    batch_pause_ms: Option<u64>,

    /// Concurrent writes in per-record mode
    #[arg(long, global = true)]
    max_in_flight: Option<usize>,

    /// Document store base URL
    #[arg(long, global = true)]
    store_url: Option<String>,

    /// Write into an in-memory store that checks references, without a server
    #[arg(long, global = true)]
    dry_run: bool,

    /// Show a progress spinner per entity
    #[arg(long, global = true)]
    progress: bool,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load a single entity file
    Load {
        /// Entity type (airline, airport, country, route)
        entity: EntityKind,

        /// Input file (defaults to the entity's file in the data directory)
        #[arg(short, long)]
        input: Option<PathBuf>,
    },

    /// Load every entity, countries first and routes last
    All,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let error_log = fallback_error_log(&cli);

    let log_level = if cli.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Info
    };
    let base = LogConfig::builder()
        .level(log_level)
        .log_file_prefix("flightload-ingest")
        .build();

    // A degraded or failed run still exits normally; failures are in the logs
    let mut setup_errors = Vec::new();
    let log_config = base.clone().merge_env().unwrap_or_else(|e| {
        setup_errors.push(e.context("Invalid logging configuration"));
        base.clone()
    });
    let _guard = match init_logging(&log_config) {
        Ok(guard) => guard,
        Err(e) => {
            setup_errors.push(e.context("Failed to initialize logging"));
            init_logging(&base).unwrap_or_else(|e| {
                eprintln!("Logging disabled: {e:#}");
                None
            })
        },
    };

    for e in setup_errors {
        report_general_error(&error_log, &e);
    }

    if let Err(e) = run(cli).await {
        report_general_error(&error_log, &e);
    }

    Ok(())
}

fn report_general_error(error_log: &Path, e: &anyhow::Error) {
    error!(error = %format!("{e:#}"), "General error");
    ErrorSink::new(error_log).append(format!("General error: {e:#}"));
}

/// Error log path usable before the full configuration is validated
fn fallback_error_log(cli: &Cli) -> PathBuf {
    cli.error_log
        .clone()
        .or_else(|| std::env::var_os("FLIGHTLOAD_ERROR_LOG").map(PathBuf::from))
        .unwrap_or_else(|| IngestConfig::default().error_log)
}

async fn run(cli: Cli) -> Result<()> {
    let config = build_config(&cli)?;
    let sink = ErrorSink::new(&config.error_log);
    let store = build_store(&cli, &config)?;

    info!(
        mode = %config.writer.mode,
        batch_size = config.writer.batch_size,
        error_log = %config.error_log.display(),
        dry_run = cli.dry_run,
        "Starting ingestion"
    );

    let pipeline = Pipeline::from_config(store.as_ref(), &sink, &config);
    let reports = match cli.command {
        Command::Load { entity, input } => {
            let path = input.unwrap_or_else(|| config.input_path(entity));
            vec![pipeline.run_file(entity, path).await]
        },
        Command::All => pipeline.run_all(&config).await,
    };

    for report in &reports {
        log_report(report);
    }

    if sink.entries() > 0 {
        warn!(
            entries = sink.entries(),
            path = %sink.path().display(),
            "Some records failed, see the error log"
        );
    }

    info!("Ingestion complete");
    Ok(())
}

fn build_config(cli: &Cli) -> Result<IngestConfig> {
    let mut config = IngestConfig::from_env().context("Invalid ingest configuration")?;

    if let Some(ref dir) = cli.data_dir {
        config.data_dir = dir.clone();
    }
    if let Some(ref path) = cli.error_log {
        config.error_log = path.clone();
    }
    if let Some(mode) = cli.mode {
        config.writer.mode = mode;
    }
    if let Some(size) = cli.batch_size {
        config.writer.batch_size = size;
    }
    if let Some(pause) = cli.batch_pause_ms {
        config.writer.batch_pause_ms = pause;
    }
    if let Some(limit) = cli.max_in_flight {
        config.writer.max_in_flight = limit;
    }
    if let Some(ref url) = cli.store_url {
        config.store.url = Some(url.clone());
    }
    config.show_progress |= cli.progress;

    config.validate().context("Invalid ingest configuration")?;
    Ok(config)
}

fn build_store(cli: &Cli, config: &IngestConfig) -> Result<Box<dyn DocumentStore>> {
    if cli.dry_run {
        return Ok(Box::new(MemoryStore::with_reference_checks()));
    }

    let base_url = config
        .store
        .url
        .clone()
        .context("FLIGHTLOAD_STORE_URL or --store-url is required unless --dry-run is set")?;

    let store = HttpDocumentStore::new(HttpStoreConfig {
        base_url,
        secret: config.store.secret.clone(),
        timeout: config.store.timeout(),
    })?;
    Ok(Box::new(store))
}

fn log_report(report: &IngestReport) {
    info!(
        entity = %report.entity,
        records_read = report.records_read,
        records_dropped = report.records_dropped,
        source_failed = report.source_failed,
        units_attempted = report.write.units_attempted,
        units_failed = report.write.units_failed,
        documents_written = report.write.documents_written,
        documents_failed = report.write.documents_failed,
        "Entity summary"
    );
}
