//! arev-server - Annotation review backend
//!
//! `serve` (default) runs the HTTP service; `reorganize` runs the ingest
//! pipeline over local JSONL files and prints the result to stdout.

use std::fs::OpenOptions;
use std::io::Write;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::io::BufReader;
use tokio::signal;
use tracing::info;
use tracing_subscriber::EnvFilter;

use arev_common::config::{CliOverrides, LoggingConfig, RootFolderInitializer, ServiceSettings};
use arev_server::api::buildinfo::BuildInfo;
use arev_server::ingest::{self, IngestError, Source};
use arev_server::{build_router, AppState};

/// Module name used for config file lookup
const MODULE_NAME: &str = "arev-server";

/// Command-line arguments for arev-server
#[derive(Parser, Debug)]
#[command(name = "arev-server")]
#[command(about = "Annotation review backend: JSONL reorganization and reviewer comments")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(short, long, env = "AREV_PORT", global = true)]
    port: Option<u16>,

    /// Address to bind to
    #[arg(short, long, env = "AREV_BIND", global = true)]
    bind: Option<String>,

    /// Root folder holding comments.db
    #[arg(short, long, global = true)]
    root_folder: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP service (default)
    Serve,

    /// Reorganize local JSONL files and print the JSON result
    Reorganize {
        /// Reference JSONL file
        #[arg(long)]
        reference: PathBuf,

        /// Response JSONL files; model names come from the file names
        #[arg(long, num_args = 1.., required = true)]
        responses: Vec<PathBuf>,

        /// Pretty-print the output
        #[arg(long)]
        pretty: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let settings = ServiceSettings::resolve(
        MODULE_NAME,
        CliOverrides {
            root_folder: args.root_folder.clone(),
            port: args.port,
            bind_address: args.bind.clone(),
        },
    );

    init_tracing(&settings.logging)?;

    let build = BuildInfo::current();
    info!(
        "Starting arev-server v{} [{}] built {} ({})",
        build.version, build.git_hash, build.build_timestamp, build.build_profile
    );

    match args.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(settings).await,
        Command::Reorganize {
            reference,
            responses,
            pretty,
        } => reorganize_files(&reference, &responses, pretty).await,
    }
}

/// Initialize the tracing subscriber
///
/// `RUST_LOG` wins over the configured level. Logs go to stderr so the
/// `reorganize` output on stdout stays clean, or to the configured file.
fn init_tracing(logging: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{},tower_http=info", logging.level)));

    match &logging.file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }

    Ok(())
}

async fn serve(settings: ServiceSettings) -> Result<()> {
    let initializer = RootFolderInitializer::new(settings.root_folder.clone());
    initializer
        .ensure_directory_exists()
        .context("Failed to initialize root folder")?;
    info!("Root folder: {}", initializer.root_folder().display());

    let db_path = initializer.database_path();
    info!("Database path: {}", db_path.display());

    let pool = arev_common::db::init_database(&db_path)
        .await
        .context("Failed to open comment database")?;
    info!("✓ Connected to database");

    let state = AppState::new(pool, settings.max_upload_bytes);
    let app = build_router(state);

    let addr: SocketAddr = format!("{}:{}", settings.bind_address, settings.port)
        .parse()
        .with_context(|| {
            format!(
                "Invalid bind address {}:{}",
                settings.bind_address, settings.port
            )
        })?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;
    info!("arev-server listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

async fn reorganize_files(reference: &Path, responses: &[PathBuf], pretty: bool) -> Result<()> {
    let reference = open_source(reference).await?;
    let mut sources = Vec::with_capacity(responses.len());
    for path in responses {
        sources.push(open_source(path).await?);
    }

    let outcome = ingest::ingest(reference, sources).await?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    if pretty {
        serde_json::to_writer_pretty(&mut out, &outcome.result)?;
    } else {
        serde_json::to_writer(&mut out, &outcome.result)?;
    }
    writeln!(out)?;

    info!(
        "{} malformed lines skipped, {} records dropped, {} records without pmid/aspect",
        outcome.report.malformed_lines,
        outcome.report.dropped_records,
        outcome.report.unplaced_records
    );
    Ok(())
}

async fn open_source(path: &Path) -> Result<Source, IngestError> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    let file = tokio::fs::File::open(path)
        .await
        .map_err(|source| IngestError::UnreadableFile {
            name: name.clone(),
            source,
        })?;

    Ok(Source::new(name, BufReader::new(file)))
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received SIGTERM, shutting down");
        },
    }
}
