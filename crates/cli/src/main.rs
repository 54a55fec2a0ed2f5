//! blogsheet entry point.
//!
//! This binary is the composition root for the entire system. Responsibilities:
//!
//! 1. **Load configuration**: TOML file, environment, then flags (see
//!    [`config`]).
//! 2. **Wire observability**: `tracing-subscriber` plus an optional
//!    OpenTelemetry OTLP exporter. All spans and events emitted by every crate
//!    in the workspace flow through this layer.
//! 3. **Construct infrastructure**: the Hugging Face generation client and
//!    the Google Sheets worksheet, injected into a `RowProcessor`.
//! 4. **Serve**: bind the `listener` router and run until Ctrl-C.

mod config;
mod observability;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use listener::{AppState, DynProcessor, TriggerMode};
use llm::HuggingFaceClient;
use pipeline::{TextGenerator, Worksheet};
use sheets::GoogleSheetsClient;
use tracing::info;
use workflow::RowProcessor;

#[derive(Parser)]
#[command(name = "blogsheet")]
#[command(about = "Generates blog content for spreadsheet rows on POST /generate")]
struct Args {
    /// Path to a TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Address to bind the server to
    #[arg(long)]
    bind: Option<String>,

    /// Port to listen on (overrides PORT)
    #[arg(long)]
    port: Option<u16>,

    /// Process every row (scan) or the row named in the request (targeted)
    #[arg(long)]
    mode: Option<TriggerMode>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let observability = observability::init()?;

    let mut cfg = config::load_config(args.config.as_deref())?;
    cfg.apply_env(|name| std::env::var(name).ok())?;
    if let Some(bind) = args.bind {
        cfg.bind = bind;
    }
    if let Some(port) = args.port {
        cfg.port = port;
    }
    if let Some(mode) = args.mode {
        cfg.mode = mode;
    }
    cfg.validate()?;

    let generator = HuggingFaceClient::new(cfg.inference_config()?)?;
    info!(endpoint = %generator.config().endpoint, "inference client ready");

    let sheet = GoogleSheetsClient::connect(cfg.sheets_config()?)
        .await
        .context("connect to spreadsheet")?;

    let generator: Arc<dyn TextGenerator> = Arc::new(generator);
    let sheet: Arc<dyn Worksheet> = Arc::new(sheet);
    let processor: DynProcessor = RowProcessor::new(generator, sheet)
        .with_pacing(cfg.pacing_policy())
        .with_failure_policy(cfg.failure_policy);
    let app = listener::router(AppState::new(Arc::new(processor), cfg.mode));

    let addr: SocketAddr = format!("{}:{}", cfg.bind, cfg.port)
        .parse()
        .with_context(|| format!("invalid bind address {}:{}", cfg.bind, cfg.port))?;
    let tcp = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("bind {addr}"))?;
    info!(addr = %addr, mode = ?cfg.mode, "listening");

    axum::serve(tcp, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server stopped");
    observability.shutdown();
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
