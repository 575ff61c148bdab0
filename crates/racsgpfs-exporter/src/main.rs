//! racsgpfs-exporter — GPFS quota usage for Prometheus.
//!
//! Each scrape of `/metrics` runs the configured quota reports and
//! publishes size, quota and inode gauges per fileset, project or home.
//!
//! # Usage
//!
//! ```text
//! racsgpfs-exporter                          # serve on :8030
//! racsgpfs-exporter --config sources.toml serve
//! racsgpfs-exporter scrape                   # one collection to stdout
//! ```

mod settings;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{debug, info, warn};

use racsgpfs_metrics::{MetricPublisher, TextSink};

use crate::settings::Settings;

#[derive(Parser)]
#[command(name = "racsgpfs-exporter", about = "GPFS quota exporter for Prometheus")]
struct Cli {
    /// Address to listen on (overrides RACSGPFS_EXPORTER_LISTEN_ADDRESS).
    #[arg(long, global = true)]
    listen_address: Option<String>,

    /// Quota source config file (overrides RACSGPFS_EXPORTER_CONFIG).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging (same as setting RACSGPFS_EXPORTER_DEBUG).
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Serve /metrics (default).
    Serve,
    /// Run one collection and print the exposition text.
    Scrape,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = Settings::from_env().with_overrides(
        cli.listen_address.as_deref(),
        cli.config.as_deref(),
        cli.debug,
    );

    // Initialize tracing. RUST_LOG wins over the debug toggle; logs go to
    // stderr so `scrape` output stays clean.
    let default_filter = if settings.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .init();
    debug!("debug logging enabled");

    let config = settings.load_quota_config()?;
    let sources = config.build_sources().context("building quota sources")?;
    for source in &sources {
        info!(
            source = %source.name(),
            program = %source.program(),
            args = ?source.args(),
            timeout_secs = source.timeout().as_secs_f64(),
            "quota source configured"
        );
    }
    let publisher = Arc::new(MetricPublisher::new(&config.namespace, config.labels, sources));

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(&settings, publisher).await,
        Command::Scrape => scrape(&publisher).await,
    }
}

async fn serve(settings: &Settings, publisher: Arc<MetricPublisher>) -> anyhow::Result<()> {
    let router = racsgpfs_api::build_router(publisher);

    let listener = tokio::net::TcpListener::bind(&settings.listen_address)
        .await
        .with_context(|| format!("binding {}", settings.listen_address))?;
    info!(addr = %settings.listen_address, "starting server");

    // Graceful shutdown on Ctrl-C.
    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "failed to listen for shutdown signal");
                std::future::pending::<()>().await;
            }
            info!("shutdown signal received");
        })
        .await?;

    info!("exporter stopped");
    Ok(())
}

async fn scrape(publisher: &MetricPublisher) -> anyhow::Result<()> {
    let mut sink = TextSink::new();
    let summary = publisher.collect(&mut sink).await;
    print!("{}", sink.render());
    info!(
        sources_ok = summary.sources_ok,
        sources_failed = summary.sources_failed,
        records = summary.records,
        "scrape finished"
    );
    Ok(())
}
