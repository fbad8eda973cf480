use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use flowstate_clock::SystemClock;
use flowstate_collector::config::{load_config, load_default_config, save_config};
use flowstate_collector::{CollectorConfigFile, HttpSink, SourceRegistry, build_orchestrator};
use tokio::sync::watch;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(name = "flowstate-collector", version, about = "Collect focus signals and forward them downstream")]
struct Args {
    /// Path to the JSON configuration file
    #[arg(short, long, default_value = "collector_config.json")]
    config: PathBuf,

    /// Override the downstream service URL
    #[arg(long)]
    backend_url: Option<String>,

    /// Write the default configuration to --config and exit
    #[arg(long)]
    generate_config: bool,

    /// Print the per-signal status report and exit
    #[arg(long)]
    status: bool,

    /// Attach the composite focus score to every payload
    #[arg(long)]
    with_score: bool,
}

fn load_or_create(path: &Path) -> anyhow::Result<CollectorConfigFile> {
    if path.exists() {
        return load_config(path).with_context(|| format!("loading {}", path.display()));
    }
    let config = load_default_config()?;
    match save_config(&config, path) {
        Ok(()) => tracing::info!(path = %path.display(), "Wrote default configuration"),
        Err(e) => tracing::warn!(path = %path.display(), error = %e, "Could not write default configuration"),
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive("flowstate_collector=info".parse()?))
        .init();

    let args = Args::parse();

    if args.generate_config {
        save_config(&load_default_config()?, &args.config)?;
        println!("Default configuration written to {}", args.config.display());
        return Ok(());
    }

    let mut config = load_or_create(&args.config)?;
    if let Some(url) = args.backend_url {
        config.backend_url = url;
    }
    if args.with_score {
        config.include_score = true;
    }

    let sink = Arc::new(HttpSink::new(&config.backend_url, config.sink_timeout())?);
    let mut orchestrator = build_orchestrator(
        &config,
        &SourceRegistry::with_defaults(),
        Arc::new(SystemClock),
        sink.clone(),
    )?;

    if args.status {
        println!("{}", serde_json::to_string_pretty(&orchestrator.status_report())?);
        return Ok(());
    }

    tracing::info!(endpoint = %sink.endpoint(), "Starting flowstate collector");
    let started = orchestrator.start()?;
    tracing::info!(collectors = started, "Collectors running");

    let (stop_tx, stop_rx) = watch::channel(false);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("Shutdown requested");
                let _ = stop_tx.send(true);
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for Ctrl-C; running until killed");
                // Hold the sender until the service drops its receiver.
                stop_tx.closed().await;
            }
        }
    });

    orchestrator.run_until(stop_rx).await;
    let stragglers = orchestrator.shutdown().await;
    if !stragglers.is_empty() {
        tracing::warn!(?stragglers, "Some collectors were aborted");
    }
    tracing::info!("Collector stopped");
    Ok(())
}
