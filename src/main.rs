use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use mirrortube::config::{AppConfig, CliArgs, FileConfig};
use mirrortube::prefs::FilePreferenceStore;
use mirrortube::sync::{EngineHandle, EngineState, SyncScheduler};
use mirrortube::upstream::HttpTransport;

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .unwrap();

    let file_config = match &cli_args.config {
        Some(path) => Some(FileConfig::load(path)?),
        None => None,
    };
    let config = AppConfig::resolve(&cli_args, file_config)?;

    info!("preference directory: {:?}", config.data_dir);
    let prefs = Arc::new(
        FilePreferenceStore::new(&config.data_dir).context("opening preference store")?,
    );

    let transport = Arc::new(HttpTransport::new(config.sync.request_timeout_secs)?);

    let state = EngineState::load(prefs.as_ref())?.shared();
    let handle = EngineHandle::new(state.clone(), prefs);

    // The terminal UI drives this flag; standalone, keep the popular feed
    // syncing so there is content to render.
    handle.set_browse_active(true).await;

    let shutdown = CancellationToken::new();
    let scheduler = SyncScheduler::new(state, transport, config.sync.clone(), shutdown.clone());
    let scheduler_task = tokio::spawn(scheduler.run());

    info!("engine running, ctrl-c to stop");
    tokio::signal::ctrl_c()
        .await
        .context("waiting for shutdown signal")?;

    info!("shutting down");
    shutdown.cancel();
    let _ = scheduler_task.await;
    Ok(())
}
