use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use guardia_status::{
    config::{Config, StorageConfig, read_config_file},
    discord::{DiscordClient, DiscordSettings},
    monitor::{MonitorCore, MonitorHandle, MonitorParts},
    probe::{lookup::SrvLocator, minecraft::JavaStatusProbe},
    storage::{ConfigStore, memory::MemoryStore},
    util,
};
use tracing::{debug, info, level_filters::LevelFilter, trace, warn};
use tracing_subscriber::{filter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Clone, Parser)]
struct Args {
    /// Config file (defaults to $STATUS_CONFIG, then built-in defaults)
    #[arg(short)]
    file: Option<String>,
}

fn init() {
    let filter = filter::Targets::new().with_targets(vec![
        ("guardia_status", LevelFilter::DEBUG),
        ("bot", LevelFilter::TRACE),
        ("tower_http", LevelFilter::DEBUG),
    ]);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .compact()
                .with_ansi(false),
        )
        .with(filter)
        .init();
}

async fn open_store(config: &StorageConfig) -> anyhow::Result<Arc<dyn ConfigStore>> {
    match config {
        StorageConfig::None => {
            warn!("storage disabled, configuration is lost on restart");
            Ok(Arc::new(MemoryStore::new()))
        }
        #[cfg(feature = "storage-sqlite")]
        StorageConfig::Sqlite { path } => {
            let store = guardia_status::storage::sqlite::SqliteStore::new(path).await?;
            Ok(Arc::new(store))
        }
        #[cfg(not(feature = "storage-sqlite"))]
        StorageConfig::Sqlite { .. } => {
            anyhow::bail!("sqlite storage requested but the storage-sqlite feature is disabled")
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    init();

    let args = Args::parse();
    trace!("started with args: {args:?}");

    let mut config = match args.file.or_else(util::get_config_path) {
        Some(path) => read_config_file(&path).with_context(|| format!("reading {path}"))?,
        None => {
            debug!("no config file given, using defaults");
            Config::default()
        }
    };
    util::apply_env_overrides(&mut config);

    let token = config
        .discord
        .token
        .clone()
        .context("no Discord token configured (set DISCORD_TOKEN)")?;

    let discord = Arc::new(DiscordClient::new(DiscordSettings {
        api_base: config.discord.api_base.clone(),
        token,
        announce_recovery: config.discord.announce_recovery,
        request_timeout: Duration::from_secs(config.discord.request_timeout),
    })?);

    let settings = config.monitor.settings();
    let parts = MonitorParts {
        store: open_store(&config.storage).await?,
        probe: Arc::new(
            JavaStatusProbe::new(settings.probe_timeout)
                .with_service_lookup(Arc::new(SrvLocator::from_system_conf())),
        ),
        display: discord.clone(),
        notifier: discord,
    };

    let core = Arc::new(
        MonitorCore::bootstrap(settings, parts)
            .await
            .context("failed to load monitor state")?,
    );
    let scheduler = MonitorHandle::spawn(Arc::clone(&core));

    #[cfg(feature = "api")]
    if let Some(api) = config.api.clone() {
        use guardia_status::api::{ApiState, spawn_api_server};
        use guardia_status::commands::CommandSurface;

        let state = ApiState::new(CommandSurface::new(Arc::clone(&core)), Some(scheduler.clone()));
        spawn_api_server(api, state).await?;
    }

    tokio::signal::ctrl_c().await?;
    info!("shutting down");
    scheduler.shutdown().await;

    Ok(())
}
