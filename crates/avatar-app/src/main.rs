mod cli;
mod publish;
mod timings;

use avatar_config::AvatarConfig;
use avatar_session::{AvatarClient, Scene, Snapshot};
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

use crate::publish::PublishPoller;

/// Load environment variables from a .env file (KEY=VALUE lines).
/// Variables already set in the environment win.
fn load_dotenv() {
    let manifest_dir = std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    let candidates = [
        // Workspace root, two levels up from crates/avatar-app/
        manifest_dir.join("..").join("..").join(".env"),
        // Current directory
        std::path::PathBuf::from(".env"),
    ];

    for path in &candidates {
        if let Ok(contents) = std::fs::read_to_string(path) {
            for (key, value) in parse_dotenv(&contents) {
                if std::env::var(key).is_err() {
                    std::env::set_var(key, value);
                }
            }
            return;
        }
    }
}

fn parse_dotenv(contents: &str) -> Vec<(&str, &str)> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split_once('='))
        .map(|(key, value)| {
            let value = value.trim().trim_matches('"').trim_matches('\'');
            (key.trim(), value)
        })
        .collect()
}

fn load_config(args: &cli::Args) -> Result<AvatarConfig, avatar_common::ConfigError> {
    match &args.config {
        Some(path) => avatar_config::load_config_from(path),
        None => avatar_config::load_config(),
    }
}

/// Log every snapshot change, and scene changes more loudly.
async fn log_snapshots(mut rx: watch::Receiver<Snapshot>) {
    let mut scene: Option<Scene> = None;
    while rx.changed().await.is_ok() {
        let snapshot = rx.borrow_and_update().clone();
        tracing::debug!(
            snapshot = %serde_json::to_string(&snapshot).unwrap_or_default(),
            "Display state changed"
        );
        let current = snapshot.scene();
        if scene != Some(current) {
            tracing::info!(scene = ?current, connection = ?snapshot.connection, "Scene changed");
            scene = Some(current);
        }
    }
}

#[tokio::main]
async fn main() {
    // Load .env file before anything else
    load_dotenv();

    let args = cli::parse();
    let loaded = load_config(&args);

    // Initialize logging
    let log_directive = match (&args.log_level, &loaded) {
        (Some(level), _) => level.clone(),
        (None, Ok(config)) => format!("avatar={}", config.logging.level),
        (None, Err(_)) => "avatar=info".to_string(),
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(
                log_directive
                    .parse()
                    .unwrap_or_else(|_| tracing_subscriber::filter::LevelFilter::INFO.into()),
            ),
        )
        .init();

    tracing::info!("Avatar v{} starting...", env!("CARGO_PKG_VERSION"));

    if let Some(ref path) = args.config {
        tracing::info!("Using config override: {}", path.display());
    }
    let mut config = loaded.unwrap_or_else(|e| {
        tracing::warn!("Config load failed, using defaults: {e}");
        AvatarConfig::default()
    });
    if let Some(url) = args.url {
        config.connection.url = url;
    }
    tracing::info!(url = %config.connection.url, "Config loaded");

    let (client, snapshots) = AvatarClient::start(timings::client_options(&config));
    let logger = tokio::spawn(log_snapshots(snapshots));

    let poller = match PublishPoller::from_config(&config) {
        Ok(Some(poller)) => Some(poller.spawn(client.handle())),
        Ok(None) => {
            tracing::info!("No API key configured, publish status check disabled");
            None
        }
        Err(e) => {
            tracing::warn!("Publish status check unavailable: {e}");
            None
        }
    };

    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
    }
    tracing::info!("Shutting down");

    if let Some(poller) = poller {
        poller.abort();
    }
    client.shutdown().await;
    let _ = logger.await;
    tracing::info!("Shutdown complete");
}
