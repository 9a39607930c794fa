//! Runtime configuration: CLI arguments merged with an optional TOML file.

use anyhow::{bail, Context, Result};
use clap::Parser;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Well-known public directory of API instances.
pub const DEFAULT_DIRECTORY_URL: &str =
    "https://api.invidious.io/instances.json?sort_by=type,users";

fn parse_path(s: &str) -> Result<PathBuf> {
    let path_buf = PathBuf::from(s);
    let original_path = match path_buf.canonicalize() {
        Ok(path) => path,
        Err(msg) => {
            if msg.kind() == std::io::ErrorKind::NotFound {
                path_buf
            } else {
                return Err(msg).with_context(|| format!("Error resolving path: {}", s));
            }
        }
    };
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

#[derive(Parser, Debug, Default)]
#[command(name = "mirrortube", about = "Terminal client for a federation of video index mirrors")]
pub struct CliArgs {
    /// Path to a TOML config file.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// Directory holding the preference files (favorites, subscriptions, bans).
    #[clap(long, value_parser = parse_path)]
    pub data_dir: Option<PathBuf>,

    /// URL of the global instance directory.
    #[clap(long)]
    pub directory_url: Option<String>,

    /// Per-request timeout in seconds.
    #[clap(long)]
    pub request_timeout_secs: Option<u64>,

    /// Scheduler tick interval in milliseconds.
    #[clap(long)]
    pub tick_interval_ms: Option<u64>,
}

/// Values readable from a TOML config file. Any field may be omitted.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct FileConfig {
    pub data_dir: Option<String>,
    pub directory_url: Option<String>,
    pub request_timeout_secs: Option<u64>,
    pub tick_interval_ms: Option<u64>,
    pub directory_max_age_secs: Option<i64>,
    pub instance_cooldown_secs: Option<i64>,
    pub channel_poll_secs: Option<i64>,
    pub popular_jitter_max_secs: Option<i64>,
    pub popular_backoff_min_secs: Option<i64>,
    pub popular_backoff_max_secs: Option<i64>,
    pub degraded_failure_limit: Option<u32>,
    pub degraded_pause_secs: Option<u64>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }
}

/// Cadences and endpoints driving the synchronization scheduler.
#[derive(Debug, Clone)]
pub struct SyncSettings {
    pub directory_url: String,
    pub request_timeout_secs: u64,
    pub tick_interval_ms: u64,
    pub directory_max_age_secs: i64,
    pub instance_cooldown_secs: i64,
    pub channel_poll_secs: i64,
    pub popular_jitter_max_secs: i64,
    pub popular_backoff_min_secs: i64,
    pub popular_backoff_max_secs: i64,
    pub degraded_failure_limit: u32,
    pub degraded_pause_secs: u64,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            directory_url: DEFAULT_DIRECTORY_URL.to_string(),
            request_timeout_secs: 5,
            tick_interval_ms: 1000,
            directory_max_age_secs: 600,
            instance_cooldown_secs: 600,
            channel_poll_secs: 600,
            popular_jitter_max_secs: 300,
            popular_backoff_min_secs: 600,
            popular_backoff_max_secs: 1200,
            degraded_failure_limit: 5,
            degraded_pause_secs: 60,
        }
    }
}

/// Fully resolved application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub sync: SyncSettings,
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file
    /// config. TOML values override CLI values where present.
    pub fn resolve(cli: &CliArgs, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();
        let defaults = SyncSettings::default();

        let data_dir = match file.data_dir.map(PathBuf::from).or_else(|| cli.data_dir.clone()) {
            Some(dir) => dir,
            None => default_data_dir()?,
        };

        let sync = SyncSettings {
            directory_url: file
                .directory_url
                .or_else(|| cli.directory_url.clone())
                .unwrap_or(defaults.directory_url),
            request_timeout_secs: file
                .request_timeout_secs
                .or(cli.request_timeout_secs)
                .unwrap_or(defaults.request_timeout_secs),
            tick_interval_ms: file
                .tick_interval_ms
                .or(cli.tick_interval_ms)
                .unwrap_or(defaults.tick_interval_ms),
            directory_max_age_secs: file
                .directory_max_age_secs
                .unwrap_or(defaults.directory_max_age_secs),
            instance_cooldown_secs: file
                .instance_cooldown_secs
                .unwrap_or(defaults.instance_cooldown_secs),
            channel_poll_secs: file.channel_poll_secs.unwrap_or(defaults.channel_poll_secs),
            popular_jitter_max_secs: file
                .popular_jitter_max_secs
                .unwrap_or(defaults.popular_jitter_max_secs),
            popular_backoff_min_secs: file
                .popular_backoff_min_secs
                .unwrap_or(defaults.popular_backoff_min_secs),
            popular_backoff_max_secs: file
                .popular_backoff_max_secs
                .unwrap_or(defaults.popular_backoff_max_secs),
            degraded_failure_limit: file
                .degraded_failure_limit
                .unwrap_or(defaults.degraded_failure_limit),
            degraded_pause_secs: file
                .degraded_pause_secs
                .unwrap_or(defaults.degraded_pause_secs),
        };

        if sync.popular_backoff_min_secs > sync.popular_backoff_max_secs {
            bail!(
                "popular_backoff_min_secs ({}) exceeds popular_backoff_max_secs ({})",
                sync.popular_backoff_min_secs,
                sync.popular_backoff_max_secs
            );
        }

        Ok(Self { data_dir, sync })
    }
}

fn default_data_dir() -> Result<PathBuf> {
    let home = std::env::var_os("HOME")
        .map(PathBuf::from)
        .context("HOME is not set; pass --data-dir explicitly")?;
    Ok(home.join(".config").join("mirrortube"))
}
