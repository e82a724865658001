use std::path::PathBuf;

use clap::Parser;
use wxgrid_core::{
    find_config_file, get_xdg_cache_dir, load_config, ConfigSource, DEFAULT_MONITOR_POLL,
};

const DEFAULT_BASE_URL: &str = "https://nomads.ncep.noaa.gov/pub/data/nccf/com/blend/v4.3";

#[derive(Parser, Clone, Debug, serde::Deserialize, Default)]
#[command(
    author,
    version,
    about = "wxgrid monitor - NBM daily-high probability dashboard"
)]
pub struct Cli {
    /// Path to config file (TOML format)
    /// Searched in order: this flag, $WXGRID_MONITOR_CONFIG, ./monitor.toml,
    /// $XDG_CONFIG_HOME/wxgrid/monitor.toml, /etc/wxgrid/monitor.toml
    #[arg(short, long)]
    #[serde(skip)]
    pub config: Option<String>,

    /// Log level: trace, debug, info, warn, error
    #[arg(short, long, env = "WXGRID_MONITOR_LEVEL")]
    pub level: Option<String>,

    /// Station whose guidance block to track
    #[arg(short, long, env = "WXGRID_MONITOR_STATION")]
    pub station: Option<String>,

    /// Base URL of the blend text products
    #[arg(short, long, env = "WXGRID_MONITOR_BASE_URL")]
    pub base_url: Option<String>,

    /// Seconds between product checks
    #[arg(short, long, env = "WXGRID_MONITOR_POLL_INTERVAL")]
    pub poll_interval: Option<u64>,

    /// HTTP User-Agent header for upstream requests
    #[arg(short, long, env = "WXGRID_MONITOR_USER_AGENT")]
    pub user_agent: Option<String>,

    /// Log file path
    #[arg(short = 'o', long, env = "WXGRID_MONITOR_LOG_FILE")]
    pub log_file: Option<String>,
}

impl Cli {
    pub fn station(&self) -> String {
        self.station.clone().unwrap_or_else(|| "KNYC".to_string())
    }

    pub fn base_url(&self) -> String {
        self.base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
    }

    pub fn poll_interval(&self) -> u64 {
        self.poll_interval.unwrap_or(DEFAULT_MONITOR_POLL)
    }

    pub fn user_agent(&self) -> String {
        self.user_agent
            .clone()
            .unwrap_or_else(|| format!("(wxgrid-monitor/{}, ops@wxgrid.dev)", env!("CARGO_PKG_VERSION")))
    }

    pub fn log_file(&self) -> PathBuf {
        self.log_file
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(|| get_xdg_cache_dir().join("monitor.log"))
    }
}

/// Load configuration from CLI args, config file, and environment
pub fn get_config_info() -> Cli {
    let cli_args = Cli::parse();

    let source = if let Some(ref path) = cli_args.config {
        ConfigSource::Explicit(path.into())
    } else {
        find_config_file("WXGRID_MONITOR_CONFIG", "monitor.toml")
    };

    let file_config: Cli = load_config(&source).unwrap_or_default();

    Cli {
        config: cli_args.config,
        level: cli_args.level.or(file_config.level),
        station: cli_args.station.or(file_config.station),
        base_url: cli_args.base_url.or(file_config.base_url),
        poll_interval: cli_args.poll_interval.or(file_config.poll_interval),
        user_agent: cli_args.user_agent.or(file_config.user_agent),
        log_file: cli_args.log_file.or(file_config.log_file),
    }
}
