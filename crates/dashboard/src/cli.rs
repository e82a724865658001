use std::path::PathBuf;

use clap::Parser;
use wxgrid_core::{
    find_config_file, get_xdg_cache_dir, load_config, ConfigSource, DEFAULT_FETCH_DELAY,
    DEFAULT_MODE_HOLD,
};

#[derive(Parser, Clone, Debug, serde::Deserialize, Default)]
#[command(
    author,
    version,
    about = "wxgrid - multi-source METAR fusion map for the terminal"
)]
pub struct Cli {
    /// Path to config file (TOML format)
    /// Searched in order: this flag, $WXGRID_CONFIG, ./wxgrid.toml,
    /// $XDG_CONFIG_HOME/wxgrid/wxgrid.toml, /etc/wxgrid/wxgrid.toml
    #[arg(short, long)]
    #[serde(skip)]
    pub config: Option<String>,

    /// Log level: trace, debug, info, warn, error
    #[arg(short, long, env = "WXGRID_LEVEL")]
    pub level: Option<String>,

    /// HTTP User-Agent header for upstream requests
    #[arg(short, long, env = "WXGRID_USER_AGENT")]
    pub user_agent: Option<String>,

    /// Seconds between station fetches (one station per tick)
    #[arg(short, long, env = "WXGRID_FETCH_DELAY")]
    pub fetch_delay: Option<u64>,

    /// Seconds a selected display mode stays armed before reverting
    #[arg(short, long, env = "WXGRID_MODE_HOLD")]
    pub mode_hold: Option<u64>,

    /// Log file path (the terminal itself is the map)
    #[arg(short = 'o', long, env = "WXGRID_LOG_FILE")]
    pub log_file: Option<String>,
}

impl Cli {
    pub fn user_agent(&self) -> String {
        self.user_agent
            .clone()
            .unwrap_or_else(|| format!("(wxgrid/{}, ops@wxgrid.dev)", env!("CARGO_PKG_VERSION")))
    }

    pub fn fetch_delay(&self) -> u64 {
        self.fetch_delay.unwrap_or(DEFAULT_FETCH_DELAY)
    }

    pub fn mode_hold(&self) -> u64 {
        self.mode_hold.unwrap_or(DEFAULT_MODE_HOLD)
    }

    pub fn log_file(&self) -> PathBuf {
        self.log_file
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(|| get_xdg_cache_dir().join("dashboard.log"))
    }
}

/// Load configuration from CLI args, config file, and environment
pub fn get_config_info() -> Cli {
    let cli_args = Cli::parse();

    let source = if let Some(ref path) = cli_args.config {
        ConfigSource::Explicit(path.into())
    } else {
        find_config_file("WXGRID_CONFIG", "wxgrid.toml")
    };

    // Load from config file
    let file_config: Cli = load_config(&source).unwrap_or_default();

    // CLI args override file config (env vars are handled by clap)
    Cli {
        config: cli_args.config,
        level: cli_args.level.or(file_config.level),
        user_agent: cli_args.user_agent.or(file_config.user_agent),
        fetch_delay: cli_args.fetch_delay.or(file_config.fetch_delay),
        mode_hold: cli_args.mode_hold.or(file_config.mode_hold),
        log_file: cli_args.log_file.or(file_config.log_file),
    }
}
