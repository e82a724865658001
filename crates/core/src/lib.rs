//! wxgrid core library
//!
//! Shared plumbing for the dashboard and monitor binaries:
//! - Configuration loading (XDG-compliant)
//! - Meteorological unit conversions
//! - Rate-friendly HTTP fetching
//! - File-backed logging

mod config;
mod http;
mod logging;
pub mod units;

pub use config::{find_config_file, get_xdg_cache_dir, load_config, ConfigSource};
pub use http::HttpFetcher;
pub use logging::{file_logger, level_from_str};

/// Application name used for XDG paths
pub const APP_NAME: &str = "wxgrid";

/// Default delay between station fetches (seconds); one station per tick
pub const DEFAULT_FETCH_DELAY: u64 = 3;

/// Default seconds a non-default display mode stays armed before reverting
pub const DEFAULT_MODE_HOLD: u64 = 30;

/// Default poll interval for the NBM monitor (seconds)
pub const DEFAULT_MONITOR_POLL: u64 = 120;
