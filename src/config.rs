use clap::Parser;
use std::path::PathBuf;

/// LoadAudit Console: drives load tests against the LoadAudit service and
/// streams live telemetry to the dashboard shell.
#[derive(Parser, Debug, Clone)]
#[command(name = "loadaudit-console")]
pub struct CliArgs {
    /// Base URL of the remote load-testing service
    #[arg(long = "api-base", env = "LOADAUDIT_API_BASE", default_value = DEFAULT_API_BASE)]
    pub api_base: String,

    /// Address the dashboard surface binds to
    #[arg(long = "bind", default_value = "127.0.0.1")]
    pub bind: String,

    /// Dashboard HTTP port
    #[arg(long = "port", default_value_t = DEFAULT_CONSOLE_PORT)]
    pub port: u16,

    /// Also write logs to this file
    #[arg(short = 'l', long = "log-file")]
    pub log_file: Option<PathBuf>,

    /// Milliseconds between synthetic telemetry ticks
    #[arg(long = "tick-interval-ms", default_value_t = TICK_INTERVAL_MS)]
    pub tick_interval_ms: u64,

    /// Delay before refreshing the run catalog after a completed test
    #[arg(long = "catalog-refresh-delay-ms", default_value_t = CATALOG_REFRESH_DELAY_MS)]
    pub catalog_refresh_delay_ms: u64,

    /// Skip fetching past runs on startup
    #[arg(long = "no-initial-refresh")]
    pub no_initial_refresh: bool,
}

#[derive(Debug, Clone)]
pub struct ConsoleConfig {
    pub api_base: String,
    pub bind: String,
    pub port: u16,
    pub log_file: Option<PathBuf>,
    pub tick_interval_ms: u64,
    pub catalog_refresh_delay_ms: u64,
    pub initial_refresh: bool,
}

pub const DEFAULT_API_BASE: &str = "http://127.0.0.1:8000";
pub const DEFAULT_CONSOLE_PORT: u16 = 9880;

// Live telemetry
pub const SERIES_CAPACITY: usize = 30;
pub const TICK_INTERVAL_MS: u64 = 1000;
pub const BASE_LATENCY_SECS: f64 = 0.2;
pub const LATENCY_WAVE_AMPLITUDE: f64 = 0.3;
pub const LATENCY_WAVE_FREQUENCY: f64 = 0.1; // ~62.8 ticks per period
pub const LATENCY_JITTER_SECS: f64 = 0.4;
pub const MAX_SYNTHETIC_ERROR_PCT: f64 = 3.0;
pub const MIN_ACTIVE_USER_FRACTION: f64 = 0.8;
pub const MIXED_STATUS_ERROR_PCT: f64 = 2.0;

// Catalog
pub const CATALOG_REFRESH_DELAY_MS: u64 = 1000;
pub const URL_DISPLAY_LIMIT: usize = 25;

// Notifications
pub const NOTIFICATION_BUFFER_SIZE: usize = 200;
pub const EVENT_CHANNEL_CAPACITY: usize = 256;

impl ConsoleConfig {
    pub fn from_args(args: CliArgs) -> Self {
        ConsoleConfig {
            api_base: args.api_base.trim_end_matches('/').to_string(),
            bind: args.bind,
            port: args.port,
            log_file: args.log_file,
            tick_interval_ms: args.tick_interval_ms.max(1),
            catalog_refresh_delay_ms: args.catalog_refresh_delay_ms,
            initial_refresh: !args.no_initial_refresh,
        }
    }

    /// Full URL for a path on the remote service.
    pub fn api_url(&self, path: &str) -> String {
        format!("{}/{}", self.api_base, path.trim_start_matches('/'))
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        ConsoleConfig {
            api_base: DEFAULT_API_BASE.to_string(),
            bind: "127.0.0.1".to_string(),
            port: DEFAULT_CONSOLE_PORT,
            log_file: None,
            tick_interval_ms: TICK_INTERVAL_MS,
            catalog_refresh_delay_ms: CATALOG_REFRESH_DELAY_MS,
            initial_refresh: true,
        }
    }
}
