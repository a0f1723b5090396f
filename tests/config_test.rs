use clap::Parser;
use loadaudit_console::config::*;

#[test]
fn test_default_ports() {
    assert_eq!(DEFAULT_CONSOLE_PORT, 9880);
    assert_eq!(DEFAULT_API_BASE, "http://127.0.0.1:8000");
}

#[test]
fn test_telemetry_constants() {
    assert_eq!(SERIES_CAPACITY, 30);
    assert_eq!(TICK_INTERVAL_MS, 1000);
    assert_eq!(CATALOG_REFRESH_DELAY_MS, 1000);
    assert!(MIN_ACTIVE_USER_FRACTION < 1.0);
}

#[test]
fn test_config_from_args() {
    let args = CliArgs::parse_from([
        "loadaudit-console",
        "--api-base",
        "http://loadaudit.internal:8000/",
        "--port",
        "9999",
        "--tick-interval-ms",
        "0",
        "--no-initial-refresh",
    ]);
    let config = ConsoleConfig::from_args(args);

    assert_eq!(config.api_base, "http://loadaudit.internal:8000");
    assert_eq!(config.port, 9999);
    assert_eq!(config.tick_interval_ms, 1);
    assert!(!config.initial_refresh);
    assert!(config.log_file.is_none());
    assert_eq!(config.bind_addr(), "127.0.0.1:9999");
}

#[test]
fn test_api_url_joins_paths() {
    let config = ConsoleConfig::default();
    assert_eq!(config.api_url("/start"), "http://127.0.0.1:8000/start");
    assert_eq!(config.api_url("runs"), "http://127.0.0.1:8000/runs");
}
