use clap::Parser;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use loadaudit_console::config::{CliArgs, ConsoleConfig};
use loadaudit_console::lifecycle;
use loadaudit_console::notifications::NotificationKind;
use loadaudit_console::server;
use loadaudit_console::state::SessionState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();

    // Keep the guard alive for the life of the process so the file writer flushes.
    let _log_guard = init_tracing(&args);

    info!("Starting loadaudit-console v{}", env!("CARGO_PKG_VERSION"));
    info!("Load test service: {}", args.api_base);

    let config = ConsoleConfig::from_args(args);
    let bind_addr = config.bind_addr();
    let initial_refresh = config.initial_refresh;

    let state = Arc::new(SessionState::connect(config)?);

    if initial_refresh {
        let state_clone = state.clone();
        tokio::spawn(async move {
            info!("Loading past runs...");
            if let Err(e) = lifecycle::refresh_catalog(&state_clone).await {
                error!("Initial catalog load failed: {}", e);
            }
        });
    }

    let router = server::build_router(state.clone());
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("Dashboard listening on http://{}", bind_addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal(state.clone()))
        .await?;

    lifecycle::stop_monitoring(&state).await;
    info!("loadaudit-console shutting down");

    Ok(())
}

fn init_tracing(args: &CliArgs) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "loadaudit_console=info,tower_http=info".into());
    let stdout_layer = tracing_subscriber::fmt::layer();

    match &args.log_file {
        Some(path) => {
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| std::path::Path::new("."));
            let file_name = path
                .file_name()
                .map(|n| n.to_os_string())
                .unwrap_or_else(|| "loadaudit-console.log".into());
            let appender = tracing_appender::rolling::never(dir, file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::registry()
                .with(filter)
                .with(stdout_layer)
                .with(tracing_subscriber::fmt::layer().with_ansi(false).with_writer(writer))
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::registry()
                .with(filter)
                .with(stdout_layer)
                .init();
            None
        }
    }
}

async fn shutdown_signal(state: Arc<SessionState>) {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");

    info!("Received shutdown signal");
    state
        .notifications
        .emit(NotificationKind::Info, "Console shutting down")
        .await;
}
