use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use liveboard_core::config::{LiveboardConfig, SourceKind};
use liveboard_gateway::{app, hub::HubHandle};
use liveboard_upstream::{LiveSource, MemorySource, RelayConfig, RelaySource};
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(name = "liveboard-gateway", version, about = "Live event relay and top-liker leaderboard")]
struct Cli {
    /// Path to the TOML config file (default: ~/.liveboard/liveboard.toml).
    #[arg(long, env = "LIVEBOARD_CONFIG")]
    config: Option<String>,

    /// Override `gateway.bind`.
    #[arg(long)]
    bind: Option<String>,

    /// Override `gateway.port`.
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "liveboard_gateway=info,liveboard_upstream=info,tower_http=debug".into()
            }),
        )
        .init();

    let cli = Cli::parse();

    // load config: --config / LIVEBOARD_CONFIG > ~/.liveboard/liveboard.toml
    let mut config = LiveboardConfig::load(cli.config.as_deref()).unwrap_or_else(|e| {
        warn!("Config load failed ({}), using defaults", e);
        LiveboardConfig::default()
    });
    if let Some(bind) = cli.bind {
        config.gateway.bind = bind;
    }
    if let Some(port) = cli.port {
        config.gateway.port = port;
    }

    let source = build_source(&config);
    let hub = HubHandle::spawn(source, config.ranking.top_k);

    let addr: SocketAddr = format!("{}:{}", config.gateway.bind, config.gateway.port).parse()?;
    let state = Arc::new(app::AppState::new(config, hub));
    let router = app::build_router(state);

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) if e.kind() == std::io::ErrorKind::AddrInUse => {
            error!(%addr, "port already in use; stop the other process or pass --port");
            std::process::exit(1);
        }
        Err(e) => {
            error!(%addr, error = %e, "failed to bind listener");
            std::process::exit(1);
        }
    };
    info!("Liveboard gateway listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Liveboard gateway stopped");
    Ok(())
}

/// Pick the live source for the configured upstream mode.
fn build_source(config: &LiveboardConfig) -> Arc<dyn LiveSource> {
    match config.upstream.source {
        SourceKind::Relay => {
            info!(url = %config.upstream.relay_url, "upstream: platform relay");
            Arc::new(RelaySource::new(RelayConfig::from(&config.upstream)))
        }
        SourceKind::Offline => {
            info!("upstream: offline (only test.* events will flow)");
            Arc::new(MemorySource::new())
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown signal received");
}
