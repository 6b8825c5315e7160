//! savekeep HTTP API server.

use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::signal;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use savekeep::server::{AppState, Config, init_logging, router};

/// savekeep HTTP API server.
#[derive(Parser, Debug)]
#[command(name = "savekeep-server")]
#[command(about = "HTTP API server for game saves")]
struct Args {
    /// Path to the configuration file.
    #[arg(short, long, default_value = "savekeep-server.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = Config::from_file(&args.config)?;
    init_logging(&config.logging)?;
    info!(config = %args.config.display(), store = %config.storage.path, "starting savekeep server");

    let mut app = router(AppState::from_config(&config)?);

    if let Some(static_path) = &config.server.static_path {
        info!(path = %static_path, "serving client files");
        app = app.fallback_service(ServeDir::new(static_path));
    }

    info!(
        enabled = config.cors.enabled,
        origins = ?config.cors.allow_origins,
        credentials = config.cors.allow_credentials,
        "cross-origin policy"
    );
    let app = app
        .layer(config.cors.layer())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = config.bind_addr().parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let received = wait_for_signal().await;
            info!(signal = received, "draining in-flight requests");
        })
        .await?;

    info!("server stopped");
    Ok(())
}

/// Resolve on Ctrl+C or SIGTERM with the name of the signal received.
///
/// A listener that cannot be installed never resolves, so a failed
/// handler does not stop the server.
async fn wait_for_signal() -> &'static str {
    let interrupt = async {
        match signal::ctrl_c().await {
            Ok(()) => "SIGINT",
            Err(e) => {
                error!(error = %e, "cannot listen for Ctrl+C");
                std::future::pending().await
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                "SIGTERM"
            }
            Err(e) => {
                error!(error = %e, "cannot listen for SIGTERM");
                std::future::pending().await
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<&'static str>();

    tokio::select! {
        name = interrupt => name,
        name = terminate => name,
    }
}
