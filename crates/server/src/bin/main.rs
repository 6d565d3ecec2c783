//! Binary entry point for the hearth-fs server.

use clap::Parser;
use hearth_fs::{FsServer, config::Config, router};
use std::sync::Arc;
use tracing::info;

/// Hearth filesystem server — sandboxed file operations over JSON-RPC.
#[derive(Parser)]
#[command(name = "hearth-fs", version, about)]
struct Cli {
    /// Allowed directories the server may access. Overrides ALLOWED_DIRS.
    #[arg(num_args = 0..)]
    allowed_dirs: Vec<std::path::PathBuf>,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hearth_fs=debug,tower_http=debug".into()),
        )
        .init();

    let cli = Cli::parse();
    let config = match Config::load(cli.allowed_dirs) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            eprintln!("Usage: hearth-fs /path/to/dir1 /path/to/dir2 ...");
            std::process::exit(1);
        }
    };
    let port = config.port;
    let read_only = config.read_only;

    let server = match FsServer::new(config) {
        Ok(server) => server,
        Err(e) => {
            eprintln!("Error: failed to prepare allowed directories: {e}");
            std::process::exit(1);
        }
    };

    let dirs = server
        .allowed_dirs()
        .iter()
        .map(|d| d.display().to_string())
        .collect::<Vec<_>>()
        .join(", ");
    info!("allowed directories: {dirs}");
    info!("read-only mode: {read_only}");

    let app = router(Arc::new(server));
    let listener = match tokio::net::TcpListener::bind(("0.0.0.0", port)).await {
        Ok(listener) => listener,
        Err(e) => {
            eprintln!("Error: failed to bind port {port}: {e}");
            std::process::exit(1);
        }
    };
    info!("hearth-fs listening on port {port}");

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.ok();
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    info!("shutdown signal received");
}
