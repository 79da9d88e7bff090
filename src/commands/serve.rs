use std::net::SocketAddr;
use std::time::Duration;

use tracing::{error, info, warn};

use crate::{
    ServeArgs,
    build::{Builder, Watcher, ticker},
    config::ProjectConfig,
    server::{AppState, Rebuilder, router},
    shutdown,
};

pub async fn run(args: &ServeArgs) -> Result<(), anyhow::Error> {
    let config = ProjectConfig::load(&args.project)?;

    let bind = args.bind.clone().unwrap_or_else(|| config.dev.bind.clone());
    let port = args.port.unwrap_or(config.dev.port);
    let addr: SocketAddr = format!("{bind}:{port}").parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    let (trigger, shutdown) = shutdown::channel();

    // Poll content and layout for changes
    let poll_interval = Duration::from_millis(config.dev.poll_interval_ms);
    let watcher = Watcher::start(
        vec![config.content_dir.clone(), config.layout_dir.clone()],
        ticker(poll_interval),
        shutdown.clone(),
    )?;

    // Builds live in a per-process scratch directory, removed on shutdown
    let scratch_dir =
        std::env::temp_dir().join(format!("satisficer-serve-{}", std::process::id()));
    let mut rebuilder = Rebuilder::new(Builder::from_config(&config), scratch_dir);
    rebuilder.initial_build().await;

    let state = AppState {
        snapshot: rebuilder.snapshot(),
        reload: rebuilder.reload_sender(),
        on_error: config.dev.on_error,
        shutdown: shutdown.clone(),
    };
    let rebuild_task = tokio::spawn(rebuilder.run(watcher, shutdown));

    // Determine the URL to display
    let display_host = if bind == "0.0.0.0" {
        "localhost"
    } else {
        &bind
    };
    let url = format!("http://{display_host}:{port}");

    info!("Serving site at {url}");
    info!("Press Ctrl+C to stop");

    // Open browser if requested
    if args.open
        && let Err(e) = open::that(&url)
    {
        warn!("Failed to open browser: {e}");
    }

    let served = axum::serve(listener, router(state))
        .with_graceful_shutdown(async move {
            wait_for_signal().await;
            info!("Shutting down");
            trigger.trigger();
        })
        .await;

    // Dropping the trigger on a server error also stops the rebuilder
    if let Err(e) = rebuild_task.await {
        error!("rebuild task failed: {e}");
    }

    served?;

    Ok(())
}

async fn wait_for_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("failed to listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
