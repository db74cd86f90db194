use focus_grid::heartbeat::{self, Heartbeat, POLL_INTERVAL};
use focus_grid::{AppState, Settings, load_or_init, router};
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let settings = Settings::from_env();
    let data = load_or_init(&settings.data_path).await;
    info!(
        "loaded {} tasks and {} recorded days from {}",
        data.config.len(),
        data.data.len(),
        settings.data_path.display()
    );

    let state = AppState::from_settings(&settings, data);
    let shutdown = shutdown_signal(state.heartbeat.clone(), settings.heartbeat_timeout);
    let app = router(state);

    let addr = settings.addr();
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("listening on http://{addr}");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal(heartbeat: Heartbeat, timeout: Option<Duration>) {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!("failed to listen for ctrl-c: {err}");
            std::future::pending::<()>().await;
        }
    };

    let silence = async {
        match timeout {
            Some(timeout) => heartbeat::wait_for_silence(heartbeat, timeout, POLL_INTERVAL).await,
            None => std::future::pending::<()>().await,
        }
    };

    tokio::select! {
        _ = ctrl_c => info!("received ctrl-c"),
        _ = silence => {}
    }
}
