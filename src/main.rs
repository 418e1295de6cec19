use emission_counter::{router, AppState, Config, JsonFileStore, Repository};
use tokio::fs;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let config = Config::from_env();
    if let Some(parent) = config.data_path.parent() {
        fs::create_dir_all(parent).await?;
    }

    let data_path = config.data_path.clone();
    let demo_entries = config.demo_entries;
    let repo = tokio::task::spawn_blocking(move || {
        Repository::open_with_demo(JsonFileStore::open(data_path), demo_entries)
    })
    .await??;
    info!(
        entries = repo.list().len(),
        path = %config.data_path.display(),
        "emission log loaded"
    );

    let app = router(AppState::new(repo));
    let addr = config.addr();

    info!("listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!("failed to listen for shutdown signal: {err}");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}
