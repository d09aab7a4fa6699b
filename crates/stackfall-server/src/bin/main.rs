use stackfall_server::config::ServerConfig;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = ServerConfig::from_env();
    let addr = config.bind_addr();
    tracing::info!(
        "Gravity every {:?}, leaderboard depth {}, trusting client reports: {}",
        config.gravity_interval,
        config.leaderboard_depth,
        config.trust_client_reports
    );
    let (app, state) = stackfall_server::build_app(config);

    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    if !state.registry.is_empty() {
        tracing::info!("Shut down with {} sessions open", state.registry.len());
    }
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
