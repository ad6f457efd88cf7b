use std::net::SocketAddr;

use tracing_subscriber::EnvFilter;

use bloxtrack_server::config::ServerConfig;
use bloxtrack_server::{build_app, spawn_limiter_sweeper};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = ServerConfig::load();
    config.validate();

    let listen_addr = config.listen_addr.clone();
    let (app, state) = build_app(config);
    spawn_limiter_sweeper(state);

    let listener = match tokio::net::TcpListener::bind(&listen_addr).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!(addr = %listen_addr, error = %e, "Failed to bind");
            std::process::exit(1);
        },
    };

    tracing::info!(addr = %listen_addr, "Bloxtrack server listening");

    if let Err(e) = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    {
        tracing::error!(error = %e, "Server exited with error");
        std::process::exit(1);
    }
}
