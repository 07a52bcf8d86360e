use std::net::SocketAddr;

use anyhow::Context;

use shared_todo::{
    config::AppConfig, db::connection, logging::init_tracing, routes::app, state::AppState,
};

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        tracing::error!("server failed: {err:?}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cfg = AppConfig::from_env()?;
    init_tracing(&cfg.logging.rust_log);

    let db = connection::connect(&cfg.database).await?;
    let state = AppState::new(cfg, db);

    let addr: SocketAddr = format!("{}:{}", state.config.general.host, state.config.general.port)
        .parse()
        .context("invalid host/port")?;
    let router = app(state);

    tracing::info!("listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;
    Ok(())
}
