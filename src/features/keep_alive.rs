// Keep-alive web endpoint for hosts that sleep idle processes

use std::net::SocketAddr;

use axum::{routing::get, Router};
use tokio::net::TcpListener;
use tracing::info;

pub fn router() -> Router {
    Router::new().route("/", get(alive))
}

async fn alive() -> &'static str {
    "I'm alive!"
}

/// Serve the keep-alive router until the process exits
pub async fn serve(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;
    info!("Keep-alive server listening on {}", addr);
    serve_on(listener).await
}

async fn serve_on(listener: TcpListener) -> std::io::Result<()> {
    axum::serve(listener, router()).await
}
