// This demo serves a single-page application from the given directory (default: `dist/`).
//
// Run `cargo run --example spa_server -- path/to/dist`, then
// point your browser to http://localhost:3000/
//
// Set `RUST_LOG=hyper_spafile=debug` to see fallback and traversal decisions.

use std::net::SocketAddr;

use hyper::server::conn::http1;
use hyper_spafile::SpaFileServer;
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let root = std::env::args().nth(1).unwrap_or_else(|| "dist".to_owned());
    let spa = SpaFileServer::new(root);

    let addr: SocketAddr = ([127, 0, 0, 1], 3000).into();
    let listener = TcpListener::bind(addr).await?;
    tracing::info!("SPA server running on http://{addr}/");

    loop {
        let (stream, remote) = listener.accept().await?;
        let spa = spa.clone();
        tokio::spawn(async move {
            if let Err(err) = http1::Builder::new()
                .serve_connection(TokioIo::new(stream), spa)
                .await
            {
                tracing::warn!(%remote, error = %err, "error serving connection");
            }
        });
    }
}
