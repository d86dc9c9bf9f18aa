use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;

use crate::config::{Config, ReaderConfig};
use crate::http::connection::Connection;
use crate::http::handler::Handler;
use crate::server::handlers::{HelloHandler, StaticFiles};

pub async fn run(cfg: &Config) -> anyhow::Result<()> {
    let listener = TcpListener::bind(&cfg.server.listen_addr)
        .await
        .with_context(|| format!("binding {}", cfg.server.listen_addr))?;
    info!("Listening on {}", cfg.server.listen_addr);

    let handler: Arc<dyn Handler> = match &cfg.static_files {
        Some(static_files) => {
            info!("Serving files from {}", static_files.root.display());
            Arc::new(StaticFiles::new(static_files))
        }
        None => Arc::new(HelloHandler),
    };

    serve(listener, handler, cfg.reader).await
}

/// Accepts connections forever, one task per connection.
pub async fn serve(
    listener: TcpListener,
    handler: Arc<dyn Handler>,
    reader: ReaderConfig,
) -> anyhow::Result<()> {
    loop {
        let (socket, peer) = listener.accept().await?;
        let conn = Connection::new(socket, reader);
        info!(connection = %conn.id(), "Accepted connection from {}", peer);

        let handler = Arc::clone(&handler);
        tokio::spawn(async move {
            if let Err(e) = conn.run(handler.as_ref()).await {
                tracing::error!("Connection error from {}: {}", peer, e);
            }
        });
    }
}
