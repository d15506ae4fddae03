use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;

use crate::config::Config;
use crate::files::StaticFiles;
use crate::http::connection::Connection;
use crate::http::mime::MimeRegistry;

/// A bound preview server. Binding and serving are separate steps so the
/// caller can report the bound address (and tests can bind port 0).
pub struct Server {
    listener: TcpListener,
    files: Arc<StaticFiles>,
}

impl Server {
    /// Resolves the document root and binds `cfg.listen_addr`.
    ///
    /// The registry is frozen from here on: it moves into the shared handler
    /// and is only read by connection tasks.
    pub async fn bind(cfg: &Config, mime: MimeRegistry) -> anyhow::Result<Self> {
        let files = StaticFiles::from_config(cfg, mime)?;

        let listener = TcpListener::bind(&cfg.listen_addr)
            .await
            .with_context(|| format!("failed to bind {}", cfg.listen_addr))?;

        Ok(Self {
            listener,
            files: Arc::new(files),
        })
    }

    pub fn local_addr(&self) -> anyhow::Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    pub fn files(&self) -> &StaticFiles {
        &self.files
    }

    /// Accepts connections until the task is dropped. Each connection runs
    /// on its own task; a failing connection never stops the loop.
    pub async fn run(self) -> anyhow::Result<()> {
        info!(
            addr = %self.local_addr()?,
            root = %self.files.root().display(),
            "Serving documentation"
        );

        loop {
            let (socket, peer) = match self.listener.accept().await {
                Ok(accepted) => accepted,
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to accept connection");
                    continue;
                }
            };
            tracing::debug!("Accepted connection from {}", peer);

            let files = Arc::clone(&self.files);
            tokio::spawn(async move {
                let mut conn = Connection::new(socket, files);
                if let Err(e) = conn.run().await {
                    tracing::error!("Connection error from {}: {}", peer, e);
                }
            });
        }
    }
}
