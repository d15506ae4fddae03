use docpreview::config::Config;
use docpreview::server::Server;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()>{
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cfg = Config::load()?;
    let mime = cfg.mime_registry()?;

    let server = Server::bind(&cfg, mime).await?;
    let addr = server.local_addr()?;
    tracing::info!("Running on port {}", addr.port());
    tracing::info!(
        "Mapping \".wasm\" to \"{}\"",
        server.files().mime().lookup(".wasm")
    );

    tokio::select! {
        res = server.run() => {
            res?;
        }

        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }
    }

    Ok(())
}
