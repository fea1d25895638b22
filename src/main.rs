use clap::Parser;
use tracing_subscriber::EnvFilter;

use patrol_api::app::{build_store, router, AppState};
use patrol_api::config::{self, StoreBackend};

#[derive(Parser, Debug)]
#[command(name = "patrol-api", version, about = "Client / location / zone hierarchy service")]
struct Args {
    /// Port to listen on
    #[arg(long, env = "PATROL_API_PORT")]
    port: Option<u16>,

    /// Document store backend (memory, postgres)
    #[arg(long, env = "STORE_BACKEND")]
    store: Option<StoreBackend>,

    /// Interface to bind
    #[arg(long, default_value = "0.0.0.0")]
    host: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    let mut config = config::config().clone();
    if let Some(port) = args.port {
        config.api.port = port;
    }
    if let Some(backend) = args.store {
        config.store.backend = backend;
    }

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.default_filter));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    tracing::info!(
        "Starting Patrol API in {:?} mode with {:?} store",
        config.environment,
        config.store.backend
    );

    if config.security.jwt_secret.is_empty() {
        anyhow::bail!("JWT_SECRET must be set outside development");
    }

    let store = build_store(&config.store).await?;
    let state = AppState::new(store, &config);
    let app = router(state, &config);

    let bind_addr = format!("{}:{}", args.host, config.api.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|e| anyhow::anyhow!("failed to bind {}: {}", bind_addr, e))?;

    tracing::info!("Patrol API listening on http://{}", bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}
