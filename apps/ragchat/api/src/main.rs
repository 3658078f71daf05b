use std::sync::Arc;

use core_config::tracing::{init_tracing, install_color_eyre};
use domain_vector::{EmbeddingProviderGateway, QdrantRestClient, VectorStoreSchemaGuardian};
use eyre::WrapErr;
use tracing::{info, warn};

mod api;
mod config;
mod server;
mod state;

use config::Config;
use state::AppState;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    // Install color-eyre first for colored error output (before any fallible operations)
    install_color_eyre();

    let config = Config::from_env()?;

    init_tracing(&config.environment);

    let gateway = EmbeddingProviderGateway::from_settings(&config.embeddings)
        .wrap_err("Failed to configure embedding providers")?;

    let admin = QdrantRestClient::new(&config.qdrant).wrap_err("Failed to build Qdrant client")?;
    let guardian =
        VectorStoreSchemaGuardian::from_config(admin, &config.qdrant, gateway.dimensions());

    info!(
        candidates = ?guardian.candidates(),
        dimensions = gateway.dimensions(),
        "Validating vector store schema"
    );

    // Must finish before the listener is bound; a schema conflict aborts startup.
    guardian
        .ensure_collections_and_indexes()
        .await
        .wrap_err("Vector store schema validation failed")?;

    let gateway = Arc::new(gateway);
    let guardian = Arc::new(guardian);

    let discovery = Arc::clone(&guardian);
    tokio::spawn(async move {
        match discovery.discover_prefixed_collections().await {
            Ok(compatible) => info!(collections = ?compatible, "Collection discovery finished"),
            Err(e) => warn!(error = %e, "Collection discovery failed"),
        }
    });

    let server_config = config.server.clone();
    let state = AppState {
        config,
        gateway,
        guardian,
    };

    let router = api::router(state);

    server::serve(router, &server_config)
        .await
        .wrap_err("Server error")?;

    info!("Server shut down");
    Ok(())
}
