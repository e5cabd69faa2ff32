use std::sync::Arc;

use tracing_subscriber::EnvFilter;

mod api;
mod config;
mod error;
mod store;
mod voice;

use api::routes::{create_router, AppState};
use config::Config;
use store::ArtifactStore;
use voice::{ElevenLabsClient, VoiceProvider};

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env().expect("Invalid configuration");

    tracing::info!("Voice Studio Server v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Starting server on http://{}", config.addr);
    tracing::info!("Public directory: {}", config.public_dir.display());

    let store = ArtifactStore::open(&config.public_dir)
        .await
        .expect("Failed to prepare public directory");

    // Constructed once and shared by every request
    let voice: Option<Arc<dyn VoiceProvider>> = match &config.provider {
        Some(provider) => {
            let client =
                ElevenLabsClient::new(provider).expect("Failed to create ElevenLabs client");
            tracing::info!("Voice provider: ElevenLabs at {}", provider.base_url);
            Some(Arc::new(client))
        }
        None => {
            tracing::warn!("ELEVENLABS_API_KEY is not set; voice routes will return 500");
            None
        }
    };

    let state = Arc::new(AppState { store, voice });
    let app = create_router(state, config.max_upload_bytes);

    let listener = tokio::net::TcpListener::bind(config.addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    tracing::info!("Server stopped");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
