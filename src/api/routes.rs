use axum::{
    extract::DefaultBodyLimit,
    http::{header, Method},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};

use super::handlers;
use crate::error::AppError;
use crate::store::{ArtifactStore, AUDIO_DIR, UPLOAD_DIR};
use crate::voice::VoiceProvider;

pub struct AppState {
    pub store: ArtifactStore,
    /// `None` when no provider credential was configured at start-up.
    pub voice: Option<Arc<dyn VoiceProvider>>,
}

impl AppState {
    pub fn provider(&self) -> Result<Arc<dyn VoiceProvider>, AppError> {
        self.voice.clone().ok_or_else(|| {
            AppError::NotConfigured("ELEVENLABS_API_KEY is not configured".into())
        })
    }
}

pub fn create_router(state: Arc<AppState>, max_upload_bytes: usize) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    let api_routes = Router::new()
        .route("/generateAudio", post(handlers::generate_audio))
        .route(
            "/speech-to-speech",
            post(handlers::speech_to_speech).layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        .route(
            "/upload",
            post(handlers::upload).layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        .route("/createProject", post(handlers::create_project))
        .route("/health", get(handlers::health));

    // Only directories that hand out PublicRefs are served; tmp/ and projects/ stay private.
    let root = state.store.root().to_path_buf();

    Router::new()
        .nest("/api", api_routes)
        .nest_service("/audios", ServeDir::new(root.join(AUDIO_DIR)))
        .nest_service("/uploads", ServeDir::new(root.join(UPLOAD_DIR)))
        .fallback_service(ServeFile::new(root.join("index.html")))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
