use axum::{
    extract::{
        multipart::MultipartRejection,
        rejection::JsonRejection,
        Multipart, State,
    },
    http::StatusCode,
    Json,
};
use std::future::Future;
use std::sync::Arc;

use super::multipart::read_audio_form;
use super::{
    AudioResponse, CreateProjectRequest, GenerateAudioRequest, HealthResponse, ProjectResponse,
    UploadResponse,
};
use crate::api::routes::AppState;
use crate::error::AppError;
use crate::store::{Category, Provisioned};
use crate::voice::{ConversionRequest, SpeechRequest, VoiceSettings};

const MAX_TEXT_CHARS: usize = 5000;

pub async fn generate_audio(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<GenerateAudioRequest>, JsonRejection>,
) -> Result<Json<AudioResponse>, AppError> {
    let Json(request) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;

    // Validate input
    let text = request.text.as_deref().map(str::trim).unwrap_or_default();
    if text.is_empty() {
        return Err(AppError::BadRequest("Text is required".into()));
    }

    if text.chars().count() > MAX_TEXT_CHARS {
        return Err(AppError::BadRequest(format!(
            "Text too long (max {} chars)",
            MAX_TEXT_CHARS
        )));
    }

    let settings =
        VoiceSettings::from_options(request.stability, request.similarity, request.style)?;
    let voice_id = request
        .voice
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());

    let provider = state.provider()?;
    let store = state.store.clone();
    let request = SpeechRequest {
        text: text.to_string(),
        voice_id,
        settings,
    };

    let audio_url = run_to_completion(async move {
        let audio = provider.text_to_speech(&request).await?;
        store
            .write_artifact_from_chunks(Category::Speech, audio.chunks, &audio.extension)
            .await
    })
    .await?;

    tracing::info!("Generated speech {}", audio_url);
    Ok(Json(AudioResponse {
        ok: true,
        audio_url,
    }))
}

pub async fn speech_to_speech(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<AudioResponse>, AppError> {
    let multipart = multipart.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let mut form = read_audio_form(multipart).await?;

    let audio = form.require_audio()?;
    let voice_id = form
        .voice
        .take()
        .ok_or_else(|| AppError::BadRequest("Voice is required".into()))?;

    let provider = state.provider()?;
    let store = state.store.clone();

    let audio_url = run_to_completion(async move {
        // Hold the source recording on disk for the duration of the upstream call.
        let inbound = store
            .write_artifact(Category::Inbound, &audio.bytes, &audio.extension())
            .await?;
        let inbound_path = store.resolve(&inbound);

        let request = ConversionRequest {
            voice_id,
            audio_path: inbound_path.clone(),
            file_name: audio
                .file_name
                .clone()
                .unwrap_or_else(|| inbound.file_name().to_string()),
            content_type: audio.content_type.clone(),
        };
        drop(audio);

        let result = async {
            let converted = provider.speech_to_speech(&request).await?;
            store
                .write_artifact_from_chunks(
                    Category::Conversion,
                    converted.chunks,
                    &converted.extension,
                )
                .await
        }
        .await;

        store.consume_temporary_upload(&inbound_path).await;
        result
    })
    .await?;

    tracing::info!("Converted speech {}", audio_url);
    Ok(Json(AudioResponse {
        ok: true,
        audio_url,
    }))
}

/// Run provider work on its own task so a dropped connection cannot cancel
/// the upstream call, the artifact write or the temp-file cleanup.
async fn run_to_completion<F, T>(work: F) -> Result<T, AppError>
where
    F: Future<Output = Result<T, AppError>> + Send + 'static,
    T: Send + 'static,
{
    tokio::spawn(work)
        .await
        .map_err(|e| AppError::Task(e.to_string()))?
}

pub async fn upload(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, AppError> {
    let multipart = multipart.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let audio = read_audio_form(multipart).await?.require_audio()?;

    let path = state
        .store
        .write_artifact(Category::Upload, &audio.bytes, &audio.extension())
        .await?;

    tracing::info!("Stored upload {} ({} bytes)", path, audio.bytes.len());
    Ok(Json(UploadResponse {
        ok: true,
        file: path.file_name().to_string(),
        path,
    }))
}

pub async fn create_project(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreateProjectRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ProjectResponse>), AppError> {
    let Json(request) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;

    let name = request.project_name.as_deref().map(str::trim).unwrap_or_default();
    if name.is_empty() {
        return Err(AppError::BadRequest("Project name is required".into()));
    }

    let provisioned = state.store.create_named_subdirectory(name).await?;
    let (status, message) = match &provisioned {
        Provisioned::Created(_) => (
            StatusCode::CREATED,
            format!("Project '{}' created", provisioned.name()),
        ),
        Provisioned::AlreadyExists(_) => (
            StatusCode::OK,
            format!("Project '{}' already exists", provisioned.name()),
        ),
    };

    tracing::info!("{} at {}", message, provisioned.path().display());
    Ok((status, Json(ProjectResponse { message })))
}

pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        provider_configured: state.voice.is_some(),
    })
}
