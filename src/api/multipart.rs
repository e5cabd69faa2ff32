use std::path::Path;

use axum::extract::multipart::{Multipart, MultipartError};
use axum::http::StatusCode;
use bytes::Bytes;

use crate::error::AppError;

pub struct UploadedAudio {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

impl UploadedAudio {
    /// Extension for the stored copy: the client's own if it looks sane,
    /// else one derived from the content type.
    pub fn extension(&self) -> String {
        let from_name = self
            .file_name
            .as_deref()
            .and_then(|name| Path::new(name).extension())
            .and_then(|ext| ext.to_str())
            .filter(|ext| {
                !ext.is_empty() && ext.len() <= 8 && ext.chars().all(|c| c.is_ascii_alphanumeric())
            });

        match from_name {
            Some(ext) => ext.to_ascii_lowercase(),
            None => extension_for_mime(self.content_type.as_deref()).to_string(),
        }
    }
}

#[derive(Default)]
pub struct AudioForm {
    pub audio: Option<UploadedAudio>,
    pub voice: Option<String>,
}

impl AudioForm {
    /// The `audio` part, rejecting a missing or empty file.
    pub fn require_audio(&mut self) -> Result<UploadedAudio, AppError> {
        match self.audio.take() {
            Some(audio) if !audio.bytes.is_empty() => Ok(audio),
            Some(_) => Err(AppError::BadRequest("Audio file is empty".into())),
            None => Err(AppError::BadRequest("Audio file is required".into())),
        }
    }
}

/// Read the `audio` file part and the optional `voice` text part. Other parts are skipped.
pub async fn read_audio_form(mut multipart: Multipart) -> Result<AudioForm, AppError> {
    let mut form = AudioForm::default();

    while let Some(field) = multipart.next_field().await.map_err(malformed)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "audio" => {
                let file_name = field.file_name().map(str::to_string);
                let content_type = field.content_type().map(str::to_string);
                let bytes = field.bytes().await.map_err(malformed)?;
                form.audio = Some(UploadedAudio {
                    file_name,
                    content_type,
                    bytes,
                });
            }
            "voice" => {
                let voice = field.text().await.map_err(malformed)?;
                form.voice = Some(voice.trim().to_string()).filter(|v| !v.is_empty());
            }
            _ => tracing::debug!("Ignoring multipart field '{}'", name),
        }
    }

    Ok(form)
}

fn malformed(e: MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return AppError::PayloadTooLarge(e.body_text());
    }
    AppError::BadRequest(format!("Malformed multipart body: {}", e.body_text()))
}

fn extension_for_mime(content_type: Option<&str>) -> &'static str {
    let essence = content_type
        .and_then(|ct| ct.split(';').next())
        .map(|ct| ct.trim().to_ascii_lowercase())
        .unwrap_or_default();

    match essence.as_str() {
        "audio/mpeg" | "audio/mp3" => "mp3",
        "audio/wav" | "audio/x-wav" | "audio/wave" => "wav",
        "audio/webm" => "webm",
        "audio/ogg" => "ogg",
        "audio/mp4" | "audio/x-m4a" => "m4a",
        "audio/flac" => "flac",
        _ => "bin",
    }
}
