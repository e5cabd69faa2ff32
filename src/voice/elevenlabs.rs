use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::multipart::{Form, Part};
use serde::Serialize;
use url::Url;

use super::{
    extension_for_format, ConversionRequest, SpeechRequest, SynthesizedAudio, VoiceProvider,
    VoiceSettings,
};
use crate::config::ProviderConfig;
use crate::error::AppError;

const API_KEY_HEADER: &str = "xi-api-key";

/// ElevenLabs REST client. Built once at start-up and shared through the app state.
pub struct ElevenLabsClient {
    http: reqwest::Client,
    base_url: Url,
    model_id: String,
    sts_model_id: String,
    default_voice_id: String,
    output_format: String,
}

#[derive(Serialize)]
struct TextToSpeechBody<'a> {
    text: &'a str,
    model_id: &'a str,
    voice_settings: &'a VoiceSettings,
}

impl ElevenLabsClient {
    pub fn new(config: &ProviderConfig) -> Result<Self, AppError> {
        let mut api_key = HeaderValue::from_str(&config.api_key).map_err(|_| {
            AppError::NotConfigured("ELEVENLABS_API_KEY contains invalid characters".into())
        })?;
        api_key.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(API_KEY_HEADER, api_key);

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| AppError::NotConfigured(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: config.base_url.clone(),
            model_id: config.model_id.clone(),
            sts_model_id: config.sts_model_id.clone(),
            default_voice_id: config.default_voice_id.clone(),
            output_format: config.output_format.clone(),
        })
    }

    /// `{base}/v1/{operation}/{voice}/stream?output_format=...`
    fn endpoint(&self, operation: &str, voice_id: &str) -> Result<Url, AppError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| AppError::NotConfigured(format!("Unusable base URL {}", self.base_url)))?
            .pop_if_empty()
            .extend(["v1", operation, voice_id, "stream"]);
        url.query_pairs_mut()
            .append_pair("output_format", &self.output_format);
        Ok(url)
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<SynthesizedAudio, AppError> {
        let response = request
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("Request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Upstream(format!(
                "{}: {}",
                status.as_u16(),
                body.trim()
            )));
        }

        let chunks = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(std::io::Error::other))
            .boxed();

        Ok(SynthesizedAudio {
            chunks,
            extension: extension_for_format(&self.output_format).to_string(),
        })
    }
}

#[async_trait]
impl VoiceProvider for ElevenLabsClient {
    async fn text_to_speech(&self, request: &SpeechRequest) -> Result<SynthesizedAudio, AppError> {
        let voice_id = request
            .voice_id
            .as_deref()
            .unwrap_or(&self.default_voice_id);
        let url = self.endpoint("text-to-speech", voice_id)?;

        tracing::info!(
            "Synthesizing {} chars with voice {}",
            request.text.chars().count(),
            voice_id
        );

        let body = TextToSpeechBody {
            text: &request.text,
            model_id: &self.model_id,
            voice_settings: &request.settings,
        };

        self.send(
            self.http
                .post(url)
                .header(ACCEPT, "audio/mpeg")
                .json(&body),
        )
        .await
    }

    async fn speech_to_speech(
        &self,
        request: &ConversionRequest,
    ) -> Result<SynthesizedAudio, AppError> {
        let url = self.endpoint("speech-to-speech", &request.voice_id)?;
        let audio = tokio::fs::read(&request.audio_path).await?;

        tracing::info!(
            "Converting {} bytes to voice {}",
            audio.len(),
            request.voice_id
        );

        let mut part = Part::bytes(audio).file_name(request.file_name.clone());
        if let Some(content_type) = &request.content_type {
            part = part
                .mime_str(content_type)
                .map_err(|e| AppError::BadRequest(format!("Invalid audio content type: {}", e)))?;
        }

        let form = Form::new()
            .part("audio", part)
            .text("model_id", self.sts_model_id.clone());

        self.send(
            self.http
                .post(url)
                .header(ACCEPT, "audio/mpeg")
                .multipart(form),
        )
        .await
    }
}
