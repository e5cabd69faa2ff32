pub mod elevenlabs;
pub mod settings;

use std::path::PathBuf;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;

use crate::error::AppError;

pub use elevenlabs::ElevenLabsClient;
pub use settings::VoiceSettings;

/// Finite, non-restartable sequence of audio chunks in arrival order.
pub type AudioStream = BoxStream<'static, Result<Bytes, std::io::Error>>;

pub struct SynthesizedAudio {
    pub chunks: AudioStream,
    /// File extension matching the encoding of `chunks`.
    pub extension: String,
}

#[derive(Debug, Clone)]
pub struct SpeechRequest {
    pub text: String,
    /// Falls back to the provider's default voice when `None`.
    pub voice_id: Option<String>,
    pub settings: VoiceSettings,
}

#[derive(Debug, Clone)]
pub struct ConversionRequest {
    pub voice_id: String,
    /// Source recording on disk.
    pub audio_path: PathBuf,
    pub file_name: String,
    pub content_type: Option<String>,
}

/// A remote voice synthesis/conversion service. One call per request, no retries.
#[async_trait]
pub trait VoiceProvider: Send + Sync {
    async fn text_to_speech(&self, request: &SpeechRequest) -> Result<SynthesizedAudio, AppError>;

    async fn speech_to_speech(
        &self,
        request: &ConversionRequest,
    ) -> Result<SynthesizedAudio, AppError>;
}

/// Map a provider output format such as `mp3_44100_128` to a file extension.
pub fn extension_for_format(format: &str) -> &'static str {
    match format.split('_').next().unwrap_or_default() {
        "mp3" => "mp3",
        "pcm" => "pcm",
        "ulaw" => "ulaw",
        "alaw" => "alaw",
        "opus" => "opus",
        "wav" => "wav",
        _ => "bin",
    }
}
