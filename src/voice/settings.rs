use serde::Serialize;

use crate::error::AppError;

pub const DEFAULT_STABILITY: f32 = 0.5;
pub const DEFAULT_SIMILARITY: f32 = 0.75;
pub const DEFAULT_STYLE: f32 = 0.0;

/// Voice tuning sent with every synthesis request, in the provider's field names.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VoiceSettings {
    pub stability: f32,
    pub similarity_boost: f32,
    pub style: f32,
    pub use_speaker_boost: bool,
}

impl Default for VoiceSettings {
    fn default() -> Self {
        Self {
            stability: DEFAULT_STABILITY,
            similarity_boost: DEFAULT_SIMILARITY,
            style: DEFAULT_STYLE,
            use_speaker_boost: true,
        }
    }
}

impl VoiceSettings {
    pub fn from_options(
        stability: Option<f32>,
        similarity: Option<f32>,
        style: Option<f32>,
    ) -> Result<Self, AppError> {
        Ok(Self {
            stability: unit_interval("stability", stability, DEFAULT_STABILITY)?,
            similarity_boost: unit_interval("similarity", similarity, DEFAULT_SIMILARITY)?,
            style: unit_interval("style", style, DEFAULT_STYLE)?,
            use_speaker_boost: true,
        })
    }
}

fn unit_interval(field: &str, value: Option<f32>, default: f32) -> Result<f32, AppError> {
    match value {
        None => Ok(default),
        Some(v) if v.is_finite() && (0.0..=1.0).contains(&v) => Ok(v),
        Some(v) => Err(AppError::BadRequest(format!(
            "{} must be between 0 and 1, got {}",
            field, v
        ))),
    }
}
