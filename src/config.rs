use std::net::SocketAddr;
use std::path::PathBuf;

use url::Url;

const DEFAULT_BASE_URL: &str = "https://api.elevenlabs.io";
const DEFAULT_MODEL_ID: &str = "eleven_multilingual_v2";
const DEFAULT_STS_MODEL_ID: &str = "eleven_multilingual_sts_v2";
const DEFAULT_VOICE_ID: &str = "21m00Tcm4TlvDq8ikWAM";
const DEFAULT_OUTPUT_FORMAT: &str = "mp3_44100_128";
const DEFAULT_MAX_UPLOAD_BYTES: usize = 64 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub public_dir: PathBuf,
    pub max_upload_bytes: usize,
    /// `None` when no credential is present; provider routes then answer 500.
    pub provider: Option<ProviderConfig>,
}

/// Settings for the ElevenLabs client.
///
/// `Debug` is written by hand so the API key never reaches the logs.
#[derive(Clone)]
pub struct ProviderConfig {
    pub api_key: String,
    pub base_url: Url,
    pub model_id: String,
    pub sts_model_id: String,
    pub default_voice_id: String,
    pub output_format: String,
    pub timeout_secs: u64,
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &"[REDACTED]")
            .field("base_url", &self.base_url)
            .field("model_id", &self.model_id)
            .field("sts_model_id", &self.sts_model_id)
            .field("default_voice_id", &self.default_voice_id)
            .field("output_format", &self.output_format)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be a number, got '{1}'")]
    NotANumber(&'static str, String),

    #[error("invalid bind address {0}")]
    InvalidAddress(String),

    #[error("invalid URL for {0}: {1}")]
    InvalidUrl(&'static str, String),
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from any key lookup (the process environment in production).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let host = var("HOST", "0.0.0.0");
        let port: u16 = parse_number(&lookup, "PORT", 3000)?;
        let addr: SocketAddr = format!("{}:{}", host, port)
            .parse()
            .map_err(|_| ConfigError::InvalidAddress(format!("{}:{}", host, port)))?;

        let provider = match lookup("ELEVENLABS_API_KEY").filter(|k| !k.trim().is_empty()) {
            Some(api_key) => {
                let raw_url = var("ELEVENLABS_BASE_URL", DEFAULT_BASE_URL);
                let base_url = Url::parse(&raw_url)
                    .map_err(|e| ConfigError::InvalidUrl("ELEVENLABS_BASE_URL", e.to_string()))?;

                Some(ProviderConfig {
                    api_key: api_key.trim().to_string(),
                    base_url,
                    model_id: var("ELEVENLABS_MODEL_ID", DEFAULT_MODEL_ID),
                    sts_model_id: var("ELEVENLABS_STS_MODEL_ID", DEFAULT_STS_MODEL_ID),
                    default_voice_id: var("ELEVENLABS_VOICE_ID", DEFAULT_VOICE_ID),
                    output_format: var("ELEVENLABS_OUTPUT_FORMAT", DEFAULT_OUTPUT_FORMAT),
                    timeout_secs: parse_number(&lookup, "ELEVENLABS_TIMEOUT_SECS", 60)?,
                })
            }
            None => None,
        };

        Ok(Self {
            addr,
            public_dir: PathBuf::from(var("PUBLIC_DIR", "./public")),
            max_upload_bytes: parse_number(&lookup, "MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?,
            provider,
        })
    }
}

fn parse_number<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::NotANumber(key, raw)),
        None => Ok(default),
    }
}
