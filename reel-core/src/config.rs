//! Configuration file types (reel.toml) and environment overrides.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ReelConfig {
    pub server: ServerConfig,
    pub store: StoreConfig,
    pub pipeline: PipelineConfig,
    pub providers: ProvidersConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

/// Bounds for the in-memory job store. Absent means unbounded.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct StoreConfig {
    pub capacity: Option<usize>,
    pub ttl_secs: Option<u64>,
}

impl StoreConfig {
    pub fn ttl(&self) -> Option<Duration> {
        self.ttl_secs.map(Duration::from_secs)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Per-request timeout applied to every upstream call.
    pub request_timeout_secs: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self { request_timeout_secs: 120 }
    }
}

impl PipelineConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ProvidersConfig {
    pub gemini: GeminiConfig,
    pub elevenlabs: ElevenLabsConfig,
    pub heygen: HeyGenConfig,
    pub kling: KlingConfig,
    pub creatomate: CreatomateConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GeminiConfig {
    pub endpoint: String,
    pub api_key: Option<String>,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-flash:generateContent"
                .to_string(),
            api_key: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ElevenLabsConfig {
    pub endpoint: String,
    pub api_key: Option<String>,
    pub voice_id: String,
    pub model_id: String,
    pub stability: f32,
    pub similarity_boost: f32,
}

impl Default for ElevenLabsConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.elevenlabs.io/v1/text-to-speech".to_string(),
            api_key: None,
            voice_id: "21m00Tcm4TlvDq8ikWAM".to_string(),
            model_id: "eleven_multilingual_v2".to_string(),
            stability: 0.75,
            similarity_boost: 0.75,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HeyGenConfig {
    pub endpoint: String,
    pub api_key: Option<String>,
}

impl Default for HeyGenConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.heygen.com/v1/video.generate".to_string(),
            api_key: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct KlingConfig {
    pub endpoint: String,
    pub api_key: Option<String>,
    pub duration_secs: u32,
    pub aspect_ratio: String,
}

impl Default for KlingConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.klingai.com/v1/video/generate".to_string(),
            api_key: None,
            duration_secs: 5,
            aspect_ratio: "16:9".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CreatomateConfig {
    pub endpoint: String,
    pub api_key: Option<String>,
}

impl Default for CreatomateConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://rest.creatomate.com/v1/renders".to_string(),
            api_key: None,
        }
    }
}

/// Environment variable holding each provider's credential.
pub const GEMINI_KEY: &str = "GEMINI_KEY";
pub const GEMINI_KEY_FALLBACK: &str = "GOOGLE_GEMINI_API_KEY";
pub const ELEVENLABS_KEY: &str = "ELEVENLABS_KEY";
pub const HEYGEN_KEY: &str = "HEYGEN_KEY";
pub const KLING_KEY: &str = "KLING_KEY";
pub const CREATOMATE_KEY: &str = "CREATOMATE_KEY";

impl ReelConfig {
    /// Load from TOML string.
    pub fn from_toml(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    /// Load from file path.
    pub fn load_path(path: &Path) -> Result<Self, ConfigError> {
        let s = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&s)
    }

    /// File if given, defaults otherwise; process environment applied on top.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(p) => Self::load_path(p)?,
            None => Self::default(),
        };
        Ok(config.with_env_overrides(|k| std::env::var(k).ok()))
    }

    /// Apply credentials and listen address from `lookup` (normally `std::env::var`).
    /// Empty values are ignored.
    pub fn with_env_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |k: &str| lookup(k).filter(|v| !v.trim().is_empty());

        if let Some(v) = get(GEMINI_KEY).or_else(|| get(GEMINI_KEY_FALLBACK)) {
            self.providers.gemini.api_key = Some(v);
        }
        if let Some(v) = get(ELEVENLABS_KEY) {
            self.providers.elevenlabs.api_key = Some(v);
        }
        if let Some(v) = get(HEYGEN_KEY) {
            self.providers.heygen.api_key = Some(v);
        }
        if let Some(v) = get(KLING_KEY) {
            self.providers.kling.api_key = Some(v);
        }
        if let Some(v) = get(CREATOMATE_KEY) {
            self.providers.creatomate.api_key = Some(v);
        }
        if let Some(v) = get("REEL_HOST") {
            self.server.host = v;
        }
        if let Some(port) = get("REEL_PORT").and_then(|p| p.parse().ok()) {
            self.server.port = port;
        }
        self
    }

    /// Credential variable and whether it is set, per provider.
    pub fn credential_report(&self) -> Vec<(&'static str, &'static str, bool)> {
        let p = &self.providers;
        vec![
            ("gemini", GEMINI_KEY, has_key(&p.gemini.api_key)),
            ("elevenlabs", ELEVENLABS_KEY, has_key(&p.elevenlabs.api_key)),
            ("heygen", HEYGEN_KEY, has_key(&p.heygen.api_key)),
            ("kling", KLING_KEY, has_key(&p.kling.api_key)),
            ("creatomate", CREATOMATE_KEY, has_key(&p.creatomate.api_key)),
        ]
    }
}

fn has_key(key: &Option<String>) -> bool {
    key.as_deref().is_some_and(|k| !k.trim().is_empty())
}
