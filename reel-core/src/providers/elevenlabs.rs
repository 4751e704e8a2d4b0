//! Audio stage backed by ElevenLabs text-to-speech.

use super::{check_status, require_key};
use crate::config::{ElevenLabsConfig, ELEVENLABS_KEY};
use crate::error::StageError;
use crate::stage::{AudioArtifact, SpeechSynthesizer};
use async_trait::async_trait;
use serde_json::json;

const PROVIDER: &str = "elevenlabs";

pub struct ElevenLabs {
    client: reqwest::Client,
    config: ElevenLabsConfig,
}

impl ElevenLabs {
    pub fn new(client: reqwest::Client, config: ElevenLabsConfig) -> Self {
        Self { client, config }
    }

    fn url(&self) -> String {
        format!("{}/{}", self.config.endpoint.trim_end_matches('/'), self.config.voice_id)
    }
}

#[async_trait]
impl SpeechSynthesizer for ElevenLabs {
    fn provider(&self) -> &'static str {
        PROVIDER
    }

    async fn synthesize(&self, script: &str) -> Result<AudioArtifact, StageError> {
        let key = require_key(PROVIDER, ELEVENLABS_KEY, &self.config.api_key)?;
        let body = json!({
            "text": script,
            "model_id": self.config.model_id,
            "voice_settings": {
                "stability": self.config.stability,
                "similarity_boost": self.config.similarity_boost,
            }
        });
        let response = self
            .client
            .post(self.url())
            .header("xi-api-key", key)
            .json(&body)
            .send()
            .await
            .map_err(|e| StageError::transport(PROVIDER, e))?;
        let response = check_status(PROVIDER, response).await?;
        let data = response
            .bytes()
            .await
            .map_err(|e| StageError::transport(PROVIDER, e))?;
        Ok(AudioArtifact::mpeg(data))
    }
}
