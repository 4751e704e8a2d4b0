//! Background stage backed by Kling text-to-video.

use super::{check_status, json_url_field, require_key};
use crate::config::{KlingConfig, KLING_KEY};
use crate::error::StageError;
use crate::stage::BackgroundGenerator;
use async_trait::async_trait;
use serde_json::json;

const PROVIDER: &str = "kling";

pub const BACKGROUND_PROMPT: &str =
    "Modern office environment, professional workspace, clean and bright, 5 seconds";

pub struct Kling {
    client: reqwest::Client,
    config: KlingConfig,
}

impl Kling {
    pub fn new(client: reqwest::Client, config: KlingConfig) -> Self {
        Self { client, config }
    }
}

#[async_trait]
impl BackgroundGenerator for Kling {
    fn provider(&self) -> &'static str {
        PROVIDER
    }

    async fn generate_background(&self) -> Result<String, StageError> {
        let key = require_key(PROVIDER, KLING_KEY, &self.config.api_key)?;
        let body = json!({
            "prompt": BACKGROUND_PROMPT,
            "duration": self.config.duration_secs,
            "aspect_ratio": self.config.aspect_ratio,
        });
        let response = self
            .client
            .post(&self.config.endpoint)
            .bearer_auth(key)
            .json(&body)
            .send()
            .await
            .map_err(|e| StageError::transport(PROVIDER, e))?;
        let response = check_status(PROVIDER, response).await?;
        json_url_field(PROVIDER, response, "video_url").await
    }
}
