//! Avatar stage backed by HeyGen: photo + speech in, green-screen talking head out.

use super::{check_status, json_url_field, require_key};
use crate::config::{HeyGenConfig, HEYGEN_KEY};
use crate::error::StageError;
use crate::stage::{AudioArtifact, AvatarRenderer};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};

const PROVIDER: &str = "heygen";

pub struct HeyGen {
    client: reqwest::Client,
    config: HeyGenConfig,
}

impl HeyGen {
    pub fn new(client: reqwest::Client, config: HeyGenConfig) -> Self {
        Self { client, config }
    }
}

fn avatar_form(photo_url: &str, audio: &AudioArtifact) -> Result<Form, StageError> {
    let audio_part = Part::bytes(audio.data.to_vec())
        .file_name("audio.mp3")
        .mime_str(&audio.mime_type)
        .map_err(|e| StageError::transport(PROVIDER, e))?;
    Ok(Form::new()
        .text("photo_url", photo_url.to_string())
        .part("audio", audio_part)
        .text("background_type", "green_screen"))
}

#[async_trait]
impl AvatarRenderer for HeyGen {
    fn provider(&self) -> &'static str {
        PROVIDER
    }

    async fn render_avatar(&self, photo_url: &str, audio: &AudioArtifact) -> Result<String, StageError> {
        let key = require_key(PROVIDER, HEYGEN_KEY, &self.config.api_key)?;
        let response = self
            .client
            .post(&self.config.endpoint)
            .header("X-Api-Key", key)
            .multipart(avatar_form(photo_url, audio)?)
            .send()
            .await
            .map_err(|e| StageError::transport(PROVIDER, e))?;
        let response = check_status(PROVIDER, response).await?;
        json_url_field(PROVIDER, response, "video_url").await
    }
}
