//! Script stage backed by Gemini `generateContent`.

use super::{check_status, decode_json, require_key};
use crate::config::{GeminiConfig, GEMINI_KEY};
use crate::error::StageError;
use crate::stage::ScriptWriter;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

const PROVIDER: &str = "gemini";

pub struct Gemini {
    client: reqwest::Client,
    config: GeminiConfig,
}

impl Gemini {
    pub fn new(client: reqwest::Client, config: GeminiConfig) -> Self {
        Self { client, config }
    }
}

/// Prompt for a ~50 second spoken recruitment script in Hook / Value / CTA form.
pub fn script_prompt(job_description: &str) -> String {
    format!(
        "Turn the following job description into a conversational recruitment video script of about 50 seconds.

Job description:
{job_description}

Requirements:
1. Three parts: Hook (grab attention, 10 seconds), Value (core value, 30 seconds), CTA (call to action, 10 seconds)
2. Natural, spoken language suitable for a voice-over
3. About 50 seconds in total (roughly 150-200 words)
4. Address the viewer directly in the second person

Output only the script itself, with no other commentary."
    )
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

impl GenerateResponse {
    fn first_text(self) -> Option<String> {
        let text = self
            .candidates
            .into_iter()
            .next()?
            .content?
            .parts
            .into_iter()
            .next()?
            .text;
        let trimmed = text.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    }
}

#[async_trait]
impl ScriptWriter for Gemini {
    fn provider(&self) -> &'static str {
        PROVIDER
    }

    async fn write_script(&self, job_description: &str) -> Result<String, StageError> {
        let key = require_key(PROVIDER, GEMINI_KEY, &self.config.api_key)?;
        let body = json!({
            "contents": [{ "parts": [{ "text": script_prompt(job_description) }] }]
        });
        let response = self
            .client
            .post(&self.config.endpoint)
            .query(&[("key", key)])
            .json(&body)
            .send()
            .await
            .map_err(|e| StageError::transport(PROVIDER, e))?;
        let response = check_status(PROVIDER, response).await?;
        let data: GenerateResponse = decode_json(PROVIDER, response).await?;
        data.first_text().ok_or(StageError::MissingField {
            provider: PROVIDER,
            field: "candidates[0].content.parts[0].text",
        })
    }
}
