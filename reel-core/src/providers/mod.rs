//! HTTP stage clients, one per upstream provider.
//!
//! Every client checks its credential before touching the network, performs
//! exactly one request, and reads exactly one success field from the reply.

mod creatomate;
mod elevenlabs;
mod gemini;
mod heygen;
mod kling;

pub use creatomate::{composition_template, Creatomate};
pub use elevenlabs::ElevenLabs;
pub use gemini::{script_prompt, Gemini};
pub use heygen::HeyGen;
pub use kling::{Kling, BACKGROUND_PROMPT};

use crate::config::ReelConfig;
use crate::error::StageError;
use crate::stage::StageClients;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;

/// Build the shared HTTP client with the configured per-request timeout.
pub fn http_client(timeout: Duration) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder().timeout(timeout).build()
}

/// HTTP-backed clients for all five stages.
pub fn stage_clients(config: &ReelConfig) -> reqwest::Result<StageClients> {
    let client = http_client(config.pipeline.request_timeout())?;
    let p = &config.providers;
    Ok(StageClients {
        script: Arc::new(Gemini::new(client.clone(), p.gemini.clone())),
        audio: Arc::new(ElevenLabs::new(client.clone(), p.elevenlabs.clone())),
        avatar: Arc::new(HeyGen::new(client.clone(), p.heygen.clone())),
        background: Arc::new(Kling::new(client.clone(), p.kling.clone())),
        compose: Arc::new(Creatomate::new(client, p.creatomate.clone())),
    })
}

fn require_key<'a>(
    provider: &'static str,
    variable: &'static str,
    key: &'a Option<String>,
) -> Result<&'a str, StageError> {
    key.as_deref()
        .filter(|k| !k.trim().is_empty())
        .ok_or(StageError::Configuration { provider, variable })
}

/// Pass a success response through; turn anything else into `Upstream` with the raw body.
async fn check_status(
    provider: &'static str,
    response: reqwest::Response,
) -> Result<reqwest::Response, StageError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let detail = if body.trim().is_empty() {
        status.to_string()
    } else {
        body
    };
    Err(StageError::Upstream {
        provider,
        status: status.as_u16(),
        detail,
    })
}

/// Decode a success body as JSON. A body that cannot be read is a transport
/// failure; one that reads but does not parse is the provider's fault.
async fn decode_json<T: DeserializeOwned>(
    provider: &'static str,
    response: reqwest::Response,
) -> Result<T, StageError> {
    let status = response.status().as_u16();
    let body = response
        .bytes()
        .await
        .map_err(|e| StageError::transport(provider, e))?;
    serde_json::from_slice(&body).map_err(|e| StageError::Upstream {
        provider,
        status,
        detail: format!("malformed response: {e}"),
    })
}

/// Read a non-empty string field from a JSON reply.
async fn json_url_field(
    provider: &'static str,
    response: reqwest::Response,
    field: &'static str,
) -> Result<String, StageError> {
    let data: serde_json::Value = decode_json(provider, response).await?;
    data.get(field)
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .ok_or(StageError::MissingField { provider, field })
}
