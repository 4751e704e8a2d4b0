//! Compose stage backed by Creatomate renders.

use super::{check_status, json_url_field, require_key};
use crate::config::{CreatomateConfig, CREATOMATE_KEY};
use crate::error::StageError;
use crate::stage::{CompositionRequest, VideoComposer};
use async_trait::async_trait;
use serde_json::{json, Value};

const PROVIDER: &str = "creatomate";

const WIDTH: u32 = 1920;
const HEIGHT: u32 = 1080;
const DURATION_SECS: u32 = 50;

pub struct Creatomate {
    client: reqwest::Client,
    config: CreatomateConfig,
}

impl Creatomate {
    pub fn new(client: reqwest::Client, config: CreatomateConfig) -> Self {
        Self { client, config }
    }
}

/// Render template, bottom layer first: background, keyed avatar, logo, caption.
pub fn composition_template(request: &CompositionRequest) -> Value {
    json!({
        "width": WIDTH,
        "height": HEIGHT,
        "duration": DURATION_SECS,
        "elements": [
            {
                "type": "video",
                "source": request.background_url,
                "x": "0%",
                "y": "0%",
                "width": "100%",
                "height": "100%",
                "time": 0,
                "duration": DURATION_SECS
            },
            {
                "type": "video",
                "source": request.avatar_url,
                "x": "60%",
                "y": "20%",
                "width": "35%",
                "height": "60%",
                "time": 0,
                "duration": DURATION_SECS,
                "chroma_key": { "color": "#00ff00", "tolerance": 0.3 }
            },
            {
                "type": "image",
                "source": request.logo_url,
                "x": "5%",
                "y": "5%",
                "width": "15%",
                "height": "auto",
                "time": 0,
                "duration": DURATION_SECS
            },
            {
                "type": "text",
                "text": request.script,
                "x": "5%",
                "y": "75%",
                "width": "50%",
                "font_family": "Arial",
                "font_size": "48px",
                "font_weight": "bold",
                "fill_color": "#ffffff",
                "stroke_color": "#000000",
                "stroke_width": "2px",
                "time": 0,
                "duration": DURATION_SECS,
                "animations": [{ "type": "fade", "start_time": 0, "duration": 1 }]
            }
        ]
    })
}

#[async_trait]
impl VideoComposer for Creatomate {
    fn provider(&self) -> &'static str {
        PROVIDER
    }

    async fn compose(&self, request: &CompositionRequest) -> Result<String, StageError> {
        let key = require_key(PROVIDER, CREATOMATE_KEY, &self.config.api_key)?;
        let response = self
            .client
            .post(&self.config.endpoint)
            .bearer_auth(key)
            .json(&json!({ "template": composition_template(request) }))
            .send()
            .await
            .map_err(|e| StageError::transport(PROVIDER, e))?;
        let response = check_status(PROVIDER, response).await?;
        json_url_field(PROVIDER, response, "url").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> CompositionRequest {
        CompositionRequest {
            background_url: "https://x/office.mp4".into(),
            avatar_url: "https://x/avatar.mp4".into(),
            logo_url: "https://x/logo.png".into(),
            script: "Join our team.".into(),
        }
    }

    #[test]
    fn template_layers_in_order() {
        let t = composition_template(&request());
        assert_eq!(t["width"], 1920);
        assert_eq!(t["height"], 1080);
        let elements = t["elements"].as_array().unwrap();
        assert_eq!(elements.len(), 4);
        assert_eq!(elements[0]["source"], "https://x/office.mp4");
        assert_eq!(elements[1]["source"], "https://x/avatar.mp4");
        assert_eq!(elements[1]["chroma_key"]["color"], "#00ff00");
        assert_eq!(elements[2]["type"], "image");
        assert_eq!(elements[2]["source"], "https://x/logo.png");
        assert_eq!(elements[3]["text"], "Join our team.");
    }

    #[test]
    fn every_layer_spans_the_full_duration() {
        let t = composition_template(&request());
        for e in t["elements"].as_array().unwrap() {
            assert_eq!(e["duration"], 50);
            assert_eq!(e["time"], 0);
        }
    }
}
