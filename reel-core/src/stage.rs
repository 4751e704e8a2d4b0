//! Stage contracts: stage enum, transient artifacts, and the client traits.

use crate::error::StageError;
use async_trait::async_trait;
use bytes::Bytes;
use std::fmt;
use std::sync::Arc;

/// Pipeline step, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Script,
    Audio,
    Avatar,
    Background,
    Compose,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Script => "script",
            Stage::Audio => "audio",
            Stage::Avatar => "avatar",
            Stage::Background => "background",
            Stage::Compose => "compose",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Synthesized speech held in memory between the audio and avatar stages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioArtifact {
    pub data: Bytes,
    pub mime_type: String,
}

impl AudioArtifact {
    pub fn mpeg(data: impl Into<Bytes>) -> Self {
        Self {
            data: data.into(),
            mime_type: "audio/mpeg".to_string(),
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Everything the composer layers into the final video.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompositionRequest {
    pub background_url: String,
    pub avatar_url: String,
    pub logo_url: String,
    pub script: String,
}

#[async_trait]
pub trait ScriptWriter: Send + Sync {
    fn provider(&self) -> &'static str;
    async fn write_script(&self, job_description: &str) -> Result<String, StageError>;
}

#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    fn provider(&self) -> &'static str;
    async fn synthesize(&self, script: &str) -> Result<AudioArtifact, StageError>;
}

/// Produces a talking-head video on a green-screen background.
#[async_trait]
pub trait AvatarRenderer: Send + Sync {
    fn provider(&self) -> &'static str;
    async fn render_avatar(&self, photo_url: &str, audio: &AudioArtifact) -> Result<String, StageError>;
}

#[async_trait]
pub trait BackgroundGenerator: Send + Sync {
    fn provider(&self) -> &'static str;
    async fn generate_background(&self) -> Result<String, StageError>;
}

#[async_trait]
pub trait VideoComposer: Send + Sync {
    fn provider(&self) -> &'static str;
    async fn compose(&self, request: &CompositionRequest) -> Result<String, StageError>;
}

/// One client per stage, shared across jobs.
#[derive(Clone)]
pub struct StageClients {
    pub script: Arc<dyn ScriptWriter>,
    pub audio: Arc<dyn SpeechSynthesizer>,
    pub avatar: Arc<dyn AvatarRenderer>,
    pub background: Arc<dyn BackgroundGenerator>,
    pub compose: Arc<dyn VideoComposer>,
}

impl StageClients {
    /// Provider name serving each stage, in pipeline order.
    pub fn providers(&self) -> [(Stage, &'static str); 5] {
        [
            (Stage::Script, self.script.provider()),
            (Stage::Audio, self.audio.provider()),
            (Stage::Avatar, self.avatar.provider()),
            (Stage::Background, self.background.provider()),
            (Stage::Compose, self.compose.provider()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_names() {
        assert_eq!(Stage::Script.as_str(), "script");
        assert_eq!(Stage::Background.to_string(), "background");
    }

    #[test]
    fn audio_artifact_mpeg() {
        let a = AudioArtifact::mpeg(vec![1u8, 2, 3]);
        assert_eq!(a.mime_type, "audio/mpeg");
        assert_eq!(a.len(), 3);
        assert!(!a.is_empty());
    }
}
