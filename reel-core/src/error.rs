//! Error taxonomy: stage failures, pipeline failures and config loading.

use crate::stage::Stage;
use std::path::PathBuf;
use thiserror::Error;

/// Failure of a single stage client call.
#[derive(Debug, Error)]
pub enum StageError {
    /// Required credential absent; raised before any network call.
    #[error("{provider}: missing credential {variable}")]
    Configuration {
        provider: &'static str,
        variable: &'static str,
    },

    /// Provider answered with a non-success status.
    #[error("{provider}: {detail}")]
    Upstream {
        provider: &'static str,
        status: u16,
        detail: String,
    },

    /// Provider answered successfully but without the expected field.
    #[error("{provider}: response missing {field}")]
    MissingField {
        provider: &'static str,
        field: &'static str,
    },

    #[error("{provider}: {source}")]
    Transport {
        provider: &'static str,
        #[source]
        source: reqwest::Error,
    },
}

impl StageError {
    pub fn provider(&self) -> &'static str {
        match self {
            StageError::Configuration { provider, .. }
            | StageError::Upstream { provider, .. }
            | StageError::MissingField { provider, .. }
            | StageError::Transport { provider, .. } => provider,
        }
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, StageError::Configuration { .. })
    }

    pub(crate) fn transport(provider: &'static str, source: reqwest::Error) -> Self {
        StageError::Transport { provider, source }
    }
}

/// A stage failure attributed to the stage that raised it.
#[derive(Debug, Error)]
#[error("{source}")]
pub struct PipelineError {
    stage: Stage,
    #[source]
    source: StageError,
}

impl PipelineError {
    pub fn new(stage: Stage, source: StageError) -> Self {
        Self { stage, source }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn stage_error(&self) -> &StageError {
        &self.source
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse config: {0}")]
    Parse(#[from] toml::de::Error),
}
