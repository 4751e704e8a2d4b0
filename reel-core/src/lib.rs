//! recruit-reel core: stage contracts, HTTP stage clients, job store, pipeline orchestrator.

pub mod config;
pub mod error;
pub mod pipeline;
pub mod providers;
pub mod stage;
pub mod store;

pub use config::ReelConfig;
pub use error::{ConfigError, PipelineError, StageError};
pub use pipeline::{JobError, JobHandle, Orchestrator, VideoRequest};
pub use stage::{
    AudioArtifact, AvatarRenderer, BackgroundGenerator, CompositionRequest, ScriptWriter, SpeechSynthesizer, Stage,
    StageClients, VideoComposer,
};
pub use store::{JobId, JobStatus, JobStore, StatusRecord};
