//! Pipeline execution: script -> audio -> avatar -> background (unless supplied) -> compose.

use crate::error::{PipelineError, StageError};
use crate::stage::{CompositionRequest, Stage, StageClients};
use crate::store::{JobId, JobStore, StatusRecord};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tokio::task::{JoinError, JoinHandle};

pub const MSG_SCRIPT: &str = "generating script...";
pub const MSG_AUDIO: &str = "script ready, generating audio...";
pub const MSG_AVATAR: &str = "audio ready, generating avatar video...";
pub const MSG_BACKGROUND: &str = "avatar ready, generating background video...";
pub const MSG_SUPPLIED_BACKGROUND: &str = "using supplied background video, composing final video...";
pub const MSG_COMPOSE: &str = "background ready, composing final video...";
pub const MSG_COMPLETE: &str = "video generation complete";

/// One recruitment video request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoRequest {
    pub job_description: String,
    pub company_logo_url: String,
    #[serde(default)]
    pub office_video_url: Option<String>,
    pub manager_photo_url: String,
}

impl VideoRequest {
    /// Caller-supplied background, if any. Blank strings count as absent.
    pub fn supplied_background(&self) -> Option<&str> {
        self.office_video_url
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

/// Why a spawned job finished without a video.
#[derive(Debug, Error)]
pub enum JobError {
    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error("pipeline task aborted: {0}")]
    Aborted(#[from] JoinError),
}

/// Handle to a spawned job. Dropping it detaches the task; the job still runs.
#[derive(Debug)]
pub struct JobHandle {
    id: JobId,
    task: JoinHandle<Result<String, JobError>>,
}

impl JobHandle {
    pub fn id(&self) -> JobId {
        self.id
    }

    /// Wait for the job to reach a terminal state; returns the final video URL.
    pub async fn wait(self) -> Result<String, JobError> {
        self.task.await?
    }
}

/// Drives jobs through the stages and records every transition in the store.
#[derive(Clone)]
pub struct Orchestrator {
    store: Arc<JobStore>,
    clients: StageClients,
}

impl Orchestrator {
    pub fn new(store: Arc<JobStore>, clients: StageClients) -> Self {
        Self { store, clients }
    }

    pub fn store(&self) -> &Arc<JobStore> {
        &self.store
    }

    pub fn clients(&self) -> &StageClients {
        &self.clients
    }

    /// Status query for callers polling a job.
    pub fn status(&self, id: &JobId) -> StatusRecord {
        self.store.get(id)
    }

    /// Allocate an id and record the initial `processing` state.
    pub fn register(&self) -> JobId {
        let id = self.store.create();
        self.store.set_processing(id, MSG_SCRIPT);
        id
    }

    /// Register a job and run its pipeline on the tokio runtime. Returns immediately.
    pub fn submit(&self, request: VideoRequest) -> JobHandle {
        let id = self.register();
        tracing::info!(job_id = %id, "video job submitted");

        let this = self.clone();
        let task = tokio::spawn(async move {
            let pipeline = tokio::spawn({
                let this = this.clone();
                async move { this.run(id, request).await }
            });
            match pipeline.await {
                Ok(result) => result.map_err(JobError::from),
                Err(e) => {
                    tracing::error!(job_id = %id, error = %e, "pipeline task aborted");
                    this.store.set_failed(id, format!("pipeline aborted: {e}"));
                    Err(JobError::Aborted(e))
                }
            }
        });
        JobHandle { id, task }
    }

    /// Run the pipeline for an already registered job, writing its terminal status.
    pub async fn run(&self, id: JobId, request: VideoRequest) -> Result<String, PipelineError> {
        match self.execute(id, &request).await {
            Ok(video_url) => {
                self.store.set_completed(id, MSG_COMPLETE, video_url.as_str());
                tracing::info!(job_id = %id, %video_url, "video generation complete");
                Ok(video_url)
            }
            Err(e) => {
                self.store.set_failed(id, e.to_string());
                tracing::error!(job_id = %id, stage = %e.stage(), error = %e, "video generation failed");
                Err(e)
            }
        }
    }

    async fn execute(&self, id: JobId, request: &VideoRequest) -> Result<String, PipelineError> {
        let c = &self.clients;

        tracing::debug!(job_id = %id, stage = Stage::Script.as_str(), "stage started");
        let script = c
            .script
            .write_script(&request.job_description)
            .await
            .map_err(at(Stage::Script))?;
        self.progress(id, MSG_AUDIO);

        tracing::debug!(job_id = %id, stage = Stage::Audio.as_str(), "stage started");
        let audio = c.audio.synthesize(&script).await.map_err(at(Stage::Audio))?;
        tracing::debug!(job_id = %id, bytes = audio.len(), "audio synthesized");
        self.progress(id, MSG_AVATAR);

        tracing::debug!(job_id = %id, stage = Stage::Avatar.as_str(), "stage started");
        let avatar_url = c
            .avatar
            .render_avatar(&request.manager_photo_url, &audio)
            .await
            .and_then(|url| reference(c.avatar.provider(), "video_url", url))
            .map_err(at(Stage::Avatar))?;
        drop(audio);

        let background_url = match request.supplied_background() {
            Some(url) => {
                tracing::debug!(job_id = %id, "using supplied background");
                self.progress(id, MSG_SUPPLIED_BACKGROUND);
                url.to_string()
            }
            None => {
                self.progress(id, MSG_BACKGROUND);
                tracing::debug!(job_id = %id, stage = Stage::Background.as_str(), "stage started");
                let url = c
                    .background
                    .generate_background()
                    .await
                    .and_then(|url| reference(c.background.provider(), "video_url", url))
                    .map_err(at(Stage::Background))?;
                self.progress(id, MSG_COMPOSE);
                url
            }
        };

        tracing::debug!(job_id = %id, stage = Stage::Compose.as_str(), "stage started");
        let composition = CompositionRequest {
            background_url,
            avatar_url,
            logo_url: request.company_logo_url.clone(),
            script,
        };
        c.compose
            .compose(&composition)
            .await
            .and_then(|url| reference(c.compose.provider(), "url", url))
            .map_err(at(Stage::Compose))
    }

    fn progress(&self, id: JobId, message: &str) {
        self.store.set_processing(id, message);
    }
}

fn at(stage: Stage) -> impl Fn(StageError) -> PipelineError {
    move |e| PipelineError::new(stage, e)
}

/// A media reference handed to the next stage must be non-blank.
fn reference(provider: &'static str, field: &'static str, url: String) -> Result<String, StageError> {
    if url.trim().is_empty() {
        return Err(StageError::MissingField { provider, field });
    }
    Ok(url)
}
