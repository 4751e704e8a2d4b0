use reel_core::{JobStore, Orchestrator, StageClients};
use std::sync::Arc;

/// Shared handler state: the orchestrator and the job store it writes to.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Orchestrator,
    pub jobs: Arc<JobStore>,
}

impl AppState {
    pub fn new(jobs: Arc<JobStore>, clients: StageClients) -> Self {
        Self {
            orchestrator: Orchestrator::new(Arc::clone(&jobs), clients),
            jobs,
        }
    }
}
