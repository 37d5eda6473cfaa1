use std::sync::Arc;

use crate::analysis::orchestrator::SubmissionOrchestrator;
use crate::analysis::view::PollingView;
use crate::store::ResultStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<SubmissionOrchestrator>,
    /// Persisted result slot, read by the results endpoint.
    pub store: Arc<dyn ResultStore>,
    /// Last view transition, reported alongside submission status.
    pub view: Arc<PollingView>,
}
