//! Submission Orchestrator: drives one user-visible analysis submission.
//!
//! Flow: acquire in-flight slot → start progress ticker → encode image →
//!       adapter call → stop ticker → persist + navigate | notify error.
//!
//! Only one submission runs at a time. A second `submit` while one is in
//! flight is refused before any work happens, so it never reaches the model.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::analysis::adapter::{AnalysisError, SkinAnalyzer};
use crate::analysis::handoff::persist_result;
use crate::analysis::models::{
    AnalysisResult, ImageDataUri, ImageUpload, ProfileError, ProfileSnapshot,
};
use crate::analysis::progress::{ProgressMeter, ProgressSchedule, ProgressTicker};
use crate::analysis::view::SubmissionView;
use crate::store::ResultStore;

/// Pause between reaching 100% and switching to the results view.
pub const NAVIGATION_DELAY: Duration = Duration::from_millis(500);

/// Notice shown to the user when the analysis call could not be made.
pub const ANALYSIS_FAILED_MESSAGE: &str = "An error occurred during analysis. Please try again.";

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("A submission is already in progress")]
    AlreadyInFlight,

    #[error("Invalid image: {0}")]
    InvalidImage(#[from] ProfileError),

    #[error("Image encoding failed: {0}")]
    ImageEncoding(String),

    #[error(transparent)]
    Analysis(#[from] AnalysisError),
}

/// `Succeeded` and `Failed` are terminal for their submission; both accept a
/// new submit, same as `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionPhase {
    Idle,
    Submitting,
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubmissionStatus {
    pub phase: SubmissionPhase,
    pub progress: u8,
    pub submission_id: Option<Uuid>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
struct StatusRecord {
    phase: SubmissionPhase,
    submission_id: Option<Uuid>,
    started_at: Option<DateTime<Utc>>,
    finished_at: Option<DateTime<Utc>>,
}

impl Default for StatusRecord {
    fn default() -> Self {
        Self {
            phase: SubmissionPhase::Idle,
            submission_id: None,
            started_at: None,
            finished_at: None,
        }
    }
}

pub struct SubmissionOrchestrator {
    analyzer: SkinAnalyzer,
    store: Arc<dyn ResultStore>,
    view: Arc<dyn SubmissionView>,
    progress: ProgressMeter,
    schedule: ProgressSchedule,
    navigation_delay: Duration,
    in_flight: AtomicBool,
    status: Mutex<StatusRecord>,
}

impl SubmissionOrchestrator {
    pub fn new(
        analyzer: SkinAnalyzer,
        store: Arc<dyn ResultStore>,
        view: Arc<dyn SubmissionView>,
    ) -> Self {
        Self {
            analyzer,
            store,
            view,
            progress: ProgressMeter::new(),
            schedule: ProgressSchedule::default(),
            navigation_delay: NAVIGATION_DELAY,
            in_flight: AtomicBool::new(false),
            status: Mutex::new(StatusRecord::default()),
        }
    }

    #[cfg(test)]
    pub fn progress(&self) -> &ProgressMeter {
        &self.progress
    }

    pub fn status(&self) -> SubmissionStatus {
        let record = self
            .status
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default();
        SubmissionStatus {
            phase: record.phase,
            progress: self.progress.get(),
            submission_id: record.submission_id,
            started_at: record.started_at,
            finished_at: record.finished_at,
        }
    }

    /// Runs one submission to completion.
    ///
    /// On success the result has been handed to the store (best effort) and
    /// the view has been moved to results. On error the view shows the
    /// failure notice and the orchestrator is ready for a new submission.
    pub async fn submit(&self, snapshot: ProfileSnapshot) -> Result<AnalysisResult, SubmitError> {
        // Invalid input is refused before the slot is taken or any state changes.
        if let Some(upload) = &snapshot.image {
            upload.mime_type()?;
        }

        let mut slot = InFlightSlot::acquire(self).ok_or(SubmitError::AlreadyInFlight)?;

        let submission_id = Uuid::new_v4();
        info!("Submission {submission_id} started");
        self.progress.reset();
        self.view.reset();
        self.set_status(|s| {
            *s = StatusRecord {
                phase: SubmissionPhase::Submitting,
                submission_id: Some(submission_id),
                started_at: Some(Utc::now()),
                finished_at: None,
            }
        });

        let mut ticker = ProgressTicker::start(self.progress.clone(), self.schedule);
        let outcome = self.run(snapshot).await;
        ticker.stop();

        match outcome {
            Ok(result) => {
                self.progress.complete();
                persist_result(self.store.as_ref(), &result).await;
                tokio::time::sleep(self.navigation_delay).await;
                self.finish(SubmissionPhase::Succeeded);
                slot.release();
                self.view.show_results();
                info!("Submission {submission_id} succeeded");
                Ok(result)
            }
            Err(err) => {
                error!("Submission {submission_id} failed: {err}");
                self.progress.reset();
                self.finish(SubmissionPhase::Failed);
                slot.release();
                self.view.show_error(ANALYSIS_FAILED_MESSAGE);
                Err(err)
            }
        }
    }

    async fn run(&self, snapshot: ProfileSnapshot) -> Result<AnalysisResult, SubmitError> {
        let ProfileSnapshot { mut profile, image } = snapshot;

        if let Some(upload) = image {
            let uri = encode_image(upload).await?;
            info!("Encoded {} image attachment", uri.mime_type());
            profile.image = Some(uri);
        }

        Ok(self.analyzer.analyze(&profile).await?)
    }

    fn finish(&self, phase: SubmissionPhase) {
        self.set_status(|s| {
            s.phase = phase;
            s.finished_at = Some(Utc::now());
        });
    }

    fn set_status(&self, f: impl FnOnce(&mut StatusRecord)) {
        if let Ok(mut record) = self.status.lock() {
            f(&mut record);
        }
    }
}

/// Base64-encodes the upload on the blocking pool.
async fn encode_image(upload: ImageUpload) -> Result<ImageDataUri, SubmitError> {
    let encoded = tokio::task::spawn_blocking(move || ImageDataUri::encode(&upload))
        .await
        .map_err(|e| SubmitError::ImageEncoding(e.to_string()))?;
    Ok(encoded?)
}

/// Holds the orchestrator's single in-flight slot. If the submission future
/// is dropped midway, the slot is freed and the phase leaves `Submitting`.
struct InFlightSlot<'a> {
    orchestrator: &'a SubmissionOrchestrator,
    released: bool,
}

impl<'a> InFlightSlot<'a> {
    fn acquire(orchestrator: &'a SubmissionOrchestrator) -> Option<Self> {
        orchestrator
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self {
                orchestrator,
                released: false,
            })
    }

    fn release(&mut self) {
        if !self.released {
            self.orchestrator.in_flight.store(false, Ordering::Release);
            self.released = true;
        }
    }
}

impl Drop for InFlightSlot<'_> {
    fn drop(&mut self) {
        if !self.released {
            warn!("Submission abandoned before completion");
            self.orchestrator.progress.reset();
            self.orchestrator.finish(SubmissionPhase::Failed);
            self.release();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::adapter::tests::{GatedModel, ScriptedModel, VALID_REPLY};
    use crate::analysis::handoff::{load_result, RESULT_KEY};
    use crate::analysis::handoff::tests::BrokenStore;
    use crate::analysis::models::{Profile, SkinConcern, SkinType};
    use crate::analysis::progress::{PROGRESS_CEILING, PROGRESS_COMPLETE};
    use crate::analysis::view::{PollingView, ViewState, RESULTS_PATH};
    use crate::llm_client::{LlmError, TextModel};
    use crate::store::MemoryStore;
    use bytes::Bytes;

    fn snapshot() -> ProfileSnapshot {
        ProfileSnapshot {
            profile: Profile {
                name: "Asha".to_string(),
                age: "29".to_string(),
                skin_type: Some(SkinType::Oily),
                skin_concerns: vec![SkinConcern::Acne],
                ..Profile::default()
            },
            image: None,
        }
    }

    struct Harness {
        orchestrator: Arc<SubmissionOrchestrator>,
        store: Arc<MemoryStore>,
        view: Arc<PollingView>,
    }

    fn harness(model: Arc<dyn TextModel>) -> Harness {
        let store = Arc::new(MemoryStore::new());
        let view = Arc::new(PollingView::new());
        let orchestrator = SubmissionOrchestrator::new(
            SkinAnalyzer::new(model),
            store.clone(),
            view.clone(),
        );
        Harness {
            orchestrator: Arc::new(orchestrator),
            store,
            view,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_successful_submission_persists_and_navigates() {
        let h = harness(Arc::new(ScriptedModel::replying(VALID_REPLY)));

        let result = h.orchestrator.submit(snapshot()).await.unwrap();

        assert_eq!(result.skin_type, "Oily");
        assert_eq!(load_result(h.store.as_ref()).await, result);
        assert_eq!(h.orchestrator.progress().get(), PROGRESS_COMPLETE);
        assert_eq!(h.orchestrator.status().phase, SubmissionPhase::Succeeded);
        assert!(h.orchestrator.status().finished_at.is_some());
        assert_eq!(h.view.state().redirect, Some(RESULTS_PATH));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unusable_reply_still_succeeds_with_fallback() {
        let h = harness(Arc::new(ScriptedModel::replying("no json at all")));

        let result = h.orchestrator.submit(snapshot()).await.unwrap();

        assert_eq!(result.skin_type, "oily");
        assert_eq!(result.concerns, vec!["acne"]);
        assert_eq!(result.hydration_score, 65);
        assert_eq!(h.view.state().redirect, Some(RESULTS_PATH));
    }

    #[tokio::test(start_paused = true)]
    async fn test_call_failure_notifies_and_returns_to_idle() {
        let h = harness(Arc::new(ScriptedModel::new(vec![
            Err(LlmError::MissingCredential),
            Err(LlmError::MissingCredential),
        ])));

        let err = h.orchestrator.submit(snapshot()).await.unwrap_err();

        assert!(matches!(err, SubmitError::Analysis(AnalysisError::CallFailed(_))));
        assert_eq!(
            h.view.state(),
            ViewState {
                redirect: None,
                notice: Some(ANALYSIS_FAILED_MESSAGE.to_string())
            }
        );
        assert_eq!(h.orchestrator.status().phase, SubmissionPhase::Failed);
        assert_eq!(h.orchestrator.progress().get(), 0);
        assert!(h.store.get(RESULT_KEY).await.unwrap().is_none());

        // Ready for another attempt.
        let retry = h.orchestrator.submit(snapshot()).await;
        assert!(matches!(retry, Err(SubmitError::Analysis(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_storage_failure_does_not_block_navigation() {
        let view = Arc::new(PollingView::new());
        let orchestrator = SubmissionOrchestrator::new(
            SkinAnalyzer::new(Arc::new(ScriptedModel::replying(VALID_REPLY))),
            Arc::new(BrokenStore),
            view.clone(),
        );

        assert!(orchestrator.submit(snapshot()).await.is_ok());
        assert_eq!(view.state().redirect, Some(RESULTS_PATH));
    }

    #[tokio::test(start_paused = true)]
    async fn test_progress_capped_while_call_outstanding() {
        let model = Arc::new(GatedModel::new());
        let h = harness(model.clone());

        let orchestrator = h.orchestrator.clone();
        let task = tokio::spawn(async move { orchestrator.submit(snapshot()).await });

        tokio::time::sleep(Duration::from_millis(1_010)).await;
        assert_eq!(h.orchestrator.progress().get(), 20);
        assert_eq!(h.orchestrator.status().phase, SubmissionPhase::Submitting);

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(h.orchestrator.progress().get(), PROGRESS_CEILING);

        model.gate.notify_one();
        task.await.unwrap().unwrap();
        assert_eq!(h.orchestrator.progress().get(), PROGRESS_COMPLETE);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_submit_is_refused_without_second_call() {
        let model = Arc::new(GatedModel::new());
        let h = harness(model.clone());

        let orchestrator = h.orchestrator.clone();
        let first = tokio::spawn(async move { orchestrator.submit(snapshot()).await });
        tokio::time::sleep(Duration::from_millis(100)).await;

        let second = h.orchestrator.submit(snapshot()).await;
        assert!(matches!(second, Err(SubmitError::AlreadyInFlight)));

        model.gate.notify_one();
        first.await.unwrap().unwrap();
        assert_eq!(model.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_submission_frees_the_slot() {
        let model = Arc::new(GatedModel::new());
        let h = harness(model.clone());

        let orchestrator = h.orchestrator.clone();
        let task = tokio::spawn(async move { orchestrator.submit(snapshot()).await });
        tokio::time::sleep(Duration::from_millis(600)).await;
        task.abort();
        let _ = task.await;

        assert_eq!(h.orchestrator.status().phase, SubmissionPhase::Failed);
        let progress_after_abort = h.orchestrator.progress().get();
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(h.orchestrator.progress().get(), progress_after_abort);

        model.gate.notify_one();
        assert!(h.orchestrator.submit(snapshot()).await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_image_is_encoded_but_not_sent_in_prompt() {
        let model = Arc::new(GatedModel::new());
        let h = harness(model.clone());

        let mut with_image = snapshot();
        with_image.image = Some(ImageUpload {
            file_name: Some("face.jpg".to_string()),
            content_type: Some("image/jpeg".to_string()),
            bytes: Bytes::from_static(&[0xFF, 0xD8, 0xFF]),
        });

        let orchestrator = h.orchestrator.clone();
        let task = tokio::spawn(async move { orchestrator.submit(with_image).await });
        tokio::time::sleep(Duration::from_millis(100)).await;
        model.gate.notify_one();
        task.await.unwrap().unwrap();

        assert!(!model.seen_prompt_has_image.load(Ordering::SeqCst));
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_image_attachment_is_refused_without_state_change() {
        let model = Arc::new(ScriptedModel::replying(VALID_REPLY));
        let h = harness(model.clone());

        let mut with_pdf = snapshot();
        with_pdf.image = Some(ImageUpload {
            file_name: Some("scan.pdf".to_string()),
            content_type: Some("application/pdf".to_string()),
            bytes: Bytes::from_static(b"%PDF-1.7"),
        });

        let err = h.orchestrator.submit(with_pdf).await.unwrap_err();
        assert!(matches!(err, SubmitError::InvalidImage(_)));
        assert_eq!(model.call_count(), 0);
        assert_eq!(h.orchestrator.status().phase, SubmissionPhase::Idle);
        assert_eq!(h.orchestrator.progress().get(), 0);
        assert_eq!(h.view.state(), ViewState::default());

        assert!(h.orchestrator.submit(snapshot()).await.is_ok());
    }
}
