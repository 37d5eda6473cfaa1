//! Axum route handlers for the Analysis API.

use std::sync::Arc;

use axum::{
    extract::{Multipart, State},
    Json,
};
use serde::Serialize;

use crate::analysis::handoff::load_result;
use crate::analysis::models::{AnalysisResult, ImageUpload, ProfileForm, SkinConcern};
use crate::analysis::orchestrator::SubmissionStatus;
use crate::analysis::view::{ViewState, RESULTS_PATH};
use crate::errors::AppError;
use crate::state::AppState;

/// Upper bound for a multipart submission, image included.
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

// ────────────────────────────────────────────────────────────────────────────
// Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub status: &'static str,
    pub redirect: &'static str,
    pub result: AnalysisResult,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    #[serde(flatten)]
    pub submission: SubmissionStatus,
    #[serde(flatten)]
    pub view: ViewState,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/analysis
///
/// Multipart form: name, age, gender, skinType, skinConcerns (repeated),
/// goals, optional image file. Runs one submission and returns its result.
/// The submission runs on its own task, so a dropped connection does not
/// cancel a call that is already under way.
pub async fn handle_submit(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<SubmitResponse>, AppError> {
    let form = read_profile_form(multipart).await?;
    let snapshot = form.snapshot()?;

    let orchestrator = Arc::clone(&state.orchestrator);
    let result = tokio::spawn(async move { orchestrator.submit(snapshot).await })
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Submission task failed: {e}")))??;

    Ok(Json(SubmitResponse {
        status: "succeeded",
        redirect: RESULTS_PATH,
        result,
    }))
}

/// GET /api/v1/analysis/status
///
/// Phase and cosmetic progress of the current or last submission.
pub async fn handle_status(State(state): State<AppState>) -> Json<StatusResponse> {
    Json(StatusResponse {
        submission: state.orchestrator.status(),
        view: state.view.state(),
    })
}

/// GET /api/v1/results
///
/// The persisted result, or the canonical fallback. Never an error.
pub async fn handle_results(State(state): State<AppState>) -> Json<AnalysisResult> {
    Json(load_result(state.store.as_ref()).await)
}

/// Builds the form from multipart fields, in the order they arrive.
async fn read_profile_form(mut multipart: Multipart) -> Result<ProfileForm, AppError> {
    let mut form = ProfileForm::default();

    while let Some(field) = multipart.next_field().await.map_err(malformed)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "image" => {
                let file_name = field.file_name().map(str::to_string);
                let content_type = field.content_type().map(str::to_string);
                let bytes = field.bytes().await.map_err(malformed)?;
                // Browsers send an empty part when no file was chosen.
                if bytes.is_empty() {
                    form.clear_image();
                } else {
                    form.attach_image(ImageUpload {
                        file_name,
                        content_type,
                        bytes,
                    })?;
                }
            }
            "skinConcerns" | "skinConcerns[]" => {
                let value = field.text().await.map_err(malformed)?;
                form.toggle_concern(value.parse::<SkinConcern>()?, true);
            }
            _ => {
                let value = field.text().await.map_err(malformed)?;
                form.set_field(&name, &value)?;
            }
        }
    }

    Ok(form)
}

fn malformed(err: axum::extract::multipart::MultipartError) -> AppError {
    AppError::Validation(format!("Malformed multipart body: {err}"))
}
