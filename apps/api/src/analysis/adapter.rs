//! Prompt/Response adapter: turns a Profile into exactly one AnalysisResult.
//!
//! Flow: build_analysis_prompt → TextModel::generate → extract JSON span →
//!       deserialize + normalize → (fallback on unusable reply).
//!
//! Failures come in two tiers:
//! - `UnusableResponse`: the model answered but the answer cannot be used.
//!   Resolved here by substituting the fallback result; never surfaced.
//! - `CallFailed`: the call could not be made at all (no credential,
//!   transport or API error). Returned to the caller.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::analysis::extract::json_candidate;
use crate::analysis::fallback::fallback_result;
use crate::analysis::models::{AnalysisResult, Profile};
use crate::analysis::prompts::build_analysis_prompt;
use crate::llm_client::{LlmError, TextModel};

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Model reply was unusable: {0}")]
    UnusableResponse(String),

    #[error("Analysis call failed: {0}")]
    CallFailed(#[source] LlmError),
}

impl From<LlmError> for AnalysisError {
    fn from(err: LlmError) -> Self {
        if err.is_unusable_reply() {
            AnalysisError::UnusableResponse(err.to_string())
        } else {
            AnalysisError::CallFailed(err)
        }
    }
}

#[derive(Clone)]
pub struct SkinAnalyzer {
    model: Arc<dyn TextModel>,
}

impl SkinAnalyzer {
    pub fn new(model: Arc<dyn TextModel>) -> Self {
        Self { model }
    }

    /// Runs one analysis. Only `AnalysisError::CallFailed` can come back;
    /// an unusable reply resolves to the fallback for this profile.
    pub async fn analyze(&self, profile: &Profile) -> Result<AnalysisResult, AnalysisError> {
        match self.request_analysis(profile).await {
            Ok(result) => {
                info!(
                    "Analysis parsed: skin_type={}, {} morning / {} evening steps",
                    result.skin_type,
                    result.morning_routine.steps.len(),
                    result.evening_routine.steps.len()
                );
                Ok(result)
            }
            Err(AnalysisError::UnusableResponse(reason)) => {
                warn!("Model reply unusable, serving fallback analysis: {reason}");
                Ok(fallback_result(profile))
            }
            Err(err) => Err(err),
        }
    }

    async fn request_analysis(&self, profile: &Profile) -> Result<AnalysisResult, AnalysisError> {
        let prompt = build_analysis_prompt(profile);
        debug!("Analysis prompt is {} bytes", prompt.len());

        let raw = self.model.generate(&prompt).await?;
        interpret_reply(&raw)
    }
}

/// Reduces raw model text to a normalized AnalysisResult.
pub fn interpret_reply(raw: &str) -> Result<AnalysisResult, AnalysisError> {
    let candidate = json_candidate(raw);
    let result: AnalysisResult = serde_json::from_str(candidate)
        .map_err(|e| AnalysisError::UnusableResponse(e.to_string()))?;
    Ok(result.normalized())
}
