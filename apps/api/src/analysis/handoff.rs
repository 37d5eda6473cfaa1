//! One-shot handoff of the latest AnalysisResult through the persisted slot.
//!
//! Neither side fails outward: write errors are logged and dropped, and the
//! read side degrades to the canonical fallback.

use bytes::Bytes;
use tracing::{error, info, warn};

use crate::analysis::fallback::canonical_fallback;
use crate::analysis::models::AnalysisResult;
use crate::store::ResultStore;

/// Fixed key of the persisted result slot.
pub const RESULT_KEY: &str = "skinAnalysisResult";

/// Serializes and stores `result`. Returns whether the write landed.
pub async fn persist_result(store: &dyn ResultStore, result: &AnalysisResult) -> bool {
    let payload = match serde_json::to_vec(result) {
        Ok(payload) => Bytes::from(payload),
        Err(e) => {
            error!("Failed to serialize analysis result: {e}");
            return false;
        }
    };

    match store.set(RESULT_KEY, payload).await {
        Ok(()) => {
            info!("Stored analysis result under '{RESULT_KEY}'");
            true
        }
        Err(e) => {
            error!("Error storing analysis result: {e}");
            false
        }
    }
}

/// Reads the persisted result, falling back when it is missing or unreadable.
pub async fn load_result(store: &dyn ResultStore) -> AnalysisResult {
    let stored = match store.get(RESULT_KEY).await {
        Ok(stored) => stored,
        Err(e) => {
            error!("Error accessing result store: {e}");
            None
        }
    };

    let Some(payload) = stored else {
        info!("No stored result found, using fallback data");
        return canonical_fallback();
    };

    match serde_json::from_slice::<AnalysisResult>(&payload) {
        Ok(result) => result.normalized(),
        Err(e) => {
            warn!("Error parsing stored result: {e}");
            canonical_fallback()
        }
    }
}
