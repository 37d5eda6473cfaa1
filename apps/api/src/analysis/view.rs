use std::sync::Mutex;

use serde::Serialize;

/// Path of the results surface a successful submission transitions to.
pub const RESULTS_PATH: &str = "/results";

/// The user-facing surface driven by a submission: either it moves on to
/// the results view or it shows an error notice.
pub trait SubmissionView: Send + Sync {
    /// Called when a new submission starts.
    fn reset(&self) {}

    fn show_results(&self);

    fn show_error(&self, message: &str);
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ViewState {
    pub redirect: Option<&'static str>,
    pub notice: Option<String>,
}

/// View for polling clients: records the latest transition so the status
/// endpoint can report it.
#[derive(Debug, Default)]
pub struct PollingView {
    state: Mutex<ViewState>,
}

impl PollingView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ViewState {
        self.state
            .lock()
            .map(|s| s.clone())
            .unwrap_or_default()
    }

    fn update(&self, f: impl FnOnce(&mut ViewState)) {
        if let Ok(mut state) = self.state.lock() {
            f(&mut state);
        }
    }
}

impl SubmissionView for PollingView {
    fn reset(&self) {
        self.update(|s| *s = ViewState::default());
    }

    fn show_results(&self) {
        self.update(|s| {
            s.redirect = Some(RESULTS_PATH);
            s.notice = None;
        });
    }

    fn show_error(&self, message: &str) {
        self.update(|s| {
            s.redirect = None;
            s.notice = Some(message.to_string());
        });
    }
}
