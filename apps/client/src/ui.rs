//! UI adapter — the orchestrator's only view of the interface layer.
//!
//! Purely cosmetic and non-authoritative: every method is infallible and
//! must never block or influence the orchestration outcome. A UI surface
//! that does not exist is simply an adapter that ignores the call.

use std::time::Duration;

use tracing::{debug, error, info, warn};

/// Notification severity, mirroring the toast surface's levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Success,
    Error,
    Warning,
}

/// Capability interface implemented by the UI layer.
pub trait UiAdapter: Send + Sync {
    /// Toast/notification surface.
    fn notify(&self, message: &str, severity: Severity);

    /// Progress indicator: percentage in 0–100 plus a display label.
    fn report_progress(&self, pct: u8, label: &str);

    /// Disables or restores the submit control. Restoring also hides the
    /// progress indicator and restores the control's original label.
    fn set_busy(&self, busy: bool);

    /// Accessible live-status region.
    fn announce(&self, text: &str);

    /// Visible credit-count display: "∞" for premium, the balance otherwise.
    fn show_credits(&self, display: &str);
}

/// A progress checkpoint reported at a phase boundary. The state machine
/// never consults these; they only drive the indicator.
#[derive(Debug, Clone, Copy)]
pub struct ProgressStep {
    pub pct: u8,
    pub label: &'static str,
}

pub const PROGRESS_START: ProgressStep = ProgressStep {
    pct: 0,
    label: "Preparing submission…",
};
pub const PROGRESS_RESUME: ProgressStep = ProgressStep {
    pct: 25,
    label: "Generating resume…",
};
pub const PROGRESS_COVER_LETTER: ProgressStep = ProgressStep {
    pct: 60,
    label: "Generating cover letter…",
};
pub const PROGRESS_SAVING: ProgressStep = ProgressStep {
    pct: 90,
    label: "Saving documents…",
};
pub const PROGRESS_DONE: ProgressStep = ProgressStep {
    pct: 100,
    label: "Done",
};

/// How long the completed indicator lingers at 100% before the UI is
/// released.
pub const PROGRESS_LINGER: Duration = Duration::from_millis(400);

/// Console adapter used by the binary: renders every UI call as a log line.
pub struct ConsoleUi;

impl UiAdapter for ConsoleUi {
    fn notify(&self, message: &str, severity: Severity) {
        match severity {
            Severity::Error => error!("{message}"),
            Severity::Warning => warn!("{message}"),
            Severity::Success | Severity::Info => info!("{message}"),
        }
    }

    fn report_progress(&self, pct: u8, label: &str) {
        info!("[{pct:>3}%] {label}");
    }

    fn set_busy(&self, busy: bool) {
        debug!(
            "submit control {}",
            if busy { "disabled" } else { "restored" }
        );
    }

    fn announce(&self, text: &str) {
        info!("status: {text}");
    }

    fn show_credits(&self, display_text: &str) {
        info!("credits remaining: {display_text}");
    }
}
