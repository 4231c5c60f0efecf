//! Generation orchestrator — drives one submission end to end.
//!
//! Flow: collect → validate → credit gate → resume request → cover-letter
//! request → commit (save both, decrement, persist) → report.
//!
//! The unit of success is BOTH artifacts. The resume is held in memory until
//! the cover letter arrives; a cover-letter failure discards it, offers
//! nothing for download, and leaves the credit balance untouched. The gate
//! reads the usage state once and the post-success decrement is computed
//! from that same value — there is no re-read in between for a stale balance
//! to sneak through.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{error, info, warn};
use uuid::Uuid;

use crate::download::ArtifactSink;
use crate::errors::{AppError, Stage};
use crate::form::{self, FormSource};
use crate::generation_client::{Artifact, ArtifactKind, DocumentGenerator};
use crate::ui::{
    Severity, UiAdapter, PROGRESS_COVER_LETTER, PROGRESS_DONE, PROGRESS_LINGER, PROGRESS_RESUME,
    PROGRESS_SAVING, PROGRESS_START,
};
use crate::usage_store::UsageStore;
use crate::validation;

/// Tagged result of one orchestrator run. Created and discarded within one
/// submit handling.
#[derive(Debug)]
pub enum GenerationOutcome {
    Success {
        resume: Artifact,
        cover_letter: Artifact,
    },
    /// `stage` is `None` for unexpected errors that fall outside the four
    /// enumerated stages (e.g. a failed save after both fetches).
    Failure {
        stage: Option<Stage>,
        reason: String,
    },
}

impl GenerationOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, GenerationOutcome::Success { .. })
    }
}

/// Composes the leaf components. None of them call back into it; a single
/// user-initiated submit event is the only entry point.
pub struct GenerationOrchestrator {
    store: Arc<dyn UsageStore>,
    generator: Arc<dyn DocumentGenerator>,
    sink: Arc<dyn ArtifactSink>,
    ui: Arc<dyn UiAdapter>,
    /// One orchestration at a time; a submit while busy is a no-op.
    in_flight: AtomicBool,
}

impl GenerationOrchestrator {
    pub fn new(
        store: Arc<dyn UsageStore>,
        generator: Arc<dyn DocumentGenerator>,
        sink: Arc<dyn ArtifactSink>,
        ui: Arc<dyn UiAdapter>,
    ) -> Self {
        GenerationOrchestrator {
            store,
            generator,
            sink,
            ui,
            in_flight: AtomicBool::new(false),
        }
    }

    /// Handles one submit event. Returns `None` when an orchestration is
    /// already in flight (the event is ignored). Every error is recovered
    /// here — nothing propagates past this boundary — and the submit control
    /// is restored on every exit path.
    pub async fn submit(&self, source: &dyn FormSource) -> Option<GenerationOutcome> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Acquire)
            .is_err()
        {
            warn!("Submit ignored: a generation is already in flight");
            return None;
        }

        let outcome = match self.run(source).await {
            Ok(outcome) => outcome,
            Err(e) => self.report_failure(e),
        };

        self.ui.set_busy(false);
        self.in_flight.store(false, Ordering::Release);
        Some(outcome)
    }

    async fn run(&self, source: &dyn FormSource) -> Result<GenerationOutcome, AppError> {
        let request_id = Uuid::new_v4();
        self.ui.set_busy(true);
        self.ui.announce("Generating your documents…");
        self.ui
            .report_progress(PROGRESS_START.pct, PROGRESS_START.label);

        // Validating
        let record = form::collect(source);
        validation::validate(&record)?;

        // GateChecking — this read also feeds the post-success decrement
        let usage = self.store.read().await?;
        if !usage.allows_generation() {
            return Err(AppError::CreditExhausted);
        }
        info!(
            "Generation {request_id} admitted: plan={}, credits={}",
            usage.plan.as_str(),
            usage.credits
        );

        // RequestingResume
        self.ui
            .report_progress(PROGRESS_RESUME.pct, PROGRESS_RESUME.label);
        let resume = self.generator.generate(ArtifactKind::Resume, &record).await?;

        // RequestingCoverLetter — same record, strictly after the resume
        self.ui
            .report_progress(PROGRESS_COVER_LETTER.pct, PROGRESS_COVER_LETTER.label);
        let cover_letter = self
            .generator
            .generate(ArtifactKind::CoverLetter, &record)
            .await?;

        // Committing: save resume first, then cover letter, then account
        self.ui
            .report_progress(PROGRESS_SAVING.pct, PROGRESS_SAVING.label);
        self.sink
            .save(&resume, &ArtifactKind::Resume.filename(request_id))
            .await?;
        self.sink
            .save(&cover_letter, &ArtifactKind::CoverLetter.filename(request_id))
            .await?;

        let updated = usage.after_successful_generation();
        self.store.commit(&updated).await?;
        self.ui.show_credits(&updated.credit_display());

        self.ui
            .report_progress(PROGRESS_DONE.pct, PROGRESS_DONE.label);
        self.ui
            .notify("Your resume and cover letter are ready.", Severity::Success);
        self.ui.announce("Generation complete");
        info!(
            "Generation {request_id} complete: plan={}, credits now {}",
            updated.plan.as_str(),
            updated.credits
        );

        // Let the indicator linger at 100% before the UI is released
        tokio::time::sleep(PROGRESS_LINGER).await;

        Ok(GenerationOutcome::Success {
            resume,
            cover_letter,
        })
    }

    fn report_failure(&self, err: AppError) -> GenerationOutcome {
        let stage = err.stage();
        let reason = err.user_message();

        let severity = match err {
            AppError::CreditExhausted => Severity::Warning,
            _ => Severity::Error,
        };
        self.ui.notify(&reason, severity);
        self.ui.announce("Generation failed");

        match stage {
            Some(stage) => error!("Generation failed at {stage}: {err}"),
            None => error!("Generation failed: {err}"),
        }

        GenerationOutcome::Failure { stage, reason }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex;

    use anyhow::anyhow;
    use async_trait::async_trait;
    use bytes::Bytes;
    use tokio::sync::Semaphore;

    use crate::form::Field;
    use crate::models::usage::{Plan, UsageState};

    // ── Mock collaborators ──────────────────────────────────────────────

    #[derive(Clone)]
    struct MapForm {
        fields: HashMap<&'static str, String>,
        skills: Vec<String>,
    }

    impl FormSource for MapForm {
        fn value(&self, field: Field) -> Option<String> {
            self.fields.get(field.key()).cloned()
        }

        fn skills(&self) -> Vec<String> {
            self.skills.clone()
        }
    }

    fn filled_form() -> MapForm {
        let fields = [
            ("current_position", "Backend Engineer"),
            ("years_experience", "6"),
            ("education", "BSc Computer Science"),
            ("experience", "Built payment infrastructure"),
            ("target_position", "Staff Engineer"),
            ("achievements", "Cut p99 latency by 40%"),
            ("projects", "Open-source job queue"),
            ("industry", "Fintech"),
            ("tone", "professional"),
            ("job_description", "We need a Rust engineer."),
        ];
        MapForm {
            fields: fields.iter().map(|(k, v)| (*k, v.to_string())).collect(),
            skills: vec!["Rust".to_string(), "Tokio".to_string()],
        }
    }

    struct MemoryStore {
        state: Mutex<UsageState>,
        reads: AtomicUsize,
        commits: Mutex<Vec<UsageState>>,
    }

    impl MemoryStore {
        fn new(plan: Plan, credits: u32) -> Self {
            MemoryStore {
                state: Mutex::new(UsageState { plan, credits }),
                reads: AtomicUsize::new(0),
                commits: Mutex::new(Vec::new()),
            }
        }

        fn current(&self) -> UsageState {
            *self.state.lock().unwrap()
        }

        fn commit_count(&self) -> usize {
            self.commits.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl UsageStore for MemoryStore {
        async fn read(&self) -> Result<UsageState, AppError> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            Ok(self.current())
        }

        async fn commit(&self, state: &UsageState) -> Result<(), AppError> {
            *self.state.lock().unwrap() = *state;
            self.commits.lock().unwrap().push(*state);
            Ok(())
        }
    }

    struct ScriptedGenerator {
        fail: Option<ArtifactKind>,
        calls: Mutex<Vec<ArtifactKind>>,
    }

    impl ScriptedGenerator {
        fn succeeding() -> Self {
            ScriptedGenerator {
                fail: None,
                calls: Mutex::new(Vec::new()),
            }
        }

        fn failing_on(kind: ArtifactKind) -> Self {
            ScriptedGenerator {
                fail: Some(kind),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<ArtifactKind> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl DocumentGenerator for ScriptedGenerator {
        async fn generate(
            &self,
            kind: ArtifactKind,
            _record: &crate::models::submission::SubmissionRecord,
        ) -> Result<Artifact, AppError> {
            self.calls.lock().unwrap().push(kind);
            if self.fail == Some(kind) {
                return Err(AppError::Request {
                    stage: kind.stage(),
                    message: "HTTP 500: Internal Server Error".to_string(),
                });
            }
            Ok(Artifact {
                kind,
                bytes: Bytes::from_static(b"%PDF-1.4 test"),
            })
        }
    }

    struct RecordingSink {
        saved: Mutex<Vec<String>>,
        fail: bool,
    }

    impl RecordingSink {
        fn new() -> Self {
            RecordingSink {
                saved: Mutex::new(Vec::new()),
                fail: false,
            }
        }

        fn failing() -> Self {
            RecordingSink {
                saved: Mutex::new(Vec::new()),
                fail: true,
            }
        }

        fn saved(&self) -> Vec<String> {
            self.saved.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ArtifactSink for RecordingSink {
        async fn save(&self, _artifact: &Artifact, filename: &str) -> Result<(), AppError> {
            if self.fail {
                return Err(AppError::Internal(anyhow!("disk full")));
            }
            self.saved.lock().unwrap().push(filename.to_string());
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingUi {
        notifications: Mutex<Vec<(String, Severity)>>,
        progress: Mutex<Vec<(u8, String)>>,
        busy: Mutex<Vec<bool>>,
        announcements: Mutex<Vec<String>>,
        credits: Mutex<Vec<String>>,
    }

    impl UiAdapter for RecordingUi {
        fn notify(&self, message: &str, severity: Severity) {
            self.notifications
                .lock()
                .unwrap()
                .push((message.to_string(), severity));
        }

        fn report_progress(&self, pct: u8, label: &str) {
            self.progress.lock().unwrap().push((pct, label.to_string()));
        }

        fn set_busy(&self, busy: bool) {
            self.busy.lock().unwrap().push(busy);
        }

        fn announce(&self, text: &str) {
            self.announcements.lock().unwrap().push(text.to_string());
        }

        fn show_credits(&self, display: &str) {
            self.credits.lock().unwrap().push(display.to_string());
        }
    }

    struct Harness {
        orchestrator: GenerationOrchestrator,
        store: Arc<MemoryStore>,
        generator: Arc<ScriptedGenerator>,
        sink: Arc<RecordingSink>,
        ui: Arc<RecordingUi>,
    }

    fn harness(plan: Plan, credits: u32, generator: ScriptedGenerator) -> Harness {
        let store = Arc::new(MemoryStore::new(plan, credits));
        let generator = Arc::new(generator);
        let sink = Arc::new(RecordingSink::new());
        let ui = Arc::new(RecordingUi::default());
        let orchestrator = GenerationOrchestrator::new(
            store.clone(),
            generator.clone(),
            sink.clone(),
            ui.clone(),
        );
        Harness {
            orchestrator,
            store,
            generator,
            sink,
            ui,
        }
    }

    // ── Scenarios ───────────────────────────────────────────────────────

    /// Free plan, 1 credit, both endpoints succeed: two downloads, balance 0,
    /// display shows "0".
    #[tokio::test(start_paused = true)]
    async fn test_free_plan_success_downloads_both_and_spends_the_credit() {
        let h = harness(Plan::Free, 1, ScriptedGenerator::succeeding());

        let outcome = h.orchestrator.submit(&filled_form()).await.unwrap();
        assert!(outcome.is_success());

        let saved = h.sink.saved();
        assert_eq!(saved.len(), 2);
        assert!(saved[0].starts_with("resume_"), "resume saved first");
        assert!(saved[1].starts_with("cover_letter_"));

        assert_eq!(h.store.current().credits, 0);
        assert_eq!(h.store.commit_count(), 1);
        assert_eq!(h.ui.credits.lock().unwrap().as_slice(), ["0"]);
    }

    /// Premium plan, 0 credits: gate allows, both succeed, balance untouched,
    /// display shows "∞".
    #[tokio::test(start_paused = true)]
    async fn test_premium_plan_success_keeps_balance_and_shows_infinity() {
        let h = harness(Plan::Premium, 0, ScriptedGenerator::succeeding());

        let outcome = h.orchestrator.submit(&filled_form()).await.unwrap();
        assert!(outcome.is_success());

        assert_eq!(h.store.current().credits, 0);
        assert_eq!(h.ui.credits.lock().unwrap().as_slice(), ["∞"]);
    }

    /// Resume endpoint fails: the cover letter is never requested, nothing is
    /// saved, and the credit survives.
    #[tokio::test]
    async fn test_resume_failure_stops_the_flow_and_preserves_the_credit() {
        let h = harness(
            Plan::Free,
            1,
            ScriptedGenerator::failing_on(ArtifactKind::Resume),
        );

        let outcome = h.orchestrator.submit(&filled_form()).await.unwrap();
        match outcome {
            GenerationOutcome::Failure { stage, .. } => {
                assert_eq!(stage, Some(Stage::ResumeRequest));
            }
            other => panic!("expected failure, got {other:?}"),
        }

        assert_eq!(h.generator.calls(), vec![ArtifactKind::Resume]);
        assert!(h.sink.saved().is_empty());
        assert_eq!(h.store.current().credits, 1);
        assert_eq!(h.store.commit_count(), 0);
    }

    /// Cover-letter failure after a successful resume fetch: the resume is
    /// discarded, nothing is offered for download, credit untouched.
    #[tokio::test]
    async fn test_cover_letter_failure_discards_the_fetched_resume() {
        let h = harness(
            Plan::Free,
            1,
            ScriptedGenerator::failing_on(ArtifactKind::CoverLetter),
        );

        let outcome = h.orchestrator.submit(&filled_form()).await.unwrap();
        match outcome {
            GenerationOutcome::Failure { stage, .. } => {
                assert_eq!(stage, Some(Stage::CoverLetterRequest));
            }
            other => panic!("expected failure, got {other:?}"),
        }

        assert_eq!(
            h.generator.calls(),
            vec![ArtifactKind::Resume, ArtifactKind::CoverLetter]
        );
        assert!(h.sink.saved().is_empty(), "no artifact may be offered");
        assert_eq!(h.store.current().credits, 1);
        assert_eq!(h.store.commit_count(), 0);
    }

    /// Empty required field: rejected before any storage or network access.
    #[tokio::test]
    async fn test_missing_industry_fails_before_storage_and_network() {
        let h = harness(Plan::Free, 1, ScriptedGenerator::succeeding());

        let mut form = filled_form();
        form.fields.insert("industry", "   ".to_string());

        let outcome = h.orchestrator.submit(&form).await.unwrap();
        match outcome {
            GenerationOutcome::Failure { stage, reason } => {
                assert_eq!(stage, Some(Stage::Validation));
                assert!(reason.contains("Industry"));
            }
            other => panic!("expected failure, got {other:?}"),
        }

        assert_eq!(h.store.reads.load(Ordering::SeqCst), 0);
        assert!(h.generator.calls().is_empty());
        assert_eq!(h.store.current().credits, 1);
    }

    /// Free plan at zero balance: blocked at the gate, no request issued,
    /// warning-level notification.
    #[tokio::test]
    async fn test_exhausted_free_plan_is_blocked_before_any_request() {
        let h = harness(Plan::Free, 0, ScriptedGenerator::succeeding());

        let outcome = h.orchestrator.submit(&filled_form()).await.unwrap();
        match outcome {
            GenerationOutcome::Failure { stage, .. } => {
                assert_eq!(stage, Some(Stage::CreditGate));
            }
            other => panic!("expected failure, got {other:?}"),
        }

        assert!(h.generator.calls().is_empty());
        let notifications = h.ui.notifications.lock().unwrap();
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].1, Severity::Warning);
    }

    /// The decrement is computed from the same state the gate read, and is
    /// committed exactly once.
    #[tokio::test(start_paused = true)]
    async fn test_gate_and_decrement_share_one_state_read() {
        let h = harness(Plan::Free, 3, ScriptedGenerator::succeeding());

        h.orchestrator.submit(&filled_form()).await.unwrap();

        assert_eq!(h.store.reads.load(Ordering::SeqCst), 1);
        let commits = h.store.commits.lock().unwrap();
        assert_eq!(commits.len(), 1);
        assert_eq!(commits[0].credits, 2);
    }

    /// A save failure after both fetches is the unexpected kind: no stage,
    /// no decrement.
    #[tokio::test]
    async fn test_save_failure_reports_unexpected_and_keeps_the_credit() {
        let store = Arc::new(MemoryStore::new(Plan::Free, 1));
        let generator = Arc::new(ScriptedGenerator::succeeding());
        let sink = Arc::new(RecordingSink::failing());
        let ui = Arc::new(RecordingUi::default());
        let orchestrator = GenerationOrchestrator::new(
            store.clone(),
            generator.clone(),
            sink,
            ui.clone(),
        );

        let outcome = orchestrator.submit(&filled_form()).await.unwrap();
        match outcome {
            GenerationOutcome::Failure { stage, reason } => {
                assert_eq!(stage, None);
                assert!(reason.contains("disk full"));
            }
            other => panic!("expected failure, got {other:?}"),
        }

        assert_eq!(store.current().credits, 1);
        assert_eq!(store.commit_count(), 0);
    }

    // ── UI contract ─────────────────────────────────────────────────────

    /// Success path: submit control disabled then restored, progress from 0
    /// to 100, success toast.
    #[tokio::test(start_paused = true)]
    async fn test_success_restores_the_ui_and_completes_progress() {
        let h = harness(Plan::Free, 1, ScriptedGenerator::succeeding());

        h.orchestrator.submit(&filled_form()).await.unwrap();

        assert_eq!(h.ui.busy.lock().unwrap().as_slice(), [true, false]);

        let progress = h.ui.progress.lock().unwrap();
        assert_eq!(progress.first().unwrap().0, 0);
        assert_eq!(progress.last().unwrap().0, 100);

        let notifications = h.ui.notifications.lock().unwrap();
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].1, Severity::Success);
    }

    /// Every failure path restores the submit control and surfaces the
    /// stage-specific reason.
    #[tokio::test]
    async fn test_failure_restores_the_submit_control() {
        let h = harness(
            Plan::Free,
            1,
            ScriptedGenerator::failing_on(ArtifactKind::Resume),
        );

        h.orchestrator.submit(&filled_form()).await.unwrap();

        assert_eq!(h.ui.busy.lock().unwrap().as_slice(), [true, false]);
        let notifications = h.ui.notifications.lock().unwrap();
        assert_eq!(notifications[0].1, Severity::Error);
        assert!(notifications[0].0.contains("Resume generation failed"));
        let progress = h.ui.progress.lock().unwrap();
        assert!(progress.iter().all(|(pct, _)| *pct < 100));
    }

    // ── Reentrancy guard ────────────────────────────────────────────────

    struct BlockingGenerator {
        entered: Arc<Semaphore>,
        release: Arc<Semaphore>,
    }

    #[async_trait]
    impl DocumentGenerator for BlockingGenerator {
        async fn generate(
            &self,
            kind: ArtifactKind,
            _record: &crate::models::submission::SubmissionRecord,
        ) -> Result<Artifact, AppError> {
            self.entered.add_permits(1);
            let _permit = self.release.acquire().await.expect("semaphore closed");
            Ok(Artifact {
                kind,
                bytes: Bytes::from_static(b"%PDF-1.4 test"),
            })
        }
    }

    /// A second submit while one orchestration is suspended at a network
    /// request is a no-op: no second flow starts, no double decrement.
    #[tokio::test(start_paused = true)]
    async fn test_submit_while_busy_is_a_no_op() {
        let entered = Arc::new(Semaphore::new(0));
        let release = Arc::new(Semaphore::new(0));

        let store = Arc::new(MemoryStore::new(Plan::Free, 1));
        let sink = Arc::new(RecordingSink::new());
        let ui = Arc::new(RecordingUi::default());
        let orchestrator = Arc::new(GenerationOrchestrator::new(
            store.clone(),
            Arc::new(BlockingGenerator {
                entered: entered.clone(),
                release: release.clone(),
            }),
            sink,
            ui,
        ));

        let first = {
            let orchestrator = orchestrator.clone();
            tokio::spawn(async move { orchestrator.submit(&filled_form()).await })
        };

        // Wait until the first submission is suspended inside the resume call
        entered.acquire().await.unwrap().forget();

        assert!(
            orchestrator.submit(&filled_form()).await.is_none(),
            "second submit must be ignored while one is in flight"
        );

        // Let both requests of the first submission proceed
        release.add_permits(2);
        let outcome = first.await.unwrap().unwrap();
        assert!(outcome.is_success());
        assert_eq!(store.current().credits, 0);
        assert_eq!(store.commit_count(), 1, "exactly one decrement");
    }
}
