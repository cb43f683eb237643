//! Submission workflow.
//!
//! Drives one [`FormController`] against a [`ReportBackend`]: the one-time
//! directory load, user edits, the submit round trip and the delayed reset.
//!
//! The controller lock is never held across a network call. The submit action
//! itself flips the controller into `Submitting` under the lock, so a second
//! submit arriving while the first is in flight sees `SubmissionInFlight` and
//! nothing is sent twice.
//!
//! Once a report has been handed to the backend, its delivery runs on its own task:
//! the outcome is recorded even if the caller that started it goes away.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::backend::{ReportBackend, SubmissionReceipt};
use crate::controller::{FieldInput, FormController};
use crate::directory::DirectorySnapshot;
use crate::error::{ControllerError, ReportResult, SubmissionError};
use crate::schema::{FieldPath, ReportFormData};

type ResetSlot = Arc<std::sync::Mutex<Option<JoinHandle<()>>>>;

pub struct SubmissionWorkflow {
    controller: Arc<Mutex<FormController>>,
    backend: Arc<dyn ReportBackend>,
    reset_delay: Duration,
    reset_task: ResetSlot,
}

impl std::fmt::Debug for SubmissionWorkflow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubmissionWorkflow")
            .field("reset_delay", &self.reset_delay)
            .finish_non_exhaustive()
    }
}

impl SubmissionWorkflow {
    pub fn new(backend: Arc<dyn ReportBackend>, reset_delay: Duration) -> Self {
        Self {
            controller: Arc::new(Mutex::new(FormController::new())),
            backend,
            reset_delay,
            reset_task: Arc::new(std::sync::Mutex::new(None)),
        }
    }

    /// Shared access to the controller, for reading state into a view.
    pub fn controller(&self) -> &Arc<Mutex<FormController>> {
        &self.controller
    }

    /// Fetches the personal number directory once and records the outcome.
    ///
    /// A failure is terminal for this workflow; there is no retry.
    pub async fn load_directory(&self) {
        let result = self
            .backend
            .fetch_personal_numbers()
            .await
            .map(DirectorySnapshot::new)
            .map_err(|e| {
                tracing::error!("personal number directory unavailable: {}", e);
                e.to_string()
            });

        self.controller.lock().await.directory_loaded(result);
    }

    pub async fn set_field(&self, field: FieldPath, input: FieldInput) -> Result<(), ControllerError> {
        self.controller.lock().await.set_field(field, input)
    }

    /// Runs one user-initiated submit.
    ///
    /// Dropping the returned future after validation does not abandon the
    /// submission: delivery and its bookkeeping finish on a spawned task.
    ///
    /// # Errors
    ///
    /// - `ReportError::Controller` if the submit action is not currently offered,
    /// - `ReportError::Validation` if the draft fails the schema (nothing is sent),
    /// - `ReportError::Submission` if the backend call fails (values are kept).
    pub async fn submit(&self) -> ReportResult<SubmissionReceipt> {
        let data = self.controller.lock().await.begin_submit()?;

        tracing::info!(personal_number = %data.personal_number, "submitting daily report");
        let delivery = tokio::spawn(deliver(
            data,
            Arc::clone(&self.backend),
            Arc::clone(&self.controller),
            Arc::clone(&self.reset_task),
            self.reset_delay,
        ));

        match delivery.await {
            Ok(result) => result.map_err(Into::into),
            Err(e) => {
                // The delivery task never reported back; release the form.
                tracing::error!("Submit task error: {}", e);
                let result = Err(SubmissionError::Transport(e.to_string()));
                self.controller.lock().await.complete_submit(&result);
                result.map_err(Into::into)
            }
        }
    }

    /// Whether a reset is scheduled and has not fired yet.
    pub fn has_pending_reset(&self) -> bool {
        self.reset_task
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }
}

/// Sends one validated report and records the outcome on the controller.
async fn deliver(
    data: ReportFormData,
    backend: Arc<dyn ReportBackend>,
    controller: Arc<Mutex<FormController>>,
    reset_task: ResetSlot,
    reset_delay: Duration,
) -> Result<SubmissionReceipt, SubmissionError> {
    let result = backend.submit_report(&data).await;

    let generation = controller.lock().await.complete_submit(&result);
    match &result {
        Ok(receipt) => {
            let report_id = receipt.report.as_ref().and_then(|r| r.id.as_deref());
            tracing::info!(?report_id, "daily report accepted");
        }
        Err(e) => tracing::error!("Submit error: {}", e),
    }

    if let Some(generation) = generation {
        schedule_reset(controller, &reset_task, reset_delay, generation);
    }

    result
}

fn schedule_reset(
    controller: Arc<Mutex<FormController>>,
    reset_task: &ResetSlot,
    delay: Duration,
    generation: u64,
) {
    let task = tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        if controller.lock().await.reset(generation) {
            tracing::info!(generation, "form reset after confirmation");
        }
    });

    let previous = reset_task
        .lock()
        .unwrap_or_else(|e| e.into_inner())
        .replace(task);
    if let Some(previous) = previous {
        previous.abort();
    }
}

impl Drop for SubmissionWorkflow {
    fn drop(&mut self) {
        if let Some(task) = self
            .reset_task
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take()
        {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::{FormDraft, FormState, NotificationLevel, SubmitAvailability};
    use crate::error::{DirectoryFetchError, ReportError, SubmissionError};
    use crate::schema::{Medication, ReportFormData};
    use async_trait::async_trait;
    use report_types::PersonalNumber;
    use tokio::sync::Notify;

    const DELAY: Duration = Duration::from_secs(3);

    #[derive(Default)]
    struct FakeBackend {
        numbers: Option<Vec<u64>>,
        fail_submissions: std::sync::atomic::AtomicBool,
        submitted: std::sync::Mutex<Vec<ReportFormData>>,
        entered: Notify,
        gate: Option<Notify>,
    }

    impl FakeBackend {
        fn with_numbers(numbers: &[u64]) -> Self {
            Self {
                numbers: Some(numbers.to_vec()),
                ..Default::default()
            }
        }

        fn submitted(&self) -> Vec<ReportFormData> {
            self.submitted.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ReportBackend for FakeBackend {
        async fn fetch_personal_numbers(
            &self,
        ) -> Result<Vec<PersonalNumber>, DirectoryFetchError> {
            match &self.numbers {
                Some(numbers) => Ok(numbers.iter().copied().map(PersonalNumber::from).collect()),
                None => Err(DirectoryFetchError::Status {
                    status: 503,
                    body: "unavailable".into(),
                }),
            }
        }

        async fn list_soldiers(&self) -> Result<Vec<serde_json::Value>, DirectoryFetchError> {
            Ok(Vec::new())
        }

        async fn submit_report(
            &self,
            data: &ReportFormData,
        ) -> Result<SubmissionReceipt, SubmissionError> {
            self.submitted.lock().unwrap().push(data.clone());
            self.entered.notify_one();
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            if self
                .fail_submissions
                .load(std::sync::atomic::Ordering::SeqCst)
            {
                Err(SubmissionError::Status {
                    status: 500,
                    body: "boom".into(),
                })
            } else {
                Ok(SubmissionReceipt::default())
            }
        }
    }

    async fn loaded(backend: Arc<FakeBackend>) -> SubmissionWorkflow {
        let workflow = SubmissionWorkflow::new(backend, DELAY);
        workflow.load_directory().await;
        workflow
    }

    fn text(s: &str) -> FieldInput {
        FieldInput::Text(s.to_string())
    }

    #[tokio::test(start_paused = true)]
    async fn valid_report_is_sent_once_and_form_clears_after_delay() {
        let backend = Arc::new(FakeBackend::with_numbers(&[12345, 67890]));
        let workflow = loaded(backend.clone()).await;

        workflow
            .set_field(FieldPath::PersonalNumber, text("12345"))
            .await
            .unwrap();
        workflow
            .set_field(Medication::Actiq.field(), text("2"))
            .await
            .unwrap();
        workflow
            .set_field(FieldPath::HasCompass, FieldInput::Flag(true))
            .await
            .unwrap();

        workflow.submit().await.expect("submission should succeed");

        let sent = backend.submitted();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].personal_number, "12345");
        assert_eq!(sent[0].medical_supplies.actiq, Some(2));
        assert_eq!(sent[0].equipment.has_compass, Some(true));

        {
            let mut controller = workflow.controller().lock().await;
            assert_eq!(controller.state(), FormState::Submitted);
            let notifications = controller.drain_notifications();
            assert_eq!(notifications[0].level, NotificationLevel::Success);
            assert_eq!(notifications[0].message, "דיווח נשלח בהצלחה");
        }
        assert!(workflow.has_pending_reset());

        tokio::time::sleep(DELAY - Duration::from_millis(1)).await;
        assert_eq!(
            workflow.controller().lock().await.state(),
            FormState::Submitted,
            "confirmation stays up for the full delay"
        );

        tokio::time::sleep(Duration::from_millis(2)).await;
        let controller = workflow.controller().lock().await;
        assert_eq!(controller.state(), FormState::Editing);
        assert_eq!(controller.draft(), &FormDraft::default());
    }

    #[tokio::test(start_paused = true)]
    async fn failed_submission_keeps_every_value() {
        let backend = Arc::new(FakeBackend::with_numbers(&[12345]));
        backend
            .fail_submissions
            .store(true, std::sync::atomic::Ordering::SeqCst);
        let workflow = loaded(backend.clone()).await;

        workflow
            .set_field(FieldPath::PersonalNumber, text("12345"))
            .await
            .unwrap();
        workflow
            .set_field(Medication::Morphine.field(), text("1"))
            .await
            .unwrap();
        let before = workflow.controller().lock().await.draft().clone();

        let err = workflow.submit().await.unwrap_err();
        assert!(matches!(err, ReportError::Submission(_)));
        assert!(!workflow.has_pending_reset());

        tokio::time::sleep(DELAY * 2).await;
        let controller = workflow.controller().lock().await;
        assert_eq!(controller.state(), FormState::SubmitFailed);
        assert_eq!(controller.draft(), &before);
        assert_eq!(controller.submit_availability(), SubmitAvailability::Available);
        drop(controller);

        backend
            .fail_submissions
            .store(false, std::sync::atomic::Ordering::SeqCst);
        workflow.submit().await.expect("resubmit succeeds");
        assert_eq!(backend.submitted().len(), 2, "no deduplication on resubmit");
    }

    #[tokio::test]
    async fn invalid_report_is_never_sent() {
        let backend = Arc::new(FakeBackend::with_numbers(&[12345]));
        let workflow = loaded(backend.clone()).await;

        workflow
            .set_field(FieldPath::PersonalNumber, text("12345"))
            .await
            .unwrap();
        workflow
            .set_field(Medication::Ketamine50mg.field(), text("-1"))
            .await
            .unwrap();

        assert!(matches!(
            workflow.submit().await,
            Err(ReportError::Validation(_))
        ));
        assert!(backend.submitted().is_empty());
        assert_eq!(
            workflow.controller().lock().await.state(),
            FormState::Editing
        );
    }

    #[tokio::test]
    async fn unknown_personal_number_is_never_sent() {
        let backend = Arc::new(FakeBackend::with_numbers(&[12345]));
        let workflow = loaded(backend.clone()).await;

        workflow
            .set_field(FieldPath::PersonalNumber, text("99999"))
            .await
            .unwrap();

        assert!(matches!(
            workflow.submit().await,
            Err(ReportError::Controller(ControllerError::SubmitUnavailable(
                SubmitAvailability::PersonalNumberNotFound
            )))
        ));
        assert!(backend.submitted().is_empty());
    }

    #[tokio::test]
    async fn second_submit_while_in_flight_is_rejected() {
        let backend = Arc::new(FakeBackend {
            numbers: Some(vec![12345]),
            gate: Some(Notify::new()),
            ..Default::default()
        });
        let workflow = Arc::new(loaded(backend.clone()).await);
        workflow
            .set_field(FieldPath::PersonalNumber, text("12345"))
            .await
            .unwrap();

        let first = tokio::spawn({
            let workflow = Arc::clone(&workflow);
            async move { workflow.submit().await }
        });
        backend.entered.notified().await;

        assert!(matches!(
            workflow.submit().await,
            Err(ReportError::Controller(ControllerError::SubmitUnavailable(
                SubmitAvailability::SubmissionInFlight
            )))
        ));
        assert_eq!(
            workflow
                .set_field(FieldPath::PersonalNumber, text("1"))
                .await,
            Err(ControllerError::Locked(FormState::Submitting))
        );

        if let Some(gate) = &backend.gate {
            gate.notify_one();
        }
        first.await.unwrap().expect("first submission completes");
        assert_eq!(backend.submitted().len(), 1);
    }

    #[tokio::test]
    async fn directory_failure_is_terminal() {
        let backend = Arc::new(FakeBackend::default());
        let workflow = loaded(backend.clone()).await;

        let controller = workflow.controller().lock().await;
        assert!(controller.directory().is_unavailable());
        assert_eq!(
            controller.submit_availability(),
            SubmitAvailability::DirectoryUnavailable
        );
        drop(controller);

        assert_eq!(
            workflow
                .set_field(Medication::Actiq.field(), text("1"))
                .await,
            Err(ControllerError::DirectoryUnavailable)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_workflow_cancels_the_reset() {
        let backend = Arc::new(FakeBackend::with_numbers(&[12345]));
        let workflow = loaded(backend).await;
        workflow
            .set_field(FieldPath::PersonalNumber, text("12345"))
            .await
            .unwrap();
        workflow.submit().await.unwrap();

        let controller = Arc::clone(workflow.controller());
        drop(workflow);

        tokio::time::sleep(DELAY * 2).await;
        assert_eq!(controller.lock().await.state(), FormState::Submitted);
    }

    async fn settle(workflow: &SubmissionWorkflow) -> FormState {
        for _ in 0..20 {
            let state = workflow.controller().lock().await.state();
            if state != FormState::Submitting {
                return state;
            }
            tokio::task::yield_now().await;
        }
        workflow.controller().lock().await.state()
    }

    #[tokio::test]
    async fn abandoned_submit_still_records_failure() {
        let backend = Arc::new(FakeBackend {
            numbers: Some(vec![12345]),
            gate: Some(Notify::new()),
            ..Default::default()
        });
        backend
            .fail_submissions
            .store(true, std::sync::atomic::Ordering::SeqCst);
        let workflow = Arc::new(loaded(backend.clone()).await);
        workflow
            .set_field(FieldPath::PersonalNumber, text("12345"))
            .await
            .unwrap();

        let caller = tokio::spawn({
            let workflow = Arc::clone(&workflow);
            async move { workflow.submit().await }
        });
        backend.entered.notified().await;
        caller.abort();
        assert!(caller.await.unwrap_err().is_cancelled());

        if let Some(gate) = &backend.gate {
            gate.notify_one();
        }
        assert_eq!(settle(&workflow).await, FormState::SubmitFailed);
        assert_eq!(
            workflow.controller().lock().await.submit_availability(),
            SubmitAvailability::Available
        );
        assert_eq!(
            workflow
                .set_field(Medication::Actiq.field(), text("1"))
                .await,
            Ok(())
        );
    }

    #[tokio::test(start_paused = true)]
    async fn abandoned_submit_still_confirms_and_resets() {
        let backend = Arc::new(FakeBackend {
            numbers: Some(vec![12345]),
            gate: Some(Notify::new()),
            ..Default::default()
        });
        let workflow = Arc::new(loaded(backend.clone()).await);
        workflow
            .set_field(FieldPath::PersonalNumber, text("12345"))
            .await
            .unwrap();

        let caller = tokio::spawn({
            let workflow = Arc::clone(&workflow);
            async move { workflow.submit().await }
        });
        backend.entered.notified().await;
        caller.abort();
        let _ = caller.await;

        if let Some(gate) = &backend.gate {
            gate.notify_one();
        }
        assert_eq!(settle(&workflow).await, FormState::Submitted);
        assert_eq!(backend.submitted().len(), 1);
        assert!(workflow.has_pending_reset());

        tokio::time::sleep(DELAY + Duration::from_millis(1)).await;
        assert_eq!(
            workflow.controller().lock().await.state(),
            FormState::Editing
        );
    }
}
