//! Intake lifecycle: `Idle → Capturing → Analyzing → {Reconciled, Failed}
//! → Idle`, with submit reachable from `Reconciled` or directly from `Idle`
//! (manual entry and the parental-note path skip capture and analysis).
//!
//! One session edits one draft at a time. The machine itself refuses a
//! second `Analyzing` transition while one is in flight; the UI-level
//! disablement is presentation, this is the actual guarantee. Every
//! extraction-path failure is caught at this boundary: the draft survives
//! untouched apart from the error annotation and stays editable.

use uuid::Uuid;

use crate::models::{ExemptionDraft, ExemptionRecord, MISSING, RawCapture};
use crate::pipeline::capture::FrameSource;
use crate::pipeline::extraction::ExtractionClient;
use crate::pipeline::{normalize, reconcile, IntakeError};

/// Session state. `Failed` carries the user-visible message of the
/// classified error that ended the analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntakeState {
    Idle,
    Capturing,
    Analyzing,
    Reconciled,
    Failed(String),
}

/// The single active editing session.
pub struct IntakeSession {
    state: IntakeState,
    draft: ExemptionDraft,
}

impl Default for IntakeSession {
    fn default() -> Self {
        Self::new()
    }
}

impl IntakeSession {
    /// New session over a fresh draft.
    pub fn new() -> Self {
        Self {
            state: IntakeState::Idle,
            draft: ExemptionDraft::fresh(),
        }
    }

    /// New session editing an existing record; its id is kept on submit.
    pub fn edit(record: &ExemptionRecord) -> Self {
        Self {
            state: IntakeState::Idle,
            draft: reconcile::draft_from_record(record),
        }
    }

    pub fn state(&self) -> &IntakeState {
        &self.state
    }

    pub fn draft(&self) -> &ExemptionDraft {
        &self.draft
    }

    pub fn draft_mut(&mut self) -> &mut ExemptionDraft {
        &mut self.draft
    }

    // ──────────────────────────────────────────────
    // Capture surface
    // ──────────────────────────────────────────────

    /// The capture surface opened.
    pub fn open_capture(&mut self) -> Result<(), IntakeError> {
        match self.state {
            IntakeState::Idle => {
                self.state = IntakeState::Capturing;
                Ok(())
            }
            ref other => Err(IntakeError::InvalidTransition(format!(
                "cannot open capture from {other:?}"
            ))),
        }
    }

    /// Explicit cancel: back to `Idle`, draft untouched.
    pub fn cancel_capture(&mut self) {
        if self.state == IntakeState::Capturing {
            self.state = IntakeState::Idle;
        }
    }

    /// Take a still from the frame source. Ends `Capturing` on success and
    /// releases the source's media resources on every exit path.
    pub fn capture_document(
        &mut self,
        source: &mut dyn FrameSource,
    ) -> Result<RawCapture, IntakeError> {
        if self.state != IntakeState::Capturing {
            return Err(IntakeError::InvalidTransition(
                "capture without an open capture surface".into(),
            ));
        }
        let result = source.capture_frame();
        source.release();
        self.state = IntakeState::Idle;
        result
    }

    // ──────────────────────────────────────────────
    // Analysis
    // ──────────────────────────────────────────────

    /// Full analysis path: normalize → extract (with retry) → reconcile.
    ///
    /// On success the session is `Reconciled`; on failure it is `Failed`
    /// with the classified error's message and the error is also returned.
    /// Refused while an analysis is already in flight.
    pub fn analyze(
        &mut self,
        capture: RawCapture,
        client: &ExtractionClient,
    ) -> Result<(), IntakeError> {
        if self.state == IntakeState::Analyzing {
            return Err(IntakeError::InvalidTransition(
                "analysis already in progress".into(),
            ));
        }
        self.state = IntakeState::Analyzing;

        match run_pipeline(capture, client, &mut self.draft) {
            Ok(()) => {
                self.state = IntakeState::Reconciled;
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, "extraction pipeline failed, draft preserved");
                self.state = IntakeState::Failed(e.to_string());
                Err(e)
            }
        }
    }

    /// Acknowledge a finished analysis (`Reconciled` or `Failed`) and
    /// return to `Idle` for further edits.
    pub fn acknowledge(&mut self) {
        if matches!(self.state, IntakeState::Reconciled | IntakeState::Failed(_)) {
            self.state = IntakeState::Idle;
        }
    }

    // ──────────────────────────────────────────────
    // Submit
    // ──────────────────────────────────────────────

    /// Validate and commit the draft into a record.
    ///
    /// Reachable from `Reconciled` or directly from `Idle`. The mandatory
    /// fields are last and first name; everything else is accepted as-is,
    /// including a still-missing class. On success the session resets to a
    /// fresh `Idle` draft.
    pub fn submit(&mut self) -> Result<ExemptionRecord, IntakeError> {
        match self.state {
            IntakeState::Idle | IntakeState::Reconciled => {}
            ref other => {
                return Err(IntakeError::InvalidTransition(format!(
                    "cannot submit from {other:?}"
                )))
            }
        }

        if self.draft.last_name == MISSING {
            return Err(IntakeError::Validation("lastName is required".into()));
        }
        if self.draft.first_name == MISSING {
            return Err(IntakeError::Validation("firstName is required".into()));
        }

        let draft = &self.draft;
        let record = ExemptionRecord {
            id: draft
                .id
                .clone()
                .unwrap_or_else(|| Uuid::new_v4().to_string()),
            last_name: draft.last_name.clone(),
            first_name: draft.first_name.clone(),
            student_class: draft.student_class.clone(),
            received_at: draft.received_at,
            start_date: draft.start_date,
            end_date: draft.end_date(),
            duration_days: draft.duration_days,
            // A parental note never carries scanned evidence.
            photo_base64: if draft.is_parental_note {
                None
            } else {
                draft.evidence.as_ref().map(|e| e.base64.clone())
            },
            is_parental_note: draft.is_parental_note,
            is_terminale: draft.is_terminale,
        };

        tracing::info!(id = %record.id, parental = record.is_parental_note, "exemption committed");
        self.state = IntakeState::Idle;
        self.draft = ExemptionDraft::fresh();
        Ok(record)
    }
}

fn run_pipeline(
    capture: RawCapture,
    client: &ExtractionClient,
    draft: &mut ExemptionDraft,
) -> Result<(), IntakeError> {
    let document = normalize::normalize(capture)?;
    // Evidence is attached before the provider call, like the original
    // flow: a failed extraction still leaves the scan on the draft.
    draft.attach_evidence(&document);
    let fields = client.extract(&document)?;
    reconcile::reconcile(&fields, draft);
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use crate::dates;
    use crate::models::{DocumentMedia, DraftField};
    use crate::pipeline::extraction::{ExtractedFields, MockExtractor, RetryPolicy};

    fn instant_client(provider: Arc<MockExtractor>) -> ExtractionClient {
        ExtractionClient::with_policy(
            provider,
            RetryPolicy {
                max_attempts: 3,
                base_delay: Duration::ZERO,
            },
        )
    }

    fn pdf_capture() -> RawCapture {
        // PDFs skip image decoding, which keeps these tests off the codec.
        RawCapture {
            bytes: b"%PDF-1.4 test certificate".to_vec(),
            media: DocumentMedia::Unknown,
        }
    }

    fn marie_fields() -> ExtractedFields {
        ExtractedFields {
            last_name: None,
            first_name: Some("Marie".into()),
            student_class: Some("602".into()),
            duration_days: Some(5),
            start_date: Some("2024-03-10".into()),
            is_terminale: false,
        }
    }

    struct DeadCamera {
        released: bool,
    }

    impl FrameSource for DeadCamera {
        fn sample_patch(&mut self, _size: u32) -> Option<Vec<u8>> {
            None
        }
        fn capture_frame(&mut self) -> Result<RawCapture, IntakeError> {
            Err(IntakeError::CaptureAccess("camera unavailable".into()))
        }
        fn release(&mut self) {
            self.released = true;
        }
    }

    #[test]
    fn successful_analysis_reaches_reconciled_then_submit_fails_on_last_name() {
        let provider = Arc::new(MockExtractor::returning(marie_fields()));
        let client = instant_client(provider);
        let mut session = IntakeSession::new();

        session.analyze(pdf_capture(), &client).unwrap();
        assert_eq!(session.state(), &IntakeState::Reconciled);
        assert_eq!(session.draft().first_name, "Marie");
        assert!(session.draft().is_missing(DraftField::LastName));
        assert!(session.draft().evidence.is_some());

        let err = session.submit().unwrap_err();
        match err {
            IntakeError::Validation(msg) => assert!(msg.contains("lastName")),
            other => panic!("unexpected: {other}"),
        }
        // Validation leaves the draft and state alone.
        assert_eq!(session.state(), &IntakeState::Reconciled);
        assert_eq!(session.draft().first_name, "Marie");
    }

    #[test]
    fn failed_analysis_preserves_draft_and_carries_message() {
        let provider = Arc::new(MockExtractor::script(vec![Err(IntakeError::Auth(
            "credential rejected".into(),
        ))]));
        let client = instant_client(provider);
        let mut session = IntakeSession::new();
        session.draft_mut().first_name = "Lucas".into();

        let err = session.analyze(pdf_capture(), &client).unwrap_err();
        assert!(matches!(err, IntakeError::Auth(_)));
        match session.state() {
            IntakeState::Failed(msg) => assert!(msg.contains("credential")),
            other => panic!("unexpected state: {other:?}"),
        }
        // User-entered data survives the failure.
        assert_eq!(session.draft().first_name, "Lucas");

        session.acknowledge();
        assert_eq!(session.state(), &IntakeState::Idle);
    }

    #[test]
    fn second_analysis_refused_while_analyzing() {
        let provider = Arc::new(MockExtractor::returning(marie_fields()));
        let client = instant_client(provider);
        let mut session = IntakeSession::new();
        session.state = IntakeState::Analyzing;

        let err = session.analyze(pdf_capture(), &client).unwrap_err();
        assert!(matches!(err, IntakeError::InvalidTransition(_)), "{err}");
        assert_eq!(session.state(), &IntakeState::Analyzing);
    }

    #[test]
    fn capture_flow_and_cancel() {
        let mut session = IntakeSession::new();
        session.open_capture().unwrap();
        assert_eq!(session.state(), &IntakeState::Capturing);
        // Re-opening mid-capture is refused.
        assert!(session.open_capture().is_err());

        session.cancel_capture();
        assert_eq!(session.state(), &IntakeState::Idle);
    }

    #[test]
    fn camera_failure_releases_resources_and_returns_to_idle() {
        let mut session = IntakeSession::new();
        session.open_capture().unwrap();

        let mut camera = DeadCamera { released: false };
        let err = session.capture_document(&mut camera).unwrap_err();
        assert!(matches!(err, IntakeError::CaptureAccess(_)), "{err}");
        assert!(camera.released);
        assert_eq!(session.state(), &IntakeState::Idle);
    }

    #[test]
    fn parental_note_path_submits_from_idle() {
        let mut session = IntakeSession::new();
        session.draft_mut().mark_parental_note();
        session.draft_mut().last_name = "MARTIN".into();
        session.draft_mut().first_name = "Zoé".into();
        session.draft_mut().student_class = "5èmeA".into();

        let record = session.submit().unwrap();
        assert!(record.is_parental_note);
        assert!(record.photo_base64.is_none());
        assert_eq!(record.duration_days, 1);
        assert_eq!(record.end_date, dates::derive_end(record.start_date, 1));
        assert!(!record.id.is_empty());
        // Session is reset for the next entry.
        assert_eq!(session.state(), &IntakeState::Idle);
        assert!(session.draft().is_missing(DraftField::LastName));
    }

    #[test]
    fn submit_keeps_existing_id_when_editing() {
        let provider = Arc::new(MockExtractor::returning(marie_fields()));
        let client = instant_client(provider);

        let mut session = IntakeSession::new();
        session.analyze(pdf_capture(), &client).unwrap();
        session.draft_mut().last_name = "DURAND".into();
        let record = session.submit().unwrap();

        let mut editing = IntakeSession::edit(&record);
        editing.draft_mut().duration_days = 10;
        let updated = editing.submit().unwrap();
        assert_eq!(updated.id, record.id);
        assert_eq!(updated.duration_days, 10);
        assert_eq!(
            updated.end_date,
            dates::derive_end(updated.start_date, 10)
        );
    }

    #[test]
    fn end_date_always_derived_from_inputs() {
        let mut session = IntakeSession::new();
        session.draft_mut().last_name = "DURAND".into();
        session.draft_mut().first_name = "Marie".into();
        session.draft_mut().start_date =
            chrono::NaiveDate::from_ymd_opt(2024, 2, 28).unwrap();
        session.draft_mut().duration_days = 2;

        let record = session.submit().unwrap();
        assert_eq!(
            record.end_date,
            chrono::NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
        );
    }

    #[test]
    fn submit_refused_from_capturing_and_failed() {
        let mut session = IntakeSession::new();
        session.open_capture().unwrap();
        assert!(matches!(
            session.submit(),
            Err(IntakeError::InvalidTransition(_))
        ));

        let mut failed = IntakeSession::new();
        failed.state = IntakeState::Failed("boom".into());
        assert!(matches!(
            failed.submit(),
            Err(IntakeError::InvalidTransition(_))
        ));
        // After acknowledging, the Idle path is open again.
        failed.acknowledge();
        failed.draft_mut().last_name = "A".into();
        failed.draft_mut().first_name = "B".into();
        assert!(failed.submit().is_ok());
    }

    #[test]
    fn oversized_import_fails_analysis_with_payload_error() {
        let provider = Arc::new(MockExtractor::returning(marie_fields()));
        let client = instant_client(Arc::clone(&provider));
        let mut session = IntakeSession::new();

        let capture = RawCapture {
            bytes: vec![0u8; crate::pipeline::normalize::MAX_INPUT_BYTES + 1],
            media: DocumentMedia::Unknown,
        };
        let err = session.analyze(capture, &client).unwrap_err();
        assert!(matches!(err, IntakeError::PayloadTooLarge(_)), "{err}");
        // Rejected before the provider was ever called.
        assert_eq!(provider.attempts(), 0);
    }
}
