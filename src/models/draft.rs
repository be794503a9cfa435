//! Mutable exemption draft: the record-in-progress owned by the active
//! editing session.
//!
//! String fields use the reserved [`MISSING`] sentinel (never `null`, never
//! the empty string) to mark "extraction could not populate this, user
//! attention required". The sentinel, a user-cleared empty field, and a
//! filled field are three distinct states: the UI renders the sentinel
//! highlighted and [`ExemptionDraft::focus`] clears it to empty the first
//! time the user enters the field, so the sentinel never survives user
//! interaction.

use base64::Engine as _;
use chrono::NaiveDate;

use super::media::{DocumentMedia, NormalizedDocument};
use crate::dates;

/// Reserved placeholder for a field that still requires user input.
pub const MISSING: &str = "A compléter";

/// Evidence attached to a draft: the normalized document, base64-encoded
/// the way the store persists it.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentEvidence {
    pub base64: String,
    pub media: DocumentMedia,
}

/// The user-editable string fields subject to the sentinel policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftField {
    LastName,
    FirstName,
    StudentClass,
}

/// Record-in-progress. Dates default to today, duration to one day.
#[derive(Debug, Clone, PartialEq)]
pub struct ExemptionDraft {
    /// Present when editing an existing record; its id is kept on submit.
    pub id: Option<String>,
    pub last_name: String,
    pub first_name: String,
    pub student_class: String,
    pub received_at: NaiveDate,
    pub start_date: NaiveDate,
    pub duration_days: u32,
    pub is_parental_note: bool,
    pub evidence: Option<DocumentEvidence>,
    pub is_terminale: bool,
}

impl ExemptionDraft {
    /// Fresh draft for a new exemption: every mandatory string starts at the
    /// sentinel, dates at today, duration at one day.
    pub fn fresh() -> Self {
        let today = dates::today();
        Self {
            id: None,
            last_name: MISSING.to_string(),
            first_name: MISSING.to_string(),
            student_class: MISSING.to_string(),
            received_at: today,
            start_date: today,
            duration_days: 1,
            is_parental_note: false,
            evidence: None,
            is_terminale: false,
        }
    }

    fn field_mut(&mut self, field: DraftField) -> &mut String {
        match field {
            DraftField::LastName => &mut self.last_name,
            DraftField::FirstName => &mut self.first_name,
            DraftField::StudentClass => &mut self.student_class,
        }
    }

    pub fn field(&self, field: DraftField) -> &str {
        match field {
            DraftField::LastName => &self.last_name,
            DraftField::FirstName => &self.first_name,
            DraftField::StudentClass => &self.student_class,
        }
    }

    pub fn is_missing(&self, field: DraftField) -> bool {
        self.field(field) == MISSING
    }

    /// Auto-clear on focus: a sentinel-valued field becomes empty the first
    /// time the user enters it. Filled or already-cleared fields are left
    /// alone, which keeps sentinel and user-cleared-empty distinguishable.
    pub fn focus(&mut self, field: DraftField) {
        let value = self.field_mut(field);
        if value == MISSING {
            value.clear();
        }
    }

    /// Live derived end date, recomputed from start and duration.
    pub fn end_date(&self) -> NaiveDate {
        dates::derive_end(self.start_date, self.duration_days)
    }

    /// Switch the draft to the parental-note basis: one day starting today,
    /// no scanned evidence (a parental note never carries a document).
    pub fn mark_parental_note(&mut self) {
        self.is_parental_note = true;
        self.duration_days = 1;
        self.evidence = None;
        self.start_date = dates::today();
    }

    /// Attach the normalized document as evidence for the eventual record.
    pub fn attach_evidence(&mut self, document: &NormalizedDocument) {
        self.evidence = Some(DocumentEvidence {
            base64: base64::engine::general_purpose::STANDARD.encode(&document.bytes),
            media: document.media,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_draft_starts_at_sentinel() {
        let draft = ExemptionDraft::fresh();
        assert!(draft.is_missing(DraftField::LastName));
        assert!(draft.is_missing(DraftField::FirstName));
        assert!(draft.is_missing(DraftField::StudentClass));
        assert_eq!(draft.duration_days, 1);
        assert_eq!(draft.start_date, dates::today());
        assert!(!draft.is_parental_note);
        assert!(draft.evidence.is_none());
    }

    #[test]
    fn focus_clears_sentinel_once() {
        let mut draft = ExemptionDraft::fresh();
        draft.focus(DraftField::LastName);
        assert_eq!(draft.last_name, "");
        // Second focus on the now-empty field does nothing.
        draft.focus(DraftField::LastName);
        assert_eq!(draft.last_name, "");
    }

    #[test]
    fn focus_leaves_filled_fields_alone() {
        let mut draft = ExemptionDraft::fresh();
        draft.first_name = "Marie".into();
        draft.focus(DraftField::FirstName);
        assert_eq!(draft.first_name, "Marie");
    }

    #[test]
    fn end_date_tracks_inputs() {
        let mut draft = ExemptionDraft::fresh();
        draft.start_date = NaiveDate::from_ymd_opt(2024, 2, 28).unwrap();
        draft.duration_days = 2;
        assert_eq!(
            draft.end_date(),
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
        );
        draft.duration_days = 3;
        assert_eq!(
            draft.end_date(),
            NaiveDate::from_ymd_opt(2024, 3, 2).unwrap()
        );
    }

    #[test]
    fn parental_note_drops_evidence() {
        let mut draft = ExemptionDraft::fresh();
        draft.attach_evidence(&NormalizedDocument {
            bytes: vec![1, 2, 3],
            media: DocumentMedia::Jpeg,
        });
        draft.duration_days = 14;
        draft.mark_parental_note();
        assert!(draft.is_parental_note);
        assert!(draft.evidence.is_none());
        assert_eq!(draft.duration_days, 1);
        assert_eq!(draft.start_date, dates::today());
    }

    #[test]
    fn evidence_is_base64_of_normalized_bytes() {
        let mut draft = ExemptionDraft::fresh();
        draft.attach_evidence(&NormalizedDocument {
            bytes: b"%PDF-1.4".to_vec(),
            media: DocumentMedia::Pdf,
        });
        let evidence = draft.evidence.unwrap();
        assert!(evidence.base64.starts_with("JVBER"));
        assert_eq!(evidence.media, DocumentMedia::Pdf);
    }
}
