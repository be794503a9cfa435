//! Reconciliation of extracted fields into the draft.
//!
//! Extraction output is untrusted: models return nulls, placeholder prose
//! and stray whitespace. Cleaning maps all of those onto the single
//! [`MISSING`] sentinel; the merge policy below then decides, field by
//! field, what overwrites the draft. The whole mapping is pure: running it
//! twice with the same inputs yields an identical draft.

use chrono::NaiveDate;

use super::extraction::ExtractedFields;
use crate::models::{DocumentEvidence, DocumentMedia, DraftField, ExemptionDraft, ExemptionRecord, MISSING};

/// Placeholder strings (compared lowercase) that count as "no value".
/// Mix of literal model output and the sentinel's own spelling so a
/// re-imported draft cleans to the same state.
const PLACEHOLDER_VALUES: &[&str] = &[
    "null",
    "undefined",
    "non renseignée",
    "non renseignee",
    "à compléter",
    "à completer",
];

/// Map a nullable scalar onto the sentinel policy: `None`, empty and
/// placeholder strings become [`MISSING`]; anything else is kept trimmed.
pub fn clean_value(value: Option<&str>) -> String {
    let Some(value) = value else {
        return MISSING.to_string();
    };
    let trimmed = value.trim();
    if trimmed.is_empty() || PLACEHOLDER_VALUES.contains(&trimmed.to_lowercase().as_str()) {
        return MISSING.to_string();
    }
    trimmed.to_string()
}

/// Merge extracted fields into the draft.
///
/// - last name is upper-cased after cleaning, never the sentinel itself
/// - duration falls back to one day when extraction yields nothing usable
/// - the draft keeps its start date unless extraction supplied one
/// - a successful extraction implies a scanned document, so the draft is
///   always marked "not a parental note", even if the user had flagged it
///   parental beforehand (preserved legacy behavior)
pub fn reconcile(fields: &ExtractedFields, draft: &mut ExemptionDraft) {
    let last_name = clean_value(fields.last_name.as_deref());
    draft.last_name = if last_name == MISSING {
        last_name
    } else {
        last_name.to_uppercase()
    };
    draft.first_name = clean_value(fields.first_name.as_deref());
    draft.student_class = clean_value(fields.student_class.as_deref());

    // Zero days is as unusable as null; both fall back to one day.
    draft.duration_days = fields.duration_days.filter(|&d| d > 0).unwrap_or(1);

    if let Some(raw) = fields.start_date.as_deref() {
        match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
            Ok(date) => draft.start_date = date,
            Err(_) => {
                tracing::warn!(start_date = raw, "unparseable extracted start date, keeping draft date");
            }
        }
    }

    draft.is_terminale = fields.is_terminale;
    draft.is_parental_note = false;
}

/// Open an existing record for editing: the stored strings go through the
/// same cleaning as extraction output, so legacy placeholder values render
/// as the sentinel instead of leaking into the form.
pub fn draft_from_record(record: &ExemptionRecord) -> ExemptionDraft {
    ExemptionDraft {
        id: Some(record.id.clone()),
        last_name: clean_value(Some(&record.last_name)),
        first_name: clean_value(Some(&record.first_name)),
        student_class: clean_value(Some(&record.student_class)),
        received_at: record.received_at,
        start_date: record.start_date,
        duration_days: record.duration_days,
        is_parental_note: record.is_parental_note,
        evidence: record.photo_base64.as_ref().filter(|p| !p.is_empty()).map(|p| {
            DocumentEvidence {
                base64: p.clone(),
                media: if record.document_is_pdf() {
                    DocumentMedia::Pdf
                } else {
                    DocumentMedia::Jpeg
                },
            }
        }),
        is_terminale: record.is_terminale,
    }
}
