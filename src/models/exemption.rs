//! Persisted exemption record.
//!
//! Serde names stay camelCase so the JSON store and the legacy single-blob
//! export share one on-disk shape. Ids are opaque strings: legacy records
//! carry millisecond-timestamp ids, new ones get UUID v4; the store only
//! ever compares them for equality.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A committed exemption, owned by the persistent store.
///
/// `end_date` is always derived from `start_date + duration_days` at commit
/// time and is never edited directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExemptionRecord {
    pub id: String,
    pub last_name: String,
    pub first_name: String,
    pub student_class: String,
    pub received_at: NaiveDate,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub duration_days: u32,
    /// Attached evidence (scanned certificate), base64-encoded.
    /// Mutually exclusive with `is_parental_note`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_base64: Option<String>,
    pub is_parental_note: bool,
    /// Final-year (Bac) class; collaborating UI applies different expiry
    /// cleanup to these.
    #[serde(default)]
    pub is_terminale: bool,
}

impl ExemptionRecord {
    pub fn has_document(&self) -> bool {
        self.photo_base64.as_deref().is_some_and(|p| !p.is_empty())
    }

    /// Legacy blobs stored PDFs in the same field as photos; the base64
    /// prefix of `%PDF-` is the only marker.
    pub fn document_is_pdf(&self) -> bool {
        self.photo_base64
            .as_deref()
            .is_some_and(|p| p.starts_with("JVBER"))
    }
}
