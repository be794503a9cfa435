//! Document media kinds and the two transient byte payloads of the intake
//! pipeline.
//!
//! `RawCapture` comes straight from the camera or a file import and only
//! lives long enough to be normalized. `NormalizedDocument` is owned by the
//! in-flight extraction attempt and is embedded into the draft as evidence,
//! never persisted on its own.

use serde::{Deserialize, Serialize};

/// PDF signature: `%PDF-` (`JVBER` once base64-encoded, which is what the
/// legacy store checked against).
const PDF_MAGIC: &[u8] = b"%PDF-";
const PNG_MAGIC: &[u8] = &[0x89, 0x50, 0x4E, 0x47];

/// Media kind of a captured or imported document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DocumentMedia {
    Jpeg,
    Png,
    Pdf,
    /// Declared as generic binary (or not declared at all); must be sniffed
    /// before the pipeline branches on it.
    Unknown,
}

impl DocumentMedia {
    pub fn mime(&self) -> &'static str {
        match self {
            DocumentMedia::Jpeg => "image/jpeg",
            DocumentMedia::Png => "image/png",
            DocumentMedia::Pdf => "application/pdf",
            DocumentMedia::Unknown => "application/octet-stream",
        }
    }

    /// Map a declared MIME type. Anything unrecognized (mobile browsers
    /// routinely declare `application/octet-stream` or nothing at all)
    /// lands on `Unknown` and gets sniffed later.
    pub fn from_mime(mime: &str) -> Self {
        match mime.trim().to_ascii_lowercase().as_str() {
            "image/jpeg" | "image/jpg" => DocumentMedia::Jpeg,
            "image/png" => DocumentMedia::Png,
            "application/pdf" => DocumentMedia::Pdf,
            _ => DocumentMedia::Unknown,
        }
    }

    /// Sniff the leading signature bytes of a payload.
    ///
    /// Distinguishes structured documents (PDF) from images; payloads with
    /// no recognizable magic are assumed to be JPEG, matching the legacy
    /// fallback for unlabeled phone uploads.
    pub fn sniff(bytes: &[u8]) -> Self {
        if bytes.starts_with(PDF_MAGIC) {
            DocumentMedia::Pdf
        } else if bytes.starts_with(PNG_MAGIC) {
            DocumentMedia::Png
        } else {
            // JPEG signature, or anything unlabeled a phone sends us.
            DocumentMedia::Jpeg
        }
    }

    /// Resolve `Unknown` against the payload; concrete kinds pass through.
    pub fn resolve(self, bytes: &[u8]) -> Self {
        match self {
            DocumentMedia::Unknown => Self::sniff(bytes),
            concrete => concrete,
        }
    }

    pub fn is_image(&self) -> bool {
        matches!(self, DocumentMedia::Jpeg | DocumentMedia::Png)
    }
}

/// Opaque payload produced by the capture surface or a file import.
#[derive(Debug, Clone)]
pub struct RawCapture {
    pub bytes: Vec<u8>,
    pub media: DocumentMedia,
}

/// Re-encoded, size-bounded payload ready for the extraction provider.
#[derive(Debug, Clone)]
pub struct NormalizedDocument {
    pub bytes: Vec<u8>,
    pub media: DocumentMedia,
}
