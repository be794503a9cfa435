pub mod draft;
pub mod exemption;
pub mod media;

pub use draft::{DocumentEvidence, DraftField, ExemptionDraft, MISSING};
pub use exemption::ExemptionRecord;
pub use media::{DocumentMedia, NormalizedDocument, RawCapture};
