pub mod capture;
pub mod extraction;
pub mod normalize;
pub mod reconcile;

use thiserror::Error;

/// Errors raised along the intake path, classified so the lifecycle boundary
/// can decide what is retryable and what message reaches the user.
#[derive(Error, Debug)]
pub enum IntakeError {
    /// Camera or frame source unavailable; aborts capture, never retried.
    #[error("Capture surface unavailable: {0}")]
    CaptureAccess(String),

    /// Raised before normalization when the input exceeds the ceiling, or
    /// by the provider's own too-large signal; the user must re-supply a
    /// smaller document.
    #[error("Document too large: {0}")]
    PayloadTooLarge(String),

    /// Provider overload / rate-limit signal. The only class the extraction
    /// client retries.
    #[error("Extraction provider temporarily overloaded: {0}")]
    Transient(String),

    /// Credential missing, empty, or rejected by the provider. Never retried.
    #[error("Extraction credential problem: {0}")]
    Auth(String),

    /// Provider response did not conform to the six-field schema.
    #[error("Malformed extraction response: {0}")]
    MalformedResponse(String),

    /// Anything the provider returned that fits no other class, surfaced
    /// with its raw message.
    #[error("Extraction provider error: {0}")]
    Provider(String),

    /// Decode or re-encode failure during normalization.
    #[error("Image processing error: {0}")]
    Image(String),

    /// Required-field gate at submit. Blocks commit, leaves the draft as-is.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// The lifecycle state machine refused the transition (e.g. a second
    /// analysis while one is in flight).
    #[error("Invalid lifecycle transition: {0}")]
    InvalidTransition(String),
}

impl IntakeError {
    /// Only overload / rate-limit failures are worth another attempt.
    pub fn is_transient(&self) -> bool {
        matches!(self, IntakeError::Transient(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_transient_is_retryable() {
        assert!(IntakeError::Transient("503".into()).is_transient());
        for err in [
            IntakeError::Auth("no key".into()),
            IntakeError::MalformedResponse("bad schema".into()),
            IntakeError::Provider("404".into()),
            IntakeError::PayloadTooLarge("16000000 bytes".into()),
            IntakeError::CaptureAccess("denied".into()),
            IntakeError::Validation("lastName".into()),
            IntakeError::InvalidTransition("already analyzing".into()),
        ] {
            assert!(!err.is_transient(), "{err}");
        }
    }
}
