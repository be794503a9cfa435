//! Structured-field extraction from normalized documents.
//!
//! The provider is an opaque capability behind [`ExtractionProvider`]: it
//! accepts a document payload plus a fixed instruction and returns the
//! six-field schema or a classified failure. The retry/backoff wrapper in
//! [`client`] is what the lifecycle calls; [`gemini`] is the production
//! provider.

pub mod client;
pub mod gemini;

pub use client::{ExtractionClient, RetryPolicy};
pub use gemini::GeminiExtractor;

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::models::DocumentMedia;
use crate::pipeline::IntakeError;

/// Fields the provider is asked to read off a certificate. Five nullable
/// scalars plus one non-nullable boolean; a response that does not conform
/// (including a missing `isTerminale`) is malformed.
///
/// Never persisted as-is: always passed through the reconciler first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedFields {
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub student_class: Option<String>,
    /// Whole days; the provider is instructed to return an integer.
    #[serde(default)]
    pub duration_days: Option<u32>,
    /// ISO `YYYY-MM-DD`.
    #[serde(default)]
    pub start_date: Option<String>,
    pub is_terminale: bool,
}

/// Opaque extraction capability. Stateless between calls.
pub trait ExtractionProvider: Send + Sync {
    fn extract(
        &self,
        bytes: &[u8],
        media: DocumentMedia,
    ) -> Result<ExtractedFields, IntakeError>;
}

/// Scripted provider for tests: pops one pre-arranged result per call and
/// counts attempts.
pub struct MockExtractor {
    script: Mutex<VecDeque<Result<ExtractedFields, IntakeError>>>,
    attempts: AtomicUsize,
}

impl MockExtractor {
    pub fn script(results: Vec<Result<ExtractedFields, IntakeError>>) -> Self {
        Self {
            script: Mutex::new(results.into()),
            attempts: AtomicUsize::new(0),
        }
    }

    /// Succeed once with the given fields.
    pub fn returning(fields: ExtractedFields) -> Self {
        Self::script(vec![Ok(fields)])
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

impl ExtractionProvider for MockExtractor {
    fn extract(
        &self,
        _bytes: &[u8],
        _media: DocumentMedia,
    ) -> Result<ExtractedFields, IntakeError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        let mut script = self.script.lock().expect("mock script poisoned");
        match script.pop_front() {
            Some(result) => result,
            // Script exhausted: keep replaying success semantics is wrong,
            // so surface it loudly as an unclassified failure.
            None => Err(IntakeError::Provider("mock script exhausted".into())),
        }
    }
}
