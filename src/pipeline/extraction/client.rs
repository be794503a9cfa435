//! Retry/backoff wrapper around an extraction provider.
//!
//! Up to three attempts total; only transient failures (provider overload,
//! rate limiting) are retried, with a delay growing linearly in the attempt
//! number. Any other failure aborts immediately without consuming the
//! remaining attempts. The wrapper is stateless between calls; the delay
//! here is the one intentional blocking wait in the whole pipeline, and it
//! blocks only the current extraction attempt.

use std::sync::Arc;
use std::time::Duration;

use super::{ExtractedFields, ExtractionProvider};
use crate::models::NormalizedDocument;
use crate::pipeline::IntakeError;

/// Attempts total (first call included).
const MAX_ATTEMPTS: u32 = 3;

/// Base of the linear backoff: attempt × this.
const BASE_DELAY: Duration = Duration::from_secs(1);

/// Retry schedule. Delay before attempt `n + 1` is `n × base_delay`, so
/// inter-attempt delays are strictly increasing.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: MAX_ATTEMPTS,
            base_delay: BASE_DELAY,
        }
    }
}

impl RetryPolicy {
    /// Delay after the failed attempt numbered `attempt` (1-based).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.base_delay * attempt
    }
}

/// The extraction entry point the lifecycle calls.
pub struct ExtractionClient {
    provider: Arc<dyn ExtractionProvider>,
    policy: RetryPolicy,
}

impl ExtractionClient {
    pub fn new(provider: Arc<dyn ExtractionProvider>) -> Self {
        Self::with_policy(provider, RetryPolicy::default())
    }

    pub fn with_policy(provider: Arc<dyn ExtractionProvider>, policy: RetryPolicy) -> Self {
        Self { provider, policy }
    }

    /// Send the normalized document, retrying transient failures.
    pub fn extract(
        &self,
        document: &NormalizedDocument,
    ) -> Result<ExtractedFields, IntakeError> {
        let _span = tracing::info_span!(
            "extraction_attempts",
            media = document.media.mime(),
            payload_size = document.bytes.len(),
        )
        .entered();

        for attempt in 1..=self.policy.max_attempts {
            match self.provider.extract(&document.bytes, document.media) {
                Ok(fields) => {
                    if attempt > 1 {
                        tracing::info!(attempt, "extraction succeeded after retry");
                    }
                    return Ok(fields);
                }
                Err(e) if e.is_transient() && attempt < self.policy.max_attempts => {
                    let delay = self.policy.delay_after(attempt);
                    tracing::warn!(
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "transient extraction failure, retrying"
                    );
                    std::thread::sleep(delay);
                }
                Err(e) => return Err(e),
            }
        }

        // max_attempts is never zero in practice; a zero policy yields the
        // same class the final transient failure would.
        Err(IntakeError::Transient("retry budget exhausted".into()))
    }
}
