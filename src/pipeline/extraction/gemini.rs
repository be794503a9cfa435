//! Gemini-backed extraction provider.
//!
//! One `generateContent` call per document: base64 inline data + the fixed
//! French instruction naming exactly six target fields, with a JSON
//! response schema so the model answers in the shape
//! [`ExtractedFields`](super::ExtractedFields) parses directly. Failures
//! are classified here; the retry policy lives one layer up in
//! [`client`](super::client).

use base64::Engine as _;
use serde::Deserialize;
use serde_json::json;

use super::{ExtractedFields, ExtractionProvider};
use crate::config;
use crate::models::DocumentMedia;
use crate::pipeline::IntakeError;

// ──────────────────────────────────────────────
// Constants
// ──────────────────────────────────────────────

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_MODEL: &str = "gemini-flash-lite-latest";
const REQUEST_TIMEOUT_SECS: u64 = 60;

/// Fixed instruction: six named fields, and the rule that anything absent
/// or unreadable is null, never fabricated.
const EXTRACTION_PROMPT: &str = "\
Tu es un assistant administratif expert en milieu scolaire français.
Analyse ce document (certificat médical ou dispense EPS) et extrais les informations suivantes en JSON :

- lastName: Nom de famille de l'élève (en MAJUSCULES)
- firstName: Prénom de l'élève
- studentClass: Classe (ex: 602, 3èmeB, T01, TermA, etc.)
- durationDays: Durée totale de l'inaptitude en nombre de jours (entier)
- startDate: Date de début au format YYYY-MM-DD
- isTerminale: Boolean. Est-ce une classe de Terminale ?

Règles :
1. Si une information est absente ou illisible, mettre null. Ne jamais inventer.
2. Réponds uniquement avec le JSON.";

// ──────────────────────────────────────────────
// GeminiExtractor
// ──────────────────────────────────────────────

/// Production extraction provider. Stateless between calls; the credential
/// is resolved at construction and its absence surfaces as `Auth` before
/// any network traffic.
pub struct GeminiExtractor {
    base_url: String,
    model: String,
    api_key: Option<String>,
    client: reqwest::blocking::Client,
}

impl GeminiExtractor {
    pub fn new(base_url: &str, model: &str, api_key: Option<String>) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            client,
        }
    }

    /// Standard endpoint and model, credential from the environment.
    pub fn from_env() -> Self {
        Self::new(DEFAULT_BASE_URL, DEFAULT_MODEL, config::extraction_api_key())
    }

    fn request_body(&self, bytes: &[u8], media: DocumentMedia) -> serde_json::Value {
        let data = base64::engine::general_purpose::STANDARD.encode(bytes);
        json!({
            "contents": [{
                "parts": [
                    { "inlineData": { "mimeType": media.mime(), "data": data } },
                    { "text": EXTRACTION_PROMPT }
                ]
            }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": {
                    "type": "OBJECT",
                    "properties": {
                        "lastName": { "type": "STRING", "nullable": true },
                        "firstName": { "type": "STRING", "nullable": true },
                        "studentClass": { "type": "STRING", "nullable": true },
                        "durationDays": { "type": "NUMBER", "nullable": true },
                        "startDate": { "type": "STRING", "nullable": true },
                        "isTerminale": { "type": "BOOLEAN" }
                    },
                    "required": ["isTerminale"]
                }
            }
        })
    }
}

impl ExtractionProvider for GeminiExtractor {
    fn extract(
        &self,
        bytes: &[u8],
        media: DocumentMedia,
    ) -> Result<ExtractedFields, IntakeError> {
        let _span = tracing::info_span!(
            "extract_fields",
            model = %self.model,
            media = media.mime(),
            payload_size = bytes.len(),
        )
        .entered();
        let start = std::time::Instant::now();

        let Some(api_key) = &self.api_key else {
            return Err(IntakeError::Auth(
                "extraction credential missing, set the provider API key".into(),
            ));
        };

        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);

        // Credential travels in a header, never in the URL: transport
        // errors embed the URL in their message and would leak the key
        // into logs and the surfaced error.
        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", api_key)
            .json(&self.request_body(bytes, media))
            .send()
            .map_err(|e| IntakeError::Provider(e.without_url().to_string()))?;

        let status = response.status().as_u16();
        if !(200..300).contains(&status) {
            let body = response.text().unwrap_or_default();
            return Err(classify_provider_failure(status, &body));
        }

        let parsed: GenerateResponse = response
            .json()
            .map_err(|e| IntakeError::MalformedResponse(e.to_string()))?;

        let text = parsed
            .first_text()
            .ok_or_else(|| {
                IntakeError::MalformedResponse("response carries no text part".into())
            })?;

        let fields: ExtractedFields = serde_json::from_str(text).map_err(|e| {
            IntakeError::MalformedResponse(format!("field schema violation: {e}"))
        })?;

        tracing::info!(
            elapsed_ms = %start.elapsed().as_millis(),
            "extraction response parsed"
        );
        Ok(fields)
    }
}

// ──────────────────────────────────────────────
// Failure classification
// ──────────────────────────────────────────────

/// Classify a non-2xx provider response.
///
/// Overload and rate-limit signals are the only transient class; credential
/// rejection and payload-size signals get their own classes; everything
/// else is surfaced unclassified with the provider's raw message.
pub(crate) fn classify_provider_failure(status: u16, body: &str) -> IntakeError {
    if status == 429 || status == 503 || body.contains("overloaded") {
        IntakeError::Transient(format!("provider busy (HTTP {status})"))
    } else if status == 401 || status == 403 || body.contains("API key not valid") {
        IntakeError::Auth(format!("credential rejected (HTTP {status})"))
    } else if status == 413 {
        IntakeError::PayloadTooLarge(format!("provider refused payload (HTTP {status})"))
    } else {
        IntakeError::Provider(format!("HTTP {status}: {body}"))
    }
}

// ──────────────────────────────────────────────
// Response wire types
// ──────────────────────────────────────────────

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Deserialize)]
struct Part {
    text: Option<String>,
}

impl GenerateResponse {
    fn first_text(&self) -> Option<&str> {
        self.candidates
            .iter()
            .filter_map(|c| c.content.as_ref())
            .flat_map(|c| c.parts.iter())
            .find_map(|p| p.text.as_deref())
    }
}
