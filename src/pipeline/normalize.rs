//! Image normalization for extraction transport.
//!
//! Captured and imported documents arrive at arbitrary sizes and in
//! whatever media type the platform declared (often `octet-stream` on
//! mobile). Normalization bounds the payload, downscales wide images and
//! re-encodes everything photographic to one canonical JPEG. Structured
//! documents (PDF) pass through untouched; the provider reads them as-is.

use std::io::Cursor;

use image::imageops::FilterType;
use image::ImageOutputFormat;

use crate::models::{DocumentMedia, NormalizedDocument, RawCapture};
use crate::pipeline::IntakeError;

// ──────────────────────────────────────────────
// Constants
// ──────────────────────────────────────────────

/// Hard input ceiling, checked before any decoding. Oversized files must be
/// re-supplied (typically by photographing instead of importing).
pub const MAX_INPUT_BYTES: usize = 15 * 1024 * 1024; // 15 MB

/// Images wider than this are downscaled, aspect preserved. Wide enough for
/// the provider to read handwriting, small enough to upload from a phone.
const MAX_WIDTH: u32 = 1200;

/// Lossy re-encode quality for the canonical JPEG output.
const JPEG_QUALITY: u8 = 70;

// ──────────────────────────────────────────────
// Normalization
// ──────────────────────────────────────────────

/// Normalize a capture for transmission.
///
/// Unknown media is sniffed first. Image media is decoded, width-capped and
/// re-encoded as JPEG; PDF passes through unchanged.
pub fn normalize(capture: RawCapture) -> Result<NormalizedDocument, IntakeError> {
    if capture.bytes.len() > MAX_INPUT_BYTES {
        return Err(IntakeError::PayloadTooLarge(format!(
            "{} bytes, ceiling {} bytes",
            capture.bytes.len(),
            MAX_INPUT_BYTES
        )));
    }

    let media = capture.media.resolve(&capture.bytes);
    if !media.is_image() {
        tracing::debug!(size = capture.bytes.len(), "structured document, pass-through");
        return Ok(NormalizedDocument {
            bytes: capture.bytes,
            media,
        });
    }

    let image = image::load_from_memory(&capture.bytes)
        .map_err(|e| IntakeError::Image(format!("decode failed: {e}")))?;

    let (width, height) = (image.width(), image.height());
    let image = if width > MAX_WIDTH {
        // CatmullRom keeps text edges clean without Lanczos ringing.
        let scaled_height =
            ((u64::from(height) * u64::from(MAX_WIDTH) + u64::from(width) / 2)
                / u64::from(width)) as u32;
        image.resize_exact(MAX_WIDTH, scaled_height.max(1), FilterType::CatmullRom)
    } else {
        image
    };

    let mut out = Cursor::new(Vec::new());
    image
        .write_to(&mut out, ImageOutputFormat::Jpeg(JPEG_QUALITY))
        .map_err(|e| IntakeError::Image(format!("re-encode failed: {e}")))?;

    tracing::debug!(
        input_bytes = capture.bytes.len(),
        output_bytes = out.get_ref().len(),
        width = image.width(),
        height = image.height(),
        "image normalized"
    );

    Ok(NormalizedDocument {
        bytes: out.into_inner(),
        media: DocumentMedia::Jpeg,
    })
}
