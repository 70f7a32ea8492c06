//! Error types for the edgequake-pptgen library.
//!
//! Three error types reflect three distinct failure scopes:
//!
//! * [`PptGenError`] — **Fatal**: the build cannot proceed at all (provider
//!   not configured, outline generation failed, document cannot be written).
//!   Returned as `Err(PptGenError)` from the top-level entry points.
//!
//! * [`ServiceError`] — a single outbound call (chat completion, image
//!   generation, image fetch) failed. Callers decide whether that is fatal.
//!
//! * [`MindmapError`] — **Non-fatal**: one mind-map could not be resolved.
//!   Stored inside [`crate::output::MindmapBinding`] so the deck is still
//!   built and the slide shows a failure placeholder instead.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the edgequake-pptgen library.
#[derive(Debug, Error)]
pub enum PptGenError {
    // ── LLM errors ────────────────────────────────────────────────────────
    /// The configured provider is not initialised (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// The outline request failed after all retries.
    #[error("LLM API error: {message}")]
    LlmApiError { message: String },

    // ── Document errors ───────────────────────────────────────────────────
    /// No deck has been built yet at the store location.
    #[error("Presentation not found: '{path}'\nGenerate one first with `pptgen generate`.")]
    DocumentNotFound { path: PathBuf },

    /// The PPTX package could not be assembled.
    #[error("Failed to package presentation: {0}")]
    Packaging(String),

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not read a stored presentation.
    #[error("Failed to read '{path}': {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<zip::result::ZipError> for PptGenError {
    fn from(e: zip::result::ZipError) -> Self {
        PptGenError::Packaging(e.to_string())
    }
}

/// Failure of one request to an external service.
#[derive(Debug, Clone, Error)]
pub enum ServiceError {
    /// The service answered with a non-success status.
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The request never produced a response.
    #[error("transport error: {0}")]
    Transport(String),

    /// The call exceeded the configured per-call timeout.
    #[error("timed out after {secs}s")]
    Timeout { secs: u64 },

    /// The response arrived but did not have the expected shape.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// The provider library reported an error.
    #[error("provider error: {0}")]
    Provider(String),
}

impl ServiceError {
    /// Build a [`ServiceError::Status`], truncating long bodies.
    pub fn status(status: u16, body: impl AsRef<str>) -> Self {
        let body = body.as_ref();
        let body = match body.char_indices().nth(200) {
            Some((cut, _)) => format!("{}\u{2026}", &body[..cut]),
            None => body.to_string(),
        };
        ServiceError::Status { status, body }
    }
}

/// A non-fatal error for a single mind-map.
///
/// The build continues and the mind-map slide shows a failure placeholder.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize, serde::Deserialize)]
pub enum MindmapError {
    /// The completion request for the mind-map markup failed.
    #[error("mind-map '{title}': completion failed: {detail}")]
    CompletionFailed { title: String, detail: String },

    /// The completion text lacked the start or end sentinel.
    #[error("mind-map '{title}': no @startmindmap…@endmindmap block in completion")]
    MissingSentinel { title: String },

    /// The image-generation request failed.
    #[error("mind-map '{title}': image generation failed: {detail}")]
    ImageGenerationFailed { title: String, detail: String },

    /// The generated image could not be downloaded.
    #[error("mind-map '{title}': image fetch failed for '{url}': {detail}")]
    ImageFetchFailed {
        title: String,
        url: String,
        detail: String,
    },

    /// The image bytes are not a decodable picture. `url` is `None` for
    /// images returned inline.
    #[error("mind-map '{title}': image could not be decoded: {detail}")]
    ImageDecodeFailed {
        title: String,
        url: Option<String>,
        detail: String,
    },
}

impl MindmapError {
    /// The image URL the generation step returned before the failure, if any.
    pub fn generated_url(&self) -> Option<&str> {
        match self {
            MindmapError::ImageFetchFailed { url, .. } => Some(url),
            MindmapError::ImageDecodeFailed { url, .. } => url.as_deref(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_display_mentions_path() {
        let e = PptGenError::DocumentNotFound {
            path: PathBuf::from("static/generated_ppt.pptx"),
        };
        assert!(e.to_string().contains("generated_ppt.pptx"));
    }

    #[test]
    fn status_body_is_truncated() {
        let long = "x".repeat(500);
        let e = ServiceError::status(500, &long);
        match e {
            ServiceError::Status { status, body } => {
                assert_eq!(status, 500);
                assert!(body.chars().count() <= 201, "got {} chars", body.len());
                assert!(body.ends_with('\u{2026}'));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn short_status_body_kept() {
        let e = ServiceError::status(429, "rate limited");
        assert_eq!(e.to_string(), "HTTP 429: rate limited");
    }

    #[test]
    fn mindmap_error_display() {
        let e = MindmapError::MissingSentinel {
            title: "Rust".into(),
        };
        assert!(e.to_string().contains("Rust"));
        assert!(e.to_string().contains("@startmindmap"));
    }

    #[test]
    fn generated_url_survives_late_failures() {
        let fetch = MindmapError::ImageFetchFailed {
            title: "Tides".into(),
            url: "https://img.test/x.png".into(),
            detail: "HTTP 404".into(),
        };
        assert_eq!(fetch.generated_url(), Some("https://img.test/x.png"));

        let inline = MindmapError::ImageDecodeFailed {
            title: "Tides".into(),
            url: None,
            detail: "unsupported".into(),
        };
        assert_eq!(inline.generated_url(), None);

        let early = MindmapError::MissingSentinel {
            title: "Tides".into(),
        };
        assert_eq!(early.generated_url(), None);
    }
}
