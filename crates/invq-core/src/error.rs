//! Error types for the invq-core library.

use thiserror::Error;

/// Main error type for the invq library.
#[derive(Error, Debug)]
pub enum InvqError {
    /// PDF processing error.
    #[error("PDF error: {0}")]
    Pdf(#[from] PdfError),

    /// OCR processing error.
    #[error("OCR error: {0}")]
    Ocr(#[from] OcrError),

    /// Structured-field extraction error.
    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// Page merge error.
    #[error("merge error: {0}")]
    Merge(#[from] MergeError),

    /// Language model error.
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    /// Image processing error.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// The input file type is not supported.
    #[error("unsupported file: {0}")]
    UnsupportedFile(String),
}

/// Errors related to PDF processing.
#[derive(Error, Debug)]
pub enum PdfError {
    /// Failed to open/parse the PDF file.
    #[error("failed to parse PDF: {0}")]
    Parse(String),

    /// Failed to extract text from PDF.
    #[error("failed to extract text: {0}")]
    TextExtraction(String),

    /// Failed to extract images from PDF.
    #[error("failed to extract images: {0}")]
    ImageExtraction(String),

    /// The PDF is encrypted and cannot be processed.
    #[error("PDF is encrypted")]
    Encrypted,

    /// The PDF is empty or has no pages.
    #[error("PDF has no pages")]
    NoPages,

    /// Invalid page number requested.
    #[error("invalid page number: {0}")]
    InvalidPage(u32),
}

/// Errors related to OCR processing.
#[derive(Error, Debug)]
pub enum OcrError {
    /// Failed to load OCR models.
    #[error("failed to load model: {0}")]
    ModelLoad(String),

    /// Text recognition failed.
    #[error("text recognition failed: {0}")]
    Recognition(String),

    /// No OCR engine is configured but one is required.
    #[error("OCR is not available: {0}")]
    Unavailable(String),
}

/// Errors raised while turning an LLM response into a page record.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    /// The response contains no fenced JSON block.
    #[error("no JSON block found in response")]
    NoJsonBlock,

    /// A fenced block was found but does not parse as JSON.
    #[error("invalid JSON block: {0}")]
    InvalidJson(String),
}

/// Errors raised by the page merger.
///
/// These are the only failures the merge can produce. Every other shape
/// anomaly is reported as a skipped page instead.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MergeError {
    /// No record exists for the anchor page.
    #[error("anchor page {page} is missing")]
    MissingAnchor { page: u32 },

    /// The anchor page record is not a JSON object.
    #[error("anchor page must be a mapping, got {kind}")]
    AnchorNotMapping { kind: &'static str },
}

/// Errors raised while talking to the language model.
#[derive(Error, Debug)]
pub enum LlmError {
    /// The API key environment variable is not set.
    #[error("API key not found in environment variable {0}")]
    MissingApiKey(String),

    /// Transport-level failure (connect, timeout, body decode).
    #[error("request failed: {0}")]
    Request(String),

    /// The service answered with a non-success status.
    #[error("service returned {status}: {body}")]
    Status { status: u16, body: String },

    /// The service answered without any candidate text.
    #[error("empty response from model")]
    EmptyResponse,

    /// The prompt or question was blank.
    #[error("prompt is empty")]
    EmptyPrompt,

    /// Every attempt allowed by the retry policy failed.
    #[error("gave up after {attempts} attempts: {last}")]
    Exhausted {
        attempts: u32,
        #[source]
        last: Box<LlmError>,
    },
}

impl LlmError {
    /// Whether another attempt may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            LlmError::Request(_) | LlmError::EmptyResponse => true,
            LlmError::Status { status, .. } => *status == 429 || *status >= 500,
            LlmError::MissingApiKey(_) | LlmError::EmptyPrompt | LlmError::Exhausted { .. } => {
                false
            }
        }
    }
}

impl From<reqwest::Error> for LlmError {
    fn from(e: reqwest::Error) -> Self {
        LlmError::Request(e.to_string())
    }
}

/// Result type for the invq library.
pub type Result<T> = std::result::Result<T, InvqError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anchor_error_message() {
        let err = MergeError::AnchorNotMapping { kind: "array" };
        assert_eq!(err.to_string(), "anchor page must be a mapping, got array");
    }

    #[test]
    fn test_retryable_statuses() {
        let rate_limited = LlmError::Status { status: 429, body: String::new() };
        let server = LlmError::Status { status: 503, body: String::new() };
        let bad_request = LlmError::Status { status: 400, body: String::new() };

        assert!(rate_limited.is_retryable());
        assert!(server.is_retryable());
        assert!(!bad_request.is_retryable());
        assert!(!LlmError::MissingApiKey("GEMINI_API_KEY".into()).is_retryable());
    }
}
