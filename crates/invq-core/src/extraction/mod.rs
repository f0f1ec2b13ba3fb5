//! Structured-field extraction: page text in, page record out.

mod json_block;

pub use json_block::parse_json_block;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::ExtractionError;
use crate::llm::{prompt, LanguageModel};
use crate::pages::PageText;

/// Result of extracting one page.
#[derive(Debug, Clone, PartialEq)]
pub enum PageExtraction {
    /// The model returned a parseable record.
    Parsed(Value),
    /// No record could be obtained for this page.
    Failed(ExtractionFailure),
}

/// Why a page produced no record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", content = "detail", rename_all = "snake_case")]
pub enum ExtractionFailure {
    /// The model call failed after all retries.
    Llm(String),
    /// The response had no fenced JSON block.
    NoJsonBlock,
    /// The fenced block was not valid JSON.
    InvalidJson(String),
}

impl std::fmt::Display for ExtractionFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExtractionFailure::Llm(e) => write!(f, "model call failed: {}", e),
            ExtractionFailure::NoJsonBlock => write!(f, "no JSON block in response"),
            ExtractionFailure::InvalidJson(e) => write!(f, "invalid JSON block: {}", e),
        }
    }
}

impl From<ExtractionError> for ExtractionFailure {
    fn from(e: ExtractionError) -> Self {
        match e {
            ExtractionError::NoJsonBlock => ExtractionFailure::NoJsonBlock,
            ExtractionError::InvalidJson(msg) => ExtractionFailure::InvalidJson(msg),
        }
    }
}

/// Asks a language model for the invoice fields on each page.
#[derive(Debug, Clone)]
pub struct FieldExtractor<M> {
    model: M,
}

impl<M: LanguageModel> FieldExtractor<M> {
    /// Create an extractor backed by `model`.
    pub fn new(model: M) -> Self {
        Self { model }
    }

    /// The underlying model.
    pub fn model(&self) -> &M {
        &self.model
    }

    /// Extract the structured record for one page.
    ///
    /// Never fails: model and parse errors become [`PageExtraction::Failed`].
    pub async fn extract_page(&self, page: &PageText) -> PageExtraction {
        let prompt = prompt::extraction_prompt(&page.text);
        debug!("Extracting fields from {} page {}", page.source, page.page);

        let raw = match self.model.generate(&prompt).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Model call failed for page {}: {}", page.page, e);
                return PageExtraction::Failed(ExtractionFailure::Llm(e.to_string()));
            }
        };

        match parse_json_block(&raw) {
            Ok(record) => PageExtraction::Parsed(record),
            Err(e) => {
                warn!("Page {}: {}", page.page, e);
                debug!("Unusable response for page {}:\n{}", page.page, raw);
                PageExtraction::Failed(e.into())
            }
        }
    }
}
