//! End-to-end processing of one document: pages → records → merged invoice.

use std::collections::BTreeMap;

use futures_util::stream::{self, StreamExt};
use serde::Serialize;
use tracing::{info, warn};

use crate::extraction::{ExtractionFailure, FieldExtractor, PageExtraction};
use crate::llm::LanguageModel;
use crate::merge::{merge_pages, PageOutcome, SkipReason};
use crate::models::invoice::{MergedInvoice, PageRecords};
use crate::pages::PageText;
use crate::Result;

/// What happened to one page over the whole run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "stage", rename_all = "snake_case")]
pub enum PageAudit {
    /// The page was extracted and merged.
    Merged { outcome: PageOutcome },
    /// The page was extracted but its record was rejected by the merge.
    Skipped { reason: SkipReason },
    /// No record could be extracted from the page.
    Failed { failure: ExtractionFailure },
}

/// Per-page account of a processed document.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunAudit {
    /// Every page seen, keyed by page number.
    pub pages: BTreeMap<u32, PageAudit>,
}

impl RunAudit {
    /// Pages that contributed to the invoice.
    pub fn pages_merged(&self) -> Vec<u32> {
        self.pages
            .iter()
            .filter(|(_, audit)| matches!(audit, PageAudit::Merged { .. }))
            .map(|(page, _)| *page)
            .collect()
    }

    /// Pages that did not contribute, for any reason.
    pub fn pages_skipped(&self) -> Vec<u32> {
        self.pages
            .iter()
            .filter(|(_, audit)| !matches!(audit, PageAudit::Merged { .. }))
            .map(|(page, _)| *page)
            .collect()
    }

    /// Whether every page contributed.
    pub fn is_complete(&self) -> bool {
        self.pages_skipped().is_empty()
    }
}

/// A merged invoice and how it was assembled.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessedInvoice {
    pub invoice: MergedInvoice,
    pub audit: RunAudit,
}

/// Runs field extraction over every page and merges the results.
pub struct InvoicePipeline<M> {
    extractor: FieldExtractor<M>,
    concurrency: usize,
}

impl<M: LanguageModel> InvoicePipeline<M> {
    /// Create a pipeline using `model` for extraction, one page at a time.
    pub fn new(model: M) -> Self {
        Self {
            extractor: FieldExtractor::new(model),
            concurrency: 1,
        }
    }

    /// Number of pages extracted at the same time.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Extract every page, returning results keyed by page number.
    pub async fn extract_pages(&self, pages: &[PageText]) -> BTreeMap<u32, PageExtraction> {
        stream::iter(pages)
            .map(|page| async move { (page.page, self.extractor.extract_page(page).await) })
            .buffer_unordered(self.concurrency)
            .collect()
            .await
    }

    /// Process a document's pages into one merged invoice.
    ///
    /// Fails when the anchor page produced no usable record; in that case
    /// nothing should be persisted.
    pub async fn process(&self, pages: &[PageText]) -> Result<ProcessedInvoice> {
        let extractions = self.extract_pages(pages).await;
        let (records, mut audit) = split_extractions(extractions);

        let report = merge_pages(&records)?;

        for (page, outcome) in report.pages {
            let entry = match outcome {
                PageOutcome::Skipped(reason) => PageAudit::Skipped { reason },
                outcome => PageAudit::Merged { outcome },
            };
            audit.pages.insert(page, entry);
        }

        info!(
            "Merged {} of {} pages ({} items)",
            audit.pages_merged().len(),
            audit.pages.len(),
            report.invoice.items().len()
        );
        if !audit.is_complete() {
            warn!("Pages left out of the merge: {:?}", audit.pages_skipped());
        }

        Ok(ProcessedInvoice {
            invoice: report.invoice,
            audit,
        })
    }
}

/// Separate parsed records from failures.
fn split_extractions(extractions: BTreeMap<u32, PageExtraction>) -> (PageRecords, RunAudit) {
    let mut records = PageRecords::new();
    let mut audit = RunAudit::default();

    for (page, extraction) in extractions {
        match extraction {
            PageExtraction::Parsed(record) => {
                records.insert(page, record);
            }
            PageExtraction::Failed(failure) => {
                audit.pages.insert(page, PageAudit::Failed { failure });
            }
        }
    }

    (records, audit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{InvqError, LlmError, MergeError};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    /// Answers with a canned response chosen by the page header in the prompt.
    struct ScriptedModel {
        responses: Vec<(&'static str, std::result::Result<&'static str, u16>)>,
    }

    impl LanguageModel for ScriptedModel {
        async fn generate(&self, prompt: &str) -> crate::llm::Result<String> {
            for (marker, response) in &self.responses {
                if prompt.contains(marker) {
                    return match response {
                        Ok(text) => Ok(text.to_string()),
                        Err(status) => Err(LlmError::Status {
                            status: *status,
                            body: "scripted failure".to_string(),
                        }),
                    };
                }
            }
            Ok("no idea".to_string())
        }

        fn name(&self) -> &str {
            "scripted"
        }
    }

    fn page(number: u32) -> PageText {
        PageText {
            source: "invoice.pdf".to_string(),
            page: number,
            text: format!("=== invoice.pdf | Page {} ===\n...", number),
        }
    }

    #[tokio::test]
    async fn test_process_merges_and_audits() {
        let model = ScriptedModel {
            responses: vec![
                ("Page 1 ===", Ok("```json\n{\"invoice_number\": \"INV-1\", \"cgst\": null, \"items\": [{\"S.N.\": 1}]}\n```")),
                ("Page 2 ===", Ok("```json\n[{\"S.N.\": 2}]\n```")),
                ("Page 3 ===", Ok("Sorry, I could not read this page.")),
                ("Page 4 ===", Ok("```json\n{\"cgst\": 45, \"items\": [{\"S.N.\": 3}]}\n```")),
                ("Page 5 ===", Ok("```json\n[\"x\"]\n```")),
            ],
        };
        let pipeline = InvoicePipeline::new(model).with_concurrency(3);
        let pages: Vec<_> = (1..=5).map(page).collect();

        let processed = pipeline.process(&pages).await.unwrap();

        assert_eq!(
            processed.invoice.into_value(),
            json!({
                "invoice_number": "INV-1",
                "cgst": 45,
                "items": [{"S.N.": 1}, {"S.N.": 2}, {"S.N.": 3}, "x"]
            })
        );
        assert_eq!(processed.audit.pages_merged(), vec![1, 2, 4, 5]);
        assert_eq!(processed.audit.pages_skipped(), vec![3]);
        assert_eq!(
            processed.audit.pages[&3],
            PageAudit::Failed { failure: ExtractionFailure::NoJsonBlock }
        );
    }

    #[tokio::test]
    async fn test_anchor_failure_aborts() {
        let model = ScriptedModel {
            responses: vec![
                ("Page 1 ===", Err(401)),
                ("Page 2 ===", Ok("```json\n{\"cgst\": 1}\n```")),
            ],
        };
        let pipeline = InvoicePipeline::new(model);
        let pages: Vec<_> = (1..=2).map(page).collect();

        let result = pipeline.process(&pages).await;
        assert!(matches!(
            result,
            Err(InvqError::Merge(MergeError::MissingAnchor { page: 1 }))
        ));
    }

    #[tokio::test]
    async fn test_anchor_list_aborts() {
        let model = ScriptedModel {
            responses: vec![("Page 1 ===", Ok("```json\n[{\"S.N.\": 1}]\n```"))],
        };
        let pipeline = InvoicePipeline::new(model);

        let result = pipeline.process(&[page(1)]).await;
        assert!(matches!(
            result,
            Err(InvqError::Merge(MergeError::AnchorNotMapping { kind: "array" }))
        ));
    }

    #[tokio::test]
    async fn test_failed_pages_are_split_from_records() {
        let model = ScriptedModel {
            responses: vec![("Page 1 ===", Ok("```json\n{\"invoice_number\": \"A\"}\n```"))],
        };
        let pipeline = InvoicePipeline::new(model);
        let extractions = BTreeMap::from([
            (1, PageExtraction::Parsed(json!({"invoice_number": "A"}))),
            (2, PageExtraction::Failed(ExtractionFailure::Llm("timeout".into()))),
        ]);
        let (records, audit) = split_extractions(extractions);

        assert_eq!(records.len(), 1);
        assert_eq!(audit.pages_skipped(), vec![2]);

        let processed = pipeline.process(&[page(1)]).await.unwrap();
        assert!(processed.audit.is_complete());
    }
}
