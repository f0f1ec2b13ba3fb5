//! Core library for multi-page invoice extraction.
//!
//! This crate provides:
//! - Page text extraction (PDF text layers, OCR of scans and embedded images)
//! - Per-page field extraction through a language model
//! - Merging of page records into one invoice
//! - Consistency checks on GST amounts
//! - Questions answered against a merged invoice

pub mod error;
pub mod models;
pub mod pdf;
pub mod ocr;
pub mod pages;
pub mod llm;
pub mod extraction;
pub mod merge;
pub mod invoice;
pub mod query;
pub mod pipeline;

pub use error::{InvqError, Result};
pub use models::config::InvqConfig;
pub use models::invoice::{MergedInvoice, PageRecord, PageRecords};
pub use pages::{PageExtractor, PageText};
pub use llm::{GeminiClient, LanguageModel, RetryPolicy};
pub use extraction::{ExtractionFailure, FieldExtractor, PageExtraction};
pub use merge::{merge_pages, MergeReport, PageOutcome, SkipReason};
pub use invoice::validate;
pub use query::{InvoiceContext, QueryAnswerer};
pub use pipeline::{InvoicePipeline, PageAudit, ProcessedInvoice, RunAudit};
