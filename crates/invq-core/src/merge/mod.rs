//! Multi-page invoice reconciliation.
//!
//! Every page of a document is extracted on its own, so an invoice spread
//! over several pages arrives as several partial records. The merger folds
//! them into a single [`MergedInvoice`]:
//!
//! - page 1 (the anchor) must be an object and seeds the result;
//! - line items from all pages are concatenated in page order;
//! - the financial scalars take the first non-null value in page order;
//! - pages of an unexpected shape are skipped and reported, never fatal.

mod reconcile;

pub use reconcile::{merge_pages, ANCHOR_PAGE};

use std::collections::BTreeMap;

use serde::Serialize;

use crate::models::invoice::MergedInvoice;

/// What the merger did with one page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PageOutcome {
    /// The page contributed to the merged record.
    Merged {
        /// Number of line items appended from this page.
        items_added: usize,
        /// Financial fields whose value came from this page.
        #[serde(skip_serializing_if = "Vec::is_empty")]
        fields_filled: Vec<&'static str>,
        /// Anything unusual about the page that did not prevent merging.
        #[serde(skip_serializing_if = "Option::is_none")]
        note: Option<String>,
    },
    /// The page was ignored.
    Skipped(SkipReason),
}

impl PageOutcome {
    /// Whether the page contributed to the result.
    pub fn is_merged(&self) -> bool {
        matches!(self, PageOutcome::Merged { .. })
    }
}

/// Why a page was left out of the merge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    /// The record is neither an object nor a list of items.
    UnsupportedShape { kind: &'static str },
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::UnsupportedShape { kind } => {
                write!(f, "record is a {}, expected an object or a list of items", kind)
            }
        }
    }
}

/// The merged invoice along with a per-page account of the merge.
#[derive(Debug, Clone, PartialEq)]
pub struct MergeReport {
    /// The reconciled invoice.
    pub invoice: MergedInvoice,
    /// Outcome for every page in the input, anchor included.
    pub pages: BTreeMap<u32, PageOutcome>,
}

impl MergeReport {
    /// Page numbers that contributed to the invoice.
    pub fn merged_pages(&self) -> Vec<u32> {
        self.pages
            .iter()
            .filter(|(_, outcome)| outcome.is_merged())
            .map(|(page, _)| *page)
            .collect()
    }

    /// Page numbers that were skipped, with the reason.
    pub fn skipped_pages(&self) -> Vec<(u32, &SkipReason)> {
        self.pages
            .iter()
            .filter_map(|(page, outcome)| match outcome {
                PageOutcome::Skipped(reason) => Some((*page, reason)),
                PageOutcome::Merged { .. } => None,
            })
            .collect()
    }
}
