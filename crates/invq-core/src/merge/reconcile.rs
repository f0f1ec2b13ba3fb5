//! Single-pass fold of page records into one invoice.

use std::collections::BTreeMap;

use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::{MergeReport, PageOutcome, SkipReason};
use crate::error::MergeError;
use crate::models::invoice::{fields, value_kind, MergedInvoice, PageRecords};

/// The page whose record seeds the merge and wins every tie.
pub const ANCHOR_PAGE: u32 = 1;

/// Merge per-page records into a single invoice.
///
/// Pages are visited in ascending page order. The anchor's fields are
/// copied as-is; continuation pages only contribute line items and the
/// financial scalars the anchor is missing. Fails only when the anchor is
/// absent or is not an object.
pub fn merge_pages(records: &PageRecords) -> Result<MergeReport, MergeError> {
    let anchor = match records.get(&ANCHOR_PAGE) {
        Some(Value::Object(map)) => map,
        Some(other) => {
            return Err(MergeError::AnchorNotMapping {
                kind: value_kind(other),
            })
        }
        None => return Err(MergeError::MissingAnchor { page: ANCHOR_PAGE }),
    };

    let mut merged: Map<String, Value> = anchor.clone();
    let mut items: Vec<Value> = Vec::new();
    let mut outcomes = BTreeMap::new();

    let anchor_note = match anchor.get(fields::ITEMS) {
        Some(Value::Array(anchor_items)) => {
            items.extend(anchor_items.iter().cloned());
            None
        }
        None => None,
        Some(other) => {
            warn!("Anchor page items is a {}, starting with no items", value_kind(other));
            Some(format!("items was a {}, treated as empty", value_kind(other)))
        }
    };
    outcomes.insert(
        ANCHOR_PAGE,
        PageOutcome::Merged {
            items_added: items.len(),
            fields_filled: Vec::new(),
            note: anchor_note,
        },
    );

    for (&page, record) in records.iter().filter(|(page, _)| **page != ANCHOR_PAGE) {
        let outcome = match record {
            Value::Array(page_items) => {
                items.extend(page_items.iter().cloned());
                PageOutcome::Merged {
                    items_added: page_items.len(),
                    fields_filled: Vec::new(),
                    note: None,
                }
            }
            Value::Object(map) => {
                let items_added = match map.get(fields::ITEMS) {
                    Some(Value::Array(page_items)) => {
                        items.extend(page_items.iter().cloned());
                        page_items.len()
                    }
                    _ => 0,
                };
                let fields_filled = fill_missing_financials(&mut merged, map);
                for field in &fields_filled {
                    debug!("Found {} on page {}, adding to merged invoice", field, page);
                }
                PageOutcome::Merged {
                    items_added,
                    fields_filled,
                    note: None,
                }
            }
            other => {
                let reason = SkipReason::UnsupportedShape {
                    kind: value_kind(other),
                };
                warn!("Skipping page {}: {}", page, reason);
                PageOutcome::Skipped(reason)
            }
        };
        outcomes.insert(page, outcome);
    }

    debug!(
        "Merged {} pages into invoice with {} items",
        outcomes.values().filter(|o| o.is_merged()).count(),
        items.len()
    );

    merged.insert(fields::ITEMS.to_string(), Value::Array(items));

    Ok(MergeReport {
        invoice: MergedInvoice::from_map(merged),
        pages: outcomes,
    })
}

/// Copy financial scalars from `page` into `merged` where `merged` has none.
fn fill_missing_financials(
    merged: &mut Map<String, Value>,
    page: &Map<String, Value>,
) -> Vec<&'static str> {
    let mut filled = Vec::new();
    for key in fields::FINANCIAL {
        let Some(value) = page.get(key).filter(|v| !v.is_null()) else {
            continue;
        };
        let missing = merged.get(key).is_none_or(Value::is_null);
        if missing {
            merged.insert(key.to_string(), value.clone());
            filled.push(key);
        }
    }
    filled
}
