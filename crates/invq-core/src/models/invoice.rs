//! Page records and the merged invoice record.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Field names requested from the extractor and found in merged records.
pub mod fields {
    pub const INVOICE_NUMBER: &str = "invoice_number";
    pub const COMPANY_NAME: &str = "company_name";
    pub const SELLER_ADDRESS: &str = "seller_address";
    pub const SELLER_GSTIN: &str = "seller_gstin";
    pub const BUYER_NAME: &str = "buyer_name";
    pub const BUYER_ADDRESS: &str = "buyer_address";
    pub const BUYER_GSTIN: &str = "buyer_gstin";
    pub const ITEMS: &str = "items";
    pub const SUBTOTAL_BEFORE_GST: &str = "subtotal_before_gst";
    pub const CGST: &str = "cgst";
    pub const SGST: &str = "sgst";
    pub const TOTAL_GST: &str = "total_gst";
    pub const TOTAL_AMOUNT_AFTER_GST: &str = "total_amount_after_gst";
    pub const BANK_DETAILS: &str = "bank_details";

    /// Scalars filled from continuation pages when the anchor lacks them.
    pub const FINANCIAL: [&str; 5] = [
        SUBTOTAL_BEFORE_GST,
        CGST,
        SGST,
        TOTAL_GST,
        TOTAL_AMOUNT_AFTER_GST,
    ];

    /// Line item keys.
    pub mod item {
        pub const SERIAL: &str = "S.N.";
        pub const DESCRIPTION: &str = "description of goods";
        pub const HSN_CODE: &str = "HSN/SAG code";
        pub const QUANTITY: &str = "quantity";
        pub const UNIT: &str = "unit";
        pub const LIST_PRICE: &str = "list price";
        pub const DISCOUNT: &str = "Discount";
        pub const PRICE: &str = "price";
        pub const AMOUNT: &str = "amount";
    }
}

/// The structured record extracted from one page.
///
/// Usually a JSON object, sometimes a bare array of line items for pages
/// that only continue the item table. Anything else is kept as-is and
/// rejected by the merger.
pub type PageRecord = Value;

/// Page records keyed by 1-indexed page number.
pub type PageRecords = BTreeMap<u32, PageRecord>;

/// Name of the JSON kind of a value, used in errors and skip reasons.
pub fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// One reconciled invoice built from every page of a document.
///
/// Keeps the key order of the anchor page, followed by keys introduced
/// by later pages.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MergedInvoice(Map<String, Value>);

impl MergedInvoice {
    /// Wrap an already merged map.
    pub fn from_map(map: Map<String, Value>) -> Self {
        Self(map)
    }

    /// Borrow the underlying map.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Consume into the underlying map.
    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }

    /// Consume into a JSON value.
    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }

    /// Look up a field.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Whether a field is present (null counts as present).
    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Field rendered as text, skipping nulls and empty strings.
    pub fn text(&self, key: &str) -> Option<String> {
        match self.0.get(key)? {
            Value::Null => None,
            Value::String(s) if s.trim().is_empty() => None,
            Value::String(s) => Some(s.trim().to_string()),
            other => Some(other.to_string()),
        }
    }

    /// Line items, empty when the field is absent or not a list.
    pub fn items(&self) -> &[Value] {
        self.0
            .get(fields::ITEMS)
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Serialize with the given indentation width.
    pub fn to_json_pretty(&self, indent: usize) -> serde_json::Result<String> {
        let indent = vec![b' '; indent];
        let formatter = serde_json::ser::PrettyFormatter::with_indent(&indent);
        let mut buf = Vec::new();
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.serialize(&mut ser)?;
        // serde_json only ever writes valid UTF-8
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }

    /// Write the record to `path`, creating parent directories as needed.
    pub fn save(&self, path: &Path, indent: usize) -> crate::Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, self.to_json_pretty(indent)?)?;
        Ok(())
    }

    /// Load a previously saved record.
    pub fn from_file(path: &Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}
