//! Locating and parsing the fenced JSON block in a model response.

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;

use crate::error::ExtractionError;

lazy_static! {
    /// First fenced block holding a JSON object or array.
    static ref FENCED_JSON: Regex =
        Regex::new(r"(?s)```(?:json)?\s*(\{.*?\}|\[.*?\])\s*```").unwrap();
}

/// Extract the JSON value from the first fenced block in `raw`.
pub fn parse_json_block(raw: &str) -> Result<Value, ExtractionError> {
    let caps = FENCED_JSON
        .captures(raw)
        .ok_or(ExtractionError::NoJsonBlock)?;

    serde_json::from_str(&caps[1]).map_err(|e| ExtractionError::InvalidJson(e.to_string()))
}
