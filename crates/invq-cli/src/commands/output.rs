//! Rendering merged invoices and audits for the terminal and disk.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use console::style;
use serde::Serialize;
use serde_json::Value;

use invq_core::invoice::{format_amount, parse_amount};
use invq_core::models::invoice::fields::{self, item};
use invq_core::{MergedInvoice, PageAudit, RunAudit};

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// CSV output, one row per line item
    Csv,
    /// Plain text summary
    Text,
}

const ITEM_COLUMNS: [&str; 9] = [
    item::SERIAL,
    item::DESCRIPTION,
    item::HSN_CODE,
    item::QUANTITY,
    item::UNIT,
    item::LIST_PRICE,
    item::DISCOUNT,
    item::PRICE,
    item::AMOUNT,
];

pub fn format_invoice(invoice: &MergedInvoice, format: OutputFormat, indent: usize) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(invoice.to_json_pretty(indent)?),
        OutputFormat::Csv => format_csv(invoice),
        OutputFormat::Text => Ok(format_text(invoice)),
    }
}

fn format_csv(invoice: &MergedInvoice) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    let mut header = vec![fields::INVOICE_NUMBER];
    header.extend(ITEM_COLUMNS);
    wtr.write_record(&header)?;

    let invoice_number = invoice.text(fields::INVOICE_NUMBER).unwrap_or_default();
    for line in invoice.items() {
        let mut row = vec![invoice_number.clone()];
        row.extend(ITEM_COLUMNS.iter().map(|key| cell(line.get(*key))));
        wtr.write_record(&row)?;
    }

    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}

/// Render a JSON value as a CSV cell.
fn cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.trim().to_string(),
        Some(other) => other.to_string(),
    }
}

fn format_text(invoice: &MergedInvoice) -> String {
    let field = |key: &str| invoice.text(key).unwrap_or_else(|| "-".to_string());
    let money = |key: &str| match invoice.get(key).and_then(parse_amount) {
        Some(amount) => format_amount(amount),
        None => "-".to_string(),
    };

    let mut output = String::new();

    output.push_str(&format!("Invoice: {}\n", field(fields::INVOICE_NUMBER)));
    output.push('\n');

    output.push_str("Seller:\n");
    output.push_str(&format!("  {}\n", field(fields::COMPANY_NAME)));
    if let Some(address) = invoice.text(fields::SELLER_ADDRESS) {
        output.push_str(&format!("  {}\n", address));
    }
    if let Some(gstin) = invoice.text(fields::SELLER_GSTIN) {
        output.push_str(&format!("  GSTIN: {}\n", gstin));
    }
    output.push('\n');

    output.push_str("Buyer:\n");
    output.push_str(&format!("  {}\n", field(fields::BUYER_NAME)));
    if let Some(address) = invoice.text(fields::BUYER_ADDRESS) {
        output.push_str(&format!("  {}\n", address));
    }
    if let Some(gstin) = invoice.text(fields::BUYER_GSTIN) {
        output.push_str(&format!("  GSTIN: {}\n", gstin));
    }
    output.push('\n');

    output.push_str(&format!("Line items: {}\n", invoice.items().len()));
    output.push('\n');

    output.push_str("Summary:\n");
    output.push_str(&format!("  Subtotal:  {}\n", money(fields::SUBTOTAL_BEFORE_GST)));
    output.push_str(&format!("  CGST:      {}\n", money(fields::CGST)));
    output.push_str(&format!("  SGST:      {}\n", money(fields::SGST)));
    output.push_str(&format!("  Total GST: {}\n", money(fields::TOTAL_GST)));
    output.push_str(&format!("  Total:     {}\n", money(fields::TOTAL_AMOUNT_AFTER_GST)));

    if let Some(bank) = invoice.get(fields::BANK_DETAILS).filter(|v| !v.is_null()) {
        let bank = match bank {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        output.push_str(&format!("\nBank details: {}\n", bank));
    }

    output
}

/// Print which pages made it into the invoice and why the others did not.
pub fn print_audit(audit: &RunAudit) {
    let merged = audit.pages_merged();
    eprintln!(
        "{} Merged {} of {} pages",
        style("ℹ").blue(),
        merged.len(),
        audit.pages.len()
    );

    for (page, entry) in &audit.pages {
        match entry {
            PageAudit::Merged { .. } => {}
            PageAudit::Skipped { reason } => {
                eprintln!("  {} page {}: skipped, {}", style("!").yellow(), page, reason);
            }
            PageAudit::Failed { failure } => {
                eprintln!("  {} page {}: {}", style("!").yellow(), page, failure);
            }
        }
    }
}

#[derive(Serialize)]
struct AuditFile<'a> {
    generated_at: DateTime<Utc>,
    source: &'a str,
    pages_merged: Vec<u32>,
    pages_skipped: Vec<u32>,
    #[serde(flatten)]
    audit: &'a RunAudit,
}

/// `<dir>/<stem>.audit.json` next to the merged output.
pub fn audit_path(output: &Path) -> PathBuf {
    let stem = output
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "invoice".to_string());
    output.with_file_name(format!("{}.audit.json", stem))
}

/// Write the audit sidecar for `output` and return its path.
pub fn write_audit(output: &Path, source: &str, audit: &RunAudit) -> anyhow::Result<PathBuf> {
    let path = audit_path(output);
    let file = AuditFile {
        generated_at: Utc::now(),
        source,
        pages_merged: audit.pages_merged(),
        pages_skipped: audit.pages_skipped(),
        audit,
    };
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(&path, serde_json::to_string_pretty(&file)?)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn invoice() -> MergedInvoice {
        let Value::Object(map) = json!({
            "invoice_number": "INV-9",
            "company_name": "Acme Traders",
            "buyer_name": "Globex",
            "cgst": "1,234.50",
            "total_gst": "18% = 270.00",
            "total_amount_after_gst": 250000,
            "items": [
                {"S.N.": 1, "description of goods": "Bolts, steel", "amount": 100},
                {"S.N.": 2, "description of goods": "Nuts", "unit": null}
            ]
        }) else {
            unreachable!()
        };
        MergedInvoice::from_map(map)
    }

    #[test]
    fn test_csv_has_row_per_item() {
        let csv = format_invoice(&invoice(), OutputFormat::Csv, 4).unwrap();
        let lines: Vec<_> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("invoice_number,S.N.,description of goods"));
        assert_eq!(lines[1], "INV-9,1,\"Bolts, steel\",,,,,,,100");
        assert_eq!(lines[2], "INV-9,2,Nuts,,,,,,,");
    }

    #[test]
    fn test_text_summary() {
        let text = format_invoice(&invoice(), OutputFormat::Text, 4).unwrap();
        assert!(text.contains("Invoice: INV-9"));
        assert!(text.contains("  Acme Traders"));
        assert!(text.contains("Line items: 2"));
        assert!(text.contains("CGST:      1,234.50"));
        assert!(text.contains("Total:     2,50,000.00"));
        assert!(text.contains("SGST:      -"));
        assert!(text.contains("Total GST: 270.00"));
    }

    #[test]
    fn test_audit_path() {
        assert_eq!(
            audit_path(Path::new("output/combined_output.json")),
            PathBuf::from("output/combined_output.audit.json")
        );
    }
}
