//! Merge command - combine already extracted page records offline.

use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use console::style;
use serde_json::Value;

use invq_core::{merge_pages, PageOutcome, PageRecords};

/// Arguments for the merge command.
#[derive(Args)]
pub struct MergeArgs {
    /// JSON object mapping page numbers to page records
    #[arg(required = true)]
    input: PathBuf,

    /// Where to write the merged JSON (default: output.path from config)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

pub async fn run(args: MergeArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = super::load_config(config_path)?;

    let content = fs::read_to_string(&args.input)
        .with_context(|| format!("Failed to read {}", args.input.display()))?;
    let records = parse_page_records(serde_json::from_str(&content)?)?;

    let report = merge_pages(&records)?;

    for (page, outcome) in &report.pages {
        match outcome {
            PageOutcome::Merged { items_added, fields_filled, note } => {
                let mut line = format!("page {}: {} items", page, items_added);
                if !fields_filled.is_empty() {
                    line.push_str(&format!(", filled {}", fields_filled.join(", ")));
                }
                if let Some(note) = note {
                    line.push_str(&format!(" ({})", note));
                }
                eprintln!("  {} {}", style("✓").green(), line);
            }
            PageOutcome::Skipped(reason) => {
                eprintln!("  {} page {}: skipped, {}", style("!").yellow(), page, reason);
            }
        }
    }

    let output_path = args.output.unwrap_or_else(|| config.output.path.clone());
    report.invoice.save(&output_path, config.output.indent)?;
    println!(
        "{} Merged {} pages into {}",
        style("✓").green(),
        report.merged_pages().len(),
        output_path.display()
    );

    Ok(())
}

/// Turn `{"1": {...}, "2": [...]}` into page records.
fn parse_page_records(value: Value) -> anyhow::Result<PageRecords> {
    let Value::Object(map) = value else {
        anyhow::bail!("Expected a JSON object keyed by page number");
    };

    let mut records = PageRecords::new();
    for (key, record) in map {
        let page: u32 = key
            .trim()
            .parse()
            .with_context(|| format!("Invalid page number: {:?}", key))?;
        if records.insert(page, record).is_some() {
            anyhow::bail!("Duplicate page number {} (key {:?})", page, key);
        }
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_page_records_orders_numerically() {
        let records = parse_page_records(json!({"10": [], "2": [], "1": {}})).unwrap();
        assert_eq!(records.keys().copied().collect::<Vec<_>>(), vec![1, 2, 10]);
    }

    #[test]
    fn test_parse_page_records_rejects_bad_input() {
        assert!(parse_page_records(json!({"first": {}})).is_err());
        assert!(parse_page_records(json!([{}])).is_err());
    }

    #[test]
    fn test_parse_page_records_rejects_duplicate_pages() {
        let err = parse_page_records(json!({"1": {"cgst": 1}, "01": {"cgst": 2}})).unwrap_err();
        assert!(err.to_string().contains("Duplicate page number 1"));
    }
}
