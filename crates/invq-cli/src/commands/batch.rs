//! Batch processing command for multiple invoice documents.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, error, warn};

use invq_core::models::config::InvqConfig;
use invq_core::models::invoice::fields;
use invq_core::ocr::engine_from_config;
use invq_core::pages::DocumentKind;
use invq_core::{GeminiClient, InvoicePipeline, PageExtractor, ProcessedInvoice};

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Glob pattern matching the input documents
    #[arg(required = true)]
    input: String,

    /// Output directory (default: directory of output.path from config)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Also generate a summary CSV
    #[arg(long)]
    summary: bool,

    /// Continue on error
    #[arg(long)]
    continue_on_error: bool,
}

/// Result of processing a single document.
struct ProcessResult {
    path: PathBuf,
    processed: Option<ProcessedInvoice>,
    error: Option<String>,
    processing_time_ms: u64,
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = super::load_config(config_path)?;

    let files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| p.is_file() && DocumentKind::from_path(p).is_some())
        .collect();

    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    println!(
        "{} Found {} files to process",
        style("ℹ").blue(),
        files.len()
    );

    let output_dir = args.output_dir.clone().unwrap_or_else(|| {
        config
            .output
            .path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."))
    });
    fs::create_dir_all(&output_dir)?;

    let ocr = engine_from_config(&config.ocr)?;
    let extractor = PageExtractor::new(ocr, config.pdf.clone());
    let model = GeminiClient::for_extraction(&config)?;
    let pipeline = InvoicePipeline::new(model).with_concurrency(config.llm.concurrency);

    let overall_pb = ProgressBar::new(files.len() as u64);
    overall_pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")?
            .progress_chars("=>-"),
    );

    let mut results = Vec::with_capacity(files.len());

    let names = output_names(&files);
    for (path, name) in files.into_iter().zip(names) {
        let file_start = Instant::now();
        let output_path = output_dir.join(name);
        let result = process_single_file(&path, &extractor, &pipeline, &output_path, &config).await;
        let processing_time_ms = file_start.elapsed().as_millis() as u64;

        match result {
            Ok(processed) => {
                results.push(ProcessResult {
                    path,
                    processed: Some(processed),
                    error: None,
                    processing_time_ms,
                });
            }
            Err(e) => {
                let error_msg = e.to_string();
                if args.continue_on_error {
                    warn!("Failed to process {}: {}", path.display(), error_msg);
                    results.push(ProcessResult {
                        path,
                        processed: None,
                        error: Some(error_msg),
                        processing_time_ms,
                    });
                } else {
                    overall_pb.abandon();
                    error!("Failed to process {}: {}", path.display(), error_msg);
                    anyhow::bail!("Processing failed: {}", error_msg);
                }
            }
        }

        overall_pb.inc(1);
    }

    overall_pb.finish_with_message("Complete");

    if args.summary {
        let summary_path = output_dir.join("summary.csv");
        write_summary(&summary_path, &results)?;
        println!(
            "{} Summary written to {}",
            style("✓").green(),
            summary_path.display()
        );
    }

    let successful = results.iter().filter(|r| r.processed.is_some()).count();
    let failed: Vec<_> = results.iter().filter(|r| r.error.is_some()).collect();

    println!();
    println!(
        "{} Processed {} files in {:?}",
        style("✓").green(),
        results.len(),
        start.elapsed()
    );
    println!(
        "   {} successful, {} failed",
        style(successful).green(),
        style(failed.len()).red()
    );

    if !failed.is_empty() {
        println!();
        println!("{}", style("Failed files:").red());
        for result in &failed {
            println!(
                "  - {}: {}",
                result.path.display(),
                result.error.as_deref().unwrap_or("unknown error")
            );
        }
    }

    Ok(())
}

async fn process_single_file(
    path: &Path,
    extractor: &PageExtractor,
    pipeline: &InvoicePipeline<GeminiClient>,
    output_path: &Path,
    config: &InvqConfig,
) -> anyhow::Result<ProcessedInvoice> {
    let pages = extractor.extract(path)?;
    if pages.is_empty() {
        anyhow::bail!("No pages found");
    }

    let processed = pipeline.process(&pages).await?;

    processed.invoice.save(output_path, config.output.indent)?;
    debug!("Wrote output to {}", output_path.display());

    Ok(processed)
}

/// Output file name for each input: `<stem>.json`, or `<file name>.json`
/// when another input shares the stem.
fn output_names(files: &[PathBuf]) -> Vec<String> {
    let stem = |path: &PathBuf| {
        path.file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "invoice".to_string())
    };

    let mut stem_counts: HashMap<String, usize> = HashMap::new();
    for path in files {
        *stem_counts.entry(stem(path)).or_default() += 1;
    }

    files
        .iter()
        .map(|path| {
            let stem = stem(path);
            if stem_counts[&stem] > 1 {
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or(stem);
                warn!("Several inputs share the name of {}, writing {}.json", path.display(), name);
                format!("{}.json", name)
            } else {
                format!("{}.json", stem)
            }
        })
        .collect()
}

fn write_summary(path: &Path, results: &[ProcessResult]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    wtr.write_record([
        "filename",
        "status",
        "invoice_number",
        "total_amount_after_gst",
        "items",
        "pages_merged",
        "pages_skipped",
        "processing_time_ms",
        "error",
    ])?;

    for result in results {
        let filename = result
            .path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("");

        if let Some(processed) = &result.processed {
            let invoice = &processed.invoice;
            wtr.write_record([
                filename,
                "success",
                &invoice.text(fields::INVOICE_NUMBER).unwrap_or_default(),
                &invoice.text(fields::TOTAL_AMOUNT_AFTER_GST).unwrap_or_default(),
                &invoice.items().len().to_string(),
                &processed.audit.pages_merged().len().to_string(),
                &processed.audit.pages_skipped().len().to_string(),
                &result.processing_time_ms.to_string(),
                "",
            ])?;
        } else {
            wtr.write_record([
                filename,
                "error",
                "",
                "",
                "",
                "",
                "",
                &result.processing_time_ms.to_string(),
                result.error.as_deref().unwrap_or(""),
            ])?;
        }
    }

    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_names_keep_stem_when_unique() {
        let files = vec![PathBuf::from("in/a.pdf"), PathBuf::from("in/b.png")];
        assert_eq!(output_names(&files), ["a.json", "b.json"]);
    }

    #[test]
    fn test_output_names_disambiguate_shared_stem() {
        let files = vec![
            PathBuf::from("in/a.pdf"),
            PathBuf::from("in/a.png"),
            PathBuf::from("in/c.pdf"),
        ];
        assert_eq!(output_names(&files), ["a.pdf.json", "a.png.json", "c.json"]);
    }
}
