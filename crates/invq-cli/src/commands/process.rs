//! Process command - extract and merge a single invoice document.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use invq_core::models::config::InvqConfig;
use invq_core::ocr::engine_from_config;
use invq_core::{
    validate, GeminiClient, InvoiceContext, InvoicePipeline, PageExtractor, ProcessedInvoice,
    QueryAnswerer,
};

use super::output::{self, OutputFormat};

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// Input file (PDF or image) or a directory of page files
    #[arg(required = true)]
    input: PathBuf,

    /// Where to write the merged JSON (default: output.path from config)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Format printed to stdout
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Validate extracted data
    #[arg(long)]
    validate: bool,

    /// Also write a per-page audit next to the output
    #[arg(long)]
    audit: bool,

    /// Ask a question about the invoice once it is merged
    #[arg(long)]
    ask: Option<String>,

    /// Skip OCR and use only PDF text layers
    #[arg(long)]
    text_only: bool,
}

pub async fn run(args: ProcessArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = super::load_config(config_path)?;

    if !args.input.exists() {
        anyhow::bail!("Input not found: {}", args.input.display());
    }

    info!("Processing: {}", args.input.display());

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")?);
    pb.enable_steady_tick(Duration::from_millis(120));

    let processed = match extract_and_merge(&args, &config, &pb).await {
        Ok(processed) => processed,
        Err(e) => {
            pb.finish_and_clear();
            return Err(e);
        }
    };
    pb.finish_and_clear();

    let output_path = args.output.clone().unwrap_or_else(|| config.output.path.clone());
    processed.invoice.save(&output_path, config.output.indent)?;
    eprintln!(
        "{} Output written to {}",
        style("✓").green(),
        output_path.display()
    );

    output::print_audit(&processed.audit);
    if args.audit {
        let source = args.input.display().to_string();
        let audit_path = output::write_audit(&output_path, &source, &processed.audit)?;
        eprintln!(
            "{} Audit written to {}",
            style("✓").green(),
            audit_path.display()
        );
    }

    if args.validate {
        let issues = validate(&processed.invoice);
        if !issues.is_empty() {
            eprintln!("{}", style("Validation issues:").yellow());
            for issue in &issues {
                eprintln!("  - {}", issue);
            }
        }
    }

    println!(
        "{}",
        output::format_invoice(&processed.invoice, args.format, config.output.indent)?
    );

    if let Some(question) = &args.ask {
        let model = GeminiClient::for_chat(&config)?;
        let context = InvoiceContext::new(processed.invoice)?;
        let answer = QueryAnswerer::new(model).ask(&context, question).await?;
        println!();
        println!("{} {}", style("Q:").bold(), question.trim());
        println!("{} {}", style("A:").bold(), answer);
    }

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}

async fn extract_and_merge(
    args: &ProcessArgs,
    config: &InvqConfig,
    pb: &ProgressBar,
) -> anyhow::Result<ProcessedInvoice> {
    pb.set_message("Loading OCR models...");
    let ocr = if args.text_only {
        None
    } else {
        engine_from_config(&config.ocr)?
    };
    let extractor = PageExtractor::new(ocr, config.pdf.clone());

    pb.set_message("Extracting page text...");
    let pages = extractor.extract(&args.input)?;
    if pages.is_empty() {
        anyhow::bail!("No pages found in {}", args.input.display());
    }

    pb.set_message(format!("Extracting fields from {} pages...", pages.len()));
    let model = GeminiClient::for_extraction(config)?;
    let pipeline = InvoicePipeline::new(model).with_concurrency(config.llm.concurrency);

    Ok(pipeline.process(&pages).await?)
}
