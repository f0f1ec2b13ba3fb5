//! Ask command - one question about a merged invoice.

use std::path::PathBuf;

use clap::Args;

use invq_core::{GeminiClient, InvoiceContext, QueryAnswerer};

/// Arguments for the ask command.
#[derive(Args)]
pub struct AskArgs {
    /// Merged invoice JSON
    #[arg(required = true)]
    invoice: PathBuf,

    /// Question about the invoice
    #[arg(required = true)]
    question: String,
}

pub async fn run(args: AskArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = super::load_config(config_path)?;

    if args.question.trim().is_empty() {
        anyhow::bail!("Question is empty");
    }

    let context = InvoiceContext::from_file(&args.invoice)?;
    let answerer = QueryAnswerer::new(GeminiClient::for_chat(&config)?);

    let answer = answerer.ask(&context, &args.question).await?;
    println!("{}", answer);

    Ok(())
}
