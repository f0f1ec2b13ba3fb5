//! Chat command - interactive questions about a merged invoice.

use std::io::Write;
use std::path::PathBuf;

use clap::Args;
use console::style;
use tokio::io::{AsyncBufReadExt, BufReader};

use invq_core::{GeminiClient, InvoiceContext, QueryAnswerer};

/// Arguments for the chat command.
#[derive(Args)]
pub struct ChatArgs {
    /// Merged invoice JSON
    #[arg(required = true)]
    invoice: PathBuf,
}

pub async fn run(args: ChatArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = super::load_config(config_path)?;

    let context = InvoiceContext::from_file(&args.invoice)?;
    let answerer = QueryAnswerer::new(GeminiClient::for_chat(&config)?);

    println!(
        "{} Loaded {} ({} line items). Type 'exit' to quit.",
        style("ℹ").blue(),
        args.invoice.display(),
        context.invoice().items().len()
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("{} ", style(">").cyan());
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let question = line.trim();
        if question.is_empty() {
            continue;
        }
        if is_exit(question) {
            break;
        }

        match answerer.ask(&context, question).await {
            Ok(answer) => println!("{}\n", answer),
            Err(e) => eprintln!("{} {}", style("✗").red(), e),
        }
    }

    Ok(())
}

fn is_exit(input: &str) -> bool {
    input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_exit() {
        assert!(is_exit("exit"));
        assert!(is_exit("QUIT"));
        assert!(!is_exit("what is the exit fee?"));
    }
}
