//! Free-text questions about a merged invoice.

use std::path::Path;
use std::sync::Arc;

use tracing::debug;

use crate::error::LlmError;
use crate::llm::{prompt, LanguageModel};
use crate::models::invoice::MergedInvoice;

/// A loaded invoice, shared by every question asked about it.
///
/// Cloning is cheap; the JSON sent to the model is rendered once.
#[derive(Debug, Clone)]
pub struct InvoiceContext {
    invoice: Arc<MergedInvoice>,
    json: Arc<str>,
}

impl InvoiceContext {
    /// Wrap an already merged invoice.
    pub fn new(invoice: MergedInvoice) -> crate::Result<Self> {
        let json = invoice.to_json_pretty(2)?;
        Ok(Self {
            invoice: Arc::new(invoice),
            json: json.into(),
        })
    }

    /// Load a merged invoice previously written to disk.
    pub fn from_file(path: &Path) -> crate::Result<Self> {
        Self::new(MergedInvoice::from_file(path)?)
    }

    pub fn invoice(&self) -> &MergedInvoice {
        &self.invoice
    }

    /// The invoice as it is shown to the model.
    pub fn json(&self) -> &str {
        &self.json
    }
}

/// Answers questions about an [`InvoiceContext`] with a language model.
pub struct QueryAnswerer<M> {
    model: M,
}

impl<M: LanguageModel> QueryAnswerer<M> {
    pub fn new(model: M) -> Self {
        Self { model }
    }

    /// Ask one question. Blank questions are rejected without a model call.
    pub async fn ask(&self, context: &InvoiceContext, question: &str) -> Result<String, LlmError> {
        if question.trim().is_empty() {
            return Err(LlmError::EmptyPrompt);
        }
        debug!("Asking {}: {}", self.model.name(), question.trim());

        let answer = self
            .model
            .generate(&prompt::question_prompt(context.json(), question))
            .await?;
        Ok(answer.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::cell::RefCell;

    /// Records prompts and answers with a fixed string.
    struct EchoModel {
        prompts: RefCell<Vec<String>>,
    }

    impl LanguageModel for EchoModel {
        async fn generate(&self, prompt: &str) -> crate::llm::Result<String> {
            self.prompts.borrow_mut().push(prompt.to_string());
            Ok("  The CGST is 45.  \n".to_string())
        }

        fn name(&self) -> &str {
            "echo"
        }
    }

    fn context() -> InvoiceContext {
        let value = json!({"invoice_number": "INV-7", "cgst": 45, "items": []});
        let serde_json::Value::Object(map) = value else {
            unreachable!()
        };
        InvoiceContext::new(MergedInvoice::from_map(map)).unwrap()
    }

    #[tokio::test]
    async fn test_ask_includes_invoice_and_question() {
        let answerer = QueryAnswerer::new(EchoModel {
            prompts: RefCell::new(Vec::new()),
        });
        let answer = answerer.ask(&context(), "What is the CGST?").await.unwrap();

        assert_eq!(answer, "The CGST is 45.");
        let prompts = answerer.model.prompts.borrow();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("\"invoice_number\": \"INV-7\""));
        assert!(prompts[0].contains("What is the CGST?"));
    }

    #[tokio::test]
    async fn test_blank_question_is_rejected() {
        let answerer = QueryAnswerer::new(EchoModel {
            prompts: RefCell::new(Vec::new()),
        });
        let result = answerer.ask(&context(), "   \n").await;

        assert!(matches!(result, Err(LlmError::EmptyPrompt)));
        assert!(answerer.model.prompts.borrow().is_empty());
    }

    #[test]
    fn test_context_round_trips_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("combined_output.json");
        context().invoice().save(&path, 4).unwrap();

        let loaded = InvoiceContext::from_file(&path).unwrap();
        assert_eq!(loaded.invoice(), context().invoice());
        assert_eq!(loaded.json(), context().json());
    }
}
