//! Language model access: the model seam, a Gemini client, prompts and retries.

mod gemini;
pub mod prompt;
mod retry;

pub use gemini::GeminiClient;
pub use retry::RetryPolicy;

use crate::error::LlmError;

/// Result type for language model operations.
pub type Result<T> = std::result::Result<T, LlmError>;

/// A text-in, text-out language model.
#[allow(async_fn_in_trait)]
pub trait LanguageModel {
    /// Send a prompt and return the model's text response.
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Model name, for logging.
    fn name(&self) -> &str;
}
