//! Generator trait: the abstraction over text-generation backends.
//!
//! The controller treats the generator as an opaque `prompt → text`
//! function. Its output format is unreliable, so everything downstream
//! assumes the text may be empty, prose, malformed JSON, or a valid call.
//!
//! Implementations: Ollama, OpenAI-compatible endpoints, scripted fakes.

use async_trait::async_trait;
use crate::error::ProviderError;

/// The core Generator trait.
///
/// The controller calls `generate()` once per step and awaits it before
/// building the next step; implementations should enforce their own
/// request timeout.
#[async_trait]
pub trait Generator: Send + Sync {
    /// A human-readable name for this backend (e.g., "ollama").
    fn name(&self) -> &str;

    /// The model identifier requests are sent to.
    fn model(&self) -> &str;

    /// Send the full controller prompt and get the raw completion text back.
    async fn generate(&self, prompt: &str) -> std::result::Result<String, ProviderError>;

    /// Health check: can we reach the backend?
    async fn health_check(&self) -> std::result::Result<bool, ProviderError> {
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo;

    #[async_trait]
    impl Generator for Echo {
        fn name(&self) -> &str {
            "echo"
        }
        fn model(&self) -> &str {
            "echo-1"
        }
        async fn generate(&self, prompt: &str) -> Result<String, ProviderError> {
            Ok(prompt.to_string())
        }
    }

    #[tokio::test]
    async fn default_health_check_is_ok() {
        let g = Echo;
        assert!(g.health_check().await.unwrap());
        assert_eq!(g.generate("ping").await.unwrap(), "ping");
    }
}
