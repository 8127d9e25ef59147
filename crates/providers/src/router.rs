//! Generator selection from configuration.

use std::sync::Arc;
use std::time::Duration;
use agentlab_config::AppConfig;
use agentlab_core::error::ProviderError;
use agentlab_core::provider::Generator;
use tracing::info;

use crate::ollama::OllamaProvider;
use crate::openai_compat::OpenAiCompatProvider;

/// Build the configured generator.
pub fn build_from_config(config: &AppConfig) -> Result<Arc<dyn Generator>, ProviderError> {
    let p = &config.provider;
    let timeout = Duration::from_secs(p.timeout_secs);

    let generator: Arc<dyn Generator> = match p.kind.as_str() {
        "ollama" => Arc::new(
            OllamaProvider::new(p.api_url.as_deref(), &p.model)
                .with_temperature(p.temperature)
                .with_timeout(timeout),
        ),
        "openai_compat" => {
            let api_key = p.api_key.clone().ok_or_else(|| {
                ProviderError::NotConfigured(
                    "openai_compat requires provider.api_key or AGENTLAB_API_KEY".into(),
                )
            })?;
            let base_url = p
                .api_url
                .clone()
                .unwrap_or_else(|| "https://api.openai.com/v1".into());
            Arc::new(
                OpenAiCompatProvider::new("openai_compat", base_url, api_key, &p.model)
                    .with_temperature(p.temperature)
                    .with_timeout(timeout),
            )
        }
        other => {
            return Err(ProviderError::NotConfigured(format!(
                "unknown provider kind '{other}'"
            )));
        }
    };

    info!(provider = generator.name(), model = generator.model(), "Generator configured");
    Ok(generator)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_builds_ollama() {
        let generator = build_from_config(&AppConfig::default()).unwrap();
        assert_eq!(generator.name(), "ollama");
        assert_eq!(generator.model(), "llama3.1:latest");
    }

    #[test]
    fn openai_compat_requires_key() {
        let mut config = AppConfig::default();
        config.provider.kind = "openai_compat".into();
        config.provider.api_key = None;
        assert!(matches!(
            build_from_config(&config),
            Err(ProviderError::NotConfigured(_))
        ));

        config.provider.api_key = Some("sk-test".into());
        let generator = build_from_config(&config).unwrap();
        assert_eq!(generator.name(), "openai_compat");
    }

    #[test]
    fn unknown_kind_rejected() {
        let mut config = AppConfig::default();
        config.provider.kind = "carrier-pigeon".into();
        assert!(build_from_config(&config).is_err());
    }
}
