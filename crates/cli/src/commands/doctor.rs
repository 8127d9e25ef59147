//! `agentlab doctor`: check that the configured backends are reachable.

use agentlab_core::memory::HistoryStore;
use agentlab_core::message::SessionId;
use agentlab_core::provider::Generator;

use super::runtime;

/// Outcome of one diagnostic check.
#[derive(Debug, PartialEq)]
enum Check {
    Pass(String),
    Fail(String),
}

impl Check {
    fn report(&self) -> bool {
        match self {
            Check::Pass(msg) => {
                println!("  ✅ {msg}");
                true
            }
            Check::Fail(msg) => {
                println!("  ❌ {msg}");
                false
            }
        }
    }
}

async fn check_generator(generator: &dyn Generator) -> Check {
    let who = format!("{} ({})", generator.name(), generator.model());
    match generator.health_check().await {
        Ok(true) => Check::Pass(format!("Generator {who} reachable")),
        Ok(false) => Check::Fail(format!("Generator {who} answered but reported unhealthy")),
        Err(e) => Check::Fail(format!("Generator {who} unreachable: {e}")),
    }
}

async fn check_history(store: &dyn HistoryStore) -> Check {
    match store.recent(&SessionId::from("doctor"), 1).await {
        Ok(_) => Check::Pass(format!("History store '{}' readable", store.name())),
        Err(e) => Check::Fail(format!("History store '{}' unreadable: {e}", store.name())),
    }
}

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    println!("agentlab doctor");
    println!("===============\n");

    let mut issues = 0;

    let config = match runtime::load_config() {
        Ok(config) => {
            println!("  ✅ Config valid");
            config
        }
        Err(e) => {
            println!("  ❌ {e}");
            println!("\n  1 issue found; later checks need a valid config.");
            return Ok(());
        }
    };

    let generator_check = match agentlab_providers::build_from_config(&config) {
        Ok(generator) => check_generator(generator.as_ref()).await,
        Err(e) => Check::Fail(format!("Generator not configured: {e}")),
    };
    if !generator_check.report() {
        issues += 1;
    }

    let history_check = match runtime::open_history(&config).await {
        Ok(store) => check_history(store.as_ref()).await,
        Err(e) => Check::Fail(format!("History store failed to open: {e}")),
    };
    if !history_check.report() {
        issues += 1;
    }

    println!();
    if issues == 0 {
        println!("  All checks passed.");
    } else {
        println!("  {issues} issue(s) found. See above for details.");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentlab_core::error::ProviderError;
    use agentlab_memory::InMemoryHistory;

    struct Backend(Result<bool, ProviderError>);

    #[async_trait::async_trait]
    impl Generator for Backend {
        fn name(&self) -> &str {
            "ollama"
        }
        fn model(&self) -> &str {
            "llama3.1:latest"
        }
        async fn generate(&self, _prompt: &str) -> Result<String, ProviderError> {
            Ok(String::new())
        }
        async fn health_check(&self) -> Result<bool, ProviderError> {
            self.0.clone()
        }
    }

    #[tokio::test]
    async fn healthy_generator_passes() {
        let check = check_generator(&Backend(Ok(true))).await;
        assert_eq!(check, Check::Pass("Generator ollama (llama3.1:latest) reachable".into()));
    }

    #[tokio::test]
    async fn unhealthy_generator_fails() {
        assert!(matches!(check_generator(&Backend(Ok(false))).await, Check::Fail(_)));
    }

    #[tokio::test]
    async fn unreachable_generator_reports_the_error() {
        let check = check_generator(&Backend(Err(ProviderError::Network("connection refused".into())))).await;
        match check {
            Check::Fail(msg) => assert!(msg.contains("connection refused")),
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn readable_history_passes() {
        let check = check_history(&InMemoryHistory::new()).await;
        assert_eq!(check, Check::Pass("History store 'in_memory' readable".into()));
    }
}
