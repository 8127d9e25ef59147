//! Shared test helpers for controller tests.

use agentlab_core::error::ProviderError;
use agentlab_core::provider::Generator;
use std::sync::Mutex;

/// A generator that returns a sequence of scripted outputs.
///
/// Each call to `generate` returns the next output in the queue and records
/// the prompt it was given. Panics if more calls are made than outputs
/// provided.
pub struct ScriptedGenerator {
    outputs: Mutex<Vec<Result<String, ProviderError>>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedGenerator {
    pub fn new(outputs: &[&str]) -> Self {
        Self::with_results(outputs.iter().map(|o| Ok(o.to_string())).collect())
    }

    pub fn with_results(outputs: Vec<Result<String, ProviderError>>) -> Self {
        Self {
            outputs: Mutex::new(outputs),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// A generator that always returns `output`, for up to `times` calls.
    pub fn repeating(output: &str, times: usize) -> Self {
        Self::new(&vec![output; times])
    }

    pub fn call_count(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    /// Every prompt received, in call order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Generator for ScriptedGenerator {
    fn name(&self) -> &str {
        "scripted"
    }

    fn model(&self) -> &str {
        "scripted-model"
    }

    async fn generate(&self, prompt: &str) -> Result<String, ProviderError> {
        let mut prompts = self.prompts.lock().unwrap();
        let mut outputs = self.outputs.lock().unwrap();
        if prompts.len() >= outputs.len() {
            panic!(
                "ScriptedGenerator: no more outputs (call #{}, have {})",
                prompts.len(),
                outputs.len()
            );
        }
        let index = prompts.len();
        prompts.push(prompt.to_string());
        std::mem::replace(&mut outputs[index], Ok(String::new()))
    }
}
