use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use super::InsightError;

/// LLM client abstraction (allows mocking). Implementations are blocking;
/// the insight service runs them on the blocking pool with a bounded
/// timeout.
pub trait LlmClient: Send + Sync {
    fn generate(&self, model: &str, prompt: &str, system: &str)
        -> Result<String, InsightError>;

    fn is_model_available(&self, model: &str) -> Result<bool, InsightError>;

    fn list_models(&self) -> Result<Vec<String>, InsightError>;
}

/// Mock LLM client for testing — returns a configurable response or
/// error, optionally after a delay, and counts invocations so tests can
/// assert the at-most-one-in-flight contract.
pub struct MockLlmClient {
    response: Result<String, String>,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl MockLlmClient {
    pub fn new(response: &str) -> Self {
        Self {
            response: Ok(response.to_string()),
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            response: Err(message.to_string()),
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl LlmClient for MockLlmClient {
    fn generate(
        &self,
        _model: &str,
        _prompt: &str,
        _system: &str,
    ) -> Result<String, InsightError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }
        self.response
            .clone()
            .map_err(InsightError::HttpClient)
    }

    fn is_model_available(&self, _model: &str) -> Result<bool, InsightError> {
        Ok(true)
    }

    fn list_models(&self) -> Result<Vec<String>, InsightError> {
        Ok(vec!["mock".to_string()])
    }
}
