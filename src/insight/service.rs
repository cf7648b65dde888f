//! Insight generation service: memoization, single-flight, timeout,
//! and the deterministic fallback contract.
//!
//! One entry per patient id. An in-flight entry is shared by every
//! concurrent requester — at most one model call per key. Model-backed
//! responses are cached for the process lifetime; fallback results are
//! delivered to the waiters but the entry is evicted, so a later request
//! retries the model instead of being stuck on a failure.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, Mutex};

use crate::models::{MasterAIResponse, Patient};

use super::fallback::build_fallback;
use super::parser::parse_insight_response;
use super::prompt::{build_insight_prompt, insight_system_prompt};
use super::types::LlmClient;
use super::InsightError;

type Shared = Arc<MasterAIResponse>;

enum Slot {
    InFlight(watch::Receiver<Option<Shared>>),
    Ready(Shared),
}

enum Claim {
    Ready(Shared),
    Wait(watch::Receiver<Option<Shared>>),
    Claimed(watch::Sender<Option<Shared>>),
}

/// Keyed insight store. Injected into the service at construction so
/// tests get a fresh cache per run — never a module-level singleton.
pub struct InsightCache {
    slots: Mutex<HashMap<String, Slot>>,
}

impl InsightCache {
    pub fn new() -> Self {
        Self { slots: Mutex::new(HashMap::new()) }
    }

    /// Claim the slot for a patient id: a cached response, an in-flight
    /// receiver to wait on, or ownership of a fresh in-flight entry.
    async fn claim(&self, patient_id: &str) -> Claim {
        let mut slots = self.slots.lock().await;
        match slots.get(patient_id) {
            Some(Slot::Ready(response)) => Claim::Ready(response.clone()),
            Some(Slot::InFlight(rx)) => Claim::Wait(rx.clone()),
            None => {
                let (tx, rx) = watch::channel(None);
                slots.insert(patient_id.to_string(), Slot::InFlight(rx));
                Claim::Claimed(tx)
            }
        }
    }

    /// Record a model-backed response for future requests.
    async fn resolve_model(&self, patient_id: &str, response: Shared) {
        let mut slots = self.slots.lock().await;
        slots.insert(patient_id.to_string(), Slot::Ready(response));
    }

    /// Evict the entry after a failed generation so the next request
    /// can retry rather than replaying a stale rejection.
    async fn evict(&self, patient_id: &str) {
        let mut slots = self.slots.lock().await;
        slots.remove(patient_id);
    }

    pub async fn cached_count(&self) -> usize {
        let slots = self.slots.lock().await;
        slots
            .values()
            .filter(|slot| matches!(slot, Slot::Ready(_)))
            .count()
    }
}

impl Default for InsightCache {
    fn default() -> Self {
        Self::new()
    }
}

/// The reconciliation layer: model call, schema repair, fallback.
pub struct InsightService {
    client: Arc<dyn LlmClient>,
    model: String,
    timeout: Duration,
    cache: InsightCache,
}

impl InsightService {
    pub fn new(
        client: Arc<dyn LlmClient>,
        model: impl Into<String>,
        timeout: Duration,
        cache: InsightCache,
    ) -> Self {
        Self { client, model: model.into(), timeout, cache }
    }

    /// Get insights for a patient. Total: always returns a fully-shaped
    /// response; failures degrade to the deterministic fallback.
    pub async fn get_insights(&self, patient: &Patient) -> Shared {
        match self.cache.claim(&patient.patient_id).await {
            Claim::Ready(response) => response,
            Claim::Wait(rx) => self.await_in_flight(rx, patient).await,
            Claim::Claimed(tx) => self.generate_and_resolve(tx, patient).await,
        }
    }

    /// Wait on another requester's in-flight generation.
    async fn await_in_flight(
        &self,
        mut rx: watch::Receiver<Option<Shared>>,
        patient: &Patient,
    ) -> Shared {
        loop {
            if let Some(response) = rx.borrow_and_update().as_ref() {
                return response.clone();
            }
            if rx.changed().await.is_err() {
                // The generating task died without resolving; degrade
                // locally rather than propagating its failure.
                tracing::warn!(patient_id = %patient.patient_id, "In-flight insight entry dropped");
                return Arc::new(build_fallback(patient));
            }
        }
    }

    /// Run one generation, publish the result to all waiters, and settle
    /// the cache slot. Resolution happens exactly once — a late model
    /// result cannot overwrite it.
    async fn generate_and_resolve(
        &self,
        tx: watch::Sender<Option<Shared>>,
        patient: &Patient,
    ) -> Shared {
        let response = match self.generate_via_model(patient).await {
            Ok(response) => {
                let shared = Arc::new(response);
                self.cache
                    .resolve_model(&patient.patient_id, shared.clone())
                    .await;
                shared
            }
            Err(error) => {
                tracing::warn!(
                    patient_id = %patient.patient_id,
                    error = %error,
                    "Insight generation failed; serving deterministic fallback"
                );
                self.cache.evict(&patient.patient_id).await;
                Arc::new(build_fallback(patient))
            }
        };
        let _ = tx.send(Some(response.clone()));
        response
    }

    /// One bounded model round-trip: blocking HTTP on the blocking pool,
    /// cancelled past the timeout, then schema validation and repair.
    async fn generate_via_model(
        &self,
        patient: &Patient,
    ) -> Result<MasterAIResponse, InsightError> {
        let system = insight_system_prompt();
        let prompt = build_insight_prompt(patient);
        let client = self.client.clone();
        let model = self.model.clone();

        let call =
            tokio::task::spawn_blocking(move || client.generate(&model, &prompt, &system));
        let raw = match tokio::time::timeout(self.timeout, call).await {
            Ok(Ok(result)) => result?,
            Ok(Err(join_error)) => {
                return Err(InsightError::HttpClient(format!(
                    "generation task failed: {join_error}"
                )))
            }
            Err(_) => return Err(InsightError::Timeout(self.timeout.as_secs())),
        };

        parse_insight_response(&raw, patient)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::insight::types::MockLlmClient;
    use crate::models::InsightSource;

    fn valid_model_json() -> String {
        r#"{
            "sidebar_summary": "Model summary.",
            "safety_flags": {
                "renal": {"status": "safe", "detail": "eGFR normal"}
            },
            "investigations": {"labs_summary": "Labs quiet."}
        }"#
        .to_string()
    }

    fn service_with(client: MockLlmClient, timeout: Duration) -> (InsightService, Arc<MockLlmClient>) {
        let client = Arc::new(client);
        let service = InsightService::new(
            client.clone(),
            "mock-model",
            timeout,
            InsightCache::new(),
        );
        (service, client)
    }

    #[tokio::test]
    async fn model_response_is_served_and_cached() {
        let (service, client) =
            service_with(MockLlmClient::new(&valid_model_json()), Duration::from_secs(5));
        let patient = Patient::empty("PT-001");

        let first = service.get_insights(&patient).await;
        assert_eq!(first.source, InsightSource::Model);
        assert_eq!(first.sidebar_summary, "Model summary.");

        let second = service.get_insights(&patient).await;
        assert_eq!(client.call_count(), 1, "cached response must not re-call the model");
        assert_eq!(first, second);
        assert_eq!(service.cache.cached_count().await, 1);
    }

    #[tokio::test]
    async fn failure_degrades_to_deterministic_fallback() {
        let (service, _) =
            service_with(MockLlmClient::failing("connection refused"), Duration::from_secs(5));
        let patient = Patient::empty("PT-001");

        let insight = service.get_insights(&patient).await;
        assert_eq!(insight.source, InsightSource::Deterministic);
        assert_eq!(*insight, build_fallback(&patient));
    }

    #[tokio::test]
    async fn malformed_model_output_falls_back() {
        let (service, _) =
            service_with(MockLlmClient::new("I'd rather chat about the weather."), Duration::from_secs(5));
        let patient = Patient::empty("PT-001");

        let insight = service.get_insights(&patient).await;
        assert_eq!(insight.source, InsightSource::Deterministic);
    }

    #[tokio::test]
    async fn failed_entry_is_evicted_for_retry() {
        let (service, client) =
            service_with(MockLlmClient::failing("boom"), Duration::from_secs(5));
        let patient = Patient::empty("PT-001");

        let _ = service.get_insights(&patient).await;
        let _ = service.get_insights(&patient).await;
        assert_eq!(client.call_count(), 2, "a failed entry must not pin the failure");
        assert_eq!(service.cache.cached_count().await, 0);
    }

    #[tokio::test]
    async fn timeout_serves_fallback() {
        let slow = MockLlmClient::new(&valid_model_json()).with_delay(Duration::from_millis(250));
        let (service, _) = service_with(slow, Duration::from_millis(20));
        let patient = Patient::empty("PT-001");

        let insight = service.get_insights(&patient).await;
        assert_eq!(insight.source, InsightSource::Deterministic);
    }

    #[tokio::test]
    async fn concurrent_requests_share_one_model_call() {
        let slow = MockLlmClient::new(&valid_model_json()).with_delay(Duration::from_millis(100));
        let (service, client) = service_with(slow, Duration::from_secs(5));
        let patient = Patient::empty("PT-001");

        let (a, b) = tokio::join!(service.get_insights(&patient), service.get_insights(&patient));
        assert_eq!(client.call_count(), 1, "concurrent callers must share one in-flight call");
        assert_eq!(a, b);
        assert_eq!(a.source, InsightSource::Model);
    }

    #[tokio::test]
    async fn distinct_patients_do_not_share_entries() {
        let (service, client) =
            service_with(MockLlmClient::new(&valid_model_json()), Duration::from_secs(5));
        let first = Patient::empty("PT-001");
        let second = Patient::empty("PT-002");

        let a = service.get_insights(&first).await;
        let b = service.get_insights(&second).await;
        assert_eq!(client.call_count(), 2);
        assert_eq!(a.patient_id, "PT-001");
        assert_eq!(b.patient_id, "PT-002");
    }

    #[tokio::test]
    async fn fallback_totality_on_fully_empty_patient() {
        let (service, _) = service_with(MockLlmClient::failing("down"), Duration::from_secs(5));
        let patient = Patient::empty("PT-empty");

        let insight = service.get_insights(&patient).await;
        assert!(!insight.sidebar_summary.is_empty());
        assert_eq!(insight.investigations.pathology_deltas, None);
        assert_eq!(insight.safety_flags.renal.display_label(), "Not documented");
        assert_eq!(insight.safety_flags.liver.display_label(), "Not documented");
        assert_eq!(insight.safety_flags.hematology.display_label(), "Not documented");
    }
}
