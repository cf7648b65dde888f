//! Dashboard API router.
//!
//! Read-only query surface for the UI layer. No auth middleware: the
//! server binds to localhost and the dashboard is single-user.
//!
//! NOTE: Path params use `:param` syntax (matchit 0.7 / axum 0.7).

use axum::routing::get;
use axum::Router;
use tower_http::cors::CorsLayer;

use super::endpoints;
use super::types::ApiContext;

/// Build the dashboard router with all query endpoints under `/api/`.
pub fn dashboard_router(ctx: ApiContext) -> Router {
    Router::new()
        .route("/api/health", get(endpoints::health::check))
        .route("/api/patients", get(endpoints::patients::list))
        .route("/api/patients/:id", get(endpoints::patients::detail))
        .route("/api/patients/:id/insights", get(endpoints::insights::generate))
        .route(
            "/api/patients/:id/pathology/comparison",
            get(endpoints::insights::pathology_comparison),
        )
        .route("/api/patients/:id/summary", get(endpoints::export::summary))
        .layer(CorsLayer::permissive())
        .with_state(ctx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::load_patients_from_str;
    use crate::insight::{InsightCache, InsightService, MockLlmClient};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use std::sync::Arc;
    use std::time::Duration;
    use tower::ServiceExt;

    fn test_router() -> Router {
        let csv = "patient_id,name,diagnosis,stage,pathology_reports_json\n\
                   PT-001,Jane Doe,NSCLC,Stage III,\"[{\"\"date\"\":\"\"2023-01-01\"\",\"\"grade\"\":\"\"2\"\",\"\"margins\"\":\"\"negative\"\"},{\"\"date\"\":\"\"2023-06-01\"\",\"\"grade\"\":\"\"3\"\",\"\"margins\"\":\"\"positive\"\"}]\"\n\
                   PT-002,John Roe,CRC,Stage II,\n";
        let registry = Arc::new(load_patients_from_str(csv).unwrap());
        let insights = Arc::new(InsightService::new(
            Arc::new(MockLlmClient::failing("offline")),
            "mock",
            Duration::from_secs(1),
            InsightCache::new(),
        ));
        dashboard_router(ApiContext::new(registry, insights))
    }

    async fn get_json(router: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = router
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, json)
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let (status, body) = get_json(test_router(), "/api/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn patient_list_has_summaries_in_source_order() {
        let (status, body) = get_json(test_router(), "/api/patients").await;
        assert_eq!(status, StatusCode::OK);
        let patients = body["patients"].as_array().unwrap();
        assert_eq!(patients.len(), 2);
        assert_eq!(patients[0]["patient_id"], "PT-001");
        assert_eq!(patients[0]["pathology_report_count"], 2);
        assert_eq!(patients[1]["name"], "John Roe");
    }

    #[tokio::test]
    async fn patient_detail_serves_the_full_record() {
        let (status, body) = get_json(test_router(), "/api/patients/PT-001").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["patient_id"], "PT-001");
        assert_eq!(body["diagnosis"]["overall_stage"], "Stage III");
        assert_eq!(body["pathology_reports"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn unknown_patient_is_404() {
        let (status, body) = get_json(test_router(), "/api/patients/PT-404").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn insights_degrade_but_always_render() {
        // The mock client is offline; the endpoint must still serve a
        // complete insight object, flagged deterministic.
        let (status, body) = get_json(test_router(), "/api/patients/PT-001/insights").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["source"], "deterministic");
        assert!(body["investigations"]["pathology_deltas"].is_array());
    }

    #[tokio::test]
    async fn pathology_comparison_returns_deltas_and_narrative() {
        let (status, body) =
            get_json(test_router(), "/api/patients/PT-001/pathology/comparison").await;
        assert_eq!(status, StatusCode::OK);
        let deltas = body["deltas"].as_array().unwrap();
        assert_eq!(deltas.len(), 2);
        assert_eq!(deltas[0]["marker"], "Grade");
        assert_eq!(deltas[0]["trend"], "worsening");
        assert!(body["narrative"].as_str().unwrap().contains("Grade"));
    }

    #[tokio::test]
    async fn summary_serves_the_export_contract() {
        let (status, body) = get_json(test_router(), "/api/patients/PT-002/summary").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["clinical_narrative"].as_str().is_some());
        assert!(body["key_risks"].is_array());
        assert!(body["recommendations"].as_array().unwrap().len() >= 1);
    }
}
