use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use benefit_advisor::advisor::{
    advisor_router, AdvisorService, BenefitCategory, PriorsProvider, SessionRepository,
};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;

#[derive(Debug, Clone, Serialize)]
pub(crate) struct QuestionBankSummary {
    pub(crate) questions: usize,
    pub(crate) categories: Vec<&'static str>,
    pub(crate) max_questions: u32,
    pub(crate) min_questions: u32,
}

pub(crate) fn with_advisor_routes<R, P>(service: Arc<AdvisorService<R, P>>) -> axum::Router
where
    R: SessionRepository + 'static,
    P: PriorsProvider + 'static,
{
    let summary = Arc::new(bank_summary(&service));
    advisor_router(service)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
        .route(
            "/api/v1/advisor/questions",
            axum::routing::get(move || question_bank_endpoint(summary.clone())),
        )
}

fn bank_summary<R, P>(service: &AdvisorService<R, P>) -> QuestionBankSummary
where
    R: SessionRepository + 'static,
    P: PriorsProvider + 'static,
{
    QuestionBankSummary {
        questions: service.bank().len(),
        categories: BenefitCategory::ALL.iter().map(|category| category.key()).collect(),
        max_questions: service.config().stopping.max_questions,
        min_questions: service.config().stopping.min_questions,
    }
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

pub(crate) async fn question_bank_endpoint(
    summary: Arc<QuestionBankSummary>,
) -> Json<QuestionBankSummary> {
    Json(summary.as_ref().clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::InMemorySessionRepository;
    use axum::body::Body;
    use axum::http::Request;
    use benefit_advisor::advisor::{AdvisorConfig, DemographicPriors, QuestionBank};
    use tower::ServiceExt;

    fn router() -> axum::Router {
        let service = Arc::new(AdvisorService::new(
            Arc::new(InMemorySessionRepository::default()),
            Arc::new(DemographicPriors::default()),
            Arc::new(QuestionBank::standard()),
            AdvisorConfig::default(),
        ));
        with_advisor_routes(service)
    }

    #[tokio::test]
    async fn healthcheck_reports_ok() {
        let Json(body) = healthcheck().await;
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn question_bank_route_summarizes_the_bank() {
        let response = router()
            .oneshot(
                Request::builder()
                    .uri("/api/v1/advisor/questions")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .expect("route executes");

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), 1 << 16)
            .await
            .expect("read body");
        let payload: serde_json::Value = serde_json::from_slice(&body).expect("json payload");
        assert_eq!(payload["questions"], 10);
        assert_eq!(payload["categories"].as_array().unwrap().len(), 17);
    }

    #[tokio::test]
    async fn advisor_routes_are_mounted() {
        let response = router()
            .oneshot(
                Request::builder()
                    .uri("/api/v1/advisor/sessions/ses-unknown")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .expect("route executes");

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
