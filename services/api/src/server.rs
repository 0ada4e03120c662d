use crate::cli::ServeArgs;
use crate::infra::{load_question_bank, AppState, InMemorySessionRepository};
use crate::routes::with_advisor_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use benefit_advisor::advisor::{AdvisorService, DemographicPriors};
use benefit_advisor::config::AppConfig;
use benefit_advisor::error::AppError;
use benefit_advisor::telemetry;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let bank = Arc::new(load_question_bank(&config.advisor)?);
    let priors = Arc::new(DemographicPriors::new(config.advisor.config.priors.clone()));
    let repository = Arc::new(InMemorySessionRepository::default());
    let advisor_service = Arc::new(AdvisorService::new(
        repository,
        priors,
        bank.clone(),
        config.advisor.config.clone(),
    ));

    let app = with_advisor_routes(advisor_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        questions = bank.len(),
        max_questions = config.advisor.config.stopping.max_questions,
        "benefit advisor ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
