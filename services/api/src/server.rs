use crate::cli::ServeArgs;
use crate::infra::{sample_register, AppState, InMemoryDocumentStore};
use crate::routes::with_analysis_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use casework_ai::config::AppConfig;
use casework_ai::error::AppError;
use casework_ai::telemetry;
use casework_ai::workflows::analysis::DocumentAnalysisService;
use casework_ai::workflows::register::CaseRegisterImporter;
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

    let documents = match args.register.take() {
        Some(path) => CaseRegisterImporter::from_path(path)?,
        None => sample_register(),
    };
    let store = Arc::new(InMemoryDocumentStore::with_documents(documents));
    let document_count = store.document_count();
    let service = Arc::new(
        DocumentAnalysisService::new(store).with_analyzer_budget(config.analysis.analyzer_budget),
    );

    let app = with_analysis_routes(service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        document_count,
        "casework analysis service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
