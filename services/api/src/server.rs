use crate::cli::ServeArgs;
use crate::commands::WizardArgs;
use crate::infra::{open_wizard, AppState, OutboxSubmitter};
use crate::routes::with_wizard_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use credit_wizard::error::AppError;
use credit_wizard::telemetry;
use credit_wizard::wizard::WizardSession;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs, wizard_args: WizardArgs) -> Result<(), AppError> {
    let mut config = wizard_args.config()?;

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

    let session = Arc::new(WizardSession::new(
        open_wizard(&config),
        Arc::new(OutboxSubmitter::for_config(&config)),
    ));

    let app = with_wizard_routes(session)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        storage = %config.storage.directory.display(),
        policy = %config.wizard.advance_policy,
        "credit application wizard service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
