use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use credit_wizard::wizard::{
    wizard_router, ApplicationSubmitter, KeyValueStore, WizardSession, CREDIT_PURPOSES,
};
use serde_json::json;
use std::sync::Arc;

pub(crate) fn with_wizard_routes<S, T>(session: Arc<WizardSession<S, T>>) -> axum::Router
where
    S: KeyValueStore + 'static,
    T: ApplicationSubmitter + 'static,
{
    wizard_router(session)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
        .route(
            "/api/v1/wizard/purposes",
            axum::routing::get(purposes_endpoint),
        )
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

/// Loan purposes offered by the credit step's picker.
pub(crate) async fn purposes_endpoint() -> Json<serde_json::Value> {
    Json(json!({ "purposes": CREDIT_PURPOSES }))
}
