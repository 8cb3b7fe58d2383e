use std::sync::{Arc, Mutex, MutexGuard};

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, patch, post},
    Router,
};
use serde_json::json;

use super::domain::{SectionData, SectionName, WizardError};
use super::persistence::KeyValueStore;
use super::state::{CreditApplicationWizard, StepTransition};
use super::summary::{ApplicationSubmitter, SubmissionOutcome};

/// One wizard session shared with HTTP handlers, plus its submission transport.
pub struct WizardSession<S, T> {
    wizard: Mutex<CreditApplicationWizard<S>>,
    submitter: Arc<T>,
}

impl<S, T> WizardSession<S, T>
where
    S: KeyValueStore + 'static,
    T: ApplicationSubmitter + 'static,
{
    pub fn new(wizard: CreditApplicationWizard<S>, submitter: Arc<T>) -> Self {
        Self {
            wizard: Mutex::new(wizard),
            submitter,
        }
    }

    pub fn lock(&self) -> Result<MutexGuard<'_, CreditApplicationWizard<S>>, WizardError> {
        self.wizard
            .lock()
            .map_err(|_| WizardError::SessionUnavailable)
    }

    pub fn submitter(&self) -> &Arc<T> {
        &self.submitter
    }
}

/// Router builder exposing the wizard operations over HTTP.
pub fn wizard_router<S, T>(session: Arc<WizardSession<S, T>>) -> Router
where
    S: KeyValueStore + 'static,
    T: ApplicationSubmitter + 'static,
{
    Router::new()
        .route("/api/v1/wizard", get(state_handler::<S, T>))
        .route(
            "/api/v1/wizard/sections/:section",
            patch(update_section_handler::<S, T>),
        )
        .route(
            "/api/v1/wizard/sections/:section/validation",
            get(validation_handler::<S, T>),
        )
        .route("/api/v1/wizard/next", post(advance_handler::<S, T>))
        .route("/api/v1/wizard/back", post(retreat_handler::<S, T>))
        .route("/api/v1/wizard/reset", post(reset_handler::<S, T>))
        .route("/api/v1/wizard/summary", get(summary_handler::<S, T>))
        .route("/api/v1/wizard/submit", post(submit_handler::<S, T>))
        .with_state(session)
}

fn error_response(status: StatusCode, error: impl ToString) -> Response {
    let payload = json!({
        "error": error.to_string(),
    });
    (status, axum::Json(payload)).into_response()
}

fn wizard_error_response(error: WizardError) -> Response {
    let status = match error {
        WizardError::UnknownSection(_) => StatusCode::NOT_FOUND,
        WizardError::UnknownField { .. } | WizardError::FieldKindMismatch { .. } => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        WizardError::SessionUnavailable => StatusCode::INTERNAL_SERVER_ERROR,
    };
    error_response(status, error)
}

pub(crate) async fn state_handler<S, T>(
    State(session): State<Arc<WizardSession<S, T>>>,
) -> Response
where
    S: KeyValueStore + 'static,
    T: ApplicationSubmitter + 'static,
{
    match session.lock() {
        Ok(wizard) => {
            let payload = json!({
                "status": wizard.status(),
                "formData": wizard.state().form_data(),
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(error) => wizard_error_response(error),
    }
}

pub(crate) async fn update_section_handler<S, T>(
    State(session): State<Arc<WizardSession<S, T>>>,
    Path(section): Path<String>,
    axum::Json(partial): axum::Json<SectionData>,
) -> Response
where
    S: KeyValueStore + 'static,
    T: ApplicationSubmitter + 'static,
{
    let result = section.parse::<SectionName>().and_then(|section| {
        let mut wizard = session.lock()?;
        wizard.update_section(section, partial)
    });

    match result {
        Ok(validation) => (StatusCode::OK, axum::Json(validation)).into_response(),
        Err(error) => wizard_error_response(error),
    }
}

pub(crate) async fn validation_handler<S, T>(
    State(session): State<Arc<WizardSession<S, T>>>,
    Path(section): Path<String>,
) -> Response
where
    S: KeyValueStore + 'static,
    T: ApplicationSubmitter + 'static,
{
    let result = section
        .parse::<SectionName>()
        .and_then(|section| Ok(session.lock()?.validate(section)));

    match result {
        Ok(validation) => (StatusCode::OK, axum::Json(validation)).into_response(),
        Err(error) => wizard_error_response(error),
    }
}

fn transition_response(transition: StepTransition) -> Response {
    let status = match transition {
        StepTransition::Blocked { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        StepTransition::Moved { .. } | StepTransition::AtBoundary { .. } => StatusCode::OK,
    };
    (status, axum::Json(transition)).into_response()
}

pub(crate) async fn advance_handler<S, T>(
    State(session): State<Arc<WizardSession<S, T>>>,
) -> Response
where
    S: KeyValueStore + 'static,
    T: ApplicationSubmitter + 'static,
{
    match session.lock() {
        Ok(mut wizard) => transition_response(wizard.advance()),
        Err(error) => wizard_error_response(error),
    }
}

pub(crate) async fn retreat_handler<S, T>(
    State(session): State<Arc<WizardSession<S, T>>>,
) -> Response
where
    S: KeyValueStore + 'static,
    T: ApplicationSubmitter + 'static,
{
    match session.lock() {
        Ok(mut wizard) => transition_response(wizard.retreat()),
        Err(error) => wizard_error_response(error),
    }
}

pub(crate) async fn reset_handler<S, T>(
    State(session): State<Arc<WizardSession<S, T>>>,
) -> Response
where
    S: KeyValueStore + 'static,
    T: ApplicationSubmitter + 'static,
{
    match session.lock() {
        Ok(mut wizard) => {
            wizard.reset();
            (StatusCode::OK, axum::Json(wizard.status())).into_response()
        }
        Err(error) => wizard_error_response(error),
    }
}

pub(crate) async fn summary_handler<S, T>(
    State(session): State<Arc<WizardSession<S, T>>>,
) -> Response
where
    S: KeyValueStore + 'static,
    T: ApplicationSubmitter + 'static,
{
    match session.lock() {
        Ok(wizard) => (StatusCode::OK, axum::Json(wizard.summary())).into_response(),
        Err(error) => wizard_error_response(error),
    }
}

pub(crate) async fn submit_handler<S, T>(
    State(session): State<Arc<WizardSession<S, T>>>,
) -> Response
where
    S: KeyValueStore + 'static,
    T: ApplicationSubmitter + 'static,
{
    let outcome = match session.lock() {
        Ok(wizard) => wizard.submit(session.submitter().as_ref()),
        Err(error) => return wizard_error_response(error),
    };

    match outcome {
        Ok(outcome @ SubmissionOutcome::Submitted { .. }) => {
            (StatusCode::ACCEPTED, axum::Json(outcome)).into_response()
        }
        Ok(outcome @ SubmissionOutcome::Rejected { .. }) => {
            (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(outcome)).into_response()
        }
        Err(error) => error_response(StatusCode::BAD_GATEWAY, error),
    }
}
