use chrono::Utc;
use credit_wizard::config::AppConfig;
use credit_wizard::error::AppError;
use credit_wizard::wizard::{
    AdvancePolicy, ApplicationSubmitter, CreditApplicationWizard, FieldValue, FileStore,
    KeyValueStore, SectionName, SubmissionError, SubmittedApplication, ValidationEngine,
    WizardError,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Configuration with command-line overrides applied on top of the environment.
pub(crate) fn load_config(
    storage_dir: Option<&Path>,
    policy: Option<AdvancePolicy>,
) -> Result<AppConfig, AppError> {
    let mut config = AppConfig::load()?;
    if let Some(directory) = storage_dir {
        config.storage.directory = directory.to_path_buf();
    }
    if let Some(policy) = policy {
        config.wizard.advance_policy = policy;
    }
    Ok(config)
}

pub(crate) fn open_wizard(config: &AppConfig) -> CreditApplicationWizard<FileStore> {
    let store = Arc::new(FileStore::new(&config.storage.directory));
    CreditApplicationWizard::open(
        store,
        ValidationEngine::default(),
        config.wizard.advance_policy,
    )
}

static OUTBOX_SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Drops each submitted application as a JSON document into an outbox directory for a
/// downstream loan-origination system to pick up.
#[derive(Debug, Clone)]
pub(crate) struct OutboxSubmitter {
    store: FileStore,
}

impl OutboxSubmitter {
    pub(crate) fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            store: FileStore::new(directory),
        }
    }

    pub(crate) fn for_config(config: &AppConfig) -> Self {
        Self::new(config.storage.directory.join("outbox"))
    }

    pub(crate) fn directory(&self) -> &Path {
        self.store.directory()
    }
}

impl ApplicationSubmitter for OutboxSubmitter {
    fn submit(&self, application: &SubmittedApplication) -> Result<(), SubmissionError> {
        let key = format!(
            "application-{}-{}-{}",
            Utc::now().format("%Y%m%dT%H%M%S%.3fZ"),
            std::process::id(),
            OUTBOX_SEQUENCE.fetch_add(1, Ordering::Relaxed)
        );
        let bytes = serde_json::to_vec_pretty(application)
            .map_err(|err| SubmissionError::Transport(err.to_string()))?;
        self.store
            .write(&key, &bytes)
            .map_err(|err| SubmissionError::Transport(err.to_string()))?;

        info!(%key, outbox = %self.store.directory().display(), "application queued");
        Ok(())
    }
}

/// Split a `field=value` assignment from the command line.
pub(crate) fn parse_assignment(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((field, value)) if !field.trim().is_empty() => {
            Ok((field.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected FIELD=VALUE, got '{raw}'")),
    }
}

/// Interpret raw command-line input according to the declared kind of the field.
///
/// Undeclared fields pass through as text; the wizard rejects them on update.
pub(crate) fn field_input(
    section: SectionName,
    field: &str,
    raw: &str,
) -> Result<FieldValue, WizardError> {
    match credit_wizard::wizard::schema(section).field(field) {
        Some(spec) => spec
            .kind
            .parse_input(raw)
            .ok_or_else(|| WizardError::FieldKindMismatch {
                section,
                field: field.to_string(),
                expected: spec.kind.label(),
            }),
        None => Ok(FieldValue::from(raw)),
    }
}
