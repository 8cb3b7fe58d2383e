//! Multi-step credit application wizard: section data, declarative validation, the step
//! state machine and its snapshot persistence.

pub mod domain;
pub mod persistence;
pub mod router;
pub mod state;
pub mod summary;
pub mod validation;

#[cfg(test)]
mod tests;

pub use domain::{
    ApplicationState, FieldValue, FormData, SectionData, SectionName, Step, WizardError,
};
pub use persistence::{
    decode_snapshot, encode_snapshot, FileStore, KeyValueStore, MemoryStore, Snapshot,
    SnapshotPersistence, StorageError, STORAGE_KEY,
};
pub use router::{wizard_router, WizardSession};
pub use state::{
    AdvancePolicy, CreditApplicationWizard, StepTransition, WizardEvent, WizardObserver,
    WizardStatusView,
};
pub use summary::{
    estimate_monthly_payment, ApplicationSubmitter, ApplicationSummary, SubmissionError,
    SubmissionOutcome, SubmittedApplication, INDICATIVE_ANNUAL_RATE,
};
pub use validation::{
    fields, schema, Clock, FieldKind, FixedClock, SystemClock, ValidationEngine,
    ValidationResult, CREDIT_PURPOSES,
};
