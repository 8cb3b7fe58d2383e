use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use super::domain::{ApplicationState, FieldValue, SectionData, SectionName, Step, WizardError};
use super::persistence::{KeyValueStore, SnapshotPersistence};
use super::summary::{
    ApplicationSubmitter, ApplicationSummary, SubmissionError, SubmissionOutcome,
    SubmittedApplication,
};
use super::validation::fields::address;
use super::validation::{schema, ValidationEngine, ValidationResult};

/// Whether `advance` re-validates the current section before moving on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AdvancePolicy {
    /// Refuse to leave an invalid step.
    #[default]
    Gated,
    /// Mark the step completed regardless of its validity; the UI is trusted to guard it.
    Lenient,
}

impl AdvancePolicy {
    pub const fn label(self) -> &'static str {
        match self {
            AdvancePolicy::Gated => "gated",
            AdvancePolicy::Lenient => "lenient",
        }
    }
}

impl FromStr for AdvancePolicy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "gated" | "strict" => Ok(AdvancePolicy::Gated),
            "lenient" | "permissive" => Ok(AdvancePolicy::Lenient),
            other => Err(format!("unknown advance policy `{other}`")),
        }
    }
}

impl fmt::Display for AdvancePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Result of `advance` / `retreat`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum StepTransition {
    Moved { from: Step, to: Step },
    /// Already at the first (retreat) or last (advance) step; nothing changed.
    AtBoundary { step: Step },
    /// Current section is invalid under [`AdvancePolicy::Gated`].
    Blocked {
        step: Step,
        validation: ValidationResult,
    },
}

/// Notification emitted after every state mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum WizardEvent {
    SectionUpdated { section: SectionName },
    StepChanged { from: Step, to: Step },
    Reset,
}

/// Subscriber hook for presentation layers that re-render on change.
pub trait WizardObserver: Send + Sync {
    fn on_change(&self, event: &WizardEvent, state: &ApplicationState);
}

/// Read model for the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WizardStatusView {
    pub current_step: Step,
    pub current_section: SectionName,
    pub completed_steps: Vec<Step>,
    pub progress_percent: u8,
    pub is_form_valid: bool,
    pub is_complete: bool,
    pub advance_policy: AdvancePolicy,
}

/// Multi-step credit application state machine with write-through persistence.
pub struct CreditApplicationWizard<S> {
    state: ApplicationState,
    engine: ValidationEngine,
    persistence: SnapshotPersistence<S>,
    policy: AdvancePolicy,
    observers: Vec<Arc<dyn WizardObserver>>,
}

impl<S: KeyValueStore> CreditApplicationWizard<S> {
    /// Hydrate from `store`, or start from defaults when nothing usable is stored.
    pub fn open(store: Arc<S>, engine: ValidationEngine, policy: AdvancePolicy) -> Self {
        let persistence = SnapshotPersistence::new(store);
        let restored = persistence.load();
        let hydrated = restored.is_some();

        let mut wizard = Self {
            state: restored.unwrap_or_default(),
            engine,
            persistence,
            policy,
            observers: Vec::new(),
        };
        wizard.refresh_validity();

        info!(
            step = %wizard.state.current_step,
            completed = wizard.state.completed_steps.len(),
            hydrated,
            %policy,
            "credit application wizard ready"
        );
        wizard
    }

    pub fn state(&self) -> &ApplicationState {
        &self.state
    }

    pub fn current_step(&self) -> Step {
        self.state.current_step
    }

    pub fn section(&self, name: SectionName) -> &SectionData {
        self.state.section(name)
    }

    pub fn policy(&self) -> AdvancePolicy {
        self.policy
    }

    pub fn engine(&self) -> &ValidationEngine {
        &self.engine
    }

    pub fn persistence(&self) -> &SnapshotPersistence<S> {
        &self.persistence
    }

    pub fn subscribe(&mut self, observer: Arc<dyn WizardObserver>) {
        self.observers.push(observer);
    }

    pub fn validate(&self, section: SectionName) -> ValidationResult {
        self.engine.validate(section, self.state.section(section))
    }

    pub fn validate_current(&self) -> ValidationResult {
        self.validate(self.state.current_step.section())
    }

    /// Merge `partial` into a section and return the section's fresh validation.
    pub fn update_section(
        &mut self,
        section: SectionName,
        partial: SectionData,
    ) -> Result<ValidationResult, WizardError> {
        let schema = schema(section);
        for (field, value) in partial.iter() {
            let spec = schema.field(field).ok_or_else(|| WizardError::UnknownField {
                section,
                field: field.to_string(),
            })?;
            if !spec.kind.accepts(value) {
                return Err(WizardError::FieldKindMismatch {
                    section,
                    field: field.to_string(),
                    expected: spec.kind.label(),
                });
            }
        }

        let data = self.state.form_data.section_mut(section);
        let was_same_address = data.flag(address::SAME_AS_REGISTRATION);
        data.merge(partial);
        if section == SectionName::AddressInfo {
            sync_actual_address(data, was_same_address);
        }

        self.after_mutation(WizardEvent::SectionUpdated { section });
        Ok(self.validate(section))
    }

    pub fn advance(&mut self) -> StepTransition {
        let from = self.state.current_step;
        let Some(to) = from.next() else {
            debug!(step = %from, "advance ignored at last step");
            return StepTransition::AtBoundary { step: from };
        };

        if self.policy == AdvancePolicy::Gated {
            let validation = self.validate(from.section());
            if !validation.is_valid {
                debug!(step = %from, errors = validation.field_errors.len(), "advance blocked");
                return StepTransition::Blocked {
                    step: from,
                    validation,
                };
            }
        }

        self.state.completed_steps.insert(from);
        self.state.current_step = to;
        self.after_mutation(WizardEvent::StepChanged { from, to });
        StepTransition::Moved { from, to }
    }

    pub fn retreat(&mut self) -> StepTransition {
        let from = self.state.current_step;
        let Some(to) = from.previous() else {
            debug!(step = %from, "retreat ignored at first step");
            return StepTransition::AtBoundary { step: from };
        };

        self.state.current_step = to;
        self.after_mutation(WizardEvent::StepChanged { from, to });
        StepTransition::Moved { from, to }
    }

    /// Back to schema defaults; the stored snapshot is erased, not overwritten.
    pub fn reset(&mut self) {
        self.state = ApplicationState::default();
        self.refresh_validity();
        self.persistence.clear();
        info!("credit application wizard reset");
        self.notify(&WizardEvent::Reset);
    }

    pub fn is_complete(&self) -> bool {
        self.state.is_complete()
    }

    pub fn status(&self) -> WizardStatusView {
        let current = self.state.current_step;
        let span = (Step::LAST.number() - Step::FIRST.number()) as u32;
        let progress = (current.number() - Step::FIRST.number()) as u32 * 100 / span;

        WizardStatusView {
            current_step: current,
            current_section: current.section(),
            completed_steps: self.state.completed_steps.iter().copied().collect(),
            progress_percent: progress as u8,
            is_form_valid: self.state.is_form_valid,
            is_complete: self.state.is_complete(),
            advance_policy: self.policy,
        }
    }

    pub fn summary(&self) -> ApplicationSummary {
        ApplicationSummary::from_form(&self.state.form_data)
    }

    /// Hand the application to `submitter` once the agreements section validates.
    pub fn submit<T>(&self, submitter: &T) -> Result<SubmissionOutcome, SubmissionError>
    where
        T: ApplicationSubmitter + ?Sized,
    {
        let validation = self.validate(SectionName::Agreements);
        if !validation.is_valid {
            debug!(errors = validation.field_errors.len(), "submission rejected");
            return Ok(SubmissionOutcome::Rejected { validation });
        }

        let application = SubmittedApplication {
            summary: self.summary(),
            form_data: self.state.form_data.clone(),
        };
        submitter.submit(&application)?;
        info!(
            amount = ?application.summary.amount,
            term_months = ?application.summary.term_months,
            "credit application submitted"
        );

        Ok(SubmissionOutcome::Submitted {
            summary: application.summary,
        })
    }

    fn refresh_validity(&mut self) {
        self.state.is_form_valid = self.validate_current().is_valid;
    }

    fn after_mutation(&mut self, event: WizardEvent) {
        self.refresh_validity();
        self.persistence.save(&self.state);
        self.notify(&event);
    }

    fn notify(&self, event: &WizardEvent) {
        for observer in &self.observers {
            observer.on_change(event, &self.state);
        }
    }
}

/// Snapshot copy on toggle: checking copies the registration address once, unchecking
/// clears the actual address.
fn sync_actual_address(data: &mut SectionData, was_same: bool) {
    let is_same = data.flag(address::SAME_AS_REGISTRATION);
    if is_same == was_same {
        return;
    }

    let actual = if is_same {
        data.get(address::REGISTRATION_ADDRESS)
            .cloned()
            .unwrap_or_else(FieldValue::empty)
    } else {
        FieldValue::empty()
    };
    data.set(address::ACTUAL_ADDRESS, actual);
}
