use crate::infra::{field_input, load_config, open_wizard, parse_assignment, OutboxSubmitter};
use clap::Args;
use credit_wizard::config::AppConfig;
use credit_wizard::error::AppError;
use credit_wizard::wizard::{
    AdvancePolicy, ApplicationSummary, CreditApplicationWizard, FileStore, SectionData,
    SectionName, StepTransition, SubmissionOutcome, ValidationResult, WizardStatusView,
};
use std::path::PathBuf;

/// Options shared by every wizard command.
#[derive(Args, Debug, Default, Clone)]
pub(crate) struct WizardArgs {
    /// Directory holding the wizard snapshot (overrides WIZARD_STORAGE_DIR)
    #[arg(long, global = true)]
    pub(crate) storage_dir: Option<PathBuf>,
    /// Step gating policy: `gated` or `lenient` (overrides WIZARD_ADVANCE_POLICY)
    #[arg(long, global = true)]
    pub(crate) policy: Option<AdvancePolicy>,
}

impl WizardArgs {
    pub(crate) fn config(&self) -> Result<AppConfig, AppError> {
        load_config(self.storage_dir.as_deref(), self.policy)
    }
}

#[derive(Args, Debug)]
pub(crate) struct SetArgs {
    /// Section key, e.g. personalInfo or creditInfo
    pub(crate) section: SectionName,
    /// One or more FIELD=VALUE assignments
    #[arg(required = true, value_parser = parse_assignment)]
    pub(crate) assignments: Vec<(String, String)>,
}

#[derive(Args, Debug)]
pub(crate) struct ValidateArgs {
    /// Section key; defaults to the section of the current step
    pub(crate) section: Option<SectionName>,
}

fn open(args: &WizardArgs) -> Result<CreditApplicationWizard<FileStore>, AppError> {
    let config = args.config()?;
    Ok(open_wizard(&config))
}

pub(crate) fn status(args: &WizardArgs) -> Result<(), AppError> {
    let wizard = open(args)?;
    render_status(&wizard.status());
    Ok(())
}

pub(crate) fn set(args: &WizardArgs, request: SetArgs) -> Result<(), AppError> {
    let SetArgs {
        section,
        assignments,
    } = request;

    let mut partial = SectionData::new();
    for (field, raw) in assignments {
        let value = field_input(section, &field, &raw)?;
        partial.set(field, value);
    }

    let mut wizard = open(args)?;
    let validation = wizard.update_section(section, partial)?;
    println!("Updated {section}");
    render_validation(&validation);
    Ok(())
}

pub(crate) fn validate(args: &WizardArgs, request: ValidateArgs) -> Result<(), AppError> {
    let wizard = open(args)?;
    let section = request
        .section
        .unwrap_or_else(|| wizard.current_step().section());
    render_validation(&wizard.validate(section));
    Ok(())
}

pub(crate) fn next(args: &WizardArgs) -> Result<(), AppError> {
    let mut wizard = open(args)?;
    render_transition(&wizard.advance());
    render_status(&wizard.status());
    Ok(())
}

pub(crate) fn back(args: &WizardArgs) -> Result<(), AppError> {
    let mut wizard = open(args)?;
    render_transition(&wizard.retreat());
    render_status(&wizard.status());
    Ok(())
}

pub(crate) fn reset(args: &WizardArgs) -> Result<(), AppError> {
    let mut wizard = open(args)?;
    wizard.reset();
    println!("Application reset; stored snapshot cleared");
    render_status(&wizard.status());
    Ok(())
}

pub(crate) fn summary(args: &WizardArgs) -> Result<(), AppError> {
    let wizard = open(args)?;
    render_summary(&wizard.summary());
    Ok(())
}

pub(crate) fn submit(args: &WizardArgs) -> Result<(), AppError> {
    let config = args.config()?;
    let wizard = open_wizard(&config);
    let outbox = OutboxSubmitter::for_config(&config);

    match wizard.submit(&outbox)? {
        SubmissionOutcome::Submitted { summary } => {
            println!(
                "Application submitted to {}",
                outbox.directory().display()
            );
            render_summary(&summary);
        }
        SubmissionOutcome::Rejected { validation } => {
            println!("Application not submitted: mandatory consents are missing");
            render_validation(&validation);
        }
    }
    Ok(())
}

pub(crate) fn render_status(status: &WizardStatusView) {
    println!(
        "Step {} of {} ({}) | {}% complete | policy {}",
        status.current_step,
        SectionName::ALL.len(),
        status.current_section,
        status.progress_percent,
        status.advance_policy
    );
    let completed = status
        .completed_steps
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>();
    if completed.is_empty() {
        println!("- Completed steps: none");
    } else {
        println!("- Completed steps: {}", completed.join(", "));
    }
    println!(
        "- Current section is {}",
        if status.is_form_valid {
            "valid"
        } else {
            "incomplete"
        }
    );
    if status.is_complete {
        println!("All sections are complete. Review the summary and submit the application.");
    }
}

pub(crate) fn render_validation(validation: &ValidationResult) {
    if validation.is_valid {
        println!("{} is valid", validation.section);
        return;
    }

    println!("{} has {} error(s):", validation.section, validation.field_errors.len());
    for (field, message) in &validation.field_errors {
        println!("  - {field}: {message}");
    }
}

pub(crate) fn render_transition(transition: &StepTransition) {
    match transition {
        StepTransition::Moved { from, to } => {
            println!("Moved from step {from} to step {to}");
        }
        StepTransition::AtBoundary { step } => {
            println!("Already at step {step}; nothing to do");
        }
        StepTransition::Blocked { step, validation } => {
            println!("Step {step} cannot be completed yet");
            render_validation(validation);
        }
    }
}

pub(crate) fn render_summary(summary: &ApplicationSummary) {
    println!("Application summary");
    println!("- Applicant: {}", display_or_dash(&summary.full_name));
    println!("- Birth date: {}", display_or_dash(&summary.birth_date));
    println!("- Phone: {}", display_or_dash(&summary.phone));
    println!("- Email: {}", display_or_dash(&summary.email));
    match summary.amount {
        Some(amount) => println!("- Amount: {amount:.0}"),
        None => println!("- Amount: -"),
    }
    match summary.term_months {
        Some(term) => println!("- Term: {term} months"),
        None => println!("- Term: -"),
    }
    println!("- Purpose: {}", display_or_dash(&summary.purpose));
    if let Some(income) = summary.monthly_income {
        println!("- Monthly income: {income:.0}");
    }
    println!(
        "- Estimated monthly payment: {}",
        summary.estimated_monthly_payment
    );
}

fn display_or_dash(value: &str) -> &str {
    if value.trim().is_empty() {
        "-"
    } else {
        value
    }
}
