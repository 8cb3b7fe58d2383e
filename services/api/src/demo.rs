use crate::commands::{render_status, render_summary, render_transition, render_validation};
use crate::infra::OutboxSubmitter;
use clap::Args;
use credit_wizard::error::AppError;
use credit_wizard::wizard::fields::{address, agreements, credit, passport, personal, work};
use credit_wizard::wizard::{
    AdvancePolicy, ApplicationState, CreditApplicationWizard, MemoryStore, SectionData,
    SectionName, SubmissionOutcome, ValidationEngine, WizardEvent, WizardObserver,
};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Write the submitted application into this outbox directory instead of discarding it
    #[arg(long)]
    pub(crate) outbox: Option<PathBuf>,
    /// Stop before the consent step and skip submission
    #[arg(long)]
    pub(crate) skip_submit: bool,
}

/// Prints every wizard event, the way a UI would re-render.
struct EventLog;

impl WizardObserver for EventLog {
    fn on_change(&self, event: &WizardEvent, state: &ApplicationState) {
        match event {
            WizardEvent::SectionUpdated { section } => println!(
                "  [event] {section} updated (current step valid: {})",
                state.is_form_valid()
            ),
            WizardEvent::StepChanged { from, to } => {
                println!("  [event] step {from} -> {to}")
            }
            WizardEvent::Reset => println!("  [event] reset"),
        }
    }
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        outbox,
        skip_submit,
    } = args;

    println!("Credit application wizard demo");
    let mut wizard = CreditApplicationWizard::open(
        Arc::new(MemoryStore::default()),
        ValidationEngine::default(),
        AdvancePolicy::Gated,
    );
    wizard.subscribe(Arc::new(EventLog));
    render_status(&wizard.status());

    println!("\nAttempting to continue with an empty personal section");
    render_transition(&wizard.advance());

    println!("\nEntering a first name in Latin script");
    let validation = wizard.update_section(
        SectionName::PersonalInfo,
        SectionData::new().with(personal::FIRST_NAME, "Aigerim"),
    )?;
    render_validation(&validation);

    for (section, data) in demo_sections() {
        println!("\nFilling {section}");
        let validation = wizard.update_section(section, data)?;
        render_validation(&validation);
        render_transition(&wizard.advance());
    }

    println!();
    render_status(&wizard.status());
    println!();
    render_summary(&wizard.summary());

    if skip_submit {
        return Ok(());
    }

    println!("\nSubmitting without consents");
    let outbox = OutboxSubmitter::new(
        outbox.unwrap_or_else(|| std::env::temp_dir().join("credit-wizard-demo-outbox")),
    );
    if let SubmissionOutcome::Rejected { validation } = wizard.submit(&outbox)? {
        render_validation(&validation);
    }

    println!("\nGiving consent and submitting");
    wizard.update_section(
        SectionName::Agreements,
        SectionData::new()
            .with(agreements::DATA_PROCESSING, true)
            .with(agreements::CREDIT_CONDITIONS, true),
    )?;
    match wizard.submit(&outbox)? {
        SubmissionOutcome::Submitted { .. } => {
            println!(
                "Application queued in {}",
                outbox.directory().display()
            );
        }
        SubmissionOutcome::Rejected { validation } => render_validation(&validation),
    }

    Ok(())
}

fn demo_sections() -> Vec<(SectionName, SectionData)> {
    vec![
        (
            SectionName::PersonalInfo,
            SectionData::new()
                .with(personal::FIRST_NAME, "Айгерим")
                .with(personal::LAST_NAME, "Касымова")
                .with(personal::BIRTH_DATE, "1992-08-30")
                .with(personal::PHONE, "+7 (705) 123 45 67")
                .with(personal::EMAIL, "aigerim@example.kz"),
        ),
        (
            SectionName::PassportInfo,
            SectionData::new()
                .with(passport::SERIES, "0421")
                .with(passport::NUMBER, "7654321")
                .with(passport::ISSUED_BY, "Ministry of Justice, Karaganda")
                .with(passport::ISSUE_DATE, "2018-05-04")
                .with(passport::BIRTH_PLACE, "Karaganda"),
        ),
        (
            SectionName::AddressInfo,
            SectionData::new()
                .with(address::REGISTRATION_ADDRESS, "Karaganda, Bukhar Zhyrau 56")
                .with(address::SAME_AS_REGISTRATION, true),
        ),
        (
            SectionName::WorkInfo,
            SectionData::new()
                .with(work::COMPANY, "Qazaq Rail")
                .with(work::POSITION, "Dispatcher")
                .with(work::WORK_EXPERIENCE, 9_i64)
                .with(work::MONTHLY_INCOME, 410_000_i64),
        ),
        (
            SectionName::CreditInfo,
            SectionData::new()
                .with(credit::AMOUNT, 2_500_000_i64)
                .with(credit::TERM, 36_i64)
                .with(credit::PURPOSE, "Ремонт и обустройство")
                .with(credit::HAS_OTHER_CREDITS, false),
        ),
    ]
}
