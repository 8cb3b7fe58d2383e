use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use credit_wizard::wizard::fields::{address, agreements, credit, passport, personal, work};
use credit_wizard::wizard::{
    AdvancePolicy, ApplicationSubmitter, CreditApplicationWizard, FileStore, SectionData,
    SectionName, Step, StepTransition, SubmissionError, SubmissionOutcome, SubmittedApplication,
    ValidationEngine, STORAGE_KEY,
};

#[derive(Default)]
struct CapturingSubmitter {
    applications: Mutex<Vec<SubmittedApplication>>,
}

impl ApplicationSubmitter for CapturingSubmitter {
    fn submit(&self, application: &SubmittedApplication) -> Result<(), SubmissionError> {
        self.applications
            .lock()
            .expect("lock")
            .push(application.clone());
        Ok(())
    }
}

fn engine() -> ValidationEngine {
    ValidationEngine::fixed(NaiveDate::from_ymd_opt(2025, 6, 15).expect("valid date"))
}

fn open(store: &Arc<FileStore>) -> CreditApplicationWizard<FileStore> {
    CreditApplicationWizard::open(store.clone(), engine(), AdvancePolicy::Gated)
}

fn sections() -> Vec<(SectionName, SectionData)> {
    vec![
        (
            SectionName::PersonalInfo,
            SectionData::new()
                .with(personal::FIRST_NAME, "Алия")
                .with(personal::LAST_NAME, "Нурланова")
                .with(personal::BIRTH_DATE, "1988-11-02")
                .with(personal::PHONE, "+7 (701) 222 33 44")
                .with(personal::EMAIL, "aliya@example.kz"),
        ),
        (
            SectionName::PassportInfo,
            SectionData::new()
                .with(passport::SERIES, "12")
                .with(passport::NUMBER, "98765432")
                .with(passport::ISSUED_BY, "Justice Department of Almaty")
                .with(passport::ISSUE_DATE, "2019-01-15")
                .with(passport::BIRTH_PLACE, "Shymkent"),
        ),
        (
            SectionName::AddressInfo,
            SectionData::new()
                .with(address::REGISTRATION_ADDRESS, "Shymkent, Tauke Khan 44")
                .with(address::ACTUAL_ADDRESS, "Almaty, Dostyk avenue 97")
                .with(address::SAME_AS_REGISTRATION, false),
        ),
        (
            SectionName::WorkInfo,
            SectionData::new()
                .with(work::COMPANY, "Steppe Analytics")
                .with(work::POSITION, "Data analyst")
                .with(work::WORK_EXPERIENCE, "7")
                .with(work::MONTHLY_INCOME, "620000")
                .with(work::ADDITIONAL_INCOME, "40000"),
        ),
        (
            SectionName::CreditInfo,
            SectionData::new()
                .with(credit::AMOUNT, "1000000")
                .with(credit::TERM, "24")
                .with(credit::PURPOSE, "Образование")
                .with(credit::HAS_OTHER_CREDITS, true)
                .with(credit::OTHER_CREDITS_INFO, "Car loan, 90,000 per month"),
        ),
    ]
}

#[test]
fn application_survives_restart_and_submits() {
    let temp = tempfile::tempdir().expect("tempdir");
    let store = Arc::new(FileStore::new(temp.path()));

    let mut wizard = open(&store);
    let mut remaining = sections().into_iter();
    for (section, data) in remaining.by_ref().take(3) {
        let validation = wizard.update_section(section, data).expect("known fields");
        assert!(validation.is_valid, "{section}: {:?}", validation.field_errors);
        assert!(matches!(wizard.advance(), StepTransition::Moved { .. }));
    }
    drop(wizard);

    let mut wizard = open(&store);
    assert_eq!(wizard.current_step().number(), 4);
    assert_eq!(wizard.state().completed_steps().len(), 3);
    assert_eq!(
        wizard
            .section(SectionName::AddressInfo)
            .text(address::ACTUAL_ADDRESS),
        "Almaty, Dostyk avenue 97"
    );

    for (section, data) in remaining {
        wizard.update_section(section, data).expect("known fields");
        assert!(matches!(wizard.advance(), StepTransition::Moved { .. }));
    }
    assert_eq!(wizard.current_step(), Step::LAST);
    assert!(wizard.is_complete());

    let summary = wizard.summary();
    assert_eq!(summary.full_name, "Нурланова Алия");
    assert_eq!(summary.estimated_monthly_payment, 48_487);

    let submitter = CapturingSubmitter::default();
    assert!(matches!(
        wizard.submit(&submitter),
        Ok(SubmissionOutcome::Rejected { .. })
    ));

    wizard
        .update_section(
            SectionName::Agreements,
            SectionData::new()
                .with(agreements::DATA_PROCESSING, true)
                .with(agreements::CREDIT_CONDITIONS, true)
                .with(agreements::NOTIFICATIONS, true),
        )
        .expect("known fields");
    assert!(matches!(
        wizard.submit(&submitter),
        Ok(SubmissionOutcome::Submitted { .. })
    ));
    assert_eq!(submitter.applications.lock().expect("lock").len(), 1);

    wizard.reset();
    assert!(!store.path_for(STORAGE_KEY).exists());
    drop(wizard);

    let wizard = open(&store);
    assert_eq!(wizard.current_step(), Step::FIRST);
    assert!(wizard.state().completed_steps().is_empty());
}

#[test]
fn invalid_sections_hold_the_wizard_in_place() {
    let temp = tempfile::tempdir().expect("tempdir");
    let store = Arc::new(FileStore::new(temp.path()));
    let mut wizard = open(&store);

    let validation = wizard
        .update_section(
            SectionName::PersonalInfo,
            SectionData::new()
                .with(personal::FIRST_NAME, "Aliya")
                .with(personal::BIRTH_DATE, "2010-01-01"),
        )
        .expect("known fields");

    assert!(!validation.is_valid);
    assert_eq!(
        validation.error(personal::BIRTH_DATE),
        Some("Applicant must be at least 18 years old")
    );
    assert!(matches!(
        wizard.advance(),
        StepTransition::Blocked { .. }
    ));
    assert_eq!(wizard.current_step(), Step::FIRST);
}
