use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::NaiveDate;
use serde_json::Value;

use crate::wizard::domain::{ApplicationState, SectionData, SectionName};
use crate::wizard::persistence::{KeyValueStore, MemoryStore, StorageError};
use crate::wizard::state::{AdvancePolicy, CreditApplicationWizard, WizardEvent, WizardObserver};
use crate::wizard::summary::{ApplicationSubmitter, SubmissionError, SubmittedApplication};
use crate::wizard::validation::fields::{address, agreements, credit, passport, personal, work};
use crate::wizard::validation::ValidationEngine;

pub(super) fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 15).expect("valid date")
}

pub(super) fn engine() -> ValidationEngine {
    ValidationEngine::fixed(today())
}

pub(super) fn personal_info() -> SectionData {
    SectionData::new()
        .with(personal::FIRST_NAME, "Иван")
        .with(personal::LAST_NAME, "Петров")
        .with(personal::MIDDLE_NAME, "Сергеевич")
        .with(personal::BIRTH_DATE, "1990-04-12")
        .with(personal::PHONE, "+7 (776) 531 16 00")
        .with(personal::EMAIL, "ivan.petrov@example.kz")
}

pub(super) fn passport_info() -> SectionData {
    SectionData::new()
        .with(passport::SERIES, "4510")
        .with(passport::NUMBER, "1234567")
        .with(passport::ISSUED_BY, "Ministry of Internal Affairs")
        .with(passport::ISSUE_DATE, "2015-03-20")
        .with(passport::BIRTH_PLACE, "Almaty")
}

pub(super) fn address_info() -> SectionData {
    SectionData::new()
        .with(address::REGISTRATION_ADDRESS, "Almaty, Abay avenue 10, apt 5")
        .with(address::SAME_AS_REGISTRATION, true)
}

pub(super) fn work_info() -> SectionData {
    SectionData::new()
        .with(work::COMPANY, "Kaspi Logistics")
        .with(work::POSITION, "Engineer")
        .with(work::WORK_EXPERIENCE, 5_i64)
        .with(work::MONTHLY_INCOME, 350_000_i64)
}

pub(super) fn credit_info() -> SectionData {
    SectionData::new()
        .with(credit::AMOUNT, 1_200_000_i64)
        .with(credit::TERM, 12_i64)
        .with(credit::PURPOSE, "Покупка автомобиля")
        .with(credit::HAS_OTHER_CREDITS, false)
}

pub(super) fn agreements() -> SectionData {
    SectionData::new()
        .with(agreements::DATA_PROCESSING, true)
        .with(agreements::CREDIT_CONDITIONS, true)
}

pub(super) fn valid_section(section: SectionName) -> SectionData {
    match section {
        SectionName::PersonalInfo => personal_info(),
        SectionName::PassportInfo => passport_info(),
        SectionName::AddressInfo => address_info(),
        SectionName::WorkInfo => work_info(),
        SectionName::CreditInfo => credit_info(),
        SectionName::Agreements => agreements(),
    }
}

pub(super) fn open_wizard(
    store: Arc<MemoryStore>,
    policy: AdvancePolicy,
) -> CreditApplicationWizard<MemoryStore> {
    CreditApplicationWizard::open(store, engine(), policy)
}

pub(super) fn fresh_wizard() -> (CreditApplicationWizard<MemoryStore>, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::default());
    (open_wizard(store.clone(), AdvancePolicy::Gated), store)
}

/// Fill and advance through the first five sections, leaving the wizard on the agreements step.
pub(super) fn walk_to_agreements<S: KeyValueStore>(wizard: &mut CreditApplicationWizard<S>) {
    for section in &SectionName::ALL[..5] {
        wizard
            .update_section(*section, valid_section(*section))
            .expect("known fields");
        wizard.advance();
    }
}

#[derive(Default)]
pub(super) struct RecordingObserver {
    events: Mutex<Vec<WizardEvent>>,
}

impl RecordingObserver {
    pub(super) fn events(&self) -> Vec<WizardEvent> {
        self.events.lock().expect("lock").clone()
    }
}

impl WizardObserver for RecordingObserver {
    fn on_change(&self, event: &WizardEvent, _state: &ApplicationState) {
        self.events.lock().expect("lock").push(event.clone());
    }
}

#[derive(Default)]
pub(super) struct MemorySubmitter {
    submitted: Mutex<Vec<SubmittedApplication>>,
}

impl MemorySubmitter {
    pub(super) fn submitted(&self) -> Vec<SubmittedApplication> {
        self.submitted.lock().expect("lock").clone()
    }
}

impl ApplicationSubmitter for MemorySubmitter {
    fn submit(&self, application: &SubmittedApplication) -> Result<(), SubmissionError> {
        self.submitted.lock().expect("lock").push(application.clone());
        Ok(())
    }
}

pub(super) struct OfflineSubmitter;

impl ApplicationSubmitter for OfflineSubmitter {
    fn submit(&self, _application: &SubmittedApplication) -> Result<(), SubmissionError> {
        Err(SubmissionError::Transport("outbox offline".to_string()))
    }
}

/// Store whose every operation fails, for exercising best-effort persistence.
pub(super) struct BrokenStore;

impl KeyValueStore for BrokenStore {
    fn read(&self, _key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        Err(StorageError::Unavailable("disk detached".to_string()))
    }

    fn write(&self, _key: &str, _bytes: &[u8]) -> Result<(), StorageError> {
        Err(StorageError::Unavailable("disk detached".to_string()))
    }

    fn remove(&self, _key: &str) -> Result<(), StorageError> {
        Err(StorageError::Unavailable("disk detached".to_string()))
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("body readable");
    serde_json::from_slice(&body).expect("json body")
}
