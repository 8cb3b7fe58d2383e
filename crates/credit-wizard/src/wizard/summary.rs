use serde::{Deserialize, Serialize};

use super::domain::{FormData, SectionData};
use super::validation::fields::{credit, personal, work};
use super::validation::ValidationResult;

/// Indicative annual rate used for the monthly payment estimate.
pub const INDICATIVE_ANNUAL_RATE: f64 = 0.15;

/// Digest of the application shown before the applicant gives final consent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationSummary {
    pub full_name: String,
    pub birth_date: String,
    pub phone: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub term_months: Option<u32>,
    pub purpose: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub monthly_income: Option<f64>,
    pub estimated_monthly_payment: u64,
}

impl ApplicationSummary {
    pub fn from_form(form: &FormData) -> Self {
        let personal_info = &form.personal_info;
        let credit_info = &form.credit_info;

        let amount = credit_info.number(credit::AMOUNT);
        let term_months = credit_info
            .number(credit::TERM)
            .filter(|term| term.fract() == 0.0 && *term >= 0.0 && *term <= u32::MAX as f64)
            .map(|term| term as u32);
        let estimated_monthly_payment = match (amount, term_months) {
            (Some(amount), Some(term)) => {
                estimate_monthly_payment(amount, term, INDICATIVE_ANNUAL_RATE)
            }
            _ => 0,
        };

        Self {
            full_name: full_name(personal_info),
            birth_date: personal_info.text(personal::BIRTH_DATE),
            phone: personal_info.text(personal::PHONE),
            email: personal_info.text(personal::EMAIL),
            amount,
            term_months,
            purpose: credit_info.text(credit::PURPOSE),
            monthly_income: form.work_info.number(work::MONTHLY_INCOME),
            estimated_monthly_payment,
        }
    }
}

fn full_name(personal_info: &SectionData) -> String {
    [personal::LAST_NAME, personal::FIRST_NAME, personal::MIDDLE_NAME]
        .into_iter()
        .map(|field| personal_info.text(field))
        .filter(|part| !part.trim().is_empty())
        .map(|part| part.trim().to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Annuity payment rounded to whole currency units; zero for an empty amount or term.
pub fn estimate_monthly_payment(amount: f64, term_months: u32, annual_rate: f64) -> u64 {
    if amount <= 0.0 || term_months == 0 {
        return 0;
    }

    let monthly_rate = annual_rate / 12.0;
    if monthly_rate <= 0.0 {
        return (amount / term_months as f64).round() as u64;
    }

    let growth = (1.0 + monthly_rate).powi(term_months as i32);
    let payment = amount * monthly_rate * growth / (growth - 1.0);
    payment.round() as u64
}

/// Everything handed to the submission transport.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmittedApplication {
    pub summary: ApplicationSummary,
    pub form_data: FormData,
}

/// Outbound transport for completed applications (HTTP client, queue, outbox...).
pub trait ApplicationSubmitter: Send + Sync {
    fn submit(&self, application: &SubmittedApplication) -> Result<(), SubmissionError>;
}

#[derive(Debug, thiserror::Error)]
pub enum SubmissionError {
    #[error("submission transport unavailable: {0}")]
    Transport(String),
}

/// Result of a submission attempt.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SubmissionOutcome {
    Submitted { summary: ApplicationSummary },
    Rejected { validation: ValidationResult },
}
