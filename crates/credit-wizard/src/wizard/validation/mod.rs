pub(crate) mod rules;
mod schema;

pub use rules::{Check, Condition, DateBound, FieldRule, Predicate};
pub use schema::{fields, schema, FieldKind, FieldSpec, SectionSchema, CREDIT_PURPOSES};

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};

use super::domain::{SectionData, SectionName};

/// Source of "today" for date-relative rules such as the applicant's age.
pub trait Clock: Send + Sync + fmt::Debug {
    fn today(&self) -> NaiveDate;
}

/// Local calendar date of the host.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

/// Outcome of validating one section: per-field reasons and the overall flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub section: SectionName,
    pub field_errors: BTreeMap<String, String>,
    pub is_valid: bool,
}

impl ValidationResult {
    pub fn error(&self, field: &str) -> Option<&str> {
        self.field_errors.get(field).map(String::as_str)
    }
}

/// Stateless evaluator applying the section schemas to submitted data.
#[derive(Debug, Clone)]
pub struct ValidationEngine {
    clock: Arc<dyn Clock>,
}

impl ValidationEngine {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    pub fn fixed(today: NaiveDate) -> Self {
        Self::new(Arc::new(FixedClock(today)))
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    pub fn validate(&self, section: SectionName, data: &SectionData) -> ValidationResult {
        let schema = schema(section);
        let effective = schema.with_defaults(data);
        let today = self.clock.today();

        let field_errors: BTreeMap<String, String> = schema
            .rules()
            .iter()
            .filter_map(|rule| {
                rules::evaluate(rule, &effective, today)
                    .map(|message| (rule.field.to_string(), message))
            })
            .collect();

        ValidationResult {
            section,
            is_valid: field_errors.is_empty(),
            field_errors,
        }
    }
}

impl Default for ValidationEngine {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}
