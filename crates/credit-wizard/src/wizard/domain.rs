use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::validation::schema;

/// The six fixed sections of a credit application, in wizard order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SectionName {
    PersonalInfo,
    PassportInfo,
    AddressInfo,
    WorkInfo,
    CreditInfo,
    Agreements,
}

impl SectionName {
    pub const ALL: [SectionName; 6] = [
        SectionName::PersonalInfo,
        SectionName::PassportInfo,
        SectionName::AddressInfo,
        SectionName::WorkInfo,
        SectionName::CreditInfo,
        SectionName::Agreements,
    ];

    /// Storage and wire key of the section.
    pub const fn key(self) -> &'static str {
        match self {
            SectionName::PersonalInfo => "personalInfo",
            SectionName::PassportInfo => "passportInfo",
            SectionName::AddressInfo => "addressInfo",
            SectionName::WorkInfo => "workInfo",
            SectionName::CreditInfo => "creditInfo",
            SectionName::Agreements => "agreements",
        }
    }

    /// The wizard step this section is bound to.
    pub const fn step(self) -> Step {
        Step(self as u8 + 1)
    }
}

impl fmt::Display for SectionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for SectionName {
    type Err = WizardError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        SectionName::ALL
            .into_iter()
            .find(|section| section.key() == value)
            .ok_or_else(|| WizardError::UnknownSection(value.to_string()))
    }
}

/// Active wizard step, always within `1..=6`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Step(u8);

impl Step {
    pub const FIRST: Step = Step(1);
    pub const LAST: Step = Step(6);

    pub const fn new(value: u8) -> Option<Self> {
        if value >= Self::FIRST.0 && value <= Self::LAST.0 {
            Some(Step(value))
        } else {
            None
        }
    }

    /// Clamp an arbitrary persisted value into the valid step range.
    pub fn clamped(value: i64) -> Self {
        Step(value.clamp(Self::FIRST.0 as i64, Self::LAST.0 as i64) as u8)
    }

    pub const fn number(self) -> u8 {
        self.0
    }

    pub fn section(self) -> SectionName {
        SectionName::ALL[(self.0 - 1) as usize]
    }

    pub const fn next(self) -> Option<Self> {
        Self::new(self.0 + 1)
    }

    pub const fn previous(self) -> Option<Self> {
        Self::new(self.0 - 1)
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u8> for Step {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Step::new(value).ok_or_else(|| format!("step {value} is outside 1..=6"))
    }
}

impl From<Step> for u8 {
    fn from(step: Step) -> Self {
        step.0
    }
}

/// Raw field value as entered by the applicant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Flag(bool),
    Number(f64),
    Text(String),
}

impl FieldValue {
    pub fn empty() -> Self {
        FieldValue::Text(String::new())
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, FieldValue::Text(text) if text.is_empty())
    }

    pub fn as_flag(&self) -> Option<bool> {
        match self {
            FieldValue::Flag(flag) => Some(*flag),
            _ => None,
        }
    }

    /// Numeric interpretation; numeric text counts, surrounding whitespace does not.
    pub fn as_number(&self) -> Option<f64> {
        let number = match self {
            FieldValue::Number(number) => *number,
            FieldValue::Text(text) => text.parse::<f64>().ok()?,
            FieldValue::Flag(_) => return None,
        };
        number.is_finite().then_some(number)
    }

    pub(crate) fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Bool(flag) => Some(FieldValue::Flag(*flag)),
            serde_json::Value::Number(number) => number.as_f64().map(FieldValue::Number),
            serde_json::Value::String(text) => Some(FieldValue::Text(text.clone())),
            _ => None,
        }
    }

    pub(crate) fn to_json(&self) -> serde_json::Value {
        match self {
            FieldValue::Flag(flag) => serde_json::Value::Bool(*flag),
            FieldValue::Number(number) => serde_json::Number::from_f64(*number)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            FieldValue::Text(text) => serde_json::Value::String(text.clone()),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Flag(flag) => write!(f, "{flag}"),
            FieldValue::Number(number) => write!(f, "{number}"),
            FieldValue::Text(text) => f.write_str(text),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Flag(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Number(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Number(value as f64)
    }
}

/// Field name to value mapping for one section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SectionData(BTreeMap<String, FieldValue>);

impl SectionData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, convenient for partial updates.
    pub fn with(mut self, field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.set(field, value);
        self
    }

    pub fn set(&mut self, field: impl Into<String>, value: impl Into<FieldValue>) {
        self.0.insert(field.into(), value.into());
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.0.get(field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn flag(&self, field: &str) -> bool {
        self.get(field)
            .and_then(FieldValue::as_flag)
            .unwrap_or(false)
    }

    pub fn number(&self, field: &str) -> Option<f64> {
        self.get(field).and_then(FieldValue::as_number)
    }

    /// Display text of a field, empty when absent.
    pub fn text(&self, field: &str) -> String {
        self.get(field).map(ToString::to_string).unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.0.iter().map(|(field, value)| (field.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Shallow field-level merge: fields in `partial` overwrite, the rest stay.
    pub(crate) fn merge(&mut self, partial: SectionData) {
        self.0.extend(partial.0);
    }
}

impl<K, V> FromIterator<(K, V)> for SectionData
where
    K: Into<String>,
    V: Into<FieldValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        SectionData(
            iter.into_iter()
                .map(|(field, value)| (field.into(), value.into()))
                .collect(),
        )
    }
}

/// All six sections of the application.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormData {
    pub personal_info: SectionData,
    pub passport_info: SectionData,
    pub address_info: SectionData,
    pub work_info: SectionData,
    pub credit_info: SectionData,
    pub agreements: SectionData,
}

impl FormData {
    pub fn section(&self, name: SectionName) -> &SectionData {
        match name {
            SectionName::PersonalInfo => &self.personal_info,
            SectionName::PassportInfo => &self.passport_info,
            SectionName::AddressInfo => &self.address_info,
            SectionName::WorkInfo => &self.work_info,
            SectionName::CreditInfo => &self.credit_info,
            SectionName::Agreements => &self.agreements,
        }
    }

    pub(crate) fn section_mut(&mut self, name: SectionName) -> &mut SectionData {
        match name {
            SectionName::PersonalInfo => &mut self.personal_info,
            SectionName::PassportInfo => &mut self.passport_info,
            SectionName::AddressInfo => &mut self.address_info,
            SectionName::WorkInfo => &mut self.work_info,
            SectionName::CreditInfo => &mut self.credit_info,
            SectionName::Agreements => &mut self.agreements,
        }
    }
}

impl Default for FormData {
    fn default() -> Self {
        Self {
            personal_info: schema(SectionName::PersonalInfo).defaults(),
            passport_info: schema(SectionName::PassportInfo).defaults(),
            address_info: schema(SectionName::AddressInfo).defaults(),
            work_info: schema(SectionName::WorkInfo).defaults(),
            credit_info: schema(SectionName::CreditInfo).defaults(),
            agreements: schema(SectionName::Agreements).defaults(),
        }
    }
}

/// Root aggregate of one wizard session.
///
/// Only [`CreditApplicationWizard`](super::CreditApplicationWizard) mutates it; everyone
/// else gets read access.
#[derive(Debug, Clone, PartialEq)]
pub struct ApplicationState {
    pub(crate) current_step: Step,
    pub(crate) completed_steps: BTreeSet<Step>,
    pub(crate) form_data: FormData,
    pub(crate) is_form_valid: bool,
}

impl ApplicationState {
    pub fn current_step(&self) -> Step {
        self.current_step
    }

    pub fn completed_steps(&self) -> &BTreeSet<Step> {
        &self.completed_steps
    }

    pub fn form_data(&self) -> &FormData {
        &self.form_data
    }

    pub fn section(&self, name: SectionName) -> &SectionData {
        self.form_data.section(name)
    }

    /// Validity of the section bound to the current step, as of the last mutation.
    pub fn is_form_valid(&self) -> bool {
        self.is_form_valid
    }

    /// Last step reached with every earlier step completed.
    pub fn is_complete(&self) -> bool {
        self.current_step == Step::LAST
            && SectionName::ALL[..5]
                .iter()
                .all(|section| self.completed_steps.contains(&section.step()))
    }
}

impl Default for ApplicationState {
    fn default() -> Self {
        Self {
            current_step: Step::FIRST,
            completed_steps: BTreeSet::new(),
            form_data: FormData::default(),
            is_form_valid: false,
        }
    }
}

/// Caller-side misuse of the wizard; distinct from applicant validation errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WizardError {
    #[error("unknown section `{0}`")]
    UnknownSection(String),
    #[error("section `{section}` has no field `{field}`")]
    UnknownField { section: SectionName, field: String },
    #[error("field `{section}.{field}` expects a {expected} value")]
    FieldKindMismatch {
        section: SectionName,
        field: String,
        expected: &'static str,
    },
    #[error("wizard session unavailable")]
    SessionUnavailable,
}
