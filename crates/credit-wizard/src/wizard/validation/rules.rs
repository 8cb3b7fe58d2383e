use std::borrow::Cow;

use chrono::{Months, NaiveDate};
use regex::Regex;

use super::super::domain::{FieldValue, SectionData};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Calendar bound resolved against the evaluation date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateBound {
    Today,
    YearsAgo(u32),
}

impl DateBound {
    pub fn resolve(self, today: NaiveDate) -> NaiveDate {
        match self {
            DateBound::Today => today,
            DateBound::YearsAgo(years) => today
                .checked_sub_months(Months::new(years.saturating_mul(12)))
                .unwrap_or(NaiveDate::MIN),
        }
    }
}

/// One constraint kind; interpreted by [`evaluate`].
#[derive(Debug, Clone)]
pub enum Predicate {
    Required,
    /// Later predicates see the value with surrounding whitespace removed.
    Trim,
    MinLength(usize),
    Matches(Regex),
    Integer,
    Min(f64),
    Max(f64),
    NotBefore(DateBound),
    NotAfter(DateBound),
    OneOf(Vec<FieldValue>),
}

#[derive(Debug, Clone)]
pub struct Check {
    pub predicate: Predicate,
    pub message: String,
}

/// Rule is active only while `field` currently equals `equals`.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub field: &'static str,
    pub equals: FieldValue,
}

/// Ordered checks attached to a single field.
#[derive(Debug, Clone)]
pub struct FieldRule {
    pub field: &'static str,
    pub label: &'static str,
    pub checks: Vec<Check>,
    pub condition: Option<Condition>,
}

impl FieldRule {
    pub fn new(field: &'static str, label: &'static str) -> Self {
        Self {
            field,
            label,
            checks: Vec::new(),
            condition: None,
        }
    }

    fn check(mut self, predicate: Predicate, message: impl Into<String>) -> Self {
        self.checks.push(Check {
            predicate,
            message: message.into(),
        });
        self
    }

    pub fn required(self, message: impl Into<String>) -> Self {
        self.check(Predicate::Required, message)
    }

    pub fn trim(self) -> Self {
        self.check(Predicate::Trim, String::new())
    }

    pub fn min_length(self, length: usize, message: impl Into<String>) -> Self {
        self.check(Predicate::MinLength(length), message)
    }

    pub fn matches(self, pattern: &Regex, message: impl Into<String>) -> Self {
        self.check(Predicate::Matches(pattern.clone()), message)
    }

    pub fn integer(self, message: impl Into<String>) -> Self {
        self.check(Predicate::Integer, message)
    }

    pub fn min(self, bound: f64, message: impl Into<String>) -> Self {
        self.check(Predicate::Min(bound), message)
    }

    pub fn max(self, bound: f64, message: impl Into<String>) -> Self {
        self.check(Predicate::Max(bound), message)
    }

    pub fn not_before(self, bound: DateBound, message: impl Into<String>) -> Self {
        self.check(Predicate::NotBefore(bound), message)
    }

    pub fn not_after(self, bound: DateBound, message: impl Into<String>) -> Self {
        self.check(Predicate::NotAfter(bound), message)
    }

    pub fn one_of<I, V>(self, allowed: I, message: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<FieldValue>,
    {
        let allowed = allowed.into_iter().map(Into::into).collect();
        self.check(Predicate::OneOf(allowed), message)
    }

    pub fn when(mut self, field: &'static str, equals: impl Into<FieldValue>) -> Self {
        self.condition = Some(Condition {
            field,
            equals: equals.into(),
        });
        self
    }

    pub fn is_required(&self) -> bool {
        self.checks
            .iter()
            .any(|check| matches!(check.predicate, Predicate::Required))
    }

    /// Whether the rule's condition holds for `data` (always true without a condition).
    pub fn is_active(&self, data: &SectionData) -> bool {
        match &self.condition {
            Some(condition) => data.get(condition.field) == Some(&condition.equals),
            None => true,
        }
    }
}

/// Evaluate one rule, returning the first failing check's message.
///
/// `data` must already carry schema defaults for missing fields.
pub(crate) fn evaluate(rule: &FieldRule, data: &SectionData, today: NaiveDate) -> Option<String> {
    if !rule.is_active(data) {
        return None;
    }

    let value = data.get(rule.field).cloned().unwrap_or_else(FieldValue::empty);
    if value.is_empty() && !rule.is_required() {
        return None;
    }

    let raw = value.to_string();
    let mut text: Cow<'_, str> = Cow::Borrowed(raw.as_str());

    for check in &rule.checks {
        let passed = match &check.predicate {
            Predicate::Required => !matches!(value, FieldValue::Text(_)) || !text.is_empty(),
            Predicate::Trim => {
                text = Cow::Owned(text.trim().to_string());
                true
            }
            Predicate::MinLength(length) => text.chars().count() >= *length,
            Predicate::Matches(pattern) => pattern.is_match(&text),
            Predicate::Integer => match numeric(&value, &text) {
                Some(number) => number.fract() == 0.0,
                None => return Some(not_a_number(rule)),
            },
            Predicate::Min(bound) => match numeric(&value, &text) {
                Some(number) => number >= *bound,
                None => return Some(not_a_number(rule)),
            },
            Predicate::Max(bound) => match numeric(&value, &text) {
                Some(number) => number <= *bound,
                None => return Some(not_a_number(rule)),
            },
            Predicate::NotBefore(bound) => match parse_date(&text) {
                Some(date) => date >= bound.resolve(today),
                None => return Some(not_a_date(rule)),
            },
            Predicate::NotAfter(bound) => match parse_date(&text) {
                Some(date) => date <= bound.resolve(today),
                None => return Some(not_a_date(rule)),
            },
            Predicate::OneOf(allowed) => allowed.iter().any(|candidate| match candidate {
                FieldValue::Text(expected) => {
                    matches!(value, FieldValue::Text(_)) && expected.as_str() == text.as_ref()
                }
                other => other == &value,
            }),
        };

        if !passed {
            return Some(check.message.clone());
        }
    }

    None
}

fn not_a_number(rule: &FieldRule) -> String {
    format!("{} must be a number", rule.label)
}

fn not_a_date(rule: &FieldRule) -> String {
    format!("{} must be a valid date (YYYY-MM-DD)", rule.label)
}

fn parse_date(text: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text, DATE_FORMAT).ok()
}

fn numeric(value: &FieldValue, text: &str) -> Option<f64> {
    match value {
        FieldValue::Number(_) => value.as_number(),
        _ => FieldValue::Text(text.to_string()).as_number(),
    }
}
