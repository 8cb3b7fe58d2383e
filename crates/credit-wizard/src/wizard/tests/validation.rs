use super::common::*;
use chrono::NaiveDate;

use crate::wizard::domain::{FieldValue, SectionData, SectionName};
use crate::wizard::validation::fields::{address, agreements, credit, passport, personal, work};
use crate::wizard::validation::{FieldRule, ValidationEngine, CREDIT_PURPOSES};

fn personal_with(field: &str, value: impl Into<FieldValue>) -> SectionData {
    let mut data = personal_info();
    data.set(field, value);
    data
}

#[test]
fn complete_sections_validate_cleanly() {
    let engine = engine();
    for section in SectionName::ALL {
        let result = engine.validate(section, &valid_section(section));
        assert!(
            result.is_valid,
            "{section} should be valid, got {:?}",
            result.field_errors
        );
        assert_eq!(result.section, section);
    }
}

#[test]
fn validation_is_deterministic_for_fixed_clock() {
    let engine = engine();
    let data = personal_with(personal::BIRTH_DATE, "2007-06-16");

    let first = engine.validate(SectionName::PersonalInfo, &data);
    let second = engine.validate(SectionName::PersonalInfo, &data);
    assert_eq!(first, second);
}

#[test]
fn empty_personal_section_reports_every_required_field() {
    let result = engine().validate(SectionName::PersonalInfo, &SectionData::new());

    assert!(!result.is_valid);
    assert_eq!(result.error(personal::FIRST_NAME), Some("First name is required"));
    assert_eq!(result.error(personal::LAST_NAME), Some("Last name is required"));
    assert_eq!(result.error(personal::BIRTH_DATE), Some("Birth date is required"));
    assert_eq!(result.error(personal::PHONE), Some("Phone is required"));
    assert_eq!(result.error(personal::EMAIL), Some("Email is required"));
    assert_eq!(result.error(personal::MIDDLE_NAME), None);
}

#[test]
fn first_failing_check_wins() {
    let result = engine().validate(
        SectionName::PersonalInfo,
        &personal_with(personal::FIRST_NAME, "J"),
    );
    assert_eq!(
        result.error(personal::FIRST_NAME),
        Some("First name must contain at least 2 characters")
    );

    let result = engine().validate(
        SectionName::PersonalInfo,
        &personal_with(personal::FIRST_NAME, "John"),
    );
    assert_eq!(
        result.error(personal::FIRST_NAME),
        Some("First name may only contain Cyrillic letters")
    );
}

#[test]
fn optional_middle_name_is_checked_only_when_present() {
    let result = engine().validate(
        SectionName::PersonalInfo,
        &personal_with(personal::MIDDLE_NAME, ""),
    );
    assert!(result.is_valid);

    let result = engine().validate(
        SectionName::PersonalInfo,
        &personal_with(personal::MIDDLE_NAME, "Sergeevich"),
    );
    assert_eq!(
        result.error(personal::MIDDLE_NAME),
        Some("Middle name may only contain Cyrillic letters")
    );
}

#[test]
fn birth_date_enforces_age_window() {
    let engine = engine();
    let cases = [
        ("2007-06-15", None),
        ("2007-06-16", Some("Applicant must be at least 18 years old")),
        ("1925-06-15", None),
        ("1925-06-14", Some("Applicant cannot be older than 100 years")),
    ];

    for (birth_date, expected) in cases {
        let result = engine.validate(
            SectionName::PersonalInfo,
            &personal_with(personal::BIRTH_DATE, birth_date),
        );
        assert_eq!(result.error(personal::BIRTH_DATE), expected, "{birth_date}");
    }
}

#[test]
fn unparseable_dates_are_reported() {
    let result = engine().validate(
        SectionName::PersonalInfo,
        &personal_with(personal::BIRTH_DATE, "12.04.1990"),
    );
    assert_eq!(
        result.error(personal::BIRTH_DATE),
        Some("Birth date must be a valid date (YYYY-MM-DD)")
    );
}

#[test]
fn age_window_follows_the_clock() {
    let birthday = personal_with(personal::BIRTH_DATE, "2007-06-16");
    let eve = ValidationEngine::fixed(NaiveDate::from_ymd_opt(2025, 6, 15).expect("valid"));
    let birthday_morning =
        ValidationEngine::fixed(NaiveDate::from_ymd_opt(2025, 6, 16).expect("valid"));

    assert!(!eve.validate(SectionName::PersonalInfo, &birthday).is_valid);
    assert!(birthday_morning
        .validate(SectionName::PersonalInfo, &birthday)
        .is_valid);
}

#[test]
fn phone_requires_exact_mask() {
    let engine = engine();
    for phone in [
        "+77765311600",
        "8 (776) 531 16 00",
        "+7 (776) 531-16-00",
        " +7 (776) 531 16 00",
    ] {
        let result = engine.validate(
            SectionName::PersonalInfo,
            &personal_with(personal::PHONE, phone),
        );
        assert_eq!(
            result.error(personal::PHONE),
            Some("Phone must match +7 (776) 531 16 00"),
            "{phone}"
        );
    }
}

#[test]
fn email_must_be_well_formed() {
    let result = engine().validate(
        SectionName::PersonalInfo,
        &personal_with(personal::EMAIL, "ivan.petrov@example"),
    );
    assert_eq!(result.error(personal::EMAIL), Some("Email address is not valid"));
}

#[test]
fn passport_series_and_number_lengths() {
    let engine = engine();
    let mut data = passport_info();
    data.set(passport::SERIES, "4");
    data.set(passport::NUMBER, "123456789");

    let result = engine.validate(SectionName::PassportInfo, &data);
    assert_eq!(
        result.error(passport::SERIES),
        Some("Series must contain 2-4 digits")
    );
    assert_eq!(
        result.error(passport::NUMBER),
        Some("Number must contain 7-8 digits")
    );

    data.set(passport::SERIES, "45");
    data.set(passport::NUMBER, "12345678");
    assert!(engine.validate(SectionName::PassportInfo, &data).is_valid);
}

#[test]
fn issue_date_cannot_be_in_the_future() {
    let mut data = passport_info();
    data.set(passport::ISSUE_DATE, "2025-06-16");
    let result = engine().validate(SectionName::PassportInfo, &data);
    assert_eq!(
        result.error(passport::ISSUE_DATE),
        Some("Issue date cannot be in the future")
    );

    data.set(passport::ISSUE_DATE, "2025-06-15");
    assert!(engine().validate(SectionName::PassportInfo, &data).is_valid);
}

#[test]
fn actual_address_required_only_when_not_same_as_registration() {
    let engine = engine();
    let mut data = SectionData::new()
        .with(address::REGISTRATION_ADDRESS, "Almaty, Abay avenue 10, apt 5")
        .with(address::SAME_AS_REGISTRATION, false);

    let result = engine.validate(SectionName::AddressInfo, &data);
    assert_eq!(
        result.error(address::ACTUAL_ADDRESS),
        Some("Actual address is required")
    );

    data.set(address::SAME_AS_REGISTRATION, true);
    assert!(engine.validate(SectionName::AddressInfo, &data).is_valid);
}

#[test]
fn numeric_fields_accept_numeric_text() {
    let data = SectionData::new()
        .with(work::COMPANY, "Kaspi Logistics")
        .with(work::POSITION, "Engineer")
        .with(work::WORK_EXPERIENCE, "5")
        .with(work::MONTHLY_INCOME, "50000");
    assert!(engine().validate(SectionName::WorkInfo, &data).is_valid);
}

#[test]
fn work_experience_must_be_whole_years_within_range() {
    let engine = engine();
    let mut data = work_info();

    data.set(work::WORK_EXPERIENCE, 5.5);
    assert_eq!(
        engine.validate(SectionName::WorkInfo, &data).error(work::WORK_EXPERIENCE),
        Some("Work experience must be a whole number of years")
    );

    data.set(work::WORK_EXPERIENCE, 51_i64);
    assert_eq!(
        engine.validate(SectionName::WorkInfo, &data).error(work::WORK_EXPERIENCE),
        Some("Work experience cannot exceed 50 years")
    );

    data.set(work::WORK_EXPERIENCE, "five");
    assert_eq!(
        engine.validate(SectionName::WorkInfo, &data).error(work::WORK_EXPERIENCE),
        Some("Work experience must be a number")
    );
}

#[test]
fn monthly_income_minimum() {
    let mut data = work_info();
    data.set(work::MONTHLY_INCOME, 49_999_i64);
    let result = engine().validate(SectionName::WorkInfo, &data);
    assert_eq!(
        result.error(work::MONTHLY_INCOME),
        Some("Minimum monthly income is 50,000")
    );
}

#[test]
fn optional_additional_income_is_range_checked_when_present() {
    let mut data = work_info();
    data.set(work::ADDITIONAL_INCOME, -1_i64);
    let result = engine().validate(SectionName::WorkInfo, &data);
    assert_eq!(
        result.error(work::ADDITIONAL_INCOME),
        Some("Additional income cannot be negative")
    );
}

#[test]
fn loan_amount_bounds() {
    let engine = engine();
    let mut data = credit_info();

    data.set(credit::AMOUNT, 499_999_i64);
    assert_eq!(
        engine.validate(SectionName::CreditInfo, &data).error(credit::AMOUNT),
        Some("Minimum loan amount is 500,000")
    );

    data.set(credit::AMOUNT, 100_000_001_i64);
    assert_eq!(
        engine.validate(SectionName::CreditInfo, &data).error(credit::AMOUNT),
        Some("Maximum loan amount is 100,000,000")
    );

    data.set(credit::AMOUNT, 500_000_i64);
    assert!(engine.validate(SectionName::CreditInfo, &data).is_valid);
}

#[test]
fn loan_term_bounds_and_integrality() {
    let engine = engine();
    let mut data = credit_info();

    for (term, expected) in [
        (FieldValue::from(5_i64), Some("Minimum term is 6 months")),
        (FieldValue::from(361_i64), Some("Maximum term is 360 months")),
        (
            FieldValue::from(12.5),
            Some("Loan term must be a whole number of months"),
        ),
        (FieldValue::from(360_i64), None),
    ] {
        data.set(credit::TERM, term.clone());
        assert_eq!(
            engine.validate(SectionName::CreditInfo, &data).error(credit::TERM),
            expected,
            "{term}"
        );
    }
}

#[test]
fn purpose_must_come_from_the_list() {
    let engine = engine();
    let mut data = credit_info();
    for purpose in CREDIT_PURPOSES {
        data.set(credit::PURPOSE, purpose);
        assert!(engine.validate(SectionName::CreditInfo, &data).is_valid, "{purpose}");
    }

    data.set(credit::PURPOSE, "Yacht");
    assert_eq!(
        engine.validate(SectionName::CreditInfo, &data).error(credit::PURPOSE),
        Some("Choose one of the listed loan purposes")
    );
}

#[test]
fn other_credits_info_required_only_when_flagged() {
    let engine = engine();
    let mut data = credit_info();
    data.set(credit::HAS_OTHER_CREDITS, true);

    let result = engine.validate(SectionName::CreditInfo, &data);
    assert_eq!(
        result.error(credit::OTHER_CREDITS_INFO),
        Some("Provide details about your other credits")
    );

    data.set(credit::OTHER_CREDITS_INFO, "Mortgage, 120,000 per month");
    assert!(engine.validate(SectionName::CreditInfo, &data).is_valid);
}

#[test]
fn agreements_require_both_mandatory_consents() {
    let engine = engine();
    let result = engine.validate(SectionName::Agreements, &SectionData::new());
    assert_eq!(
        result.error(agreements::DATA_PROCESSING),
        Some("Consent to personal data processing is required")
    );
    assert_eq!(
        result.error(agreements::CREDIT_CONDITIONS),
        Some("Agreement with the credit conditions is required")
    );
    assert_eq!(result.error(agreements::NOTIFICATIONS), None);

    let data = SectionData::new()
        .with(agreements::DATA_PROCESSING, true)
        .with(agreements::CREDIT_CONDITIONS, false);
    let result = engine.validate(SectionName::Agreements, &data);
    assert!(!result.is_valid);
    assert_eq!(result.field_errors.len(), 1);
}

#[test]
fn rule_condition_tracks_current_value() {
    let rule = FieldRule::new(credit::OTHER_CREDITS_INFO, "Other credits")
        .required("required")
        .when(credit::HAS_OTHER_CREDITS, true);

    assert!(rule.is_required());
    assert!(!rule.is_active(&SectionData::new()));
    assert!(rule.is_active(&SectionData::new().with(credit::HAS_OTHER_CREDITS, true)));
}

#[test]
fn trim_lets_padded_values_pass_length_checks() {
    let rule = FieldRule::new(work::COMPANY, "Company")
        .required("Company is required")
        .trim()
        .min_length(3, "too short")
        .one_of(["ACME"], "unknown company");
    let data = SectionData::new().with(work::COMPANY, "  ACME  ");

    assert_eq!(
        crate::wizard::validation::rules::evaluate(&rule, &data, today()),
        None
    );
}
