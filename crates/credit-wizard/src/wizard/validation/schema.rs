use std::sync::LazyLock;

use regex::Regex;

use super::super::domain::{FieldValue, SectionData, SectionName};
use super::rules::{DateBound, FieldRule};

/// Field names referenced outside the schema tables.
pub mod fields {
    pub mod personal {
        pub const FIRST_NAME: &str = "firstName";
        pub const LAST_NAME: &str = "lastName";
        pub const MIDDLE_NAME: &str = "middleName";
        pub const BIRTH_DATE: &str = "birthDate";
        pub const PHONE: &str = "phone";
        pub const EMAIL: &str = "email";
    }

    pub mod passport {
        pub const SERIES: &str = "series";
        pub const NUMBER: &str = "number";
        pub const ISSUED_BY: &str = "issuedBy";
        pub const ISSUE_DATE: &str = "issueDate";
        pub const BIRTH_PLACE: &str = "birthPlace";
    }

    pub mod address {
        pub const REGISTRATION_ADDRESS: &str = "registrationAddress";
        pub const ACTUAL_ADDRESS: &str = "actualAddress";
        pub const SAME_AS_REGISTRATION: &str = "sameAsRegistration";
    }

    pub mod work {
        pub const COMPANY: &str = "company";
        pub const POSITION: &str = "position";
        pub const WORK_EXPERIENCE: &str = "workExperience";
        pub const MONTHLY_INCOME: &str = "monthlyIncome";
        pub const ADDITIONAL_INCOME: &str = "additionalIncome";
    }

    pub mod credit {
        pub const AMOUNT: &str = "amount";
        pub const TERM: &str = "term";
        pub const PURPOSE: &str = "purpose";
        pub const HAS_OTHER_CREDITS: &str = "hasOtherCredits";
        pub const OTHER_CREDITS_INFO: &str = "otherCreditsInfo";
    }

    pub mod agreements {
        pub const DATA_PROCESSING: &str = "dataProcessing";
        pub const CREDIT_CONDITIONS: &str = "creditConditions";
        pub const NOTIFICATIONS: &str = "notifications";
    }
}

use fields::{address, agreements, credit, passport, personal, work};

/// Loan purposes an applicant may choose from, stored verbatim in the snapshot.
pub const CREDIT_PURPOSES: [&str; 9] = [
    "Покупка автомобиля",
    "Покупка недвижимости",
    "Ремонт и обустройство",
    "Образование",
    "Лечение",
    "Развитие бизнеса",
    "Консолидация кредитов",
    "Личные нужды",
    "Другое",
];

static CYRILLIC_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[а-яёА-ЯЁ\s]+$").expect("Invalid regex pattern"));
static PHONE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\+7 \([0-9]{3}\) [0-9]{3} [0-9]{2} [0-9]{2}$").expect("Invalid regex pattern")
});
static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9-]+(\.[A-Za-z0-9-]+)*\.[A-Za-z]{2,}$")
        .expect("Invalid regex pattern")
});
static PASSPORT_SERIES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{2,4}$").expect("Invalid regex pattern"));
static PASSPORT_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{7,8}$").expect("Invalid regex pattern"));

/// Storage shape of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Number,
    Date,
    Flag,
}

impl FieldKind {
    pub const fn label(self) -> &'static str {
        match self {
            FieldKind::Text => "text",
            FieldKind::Number => "number",
            FieldKind::Date => "date",
            FieldKind::Flag => "boolean",
        }
    }

    pub fn accepts(self, value: &FieldValue) -> bool {
        match self {
            FieldKind::Flag => matches!(value, FieldValue::Flag(_)),
            FieldKind::Date => matches!(value, FieldValue::Text(_)),
            FieldKind::Text | FieldKind::Number => !matches!(value, FieldValue::Flag(_)),
        }
    }

    /// Interpret raw user input (e.g. a CLI argument) for this kind.
    ///
    /// Number input stays textual so validation can report it verbatim.
    pub fn parse_input(self, raw: &str) -> Option<FieldValue> {
        match self {
            FieldKind::Flag => match raw.trim().to_ascii_lowercase().as_str() {
                "true" | "yes" | "1" => Some(FieldValue::Flag(true)),
                "false" | "no" | "0" => Some(FieldValue::Flag(false)),
                _ => None,
            },
            _ => Some(FieldValue::Text(raw.to_string())),
        }
    }

    const fn default_value(self) -> FieldValue {
        match self {
            FieldKind::Flag => FieldValue::Flag(false),
            _ => FieldValue::Text(String::new()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
}

/// Declared fields and rules of one section.
#[derive(Debug, Clone)]
pub struct SectionSchema {
    section: SectionName,
    fields: Vec<FieldSpec>,
    rules: Vec<FieldRule>,
}

impl SectionSchema {
    pub fn section(&self) -> SectionName {
        self.section
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn rules(&self) -> &[FieldRule] {
        &self.rules
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|spec| spec.name == name)
    }

    pub fn defaults(&self) -> SectionData {
        self.fields
            .iter()
            .map(|spec| (spec.name, spec.kind.default_value()))
            .collect()
    }

    /// `data` overlaid on the defaults, so every declared field has a value.
    pub fn with_defaults(&self, data: &SectionData) -> SectionData {
        let mut effective = self.defaults();
        effective.merge(data.clone());
        effective
    }
}

static SCHEMAS: LazyLock<Vec<SectionSchema>> = LazyLock::new(|| {
    SectionName::ALL
        .into_iter()
        .map(|section| match section {
            SectionName::PersonalInfo => personal_info(),
            SectionName::PassportInfo => passport_info(),
            SectionName::AddressInfo => address_info(),
            SectionName::WorkInfo => work_info(),
            SectionName::CreditInfo => credit_info(),
            SectionName::Agreements => agreement_terms(),
        })
        .collect()
});

/// Schema of a section.
pub fn schema(section: SectionName) -> &'static SectionSchema {
    &SCHEMAS[section as usize]
}

fn spec(name: &'static str, kind: FieldKind) -> FieldSpec {
    FieldSpec { name, kind }
}

fn personal_info() -> SectionSchema {
    SectionSchema {
        section: SectionName::PersonalInfo,
        fields: vec![
            spec(personal::FIRST_NAME, FieldKind::Text),
            spec(personal::LAST_NAME, FieldKind::Text),
            spec(personal::MIDDLE_NAME, FieldKind::Text),
            spec(personal::BIRTH_DATE, FieldKind::Date),
            spec(personal::PHONE, FieldKind::Text),
            spec(personal::EMAIL, FieldKind::Text),
        ],
        rules: vec![
            FieldRule::new(personal::FIRST_NAME, "First name")
                .required("First name is required")
                .min_length(2, "First name must contain at least 2 characters")
                .matches(&CYRILLIC_NAME, "First name may only contain Cyrillic letters"),
            FieldRule::new(personal::LAST_NAME, "Last name")
                .required("Last name is required")
                .min_length(2, "Last name must contain at least 2 characters")
                .matches(&CYRILLIC_NAME, "Last name may only contain Cyrillic letters"),
            FieldRule::new(personal::MIDDLE_NAME, "Middle name")
                .min_length(2, "Middle name must contain at least 2 characters")
                .matches(&CYRILLIC_NAME, "Middle name may only contain Cyrillic letters"),
            FieldRule::new(personal::BIRTH_DATE, "Birth date")
                .required("Birth date is required")
                .not_after(
                    DateBound::YearsAgo(18),
                    "Applicant must be at least 18 years old",
                )
                .not_before(
                    DateBound::YearsAgo(100),
                    "Applicant cannot be older than 100 years",
                ),
            FieldRule::new(personal::PHONE, "Phone")
                .required("Phone is required")
                .matches(&PHONE, "Phone must match +7 (776) 531 16 00"),
            FieldRule::new(personal::EMAIL, "Email")
                .required("Email is required")
                .matches(&EMAIL, "Email address is not valid"),
        ],
    }
}

fn passport_info() -> SectionSchema {
    SectionSchema {
        section: SectionName::PassportInfo,
        fields: vec![
            spec(passport::SERIES, FieldKind::Text),
            spec(passport::NUMBER, FieldKind::Text),
            spec(passport::ISSUED_BY, FieldKind::Text),
            spec(passport::ISSUE_DATE, FieldKind::Date),
            spec(passport::BIRTH_PLACE, FieldKind::Text),
        ],
        rules: vec![
            FieldRule::new(passport::SERIES, "Document series")
                .required("Document series is required")
                .matches(&PASSPORT_SERIES, "Series must contain 2-4 digits"),
            FieldRule::new(passport::NUMBER, "Document number")
                .required("Document number is required")
                .matches(&PASSPORT_NUMBER, "Number must contain 7-8 digits"),
            FieldRule::new(passport::ISSUED_BY, "Issuing authority")
                .required("Issuing authority is required")
                .min_length(10, "Issuing authority must contain at least 10 characters"),
            FieldRule::new(passport::ISSUE_DATE, "Issue date")
                .required("Issue date is required")
                .not_after(DateBound::Today, "Issue date cannot be in the future"),
            FieldRule::new(passport::BIRTH_PLACE, "Place of birth")
                .required("Place of birth is required")
                .min_length(5, "Place of birth must contain at least 5 characters"),
        ],
    }
}

fn address_info() -> SectionSchema {
    SectionSchema {
        section: SectionName::AddressInfo,
        fields: vec![
            spec(address::REGISTRATION_ADDRESS, FieldKind::Text),
            spec(address::ACTUAL_ADDRESS, FieldKind::Text),
            spec(address::SAME_AS_REGISTRATION, FieldKind::Flag),
        ],
        rules: vec![
            FieldRule::new(address::REGISTRATION_ADDRESS, "Registration address")
                .required("Registration address is required")
                .min_length(
                    10,
                    "Registration address must contain at least 10 characters",
                ),
            FieldRule::new(address::ACTUAL_ADDRESS, "Actual address")
                .required("Actual address is required")
                .min_length(10, "Actual address must contain at least 10 characters")
                .when(address::SAME_AS_REGISTRATION, false),
        ],
    }
}

fn work_info() -> SectionSchema {
    SectionSchema {
        section: SectionName::WorkInfo,
        fields: vec![
            spec(work::COMPANY, FieldKind::Text),
            spec(work::POSITION, FieldKind::Text),
            spec(work::WORK_EXPERIENCE, FieldKind::Number),
            spec(work::MONTHLY_INCOME, FieldKind::Number),
            spec(work::ADDITIONAL_INCOME, FieldKind::Number),
        ],
        rules: vec![
            FieldRule::new(work::COMPANY, "Company")
                .required("Company is required")
                .min_length(3, "Company must contain at least 3 characters"),
            FieldRule::new(work::POSITION, "Position")
                .required("Position is required")
                .min_length(3, "Position must contain at least 3 characters"),
            FieldRule::new(work::WORK_EXPERIENCE, "Work experience")
                .required("Work experience is required")
                .min(0.0, "Work experience cannot be negative")
                .max(50.0, "Work experience cannot exceed 50 years")
                .integer("Work experience must be a whole number of years"),
            FieldRule::new(work::MONTHLY_INCOME, "Monthly income")
                .required("Monthly income is required")
                .min(50_000.0, "Minimum monthly income is 50,000")
                .max(50_000_000.0, "Maximum monthly income is 50,000,000"),
            FieldRule::new(work::ADDITIONAL_INCOME, "Additional income")
                .min(0.0, "Additional income cannot be negative")
                .max(50_000_000.0, "Maximum additional income is 50,000,000"),
        ],
    }
}

fn credit_info() -> SectionSchema {
    SectionSchema {
        section: SectionName::CreditInfo,
        fields: vec![
            spec(credit::AMOUNT, FieldKind::Number),
            spec(credit::TERM, FieldKind::Number),
            spec(credit::PURPOSE, FieldKind::Text),
            spec(credit::HAS_OTHER_CREDITS, FieldKind::Flag),
            spec(credit::OTHER_CREDITS_INFO, FieldKind::Text),
        ],
        rules: vec![
            FieldRule::new(credit::AMOUNT, "Loan amount")
                .required("Loan amount is required")
                .min(500_000.0, "Minimum loan amount is 500,000")
                .max(100_000_000.0, "Maximum loan amount is 100,000,000"),
            FieldRule::new(credit::TERM, "Loan term")
                .required("Loan term is required")
                .min(6.0, "Minimum term is 6 months")
                .max(360.0, "Maximum term is 360 months")
                .integer("Loan term must be a whole number of months"),
            FieldRule::new(credit::PURPOSE, "Loan purpose")
                .required("Loan purpose is required")
                .one_of(CREDIT_PURPOSES, "Choose one of the listed loan purposes"),
            FieldRule::new(credit::OTHER_CREDITS_INFO, "Other credits")
                .required("Provide details about your other credits")
                .when(credit::HAS_OTHER_CREDITS, true),
        ],
    }
}

fn agreement_terms() -> SectionSchema {
    SectionSchema {
        section: SectionName::Agreements,
        fields: vec![
            spec(agreements::DATA_PROCESSING, FieldKind::Flag),
            spec(agreements::CREDIT_CONDITIONS, FieldKind::Flag),
            spec(agreements::NOTIFICATIONS, FieldKind::Flag),
        ],
        rules: vec![
            FieldRule::new(agreements::DATA_PROCESSING, "Data processing consent").one_of(
                [true],
                "Consent to personal data processing is required",
            ),
            FieldRule::new(agreements::CREDIT_CONDITIONS, "Credit conditions consent")
                .one_of([true], "Agreement with the credit conditions is required"),
        ],
    }
}
