//! Intake answers and the enumerated option tables behind the select fields.
//!
//! Field identifiers form a closed set: a request naming any other key fails
//! to deserialize, so unknown keys never reach the answers map.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Every field the intake form can collect.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum FieldId {
    OrganizationName,
    Industry,
    CompanySize,
    ConsultingCategory,
    ProblemDescription,
    BusinessImpact,
    Urgency,
    PrimaryObjectives,
    SuccessMetrics,
    Budget,
    ScopeIncluded,
    ScopeExcluded,
    TimelineConstraints,
    DecisionMakerName,
    DecisionMakerTitle,
    OtherStakeholders,
    ContactName,
    ContactTitle,
    ContactEmail,
    ContactPhone,
}

impl FieldId {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OrganizationName => "organization_name",
            Self::Industry => "industry",
            Self::CompanySize => "company_size",
            Self::ConsultingCategory => "consulting_category",
            Self::ProblemDescription => "problem_description",
            Self::BusinessImpact => "business_impact",
            Self::Urgency => "urgency",
            Self::PrimaryObjectives => "primary_objectives",
            Self::SuccessMetrics => "success_metrics",
            Self::Budget => "budget",
            Self::ScopeIncluded => "scope_included",
            Self::ScopeExcluded => "scope_excluded",
            Self::TimelineConstraints => "timeline_constraints",
            Self::DecisionMakerName => "decision_maker_name",
            Self::DecisionMakerTitle => "decision_maker_title",
            Self::OtherStakeholders => "other_stakeholders",
            Self::ContactName => "contact_name",
            Self::ContactTitle => "contact_title",
            Self::ContactEmail => "contact_email",
            Self::ContactPhone => "contact_phone",
        }
    }
}

impl std::fmt::Display for FieldId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sparse field -> value mapping collected across the intake steps.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct IntakeAnswers(BTreeMap<FieldId, String>);

impl IntakeAnswers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw value of a field, empty when it was never set.
    pub fn get(&self, field: FieldId) -> &str {
        self.0.get(&field).map(String::as_str).unwrap_or("")
    }

    /// Last write wins.
    pub fn set(&mut self, field: FieldId, value: impl Into<String>) {
        self.0.insert(field, value.into());
    }

    /// A field counts as filled once its trimmed value is non-empty.
    pub fn is_filled(&self, field: FieldId) -> bool {
        !self.get(field).trim().is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (FieldId, &str)> {
        self.0.iter().map(|(k, v)| (*k, v.as_str()))
    }

    pub fn urgency(&self) -> Option<Urgency> {
        Urgency::parse(self.get(FieldId::Urgency))
    }

    pub fn category(&self) -> Option<ConsultingCategory> {
        ConsultingCategory::parse(self.get(FieldId::ConsultingCategory))
    }

    pub fn budget(&self) -> Option<BudgetRange> {
        BudgetRange::parse(self.get(FieldId::Budget))
    }
}

// =============================================================================
// Select option tables
// =============================================================================

/// A `(value, label)` pair offered by a single-select field.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct SelectOption {
    pub value: &'static str,
    pub label: &'static str,
}

/// Implements the stored-value <-> variant <-> display-label mapping for a
/// select enum. Every variant must appear exactly once, so a value that does
/// not parse is simply `None` rather than a silently missing label.
macro_rules! select_enum {
    ($name:ident { $($variant:ident => ($value:literal, $label:literal)),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const OPTIONS: &'static [SelectOption] = &[
                $(SelectOption { value: $value, label: $label }),+
            ];

            pub fn label(&self) -> &'static str {
                match self {
                    $(Self::$variant => $label),+
                }
            }

            pub fn parse(value: &str) -> Option<Self> {
                match value.trim() {
                    $($value => Some(Self::$variant),)+
                    _ => None,
                }
            }
        }
    };
}

select_enum!(CompanySize {
    Micro => ("1-50", "1-50 employees"),
    Small => ("51-200", "51-200 employees"),
    Medium => ("201-1000", "201-1,000 employees"),
    Large => ("1001-5000", "1,001-5,000 employees"),
    Enterprise => ("5000+", "5,000+ employees"),
});

select_enum!(ConsultingCategory {
    Strategy => ("STRATEGY", "Business Strategy"),
    Operations => ("OPERATIONS", "Operations & Process Improvement"),
    Technology => ("TECHNOLOGY", "Technology & Digital"),
    DigitalTransformation => ("DIGITAL_TRANSFORMATION", "Digital Transformation"),
    ChangeManagement => ("CHANGE_MANAGEMENT", "Change Management"),
    Financial => ("FINANCIAL", "Financial Advisory"),
    Other => ("OTHER", "Other"),
});

select_enum!(Urgency {
    Immediate => ("IMMEDIATE", "Immediate (within 1 month)"),
    ShortTerm => ("SHORT_TERM", "Short term (1-3 months)"),
    MediumTerm => ("MEDIUM_TERM", "Medium term (3-6 months)"),
    Planning => ("PLANNING", "Planning stage (6+ months)"),
});

select_enum!(BudgetRange {
    Under50k => ("UNDER_50K", "Under $50,000"),
    From50kTo100k => ("50K_100K", "$50,000 - $100,000"),
    From100kTo250k => ("100K_250K", "$100,000 - $250,000"),
    From250kTo500k => ("250K_500K", "$250,000 - $500,000"),
    Over500k => ("OVER_500K", "Over $500,000"),
    NotDefined => ("NOT_DEFINED", "Not yet defined"),
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_field_rejected() {
        let result = serde_json::from_str::<IntakeAnswers>(r#"{"favourite_colour": "blue"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_answers_serialize_with_snake_case_keys() {
        let mut answers = IntakeAnswers::new();
        answers.set(FieldId::OrganizationName, "Acme");
        answers.set(FieldId::ContactEmail, "a@acme.test");

        let json = serde_json::to_value(&answers).unwrap();
        assert_eq!(json["organization_name"], "Acme");
        assert_eq!(json["contact_email"], "a@acme.test");

        let back: IntakeAnswers = serde_json::from_value(json).unwrap();
        assert_eq!(back, answers);
    }

    #[test]
    fn test_last_write_wins() {
        let mut answers = IntakeAnswers::new();
        answers.set(FieldId::Industry, "Retail");
        answers.set(FieldId::Industry, "Healthcare");
        assert_eq!(answers.get(FieldId::Industry), "Healthcare");
    }

    #[test]
    fn test_whitespace_is_not_filled() {
        let mut answers = IntakeAnswers::new();
        answers.set(FieldId::Industry, "   ");
        assert!(!answers.is_filled(FieldId::Industry));
    }

    #[test]
    fn test_select_tables_round_trip() {
        for option in BudgetRange::OPTIONS {
            let parsed = BudgetRange::parse(option.value).unwrap();
            assert_eq!(parsed.label(), option.label);
        }
        assert_eq!(Urgency::parse("IMMEDIATE"), Some(Urgency::Immediate));
        assert_eq!(Urgency::parse("whenever"), None);
    }

    #[test]
    fn test_field_id_str_matches_serde() {
        for field in [FieldId::OrganizationName, FieldId::DecisionMakerTitle, FieldId::ContactPhone] {
            let json = serde_json::to_value(field).unwrap();
            assert_eq!(json, field.as_str());
        }
    }
}
