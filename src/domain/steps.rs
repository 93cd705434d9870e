//! The fixed, ordered intake step table.
//!
//! Step order and field order never change for the lifetime of a session, so
//! the table is a `static` and sessions refer to steps by index.

use serde::Serialize;

use super::intake::{
    BudgetRange, CompanySize, ConsultingCategory, FieldId, SelectOption, Urgency,
};

/// Step identifier
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StepId {
    OrganizationProfile,
    ProblemIdentification,
    ObjectivesSuccess,
    ScopeConstraints,
    StakeholderInformation,
    ContactInformation,
}

/// Input widget kind
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum InputKind {
    Text,
    Textarea,
    Select,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Default)]
pub struct FieldValidation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<&'static str>,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub id: FieldId,
    pub label: &'static str,
    pub kind: InputKind,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<&'static str>,
    #[serde(skip_serializing_if = "no_options")]
    pub options: &'static [SelectOption],
    pub validation: FieldValidation,
}

fn no_options(options: &&'static [SelectOption]) -> bool {
    options.is_empty()
}

impl FieldDescriptor {
    const fn new(id: FieldId, label: &'static str, kind: InputKind) -> Self {
        Self {
            id,
            label,
            kind,
            required: false,
            placeholder: None,
            options: &[],
            validation: FieldValidation {
                min_length: None,
                max_length: None,
                pattern: None,
            },
        }
    }

    const fn text(id: FieldId, label: &'static str) -> Self {
        Self::new(id, label, InputKind::Text)
    }

    const fn textarea(id: FieldId, label: &'static str) -> Self {
        Self::new(id, label, InputKind::Textarea)
    }

    const fn select(id: FieldId, label: &'static str, options: &'static [SelectOption]) -> Self {
        let mut field = Self::new(id, label, InputKind::Select);
        field.options = options;
        field
    }

    const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    const fn placeholder(mut self, text: &'static str) -> Self {
        self.placeholder = Some(text);
        self
    }

    const fn min(mut self, n: usize) -> Self {
        self.validation.min_length = Some(n);
        self
    }

    const fn max(mut self, n: usize) -> Self {
        self.validation.max_length = Some(n);
        self
    }

    const fn pattern(mut self, re: &'static str) -> Self {
        self.validation.pattern = Some(re);
        self
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct IntakeStep {
    pub id: StepId,
    pub title: &'static str,
    pub description: &'static str,
    /// Advancing past this step runs an analysis first.
    pub analysis_trigger: bool,
    pub fields: &'static [FieldDescriptor],
}

pub const EMAIL_PATTERN: &str = r"^[^\s@]+@[^\s@]+\.[^\s@]+$";
pub const PHONE_PATTERN: &str = r"^[+]?[0-9\s\-().]{7,20}$";

pub static INTAKE_STEPS: [IntakeStep; 6] = [
    IntakeStep {
        id: StepId::OrganizationProfile,
        title: "Organization Profile",
        description: "Tell us about your organization",
        analysis_trigger: false,
        fields: &[
            FieldDescriptor::text(FieldId::OrganizationName, "Organization Name")
                .required()
                .min(2)
                .max(200)
                .placeholder("Your company name"),
            FieldDescriptor::text(FieldId::Industry, "Industry")
                .required()
                .placeholder("e.g. Healthcare, Manufacturing, Retail"),
            FieldDescriptor::select(FieldId::CompanySize, "Company Size", CompanySize::OPTIONS)
                .required(),
            FieldDescriptor::select(
                FieldId::ConsultingCategory,
                "Consulting Category",
                ConsultingCategory::OPTIONS,
            )
            .required(),
        ],
    },
    IntakeStep {
        id: StepId::ProblemIdentification,
        title: "Problem Identification",
        description: "Describe the challenge you are facing",
        analysis_trigger: true,
        fields: &[
            FieldDescriptor::textarea(FieldId::ProblemDescription, "Problem Description")
                .required()
                .min(50)
                .max(2000)
                .placeholder("What challenge is your organization facing?"),
            FieldDescriptor::textarea(FieldId::BusinessImpact, "Business Impact")
                .required()
                .min(20)
                .max(1000)
                .placeholder("Quantify the impact where possible (revenue, cost, %)"),
            FieldDescriptor::select(FieldId::Urgency, "Urgency", Urgency::OPTIONS).required(),
        ],
    },
    IntakeStep {
        id: StepId::ObjectivesSuccess,
        title: "Objectives & Success",
        description: "Define what success looks like",
        analysis_trigger: true,
        fields: &[
            FieldDescriptor::textarea(FieldId::PrimaryObjectives, "Primary Objectives")
                .required()
                .min(20)
                .max(1500)
                .placeholder("What do you want to achieve?"),
            FieldDescriptor::textarea(FieldId::SuccessMetrics, "Success Metrics")
                .max(1000)
                .placeholder("How will success be measured? KPIs, targets"),
            FieldDescriptor::select(FieldId::Budget, "Budget Range", BudgetRange::OPTIONS)
                .required(),
        ],
    },
    IntakeStep {
        id: StepId::ScopeConstraints,
        title: "Scope & Constraints",
        description: "Outline the boundaries of the engagement",
        analysis_trigger: false,
        fields: &[
            FieldDescriptor::textarea(FieldId::ScopeIncluded, "In Scope")
                .required()
                .min(20)
                .max(1500)
                .placeholder("What should the engagement cover?"),
            FieldDescriptor::textarea(FieldId::ScopeExcluded, "Out of Scope")
                .max(1000)
                .placeholder("What is explicitly excluded?"),
            FieldDescriptor::textarea(FieldId::TimelineConstraints, "Timeline Constraints")
                .max(1000)
                .placeholder("Key deadlines or milestones"),
        ],
    },
    IntakeStep {
        id: StepId::StakeholderInformation,
        title: "Stakeholder Information",
        description: "Who is involved in the decision?",
        analysis_trigger: false,
        fields: &[
            FieldDescriptor::text(FieldId::DecisionMakerName, "Decision Maker Name")
                .max(200),
            FieldDescriptor::text(FieldId::DecisionMakerTitle, "Decision Maker Title")
                .max(200),
            FieldDescriptor::textarea(FieldId::OtherStakeholders, "Other Stakeholders")
                .max(1000)
                .placeholder("Other people or teams involved"),
        ],
    },
    IntakeStep {
        id: StepId::ContactInformation,
        title: "Contact Information",
        description: "How can we reach you?",
        analysis_trigger: false,
        fields: &[
            FieldDescriptor::text(FieldId::ContactName, "Full Name")
                .required()
                .min(2)
                .max(200),
            FieldDescriptor::text(FieldId::ContactTitle, "Job Title").max(200),
            FieldDescriptor::text(FieldId::ContactEmail, "Email Address")
                .required()
                .pattern(EMAIL_PATTERN)
                .placeholder("you@company.com"),
            FieldDescriptor::text(FieldId::ContactPhone, "Phone Number")
                .pattern(PHONE_PATTERN),
        ],
    },
];

pub fn step_count() -> usize {
    INTAKE_STEPS.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_step_order() {
        let ids: Vec<StepId> = INTAKE_STEPS.iter().map(|s| s.id).collect();
        assert_eq!(
            ids,
            vec![
                StepId::OrganizationProfile,
                StepId::ProblemIdentification,
                StepId::ObjectivesSuccess,
                StepId::ScopeConstraints,
                StepId::StakeholderInformation,
                StepId::ContactInformation,
            ]
        );
    }

    #[test]
    fn test_every_field_appears_once() {
        let mut seen = HashSet::new();
        for step in &INTAKE_STEPS {
            for field in step.fields {
                assert!(seen.insert(field.id), "{} declared twice", field.id);
            }
        }
        assert_eq!(seen.len(), 20);
    }

    #[test]
    fn test_analysis_triggers() {
        let triggers: Vec<StepId> = INTAKE_STEPS
            .iter()
            .filter(|s| s.analysis_trigger)
            .map(|s| s.id)
            .collect();
        assert_eq!(
            triggers,
            vec![StepId::ProblemIdentification, StepId::ObjectivesSuccess]
        );
    }

    #[test]
    fn test_patterns_compile() {
        for step in &INTAKE_STEPS {
            for field in step.fields {
                if let Some(pattern) = field.validation.pattern {
                    assert!(regex::Regex::new(pattern).is_ok(), "{}", field.id);
                }
            }
        }
    }
}
