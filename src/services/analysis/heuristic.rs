//! Rule-based intake analysis. Deterministic, no I/O.
//!
//! Every list is built in rule-declaration order so results are stable for a
//! given set of answers.

use crate::domain::{
    AnalysisResult, AnalysisSource, BudgetRange, ConsultingCategory, FieldId, IntakeAnswers,
    RiskFactor, Severity, Urgency,
};

/// Fields that make up the completeness score, independent of the per-step
/// `required` flags.
pub const CRITICAL_FIELDS: [FieldId; 12] = [
    FieldId::OrganizationName,
    FieldId::Industry,
    FieldId::CompanySize,
    FieldId::ConsultingCategory,
    FieldId::ProblemDescription,
    FieldId::BusinessImpact,
    FieldId::PrimaryObjectives,
    FieldId::SuccessMetrics,
    FieldId::Budget,
    FieldId::ScopeIncluded,
    FieldId::ContactName,
    FieldId::ContactEmail,
];

pub const MAX_LIST_ITEMS: usize = 5;
const BASE_COMPLEXITY: u8 = 5;
const MAX_COMPLEXITY: u8 = 10;

/// The analyzer that is always available.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalAnalyzer;

impl LocalAnalyzer {
    pub async fn analyze(&self, answers: &IntakeAnswers) -> AnalysisResult {
        analyze(answers)
    }
}

pub fn analyze(answers: &IntakeAnswers) -> AnalysisResult {
    AnalysisResult {
        completeness_score: completeness_score(answers),
        missing_critical_info: missing_critical_info(answers),
        suggested_follow_ups: suggested_follow_ups(answers),
        risk_factors: risk_factors(answers),
        estimated_duration: estimated_duration(answers).to_string(),
        recommended_team_size: recommended_team_size(answers).to_string(),
        complexity_score: complexity_score(answers),
        source: AnalysisSource::Local,
    }
}

pub fn completeness_score(answers: &IntakeAnswers) -> u8 {
    let filled = CRITICAL_FIELDS
        .iter()
        .filter(|field| answers.is_filled(**field))
        .count();
    ((filled as f64 / CRITICAL_FIELDS.len() as f64) * 100.0).round() as u8
}

fn is_quantified(text: &str) -> bool {
    text.contains('$') || text.contains('%')
}

fn budget_undefined(answers: &IntakeAnswers) -> bool {
    answers.budget() == Some(BudgetRange::NotDefined)
}

pub fn missing_critical_info(answers: &IntakeAnswers) -> Vec<String> {
    let mut missing = Vec::new();

    if !is_quantified(answers.get(FieldId::BusinessImpact)) {
        missing.push("Quantified business impact (revenue, cost or percentage figures)");
    }
    if !answers.is_filled(FieldId::SuccessMetrics) {
        missing.push("Measurable success metrics or KPIs");
    }
    if budget_undefined(answers) {
        missing.push("Budget range or investment parameters");
    }
    if !answers.is_filled(FieldId::TimelineConstraints) {
        missing.push("Timeline constraints or key deadlines");
    }
    if !answers.is_filled(FieldId::DecisionMakerName) {
        missing.push("Decision maker identification");
    }

    missing
        .into_iter()
        .take(MAX_LIST_ITEMS)
        .map(String::from)
        .collect()
}

pub fn suggested_follow_ups(answers: &IntakeAnswers) -> Vec<String> {
    let mut questions = Vec::new();

    if answers.urgency() == Some(Urgency::Immediate) {
        questions.push("What specific event or deadline is driving the immediate need?");
        questions.push("What interim measures are in place to limit the impact until this is resolved?");
    }

    match answers.category() {
        Some(ConsultingCategory::Technology) => {
            questions.push("What is your current technology stack, and which legacy systems must be integrated?");
            questions.push("Do you have internal IT resources available to support implementation?");
        }
        Some(ConsultingCategory::Strategy) => {
            questions.push("Who are your main competitors, and how do you differentiate from them?");
            questions.push("Which market trends are having the biggest effect on your business?");
        }
        _ => {}
    }

    if !answers.is_filled(FieldId::OtherStakeholders) {
        questions.push("Who else in your organization will be involved in or affected by this engagement?");
    }

    questions.push("What approaches have you already tried, and what were the results?");

    questions
        .into_iter()
        .take(MAX_LIST_ITEMS)
        .map(String::from)
        .collect()
}

pub fn risk_factors(answers: &IntakeAnswers) -> Vec<RiskFactor> {
    let mut risks = Vec::new();

    if answers.urgency() == Some(Urgency::Immediate) {
        risks.push(RiskFactor::new(
            "Timeline Risk",
            Severity::High,
            "Phase the engagement to deliver quick wins while longer-term work proceeds",
        ));
    }
    if budget_undefined(answers) {
        risks.push(RiskFactor::new(
            "Budget Uncertainty",
            Severity::Medium,
            "Define a budget range early to align scope and expectations",
        ));
    }
    if !answers.is_filled(FieldId::ScopeExcluded) {
        risks.push(RiskFactor::new(
            "Scope Creep Risk",
            Severity::Medium,
            "Explicitly define out-of-scope items during discovery",
        ));
    }
    if !answers.is_filled(FieldId::OtherStakeholders) {
        risks.push(RiskFactor::new(
            "Stakeholder Alignment",
            Severity::Medium,
            "Identify and engage key stakeholders early in the engagement",
        ));
    }
    if answers.category() == Some(ConsultingCategory::Technology) {
        risks.push(RiskFactor::new(
            "Technical Complexity",
            Severity::Medium,
            "Assess the technical landscape and integration points early",
        ));
    }

    risks
}

/// First matching rule wins.
pub fn estimated_duration(answers: &IntakeAnswers) -> &'static str {
    if answers.urgency() == Some(Urgency::Immediate) {
        return "4-8 weeks";
    }
    match answers.category() {
        Some(ConsultingCategory::Strategy) => "3-6 months",
        Some(ConsultingCategory::Technology) => "6-12 months",
        _ => "3-6 months",
    }
}

/// Matches on substrings of the size bracket, so "1001-5000" counts as large.
pub fn recommended_team_size(answers: &IntakeAnswers) -> &'static str {
    let size = answers.get(FieldId::CompanySize);
    if size.contains("5000") {
        "5-8 consultants"
    } else if size.contains("1000") {
        "3-5 consultants"
    } else {
        "2-4 consultants"
    }
}

pub fn complexity_score(answers: &IntakeAnswers) -> u8 {
    let mut score = BASE_COMPLEXITY;

    if answers.urgency() == Some(Urgency::Immediate) {
        score += 2;
    }
    if answers.category() == Some(ConsultingCategory::Technology) {
        score += 1;
    }
    if answers.get(FieldId::CompanySize).contains("5000") {
        score += 1;
    }
    if !answers.is_filled(FieldId::Budget) || budget_undefined(answers) {
        score += 1;
    }

    score.min(MAX_COMPLEXITY)
}
