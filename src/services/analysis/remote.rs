//! Remote analysis: prompt construction and best-effort extraction from the
//! model's free-text reply.
//!
//! Each of the seven outputs is extracted on its own. A field whose pattern
//! does not match keeps the local heuristic value for that field, and nothing
//! else is mixed between the two results.

use regex::Regex;
use std::sync::OnceLock;
use tracing::{debug, instrument, warn};

use super::heuristic::{LocalAnalyzer, MAX_LIST_ITEMS};
use crate::domain::{
    AnalysisResult, AnalysisSource, BudgetRange, CompanySize, ConsultingCategory, FieldId,
    IntakeAnswers, RiskFactor, Severity, Urgency, INTAKE_STEPS,
};
use crate::services::ai_client::AiClient;

/// Lines shorter than this after bullet stripping are treated as noise.
const MIN_ITEM_LEN: usize = 5;
const DEFAULT_MITIGATION: &str = "Assess and plan mitigation during discovery";

/// Analyzer that asks the generative API and falls back to the heuristics.
#[derive(Clone)]
pub struct RemoteAnalyzer {
    client: AiClient,
    local: LocalAnalyzer,
}

impl RemoteAnalyzer {
    pub fn new(client: AiClient) -> Self {
        Self {
            client,
            local: LocalAnalyzer,
        }
    }

    pub fn client(&self) -> &AiClient {
        &self.client
    }

    /// Never fails: any error from the outbound call yields the full local
    /// result instead.
    #[instrument(skip(self, answers))]
    pub async fn analyze(
        &self,
        answers: &IntakeAnswers,
        request_id: Option<&str>,
    ) -> AnalysisResult {
        let local = self.local.analyze(answers).await;
        let prompt = build_prompt(answers);

        match self.client.generate_text(&prompt, request_id).await {
            Ok(reply) => {
                debug!(reply_len = reply.len(), "Received analysis reply");
                parse_reply(&reply, local)
            }
            Err(e) => {
                warn!(error = %e, "Remote analysis failed, using local heuristics");
                local
            }
        }
    }
}

// =============================================================================
// Prompt
// =============================================================================

fn display_value(field: FieldId, value: &str) -> String {
    let label = match field {
        FieldId::CompanySize => CompanySize::parse(value).map(|v| v.label()),
        FieldId::ConsultingCategory => ConsultingCategory::parse(value).map(|v| v.label()),
        FieldId::Urgency => Urgency::parse(value).map(|v| v.label()),
        FieldId::Budget => BudgetRange::parse(value).map(|v| v.label()),
        _ => None,
    };
    label.map(str::to_string).unwrap_or_else(|| value.trim().to_string())
}

/// Natural-language instruction carrying every answer, grouped by step.
pub fn build_prompt(answers: &IntakeAnswers) -> String {
    let mut context = String::new();
    for step in &INTAKE_STEPS {
        context.push_str(&format!("## {}\n", step.title));
        for field in step.fields {
            let value = display_value(field.id, answers.get(field.id));
            let value = if value.is_empty() { "(not provided)".to_string() } else { value };
            context.push_str(&format!("- {}: {}\n", field.label, value));
        }
        context.push('\n');
    }

    format!(
        "You are a senior management consultant reviewing a client intake form.\n\
         Analyze the intake below and respond using exactly these labeled sections:\n\n\
         Completeness Score: <integer 0-100>\n\
         Missing Critical Information:\n- <item> (up to 5)\n\
         Follow-up Questions:\n- <question> (up to 5)\n\
         Risk Factors:\n- <risk type> (<high|medium|low>): <mitigation> (up to 5)\n\
         Estimated Duration: <e.g. 3-6 months>\n\
         Recommended Team Size: <e.g. 2-4 consultants>\n\
         Complexity Score: <integer 1-10>\n\n\
         Intake:\n\n{}",
        context
    )
}

// =============================================================================
// Reply parsing
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Completeness,
    Missing,
    FollowUps,
    Risks,
    Duration,
    TeamSize,
    Complexity,
}

const HEADING_LABELS: &str = r"(completeness\s+score|missing\s+critical\s+info(?:rmation)?|(?:suggested\s+)?follow[\s-]*up\s+questions|risk\s+factors|estimated\s+duration|recommended\s+team\s+size|complexity\s+score)";

fn heading_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(&format!(r"(?i)^[\s#*_]*{}\b", HEADING_LABELS)).expect("valid heading pattern")
    })
}

/// Label followed only by emphasis and a separator or the end of the line.
fn bare_heading_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(&format!(r"(?i)^[\s#*_]*{}[\s*_]*(?:[:\-]|$)", HEADING_LABELS))
            .expect("valid bare heading pattern")
    })
}

fn bullet_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^\s*(?:[-*•+]|\d+[.)])\s+").expect("valid bullet pattern")
    })
}

fn completeness_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)completeness\s+score\D{0,20}?(\d{1,3})").expect("valid completeness pattern")
    })
}

fn complexity_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)complexity\s+score\D{0,20}?(\d{1,2})").expect("valid complexity pattern")
    })
}

fn duration_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r"(?im)estimated\s+duration[*_ \t]*[:\-][*_ \t]*(?:\r?\n[ \t]*(?:[-*•+]|\d+[.)])[ \t]+)?([^\n]+)",
        )
        .expect("valid duration pattern")
    })
}

fn team_size_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r"(?im)recommended\s+team\s+size[*_ \t]*[:\-][*_ \t]*(?:\r?\n[ \t]*(?:[-*•+]|\d+[.)])[ \t]+)?([^\n]+)",
        )
        .expect("valid team size pattern")
    })
}

/// A bulleted or numbered line only counts as a heading when the label stands
/// alone, so list items that happen to open with a label stay items.
fn classify_heading(line: &str) -> Option<Section> {
    let caps = match bullet_pattern().find(line) {
        Some(bullet) => bare_heading_pattern().captures(&line[bullet.end()..])?,
        None => heading_pattern().captures(line)?,
    };
    let label = caps.get(1)?.as_str().to_lowercase();
    let section = if label.starts_with("completeness") {
        Section::Completeness
    } else if label.starts_with("missing") {
        Section::Missing
    } else if label.contains("follow") {
        Section::FollowUps
    } else if label.starts_with("risk") {
        Section::Risks
    } else if label.starts_with("estimated") {
        Section::Duration
    } else if label.starts_with("recommended") {
        Section::TeamSize
    } else {
        Section::Complexity
    };
    Some(section)
}

/// Strip bullet markers and markdown emphasis from a list line.
fn clean_item(line: &str) -> String {
    let stripped = bullet_pattern().replace(line, "");
    stripped
        .trim()
        .trim_matches(|c| c == '*' || c == '_')
        .trim()
        .to_string()
}

/// Bulleted or numbered lines between a section's heading and the next
/// heading, cleaned, with trivial lines dropped and the list capped. Prose
/// around the list is ignored.
fn section_items(reply: &str, section: Section) -> Vec<String> {
    let mut items = Vec::new();
    let mut inside = false;

    for line in reply.lines() {
        match classify_heading(line) {
            Some(found) if found == section => {
                inside = true;
                continue;
            }
            Some(_) if inside => break,
            Some(_) => continue,
            None => {}
        }

        if !inside || !bullet_pattern().is_match(line) {
            continue;
        }
        let item = clean_item(line);
        if item.chars().count() >= MIN_ITEM_LEN {
            items.push(item);
        }
    }

    items.truncate(MAX_LIST_ITEMS);
    items
}

fn severity_of(line: &str) -> Severity {
    let lower = line.to_lowercase();
    if lower.contains("high") {
        Severity::High
    } else if lower.contains("low") {
        Severity::Low
    } else {
        Severity::Medium
    }
}

fn parse_risk(line: &str) -> RiskFactor {
    let severity = severity_of(line);
    let (category, mitigation) = match line.split_once(':') {
        Some((category, mitigation)) => (
            category,
            mitigation.trim().trim_matches(|c| c == '*' || c == '_').trim(),
        ),
        None => (line, ""),
    };

    // "Timeline Risk (High)" -> "Timeline Risk"
    let category = match category.find('(') {
        Some(idx) => &category[..idx],
        None => category,
    };
    let category = category.trim().trim_matches(|c| c == '*' || c == '_').trim();

    let mitigation = if mitigation.is_empty() {
        DEFAULT_MITIGATION
    } else {
        mitigation
    };

    RiskFactor::new(category, severity, mitigation)
}

fn first_number(pattern: &Regex, reply: &str) -> Option<u32> {
    pattern
        .captures(reply)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

fn labeled_value(pattern: &Regex, reply: &str) -> Option<String> {
    let value = clean_item(pattern.captures(reply)?.get(1)?.as_str());
    (!value.is_empty()).then_some(value)
}

/// Overlay every field that could be extracted from `reply` onto `local`.
pub fn parse_reply(reply: &str, local: AnalysisResult) -> AnalysisResult {
    let completeness_score = first_number(completeness_pattern(), reply)
        .map(|n| n.min(100) as u8)
        .unwrap_or(local.completeness_score);

    let missing = section_items(reply, Section::Missing);
    let missing_critical_info = if missing.is_empty() {
        local.missing_critical_info
    } else {
        missing
    };

    let follow_ups = section_items(reply, Section::FollowUps);
    let suggested_follow_ups = if follow_ups.is_empty() {
        local.suggested_follow_ups
    } else {
        follow_ups
    };

    let risks: Vec<RiskFactor> = section_items(reply, Section::Risks)
        .iter()
        .map(|line| parse_risk(line))
        .filter(|risk| !risk.category.is_empty())
        .collect();
    let risk_factors = if risks.is_empty() {
        local.risk_factors
    } else {
        risks
    };

    let estimated_duration =
        labeled_value(duration_pattern(), reply).unwrap_or(local.estimated_duration);
    let recommended_team_size =
        labeled_value(team_size_pattern(), reply).unwrap_or(local.recommended_team_size);

    let complexity_score = first_number(complexity_pattern(), reply)
        .map(|n| n.clamp(1, 10) as u8)
        .unwrap_or(local.complexity_score);

    AnalysisResult {
        completeness_score,
        missing_critical_info,
        suggested_follow_ups,
        risk_factors,
        estimated_duration,
        recommended_team_size,
        complexity_score,
        source: AnalysisSource::Remote,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::analysis::heuristic;

    const REPLY: &str = "\
**Completeness Score:** 82

**Missing Critical Information:**
- Quantified revenue impact
- Named executive sponsor
- ok

**Follow-up Questions:**
1. What triggered this initiative now?
2. Which KPIs does the board track?

**Risk Factors:**
- **Timeline Risk (High):** Phase delivery around quick wins
- Data Quality (low): Run a data audit in week one
- Change Fatigue: Appoint change champions

**Estimated Duration:** 4-6 months
**Recommended Team Size:** 3-4 consultants
**Complexity Score:** 8/10
";

    fn local() -> AnalysisResult {
        heuristic::analyze(&IntakeAnswers::new())
    }

    #[test]
    fn test_parse_full_reply() {
        let result = parse_reply(REPLY, local());

        assert_eq!(result.source, AnalysisSource::Remote);
        assert_eq!(result.completeness_score, 82);
        assert_eq!(
            result.missing_critical_info,
            vec!["Quantified revenue impact", "Named executive sponsor"]
        );
        assert_eq!(
            result.suggested_follow_ups,
            vec![
                "What triggered this initiative now?",
                "Which KPIs does the board track?"
            ]
        );
        assert_eq!(result.risk_factors.len(), 3);
        assert_eq!(result.risk_factors[0].category, "Timeline Risk");
        assert_eq!(result.risk_factors[0].severity, Severity::High);
        assert_eq!(result.risk_factors[0].mitigation, "Phase delivery around quick wins");
        assert_eq!(result.risk_factors[1].severity, Severity::Low);
        assert_eq!(result.risk_factors[2].severity, Severity::Medium);
        assert_eq!(result.estimated_duration, "4-6 months");
        assert_eq!(result.recommended_team_size, "3-4 consultants");
        assert_eq!(result.complexity_score, 8);
    }

    #[test]
    fn test_unmatched_fields_fall_back_independently() {
        let reply = "Completeness score: 40\nEstimated duration: 2 months\n";
        let local = local();
        let result = parse_reply(reply, local.clone());

        assert_eq!(result.completeness_score, 40);
        assert_eq!(result.estimated_duration, "2 months");
        assert_eq!(result.missing_critical_info, local.missing_critical_info);
        assert_eq!(result.suggested_follow_ups, local.suggested_follow_ups);
        assert_eq!(result.risk_factors, local.risk_factors);
        assert_eq!(result.recommended_team_size, local.recommended_team_size);
        assert_eq!(result.complexity_score, local.complexity_score);
    }

    #[test]
    fn test_garbage_reply_is_all_local_values() {
        let local = local();
        let result = parse_reply("I cannot help with that.", local.clone());
        assert_eq!(
            AnalysisResult {
                source: AnalysisSource::Local,
                ..result
            },
            local
        );
    }

    #[test]
    fn test_lists_capped() {
        let mut reply = String::from("Follow-up Questions:\n");
        for i in 0..8 {
            reply.push_str(&format!("- Question number {}?\n", i));
        }
        let result = parse_reply(&reply, local());
        assert_eq!(result.suggested_follow_ups.len(), MAX_LIST_ITEMS);
        assert_eq!(result.suggested_follow_ups[4], "Question number 4?");
    }

    #[test]
    fn test_scores_clamped() {
        let result = parse_reply("Completeness Score: 250\nComplexity Score: 0", local());
        assert_eq!(result.completeness_score, 100);
        assert_eq!(result.complexity_score, 1);
    }

    #[test]
    fn test_prose_around_lists_is_ignored() {
        let reply = "Missing Critical Information:\n\
            The following items are missing from the intake:\n\
            - Budget range\n\
            \n\
            Overall the submission is solid.\n\
            Follow-up Questions:\n\
            - Why now?\n";
        let result = parse_reply(reply, local());
        assert_eq!(result.missing_critical_info, vec!["Budget range"]);
        assert_eq!(result.suggested_follow_ups, vec!["Why now?"]);
    }

    #[test]
    fn test_numbered_item_starting_with_label_stays_an_item() {
        let reply = "Missing Critical Information:\n\
            1. Budget approval path\n\
            2. Risk factors are not yet identified\n\
            3. Follow-up Questions:\n\
            - Who signs off?\n";
        let local = local();
        let result = parse_reply(reply, local.clone());
        assert_eq!(
            result.missing_critical_info,
            vec!["Budget approval path", "Risk factors are not yet identified"]
        );
        assert_eq!(result.suggested_follow_ups, vec!["Who signs off?"]);
        assert_eq!(result.risk_factors, local.risk_factors);
    }

    #[test]
    fn test_labeled_value_on_next_line() {
        let result = parse_reply("Estimated Duration:\n- 3-6 months\n", local());
        assert_eq!(result.estimated_duration, "3-6 months");
    }

    #[test]
    fn test_empty_label_does_not_swallow_next_line() {
        let local = local();
        let reply = "Estimated Duration:\nRecommended Team Size: 4 consultants\n";
        let result = parse_reply(reply, local.clone());
        assert_eq!(result.estimated_duration, local.estimated_duration);
        assert_eq!(result.recommended_team_size, "4 consultants");
    }

    #[test]
    fn test_risk_without_colon() {
        let risk = parse_risk("Vendor lock-in");
        assert_eq!(risk.category, "Vendor lock-in");
        assert_eq!(risk.severity, Severity::Medium);
        assert_eq!(risk.mitigation, DEFAULT_MITIGATION);
    }

    #[test]
    fn test_prompt_carries_answers() {
        let mut answers = IntakeAnswers::new();
        answers.set(FieldId::OrganizationName, "Acme Logistics");
        answers.set(FieldId::Budget, "NOT_DEFINED");

        let prompt = build_prompt(&answers);
        assert!(prompt.contains("- Organization Name: Acme Logistics"));
        assert!(prompt.contains("- Budget Range: Not yet defined"));
        assert!(prompt.contains("- Industry: (not provided)"));
        assert!(prompt.contains("Complexity Score:"));
    }
}
