//! Statement of Work rendering.
//!
//! `generate_sow` is a pure function of its two inputs. It performs no gating:
//! callers decide whether the completeness score is high enough, and missing
//! answers render as blank segments.

use chrono::{DateTime, Utc};
use std::fmt::Write;

use crate::domain::{sow_filename, AnalysisResult, FieldId, GeneratedDocument, IntakeAnswers};

struct Phase {
    name: &'static str,
    duration: &'static str,
    activities: &'static [&'static str],
}

const PHASES: [Phase; 4] = [
    Phase {
        name: "Discovery & Assessment",
        duration: "2-3 weeks",
        activities: &[
            "Stakeholder interviews and workshops",
            "Current-state assessment and data collection",
            "Root-cause analysis of the core challenge",
        ],
    },
    Phase {
        name: "Solution Design",
        duration: "3-4 weeks",
        activities: &[
            "Option development and evaluation",
            "Target-state design and business case",
            "Validation with key stakeholders",
        ],
    },
    Phase {
        name: "Implementation Planning",
        duration: "2-3 weeks",
        activities: &[
            "Detailed roadmap and sequencing",
            "Resource and governance model",
            "Risk mitigation plan",
        ],
    },
    Phase {
        name: "Knowledge Transfer",
        duration: "1-2 weeks",
        activities: &[
            "Handover of deliverables and documentation",
            "Capability building sessions for client teams",
            "Close-out review",
        ],
    },
];

const MILESTONES: [(&str, &str); 6] = [
    ("Week 1", "Project kick-off and stakeholder alignment"),
    ("Week 3", "Discovery findings presentation"),
    ("Week 6", "Solution design review"),
    ("Week 8", "Final recommendations and business case"),
    ("Week 10", "Implementation roadmap sign-off"),
    ("Week 12", "Knowledge transfer complete and project close-out"),
];

fn category_display(answers: &IntakeAnswers) -> &str {
    match answers.category() {
        Some(category) => category.label(),
        None => answers.get(FieldId::ConsultingCategory),
    }
}

fn budget_display(answers: &IntakeAnswers) -> &'static str {
    match answers.budget() {
        Some(budget) => budget.label(),
        None => "",
    }
}

/// Render the SOW markdown.
pub fn generate_sow(answers: &IntakeAnswers, analysis: &AnalysisResult) -> String {
    let mut doc = String::new();
    // writeln! into a String cannot fail
    let _ = render(&mut doc, answers, analysis);
    doc
}

fn render(doc: &mut String, answers: &IntakeAnswers, analysis: &AnalysisResult) -> std::fmt::Result {
    let get = move |field: FieldId| answers.get(field).trim();

    writeln!(doc, "# Statement of Work")?;
    writeln!(doc)?;
    writeln!(doc, "**Client:** {}", get(FieldId::OrganizationName))?;
    writeln!(doc, "**Industry:** {}", get(FieldId::Industry))?;
    writeln!(doc, "**Engagement Type:** {}", category_display(answers))?;
    writeln!(doc)?;

    writeln!(doc, "## 1. Purpose & Objectives")?;
    writeln!(doc)?;
    writeln!(doc, "### Business Challenge")?;
    writeln!(doc, "{}", get(FieldId::ProblemDescription))?;
    writeln!(doc)?;
    writeln!(doc, "### Business Impact")?;
    writeln!(doc, "{}", get(FieldId::BusinessImpact))?;
    writeln!(doc)?;
    writeln!(doc, "### Primary Objectives")?;
    writeln!(doc, "{}", get(FieldId::PrimaryObjectives))?;
    writeln!(doc)?;
    writeln!(doc, "### Success Criteria")?;
    writeln!(doc, "{}", get(FieldId::SuccessMetrics))?;
    writeln!(doc)?;

    writeln!(doc, "## 2. Scope of Work")?;
    writeln!(doc)?;
    writeln!(doc, "### In Scope")?;
    writeln!(doc, "{}", get(FieldId::ScopeIncluded))?;
    writeln!(doc)?;
    writeln!(doc, "### Out of Scope")?;
    writeln!(doc, "{}", get(FieldId::ScopeExcluded))?;
    writeln!(doc)?;

    writeln!(doc, "## 3. Approach & Methodology")?;
    writeln!(doc)?;
    for (i, phase) in PHASES.iter().enumerate() {
        writeln!(doc, "### Phase {}: {} ({})", i + 1, phase.name, phase.duration)?;
        for activity in phase.activities {
            writeln!(doc, "- {}", activity)?;
        }
        writeln!(doc)?;
    }

    writeln!(doc, "## 4. Timeline & Milestones")?;
    writeln!(doc)?;
    for (week, milestone) in MILESTONES {
        writeln!(doc, "- **{}:** {}", week, milestone)?;
    }
    writeln!(doc)?;

    writeln!(doc, "## 5. Project Team")?;
    writeln!(doc)?;
    writeln!(doc, "**Recommended Team Size:** {}", analysis.recommended_team_size)?;
    writeln!(doc)?;
    writeln!(doc, "- 1 Engagement Lead")?;
    writeln!(doc, "- 2-3 Senior Consultants")?;
    writeln!(doc, "- 1-2 Business Analysts")?;
    writeln!(doc)?;

    writeln!(doc, "## 6. Investment")?;
    writeln!(doc)?;
    writeln!(doc, "**Budget Range:** {}", budget_display(answers))?;
    writeln!(doc)?;
    writeln!(
        doc,
        "Detailed pricing to be determined following the discovery phase."
    )?;
    writeln!(doc)?;

    writeln!(doc, "## 7. Terms & Conditions")?;
    writeln!(doc)?;
    writeln!(doc, "- Invoices are issued monthly and payable within 30 days.")?;
    writeln!(
        doc,
        "- Changes to scope are managed through a written change request process."
    )?;
    writeln!(
        doc,
        "- All client information is treated as confidential."
    )?;
    writeln!(
        doc,
        "- Either party may terminate with 30 days written notice."
    )?;
    writeln!(doc)?;

    writeln!(doc, "## 8. Acceptance")?;
    writeln!(doc)?;
    writeln!(doc, "**Client Representative**")?;
    writeln!(doc, "Name: {}", get(FieldId::ContactName))?;
    writeln!(doc, "Title: {}", get(FieldId::ContactTitle))?;
    writeln!(doc, "Email: {}", get(FieldId::ContactEmail))?;
    writeln!(doc, "Signature: ______________________  Date: __________")?;
    writeln!(doc)?;
    writeln!(doc, "---")?;
    writeln!(
        doc,
        "*Generated from intake data with a completeness score of {}%.*",
        analysis.completeness_score
    )?;

    Ok(())
}

/// Render and package a SOW for export.
pub fn build_document(
    answers: &IntakeAnswers,
    analysis: &AnalysisResult,
    generated_at: DateTime<Utc>,
) -> GeneratedDocument {
    GeneratedDocument {
        filename: sow_filename(answers.get(FieldId::OrganizationName), generated_at.date_naive()),
        content: generate_sow(answers, analysis),
        completeness_score: analysis.completeness_score,
        generated_at,
    }
}
