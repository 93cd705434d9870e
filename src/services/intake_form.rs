//! Form state for one intake session: answers, the active step and the
//! validation errors of the last check.
//!
//! Persistence is the caller's concern: the session routes write a snapshot
//! after every mutation.

use std::collections::HashMap;
use std::sync::OnceLock;

use chrono::Utc;
use regex::Regex;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::domain::{
    step_count, AnalysisResult, FieldDescriptor, FieldId, IntakeAnswers, IntakeStep, SessionRecord,
    ValidationErrors, INTAKE_STEPS,
};
use crate::services::analysis::Analyzer;

/// What `advance` did.
#[derive(Debug)]
pub enum AdvanceOutcome {
    /// The current step has validation errors; nothing moved.
    Blocked,
    Moved { analysis: Option<AnalysisResult> },
    /// The last step validated; the caller performs the final submission.
    ReadyToSubmit,
}

#[derive(Debug, Clone)]
pub struct IntakeForm {
    session_id: Uuid,
    answers: IntakeAnswers,
    current_step: usize,
    errors: ValidationErrors,
}

impl IntakeForm {
    pub fn new(session_id: Uuid) -> Self {
        Self {
            session_id,
            answers: IntakeAnswers::new(),
            current_step: 0,
            errors: ValidationErrors::new(),
        }
    }

    /// Resume from a stored snapshot. An out-of-range step index is clamped
    /// to the last step.
    pub fn from_record(record: SessionRecord) -> Self {
        Self {
            session_id: record.session_id,
            answers: record.answers,
            current_step: record.current_step.min(step_count() - 1),
            errors: ValidationErrors::new(),
        }
    }

    /// Snapshot of the current state, stamped now.
    pub fn to_record(&self) -> SessionRecord {
        SessionRecord {
            session_id: self.session_id,
            answers: self.answers.clone(),
            current_step: self.current_step,
            updated_at: Utc::now(),
        }
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn answers(&self) -> &IntakeAnswers {
        &self.answers
    }

    pub fn current_step(&self) -> usize {
        self.current_step
    }

    pub fn step(&self) -> &'static IntakeStep {
        &INTAKE_STEPS[self.current_step]
    }

    pub fn is_last_step(&self) -> bool {
        self.current_step + 1 == step_count()
    }

    pub fn errors(&self) -> &ValidationErrors {
        &self.errors
    }

    pub fn set_field(&mut self, field: FieldId, value: impl Into<String>) {
        self.answers.set(field, value);
        self.errors.remove(&field);
    }

    /// Check every field of the current step, replacing the recorded errors.
    pub fn validate_current_step(&mut self) -> bool {
        self.errors = self
            .step()
            .fields
            .iter()
            .filter_map(|field| {
                validate_field(field, self.answers.get(field.id)).map(|msg| (field.id, msg))
            })
            .collect();
        self.errors.is_empty()
    }

    /// Validate, run the step's analysis if it has one, then move forward.
    pub async fn advance(&mut self, analyzer: &Analyzer, request_id: Option<&str>) -> AdvanceOutcome {
        if !self.validate_current_step() {
            debug!(
                session_id = %self.session_id,
                step = self.current_step,
                errors = self.errors.len(),
                "Advance blocked by validation"
            );
            return AdvanceOutcome::Blocked;
        }

        let analysis = if self.step().analysis_trigger {
            Some(analyzer.analyze(&self.answers, request_id).await)
        } else {
            None
        };

        if self.is_last_step() {
            return AdvanceOutcome::ReadyToSubmit;
        }

        self.current_step += 1;
        AdvanceOutcome::Moved { analysis }
    }

    /// Step back without validating. Returns whether the index changed.
    pub fn retreat(&mut self) -> bool {
        if self.current_step == 0 {
            return false;
        }
        self.current_step -= 1;
        self.errors.clear();
        true
    }
}

/// First failing rule for one field, in order: required, minimum length,
/// maximum length, pattern. Empty optional fields pass.
pub fn validate_field(field: &FieldDescriptor, value: &str) -> Option<String> {
    let value = value.trim();

    if value.is_empty() {
        return field
            .required
            .then(|| format!("{} is required", field.label));
    }

    let len = value.chars().count();
    let rules = &field.validation;

    if let Some(min) = rules.min_length {
        if len < min {
            return Some(format!("Minimum {} characters required", min));
        }
    }
    if let Some(max) = rules.max_length {
        if len > max {
            return Some(format!("Maximum {} characters allowed", max));
        }
    }
    if let Some(pattern) = rules.pattern {
        match field_pattern(pattern) {
            Some(re) if !re.is_match(value) => return Some("Invalid format".to_string()),
            Some(_) => {}
            None => warn!(field = %field.id, pattern, "Skipping unknown validation pattern"),
        }
    }

    None
}

/// Compiled form of a pattern declared on one of the intake steps.
fn field_pattern(pattern: &str) -> Option<&'static Regex> {
    static PATTERNS: OnceLock<HashMap<&'static str, Regex>> = OnceLock::new();
    PATTERNS
        .get_or_init(|| {
            INTAKE_STEPS
                .iter()
                .flat_map(|step| step.fields.iter())
                .filter_map(|field| field.validation.pattern)
                .map(|pattern| (pattern, Regex::new(pattern).expect("valid field pattern")))
                .collect()
        })
        .get(pattern)
}
