use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A rendered Statement of Work. Never edited after creation; a resubmission
/// derives a new one.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GeneratedDocument {
    pub filename: String,
    pub content: String,
    pub completeness_score: u8,
    pub generated_at: DateTime<Utc>,
}

/// Export filename: `SOW-<organization or "draft">-<YYYY-MM-DD>.md`.
///
/// Whitespace becomes `-` and anything other than letters, digits, `-` and `_`
/// is dropped. Non-ASCII letters are kept; the download response encodes them.
pub fn sow_filename(organization: &str, date: NaiveDate) -> String {
    let slug: String = organization
        .trim()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '-' || *c == '_')
        .collect();

    let name = if slug.is_empty() { "draft" } else { slug.as_str() };
    format!("SOW-{}-{}.md", name, date.format("%Y-%m-%d"))
}
