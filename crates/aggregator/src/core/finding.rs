use crate::core::severity::{FindingSource, Severity};
use serde::{Deserialize, Serialize};

/// Sentinel used for the file or line half of a location when the native
/// record omits it.
pub const UNKNOWN_PART: &str = "N/A";

/// The canonical vulnerability record every source normalizes into.
///
/// `location` doubles as the deduplication key: two findings with the same
/// `file:line` string are treated as the same underlying issue at merge
/// time. Findings are immutable once built; the merge engine produces a new
/// sequence rather than mutating in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub severity: Severity,

    pub category: String,

    pub title: String,

    pub description: String,

    /// `<basename>:<line>`, with `N/A` standing in for a missing part.
    pub location: String,

    pub code_snippet: String,

    pub impact: String,

    pub recommendation: String,

    /// Canonical `CWE-<digits>`, or empty when the source reported none.
    pub cwe_id: String,

    pub source: FindingSource,
}

impl Finding {
    pub fn new(source: FindingSource, severity: Severity, title: impl Into<String>) -> Self {
        Self {
            severity,
            category: String::new(),
            title: title.into(),
            description: String::new(),
            location: format!("{UNKNOWN_PART}:{UNKNOWN_PART}"),
            code_snippet: String::new(),
            impact: String::new(),
            recommendation: String::new(),
            cwe_id: String::new(),
            source,
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = location.into();
        self
    }

    pub fn with_location_parts(mut self, file: Option<&str>, line: Option<u64>) -> Self {
        self.location = format_location(file, line);
        self
    }

    pub fn with_snippet(mut self, snippet: impl Into<String>) -> Self {
        self.code_snippet = snippet.into();
        self
    }

    pub fn with_impact(mut self, impact: impl Into<String>) -> Self {
        self.impact = impact.into();
        self
    }

    pub fn with_recommendation(mut self, recommendation: impl Into<String>) -> Self {
        self.recommendation = recommendation.into();
        self
    }

    pub fn with_cwe(mut self, cwe: impl AsRef<str>) -> Self {
        self.cwe_id = normalize_cwe(cwe.as_ref());
        self
    }

    /// The attribute merge deduplicates on.
    pub fn dedup_key(&self) -> &str {
        &self.location
    }
}

/// Synthesizes the canonical `<basename>:<line>` location string. Either
/// part may be absent in a native record; the `N/A` sentinel substitutes.
pub fn format_location(file: Option<&str>, line: Option<u64>) -> String {
    let file = file
        .map(basename)
        .filter(|f| !f.is_empty())
        .unwrap_or(UNKNOWN_PART);

    match line {
        Some(line) if line > 0 => format!("{file}:{line}"),
        _ => format!("{file}:{UNKNOWN_PART}"),
    }
}

fn basename(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

/// Reduces a CWE reference to the canonical `CWE-<digits>` form.
///
/// Analyzers report CWEs in several shapes: Semgrep metadata carries strings
/// like `"CWE-89: SQL Injection"`, Bandit a bare numeric id. Anything that
/// does not contain a leading numeric id becomes the empty string; a CWE is
/// never fabricated.
pub fn normalize_cwe(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return String::new();
    }

    let rest = trimmed
        .strip_prefix("CWE-")
        .or_else(|| trimmed.strip_prefix("cwe-"))
        .or_else(|| trimmed.strip_prefix("CWE"))
        .unwrap_or(trimmed);

    let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        String::new()
    } else {
        format!("CWE-{digits}")
    }
}
