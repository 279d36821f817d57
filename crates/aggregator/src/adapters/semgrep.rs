use crate::core::{format_location, Finding, FindingSource, Severity};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Native shape of a Semgrep JSON report: one top-level object holding a
/// findings array plus scan bookkeeping. Fields we never consume are left
/// out; serde ignores them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SemgrepReport {
    #[serde(default)]
    pub results: Vec<SemgrepResult>,

    #[serde(default)]
    pub errors: Vec<SemgrepError>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SemgrepResult {
    #[serde(default)]
    pub check_id: String,

    #[serde(default)]
    pub path: String,

    #[serde(default)]
    pub start: Option<SemgrepPosition>,

    #[serde(default)]
    pub extra: SemgrepExtra,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SemgrepPosition {
    #[serde(default)]
    pub line: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SemgrepExtra {
    #[serde(default)]
    pub severity: String,

    #[serde(default)]
    pub message: String,

    #[serde(default)]
    pub lines: String,

    #[serde(default)]
    pub metadata: SemgrepMetadata,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SemgrepMetadata {
    #[serde(default)]
    pub category: Option<String>,

    #[serde(default)]
    pub owasp: Vec<String>,

    #[serde(default)]
    pub cwe: Vec<String>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub fix: Option<String>,

    #[serde(default)]
    pub references: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SemgrepError {
    #[serde(default)]
    pub message: String,
}

const DEFAULT_RECOMMENDATION: &str = "Review the code and apply secure coding practices.";

/// Semgrep's three-level severity vocabulary onto the canonical scale.
/// Anything unmapped defaults to Medium.
pub fn map_severity(raw: &str) -> Severity {
    match raw.to_uppercase().as_str() {
        "ERROR" => Severity::High,
        "WARNING" => Severity::Medium,
        "INFO" => Severity::Low,
        _ => Severity::Medium,
    }
}

/// Converts a Semgrep report into canonical findings. A missing or empty
/// report yields an empty sequence, not an error.
pub fn normalize(report: Option<&SemgrepReport>) -> Vec<Finding> {
    let Some(report) = report else {
        return Vec::new();
    };

    if !report.errors.is_empty() {
        debug!(errors = report.errors.len(), "semgrep reported scan errors");
    }

    report
        .results
        .iter()
        .map(|result| {
            let extra = &result.extra;
            let metadata = &extra.metadata;

            let base_category = metadata.category.as_deref().unwrap_or("Security");
            let category = if metadata.owasp.is_empty() {
                base_category.to_string()
            } else {
                let tags: Vec<&str> = metadata.owasp.iter().take(2).map(String::as_str).collect();
                format!("{} ({})", base_category, tags.join(", "))
            };

            let title = if extra.message.is_empty() {
                result.check_id.clone()
            } else {
                extra.message.clone()
            };

            let mut description = extra.message.clone();
            if let Some(ref details) = metadata.description {
                if !description.is_empty() {
                    description.push('\n');
                }
                description.push_str(details);
            }

            let recommendation = metadata
                .fix
                .clone()
                .or_else(|| metadata.references.first().cloned())
                .unwrap_or_else(|| DEFAULT_RECOMMENDATION.to_string());

            let cwe = metadata.cwe.first().map(String::as_str).unwrap_or("");

            Finding::new(FindingSource::Semgrep, map_severity(&extra.severity), title)
                .with_category(category)
                .with_description(description)
                .with_location(format_location(
                    Some(&result.path),
                    result.start.as_ref().and_then(|s| s.line),
                ))
                .with_snippet(extra.lines.trim())
                .with_impact(format!(
                    "Reported severity: {}, confidence: high",
                    extra.severity
                ))
                .with_recommendation(recommendation)
                .with_cwe(cwe)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "results": [
            {
                "check_id": "python.flask.security.injection.tainted-sql-string",
                "path": "src/app.py",
                "start": {"line": 42, "col": 5},
                "extra": {
                    "severity": "ERROR",
                    "message": "Detected user input used in a SQL string",
                    "lines": "cursor.execute(query)",
                    "metadata": {
                        "category": "security",
                        "owasp": ["A03:2021 - Injection"],
                        "cwe": ["CWE-89: Improper Neutralization of Special Elements"],
                        "references": ["https://owasp.org/Top10/A03_2021-Injection/"]
                    }
                }
            }
        ],
        "errors": [],
        "paths": {"scanned": ["src/app.py"]}
    }"#;

    #[test]
    fn test_normalize_full_result() {
        let report: SemgrepReport = serde_json::from_str(SAMPLE).unwrap();
        let findings = normalize(Some(&report));

        assert_eq!(findings.len(), 1);
        let f = &findings[0];
        assert_eq!(f.severity, Severity::High);
        assert_eq!(f.location, "app.py:42");
        assert_eq!(f.cwe_id, "CWE-89");
        assert_eq!(f.source, FindingSource::Semgrep);
        assert!(f.category.contains("A03:2021"));
        assert_eq!(f.recommendation, "https://owasp.org/Top10/A03_2021-Injection/");
    }

    #[test]
    fn test_none_yields_empty() {
        assert!(normalize(None).is_empty());
        assert!(normalize(Some(&SemgrepReport::default())).is_empty());
    }

    #[test]
    fn test_severity_mapping_is_total() {
        assert_eq!(map_severity("ERROR"), Severity::High);
        assert_eq!(map_severity("warning"), Severity::Medium);
        assert_eq!(map_severity("INFO"), Severity::Low);
        assert_eq!(map_severity("EXPERIMENTAL"), Severity::Medium);
        assert_eq!(map_severity(""), Severity::Medium);
    }

    #[test]
    fn test_missing_line_uses_sentinel() {
        let report = SemgrepReport {
            results: vec![SemgrepResult {
                path: "lib/util.js".to_string(),
                ..SemgrepResult::default()
            }],
            errors: vec![],
        };
        let findings = normalize(Some(&report));
        assert_eq!(findings[0].location, "util.js:N/A");
        assert_eq!(findings[0].cwe_id, "");
    }
}
