use crate::core::{format_location, Finding, FindingSource, Severity};
use serde::{Deserialize, Serialize};

/// Native shape of a Bandit JSON report.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BanditReport {
    #[serde(default)]
    pub results: Vec<BanditIssue>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BanditIssue {
    #[serde(default)]
    pub filename: String,

    #[serde(default)]
    pub line_number: Option<u64>,

    #[serde(default)]
    pub test_id: String,

    #[serde(default)]
    pub test_name: String,

    #[serde(default)]
    pub issue_severity: String,

    #[serde(default)]
    pub issue_confidence: String,

    #[serde(default)]
    pub issue_text: String,

    #[serde(default)]
    pub code: String,

    #[serde(default)]
    pub issue_cwe: Option<BanditCwe>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BanditCwe {
    #[serde(default)]
    pub id: u64,

    #[serde(default)]
    pub link: String,
}

const DEFAULT_RECOMMENDATION: &str = "Review the code and apply secure coding practices.";

/// Bandit's severity vocabulary onto the canonical scale. Anything unmapped
/// defaults to Medium.
pub fn map_severity(raw: &str) -> Severity {
    match raw.to_uppercase().as_str() {
        "HIGH" => Severity::High,
        "MEDIUM" => Severity::Medium,
        "LOW" => Severity::Low,
        _ => Severity::Medium,
    }
}

/// Converts a Bandit report into canonical findings. A missing or empty
/// report yields an empty sequence, not an error.
pub fn normalize(report: Option<&BanditReport>) -> Vec<Finding> {
    let Some(report) = report else {
        return Vec::new();
    };

    report
        .results
        .iter()
        .map(|issue| {
            let title = if issue.test_id.is_empty() {
                issue.test_name.clone()
            } else {
                format!("{} - {}", issue.test_name, issue.test_id)
            };

            let cwe = issue
                .issue_cwe
                .as_ref()
                .filter(|c| c.id > 0)
                .map(|c| format!("CWE-{}", c.id))
                .unwrap_or_default();

            Finding::new(FindingSource::Bandit, map_severity(&issue.issue_severity), title)
                .with_category("Python Security")
                .with_description(issue.issue_text.trim())
                .with_location(format_location(Some(&issue.filename), issue.line_number))
                .with_snippet(issue.code.trim())
                .with_impact(format!(
                    "Reported severity: {}, confidence: {}",
                    issue.issue_severity, issue.issue_confidence
                ))
                .with_recommendation(DEFAULT_RECOMMENDATION)
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
                "filename": "project/db.py",
                "line_number": 17,
                "test_id": "B608",
                "test_name": "hardcoded_sql_expressions",
                "issue_severity": "MEDIUM",
                "issue_confidence": "LOW",
                "issue_text": "Possible SQL injection vector through string-based query construction.",
                "code": "query = \"SELECT * FROM users WHERE id = '%s'\" % user_id",
                "issue_cwe": {"id": 89, "link": "https://cwe.mitre.org/data/definitions/89.html"}
            },
            {
                "filename": "project/auth.py",
                "line_number": 3,
                "test_id": "B105",
                "test_name": "hardcoded_password_string",
                "issue_severity": "HIGH",
                "issue_confidence": "MEDIUM",
                "issue_text": "Possible hardcoded password: 'hunter2'"
            }
        ],
        "metrics": {"_totals": {"SEVERITY.HIGH": 1, "SEVERITY.MEDIUM": 1}}
    }"#;

    #[test]
    fn test_normalize_issues() {
        let report: BanditReport = serde_json::from_str(SAMPLE).unwrap();
        let findings = normalize(Some(&report));

        assert_eq!(findings.len(), 2);
        assert_eq!(findings[0].location, "db.py:17");
        assert_eq!(findings[0].cwe_id, "CWE-89");
        assert_eq!(findings[0].severity, Severity::Medium);
        assert_eq!(findings[0].title, "hardcoded_sql_expressions - B608");

        assert_eq!(findings[1].severity, Severity::High);
        assert_eq!(findings[1].cwe_id, "");
        assert_eq!(findings[1].source, FindingSource::Bandit);
    }

    #[test]
    fn test_none_yields_empty() {
        assert!(normalize(None).is_empty());
        assert!(normalize(Some(&BanditReport::default())).is_empty());
    }

    #[test]
    fn test_severity_mapping_is_total() {
        assert_eq!(map_severity("HIGH"), Severity::High);
        assert_eq!(map_severity("medium"), Severity::Medium);
        assert_eq!(map_severity("LOW"), Severity::Low);
        assert_eq!(map_severity("UNDEFINED"), Severity::Medium);
    }
}
