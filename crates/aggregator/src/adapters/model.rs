use crate::core::{format_location, Finding, FindingSource, Severity, UNKNOWN_PART};
use serde::{Deserialize, Serialize};

/// Native shape of the structured object the model is instructed to embed
/// in its response: a vulnerabilities array, an optional (untrusted) summary
/// block, and an overall assessment narrative. Every field defaults so a
/// minimal `{}` still deserializes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelReport {
    #[serde(default)]
    pub vulnerabilities: Vec<ModelVulnerability>,

    #[serde(default)]
    pub summary: Option<ModelSummary>,

    #[serde(default)]
    pub overall_assessment: String,
}

impl ModelReport {
    /// The fallback structure: zero findings, the raw response preserved as
    /// the narrative so nothing the model said is lost.
    pub fn with_narrative(text: &str) -> Self {
        Self {
            overall_assessment: text.to_string(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelVulnerability {
    #[serde(default)]
    pub severity: String,

    #[serde(default)]
    pub category: String,

    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub location: String,

    #[serde(default)]
    pub code_snippet: String,

    #[serde(default)]
    pub impact: String,

    #[serde(default)]
    pub recommendation: String,

    #[serde(default)]
    pub cwe_id: String,

    #[serde(default)]
    pub source: String,
}

/// The model's own accounting block. Parsed for completeness but never
/// trusted; the engine recomputes every count from the merged findings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelSummary {
    #[serde(default)]
    pub total_vulnerabilities: u64,

    #[serde(default)]
    pub critical: u64,

    #[serde(default)]
    pub high: u64,

    #[serde(default)]
    pub medium: u64,

    #[serde(default)]
    pub low: u64,
}

/// The model's severity strings onto the canonical scale, case-insensitive.
/// Anything unmapped defaults to Medium.
pub fn map_severity(raw: &str) -> Severity {
    match raw.trim().to_lowercase().as_str() {
        "critical" => Severity::Critical,
        "high" => Severity::High,
        "medium" => Severity::Medium,
        "low" => Severity::Low,
        _ => Severity::Medium,
    }
}

/// Converts an extracted model report into canonical findings. A missing or
/// empty report yields an empty sequence, not an error.
///
/// Records the model tags as "Semgrep" or "Bandit" keep that attribution;
/// the merge engine uses it to detect analyzer findings the model silently
/// dropped. Everything else is `ModelAnalysis`.
pub fn normalize(report: Option<&ModelReport>) -> Vec<Finding> {
    let Some(report) = report else {
        return Vec::new();
    };

    report
        .vulnerabilities
        .iter()
        .map(|vuln| {
            let source =
                FindingSource::parse_tag(&vuln.source).unwrap_or(FindingSource::ModelAnalysis);
            let title = if vuln.title.is_empty() {
                "Security issue".to_string()
            } else {
                vuln.title.clone()
            };

            Finding::new(source, map_severity(&vuln.severity), title)
                .with_category(vuln.category.clone())
                .with_description(vuln.description.clone())
                .with_location(normalize_location(&vuln.location))
                .with_snippet(vuln.code_snippet.clone())
                .with_impact(vuln.impact.clone())
                .with_recommendation(vuln.recommendation.clone())
                .with_cwe(&vuln.cwe_id)
        })
        .collect()
}

/// Re-synthesizes the model's free-form location string into the canonical
/// `<basename>:<line>` form, substituting `N/A` for whichever half is
/// missing or unusable.
fn normalize_location(raw: &str) -> String {
    let raw = raw.trim();
    if raw.is_empty() {
        return format!("{UNKNOWN_PART}:{UNKNOWN_PART}");
    }

    match raw.rsplit_once(':') {
        Some((file, line_part)) => {
            let line: String = line_part
                .trim()
                .chars()
                .take_while(|c| c.is_ascii_digit())
                .collect();
            format_location(Some(file), line.parse().ok())
        }
        None => format_location(Some(raw), None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_preserves_model_attribution() {
        let report = ModelReport {
            vulnerabilities: vec![
                ModelVulnerability {
                    severity: "Critical".to_string(),
                    title: "Command injection".to_string(),
                    location: "runner.py:88".to_string(),
                    source: "Semgrep".to_string(),
                    cwe_id: "CWE-78".to_string(),
                    ..ModelVulnerability::default()
                },
                ModelVulnerability {
                    severity: "high".to_string(),
                    title: "Missing auth check".to_string(),
                    location: "api.py:12".to_string(),
                    ..ModelVulnerability::default()
                },
            ],
            ..ModelReport::default()
        };

        let findings = normalize(Some(&report));
        assert_eq!(findings.len(), 2);
        assert_eq!(findings[0].source, FindingSource::Semgrep);
        assert_eq!(findings[0].severity, Severity::Critical);
        assert_eq!(findings[0].cwe_id, "CWE-78");
        assert_eq!(findings[1].source, FindingSource::ModelAnalysis);
        assert_eq!(findings[1].severity, Severity::High);
    }

    #[test]
    fn test_severity_mapping_is_total() {
        assert_eq!(map_severity("Critical"), Severity::Critical);
        assert_eq!(map_severity("HIGH"), Severity::High);
        assert_eq!(map_severity("medium"), Severity::Medium);
        assert_eq!(map_severity("Low"), Severity::Low);
        assert_eq!(map_severity("severe"), Severity::Medium);
        assert_eq!(map_severity(""), Severity::Medium);
    }

    #[test]
    fn test_location_resynthesis() {
        assert_eq!(normalize_location("src/app.py:10"), "app.py:10");
        assert_eq!(normalize_location("app.py:10-12"), "app.py:10");
        assert_eq!(normalize_location("app.py"), "app.py:N/A");
        assert_eq!(normalize_location("app.py:unknown"), "app.py:N/A");
        assert_eq!(normalize_location(""), "N/A:N/A");
    }

    #[test]
    fn test_none_yields_empty() {
        assert!(normalize(None).is_empty());
        assert!(normalize(Some(&ModelReport::default())).is_empty());
    }
}
