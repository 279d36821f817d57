use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Critical => write!(f, "Critical"),
            Self::High => write!(f, "High"),
            Self::Medium => write!(f, "Medium"),
            Self::Low => write!(f, "Low"),
        }
    }
}

impl Severity {
    pub fn color(&self) -> &'static str {
        match self {
            Self::Critical => "red",
            Self::High => "bright red",
            Self::Medium => "yellow",
            Self::Low => "green",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            Self::Critical => "🔴",
            Self::High => "🟠",
            Self::Medium => "🟡",
            Self::Low => "🟢",
        }
    }

    /// All levels, most severe first. Report rendering iterates in this order.
    pub fn descending() -> [Severity; 4] {
        [Self::Critical, Self::High, Self::Medium, Self::Low]
    }
}

/// Provenance of a finding. Always set by the adapter that produced the
/// record, never inferred downstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FindingSource {
    Semgrep,
    Bandit,
    ModelAnalysis,
}

impl fmt::Display for FindingSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Semgrep => write!(f, "Semgrep"),
            Self::Bandit => write!(f, "Bandit"),
            Self::ModelAnalysis => write!(f, "ModelAnalysis"),
        }
    }
}

impl FindingSource {
    /// Resolves the free-form `source` tag the model attaches to records it
    /// re-describes from an analyzer. Anything unrecognized is `None`; the
    /// model adapter falls back to `ModelAnalysis` for those.
    pub fn parse_tag(tag: &str) -> Option<Self> {
        match tag.trim().to_lowercase().as_str() {
            "semgrep" => Some(Self::Semgrep),
            "bandit" => Some(Self::Bandit),
            "modelanalysis" | "model analysis" | "model" | "llm" | "llm analysis" => {
                Some(Self::ModelAnalysis)
            }
            _ => None,
        }
    }

    pub fn is_model(&self) -> bool {
        matches!(self, Self::ModelAnalysis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_total_order() {
        assert!(Severity::Critical > Severity::High);
        assert!(Severity::High > Severity::Medium);
        assert!(Severity::Medium > Severity::Low);
    }

    #[test]
    fn test_severity_display() {
        assert_eq!(Severity::Critical.to_string(), "Critical");
        assert_eq!(Severity::Low.to_string(), "Low");
    }

    #[test]
    fn test_source_tag_parsing() {
        assert_eq!(FindingSource::parse_tag("Semgrep"), Some(FindingSource::Semgrep));
        assert_eq!(FindingSource::parse_tag("  bandit "), Some(FindingSource::Bandit));
        assert_eq!(
            FindingSource::parse_tag("LLM Analysis"),
            Some(FindingSource::ModelAnalysis)
        );
        assert_eq!(FindingSource::parse_tag("something else"), None);
    }
}
