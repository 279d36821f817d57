//! Structured-text extraction: recovers the embedded result object from a
//! model response that is expected, but not guaranteed, to contain one.
//!
//! The locator is the first-`{` / last-`}` heuristic: it tolerates prose
//! before and after the object but assumes the response holds at most one
//! top-level block. It is a documented heuristic, not a general parser; if
//! a provider ever emits multiple blocks or trailing prose containing `}`,
//! this needs a balanced-delimiter scan instead.

use crate::adapters::ModelReport;
use tracing::{debug, warn};

/// An extraction never fails past this boundary: `report` is always
/// well-formed, and `parsed` tells the caller whether it came from the
/// response or from the fallback (needed for merge accounting).
#[derive(Debug, Clone)]
pub struct Extraction {
    pub report: ModelReport,
    pub parsed: bool,
}

pub fn extract_response(text: &str) -> Extraction {
    if let (Some(start), Some(end)) = (text.find('{'), text.rfind('}')) {
        if end > start {
            match serde_json::from_str::<ModelReport>(&text[start..=end]) {
                Ok(report) => {
                    debug!(
                        vulnerabilities = report.vulnerabilities.len(),
                        "parsed structured block from model response"
                    );
                    return Extraction {
                        report,
                        parsed: true,
                    };
                }
                Err(e) => {
                    debug!(error = %e, "candidate block did not parse");
                }
            }
        }
    }

    warn!("no structured block recovered from model response; using fallback");
    Extraction {
        report: ModelReport::with_narrative(text),
        parsed: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path_with_surrounding_prose() {
        let text = r#"Here is the result: {"vulnerabilities": [], "summary": {"total_vulnerabilities": 0}} Let me know if you need more."#;
        let extraction = extract_response(text);

        assert!(extraction.parsed);
        assert!(extraction.report.vulnerabilities.is_empty());
    }

    #[test]
    fn test_refusal_falls_back() {
        let extraction = extract_response("Sorry, I cannot comply.");

        assert!(!extraction.parsed);
        assert!(extraction.report.vulnerabilities.is_empty());
        assert_eq!(extraction.report.overall_assessment, "Sorry, I cannot comply.");
    }

    #[test]
    fn test_truncated_json_falls_back_with_narrative() {
        let text = r#"{"vulnerabilities": [{"severity": "High", "title": "cut of"#;
        let extraction = extract_response(text);

        assert!(!extraction.parsed);
        assert_eq!(extraction.report.overall_assessment, text);
    }

    #[test]
    fn test_findings_survive_extraction() {
        let text = r#"Analysis complete.
{"vulnerabilities": [{"severity": "Critical", "title": "eval on user input", "location": "app.py:7", "source": "ModelAnalysis"}], "overall_assessment": "one issue"}"#;
        let extraction = extract_response(text);

        assert!(extraction.parsed);
        assert_eq!(extraction.report.vulnerabilities.len(), 1);
        assert_eq!(extraction.report.overall_assessment, "one issue");
    }

    #[test]
    fn test_braces_in_wrong_order_fall_back() {
        let extraction = extract_response("} nothing useful {");
        assert!(!extraction.parsed);
    }
}
