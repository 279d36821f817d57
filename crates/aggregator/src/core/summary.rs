use crate::core::finding::Finding;
use crate::core::severity::{FindingSource, Severity};
use serde::{Deserialize, Serialize};

/// Aggregate counts over a finding sequence.
///
/// A summary is always a pure function of the findings it describes: it is
/// recomputed from scratch after every merge and never patched
/// incrementally, so `total` and the breakdowns cannot drift out of sync
/// with the sequence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisSummary {
    pub total: usize,

    pub by_severity: SeverityBreakdown,

    pub by_source: SourceBreakdown,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityBreakdown {
    pub critical: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceBreakdown {
    pub semgrep: usize,
    pub bandit: usize,
    pub model: usize,
}

impl AnalysisSummary {
    pub fn from_findings(findings: &[Finding]) -> Self {
        let mut summary = Self {
            total: findings.len(),
            ..Self::default()
        };

        for finding in findings {
            match finding.severity {
                Severity::Critical => summary.by_severity.critical += 1,
                Severity::High => summary.by_severity.high += 1,
                Severity::Medium => summary.by_severity.medium += 1,
                Severity::Low => summary.by_severity.low += 1,
            }
            match finding.source {
                FindingSource::Semgrep => summary.by_source.semgrep += 1,
                FindingSource::Bandit => summary.by_source.bandit += 1,
                FindingSource::ModelAnalysis => summary.by_source.model += 1,
            }
        }

        summary
    }

    pub fn count_for(&self, severity: Severity) -> usize {
        match severity {
            Severity::Critical => self.by_severity.critical,
            Severity::High => self.by_severity.high,
            Severity::Medium => self.by_severity.medium,
            Severity::Low => self.by_severity.low,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finding(severity: Severity, source: FindingSource, location: &str) -> Finding {
        Finding::new(source, severity, "test").with_location(location)
    }

    #[test]
    fn test_counts_are_consistent() {
        let findings = vec![
            finding(Severity::Critical, FindingSource::Semgrep, "a.py:1"),
            finding(Severity::High, FindingSource::Bandit, "a.py:2"),
            finding(Severity::High, FindingSource::ModelAnalysis, "b.py:3"),
            finding(Severity::Low, FindingSource::ModelAnalysis, "b.py:9"),
        ];

        let summary = AnalysisSummary::from_findings(&findings);

        assert_eq!(summary.total, findings.len());
        let severity_sum = summary.by_severity.critical
            + summary.by_severity.high
            + summary.by_severity.medium
            + summary.by_severity.low;
        assert_eq!(severity_sum, summary.total);
        let source_sum =
            summary.by_source.semgrep + summary.by_source.bandit + summary.by_source.model;
        assert_eq!(source_sum, summary.total);
        assert_eq!(summary.by_severity.high, 2);
        assert_eq!(summary.by_source.model, 2);
    }

    #[test]
    fn test_empty_findings() {
        let summary = AnalysisSummary::from_findings(&[]);
        assert_eq!(summary, AnalysisSummary::default());
    }
}
