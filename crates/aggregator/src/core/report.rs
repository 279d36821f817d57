use crate::core::finding::Finding;
use crate::core::severity::{FindingSource, Severity};
use crate::core::summary::AnalysisSummary;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Per-source success/failure accounting. The report always carries one of
/// these for every source that ran, so a partial failure can never be
/// mistaken for a clean scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceOutcome {
    pub source: FindingSource,

    pub succeeded: bool,

    pub findings: usize,

    /// Model batches that errored or timed out. Zero for analyzer sources.
    pub failed_batches: usize,

    /// Model batches whose response fell back to the empty structure.
    pub fallback_batches: usize,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SourceOutcome {
    pub fn succeeded(source: FindingSource, findings: usize) -> Self {
        Self {
            source,
            succeeded: true,
            findings,
            failed_batches: 0,
            fallback_batches: 0,
            error: None,
        }
    }

    pub fn failed(source: FindingSource, error: impl Into<String>) -> Self {
        Self {
            source,
            succeeded: false,
            findings: 0,
            failed_batches: 0,
            fallback_batches: 0,
            error: Some(error.into()),
        }
    }

    pub fn with_batch_stats(mut self, failed: usize, fallbacks: usize) -> Self {
        self.failed_batches = failed;
        self.fallback_batches = fallbacks;
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectInfo {
    pub name: String,

    pub path: String,

    pub total_files: usize,

    /// Inputs that exceeded the single-batch payload cap. Reported, never
    /// silently dropped.
    pub oversized_files: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    pub generated_at: DateTime<Utc>,

    pub engine_version: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub project: Option<ProjectInfo>,
}

impl Default for ReportMetadata {
    fn default() -> Self {
        Self {
            generated_at: Utc::now(),
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            project: None,
        }
    }
}

/// The final result object handed to presentation. Pure aggregation: the
/// assembler combines already-computed pieces and makes no decisions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub findings: Vec<Finding>,

    pub summary: AnalysisSummary,

    pub narrative: String,

    pub outcomes: Vec<SourceOutcome>,

    pub metadata: ReportMetadata,
}

impl AnalysisReport {
    pub fn assemble(
        findings: Vec<Finding>,
        narrative: String,
        outcomes: Vec<SourceOutcome>,
        project: Option<ProjectInfo>,
    ) -> Self {
        let summary = AnalysisSummary::from_findings(&findings);
        Self {
            findings,
            summary,
            narrative,
            outcomes,
            metadata: ReportMetadata {
                project,
                ..ReportMetadata::default()
            },
        }
    }

    pub fn sources_succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.succeeded).count()
    }

    pub fn sources_failed(&self) -> usize {
        self.outcomes.iter().filter(|o| !o.succeeded).count()
    }

    pub fn high_severity_findings(&self) -> Vec<&Finding> {
        self.findings
            .iter()
            .filter(|f| matches!(f.severity, Severity::High | Severity::Critical))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::finding::Finding;

    #[test]
    fn test_assemble_recomputes_summary() {
        let findings = vec![
            Finding::new(FindingSource::Semgrep, Severity::High, "a").with_location("a.py:1"),
            Finding::new(FindingSource::ModelAnalysis, Severity::Low, "b").with_location("b.py:2"),
        ];

        let report = AnalysisReport::assemble(
            findings,
            "narrative".to_string(),
            vec![
                SourceOutcome::succeeded(FindingSource::Semgrep, 1),
                SourceOutcome::failed(FindingSource::Bandit, "spawn failed"),
            ],
            None,
        );

        assert_eq!(report.summary.total, 2);
        assert_eq!(report.summary.by_severity.high, 1);
        assert_eq!(report.sources_succeeded(), 1);
        assert_eq!(report.sources_failed(), 1);
        assert_eq!(report.high_severity_findings().len(), 1);
    }
}
