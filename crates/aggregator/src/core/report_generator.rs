use crate::core::report::AnalysisReport;
use crate::core::severity::Severity;
use anyhow::Result;
use std::fmt::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Markdown,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown output format: {}", s)),
        }
    }
}

pub struct ReportGenerator;

impl ReportGenerator {
    pub fn generate(report: &AnalysisReport, format: OutputFormat) -> Result<String> {
        match format {
            OutputFormat::Markdown => Self::generate_markdown(report),
            OutputFormat::Json => Self::generate_json(report),
        }
    }

    fn generate_markdown(report: &AnalysisReport) -> Result<String> {
        let mut out = String::new();

        writeln!(out, "# Security Analysis Report\n")?;
        writeln!(
            out,
            "**Generated**: {}",
            report.metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
        )?;
        writeln!(out, "**Engine Version**: {}", report.metadata.engine_version)?;
        if let Some(ref project) = report.metadata.project {
            writeln!(out, "**Project**: {} (`{}`)", project.name, project.path)?;
            writeln!(out, "**Files Analyzed**: {}", project.total_files)?;
            if project.oversized_files > 0 {
                writeln!(
                    out,
                    "**Oversized Inputs**: {} (isolated into single-file batches)",
                    project.oversized_files
                )?;
            }
        }

        writeln!(out, "\n## Executive Summary\n")?;
        writeln!(out, "- **Total Findings**: {}", report.summary.total)?;
        writeln!(out, "- **Critical**: {}", report.summary.by_severity.critical)?;
        writeln!(out, "- **High**: {}", report.summary.by_severity.high)?;
        writeln!(out, "- **Medium**: {}", report.summary.by_severity.medium)?;
        writeln!(out, "- **Low**: {}", report.summary.by_severity.low)?;
        writeln!(
            out,
            "- **Sources**: {} succeeded, {} failed",
            report.sources_succeeded(),
            report.sources_failed()
        )?;

        writeln!(out, "\n### Source Breakdown\n")?;
        writeln!(out, "| Source | Status | Findings | Failed Batches | Fallback Batches |")?;
        writeln!(out, "|--------|--------|----------|----------------|------------------|")?;
        for outcome in &report.outcomes {
            writeln!(
                out,
                "| {} | {} | {} | {} | {} |",
                outcome.source,
                if outcome.succeeded { "ok" } else { "failed" },
                outcome.findings,
                outcome.failed_batches,
                outcome.fallback_batches,
            )?;
        }

        if !report.narrative.is_empty() {
            writeln!(out, "\n## Assessment\n")?;
            writeln!(out, "{}", report.narrative.trim())?;
        }

        writeln!(out, "\n## Findings\n")?;
        if report.findings.is_empty() {
            writeln!(out, "No vulnerabilities found.")?;
        }

        let mut index = 0usize;
        for severity in Severity::descending() {
            let group: Vec<_> = report
                .findings
                .iter()
                .filter(|f| f.severity == severity)
                .collect();
            if group.is_empty() {
                continue;
            }

            writeln!(out, "### {} {} ({})\n", severity.emoji(), severity, group.len())?;

            for finding in group {
                index += 1;
                writeln!(out, "#### {}. {}\n", index, finding.title)?;
                writeln!(out, "- **Source**: {}", finding.source)?;
                writeln!(out, "- **Location**: `{}`", finding.location)?;
                if !finding.category.is_empty() {
                    writeln!(out, "- **Category**: {}", finding.category)?;
                }
                if !finding.cwe_id.is_empty() {
                    writeln!(out, "- **CWE**: {}", finding.cwe_id)?;
                }
                if !finding.description.is_empty() {
                    writeln!(out, "\n{}", finding.description.trim())?;
                }
                if !finding.code_snippet.is_empty() {
                    writeln!(out, "\n```\n{}\n```", finding.code_snippet.trim_end())?;
                }
                if !finding.impact.is_empty() {
                    writeln!(out, "\n**Impact**: {}", finding.impact)?;
                }
                if !finding.recommendation.is_empty() {
                    writeln!(out, "\n**Recommendation**: {}", finding.recommendation)?;
                }
                writeln!(out)?;
            }
        }

        Ok(out)
    }

    fn generate_json(report: &AnalysisReport) -> Result<String> {
        serde_json::to_string_pretty(report)
            .map_err(|e| anyhow::anyhow!("Failed to serialize report to JSON: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::finding::Finding;
    use crate::core::report::SourceOutcome;
    use crate::core::severity::FindingSource;

    fn sample_report() -> AnalysisReport {
        AnalysisReport::assemble(
            vec![
                Finding::new(FindingSource::Semgrep, Severity::High, "SQL injection")
                    .with_location("app.py:10")
                    .with_cwe("CWE-89"),
                Finding::new(FindingSource::ModelAnalysis, Severity::Critical, "Hardcoded key")
                    .with_location("config.py:3"),
            ],
            "Two issues found.".to_string(),
            vec![SourceOutcome::succeeded(FindingSource::Semgrep, 1)],
            None,
        )
    }

    #[test]
    fn test_markdown_groups_by_severity_descending() {
        let report = sample_report();
        let md = ReportGenerator::generate(&report, OutputFormat::Markdown).unwrap();

        let critical_pos = md.find("Hardcoded key").unwrap();
        let high_pos = md.find("SQL injection").unwrap();
        assert!(critical_pos < high_pos, "critical findings render first");
        assert!(md.contains("CWE-89"));
        assert!(md.contains("1 succeeded, 0 failed"));
    }

    #[test]
    fn test_json_round_trip() {
        let report = sample_report();
        let json = ReportGenerator::generate(&report, OutputFormat::Json).unwrap();
        let parsed: AnalysisReport = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.summary.total, 2);
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!("md".parse::<OutputFormat>().unwrap(), OutputFormat::Markdown);
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert!("html".parse::<OutputFormat>().is_err());
    }
}
