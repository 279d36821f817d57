use crate::adapters;
use crate::batch::BatchPlanner;
use crate::core::{
    AnalysisReport, AnalysisSummary, Finding, FindingSource, ProjectInfo, SourceOutcome,
};
use crate::discovery::SourceFile;
use crate::extract::extract_response;
use crate::llm::{build_user_prompt, LlmConfig, LlmProvider, LlmRequest, PromptFile, SYSTEM_PROMPT};
use crate::merge::{merge_with_stats, FindingSet};
use crate::tools::{BanditRunner, SemgrepRunner};
use std::collections::HashSet;
use std::fmt::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Semaphore;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum RunError {
    #[error("no analyzable files under {0}")]
    NoInputFiles(PathBuf),

    /// Every configured source failed. Surfaced instead of a report so a
    /// total failure can never read as a clean scan.
    #[error("all analysis sources failed")]
    AllSourcesFailed { outcomes: Vec<SourceOutcome> },
}

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub max_batch_files: usize,

    pub max_batch_payload: u64,

    pub llm: LlmConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_batch_files: 10,
            max_batch_payload: 200_000,
            llm: LlmConfig::default(),
        }
    }
}

enum BatchResult {
    Completed {
        findings: Vec<Finding>,
        parsed: bool,
        assessment: String,
    },
    Failed(String),
}

/// Orchestrates one run: analyzers and model batches fan out concurrently,
/// per-batch buffers collect in batch order, and the merge stage runs as a
/// single-threaded barrier once every batch has resolved; dedup depends on
/// seeing all locations, not per-batch slices.
pub struct AnalysisEngine {
    semgrep: Option<SemgrepRunner>,
    bandit: Option<BanditRunner>,
    provider: Option<Arc<dyn LlmProvider>>,
    config: EngineConfig,
}

impl AnalysisEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            semgrep: None,
            bandit: None,
            provider: None,
            config,
        }
    }

    pub fn with_semgrep(mut self, runner: SemgrepRunner) -> Self {
        self.semgrep = Some(runner);
        self
    }

    pub fn with_bandit(mut self, runner: BanditRunner) -> Self {
        self.bandit = Some(runner);
        self
    }

    pub fn with_provider(mut self, provider: Arc<dyn LlmProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    pub async fn run(
        &self,
        target: &Path,
        files: Vec<SourceFile>,
    ) -> Result<AnalysisReport, RunError> {
        if files.is_empty() {
            return Err(RunError::NoInputFiles(target.to_path_buf()));
        }

        let mut outcomes: Vec<SourceOutcome> = Vec::new();

        // Analyzer stage. The two subprocesses are independent; run them
        // together, each under its own timeout. A failure here is recorded
        // and the run continues.
        let (semgrep_raw, bandit_raw) = tokio::join!(
            async {
                match &self.semgrep {
                    Some(runner) => Some(runner.run(target).await),
                    None => None,
                }
            },
            async {
                match &self.bandit {
                    Some(runner) => Some(runner.run(target).await),
                    None => None,
                }
            },
        );

        let semgrep_findings = match semgrep_raw {
            Some(Ok(report)) => {
                let findings = adapters::semgrep::normalize(Some(&report));
                outcomes.push(SourceOutcome::succeeded(
                    FindingSource::Semgrep,
                    findings.len(),
                ));
                findings
            }
            Some(Err(e)) => {
                warn!(error = %e, "semgrep failed");
                outcomes.push(SourceOutcome::failed(FindingSource::Semgrep, e.to_string()));
                Vec::new()
            }
            None => Vec::new(),
        };

        let bandit_findings = match bandit_raw {
            Some(Ok(report)) => {
                let findings = adapters::bandit::normalize(Some(&report));
                outcomes.push(SourceOutcome::succeeded(
                    FindingSource::Bandit,
                    findings.len(),
                ));
                findings
            }
            Some(Err(e)) => {
                warn!(error = %e, "bandit failed");
                outcomes.push(SourceOutcome::failed(FindingSource::Bandit, e.to_string()));
                Vec::new()
            }
            None => Vec::new(),
        };

        let analyzer_findings: Vec<Finding> = semgrep_findings
            .iter()
            .chain(bandit_findings.iter())
            .cloned()
            .collect();

        // Model stage: payload-bounded batches, bounded concurrency, one
        // timeout per call. Results land in per-batch buffers keyed by batch
        // index so the model's own ordering is preserved.
        let planner = BatchPlanner::new()
            .with_max_group_size(self.config.max_batch_files)
            .with_max_group_payload(self.config.max_batch_payload);
        let plan = planner.plan_by_payload(&files);
        let oversized_files = plan.oversized.len();

        let mut model_findings: Vec<Finding> = Vec::new();
        let mut model_assessment = String::new();
        if let Some(ref provider) = self.provider {
            let timeout = Duration::from_secs(self.config.llm.timeout_seconds);
            let semaphore = Arc::new(Semaphore::new(
                self.config.llm.concurrent_requests.max(1),
            ));
            let mut join_set = tokio::task::JoinSet::new();
            let mut batches_sent = 0usize;

            for (index, group) in plan.groups.iter().enumerate() {
                let prompt_files: Vec<PromptFile> = group
                    .iter()
                    .filter_map(|file| {
                        file.read_contents().map(|contents| PromptFile {
                            name: file.display_name(),
                            contents,
                        })
                    })
                    .collect();
                if prompt_files.is_empty() {
                    continue;
                }

                let context = batch_context(&analyzer_findings, &prompt_files);
                let request = LlmRequest {
                    system_prompt: SYSTEM_PROMPT.to_string(),
                    user_prompt: build_user_prompt(&prompt_files, &context),
                    temperature: self.config.llm.temperature,
                    max_tokens: self.config.llm.max_tokens,
                };

                batches_sent += 1;
                let provider = Arc::clone(provider);
                let semaphore = Arc::clone(&semaphore);
                join_set.spawn(async move {
                    let _permit = semaphore
                        .acquire_owned()
                        .await
                        .expect("semaphore closed");

                    let result = match tokio::time::timeout(timeout, provider.complete(request))
                        .await
                    {
                        Err(_) => BatchResult::Failed(format!(
                            "timed out after {}s",
                            timeout.as_secs()
                        )),
                        Ok(Err(e)) => BatchResult::Failed(e.to_string()),
                        Ok(Ok(response)) => {
                            let extraction = extract_response(&response.content);
                            BatchResult::Completed {
                                findings: adapters::model::normalize(Some(&extraction.report)),
                                parsed: extraction.parsed,
                                assessment: extraction.report.overall_assessment,
                            }
                        }
                    };
                    (index, result)
                });
            }

            let mut slots: Vec<Option<BatchResult>> = Vec::new();
            slots.resize_with(plan.groups.len(), || None);
            while let Some(joined) = join_set.join_next().await {
                match joined {
                    Ok((index, result)) => slots[index] = Some(result),
                    Err(e) => warn!(error = %e, "batch task panicked"),
                }
            }

            let mut failed_batches = 0usize;
            let mut fallback_batches = 0usize;
            for slot in slots.into_iter().flatten() {
                match slot {
                    BatchResult::Completed {
                        findings,
                        parsed,
                        assessment,
                    } => {
                        if !parsed {
                            fallback_batches += 1;
                        }
                        if model_assessment.is_empty() && parsed && !assessment.is_empty() {
                            model_assessment = assessment;
                        }
                        model_findings.extend(findings);
                    }
                    BatchResult::Failed(error) => {
                        warn!(error = %error, "model batch failed");
                        failed_batches += 1;
                    }
                }
            }

            let outcome = if batches_sent > 0 && failed_batches == batches_sent {
                SourceOutcome::failed(
                    FindingSource::ModelAnalysis,
                    format!("all {batches_sent} batches failed"),
                )
                .with_batch_stats(failed_batches, fallback_batches)
            } else {
                SourceOutcome::succeeded(FindingSource::ModelAnalysis, model_findings.len())
                    .with_batch_stats(failed_batches, fallback_batches)
            };
            outcomes.push(outcome);
        }

        if outcomes.is_empty() || outcomes.iter().all(|o| !o.succeeded) {
            return Err(RunError::AllSourcesFailed { outcomes });
        }

        // Merge barrier: every batch has resolved, dedup sees the full set.
        let (merged, stats) = merge_with_stats(vec![
            FindingSet::analyzer(semgrep_findings),
            FindingSet::analyzer(bandit_findings),
            FindingSet::model(model_findings),
        ]);
        info!(
            merged = stats.merged_total,
            reinserted = stats.reinserted,
            duplicates_removed = stats.duplicates_removed,
            "merge complete"
        );

        let project = ProjectInfo {
            name: target
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| target.to_string_lossy().into_owned()),
            path: target.to_string_lossy().into_owned(),
            total_files: files.len(),
            oversized_files,
        };

        let narrative = build_narrative(&project, &merged, &outcomes, &model_assessment);
        Ok(AnalysisReport::assemble(
            merged,
            narrative,
            outcomes,
            Some(project),
        ))
    }
}

/// Analyzer findings relevant to one batch: those whose location names a
/// file in the batch. The merge barrier re-inserts anything the model never
/// saw, so narrowing the prompt loses nothing.
fn batch_context(analyzer_findings: &[Finding], files: &[PromptFile]) -> Vec<Finding> {
    let names: HashSet<&str> = files.iter().map(|f| f.name.as_str()).collect();
    analyzer_findings
        .iter()
        .filter(|finding| {
            finding
                .location
                .rsplit_once(':')
                .map(|(file, _)| names.contains(file))
                .unwrap_or(false)
        })
        .cloned()
        .collect()
}

fn build_narrative(
    project: &ProjectInfo,
    findings: &[Finding],
    outcomes: &[SourceOutcome],
    model_assessment: &str,
) -> String {
    let summary = AnalysisSummary::from_findings(findings);
    let succeeded = outcomes.iter().filter(|o| o.succeeded).count();
    let failed = outcomes.len() - succeeded;

    let mut narrative = String::new();
    let _ = writeln!(
        narrative,
        "Security analysis of project '{}' complete.",
        project.name
    );
    let _ = writeln!(narrative, "Files analyzed: {}.", project.total_files);
    if project.oversized_files > 0 {
        let _ = writeln!(
            narrative,
            "{} oversized input(s) were isolated into single-file batches.",
            project.oversized_files
        );
    }
    let _ = writeln!(
        narrative,
        "Sources: {succeeded} succeeded, {failed} failed."
    );
    for outcome in outcomes {
        match &outcome.error {
            Some(error) => {
                let _ = writeln!(narrative, "- {}: FAILED ({error})", outcome.source);
            }
            None => {
                let mut line = format!("- {}: {} finding(s)", outcome.source, outcome.findings);
                if outcome.failed_batches > 0 {
                    let _ = write!(line, ", {} batch(es) failed", outcome.failed_batches);
                }
                if outcome.fallback_batches > 0 {
                    let _ = write!(
                        line,
                        ", {} response(s) fell back to raw text",
                        outcome.fallback_batches
                    );
                }
                let _ = writeln!(narrative, "{line}");
            }
        }
    }
    let _ = writeln!(
        narrative,
        "Findings: {} total (Critical: {}, High: {}, Medium: {}, Low: {}).",
        summary.total,
        summary.by_severity.critical,
        summary.by_severity.high,
        summary.by_severity.medium,
        summary.by_severity.low,
    );
    if !model_assessment.is_empty() {
        let _ = writeln!(narrative, "\nModel assessment: {}", model_assessment.trim());
    }
    narrative.push_str("\nAddress the highest-severity findings first.");

    narrative
}
