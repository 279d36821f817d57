use crate::adapters::SemgrepReport;
use crate::tools::{clip_stderr, ToolError};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info};

const TOOL: &str = "semgrep";

/// Invokes Semgrep against a target directory and parses its JSON output.
///
/// Semgrep exits 1 when findings are present; only statuses of 2 and above
/// are treated as failure.
#[derive(Debug, Clone)]
pub struct SemgrepRunner {
    executable: PathBuf,
    rulesets: Vec<String>,
    timeout: Duration,
    per_rule_timeout_seconds: u64,
}

impl Default for SemgrepRunner {
    fn default() -> Self {
        Self {
            executable: PathBuf::from("semgrep"),
            rulesets: vec![
                "p/owasp-top-ten".to_string(),
                "p/security-audit".to_string(),
            ],
            timeout: Duration::from_secs(600),
            per_rule_timeout_seconds: 60,
        }
    }
}

impl SemgrepRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_executable(mut self, executable: impl Into<PathBuf>) -> Self {
        self.executable = executable.into();
        self
    }

    pub fn with_rulesets(mut self, rulesets: Vec<String>) -> Self {
        self.rulesets = rulesets;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub async fn run(&self, target: &Path) -> Result<SemgrepReport, ToolError> {
        info!(target = %target.display(), "running semgrep");

        let mut command = Command::new(&self.executable);
        for ruleset in &self.rulesets {
            command.arg("--config").arg(ruleset);
        }
        command
            .arg("--json")
            .arg("--no-git-ignore")
            .arg("--metrics")
            .arg("off")
            .arg("--timeout")
            .arg(self.per_rule_timeout_seconds.to_string())
            .arg(target)
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::piped())
            .kill_on_drop(true);

        let output = tokio::time::timeout(self.timeout, command.output())
            .await
            .map_err(|_| ToolError::Timeout {
                tool: TOOL,
                seconds: self.timeout.as_secs(),
            })?
            .map_err(|source| ToolError::Spawn { tool: TOOL, source })?;

        let code = output.status.code().unwrap_or(-1);
        // Exit code 1 is "findings present", not an error.
        if code >= 2 || code < 0 {
            return Err(ToolError::Failed {
                tool: TOOL,
                code,
                stderr: clip_stderr(&output.stderr),
            });
        }

        if output.stdout.iter().all(u8::is_ascii_whitespace) {
            return Err(ToolError::EmptyOutput { tool: TOOL });
        }

        let report: SemgrepReport = serde_json::from_slice(&output.stdout)
            .map_err(|source| ToolError::InvalidOutput { tool: TOOL, source })?;

        debug!(results = report.results.len(), "semgrep finished");
        Ok(report)
    }
}
