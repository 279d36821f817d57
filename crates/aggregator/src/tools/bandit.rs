use crate::adapters::BanditReport;
use crate::tools::{clip_stderr, ToolError};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info};

const TOOL: &str = "bandit";

/// Invokes Bandit recursively against a target directory and parses its
/// JSON output. Bandit exits 1 when issues are found; 2 and above is
/// failure.
#[derive(Debug, Clone)]
pub struct BanditRunner {
    executable: PathBuf,
    timeout: Duration,
}

impl Default for BanditRunner {
    fn default() -> Self {
        Self {
            executable: PathBuf::from("bandit"),
            timeout: Duration::from_secs(300),
        }
    }
}

impl BanditRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_executable(mut self, executable: impl Into<PathBuf>) -> Self {
        self.executable = executable.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub async fn run(&self, target: &Path) -> Result<BanditReport, ToolError> {
        info!(target = %target.display(), "running bandit");

        let mut command = Command::new(&self.executable);
        command
            .arg("-r")
            .arg(target)
            .arg("-f")
            .arg("json")
            .arg("-q")
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
        // Exit code 1 is "issues found", not an error.
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

        let report: BanditReport = serde_json::from_slice(&output.stdout)
            .map_err(|source| ToolError::InvalidOutput { tool: TOOL, source })?;

        debug!(results = report.results.len(), "bandit finished");
        Ok(report)
    }
}
