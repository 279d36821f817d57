//! External analyzer invocation: thin subprocess wrappers that produce the
//! native reports the adapters consume.
//!
//! Each runner enforces its own timeout, and a failure here never aborts the
//! run; the engine records the source as failed and continues with whatever
//! sources succeeded.

pub mod bandit;
pub mod semgrep;

pub use bandit::BanditRunner;
pub use semgrep::SemgrepRunner;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("failed to launch {tool}: {source}")]
    Spawn {
        tool: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("{tool} timed out after {seconds}s")]
    Timeout { tool: &'static str, seconds: u64 },

    #[error("{tool} exited with status {code}: {stderr}")]
    Failed {
        tool: &'static str,
        code: i32,
        stderr: String,
    },

    #[error("{tool} produced no output")]
    EmptyOutput { tool: &'static str },

    #[error("{tool} produced unparsable output: {source}")]
    InvalidOutput {
        tool: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// Truncates stderr for error messages; analyzer stderr can run to pages.
pub(crate) fn clip_stderr(raw: &[u8]) -> String {
    let text = String::from_utf8_lossy(raw);
    let mut clipped: String = text.trim().chars().take(500).collect();
    if clipped.len() < text.trim().len() {
        clipped.push_str("…");
    }
    clipped
}
