//! Prompt assembly: code context plus prior-stage analyzer findings,
//! rendered into the system/user prompt pair for one batch.

use crate::core::{Finding, FindingSource};
use std::fmt::Write;

/// Files larger than this are truncated in the prompt rather than dropped.
const MAX_FILE_CHARS: usize = 10_000;

pub const SYSTEM_PROMPT: &str = "You are an experienced application security engineer. \
You analyze source code for vulnerabilities and respond with pure JSON only: \
no prose, no markdown fences.";

/// The response schema the model is instructed to emit. Mirrors the native
/// shape `adapters::model` deserializes.
pub const RESPONSE_SCHEMA: &str = r#"{
  "vulnerabilities": [
    {
      "severity": "Critical|High|Medium|Low",
      "category": "e.g. SQL Injection, XSS, Hardcoded Secrets",
      "title": "clear vulnerability title",
      "description": "detailed explanation",
      "location": "filename:line",
      "code_snippet": "the offending code",
      "impact": "concrete security impact",
      "recommendation": "actionable fix",
      "cwe_id": "CWE-XXX (when applicable)",
      "source": "Semgrep|Bandit|ModelAnalysis"
    }
  ],
  "summary": {
    "total_vulnerabilities": 0,
    "critical": 0,
    "high": 0,
    "medium": 0,
    "low": 0
  },
  "overall_assessment": "overall security posture"
}"#;

/// One file to include in the batch prompt: display name plus contents.
#[derive(Debug, Clone)]
pub struct PromptFile {
    pub name: String,
    pub contents: String,
}

pub fn build_user_prompt(files: &[PromptFile], analyzer_findings: &[Finding]) -> String {
    let semgrep_count = count_source(analyzer_findings, FindingSource::Semgrep);
    let bandit_count = count_source(analyzer_findings, FindingSource::Bandit);

    let mut prompt = String::new();

    prompt.push_str("Analyze the following code for security vulnerabilities.\n\n");

    prompt.push_str("## Static analyzer results\n\n");
    if analyzer_findings.is_empty() {
        prompt.push_str("No issues were reported by the static analyzers.\n");
    } else {
        let _ = writeln!(
            prompt,
            "The static analyzers reported {} issues (Semgrep: {}, Bandit: {}).",
            analyzer_findings.len(),
            semgrep_count,
            bandit_count
        );
        for (idx, finding) in analyzer_findings.iter().enumerate() {
            let _ = writeln!(prompt, "\n[Issue #{}]", idx + 1);
            let _ = writeln!(prompt, "Source: {}", finding.source);
            let _ = writeln!(prompt, "Location: {}", finding.location);
            let _ = writeln!(prompt, "Severity: {}", finding.severity);
            if !finding.cwe_id.is_empty() {
                let _ = writeln!(prompt, "CWE: {}", finding.cwe_id);
            }
            let _ = writeln!(prompt, "Description: {}", finding.title);
            if !finding.code_snippet.is_empty() {
                let _ = writeln!(prompt, "Code:\n{}", finding.code_snippet);
            }
        }
    }

    prompt.push_str("\n## Code\n");
    for file in files {
        let contents = if file.contents.len() > MAX_FILE_CHARS {
            let truncated: String = file.contents.chars().take(MAX_FILE_CHARS).collect();
            format!("{truncated}\n\n... (file truncated)")
        } else {
            file.contents.clone()
        };
        let _ = write!(prompt, "\n### File: {}\n```\n{}\n```\n", file.name, contents);
    }

    prompt.push_str("\n## Instructions\n\n");
    let _ = writeln!(
        prompt,
        "1. Include every one of the {} analyzer issues above in your JSON output, \
keeping its original \"source\" value (\"Semgrep\" or \"Bandit\") and location, \
and enriching the description where you can.",
        analyzer_findings.len()
    );
    prompt.push_str(
        "2. Additionally report vulnerabilities you find yourself (injection, \
broken authentication or authorization, hardcoded secrets, weak cryptography, \
dangerous functions such as eval/exec/pickle, path traversal, missing input \
validation, sensitive data exposure, debug configuration) with \"source\": \
\"ModelAnalysis\".\n",
    );
    prompt.push_str(
        "3. Give an exact filename:line location and the offending code snippet \
for every finding.\n",
    );

    prompt.push_str("\nRespond with pure JSON matching this schema:\n");
    prompt.push_str(RESPONSE_SCHEMA);
    prompt.push('\n');

    prompt
}

fn count_source(findings: &[Finding], source: FindingSource) -> usize {
    findings.iter().filter(|f| f.source == source).count()
}
