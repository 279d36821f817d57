//! Source adapters: per-source converters from native result schemas into
//! canonical findings.
//!
//! Each adapter is a pure transform over an explicit native record type,
//! never a generic bag of keys. All of them tolerate a missing or empty raw
//! result (empty output, not an error), map their source's severity
//! vocabulary onto the canonical scale through a total table with a Medium
//! default, synthesize `<basename>:<line>` locations with the `N/A`
//! sentinel, and preserve CWE identifiers in `CWE-<digits>` form without
//! ever fabricating one.

pub mod bandit;
pub mod model;
pub mod semgrep;

pub use bandit::{BanditIssue, BanditReport};
pub use model::{ModelReport, ModelSummary, ModelVulnerability};
pub use semgrep::{SemgrepReport, SemgrepResult};
