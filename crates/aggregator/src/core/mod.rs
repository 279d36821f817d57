//! Core data model for the aggregation pipeline
//!
//! The canonical `Finding` record is the shape every source normalizes
//! into; `AnalysisSummary` is derived from a finding sequence and never
//! patched in place; `AnalysisReport` is the pure structural combination
//! handed to presentation.

pub mod finding;
pub mod report;
pub mod report_generator;
pub mod severity;
pub mod summary;

pub use finding::{format_location, normalize_cwe, Finding, UNKNOWN_PART};
pub use report::{AnalysisReport, ProjectInfo, ReportMetadata, SourceOutcome};
pub use report_generator::{OutputFormat, ReportGenerator};
pub use severity::{FindingSource, Severity};
pub use summary::{AnalysisSummary, SeverityBreakdown, SourceBreakdown};
