//! Kasane - Finding Normalization & Merge Engine
//!
//! This crate aggregates security findings from heterogeneous sources,
//! pattern-based static analyzers and a free-text-producing language model,
//! into one consistent, deduplicated report. Each source's native result
//! schema is normalized into a canonical finding record, large inputs are
//! split into payload-bounded batches, structured data is recovered from
//! free-text model responses, and everything is merged behind a
//! single-threaded barrier that deduplicates on exact location.

pub mod adapters;
pub mod batch;
pub mod core;
pub mod discovery;
pub mod extract;
pub mod llm;
pub mod merge;
pub mod runner;
pub mod tools;

pub use crate::core::{
    AnalysisReport, AnalysisSummary, Finding, FindingSource, OutputFormat, ReportGenerator,
    Severity, SourceOutcome,
};

pub use batch::{BatchPlan, BatchPlanner};
pub use discovery::{collect_files, DiscoveryConfig, SourceFile};
pub use extract::{extract_response, Extraction};
pub use merge::{merge, merge_with_stats, FindingSet, MergeStats, SetOrigin};
pub use runner::{AnalysisEngine, EngineConfig, RunError};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
