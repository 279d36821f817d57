//! Run orchestration: the engine that drives analyzers, batched model
//! calls, and the merge barrier for one analysis run.

pub mod engine;

pub use engine::{AnalysisEngine, EngineConfig, RunError};
