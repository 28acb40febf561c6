//! Catalyst Core: composition model, validator, pipeline state and runner
//!
//! A run threads one [`PipelineState`] through a fixed chain of [`Stage`]s.
//! After every stage the runner checks the state's error slot and either
//! continues or jumps to the [`ErrorHandler`]; every run ends at exactly one
//! [`Terminal`].

pub mod composition;
pub mod data_model;
pub mod error;
pub mod runner;
pub mod stage;
pub mod state;

pub use composition::{validate, Composition, RawMapping, RawValue, Rejection, SUM_TOLERANCE};
pub use data_model::{
    AnalysisResult, ErrorRecord, ResultEnvelope, SearchSpace, StageRecord, StateSnapshot,
    ToolCallRecord, ToolCallStatus, ToolUsageSummary, ValidationSummary,
};
pub use error::CatalystError;
pub use runner::{route, PipelineRunner, Route, RunOutcome, Terminal};
pub use stage::{ErrorHandler, Stage, StageError};
pub use state::PipelineState;

/// Engine version
pub const CATALYST_VERSION: &str = env!("CARGO_PKG_VERSION");
