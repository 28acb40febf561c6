//! Stage Trait: contract shared by every pipeline stage
use crate::error::CatalystError;
use crate::state::PipelineState;

/// One step of the pipeline.
///
/// A stage reads the fields written by its predecessors and writes its
/// own. Returning `Err` is a stage-fault: the runner records it in the
/// state's error slot and routes to the error handler. A stage may also
/// call [`PipelineState::fail`] directly; the effect is the same.
pub trait Stage: Send + Sync {
    /// Stable stage id (ex: "extract_compositions")
    fn id(&self) -> &'static str;

    /// Execute the stage against the run state
    fn run(&self, state: &mut PipelineState) -> Result<(), StageError>;
}

/// Terminal stage reached when the error slot is set.
pub trait ErrorHandler: Send + Sync {
    fn id(&self) -> &'static str {
        "error_handler"
    }

    /// Record the failure. An `Err` here is logged; the run still ends
    /// at the error terminal.
    fn handle(&self, state: &PipelineState) -> Result<(), StageError>;
}

#[derive(Debug, Clone)]
pub enum StageError {
    /// A field the stage depends on was never populated
    MissingInput(String),
    /// A collaborator (file, template engine, model) failed
    Collaborator(String),
    ExecutionFailed(String),
    /// The stage panicked; the payload message if there was one
    Panicked(String),
}

impl std::fmt::Display for StageError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::MissingInput(field) => write!(f, "STAGE/MISSING: {} not populated", field),
            Self::Collaborator(msg) => write!(f, "STAGE/COLLABORATOR: {}", msg),
            Self::ExecutionFailed(msg) => write!(f, "STAGE/EXEC: {}", msg),
            Self::Panicked(msg) => write!(f, "STAGE/PANIC: {}", msg),
        }
    }
}

impl std::error::Error for StageError {}

impl From<CatalystError> for StageError {
    fn from(e: CatalystError) -> Self {
        StageError::Collaborator(e.to_string())
    }
}
