use crate::collaborators::ResultSink;
use catalyst_core::{ErrorHandler, ErrorRecord, PipelineState, StageError};
use chrono::Utc;
use std::sync::Arc;
use tracing::{error, info};

/// Persists an error record describing the failed run
pub struct ErrorHandlerStage {
    sink: Arc<dyn ResultSink>,
}

impl ErrorHandlerStage {
    pub fn new(sink: Arc<dyn ResultSink>) -> Self {
        Self { sink }
    }
}

impl ErrorHandler for ErrorHandlerStage {
    fn handle(&self, state: &PipelineState) -> Result<(), StageError> {
        let record = ErrorRecord {
            run_id: state.run_id.clone(),
            error: state.error().unwrap_or("unknown error").to_string(),
            failed_stage: state.failed_stage().map(str::to_string),
            timestamp: Utc::now(),
            state_summary: state.snapshot(),
        };

        match self.sink.save_error(&record) {
            Ok(()) => {
                info!(run_id = %state.run_id, "error record saved");
                Ok(())
            }
            Err(e) => {
                error!(run_id = %state.run_id, error = %e, "error record could not be saved");
                Err(StageError::Collaborator(e.to_string()))
            }
        }
    }
}
