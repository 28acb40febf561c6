use crate::collaborators::ContextSource;
use catalyst_core::{PipelineState, Stage, StageError};
use std::sync::Arc;
use tracing::info;

pub struct LoadContextStage {
    source: Arc<dyn ContextSource>,
}

impl LoadContextStage {
    pub fn new(source: Arc<dyn ContextSource>) -> Self {
        Self { source }
    }
}

impl Stage for LoadContextStage {
    fn id(&self) -> &'static str {
        "load_context"
    }

    fn run(&self, state: &mut PipelineState) -> Result<(), StageError> {
        let context = self
            .source
            .load_context()
            .map_err(|e| StageError::Collaborator(format!("context load failed: {}", e)))?;
        info!(run_id = %state.run_id, "context loaded");
        state.context = Some(context);
        Ok(())
    }
}
