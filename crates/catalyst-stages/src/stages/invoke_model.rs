use crate::collaborators::ModelClient;
use catalyst_core::{PipelineState, Stage, StageError};
use std::sync::Arc;
use tracing::{debug, info};

/// Sends the prompt to the model and stores the reply and its tool calls
pub struct InvokeModelStage {
    model: Arc<dyn ModelClient>,
}

impl InvokeModelStage {
    pub fn new(model: Arc<dyn ModelClient>) -> Self {
        Self { model }
    }
}

impl Stage for InvokeModelStage {
    fn id(&self) -> &'static str {
        "invoke_model"
    }

    fn run(&self, state: &mut PipelineState) -> Result<(), StageError> {
        let reply = self
            .model
            .ask(state.require_prompt()?)
            .map_err(|e| StageError::Collaborator(format!("model invocation failed: {}", e)))?;

        info!(
            run_id = %state.run_id,
            chars = reply.text.len(),
            tool_calls = reply.tool_calls.len(),
            "model replied"
        );
        debug!(reply = %reply.text);

        state.llm_output = Some(reply.text);
        state.tool_calls = reply.tool_calls;
        Ok(())
    }
}
