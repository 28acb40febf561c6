use crate::collaborators::PromptBuilder;
use catalyst_core::{PipelineState, Stage, StageError};
use std::sync::Arc;
use tracing::info;

pub struct GeneratePromptStage {
    builder: Arc<dyn PromptBuilder>,
}

impl GeneratePromptStage {
    pub fn new(builder: Arc<dyn PromptBuilder>) -> Self {
        Self { builder }
    }
}

impl Stage for GeneratePromptStage {
    fn id(&self) -> &'static str {
        "generate_prompt"
    }

    fn run(&self, state: &mut PipelineState) -> Result<(), StageError> {
        let prompt = self
            .builder
            .build_prompt(state.require_context()?, state.require_search_space()?)
            .map_err(|e| StageError::Collaborator(format!("prompt generation failed: {}", e)))?;
        info!(run_id = %state.run_id, chars = prompt.len(), "prompt generated");
        state.prompt = Some(prompt);
        Ok(())
    }
}
