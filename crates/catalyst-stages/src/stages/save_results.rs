use crate::collaborators::ResultSink;
use catalyst_core::{PipelineState, ResultEnvelope, Stage, StageError};
use chrono::Utc;
use std::sync::Arc;
use tracing::info;

/// Builds the result envelope and hands it to the sink
pub struct SaveResultsStage {
    sink: Arc<dyn ResultSink>,
}

impl SaveResultsStage {
    pub fn new(sink: Arc<dyn ResultSink>) -> Self {
        Self { sink }
    }
}

impl Stage for SaveResultsStage {
    fn id(&self) -> &'static str {
        "save_results"
    }

    fn run(&self, state: &mut PipelineState) -> Result<(), StageError> {
        let timestamp = Utc::now();
        let prompt = state.require_prompt()?.to_string();
        let llm_output = state.require_llm_output()?.to_string();

        let envelope = ResultEnvelope {
            run_id: state.run_id.clone(),
            output_digest: format!("blake3:{}", blake3::hash(llm_output.as_bytes())),
            prompt,
            llm_output,
            extracted_compositions: state.compositions.clone(),
            extracted_analysis: state.analysis.clone().unwrap_or_default(),
            tool_usage: state.tool_usage.clone().unwrap_or_default(),
            tool_calls: state.tool_calls.clone(),
            validation: state.validation.clone(),
            stages: state.trace.clone(),
            timestamp,
            composition_count: state.compositions.len(),
        };

        self.sink
            .save_result(&envelope)
            .map_err(|e| StageError::Collaborator(format!("result save failed: {}", e)))?;
        info!(run_id = %state.run_id, compositions = envelope.composition_count, "results saved");

        state.timestamp = Some(timestamp);
        state.result = Some(envelope);
        Ok(())
    }
}
