use catalyst_core::{PipelineState, Stage, StageError, ValidationSummary};
use tracing::info;

/// Records what the run recovered; never faults on an empty result
#[derive(Default)]
pub struct ValidateResultsStage;

impl Stage for ValidateResultsStage {
    fn id(&self) -> &'static str {
        "validate_results"
    }

    fn run(&self, state: &mut PipelineState) -> Result<(), StageError> {
        let analysis = state.analysis.as_ref();
        let summary = ValidationSummary {
            compositions_extracted: state.compositions.len(),
            analysis_extracted: analysis.map_or(false, |a| a.analysis.is_some()),
            recommendations_extracted: analysis.map_or(false, |a| a.recommendations.is_some()),
            tools_used: state.tool_usage.as_ref().map_or(false, |t| t.tools_used()),
            multiple_compositions: state.compositions.len() > 1,
        };

        info!(
            run_id = %state.run_id,
            compositions = summary.compositions_extracted,
            analysis = summary.analysis_extracted,
            recommendations = summary.recommendations_extracted,
            tools = summary.tools_used,
            "results validated"
        );
        state.validation = Some(summary);
        Ok(())
    }
}
