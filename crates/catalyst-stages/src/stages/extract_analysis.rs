use catalyst_core::{PipelineState, Stage, StageError};
use catalyst_parse::extract_analysis;
use tracing::info;

/// Analysis and recommendation sections. When the dedicated extraction
/// found nothing, the compositions found here replace the empty list.
#[derive(Default)]
pub struct ExtractAnalysisStage;

impl Stage for ExtractAnalysisStage {
    fn id(&self) -> &'static str {
        "extract_analysis"
    }

    fn run(&self, state: &mut PipelineState) -> Result<(), StageError> {
        let analysis = extract_analysis(state.require_llm_output()?);
        info!(
            run_id = %state.run_id,
            analysis = analysis.analysis.is_some(),
            recommendations = analysis.recommendations.is_some(),
            compositions = analysis.compositions.len(),
            "analysis extracted"
        );

        if state.compositions.is_empty() && !analysis.compositions.is_empty() {
            info!(run_id = %state.run_id, "using compositions found by the analysis pass");
            state.compositions = analysis.compositions.clone();
        }
        state.analysis = Some(analysis);
        Ok(())
    }
}
