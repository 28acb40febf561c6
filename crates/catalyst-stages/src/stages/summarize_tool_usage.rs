use catalyst_core::{PipelineState, Stage, StageError, ToolUsageSummary};
use tracing::{info, warn};

#[derive(Default)]
pub struct SummarizeToolUsageStage;

impl Stage for SummarizeToolUsageStage {
    fn id(&self) -> &'static str {
        "summarize_tool_usage"
    }

    fn run(&self, state: &mut PipelineState) -> Result<(), StageError> {
        let summary = ToolUsageSummary::from_calls(&state.tool_calls);

        if summary.tools_used() {
            info!(
                run_id = %state.run_id,
                total = summary.total_calls,
                successful = summary.successful_calls,
                failed = summary.failed_calls,
                "tool usage"
            );
            for (function, count) in &summary.functions_used {
                info!(run_id = %state.run_id, function = %function, count, "tool called");
            }
        } else {
            warn!(run_id = %state.run_id, "model made no tool calls");
        }

        state.tool_usage = Some(summary);
        Ok(())
    }
}
