//! The nine pipeline stages and the error handler, in run order.

mod error_handler;
mod extract_analysis;
mod extract_compositions;
mod generate_prompt;
mod invoke_model;
mod load_context;
mod prepare_search_space;
mod save_results;
mod summarize_tool_usage;
mod validate_results;

pub use error_handler::ErrorHandlerStage;
pub use extract_analysis::ExtractAnalysisStage;
pub use extract_compositions::ExtractCompositionsStage;
pub use generate_prompt::GeneratePromptStage;
pub use invoke_model::InvokeModelStage;
pub use load_context::LoadContextStage;
pub use prepare_search_space::PrepareSearchSpaceStage;
pub use save_results::SaveResultsStage;
pub use summarize_tool_usage::SummarizeToolUsageStage;
pub use validate_results::ValidateResultsStage;
