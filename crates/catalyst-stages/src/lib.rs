//! Catalyst Stages: the standard recommendation pipeline
//!
//! # Pipeline Flow
//!
//! ```text
//! load_context → prepare_search_space → generate_prompt → invoke_model
//!   → extract_compositions → extract_analysis → summarize_tool_usage
//!   → validate_results → save_results → End
//!
//! any stage fault → error_handler → ErrorEnd
//! ```
//!
//! Stages talk to the outside world only through the collaborator traits
//! in [`collaborators`], so tests can swap any of them out.

pub mod collaborators;
pub mod config;
pub mod prompt;
pub mod stages;

pub use collaborators::{
    ContextSource, JsonFileContext, JsonFileSearchSpace, JsonFileSink, ModelClient, ModelReply,
    PromptBuilder, ReplayModel, ResultSink, SearchSpaceSource,
};
pub use config::PipelineConfig;
pub use prompt::TemplatePrompt;
pub use stages::*;

use catalyst_core::{CatalystError, PipelineRunner, Stage};
use std::sync::Arc;

/// Everything the standard pipeline calls out to
#[derive(Clone)]
pub struct Collaborators {
    pub context: Arc<dyn ContextSource>,
    pub search_space: Arc<dyn SearchSpaceSource>,
    pub prompt: Arc<dyn PromptBuilder>,
    pub model: Arc<dyn ModelClient>,
    pub sink: Arc<dyn ResultSink>,
}

impl Collaborators {
    /// File-backed collaborators at the paths named in `config`
    pub fn from_config(config: &PipelineConfig) -> Result<Self, CatalystError> {
        let prompt = TemplatePrompt::from_files(&config.system_template, &config.user_template)?;
        Ok(Self {
            context: Arc::new(JsonFileContext::new(&config.context_path)),
            search_space: Arc::new(JsonFileSearchSpace::new(&config.search_space_path)),
            prompt: Arc::new(prompt),
            model: Arc::new(ReplayModel::new(&config.reply_path)),
            sink: Arc::new(JsonFileSink::new(&config.results_dir)),
        })
    }
}

/// Build the nine-stage pipeline with the error handler wired to the sink
pub fn standard_pipeline(collaborators: Collaborators, search_space_limit: usize) -> PipelineRunner {
    let stages: Vec<Box<dyn Stage>> = vec![
        Box::new(LoadContextStage::new(collaborators.context)),
        Box::new(PrepareSearchSpaceStage::new(collaborators.search_space, search_space_limit)),
        Box::new(GeneratePromptStage::new(collaborators.prompt)),
        Box::new(InvokeModelStage::new(collaborators.model)),
        Box::new(ExtractCompositionsStage),
        Box::new(ExtractAnalysisStage),
        Box::new(SummarizeToolUsageStage),
        Box::new(ValidateResultsStage),
        Box::new(SaveResultsStage::new(Arc::clone(&collaborators.sink))),
    ];
    PipelineRunner::new(stages, Box::new(ErrorHandlerStage::new(collaborators.sink)))
}
