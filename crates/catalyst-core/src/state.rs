//! Pipeline State: the record threaded through every stage of one run
use crate::composition::Composition;
use crate::data_model::{
    AnalysisResult, ResultEnvelope, SearchSpace, StageRecord, StateSnapshot, ToolCallRecord,
    ToolUsageSummary, ValidationSummary,
};
use crate::stage::StageError;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

/// Mutable state for a single pipeline run.
///
/// Created empty per run and owned by the runner. Stages borrow it
/// mutably for the duration of their call. The error slot is write-once:
/// after [`PipelineState::fail`] succeeds it is never cleared.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineState {
    pub run_id: String,
    pub context: Option<Value>,
    pub search_space: Option<SearchSpace>,
    pub prompt: Option<String>,
    pub llm_output: Option<String>,
    pub tool_calls: Vec<ToolCallRecord>,
    pub compositions: Vec<Composition>,
    pub analysis: Option<AnalysisResult>,
    pub tool_usage: Option<ToolUsageSummary>,
    pub validation: Option<ValidationSummary>,
    pub result: Option<ResultEnvelope>,
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(skip)]
    pub trace: Vec<StageRecord>,
    error: Option<String>,
    failed_stage: Option<String>,
}

impl PipelineState {
    pub fn new() -> Self {
        Self::with_run_id(uuid::Uuid::new_v4().to_string())
    }

    pub fn with_run_id(run_id: impl Into<String>) -> Self {
        Self {
            run_id: run_id.into(),
            context: None,
            search_space: None,
            prompt: None,
            llm_output: None,
            tool_calls: Vec::new(),
            compositions: Vec::new(),
            analysis: None,
            tool_usage: None,
            validation: None,
            result: None,
            timestamp: None,
            trace: Vec::new(),
            error: None,
            failed_stage: None,
        }
    }

    /// Current error, if the run has faulted
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Id of the stage that set the error slot
    pub fn failed_stage(&self) -> Option<&str> {
        self.failed_stage.as_deref()
    }

    pub fn has_failed(&self) -> bool {
        self.error.is_some()
    }

    /// Set the error slot. The first error wins; later calls are ignored.
    pub fn fail(&mut self, stage_id: &str, message: impl Into<String>) {
        if self.error.is_none() {
            self.error = Some(message.into());
            self.failed_stage = Some(stage_id.to_string());
        }
    }

    /// Which fields had been populated, for the error record
    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            has_context: self.context.is_some(),
            has_search_space: self.search_space.is_some(),
            has_prompt: self.prompt.is_some(),
            has_llm_output: self.llm_output.is_some(),
        }
    }

    pub fn require_context(&self) -> Result<&Value, StageError> {
        self.context
            .as_ref()
            .ok_or_else(|| StageError::MissingInput("context".to_string()))
    }

    pub fn require_search_space(&self) -> Result<&SearchSpace, StageError> {
        self.search_space
            .as_ref()
            .ok_or_else(|| StageError::MissingInput("search_space".to_string()))
    }

    pub fn require_prompt(&self) -> Result<&str, StageError> {
        self.prompt
            .as_deref()
            .ok_or_else(|| StageError::MissingInput("prompt".to_string()))
    }

    pub fn require_llm_output(&self) -> Result<&str, StageError> {
        self.llm_output
            .as_deref()
            .ok_or_else(|| StageError::MissingInput("llm_output".to_string()))
    }
}

impl Default for PipelineState {
    fn default() -> Self {
        Self::new()
    }
}
