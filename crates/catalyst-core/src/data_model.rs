//! Data Model: AnalysisResult, SearchSpace, tool usage, result and error envelopes
use crate::composition::Composition;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Narrative sections and compositions recovered from one model reply
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Text of the ANALYSIS section
    pub analysis: Option<String>,
    /// Text of the RECOMMENDATION(S) section
    pub recommendations: Option<String>,
    /// Compositions in recovery order
    pub compositions: Vec<Composition>,
}

/// Candidate compositions offered to the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchSpace {
    pub count: usize,
    pub compositions: Vec<Value>,
    pub description: String,
}

impl SearchSpace {
    pub fn new(compositions: Vec<Value>) -> Self {
        let count = compositions.len();
        Self {
            count,
            compositions,
            description: format!("{} candidate compositions", count),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolCallStatus {
    Success,
    /// The lookup ran but had no entry for the composition
    NotFound,
    Failed,
}

/// One external tool invocation made while the model produced its reply
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallRecord {
    pub function_name: String,
    #[serde(default)]
    pub arguments: Value,
    pub status: ToolCallStatus,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

/// Tool usage counts for one run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolUsageSummary {
    pub total_calls: usize,
    pub functions_used: BTreeMap<String, usize>,
    /// Calls with status success or not_found
    pub successful_calls: usize,
    pub failed_calls: usize,
}

impl ToolUsageSummary {
    pub fn from_calls(calls: &[ToolCallRecord]) -> Self {
        let mut summary = ToolUsageSummary {
            total_calls: calls.len(),
            ..Default::default()
        };
        for call in calls {
            *summary
                .functions_used
                .entry(call.function_name.clone())
                .or_insert(0) += 1;
            match call.status {
                ToolCallStatus::Success | ToolCallStatus::NotFound => summary.successful_calls += 1,
                ToolCallStatus::Failed => summary.failed_calls += 1,
            }
        }
        summary
    }

    pub fn tools_used(&self) -> bool {
        self.total_calls > 0
    }
}

/// Checks recorded by the validate-results stage.
///
/// `analysis_extracted` and `recommendations_extracted` mean the labeled
/// section was present, even if its body was blank.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationSummary {
    pub compositions_extracted: usize,
    pub analysis_extracted: bool,
    pub recommendations_extracted: bool,
    pub tools_used: bool,
    pub multiple_compositions: bool,
}

/// Per-stage entry of the run trace
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageRecord {
    pub id: String,
    pub in_hash: String,
    pub out_hash: String,
    pub latency_ms: u64,
    pub faulted: bool,
}

/// Persisted output of a successful run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultEnvelope {
    pub run_id: String,
    pub prompt: String,
    pub llm_output: String,
    /// `blake3:<hex>` digest of `llm_output`
    pub output_digest: String,
    pub extracted_compositions: Vec<Composition>,
    pub extracted_analysis: AnalysisResult,
    pub tool_usage: ToolUsageSummary,
    pub tool_calls: Vec<ToolCallRecord>,
    pub validation: Option<ValidationSummary>,
    pub stages: Vec<StageRecord>,
    pub timestamp: DateTime<Utc>,
    pub composition_count: usize,
}

/// Which state fields had been populated when a run failed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateSnapshot {
    pub has_context: bool,
    pub has_search_space: bool,
    pub has_prompt: bool,
    pub has_llm_output: bool,
}

/// Persisted output of a failed run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorRecord {
    pub run_id: String,
    pub error: String,
    pub failed_stage: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub state_summary: StateSnapshot,
}
