//! End-to-end runs of the standard pipeline.

use catalyst_core::{
    CatalystError, ErrorRecord, PipelineRunner, PipelineState, ResultEnvelope, SearchSpace, Terminal,
    ToolCallRecord, ToolCallStatus,
};
use catalyst_stages::{
    standard_pipeline, Collaborators, ContextSource, JsonFileSink, ModelClient, ModelReply,
    PipelineConfig, PromptBuilder, ResultSink, SearchSpaceSource,
};
use serde_json::{json, Value};
use std::fs;
use std::sync::{Arc, Mutex};

// =============================================================================
// In-memory collaborators
// =============================================================================

struct StaticContext;

impl ContextSource for StaticContext {
    fn load_context(&self) -> Result<Value, CatalystError> {
        Ok(json!({"reaction": "HER", "target_energy": -0.27}))
    }
}

struct StaticSpace;

impl SearchSpaceSource for StaticSpace {
    fn load_candidates(&self) -> Result<Vec<Value>, CatalystError> {
        Ok(vec![json!({"Pt": 0.5, "Ru": 0.5}), json!({"Ni": 1.0})])
    }
}

struct PlainPrompt;

impl PromptBuilder for PlainPrompt {
    fn build_prompt(&self, context: &Value, space: &SearchSpace) -> Result<String, CatalystError> {
        Ok(format!("{} | {}", context["reaction"], space.description))
    }
}

struct CannedModel(ModelReply);

impl ModelClient for CannedModel {
    fn ask(&self, _prompt: &str) -> Result<ModelReply, CatalystError> {
        Ok(self.0.clone())
    }
}

struct UnreachableModel;

impl ModelClient for UnreachableModel {
    fn ask(&self, _prompt: &str) -> Result<ModelReply, CatalystError> {
        Err(CatalystError::ModelError("connection refused".to_string()))
    }
}

#[derive(Default)]
struct MemorySink {
    results: Mutex<Vec<ResultEnvelope>>,
    errors: Mutex<Vec<ErrorRecord>>,
}

impl ResultSink for MemorySink {
    fn save_result(&self, envelope: &ResultEnvelope) -> Result<(), CatalystError> {
        self.results.lock().unwrap().push(envelope.clone());
        Ok(())
    }

    fn save_error(&self, record: &ErrorRecord) -> Result<(), CatalystError> {
        self.errors.lock().unwrap().push(record.clone());
        Ok(())
    }
}

/// Sink whose storage is gone
struct BrokenSink;

impl ResultSink for BrokenSink {
    fn save_result(&self, _envelope: &ResultEnvelope) -> Result<(), CatalystError> {
        Err(CatalystError::IoError("results: read-only file system".to_string()))
    }

    fn save_error(&self, _record: &ErrorRecord) -> Result<(), CatalystError> {
        Err(CatalystError::IoError("results: read-only file system".to_string()))
    }
}

fn collaborators(model: Arc<dyn ModelClient>, sink: Arc<MemorySink>) -> Collaborators {
    Collaborators {
        context: Arc::new(StaticContext),
        search_space: Arc::new(StaticSpace),
        prompt: Arc::new(PlainPrompt),
        model,
        sink,
    }
}

const REPLY: &str = "**ANALYSIS:**
Pt-Ru sits close to the HER optimum.

**RECOMMENDATIONS:**
1. Pt-Ru
2. Ni-Cu

**COMPOSITIONS:**
composition_1 = {\"Pt\": 0.5, \"Ru\": 0.5}
composition_2 = {\"Ni\": 0.6, \"Cu\": 0.4}
";

fn tool_call(status: ToolCallStatus) -> ToolCallRecord {
    ToolCallRecord {
        function_name: "get_adsorp_energy".to_string(),
        arguments: json!({"composition": {"Pt": 0.5, "Ru": 0.5}}),
        status,
        result: Some(json!({"energy": -0.31})),
        timestamp: None,
    }
}

// =============================================================================
// Scenarios
// =============================================================================

#[test]
fn test_successful_run_saves_envelope() {
    let sink = Arc::new(MemorySink::default());
    let reply = ModelReply {
        text: REPLY.to_string(),
        tool_calls: vec![tool_call(ToolCallStatus::Success), tool_call(ToolCallStatus::NotFound)],
    };
    let runner = standard_pipeline(collaborators(Arc::new(CannedModel(reply)), sink.clone()), 50);

    let outcome = runner.run(PipelineState::new());
    assert_eq!(outcome.terminal, Terminal::End);

    let state = &outcome.state;
    assert!(state.error().is_none());
    assert_eq!(state.prompt.as_deref(), Some("\"HER\" | 2 candidate compositions"));
    assert_eq!(state.compositions.len(), 2);

    let envelope = state.result.as_ref().unwrap();
    assert_eq!(envelope.composition_count, 2);
    assert_eq!(envelope.tool_usage.total_calls, 2);
    assert_eq!(envelope.tool_usage.successful_calls, 2);
    assert!(envelope.output_digest.starts_with("blake3:"));
    assert_eq!(envelope.stages.len(), 8);

    let validation = envelope.validation.as_ref().unwrap();
    assert!(validation.analysis_extracted);
    assert!(validation.recommendations_extracted);
    assert!(validation.tools_used);
    assert!(validation.multiple_compositions);

    assert_eq!(sink.results.lock().unwrap().len(), 1);
    assert!(sink.errors.lock().unwrap().is_empty());
    assert_eq!(state.trace.len(), 9);
}

#[test]
fn test_model_fault_routes_to_error_end() {
    let sink = Arc::new(MemorySink::default());
    let runner = standard_pipeline(collaborators(Arc::new(UnreachableModel), sink.clone()), 50);

    let outcome = runner.run(PipelineState::new());
    assert_eq!(outcome.terminal, Terminal::ErrorEnd);
    assert!(outcome.state.result.is_none());
    assert!(outcome.state.llm_output.is_none());
    assert_eq!(outcome.state.failed_stage(), Some("invoke_model"));

    assert!(sink.results.lock().unwrap().is_empty());
    let errors = sink.errors.lock().unwrap();
    assert_eq!(errors.len(), 1);
    let record = &errors[0];
    assert!(record.error.contains("model invocation failed"));
    assert!(record.error.contains("connection refused"));
    assert!(record.state_summary.has_context);
    assert!(record.state_summary.has_search_space);
    assert!(record.state_summary.has_prompt);
    assert!(!record.state_summary.has_llm_output);

    let ids: Vec<_> = outcome.state.trace.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(
        ids,
        ["load_context", "prepare_search_space", "generate_prompt", "invoke_model", "error_handler"]
    );
    assert!(!outcome.error_handler_failed());
}

#[test]
fn test_unsaved_error_record_is_visible_in_outcome() {
    let mut wiring = collaborators(Arc::new(UnreachableModel), Arc::new(MemorySink::default()));
    wiring.sink = Arc::new(BrokenSink);
    let outcome = standard_pipeline(wiring, 50).run(PipelineState::new());

    assert_eq!(outcome.terminal, Terminal::ErrorEnd);
    assert_eq!(outcome.state.failed_stage(), Some("invoke_model"));
    assert!(outcome.error_handler_failed());
}

#[test]
fn test_zero_compositions_is_still_success() {
    let sink = Arc::new(MemorySink::default());
    let reply = ModelReply::from_text("I would need adsorption data before recommending anything.");
    let runner = standard_pipeline(collaborators(Arc::new(CannedModel(reply)), sink.clone()), 50);

    let outcome = runner.run(PipelineState::new());
    assert!(outcome.is_success());
    assert!(outcome.state.error().is_none());

    let envelope = outcome.state.result.as_ref().unwrap();
    assert_eq!(envelope.composition_count, 0);
    assert!(envelope.extracted_compositions.is_empty());
    assert!(!envelope.validation.as_ref().unwrap().tools_used);
    assert!(sink.errors.lock().unwrap().is_empty());
}

#[test]
fn test_single_composition_reply_is_recovered() {
    let sink = Arc::new(MemorySink::default());
    let reply = ModelReply::from_text("**COMPOSITION:**\ncomposition = {\"Ni\": 0.6, \"Cu\": 0.4}");
    let runner = standard_pipeline(collaborators(Arc::new(CannedModel(reply)), sink), 50);

    let outcome = runner.run(PipelineState::new());
    let comps = &outcome.state.compositions;
    assert_eq!(comps.len(), 1);
    assert_eq!(comps[0].get("Ni"), Some(0.6));
    assert!(!outcome.state.validation.as_ref().unwrap().multiple_compositions);
}

#[tokio::test]
async fn test_batch_of_runs() {
    let sink = Arc::new(MemorySink::default());
    let reply = ModelReply::from_text(REPLY);
    let runner = Arc::new(standard_pipeline(collaborators(Arc::new(CannedModel(reply)), sink.clone()), 50));

    let states = (0..4).map(|i| PipelineState::with_run_id(format!("batch-{}", i))).collect();
    let outcomes = PipelineRunner::run_batch(runner, states).await;

    assert_eq!(outcomes.len(), 4);
    assert!(outcomes.iter().all(|o| o.is_success()));
    assert_eq!(outcomes[3].state.run_id, "batch-3");
    assert_eq!(sink.results.lock().unwrap().len(), 4);
}

// =============================================================================
// File-backed run
// =============================================================================

#[test]
fn test_file_backed_run_writes_latest_result() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    for sub in ["context", "data", "prompts", "replies"] {
        fs::create_dir_all(root.join(sub)).unwrap();
    }
    fs::write(root.join("context/sample_context.json"), r#"{"reaction": "HER"}"#).unwrap();
    let candidates: Vec<Value> = (0..10).map(|i| json!({"Pt": i as f64 / 10.0})).collect();
    fs::write(root.join("data/search_space.json"), Value::Array(candidates).to_string()).unwrap();
    fs::write(root.join("prompts/system.hbs"), "You recommend catalysts.").unwrap();
    fs::write(
        root.join("prompts/user.hbs"),
        "Reaction: {{context.reaction}}\n{{search_space.description}}\n{{format_instructions}}",
    )
    .unwrap();
    fs::write(
        root.join("replies/latest_reply.json"),
        json!({"text": REPLY, "tool_calls": []}).to_string(),
    )
    .unwrap();

    let config = PipelineConfig::from_yaml("search_space_limit: 3\n").unwrap().relative_to(root);
    let runner = standard_pipeline(Collaborators::from_config(&config).unwrap(), config.search_space_limit);
    let outcome = runner.run(PipelineState::new());
    assert_eq!(outcome.terminal, Terminal::End);
    assert_eq!(outcome.state.search_space.as_ref().unwrap().count, 3);

    let prompt = outcome.state.prompt.as_deref().unwrap();
    assert!(prompt.starts_with("You recommend catalysts.\n\n---\n\nReaction: HER\n3 candidate compositions"));

    let sink = JsonFileSink::new(&config.results_dir);
    let saved: ResultEnvelope = serde_json::from_str(&fs::read_to_string(sink.result_path()).unwrap()).unwrap();
    assert_eq!(saved.composition_count, 2);
    assert_eq!(saved.run_id, outcome.state.run_id);
    assert!(!sink.error_path().exists());
}

#[test]
fn test_file_backed_run_writes_error_log() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    fs::create_dir_all(root.join("prompts")).unwrap();
    fs::write(root.join("prompts/system.hbs"), "sys").unwrap();
    fs::write(root.join("prompts/user.hbs"), "user").unwrap();

    // no context file: the first stage faults
    let config = PipelineConfig::default().relative_to(root);
    let runner = standard_pipeline(Collaborators::from_config(&config).unwrap(), 50);
    let outcome = runner.run(PipelineState::new());
    assert_eq!(outcome.terminal, Terminal::ErrorEnd);

    let sink = JsonFileSink::new(&config.results_dir);
    let record: ErrorRecord = serde_json::from_str(&fs::read_to_string(sink.error_path()).unwrap()).unwrap();
    assert_eq!(record.failed_stage.as_deref(), Some("load_context"));
    assert!(record.error.starts_with("STAGE/COLLABORATOR: context load failed: IO/"));
    assert!(!record.state_summary.has_context);
    assert!(!sink.result_path().exists());
}
