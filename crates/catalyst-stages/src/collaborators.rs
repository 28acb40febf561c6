//! External collaborators the stages call out to, plus the file-backed
//! implementations the binary wires in.

use catalyst_core::{CatalystError, ErrorRecord, ResultEnvelope, SearchSpace, ToolCallRecord};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

// ============================================================================
// Traits
// ============================================================================

/// Supplies the opaque context document
pub trait ContextSource: Send + Sync {
    fn load_context(&self) -> Result<Value, CatalystError>;
}

/// Supplies every candidate composition; the stage applies the limit
pub trait SearchSpaceSource: Send + Sync {
    fn load_candidates(&self) -> Result<Vec<Value>, CatalystError>;
}

pub trait PromptBuilder: Send + Sync {
    fn build_prompt(&self, context: &Value, search_space: &SearchSpace) -> Result<String, CatalystError>;
}

/// Language model endpoint
pub trait ModelClient: Send + Sync {
    fn ask(&self, prompt: &str) -> Result<ModelReply, CatalystError>;
}

/// Durable storage for run outcomes
pub trait ResultSink: Send + Sync {
    fn save_result(&self, envelope: &ResultEnvelope) -> Result<(), CatalystError>;
    fn save_error(&self, record: &ErrorRecord) -> Result<(), CatalystError>;
}

/// Reply text plus the tool calls made while producing it
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelReply {
    pub text: String,
    #[serde(default)]
    pub tool_calls: Vec<ToolCallRecord>,
}

impl ModelReply {
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            tool_calls: Vec::new(),
        }
    }
}

fn read(path: &Path) -> Result<String, CatalystError> {
    fs::read_to_string(path).map_err(|e| CatalystError::IoError(format!("{}: {}", path.display(), e)))
}

fn parse_json(path: &Path, content: &str) -> Result<Value, CatalystError> {
    serde_json::from_str(content)
        .map_err(|e| CatalystError::SerializeError(format!("{}: {}", path.display(), e)))
}

// ============================================================================
// File-backed implementations
// ============================================================================

pub struct JsonFileContext {
    path: PathBuf,
}

impl JsonFileContext {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ContextSource for JsonFileContext {
    fn load_context(&self) -> Result<Value, CatalystError> {
        let content = read(&self.path)?;
        parse_json(&self.path, &content)
    }
}

/// Candidates stored as a JSON array
pub struct JsonFileSearchSpace {
    path: PathBuf,
}

impl JsonFileSearchSpace {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SearchSpaceSource for JsonFileSearchSpace {
    fn load_candidates(&self) -> Result<Vec<Value>, CatalystError> {
        let content = read(&self.path)?;
        match parse_json(&self.path, &content)? {
            Value::Array(items) => Ok(items),
            other => Err(CatalystError::SerializeError(format!(
                "{}: expected a JSON array of candidates, found {}",
                self.path.display(),
                json_kind(&other)
            ))),
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Replays a recorded reply from disk.
///
/// The file is either a JSON object `{"text": ..., "tool_calls": [...]}`
/// or the raw reply text.
pub struct ReplayModel {
    path: PathBuf,
}

impl ReplayModel {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ModelClient for ReplayModel {
    fn ask(&self, prompt: &str) -> Result<ModelReply, CatalystError> {
        debug!(prompt_len = prompt.len(), path = %self.path.display(), "replaying model reply");
        let content = read(&self.path).map_err(|e| CatalystError::ModelError(e.to_string()))?;
        if content.trim_start().starts_with('{') {
            if let Ok(reply) = serde_json::from_str::<ModelReply>(&content) {
                return Ok(reply);
            }
        }
        Ok(ModelReply::from_text(content))
    }
}

/// Writes `latest_result.json` and `error_log.json` into one directory
pub struct JsonFileSink {
    dir: PathBuf,
}

impl JsonFileSink {
    pub const RESULT_FILE: &'static str = "latest_result.json";
    pub const ERROR_FILE: &'static str = "error_log.json";

    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn result_path(&self) -> PathBuf {
        self.dir.join(Self::RESULT_FILE)
    }

    pub fn error_path(&self) -> PathBuf {
        self.dir.join(Self::ERROR_FILE)
    }

    /// Write through a per-run temp file and rename it into place, so
    /// concurrent runs sharing one sink never leave a torn file.
    fn write<T: Serialize>(&self, file: &str, run_id: &str, value: &T) -> Result<(), CatalystError> {
        let io_err = |path: &Path, e: std::io::Error| CatalystError::IoError(format!("{}: {}", path.display(), e));

        fs::create_dir_all(&self.dir).map_err(|e| io_err(&self.dir, e))?;
        let json = serde_json::to_string_pretty(value)?;

        let path = self.dir.join(file);
        let tmp = self.dir.join(format!(".{}.{}.tmp", file, run_id));
        fs::write(&tmp, json).map_err(|e| io_err(&tmp, e))?;
        if let Err(e) = fs::rename(&tmp, &path) {
            let _ = fs::remove_file(&tmp);
            return Err(io_err(&path, e));
        }
        info!(path = %path.display(), run_id, "written");
        Ok(())
    }
}

impl ResultSink for JsonFileSink {
    fn save_result(&self, envelope: &ResultEnvelope) -> Result<(), CatalystError> {
        self.write(Self::RESULT_FILE, &envelope.run_id, envelope)
    }

    fn save_error(&self, record: &ErrorRecord) -> Result<(), CatalystError> {
        self.write(Self::ERROR_FILE, &record.run_id, record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalyst_core::{StateSnapshot, ToolCallStatus};
    use chrono::Utc;
    use serde_json::json;

    #[test]
    fn test_context_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("context.json");
        fs::write(&path, r#"{"reaction": "HER", "history": []}"#).unwrap();

        let context = JsonFileContext::new(&path).load_context().unwrap();
        assert_eq!(context["reaction"], "HER");
    }

    #[test]
    fn test_missing_context_is_io_error() {
        let err = JsonFileContext::new("/nonexistent/context.json").load_context().unwrap_err();
        assert!(matches!(err, CatalystError::IoError(_)));
    }

    #[test]
    fn test_search_space_must_be_array() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("space.json");
        fs::write(&path, r#"{"Pt": 1.0}"#).unwrap();

        let err = JsonFileSearchSpace::new(&path).load_candidates().unwrap_err();
        assert!(err.to_string().contains("found an object"));

        fs::write(&path, r#"[{"Pt": 1.0}, {"Ni": 0.5, "Cu": 0.5}]"#).unwrap();
        assert_eq!(JsonFileSearchSpace::new(&path).load_candidates().unwrap().len(), 2);
    }

    #[test]
    fn test_replay_structured_reply() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reply.json");
        let recorded = json!({
            "text": "composition = {\"Ni\": 1.0}",
            "tool_calls": [{
                "function_name": "get_adsorp_energy",
                "arguments": {"composition": {"Ni": 1.0}},
                "status": "not_found"
            }]
        });
        fs::write(&path, recorded.to_string()).unwrap();

        let reply = ReplayModel::new(&path).ask("prompt").unwrap();
        assert_eq!(reply.text, "composition = {\"Ni\": 1.0}");
        assert_eq!(reply.tool_calls.len(), 1);
        assert_eq!(reply.tool_calls[0].status, ToolCallStatus::NotFound);
    }

    #[test]
    fn test_replay_plain_text_reply() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reply.txt");
        // a bare literal is not a structured reply; it is replayed verbatim
        fs::write(&path, "{\"Ni\": 0.5, \"Cu\": 0.5}").unwrap();

        let reply = ReplayModel::new(&path).ask("prompt").unwrap();
        assert_eq!(reply.text, "{\"Ni\": 0.5, \"Cu\": 0.5}");
        assert!(reply.tool_calls.is_empty());
    }

    #[test]
    fn test_replay_missing_file_is_model_error() {
        let err = ReplayModel::new("/nonexistent/reply.json").ask("prompt").unwrap_err();
        assert!(err.to_string().starts_with("MODEL/"));
    }

    #[test]
    fn test_sink_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let sink = JsonFileSink::new(dir.path().join("nested/results"));
        let record = ErrorRecord {
            run_id: "r1".to_string(),
            error: "STAGE/COLLABORATOR: boom".to_string(),
            failed_stage: Some("invoke_model".to_string()),
            timestamp: Utc::now(),
            state_summary: StateSnapshot::default(),
        };
        sink.save_error(&record).unwrap();

        let saved: ErrorRecord =
            serde_json::from_str(&fs::read_to_string(sink.error_path()).unwrap()).unwrap();
        assert_eq!(saved, record);
        assert!(!sink.result_path().exists());
    }

    #[test]
    fn test_concurrent_saves_leave_one_whole_file() {
        let dir = tempfile::tempdir().unwrap();
        let sink = JsonFileSink::new(dir.path());
        let record = |i: usize| ErrorRecord {
            run_id: format!("run-{}", i),
            error: "STAGE/COLLABORATOR: ".to_string() + &"x".repeat(4096),
            failed_stage: Some("invoke_model".to_string()),
            timestamp: Utc::now(),
            state_summary: StateSnapshot::default(),
        };

        std::thread::scope(|scope| {
            for i in 0..8 {
                let sink = &sink;
                scope.spawn(move || {
                    for _ in 0..10 {
                        sink.save_error(&record(i)).unwrap();
                    }
                });
            }
        });

        let saved: ErrorRecord =
            serde_json::from_str(&fs::read_to_string(sink.error_path()).unwrap()).unwrap();
        assert!(saved.run_id.starts_with("run-"));

        let leftovers: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(leftovers, vec![JsonFileSink::ERROR_FILE.to_string()]);
    }
}
