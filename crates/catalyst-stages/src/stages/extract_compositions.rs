use catalyst_core::{PipelineState, Stage, StageError};
use catalyst_parse::{extract_many, extract_single};
use tracing::{info, warn};

/// Indexed compositions from the reply, or a single composition when the
/// reply has none. An empty result is recorded, not raised.
#[derive(Default)]
pub struct ExtractCompositionsStage;

impl Stage for ExtractCompositionsStage {
    fn id(&self) -> &'static str {
        "extract_compositions"
    }

    fn run(&self, state: &mut PipelineState) -> Result<(), StageError> {
        let reply = state.require_llm_output()?;
        let mut compositions = extract_many(reply);

        if compositions.is_empty() {
            info!(run_id = %state.run_id, "no indexed compositions, trying single extraction");
            compositions.extend(extract_single(reply));
        }

        if compositions.is_empty() {
            warn!(run_id = %state.run_id, "no compositions recovered from reply");
        } else {
            for (i, composition) in compositions.iter().enumerate() {
                info!(run_id = %state.run_id, index = i + 1, composition = %composition, "composition extracted");
            }
        }

        state.compositions = compositions;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_on(reply: &str) -> PipelineState {
        let mut state = PipelineState::new();
        state.llm_output = Some(reply.to_string());
        ExtractCompositionsStage.run(&mut state).unwrap();
        state
    }

    #[test]
    fn test_indexed_compositions() {
        let state = run_on("composition_1 = {\"Ni\": 1.0}\ncomposition_2 = {\"Cu\": 1.0}");
        assert_eq!(state.compositions.len(), 2);
    }

    #[test]
    fn test_falls_back_to_single_extraction() {
        let state = run_on("```python\ncomposition = {\"Pt\": 0.5, \"Ru\": 0.5}\n```");
        assert_eq!(state.compositions.len(), 1);
        assert_eq!(state.compositions[0].get("Ru"), Some(0.5));
    }

    #[test]
    fn test_nothing_found_is_not_a_fault() {
        let state = run_on("I need more data before recommending anything.");
        assert!(state.compositions.is_empty());
        assert!(!state.has_failed());
    }

    #[test]
    fn test_missing_reply_is_a_fault() {
        let mut state = PipelineState::new();
        let err = ExtractCompositionsStage.run(&mut state).unwrap_err();
        assert_eq!(err.to_string(), "STAGE/MISSING: llm_output not populated");
    }
}
