use crate::collaborators::SearchSpaceSource;
use catalyst_core::{PipelineState, SearchSpace, Stage, StageError};
use std::sync::Arc;
use tracing::info;

/// Loads candidate compositions and keeps the first `limit`
pub struct PrepareSearchSpaceStage {
    source: Arc<dyn SearchSpaceSource>,
    limit: usize,
}

impl PrepareSearchSpaceStage {
    pub fn new(source: Arc<dyn SearchSpaceSource>, limit: usize) -> Self {
        Self { source, limit }
    }
}

impl Stage for PrepareSearchSpaceStage {
    fn id(&self) -> &'static str {
        "prepare_search_space"
    }

    fn run(&self, state: &mut PipelineState) -> Result<(), StageError> {
        let mut candidates = self
            .source
            .load_candidates()
            .map_err(|e| StageError::Collaborator(format!("search space preparation failed: {}", e)))?;
        let available = candidates.len();
        candidates.truncate(self.limit);

        let space = SearchSpace::new(candidates);
        info!(run_id = %state.run_id, count = space.count, available, "search space prepared");
        state.search_space = Some(space);
        Ok(())
    }
}
