//! Pipeline Runner: runs stages in order, routing to the error handler on
//! the first fault
//!
//! ```text
//! stage₁ → stage₂ → … → stageₙ → End
//!    ↘        ↘            ↘
//!          error_handler → ErrorEnd
//! ```
use crate::data_model::StageRecord;
use crate::stage::{ErrorHandler, Stage, StageError};
use crate::state::PipelineState;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};

/// Where a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Terminal {
    /// Every stage ran without a fault
    End,
    /// A stage faulted and the error handler ran
    ErrorEnd,
}

/// Where to go after a stage returns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Continue,
    ErrorHandler,
}

/// Final state of one run and the terminal it reached
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub terminal: Terminal,
    pub state: PipelineState,
}

impl RunOutcome {
    pub fn is_success(&self) -> bool {
        self.terminal == Terminal::End
    }

    /// True when the run reached `ErrorEnd` and the error handler itself
    /// faulted, so no error record was kept
    pub fn error_handler_failed(&self) -> bool {
        self.terminal == Terminal::ErrorEnd && self.state.trace.last().map_or(true, |r| r.faulted)
    }
}

/// Routing check applied after every stage
pub fn route(state: &PipelineState) -> Route {
    if state.has_failed() {
        Route::ErrorHandler
    } else {
        Route::Continue
    }
}

pub struct PipelineRunner {
    stages: Vec<Box<dyn Stage>>,
    error_handler: Box<dyn ErrorHandler>,
    pipeline_id: String,
}

impl PipelineRunner {
    pub fn new(stages: Vec<Box<dyn Stage>>, error_handler: Box<dyn ErrorHandler>) -> Self {
        let pipeline_id = stages
            .iter()
            .map(|s| s.id())
            .collect::<Vec<_>>()
            .join("→");

        Self {
            stages,
            error_handler,
            pipeline_id,
        }
    }

    /// Run one state through the stage chain.
    ///
    /// Always returns exactly one terminal. Once the error slot is set no
    /// further stage executes.
    pub fn run(&self, mut state: PipelineState) -> RunOutcome {
        info!(run_id = %state.run_id, pipeline = %self.pipeline_id, "pipeline started");

        for stage in &self.stages {
            if route(&state) == Route::ErrorHandler {
                break;
            }
            self.run_stage(stage.as_ref(), &mut state);
        }

        match route(&state) {
            Route::Continue => {
                info!(
                    run_id = %state.run_id,
                    compositions = state.compositions.len(),
                    "pipeline finished"
                );
                RunOutcome {
                    terminal: Terminal::End,
                    state,
                }
            }
            Route::ErrorHandler => {
                self.run_error_handler(&mut state);
                RunOutcome {
                    terminal: Terminal::ErrorEnd,
                    state,
                }
            }
        }
    }

    /// Run several independent states concurrently, one blocking task per
    /// run. Outcomes are returned in input order.
    pub async fn run_batch(runner: Arc<PipelineRunner>, states: Vec<PipelineState>) -> Vec<RunOutcome> {
        let handles: Vec<_> = states
            .into_iter()
            .map(|state| {
                let runner = Arc::clone(&runner);
                tokio::task::spawn_blocking(move || runner.run(state))
            })
            .collect();

        let mut outcomes = Vec::with_capacity(handles.len());
        for handle in handles {
            match handle.await {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => {
                    error!(error = %e, "pipeline task aborted");
                    let mut state = PipelineState::new();
                    state.fail("run_batch", format!("run aborted: {}", e));
                    outcomes.push(RunOutcome {
                        terminal: Terminal::ErrorEnd,
                        state,
                    });
                }
            }
        }
        outcomes
    }

    fn run_stage(&self, stage: &dyn Stage, state: &mut PipelineState) {
        let start = Instant::now();
        let in_hash = fingerprint(state);
        info!(run_id = %state.run_id, stage = stage.id(), "running stage");

        let result = panic::catch_unwind(AssertUnwindSafe(|| stage.run(state)))
            .unwrap_or_else(|payload| Err(StageError::Panicked(panic_message(payload.as_ref()))));

        if let Err(e) = result {
            error!(run_id = %state.run_id, stage = stage.id(), error = %e, "stage fault");
            state.fail(stage.id(), e.to_string());
        }

        let record = StageRecord {
            id: stage.id().to_string(),
            in_hash,
            out_hash: fingerprint(state),
            latency_ms: start.elapsed().as_millis() as u64,
            faulted: state.has_failed(),
        };
        state.trace.push(record);
    }

    fn run_error_handler(&self, state: &mut PipelineState) {
        let start = Instant::now();
        let in_hash = fingerprint(state);
        error!(
            run_id = %state.run_id,
            stage = state.failed_stage().unwrap_or("?"),
            error = state.error().unwrap_or(""),
            "routing to error handler"
        );

        let handled = panic::catch_unwind(AssertUnwindSafe(|| self.error_handler.handle(state)))
            .unwrap_or_else(|payload| Err(StageError::Panicked(panic_message(payload.as_ref()))));
        if let Err(e) = &handled {
            error!(run_id = %state.run_id, error = %e, "error handler failed");
        }

        state.trace.push(StageRecord {
            id: self.error_handler.id().to_string(),
            in_hash: in_hash.clone(),
            out_hash: in_hash,
            latency_ms: start.elapsed().as_millis() as u64,
            faulted: handled.is_err(),
        });
    }

    pub fn pipeline_id(&self) -> &str {
        &self.pipeline_id
    }

    pub fn stage_ids(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.id()).collect()
    }
}

fn fingerprint(state: &PipelineState) -> String {
    match serde_json::to_vec(state) {
        Ok(bytes) => format!("blake3:{}", blake3::hash(&bytes)),
        Err(_) => "blake3:unavailable".to_string(),
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "stage panicked".to_string()
    }
}
