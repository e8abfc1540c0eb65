use analysis_core::{AnalysisBackend, ApiResponse, ApiResult, Company, Frame3Request};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

pub mod search;
pub mod state;

pub use search::{SearchService, SearchState, NO_RESULTS_MESSAGE, SEARCH_LIMIT};
pub use state::{AnalysisState, Stage, StageState};

/// State shared between the orchestrator handle and its in-flight runs
struct Shared {
    state: watch::Sender<AnalysisState>,
    /// Bumped on every run start and every reset. Only ever changed inside a
    /// `send_modify` closure so it moves in lockstep with the published state.
    generation: AtomicU64,
}

impl Shared {
    /// Replace the whole state and open a new generation
    fn restart(&self, next: AnalysisState) -> u64 {
        let mut generation = 0;
        self.state.send_modify(|state| {
            generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
            *state = next;
        });
        generation
    }

    /// Apply a stage update unless the run it belongs to has been superseded
    fn apply(&self, generation: u64, stage: Stage, update: impl FnOnce(&mut AnalysisState)) -> bool {
        self.state.send_if_modified(|state| {
            let current = self.generation.load(Ordering::SeqCst);
            if current != generation {
                tracing::debug!(
                    "Discarding Frame {} result from run {} (current run {})",
                    stage.number(),
                    generation,
                    current
                );
                return false;
            }
            update(state);
            true
        })
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }
}

/// Runs the three analysis frames for a selected company and publishes
/// per-frame progress as [`AnalysisState`] snapshots.
///
/// Frame 1 and Frame 2 are dispatched together. Frame 3 is dispatched once
/// Frame 2 has settled because its request is built from Frame 2's growth
/// figure. Each frame settles independently; a failure in one never touches
/// the others.
#[derive(Clone)]
pub struct AnalysisOrchestrator {
    backend: Arc<dyn AnalysisBackend>,
    shared: Arc<Shared>,
}

impl AnalysisOrchestrator {
    pub fn new(backend: Arc<dyn AnalysisBackend>) -> Self {
        let (state, _) = watch::channel(AnalysisState::default());
        Self {
            backend,
            shared: Arc::new(Shared {
                state,
                generation: AtomicU64::new(0),
            }),
        }
    }

    /// Receiver that is notified on every state transition
    pub fn subscribe(&self) -> watch::Receiver<AnalysisState> {
        self.shared.state.subscribe()
    }

    pub fn snapshot(&self) -> AnalysisState {
        self.shared.state.borrow().clone()
    }

    /// Identifier of the current run; increases on every run and reset
    pub fn generation(&self) -> u64 {
        self.shared.generation.load(Ordering::SeqCst)
    }

    /// Start a run for `company`.
    ///
    /// The company and all three loading flags are published before this
    /// returns. The remote calls happen on a spawned task whose handle is
    /// returned; dropping the handle does not cancel the run. Must be called
    /// from within a Tokio runtime.
    pub fn run_analysis(&self, company: Company) -> JoinHandle<()> {
        let generation = self.shared.restart(AnalysisState::started(company.clone()));
        tracing::info!("Starting analysis run {} for {}", generation, company.name);

        let backend = Arc::clone(&self.backend);
        let shared = Arc::clone(&self.shared);

        tokio::spawn(async move {
            let frame1 = async {
                let outcome = settle(Stage::Frame1, backend.frame1(&company).await);
                shared.apply(generation, Stage::Frame1, |state| state.frame1 = outcome.into());
            };

            let frame2_then_frame3 = async {
                let frame2 = settle(Stage::Frame2, backend.frame2(&company).await);
                shared.apply(generation, Stage::Frame2, |state| state.frame2 = frame2.clone().into());

                if !shared.is_current(generation) {
                    tracing::debug!("Run {} superseded before Frame 3 dispatch", generation);
                    return;
                }

                let request = Frame3Request::new(&company, frame2.as_ref().ok());
                let frame3 = settle(Stage::Frame3, backend.frame3(&request).await);
                shared.apply(generation, Stage::Frame3, |state| state.frame3 = frame3.into());
            };

            tokio::join!(frame1, frame2_then_frame3);
            tracing::debug!("Analysis run {} finished", generation);
        })
    }

    /// Back to the empty initial state. In-flight runs keep going but their
    /// results are discarded.
    pub fn reset_analysis(&self) {
        let generation = self.shared.restart(AnalysisState::default());
        tracing::info!("Analysis reset (run {})", generation);
    }
}

/// Collapse transport and envelope failures into the stage's error message
fn settle<T>(stage: Stage, response: ApiResult<ApiResponse<T>>) -> Result<T, String> {
    match response {
        Ok(envelope) => envelope.into_data().ok_or_else(|| {
            tracing::warn!("Frame {} returned no usable data", stage.number());
            stage.failure_message()
        }),
        Err(e) => {
            tracing::warn!("Frame {} request failed: {}", stage.number(), e);
            Err(e.to_string())
        }
    }
}

#[cfg(test)]
pub(crate) mod testing;
