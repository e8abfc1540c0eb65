use analysis_core::{AnalysisBackend, Company};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::watch;

/// Maximum number of candidates requested per query
pub const SEARCH_LIMIT: u32 = 20;

pub const NO_RESULTS_MESSAGE: &str = "No companies found";

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SearchState {
    pub results: Vec<Company>,
    pub loading: bool,
    pub error: Option<String>,
}

/// Free-text company lookup feeding selections into the orchestrator.
///
/// Overlapping searches are not cancelled; whichever resolves last wins.
#[derive(Clone)]
pub struct SearchService {
    backend: Arc<dyn AnalysisBackend>,
    state: Arc<watch::Sender<SearchState>>,
}

impl SearchService {
    pub fn new(backend: Arc<dyn AnalysisBackend>) -> Self {
        let (state, _) = watch::channel(SearchState::default());
        Self {
            backend,
            state: Arc::new(state),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<SearchState> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> SearchState {
        self.state.borrow().clone()
    }

    /// Look up companies matching `query`. A blank query clears the results
    /// without contacting the service.
    pub async fn search(&self, query: &str) {
        if query.trim().is_empty() {
            self.state.send_modify(|state| state.results.clear());
            return;
        }

        self.state.send_modify(|state| {
            state.loading = true;
            state.error = None;
        });

        let outcome = self.backend.search_companies(query, SEARCH_LIMIT).await;

        self.state.send_modify(|state| {
            match outcome {
                Ok(envelope) => match envelope.into_data() {
                    Some(companies) if !companies.is_empty() => {
                        tracing::debug!("Search {:?} matched {} companies", query, companies.len());
                        state.results = companies;
                    }
                    _ => {
                        tracing::info!("Search {:?} matched no companies", query);
                        state.error = Some(NO_RESULTS_MESSAGE.to_string());
                        state.results.clear();
                    }
                },
                Err(e) => {
                    tracing::warn!("Search {:?} failed: {}", query, e);
                    state.error = Some(e.to_string());
                    state.results.clear();
                }
            }
            state.loading = false;
        });
    }

    /// Drop results and error. An in-flight search keeps its loading flag.
    pub fn clear(&self) {
        self.state.send_modify(|state| {
            state.results.clear();
            state.error = None;
        });
    }
}
