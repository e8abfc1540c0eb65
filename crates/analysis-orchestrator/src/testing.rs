//! Scripted in-memory backend for orchestrator and search tests.

use analysis_core::{
    AnalysisBackend, ApiError, ApiResponse, ApiResult, Company, Frame1Metrics, Frame1Result,
    Frame2Result, Frame3Request, Frame3Result,
};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tokio::sync::oneshot;

/// A queued response, optionally held back until the test releases it
struct Scripted<T> {
    gate: Option<oneshot::Receiver<()>>,
    response: ApiResult<ApiResponse<T>>,
}

struct Script<T>(Mutex<VecDeque<Scripted<T>>>);

impl<T> Default for Script<T> {
    fn default() -> Self {
        Self(Mutex::new(VecDeque::new()))
    }
}

impl<T> Script<T> {
    fn push(&self, response: ApiResult<ApiResponse<T>>) {
        self.0.lock().unwrap().push_back(Scripted { gate: None, response });
    }

    fn push_gated(&self, response: ApiResult<ApiResponse<T>>) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.0.lock().unwrap().push_back(Scripted { gate: Some(rx), response });
        tx
    }

    async fn next(&self, name: &str) -> ApiResult<ApiResponse<T>> {
        let scripted = self.0.lock().unwrap().pop_front();
        let Some(scripted) = scripted else {
            return Err(ApiError::Network(format!("no scripted response for {}", name)));
        };
        if let Some(gate) = scripted.gate {
            let _ = gate.await;
        }
        scripted.response
    }
}

#[derive(Default)]
pub struct ScriptedBackend {
    search: Script<Vec<Company>>,
    frame1: Script<Frame1Result>,
    frame2: Script<Frame2Result>,
    frame3: Script<Frame3Result>,
    queries: Mutex<Vec<(String, u32)>>,
    frame3_requests: Mutex<Vec<Frame3Request>>,
    calls: AtomicUsize,
}

impl ScriptedBackend {
    pub fn push_search(&self, response: ApiResult<ApiResponse<Vec<Company>>>) {
        self.search.push(response);
    }

    pub fn push_gated_search(&self, response: ApiResult<ApiResponse<Vec<Company>>>) -> oneshot::Sender<()> {
        self.search.push_gated(response)
    }

    pub fn push_frame1(&self, response: ApiResult<ApiResponse<Frame1Result>>) {
        self.frame1.push(response);
    }

    pub fn push_gated_frame1(&self, response: ApiResult<ApiResponse<Frame1Result>>) -> oneshot::Sender<()> {
        self.frame1.push_gated(response)
    }

    pub fn push_frame2(&self, response: ApiResult<ApiResponse<Frame2Result>>) {
        self.frame2.push(response);
    }

    pub fn push_gated_frame2(&self, response: ApiResult<ApiResponse<Frame2Result>>) -> oneshot::Sender<()> {
        self.frame2.push_gated(response)
    }

    pub fn push_frame3(&self, response: ApiResult<ApiResponse<Frame3Result>>) {
        self.frame3.push(response);
    }

    /// Total number of backend calls received
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn queries(&self) -> Vec<(String, u32)> {
        self.queries.lock().unwrap().clone()
    }

    pub fn frame3_requests(&self) -> Vec<Frame3Request> {
        self.frame3_requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl AnalysisBackend for ScriptedBackend {
    async fn search_companies(&self, query: &str, limit: u32) -> ApiResult<ApiResponse<Vec<Company>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.queries.lock().unwrap().push((query.to_string(), limit));
        self.search.next("search").await
    }

    async fn frame1(&self, _company: &Company) -> ApiResult<ApiResponse<Frame1Result>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.frame1.next("frame1").await
    }

    async fn frame2(&self, _company: &Company) -> ApiResult<ApiResponse<Frame2Result>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.frame2.next("frame2").await
    }

    async fn frame3(&self, request: &Frame3Request) -> ApiResult<ApiResponse<Frame3Result>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.frame3_requests.lock().unwrap().push(request.clone());
        self.frame3.next("frame3").await
    }
}

pub fn frame1_fixture() -> Frame1Result {
    Frame1Result {
        company_name: Some("Acme".to_string()),
        category_code: Some("25".to_string()),
        metrics: Frame1Metrics {
            ltde: Some(0.42),
            edamargin: Some(0.12),
            fx: None,
        },
        ..Frame1Result::default()
    }
}

pub fn frame2_fixture(growth: f64) -> Frame2Result {
    Frame2Result {
        company_name: Some("Acme".to_string()),
        ev_current: 1.0e9,
        ev_dcf: 1.0e9 * (1.0 + growth),
        growth_expected: growth,
        classification: "Good Deal".to_string(),
        ..Frame2Result::default()
    }
}

pub fn frame3_fixture(leaf: &str) -> Frame3Result {
    Frame3Result {
        company_name: Some("Acme".to_string()),
        leaf_value: leaf.to_string(),
        category: "low growth".to_string(),
        decision_path: vec!["EV Growth: 10.00%".to_string()],
    }
}
