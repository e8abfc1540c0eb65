use async_trait::async_trait;
use crate::{ApiResponse, ApiResult, Company, Frame1Result, Frame2Result, Frame3Request, Frame3Result};

/// The remote analysis service as seen by the orchestrator and search service.
///
/// Implemented over HTTP by `api_client::ApiClient`; tests plug in scripted
/// in-memory backends.
#[async_trait]
pub trait AnalysisBackend: Send + Sync {
    /// `GET /search/companies?query=..&limit=..`
    async fn search_companies(&self, query: &str, limit: u32) -> ApiResult<ApiResponse<Vec<Company>>>;

    /// `POST /analysis/frame1` with the company as body
    async fn frame1(&self, company: &Company) -> ApiResult<ApiResponse<Frame1Result>>;

    /// `POST /analysis/frame2` with the company as body
    async fn frame2(&self, company: &Company) -> ApiResult<ApiResponse<Frame2Result>>;

    /// `POST /analysis/frame3` with the synthesized predictability inputs
    async fn frame3(&self, request: &Frame3Request) -> ApiResult<ApiResponse<Frame3Result>>;
}
