use analysis_core::{
    AnalysisBackend, ApiError, ApiResponse, ApiResult, BatchValuation, Company, Frame1Result,
    Frame2Result, Frame3Request, Frame3Result, HealthStatus,
};
use async_trait::async_trait;
use reqwest::{header, Client, Method, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;

use crate::config::ClientConfig;

/// Thin JSON-over-HTTP wrapper around the analysis service.
///
/// Each call is bounded by `ClientConfig::timeout`; when it expires the in-flight
/// request future is dropped, which aborts the connection. No retries happen here.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    config: ClientConfig,
}

impl ApiClient {
    pub fn new(config: ClientConfig) -> ApiResult<Self> {
        let client = Client::builder()
            .build()
            .map_err(|e| ApiError::InvalidRequest(e.to_string()))?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn endpoint(&self, path: &str) -> String {
        format!(
            "{}{}{}",
            self.config.base_url.trim_end_matches('/'),
            self.config.api_prefix,
            path
        )
    }

    /// `GET {prefix}{path}?k=v..`. Values are URL-encoded, keys are passed through as-is.
    pub async fn get<T: DeserializeOwned>(&self, path: &str, params: &[(&str, String)]) -> ApiResult<T> {
        self.execute(Method::GET, self.endpoint(path), params, None).await
    }

    pub async fn post<B, T>(&self, path: &str, body: &B) -> ApiResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = encode_body(body)?;
        self.execute(Method::POST, self.endpoint(path), &[], Some(body)).await
    }

    pub async fn put<B, T>(&self, path: &str, body: &B) -> ApiResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = encode_body(body)?;
        self.execute(Method::PUT, self.endpoint(path), &[], Some(body)).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        self.execute(Method::DELETE, self.endpoint(path), &[], None).await
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        method: Method,
        url: String,
        params: &[(&str, String)],
        body: Option<Vec<u8>>,
    ) -> ApiResult<T> {
        let timeout = self.config.timeout;

        let mut builder = self
            .client
            .request(method.clone(), &url)
            .header(header::CONTENT_TYPE, "application/json");
        if !params.is_empty() {
            builder = builder.query(params);
        }
        if let Some(body) = body {
            builder = builder.body(body);
        }

        tracing::debug!("{} {}", method, url);

        let exchange = async {
            let response = builder.send().await.map_err(|e| transport_error(e, timeout))?;
            let status = response.status();
            let text = response.text().await.map_err(|e| transport_error(e, timeout))?;
            Ok::<_, ApiError>((status, text))
        };

        let (status, text) = match tokio::time::timeout(timeout, exchange).await {
            Ok(result) => result.map_err(|e| {
                tracing::warn!("{} {} failed: {}", method, url, e);
                e
            })?,
            Err(_) => {
                tracing::warn!("{} {} timed out after {:?}", method, url, timeout);
                return Err(ApiError::Timeout(timeout.as_millis() as u64));
            }
        };

        if !status.is_success() {
            let message = error_detail(&text).unwrap_or_else(|| generic_status_message(status));
            tracing::warn!("{} {} returned {}: {}", method, url, status.as_u16(), message);
            return Err(ApiError::Status {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_str(&text).map_err(|e| {
            tracing::warn!("{} {} returned malformed JSON: {}", method, url, e);
            ApiError::Decode(e.to_string())
        })
    }

    /// Service liveness. Lives outside the versioned prefix.
    pub async fn health(&self) -> ApiResult<HealthStatus> {
        let url = format!("{}/health", self.config.base_url.trim_end_matches('/'));
        self.execute(Method::GET, url, &[], None).await
    }

    /// Fetch a single company by its identifier
    pub async fn get_company(&self, id: &str) -> ApiResult<ApiResponse<Company>> {
        self.get(&format!("/company/{}", id), &[]).await
    }

    /// DCF valuation for many companies at once. Companies the service cannot
    /// value are silently left out of the result.
    pub async fn batch_valuation(&self, companies: &[Company]) -> ApiResult<ApiResponse<Vec<BatchValuation>>> {
        self.post("/analysis/batch", companies).await
    }
}

#[async_trait]
impl AnalysisBackend for ApiClient {
    async fn search_companies(&self, query: &str, limit: u32) -> ApiResult<ApiResponse<Vec<Company>>> {
        self.get(
            "/search/companies",
            &[("query", query.to_string()), ("limit", limit.to_string())],
        )
        .await
    }

    async fn frame1(&self, company: &Company) -> ApiResult<ApiResponse<Frame1Result>> {
        self.post("/analysis/frame1", company).await
    }

    async fn frame2(&self, company: &Company) -> ApiResult<ApiResponse<Frame2Result>> {
        self.post("/analysis/frame2", company).await
    }

    async fn frame3(&self, request: &Frame3Request) -> ApiResult<ApiResponse<Frame3Result>> {
        self.post("/analysis/frame3", request).await
    }
}

fn encode_body<B: Serialize + ?Sized>(body: &B) -> ApiResult<Vec<u8>> {
    serde_json::to_vec(body).map_err(|e| ApiError::InvalidRequest(e.to_string()))
}

fn transport_error(err: reqwest::Error, timeout: Duration) -> ApiError {
    if err.is_timeout() {
        ApiError::Timeout(timeout.as_millis() as u64)
    } else {
        ApiError::Network(err.to_string())
    }
}

/// `detail` from an error body, if the body is JSON and carries one.
fn error_detail(body: &str) -> Option<String> {
    let parsed: serde_json::Value =
        serde_json::from_str(body).unwrap_or_else(|_| serde_json::Value::Object(Default::default()));

    match parsed.get("detail") {
        Some(serde_json::Value::String(detail)) if !detail.is_empty() => Some(detail.clone()),
        Some(serde_json::Value::Null) | None => None,
        Some(serde_json::Value::String(_)) => None,
        Some(other) => Some(other.to_string()),
    }
}

fn generic_status_message(status: StatusCode) -> String {
    match status.canonical_reason() {
        Some(reason) => format!("API Error: {} {}", status.as_u16(), reason),
        None => format!("API Error: {}", status.as_u16()),
    }
}
