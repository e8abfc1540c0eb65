use analysis_core::{ApiError, ApiResult};
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_API_PREFIX: &str = "/api/v1";
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Where the analysis service lives and how long a single call may take
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub base_url: String,
    pub api_prefix: String,
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_prefix: DEFAULT_API_PREFIX.to_string(),
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
        }
    }
}

impl ClientConfig {
    /// Defaults overlaid with `API_BASE_URL`, `API_PREFIX` and `API_TIMEOUT_MS`.
    pub fn from_env() -> ApiResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> ApiResult<Self> {
        let mut config = Self::default();

        if let Some(base_url) = lookup("API_BASE_URL").filter(|v| !v.trim().is_empty()) {
            config.base_url = base_url;
        }
        if let Some(prefix) = lookup("API_PREFIX") {
            config.api_prefix = prefix;
        }
        if let Some(raw) = lookup("API_TIMEOUT_MS") {
            let millis: u64 = raw.trim().parse().map_err(|_| {
                ApiError::InvalidRequest(format!("API_TIMEOUT_MS must be a number of milliseconds, got {:?}", raw))
            })?;
            config.timeout = Duration::from_millis(millis);
        }

        Ok(config)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ClientConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config, ClientConfig::default());
        assert_eq!(config.timeout, Duration::from_millis(30_000));
        assert_eq!(config.api_prefix, "/api/v1");
    }

    #[test]
    fn test_env_overrides() {
        let config = ClientConfig::from_lookup(lookup_from(&[
            ("API_BASE_URL", "https://analysis.example.com"),
            ("API_TIMEOUT_MS", "5000"),
        ]))
        .unwrap();

        assert_eq!(config.base_url, "https://analysis.example.com");
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.api_prefix, DEFAULT_API_PREFIX);
    }

    #[test]
    fn test_invalid_timeout_rejected() {
        let err = ClientConfig::from_lookup(lookup_from(&[("API_TIMEOUT_MS", "soon")])).unwrap_err();
        assert!(matches!(err, ApiError::InvalidRequest(_)));
    }
}
