//! Configuration module.
//!
//! Loads configuration from environment variables.

use std::env;

/// Default HTTP API endpoint of the platform.
pub const DEFAULT_BASE_URL: &str = "https://www.kookapp.cn/api/v3";

/// Client configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Bot token used for the `Authorization` header.
    pub token: String,

    /// Base URL of the HTTP API, without a trailing slash.
    pub base_url: String,
}

impl Config {
    /// Build a configuration with the default API endpoint.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Reads `KOOK_TOKEN` and, optionally, `KOOK_API_BASE`.
    ///
    /// # Panics
    /// Panics if `KOOK_TOKEN` is not set.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let base_url = env::var("KOOK_API_BASE")
            .map(|s| s.trim_end_matches('/').to_string())
            .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());

        Self {
            token: env::var("KOOK_TOKEN").expect("KOOK_TOKEN must be set"),
            base_url,
        }
    }

    /// Override the API base URL (builder pattern).
    #[must_use]
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}
