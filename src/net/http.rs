//! Blocking HTTP transport speaking the platform's response envelope.

use reqwest::blocking::Response;
use serde_json::Value;
use tracing::trace;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::util::json;

use super::Transport;

/// Transport backed by a blocking `reqwest` client.
///
/// Every response arrives wrapped in a `{code, message, data}` envelope; a
/// non-zero `code` becomes [`Error::BadResponse`] carrying that code.
pub struct HttpTransport {
    http: reqwest::blocking::Client,
    base_url: String,
    auth: String,
}

impl HttpTransport {
    pub fn new(config: &Config) -> Result<Self> {
        let http = reqwest::blocking::Client::builder().build()?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            auth: format!("Bot {}", config.token),
        })
    }

    fn url(&self, route: &str) -> String {
        format!("{}/{}", self.base_url, route)
    }
}

impl Transport for HttpTransport {
    fn get(&self, route: &str) -> Result<Value> {
        trace!(route, "GET");
        let response = self
            .http
            .get(self.url(route))
            .header("Authorization", self.auth.as_str())
            .send()?;
        decode(response)
    }

    fn post(&self, route: &str, body: &Value) -> Result<Value> {
        trace!(route, "POST");
        let response = self
            .http
            .post(self.url(route))
            .header("Authorization", self.auth.as_str())
            .json(body)
            .send()?;
        decode(response)
    }
}

/// Unwrap the platform envelope, surfacing its error code on failure.
fn decode(response: Response) -> Result<Value> {
    let envelope: Value = response.json()?;
    let code = json::int_field(&envelope, "code")?;
    if code != 0 {
        let message = json::str_field(&envelope, "message").unwrap_or("").to_string();
        return Err(Error::BadResponse {
            code: code as i32,
            message,
        });
    }
    Ok(json::field(&envelope, "data")?.clone())
}
