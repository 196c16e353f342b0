//! HTTP transport for the forecast endpoints.
//!
//! The client talks to upstream through [`ForecastTransport`] so scans and
//! caching can be exercised without a network.

use std::error::Error as StdError;
use std::time::Duration;

use async_trait::async_trait;
use common::config::UpstreamConfig;
use common::Error;
use serde_json::Value;
use tracing::debug;

/// A JSON-over-HTTP GET.
#[async_trait]
pub trait ForecastTransport: Send + Sync {
    async fn get_json(&self, url: &str, query: &[(String, String)]) -> Result<Value, Error>;
}

/// `reqwest`-backed transport with a per-request timeout.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

fn format_reqwest_error(err: &reqwest::Error) -> String {
    // Keep chained causes so network failures (DNS/TLS/socket) are visible.
    let mut message = err.to_string();
    let mut source = err.source();

    while let Some(cause) = source {
        let cause_msg = cause.to_string();
        if !cause_msg.is_empty() && !message.contains(&cause_msg) {
            message.push_str(": ");
            message.push_str(&cause_msg);
        }
        source = cause.source();
    }

    message
}

fn summarize_response_body(raw: &str) -> String {
    const MAX_CHARS: usize = 500;
    let compact = raw.replace(['\n', '\r'], " ");
    match compact.char_indices().nth(MAX_CHARS) {
        Some((cut, _)) => format!("{}…", &compact[..cut]),
        None => compact,
    }
}

impl HttpTransport {
    pub fn new(config: &UpstreamConfig) -> Result<Self, Error> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .pool_max_idle_per_host(4)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::Http(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl ForecastTransport for HttpTransport {
    async fn get_json(&self, url: &str, query: &[(String, String)]) -> Result<Value, Error> {
        debug!("GET {} ({} params)", url, query.len());

        let resp = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::Http(format!("timeout calling {}", url))
                } else {
                    Error::Http(format_reqwest_error(&e))
                }
            })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Http(format!(
                "{} returned {}: {}",
                url,
                status.as_u16(),
                summarize_response_body(&body)
            )));
        }

        resp.json()
            .await
            .map_err(|e| Error::Http(format!("JSON parse error for {}: {}", url, e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summarize_response_body_truncates_on_char_boundary() {
        let long = "é".repeat(800);
        let summary = summarize_response_body(&long);
        assert!(summary.ends_with('…'));
        assert_eq!(summary.chars().count(), 501);
    }

    #[test]
    fn test_summarize_response_body_flattens_newlines() {
        assert_eq!(summarize_response_body("a\nb\r\nc"), "a b  c");
    }
}
