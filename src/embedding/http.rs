//! Shared HTTP transport for remote embedding providers
//!
//! Retries 429, 5xx, timeouts and connection failures with exponential
//! backoff; everything else fails on the first attempt.

use std::time::Duration;

use backoff::backoff::Backoff;
use backoff::ExponentialBackoff;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// Longest upstream error body kept in error messages
const MAX_ERROR_BODY: usize = 300;

/// JSON-over-HTTP client with retry
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    timeout_secs: u64,
    max_retries: u32,
    initial_backoff: Duration,
}

impl HttpTransport {
    pub fn new(timeout_secs: u64, max_retries: u32) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| Error::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            timeout_secs,
            max_retries,
            initial_backoff: Duration::from_millis(250),
        })
    }

    #[cfg(test)]
    pub fn with_initial_backoff(mut self, delay: Duration) -> Self {
        self.initial_backoff = delay;
        self
    }

    fn backoff(&self) -> ExponentialBackoff {
        ExponentialBackoff {
            initial_interval: self.initial_backoff,
            max_interval: Duration::from_secs(8),
            max_elapsed_time: None,
            ..Default::default()
        }
    }

    /// POST `body` as JSON and decode the JSON answer
    pub async fn post_json<B, R>(&self, url: &str, headers: &[(&str, &str)], body: &B) -> Result<R>
    where
        B: Serialize + Sync + ?Sized,
        R: DeserializeOwned,
    {
        let mut backoff = self.backoff();
        let mut attempt = 0u32;

        loop {
            let err = match self.send_once(url, headers, body).await {
                Ok(text) => {
                    return serde_json::from_str(&text).map_err(|e| {
                        Error::embedding_malformed(format!("could not decode response: {}", e))
                    });
                }
                Err(err) => err,
            };

            if !err.is_retryable() || attempt >= self.max_retries {
                return Err(err);
            }

            attempt += 1;
            let delay = backoff.next_backoff().unwrap_or(self.initial_backoff);
            warn!(attempt, max_retries = self.max_retries, ?delay, error = %err, "Retrying embedding request");
            tokio::time::sleep(delay).await;
        }
    }

    async fn send_once<B>(&self, url: &str, headers: &[(&str, &str)], body: &B) -> Result<String>
    where
        B: Serialize + Sync + ?Sized,
    {
        let mut req = self.client.post(url).json(body);
        for (name, value) in headers {
            req = req.header(*name, *value);
        }

        let response = req.send().await.map_err(|e| self.transport_error(e))?;
        let status = response.status();
        let text = response.text().await.map_err(|e| self.transport_error(e))?;

        if status.is_success() {
            debug!(status = %status, bytes = text.len(), "Embedding response received");
            return Ok(text);
        }

        Err(Error::EmbeddingRequest {
            status: Some(status.as_u16()),
            message: format!("API error {}: {}", status, truncate_body(&text)),
        })
    }

    fn transport_error(&self, e: reqwest::Error) -> Error {
        if e.is_timeout() {
            Error::EmbeddingTimeout {
                timeout_secs: self.timeout_secs,
            }
        } else if e.is_connect() {
            Error::EmbeddingRequest {
                status: None,
                message: format!("Connection error: {}", e),
            }
        } else {
            // Not worth retrying: report as a client-side failure
            Error::EmbeddingRequest {
                status: Some(e.status().map(|s| s.as_u16()).unwrap_or(400)),
                message: format!("Request error: {}", e),
            }
        }
    }
}

fn truncate_body(body: &str) -> String {
    let trimmed = body.trim();
    match trimmed.char_indices().nth(MAX_ERROR_BODY) {
        Some((cut, _)) => format!("{}...", &trimmed[..cut]),
        None => trimmed.to_string(),
    }
}


#[cfg(test)]
mod tests {
    use super::test_server::serve;
    use super::*;
    use std::sync::atomic::Ordering;

    #[derive(Debug, serde::Deserialize)]
    struct Echo {
        ok: bool,
    }

    fn transport(max_retries: u32) -> HttpTransport {
        HttpTransport::new(5, max_retries)
            .unwrap()
            .with_initial_backoff(Duration::from_millis(5))
    }

    #[tokio::test]
    async fn test_success() {
        let (url, hits) = serve(vec![(200, r#"{"ok": true}"#.to_string())]).await;
        let echo: Echo = transport(2).post_json(&url, &[], &serde_json::json!({})).await.unwrap();
        assert!(echo.ok);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_retries_server_errors() {
        let (url, hits) = serve(vec![
            (503, "busy".to_string()),
            (429, "slow down".to_string()),
            (200, r#"{"ok": true}"#.to_string()),
        ])
        .await;

        let echo: Echo = transport(2).post_json(&url, &[], &serde_json::json!({})).await.unwrap();
        assert!(echo.ok);
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_retries() {
        let (url, hits) = serve(vec![(500, "down".to_string())]).await;

        let err = transport(1)
            .post_json::<_, Echo>(&url, &[], &serde_json::json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::EmbeddingRequest { status: Some(500), .. }));
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_client_errors_are_not_retried() {
        let (url, hits) = serve(vec![(401, r#"{"error": "bad key"}"#.to_string())]).await;

        let err = transport(3)
            .post_json::<_, Echo>(&url, &[], &serde_json::json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::EmbeddingRequest { status: Some(401), .. }));
        assert!(err.to_string().contains("401"));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_malformed_body() {
        let (url, _) = serve(vec![(200, "not json".to_string())]).await;
        let err = transport(0)
            .post_json::<_, Echo>(&url, &[], &serde_json::json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::EmbeddingMalformed { .. }));
    }

    #[test]
    fn test_truncate_body() {
        let long = "x".repeat(MAX_ERROR_BODY + 50);
        assert!(truncate_body(&long).ends_with("..."));
        assert_eq!(truncate_body(" short "), "short");
    }
}
