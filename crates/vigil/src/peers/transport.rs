//! Outbound HTTP to peer services.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

use vigil_common::VigilError;

/// JSON-over-HTTP calls to peers.
///
/// Probes and the gated forwarder only talk to peers through this trait, so
/// tests can count or fail calls without a network.
#[async_trait]
pub trait PeerTransport: Send + Sync {
    /// `GET url`, parse the body as JSON
    async fn get_json(&self, url: &str) -> Result<Value, VigilError>;

    /// `POST url` with a JSON body, parse the response body as JSON
    async fn post_json(&self, url: &str, body: &Value) -> Result<Value, VigilError>;
}

/// `reqwest`-backed transport with a per-request timeout
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self { client })
    }
}

#[async_trait]
impl PeerTransport for HttpTransport {
    async fn get_json(&self, url: &str) -> Result<Value, VigilError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(classify)?;

        response.json().await.map_err(classify)
    }

    async fn post_json(&self, url: &str, body: &Value) -> Result<Value, VigilError> {
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(classify)?;

        response.json().await.map_err(classify)
    }
}

fn classify(err: reqwest::Error) -> VigilError {
    if err.is_timeout() {
        VigilError::Timeout(err.to_string())
    } else {
        VigilError::Transport(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::assert_err;

    #[tokio::test]
    async fn test_connection_refused_is_transport_error() {
        // Reserve a free port, then release it so nothing is listening
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let transport = HttpTransport::new(Duration::from_secs(1)).unwrap();
        let result = transport.get_json(&format!("http://{}/healthy", addr)).await;
        let err = assert_err!(result);
        assert!(matches!(err, VigilError::Transport(_)));
    }
}
