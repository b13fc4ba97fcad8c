//! HTTP transport for the collector endpoint
//!
//! Every record is one `POST` with a UTF-8 JSON body. The response status is
//! not inspected and the response body is never read.

use std::time::Duration;

use reqwest::header::{HeaderValue, CONTENT_TYPE};

use super::BoxFuture;
use crate::error::{Error, Result};

/// Content type of the fallback path
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Content type browsers attach to string beacons
pub const BEACON_CONTENT_TYPE: &str = "text/plain;charset=UTF-8";

/// One outgoing request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostRequest {
    pub endpoint: String,
    pub body: String,
    pub content_type: &'static str,
}

impl PostRequest {
    /// Request for the fallback path
    pub fn json(endpoint: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            body: body.into(),
            content_type: JSON_CONTENT_TYPE,
        }
    }

    /// Request for the beacon path
    pub fn beacon(endpoint: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            body: body.into(),
            content_type: BEACON_CONTENT_TYPE,
        }
    }
}

/// Asynchronous POST transport.
///
/// The returned future owns everything it needs so that it can run on a
/// detached task after the caller has moved on.
pub trait HttpPost: Send + Sync {
    fn post(&self, request: PostRequest) -> BoxFuture<'static, Result<()>>;
}

/// [`HttpPost`] backed by a shared `reqwest` client
#[derive(Clone)]
pub struct HttpTransport {
    http_client: reqwest::Client,
}

impl HttpTransport {
    /// Create a transport whose requests time out after `timeout`
    pub fn new(timeout: Duration) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self { http_client })
    }
}

impl HttpPost for HttpTransport {
    fn post(&self, request: PostRequest) -> BoxFuture<'static, Result<()>> {
        let client = self.http_client.clone();
        Box::pin(async move {
            let response = client
                .post(&request.endpoint)
                .header(CONTENT_TYPE, HeaderValue::from_static(request.content_type))
                .body(request.body)
                .send()
                .await
                .map_err(|e| Error::Delivery(format!("HTTP request failed: {}", e)))?;

            tracing::trace!(
                endpoint = %request.endpoint,
                status = %response.status(),
                "Collector responded"
            );
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Accept one connection, capture the raw request and answer with `status`.
    async fn one_shot_server(status: &'static str) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut raw = Vec::new();
            let mut buf = [0u8; 1024];
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                raw.extend_from_slice(&buf[..n]);
                if String::from_utf8_lossy(&raw).ends_with('}') {
                    break;
                }
            }
            let reply = format!(
                "HTTP/1.1 {}\r\ncontent-length: 0\r\nconnection: close\r\n\r\n",
                status
            );
            socket.write_all(reply.as_bytes()).await.unwrap();
            String::from_utf8_lossy(&raw).to_string()
        });
        (format!("http://{}/collect", addr), handle)
    }

    #[tokio::test]
    async fn test_post_sends_json_body() {
        let (endpoint, server) = one_shot_server("200 OK").await;
        let transport = HttpTransport::new(Duration::from_secs(5)).unwrap();

        transport
            .post(PostRequest::json(&endpoint, r#"{"event_type":"click"}"#))
            .await
            .unwrap();

        let raw = server.await.unwrap();
        assert!(raw.starts_with("POST /collect"));
        assert!(raw.to_lowercase().contains("content-type: application/json"));
        assert!(raw.ends_with(r#"{"event_type":"click"}"#));
    }

    #[tokio::test]
    async fn test_post_ignores_error_status() {
        let (endpoint, server) = one_shot_server("500 Internal Server Error").await;
        let transport = HttpTransport::new(Duration::from_secs(5)).unwrap();

        let result = transport
            .post(PostRequest::beacon(&endpoint, r#"{"a":1}"#))
            .await;
        assert!(result.is_ok());

        let raw = server.await.unwrap();
        assert!(raw.to_lowercase().contains("content-type: text/plain;charset=utf-8"));
    }

    #[tokio::test]
    async fn test_post_reports_connection_failure() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let transport = HttpTransport::new(Duration::from_secs(5)).unwrap();
        let result = transport
            .post(PostRequest::json(format!("http://{}/", addr), "{}"))
            .await;
        assert!(matches!(result, Err(Error::Delivery(_))));
    }
}
