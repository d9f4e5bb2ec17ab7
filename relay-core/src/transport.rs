//! Outbound transport: GET a path on a chosen endpoint, get the body as text.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use http::{Request, Uri};
use http_body_util::{BodyExt, Empty};
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::{TokioExecutor, TokioTimer};
use thiserror::Error;

use crate::endpoint::Endpoint;

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("invalid request uri: {0}")]
    InvalidUri(String),
    #[error("connection failed: {0}")]
    Connect(String),
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    #[error("backend answered {status}: {body}")]
    Status { status: u16, body: String },
    #[error("unreadable response body: {0}")]
    Body(String),
}

/// Transport: send a GET to one endpoint. Async so it does not block the runtime.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, endpoint: &Endpoint, path: &str) -> Result<String, TransportError>;
}

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Plain HTTP/1.1 transport over a pooled hyper client.
/// Non-2xx answers are errors; the timeout covers connect, headers and body.
pub struct HyperTransport {
    client: Client<HttpConnector, Empty<Bytes>>,
    timeout: Duration,
}

impl HyperTransport {
    pub fn new(timeout: Duration) -> Self {
        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(timeout));
        connector.set_nodelay(true);
        let client = Client::builder(TokioExecutor::new())
            .pool_timer(TokioTimer::new())
            .build(connector);
        Self { client, timeout }
    }

    async fn send(&self, uri: Uri) -> Result<String, TransportError> {
        let request = Request::get(uri)
            .body(Empty::<Bytes>::new())
            .map_err(|e| TransportError::InvalidUri(e.to_string()))?;
        let response = self
            .client
            .request(request)
            .await
            .map_err(|e| TransportError::Connect(e.to_string()))?;
        let status = response.status();
        let body = response
            .into_body()
            .collect()
            .await
            .map_err(|e| TransportError::Body(e.to_string()))?
            .to_bytes();
        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&body).into_owned(),
            });
        }
        String::from_utf8(body.to_vec()).map_err(|e| TransportError::Body(e.to_string()))
    }
}

impl Default for HyperTransport {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT)
    }
}

#[async_trait]
impl Transport for HyperTransport {
    async fn get(&self, endpoint: &Endpoint, path: &str) -> Result<String, TransportError> {
        let uri: Uri = format!("http://{}/{}", endpoint, path.trim_start_matches('/'))
            .parse()
            .map_err(|e: http::uri::InvalidUri| TransportError::InvalidUri(e.to_string()))?;
        tokio::time::timeout(self.timeout, self.send(uri))
            .await
            .map_err(|_| TransportError::Timeout(self.timeout))?
    }
}
