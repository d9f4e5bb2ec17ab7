//! Relay core: endpoint selection, load-balanced remote service client, routing, HTTP server.

pub mod application;
pub mod client;
pub mod endpoint;
pub mod http;
pub mod module;
pub mod router;
pub mod routing;
pub mod selector;
pub mod service_discovery;
pub mod transport;

pub use application::{Application, Handler, HandlerFuture};
pub use client::{ClientError, MissingPlaceholder, RemotePaths, RemoteServiceClient};
pub use endpoint::{Endpoint, EndpointParseError, ServiceName};
pub use module::Module;
pub use router::{PathParams, RouteId, RouteMatch, Router};
pub use routing::HttpModule;
pub use selector::{
    EndpointSelector, FirstAvailable, RoundRobin, SelectError, SelectionStrategy, Strategy,
    UnknownStrategy,
};
pub use service_discovery::{EndpointRegistry, StaticRegistry};
pub use transport::{HyperTransport, Transport, TransportError};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("route not found: {0}")]
    NotFound(String),
    #[error("method not allowed: {0}")]
    MethodNotAllowed(String),
    #[error("invalid configuration: {0}")]
    Config(#[from] MissingPlaceholder),
    #[error(transparent)]
    Client(#[from] ClientError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl CoreError {
    /// HTTP status reported to the inbound caller.
    pub fn status_code(&self) -> u16 {
        match self {
            CoreError::NotFound(_) => 404,
            CoreError::MethodNotAllowed(_) => 405,
            CoreError::Client(ClientError::Unavailable(_)) => 503,
            CoreError::Client(ClientError::Transport { .. }) => 502,
            CoreError::Config(_) | CoreError::Io(_) => 500,
        }
    }
}

/// Handler result: status, body, content type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Response {
    pub status_code: u16,
    pub body: Vec<u8>,
    pub content_type: Option<String>,
}

impl Response {
    pub const TEXT_PLAIN: &'static str = "text/plain; charset=utf-8";

    /// 200 with a plain-text body.
    pub fn text(body: impl Into<String>) -> Self {
        Self {
            status_code: 200,
            body: body.into().into_bytes(),
            content_type: Some(Self::TEXT_PLAIN.to_string()),
        }
    }
}
