//! Remote service client: resolve the service through the selector, call the chosen endpoint.

use std::sync::Arc;

use thiserror::Error;

use crate::endpoint::{Endpoint, ServiceName};
use crate::selector::{EndpointSelector, SelectError};
use crate::transport::{Transport, TransportError};

#[derive(Error, Debug)]
pub enum ClientError {
    /// Resolution failed; nothing was sent.
    #[error("service unavailable: {0}")]
    Unavailable(#[from] SelectError),
    #[error("call to {endpoint} failed: {source}")]
    Transport {
        endpoint: Endpoint,
        #[source]
        source: TransportError,
    },
}

#[derive(Error, Debug, PartialEq, Eq)]
#[error("provide path {0:?} has no {{value}} placeholder")]
pub struct MissingPlaceholder(pub String);

/// Paths on the provider side. `{value}` in `provide` is replaced by the encoded value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RemotePaths {
    provide: String,
    ribbon: String,
}

impl RemotePaths {
    pub const VALUE_PLACEHOLDER: &'static str = "{value}";

    /// Fails when `provide` cannot carry the forwarded value.
    pub fn new(
        provide: impl Into<String>,
        ribbon: impl Into<String>,
    ) -> Result<Self, MissingPlaceholder> {
        let provide = Self::check_provide(provide.into())?;
        Ok(Self {
            provide,
            ribbon: ribbon.into(),
        })
    }

    pub fn check_provide(provide: String) -> Result<String, MissingPlaceholder> {
        if provide.contains(Self::VALUE_PLACEHOLDER) {
            Ok(provide)
        } else {
            Err(MissingPlaceholder(provide))
        }
    }

    pub fn provide(&self) -> &str {
        &self.provide
    }

    pub fn ribbon(&self) -> &str {
        &self.ribbon
    }

    fn provide_path(&self, value: &str) -> String {
        self.provide
            .replace(Self::VALUE_PLACEHOLDER, &urlencoding::encode(value))
    }
}

impl Default for RemotePaths {
    fn default() -> Self {
        Self {
            provide: "/provide/{value}".to_string(),
            ribbon: "/ribbon".to_string(),
        }
    }
}

/// Client for one logical service. No retry, no caching: every call selects and sends once.
pub struct RemoteServiceClient {
    service: ServiceName,
    selector: Arc<EndpointSelector>,
    transport: Arc<dyn Transport>,
    paths: RemotePaths,
}

impl RemoteServiceClient {
    pub fn new(
        service: ServiceName,
        selector: Arc<EndpointSelector>,
        transport: Arc<dyn Transport>,
        paths: RemotePaths,
    ) -> Self {
        Self {
            service,
            selector,
            transport,
            paths,
        }
    }

    pub fn service(&self) -> &ServiceName {
        &self.service
    }

    /// Forward `value` to the provider and return its body unchanged.
    pub async fn provide(&self, value: &str) -> Result<String, ClientError> {
        let path = self.paths.provide_path(value);
        self.call(&path).await
    }

    /// Ask the selected instance to identify itself; shows how calls spread across instances.
    pub async fn ribbon(&self) -> Result<String, ClientError> {
        self.call(&self.paths.ribbon).await
    }

    async fn call(&self, path: &str) -> Result<String, ClientError> {
        let endpoint = self.selector.select(&self.service).map_err(|e| {
            tracing::warn!(service = %self.service, error = %e, "no endpoint to call");
            ClientError::Unavailable(e)
        })?;
        tracing::debug!(service = %self.service, %endpoint, path, "forwarding request");
        match self.transport.get(&endpoint, path).await {
            Ok(body) => Ok(body),
            Err(source) => {
                tracing::warn!(
                    service = %self.service,
                    %endpoint,
                    path,
                    error = %source,
                    "remote call failed"
                );
                Err(ClientError::Transport { endpoint, source })
            }
        }
    }
}
