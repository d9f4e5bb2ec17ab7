//! Data model: logical service names and concrete endpoints.

use std::fmt;
use std::str::FromStr;

use http::uri::Authority;
use thiserror::Error;

/// Logical name under which provider instances register (e.g. "service-provider").
#[derive(Clone, Debug, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct ServiceName(String);

impl ServiceName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }
}

impl fmt::Display for ServiceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One instance of a logical service: host and port.
#[derive(Clone, Debug, Hash, Eq, PartialEq)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
}

impl Endpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum EndpointParseError {
    #[error("endpoint {0:?} is not in host:port form")]
    MissingPort(String),
    #[error("endpoint {0:?} has an empty host")]
    EmptyHost(String),
    #[error("endpoint {0:?} has an invalid port")]
    InvalidPort(String),
    #[error("endpoint {0:?} is not a valid URI authority (IPv6 hosts need brackets)")]
    InvalidHost(String),
}

impl FromStr for Endpoint {
    type Err = EndpointParseError;

    /// Parses `host:port` or `[v6]:port`. The last `:` separates the port; the whole
    /// string must be a URI authority without userinfo.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (host, port) = s
            .rsplit_once(':')
            .ok_or_else(|| EndpointParseError::MissingPort(s.to_owned()))?;
        if host.is_empty() {
            return Err(EndpointParseError::EmptyHost(s.to_owned()));
        }
        let port = port
            .parse::<u16>()
            .map_err(|_| EndpointParseError::InvalidPort(s.to_owned()))?;
        let authority = s
            .parse::<Authority>()
            .map_err(|_| EndpointParseError::InvalidHost(s.to_owned()))?;
        if authority.host() != host {
            return Err(EndpointParseError::InvalidHost(s.to_owned()));
        }
        Ok(Self::new(host, port))
    }
}
