//! Command line and environment configuration.
//! Host/port: `--host`/`--port`, else env HOST/PORT, else the per-command default.

use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use relay_core::{Endpoint, MissingPlaceholder, RemotePaths, ServiceName, Strategy};

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_CONSUMER_PORT: u16 = 8000;
pub const DEFAULT_PROVIDER_PORT: u16 = 8001;

#[derive(Parser, Debug)]
#[command(name = "relay")]
#[command(about = "Load-balanced forwarding consumer and stub provider")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Serve /feign/get/{value} and /feign/port, forwarding to the provider service.
    Consumer(ConsumerArgs),
    /// Serve a stub provider instance (/provide/{value}, /ribbon).
    Provider(ProviderArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ListenArgs {
    /// Address to bind.
    #[arg(long, env = "HOST", default_value = DEFAULT_HOST)]
    pub host: String,
    /// Port to bind.
    #[arg(long, env = "PORT")]
    pub port: Option<u16>,
}

#[derive(Args, Debug, Clone)]
pub struct ConsumerArgs {
    #[command(flatten)]
    pub listen: ListenArgs,
    /// Logical name of the provider service.
    #[arg(long, default_value = "service-provider")]
    pub service: String,
    /// Provider instance as host:port. Repeat or comma-separate for several.
    #[arg(long = "endpoint", env = "RELAY_ENDPOINTS", value_delimiter = ',', required = true)]
    pub endpoints: Vec<Endpoint>,
    /// Selection strategy: round-robin or first.
    #[arg(long, default_value_t = Strategy::RoundRobin)]
    pub strategy: Strategy,
    /// Per-request timeout for calls to the provider.
    #[arg(long, default_value_t = 5000, value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout_ms: u64,
    /// Provider path for forwarded values; must contain `{value}`, which is substituted.
    #[arg(long, default_value = "/provide/{value}", value_parser = parse_provide_path)]
    pub provide_path: String,
    /// Provider path that answers with the instance identifier.
    #[arg(long, default_value = "/ribbon")]
    pub ribbon_path: String,
}

impl ConsumerArgs {
    pub fn port(&self) -> u16 {
        self.listen.port.unwrap_or(DEFAULT_CONSUMER_PORT)
    }

    pub fn service_name(&self) -> ServiceName {
        ServiceName::new(self.service.clone())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn remote_paths(&self) -> Result<RemotePaths, MissingPlaceholder> {
        RemotePaths::new(self.provide_path.clone(), self.ribbon_path.clone())
    }
}

fn parse_provide_path(s: &str) -> Result<String, MissingPlaceholder> {
    RemotePaths::check_provide(s.to_owned())
}

#[derive(Args, Debug, Clone)]
pub struct ProviderArgs {
    #[command(flatten)]
    pub listen: ListenArgs,
    /// Identifier reported on /ribbon. Defaults to host:port.
    #[arg(long)]
    pub advertise: Option<Endpoint>,
}

impl ProviderArgs {
    pub fn port(&self) -> u16 {
        self.listen.port.unwrap_or(DEFAULT_PROVIDER_PORT)
    }

    pub fn advertised(&self) -> Endpoint {
        self.advertise
            .clone()
            .unwrap_or_else(|| Endpoint::new(self.listen.host.clone(), self.port()))
    }
}
