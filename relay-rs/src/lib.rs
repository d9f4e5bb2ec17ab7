//! Relay for Rust: consumer controller and stub provider, configured from the command line.

pub mod config;
pub mod consumer;
pub mod provider;

pub use config::{Cli, Commands, ConsumerArgs, ListenArgs, ProviderArgs};
pub use consumer::ConsumerModule;
pub use provider::ProviderModule;
pub use relay_core::{Application, CoreError};
