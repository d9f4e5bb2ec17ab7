//! CLI for relay: run the load-balanced consumer or a stub provider.

use clap::Parser;
use relay_rs::{consumer, provider, Cli, Commands};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Consumer(args) => {
            let app = consumer::build_app(&args)?;
            app.run(&args.listen.host, args.port())
        }
        Commands::Provider(args) => {
            let app = provider::build_app(&args)?;
            app.run(&args.listen.host, args.port())
        }
    }
}
