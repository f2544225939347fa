use std::path::PathBuf;

use clap::Parser;

use server_runner::demo;
use server_runner::lifecycle::startup::{self, StartupOptions};

#[derive(Parser)]
#[command(name = "server-runner")]
#[command(about = "Serve the demo handlers through the server runner", long_about = None)]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to listen on; repeat for several listeners.
    #[arg(short, long = "bind")]
    bind: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = startup::load(&StartupOptions {
        config_path: cli.config,
        bind_addresses: cli.bind,
    })?;
    startup::init_observability(&config);

    tracing::info!(
        bind_addresses = ?config.listener.bind_addresses,
        request_timeout_secs = config.timeouts.request_secs,
        discovery_verb = %config.discovery.verb,
        "server-runner v0.1.0 starting"
    );

    let runner = demo::runner(config)?;
    runner.run(Vec::<String>::new()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
