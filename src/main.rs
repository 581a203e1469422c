use clap::Parser;
use kube_audit::{EXIT_THRESHOLD, cli::Cli, config, run_command};
use std::process;

#[tokio::main]
async fn main() {
    match run().await {
        Ok(false) => {}
        Ok(true) => process::exit(EXIT_THRESHOLD),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

async fn run() -> kube_audit::Result<bool> {
    let cli = Cli::parse();

    // Initialize logging
    cli.init_logging();

    // Load configuration
    let cwd = std::env::current_dir().ok();
    let config = config::load_config(cli.config.as_deref(), cwd.as_deref())?;

    run_command(cli.command, &config).await
}
