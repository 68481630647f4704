use anyhow::{Context, Result};
use clap::Parser;
use demon::{cli::Cli, config::DemonConfig, runner};
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber; `--debug` turns on everything
fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::from_default_env().add_directive(tracing::Level::TRACE.into())
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let args = Cli::parse();

    init_tracing(args.debug);

    let config = DemonConfig::from(args);

    let runtime = tokio::runtime::Runtime::new().context("Failed to create Tokio runtime")?;
    let outcome = runtime.block_on(runner::run(config))?;
    drop(runtime);

    println!("Child process exited with status {}", outcome.exit_code);

    // Exit with the traced program's exit code
    std::process::exit(outcome.exit_code);
}
