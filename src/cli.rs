//! CLI argument parsing for demon

use clap::Parser;
use std::path::PathBuf;

use crate::config::{DEFAULT_RUNTIME, DEFAULT_STDERR_LOG, DEFAULT_STDOUT_LOG};

#[derive(Parser, Debug)]
#[command(name = "demon")]
#[command(version)]
#[command(
    about = "Run a JavaScript runtime with op tracing and show a live op summary table",
    long_about = None
)]
pub struct Cli {
    /// File receiving the child's raw stdout
    #[arg(long, value_name = "PATH", default_value = DEFAULT_STDOUT_LOG)]
    pub stdout: PathBuf,

    /// File receiving the child's raw stderr, op trace included
    #[arg(long, value_name = "PATH", default_value = DEFAULT_STDERR_LOG)]
    pub stderr: PathBuf,

    /// Runtime executable to instrument
    #[arg(
        long,
        value_name = "PROGRAM",
        env = "DEMON_RUNTIME",
        default_value = DEFAULT_RUNTIME
    )]
    pub runtime: String,

    /// Enable debug logging of demon itself
    #[arg(long)]
    pub debug: bool,

    /// Arguments forwarded to the runtime (e.g. `run main.ts`)
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, value_name = "ARGS")]
    pub forward: Vec<String>,
}
