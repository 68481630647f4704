//! Run configuration handed from the CLI to the runner

use std::path::PathBuf;

use crate::cli::Cli;

pub const DEFAULT_STDOUT_LOG: &str = "stdout.log";
pub const DEFAULT_STDERR_LOG: &str = "stderr.log";
pub const DEFAULT_RUNTIME: &str = "deno";

/// Everything the runner needs to supervise one child
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DemonConfig {
    /// Where the child's raw stdout is written
    pub stdout: PathBuf,
    /// Where the child's raw stderr (including the op trace) is written
    pub stderr: PathBuf,
    /// Executable started with the op-trace flag
    pub runtime: String,
    /// Arguments passed through to the child after the op-trace flag
    pub forward: Vec<String>,
}

impl Default for DemonConfig {
    fn default() -> Self {
        Self {
            stdout: PathBuf::from(DEFAULT_STDOUT_LOG),
            stderr: PathBuf::from(DEFAULT_STDERR_LOG),
            runtime: DEFAULT_RUNTIME.to_string(),
            forward: Vec::new(),
        }
    }
}

impl From<Cli> for DemonConfig {
    fn from(cli: Cli) -> Self {
        Self {
            stdout: cli.stdout,
            stderr: cli.stderr,
            runtime: cli.runtime,
            forward: cli.forward,
        }
    }
}
