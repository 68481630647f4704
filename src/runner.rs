//! Child process lifecycle
//!
//! Spawns the runtime with op tracing enabled, wires both output pipes and
//! reports the child's exit status as our own.

use anyhow::{Context, Result};
use std::process::{ExitStatus, Stdio};
use tokio::fs::File;
use tokio::process::Command;
use tracing::{debug, error, info};

use crate::aggregate::Aggregator;
use crate::config::DemonConfig;
use crate::supervisor::{self, TracePipe};
use crate::table::{TableSink, TerminalSink};

/// Flag that makes the runtime print one stderr line per op lifecycle point
pub const TRACE_OPS_FLAG: &str = "--strace-ops";

/// Result of a supervised run
#[derive(Debug)]
pub struct RunOutcome<S> {
    /// Exit code to report as our own
    pub exit_code: i32,
    /// Final op counters, if the stderr pipe task finished
    pub aggregator: Option<Aggregator>,
    /// The sink handed to the stderr pipe
    pub sink: Option<S>,
}

/// Build the child command: runtime, op-trace flag, then forwarded arguments
pub fn build_command(config: &DemonConfig) -> Command {
    let mut cmd = Command::new(&config.runtime);
    cmd.arg(TRACE_OPS_FLAG)
        .args(&config.forward)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    cmd
}

/// Map an exit status to a process exit code.
///
/// A child killed by a signal reports `128 + signal`, like a shell would.
pub fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }

    1
}

/// Supervise one child, drawing the live table on stdout
pub async fn run(config: DemonConfig) -> Result<RunOutcome<TerminalSink<std::io::Stdout>>> {
    run_with_sink(config, TerminalSink::stdout()).await
}

/// Supervise one child, drawing the live table on `sink`
pub async fn run_with_sink<S>(config: DemonConfig, sink: S) -> Result<RunOutcome<S>>
where
    S: TableSink + Send + 'static,
{
    let stdout_log = File::create(&config.stdout)
        .await
        .with_context(|| format!("Failed to create {}", config.stdout.display()))?;
    let stderr_log = File::create(&config.stderr)
        .await
        .with_context(|| format!("Failed to create {}", config.stderr.display()))?;

    let mut child = build_command(&config)
        .spawn()
        .with_context(|| format!("Failed to spawn {}", config.runtime))?;
    info!(
        runtime = %config.runtime,
        pid = ?child.id(),
        "child spawned"
    );

    let child_stdout = child
        .stdout
        .take()
        .context("Child stdout was not captured")?;
    let child_stderr = child
        .stderr
        .take()
        .context("Child stderr was not captured")?;

    let stdout_task = tokio::spawn(async move {
        let result = supervisor::pipe_verbatim("stdout", child_stdout, stdout_log).await;
        supervisor::report_outcome("stdout", &result);
    });

    let stderr_task = tokio::spawn(async move {
        let mut pipe = TracePipe::new(sink);
        let result = pipe.run("stderr", child_stderr, stderr_log).await;
        supervisor::report_outcome("stderr", &result);
        debug!(
            lines = pipe.aggregator().lines_seen(),
            events = pipe.aggregator().events_seen(),
            "op trace closed"
        );
        pipe.into_parts()
    });

    let status = child.wait().await.context("Failed to wait for child")?;
    let exit_code = exit_code(status);
    debug!(exit_code, "child exited");

    // The log files are only complete once both pipes have drained
    if let Err(e) = stdout_task.await {
        error!("stdout pipe task failed: {}", e);
    }
    let (aggregator, sink) = match stderr_task.await {
        Ok((aggregator, sink)) => (Some(aggregator), Some(sink)),
        Err(e) => {
            error!("stderr pipe task failed: {}", e);
            (None, None)
        }
    };

    Ok(RunOutcome {
        exit_code,
        aggregator,
        sink,
    })
}
