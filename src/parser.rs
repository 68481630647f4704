//! Op-trace line parsing
//!
//! The traced runtime writes one line per op lifecycle point:
//!
//! ```text
//! [    29.721] op_bootstrap_no_color                              : Dispatched Slow
//! [    29.721] op_bootstrap_no_color                              : Completed Slow
//! ```
//!
//! Only `]`, `op_`, `:` and the status keywords matter. Column alignment and
//! surrounding whitespace do not.

use std::fmt;
use std::str::FromStr;

/// Op name that is never reported (the runtime emits it constantly)
pub const EXCLUDED_OP: &str = "op_run_microtask";

/// Classification the runtime assigns to an op at dispatch time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpKind {
    Fast,
    Slow,
    Async,
}

impl FromStr for OpKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Fast" => Ok(OpKind::Fast),
            "Slow" => Ok(OpKind::Slow),
            "Async" => Ok(OpKind::Async),
            _ => Err(()),
        }
    }
}

impl fmt::Display for OpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OpKind::Fast => "Fast",
            OpKind::Slow => "Slow",
            OpKind::Async => "Async",
        };
        f.write_str(s)
    }
}

/// A single parsed op-trace line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceEvent {
    /// Raw text between the brackets, untrimmed
    pub timestamp: String,
    /// Op name, e.g. `op_read_file_async`
    pub operation: String,
    /// `true` for a Completed line, `false` for Dispatched
    pub completed: bool,
    pub kind: OpKind,
}

/// Parse one line of runtime stderr.
///
/// Returns `None` for anything that is not a well-formed op-trace line.
pub fn parse_line(line: &str) -> Option<TraceEvent> {
    let timestamp_end = line.find(']')?;
    let timestamp = line.get(1..timestamp_end).unwrap_or_default();

    let rest = &line[timestamp_end..];
    let op_start = rest.find("op_")?;
    let rest = &rest[op_start..];
    let colon = rest.find(':')?;

    let operation = rest[..colon].trim();
    if operation.is_empty() || operation == EXCLUDED_OP {
        return None;
    }

    let status = rest[colon + 1..].trim();
    if status.is_empty() {
        return None;
    }

    let kind: OpKind = status.split_whitespace().nth(1)?.parse().ok()?;

    Some(TraceEvent {
        timestamp: timestamp.to_string(),
        operation: operation.to_string(),
        completed: status.contains("Completed"),
        kind,
    })
}
