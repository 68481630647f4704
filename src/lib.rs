//! demon - live op-trace summary for an instrumented JavaScript runtime
//!
//! This library wraps a runtime started with `--strace-ops`, keeps its raw
//! stdout and stderr in log files, and turns the op trace on stderr into a
//! continuously redrawn summary table.

pub mod aggregate;
pub mod cli;
pub mod config;
pub mod parser;
pub mod runner;
pub mod supervisor;
pub mod table;
