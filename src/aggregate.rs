//! Per-op counters for the live summary table
//!
//! Counters are updated as each event arrives. A snapshot is equivalent to
//! refolding the whole event history in arrival order.

use std::collections::HashMap;

use crate::parser::{self, OpKind, TraceEvent};

/// Raw counters for a single op name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct OpCounters {
    pub dispatched: u64,
    pub completed: u64,
    pub fast: u64,
    pub slow: u64,
    pub async_: u64,
}

impl OpCounters {
    fn record(&mut self, event: &TraceEvent) {
        if event.completed {
            self.completed += 1;
            return;
        }

        self.dispatched += 1;
        match event.kind {
            OpKind::Fast => self.fast += 1,
            OpKind::Slow => self.slow += 1,
            OpKind::Async => self.async_ += 1,
        }
    }
}

/// One row of the summary table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateRow {
    pub operation: String,
    pub dispatched: u64,
    pub completed: u64,
    /// Dispatched but not yet completed, floored at zero
    pub pending: u64,
    pub fast: u64,
    pub slow: u64,
    pub async_: u64,
}

/// Tracks op activity for the lifetime of the traced process
#[derive(Debug, Default)]
pub struct Aggregator {
    ops: HashMap<String, OpCounters>,
    /// Op names in the order of their first Dispatched event
    dispatch_order: Vec<String>,
    lines_seen: u64,
    events_seen: u64,
}

impl Aggregator {
    /// Create an empty aggregator
    pub fn new() -> Self {
        Self::default()
    }

    /// Account for one stderr line; `None` marks a line that was not an event
    pub fn ingest(&mut self, event: Option<TraceEvent>) {
        self.lines_seen += 1;
        let Some(event) = event else {
            return;
        };
        self.events_seen += 1;

        let counters = self.ops.entry(event.operation.clone()).or_default();
        if !event.completed && counters.dispatched == 0 {
            self.dispatch_order.push(event.operation.clone());
        }
        counters.record(&event);
    }

    /// Parse a raw line and ingest the result
    pub fn ingest_line(&mut self, line: &str) {
        self.ingest(parser::parse_line(line));
    }

    /// Build the summary table, busiest op first.
    ///
    /// Ops that were only ever seen completing are left out. Ties keep the
    /// order in which ops were first dispatched.
    pub fn snapshot(&self) -> Vec<AggregateRow> {
        let mut rows: Vec<AggregateRow> = self
            .dispatch_order
            .iter()
            .filter_map(|name| {
                let counters = self.ops.get(name)?;
                Some(AggregateRow {
                    operation: name.clone(),
                    dispatched: counters.dispatched,
                    completed: counters.completed,
                    pending: counters.dispatched.saturating_sub(counters.completed),
                    fast: counters.fast,
                    slow: counters.slow,
                    async_: counters.async_,
                })
            })
            .collect();

        rows.sort_by(|a, b| b.dispatched.cmp(&a.dispatched));
        rows
    }

    /// Number of lines ingested, events or not
    pub fn lines_seen(&self) -> u64 {
        self.lines_seen
    }

    /// Number of lines that parsed as op-trace events
    pub fn events_seen(&self) -> u64 {
        self.events_seen
    }

    /// True when no op has been dispatched yet
    pub fn is_empty(&self) -> bool {
        self.dispatch_order.is_empty()
    }
}
