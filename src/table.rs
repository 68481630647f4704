//! Live summary table rendering
//!
//! The column set is fixed. Each column is as wide as its longest value or
//! its header label, whichever is longer.

use std::io::{self, Write};

use crossterm::{
    cursor::MoveTo,
    queue,
    style::{Print, Stylize},
    terminal::{Clear, ClearType},
};

use crate::aggregate::AggregateRow;

/// Column labels, in display order
pub const COLUMNS: [&str; 7] = [
    "operation",
    "dispatched",
    "completed",
    "pending",
    "fast",
    "slow",
    "async",
];

const SEPARATOR: &str = " | ";

fn fields(row: &AggregateRow) -> [String; 7] {
    [
        row.operation.clone(),
        row.dispatched.to_string(),
        row.completed.to_string(),
        row.pending.to_string(),
        row.fast.to_string(),
        row.slow.to_string(),
        row.async_.to_string(),
    ]
}

/// Column widths computed from a set of rows
#[derive(Debug, Clone, PartialEq, Eq)]
struct TableLayout {
    widths: [usize; 7],
}

impl TableLayout {
    /// Measure every column across `rows`
    fn measure(rows: &[AggregateRow]) -> Self {
        let mut widths = COLUMNS.map(str::len);
        for row in rows {
            for (width, field) in widths.iter_mut().zip(fields(row)) {
                *width = (*width).max(field.len());
            }
        }
        Self { widths }
    }

    fn join<S: AsRef<str>>(&self, cells: impl IntoIterator<Item = S>) -> String {
        cells
            .into_iter()
            .zip(self.widths)
            .map(|(cell, width)| format!("{:<width$}", cell.as_ref(), width = width))
            .collect::<Vec<_>>()
            .join(SEPARATOR)
    }

    /// Header line with padded column labels
    fn header(&self) -> String {
        self.join(COLUMNS)
    }

    /// One padded data line
    fn row(&self, row: &AggregateRow) -> String {
        self.join(fields(row))
    }
}

/// Format rows as plain text, header first. `None` when there is nothing to show.
pub fn render_table(rows: &[AggregateRow]) -> Option<String> {
    if rows.is_empty() {
        return None;
    }

    let layout = TableLayout::measure(rows);
    let mut out = layout.header();
    out.push('\n');
    for row in rows {
        out.push_str(&layout.row(row));
        out.push('\n');
    }
    Some(out)
}

/// Destination for rendered snapshots
pub trait TableSink {
    /// Replace whatever was shown before with `rows`.
    ///
    /// An empty row set must not produce any output.
    fn render(&mut self, rows: &[AggregateRow]) -> io::Result<()>;
}

/// Redraws the table on a terminal: clear screen, bold header, rows.
#[derive(Debug)]
pub struct TerminalSink<W: Write> {
    out: W,
}

impl TerminalSink<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> TerminalSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> TableSink for TerminalSink<W> {
    fn render(&mut self, rows: &[AggregateRow]) -> io::Result<()> {
        let Some(text) = render_table(rows) else {
            return Ok(());
        };
        let (header, body) = text.split_once('\n').unwrap_or((text.as_str(), ""));

        queue!(
            self.out,
            Clear(ClearType::All),
            MoveTo(0, 0),
            Print(header.bold()),
            Print("\n"),
            Print(body)
        )?;
        self.out.flush()
    }
}
