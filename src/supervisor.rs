//! Child output piping
//!
//! Two independent copy loops run per child:
//! - stdout is copied verbatim to its log file
//! - stderr is split into lines, fed to the [`Aggregator`], rendered after
//!   every chunk, and also copied verbatim to its log file
//!
//! A failing log file is logged and closed, and the child's output is still
//! drained so the child never sees a broken pipe.

use std::io;

use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, error, trace, warn};

use crate::aggregate::Aggregator;
use crate::parser;
use crate::table::TableSink;

const CHUNK_SIZE: usize = 8 * 1024;

#[derive(Error, Debug)]
pub enum PipeError {
    #[error("Failed to read child {stream}: {source}")]
    Read {
        stream: &'static str,
        #[source]
        source: io::Error,
    },

    #[error("Failed to write {stream} log: {source}")]
    Write {
        stream: &'static str,
        #[source]
        source: io::Error,
    },

    #[error("Failed to flush {stream} log: {source}")]
    Flush {
        stream: &'static str,
        #[source]
        source: io::Error,
    },
}

/// What a pipe moved before its source closed
#[derive(Debug, Default)]
pub struct PipeReport {
    /// Bytes read from the child
    pub bytes_read: u64,
    /// Bytes known to have reached the log file
    pub bytes_logged: u64,
    pub chunks: u64,
    /// Why the log file was closed early, if it was
    pub log_error: Option<PipeError>,
}

/// Splits a byte stream into lines, holding back an unterminated tail
/// until the next chunk (or end of stream) completes it.
#[derive(Debug, Default)]
pub struct LineSplitter {
    pending: Vec<u8>,
}

impl LineSplitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk, returning every line it completes (without `\n`)
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        let mut lines = Vec::new();
        let mut rest = chunk;

        while let Some(pos) = rest.iter().position(|&b| b == b'\n') {
            self.pending.extend_from_slice(&rest[..pos]);
            lines.push(String::from_utf8_lossy(&self.pending).into_owned());
            self.pending.clear();
            rest = &rest[pos + 1..];
        }
        self.pending.extend_from_slice(rest);

        lines
    }

    /// Take the unterminated tail left at end of stream, if any
    pub fn finish(&mut self) -> Option<String> {
        if self.pending.is_empty() {
            return None;
        }
        let line = String::from_utf8_lossy(&self.pending).into_owned();
        self.pending.clear();
        Some(line)
    }
}

/// Write one chunk and make sure it landed.
///
/// `tokio::fs::File` hands writes to a background thread and reports a
/// failed write on the next operation, so the flush is what surfaces it.
async fn log_chunk<W>(stream: &'static str, writer: &mut W, chunk: &[u8]) -> Result<(), PipeError>
where
    W: AsyncWrite + Unpin,
{
    writer
        .write_all(chunk)
        .await
        .map_err(|source| PipeError::Write { stream, source })?;
    writer
        .flush()
        .await
        .map_err(|source| PipeError::Flush { stream, source })
}

/// Read `reader` to the end, handing each chunk to `on_chunk` before it is
/// written to `writer`.
///
/// A log failure closes the log file but never stops the reading: the child
/// keeps its pipe until it closes it. Only a read error ends the loop early.
async fn copy_chunks<R, W, F>(
    stream: &'static str,
    reader: &mut R,
    writer: W,
    mut on_chunk: F,
) -> Result<PipeReport, PipeError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
    F: FnMut(&[u8]),
{
    let mut report = PipeReport::default();
    let mut log = Some(writer);
    let mut buf = vec![0u8; CHUNK_SIZE];

    loop {
        let n = reader
            .read(&mut buf)
            .await
            .map_err(|source| PipeError::Read { stream, source })?;
        if n == 0 {
            break;
        }

        let chunk = &buf[..n];
        on_chunk(chunk);
        report.bytes_read += n as u64;
        report.chunks += 1;

        let Some(writer) = log.as_mut() else {
            continue;
        };
        match log_chunk(stream, writer, chunk).await {
            Ok(()) => {
                report.bytes_logged += n as u64;
                trace!(stream, bytes = n, "chunk copied");
            }
            Err(e) => {
                error!(stream, "{}; log closed, still draining the child", e);
                report.log_error = Some(e);
                log = None;
            }
        }
    }

    Ok(report)
}

/// Copy a child stream to its log file unmodified
pub async fn pipe_verbatim<R, W>(
    stream: &'static str,
    mut reader: R,
    writer: W,
) -> Result<PipeReport, PipeError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    copy_chunks(stream, &mut reader, writer, |_| {}).await
}

/// The intercepting side of the supervisor: owns the aggregator and the sink
/// for as long as the child's stderr is open.
pub struct TracePipe<S: TableSink> {
    aggregator: Aggregator,
    splitter: LineSplitter,
    sink: S,
    render_failed: bool,
}

impl<S: TableSink> TracePipe<S> {
    pub fn new(sink: S) -> Self {
        Self {
            aggregator: Aggregator::new(),
            splitter: LineSplitter::new(),
            sink,
            render_failed: false,
        }
    }

    pub fn aggregator(&self) -> &Aggregator {
        &self.aggregator
    }

    pub fn into_parts(self) -> (Aggregator, S) {
        (self.aggregator, self.sink)
    }

    /// Parse every line the chunk completes, then redraw the table
    pub fn process_chunk(&mut self, chunk: &[u8]) {
        for line in self.splitter.push(chunk) {
            self.aggregator.ingest(parser::parse_line(&line));
        }
        self.render();
    }

    /// Account for a trailing line that never got its newline
    pub fn finish(&mut self) {
        if let Some(line) = self.splitter.finish() {
            self.aggregator.ingest(parser::parse_line(&line));
            self.render();
        }
    }

    fn render(&mut self) {
        if self.aggregator.is_empty() {
            return;
        }
        let rows = self.aggregator.snapshot();
        if let Err(e) = self.sink.render(&rows) {
            // A broken terminal must not stop the log copy
            if !self.render_failed {
                warn!("Failed to render op table: {}", e);
                self.render_failed = true;
            }
        }
    }

    /// Drive the pipe until `reader` closes or fails
    pub async fn run<R, W>(
        &mut self,
        stream: &'static str,
        mut reader: R,
        writer: W,
    ) -> Result<PipeReport, PipeError>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let result =
            copy_chunks(stream, &mut reader, writer, |chunk| self.process_chunk(chunk)).await;
        if result.is_ok() {
            self.finish();
        }
        result
    }
}

/// Log the outcome of a finished pipe. Failures stop here.
pub fn report_outcome(stream: &'static str, result: &Result<PipeReport, PipeError>) {
    match result {
        Ok(report) => debug!(
            stream,
            bytes_read = report.bytes_read,
            bytes_logged = report.bytes_logged,
            chunks = report.chunks,
            log_failed = report.log_error.is_some(),
            "pipe closed"
        ),
        Err(e) => error!(stream, "{}", e),
    }
}
