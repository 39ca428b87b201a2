//! Trace sinks backed by writers
//!
//! The engines treat their sink as infallible. A writer sink therefore keeps
//! the first I/O error to itself, stops writing, and hands the error back
//! when the driver finishes.

use arq_protocol::TraceSink;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// Trace sink appending lines to any writer
#[derive(Debug)]
pub struct WriterTrace<W: Write> {
    writer: W,
    lines: u64,
    error: Option<io::Error>,
}

/// Trace sink writing to a file
pub type FileTrace = WriterTrace<BufWriter<File>>;

impl FileTrace {
    /// Create (or truncate) a trace file
    pub fn create<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        Ok(WriterTrace::new(BufWriter::new(File::create(path)?)))
    }
}

impl<W: Write> WriterTrace<W> {
    /// Wrap a writer
    pub fn new(writer: W) -> Self {
        WriterTrace {
            writer,
            lines: 0,
            error: None,
        }
    }

    /// Lines written successfully
    pub fn lines(&self) -> u64 {
        self.lines
    }

    /// Flush, surfacing the first error seen while tracing
    pub fn finish(&mut self) -> io::Result<()> {
        if let Some(error) = self.error.take() {
            return Err(error);
        }
        self.writer.flush()
    }

    /// Unwrap the writer
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> TraceSink for WriterTrace<W> {
    fn line(&mut self, line: &str) {
        if self.error.is_some() {
            return;
        }
        match writeln!(self.writer, "{}", line) {
            Ok(()) => self.lines += 1,
            Err(error) => {
                tracing::error!("Trace write failed: {}", error);
                self.error = Some(error);
            }
        }
    }
}
