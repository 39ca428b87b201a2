//! Line-oriented event trace
//!
//! Engines describe every send, receive, acknowledgement and timeout as one
//! human-readable line handed to a [`TraceSink`]. Without a sink, lines are
//! never formatted.

use parking_lot::Mutex;
use std::sync::Arc;

/// Consumer of trace lines
pub trait TraceSink {
    /// Accept one event line (no trailing newline)
    fn line(&mut self, line: &str);
}

impl TraceSink for Vec<String> {
    fn line(&mut self, line: &str) {
        self.push(line.to_string());
    }
}

impl<T: TraceSink + ?Sized> TraceSink for Box<T> {
    fn line(&mut self, line: &str) {
        (**self).line(line);
    }
}

/// Sinks shared with the caller write through the lock
impl<T: TraceSink + ?Sized> TraceSink for Arc<Mutex<T>> {
    fn line(&mut self, line: &str) {
        self.lock().line(line);
    }
}

/// In-memory trace the caller can read while an engine owns a clone
#[derive(Debug, Clone, Default)]
pub struct SharedTrace(Arc<Mutex<Vec<String>>>);

impl SharedTrace {
    /// Create an empty trace
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every line so far
    pub fn lines(&self) -> Vec<String> {
        self.0.lock().clone()
    }

    /// Number of lines so far
    pub fn len(&self) -> usize {
        self.0.lock().len()
    }

    /// Check if nothing was traced
    pub fn is_empty(&self) -> bool {
        self.0.lock().is_empty()
    }

    /// Count lines starting with `prefix`
    pub fn count_prefixed(&self, prefix: &str) -> usize {
        self.0
            .lock()
            .iter()
            .filter(|line| line.starts_with(prefix))
            .count()
    }

    /// Drop every line
    pub fn clear(&self) {
        self.0.lock().clear();
    }
}

impl TraceSink for SharedTrace {
    fn line(&mut self, line: &str) {
        self.0.lock().push(line.to_string());
    }
}

/// Forwards trace lines to `tracing` at INFO level
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl TraceSink for TracingSink {
    fn line(&mut self, line: &str) {
        tracing::info!(target: "arq::trace", "{}", line);
    }
}

/// Optional sink owned by a transfer
#[derive(Default)]
pub(crate) struct Trace {
    sink: Option<Box<dyn TraceSink>>,
}

impl Trace {
    pub(crate) fn set(&mut self, sink: Option<Box<dyn TraceSink>>) {
        self.sink = sink;
    }

    pub(crate) fn is_enabled(&self) -> bool {
        self.sink.is_some()
    }

    /// Format and write a line, only when a sink is attached
    pub(crate) fn emit<F: FnOnce() -> String>(&mut self, line: F) {
        if let Some(sink) = self.sink.as_mut() {
            sink.line(&line());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec_sink() {
        let mut sink: Vec<String> = Vec::new();
        sink.line("one");
        sink.line("two");
        assert_eq!(sink, vec!["one", "two"]);
    }

    #[test]
    fn test_shared_trace_sees_engine_writes() {
        let trace = SharedTrace::new();
        let mut owned: Box<dyn TraceSink> = Box::new(trace.clone());
        owned.line("Packet #0 sent: 0000");
        owned.line("Packet #0 was lost.");
        assert_eq!(trace.len(), 2);
        assert_eq!(trace.count_prefixed("Packet #0"), 2);
        trace.clear();
        assert!(trace.is_empty());
    }

    #[test]
    fn test_disabled_trace_skips_formatting() {
        let mut trace = Trace::default();
        trace.emit(|| panic!("formatted without a sink"));
        assert!(!trace.is_enabled());
    }

    #[test]
    fn test_locked_sink() {
        let shared = Arc::new(Mutex::new(Vec::<String>::new()));
        let mut handle = shared.clone();
        handle.line("ACK acquired for #0");
        assert_eq!(shared.lock().len(), 1);
    }
}
