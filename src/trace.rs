//! Per-call trace sinks
//!
//! `parse_with` and `serialize_with` take a `&mut dyn TraceSink` so a caller
//! can observe one message without touching process-wide state.

use std::fmt;

/// Pipeline stage a trace record comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceStage {
    /// Tokenizer event consumed by the builder
    Event,
    /// Folding rule fired on an end tag
    Fold,
    /// Element written by the serializer
    Write,
}

impl fmt::Display for TraceStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TraceStage::Event => "event",
            TraceStage::Fold => "fold",
            TraceStage::Write => "write",
        })
    }
}

/// Receiver of trace records
pub trait TraceSink {
    /// Records are only formatted when this returns true
    fn enabled(&self) -> bool {
        true
    }

    fn record(&mut self, stage: TraceStage, message: fmt::Arguments<'_>);
}

/// Discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoTrace;

impl TraceSink for NoTrace {
    fn enabled(&self) -> bool {
        false
    }

    fn record(&mut self, _stage: TraceStage, _message: fmt::Arguments<'_>) {}
}

/// Forwards records to `tracing` at trace level
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl TraceSink for TracingSink {
    fn enabled(&self) -> bool {
        tracing::enabled!(tracing::Level::TRACE)
    }

    fn record(&mut self, stage: TraceStage, message: fmt::Arguments<'_>) {
        tracing::trace!(%stage, "{}", message);
    }
}

/// Keeps every record as a `stage: message` line
#[derive(Debug, Default, Clone)]
pub struct RecordingSink {
    pub lines: Vec<String>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lines recorded for one stage, without the prefix
    pub fn stage(&self, stage: TraceStage) -> Vec<&str> {
        let prefix = format!("{}: ", stage);
        self.lines
            .iter()
            .filter_map(|line| line.strip_prefix(prefix.as_str()))
            .collect()
    }
}

impl TraceSink for RecordingSink {
    fn record(&mut self, stage: TraceStage, message: fmt::Arguments<'_>) {
        self.lines.push(format!("{}: {}", stage, message));
    }
}
