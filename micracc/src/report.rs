//! Report sink
//!
//! The classification engine emits its final report through an injected
//! `Reporter` rather than writing to an ambient global, so tests can
//! capture output and the binary can route it through tracing.

/// Destination for human-readable report lines
pub trait Reporter {
    fn line(&self, text: &str);
}

/// Reporter that forwards lines to the tracing subscriber at info level
#[derive(Debug, Default)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn line(&self, text: &str) {
        tracing::info!("{}", text);
    }
}
