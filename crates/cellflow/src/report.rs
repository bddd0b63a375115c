//! Diagnostics sink
//!
//! Cells report conditions that do not (or no longer) surface as errors
//! through a [`Reporter`]. The default [`TracingReporter`] turns them into
//! `tracing` events.

use std::error::Error;

/// Receives evaluation diagnostics
pub trait Reporter {
    /// A cell's candidate was an undefined cell; the evaluation returned
    /// no value
    fn undefined(&self, cell: &str, candidate: &str);

    /// A cell's evaluation failed and the error is being returned
    fn failed(&self, cell: &str, error: &dyn Error);

    /// A failure was swallowed by `Cell::get`
    fn suppressed(&self, cell: &str, error: &dyn Error);
}

/// Reporter that emits `tracing` events
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn undefined(&self, cell: &str, candidate: &str) {
        tracing::warn!(cell, candidate, "undefined cell in resolution chain");
    }

    fn failed(&self, cell: &str, error: &dyn Error) {
        tracing::debug!(cell, error = %error, "evaluation failed");
    }

    fn suppressed(&self, cell: &str, error: &dyn Error) {
        tracing::warn!(cell, error = %error, "evaluation failed, returning no value");
    }
}
