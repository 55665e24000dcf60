//! Diagnostic sink injected into the client.
//!
//! Messages sent here are advisory; nothing the sink does feeds back into
//! control flow.

use std::fmt;

/// Receives warning and error lines from the client.
pub trait Diagnostics: fmt::Debug + Send + Sync {
    fn warn(&self, message: &str);
    fn error(&self, message: &str);
}

/// Forwards diagnostics to the `tracing` facade under the `cfn_core` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingDiagnostics;

impl Diagnostics for TracingDiagnostics {
    fn warn(&self, message: &str) {
        tracing::warn!(target: "cfn_core", "{message}");
    }

    fn error(&self, message: &str) {
        tracing::error!(target: "cfn_core", "{message}");
    }
}
