//! Diagnostics sink handed to converters through [`crate::config::ProviderConfig`].
//!
//! Conversion failures never travel through the `Err` channel, so this sink is
//! the only place they become visible. The host decides where they go:
//!
//! * [`TracingLogger`] (the default) forwards to the `tracing` macros under the
//!   `markup_rst` target, so a host that already installed a subscriber sees
//!   them alongside everything else.
//! * [`CapturingLogger`] keeps every entry in memory so a host can report
//!   per-document problems after a batch run, or a test can count them.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, Mutex};

/// Leveled write operations used by converters.
///
/// Implementations must be `Send + Sync`: a single config (and therefore a
/// single logger) is shared by every converter of a batch, and those may run
/// on different threads.
pub trait Logger: Send + Sync {
    fn error(&self, msg: &str);

    fn warn(&self, msg: &str);
}

/// Severity of a captured diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Warn,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Warn => f.write_str("WARN"),
            LogLevel::Error => f.write_str("ERROR"),
        }
    }
}

/// One captured diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub level: LogLevel,
    pub message: String,
}

/// Forwards diagnostics to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn error(&self, msg: &str) {
        tracing::error!(target: "markup_rst", "{}", msg);
    }

    fn warn(&self, msg: &str) {
        tracing::warn!(target: "markup_rst", "{}", msg);
    }
}

/// Records diagnostics in memory.
///
/// Cloning shares the underlying buffer.
#[derive(Debug, Default, Clone)]
pub struct CapturingLogger {
    entries: Arc<Mutex<Vec<LogEntry>>>,
}

impl CapturingLogger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything logged so far, in order.
    pub fn entries(&self) -> Vec<LogEntry> {
        self.lock().clone()
    }

    /// Messages logged at the given level.
    pub fn messages(&self, level: LogLevel) -> Vec<String> {
        self.lock()
            .iter()
            .filter(|e| e.level == level)
            .map(|e| e.message.clone())
            .collect()
    }

    pub fn count(&self, level: LogLevel) -> usize {
        self.lock().iter().filter(|e| e.level == level).count()
    }

    /// Drain the buffer, returning what it held.
    pub fn take(&self) -> Vec<LogEntry> {
        std::mem::take(&mut *self.lock())
    }

    fn record(&self, level: LogLevel, msg: &str) {
        self.lock().push(LogEntry {
            level,
            message: msg.to_string(),
        });
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<LogEntry>> {
        // A panic while holding the lock cannot leave a Vec half-pushed.
        self.entries.lock().unwrap_or_else(|p| p.into_inner())
    }
}

impl Logger for CapturingLogger {
    fn error(&self, msg: &str) {
        self.record(LogLevel::Error, msg);
    }

    fn warn(&self, msg: &str) {
        self.record(LogLevel::Warn, msg);
    }
}

/// Shared handle stored in [`crate::config::ProviderConfig`].
pub type SharedLogger = Arc<dyn Logger>;
