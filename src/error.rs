//! Error types for the markup-rst library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`ConverterError`]: **Fatal** for the caller that asked: an unknown
//!   format name, an invalid configuration, a host-side task that panicked.
//!   Returned as `Err(ConverterError)` from registry and factory operations.
//!
//! * [`HelperError`]: **Non-fatal**: the external `rst2html` helper could not
//!   run, or ran and complained. It never leaves
//!   [`crate::converter::Converter::convert`] as an `Err`; the converter logs
//!   it through the configured [`crate::logger::Logger`] and degrades the
//!   result instead, so one bad document cannot abort a batch render.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Fatal errors returned by registry, factory and batch operations.
#[derive(Debug, Error)]
pub enum ConverterError {
    /// No provider is registered under the requested name or alias.
    #[error("No converter registered for markup '{name}'\nKnown formats: {known}")]
    UnknownFormat { name: String, known: String },

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A source document could not be read by the host front end.
    #[error("Failed to read source document '{path}': {source}")]
    SourceReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not create or write a rendered HTML file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal failure reported by the external helper.
///
/// Carried inside [`crate::helper::HelperOutcome`] and surfaced only through
/// the diagnostics sink.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HelperError {
    /// Neither of the recognised helper programs is on the search path.
    #[error(
        "none of {programs:?} found on PATH; \
         install docutils (pip install docutils) to render reStructuredText"
    )]
    NotInstalled { programs: Vec<String> },

    /// The helper started but its Python runtime lacks a required package.
    #[error("rst helper is missing a Python dependency: {detail}")]
    MissingModule { detail: String },

    /// The helper program could not be started.
    #[error("failed to start '{program}': {detail}")]
    Spawn { program: String, detail: String },

    /// Feeding stdin or collecting stdout/stderr failed.
    #[error("I/O error talking to rst helper: {0}")]
    Io(String),

    /// The helper exited unsuccessfully.
    #[error("rst helper exited with {status}: {stderr}")]
    Failed { status: String, stderr: String },

    /// The helper finished but reported error-level problems in the source.
    #[error("rst helper reported problems: {0}")]
    Reported(String),

    /// The helper ran past the configured timeout and was killed.
    #[error("rst helper timed out after {}s", .after.as_secs())]
    Timeout { after: Duration },

    /// Any other error reported by a custom helper bridge.
    #[error("{0}")]
    Other(String),
}

impl HelperError {
    /// Whether this error means the helper's own dependencies are absent,
    /// as opposed to the helper rejecting this particular document.
    pub fn is_dependency_missing(&self) -> bool {
        matches!(
            self,
            HelperError::NotInstalled { .. }
                | HelperError::MissingModule { .. }
                | HelperError::Spawn { .. }
        )
    }
}

impl From<std::io::Error> for HelperError {
    fn from(e: std::io::Error) -> Self {
        HelperError::Io(e.to_string())
    }
}
