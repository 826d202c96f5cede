//! The external helper that actually turns reStructuredText into HTML.
//!
//! Nothing in this crate parses RST. The work is delegated to docutils'
//! `rst2html` program, and this module only defines how a converter talks to
//! it and how it classifies what comes back.
//!
//! ## Submodules
//!
//! 1. [`probe`]: is the helper on PATH at all? (no conversion performed)
//! 2. [`process`]: run it as a child process with stdin/stdout pipes
//! 3. [`body`]: cut the `<body>` fragment out of the full HTML page it prints
//!
//! ## Outcome classes
//!
//! A helper hands back an optional output and an optional error, independently.
//! [`HelperOutcome`] folds that pair into four variants so the converter has to
//! handle each one explicitly.

pub mod body;
pub mod probe;
pub mod process;

use crate::error::HelperError;

pub use probe::{locate, locate_in, supports, supports_in};
pub use process::ExternalHelper;

/// Something that can convert RST source bytes to HTML bytes.
///
/// Implementations block until the conversion is done. They must be
/// `Send + Sync`: one helper is shared by every converter a provider creates.
pub trait RstHelper: Send + Sync {
    fn convert_from_rst(&self, src: &[u8]) -> HelperOutcome;
}

impl<F> RstHelper for F
where
    F: Fn(&[u8]) -> HelperOutcome + Send + Sync,
{
    fn convert_from_rst(&self, src: &[u8]) -> HelperOutcome {
        self(src)
    }
}

/// What one helper invocation produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HelperOutcome {
    /// Output, no error.
    Success(Vec<u8>),
    /// No output, and an error explaining why (usually a missing install).
    DependencyError(HelperError),
    /// No output and no explanation.
    UnknownFailure,
    /// Output, but the helper also reported a problem.
    PartialSuccess(Vec<u8>, HelperError),
}

impl HelperOutcome {
    /// Classify an independent (output, error) pair.
    ///
    /// Empty output counts as absent.
    pub fn from_parts(output: Option<Vec<u8>>, error: Option<HelperError>) -> Self {
        let output = output.filter(|o| !o.is_empty());
        match (output, error) {
            (Some(out), None) => HelperOutcome::Success(out),
            (None, Some(err)) => HelperOutcome::DependencyError(err),
            (None, None) => HelperOutcome::UnknownFailure,
            (Some(out), Some(err)) => HelperOutcome::PartialSuccess(out, err),
        }
    }

    /// Split back into the (output, error) pair.
    pub fn into_parts(self) -> (Option<Vec<u8>>, Option<HelperError>) {
        match self {
            HelperOutcome::Success(out) => (Some(out), None),
            HelperOutcome::DependencyError(err) => (None, Some(err)),
            HelperOutcome::UnknownFailure => (None, None),
            HelperOutcome::PartialSuccess(out, err) => (Some(out), Some(err)),
        }
    }

    pub fn output(&self) -> Option<&[u8]> {
        match self {
            HelperOutcome::Success(out) | HelperOutcome::PartialSuccess(out, _) => {
                Some(out.as_slice())
            }
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&HelperError> {
        match self {
            HelperOutcome::DependencyError(err) | HelperOutcome::PartialSuccess(_, err) => {
                Some(err)
            }
            _ => None,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, HelperOutcome::Success(_))
    }
}
