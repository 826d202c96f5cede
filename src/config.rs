//! Configuration handed to providers by the host pipeline.
//!
//! [`ProviderConfig`] is what the registry contract calls "the configuration":
//! it carries the diagnostics sink every converter writes to, plus the
//! [`HelperConfig`] that tells the process-backed helper which programs to
//! look for and how to run them. Converters only ever read it.
//!
//! `HelperConfig` is `serde`-loadable with defaults for every field, so a host
//! can embed it in its own site configuration and let users override only the
//! interpreter or the timeout.

use crate::error::ConverterError;
use crate::logger::{SharedLogger, TracingLogger};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Primary helper program name.
pub const PRIMARY_PROGRAM: &str = "rst2html";

/// Fallback name used by docutils installs that keep the script suffix.
pub const FALLBACK_PROGRAM: &str = "rst2html.py";

/// Interpreter for `.py` helpers that cannot run on their own.
#[cfg(windows)]
pub const DEFAULT_PYTHON: &str = "python";

/// Interpreter for `.py` helpers that cannot run on their own.
#[cfg(not(windows))]
pub const DEFAULT_PYTHON: &str = "python3";

/// Configuration shared by a provider and every converter it creates.
///
/// Cloning is cheap: the logger is reference-counted.
///
/// # Example
/// ```rust
/// use markup_rst::config::ProviderConfig;
/// use markup_rst::logger::CapturingLogger;
/// use std::sync::Arc;
///
/// let log = CapturingLogger::new();
/// let config = ProviderConfig::builder()
///     .logger(Arc::new(log.clone()))
///     .timeout_secs(10)
///     .build()
///     .unwrap();
/// assert_eq!(config.helper.timeout_secs, 10);
/// ```
#[derive(Clone)]
pub struct ProviderConfig {
    /// Where conversion diagnostics go. Default: [`TracingLogger`].
    pub logger: SharedLogger,

    /// How the external helper is located and invoked.
    pub helper: HelperConfig,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            logger: Arc::new(TracingLogger),
            helper: HelperConfig::default(),
        }
    }
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("logger", &"<dyn Logger>")
            .field("helper", &self.helper)
            .finish()
    }
}

impl ProviderConfig {
    /// Create a new builder for `ProviderConfig`.
    pub fn builder() -> ProviderConfigBuilder {
        ProviderConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Settings for the process-backed `rst2html` helper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HelperConfig {
    /// Program names searched on PATH, in order. Default: `rst2html`, `rst2html.py`.
    pub programs: Vec<String>,

    /// Arguments passed to the helper.
    /// Default: `--leave-comments --initial-header-level=2`.
    ///
    /// Header level 2 leaves `<h1>` to the page template's title.
    pub args: Vec<String>,

    /// Interpreter for a resolved `.py` script that is not executable itself.
    /// Default: `python3` (`python` on Windows).
    pub python: String,

    /// Seconds before a running helper is killed. Default: 30.
    pub timeout_secs: u64,
}

impl Default for HelperConfig {
    fn default() -> Self {
        Self {
            programs: vec![PRIMARY_PROGRAM.to_string(), FALLBACK_PROGRAM.to_string()],
            args: vec![
                "--leave-comments".to_string(),
                "--initial-header-level=2".to_string(),
            ],
            python: DEFAULT_PYTHON.to_string(),
            timeout_secs: 30,
        }
    }
}

impl HelperConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    fn validate(&self) -> Result<(), ConverterError> {
        if self.programs.is_empty() {
            return Err(ConverterError::InvalidConfig(
                "at least one helper program name is required".into(),
            ));
        }
        if let Some(bad) = self.programs.iter().find(|p| p.trim().is_empty()) {
            return Err(ConverterError::InvalidConfig(format!(
                "helper program name must not be blank, got {bad:?}"
            )));
        }
        if self.timeout_secs == 0 {
            return Err(ConverterError::InvalidConfig(
                "helper timeout must be ≥ 1 second".into(),
            ));
        }
        if self.python.trim().is_empty() {
            return Err(ConverterError::InvalidConfig(
                "python interpreter name must not be blank".into(),
            ));
        }
        Ok(())
    }
}

/// Builder for [`ProviderConfig`].
#[derive(Debug)]
pub struct ProviderConfigBuilder {
    config: ProviderConfig,
}

impl ProviderConfigBuilder {
    pub fn logger(mut self, logger: SharedLogger) -> Self {
        self.config.logger = logger;
        self
    }

    pub fn helper(mut self, helper: HelperConfig) -> Self {
        self.config.helper = helper;
        self
    }

    pub fn programs<I, S>(mut self, programs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.helper.programs = programs.into_iter().map(Into::into).collect();
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.helper.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn python(mut self, interpreter: impl Into<String>) -> Self {
        self.config.helper.python = interpreter.into();
        self
    }

    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.config.helper.timeout_secs = secs;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ProviderConfig, ConverterError> {
        self.config.helper.validate()?;
        Ok(self.config)
    }
}
