//! reStructuredText support, registered under the format name `"rst"`.
//!
//! The converter never parses RST itself; it hands the source to an
//! [`RstHelper`] (by default the docutils `rst2html` program) and turns
//! whatever comes back into a [`ConvertResult`] plus, when something went
//! wrong, one diagnostic on the configured logger.
//!
//! ## Degradation policy
//!
//! | Helper outcome     | Result           | Diagnostic |
//! |--------------------|------------------|------------|
//! | `Success`          | helper output    | none |
//! | `DependencyError`  | empty            | error: document name + helper error |
//! | `UnknownFailure`   | empty            | error: document name, "unknown" |
//! | `PartialSuccess`   | helper output    | warn: document name + helper error |
//!
//! `convert` always returns `Ok`. On failure the result is empty rather than
//! the raw source, so the host never publishes unconverted RST as HTML.
//!
//! ```rust
//! use markup_rst::converter::{DocumentContext, ProviderProvider, RenderContext};
//! use markup_rst::helper::HelperOutcome;
//! use markup_rst::{ProviderConfig, RstProvider};
//!
//! let provider = RstProvider::with_helper(|_src: &[u8]| {
//!     HelperOutcome::Success(b"<p>Hello <em>world</em></p>".to_vec())
//! })
//! .new_provider(ProviderConfig::default())
//! .unwrap();
//!
//! let converter = provider
//!     .new_converter_for(DocumentContext::new("content/hello.rst"))
//!     .unwrap();
//! let out = converter.convert(&RenderContext::new(b"Hello *world*")).unwrap();
//! assert_eq!(out.bytes(), b"<p>Hello <em>world</em></p>");
//! ```

use crate::config::ProviderConfig;
use crate::converter::{
    ConvertResult, Converter, DocumentContext, FnProvider, Identity, Provider, ProviderProvider,
    RenderContext,
};
use crate::error::ConverterError;
use crate::helper::{self, ExternalHelper, HelperOutcome, RstHelper};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Name the provider registers under.
pub const FORMAT_NAME: &str = "rst";

/// Additional lookup names for [`FORMAT_NAME`].
pub const ALIASES: &[&str] = &["rest", "restructuredtext"];

/// Whether an `rst2html` helper is installed on this machine.
///
/// Hosts call this before offering the format at all. It is re-evaluated on
/// every call.
pub fn supports() -> bool {
    helper::supports()
}

/// Entry point for the `"rst"` format.
///
/// Stateless apart from an optional injected helper; one value serves the
/// whole process.
#[derive(Clone, Default)]
pub struct RstProvider {
    helper: Option<Arc<dyn RstHelper>>,
}

impl RstProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `helper` instead of spawning `rst2html`.
    pub fn with_helper(helper: impl RstHelper + 'static) -> Self {
        Self {
            helper: Some(Arc::new(helper)),
        }
    }
}

impl fmt::Debug for RstProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RstProvider")
            .field(
                "helper",
                &self.helper.as_ref().map_or("rst2html", |_| "<dyn RstHelper>"),
            )
            .finish()
    }
}

impl ProviderProvider for RstProvider {
    fn new_provider(&self, cfg: ProviderConfig) -> Result<Arc<dyn Provider>, ConverterError> {
        let helper: Arc<dyn RstHelper> = match &self.helper {
            Some(h) => Arc::clone(h),
            None => Arc::new(ExternalHelper::new(cfg.helper.clone())),
        };

        Ok(Arc::new(FnProvider::new(FORMAT_NAME, move |ctx| {
            Ok(Box::new(RstConverter {
                ctx,
                cfg: cfg.clone(),
                helper: Arc::clone(&helper),
            }) as Box<dyn Converter>)
        })))
    }
}

/// Per-document converter. Holds no state between calls.
pub struct RstConverter {
    ctx: DocumentContext,
    cfg: ProviderConfig,
    helper: Arc<dyn RstHelper>,
}

impl RstConverter {
    pub fn document(&self) -> &DocumentContext {
        &self.ctx
    }

    fn render(&self, src: &[u8]) -> Option<Vec<u8>> {
        let name = &self.ctx.document_name;
        match self.helper.convert_from_rst(src) {
            HelperOutcome::Success(out) => Some(out),
            HelperOutcome::DependencyError(err) if err.is_dependency_missing() => {
                self.cfg.logger.error(&format!(
                    "Problem rendering {name}: {err} \
                     (is docutils installed and rst2html on PATH?)"
                ));
                None
            }
            HelperOutcome::DependencyError(err) => {
                self.cfg
                    .logger
                    .error(&format!("Problem rendering {name}: {err}"));
                None
            }
            HelperOutcome::UnknownFailure => {
                self.cfg.logger.error(&format!(
                    "Problem rendering {name}: unknown failure, \
                     rst helper produced no output and no error"
                ));
                None
            }
            HelperOutcome::PartialSuccess(out, err) => {
                self.cfg.logger.warn(&format!(
                    "Problem rendering {name}: {err} (keeping {} bytes of output)",
                    out.len()
                ));
                Some(out)
            }
        }
    }
}

impl fmt::Debug for RstConverter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RstConverter")
            .field("ctx", &self.ctx)
            .field("cfg", &self.cfg)
            .finish()
    }
}

impl Converter for RstConverter {
    fn convert(&self, ctx: &RenderContext<'_>) -> Result<ConvertResult, ConverterError> {
        let out = self.render(ctx.src);
        debug!(
            "Rendered {}: {} bytes RST → {} bytes HTML",
            self.ctx.document_name,
            ctx.src.len(),
            out.as_ref().map_or(0, Vec::len)
        );
        Ok(out.into())
    }

    fn supports(&self, _feature: &Identity) -> bool {
        false
    }
}
