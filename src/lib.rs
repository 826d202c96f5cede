//! # markup-rst
//!
//! reStructuredText support for document pipelines that render many markup
//! formats through one converter contract.
//!
//! ## Why an adapter?
//!
//! Rendering RST well means docutils, and docutils is Python. Rather than
//! re-implement it, this crate wraps the `rst2html` program behind the same
//! provider/converter traits every other format uses, and makes the one thing
//! it *does* own rigorous: what happens when that program is missing, fails,
//! or half-succeeds.
//!
//! ## Flow
//!
//! ```text
//! host ── rst::supports()? ──▶ probe PATH for rst2html / rst2html.py
//!  │
//!  ├─ 1. RstProvider.new_provider(config)      → Provider "rst"
//!  ├─ 2. provider.new_converter_for(document)  → RstConverter
//!  └─ 3. converter.convert(src)                → rst2html (child process)
//!                                                 │
//!                          Success / PartialSuccess / DependencyError / UnknownFailure
//!                                                 │
//!                                HTML (possibly empty) + diagnostic on the logger
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use markup_rst::{ConverterRegistry, DocumentContext, ProviderConfig, RenderContext};
//!
//! let registry = ConverterRegistry::with_defaults(ProviderConfig::default())?;
//! let converter = registry.converter_for("rst", DocumentContext::new("index.rst"))?;
//! let html = converter.convert(&RenderContext::new(b"Hello *world*"))?;
//! println!("{}", String::from_utf8_lossy(html.bytes()));
//! # Ok::<(), markup_rst::ConverterError>(())
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `rstconv` binary (clap + anyhow + tracing-subscriber) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod batch;
pub mod config;
pub mod converter;
pub mod error;
pub mod helper;
pub mod logger;
pub mod registry;
pub mod rst;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use batch::{
    convert_documents, convert_documents_sync, RenderStatus, RenderedDocument, SourceDocument,
};
pub use config::{HelperConfig, ProviderConfig, ProviderConfigBuilder};
pub use converter::{
    ConvertResult, Converter, DocumentContext, FnProvider, Identity, Provider, ProviderProvider,
    RenderContext,
};
pub use error::{ConverterError, HelperError};
pub use helper::{ExternalHelper, HelperOutcome, RstHelper};
pub use logger::{CapturingLogger, LogEntry, LogLevel, Logger, TracingLogger};
pub use registry::ConverterRegistry;
pub use rst::{supports, RstConverter, RstProvider};
