//! The registry contract every markup converter implements.
//!
//! ```text
//! ProviderProvider ──new_provider(cfg)──▶ Provider ──new_converter_for(doc)──▶ Converter
//!   (one per format,        (bound to a name        (one per document,
//!    process-wide)           and a config)            convert() + supports())
//! ```
//!
//! The host pipeline only sees these traits. A format such as
//! [`crate::rst`] plugs in by exposing a `ProviderProvider` value; the host
//! builds a [`Provider`] from its configuration once, registers it by name in
//! a [`crate::registry::ConverterRegistry`], and asks it for a fresh
//! [`Converter`] for every document it renders.

use crate::config::ProviderConfig;
use crate::error::ConverterError;
use std::borrow::Cow;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Entry point of a converter implementation.
pub trait ProviderProvider: Send + Sync {
    /// Bind the implementation to a configuration.
    fn new_provider(&self, cfg: ProviderConfig) -> Result<Arc<dyn Provider>, ConverterError>;
}

/// A named factory of per-document converters.
pub trait Provider: Send + Sync {
    /// Format name used for lookup, e.g. `"rst"`.
    fn name(&self) -> &str;

    fn new_converter_for(&self, ctx: DocumentContext) -> Result<Box<dyn Converter>, ConverterError>;
}

/// Converts one document's source into HTML.
pub trait Converter: Send + Sync {
    fn convert(&self, ctx: &RenderContext<'_>) -> Result<ConvertResult, ConverterError>;

    /// Whether this converter supports an optional fine-grained feature.
    fn supports(&self, feature: &Identity) -> bool;
}

/// Per-document metadata handed to [`Provider::new_converter_for`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentContext {
    /// Human-readable name used in diagnostics, usually the content path.
    pub document_name: String,

    /// Stable identifier of the document inside the host, if it has one.
    pub document_id: Option<String>,

    /// Source file on disk, if the document came from one.
    pub filename: Option<PathBuf>,
}

impl DocumentContext {
    pub fn new(document_name: impl Into<String>) -> Self {
        Self {
            document_name: document_name.into(),
            ..Default::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.document_id = Some(id.into());
        self
    }

    pub fn with_filename(mut self, path: impl Into<PathBuf>) -> Self {
        self.filename = Some(path.into());
        self
    }
}

/// Input of a single [`Converter::convert`] call.
#[derive(Debug, Clone, Copy)]
pub struct RenderContext<'a> {
    /// Raw markup source. May be empty.
    pub src: &'a [u8],
}

impl<'a> RenderContext<'a> {
    pub fn new(src: &'a [u8]) -> Self {
        Self { src }
    }
}

/// Output of a conversion: rendered bytes, possibly empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConvertResult {
    bytes: Vec<u8>,
}

impl ConvertResult {
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }
}

impl From<Vec<u8>> for ConvertResult {
    fn from(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }
}

impl From<Option<Vec<u8>>> for ConvertResult {
    fn from(bytes: Option<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.unwrap_or_default(),
        }
    }
}

/// Identifier of an optional converter feature queried through
/// [`Converter::supports`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Identity(Cow<'static, str>);

impl Identity {
    /// Render hooks for links, images and headings.
    pub const RENDER_HOOKS: Identity = Identity::from_static("render-hooks");

    /// Re-rendering only the parts of a document that changed.
    pub const PARTIAL_RENDER: Identity = Identity::from_static("partial-render");

    /// Table of contents extraction.
    pub const TABLE_OF_CONTENTS: Identity = Identity::from_static("toc");

    pub const fn from_static(name: &'static str) -> Self {
        Identity(Cow::Borrowed(name))
    }

    pub fn new(name: impl Into<String>) -> Self {
        Identity(Cow::Owned(name.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

type CreateFn =
    dyn Fn(DocumentContext) -> Result<Box<dyn Converter>, ConverterError> + Send + Sync;

/// A [`Provider`] built from a name and a closure.
///
/// Most formats need nothing more than this: the closure captures the
/// configuration and builds a converter around each document context.
pub struct FnProvider {
    name: String,
    create: Box<CreateFn>,
}

impl FnProvider {
    pub fn new<F>(name: impl Into<String>, create: F) -> Self
    where
        F: Fn(DocumentContext) -> Result<Box<dyn Converter>, ConverterError>
            + Send
            + Sync
            + 'static,
    {
        Self {
            name: name.into(),
            create: Box::new(create),
        }
    }
}

impl fmt::Debug for FnProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnProvider").field("name", &self.name).finish()
    }
}

impl Provider for FnProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn new_converter_for(
        &self,
        ctx: DocumentContext,
    ) -> Result<Box<dyn Converter>, ConverterError> {
        (self.create)(ctx)
    }
}
