//! Host-side rendering of many documents at once.
//!
//! A converter call blocks on an external process, so each one runs on
//! tokio's blocking pool via `spawn_blocking`, and at most `concurrency` of
//! them are in flight. Every document gets its own converter from the
//! provider; nothing is shared between conversions except the provider and
//! its config.
//!
//! A document whose conversion degrades still comes back, with
//! [`RenderStatus::Empty`]; only fatal errors (factory failure, a panicked
//! task) fail the batch.

use crate::converter::{DocumentContext, Provider, RenderContext};
use crate::error::ConverterError;
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// One document waiting to be rendered.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    pub context: DocumentContext,
    pub source: Vec<u8>,
}

impl SourceDocument {
    pub fn new(name: impl Into<String>, source: impl Into<Vec<u8>>) -> Self {
        Self {
            context: DocumentContext::new(name),
            source: source.into(),
        }
    }

    /// Read a source file; its path becomes the document name.
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, ConverterError> {
        let path = path.as_ref();
        let source = tokio::fs::read(path)
            .await
            .map_err(|e| ConverterError::SourceReadFailed {
                path: path.to_path_buf(),
                source: e,
            })?;
        Ok(Self {
            context: DocumentContext::new(path.display().to_string()).with_filename(path),
            source,
        })
    }
}

/// Whether a document produced any HTML.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderStatus {
    Rendered,
    /// The converter degraded to an empty result; see the logger for why.
    Empty,
}

/// Result for one document of a batch.
#[derive(Debug, Clone, Serialize)]
pub struct RenderedDocument {
    pub name: String,
    pub filename: Option<PathBuf>,
    #[serde(skip)]
    pub html: Vec<u8>,
    pub bytes: usize,
    pub status: RenderStatus,
    pub duration_ms: u64,
}

/// Render `docs` with converters from `provider`, at most `concurrency` at a time.
///
/// Results come back in input order.
pub async fn convert_documents(
    provider: Arc<dyn Provider>,
    docs: Vec<SourceDocument>,
    concurrency: usize,
) -> Result<Vec<RenderedDocument>, ConverterError> {
    let total = docs.len();
    let start = Instant::now();
    info!(
        "Rendering {} document(s) with '{}' (concurrency {})",
        total,
        provider.name(),
        concurrency
    );

    let mut results: Vec<(usize, Result<RenderedDocument, ConverterError>)> =
        stream::iter(docs.into_iter().enumerate().map(|(idx, doc)| {
            let provider = Arc::clone(&provider);
            async move {
                let name = doc.context.document_name.clone();
                let result = tokio::task::spawn_blocking(move || render_one(&*provider, doc))
                    .await
                    .unwrap_or_else(|e| {
                        Err(ConverterError::Internal(format!(
                            "Render task for '{name}' panicked: {e}"
                        )))
                    });
                (idx, result)
            }
        }))
        .buffer_unordered(concurrency.max(1))
        .collect()
        .await;

    results.sort_by_key(|(idx, _)| *idx);
    let rendered = results
        .into_iter()
        .map(|(_, r)| r)
        .collect::<Result<Vec<_>, _>>()?;

    let empty = rendered
        .iter()
        .filter(|d| d.status == RenderStatus::Empty)
        .count();
    info!(
        "Rendered {}/{} document(s) in {}ms ({} empty)",
        total - empty,
        total,
        start.elapsed().as_millis(),
        empty
    );
    Ok(rendered)
}

/// Synchronous wrapper around [`convert_documents`].
///
/// Creates a temporary tokio runtime internally.
pub fn convert_documents_sync(
    provider: Arc<dyn Provider>,
    docs: Vec<SourceDocument>,
    concurrency: usize,
) -> Result<Vec<RenderedDocument>, ConverterError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| ConverterError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(convert_documents(provider, docs, concurrency))
}

/// Write rendered HTML to `path`.
///
/// Uses atomic write (temp file + rename) to prevent partial files.
pub async fn write_html(html: &[u8], path: impl AsRef<Path>) -> Result<(), ConverterError> {
    let path = path.as_ref();
    let write_err = |e| ConverterError::OutputWriteFailed {
        path: path.to_path_buf(),
        source: e,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
    }

    let tmp_path = path.with_extension("html.tmp");
    tokio::fs::write(&tmp_path, html).await.map_err(write_err)?;
    tokio::fs::rename(&tmp_path, path).await.map_err(write_err)?;
    Ok(())
}

fn render_one(
    provider: &dyn Provider,
    doc: SourceDocument,
) -> Result<RenderedDocument, ConverterError> {
    let start = Instant::now();
    let name = doc.context.document_name.clone();
    let filename = doc.context.filename.clone();

    let converter = provider.new_converter_for(doc.context)?;
    let html = converter
        .convert(&RenderContext::new(&doc.source))?
        .into_bytes();

    let status = if html.is_empty() {
        RenderStatus::Empty
    } else {
        RenderStatus::Rendered
    };
    debug!("{}: {:?}, {} bytes", name, status, html.len());

    Ok(RenderedDocument {
        name,
        filename,
        bytes: html.len(),
        html,
        status,
        duration_ms: start.elapsed().as_millis() as u64,
    })
}
