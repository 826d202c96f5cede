//! End-to-end tests against a real docutils install.
//!
//! Skipped (with a message) when neither `rst2html` nor `rst2html.py` is on
//! PATH, so they pass on machines without Python.
//!
//! Run with:
//!   pip install docutils && cargo test --test e2e -- --nocapture

use markup_rst::{
    convert_documents, CapturingLogger, ConverterRegistry, DocumentContext, LogLevel,
    ProviderConfig, RenderContext, RenderStatus, SourceDocument,
};
use std::sync::Arc;

/// Skip this test if no rst2html helper is installed.
macro_rules! e2e_skip_unless_installed {
    () => {{
        init_tracing();
        if !markup_rst::supports() {
            println!("SKIP: rst2html not found on PATH (pip install docutils)");
            return;
        }
    }};
}

/// Show helper invocations with `RUST_LOG=markup_rst=debug`.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn registry(log: &CapturingLogger) -> ConverterRegistry {
    let config = ProviderConfig::builder()
        .logger(Arc::new(log.clone()))
        .build()
        .unwrap();
    ConverterRegistry::with_defaults(config).unwrap()
}

#[test]
fn defaults_register_rst_when_installed() {
    e2e_skip_unless_installed!();
    let r = registry(&CapturingLogger::new());
    assert!(r.contains("rst"));
    assert!(r.contains("rest"));
}

#[test]
fn renders_emphasis() {
    e2e_skip_unless_installed!();
    let log = CapturingLogger::new();
    let html = registry(&log)
        .converter_for("rst", DocumentContext::new("hello.rst"))
        .unwrap()
        .convert(&RenderContext::new(b"Hello *world*"))
        .unwrap();

    let html = String::from_utf8_lossy(html.bytes());
    assert!(html.contains("<em>world</em>"), "got: {html}");
    assert!(!html.contains("<body"), "body wrapper should be stripped: {html}");
    assert!(!html.contains("<head"), "head should be stripped: {html}");
    assert_eq!(log.count(LogLevel::Error), 0, "{:?}", log.entries());
}

#[test]
fn section_titles_start_at_h2() {
    e2e_skip_unless_installed!();
    let src = b"Intro\n=====\n\nText.\n\nDetails\n=======\n\nMore text.\n";
    let html = registry(&CapturingLogger::new())
        .converter_for("rst", DocumentContext::new("sections.rst"))
        .unwrap()
        .convert(&RenderContext::new(src))
        .unwrap();

    let html = String::from_utf8_lossy(html.bytes());
    assert!(html.contains("<h2"), "got: {html}");
    assert!(!html.contains("<h1"), "got: {html}");
}

#[test]
fn broken_markup_still_renders() {
    e2e_skip_unless_installed!();
    let log = CapturingLogger::new();
    let src = b"Para one.\n\n.. no-such-directive:: arg\n\nPara two.\n";
    let html = registry(&log)
        .converter_for("rst", DocumentContext::new("broken.rst"))
        .unwrap()
        .convert(&RenderContext::new(src))
        .unwrap();

    assert!(!html.is_empty());
    assert!(String::from_utf8_lossy(html.bytes()).contains("Para two"));
    let warnings = log.messages(LogLevel::Warn);
    assert_eq!(warnings.len(), 1, "{:?}", log.entries());
    assert!(warnings[0].contains("broken.rst"));
}

#[tokio::test]
async fn batch_of_real_documents() {
    e2e_skip_unless_installed!();
    let r = registry(&CapturingLogger::new());
    let docs = (1..=6)
        .map(|i| SourceDocument::new(format!("doc{i}.rst"), format!("Doc *{i}*\n")))
        .collect();

    let out = convert_documents(r.get("rst").unwrap(), docs, 3).await.unwrap();
    assert_eq!(out.len(), 6);
    for (i, doc) in out.iter().enumerate() {
        assert_eq!(doc.status, RenderStatus::Rendered);
        let html = String::from_utf8_lossy(&doc.html);
        assert!(html.contains(&format!("<em>{}</em>", i + 1)), "got: {html}");
    }
}
