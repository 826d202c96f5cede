//! Contract tests for the rst adapter, driven through the public registry API
//! with scripted helpers and a capturing logger. No external program needed.

use markup_rst::{
    CapturingLogger, ConverterRegistry, DocumentContext, HelperError, HelperOutcome, Identity,
    LogLevel, ProviderConfig, ProviderProvider, RenderContext, RstProvider,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

// ── Test helpers ─────────────────────────────────────────────────────────────

const DOC: &str = "content/post/hello.rst";

fn config(log: &CapturingLogger) -> ProviderConfig {
    ProviderConfig::builder()
        .logger(Arc::new(log.clone()))
        .build()
        .expect("default helper config is valid")
}

/// Registry with an rst provider whose helper always answers `outcome`.
fn registry_answering(outcome: HelperOutcome, log: &CapturingLogger) -> ConverterRegistry {
    let mut registry = ConverterRegistry::new();
    registry
        .with_provider_provider(
            &RstProvider::with_helper(move |_: &[u8]| outcome.clone()),
            config(log),
            markup_rst::rst::ALIASES,
        )
        .unwrap();
    registry
}

fn convert(registry: &ConverterRegistry, src: &[u8]) -> Vec<u8> {
    registry
        .converter_for("rst", DocumentContext::new(DOC))
        .unwrap()
        .convert(&RenderContext::new(src))
        .expect("convert never returns Err")
        .into_bytes()
}

// ── Outcome classes ──────────────────────────────────────────────────────────

#[test]
fn success_bytes_returned_unchanged() {
    let log = CapturingLogger::new();
    let html = b"<p>Hello <em>world</em></p>".to_vec();
    let registry = registry_answering(HelperOutcome::Success(html.clone()), &log);

    assert_eq!(convert(&registry, b"Hello *world*"), html);
    assert!(log.entries().is_empty());
}

#[test]
fn missing_docutils_logs_one_error_and_returns_empty() {
    let log = CapturingLogger::new();
    let registry = registry_answering(
        HelperOutcome::from_parts(None, Some(HelperError::Other("docutils not found".into()))),
        &log,
    );

    assert!(convert(&registry, b"").is_empty());

    let errors = log.messages(LogLevel::Error);
    assert_eq!(errors.len(), 1, "got: {errors:?}");
    assert!(errors[0].contains("docutils"));
    assert!(errors[0].contains(DOC));
    assert_eq!(log.count(LogLevel::Warn), 0);
}

#[test]
fn unknown_failure_logs_one_error_and_returns_empty() {
    let log = CapturingLogger::new();
    let registry = registry_answering(HelperOutcome::from_parts(None, None), &log);

    assert!(convert(&registry, b"Some *text*").is_empty());

    let errors = log.messages(LogLevel::Error);
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("unknown failure"));
    assert!(errors[0].contains(DOC));
}

#[test]
fn partial_output_is_kept_and_error_logged() {
    let log = CapturingLogger::new();
    let registry = registry_answering(
        HelperOutcome::from_parts(
            Some(b"<p>first half</p>".to_vec()),
            Some(HelperError::Failed {
                status: "exit status: 1".into(),
                stderr: "<stdin>:9: (SEVERE/4) Title level inconsistent".into(),
            }),
        ),
        &log,
    );

    assert_eq!(convert(&registry, b"..."), b"<p>first half</p>");

    let entries = log.entries();
    assert_eq!(entries.len(), 1);
    assert!(entries[0].message.contains("Title level inconsistent"));
    assert!(entries[0].message.contains(DOC));
}

#[test]
fn degraded_result_is_never_the_raw_source() {
    let log = CapturingLogger::new();
    let src = b"Title\n=====\n\nBody.";
    for outcome in [
        HelperOutcome::UnknownFailure,
        HelperOutcome::DependencyError(HelperError::NotInstalled {
            programs: vec!["rst2html".into()],
        }),
    ] {
        let registry = registry_answering(outcome, &log);
        assert_ne!(convert(&registry, src), src.to_vec());
    }
}

#[test]
fn convert_never_errs_for_any_input() {
    let log = CapturingLogger::new();
    let inputs: [&[u8]; 4] = [b"", b"plain", b"\xff\xfe not utf-8", &[b'x'; 64 * 1024]];
    let outcomes = [
        HelperOutcome::Success(b"<p/>".to_vec()),
        HelperOutcome::DependencyError(HelperError::Other("x".into())),
        HelperOutcome::UnknownFailure,
        HelperOutcome::PartialSuccess(b"<p/>".to_vec(), HelperError::Other("y".into())),
    ];

    for outcome in outcomes {
        let registry = registry_answering(outcome, &log);
        let converter = registry
            .converter_for("rst", DocumentContext::new(DOC))
            .unwrap();
        for src in inputs {
            assert!(converter.convert(&RenderContext::new(src)).is_ok());
        }
    }
}

// ── Capability query ─────────────────────────────────────────────────────────

#[test]
fn converter_supports_no_feature() {
    let log = CapturingLogger::new();
    let registry = registry_answering(HelperOutcome::UnknownFailure, &log);
    let converter = registry
        .converter_for("rst", DocumentContext::new(DOC))
        .unwrap();

    for feature in [
        Identity::default(),
        Identity::new(""),
        Identity::RENDER_HOOKS,
        Identity::PARTIAL_RENDER,
        Identity::TABLE_OF_CONTENTS,
        Identity::new("rst"),
    ] {
        assert!(!converter.supports(&feature), "feature {feature:?}");
    }
}

// ── Provider / registry ──────────────────────────────────────────────────────

#[test]
fn each_document_gets_its_own_converter() {
    let log = CapturingLogger::new();
    let registry = registry_answering(HelperOutcome::UnknownFailure, &log);

    for name in ["a.rst", "b.rst"] {
        registry
            .converter_for("rest", DocumentContext::new(name))
            .unwrap()
            .convert(&RenderContext::new(b"x"))
            .unwrap();
    }

    let errors = log.messages(LogLevel::Error);
    assert_eq!(errors.len(), 2);
    assert!(errors[0].contains("a.rst"));
    assert!(errors[1].contains("b.rst"));
}

#[test]
fn provider_factory_never_fails() {
    let provider = RstProvider::new()
        .new_provider(ProviderConfig::default())
        .expect("new_provider always succeeds");
    assert_eq!(provider.name(), "rst");
    for name in ["", "x.rst", "über/ünïcode.rst"] {
        assert!(provider.new_converter_for(DocumentContext::new(name)).is_ok());
    }
}

// ── Concurrency ──────────────────────────────────────────────────────────────

#[test]
fn one_converter_shared_across_threads() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let provider = RstProvider::with_helper(move |src: &[u8]| {
        counter.fetch_add(1, Ordering::SeqCst);
        let mut out = b"<p>".to_vec();
        out.extend_from_slice(src);
        out.extend_from_slice(b"</p>");
        HelperOutcome::Success(out)
    })
    .new_provider(ProviderConfig::default())
    .unwrap();

    let converter: Arc<dyn markup_rst::Converter> =
        Arc::from(provider.new_converter_for(DocumentContext::new(DOC)).unwrap());

    let handles: Vec<_> = (0..8)
        .map(|t| {
            let converter = Arc::clone(&converter);
            thread::spawn(move || {
                for i in 0..50 {
                    let src = format!("t{t}-{i}");
                    let out = converter
                        .convert(&RenderContext::new(src.as_bytes()))
                        .unwrap();
                    assert_eq!(out.bytes(), format!("<p>{src}</p>").as_bytes());
                }
            })
        })
        .collect();

    for h in handles {
        h.join().expect("worker panicked");
    }
    assert_eq!(calls.load(Ordering::SeqCst), 400);
}

#[test]
fn distinct_converters_log_concurrently() {
    let log = CapturingLogger::new();
    let registry = Arc::new(registry_answering(HelperOutcome::UnknownFailure, &log));

    let handles: Vec<_> = (0..16)
        .map(|i| {
            let registry = Arc::clone(&registry);
            thread::spawn(move || {
                registry
                    .converter_for("rst", DocumentContext::new(format!("doc{i}.rst")))
                    .unwrap()
                    .convert(&RenderContext::new(b"x"))
                    .unwrap()
            })
        })
        .collect();

    for h in handles {
        assert!(h.join().unwrap().is_empty());
    }
    assert_eq!(log.count(LogLevel::Error), 16);
}
