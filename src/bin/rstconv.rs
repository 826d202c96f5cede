//! CLI binary for markup-rst.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `ProviderConfig`, renders each file and prints a summary.

use anyhow::{Context, Result};
use clap::Parser;
use markup_rst::batch::write_html;
use markup_rst::config::DEFAULT_PYTHON;
use markup_rst::{
    convert_documents, helper, ConverterRegistry, HelperConfig, ProviderConfig, RenderStatus,
    RstProvider, SourceDocument,
};
use serde::Serialize;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Is rst2html installed?
  rstconv --check

  # Render next to the sources (intro.rst → intro.html)
  rstconv docs/intro.rst docs/usage.rst

  # Render a tree into another directory
  rstconv content/*.rst --output-dir public/

  # Single file to stdout
  rstconv --stdout README.rst

  # Fail the run if any document came out empty
  rstconv --strict content/*.rst

ENVIRONMENT VARIABLES:
  RUST_LOG                Override the log filter (e.g. markup_rst=debug)
  RSTCONV_OUTPUT_DIR      Default for --output-dir
  RSTCONV_PYTHON          Interpreter for rst2html.py
  RSTCONV_TIMEOUT         Per-document helper timeout in seconds

SETUP:
  pip install docutils    provides rst2html (or rst2html.py)
"#;

/// Render reStructuredText files to HTML fragments via docutils.
#[derive(Parser, Debug)]
#[command(
    name = "rstconv",
    version,
    about = "Render reStructuredText files to HTML fragments via docutils' rst2html",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// RST source files.
    #[arg(required_unless_present = "check")]
    inputs: Vec<PathBuf>,

    /// Write `<stem>.html` files here instead of next to each input.
    #[arg(short, long, env = "RSTCONV_OUTPUT_DIR", conflicts_with = "stdout")]
    output_dir: Option<PathBuf>,

    /// Print the HTML of a single input to stdout.
    #[arg(long)]
    stdout: bool,

    /// Only report whether an rst2html helper is installed.
    #[arg(long)]
    check: bool,

    /// Number of documents rendered in parallel.
    #[arg(short, long, env = "RSTCONV_CONCURRENCY", default_value_t = 4)]
    concurrency: usize,

    /// Seconds before a running rst2html is killed.
    #[arg(long, env = "RSTCONV_TIMEOUT", default_value_t = 30)]
    timeout: u64,

    /// Interpreter for an rst2html.py that is not executable itself.
    #[arg(long, env = "RSTCONV_PYTHON", default_value = DEFAULT_PYTHON)]
    python: String,

    /// Exit non-zero if any document rendered empty.
    #[arg(long)]
    strict: bool,

    /// Print a JSON summary instead of per-file lines.
    #[arg(long)]
    json: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "RSTCONV_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "RSTCONV_QUIET")]
    quiet: bool,
}

#[derive(Serialize)]
struct CheckReport {
    available: bool,
    program: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Conversion diagnostics go through tracing at WARN/ERROR, so even the
    // quiet filter keeps the ones that explain an empty document.
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "warn"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let config = build_config(&cli)?;

    // ── Check-only mode ──────────────────────────────────────────────────
    if cli.check {
        let program = helper::locate(&config.helper.programs);
        let report = CheckReport {
            available: program.is_some(),
            program,
        };
        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&report).context("Failed to serialise report")?
            );
        } else {
            match &report.program {
                Some(p) => println!("{} rst2html found: {}", green("✔"), p.display()),
                None => println!(
                    "{} none of {} found on PATH (pip install docutils)",
                    red("✘"),
                    config.helper.programs.join(", ")
                ),
            }
        }
        return Ok(if report.available {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        });
    }

    if cli.stdout && cli.inputs.len() != 1 {
        anyhow::bail!("--stdout takes exactly one input, got {}", cli.inputs.len());
    }

    // ── Render ───────────────────────────────────────────────────────────
    let mut registry = ConverterRegistry::new();
    registry
        .with_provider_provider(&RstProvider::new(), config, markup_rst::rst::ALIASES)
        .context("Failed to set up rst converter")?;
    let provider = registry
        .get("rst")
        .context("rst provider missing from registry")?;

    let mut docs = Vec::with_capacity(cli.inputs.len());
    for path in &cli.inputs {
        docs.push(SourceDocument::from_file(path).await?);
    }

    let rendered = convert_documents(provider, docs, cli.concurrency)
        .await
        .context("Rendering failed")?;

    if cli.stdout {
        let mut handle = io::stdout().lock();
        handle
            .write_all(&rendered[0].html)
            .context("Failed to write to stdout")?;
        if !rendered[0].html.ends_with(b"\n") {
            handle.write_all(b"\n").ok();
        }
    } else {
        for (doc, input) in rendered.iter().zip(&cli.inputs) {
            if doc.status == RenderStatus::Empty {
                continue;
            }
            let target = output_path(input, cli.output_dir.as_deref());
            write_html(&doc.html, &target).await?;
            if !cli.quiet && !cli.json {
                eprintln!(
                    "  {} {}  →  {}  {}",
                    green("✓"),
                    doc.name,
                    bold(&target.display().to_string()),
                    dim(&format!("{} bytes, {}ms", doc.bytes, doc.duration_ms)),
                );
            }
        }
    }

    let empty: Vec<&str> = rendered
        .iter()
        .filter(|d| d.status == RenderStatus::Empty)
        .map(|d| d.name.as_str())
        .collect();

    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&rendered).context("Failed to serialise summary")?
        );
    } else if !cli.quiet {
        for name in &empty {
            eprintln!("  {} {}  {}", red("✗"), name, red("no output (see log above)"));
        }
        eprintln!(
            "Rendered {}/{} document(s)",
            rendered.len() - empty.len(),
            rendered.len()
        );
    }

    Ok(if cli.strict && !empty.is_empty() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

/// Map CLI args to `ProviderConfig`.
fn build_config(cli: &Cli) -> Result<ProviderConfig> {
    ProviderConfig::builder()
        .helper(HelperConfig {
            python: cli.python.clone(),
            timeout_secs: cli.timeout,
            ..HelperConfig::default()
        })
        .build()
        .context("Invalid configuration")
}

/// `dir/stem.html` when an output directory is given, else next to the input.
fn output_path(input: &Path, output_dir: Option<&Path>) -> PathBuf {
    let file = input.with_extension("html");
    match (output_dir, file.file_name()) {
        (Some(dir), Some(name)) => dir.join(name),
        _ => file,
    }
}
