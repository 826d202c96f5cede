//! Process-backed helper: run `rst2html` with the source on stdin.
//!
//! ## Why threads for the pipes?
//!
//! A child that writes a large page to stdout while we are still feeding its
//! stdin deadlocks once both pipe buffers fill. Writing stdin and draining
//! stdout/stderr on three short-lived threads avoids that, and leaves the
//! calling thread free to poll for exit and enforce the timeout.
//!
//! On Unix the helper runs in its own process group. Wrappers such as pyenv
//! shims fork the real program, and the grandchild holds the pipes open; on
//! timeout the whole group is killed so the pipe readers see EOF.
//!
//! ## Outcome mapping
//!
//! | Program found | Exit      | stdout    | stderr                 | Outcome |
//! |---------------|-----------|-----------|------------------------|---------|
//! | no            | -         | -         | -                      | `DependencyError(NotInstalled)` |
//! | yes           | spawn err | -         | -                      | `DependencyError(Spawn)` |
//! | yes           | non-zero  | empty     | `No module named …`    | `DependencyError(MissingModule)` |
//! | yes           | non-zero  | empty     | anything else          | `DependencyError(Failed)` |
//! | yes           | non-zero  | non-empty | -                      | `PartialSuccess(Failed)` |
//! | yes           | 0         | non-empty | `(ERROR/3)`/`(SEVERE/4)` | `PartialSuccess(Reported)` |
//! | yes           | 0         | non-empty | clean or warnings only | `Success` |
//! | yes           | 0         | empty     | -                      | `UnknownFailure` |
//! | yes           | timed out | any       | -                      | killed, `Timeout` |

use crate::config::HelperConfig;
use crate::error::HelperError;
use crate::helper::{body, probe, HelperOutcome, RstHelper};
use once_cell::sync::Lazy;
use regex::Regex;
use std::ffi::OsString;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

static MISSING_MODULE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^.*(?:ModuleNotFoundError|ImportError|No module named).*$")
        .expect("valid missing-module regex")
});

static ERROR_MESSAGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^.*\((?:ERROR/3|SEVERE/4)\).*$").expect("valid system-message regex")
});

/// Upper bound on the exit-poll sleep.
const MAX_POLL: Duration = Duration::from_millis(50);

/// Runs the docutils `rst2html` program as a child process.
#[derive(Debug, Clone)]
pub struct ExternalHelper {
    config: HelperConfig,
    search_path: Option<OsString>,
}

impl ExternalHelper {
    pub fn new(config: HelperConfig) -> Self {
        Self {
            config,
            search_path: None,
        }
    }

    /// Look programs up in `path` (a `PATH`-style list) instead of the process `PATH`.
    pub fn with_search_path(mut self, path: impl Into<OsString>) -> Self {
        self.search_path = Some(path.into());
        self
    }

    pub fn config(&self) -> &HelperConfig {
        &self.config
    }

    /// Resolve the helper program, honouring the configured fallback order.
    pub fn resolve(&self) -> Option<PathBuf> {
        match &self.search_path {
            Some(path) => probe::locate_in(&self.config.programs, path),
            None => probe::locate(&self.config.programs),
        }
    }

    fn command(&self, program: &Path) -> Command {
        let mut cmd = if probe::needs_interpreter(program) {
            let mut cmd = Command::new(&self.config.python);
            cmd.arg(program);
            cmd
        } else {
            Command::new(program)
        };
        cmd.args(&self.config.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            cmd.process_group(0);
        }
        cmd
    }

    /// Convert `src`, blocking until the helper exits or times out.
    pub fn run(&self, src: &[u8]) -> HelperOutcome {
        let Some(program) = self.resolve() else {
            return HelperOutcome::DependencyError(HelperError::NotInstalled {
                programs: self.config.programs.clone(),
            });
        };

        let mut child = match self.command(&program).spawn() {
            Ok(child) => child,
            Err(e) => {
                return HelperOutcome::DependencyError(HelperError::Spawn {
                    program: program.display().to_string(),
                    detail: e.to_string(),
                })
            }
        };
        debug!(
            "Started {} (pid {}) for {} bytes of RST",
            program.display(),
            child.id(),
            src.len()
        );

        let writer = spawn_writer(child.stdin.take(), src.to_vec());
        let stdout = spawn_reader(child.stdout.take());
        let stderr = spawn_reader(child.stderr.take());

        let status = wait_with_timeout(&mut child, self.config.timeout());

        let stdout = join(stdout);
        let stderr = join(stderr);
        let written = join(writer);

        let status = match status {
            Ok(status) => status,
            Err(e) => return HelperOutcome::DependencyError(e.into()),
        };
        let (stdout, stderr) = match (stdout, stderr) {
            (Ok(out), Ok(err)) => (out, String::from_utf8_lossy(&err).trim().to_string()),
            (Err(e), _) | (_, Err(e)) => return HelperOutcome::DependencyError(e.into()),
        };

        let error = match status {
            None => Some(HelperError::Timeout {
                after: self.config.timeout(),
            }),
            Some(st) if st.success() => reported_errors(&stderr),
            Some(st) => Some(classify_failure(st, &stderr, stdout.is_empty())),
        };
        // A helper that exits early without reading its input closes the pipe on us.
        let error = error.or_else(|| match written {
            Err(e) if e.kind() != io::ErrorKind::BrokenPipe => Some(e.into()),
            _ => None,
        });

        if !stderr.is_empty() && error.is_none() {
            debug!("rst helper stderr: {}", stderr);
        }

        let output = (!stdout.is_empty()).then(|| body::extract_body(&stdout));
        HelperOutcome::from_parts(output, error)
    }
}

impl Default for ExternalHelper {
    fn default() -> Self {
        Self::new(HelperConfig::default())
    }
}

impl RstHelper for ExternalHelper {
    fn convert_from_rst(&self, src: &[u8]) -> HelperOutcome {
        self.run(src)
    }
}

fn classify_failure(status: ExitStatus, stderr: &str, no_output: bool) -> HelperError {
    if no_output {
        if let Some(line) = MISSING_MODULE.find(stderr) {
            return HelperError::MissingModule {
                detail: line.as_str().trim().to_string(),
            };
        }
    }
    HelperError::Failed {
        status: status.to_string(),
        stderr: stderr.to_string(),
    }
}

fn reported_errors(stderr: &str) -> Option<HelperError> {
    let lines: Vec<&str> = ERROR_MESSAGE
        .find_iter(stderr)
        .map(|m| m.as_str().trim())
        .collect();
    (!lines.is_empty()).then(|| HelperError::Reported(lines.join("; ")))
}

/// Poll the child until it exits. `Ok(None)` means it was killed on timeout.
fn wait_with_timeout(child: &mut Child, timeout: Duration) -> io::Result<Option<ExitStatus>> {
    let start = Instant::now();
    let mut poll = Duration::from_millis(1);
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if start.elapsed() >= timeout {
            warn!("rst helper exceeded {:?}; killing pid {}", timeout, child.id());
            kill_tree(child);
            child.wait()?;
            return Ok(None);
        }
        thread::sleep(poll);
        poll = (poll * 2).min(MAX_POLL);
    }
}

/// Kill the child and, on Unix, everything else in its process group.
fn kill_tree(child: &mut Child) {
    #[cfg(unix)]
    {
        if let Ok(pgid) = libc::pid_t::try_from(child.id()) {
            // SAFETY: killpg takes no pointers; the group was created at spawn
            // and the child is not reaped yet, so the id cannot be reused.
            unsafe {
                libc::killpg(pgid, libc::SIGKILL);
            }
        }
    }
    // The child may exit between try_wait and kill.
    let _ = child.kill();
}

fn spawn_writer<W>(pipe: Option<W>, input: Vec<u8>) -> JoinHandle<io::Result<()>>
where
    W: Write + Send + 'static,
{
    thread::spawn(move || {
        if let Some(mut pipe) = pipe {
            pipe.write_all(&input)?;
        }
        // Dropping the pipe closes stdin so the helper sees EOF.
        Ok(())
    })
}

fn spawn_reader<R>(pipe: Option<R>) -> JoinHandle<io::Result<Vec<u8>>>
where
    R: Read + Send + 'static,
{
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            pipe.read_to_end(&mut buf)?;
        }
        Ok(buf)
    })
}

fn join<T>(handle: JoinHandle<io::Result<T>>) -> io::Result<T> {
    handle
        .join()
        .unwrap_or_else(|_| Err(io::Error::other("rst helper pipe thread panicked")))
}
