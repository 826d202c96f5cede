//! Availability probe: is an `rst2html` helper installed on this machine?
//!
//! The host calls [`supports`] once, at startup or when deciding which
//! formats to offer. It never runs the helper.
//!
//! Nothing is cached. Every call walks the search path again, so installing
//! docutils (or changing `PATH`) between two probes changes the answer.

use crate::config::{FALLBACK_PROGRAM, PRIMARY_PROGRAM};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Whether `rst2html` or `rst2html.py` is on the process `PATH`.
pub fn supports() -> bool {
    locate(&[PRIMARY_PROGRAM, FALLBACK_PROGRAM]).is_some()
}

/// Like [`supports`], but searching an explicit path list instead of `PATH`.
pub fn supports_in(search_path: impl AsRef<OsStr>) -> bool {
    locate_in(&[PRIMARY_PROGRAM, FALLBACK_PROGRAM], search_path).is_some()
}

/// Resolve the first of `programs` found on `PATH`.
pub fn locate<S: AsRef<str>>(programs: &[S]) -> Option<PathBuf> {
    programs.iter().find_map(|p| {
        let p = p.as_ref();
        match which::which(p) {
            Ok(path) => {
                debug!("rst helper '{}' resolved to {}", p, path.display());
                Some(path)
            }
            Err(_) => None,
        }
    })
}

/// Resolve the first of `programs` found in `search_path`
/// (a platform `PATH`-style list).
///
/// Relative entries in `search_path` are resolved against the current
/// directory.
pub fn locate_in<S: AsRef<str>>(programs: &[S], search_path: impl AsRef<OsStr>) -> Option<PathBuf> {
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let search_path = search_path.as_ref();
    programs.iter().find_map(|p| {
        which::which_in(p.as_ref(), Some(search_path), &cwd)
            .ok()
            .filter(|path| path.is_file())
    })
}

/// Whether a resolved program has a `.py` extension.
pub fn is_python_script(path: &Path) -> bool {
    path.extension()
        .map(|e| e.eq_ignore_ascii_case("py"))
        .unwrap_or(false)
}

/// Whether `path` has to be launched through the Python interpreter.
///
/// Executable files run directly so their shebang picks the interpreter
/// (pyenv shims and virtualenv scripts rely on this). Windows has no
/// shebangs, so every `.py` program goes through the interpreter there.
pub fn needs_interpreter(path: &Path) -> bool {
    is_python_script(path) && !is_executable(path)
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path)
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(_path: &Path) -> bool {
    false
}
