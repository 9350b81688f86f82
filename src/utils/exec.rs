//! External command execution.
//!
//! Commands are resolved on `PATH` with `which`, run to completion, and fail
//! with their (filtered) stderr on a non-zero exit. Stderr of successful runs
//! is logged under the program's name.

use crate::log;
use anyhow::{Context, Result, bail};
use regex::Regex;
use std::{
    borrow::Cow,
    ffi::OsString,
    path::Path,
    process::{Command, Output},
    sync::LazyLock,
};

// ============================================================================
// Macros
// ============================================================================

/// Run a program with arguments, optionally in a working directory.
///
/// Empty arguments are dropped, so optional flags can be passed as `""`.
///
/// # Examples
/// ```ignore
/// exec!(["git"]; "status", "-s")?;
/// exec!(dir; ["git"]; "push", "origin", branch)?;
/// exec!(filter=&SILENT_FILTER; dir; ["git"]; "fetch")?;
/// ```
macro_rules! exec {
    (filter=$filter:expr; $dir:expr; [$program:expr]; $($arg:expr),* $(,)?) => {
        $crate::utils::exec::run(
            Some(::std::convert::AsRef::<::std::path::Path>::as_ref(&$dir)),
            $program,
            &$crate::utils::exec::args(&[$(::std::ffi::OsString::from($arg)),*]),
            $filter,
        )
    };
    ($dir:expr; [$program:expr]; $($arg:expr),* $(,)?) => {
        $crate::utils::exec::exec!(
            filter=&$crate::utils::exec::EMPTY_FILTER; $dir; [$program]; $($arg),*
        )
    };
    ([$program:expr]; $($arg:expr),* $(,)?) => {
        $crate::utils::exec::run(
            None,
            $program,
            &$crate::utils::exec::args(&[$(::std::ffi::OsString::from($arg)),*]),
            &$crate::utils::exec::EMPTY_FILTER,
        )
    };
}

pub(crate) use exec;

// ============================================================================
// Command Execution
// ============================================================================

/// Drop empty arguments.
pub fn args(args: &[OsString]) -> Vec<OsString> {
    args.iter().filter(|arg| !arg.is_empty()).cloned().collect()
}

/// Run `program` and capture its output.
///
/// # Errors
/// The program is not on `PATH`, cannot be started, or exits non-zero.
pub fn run(
    dir: Option<&Path>,
    program: &str,
    args: &[OsString],
    filter: &FilterRule,
) -> Result<Output> {
    let path = which::which(program)
        .with_context(|| format!("`{program}` not found. Please install it first."))?;

    let mut command = Command::new(path);
    command.args(args);
    if let Some(dir) = dir {
        command.current_dir(dir);
    }

    let output = command
        .output()
        .with_context(|| format!("Failed to execute `{program}`"))?;
    if !output.status.success() {
        bail!(format_error(program, &output, filter));
    }

    let stderr = String::from_utf8_lossy(&output.stderr);
    filter.log(program, stderr.trim());
    Ok(output)
}

/// Serve `folder` on `port` with Python's built-in HTTP server.
///
/// Blocks until the server exits. Output goes straight to the terminal.
pub fn serve(folder: &Path, port: u16) -> Result<()> {
    let python = ["python3", "python"]
        .into_iter()
        .find_map(|name| which::which(name).ok())
        .context("`python3` not found. Please install it first.")?;

    let status = Command::new(python)
        .args(["-m", "http.server", &port.to_string()])
        .current_dir(folder)
        .status()
        .context("Failed to start the HTTP server")?;
    if !status.success() {
        bail!("HTTP server stopped with {status}");
    }
    Ok(())
}

// ============================================================================
// Output Filtering
// ============================================================================

fn strip_ansi(s: &str) -> Cow<'_, str> {
    static RE_ANSI: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\x1b\[[0-9;]*m").unwrap());
    RE_ANSI.replace_all(s, "")
}

/// Output lines to keep out of the log.
pub struct FilterRule {
    /// Prefixes matched against trimmed lines.
    pub skip_prefixes: &'static [&'static str],
}

impl FilterRule {
    pub const fn new(skip_prefixes: &'static [&'static str]) -> Self {
        Self { skip_prefixes }
    }

    fn should_skip(&self, line: &str) -> bool {
        line.is_empty() || self.skip_prefixes.iter().any(|p| line.starts_with(p))
    }

    fn log(&self, name: &str, output: &str) {
        let lines: Vec<&str> = output
            .lines()
            .filter(|line| !self.should_skip(strip_ansi(line).trim()))
            .collect();
        if !lines.is_empty() {
            log!(name; "{}", lines.join("\n"));
        }
    }
}

/// Keeps every line.
pub const EMPTY_FILTER: FilterRule = FilterRule::new(&[]);

/// Drops every line.
pub const SILENT_FILTER: FilterRule = FilterRule::new(&[""]);

fn format_error(name: &str, output: &Output, filter: &FilterRule) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stdout = String::from_utf8_lossy(&output.stdout);
    let details: Vec<&str> = stderr
        .lines()
        .chain(stdout.lines())
        .map(str::trim)
        .filter(|line| {
            !line.is_empty()
                && !filter
                    .skip_prefixes
                    .iter()
                    .any(|p| !p.is_empty() && line.starts_with(p))
        })
        .collect();

    let mut message = format!("Command `{name}` failed with {}", output.status);
    if !details.is_empty() {
        message.push('\n');
        message.push_str(&details.join("\n"));
    }
    message
}

// ============================================================================
// Tests
// ============================================================================
