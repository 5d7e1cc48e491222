//! Output formatting
//!
//! Generated Go is piped through `gofmt` unless formatting is turned off.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tracing::{debug, error};

use crate::error::DbtogoError;

/// Post-processes rendered source, touching whitespace only
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Formatter {
    /// Pipe through the `gofmt` binary at this path
    Gofmt(PathBuf),
    /// Emit the rendered text as is
    Verbatim,
}

impl Formatter {
    /// Locate `gofmt` when formatting is enabled
    pub fn new(enabled: bool) -> Result<Self, DbtogoError> {
        if !enabled {
            return Ok(Formatter::Verbatim);
        }

        let path = which::which("gofmt").map_err(|e| {
            error!(error = ?e, "gofmt not found on PATH");
            DbtogoError::Format(format!("gofmt not found ({}); use --nofmt to skip formatting", e))
        })?;
        debug!(path = ?path, "Using gofmt");
        Ok(Formatter::Gofmt(path))
    }

    /// Format `source`, optionally indenting with `tab_width` spaces
    pub fn format(&self, source: &str, tab_width: Option<usize>) -> Result<String, DbtogoError> {
        match self {
            Formatter::Verbatim => Ok(source.to_string()),
            Formatter::Gofmt(path) => {
                let formatted = run_gofmt(path, source)?;
                Ok(match tab_width {
                    Some(width) => expand_indent(&formatted, width),
                    None => formatted,
                })
            }
        }
    }
}

fn run_gofmt(path: &Path, source: &str) -> Result<String, DbtogoError> {
    let pipe_error = |stage: &str, e: std::io::Error| {
        error!(path = ?path, error = ?e, "Failed to {} gofmt", stage);
        DbtogoError::Format(format!("failed to {} {}: {}", stage, path.display(), e))
    };

    let mut child = Command::new(path)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| pipe_error("start", e))?;

    if let Some(mut stdin) = child.stdin.take() {
        stdin
            .write_all(source.as_bytes())
            .map_err(|e| pipe_error("feed", e))?;
    }

    let output = child
        .wait_with_output()
        .map_err(|e| pipe_error("wait for", e))?;
    if !output.status.success() {
        let diagnostic = String::from_utf8_lossy(&output.stderr).trim().to_string();
        error!(status = ?output.status, diagnostic = ?diagnostic, "gofmt rejected the generated code");
        return Err(DbtogoError::Format(diagnostic));
    }

    String::from_utf8(output.stdout)
        .map_err(|e| DbtogoError::Format(format!("gofmt produced invalid UTF-8: {}", e)))
}

/// Replace leading tabs with `width` spaces each
pub fn expand_indent(source: &str, width: usize) -> String {
    let indent = " ".repeat(width);
    source
        .split_inclusive('\n')
        .map(|line| {
            let trimmed = line.trim_start_matches('\t');
            let depth = line.len() - trimmed.len();
            indent.repeat(depth) + trimmed
        })
        .collect()
}
