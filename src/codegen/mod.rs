//! Code generation
//!
//! This module turns enriched [`Metadata`] into a source document and writes
//! it to its destination.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::prelude::{DbtogoError, Metadata};

pub mod format;
pub mod go;
pub mod helpers;
pub mod template;

pub use format::Formatter;
pub use go::GoGenerator;
pub use template::{TemplateRenderer, TemplateSource};

/// How the document is produced from the metadata
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputMode {
    /// Render a template (built-in or user supplied)
    #[default]
    Template,
    /// Write the fixed document straight from the metadata
    Direct,
}

/// Where the finished document goes
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum OutputTarget {
    #[default]
    Stdout,
    File(PathBuf),
}

impl OutputTarget {
    /// `-` and the empty string mean stdout, anything else is a path
    pub fn parse(value: &str) -> Self {
        match value {
            "" | "-" => OutputTarget::Stdout,
            path => OutputTarget::File(PathBuf::from(path)),
        }
    }
}

/// Configuration for code generation
#[derive(Debug, Clone)]
pub struct CodeGenConfig {
    pub output: OutputTarget,
    pub output_mode: OutputMode,
    pub template: TemplateSource,
    /// Run the output through the language formatter
    pub format: bool,
    /// Re-indent formatted output with this many spaces per level
    pub tab_width: Option<usize>,
}

impl CodeGenConfig {
    pub fn new(output: OutputTarget) -> Self {
        Self {
            output,
            output_mode: OutputMode::default(),
            template: TemplateSource::Builtin,
            format: true,
            tab_width: None,
        }
    }

    pub fn with_output_mode(mut self, mode: OutputMode) -> Self {
        self.output_mode = mode;
        self
    }

    pub fn with_template(mut self, template: TemplateSource) -> Self {
        self.template = template;
        self
    }

    pub fn with_format(mut self, format: bool) -> Self {
        self.format = format;
        self
    }

    pub fn with_tab_width(mut self, tab_width: Option<usize>) -> Self {
        self.tab_width = tab_width;
        self
    }
}

/// Trait for language-specific code generators
pub trait CodeGenerator {
    /// Produce the finished document for the given metadata
    fn generate(&self, metadata: &Metadata) -> Result<String, DbtogoError>;
}

/// Generate the document for `metadata` and write it to `target`
///
/// Nothing is written unless rendering and formatting both succeed, so a
/// failing run leaves an existing destination untouched.
pub fn generate_to<G: CodeGenerator>(
    generator: &G,
    metadata: &Metadata,
    target: &OutputTarget,
) -> Result<(), DbtogoError> {
    let document = generator.generate(metadata)?;
    write_output(target, &document)
}

/// Write a finished document to its destination
///
/// Files are written to a temporary sibling first and only renamed into
/// place once complete.
pub fn write_output(target: &OutputTarget, contents: &str) -> Result<(), DbtogoError> {
    match target {
        OutputTarget::Stdout => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(contents.as_bytes())?;
            stdout.flush()?;
            debug!(bytes = contents.len(), "Wrote output to stdout");
        }
        OutputTarget::File(path) => {
            let dir = match path.parent() {
                Some(parent) if !parent.as_os_str().is_empty() => parent,
                _ => Path::new("."),
            };
            fs::create_dir_all(dir)?;

            let mut file = NamedTempFile::new_in(dir)?;
            file.write_all(contents.as_bytes())?;
            file.flush()?;
            file.persist(path).map_err(|e| e.error)?;
            info!(path = ?path, bytes = contents.len(), "Wrote output file");
        }
    }
    Ok(())
}
