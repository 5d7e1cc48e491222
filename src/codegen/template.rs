//! Template rendering
//!
//! Runs a minijinja template against [`Metadata`], with the helper library
//! from [`crate::codegen::helpers`] available.

use std::fs;
use std::path::{Path, PathBuf};

use minijinja::{context, AutoEscape, Environment, UndefinedBehavior, Value};
use tracing::{debug, info};

use crate::codegen::helpers::{self, SharedInflections};
use crate::error::DbtogoError;
use crate::inflect::Inflections;
use crate::metadata::Metadata;
use crate::schema::{Field, Struct};
use crate::types::{render_type, TypePolicy};

/// Name the built-in template is registered under
pub const BUILTIN_TEMPLATE: &str = "default.go";

/// Which template runs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateSource {
    /// The template shipped with dbtogo
    Builtin,
    /// Template files, each registered under its base name
    Files {
        paths: Vec<PathBuf>,
        /// Template to start rendering from
        entry: String,
    },
}

impl TemplateSource {
    /// Template files with an optional explicit entry
    ///
    /// Without an entry, the base name of the first file is used.
    pub fn files(paths: Vec<PathBuf>, entry: Option<String>) -> Result<Self, DbtogoError> {
        let entry = match entry {
            Some(entry) => entry,
            None => {
                let first = paths.first().ok_or_else(|| {
                    DbtogoError::Config("at least one template file is required".to_string())
                })?;
                template_name(first)?
            }
        };
        Ok(TemplateSource::Files { paths, entry })
    }

    /// Name of the template rendering starts from
    pub fn entry(&self) -> &str {
        match self {
            TemplateSource::Builtin => BUILTIN_TEMPLATE,
            TemplateSource::Files { entry, .. } => entry,
        }
    }
}

/// Base name a template file is registered under
fn template_name(path: &Path) -> Result<String, DbtogoError> {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| DbtogoError::Config(format!("'{}' is not a file", path.display())))
}

/// A parsed template set ready to render metadata
pub struct TemplateRenderer {
    env: Environment<'static>,
    entry: String,
    /// Rules every render starts from
    baseline: Inflections,
    inflections: SharedInflections,
}

impl TemplateRenderer {
    /// Parse every template in `source`
    ///
    /// Parse errors and a missing entry template are reported here, before
    /// anything is rendered.
    pub fn new(source: &TemplateSource, inflections: Inflections) -> Result<Self, DbtogoError> {
        let shared = SharedInflections::new(inflections.clone());

        let mut env = Environment::new();
        env.set_trim_blocks(true);
        env.set_lstrip_blocks(true);
        env.set_keep_trailing_newline(true);
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        env.set_auto_escape_callback(|_| AutoEscape::None);
        helpers::register(&mut env, &shared);

        match source {
            TemplateSource::Builtin => {
                env.add_template(BUILTIN_TEMPLATE, include_str!("go/templates/default.go.jinja"))
                    .map_err(|e| template_error(BUILTIN_TEMPLATE, e))?;
                debug!(template = BUILTIN_TEMPLATE, "Loaded built-in template");
            }
            TemplateSource::Files { paths, .. } => {
                for path in paths {
                    let name = template_name(path)?;
                    let text = fs::read_to_string(path).map_err(|e| DbtogoError::Template {
                        name: name.clone(),
                        message: format!("Failed to read {}: {}", path.display(), e),
                    })?;
                    env.add_template_owned(name.clone(), text)
                        .map_err(|e| template_error(&name, e))?;
                    debug!(template = ?name, path = ?path, "Loaded template file");
                }
            }
        }

        let entry = source.entry().to_string();
        env.get_template(&entry)
            .map_err(|e| template_error(&entry, e))?;

        info!(entry = ?entry, "Templates ready");
        Ok(Self {
            env,
            entry,
            baseline: inflections,
            inflections: shared,
        })
    }

    /// Render the entry template
    ///
    /// The inflection rules are reset first, so rules a template adds never
    /// leak into the next render.
    pub fn render(&self, metadata: &Metadata) -> Result<String, DbtogoError> {
        self.inflections.reset(self.baseline.clone());

        let template = self
            .env
            .get_template(&self.entry)
            .map_err(|e| template_error(&self.entry, e))?;

        let output = template
            .render(metadata_context(metadata))
            .map_err(|e| template_error(&self.entry, e))?;

        debug!(entry = ?self.entry, bytes = output.len(), "Rendered template");
        Ok(output)
    }

    /// The rules as the last render left them
    pub fn inflections(&self) -> Inflections {
        self.inflections.snapshot()
    }
}

fn template_error(name: &str, err: minijinja::Error) -> DbtogoError {
    DbtogoError::Template {
        name: name.to_string(),
        message: format!("{:#}", err),
    }
}

/// Build the value templates render against
pub fn metadata_context(metadata: &Metadata) -> Value {
    let tables: Vec<Value> = metadata
        .structs
        .iter()
        .enumerate()
        .map(|(i, strct)| struct_context(metadata, i, strct))
        .collect();

    context! {
        package => &metadata.package,
        args => &metadata.args,
        safe_args => &metadata.safe_args,
        imports => &metadata.imports,
        structs => &tables,
        tables => &tables,
        insert_stmts => &metadata.insert_stmts,
        select_stmts => &metadata.select_stmts,
        struct_code => &metadata.struct_code,
    }
}

fn struct_context(metadata: &Metadata, index: usize, strct: &Struct) -> Value {
    let artifact = |code: &[String]| code.get(index).cloned().unwrap_or_default();

    context! {
        name => &strct.name,
        clean_name => &strct.clean_name,
        fields => strct.fields.iter().map(field_context).collect::<Vec<_>>(),
        insert => artifact(metadata.insert_stmts.as_slice()),
        select => artifact(metadata.select_stmts.as_slice()),
        declaration => artifact(metadata.struct_code.as_slice()),
    }
}

fn field_context(field: &Field) -> Value {
    context! {
        name => &field.name,
        clean_name => &field.clean_name,
        native_type => &field.native_type,
        nullable => field.is_nullable,
        type => field.data_type.bare(),
        type_null => render_type(&field.data_type, TypePolicy::Null),
        type_pointer => render_type(&field.data_type, TypePolicy::Pointer),
        go_type => &field.go_type,
        sequence => field.data_type.is_sequence(),
        placeholder => &field.placeholder,
        tag => &field.tag,
    }
}
