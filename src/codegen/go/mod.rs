//! Go code generation
//!
//! Produces a Go source file either by rendering a template or by writing
//! the fixed document straight from the metadata.

use tracing::{debug, info};

use crate::codegen::{CodeGenConfig, CodeGenerator, Formatter, OutputMode, TemplateRenderer};
use crate::error::DbtogoError;
use crate::inflect::Inflections;
use crate::metadata::Metadata;
use crate::naming::quote;

/// Go code generator
pub struct GoGenerator {
    /// `None` in direct mode
    renderer: Option<TemplateRenderer>,
    formatter: Formatter,
    tab_width: Option<usize>,
}

impl GoGenerator {
    /// Prepare templates and the formatter
    ///
    /// Template parse errors and a missing `gofmt` surface here, before any
    /// database work.
    pub fn new(config: &CodeGenConfig) -> Result<Self, DbtogoError> {
        let renderer = match config.output_mode {
            OutputMode::Template => Some(TemplateRenderer::new(
                &config.template,
                Inflections::english(),
            )?),
            OutputMode::Direct => None,
        };
        let formatter = Formatter::new(config.format)?;

        debug!(mode = ?config.output_mode, formatter = ?formatter, "Go generator ready");
        Ok(Self {
            renderer,
            formatter,
            tab_width: config.tab_width,
        })
    }
}

impl CodeGenerator for GoGenerator {
    fn generate(&self, metadata: &Metadata) -> Result<String, DbtogoError> {
        let rendered = match &self.renderer {
            Some(renderer) => renderer.render(metadata)?,
            None => write_direct(metadata),
        };

        let output = self.formatter.format(&rendered, self.tab_width)?;
        info!(
            tables = ?metadata.structs.len(),
            bytes = output.len(),
            "Generated Go code"
        );
        Ok(output)
    }
}

/// The fixed document: maps of statements plus every declaration
pub fn write_direct(metadata: &Metadata) -> String {
    let mut out = String::new();

    out.push_str("// GENERATED BY dbtogo; DO NOT EDIT\n");
    out.push_str(&format!("// ---args: {}\n\n", metadata.safe_args.join(" ")));
    out.push_str(&format!("package {}\n\n", metadata.package));

    if !metadata.imports.is_empty() {
        out.push_str("import (\n");
        for path in &metadata.imports {
            out.push_str(&format!("\t{}\n", quote(path)));
        }
        out.push_str(")\n\n");
    }

    out.push_str("type Arger interface {\n\tArgs() []interface{}\n}\n\n");

    write_map(&mut out, "InsertStmts", metadata, &metadata.insert_stmts);
    write_map(&mut out, "SelectStmts", metadata, &metadata.select_stmts);

    for declaration in &metadata.struct_code {
        out.push_str(declaration);
        out.push_str("\n\n");
    }

    out
}

fn write_map(out: &mut String, name: &str, metadata: &Metadata, stmts: &[String]) {
    out.push_str(&format!("var {} = map[string]string{{\n", name));
    for (strct, stmt) in metadata.structs.iter().zip(stmts) {
        out.push_str(&format!("\t{}: {},\n", quote(&strct.clean_name), quote(stmt)));
    }
    out.push_str("}\n\n");
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::codegen::{OutputTarget, TemplateSource};
    use crate::metadata::MetadataOptions;
    use crate::schema::{Field, Struct};
    use crate::types::{DataType, ExternalType, TypePolicy};

    fn metadata(policy: TypePolicy) -> Metadata {
        let mut md = Metadata::new(
            "model",
            vec![Struct::new(
                "users",
                vec![
                    Field::new("id", "integer", DataType::Int64),
                    Field::new("joined", "timestamp", DataType::External(ExternalType::time())),
                ],
            )],
        )
        .with_args(
            ["dbtogo", "sqlite3", "app.db"].iter().map(|s| s.to_string()),
            Some("app.db"),
        );
        md.create(&MetadataOptions {
            policy,
            ..Default::default()
        })
        .unwrap();
        md
    }

    fn unformatted(mode: OutputMode) -> GoGenerator {
        let config = CodeGenConfig::new(OutputTarget::Stdout)
            .with_output_mode(mode)
            .with_format(false);
        GoGenerator::new(&config).unwrap()
    }

    #[test]
    fn test_direct_document() {
        let output = unformatted(OutputMode::Direct)
            .generate(&metadata(TypePolicy::Null))
            .unwrap();

        let expected = "\
// GENERATED BY dbtogo; DO NOT EDIT
// ---args: dbtogo \"sqlite3\"

package model

import (
\t\"database/sql\"
\t\"time\"
)

type Arger interface {
\tArgs() []interface{}
}

var InsertStmts = map[string]string{
\t\"Users\": \"INSERT INTO Users (Id,Joined) VALUES (?,?)\",
}

var SelectStmts = map[string]string{
\t\"Users\": \"SELECT Id,Joined FROM Users\",
}

type Users struct {
\tId sql.NullInt64
\tJoined *time.Time
}

func (t *Users) Args() []interface{} {
\treturn []interface{}{&t.Id, &t.Joined}
}

";
        assert_eq!(output, expected);
    }

    #[test]
    fn test_builtin_template_document() {
        let output = unformatted(OutputMode::Template)
            .generate(&metadata(TypePolicy::Bare))
            .unwrap();

        let expected = "\
package model

// GENERATED BY dbtogo; DO NOT EDIT
// ---args: dbtogo \"sqlite3\"

import (
\t\"time\"
)

var InsertStmts = map[string]string{
\t\"users\": \"INSERT INTO Users (Id,Joined) VALUES (?,?)\",
}

type Users struct {
\tId int64
\tJoined time.Time
}
";
        assert_eq!(output, expected);
    }

    #[test]
    fn test_builtin_template_without_imports() {
        let mut md = Metadata::new(
            "store",
            vec![Struct::new("items", vec![Field::new("sku", "text", DataType::String)])],
        );
        md.create(&MetadataOptions::default()).unwrap();

        let output = unformatted(OutputMode::Template).generate(&md).unwrap();
        assert!(output.starts_with("package store\n"));
        assert!(!output.contains("import"));
        assert!(output.contains("// ---args: \n\nvar InsertStmts"));
    }

    #[test]
    fn test_direct_mode_ignores_broken_templates() {
        let config = CodeGenConfig::new(OutputTarget::Stdout)
            .with_output_mode(OutputMode::Direct)
            .with_template(TemplateSource::Files {
                paths: vec!["does/not/exist.tpl".into()],
                entry: "exist.tpl".into(),
            })
            .with_format(false);
        assert!(GoGenerator::new(&config).is_ok());
    }

    #[test]
    fn test_missing_template_file_fails_construction() {
        let config = CodeGenConfig::new(OutputTarget::Stdout)
            .with_template(TemplateSource::Files {
                paths: vec!["does/not/exist.tpl".into()],
                entry: "exist.tpl".into(),
            })
            .with_format(false);
        assert!(matches!(
            GoGenerator::new(&config),
            Err(DbtogoError::Template { .. })
        ));
    }
}
