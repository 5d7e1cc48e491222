//! Run metadata
//!
//! [`Metadata`] is everything a template sees: provenance, package name, the
//! introspected tables, and the artifacts [`Metadata::create`] derives from
//! them (imports, INSERT and SELECT text, type declarations).

use std::collections::{BTreeSet, HashMap};
use std::ffi::OsString;

use tracing::{debug, trace};

use crate::error::DbtogoError;
use crate::naming::{is_identifier, quote, sanitize, NamingOptions};
use crate::schema::Struct;
use crate::types::{map_type, TypePolicy};

/// Positional placeholder style of the target driver
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Placeholder {
    /// `?` (SQLite, MySQL)
    #[default]
    Question,
    /// `$1`, `$2`, ... (PostgreSQL)
    Dollar,
}

impl Placeholder {
    /// Token for the 1-based column `position`
    pub fn token(&self, position: usize) -> String {
        match self {
            Placeholder::Question => "?".to_string(),
            Placeholder::Dollar => format!("${}", position),
        }
    }
}

/// Policies applied while enriching metadata
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetadataOptions {
    pub policy: TypePolicy,
    pub naming: NamingOptions,
    /// Emit `sql:"<column>"` struct tags
    pub struct_tags: bool,
    pub placeholder: Placeholder,
}

/// The whole-run context handed to code generation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Metadata {
    /// Invoking command line, quoted
    pub args: Vec<String>,
    /// `args` without the DSN
    pub safe_args: Vec<String>,
    pub package: String,
    /// Tables in backend order
    pub structs: Vec<Struct>,

    // Filled by create(), indexed like `structs`
    pub imports: BTreeSet<String>,
    pub insert_stmts: Vec<String>,
    pub select_stmts: Vec<String>,
    pub struct_code: Vec<String>,
}

impl Metadata {
    pub fn new(package: impl Into<String>, structs: Vec<Struct>) -> Self {
        Self {
            package: package.into(),
            structs,
            ..Default::default()
        }
    }

    /// Record the command line for the provenance comment
    ///
    /// Every argument after the program name is quoted. When the DSN was given
    /// on the command line, `safe_args` leaves out its last occurrence, so an
    /// option value spelled like the DSN survives.
    pub fn with_args<I>(mut self, argv: I, dsn: Option<&str>) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let quoted = |(i, arg): (usize, &String)| {
            if i == 0 {
                arg.clone()
            } else {
                quote(arg)
            }
        };

        let argv: Vec<String> = argv.into_iter().collect();
        let dsn_position = dsn.and_then(|dsn| {
            argv.iter()
                .skip(1)
                .rposition(|arg| arg == dsn)
                .map(|i| i + 1)
        });

        self.args = argv.iter().enumerate().map(quoted).collect();
        self.safe_args = argv
            .iter()
            .enumerate()
            .filter(|(i, _)| Some(*i) != dsn_position)
            .map(quoted)
            .collect();
        self
    }

    /// Fill every derived name, type and statement
    ///
    /// Recomputes everything from the raw names and kinds, so calling it again
    /// with the same options leaves the metadata unchanged.
    pub fn create(&mut self, options: &MetadataOptions) -> Result<(), DbtogoError> {
        let mut imports = BTreeSet::new();
        let mut insert_stmts = Vec::with_capacity(self.structs.len());
        let mut select_stmts = Vec::with_capacity(self.structs.len());
        let mut struct_code = Vec::with_capacity(self.structs.len());
        let mut table_names = HashMap::new();

        for strct in &mut self.structs {
            strct.clean_name = clean_identifier(&strct.name, &strct.name, options.naming)?;
            check_unique(&mut table_names, &self.package, &strct.name, &strct.clean_name)?;

            let code = enrich_struct(strct, options, &mut imports)?;
            debug!(
                table = ?strct.name,
                clean_name = ?strct.clean_name,
                fields = ?strct.fields.len(),
                "Enriched table"
            );

            insert_stmts.push(code.insert);
            select_stmts.push(code.select);
            struct_code.push(code.declaration);
        }

        self.imports = imports;
        self.insert_stmts = insert_stmts;
        self.select_stmts = select_stmts;
        self.struct_code = struct_code;

        debug!(
            tables = ?self.structs.len(),
            imports = ?self.imports,
            policy = ?options.policy,
            "Metadata created"
        );
        Ok(())
    }
}

/// Command line arguments as strings, replacing invalid UTF-8 lossily
pub fn lossy_args<I>(argv: I) -> Vec<String>
where
    I: IntoIterator<Item = OsString>,
{
    argv.into_iter()
        .map(|arg| arg.to_string_lossy().into_owned())
        .collect()
}

/// Statements and declaration derived from one table
struct TableCode {
    insert: String,
    select: String,
    declaration: String,
}

fn enrich_struct(
    strct: &mut Struct,
    options: &MetadataOptions,
    imports: &mut BTreeSet<String>,
) -> Result<TableCode, DbtogoError> {
    let mut declaration = format!("type {} struct {{\n", strct.clean_name);
    let mut columns = Vec::with_capacity(strct.fields.len());
    let mut placeholders = Vec::with_capacity(strct.fields.len());
    let mut args = Vec::with_capacity(strct.fields.len());
    let mut field_names = HashMap::new();

    for (index, field) in strct.fields.iter_mut().enumerate() {
        field.clean_name = clean_identifier(&strct.name, &field.name, options.naming)?;
        check_unique(&mut field_names, &strct.name, &field.name, &field.clean_name)?;

        field.go_type = map_type(&field.data_type, options.policy, imports);
        field.placeholder = options.placeholder.token(index + 1);
        field.tag = if options.struct_tags {
            format!(" `sql:\"{}\"`", field.name)
        } else {
            String::new()
        };

        trace!(
            table = ?strct.name,
            field = ?field.name,
            native_type = ?field.native_type,
            go_type = ?field.go_type,
            "Mapped field"
        );

        declaration.push_str(&format!(
            "\t{} {}{}\n",
            field.clean_name, field.go_type, field.tag
        ));
        columns.push(field.clean_name.as_str());
        placeholders.push(field.placeholder.as_str());
        args.push(format!("&t.{}", field.clean_name));
    }

    declaration.push_str("}\n\n");
    declaration.push_str(&format!(
        "func (t *{}) Args() []interface{{}} {{\n\treturn []interface{{}}{{{}}}\n}}",
        strct.clean_name,
        args.join(", ")
    ));

    Ok(TableCode {
        insert: format!(
            "INSERT INTO {} ({}) VALUES ({})",
            strct.clean_name,
            columns.join(","),
            placeholders.join(",")
        ),
        select: format!("SELECT {} FROM {}", columns.join(","), strct.clean_name),
        declaration,
    })
}

/// Sanitize `raw` and make sure the result is a usable identifier
fn clean_identifier(table: &str, raw: &str, naming: NamingOptions) -> Result<String, DbtogoError> {
    if raw.is_empty() {
        return Err(DbtogoError::EmptyIdentifier {
            table: table.to_string(),
        });
    }

    let clean = sanitize(raw, naming);
    if !is_identifier(&clean) {
        return Err(DbtogoError::InvalidIdentifier {
            table: table.to_string(),
            name: raw.to_string(),
            clean,
        });
    }
    Ok(clean)
}

/// Reject a second raw name mapping onto an already used clean name
fn check_unique(
    seen: &mut HashMap<String, String>,
    scope: &str,
    raw: &str,
    clean: &str,
) -> Result<(), DbtogoError> {
    if let Some(first) = seen.get(clean) {
        return Err(DbtogoError::NameCollision {
            scope: scope.to_string(),
            first: first.clone(),
            second: raw.to_string(),
            clean: clean.to_string(),
        });
    }
    seen.insert(clean.to_string(), raw.to_string());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Field;
    use crate::types::{DataType, ExternalType};

    fn users() -> Struct {
        Struct::new(
            "users",
            vec![
                Field::new("id", "bigint", DataType::Int64),
                Field::new("name", "text", DataType::String),
                Field::new("email", "text", DataType::String).nullable(true),
            ],
        )
    }

    fn created(structs: Vec<Struct>, options: MetadataOptions) -> Metadata {
        let mut md = Metadata::new("model", structs);
        md.create(&options).unwrap();
        md
    }

    #[test]
    fn test_insert_statement() {
        let md = created(vec![users()], MetadataOptions::default());
        assert_eq!(
            md.insert_stmts,
            vec!["INSERT INTO Users (Id,Name,Email) VALUES (?,?,?)"]
        );
    }

    #[test]
    fn test_select_statement() {
        let md = created(vec![users()], MetadataOptions::default());
        assert_eq!(md.select_stmts, vec!["SELECT Id,Name,Email FROM Users"]);
    }

    #[test]
    fn test_dollar_placeholders() {
        let options = MetadataOptions {
            placeholder: Placeholder::Dollar,
            ..Default::default()
        };
        let md = created(vec![users()], options);
        assert_eq!(
            md.insert_stmts[0],
            "INSERT INTO Users (Id,Name,Email) VALUES ($1,$2,$3)"
        );
        assert_eq!(md.structs[0].fields[2].placeholder, "$3");
    }

    #[test]
    fn test_zero_field_table_is_degenerate() {
        let md = created(vec![Struct::new("empty", vec![])], MetadataOptions::default());
        assert_eq!(md.insert_stmts, vec!["INSERT INTO Empty () VALUES ()"]);
        assert_eq!(md.select_stmts, vec!["SELECT  FROM Empty"]);
        assert_eq!(
            md.struct_code[0],
            "type Empty struct {\n}\n\nfunc (t *Empty) Args() []interface{} {\n\treturn []interface{}{}\n}"
        );
    }

    #[test]
    fn test_declaration_and_accessor() {
        let md = created(vec![users()], MetadataOptions::default());
        assert_eq!(
            md.struct_code[0],
            "type Users struct {\n\tId int64\n\tName string\n\tEmail string\n}\n\n\
             func (t *Users) Args() []interface{} {\n\treturn []interface{}{&t.Id, &t.Name, &t.Email}\n}"
        );
    }

    #[test]
    fn test_struct_tags_use_raw_names() {
        let options = MetadataOptions {
            struct_tags: true,
            naming: NamingOptions {
                strip_underscores: true,
            },
            ..Default::default()
        };
        let table = Struct::new(
            "user_accounts",
            vec![Field::new("created_at", "timestamp", DataType::External(ExternalType::time()))],
        );
        let md = created(vec![table], options);

        let field = &md.structs[0].fields[0];
        assert_eq!(md.structs[0].clean_name, "Useraccounts");
        assert_eq!(field.clean_name, "Createdat");
        assert_eq!(field.tag, " `sql:\"created_at\"`");
        assert!(md.struct_code[0].contains("\tCreatedat time.Time `sql:\"created_at\"`\n"));
    }

    #[test]
    fn test_order_is_preserved() {
        let names = ["zeta", "alpha", "mid"];
        let structs = names
            .iter()
            .map(|name| {
                Struct::new(
                    *name,
                    vec![
                        Field::new("z", "int", DataType::Int64),
                        Field::new("a", "int", DataType::Int64),
                    ],
                )
            })
            .collect();
        let md = created(structs, MetadataOptions::default());

        let clean: Vec<_> = md.structs.iter().map(|s| s.clean_name.as_str()).collect();
        assert_eq!(clean, vec!["Zeta", "Alpha", "Mid"]);
        assert_eq!(md.select_stmts[1], "SELECT Z,A FROM Alpha");
    }

    #[test]
    fn test_null_policy_imports() {
        let table = Struct::new(
            "events",
            vec![
                Field::new("id", "bigint", DataType::Int64),
                Field::new("at", "timestamp", DataType::External(ExternalType::time())),
                Field::new("payload", "bytea", DataType::Bytes),
            ],
        );
        let options = MetadataOptions {
            policy: TypePolicy::Null,
            ..Default::default()
        };
        let md = created(vec![table], options);

        let go_types: Vec<_> = md.structs[0].fields.iter().map(|f| f.go_type.as_str()).collect();
        assert_eq!(go_types, vec!["sql.NullInt64", "*time.Time", "[]byte"]);
        assert_eq!(
            md.imports.iter().map(String::as_str).collect::<Vec<_>>(),
            vec!["database/sql", "time"]
        );
    }

    #[test]
    fn test_create_is_idempotent() {
        let options = MetadataOptions {
            policy: TypePolicy::Pointer,
            struct_tags: true,
            ..Default::default()
        };
        let mut md = Metadata::new("model", vec![users(), Struct::new("empty", vec![])]);
        md.create(&options).unwrap();
        let first = md.clone();
        md.create(&options).unwrap();
        assert_eq!(md, first);
    }

    #[test]
    fn test_field_collision_is_an_error() {
        let table = Struct::new(
            "users",
            vec![
                Field::new("user_id", "int", DataType::Int64),
                Field::new("userid", "int", DataType::Int64),
            ],
        );
        let options = MetadataOptions {
            naming: NamingOptions {
                strip_underscores: true,
            },
            ..Default::default()
        };
        let err = Metadata::new("model", vec![table]).create(&options).unwrap_err();
        match err {
            DbtogoError::NameCollision {
                first,
                second,
                clean,
                ..
            } => {
                assert_eq!(first, "user_id");
                assert_eq!(second, "userid");
                assert_eq!(clean, "Userid");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_table_collision_is_an_error() {
        let tables = vec![Struct::new("users", vec![]), Struct::new("Users", vec![])];
        let err = Metadata::new("model", tables)
            .create(&MetadataOptions::default())
            .unwrap_err();
        assert!(matches!(err, DbtogoError::NameCollision { .. }));
    }

    #[test]
    fn test_invalid_and_empty_identifiers() {
        let table = Struct::new("t", vec![Field::new("first name", "text", DataType::String)]);
        let err = Metadata::new("model", vec![table])
            .create(&MetadataOptions::default())
            .unwrap_err();
        assert!(matches!(err, DbtogoError::InvalidIdentifier { .. }));

        let table = Struct::new("t", vec![Field::new("", "text", DataType::String)]);
        let err = Metadata::new("model", vec![table])
            .create(&MetadataOptions::default())
            .unwrap_err();
        assert!(matches!(err, DbtogoError::EmptyIdentifier { .. }));
    }

    #[test]
    fn test_letter_numbers_are_invalid_identifiers() {
        for name in ["\u{2167}", "x\u{B2}", "size\u{2177}"] {
            let table = Struct::new("t", vec![Field::new(name, "int", DataType::Int64)]);
            let err = Metadata::new("model", vec![table])
                .create(&MetadataOptions::default())
                .unwrap_err();
            assert!(
                matches!(err, DbtogoError::InvalidIdentifier { .. }),
                "name = {name:?}"
            );
        }
    }

    #[test]
    fn test_tag_breaking_column_names_are_rejected() {
        let options = MetadataOptions {
            struct_tags: true,
            ..Default::default()
        };
        for name in ["say\"hi\"", "back`tick", "slash\\"] {
            let table = Struct::new("t", vec![Field::new(name, "text", DataType::String)]);
            let err = Metadata::new("model", vec![table]).create(&options).unwrap_err();
            assert!(
                matches!(err, DbtogoError::InvalidIdentifier { .. }),
                "name = {name:?}"
            );
        }
    }

    #[test]
    fn test_with_args_strips_dsn() {
        let argv = ["dbtogo", "sqlite3", "--types", "null", "./app.db"]
            .iter()
            .map(|s| s.to_string());
        let md = Metadata::new("model", vec![]).with_args(argv, Some("./app.db"));

        assert_eq!(
            md.args,
            vec!["dbtogo", "\"sqlite3\"", "\"--types\"", "\"null\"", "\"./app.db\""]
        );
        assert_eq!(md.safe_args, vec!["dbtogo", "\"sqlite3\"", "\"--types\"", "\"null\""]);
    }

    #[test]
    fn test_with_args_keeps_option_values_equal_to_dsn() {
        let argv = ["dbtogo", "sqlite3", "--package", "model", "model"]
            .iter()
            .map(|s| s.to_string());
        let md = Metadata::new("model", vec![]).with_args(argv, Some("model"));

        assert_eq!(
            md.safe_args,
            vec!["dbtogo", "\"sqlite3\"", "\"--package\"", "\"model\""]
        );
    }

    #[test]
    fn test_with_args_never_drops_program_name() {
        let argv = ["app.db", "sqlite3"].iter().map(|s| s.to_string());
        let md = Metadata::new("model", vec![]).with_args(argv, Some("app.db"));
        assert_eq!(md.safe_args, md.args);
    }

    #[test]
    fn test_with_args_without_dsn_keeps_everything() {
        let argv = ["dbtogo", "postgresql"].iter().map(|s| s.to_string());
        let md = Metadata::new("model", vec![]).with_args(argv, None);
        assert_eq!(md.safe_args, md.args);
    }

    #[cfg(unix)]
    #[test]
    fn test_lossy_args_accepts_invalid_utf8() {
        use std::os::unix::ffi::OsStringExt;

        let argv = vec![
            OsString::from("dbtogo"),
            OsString::from("--tpl"),
            OsString::from_vec(b"tpl\xffdir/model.tpl".to_vec()),
        ];
        assert_eq!(
            lossy_args(argv),
            vec!["dbtogo", "--tpl", "tpl\u{FFFD}dir/model.tpl"]
        );
    }
}
