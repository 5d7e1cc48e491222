use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use tracing::{debug, error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use dbtogo::codegen::{
    generate_to, CodeGenConfig, GoGenerator, OutputMode, OutputTarget, TemplateSource,
};
use dbtogo::config::DsnConfig;
use dbtogo::introspect::TableFilter;
use dbtogo::metadata::{lossy_args, Metadata, MetadataOptions, Placeholder};
use dbtogo::naming::NamingOptions;
use dbtogo::schema::Struct;
use dbtogo::types::TypePolicy;

#[derive(Debug, Clone, ValueEnum)]
enum Database {
    Postgresql,
    Sqlite3,
}

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum CliTypePolicy {
    /// Plain value types
    #[default]
    Bare,
    /// database/sql null wrappers
    Null,
    /// Pointers to the plain types
    Pointer,
}

impl From<CliTypePolicy> for TypePolicy {
    fn from(policy: CliTypePolicy) -> Self {
        match policy {
            CliTypePolicy::Bare => TypePolicy::Bare,
            CliTypePolicy::Null => TypePolicy::Null,
            CliTypePolicy::Pointer => TypePolicy::Pointer,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "dbtogo")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Source database type
    database: Database,

    /// Data source name (default: $DBTOGO_DSN)
    dsn: Option<String>,

    /// Template file; repeat to make several available for include/import
    #[arg(long = "tpl")]
    templates: Vec<PathBuf>,

    /// Template to start rendering from (default: base name of the first --tpl)
    #[arg(long)]
    entry: Option<String>,

    /// Skip gofmt
    #[arg(long)]
    nofmt: bool,

    /// Indent with this many spaces instead of tabs
    #[arg(long)]
    tabwidth: Option<usize>,

    /// Output file, `-` for stdout
    #[arg(short, long, default_value = "-")]
    output: String,

    /// How column types are rendered
    #[arg(long, value_enum, default_value_t = CliTypePolicy::Bare)]
    types: CliTypePolicy,

    /// Drop underscores from generated names
    #[arg(long)]
    nounderscore: bool,

    /// Add sql:"<column>" struct tags
    #[arg(long)]
    sqlstruct: bool,

    /// Go package name
    #[arg(long, default_value = "model")]
    package: String,

    /// Write the fixed document instead of rendering a template
    #[arg(long)]
    direct: bool,

    /// Database schema to introspect (default: public for PostgreSQL, main for SQLite)
    #[arg(long)]
    schema: Option<String>,

    /// Path to .env file for connection config
    #[arg(long, default_value = "./.env")]
    env_file: PathBuf,

    /// Comma-separated list of tables to include (default: all)
    #[arg(long, value_delimiter = ',')]
    tables: Option<Vec<String>>,

    /// Comma-separated list of tables to exclude
    #[arg(long, value_delimiter = ',')]
    exclude: Option<Vec<String>>,

    /// Verbose output (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() {
    if let Err(e) = run() {
        error!(error = ?e, "Fatal error");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    info!("dbtogo v{}", env!("CARGO_PKG_VERSION"));
    info!(
        database = ?cli.database,
        output = ?cli.output,
        types = ?cli.types,
        direct = ?cli.direct,
        templates = ?cli.templates,
        "Starting code generation"
    );

    // Templates and formatter first, so they fail before any database work
    let template = if cli.templates.is_empty() {
        TemplateSource::Builtin
    } else {
        TemplateSource::files(cli.templates.clone(), cli.entry.clone())?
    };
    let mode = if cli.direct {
        OutputMode::Direct
    } else {
        OutputMode::Template
    };
    let codegen_config = CodeGenConfig::new(OutputTarget::parse(&cli.output))
        .with_output_mode(mode)
        .with_template(template)
        .with_format(!cli.nofmt)
        .with_tab_width(cli.tabwidth);
    debug!(codegen_config = ?codegen_config, "Code generation config");

    let generator =
        GoGenerator::new(&codegen_config).context("Failed to prepare code generation")?;

    let config = DsnConfig::load(&cli.env_file, cli.dsn.as_deref())
        .context("Failed to load database configuration")?;
    debug!(dsn = ?config.redacted(), "Loaded configuration");

    let filter = TableFilter {
        include: cli.tables.clone(),
        exclude: cli.exclude.clone(),
    };
    if !filter.is_empty() {
        debug!(filter = ?filter, "Table filter configured");
    }

    let (structs, placeholder) =
        introspect_database(&cli.database, &config, cli.schema.as_deref(), &filter)?;

    if structs.is_empty() {
        warn!("No tables found after filtering");
    }
    for table in &structs {
        debug!(table = ?table.name, columns = ?table.fields.len(), "Table");
    }

    let options = MetadataOptions {
        policy: cli.types.into(),
        naming: NamingOptions {
            strip_underscores: cli.nounderscore,
        },
        struct_tags: cli.sqlstruct,
        placeholder,
    };

    let argv = lossy_args(std::env::args_os());
    let mut metadata = Metadata::new(cli.package.as_str(), structs).with_args(argv, config.cli_dsn());
    metadata
        .create(&options)
        .context("Failed to derive names and types")?;

    generate_to(&generator, &metadata, &codegen_config.output)
        .context("Failed to generate code")?;

    info!(tables = ?metadata.structs.len(), "Done");
    Ok(())
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };

    // Generated code may go to stdout
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

fn introspect_database(
    database: &Database,
    config: &DsnConfig,
    schema_name: Option<&str>,
    filter: &TableFilter,
) -> Result<(Vec<Struct>, Placeholder)> {
    match database {
        Database::Postgresql => introspect_postgres(config, schema_name, filter),
        Database::Sqlite3 => introspect_sqlite(config, schema_name, filter),
    }
}

#[cfg(feature = "postgres")]
fn introspect_postgres(
    config: &DsnConfig,
    schema_name: Option<&str>,
    filter: &TableFilter,
) -> Result<(Vec<Struct>, Placeholder)> {
    use dbtogo::error::DbtogoError;
    use dbtogo::introspect::Introspector;
    use dbtogo::PostgresIntrospector;
    use postgres::NoTls;

    info!(dsn = ?config.redacted(), "Connecting to PostgreSQL");

    let mut client = postgres::Client::connect(&config.dsn, NoTls).map_err(|e| {
        DbtogoError::Connection(format!("PostgreSQL at {}: {}", config.redacted(), e))
    })?;

    info!("Connected to database");

    let mut introspector = PostgresIntrospector::new(&mut client);
    let schema_name = schema_name.unwrap_or(introspector.default_schema());
    let structs = introspector
        .introspect(schema_name, filter)
        .context("Failed to introspect schema")?;

    Ok((structs, introspector.placeholder()))
}

#[cfg(not(feature = "postgres"))]
fn introspect_postgres(
    _config: &DsnConfig,
    _schema_name: Option<&str>,
    _filter: &TableFilter,
) -> Result<(Vec<Struct>, Placeholder)> {
    bail!("PostgreSQL support not enabled. Rebuild with --features postgres")
}

#[cfg(feature = "sqlite")]
fn introspect_sqlite(
    config: &DsnConfig,
    schema_name: Option<&str>,
    filter: &TableFilter,
) -> Result<(Vec<Struct>, Placeholder)> {
    use dbtogo::error::DbtogoError;
    use dbtogo::introspect::Introspector;
    use dbtogo::SqliteIntrospector;
    use rusqlite::{Connection, OpenFlags};

    info!(dsn = ?config.redacted(), "Opening SQLite database");

    let flags = OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_URI;
    let conn = Connection::open_with_flags(&config.dsn, flags).map_err(|e| {
        DbtogoError::Connection(format!("SQLite at {}: {}", config.redacted(), e))
    })?;

    let mut introspector = SqliteIntrospector::new(&conn);
    let schema_name = schema_name.unwrap_or(introspector.default_schema());
    let structs = introspector
        .introspect(schema_name, filter)
        .context("Failed to introspect schema")?;

    Ok((structs, introspector.placeholder()))
}

#[cfg(not(feature = "sqlite"))]
fn introspect_sqlite(
    _config: &DsnConfig,
    _schema_name: Option<&str>,
    _filter: &TableFilter,
) -> Result<(Vec<Struct>, Placeholder)> {
    bail!("SQLite support not enabled. Rebuild with --features sqlite")
}
