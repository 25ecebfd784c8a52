//! Autojoin CLI - Build and run SQL from column requests
//!
//! Usage:
//!   autojoin query <request.json> (--schema <schema.json> | --database <db>) [--dialect <dialect>]
//!   autojoin update <request.json> (--schema <schema.json> | --database <db>)
//!   autojoin schema --database <db>
//!
//! Examples:
//!   autojoin query report.json --schema schema.json --dialect postgres
//!   autojoin query report.json --database app.db --format json
//!   autojoin update fix_email.json --database app.db

use std::fmt::Display;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use autojoin::builder::{build_select, build_update, BuiltStatement, QueryRequest, UpdateRequest};
use autojoin::config::Settings;
use autojoin::engine::Engine;
use autojoin::error::{ErrorKind, ErrorReport, QueryError};
use autojoin::executor::SqliteExecutor;
use autojoin::introspect::{JsonSchemaFile, SchemaSource, SqliteSource};
use autojoin::schema::{MetadataFilter, RawMetadata, SchemaGraph};
use autojoin::sql::Dialect;
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "autojoin")]
#[command(about = "Autojoin - SQL from column requests, with joins discovered through foreign keys")]
#[command(version)]
struct Cli {
    /// Path to a settings file (defaults to AUTOJOIN_CONFIG, ./autojoin.toml, then the user config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a SELECT; execute it when a database is given
    Query {
        /// Path to the request JSON
        request: PathBuf,

        #[command(flatten)]
        target: Target,
    },

    /// Build an UPDATE; execute it when a database is given
    Update {
        /// Path to the request JSON
        request: PathBuf,

        #[command(flatten)]
        target: Target,
    },

    /// Print the filtered metadata of a database as JSON
    Schema {
        /// SQLite database to introspect (defaults to the configured path)
        #[arg(long)]
        database: Option<PathBuf>,
    },
}

#[derive(Args)]
struct Target {
    /// Metadata JSON file; statements are printed but not executed
    #[arg(long, conflicts_with = "database")]
    schema: Option<PathBuf>,

    /// SQLite database to introspect and execute against
    #[arg(long)]
    database: Option<PathBuf>,

    /// SQL dialect to generate (defaults to the configured dialect)
    #[arg(short, long)]
    dialect: Option<DialectArg>,

    /// Output format
    #[arg(short, long, default_value = "sql")]
    format: OutputFormat,
}

#[derive(Clone, Copy, ValueEnum)]
enum DialectArg {
    Postgres,
    Mysql,
    Sqlite,
}

impl From<DialectArg> for Dialect {
    fn from(arg: DialectArg) -> Self {
        match arg {
            DialectArg::Postgres => Dialect::Postgres,
            DialectArg::Mysql => Dialect::MySql,
            DialectArg::Sqlite => Dialect::Sqlite,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// SQL text only
    Sql,
    /// SQL with its parameters as JSON
    Json,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = load_settings(cli.config.as_deref()).and_then(|settings| match cli.command {
        Commands::Query { request, target } => cmd_query(settings, &request, target),
        Commands::Update { request, target } => cmd_update(settings, &request, target),
        Commands::Schema { database } => cmd_schema(settings, database),
    });

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(report) => {
            match serde_json::to_string(&report) {
                Ok(json) => eprintln!("{}", json),
                Err(_) => eprintln!("{}: {}", report.kind, report.message),
            }
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

type CliResult<T> = Result<T, ErrorReport>;

fn failure(kind: ErrorKind, message: impl Display) -> ErrorReport {
    ErrorReport {
        kind,
        message: message.to_string(),
    }
}

fn report(err: QueryError) -> ErrorReport {
    ErrorReport::from(&err)
}

fn load_settings(path: Option<&Path>) -> CliResult<Settings> {
    let settings = match path {
        Some(path) => Settings::from_file(path),
        None => Settings::load(),
    }
    .and_then(Settings::apply_env)
    .map_err(|e| failure(ErrorKind::InvalidRequest, e))?;
    Ok(settings)
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> CliResult<T> {
    let content = fs::read_to_string(path).map_err(|e| {
        failure(
            ErrorKind::InvalidRequest,
            format!("Error reading file '{}': {}", path.display(), e),
        )
    })?;
    serde_json::from_str(&content).map_err(|e| {
        failure(
            ErrorKind::InvalidRequest,
            format!("Malformed request '{}': {}", path.display(), e),
        )
    })
}

fn print_json<T: Serialize>(value: &T) -> CliResult<()> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| failure(ErrorKind::InvalidRequest, e))?;
    println!("{}", json);
    Ok(())
}

fn print_statement(statement: &BuiltStatement, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Sql => {
            println!("{}", statement.sql);
            Ok(())
        }
        OutputFormat::Json => print_json(statement),
    }
}

/// Where statements go: a database to run against, or a metadata file only.
enum Backend {
    Database(Engine<SqliteExecutor>),
    Offline(SchemaGraph),
}

fn open_backend(settings: Settings, target: &Target) -> CliResult<Backend> {
    let mut settings = settings;
    if let Some(dialect) = target.dialect {
        settings.dialect = dialect.into();
    }

    if let Some(schema) = &target.schema {
        let raw = JsonSchemaFile::new(schema).introspect().map_err(|e| report(e.into()))?;
        let raw = MetadataFilter::from(&settings.schema).apply(raw);
        let graph = SchemaGraph::build(&raw).map_err(|e| report(e.into()))?;
        info!(tables = graph.tables().len(), "loaded schema file");
        return Ok(Backend::Offline(graph));
    }

    let engine = open_engine(settings, target.database.clone())?;
    Ok(Backend::Database(engine))
}

fn database_path(settings: &Settings, database: Option<PathBuf>) -> CliResult<PathBuf> {
    if let Some(path) = database {
        return Ok(path);
    }
    settings
        .database
        .resolved_path()
        .map_err(|e| failure(ErrorKind::InvalidRequest, e))?
        .ok_or_else(|| {
            failure(
                ErrorKind::InvalidRequest,
                "No schema source: pass --schema or --database, or set [database] path",
            )
        })
}

fn introspect_database(path: &Path) -> CliResult<(SqliteExecutor, RawMetadata)> {
    let executor = SqliteExecutor::open(path).map_err(|e| report(e.into()))?;
    let raw = SqliteSource::new(executor.connection())
        .introspect()
        .map_err(|e| report(e.into()))?;
    Ok((executor, raw))
}

fn open_engine(settings: Settings, database: Option<PathBuf>) -> CliResult<Engine<SqliteExecutor>> {
    let path = database_path(&settings, database)?;
    let (executor, raw) = introspect_database(&path)?;
    Engine::from_metadata(raw, executor, settings).map_err(report)
}

fn cmd_query(settings: Settings, request: &Path, target: Target) -> CliResult<()> {
    let mut request: QueryRequest = read_json(request)?;
    let default_limit = settings.query.default_limit;
    let dialect = target.dialect.map(Dialect::from).unwrap_or(settings.dialect);

    match open_backend(settings, &target)? {
        Backend::Offline(graph) => {
            if request.limit.is_none() {
                request.limit = default_limit;
            }
            let statement = build_select(&graph, dialect, request).map_err(report)?;
            print_statement(&statement, target.format)
        }
        Backend::Database(engine) => {
            let statement = engine.build_query(request).map_err(report)?;
            print_statement(&statement, target.format)?;
            let rows = engine.execute(&statement).map_err(report)?;
            print_json(&rows)
        }
    }
}

fn cmd_update(settings: Settings, request: &Path, target: Target) -> CliResult<()> {
    let request: UpdateRequest = read_json(request)?;
    let dialect = target.dialect.map(Dialect::from).unwrap_or(settings.dialect);

    match open_backend(settings, &target)? {
        Backend::Offline(graph) => {
            let statement = build_update(&graph, dialect, request).map_err(report)?;
            print_statement(&statement, target.format)
        }
        Backend::Database(engine) => {
            let statement = engine.build_update(request).map_err(report)?;
            print_statement(&statement, target.format)?;
            let rows = engine.execute(&statement).map_err(report)?;
            print_json(&serde_json::json!({ "rows_affected": rows.rows_affected }))
        }
    }
}

fn cmd_schema(settings: Settings, database: Option<PathBuf>) -> CliResult<()> {
    let path = database_path(&settings, database)?;
    let (_, raw) = introspect_database(&path)?;
    let raw = MetadataFilter::from(&settings.schema).apply(raw);
    print_json(&raw)
}
