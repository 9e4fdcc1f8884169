//! idr-graphql CLI — run GraphQL queries against a metadata database.
//!
//! Usage:
//!   idr-graphql query '<document>' [--variables json] [--db path]
//!   idr-graphql schema
//!   idr-graphql init [--db path]
//!   idr-graphql load <file.sql> [--db path]

use async_graphql::{Request, Variables};
use clap::{Parser, Subcommand};
use idr_graphql::{build_schema, execute, Config, OpenSession, SqliteSession};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "idr-graphql",
    version,
    about = "GraphQL queries over imaging repository metadata"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Path to a YAML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Path to SQLite database file (overrides the config file)
    #[arg(long, global = true)]
    db: Option<PathBuf>,
    /// Log filter (overrides the config file; RUST_LOG wins over both)
    #[arg(long, global = true)]
    log: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a GraphQL document and print the JSON response
    Query {
        /// The GraphQL document; read from --file when omitted
        document: Option<String>,
        /// Read the document from a file
        #[arg(long, conflicts_with = "document")]
        file: Option<PathBuf>,
        /// Variables as a JSON object
        #[arg(long)]
        variables: Option<String>,
        /// Operation to run when the document holds several
        #[arg(long)]
        operation: Option<String>,
    },
    /// Print the schema in SDL
    Schema,
    /// Create the metadata tables in the database
    Init,
    /// Execute a SQL file against the database
    Load {
        /// SQL file to execute
        path: PathBuf,
    },
}

fn init_tracing(filter: &str) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
}

fn open_session(config: &Config) -> Result<SqliteSession, String> {
    let db_path = config.database_path();
    tracing::info!(db = %db_path.display(), "opening metadata database");
    SqliteSession::open(&db_path).map_err(|e| format!("Failed to open database: {}", e))
}

fn build_request(
    document: String,
    variables: Option<&str>,
    operation: Option<String>,
) -> Result<Request, String> {
    let mut request = Request::new(document);
    if let Some(raw) = variables {
        let json: serde_json::Value =
            serde_json::from_str(raw).map_err(|e| format!("invalid --variables: {}", e))?;
        request = request.variables(Variables::from_json(json));
    }
    if let Some(name) = operation {
        request = request.operation_name(name);
    }
    Ok(request)
}

fn cmd_query(
    config: &Config,
    document: Option<String>,
    file: Option<PathBuf>,
    variables: Option<String>,
    operation: Option<String>,
) -> i32 {
    let document = match (document, file) {
        (Some(doc), _) => doc,
        (None, Some(path)) => match std::fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) => {
                eprintln!("Error: cannot read '{}': {}", path.display(), e);
                return 1;
            }
        },
        (None, None) => {
            eprintln!("Error: no query document given (pass it inline or with --file)");
            return 1;
        }
    };

    let request = match build_request(document, variables.as_deref(), operation) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };

    let session = match open_session(config) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };

    let rt = match tokio::runtime::Builder::new_current_thread().build() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("failed to create tokio runtime: {}", e);
            return 1;
        }
    };

    let schema = build_schema();
    let response = rt.block_on(execute(&schema, Arc::new(session), request));
    let failed = response.is_err();

    let rendered = if config.pretty {
        serde_json::to_string_pretty(&response)
    } else {
        serde_json::to_string(&response)
    };
    match rendered {
        Ok(text) => println!("{}", text),
        Err(e) => {
            eprintln!("Error: cannot serialize response: {}", e);
            return 1;
        }
    }

    if failed {
        1
    } else {
        0
    }
}

fn cmd_schema() -> i32 {
    println!("{}", build_schema().sdl());
    0
}

fn cmd_init(config: &Config) -> i32 {
    match open_session(config) {
        Ok(_) => {
            println!("Initialized {}", config.database_path().display());
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn cmd_load(config: &Config, path: &Path) -> i32 {
    let sql = match std::fs::read_to_string(path) {
        Ok(sql) => sql,
        Err(e) => {
            eprintln!("Error: cannot read '{}': {}", path.display(), e);
            return 1;
        }
    };
    let session = match open_session(config) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    match session.execute_batch(&sql) {
        Ok(()) => {
            println!("Loaded {}", path.display());
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => match Config::load(path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        },
        None => Config::default(),
    };
    if let Some(db) = cli.db {
        config.database = Some(db);
    }
    if let Some(log) = cli.log {
        config.log = log;
    }

    init_tracing(&config.log);

    let code = match cli.command {
        Commands::Query {
            document,
            file,
            variables,
            operation,
        } => cmd_query(&config, document, file, variables, operation),
        Commands::Schema => cmd_schema(),
        Commands::Init => cmd_init(&config),
        Commands::Load { path } => cmd_load(&config, &path),
    };
    std::process::exit(code);
}
