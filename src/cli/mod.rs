//! Command-line interface for mongoq
//!
//! This module handles:
//! - Command-line argument parsing using clap
//! - Configuration loading and CLI overrides
//! - Connection URI and database resolution (URI, profile or flags)
//! - Running a subcommand against a connected dispatcher

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use tracing::debug;

use crate::config::{Config, OutputFormat};
use crate::connection::{ConnectionManager, ConnectionProfile};
use crate::error::{ConnectionError, ExecutionError, Result};
use crate::executor::{IndexSpec, Pagination, QueryDispatcher};
use crate::formatter::Formatter;
use crate::parser::preprocess;
use crate::utils::fs::expand_home;
use crate::utils::string::redact_uri;

/// Extract database name from MongoDB connection URI
///
/// # Arguments
/// * `uri` - MongoDB connection URI
///
/// # Returns
/// * `Option<String>` - Database name if found in URI
fn extract_database_from_uri(uri: &str) -> Option<String> {
    // Format: mongodb://[username:password@]host[:port][/database][?options]
    let after_scheme = uri.split_once("://")?.1;
    let path = after_scheme.split_once('/')?.1;
    let db_name = path.split('?').next().unwrap_or("");

    if db_name.is_empty() {
        None
    } else {
        Some(db_name.to_string())
    }
}

/// Parse `--format`
fn parse_output_format(value: &str) -> std::result::Result<OutputFormat, String> {
    match value.to_lowercase().as_str() {
        "json" => Ok(OutputFormat::Json),
        "json-pretty" | "jsonpretty" => Ok(OutputFormat::JsonPretty),
        "table" => Ok(OutputFormat::Table),
        other => Err(format!(
            "unknown format '{other}' (expected json, json-pretty or table)"
        )),
    }
}

/// Query MongoDB with shell-style query text
#[derive(Parser, Debug)]
#[command(
    name = "mongoq",
    version,
    about = "Run shell-style MongoDB queries from the command line",
    long_about = "Normalizes loosely written MongoDB shell queries into strict JSON and runs
find or aggregate calls with server-side paging, explain and index management."
)]
pub struct CliArgs {
    /// MongoDB connection URI
    ///
    /// Format: mongodb://[username:password@]host[:port][/database][?options]
    #[arg(value_name = "URI")]
    pub uri: Option<String>,

    /// Connection profile from the config file
    ///
    /// Example: mongoq -d staging collections
    #[arg(short = 'd', long, value_name = "NAME")]
    pub datasource: Option<String>,

    /// Server to connect to
    #[arg(long, value_name = "HOST")]
    pub host: Option<String>,

    /// Port to connect to
    #[arg(long, value_name = "PORT")]
    pub port: Option<u16>,

    /// Database name to use
    #[arg(long, value_name = "NAME")]
    pub database: Option<String>,

    /// Username for authentication
    #[arg(short = 'u', long, value_name = "USERNAME")]
    pub username: Option<String>,

    /// Password for authentication
    #[arg(short = 'p', long, value_name = "PASSWORD")]
    pub password: Option<String>,

    /// Enable TLS/SSL
    #[arg(long)]
    pub tls: bool,

    /// Configuration file path
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    pub config_file: Option<PathBuf>,

    /// Output format (json, json-pretty, table)
    #[arg(long, value_name = "FORMAT", value_parser = parse_output_format)]
    pub format: Option<OutputFormat>,

    /// Disable colored output
    #[arg(long = "no-color")]
    pub no_color: bool,

    /// Connection timeout in seconds
    #[arg(long, value_name = "SECONDS")]
    pub timeout: Option<u64>,

    /// Verbose mode (debug logging)
    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// Very verbose mode (trace logging)
    #[arg(long = "vv")]
    pub very_verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Subcommands for mongoq
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the normalized query text without connecting
    Preprocess {
        #[arg(value_name = "QUERY")]
        query: String,
    },

    /// Run a find or aggregate query
    Query {
        /// Query text, e.g. 'db.users.find({age: {$gt: 21}})'
        #[arg(value_name = "QUERY")]
        query: String,

        /// Zero-based page number
        #[arg(long, default_value_t = 0)]
        page: u64,

        /// Rows per page (defaults to [query] page_size)
        #[arg(long, value_name = "N")]
        page_size: Option<u64>,

        /// Show the query plan instead of rows
        #[arg(long)]
        explain: bool,
    },

    /// List collections of the current database
    Collections,

    /// Manage indexes
    Indexes {
        #[command(subcommand)]
        action: IndexCommand,
    },
}

/// Index subcommands
#[derive(Subcommand, Debug)]
pub enum IndexCommand {
    /// List indexes of a collection
    List {
        #[arg(value_name = "COLL")]
        collection: String,
    },

    /// Create an index
    Create {
        #[arg(value_name = "COLL")]
        collection: String,

        /// Index keys as FIELD or FIELD:DIR (1, -1, text, hashed, 2dsphere)
        #[arg(value_name = "FIELD[:DIR]", required = true)]
        keys: Vec<String>,

        #[command(flatten)]
        options: IndexArgs,
    },

    /// Drop an index by name
    Drop {
        #[arg(value_name = "COLL")]
        collection: String,

        #[arg(value_name = "NAME")]
        name: String,
    },

    /// Replace an index: drop it, then create the new definition
    Update {
        #[arg(value_name = "COLL")]
        collection: String,

        /// Name of the index to replace
        #[arg(value_name = "NAME")]
        index: String,

        #[arg(value_name = "FIELD[:DIR]", required = true)]
        keys: Vec<String>,

        #[command(flatten)]
        options: IndexArgs,
    },
}

/// Options shared by `indexes create` and `indexes update`
#[derive(Args, Debug, Clone, Default)]
pub struct IndexArgs {
    /// Index name
    #[arg(long, value_name = "NAME")]
    pub name: Option<String>,

    /// Reject duplicate keys
    #[arg(long)]
    pub unique: bool,

    /// Skip documents without the indexed fields
    #[arg(long)]
    pub sparse: bool,

    /// Expire documents after this many seconds
    #[arg(long, value_name = "SECS")]
    pub ttl: Option<u64>,
}

impl IndexArgs {
    /// Build an index definition from `FIELD[:DIR]` arguments
    fn to_spec(&self, keys: &[String]) -> Result<IndexSpec> {
        let keys = keys
            .iter()
            .map(|key| IndexSpec::parse_key(key))
            .collect::<std::result::Result<Vec<_>, String>>()
            .map_err(ExecutionError::InvalidParameters)?;

        Ok(IndexSpec {
            keys,
            name: self.name.clone(),
            unique: self.unique,
            sparse: self.sparse,
            expire_after_secs: self.ttl,
        })
    }
}

/// CLI interface handler
pub struct CliInterface {
    /// Parsed command-line arguments
    args: CliArgs,

    /// Loaded configuration
    config: Config,
}

impl CliInterface {
    /// Parse the process arguments and load configuration
    pub fn new() -> Result<Self> {
        Self::from_args(CliArgs::parse())
    }

    /// Create a CLI interface from already parsed arguments
    pub fn from_args(args: CliArgs) -> Result<Self> {
        let config = Self::load_config(&args)?;
        Ok(Self { args, config })
    }

    /// Load configuration from file and apply CLI overrides
    fn load_config(args: &CliArgs) -> Result<Config> {
        let path = args
            .config_file
            .as_ref()
            .map(|path| expand_home(&path.to_string_lossy()));
        let mut config = Config::load_from_file(path.as_deref())?;
        Self::apply_args_to_config(&mut config, args);
        Ok(config)
    }

    /// Overrides configuration values with CLI arguments where provided
    fn apply_args_to_config(config: &mut Config, args: &CliArgs) {
        if let Some(format) = args.format {
            config.display.format = format;
        }

        if args.no_color {
            config.display.color_output = false;
        }

        if let Some(timeout) = args.timeout {
            config.connection.timeout = timeout;
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get the CLI arguments
    pub fn args(&self) -> &CliArgs {
        &self.args
    }

    /// Profile selected with `-d/--datasource`, if any
    fn selected_profile(&self) -> Result<Option<ConnectionProfile>> {
        match &self.args.datasource {
            Some(name) => self
                .config
                .profile(name)
                .map(Some)
                .ok_or_else(|| ConnectionError::UnknownProfile(name.clone()).into()),
            None => Ok(None),
        }
    }

    /// Get the MongoDB connection URI
    ///
    /// Priority:
    /// 1. Connection profile (`-d/--datasource`)
    /// 2. Explicit URI argument
    /// 3. Individual connection flags (`--host`, `--port`, `-u`, `--tls`)
    /// 4. `[connection] default_uri` from the config
    pub fn connection_uri(&self) -> Result<String> {
        if let Some(profile) = self.selected_profile()? {
            return Ok(profile.uri());
        }

        if let Some(uri) = &self.args.uri {
            return Ok(uri.clone());
        }

        if self.has_connection_flags() {
            return Ok(self.profile_from_args().uri());
        }

        Ok(self.config.connection.default_uri.clone())
    }

    fn has_connection_flags(&self) -> bool {
        self.args.host.is_some()
            || self.args.port.is_some()
            || self.args.username.is_some()
            || self.args.tls
    }

    /// Ad-hoc profile from the individual connection flags
    fn profile_from_args(&self) -> ConnectionProfile {
        let defaults = ConnectionProfile::default();
        ConnectionProfile {
            name: String::new(),
            host: self.args.host.clone().unwrap_or(defaults.host),
            port: self.args.port.unwrap_or(defaults.port),
            database: self.args.database.clone().unwrap_or(defaults.database),
            username: self.args.username.clone(),
            password: self.args.password.clone(),
            tls: self.args.tls,
        }
    }

    /// Get the database name to use
    ///
    /// Priority:
    /// 1. `--database`
    /// 2. Database of the selected profile
    /// 3. Database name from the connection URI
    /// 4. `test`
    pub fn database(&self) -> Result<String> {
        if let Some(db) = &self.args.database {
            return Ok(db.clone());
        }

        if let Some(profile) = self.selected_profile()? {
            return Ok(profile.database);
        }

        let uri = self.connection_uri()?;
        Ok(extract_database_from_uri(&uri).unwrap_or_else(|| "test".to_string()))
    }

    /// Run the selected subcommand and print its output
    pub async fn run(&self) -> Result<()> {
        if let Commands::Preprocess { query } = &self.args.command {
            println!("{}", preprocess(query));
            return Ok(());
        }

        let uri = self.connection_uri()?;
        let database = self.database()?;
        debug!("Using database '{}' on {}", database, redact_uri(&uri));

        let mut manager = ConnectionManager::new(uri, self.config.connection.clone());
        manager.connect().await?;

        let mut dispatcher = QueryDispatcher::with_limits(self.config.query_limits());
        dispatcher.connect(Arc::new(manager.backend()?), database);

        let output = self.execute(&dispatcher).await;
        manager.disconnect().await;

        println!("{}", output?);
        Ok(())
    }

    /// Execute the subcommand against a connected dispatcher
    ///
    /// # Returns
    /// * `Result<String>` - Formatted output
    async fn execute(&self, dispatcher: &QueryDispatcher) -> Result<String> {
        let formatter = Formatter::from_config(&self.config.display);

        match &self.args.command {
            Commands::Preprocess { query } => Ok(preprocess(query)),
            Commands::Query {
                query,
                page,
                page_size,
                explain,
            } => {
                let page_size = page_size.unwrap_or(self.config.query.page_size);
                let outcome = dispatcher
                    .execute(query, Pagination::new(*page, page_size), *explain)
                    .await?;
                Ok(formatter.format_outcome(&outcome))
            }
            Commands::Collections => {
                let names = dispatcher.list_collections().await?;
                Ok(formatter.format_names("collection", &names))
            }
            Commands::Indexes { action } => self.execute_index(dispatcher, &formatter, action).await,
        }
    }

    async fn execute_index(
        &self,
        dispatcher: &QueryDispatcher,
        formatter: &Formatter,
        action: &IndexCommand,
    ) -> Result<String> {
        match action {
            IndexCommand::List { collection } => {
                let indexes = dispatcher.list_indexes(collection).await?;
                Ok(formatter.format_documents(&indexes))
            }
            IndexCommand::Create {
                collection,
                keys,
                options,
            } => {
                let spec = options.to_spec(keys)?;
                let name = dispatcher.create_index(collection, &spec).await?;
                Ok(format!("Created index '{name}'"))
            }
            IndexCommand::Drop { collection, name } => {
                dispatcher.drop_index(collection, name).await?;
                Ok(format!("Dropped index '{name}'"))
            }
            IndexCommand::Update {
                collection,
                index,
                keys,
                options,
            } => {
                let mut spec = options.to_spec(keys)?;
                // The replacement keeps the old name unless a new one is given
                spec.name.get_or_insert_with(|| index.clone());
                let created = dispatcher.update_index(collection, index, &spec).await?;
                Ok(format!("Replaced index '{index}' with '{created}'"))
            }
        }
    }
}
