//! Configuration layer: typed settings with layered precedence (file → env → CLI).

use std::{num::NonZeroU32, path::PathBuf, str::FromStr};

use clap::{Args, Parser, Subcommand, builder::BoolishValueParser};
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;

use crate::cache::CacheConfig;

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "rubrica";
const DEFAULT_BASE_URL: &str = "http://127.0.0.1:3001";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_PAGE_SIZE: u32 = 20;

/// Command-line arguments for the Rubrica binary.
#[derive(Debug, Parser)]
#[command(name = "rubrica", version, about = "Rubrica CRM console")]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "RUBRICA_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    #[command(flatten)]
    pub overrides: GlobalOverrides,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Args, Default, Clone)]
pub struct GlobalOverrides {
    /// Override the API base URL.
    #[arg(long = "api-base-url", env = "RUBRICA_API__BASE_URL", value_name = "URL")]
    pub api_base_url: Option<String>,

    /// Override the API key used for Bearer authentication.
    #[arg(long = "api-key", env = "RUBRICA_API__KEY", value_name = "KEY")]
    pub api_key: Option<String>,

    /// Override the request timeout.
    #[arg(long = "api-timeout-seconds", value_name = "SECONDS")]
    pub api_timeout_seconds: Option<u64>,

    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub log_json: Option<bool>,

    /// Disable the query cache for this invocation.
    #[arg(long = "no-cache", action = clap::ArgAction::SetTrue)]
    pub no_cache: bool,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Work with customer records.
    Customers(CustomersArgs),
    /// Work with contact records.
    Contacts(ContactsArgs),
    /// Work with customer segments.
    Segments(SegmentsArgs),
    /// Work with support tickets.
    Tickets(TicketsArgs),
    /// Work with tags.
    Tags(TagsArgs),
}

#[derive(Debug, Args, Clone)]
pub struct CustomersArgs {
    #[command(subcommand)]
    pub command: CustomersCommand,
}

#[derive(Debug, Subcommand, Clone)]
pub enum CustomersCommand {
    /// List customers, optionally filtered.
    List(ListArgs),
    /// Show a single customer.
    Show(ShowArgs),
    /// Create a customer.
    Create(CustomerCreateArgs),
    /// Update fields on a customer.
    Update(CustomerUpdateArgs),
    /// Delete a customer.
    Delete(DeleteArgs),
}

#[derive(Debug, Args, Clone)]
pub struct ContactsArgs {
    #[command(subcommand)]
    pub command: ContactsCommand,
}

#[derive(Debug, Subcommand, Clone)]
pub enum ContactsCommand {
    /// List contacts, optionally filtered.
    List(ListArgs),
    /// Show a single contact.
    Show(ShowArgs),
    /// Create a contact attached to a customer.
    Create(ContactCreateArgs),
    /// Delete a contact.
    Delete(DeleteArgs),
}

#[derive(Debug, Args, Clone)]
pub struct SegmentsArgs {
    #[command(subcommand)]
    pub command: SegmentsCommand,
}

#[derive(Debug, Subcommand, Clone)]
pub enum SegmentsCommand {
    /// List segments.
    List(ListArgs),
    /// Create a segment.
    Create(SegmentCreateArgs),
    /// Delete a segment.
    Delete(DeleteArgs),
}

#[derive(Debug, Args, Clone)]
pub struct TicketsArgs {
    #[command(subcommand)]
    pub command: TicketsCommand,
}

#[derive(Debug, Subcommand, Clone)]
pub enum TicketsCommand {
    /// List support tickets, optionally filtered.
    List(ListArgs),
    /// Show a single ticket.
    Show(ShowArgs),
    /// Open a new ticket for a customer.
    Create(TicketCreateArgs),
    /// Delete a ticket.
    Delete(DeleteArgs),
}

#[derive(Debug, Args, Clone)]
pub struct TagsArgs {
    #[command(subcommand)]
    pub command: TagsCommand,
}

#[derive(Debug, Subcommand, Clone)]
pub enum TagsCommand {
    /// List tags.
    List(ListArgs),
    /// Create a tag.
    Create(TagCreateArgs),
    /// Delete a tag.
    Delete(DeleteArgs),
}

#[derive(Debug, Args, Default, Clone)]
pub struct ListArgs {
    /// Page number (1-based).
    #[arg(long, default_value_t = 1)]
    pub page: u32,

    /// Free-text search.
    #[arg(long)]
    pub search: Option<String>,

    /// Status filter (e.g. active|inactive, or open|closed for tickets).
    #[arg(long)]
    pub status: Option<String>,

    /// Subtype filter (e.g. individual|business for customers).
    #[arg(long = "type")]
    pub kind: Option<String>,

    /// Segment id filter.
    #[arg(long)]
    pub segment: Option<String>,
}

#[derive(Debug, Args, Clone)]
pub struct ShowArgs {
    /// Record id.
    #[arg(value_name = "ID")]
    pub id: String,
}

#[derive(Debug, Args, Clone)]
pub struct DeleteArgs {
    /// Record id.
    #[arg(value_name = "ID")]
    pub id: String,
}

#[derive(Debug, Args, Clone)]
pub struct CustomerCreateArgs {
    /// Customer type: individual or business.
    #[arg(long = "type", value_name = "TYPE")]
    pub customer_type: String,

    #[arg(long)]
    pub company_name: Option<String>,
    #[arg(long)]
    pub first_name: Option<String>,
    #[arg(long)]
    pub last_name: Option<String>,
    #[arg(long)]
    pub email: Option<String>,
    #[arg(long)]
    pub phone: Option<String>,
    #[arg(long)]
    pub website: Option<String>,
    #[arg(long)]
    pub notes: Option<String>,
}

#[derive(Debug, Args, Clone)]
pub struct CustomerUpdateArgs {
    /// Record id.
    #[arg(value_name = "ID")]
    pub id: String,

    #[arg(long = "type", value_name = "TYPE")]
    pub customer_type: Option<String>,
    #[arg(long)]
    pub status: Option<String>,
    #[arg(long)]
    pub company_name: Option<String>,
    #[arg(long)]
    pub first_name: Option<String>,
    #[arg(long)]
    pub last_name: Option<String>,
    #[arg(long)]
    pub email: Option<String>,
    #[arg(long)]
    pub phone: Option<String>,
    #[arg(long)]
    pub website: Option<String>,
    #[arg(long)]
    pub notes: Option<String>,
}

#[derive(Debug, Args, Clone)]
pub struct ContactCreateArgs {
    /// Owning customer id.
    #[arg(long)]
    pub customer_id: String,

    #[arg(long)]
    pub first_name: String,
    #[arg(long)]
    pub last_name: String,
    #[arg(long)]
    pub title: Option<String>,
    #[arg(long)]
    pub email: Option<String>,
    #[arg(long)]
    pub phone: Option<String>,

    /// Mark this contact as the customer's primary contact.
    #[arg(long, action = clap::ArgAction::SetTrue)]
    pub primary: bool,
}

#[derive(Debug, Args, Clone)]
pub struct TicketCreateArgs {
    /// Owning customer id.
    #[arg(long)]
    pub customer_id: String,

    #[arg(long)]
    pub subject: String,
    #[arg(long)]
    pub description: String,

    /// Ticket priority: low|medium|high|urgent.
    #[arg(long, default_value = "medium")]
    pub priority: String,

    #[arg(long)]
    pub category: Option<String>,
}

#[derive(Debug, Args, Clone)]
pub struct SegmentCreateArgs {
    #[arg(long)]
    pub name: String,
    #[arg(long)]
    pub description: Option<String>,
    #[arg(long)]
    pub criteria: Option<String>,
}

#[derive(Debug, Args, Clone)]
pub struct TagCreateArgs {
    #[arg(long)]
    pub name: String,
    #[arg(long)]
    pub color: Option<String>,
    #[arg(long)]
    pub description: Option<String>,
}

/// Fully-resolved settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub api: ApiSettings,
    pub logging: LoggingSettings,
    pub cache: CacheConfig,
    pub query: QuerySettings,
}

#[derive(Debug, Clone)]
pub struct ApiSettings {
    pub base_url: String,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone)]
pub struct QuerySettings {
    pub page_size: NonZeroU32,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(Environment::with_prefix("RUBRICA").separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;
    raw.apply_overrides(&cli.overrides);

    Settings::from_raw(raw)
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    api: RawApiSettings,
    logging: RawLoggingSettings,
    cache: CacheConfig,
    query: RawQuerySettings,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawApiSettings {
    base_url: Option<String>,
    key: Option<String>,
    timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawQuerySettings {
    page_size: Option<u32>,
}

impl RawSettings {
    fn apply_overrides(&mut self, overrides: &GlobalOverrides) {
        if let Some(url) = overrides.api_base_url.as_ref() {
            self.api.base_url = Some(url.clone());
        }
        if let Some(key) = overrides.api_key.as_ref() {
            self.api.key = Some(key.clone());
        }
        if let Some(secs) = overrides.api_timeout_seconds {
            self.api.timeout_seconds = Some(secs);
        }
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
        if overrides.no_cache {
            self.cache.enabled = false;
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            api,
            logging,
            cache,
            query,
        } = raw;

        let api = build_api_settings(api)?;
        let logging = build_logging_settings(logging)?;
        let query = build_query_settings(query)?;

        Ok(Self {
            api,
            logging,
            cache,
            query,
        })
    }
}

fn build_api_settings(api: RawApiSettings) -> Result<ApiSettings, LoadError> {
    let base_url = api
        .base_url
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

    let api_key = api.key.and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    });

    let timeout_secs = api.timeout_seconds.unwrap_or(DEFAULT_TIMEOUT_SECS);
    if timeout_secs == 0 {
        return Err(LoadError::invalid(
            "api.timeout_seconds",
            "must be greater than zero",
        ));
    }

    Ok(ApiSettings {
        base_url,
        api_key,
        timeout_secs,
    })
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::WARN,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_query_settings(query: RawQuerySettings) -> Result<QuerySettings, LoadError> {
    let page_size_value = query.page_size.unwrap_or(DEFAULT_PAGE_SIZE);
    let page_size = NonZeroU32::new(page_size_value)
        .ok_or_else(|| LoadError::invalid("query.page_size", "must be greater than zero"))?;
    Ok(QuerySettings { page_size })
}

/// Resolve configuration using the supplied CLI arguments, returning both for downstream use.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}
