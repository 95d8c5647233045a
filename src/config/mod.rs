//! Configuration layer: typed settings with layered precedence (file → env → CLI).

use std::{
    net::SocketAddr,
    num::NonZeroU32,
    path::PathBuf,
    str::FromStr,
};

use apalis_cron::Schedule;
use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;
use url::Url;

use crate::domain::types::PostsLimit;

mod cli;

pub use cli::{
    CliArgs, Command, RenderArgs, RenderKind, ServeArgs, ServeOverrides, SourceOverride,
};

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "forum-llms-txt";
const ENV_PREFIX: &str = "FORUM_LLMS_TXT";
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 8;
const DEFAULT_CACHE_TTL_MINUTES: u32 = 60;
const DEFAULT_SCHEDULE: &str = "0 0 * * * *";
const DEFAULT_BASE_URL: &str = "http://localhost:3000";
const DEFAULT_SITE_TITLE: &str = "Forum";
const DEFAULT_LATEST_TOPICS: u32 = 20;
const DEFAULT_EXCERPT_LENGTH: u32 = 500;

/// Fully-resolved deployment settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub logging: LoggingSettings,
    pub database: DatabaseSettings,
    pub cache: CacheSettings,
    pub scheduler: SchedulerSettings,
    pub site: SiteSettings,
    pub llms: LlmsSettings,
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub addr: SocketAddr,
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

/// Content source: the forum database or, for offline use, a JSON export.
#[derive(Debug, Clone)]
pub struct DatabaseSettings {
    pub url: Option<String>,
    pub max_connections: NonZeroU32,
    pub export_path: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct CacheSettings {
    pub ttl_minutes: NonZeroU32,
}

#[derive(Debug, Clone)]
pub struct SchedulerSettings {
    /// Validated six-field cron expression.
    pub schedule: String,
}

impl SchedulerSettings {
    pub fn cron(&self) -> Result<Schedule, LoadError> {
        parse_schedule(&self.schedule)
    }
}

/// Host forum identity used in rendered documents.
#[derive(Debug, Clone)]
pub struct SiteSettings {
    /// Absolute base URL without a trailing slash.
    pub base_url: String,
    pub title: String,
    pub description: String,
    pub about_url: Option<String>,
    pub faq_url: Option<String>,
    pub tos_url: Option<String>,
    pub privacy_url: Option<String>,
    pub tagging_enabled: bool,
}

#[derive(Debug, Clone)]
pub struct LlmsSettings {
    pub enabled: bool,
    pub allow_indexing: bool,
    pub intro_text: String,
    pub full_description: String,
    pub latest_topics_count: u32,
    pub posts_limit: PostsLimit,
    pub min_views: u32,
    pub include_excerpts: bool,
    pub excerpt_length: NonZeroU32,
    /// Shared secret for the webhook and status routes; `None` leaves them unmounted.
    pub webhook_secret: Option<String>,
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

    builder = builder.add_source(Environment::with_prefix(ENV_PREFIX).separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;

    match cli.command.as_ref() {
        Some(Command::Serve(args)) => raw.apply_serve_overrides(&args.overrides),
        Some(Command::Render(args)) => raw.apply_source_override(&args.source),
        None => raw.apply_serve_overrides(&ServeOverrides::default()),
    }

    Settings::from_raw(raw)
}

/// Resolve configuration using the supplied CLI arguments, returning both for downstream use.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    server: RawServerSettings,
    logging: RawLoggingSettings,
    database: RawDatabaseSettings,
    cache: RawCacheSettings,
    scheduler: RawSchedulerSettings,
    site: RawSiteSettings,
    llms: RawLlmsSettings,
}

impl RawSettings {
    fn apply_serve_overrides(&mut self, overrides: &ServeOverrides) {
        self.apply_source_override(&overrides.source);

        if let Some(host) = overrides.server_host.as_ref() {
            self.server.host = Some(host.clone());
        }
        if let Some(port) = overrides.server_port {
            self.server.port = Some(port);
        }
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
        if let Some(ttl) = overrides.cache_ttl_minutes {
            self.cache.ttl_minutes = Some(ttl);
        }
        if let Some(schedule) = overrides.scheduler_schedule.as_ref() {
            self.scheduler.schedule = Some(schedule.clone());
        }
        if let Some(base_url) = overrides.site_base_url.as_ref() {
            self.site.base_url = Some(base_url.clone());
        }
        if let Some(enabled) = overrides.llms_enabled {
            self.llms.enabled = Some(enabled);
        }
        if let Some(allow) = overrides.llms_allow_indexing {
            self.llms.allow_indexing = Some(allow);
        }
    }

    fn apply_source_override(&mut self, overrides: &SourceOverride) {
        if let Some(url) = overrides.database_url.as_ref() {
            self.database.url = Some(url.clone());
        }
        if let Some(path) = overrides.export_path.as_ref() {
            self.database.export_path = Some(path.clone());
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            server,
            logging,
            database,
            cache,
            scheduler,
            site,
            llms,
        } = raw;

        let server = build_server_settings(server)?;
        let logging = build_logging_settings(logging)?;
        let database = build_database_settings(database)?;
        let cache = build_cache_settings(cache)?;
        let scheduler = build_scheduler_settings(scheduler)?;
        let site = build_site_settings(site)?;
        let llms = build_llms_settings(llms)?;

        Ok(Self {
            server,
            logging,
            database,
            cache,
            scheduler,
            site,
            llms,
        })
    }
}

fn build_server_settings(server: RawServerSettings) -> Result<ServerSettings, LoadError> {
    let host = server.host.unwrap_or_else(|| DEFAULT_HOST.to_string());

    let port = server.port.unwrap_or(DEFAULT_PORT);
    if port == 0 {
        return Err(LoadError::invalid(
            "server.port",
            "port must be greater than zero",
        ));
    }

    let addr = parse_socket_addr(&host, port)
        .map_err(|reason| LoadError::invalid("server.addr", reason))?;

    Ok(ServerSettings { addr })
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_database_settings(database: RawDatabaseSettings) -> Result<DatabaseSettings, LoadError> {
    let url = non_blank(database.url);
    let export_path = database
        .export_path
        .filter(|path| !path.as_os_str().is_empty());

    if url.is_some() && export_path.is_some() {
        return Err(LoadError::invalid(
            "database.export_path",
            "cannot be combined with database.url",
        ));
    }

    let max_connections = non_zero_u32(
        database
            .max_connections
            .unwrap_or(DEFAULT_DB_MAX_CONNECTIONS)
            .into(),
        "database.max_connections",
    )?;

    Ok(DatabaseSettings {
        url,
        max_connections,
        export_path,
    })
}

fn build_cache_settings(cache: RawCacheSettings) -> Result<CacheSettings, LoadError> {
    let ttl_minutes = non_zero_u32(
        cache.ttl_minutes.unwrap_or(DEFAULT_CACHE_TTL_MINUTES).into(),
        "cache.ttl_minutes",
    )?;

    Ok(CacheSettings { ttl_minutes })
}

fn build_scheduler_settings(
    scheduler: RawSchedulerSettings,
) -> Result<SchedulerSettings, LoadError> {
    let schedule = non_blank(scheduler.schedule).unwrap_or_else(|| DEFAULT_SCHEDULE.to_string());
    parse_schedule(&schedule)?;

    Ok(SchedulerSettings { schedule })
}

fn build_site_settings(site: RawSiteSettings) -> Result<SiteSettings, LoadError> {
    let raw_base = non_blank(site.base_url).unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
    let parsed = Url::parse(&raw_base)
        .map_err(|err| LoadError::invalid("site.base_url", format!("failed to parse: {err}")))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(LoadError::invalid(
            "site.base_url",
            "scheme must be http or https",
        ));
    }
    let base_url = raw_base.trim_end_matches('/').to_string();

    Ok(SiteSettings {
        base_url,
        title: non_blank(site.title).unwrap_or_else(|| DEFAULT_SITE_TITLE.to_string()),
        description: site.description.unwrap_or_default().trim().to_string(),
        about_url: non_blank(site.about_url),
        faq_url: non_blank(site.faq_url),
        tos_url: non_blank(site.tos_url),
        privacy_url: non_blank(site.privacy_url),
        tagging_enabled: site.tagging_enabled.unwrap_or(true),
    })
}

fn build_llms_settings(llms: RawLlmsSettings) -> Result<LlmsSettings, LoadError> {
    let posts_limit = llms
        .posts_limit
        .as_deref()
        .map(PostsLimit::parse_lenient)
        .unwrap_or_default();

    let excerpt_length = non_zero_u32(
        llms.excerpt_length.unwrap_or(DEFAULT_EXCERPT_LENGTH).into(),
        "llms.excerpt_length",
    )?;

    Ok(LlmsSettings {
        enabled: llms.enabled.unwrap_or(true),
        allow_indexing: llms.allow_indexing.unwrap_or(true),
        intro_text: verbatim_text(llms.intro_text),
        full_description: verbatim_text(llms.full_description),
        latest_topics_count: llms.latest_topics_count.unwrap_or(DEFAULT_LATEST_TOPICS),
        posts_limit,
        min_views: llms.min_views.unwrap_or(0),
        include_excerpts: llms.include_excerpts.unwrap_or(true),
        excerpt_length,
        webhook_secret: non_blank(llms.webhook_secret),
    })
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawServerSettings {
    host: Option<String>,
    port: Option<u16>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawDatabaseSettings {
    url: Option<String>,
    max_connections: Option<u32>,
    export_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawCacheSettings {
    ttl_minutes: Option<u32>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSchedulerSettings {
    schedule: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSiteSettings {
    base_url: Option<String>,
    title: Option<String>,
    description: Option<String>,
    about_url: Option<String>,
    faq_url: Option<String>,
    tos_url: Option<String>,
    privacy_url: Option<String>,
    tagging_enabled: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLlmsSettings {
    enabled: Option<bool>,
    allow_indexing: Option<bool>,
    intro_text: Option<String>,
    full_description: Option<String>,
    latest_topics_count: Option<u32>,
    posts_limit: Option<String>,
    min_views: Option<u32>,
    include_excerpts: Option<bool>,
    excerpt_length: Option<u32>,
    webhook_secret: Option<String>,
}

fn parse_socket_addr(host: &str, port: u16) -> Result<SocketAddr, String> {
    let candidate = format!("{host}:{port}");
    candidate
        .parse()
        .map_err(|err| format!("invalid address `{candidate}`: {err}"))
}

fn parse_schedule(expression: &str) -> Result<Schedule, LoadError> {
    Schedule::from_str(expression).map_err(|err| {
        LoadError::invalid(
            "scheduler.schedule",
            format!("invalid cron expression `{expression}`: {err}"),
        )
    })
}

/// Operator-authored text is kept as written; whitespace-only values count as unset.
fn verbatim_text(value: Option<String>) -> String {
    value
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_default()
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    })
}

fn non_zero_u32(value: u64, key: &'static str) -> Result<NonZeroU32, LoadError> {
    if value == 0 {
        return Err(LoadError::invalid(key, "must be greater than zero"));
    }
    let value_u32: u32 = value
        .try_into()
        .map_err(|_| LoadError::invalid(key, "value exceeds supported range for u32"))?;
    NonZeroU32::new(value_u32).ok_or_else(|| LoadError::invalid(key, "must be greater than zero"))
}

#[cfg(test)]
mod tests;
