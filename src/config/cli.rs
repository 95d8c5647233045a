use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum, ValueHint, builder::BoolishValueParser};

/// Command-line arguments for the forum-llms-txt binary.
#[derive(Debug, Parser)]
#[command(
    name = "forum-llms-txt",
    version,
    about = "llms.txt generator for Discourse forums"
)]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(
        long = "config-file",
        env = "FORUM_LLMS_TXT_CONFIG_FILE",
        value_name = "PATH"
    )]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Serve the llms.txt routes and run the hourly freshness job.
    Serve(Box<ServeArgs>),
    /// Build a single document and print it to stdout.
    Render(RenderArgs),
}

/// Where forum content is read from.
#[derive(Debug, Args, Default, Clone)]
pub struct SourceOverride {
    /// Override the forum database connection URL.
    #[arg(long = "database-url", value_name = "URL")]
    pub database_url: Option<String>,

    /// Read content from a JSON forum export instead of the database.
    #[arg(long = "export", value_name = "PATH", value_hint = ValueHint::FilePath)]
    pub export_path: Option<PathBuf>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeArgs {
    #[command(flatten)]
    pub overrides: ServeOverrides,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeOverrides {
    #[command(flatten)]
    pub source: SourceOverride,

    /// Override the listener host.
    #[arg(long = "server-host", value_name = "HOST")]
    pub server_host: Option<String>,

    /// Override the listener port.
    #[arg(long = "server-port", value_name = "PORT")]
    pub server_port: Option<u16>,

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

    /// Override the document cache lifetime.
    #[arg(long = "cache-ttl-minutes", value_name = "MINUTES")]
    pub cache_ttl_minutes: Option<u32>,

    /// Override the freshness job cron expression (six fields, seconds first).
    #[arg(long = "scheduler-schedule", value_name = "CRON")]
    pub scheduler_schedule: Option<String>,

    /// Override the forum's public base URL.
    #[arg(long = "site-base-url", value_name = "URL")]
    pub site_base_url: Option<String>,

    /// Toggle the generator.
    #[arg(
        long = "llms-enabled",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub llms_enabled: Option<bool>,

    /// Toggle whether crawlers may fetch the documents.
    #[arg(
        long = "llms-allow-indexing",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub llms_allow_indexing: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RenderKind {
    Navigation,
    Full,
    Sitemap,
    Category,
    Topic,
    Tag,
}

#[derive(Debug, Args, Clone)]
pub struct RenderArgs {
    #[command(flatten)]
    pub source: SourceOverride,

    /// Document to build.
    #[arg(value_enum, value_name = "KIND")]
    pub kind: RenderKind,

    /// Category path, topic id or tag name for entity documents.
    #[arg(value_name = "TARGET")]
    pub target: Option<String>,
}
