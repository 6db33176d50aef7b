use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum, builder::BoolishValueParser};
use uuid::Uuid;

/// Command-line arguments for the feedline binary.
#[derive(Debug, Parser)]
#[command(name = "feedline", version, about = "Activity timeline maintenance tool")]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "FEEDLINE_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    #[command(flatten)]
    pub overrides: GlobalOverrides,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Apply pending database migrations.
    Migrate,
    /// Print a user's feed as JSON.
    Timeline(TimelineArgs),
    /// Print the posts a user authored as JSON.
    Posts(PostsArgs),
    /// Print the comments on a post as JSON.
    Comments(CommentsArgs),
}

#[derive(Debug, Args, Clone)]
pub struct TimelineArgs {
    /// Feed owner.
    #[arg(long, value_name = "UUID")]
    pub user: Uuid,

    /// Only include entries newer than this many days.
    #[arg(long = "max-age-days", value_name = "DAYS")]
    pub max_age_days: Option<u32>,
}

#[derive(Debug, Args, Clone)]
pub struct PostsArgs {
    /// Post author.
    #[arg(long, value_name = "UUID")]
    pub user: Uuid,

    /// Print only the number of posts.
    #[arg(long, action = clap::ArgAction::SetTrue)]
    pub count: bool,
}

#[derive(Debug, Args, Clone)]
pub struct CommentsArgs {
    /// Post whose comments are listed.
    #[arg(long, value_name = "UUID")]
    pub post: Uuid,

    #[arg(long, value_enum, default_value_t = CommentFilterArg::All)]
    pub filter: CommentFilterArg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CommentFilterArg {
    All,
    Approved,
    Disapproved,
}

#[derive(Debug, Args, Default, Clone)]
pub struct GlobalOverrides {
    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new(),
        global = true
    )]
    pub log_json: Option<bool>,

    /// Override the database connection URL.
    #[arg(long = "database-url", value_name = "URL", global = true)]
    pub database_url: Option<String>,

    /// Toggle the collection cache.
    #[arg(
        long = "cache-enabled",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new(),
        global = true
    )]
    pub cache_enabled: Option<bool>,

    /// Toggle follow aggregation in feeds.
    #[arg(
        long = "follows-enabled",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new(),
        global = true
    )]
    pub follows_enabled: Option<bool>,

    /// Override the media root directory.
    #[arg(long = "media-root", value_name = "PATH", global = true)]
    pub media_root: Option<PathBuf>,
}
