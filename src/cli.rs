use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::render::OutputFormat;

#[derive(Debug, Parser)]
#[command(
    name = "social-aggregator",
    version,
    about = "Aggregate social network posts into curated resource feeds"
)]
pub struct Cli {
    /// Config file to use instead of the per-user default
    #[arg(global = true, long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage feeds
    #[command(subcommand)]
    Feed(FeedCommand),

    /// Manage aggregator configs
    #[command(subcommand)]
    Aggregator(AggregatorCommand),

    /// List the configured social plugins
    Plugins,

    /// Fetch posts for the given aggregators
    Run {
        slugs: Vec<String>,
        /// Run every stored aggregator
        #[arg(long, conflicts_with = "slugs")]
        all: bool,
    },

    /// Public listing of activated resources
    List {
        #[arg(long)]
        feed: Option<String>,
        #[arg(long, default_value_t = 1)]
        page: usize,
        #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,
    },

    /// Render every activated resource of a feed, without pagination
    RenderFeed { slug: String },

    /// Editor listing of all resources
    Resources {
        #[arg(long)]
        feed: Option<String>,
        #[arg(long)]
        social_type: Option<String>,
        #[arg(long)]
        activated: Option<bool>,
        #[arg(long)]
        updated: Option<bool>,
    },

    /// Mark resources as activated
    Activate {
        #[arg(required = true)]
        slugs: Vec<String>,
    },

    /// Mark resources as unactivated
    Deactivate {
        #[arg(required = true)]
        slugs: Vec<String>,
    },

    /// Duplicate resources under a fresh slug
    Duplicate {
        #[arg(required = true)]
        slugs: Vec<String>,
    },

    /// Edit the display settings of a resource
    Curate {
        slug: String,
        #[arg(long)]
        priority: Option<i64>,
        #[arg(long)]
        favorite: Option<bool>,
        #[arg(long)]
        language: Option<String>,
        #[arg(long)]
        short_description: Option<String>,
        #[arg(long)]
        view_size: Option<String>,
        #[arg(long)]
        text_display: Option<String>,
        #[arg(long)]
        button_label: Option<String>,
        #[arg(long)]
        button_color: Option<String>,
        #[arg(long)]
        background_color: Option<String>,
        #[arg(long)]
        new_page: Option<bool>,
        /// Replace the tags (repeatable)
        #[arg(long = "tag")]
        tags: Vec<String>,
        /// Remove every tag
        #[arg(long, conflicts_with = "tags")]
        clear_tags: bool,
    },

    /// Attach an image file to a resource
    SetImage {
        slug: String,
        path: PathBuf,
        #[arg(long)]
        thumbnail: bool,
    },
}

#[derive(Debug, Subcommand)]
pub enum FeedCommand {
    Add {
        name: String,
        #[arg(long)]
        slug: Option<String>,
    },
    Rename {
        slug: String,
        name: String,
    },
    List,
}

#[derive(Debug, Subcommand)]
pub enum AggregatorCommand {
    Add {
        name: String,
        #[arg(long)]
        query: String,
        #[arg(long)]
        plugin: String,
        /// Target feed slug (repeatable)
        #[arg(long = "feed", required = true)]
        feeds: Vec<String>,
        #[arg(long)]
        slug: Option<String>,
    },
    List,
}
