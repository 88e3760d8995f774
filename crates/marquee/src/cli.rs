//! Clap derive structures for the `marquee` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand, ValueEnum};

use marquee_core::{RentalStatus, UserRole};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// marquee -- admin dashboard for the video catalog, from the terminal
#[derive(Debug, Parser)]
#[command(
    name = "marquee",
    version,
    about = "Administer the video catalog from the command line",
    long_about = "Browse, create, edit and delete catalog records (genres, tags,\n\
        movies, rentals, users) and upload media, with the same paging,\n\
        permission and validation rules as the web dashboard.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Config profile to use
    #[arg(long, short = 'p', env = "MARQUEE_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Catalog API root URL (overrides profile)
    #[arg(long, env = "MARQUEE_API", global = true)]
    pub api: Option<String>,

    /// Service API key (overrides profile credentials)
    #[arg(long, env = "MARQUEE_API_KEY", global = true, hide_env = true)]
    pub api_key: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "MARQUEE_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "MARQUEE_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "MARQUEE_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage genres
    #[command(alias = "g")]
    Genres(GenresArgs),

    /// Manage tags
    #[command(alias = "t")]
    Tags(TagsArgs),

    /// Manage movies
    #[command(alias = "m")]
    Movies(MoviesArgs),

    /// Manage rentals
    #[command(alias = "r")]
    Rentals(RentalsArgs),

    /// Manage dashboard users
    #[command(alias = "u")]
    Users(UsersArgs),

    /// Upload media files to the blob store
    Upload(UploadArgs),

    /// Show the signed-in identity and its grants
    Whoami,

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Shared List Arguments ────────────────────────────────────────────

/// Paging, sorting and filtering shared by every list command.
///
/// These map onto the same URL parameters the web dashboard uses, so
/// `--query` accepts a pasted dashboard query string.
#[derive(Debug, Default, Args)]
pub struct ListArgs {
    /// Page number, starting at 1
    #[arg(long)]
    pub page: Option<u64>,

    /// Rows per page
    #[arg(long, short = 'l')]
    pub page_size: Option<u64>,

    /// Column to sort by
    #[arg(long, short = 's')]
    pub sort: Option<String>,

    /// Sort descending
    #[arg(long)]
    pub desc: bool,

    /// Column filter as field=value (repeatable)
    #[arg(long, short = 'f', value_name = "FIELD=VALUE")]
    pub filter: Vec<String>,

    /// Raw dashboard query string, e.g. "page=2&sort=name&order=desc"
    #[arg(long)]
    pub query: Option<String>,
}

// ── Genres ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GenresArgs {
    #[command(subcommand)]
    pub command: GenresCommand,
}

#[derive(Debug, Subcommand)]
pub enum GenresCommand {
    /// List genres
    #[command(alias = "ls")]
    List(ListArgs),

    /// Create a genre
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        description: Option<String>,
    },

    /// Update a genre
    Update {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },

    /// Delete a genre
    #[command(alias = "rm")]
    Delete { id: String },
}

// ── Tags ─────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct TagsArgs {
    #[command(subcommand)]
    pub command: TagsCommand,
}

#[derive(Debug, Subcommand)]
pub enum TagsCommand {
    /// List tags
    #[command(alias = "ls")]
    List(ListArgs),

    /// Create a tag
    Create {
        #[arg(long)]
        name: String,
    },

    /// Rename a tag
    Update {
        id: String,
        #[arg(long)]
        name: Option<String>,
    },

    /// Delete a tag
    #[command(alias = "rm")]
    Delete { id: String },
}

// ── Movies ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct MoviesArgs {
    #[command(subcommand)]
    pub command: MoviesCommand,
}

/// Editable movie fields shared by create and update.
#[derive(Debug, Args)]
pub struct MovieFields {
    #[arg(long)]
    pub description: Option<String>,

    /// Release year
    #[arg(long)]
    pub year: Option<i32>,

    /// Running time in minutes
    #[arg(long)]
    pub duration: Option<u32>,

    #[arg(long)]
    pub genre: Option<String>,

    /// Tag ID (repeatable)
    #[arg(long = "tag")]
    pub tags: Vec<String>,

    /// Poster image URL (see `marquee upload`)
    #[arg(long)]
    pub poster_url: Option<url::Url>,

    /// Video URL (see `marquee upload`)
    #[arg(long)]
    pub video_url: Option<url::Url>,
}

#[derive(Debug, Subcommand)]
pub enum MoviesCommand {
    /// List movies
    #[command(alias = "ls")]
    List(ListArgs),

    /// Create a movie
    Create {
        #[arg(long)]
        title: String,
        #[command(flatten)]
        fields: MovieFields,
    },

    /// Update a movie
    Update {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[command(flatten)]
        fields: MovieFields,
    },

    /// Delete a movie
    #[command(alias = "rm")]
    Delete { id: String },
}

// ── Rentals ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct RentalsArgs {
    #[command(subcommand)]
    pub command: RentalsCommand,
}

#[derive(Debug, Subcommand)]
pub enum RentalsCommand {
    /// List rentals
    #[command(alias = "ls")]
    List(ListArgs),

    /// Open a rental
    Create {
        #[arg(long)]
        user: String,
        #[arg(long)]
        movie: String,
        /// Price in cents
        #[arg(long)]
        price: Option<u64>,
        /// Expiry timestamp (RFC 3339)
        #[arg(long)]
        expires_at: Option<DateTime<Utc>>,
    },

    /// Change a rental's status or expiry
    Update {
        id: String,
        #[arg(long)]
        status: Option<RentalStatus>,
        /// Expiry timestamp (RFC 3339)
        #[arg(long)]
        expires_at: Option<DateTime<Utc>>,
    },

    /// Delete a rental
    #[command(alias = "rm")]
    Delete { id: String },
}

// ── Users ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct UsersArgs {
    #[command(subcommand)]
    pub command: UsersCommand,
}

#[derive(Debug, Subcommand)]
pub enum UsersCommand {
    /// List users
    #[command(alias = "ls")]
    List(ListArgs),

    /// Invite a user
    Create {
        #[arg(long)]
        email: String,
        #[arg(long)]
        name: Option<String>,
        /// admin, editor or viewer
        #[arg(long, default_value = "viewer")]
        role: UserRole,
    },

    /// Update a user
    Update {
        id: String,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        role: Option<UserRole>,
    },

    /// Delete a user
    #[command(alias = "rm")]
    Delete { id: String },
}

// ── Upload ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct UploadArgs {
    /// Files to upload, in order
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Maximum simultaneous uploads
    #[arg(long, default_value = "4")]
    pub concurrency: usize,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create initial config file with guided setup
    Init,

    /// Display current resolved configuration
    Show,

    /// Set a profile value
    Set {
        /// Profile key, e.g. "api", "page_size", "upload_accept"
        key: String,

        /// Value to set
        value: String,
    },

    /// Store the profile's API key or password in the system keyring
    SetToken {
        /// Profile to update (defaults to the active profile)
        #[arg(long)]
        profile: Option<String>,
    },
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
