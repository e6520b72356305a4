//! Clap derive structures for the `metadmin` CLI.
//!
//! Defines the command tree, global flags, and shared argument groups.
//! Depends only on clap so `build.rs` can include it for man pages.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// metadmin -- metadata-driven admin console
#[derive(Debug, Parser)]
#[command(
    name = "metadmin",
    version,
    about = "Browse and edit service entities from the command line",
    long_about = "A generic admin console for service/entity backends.\n\n\
        Every list, detail, add, and edit view is generated from entity\n\
        metadata; nothing is written per entity.",
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
    /// Configuration profile to use
    #[arg(long, short = 'p', env = "METADMIN_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Backend host (overrides profile)
    #[arg(long, env = "METADMIN_HOST", global = true)]
    pub host: Option<String>,

    /// Backend port (overrides profile)
    #[arg(long, env = "METADMIN_PORT", global = true)]
    pub port: Option<u16>,

    /// Entity metadata file, .json or .toml (overrides profile)
    #[arg(long, short = 'm', env = "METADMIN_METADATA", global = true)]
    pub metadata: Option<PathBuf>,

    /// Output format [default: from config, else table]
    #[arg(long, short = 'o', env = "METADMIN_OUTPUT", global = true)]
    pub output: Option<OutputFormat>,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "METADMIN_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
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

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
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
    /// Show services and their entities (the navigation menu)
    #[command(alias = "menu")]
    Services,

    /// Describe the fields of an entity
    Fields(EntityTarget),

    /// List records of an entity
    #[command(alias = "ls")]
    List(ListArgs),

    /// Show one record
    Get(GetArgs),

    /// Create a record
    Add(AddArgs),

    /// Edit a record
    Edit(EditArgs),

    /// Open a console path, e.g. /users/user/list or /users/user/<id>/edit
    Open {
        /// Console path
        path: String,
    },

    /// Sign in and store the session
    Login(LoginArgs),

    /// Clear the stored session
    Logout,

    /// Show backend and session status
    Status,

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Shared Arguments ─────────────────────────────────────────────────

/// `<SERVICE> <ENTITY>` pair naming one entity type.
#[derive(Debug, Clone, Args)]
pub struct EntityTarget {
    /// Service name, e.g. "users"
    pub service: String,

    /// Entity name, e.g. "user"
    pub entity: String,
}

/// Field values for add/edit.
#[derive(Debug, Args)]
pub struct ValueArgs {
    /// Field value as field=value (repeatable)
    #[arg(long = "set", short = 's', value_name = "FIELD=VALUE")]
    pub set: Vec<String>,

    /// Read field values from a JSON object file
    #[arg(long, short = 'F', value_name = "PATH")]
    pub from_file: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct ListArgs {
    #[command(flatten)]
    pub target: EntityTarget,

    /// Filter parameter as key=value; the value is taken as JSON when it parses (repeatable)
    #[arg(long = "param", short = 'P', value_name = "KEY=VALUE")]
    pub params: Vec<String>,

    /// Free-text search instead of a filtered list
    #[arg(long, short = 'Q', conflicts_with = "params")]
    pub query: Option<String>,
}

#[derive(Debug, Args)]
pub struct GetArgs {
    #[command(flatten)]
    pub target: EntityTarget,

    /// Record ID
    pub id: String,
}

#[derive(Debug, Args)]
pub struct AddArgs {
    #[command(flatten)]
    pub target: EntityTarget,

    #[command(flatten)]
    pub values: ValueArgs,
}

#[derive(Debug, Args)]
pub struct EditArgs {
    #[command(flatten)]
    pub target: EntityTarget,

    /// Record ID
    pub id: String,

    #[command(flatten)]
    pub values: ValueArgs,
}

#[derive(Debug, Args)]
pub struct LoginArgs {
    /// Account email (prompted when omitted)
    #[arg(long, short = 'e', env = "METADMIN_EMAIL")]
    pub email: Option<String>,

    /// Read the password from the first line of stdin
    #[arg(long)]
    pub password_stdin: bool,
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

    /// Print the config file path
    Path,

    /// Set a value on the active profile
    Set {
        /// Key: host, port, metadata, session_store, timeout, notify_on_error
        key: String,

        /// Value to set
        value: String,
    },

    /// List configured profiles
    Profiles,

    /// Set the default profile
    Use {
        /// Profile name to set as default
        name: String,
    },
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
