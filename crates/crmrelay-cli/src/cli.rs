use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use crmrelay_core::models::{ActionableKind, EntityType, Priority};

#[derive(Parser)]
#[command(name = "crmrelay")]
#[command(about = "Relay calls and actionables to HubSpot, retrying failed syncs with backoff")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Optional path to local database file
    #[arg(long, global = true, value_name = "PATH")]
    pub db_path: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Sync an entity to HubSpot, starting a fresh sync lineage
    Sync {
        /// Entity type
        #[arg(value_enum)]
        entity: EntityArg,
        /// Entity ID
        id: String,
        /// Acting user ID
        #[arg(long, value_name = "USER")]
        user: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Retry a failed sync record
    Retry {
        /// Sync record ID
        sync_id: String,
        /// Requesting user; the record must belong to them
        #[arg(long, value_name = "USER")]
        user: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Retry every eligible failed sync record
    Sweep {
        /// Keep sweeping on an interval until interrupted
        #[arg(long)]
        watch: bool,
        /// Seconds between sweeps in watch mode
        #[arg(long, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..))]
        interval: Option<u64>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show sync records
    Status {
        /// Only show failed records
        #[arg(long)]
        failed: bool,
        /// Only show records of this user
        #[arg(long, value_name = "USER")]
        user: Option<String>,
        /// Number of records to show
        #[arg(short, long)]
        limit: Option<usize>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Manage per-user HubSpot integration settings
    Integration {
        #[command(subcommand)]
        command: IntegrationCommands,
    },
    /// Manage calls in the local store
    Call {
        #[command(subcommand)]
        command: CallCommands,
    },
    /// Manage actionables in the local store
    Actionable {
        #[command(subcommand)]
        command: ActionableCommands,
    },
    /// Generate shell completion scripts
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: CompletionShell,
        /// Optional output path (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
pub enum IntegrationCommands {
    /// Store a user's HubSpot private-app token
    Set {
        /// User ID
        #[arg(long, value_name = "USER")]
        user: String,
        /// HubSpot private-app token
        #[arg(long, value_name = "KEY")]
        api_key: String,
        /// Store the integration switched off
        #[arg(long)]
        disabled: bool,
    },
}

#[derive(Subcommand)]
pub enum CallCommands {
    /// Record a call
    Add {
        /// Owning user ID
        #[arg(long, value_name = "USER")]
        user: String,
        /// Call title
        #[arg(long)]
        title: String,
        /// Call transcription
        #[arg(long)]
        transcription: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum ActionableCommands {
    /// Record an actionable
    Add(ActionableAddArgs),
}

#[derive(Args)]
pub struct ActionableAddArgs {
    /// Owning user ID
    #[arg(long, value_name = "USER")]
    pub user: String,
    /// Actionable title
    #[arg(long)]
    pub title: String,
    /// CRM object the actionable becomes
    #[arg(long, value_enum, default_value_t = KindArg::Task)]
    pub kind: KindArg,
    /// Priority
    #[arg(long, value_enum, default_value_t = PriorityArg::Medium)]
    pub priority: PriorityArg,
    /// Due date as RFC 3339 (e.g. 2024-05-01T17:00:00Z)
    #[arg(long, value_name = "DATE")]
    pub due: Option<String>,
    /// Deal amount
    #[arg(long)]
    pub amount: Option<f64>,
    /// Longer description
    #[arg(long)]
    pub description: Option<String>,
    /// Source call ID
    #[arg(long, value_name = "ID")]
    pub call: Option<String>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum EntityArg {
    Call,
    Actionable,
}

impl From<EntityArg> for EntityType {
    fn from(value: EntityArg) -> Self {
        match value {
            EntityArg::Call => Self::Call,
            EntityArg::Actionable => Self::Actionable,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum KindArg {
    Task,
    Deal,
}

impl From<KindArg> for ActionableKind {
    fn from(value: KindArg) -> Self {
        match value {
            KindArg::Task => Self::Task,
            KindArg::Deal => Self::Deal,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum PriorityArg {
    Low,
    Medium,
    High,
}

impl From<PriorityArg> for Priority {
    fn from(value: PriorityArg) -> Self {
        match value {
            PriorityArg::Low => Self::Low,
            PriorityArg::Medium => Self::Medium,
            PriorityArg::High => Self::High,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
}

impl From<CompletionShell> for clap_complete::Shell {
    fn from(value: CompletionShell) -> Self {
        match value {
            CompletionShell::Bash => Self::Bash,
            CompletionShell::Zsh => Self::Zsh,
            CompletionShell::Fish => Self::Fish,
        }
    }
}
