use clap::{Args, Parser, Subcommand};
use dayledger_core::{EntryType, TaskPriority, TaskStatus};
use uuid::Uuid;

#[derive(Parser)]
#[command(
    name = "dayledger",
    about = concat!("dayledger v", env!("CARGO_PKG_VERSION"), " - profile-scoped tasks, notes and daily review"),
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// SQLite database file (env: DAYLEDGER_DB_PATH)
    #[arg(long, global = true)]
    pub db: Option<String>,

    /// Absolute directory for rolling log files (env: DAYLEDGER_LOG_DIR)
    #[arg(long = "log-dir", global = true)]
    pub log_dir: Option<String>,

    /// trace|debug|info|warn|error (env: DAYLEDGER_LOG_LEVEL)
    #[arg(long = "log-level", global = true)]
    pub log_level: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Seed demo profiles and entries on first run
    Bootstrap,
    /// List profiles
    Profiles,
    /// Make a profile active by key
    Use(UseArgs),
    /// Create a new (inactive) profile
    AddProfile(AddProfileArgs),
    /// Create an entry in a profile
    Add(AddArgs),
    /// Patch fields of an entry
    Update(UpdateArgs),
    /// List entries of a profile
    List(ListArgs),
    /// Show today's review queue
    Today(ProfileArgs),
    /// Mark a task done
    Done(EntryArgs),
    /// Reopen a finished task
    Reopen(EntryArgs),
    /// Push a task's due date forward
    Defer(DeferArgs),
    /// Block a task
    Block(BlockArgs),
    /// Unblock a task
    Unblock(BlockArgs),
    /// Archive an entry
    Archive(EntryArgs),
    /// Restore an archived entry
    Unarchive(EntryArgs),
    /// Show recent activity for an entry or a profile
    Activity(ActivityArgs),
    /// List scratch notes
    Notes,
    /// Create a scratch note
    NoteAdd(NoteAddArgs),
    /// Replace a scratch note's content
    NoteEdit(NoteEditArgs),
}

#[derive(Args)]
pub struct ProfileArgs {
    /// Profile key (default: the active profile)
    #[arg(long, short = 'p')]
    pub profile: Option<String>,
}

#[derive(Args)]
pub struct UseArgs {
    pub key: String,
}

#[derive(Args)]
pub struct AddProfileArgs {
    pub name: String,
    /// Slug key (default: derived from name)
    #[arg(long)]
    pub key: Option<String>,
    #[arg(long, default_value = "")]
    pub description: String,
}

#[derive(Args)]
pub struct AddArgs {
    #[command(flatten)]
    pub profile: ProfileArgs,
    /// task|note|link|snippet|secret
    #[arg(value_parser = parse_entry_type)]
    pub kind: EntryType,
    pub title: String,
    #[arg(long)]
    pub content: Option<String>,
    #[arg(long)]
    pub project: Option<String>,
    /// Tag (repeatable)
    #[arg(long = "tag")]
    pub tags: Vec<String>,
    #[arg(long = "carry-over")]
    pub carry_over: bool,
    #[command(flatten)]
    pub task: TaskFieldArgs,
}

/// Task-only fields shared by `add` and `update`.
#[derive(Args)]
pub struct TaskFieldArgs {
    /// todo|in_progress|done
    #[arg(long, value_parser = parse_status)]
    pub status: Option<TaskStatus>,
    /// low|medium|high
    #[arg(long, value_parser = parse_priority)]
    pub priority: Option<TaskPriority>,
    /// Due instant in epoch milliseconds
    #[arg(long = "due-at")]
    pub due_at: Option<i64>,
    #[arg(long)]
    pub blocked: Option<bool>,
    #[arg(long = "blocked-reason")]
    pub blocked_reason: Option<String>,
}

#[derive(Args)]
pub struct UpdateArgs {
    pub id: Uuid,
    #[arg(long)]
    pub title: Option<String>,
    #[arg(long)]
    pub content: Option<String>,
    #[arg(long)]
    pub project: Option<String>,
    /// Replace tags (repeatable)
    #[arg(long = "tag")]
    pub tags: Option<Vec<String>>,
    #[arg(long = "carry-over")]
    pub carry_over: Option<bool>,
    #[command(flatten)]
    pub task: TaskFieldArgs,
}

#[derive(Args)]
pub struct ListArgs {
    #[command(flatten)]
    pub profile: ProfileArgs,
    /// Only entries of this kind
    #[arg(long = "type", value_parser = parse_entry_type)]
    pub kind: Option<EntryType>,
    /// Include archived entries
    #[arg(long)]
    pub all: bool,
}

#[derive(Args)]
pub struct EntryArgs {
    pub id: Uuid,
}

#[derive(Args)]
pub struct DeferArgs {
    pub id: Uuid,
    /// Days to push (minimum 1)
    #[arg(long, allow_negative_numbers = true)]
    pub days: Option<i64>,
}

#[derive(Args)]
pub struct BlockArgs {
    pub id: Uuid,
    #[arg(long)]
    pub reason: Option<String>,
}

#[derive(Args)]
pub struct ActivityArgs {
    /// Entry id (default: whole profile)
    pub id: Option<Uuid>,
    #[command(flatten)]
    pub profile: ProfileArgs,
    /// Maximum events (default 20, max 200)
    #[arg(long)]
    pub limit: Option<u32>,
}

#[derive(Args)]
pub struct NoteAddArgs {
    pub content: Option<String>,
}

#[derive(Args)]
pub struct NoteEditArgs {
    pub id: Uuid,
    pub content: String,
}

fn parse_entry_type(value: &str) -> Result<EntryType, String> {
    EntryType::parse(value)
        .ok_or_else(|| format!("unknown entry type '{value}' (task|note|link|snippet|secret)"))
}

fn parse_status(value: &str) -> Result<TaskStatus, String> {
    TaskStatus::parse(value)
        .ok_or_else(|| format!("unknown status '{value}' (todo|in_progress|done)"))
}

fn parse_priority(value: &str) -> Result<TaskPriority, String> {
    TaskPriority::parse(value).ok_or_else(|| format!("unknown priority '{value}' (low|medium|high)"))
}
