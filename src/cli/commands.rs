use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};

use crate::models::{Priority, Stage, TaskStatus};

const VERSION: &str = env!("WORKTASK_VERSION");

#[derive(Parser)]
#[command(
    name = "worktask",
    version = VERSION,
    about = "Personal work-task tracker: tasks, checklists, dependencies",
    after_help = "\
BACKENDS:
  With --api-url (or WORKTASK_API_URL, or api_url in the config file) commands
  talk to a REST server. Otherwise they use a local SQLite database, created
  with `worktask init`.

CONFIG:
  <config_dir>/worktask/config.json, all keys optional:
    {\"api_url\": \"...\", \"database\": \"...\", \"tracker\": \"Jira\", \"timeout_secs\": 30}
  Flags and env vars take precedence over the file.

DATES:
  All dates are YYYY-MM-DD.

EXIT CODES:
  0  Success
  1  Error (validation, not found, backend, config)

LOGGING:
  Set WORKTASK_LOG (e.g. `debug`, `worktask=trace`). Logs go to stderr."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Local database file
    #[arg(long, global = true, env = "WORKTASK_DB")]
    pub db: Option<PathBuf>,

    /// REST API base URL, e.g. http://localhost:5000/api
    #[arg(long, global = true, env = "WORKTASK_API_URL")]
    pub api_url: Option<String>,

    /// Config file path
    #[arg(long, global = true, env = "WORKTASK_CONFIG")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create the local database
    Init,

    /// Task management
    #[command(subcommand)]
    Task(TaskCommands),

    /// Checklist items of a task
    #[command(subcommand)]
    Checklist(ChecklistCommands),

    /// Dependencies between tasks
    #[command(subcommand)]
    Dep(DepCommands),

    /// Task and checklist statistics
    Dashboard,

    /// Tasks grouped by assigned date
    #[command(after_help = "\
NOTE:
  Defaults to the seven days starting today. Tasks without an assigned date
  never appear.")]
    Calendar {
        #[arg(long)]
        from: Option<NaiveDate>,
        #[arg(long)]
        to: Option<NaiveDate>,
    },

    /// Create a task from an external issue reference
    #[command(after_help = "\
NOTE:
  Title defaults to \"<tracker>: <id>\" (tracker from config, default Jira).
  The task is assigned today with status todo and priority medium unless given.")]
    Import {
        /// Issue key, e.g. PROJ-123
        id: String,
        #[arg(long)]
        url: Option<String>,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long, value_parser = parse_priority)]
        priority: Option<Priority>,
        #[arg(long)]
        assigned: Option<NaiveDate>,
        #[arg(long)]
        due: Option<NaiveDate>,
    },
}

#[derive(Subcommand)]
pub enum TaskCommands {
    /// Create a task
    Add {
        title: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        assigned: Option<NaiveDate>,
        #[arg(long)]
        due: Option<NaiveDate>,
        #[arg(long, value_parser = parse_priority)]
        priority: Option<Priority>,
        #[arg(long, value_parser = parse_status)]
        status: Option<TaskStatus>,
        #[arg(long)]
        jira_id: Option<String>,
        #[arg(long)]
        jira_url: Option<String>,
        #[arg(long)]
        notes: Option<String>,
    },
    /// List tasks
    #[command(after_help = "\
NOTE:
  --status, --priority, --from and --to are sent to the backend.
  --search matches title, description or issue key, case-insensitively.")]
    List {
        #[arg(long, value_parser = parse_status)]
        status: Option<TaskStatus>,
        #[arg(long, value_parser = parse_priority)]
        priority: Option<Priority>,
        /// Assigned on or after
        #[arg(long)]
        from: Option<NaiveDate>,
        /// Assigned on or before
        #[arg(long)]
        to: Option<NaiveDate>,
        #[arg(long)]
        search: Option<String>,
    },
    /// Show a task with its checklist and dependencies
    Show { id: i64 },
    /// Change task fields
    Update {
        id: i64,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        assigned: Option<NaiveDate>,
        #[arg(long)]
        due: Option<NaiveDate>,
        #[arg(long, value_parser = parse_priority)]
        priority: Option<Priority>,
        #[arg(long, value_parser = parse_status)]
        status: Option<TaskStatus>,
        #[arg(long)]
        jira_id: Option<String>,
        #[arg(long)]
        jira_url: Option<String>,
        #[arg(long)]
        notes: Option<String>,
        /// Clear a field (repeatable)
        #[arg(long, value_enum)]
        clear: Vec<ClearField>,
    },
    /// Delete a task with its checklist and dependency links
    Delete { id: i64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ClearField {
    Description,
    Assigned,
    Due,
    JiraId,
    JiraUrl,
    Notes,
}

#[derive(Subcommand)]
pub enum ChecklistCommands {
    /// Append an item to a task's checklist
    Add {
        task_id: i64,
        title: String,
        #[arg(long, value_parser = parse_stage)]
        stage: Option<Stage>,
        #[arg(long)]
        branch: Option<String>,
        /// Create already completed
        #[arg(long)]
        done: bool,
    },
    /// Change a checklist item
    Update {
        item_id: i64,
        #[arg(long)]
        title: Option<String>,
        #[arg(long, value_parser = parse_stage)]
        stage: Option<Stage>,
        #[arg(long, conflicts_with = "clear_branch")]
        branch: Option<String>,
        #[arg(long)]
        clear_branch: bool,
        #[arg(long)]
        completed: Option<bool>,
    },
    /// Delete a checklist item
    Delete { item_id: i64 },
    /// Move an item from one position to another (0-based)
    #[command(after_help = "\
NOTE:
  A move, not a swap: the item is removed at FROM and reinserted at TO.
  All positions are then renumbered 0..n and saved in one batch.")]
    Move { task_id: i64, from: usize, to: usize },
}

#[derive(Subcommand)]
pub enum DepCommands {
    /// TASK_ID depends on DEPENDS_ON_ID
    Add { task_id: i64, depends_on_id: i64 },
    /// Remove a dependency link by its id
    Remove { dependency_id: i64 },
}

fn parse_status(s: &str) -> Result<TaskStatus, String> {
    TaskStatus::from_str(s).ok_or_else(|| {
        let valid: Vec<_> = TaskStatus::ALL.iter().map(|s| s.as_str()).collect();
        format!("invalid status '{s}' (expected one of: {})", valid.join(", "))
    })
}

fn parse_priority(s: &str) -> Result<Priority, String> {
    Priority::from_str(s)
        .ok_or_else(|| format!("invalid priority '{s}' (expected low, medium, high, urgent)"))
}

fn parse_stage(s: &str) -> Result<Stage, String> {
    Stage::from_str(s).ok_or_else(|| {
        format!("invalid stage '{s}' (expected development, testing, merge, deployment, other)")
    })
}
