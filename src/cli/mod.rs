pub mod calendar;
pub mod checklist;
pub mod commands;
pub mod dashboard;
pub mod dep;
pub mod import;
pub mod init;
pub mod task;

pub use commands::*;

use tracing::debug;

use crate::api::{HttpApi, TaskApi};
use crate::config::{Backend, Overrides, Settings};
use crate::db::SqliteApi;
use crate::error::WorktaskError;
use crate::output;
use crate::store::TaskStore;

pub type Store = TaskStore<Box<dyn TaskApi>>;

/// Options shared by every subcommand.
pub struct Context {
    pub json: bool,
    pub overrides: Overrides,
}

impl Context {
    pub fn from_cli(cli: &Cli) -> Self {
        Self {
            json: cli.json,
            overrides: Overrides {
                config: cli.config.clone(),
                api_url: cli.api_url.clone(),
                db: cli.db.clone(),
            },
        }
    }

    pub fn settings(&self) -> Result<Settings, WorktaskError> {
        Settings::resolve(&self.overrides)
    }

    /// Open the configured backend and wrap it in a fresh store.
    pub fn open_store(&self) -> Result<Store, WorktaskError> {
        let settings = self.settings()?;
        let api: Box<dyn TaskApi> = match &settings.backend {
            Backend::Http { base_url, timeout } => {
                debug!(%base_url, "using HTTP backend");
                Box::new(HttpApi::new(base_url, *timeout))
            }
            Backend::Sqlite { path } => {
                debug!(path = %path.display(), "using SQLite backend");
                Box::new(SqliteApi::open(path)?.with_tracker(settings.tracker.clone()))
            }
        };
        Ok(TaskStore::new(api).with_tracker(settings.tracker))
    }
}

/// Turn a command result into an exit code, reporting any error.
pub fn finish(result: Result<i32, WorktaskError>, json_output: bool) -> i32 {
    match result {
        Ok(code) => code,
        Err(e) => {
            debug!(code = e.code.as_str(), "command failed");
            if json_output {
                output::json::print(&output::json::error(&e));
            } else {
                eprintln!("Error: {}", e.message);
            }
            1
        }
    }
}
