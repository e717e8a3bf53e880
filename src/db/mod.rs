pub mod connection;
pub mod migrations;
pub mod task_repo;
pub mod checklist_repo;
pub mod dependency_repo;
pub mod sqlite;

pub use connection::*;
pub use sqlite::SqliteApi;
