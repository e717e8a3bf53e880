pub mod api;
pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod filter;
pub mod graph;
pub mod import;
pub mod metrics;
pub mod models;
pub mod output;
pub mod reorder;
pub mod store;
