//! Store: append-only chat log and final-result records in SQLite.

pub mod database;
pub mod errors;

pub use database::{ChatLogStore, LogEntry, NewLogEntry, ResultRecord};
pub use errors::StoreError;
