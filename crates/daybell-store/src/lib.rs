//! # daybell-store
//!
//! Persistent store for Daybell (SQLite-backed).

pub mod store;

pub use store::{ScheduleDocument, Store};
