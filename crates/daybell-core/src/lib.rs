//! # daybell-core
//!
//! Core types, traits, configuration, and the pure schedule builder for Daybell.

pub mod clock;
pub mod config;
pub mod error;
pub mod message;
pub mod model;
pub mod schedule;
pub mod traits;

pub use config::shellexpand;
