//! Shared types for the armband recorder
//!
//! This crate contains the data model exchanged between the device backends,
//! the filtering stage and the CSV recorder: raw telemetry, device events,
//! control commands, errors and configuration.

pub mod config;
pub mod data;
pub mod error;
pub mod event;

// Re-export commonly used types
pub use config::*;
pub use data::*;
pub use error::*;
pub use event::*;
