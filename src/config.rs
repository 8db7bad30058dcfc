//! Configuration loader and schema types.
//!
//! This module exposes the settings that pick and tune the update channel,
//! shape the terminal UI and route log output, plus helpers to load them
//! from disk and the environment.

mod load;
mod schema;

pub use load::*;
pub use schema::*;
