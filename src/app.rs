//! Application module: exposes the app model used by the TUI and runtime.
//!
//! The `App` model lives in `app::model` and ties the generation store to
//! the active update channel, plus the prompt input and list selection.

mod model;

pub use model::*;
