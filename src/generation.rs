//! Generation records and the store that owns them.
//!
//! A generation is one submitted prompt tracked from creation until it either
//! completes with an artifact or fails with a reason. The store is the only
//! writer; everything else reads snapshots and issues commands.

mod display;
mod model;
mod store;

pub use display::*;
pub use model::*;
pub use store::*;

#[cfg(test)]
mod tests;
