//! Update channels: asynchronous delivery of generation progress.
//!
//! A channel accepts one subscriber per generation and calls its handler with
//! zero or more strictly increasing progress values followed by exactly one
//! terminal callback, unless the subscription is cancelled first.
//!
//! Delivery is cooperative. The owner calls [`UpdateChannel::pump`] from its
//! event loop and every due callback runs to completion inside that call, so
//! the handler and the store it writes to only ever see one caller at a time.

use std::time::Instant;

use crate::generation::GenerationId;

mod relay;
mod simulated;
mod types;
mod wire;

pub use relay::{RelayChannel, spawn_feed_reader};
pub use simulated::{ScriptStep, SimulatedChannel, artifact_ref};
pub use types::{GenerationHandler, StoreUpdater, Subscription, SubscriptionState};
pub use wire::{InboundMessage, OutboundMessage, decode_line, encode_line};

/// A source of generation updates, simulated or backed by a remote feed.
pub trait UpdateChannel {
    /// Start delivering updates for `id` to `handler`.
    fn subscribe(
        &mut self,
        id: &GenerationId,
        handler: Box<dyn GenerationHandler>,
    ) -> Subscription;

    /// Tell the backend that `id` was created for `prompt`.
    ///
    /// Backends that produce their own updates have nothing to send.
    fn announce(&mut self, _id: &GenerationId, _prompt: &str) {}

    /// Deliver everything that is due at `now`. Returns the number of
    /// callbacks fired.
    fn pump(&mut self, now: Instant) -> usize;

    /// Short backend name for status display and logs.
    fn name(&self) -> &'static str;
}
