//! Subscription handles, handler callbacks and the store-backed handler.

use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

use tracing::debug;

use crate::generation::{GenerationId, GenerationUpdate, StoreHandle, lock_store};

/// Callbacks invoked by a channel for one subscription.
pub trait GenerationHandler: Send {
    fn on_progress(&mut self, progress: f64);
    fn on_complete(&mut self, artifact: &str);
    fn on_error(&mut self, reason: &str);
}

/// Per-subscription delivery state.
///
/// `Pending -> Progress* -> Completed | Failed | Cancelled`; the last three
/// are absorbing and `Cancelled` is only reachable before a terminal callback.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[repr(u8)]
pub enum SubscriptionState {
    Pending = 0,
    Progress = 1,
    Completed = 2,
    Failed = 3,
    Cancelled = 4,
}

impl SubscriptionState {
    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => Self::Pending,
            1 => Self::Progress,
            2 => Self::Completed,
            3 => Self::Failed,
            _ => Self::Cancelled,
        }
    }

    pub fn is_finished(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }
}

/// State shared between a `Subscription` handle and the channel delivering it.
#[derive(Debug, Clone)]
pub(super) struct SharedState(Arc<AtomicU8>);

impl SharedState {
    pub(super) fn new() -> Self {
        Self(Arc::new(AtomicU8::new(SubscriptionState::Pending as u8)))
    }

    pub(super) fn get(&self) -> SubscriptionState {
        SubscriptionState::from_u8(self.0.load(Ordering::Acquire))
    }

    /// Move to `next` unless already finished. Returns whether the move happened.
    pub(super) fn advance(&self, next: SubscriptionState) -> bool {
        let mut current = self.0.load(Ordering::Acquire);
        loop {
            if SubscriptionState::from_u8(current).is_finished() {
                return false;
            }
            match self.0.compare_exchange(
                current,
                next as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return true,
                Err(actual) => current = actual,
            }
        }
    }
}

/// Handle returned by `UpdateChannel::subscribe`.
#[derive(Debug, Clone)]
pub struct Subscription {
    id: GenerationId,
    state: SharedState,
}

impl Subscription {
    pub(super) fn new(id: GenerationId, state: SharedState) -> Self {
        Self { id, state }
    }

    pub fn state(&self) -> SubscriptionState {
        self.state.get()
    }

    pub fn is_finished(&self) -> bool {
        self.state().is_finished()
    }

    /// Stop delivery for this subscription.
    ///
    /// No callback fires once this returns, including work that is already
    /// due. Safe to call repeatedly; returns `true` only for the call that
    /// actually cancelled, and `false` after a terminal callback.
    pub fn cancel(&self) -> bool {
        let cancelled = self.state.advance(SubscriptionState::Cancelled);
        if cancelled {
            debug!(generation = %self.id, "subscription cancelled");
        }
        cancelled
    }
}

/// Channel-side half of a subscription: the handler plus the shared state,
/// checked immediately before every callback.
pub(super) struct Delivery {
    state: SharedState,
    handler: Box<dyn GenerationHandler>,
}

impl Delivery {
    pub(super) fn new(state: SharedState, handler: Box<dyn GenerationHandler>) -> Self {
        Self { state, handler }
    }

    pub(super) fn is_live(&self) -> bool {
        !self.state.get().is_finished()
    }

    pub(super) fn progress(&mut self, value: f64) -> bool {
        if !self.state.advance(SubscriptionState::Progress) {
            return false;
        }
        self.handler.on_progress(value);
        true
    }

    pub(super) fn complete(&mut self, artifact: &str) -> bool {
        if !self.state.advance(SubscriptionState::Completed) {
            return false;
        }
        self.handler.on_complete(artifact);
        true
    }

    pub(super) fn fail(&mut self, reason: &str) -> bool {
        if !self.state.advance(SubscriptionState::Failed) {
            return false;
        }
        self.handler.on_error(reason);
        true
    }
}

/// Handler that writes every callback into the generation store.
pub struct StoreUpdater {
    store: StoreHandle,
    id: GenerationId,
}

impl StoreUpdater {
    pub fn new(store: StoreHandle, id: GenerationId) -> Self {
        Self { store, id }
    }

    fn apply(&self, update: GenerationUpdate) {
        lock_store(&self.store).apply_update(&self.id, update);
    }
}

impl GenerationHandler for StoreUpdater {
    fn on_progress(&mut self, progress: f64) {
        self.apply(GenerationUpdate::progress(progress));
    }

    fn on_complete(&mut self, artifact: &str) {
        self.apply(GenerationUpdate::completed(artifact));
    }

    fn on_error(&mut self, reason: &str) {
        self.apply(GenerationUpdate::failed(reason));
    }
}
