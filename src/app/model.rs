//! Application model: `App`.
//!
//! The `App` struct owns the live subscriptions and issues the two commands
//! the UI can send to the core: submit a prompt and cancel a generation.

use std::collections::HashMap;
use std::time::Instant;

use tracing::info;

use crate::channel::{StoreUpdater, Subscription, UpdateChannel};
use crate::config::UiSettings;
use crate::error::SubmitError;
use crate::generation::{GenerationId, GenerationUpdate, StoreHandle, lock_store};

/// Error recorded on a generation the user cancelled.
pub const CANCELLED_MESSAGE: &str = "Generation cancelled";

/// The main application model.
pub struct App {
    store: StoreHandle,
    channel: Box<dyn UpdateChannel>,
    subscriptions: HashMap<GenerationId, Subscription>,

    pub input: String,
    pub selected: usize,
    /// One-line message for the footer (last rejected submit, cancel, ...).
    pub notice: Option<String>,

    placeholders: Vec<String>,
    placeholder_index: usize,
    allow_concurrent: bool,
}

impl App {
    /// Create a new `App` over an injected store and channel.
    pub fn new(store: StoreHandle, channel: Box<dyn UpdateChannel>, ui: &UiSettings) -> Self {
        Self {
            store,
            channel,
            subscriptions: HashMap::new(),
            input: String::new(),
            selected: 0,
            notice: None,
            placeholders: ui.placeholders.clone(),
            placeholder_index: 0,
            allow_concurrent: ui.allow_concurrent,
        }
    }

    pub fn store(&self) -> &StoreHandle {
        &self.store
    }

    pub fn channel_name(&self) -> &'static str {
        self.channel.name()
    }

    pub fn is_generating(&self) -> bool {
        lock_store(&self.store).is_any_generating()
    }

    /// Whether the input currently accepts a submission.
    pub fn can_submit(&self) -> bool {
        !self.input.trim().is_empty() && (self.allow_concurrent || !self.is_generating())
    }

    pub fn push_input_char(&mut self, c: char) {
        self.input.push(c);
    }

    pub fn pop_input_char(&mut self) {
        self.input.pop();
    }

    pub fn clear_input(&mut self) {
        self.input.clear();
    }

    /// Submit the current input; clears it on success.
    pub fn submit_input(&mut self) -> Result<GenerationId, SubmitError> {
        let text = self.input.clone();
        match self.submit_prompt(&text) {
            Ok(id) => {
                self.input.clear();
                self.selected = 0;
                self.notice = None;
                Ok(id)
            }
            Err(e) => {
                self.notice = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Create a generation for `text`, announce it on the channel and
    /// subscribe the store to its updates.
    pub fn submit_prompt(&mut self, text: &str) -> Result<GenerationId, SubmitError> {
        let prompt = text.trim();
        if prompt.is_empty() {
            return Err(SubmitError::BlankPrompt);
        }

        let id = {
            let mut store = lock_store(&self.store);
            if !self.allow_concurrent && store.is_any_generating() {
                return Err(SubmitError::Busy);
            }
            store.create_generation(prompt)
        };

        self.channel.announce(&id, prompt);
        let handler = StoreUpdater::new(self.store.clone(), id.clone());
        let subscription = self.channel.subscribe(&id, Box::new(handler));
        self.subscriptions.insert(id.clone(), subscription);
        info!(generation = %id, channel = self.channel.name(), "prompt submitted");
        Ok(id)
    }

    /// Stop updates for `id` and settle it as failed.
    ///
    /// Returns `false` when there is no live subscription for `id`.
    pub fn cancel(&mut self, id: &GenerationId) -> bool {
        let Some(subscription) = self.subscriptions.remove(id) else {
            return false;
        };
        if !subscription.cancel() {
            return false;
        }
        lock_store(&self.store).apply_update(id, GenerationUpdate::failed(CANCELLED_MESSAGE));
        info!(generation = %id, "generation cancelled");
        true
    }

    /// Cancel the generation under the cursor.
    pub fn cancel_selected(&mut self) -> bool {
        let Some(id) = self.selected_id() else {
            return false;
        };
        let cancelled = self.cancel(&id);
        if cancelled {
            self.notice = Some(format!("Cancelled generation {id}"));
        }
        cancelled
    }

    /// Cancel every live subscription, e.g. on shutdown.
    pub fn cancel_all(&mut self) {
        let ids: Vec<GenerationId> = self.subscriptions.keys().cloned().collect();
        for id in ids {
            self.cancel(&id);
        }
    }

    /// Let the channel deliver everything due at `now` and drop finished
    /// subscriptions.
    pub fn pump(&mut self, now: Instant) -> usize {
        let fired = self.channel.pump(now);
        self.subscriptions.retain(|_, s| !s.is_finished());
        fired
    }

    pub fn active_subscriptions(&self) -> usize {
        self.subscriptions.len()
    }

    /// Placeholder prompt currently shown in an empty input.
    pub fn placeholder(&self) -> &str {
        self.placeholders
            .get(self.placeholder_index)
            .map(String::as_str)
            .unwrap_or("Describe the music you want")
    }

    pub fn rotate_placeholder(&mut self) {
        if !self.placeholders.is_empty() {
            self.placeholder_index = (self.placeholder_index + 1) % self.placeholders.len();
        }
    }

    /// Id of the generation under the cursor.
    pub fn selected_id(&self) -> Option<GenerationId> {
        lock_store(&self.store)
            .nth(self.selected)
            .map(|g| g.id().clone())
    }

    /// Move the cursor down, stopping at the oldest generation.
    pub fn next(&mut self) {
        let len = lock_store(&self.store).len();
        if len > 0 && self.selected + 1 < len {
            self.selected += 1;
        }
    }

    /// Move the cursor up, stopping at the newest generation.
    pub fn prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }
}
