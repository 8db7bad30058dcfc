use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use super::model::{Generation, GenerationId, GenerationStatus, GenerationUpdate};

/// Shared handle to the store, held by the app and by channel handlers.
pub type StoreHandle = Arc<Mutex<GenerationStore>>;

/// Lock the store, recovering the guard if a previous holder panicked.
///
/// Every mutation leaves the collection consistent, so a poisoned lock
/// still guards valid data.
pub fn lock_store(handle: &StoreHandle) -> MutexGuard<'_, GenerationStore> {
    handle.lock().unwrap_or_else(PoisonError::into_inner)
}

/// What `apply_update` did with an update.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ApplyOutcome {
    Applied,
    /// No record with that id; late or duplicate updates land here.
    UnknownId,
    /// The record already reached `completed` or `failed`.
    AlreadySettled,
    /// The update would break a record invariant and was dropped.
    Rejected(&'static str),
}

/// Single source of truth for generation records.
///
/// Records are kept newest-first by insertion order and are never removed.
#[derive(Debug, Default)]
pub struct GenerationStore {
    generations: VecDeque<Generation>,
    last_id_millis: i64,
}

impl GenerationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap the store in a shareable handle.
    pub fn into_handle(self) -> StoreHandle {
        Arc::new(Mutex::new(self))
    }

    /// Insert a new `generating` record at the head and return its id.
    ///
    /// The prompt is assumed to be validated by the caller.
    pub fn create_generation(&mut self, prompt: impl Into<String>) -> GenerationId {
        self.create_generation_at(prompt, Utc::now())
    }

    /// Same as `create_generation` with an explicit creation time.
    pub fn create_generation_at(
        &mut self,
        prompt: impl Into<String>,
        now: DateTime<Utc>,
    ) -> GenerationId {
        let id = self.next_id(now);
        let record = Generation::new(id.clone(), prompt.into(), now);
        info!(generation = %id, prompt = %record.prompt, "generation created");
        self.generations.push_front(record);
        id
    }

    // Millisecond timestamps, bumped past the previous id when the clock
    // has not moved, keep ids unique and increasing.
    fn next_id(&mut self, now: DateTime<Utc>) -> GenerationId {
        let millis = now.timestamp_millis().max(self.last_id_millis + 1);
        self.last_id_millis = millis;
        GenerationId::new(millis.to_string())
    }

    /// Merge `update` into the record identified by `id`.
    ///
    /// Never fails: unknown ids, settled records and invalid updates are
    /// reported through the returned outcome and leave the store untouched.
    pub fn apply_update(&mut self, id: &GenerationId, update: GenerationUpdate) -> ApplyOutcome {
        let Some(record) = self.generations.iter_mut().find(|g| &g.id == id) else {
            debug!(generation = %id, "update for unknown generation ignored");
            return ApplyOutcome::UnknownId;
        };

        if record.status.is_terminal() {
            debug!(generation = %id, status = record.status.label(), "update for settled generation ignored");
            return ApplyOutcome::AlreadySettled;
        }

        if let Err(reason) = check_update(&update) {
            warn!(generation = %id, reason, "generation update rejected");
            return ApplyOutcome::Rejected(reason);
        }

        let GenerationUpdate {
            status,
            progress,
            error,
            audio_url,
        } = update;

        if let Some(value) = progress {
            let value = value.clamp(0.0, 100.0);
            // NaN fails the comparison and is dropped with decreases.
            if value > record.progress {
                record.progress = value;
            }
        }

        match status {
            Some(GenerationStatus::Completed) => {
                record.status = GenerationStatus::Completed;
                record.progress = 100.0;
                record.audio_url = audio_url;
                info!(generation = %id, "generation completed");
            }
            Some(GenerationStatus::Failed) => {
                record.status = GenerationStatus::Failed;
                record.error = error;
                info!(generation = %id, error = record.error.as_deref().unwrap_or_default(), "generation failed");
            }
            Some(GenerationStatus::Generating) | None => {}
        }

        ApplyOutcome::Applied
    }

    /// Records, newest first.
    pub fn list_generations(
        &self,
    ) -> impl DoubleEndedIterator<Item = &Generation> + ExactSizeIterator {
        self.generations.iter()
    }

    pub fn get(&self, id: &GenerationId) -> Option<&Generation> {
        self.generations.iter().find(|g| &g.id == id)
    }

    /// Record at `index` in newest-first order.
    pub fn nth(&self, index: usize) -> Option<&Generation> {
        self.generations.get(index)
    }

    pub fn len(&self) -> usize {
        self.generations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.generations.is_empty()
    }

    /// True iff any record is still generating.
    ///
    /// Derived from the collection on every call, so finishing one generation
    /// never hides another that is still running.
    pub fn is_any_generating(&self) -> bool {
        self.generations.iter().any(Generation::is_generating)
    }
}

fn check_update(update: &GenerationUpdate) -> Result<(), &'static str> {
    match update.status.unwrap_or(GenerationStatus::Generating) {
        GenerationStatus::Generating => {
            if update.error.is_some() || update.audio_url.is_some() {
                Err("error and audio_url require a terminal status")
            } else {
                Ok(())
            }
        }
        GenerationStatus::Completed => match (&update.audio_url, &update.error) {
            (Some(_), None) => Ok(()),
            (None, _) => Err("completed update without an audio_url"),
            (Some(_), Some(_)) => Err("completed update carries an error"),
        },
        GenerationStatus::Failed => match (&update.error, &update.audio_url) {
            (Some(_), None) => Ok(()),
            (None, _) => Err("failed update without an error"),
            (Some(_), Some(_)) => Err("failed update carries an audio_url"),
        },
    }
}
