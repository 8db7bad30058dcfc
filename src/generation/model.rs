//! Generation model types: `Generation`, its id, status and partial updates.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Reason recorded when a failure arrives without a usable message.
pub const DEFAULT_FAILURE_MESSAGE: &str = "Failed to generate music";

/// Opaque, time-ordered identifier assigned by the store at creation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GenerationId(String);

impl GenerationId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GenerationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lifecycle status of a generation record.
///
/// There is no idle variant: a record only exists once a prompt was submitted.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum GenerationStatus {
    Generating,
    Completed,
    Failed,
}

impl GenerationStatus {
    /// Terminal states absorb every later update.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Generating => "Generating",
            Self::Completed => "Completed",
            Self::Failed => "Failed",
        }
    }
}

/// One music-generation request and its outcome.
///
/// Fields are only writable from the store; consumers get read accessors.
#[derive(Debug, Clone, PartialEq)]
pub struct Generation {
    pub(super) id: GenerationId,
    pub(super) prompt: String,
    pub(super) status: GenerationStatus,
    pub(super) progress: f64,
    pub(super) timestamp: DateTime<Utc>,
    pub(super) error: Option<String>,
    pub(super) audio_url: Option<String>,
}

impl Generation {
    pub(super) fn new(id: GenerationId, prompt: String, timestamp: DateTime<Utc>) -> Self {
        Self {
            id,
            prompt,
            status: GenerationStatus::Generating,
            progress: 0.0,
            timestamp,
            error: None,
            audio_url: None,
        }
    }

    pub fn id(&self) -> &GenerationId {
        &self.id
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn status(&self) -> GenerationStatus {
        self.status
    }

    /// Progress in `[0, 100]`. Only meaningful while generating.
    pub fn progress(&self) -> f64 {
        self.progress
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn audio_url(&self) -> Option<&str> {
        self.audio_url.as_deref()
    }

    pub fn is_generating(&self) -> bool {
        self.status == GenerationStatus::Generating
    }
}

/// Partial set of fields merged into a record by `GenerationStore::apply_update`.
///
/// `id`, `prompt` and `timestamp` are deliberately absent: they never change
/// after creation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerationUpdate {
    pub status: Option<GenerationStatus>,
    pub progress: Option<f64>,
    pub error: Option<String>,
    pub audio_url: Option<String>,
}

impl GenerationUpdate {
    pub fn progress(value: f64) -> Self {
        Self {
            progress: Some(value),
            ..Self::default()
        }
    }

    pub fn completed(audio_url: impl Into<String>) -> Self {
        Self {
            status: Some(GenerationStatus::Completed),
            progress: Some(100.0),
            audio_url: Some(audio_url.into()),
            ..Self::default()
        }
    }

    /// A failure update. Blank reasons fall back to `DEFAULT_FAILURE_MESSAGE`.
    pub fn failed(reason: impl Into<String>) -> Self {
        let reason = reason.into();
        let reason = if reason.trim().is_empty() {
            DEFAULT_FAILURE_MESSAGE.to_string()
        } else {
            reason
        };
        Self {
            status: Some(GenerationStatus::Failed),
            error: Some(reason),
            ..Self::default()
        }
    }
}
