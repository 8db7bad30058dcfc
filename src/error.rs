//! Error types shared across the app, channel and wire layers.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Why a prompt submission was turned away before reaching the store.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SubmitError {
    #[error("prompt is empty")]
    BlankPrompt,
    #[error("a generation is already in progress")]
    Busy,
}

/// Failures while setting up an update channel backend.
#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("relay backend selected but relay.feed_path is not set")]
    MissingFeed,
    #[error("relay backend selected but relay.sink_path is not set")]
    MissingSink,
    #[error("failed to open relay feed {}: {source}", path.display())]
    OpenFeed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to open relay sink {}: {source}", path.display())]
    OpenSink {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// A single inbound line that could not be turned into a message.
#[derive(Debug, Error)]
pub enum WireError {
    #[error("malformed inbound message `{line}`: {source}")]
    Malformed {
        line: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to encode outbound message: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("relay I/O failed: {0}")]
    Io(#[from] io::Error),
}
