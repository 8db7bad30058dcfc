//! Message formats for remote update feeds.
//!
//! One JSON object per line, tagged by `type`. Outbound, the app announces
//! each generation it creates so the producer learns the id:
//!
//! ```text
//! {"type":"submitted","generation_id":"1700000000000","prompt":"lofi beat"}
//! ```
//!
//! Inbound, the producer reports on that id:
//!
//! ```text
//! {"type":"progress","generation_id":"1700000000000","progress":42.5}
//! {"type":"completed","generation_id":"1700000000000","audio_url":"/api/audio/x.mp3"}
//! {"type":"failed","generation_id":"1700000000000","error":"model offline"}
//! ```

use serde::{Deserialize, Serialize};

use crate::error::WireError;
use crate::generation::GenerationId;

/// Longest slice of a bad line kept in the error message.
const MAX_ECHOED_LINE: usize = 120;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundMessage {
    Progress {
        generation_id: GenerationId,
        progress: f64,
    },
    Completed {
        generation_id: GenerationId,
        audio_url: String,
    },
    Failed {
        generation_id: GenerationId,
        #[serde(default)]
        error: String,
    },
}

impl InboundMessage {
    pub fn generation_id(&self) -> &GenerationId {
        match self {
            Self::Progress { generation_id, .. }
            | Self::Completed { generation_id, .. }
            | Self::Failed { generation_id, .. } => generation_id,
        }
    }
}

/// Decode a single feed line.
pub fn decode_line(line: &str) -> Result<InboundMessage, WireError> {
    let line = line.trim();
    serde_json::from_str(line).map_err(|source| WireError::Malformed {
        line: line.chars().take(MAX_ECHOED_LINE).collect(),
        source,
    })
}

/// Messages the app writes to the relay sink.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundMessage<'a> {
    Submitted {
        generation_id: &'a GenerationId,
        prompt: &'a str,
    },
}

/// Encode `message` as a single feed line, newline included.
pub fn encode_line(message: &OutboundMessage<'_>) -> Result<String, WireError> {
    let mut line = serde_json::to_string(message).map_err(WireError::Encode)?;
    line.push('\n');
    Ok(line)
}
