//! Wire messages exchanged with the presentation server.
//!
//! Every frame is one JSON object of the form `{"event": "<name>", "data": {...}}`.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ProtocolError;
use crate::parser::Slide;

/// Opaque server-assigned document identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileId(String);

impl FileId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FileId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Client to server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ClientMessage {
    JoinPresentation { file_id: FileId },
    LeavePresentation { file_id: FileId },
    RequestSync { file_id: FileId },
    UpdateContent { file_id: FileId, content: String },
    ChangePage { file_id: FileId, page: usize },
}

impl ClientMessage {
    pub fn event_name(&self) -> &'static str {
        match self {
            Self::JoinPresentation { .. } => "join_presentation",
            Self::LeavePresentation { .. } => "leave_presentation",
            Self::RequestSync { .. } => "request_sync",
            Self::UpdateContent { .. } => "update_content",
            Self::ChangePage { .. } => "change_page",
        }
    }

    pub fn file_id(&self) -> &FileId {
        match self {
            Self::JoinPresentation { file_id }
            | Self::LeavePresentation { file_id }
            | Self::RequestSync { file_id }
            | Self::UpdateContent { file_id, .. }
            | Self::ChangePage { file_id, .. } => file_id,
        }
    }

    pub fn encode(&self) -> Result<String, ProtocolError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn decode(frame: &str) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_str(frame)?)
    }
}

/// Server to client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerMessage {
    Joined {
        file_id: FileId,
    },
    /// Full snapshot, sent only to the client that asked for it.
    SyncData {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        content: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        slides: Option<Vec<Slide>>,
    },
    /// Re-segmented document, broadcast to the whole room including the editor.
    ContentUpdated {
        slides: Vec<Slide>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        content: Option<String>,
    },
    PageChanged {
        page: usize,
    },
}

impl ServerMessage {
    pub fn encode(&self) -> Result<String, ProtocolError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn decode(frame: &str) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_str(frame)?)
    }
}

/// What a transport hands back to the runtime.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    Message(ServerMessage),
    Disconnected,
}
