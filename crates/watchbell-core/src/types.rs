//! Core data types shared by the scheduler and the channel adapters.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Opaque subscriber handle (a Telegram chat id).
///
/// Serialised as a bare integer so the subscriber file stays a plain JSON
/// array of ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubscriberId(pub i64);

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Something worth delivering to subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Artifact {
    /// A rendered status message.
    Text(String),
    /// A file on disk, sent as a document (e.g. a compiled timelapse).
    File(PathBuf),
}

impl Artifact {
    pub fn text(s: impl Into<String>) -> Self {
        Self::Text(s.into())
    }

    pub fn file(path: impl AsRef<Path>) -> Self {
        Self::File(path.as_ref().to_path_buf())
    }

    /// Short human-readable label for logs.
    pub fn describe(&self) -> String {
        match self {
            Self::Text(t) => {
                let mut short: String = t.chars().take(60).collect();
                if t.chars().count() > 60 {
                    short.push('…');
                }
                format!("text \"{short}\"")
            }
            Self::File(p) => format!("file {}", p.display()),
        }
    }
}

/// A message received from the messaging transport.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncomingMessage {
    /// Transport name ("telegram").
    pub channel: String,
    /// Conversation the message came from; replies and subscriptions use it.
    pub chat_id: SubscriberId,
    pub sender_id: String,
    pub sender_name: Option<String>,
    pub content: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}
