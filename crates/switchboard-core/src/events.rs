use serde::{Deserialize, Serialize};

use crate::content::{ContentBlock, ToolResponseStats};
use crate::ids::SessionId;

/// One streamed update from the agent process, as observed on the shared
/// broadcast channel. A single channel carries notifications for every
/// active session; consumers filter by `session_id`.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionNotification {
    pub session_id: SessionId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<Vec<ContentBlock>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_complete: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_response_stats: Option<ToolResponseStats>,
}

impl SessionNotification {
    /// Notification carrying a single text block.
    pub fn text(session_id: SessionId, text: impl Into<String>) -> Self {
        Self {
            session_id,
            content: Some(vec![ContentBlock::Text { text: text.into() }]),
            is_complete: Some(false),
            tool_response_stats: None,
        }
    }

    /// Notification announcing a tool invocation.
    pub fn tool_use(session_id: SessionId, name: impl Into<String>) -> Self {
        Self {
            session_id,
            content: Some(vec![ContentBlock::ToolUse { name: name.into() }]),
            is_complete: Some(false),
            tool_response_stats: None,
        }
    }

    /// Content-free notification carrying only execution statistics.
    pub fn stats_only(session_id: SessionId, stats: ToolResponseStats) -> Self {
        Self {
            session_id,
            content: None,
            is_complete: Some(false),
            tool_response_stats: Some(stats),
        }
    }

    pub fn with_complete(mut self, complete: bool) -> Self {
        self.is_complete = Some(complete);
        self
    }

    pub fn with_stats(mut self, stats: ToolResponseStats) -> Self {
        self.tool_response_stats = Some(stats);
        self
    }

    /// Whether the agent marked this notification as the end of its output.
    /// An absent flag means the stream is still going.
    pub fn is_complete(&self) -> bool {
        self.is_complete.unwrap_or(false)
    }

    pub fn blocks(&self) -> &[ContentBlock] {
        self.content.as_deref().unwrap_or(&[])
    }
}
