use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::ids::ConversationId;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
    System,
}

/// One message in the conversation view shown alongside progress updates.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ConversationTurn {
    pub role: Role,
    pub content: String,
    /// RFC 3339.
    pub timestamp: String,
}

impl ConversationTurn {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// Seam to wherever the host persists conversations. Load failures are the
/// loader's to describe and the caller's to absorb: the router logs them and
/// proceeds with an empty view.
#[async_trait]
pub trait HistoryLoader: Send + Sync {
    async fn load(&self, conversation_id: &ConversationId) -> anyhow::Result<Vec<ConversationTurn>>;
}

/// Loader for hosts that keep no history.
pub struct NoHistory;

#[async_trait]
impl HistoryLoader for NoHistory {
    async fn load(&self, _conversation_id: &ConversationId) -> anyhow::Result<Vec<ConversationTurn>> {
        Ok(Vec::new())
    }
}

/// Fixed in-memory history, returned for every conversation.
pub struct StaticHistory {
    turns: Vec<ConversationTurn>,
}

impl StaticHistory {
    pub fn new(turns: Vec<ConversationTurn>) -> Self {
        Self { turns }
    }
}

#[async_trait]
impl HistoryLoader for StaticHistory {
    async fn load(&self, _conversation_id: &ConversationId) -> anyhow::Result<Vec<ConversationTurn>> {
        Ok(self.turns.clone())
    }
}
