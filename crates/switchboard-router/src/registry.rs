use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tracing::debug;

use switchboard_core::ids::{ConversationId, SessionId, UiSessionId};

/// The active protocol session for one conversation.
#[derive(Clone, Debug)]
pub struct SessionRecord {
    pub conversation_id: ConversationId,
    pub agent_name: String,
    pub session_id: SessionId,
    pub created_at: DateTime<Utc>,
    pub last_touched_at: DateTime<Utc>,
}

/// Conversation-to-session records plus the reverse protocol-to-UI mapping
/// used to route out-of-band traffic (tool approvals) back to the surface
/// that owns the session. Writes are last-write-wins; callers decide reuse
/// eligibility before overwriting.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: DashMap<ConversationId, SessionRecord>,
    ui_sessions: DashMap<SessionId, UiSessionId>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, conversation_id: &ConversationId) -> Option<SessionRecord> {
        self.sessions.get(conversation_id).map(|record| record.clone())
    }

    /// Record the active session for a conversation, replacing any prior
    /// entry. Both timestamps are stamped fresh.
    pub fn insert(
        &self,
        conversation_id: ConversationId,
        session_id: SessionId,
        agent_name: impl Into<String>,
    ) {
        let now = Utc::now();
        let record = SessionRecord {
            conversation_id: conversation_id.clone(),
            agent_name: agent_name.into(),
            session_id: session_id.clone(),
            created_at: now,
            last_touched_at: now,
        };
        debug!(conversation_id = %conversation_id, session_id = %session_id, "session recorded");
        self.sessions.insert(conversation_id, record);
    }

    /// Refresh `last_touched_at`. No-op when the conversation has no session.
    pub fn touch(&self, conversation_id: &ConversationId) {
        if let Some(mut record) = self.sessions.get_mut(conversation_id) {
            record.last_touched_at = Utc::now();
        }
    }

    /// Forget the conversation's session record along with the UI mapping it
    /// owns. Idempotent.
    pub fn clear(&self, conversation_id: &ConversationId) {
        if let Some((_, record)) = self.sessions.remove(conversation_id) {
            self.ui_sessions.remove(&record.session_id);
            debug!(conversation_id = %conversation_id, session_id = %record.session_id, "session cleared");
        }
    }

    /// Point a protocol session at the UI session that owns it. Last write
    /// wins, so a rerouted conversation steals the mapping.
    pub fn map_ui_session(&self, session_id: SessionId, ui_session_id: UiSessionId) {
        debug!(session_id = %session_id, ui_session_id = %ui_session_id, "ui session mapped");
        self.ui_sessions.insert(session_id, ui_session_id);
    }

    pub fn ui_session_for(&self, session_id: &SessionId) -> Option<UiSessionId> {
        self.ui_sessions.get(session_id).map(|entry| entry.clone())
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }
}
