use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::errors::TransportError;
use crate::events::SessionNotification;
use crate::ids::SessionId;

/// Why the agent stopped producing output for a prompt.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    EndTurn,
    MaxTokens,
    MaxTurnRequests,
    Refusal,
    Cancelled,
}

/// Terminal result of a prompt dispatch.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptReply {
    /// Final response text, when the agent returned one out of band of the
    /// streamed notifications.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_reason: Option<StopReason>,
}

/// Descriptive info about the agent serving a session. Everything is
/// optional: transports that cannot answer simply return nothing.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AgentInfoSnapshot {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub available_models: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub available_modes: Vec<String>,
}

/// Seam to the external agent process. Implementations own the wire protocol
/// (framing, process lifecycle, retries); this layer only consumes sessions,
/// prompt dispatch, and the shared notification channel.
#[async_trait]
pub trait AcpTransport: Send + Sync {
    /// Resolve a protocol session for `agent_name`. With `force_new` the
    /// transport must not hand back a previously issued session.
    async fn create_or_reuse_session(
        &self,
        agent_name: &str,
        force_new: bool,
    ) -> Result<SessionId, TransportError>;

    /// Dispatch a user transcript into the session and await the terminal
    /// reply. Streamed output arrives separately on the notification channel
    /// while this call is outstanding.
    async fn send_prompt(
        &self,
        agent_name: &str,
        session_id: &SessionId,
        transcript: &str,
    ) -> Result<PromptReply, TransportError>;

    /// Subscribe to the shared notification channel. The channel carries
    /// traffic for every active session; callers filter by session id.
    fn subscribe(&self) -> broadcast::Receiver<SessionNotification>;

    /// Current agent/session descriptive info, if the transport tracks it.
    fn agent_info(&self, session_id: &SessionId) -> Option<AgentInfoSnapshot> {
        let _ = session_id;
        None
    }
}
