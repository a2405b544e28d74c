use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use switchboard_core::errors::TransportError;
use switchboard_core::events::SessionNotification;
use switchboard_core::ids::SessionId;
use switchboard_core::transport::{AcpTransport, AgentInfoSnapshot, PromptReply, StopReason};
use tokio::sync::broadcast;

use crate::bus::SessionEventBus;

const DEFAULT_EVENT_PAUSE: Duration = Duration::from_millis(5);

/// Scripted behavior for one `send_prompt` call: notifications to emit onto
/// the bus while the call is outstanding, then the outcome to return.
pub struct PromptScript {
    events: Vec<SessionNotification>,
    outcome: Result<PromptReply, TransportError>,
    pause: Duration,
}

impl PromptScript {
    /// Succeed with a final response text.
    pub fn reply(text: impl Into<String>) -> Self {
        Self {
            events: Vec::new(),
            outcome: Ok(PromptReply {
                response: Some(text.into()),
                stop_reason: Some(StopReason::EndTurn),
            }),
            pause: DEFAULT_EVENT_PAUSE,
        }
    }

    /// Succeed without response text (callers fall back to streamed text).
    pub fn empty_reply() -> Self {
        Self {
            events: Vec::new(),
            outcome: Ok(PromptReply {
                response: None,
                stop_reason: Some(StopReason::EndTurn),
            }),
            pause: DEFAULT_EVENT_PAUSE,
        }
    }

    /// Fail the dispatch with the given message.
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            events: Vec::new(),
            outcome: Err(TransportError::SendFailed(message.into())),
            pause: DEFAULT_EVENT_PAUSE,
        }
    }

    /// Emit a notification before resolving.
    pub fn with_event(mut self, notification: SessionNotification) -> Self {
        self.events.push(notification);
        self
    }

    /// Time to wait after each emitted notification.
    pub fn with_pause(mut self, pause: Duration) -> Self {
        self.pause = pause;
        self
    }
}

/// Transport double with pre-programmed behavior for deterministic tests.
/// Sessions are scripted per agent name and prompts per session id, so
/// concurrent requests cannot steal each other's scripts.
pub struct MockTransport {
    bus: SessionEventBus,
    sessions: Mutex<HashMap<String, VecDeque<Result<SessionId, TransportError>>>>,
    prompts: Mutex<HashMap<SessionId, VecDeque<PromptScript>>>,
    info: Mutex<HashMap<SessionId, AgentInfoSnapshot>>,
    create_log: Mutex<Vec<(String, bool)>>,
    send_log: Mutex<Vec<(String, SessionId, String)>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            bus: SessionEventBus::new(),
            sessions: Mutex::new(HashMap::new()),
            prompts: Mutex::new(HashMap::new()),
            info: Mutex::new(HashMap::new()),
            create_log: Mutex::new(Vec::new()),
            send_log: Mutex::new(Vec::new()),
        }
    }

    /// Queue a session-establishment result for `agent_name`.
    pub fn script_session(&self, agent_name: &str, result: Result<SessionId, TransportError>) {
        self.sessions
            .lock()
            .entry(agent_name.to_string())
            .or_default()
            .push_back(result);
    }

    /// Queue a prompt script for `session_id`.
    pub fn script_prompt(&self, session_id: &SessionId, script: PromptScript) {
        self.prompts
            .lock()
            .entry(session_id.clone())
            .or_default()
            .push_back(script);
    }

    pub fn set_agent_info(&self, session_id: &SessionId, info: AgentInfoSnapshot) {
        self.info.lock().insert(session_id.clone(), info);
    }

    pub fn bus(&self) -> &SessionEventBus {
        &self.bus
    }

    /// `(agent_name, force_new)` for every create call, in order.
    pub fn create_calls(&self) -> Vec<(String, bool)> {
        self.create_log.lock().clone()
    }

    /// `(agent_name, session_id, transcript)` for every send call, in order.
    pub fn send_calls(&self) -> Vec<(String, SessionId, String)> {
        self.send_log.lock().clone()
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AcpTransport for MockTransport {
    async fn create_or_reuse_session(
        &self,
        agent_name: &str,
        force_new: bool,
    ) -> Result<SessionId, TransportError> {
        self.create_log
            .lock()
            .push((agent_name.to_string(), force_new));

        self.sessions
            .lock()
            .get_mut(agent_name)
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| {
                Err(TransportError::SessionUnavailable(format!(
                    "no session scripted for agent '{agent_name}'"
                )))
            })
    }

    async fn send_prompt(
        &self,
        agent_name: &str,
        session_id: &SessionId,
        transcript: &str,
    ) -> Result<PromptReply, TransportError> {
        self.send_log.lock().push((
            agent_name.to_string(),
            session_id.clone(),
            transcript.to_string(),
        ));

        let script = self
            .prompts
            .lock()
            .get_mut(session_id)
            .and_then(VecDeque::pop_front);

        let Some(script) = script else {
            return Err(TransportError::SendFailed(format!(
                "no prompt scripted for session '{session_id}'"
            )));
        };

        for notification in script.events {
            self.bus.emit(notification);
            tokio::time::sleep(script.pause).await;
        }

        script.outcome
    }

    fn subscribe(&self) -> broadcast::Receiver<SessionNotification> {
        self.bus.subscribe()
    }

    fn agent_info(&self, session_id: &SessionId) -> Option<AgentInfoSnapshot> {
        self.info.lock().get(session_id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn scripted_session_is_returned() {
        let mock = MockTransport::new();
        mock.script_session("claude", Ok(SessionId::from_raw("s1")));

        let sid = mock.create_or_reuse_session("claude", false).await.unwrap();
        assert_eq!(sid.as_str(), "s1");
        assert_eq!(mock.create_calls(), vec![("claude".to_string(), false)]);
    }

    #[tokio::test]
    async fn unscripted_agent_fails_session_creation() {
        let mock = MockTransport::new();
        let err = mock.create_or_reuse_session("claude", true).await.unwrap_err();
        assert!(err.is_session_failure());
        assert!(err.to_string().contains("claude"));
    }

    #[tokio::test]
    async fn sessions_are_consumed_in_order() {
        let mock = MockTransport::new();
        mock.script_session("claude", Ok(SessionId::from_raw("s1")));
        mock.script_session("claude", Ok(SessionId::from_raw("s2")));

        let first = mock.create_or_reuse_session("claude", false).await.unwrap();
        let second = mock.create_or_reuse_session("claude", true).await.unwrap();
        assert_eq!(first.as_str(), "s1");
        assert_eq!(second.as_str(), "s2");
    }

    #[tokio::test]
    async fn prompt_emits_scripted_events_then_resolves() {
        let mock = MockTransport::new();
        let sid = SessionId::from_raw("s1");
        mock.script_prompt(
            &sid,
            PromptScript::reply("Hi there")
                .with_event(SessionNotification::text(sid.clone(), "Hi"))
                .with_pause(Duration::from_millis(1)),
        );

        let mut rx = mock.subscribe();
        let reply = mock.send_prompt("claude", &sid, "hello").await.unwrap();

        assert_eq!(reply.response.as_deref(), Some("Hi there"));
        assert_eq!(reply.stop_reason, Some(StopReason::EndTurn));

        let n = rx.recv().await.unwrap();
        assert_eq!(n.session_id, sid);
    }

    #[tokio::test]
    async fn scripted_failure_is_returned() {
        let mock = MockTransport::new();
        let sid = SessionId::from_raw("s1");
        mock.script_prompt(&sid, PromptScript::failure("network down"));

        let err = mock.send_prompt("claude", &sid, "hello").await.unwrap_err();
        assert_eq!(err.to_string(), "network down");
    }

    #[tokio::test]
    async fn unscripted_prompt_fails() {
        let mock = MockTransport::new();
        let sid = SessionId::from_raw("s9");
        let err = mock.send_prompt("claude", &sid, "hello").await.unwrap_err();
        assert!(err.to_string().contains("s9"));
    }

    #[tokio::test]
    async fn agent_info_round_trips() {
        let mock = MockTransport::new();
        let sid = SessionId::from_raw("s1");
        assert!(mock.agent_info(&sid).is_none());

        let info = AgentInfoSnapshot {
            model: Some("opus".into()),
            mode: Some("code".into()),
            ..Default::default()
        };
        mock.set_agent_info(&sid, info.clone());
        assert_eq!(mock.agent_info(&sid), Some(info));
    }

    #[tokio::test]
    async fn send_log_records_transcripts() {
        let mock = MockTransport::new();
        let sid = SessionId::from_raw("s1");
        mock.script_prompt(&sid, PromptScript::empty_reply());

        let _ = mock.send_prompt("claude", &sid, "hello").await;
        let calls = mock.send_calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].2, "hello");
    }
}
