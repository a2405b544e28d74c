use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{debug, info, instrument, warn};

use switchboard_core::errors::TransportError;
use switchboard_core::events::SessionNotification;
use switchboard_core::history::{ConversationTurn, HistoryLoader};
use switchboard_core::ids::{ConversationId, RequestId, SessionId, UiSessionId};
use switchboard_core::progress::{
    ProgressStep, ProgressUpdate, StepKind, StepStatus, StreamingContent,
};
use switchboard_core::transport::{AcpTransport, PromptReply, StopReason};

use crate::aggregator::{fold_notification, StepIdGen};
use crate::error::RouterError;
use crate::listener::SessionListener;
use crate::registry::SessionRegistry;
use crate::sink::{ProgressCallback, ProgressSink};

const SENDING_TITLE: &str = "Sending to agent";
const COMPLETE_TITLE: &str = "Complete";
const ERROR_TITLE: &str = "Error";

/// Per-request routing options.
#[derive(Clone)]
pub struct ProcessOptions {
    pub agent_name: String,
    pub conversation_id: ConversationId,
    /// Host-UI session the request renders into. Carried on every update and
    /// recorded in the protocol-to-UI mapping.
    pub ui_session_id: UiSessionId,
    /// Skip reuse and have the transport mint a fresh session.
    pub force_new_session: bool,
    pub on_progress: Option<ProgressCallback>,
}

/// What the caller gets back. `success` is false exactly when no session
/// could be established or the dispatch failed; `error` then carries the
/// displayable message.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<SessionId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_reason: Option<StopReason>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// State threaded through one request.
struct RequestContext {
    conversation_id: ConversationId,
    ui_session_id: UiSessionId,
    agent_name: String,
    history_view: Vec<ConversationTurn>,
    on_progress: Option<ProgressCallback>,
    ids: StepIdGen,
}

/// Routes user transcripts to agent sessions and folds the streamed output
/// into progress updates. One router serves every conversation in the
/// process; per-request state lives on the stack of `process_transcript`.
pub struct TranscriptRouter {
    transport: Arc<dyn AcpTransport>,
    history: Arc<dyn HistoryLoader>,
    registry: Arc<SessionRegistry>,
    sink: ProgressSink,
}

impl TranscriptRouter {
    pub fn new(transport: Arc<dyn AcpTransport>, history: Arc<dyn HistoryLoader>) -> Self {
        Self {
            transport,
            history,
            registry: Arc::new(SessionRegistry::new()),
            sink: ProgressSink::new(),
        }
    }

    /// Shared registry, including the protocol-to-UI lookup used to route
    /// out-of-band traffic such as tool approvals.
    pub fn registry(&self) -> Arc<SessionRegistry> {
        Arc::clone(&self.registry)
    }

    pub fn progress_sink(&self) -> ProgressSink {
        self.sink.clone()
    }

    /// Subscribe to every progress update this router emits.
    pub fn subscribe_progress(&self) -> broadcast::Receiver<ProgressUpdate> {
        self.sink.subscribe()
    }

    /// Forget the conversation's session so the next request starts fresh.
    /// Requests already in flight keep streaming; only the registry entry
    /// and its UI mapping are dropped.
    pub fn start_new_session(&self, conversation_id: &ConversationId) {
        info!(conversation_id = %conversation_id, "clearing session for conversation");
        self.registry.clear(conversation_id);
    }

    /// Route one user transcript: resolve a session, dispatch the prompt,
    /// stream progress while it is outstanding, and emit exactly one
    /// terminal update whichever way the request ends.
    #[instrument(
        skip(self, transcript, options),
        fields(conversation_id = %options.conversation_id, agent = %options.agent_name)
    )]
    pub async fn process_transcript(
        &self,
        transcript: &str,
        options: ProcessOptions,
    ) -> TranscriptOutcome {
        let request_id = RequestId::new();
        info!(request_id = %request_id, force_new = options.force_new_session, "routing transcript");

        let history_view = match self.history.load(&options.conversation_id).await {
            Ok(turns) => turns,
            Err(error) => {
                warn!(error = %error, "history load failed, continuing with empty view");
                Vec::new()
            }
        };

        let mut request = RequestContext {
            conversation_id: options.conversation_id.clone(),
            ui_session_id: options.ui_session_id.clone(),
            agent_name: options.agent_name.clone(),
            history_view,
            on_progress: options.on_progress.clone(),
            ids: StepIdGen::new(),
        };

        let session_id = match self.resolve_session(&options).await {
            Ok(session_id) => session_id,
            Err(error) => {
                warn!(request_id = %request_id, kind = error.error_kind(), error = %error, "session resolution failed");
                self.emit_error_update(&request, None, &error, String::new());
                return failure_outcome(&error, None);
            }
        };

        // Rewritten on reuse as well, so approval traffic follows the
        // surface that most recently spoke for the session.
        self.registry
            .map_ui_session(session_id.clone(), request.ui_session_id.clone());

        // Subscribe before dispatch; nothing can slip between send and
        // listen.
        let listener = SessionListener::new(self.transport.subscribe(), session_id.clone());

        let sending = ProgressStep::new(
            request.ids.next_id(),
            StepKind::Thinking,
            SENDING_TITLE,
            StepStatus::InProgress,
        );
        let initial = self.build_update(
            &request,
            Some(&session_id),
            vec![sending],
            false,
            None,
            StreamingContent {
                text: String::new(),
                is_streaming: true,
            },
        );
        self.emit_update(&request, initial);

        let (outcome, accumulated) = self
            .drive_prompt(&request, listener, &session_id, transcript)
            .await;

        let reply = match outcome {
            Ok(reply) => reply,
            Err(source) => {
                let error = RouterError::PromptDispatch(source);
                warn!(request_id = %request_id, kind = error.error_kind(), error = %error, "prompt dispatch failed");
                self.emit_error_update(&request, Some(&session_id), &error, accumulated);
                return failure_outcome(&error, Some(session_id));
            }
        };

        // The transport's reply wins; streamed text is the fallback.
        let final_response = reply
            .response
            .filter(|response| !response.is_empty())
            .or_else(|| (!accumulated.is_empty()).then(|| accumulated.clone()));

        if let Some(response) = &final_response {
            request
                .history_view
                .push(ConversationTurn::assistant(response.clone()));
        }

        let completion = ProgressStep::new(
            request.ids.next_id(),
            StepKind::Completion,
            COMPLETE_TITLE,
            StepStatus::Completed,
        );
        let terminal = self.build_update(
            &request,
            Some(&session_id),
            vec![completion],
            true,
            final_response.clone(),
            StreamingContent {
                text: accumulated,
                is_streaming: false,
            },
        );
        self.emit_update(&request, terminal);

        info!(request_id = %request_id, session_id = %session_id, stop_reason = ?reply.stop_reason, "transcript routed");
        TranscriptOutcome {
            success: true,
            response: final_response,
            session_id: Some(session_id),
            stop_reason: reply.stop_reason,
            error: None,
        }
    }

    /// Reuse the conversation's session when the stored agent matches,
    /// otherwise have the transport establish one. Registry state is only
    /// written on success.
    async fn resolve_session(&self, options: &ProcessOptions) -> Result<SessionId, RouterError> {
        if !options.force_new_session {
            if let Some(record) = self.registry.get(&options.conversation_id) {
                if record.agent_name == options.agent_name {
                    self.registry.touch(&options.conversation_id);
                    debug!(session_id = %record.session_id, "reusing existing session");
                    return Ok(record.session_id);
                }
                debug!(
                    stored = %record.agent_name,
                    requested = %options.agent_name,
                    "agent changed, establishing a replacement session"
                );
            }
        }

        let session_id = self
            .transport
            .create_or_reuse_session(&options.agent_name, options.force_new_session)
            .await
            .map_err(|source| RouterError::SessionEstablishment {
                agent: options.agent_name.clone(),
                source,
            })?;

        self.registry.insert(
            options.conversation_id.clone(),
            session_id.clone(),
            options.agent_name.clone(),
        );
        info!(session_id = %session_id, "session established");
        Ok(session_id)
    }

    /// Dispatch the transcript and stream matching notifications into
    /// progress updates until the transport resolves. Consumes the listener,
    /// so the subscription is released here exactly once, on success and
    /// failure alike.
    async fn drive_prompt(
        &self,
        request: &RequestContext,
        mut listener: SessionListener,
        session_id: &SessionId,
        transcript: &str,
    ) -> (Result<PromptReply, TransportError>, String) {
        let mut accumulated = String::new();
        let mut channel_open = true;

        let send = self
            .transport
            .send_prompt(&request.agent_name, session_id, transcript);
        tokio::pin!(send);

        let outcome = loop {
            tokio::select! {
                outcome = &mut send => break outcome,
                maybe = listener.next_event(), if channel_open => match maybe {
                    Some(notification) => {
                        accumulated =
                            self.apply_notification(request, session_id, &accumulated, &notification);
                    }
                    None => channel_open = false,
                },
            }
        };

        // Notifications that raced the reply are still buffered; fold them
        // before teardown so no streamed text is lost.
        for notification in listener.drain() {
            accumulated = self.apply_notification(request, session_id, &accumulated, &notification);
        }

        (outcome, accumulated)
    }

    fn apply_notification(
        &self,
        request: &RequestContext,
        session_id: &SessionId,
        accumulated: &str,
        notification: &SessionNotification,
    ) -> String {
        let folded = fold_notification(accumulated, notification, &request.ids);
        let streaming = StreamingContent {
            text: folded.accumulated.clone(),
            is_streaming: !notification.is_complete(),
        };
        let update = self.build_update(
            request,
            Some(session_id),
            folded.steps,
            false,
            None,
            streaming,
        );
        self.emit_update(request, update);
        folded.accumulated
    }

    fn emit_error_update(
        &self,
        request: &RequestContext,
        session_id: Option<&SessionId>,
        error: &RouterError,
        accumulated: String,
    ) {
        let step = ProgressStep::new(
            request.ids.next_id(),
            StepKind::Completion,
            ERROR_TITLE,
            StepStatus::Error,
        )
        .with_description(error.to_string());
        let update = self.build_update(
            request,
            session_id,
            vec![step],
            true,
            None,
            StreamingContent {
                text: accumulated,
                is_streaming: false,
            },
        );
        self.emit_update(request, update);
    }

    fn build_update(
        &self,
        request: &RequestContext,
        session_id: Option<&SessionId>,
        steps: Vec<ProgressStep>,
        is_complete: bool,
        final_content: Option<String>,
        streaming_content: StreamingContent,
    ) -> ProgressUpdate {
        ProgressUpdate {
            session_id: request.ui_session_id.clone(),
            conversation_id: request.conversation_id.clone(),
            current_iteration: 1,
            total_iterations: 1,
            steps,
            is_complete,
            final_content,
            streaming_content: Some(streaming_content),
            conversation_history: request.history_view.clone(),
            agent_session_info: session_id.and_then(|sid| self.transport.agent_info(sid)),
        }
    }

    fn emit_update(&self, request: &RequestContext, update: ProgressUpdate) {
        self.sink.emit(update, request.on_progress.as_ref());
    }
}

fn failure_outcome(error: &RouterError, session_id: Option<SessionId>) -> TranscriptOutcome {
    TranscriptOutcome {
        success: false,
        response: None,
        session_id,
        stop_reason: None,
        error: Some(error.to_string()),
    }
}
