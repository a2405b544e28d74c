use serde::{Deserialize, Serialize};

use crate::content::ToolResponseStats;
use crate::history::ConversationTurn;
use crate::ids::{ConversationId, UiSessionId};
use crate::transport::AgentInfoSnapshot;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    Thinking,
    ToolCall,
    Completion,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    InProgress,
    Completed,
    Error,
}

/// Execution statistics surfaced on a progress step, converted from the
/// transport's raw `ToolResponseStats`.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionStats {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_tokens: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_tokens: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_tokens: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_hit_tokens: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_use_count: Option<u32>,
}

impl From<&ToolResponseStats> for ExecutionStats {
    fn from(stats: &ToolResponseStats) -> Self {
        Self {
            duration_ms: stats.duration_ms,
            total_tokens: stats.total_tokens,
            input_tokens: stats.input_tokens,
            output_tokens: stats.output_tokens,
            cache_hit_tokens: stats.cache_hit_tokens,
            tool_use_count: stats.tool_use_count,
        }
    }
}

/// One entry in a request's progress stream. Steps are append-only: once
/// emitted they are never mutated, and ids are unique within the request.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressStep {
    pub id: u64,
    #[serde(rename = "type")]
    pub kind: StepKind,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub status: StepStatus,
    /// RFC 3339 creation time.
    pub timestamp: String,
    /// Full accumulated text at the time the step was created.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub streaming_text_snapshot: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub execution_stats: Option<ExecutionStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subagent_id: Option<String>,
}

impl ProgressStep {
    pub fn new(id: u64, kind: StepKind, title: impl Into<String>, status: StepStatus) -> Self {
        Self {
            id,
            kind,
            title: title.into(),
            description: None,
            status,
            timestamp: chrono::Utc::now().to_rfc3339(),
            streaming_text_snapshot: None,
            execution_stats: None,
            subagent_id: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_snapshot(mut self, snapshot: impl Into<String>) -> Self {
        self.streaming_text_snapshot = Some(snapshot.into());
        self
    }

    pub fn with_stats(mut self, stats: ExecutionStats) -> Self {
        self.execution_stats = Some(stats);
        self
    }

    pub fn with_subagent(mut self, subagent_id: impl Into<String>) -> Self {
        self.subagent_id = Some(subagent_id.into());
        self
    }
}

/// The text streamed so far and whether more is expected.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StreamingContent {
    pub text: String,
    pub is_streaming: bool,
}

/// One snapshot of a request's in-flight or final state, pushed to the host
/// UI. Updates within a request are ordered by emission; `steps` holds only
/// the steps produced since the previous update.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressUpdate {
    /// Host-UI session the update belongs to.
    pub session_id: UiSessionId,
    pub conversation_id: ConversationId,
    pub current_iteration: u32,
    pub total_iterations: u32,
    pub steps: Vec<ProgressStep>,
    pub is_complete: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub streaming_content: Option<StreamingContent>,
    pub conversation_history: Vec<ConversationTurn>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_session_info: Option<AgentInfoSnapshot>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_wire_shape_uses_type_tag() {
        let step = ProgressStep::new(1, StepKind::Thinking, "Thinking", StepStatus::InProgress)
            .with_description("Hi")
            .with_snapshot("Hi");
        let json = serde_json::to_string(&step).unwrap();
        assert!(json.contains(r#""type":"thinking""#));
        assert!(json.contains(r#""status":"in_progress""#));
        assert!(json.contains(r#""streamingTextSnapshot":"Hi""#));
        assert!(!json.contains("executionStats"));
    }

    #[test]
    fn execution_stats_from_tool_response_stats() {
        let raw = ToolResponseStats {
            duration_ms: Some(80),
            total_tokens: Some(1200),
            input_tokens: Some(1000),
            output_tokens: Some(150),
            cache_hit_tokens: Some(50),
            tool_use_count: Some(2),
            subagent_id: Some("helper".into()),
        };
        let stats = ExecutionStats::from(&raw);
        assert_eq!(stats.duration_ms, Some(80));
        assert_eq!(stats.input_tokens, Some(1000));
        assert_eq!(stats.output_tokens, Some(150));
        assert_eq!(stats.cache_hit_tokens, Some(50));
        assert_eq!(stats.tool_use_count, Some(2));
    }

    #[test]
    fn step_timestamp_is_rfc3339() {
        let step = ProgressStep::new(1, StepKind::Completion, "Complete", StepStatus::Completed);
        assert!(chrono::DateTime::parse_from_rfc3339(&step.timestamp).is_ok());
    }

    #[test]
    fn update_omits_absent_final_content() {
        let update = ProgressUpdate {
            session_id: UiSessionId::from_raw("ui-1"),
            conversation_id: ConversationId::from_raw("c1"),
            current_iteration: 1,
            total_iterations: 1,
            steps: vec![],
            is_complete: false,
            final_content: None,
            streaming_content: Some(StreamingContent {
                text: String::new(),
                is_streaming: true,
            }),
            conversation_history: vec![],
            agent_session_info: None,
        };
        let json = serde_json::to_string(&update).unwrap();
        assert!(!json.contains("finalContent"));
        assert!(json.contains(r#""isStreaming":true"#));
        assert!(json.contains(r#""currentIteration":1"#));
    }
}
