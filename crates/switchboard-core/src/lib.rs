pub mod content;
pub mod errors;
pub mod events;
pub mod history;
pub mod ids;
pub mod progress;
pub mod transport;

pub use content::{ContentBlock, ToolResponseStats};
pub use errors::TransportError;
pub use events::SessionNotification;
pub use history::{ConversationTurn, HistoryLoader, NoHistory, Role, StaticHistory};
pub use ids::{ConversationId, RequestId, SessionId, UiSessionId};
pub use progress::{
    ExecutionStats, ProgressStep, ProgressUpdate, StepKind, StepStatus, StreamingContent,
};
pub use transport::{AcpTransport, AgentInfoSnapshot, PromptReply, StopReason};
