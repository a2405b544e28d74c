/// Errors produced by transport implementations.
#[derive(Clone, Debug, thiserror::Error)]
pub enum TransportError {
    /// The transport could not produce a usable session identifier.
    #[error("session could not be established: {0}")]
    SessionUnavailable(String),

    /// Prompt dispatch failed. The message is surfaced verbatim to callers
    /// in the request outcome, so it should stand on its own.
    #[error("{0}")]
    SendFailed(String),

    /// The agent process spoke something this layer could not interpret.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The shared notification channel is gone (transport shut down).
    #[error("notification channel closed")]
    ChannelClosed,
}

impl TransportError {
    /// Failures that occur before a session exists.
    pub fn is_session_failure(&self) -> bool {
        matches!(self, Self::SessionUnavailable(_))
    }

    /// Short classification string for logging.
    pub fn error_kind(&self) -> &'static str {
        match self {
            Self::SessionUnavailable(_) => "session_unavailable",
            Self::SendFailed(_) => "send_failed",
            Self::Protocol(_) => "protocol",
            Self::ChannelClosed => "channel_closed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn send_failure_message_passes_through() {
        let err = TransportError::SendFailed("network down".into());
        assert_eq!(err.to_string(), "network down");
    }

    #[test]
    fn session_failure_classification() {
        assert!(TransportError::SessionUnavailable("agent offline".into()).is_session_failure());
        assert!(!TransportError::SendFailed("boom".into()).is_session_failure());
        assert!(!TransportError::ChannelClosed.is_session_failure());
    }

    #[test]
    fn error_kind_strings() {
        assert_eq!(
            TransportError::SessionUnavailable("x".into()).error_kind(),
            "session_unavailable"
        );
        assert_eq!(TransportError::SendFailed("x".into()).error_kind(), "send_failed");
        assert_eq!(TransportError::ChannelClosed.error_kind(), "channel_closed");
    }
}
