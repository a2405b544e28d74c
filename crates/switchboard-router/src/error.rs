use thiserror::Error;

use switchboard_core::errors::TransportError;

/// Failures surfaced while routing a transcript through an agent session.
#[derive(Debug, Error)]
pub enum RouterError {
    /// No usable session could be established. Fatal for the request and
    /// raised before any registry state is written.
    #[error("failed to establish session with agent '{agent}': {source}")]
    SessionEstablishment {
        agent: String,
        #[source]
        source: TransportError,
    },

    /// The prompt dispatch itself failed after the session was live.
    /// Displays as the transport's own message, which callers see verbatim.
    #[error("{0}")]
    PromptDispatch(#[from] TransportError),
}

impl RouterError {
    /// Stable tag for log fields.
    pub fn error_kind(&self) -> &'static str {
        match self {
            Self::SessionEstablishment { .. } => "session_establishment",
            Self::PromptDispatch(_) => "prompt_dispatch",
        }
    }

    /// True when the failure happened before a session existed.
    pub fn is_establishment_failure(&self) -> bool {
        matches!(self, Self::SessionEstablishment { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn establishment_error_names_the_agent() {
        let error = RouterError::SessionEstablishment {
            agent: "claude".to_string(),
            source: TransportError::SessionUnavailable("spawn failed".to_string()),
        };

        let message = error.to_string();
        assert!(message.contains("failed to establish session with agent 'claude'"));
        assert!(message.contains("spawn failed"));
        assert_eq!(error.error_kind(), "session_establishment");
        assert!(error.is_establishment_failure());
    }

    #[test]
    fn dispatch_error_passes_the_transport_message_through() {
        let error = RouterError::from(TransportError::SendFailed("network down".to_string()));

        assert_eq!(error.to_string(), "network down");
        assert_eq!(error.error_kind(), "prompt_dispatch");
        assert!(!error.is_establishment_failure());
    }
}
