//! Session event types

use crate::{
    agents::AgentId,
    conversation::{ConnectionStatus, Controls},
    form::FieldSpec,
};

/// Events emitted while a session processes user input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A bot bubble started streaming
    ResponseStarted,

    /// Bot bubble text so far
    ResponseUpdated { text: String },

    /// Bot bubble finalized
    ResponseFinished {
        text: String,
        agent: Option<AgentId>,
    },

    /// Response aborted; partial text stays in the bubble
    ResponseFailed { partial: String, message: String },

    /// The responding agent changed
    AgentChanged { agent: AgentId },

    /// The input box now collects this contact field
    FieldRequested { spec: FieldSpec },

    /// Form collection ended
    FormClosed,

    /// Form input was rejected
    FormError { message: String },

    /// A complete bot message not produced by streaming
    BotMessage { text: String },

    /// Informational notice
    SystemMessage { text: String },

    /// Connectivity changed
    ConnectionChanged { status: ConnectionStatus },

    /// Input controls changed
    ControlsChanged { controls: Controls },
}

impl SessionEvent {
    /// Check if this event closes a response
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SessionEvent::ResponseFinished { .. } | SessionEvent::ResponseFailed { .. }
        )
    }
}
