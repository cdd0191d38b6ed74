//! Conversation-level state shared with the UI

use serde::{Deserialize, Serialize};

use crate::agents::AgentId;

/// Input controls; loading implies input is disabled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Controls {
    pub input_enabled: bool,
    pub loading: bool,
}

impl Controls {
    pub fn ready() -> Self {
        Self {
            input_enabled: true,
            loading: false,
        }
    }

    pub fn busy() -> Self {
        Self {
            input_enabled: false,
            loading: true,
        }
    }
}

impl Default for Controls {
    fn default() -> Self {
        Self::ready()
    }
}

/// Server connectivity as last observed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ConnectionStatus {
    #[default]
    Unknown,
    Connected,
    /// Server reachable but its model backend is not
    Degraded { detail: Option<String> },
    Disconnected { reason: String },
}

impl ConnectionStatus {
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionStatus::Connected)
    }

    pub fn label(&self) -> &'static str {
        match self {
            ConnectionStatus::Unknown => "connecting",
            ConnectionStatus::Connected => "online",
            ConnectionStatus::Degraded { .. } => "degraded",
            ConnectionStatus::Disconnected { .. } => "offline",
        }
    }
}

/// State of the conversation with the server
#[derive(Debug, Clone, Default)]
pub struct Conversation {
    /// User messages processed so far
    pub message_count: u64,
    /// Contact details were submitted; further messages get the closing reply
    pub completed: bool,
    pub current_agent: Option<AgentId>,
    pub controls: Controls,
    pub connection: ConnectionStatus,
}

impl Conversation {
    pub fn new(completed: bool) -> Self {
        Self {
            completed,
            ..Default::default()
        }
    }

    /// Forget everything except connectivity
    pub fn reset(&mut self) {
        self.message_count = 0;
        self.completed = false;
        self.current_agent = None;
        self.controls = Controls::ready();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reset_keeps_connection() {
        let mut conv = Conversation::new(true);
        conv.message_count = 4;
        conv.current_agent = Some(AgentId::new("SalesAgent"));
        conv.controls = Controls::busy();
        conv.connection = ConnectionStatus::Connected;

        conv.reset();
        assert_eq!(conv.message_count, 0);
        assert!(!conv.completed);
        assert!(conv.current_agent.is_none());
        assert_eq!(conv.controls, Controls::ready());
        assert!(conv.connection.is_connected());
    }

    #[test]
    fn test_busy_controls_disable_input() {
        let c = Controls::busy();
        assert!(c.loading);
        assert!(!c.input_enabled);
    }
}
