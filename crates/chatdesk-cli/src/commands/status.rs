//! /status command - probe the server and show session info

use chatdesk_core::{ChatSession, ConnectionStatus, FormState};

pub struct StatusCommand;

impl StatusCommand {
    /// Run a health probe, then describe the session
    pub async fn run(session: &mut ChatSession, session_id: &str) -> String {
        let status = session.check_connection().await;
        Self::describe(session, &status, session_id)
    }

    pub fn describe(session: &ChatSession, status: &ConnectionStatus, session_id: &str) -> String {
        let conversation = session.conversation();

        let mut output = String::from("Session Info\n");
        output.push_str(&"-".repeat(40));
        output.push('\n');

        output.push_str(&format!("Session:    {}\n", session_id));
        output.push_str(&format!("Server:     {}\n", status.label()));
        match status {
            ConnectionStatus::Degraded { detail: Some(detail) } => {
                for line in detail.lines() {
                    output.push_str(&format!("            {}\n", line.trim_start_matches("- ")));
                }
            }
            ConnectionStatus::Disconnected { reason } => {
                output.push_str(&format!("            {}\n", reason));
            }
            _ => {}
        }
        output.push('\n');

        let agent = conversation
            .current_agent
            .as_ref()
            .map(|a| a.display_name().to_string())
            .unwrap_or_else(|| "-".to_string());
        output.push_str(&format!("Agent:      {}\n", agent));
        output.push_str(&format!("Messages:   {}\n", conversation.message_count));

        let form = match session.form().state() {
            FormState::Idle if conversation.completed => "submitted".to_string(),
            FormState::Idle if !session.form().draft().is_empty() => {
                format!("draft kept ({} fields), /retry to resubmit", session.form().draft().len())
            }
            FormState::Idle => "not started".to_string(),
            FormState::Collecting(_) => match session.form().current_field() {
                Some(spec) => format!("waiting for {}", spec.label),
                None => "collecting".to_string(),
            },
            FormState::Submitting => "submitting".to_string(),
        };
        output.push_str(&format!("Contact:    {}", form));

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chatdesk_core::{HttpBackend, MemoryFlagStore, SessionConfig};
    use std::sync::Arc;

    #[test]
    fn test_describe_offline_session() {
        let session = ChatSession::new(
            SessionConfig::default(),
            Arc::new(HttpBackend::new(Default::default())),
            Arc::new(MemoryFlagStore::new()),
        );
        let status = ConnectionStatus::Disconnected {
            reason: "connection refused".to_string(),
        };
        let text = StatusCommand::describe(&session, &status, "abc123");
        assert!(text.contains("Session:    abc123"));
        assert!(text.contains("Server:     offline"));
        assert!(text.contains("connection refused"));
        assert!(text.contains("Contact:    not started"));
    }
}
