//! Chat stream events and SSE decoding

use futures::StreamExt;
use reqwest_eventsource::{Event, EventSource};
use serde::{Deserialize, Serialize};
use std::pin::Pin;
use tokio_stream::Stream;

/// Events emitted while a chat response streams in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChatEvent {
    /// Response text fragment
    Token { text: String },
    /// Server asks the client to collect a contact field
    Field { field: String },
    /// Identity of the agent producing the response
    Agent { agent: String },
    /// Server reported an error; terminal
    Error { message: String },
    /// Response completed; terminal
    Done,
    /// Transport failed before a terminal event arrived; terminal
    Disconnected { reason: String },
}

impl ChatEvent {
    /// Check if this is a terminal event
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ChatEvent::Done | ChatEvent::Error { .. } | ChatEvent::Disconnected { .. }
        )
    }

    pub fn token(text: impl Into<String>) -> Self {
        Self::Token { text: text.into() }
    }

    pub fn field(field: impl Into<String>) -> Self {
        Self::Field {
            field: field.into(),
        }
    }

    pub fn agent(agent: impl Into<String>) -> Self {
        Self::Agent {
            agent: agent.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }
}

/// A stream of chat events
pub type ChatEventStream = Pin<Box<dyn Stream<Item = ChatEvent> + Send>>;

/// Raw `data:` payload; a single payload may carry several keys at once
#[derive(Debug, Default, Deserialize)]
struct ChatPayload {
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    field: Option<String>,
    #[serde(default)]
    agent: Option<String>,
    #[serde(default)]
    done: Option<serde_json::Value>,
    #[serde(default)]
    error: Option<serde_json::Value>,
}

/// Truthiness of a loosely typed JSON flag
fn is_truthy(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Null => false,
        serde_json::Value::Bool(b) => *b,
        serde_json::Value::String(s) => !s.is_empty(),
        serde_json::Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        _ => true,
    }
}

/// Decode one SSE `data:` payload into events.
///
/// Order is token, field, agent, then either `Error` (when an error key is
/// set) or `Done`.
pub fn decode_payload(data: &str) -> crate::Result<Vec<ChatEvent>> {
    let payload: ChatPayload = serde_json::from_str(data)?;
    let mut events = Vec::new();

    if let Some(text) = payload.token.filter(|t| !t.is_empty()) {
        events.push(ChatEvent::Token { text });
    }
    if let Some(field) = payload.field.filter(|f| !f.is_empty()) {
        events.push(ChatEvent::Field { field });
    }
    if let Some(agent) = payload.agent.filter(|a| !a.is_empty()) {
        events.push(ChatEvent::Agent { agent });
    }

    match payload.error {
        Some(serde_json::Value::String(message)) if !message.is_empty() => {
            events.push(ChatEvent::Error { message });
        }
        Some(ref value) if is_truthy(value) => {
            events.push(ChatEvent::error(value.to_string()));
        }
        _ => {
            if payload.done.as_ref().is_some_and(is_truthy) {
                events.push(ChatEvent::Done);
            }
        }
    }

    Ok(events)
}

/// Turn an open event source into a stream of chat events.
///
/// The stream ends after the first terminal event. If the server closes the
/// connection without one, the stream simply ends.
pub(crate) fn create_stream(mut event_source: EventSource) -> impl Stream<Item = ChatEvent> {
    async_stream::stream! {
        while let Some(event) = event_source.next().await {
            match event {
                Ok(Event::Open) => {
                    tracing::debug!("chat stream opened");
                }
                Ok(Event::Message(msg)) => {
                    if msg.data.trim().is_empty() {
                        continue;
                    }
                    match decode_payload(&msg.data) {
                        Ok(events) => {
                            for event in events {
                                let terminal = event.is_terminal();
                                yield event;
                                if terminal {
                                    event_source.close();
                                    return;
                                }
                            }
                        }
                        Err(e) => {
                            // Malformed fragments are skipped, the stream carries on
                            tracing::warn!("Failed to parse chat payload: {} ({})", e, msg.data);
                        }
                    }
                }
                Err(reqwest_eventsource::Error::StreamEnded) => {
                    tracing::debug!("chat stream ended by server");
                    break;
                }
                Err(reqwest_eventsource::Error::InvalidStatusCode(status, _)) => {
                    event_source.close();
                    yield ChatEvent::Disconnected {
                        reason: format!("Server responded with status {}", status.as_u16()),
                    };
                    return;
                }
                Err(e) => {
                    event_source.close();
                    yield ChatEvent::Disconnected {
                        reason: e.to_string(),
                    };
                    return;
                }
            }
        }
        event_source.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_payload() {
        let events = decode_payload(r#"{"token":"Hola"}"#).unwrap();
        assert_eq!(events, vec![ChatEvent::token("Hola")]);
    }

    #[test]
    fn test_token_with_field_payload() {
        let events = decode_payload(r#"{"token":"¿Cómo te llamas?","field":"name"}"#).unwrap();
        assert_eq!(
            events,
            vec![ChatEvent::token("¿Cómo te llamas?"), ChatEvent::field("name")]
        );
    }

    #[test]
    fn test_done_with_agent_payload() {
        let events = decode_payload(r#"{"done":true,"agent":"SalesAgent"}"#).unwrap();
        assert_eq!(events, vec![ChatEvent::agent("SalesAgent"), ChatEvent::Done]);
    }

    #[test]
    fn test_done_with_error_is_error_only() {
        let events = decode_payload(r#"{"done":true,"error":"model offline"}"#).unwrap();
        assert_eq!(events, vec![ChatEvent::error("model offline")]);
        assert!(events[0].is_terminal());
    }

    #[test]
    fn test_falsy_flags_emit_nothing() {
        let events = decode_payload(r#"{"done":false,"error":null,"token":""}"#).unwrap();
        assert!(events.is_empty());
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        assert!(decode_payload("not json").is_err());
    }

    #[test]
    fn test_terminal_events() {
        assert!(ChatEvent::Done.is_terminal());
        assert!(ChatEvent::Disconnected { reason: "x".into() }.is_terminal());
        assert!(!ChatEvent::token("a").is_terminal());
        assert!(!ChatEvent::field("email").is_terminal());
    }
}
