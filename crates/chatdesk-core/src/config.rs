//! Session configuration: timeouts, user-facing texts and form layout

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::form::FormConfig;

/// Network deadlines
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timeouts {
    /// Deadline for a whole chat request, from opening the stream to its last event
    pub connection_secs: u64,
    /// Delay before probing the server again after a failed stream
    pub reconnect_secs: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            connection_secs: 30,
            reconnect_secs: 5,
        }
    }
}

impl Timeouts {
    pub fn connection(&self) -> Duration {
        Duration::from_secs(self.connection_secs)
    }

    pub fn reconnect(&self) -> Duration {
        Duration::from_secs(self.reconnect_secs)
    }
}

/// Texts shown to the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Messages {
    pub welcome: String,
    /// Reply to every message once contact details were submitted
    pub closing: String,
    pub connection_error: String,
    pub timeout_error: String,
    pub server_error: String,
    pub form_success: String,
    pub form_error: String,
    /// Prefix of the notice shown when the model backend is unreachable
    pub model_unavailable: String,
}

impl Default for Messages {
    fn default() -> Self {
        Self {
            welcome: "Hello! I'm the virtual assistant. How can I help you today?".to_string(),
            closing: "Thanks for your interest! We already have your contact details and a \
                      representative will get in touch with you soon."
                .to_string(),
            connection_error:
                "Error: could not connect to the server. Check your internet connection."
                    .to_string(),
            timeout_error: "Error: the request took too long. Please try again.".to_string(),
            server_error: "Server error. Please try again.".to_string(),
            form_success: "Thank you for sharing your contact details! A representative will \
                           contact you soon."
                .to_string(),
            form_error: "Sorry, something went wrong while processing your details. Please try \
                         again."
                .to_string(),
            model_unavailable: "The language model is currently unavailable.".to_string(),
        }
    }
}

/// Everything a chat session needs besides its collaborators
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub timeouts: Timeouts,
    pub messages: Messages,
    pub form: FormConfig,
}
