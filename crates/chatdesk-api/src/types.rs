//! Wire types for the widget server endpoints

use serde::{Deserialize, Serialize};

/// Response of the health endpoint
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HealthStatus {
    /// Whether the server can reach its language model backend
    #[serde(default)]
    pub lm_studio_connected: bool,
    /// Free-form status string ("ok")
    #[serde(default)]
    pub status: Option<String>,
    /// Extra details sent when the backend is unreachable
    #[serde(default)]
    pub diagnostics: Option<Diagnostics>,
}

/// Connection diagnostics reported by the server
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Diagnostics {
    #[serde(default)]
    pub lm_studio_url: Option<String>,
    /// Timeout in seconds; some server revisions send a string
    #[serde(default)]
    pub timeout: Option<serde_json::Value>,
}

impl Diagnostics {
    /// Render the diagnostics as a short multi-line summary
    pub fn summary(&self) -> String {
        let url = self.lm_studio_url.as_deref().unwrap_or("unknown");
        let timeout = match &self.timeout {
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(serde_json::Value::Null) | None => "unknown".to_string(),
            Some(other) => other.to_string(),
        };
        format!("- Configured URL: {}\n- Timeout: {}s", url, timeout)
    }
}

/// A complete contact form as posted to the contact endpoint
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub company: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub interest: String,
}

/// Response of the contact submission endpoint
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubmitResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// A stored contact submission
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lead {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub interest: String,
}

/// Response of the last-lead endpoint
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LeadResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub lead: Option<Lead>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Response of the PDF processing endpoint
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PdfResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Response of the conversation reset endpoint
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResetResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}
