//! Configuration file support

use chatdesk_api::Endpoints;
use chatdesk_core::SessionConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Configuration for chatdesk
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Widget server location and endpoint paths
    pub server: Endpoints,
    /// Timeouts, texts and form layout
    pub session: SessionConfig,
    pub ui: UiConfig,
}

/// Terminal settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    /// Whether to use TUI mode by default
    pub tui: Option<bool>,
    /// Color theme (dark, light)
    pub theme: Option<String>,
}

impl Config {
    /// Get the config directory
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("chatdesk")
    }

    /// Get the config file path
    pub fn config_path() -> PathBuf {
        if let Ok(path) = std::env::var("CHATDESK_CONFIG_PATH") {
            return PathBuf::from(path);
        }
        Self::config_dir().join("config.toml")
    }

    /// Load config from the default location
    pub fn load() -> Self {
        Self::load_from(&Self::config_path())
    }

    /// Load config from a file, falling back to defaults
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        match fs::read_to_string(path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(config) => config,
                Err(e) => {
                    eprintln!("Warning: Failed to parse config file: {}", e);
                    Self::default()
                }
            },
            Err(e) => {
                eprintln!("Warning: Failed to read config file: {}", e);
                Self::default()
            }
        }
    }

    /// Save config to a file
    pub fn save_to(&self, path: &Path) -> std::io::Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        let content = toml::to_string_pretty(self).map_err(std::io::Error::other)?;
        fs::write(path, content)
    }

    /// Create a default config file if it doesn't exist
    pub fn init() -> std::io::Result<PathBuf> {
        let path = Self::config_path();
        if path.exists() {
            return Ok(path);
        }

        let default_config = Config {
            ui: UiConfig {
                tui: Some(true),
                theme: Some("dark".to_string()),
            },
            ..Default::default()
        };
        default_config.save_to(&path)?;
        Ok(path)
    }

    pub fn use_tui(&self) -> bool {
        self.ui.tui.unwrap_or(true)
    }

    pub fn theme_name(&self) -> &str {
        self.ui.theme.as_deref().unwrap_or("dark")
    }
}

/// Generate example config content
pub fn example_config() -> &'static str {
    r#"# chatdesk configuration file
# Place at ~/.config/chatdesk/config.toml (Linux) or set CHATDESK_CONFIG_PATH

[server]
base_url = "http://localhost:5000"
# Endpoint paths are relative to base_url unless absolute
health = "/agent/health"
chat_stream = "/agent/chat/stream"
submit_contact = "/submit-contact"
last_lead = "/admin/get-last-lead"
process_pdf = "/process-pdf"
reset = "/agent/reset"

[session.timeouts]
# Deadline for opening the stream and for each event after it
connection_secs = 30
# Delay before re-probing health after a failed stream
reconnect_secs = 5

[session.form]
fields = ["name", "email", "phone", "company", "interest"]
# "clear" discards the draft after a failed submission, "retain" keeps it for /retry
on_failure = "clear"

# Override any user-facing text
# [session.messages]
# welcome = "Hello! How can I help you today?"
# closing = "Thanks! We will be in touch soon."

[ui]
tui = true
# dark or light
theme = "dark"
"#
}

#[cfg(test)]
mod tests {
    use super::*;
    use chatdesk_core::{FailurePolicy, FieldKind};

    #[test]
    fn test_example_config_parses() {
        let config: Config = toml::from_str(example_config()).unwrap();
        assert_eq!(config.server, Endpoints::default());
        assert_eq!(config.session.timeouts.connection_secs, 30);
        assert_eq!(config.session.form.fields.len(), 5);
        assert_eq!(config.session.form.on_failure, FailurePolicy::Clear);
        assert!(config.use_tui());
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config: Config = toml::from_str(
            r#"
            [server]
            base_url = "https://chat.example.com"

            [session.form]
            fields = ["email", "name"]
            on_failure = "retain"

            [ui]
            theme = "light"
            "#,
        )
        .unwrap();

        assert_eq!(config.server.base_url, "https://chat.example.com");
        assert_eq!(config.server.health, "/agent/health");
        assert_eq!(config.session.form.fields, vec![FieldKind::Email, FieldKind::Name]);
        assert_eq!(config.session.form.on_failure, FailurePolicy::Retain);
        assert_eq!(config.session.timeouts.reconnect_secs, 5);
        assert_eq!(config.theme_name(), "light");
    }

    #[test]
    fn test_save_and_load_roundtrip_through_file() {
        let path = std::env::temp_dir()
            .join(format!("chatdesk-config-{}", uuid::Uuid::new_v4()))
            .join("config.toml");
        let mut config = Config::default();
        config.server.base_url = "http://10.0.0.2:8080".to_string();
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path);
        assert_eq!(loaded.server.base_url, "http://10.0.0.2:8080");
        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let config = Config::load_from(Path::new("/nonexistent/chatdesk/config.toml"));
        assert_eq!(config.server.base_url, "http://localhost:5000");
    }
}
