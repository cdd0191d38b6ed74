//! HTTP client for the widget server

use reqwest::Url;
use reqwest::multipart::{Form, Part};
use reqwest_eventsource::EventSource;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::{
    error::{Error, Result},
    stream::{ChatEventStream, create_stream},
    types::{ContactForm, HealthStatus, LeadResponse, PdfResponse, ResetResponse, SubmitResponse},
};

/// Server endpoint paths, relative to `base_url` unless absolute
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    pub base_url: String,
    pub health: String,
    pub chat_stream: String,
    pub submit_contact: String,
    pub last_lead: String,
    pub process_pdf: String,
    pub reset: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            health: "/agent/health".to_string(),
            chat_stream: "/agent/chat/stream".to_string(),
            submit_contact: "/submit-contact".to_string(),
            last_lead: "/admin/get-last-lead".to_string(),
            process_pdf: "/process-pdf".to_string(),
            reset: "/agent/reset".to_string(),
        }
    }
}

impl Endpoints {
    /// Resolve an endpoint path against the base URL
    pub fn url(&self, path: &str) -> Result<Url> {
        let raw = if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else {
            format!(
                "{}/{}",
                self.base_url.trim_end_matches('/'),
                path.trim_start_matches('/')
            )
        };
        Url::parse(&raw).map_err(|e| Error::InvalidUrl(format!("{}: {}", raw, e)))
    }
}

/// Widget server client
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    endpoints: Endpoints,
}

impl ApiClient {
    /// Create a client for the given endpoints
    pub fn new(endpoints: Endpoints) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoints,
        }
    }

    /// Configured endpoints
    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// Check server connectivity
    pub async fn health(&self) -> Result<HealthStatus> {
        let url = self.endpoints.url(&self.endpoints.health)?;
        tracing::debug!("GET {}", url);
        let response = self.client.get(url).send().await?;
        read_json(response).await
    }

    /// Open the server-sent chat stream for a message
    pub async fn chat_stream(&self, message: &str) -> Result<ChatEventStream> {
        let url = self.endpoints.url(&self.endpoints.chat_stream)?;
        tracing::debug!("GET {} (stream)", url);

        let request_builder = self.client.get(url).query(&[("message", message)]);
        let event_source = EventSource::new(request_builder)
            .map_err(|e| Error::Sse(format!("Failed to create event source: {}", e)))?;

        Ok(Box::pin(create_stream(event_source)))
    }

    /// Post a completed contact form
    pub async fn submit_contact(&self, form: &ContactForm) -> Result<SubmitResponse> {
        let url = self.endpoints.url(&self.endpoints.submit_contact)?;
        tracing::debug!("POST {}", url);
        let response = self.client.post(url).json(form).send().await?;
        read_json(response).await
    }

    /// Fetch the most recently stored lead
    pub async fn last_lead(&self) -> Result<LeadResponse> {
        let url = self.endpoints.url(&self.endpoints.last_lead)?;
        tracing::debug!("GET {}", url);
        let response = self.client.get(url).send().await?;
        read_json(response).await
    }

    /// Upload a PDF for text extraction
    pub async fn process_pdf(&self, path: &Path) -> Result<PdfResponse> {
        let url = self.endpoints.url(&self.endpoints.process_pdf)?;
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document.pdf".to_string());
        tracing::debug!("POST {} ({}, {} bytes)", url, file_name, bytes.len());

        let part = Part::bytes(bytes)
            .file_name(file_name)
            .mime_str("application/pdf")?;
        let form = Form::new().part("file", part);

        let response = self.client.post(url).multipart(form).send().await?;
        read_json(response).await
    }

    /// Reset the server-side conversation context
    pub async fn reset(&self) -> Result<ResetResponse> {
        let url = self.endpoints.url(&self.endpoints.reset)?;
        tracing::debug!("POST {}", url);
        let response = self.client.post(url).send().await?;
        read_json(response).await
    }
}

/// Decode a JSON body; error statuses with a non-JSON body become `Error::Api`
async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let status = response.status();
    let body = response.text().await?;

    match serde_json::from_str::<T>(&body) {
        Ok(value) => Ok(value),
        Err(e) if status.is_success() => Err(e.into()),
        Err(_) => Err(Error::api(status.as_u16(), body)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_paths_join_base_url() {
        let endpoints = Endpoints {
            base_url: "http://localhost:5000/".to_string(),
            ..Default::default()
        };
        let url = endpoints.url(&endpoints.health).unwrap();
        assert_eq!(url.as_str(), "http://localhost:5000/agent/health");
    }

    #[test]
    fn test_base_url_with_prefix() {
        let endpoints = Endpoints {
            base_url: "https://chat.example.com/widget".to_string(),
            ..Default::default()
        };
        let url = endpoints.url("submit-contact").unwrap();
        assert_eq!(url.as_str(), "https://chat.example.com/widget/submit-contact");
    }

    #[test]
    fn test_absolute_path_overrides_base() {
        let endpoints = Endpoints::default();
        let url = endpoints.url("https://pdf.example.com/process").unwrap();
        assert_eq!(url.host_str(), Some("pdf.example.com"));
    }

    #[test]
    fn test_invalid_base_url() {
        let endpoints = Endpoints {
            base_url: "not a url".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            endpoints.url("/agent/health"),
            Err(Error::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_endpoints_partial_toml_keeps_defaults() {
        let endpoints: Endpoints =
            serde_json::from_str(r#"{"base_url":"http://10.0.0.2:8080","chat_stream":"/chat/stream"}"#)
                .unwrap();
        assert_eq!(endpoints.chat_stream, "/chat/stream");
        assert_eq!(endpoints.health, "/agent/health");
    }
}
