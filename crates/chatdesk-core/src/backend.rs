//! Backend abstraction for reaching the widget server

use async_trait::async_trait;
use chatdesk_api::{
    ApiClient, ChatEventStream, ContactForm, Endpoints, HealthStatus, LeadResponse, PdfResponse,
    ResetResponse, Result, SubmitResponse,
};
use std::path::Path;

/// Everything a chat session asks of the server
#[async_trait]
pub trait Backend: Send + Sync {
    /// Probe connectivity
    async fn health(&self) -> Result<HealthStatus>;

    /// Open a streamed response for a user message
    async fn chat_stream(&self, message: &str) -> Result<ChatEventStream>;

    /// Store a contact submission
    async fn submit_contact(&self, form: &ContactForm) -> Result<SubmitResponse>;

    /// Fetch the last stored contact submission
    async fn last_lead(&self) -> Result<LeadResponse>;

    /// Extract text from a PDF
    async fn process_pdf(&self, path: &Path) -> Result<PdfResponse>;

    /// Reset the server-side conversation
    async fn reset(&self) -> Result<ResetResponse>;
}

/// Backend that talks HTTP to a running server
pub struct HttpBackend {
    client: ApiClient,
}

impl HttpBackend {
    pub fn new(endpoints: Endpoints) -> Self {
        Self {
            client: ApiClient::new(endpoints),
        }
    }

    pub fn endpoints(&self) -> &Endpoints {
        self.client.endpoints()
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn health(&self) -> Result<HealthStatus> {
        self.client.health().await
    }

    async fn chat_stream(&self, message: &str) -> Result<ChatEventStream> {
        self.client.chat_stream(message).await
    }

    async fn submit_contact(&self, form: &ContactForm) -> Result<SubmitResponse> {
        self.client.submit_contact(form).await
    }

    async fn last_lead(&self) -> Result<LeadResponse> {
        self.client.last_lead().await
    }

    async fn process_pdf(&self, path: &Path) -> Result<PdfResponse> {
        self.client.process_pdf(path).await
    }

    async fn reset(&self) -> Result<ResetResponse> {
        self.client.reset().await
    }
}
