//! Chat session: routes user input to the form collector or the server

use chatdesk_api::{ContactForm, Lead};
use futures::StreamExt;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::time::{Instant, timeout, timeout_at};

use crate::{
    agents::AgentProfile,
    assembler::{Failure, Step, StreamAssembler},
    backend::Backend,
    config::SessionConfig,
    conversation::{ConnectionStatus, Controls, Conversation},
    error::{Error, Result},
    events::SessionEvent,
    extract::extract_contact,
    form::{FieldOutcome, FieldSpec, FormCollector},
    store::{CONVERSATION_COMPLETED, FlagStore},
};

/// One conversation with the widget server
pub struct ChatSession {
    config: SessionConfig,
    backend: Arc<dyn Backend>,
    store: Arc<dyn FlagStore>,
    conversation: Conversation,
    form: FormCollector,
    assembler: StreamAssembler,
    event_tx: broadcast::Sender<SessionEvent>,
    /// When the delayed connectivity probe is due
    probe_at: Option<Instant>,
}

impl ChatSession {
    /// Create a session; the completed flag is restored from the store
    pub fn new(config: SessionConfig, backend: Arc<dyn Backend>, store: Arc<dyn FlagStore>) -> Self {
        let (event_tx, _) = broadcast::channel(256);
        let completed = store.get_flag(CONVERSATION_COMPLETED).unwrap_or_else(|e| {
            tracing::warn!("Failed to read session flags: {}", e);
            false
        });
        if completed {
            tracing::info!("Resuming a completed conversation");
        }

        Self {
            form: FormCollector::new(config.form.clone()),
            config,
            backend,
            store,
            conversation: Conversation::new(completed),
            assembler: StreamAssembler::new(),
            event_tx,
            probe_at: None,
        }
    }

    /// Subscribe to session events
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.event_tx.subscribe()
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn form(&self) -> &FormCollector {
        &self.form
    }

    pub fn assembler(&self) -> &StreamAssembler {
        &self.assembler
    }

    /// Profile of the agent that answered last
    pub fn current_profile(&self) -> Option<&'static AgentProfile> {
        self.conversation.current_agent.as_ref().and_then(|a| a.profile())
    }

    /// Whether a response or a submission is in flight
    pub fn is_busy(&self) -> bool {
        self.assembler.is_streaming() || self.form.is_submitting()
    }

    /// Deadline of the pending connectivity probe
    pub fn probe_due(&self) -> Option<Instant> {
        self.probe_at
    }

    fn emit(&self, event: SessionEvent) {
        let _ = self.event_tx.send(event);
    }

    fn set_controls(&mut self, controls: Controls) {
        if self.conversation.controls != controls {
            self.conversation.controls = controls;
            self.emit(SessionEvent::ControlsChanged { controls });
        }
    }

    fn set_connection(&mut self, status: ConnectionStatus) -> bool {
        if self.conversation.connection == status {
            return false;
        }
        self.conversation.connection = status.clone();
        self.emit(SessionEvent::ConnectionChanged { status });
        true
    }

    /// Process one user message.
    ///
    /// A completed conversation gets the closing reply, an active form takes
    /// the message as a field value, a message carrying full contact details
    /// is submitted directly, and anything else is streamed from the server.
    pub async fn send_message(&mut self, text: &str) -> Result<()> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(());
        }
        if self.is_busy() {
            return Err(Error::Busy);
        }

        self.conversation.message_count += 1;
        tracing::debug!("user message #{}", self.conversation.message_count);

        if self.conversation.completed {
            let closing = self.config.messages.closing.clone();
            self.emit(SessionEvent::BotMessage { text: closing });
            return Ok(());
        }

        if self.form.is_collecting() {
            return self.collect_field(text).await;
        }

        if let Some(form) = extract_contact(text) {
            tracing::info!("Contact details found in message, submitting directly");
            self.form.submit_direct(&form);
            self.submit_form(form).await;
            return Ok(());
        }

        self.stream_response(text).await;
        Ok(())
    }

    async fn collect_field(&mut self, text: &str) -> Result<()> {
        match self.form.submit_value(text) {
            Some(FieldOutcome::Invalid { spec, reason }) => {
                self.emit(SessionEvent::FormError { message: reason });
                self.emit(SessionEvent::FieldRequested { spec });
            }
            Some(FieldOutcome::Next(spec)) => {
                self.emit(SessionEvent::BotMessage {
                    text: spec.prompt.to_string(),
                });
                self.emit(SessionEvent::FieldRequested { spec });
            }
            Some(FieldOutcome::Complete(form)) => {
                self.emit(SessionEvent::FormClosed);
                self.submit_form(form).await;
            }
            None => {}
        }
        Ok(())
    }

    async fn stream_response(&mut self, text: &str) {
        self.assembler.start();
        self.set_controls(Controls::busy());
        self.emit(SessionEvent::ResponseStarted);

        // One deadline covers the whole request
        let limit = self.config.timeouts.connection();
        let deadline = Instant::now() + limit;
        let opened = timeout_at(deadline, self.backend.chat_stream(text))
            .await
            .unwrap_or(Err(chatdesk_api::Error::Timeout));

        let mut stream = match opened {
            Ok(stream) => stream,
            Err(e) => {
                tracing::warn!("Failed to open chat stream: {}", e);
                let step = self.assembler.fail(Failure::from_api(&e));
                self.on_step(step);
                return;
            }
        };

        loop {
            let step = match timeout_at(deadline, stream.next()).await {
                Ok(Some(event)) => self.assembler.apply(&event),
                Ok(None) => self.assembler.end_of_stream(),
                Err(_) => {
                    tracing::warn!("Response not complete within {:?}, aborting", limit);
                    self.assembler.fail(Failure::Timeout)
                }
            };
            if self.on_step(step) {
                break;
            }
        }
        // Dropping the stream closes the event source
    }

    /// Apply an assembler step; returns true once the response is closed
    fn on_step(&mut self, step: Step) -> bool {
        match step {
            Step::Text(text) => {
                self.emit(SessionEvent::ResponseUpdated { text });
                false
            }
            Step::Field(field) => {
                if let Some(spec) = self.form.activate(&field) {
                    self.emit(SessionEvent::FieldRequested { spec });
                }
                false
            }
            Step::Agent(agent) => {
                if self.conversation.current_agent.as_ref() != Some(&agent) {
                    tracing::debug!("agent changed to {}", agent);
                    self.conversation.current_agent = Some(agent.clone());
                    self.emit(SessionEvent::AgentChanged { agent });
                }
                false
            }
            Step::Finished => {
                self.set_connection(ConnectionStatus::Connected);
                self.emit(SessionEvent::ResponseFinished {
                    text: self.assembler.text().to_string(),
                    agent: self.conversation.current_agent.clone(),
                });
                self.set_controls(Controls::ready());
                true
            }
            Step::Failed(failure) => {
                self.fail_response(failure);
                true
            }
            Step::Ignored => false,
        }
    }

    fn fail_response(&mut self, failure: Failure) {
        let messages = &self.config.messages;
        let message = match &failure {
            Failure::Server(detail) => format!("{} {}", messages.server_error, detail),
            Failure::Connection(_) => messages.connection_error.clone(),
            Failure::Timeout => messages.timeout_error.clone(),
            Failure::Other(detail) => format!("Error: {}", detail),
        };
        tracing::warn!("Response failed: {:?}", failure);

        if let Failure::Connection(reason) = failure {
            self.set_connection(ConnectionStatus::Disconnected { reason });
        }

        self.emit(SessionEvent::ResponseFailed {
            partial: self.assembler.text().to_string(),
            message,
        });
        self.set_controls(Controls::ready());
        self.probe_at = Some(Instant::now() + self.config.timeouts.reconnect());
    }

    /// Begin collecting contact details locally.
    ///
    /// A completed conversation gets the closing reply instead of a form.
    pub fn start_form(&mut self) -> Option<FieldSpec> {
        if self.is_busy() {
            return None;
        }
        if self.conversation.completed {
            let closing = self.config.messages.closing.clone();
            self.emit(SessionEvent::BotMessage { text: closing });
            return None;
        }
        let spec = self.form.start()?;
        self.emit(SessionEvent::BotMessage {
            text: spec.prompt.to_string(),
        });
        self.emit(SessionEvent::FieldRequested { spec: spec.clone() });
        Some(spec)
    }

    /// Abandon the form being collected
    pub fn cancel_form(&mut self) {
        if self.form.is_collecting() {
            self.form.reset();
            self.emit(SessionEvent::FormClosed);
        }
    }

    /// Post a complete form and report the outcome through events
    async fn submit_form(&mut self, form: ContactForm) {
        self.set_controls(Controls::busy());
        tracing::info!("Submitting contact form for {}", form.email);

        let failure = match self.backend.submit_contact(&form).await {
            Ok(response) if response.success => None,
            Ok(response) => Some(
                response
                    .error
                    .unwrap_or_else(|| self.config.messages.form_error.clone()),
            ),
            Err(e) => {
                tracing::warn!("Contact submission failed: {}", e);
                Some(self.config.messages.form_error.clone())
            }
        };

        match failure {
            None => {
                self.form.finish_submission(true);
                self.mark_completed();
                let text = self.config.messages.form_success.clone();
                self.emit(SessionEvent::BotMessage { text });
            }
            Some(message) => {
                let retained = self.form.finish_submission(false);
                self.emit(SessionEvent::FormError { message });
                if retained {
                    self.emit(SessionEvent::SystemMessage {
                        text: "Your details were kept. Use /retry to submit them again."
                            .to_string(),
                    });
                }
            }
        }
        self.set_controls(Controls::ready());
    }

    /// Resubmit a draft kept after a failed submission.
    /// Returns false when there is nothing to retry.
    pub async fn retry_submission(&mut self) -> Result<bool> {
        if self.is_busy() {
            return Err(Error::Busy);
        }
        match self.form.retry() {
            Some(form) => {
                self.submit_form(form).await;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn mark_completed(&mut self) {
        self.conversation.completed = true;
        if let Err(e) = self.store.set_flag(CONVERSATION_COMPLETED, true) {
            tracing::warn!("Failed to persist completed flag: {}", e);
        }
    }

    /// Probe the health endpoint and update the connection status
    pub async fn check_connection(&mut self) -> ConnectionStatus {
        let status = match timeout(self.config.timeouts.connection(), self.backend.health()).await {
            Ok(Ok(health)) if health.lm_studio_connected => ConnectionStatus::Connected,
            Ok(Ok(health)) => ConnectionStatus::Degraded {
                detail: health.diagnostics.map(|d| d.summary()),
            },
            Ok(Err(e)) => ConnectionStatus::Disconnected {
                reason: e.to_string(),
            },
            Err(_) => ConnectionStatus::Disconnected {
                reason: "health check timed out".to_string(),
            },
        };
        tracing::debug!("connection status: {:?}", status);

        if self.set_connection(status.clone()) {
            if let ConnectionStatus::Degraded { detail } = &status {
                let mut text = self.config.messages.model_unavailable.clone();
                if let Some(detail) = detail {
                    text.push('\n');
                    text.push_str(detail);
                }
                self.emit(SessionEvent::SystemMessage { text });
            }
        }
        status
    }

    /// Run the delayed probe if it is due
    pub async fn poll_probe(&mut self) -> Option<ConnectionStatus> {
        let due = self.probe_at?;
        if Instant::now() < due || self.is_busy() {
            return None;
        }
        self.probe_at = None;
        Some(self.check_connection().await)
    }

    /// Fetch the last stored lead, if any
    pub async fn last_lead(&self) -> Result<Option<Lead>> {
        let response = self.backend.last_lead().await?;
        if response.success {
            Ok(response.lead)
        } else if let Some(error) = response.error {
            Err(Error::Other(error))
        } else {
            Ok(None)
        }
    }

    /// Upload a PDF and return its extracted text
    pub async fn upload_pdf(&mut self, path: &Path) -> Result<String> {
        if self.is_busy() {
            return Err(Error::Busy);
        }
        self.set_controls(Controls::busy());
        let result = self.backend.process_pdf(path).await;
        self.set_controls(Controls::ready());

        let response = result?;
        if response.success {
            Ok(response.text.unwrap_or_default())
        } else {
            Err(Error::Other(
                response
                    .error
                    .unwrap_or_else(|| "The document could not be processed".to_string()),
            ))
        }
    }

    /// Reset the conversation locally and on the server
    pub async fn reset(&mut self) -> Result<()> {
        if self.is_busy() {
            return Err(Error::Busy);
        }

        self.form.reset();
        self.conversation.reset();
        self.probe_at = None;
        if let Err(e) = self.store.remove_flag(CONVERSATION_COMPLETED) {
            tracing::warn!("Failed to clear session flags: {}", e);
        }
        self.emit(SessionEvent::FormClosed);
        self.emit(SessionEvent::ControlsChanged {
            controls: Controls::ready(),
        });

        let response = self.backend.reset().await?;
        if let Some(message) = response.message.filter(|_| response.success) {
            tracing::debug!("server reset: {}", message);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        agents::AgentId,
        form::{FailurePolicy, FieldKind, FormConfig},
        store::MemoryFlagStore,
    };
    use async_trait::async_trait;
    use chatdesk_api::{
        ChatEvent, ChatEventStream, Diagnostics, HealthStatus, LeadResponse, PdfResponse,
        ResetResponse, SubmitResponse,
    };
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Backend with canned chat responses, one event list per chat request
    struct MockBackend {
        responses: Mutex<Vec<Vec<ChatEvent>>>,
        stall: bool,
        /// Send four tokens this far apart, then done
        token_every: Option<Duration>,
        open_error: Mutex<Option<chatdesk_api::Error>>,
        submit_ok: bool,
        healthy: bool,
        chat_calls: AtomicUsize,
        submitted: Mutex<Vec<ContactForm>>,
    }

    impl MockBackend {
        fn new(responses: Vec<Vec<ChatEvent>>) -> Self {
            Self {
                responses: Mutex::new(responses),
                stall: false,
                token_every: None,
                open_error: Mutex::new(None),
                submit_ok: true,
                healthy: true,
                chat_calls: AtomicUsize::new(0),
                submitted: Mutex::new(vec![]),
            }
        }

        fn chat_calls(&self) -> usize {
            self.chat_calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Backend for MockBackend {
        async fn health(&self) -> chatdesk_api::Result<HealthStatus> {
            Ok(HealthStatus {
                lm_studio_connected: self.healthy,
                status: Some("ok".into()),
                diagnostics: (!self.healthy).then(|| Diagnostics {
                    lm_studio_url: Some("http://localhost:1234".into()),
                    timeout: None,
                }),
            })
        }

        async fn chat_stream(&self, _message: &str) -> chatdesk_api::Result<ChatEventStream> {
            self.chat_calls.fetch_add(1, Ordering::SeqCst);
            if let Some(e) = self.open_error.lock().take() {
                return Err(e);
            }
            if let Some(every) = self.token_every {
                let stream: ChatEventStream = Box::pin(async_stream::stream! {
                    for i in 0..4 {
                        tokio::time::sleep(every).await;
                        yield ChatEvent::token(format!("t{} ", i));
                    }
                    yield ChatEvent::Done;
                });
                return Ok(stream);
            }
            if self.stall {
                let stream: ChatEventStream = Box::pin(async_stream::stream! {
                    futures::future::pending::<()>().await;
                    yield ChatEvent::Done;
                });
                return Ok(stream);
            }

            let events = {
                let mut responses = self.responses.lock();
                if responses.is_empty() {
                    vec![ChatEvent::token("ok"), ChatEvent::Done]
                } else {
                    responses.remove(0)
                }
            };
            let stream: ChatEventStream = Box::pin(async_stream::stream! {
                for event in events {
                    yield event;
                }
            });
            Ok(stream)
        }

        async fn submit_contact(&self, form: &ContactForm) -> chatdesk_api::Result<SubmitResponse> {
            self.submitted.lock().push(form.clone());
            Ok(SubmitResponse {
                success: self.submit_ok,
                message: None,
                error: (!self.submit_ok).then(|| "Invalid data".to_string()),
            })
        }

        async fn last_lead(&self) -> chatdesk_api::Result<LeadResponse> {
            Ok(LeadResponse {
                success: true,
                lead: Some(Lead {
                    name: "Ana".into(),
                    ..Default::default()
                }),
                error: None,
            })
        }

        async fn process_pdf(&self, _path: &Path) -> chatdesk_api::Result<PdfResponse> {
            Ok(PdfResponse {
                success: true,
                text: Some("Extracted text".into()),
                error: None,
            })
        }

        async fn reset(&self) -> chatdesk_api::Result<ResetResponse> {
            Ok(ResetResponse {
                success: true,
                message: Some("reset".into()),
            })
        }
    }

    fn make_session(backend: Arc<MockBackend>) -> (ChatSession, Arc<MemoryFlagStore>) {
        let store = Arc::new(MemoryFlagStore::new());
        let session = ChatSession::new(SessionConfig::default(), backend, store.clone());
        (session, store)
    }

    fn drain(rx: &mut broadcast::Receiver<SessionEvent>) -> Vec<SessionEvent> {
        let mut events = vec![];
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    #[tokio::test]
    async fn test_streamed_text_is_concatenated() {
        let backend = Arc::new(MockBackend::new(vec![vec![
            ChatEvent::token("Hello"),
            ChatEvent::token(", "),
            ChatEvent::token("world"),
            ChatEvent::agent("SalesAgent"),
            ChatEvent::Done,
        ]]));
        let (mut session, _) = make_session(backend);
        let mut rx = session.subscribe();

        session.send_message("hi").await.unwrap();

        let updates: Vec<String> = drain(&mut rx)
            .into_iter()
            .filter_map(|e| match e {
                SessionEvent::ResponseUpdated { text } => Some(text),
                _ => None,
            })
            .collect();
        assert_eq!(updates, vec!["Hello", "Hello, ", "Hello, world"]);
        assert_eq!(session.assembler().text(), "Hello, world");
        assert_eq!(
            session.conversation().current_agent,
            Some(AgentId::new("SalesAgent"))
        );
        assert_eq!(session.conversation().message_count, 1);
    }

    #[tokio::test]
    async fn test_done_restores_controls_after_previous_error() {
        let backend = Arc::new(MockBackend::new(vec![
            vec![ChatEvent::token("Par"), ChatEvent::error("model crashed")],
            vec![ChatEvent::token("Fine"), ChatEvent::Done],
        ]));
        let (mut session, _) = make_session(backend);
        let mut rx = session.subscribe();

        session.send_message("first").await.unwrap();
        let events = drain(&mut rx);
        assert!(events.iter().any(|e| matches!(
            e,
            SessionEvent::ResponseFailed { partial, message }
                if partial == "Par" && message.contains("model crashed")
        )));
        assert_eq!(session.conversation().controls, Controls::ready());
        assert!(session.probe_due().is_some());

        session.send_message("second").await.unwrap();
        let events = drain(&mut rx);
        assert!(events.contains(&SessionEvent::ControlsChanged {
            controls: Controls::ready()
        }));
        assert!(!session.is_busy());
        assert!(session.conversation().controls.input_enabled);
        assert!(!session.conversation().controls.loading);
    }

    #[tokio::test]
    async fn test_field_event_starts_local_collection() {
        let backend = Arc::new(MockBackend::new(vec![vec![
            ChatEvent::token("What is your name?"),
            ChatEvent::field("name"),
            ChatEvent::agent("DataCollectionAgent"),
            ChatEvent::Done,
        ]]));
        let (mut session, store) = make_session(backend.clone());
        let mut rx = session.subscribe();

        session.send_message("I want to leave my details").await.unwrap();
        assert!(session.form().is_collecting());
        assert!(drain(&mut rx).iter().any(|e| matches!(
            e,
            SessionEvent::FieldRequested { spec } if spec.kind == FieldKind::Name
        )));

        for value in ["Ana", "ana@example.com", "612345678", "Acme"] {
            session.send_message(value).await.unwrap();
            assert!(backend.submitted.lock().is_empty());
        }
        session.send_message("Pricing").await.unwrap();

        assert_eq!(backend.chat_calls(), 1);
        let submitted = backend.submitted.lock().clone();
        assert_eq!(submitted.len(), 1);
        assert_eq!(submitted[0].name, "Ana");
        assert_eq!(submitted[0].interest, "Pricing");

        assert!(session.form().draft().is_empty());
        assert!(session.conversation().completed);
        assert!(store.get_flag(CONVERSATION_COMPLETED).unwrap());
        let success = session.config().messages.form_success.clone();
        assert!(drain(&mut rx).contains(&SessionEvent::BotMessage { text: success }));
    }

    #[tokio::test]
    async fn test_invalid_email_reprompts_same_field() {
        let backend = Arc::new(MockBackend::new(vec![]));
        let (mut session, _) = make_session(backend.clone());
        session.start_form();
        session.send_message("Ana").await.unwrap();
        let mut rx = session.subscribe();

        session.send_message("ana-at-example").await.unwrap();

        let events = drain(&mut rx);
        assert!(matches!(events[0], SessionEvent::FormError { .. }));
        assert!(matches!(
            &events[1],
            SessionEvent::FieldRequested { spec } if spec.kind == FieldKind::Email
        ));
        assert_eq!(session.form().current_field().unwrap().kind, FieldKind::Email);
        assert_eq!(backend.chat_calls(), 0);
    }

    #[tokio::test]
    async fn test_invalid_phone_reprompts_same_field() {
        let backend = Arc::new(MockBackend::new(vec![]));
        let (mut session, _) = make_session(backend);
        session.start_form();
        session.send_message("Ana").await.unwrap();
        session.send_message("ana@example.com").await.unwrap();
        session.send_message("call me").await.unwrap();
        assert_eq!(session.form().current_field().unwrap().kind, FieldKind::Phone);
    }

    #[tokio::test]
    async fn test_completed_conversation_short_circuits() {
        let backend = Arc::new(MockBackend::new(vec![]));
        let store = Arc::new(MemoryFlagStore::new());
        store.set_flag(CONVERSATION_COMPLETED, true).unwrap();
        let mut session = ChatSession::new(SessionConfig::default(), backend.clone(), store);
        let mut rx = session.subscribe();

        session.send_message("one more question").await.unwrap();

        assert_eq!(backend.chat_calls(), 0);
        let closing = session.config().messages.closing.clone();
        assert_eq!(drain(&mut rx), vec![SessionEvent::BotMessage { text: closing }]);
    }

    #[tokio::test]
    async fn test_contact_details_in_one_message_are_submitted_directly() {
        let backend = Arc::new(MockBackend::new(vec![]));
        let (mut session, store) = make_session(backend.clone());

        session
            .send_message("me llamo Juan, mi email es juan@x.com, mi teléfono 612345678")
            .await
            .unwrap();

        assert_eq!(backend.chat_calls(), 0);
        let submitted = backend.submitted.lock().clone();
        assert_eq!(submitted.len(), 1);
        assert_eq!(submitted[0].name, "Juan");
        assert_eq!(submitted[0].email, "juan@x.com");
        assert_eq!(submitted[0].phone, "612345678");
        assert!(store.get_flag(CONVERSATION_COMPLETED).unwrap());
    }

    #[tokio::test]
    async fn test_failed_submission_clears_draft() {
        let mut mock = MockBackend::new(vec![]);
        mock.submit_ok = false;
        let backend = Arc::new(mock);
        let (mut session, store) = make_session(backend);
        let mut rx = session.subscribe();

        session
            .send_message("me llamo Juan, mi email es juan@x.com, mi teléfono 612345678")
            .await
            .unwrap();

        assert!(drain(&mut rx).contains(&SessionEvent::FormError {
            message: "Invalid data".into()
        }));
        assert!(session.form().draft().is_empty());
        assert!(!session.conversation().completed);
        assert!(!store.get_flag(CONVERSATION_COMPLETED).unwrap());
        assert!(!session.retry_submission().await.unwrap());
    }

    #[tokio::test]
    async fn test_retain_policy_resubmits_on_retry() {
        let mut mock = MockBackend::new(vec![]);
        mock.submit_ok = false;
        let backend = Arc::new(mock);
        let config = SessionConfig {
            form: FormConfig {
                on_failure: FailurePolicy::Retain,
                ..Default::default()
            },
            ..Default::default()
        };
        let mut session =
            ChatSession::new(config, backend.clone(), Arc::new(MemoryFlagStore::new()));

        session
            .send_message("me llamo Juan, mi email es juan@x.com, mi teléfono 612345678")
            .await
            .unwrap();
        assert!(!session.form().draft().is_empty());

        assert!(session.retry_submission().await.unwrap());
        assert_eq!(backend.submitted.lock().len(), 2);
    }

    #[tokio::test]
    async fn test_stream_end_without_done() {
        let backend = Arc::new(MockBackend::new(vec![
            vec![ChatEvent::token("Complete answer")],
            vec![],
        ]));
        let (mut session, _) = make_session(backend);
        let mut rx = session.subscribe();

        session.send_message("first").await.unwrap();
        assert!(drain(&mut rx).iter().any(|e| matches!(
            e,
            SessionEvent::ResponseFinished { text, .. } if text == "Complete answer"
        )));

        session.send_message("second").await.unwrap();
        let connection_error = session.config().messages.connection_error.clone();
        assert!(drain(&mut rx).iter().any(|e| matches!(
            e,
            SessionEvent::ResponseFailed { message, .. } if *message == connection_error
        )));
        assert!(!session.conversation().connection.is_connected());
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_then_single_probe() {
        let mut mock = MockBackend::new(vec![]);
        mock.stall = true;
        mock.healthy = false;
        let (mut session, _) = make_session(Arc::new(mock));
        let mut rx = session.subscribe();

        session.send_message("hello?").await.unwrap();

        let timeout_error = session.config().messages.timeout_error.clone();
        assert!(drain(&mut rx).iter().any(|e| matches!(
            e,
            SessionEvent::ResponseFailed { message, .. } if *message == timeout_error
        )));
        assert_eq!(session.conversation().controls, Controls::ready());

        assert!(session.poll_probe().await.is_none());
        tokio::time::advance(Duration::from_secs(5)).await;

        let status = session.poll_probe().await.unwrap();
        assert!(matches!(status, ConnectionStatus::Degraded { detail: Some(_) }));
        assert!(drain(&mut rx).iter().any(|e| matches!(
            e,
            SessionEvent::SystemMessage { text } if text.contains("http://localhost:1234")
        )));
        assert!(session.poll_probe().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_covers_whole_request() {
        let mut mock = MockBackend::new(vec![]);
        mock.token_every = Some(Duration::from_secs(20));
        let (mut session, _) = make_session(Arc::new(mock));
        let mut rx = session.subscribe();

        let started = Instant::now();
        session.send_message("tell me everything").await.unwrap();

        assert_eq!(started.elapsed(), Duration::from_secs(30));
        let timeout_error = session.config().messages.timeout_error.clone();
        let events = drain(&mut rx);
        assert!(events.iter().any(|e| matches!(
            e,
            SessionEvent::ResponseFailed { partial, message }
                if partial == "t0 " && *message == timeout_error
        )));
        assert!(!events.iter().any(|e| matches!(e, SessionEvent::ResponseFinished { .. })));
        assert_eq!(session.conversation().controls, Controls::ready());
        assert!(session.probe_due().is_some());
    }

    #[tokio::test]
    async fn test_open_error_that_is_not_a_connection_failure() {
        let mock = MockBackend::new(vec![]);
        *mock.open_error.lock() = Some(chatdesk_api::Error::InvalidUrl("bad base url".into()));
        let (mut session, _) = make_session(Arc::new(mock));
        let mut rx = session.subscribe();

        session.send_message("hi").await.unwrap();

        assert!(drain(&mut rx).iter().any(|e| matches!(
            e,
            SessionEvent::ResponseFailed { message, .. }
                if message == "Error: Invalid URL: bad base url"
        )));
        assert_eq!(session.conversation().connection, ConnectionStatus::Unknown);
        assert_eq!(session.conversation().controls, Controls::ready());
    }

    #[tokio::test]
    async fn test_form_refused_after_completion() {
        let backend = Arc::new(MockBackend::new(vec![]));
        let store = Arc::new(MemoryFlagStore::new());
        store.set_flag(CONVERSATION_COMPLETED, true).unwrap();
        let mut session = ChatSession::new(SessionConfig::default(), backend.clone(), store);
        let mut rx = session.subscribe();

        assert!(session.start_form().is_none());
        assert!(!session.form().is_collecting());
        assert!(session.form().current_field().is_none());

        let closing = session.config().messages.closing.clone();
        assert_eq!(drain(&mut rx), vec![SessionEvent::BotMessage { text: closing }]);
        assert!(backend.submitted.lock().is_empty());
    }

    #[tokio::test]
    async fn test_send_while_streaming_is_busy() {
        let backend = Arc::new(MockBackend::new(vec![]));
        let (mut session, _) = make_session(backend);
        session.assembler.start();

        assert!(matches!(session.send_message("hi").await, Err(Error::Busy)));
    }

    #[tokio::test]
    async fn test_reset_clears_completed_flag() {
        let backend = Arc::new(MockBackend::new(vec![]));
        let (mut session, store) = make_session(backend);
        session
            .send_message("me llamo Juan, mi email es juan@x.com, mi teléfono 612345678")
            .await
            .unwrap();
        assert!(session.conversation().completed);

        session.reset().await.unwrap();
        assert!(!session.conversation().completed);
        assert!(!store.get_flag(CONVERSATION_COMPLETED).unwrap());
        assert_eq!(session.conversation().message_count, 0);
    }

    #[tokio::test]
    async fn test_upload_and_last_lead() {
        let backend = Arc::new(MockBackend::new(vec![]));
        let (mut session, _) = make_session(backend);

        let text = session.upload_pdf(Path::new("brochure.pdf")).await.unwrap();
        assert_eq!(text, "Extracted text");
        assert_eq!(session.conversation().controls, Controls::ready());

        let lead = session.last_lead().await.unwrap().unwrap();
        assert_eq!(lead.name, "Ana");
    }
}
