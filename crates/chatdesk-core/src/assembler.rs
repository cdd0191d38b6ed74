//! Assembles one streamed bot response from chat events

use chatdesk_api::ChatEvent;

use crate::agents::AgentId;

/// Lifecycle of a streamed response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AssemblerState {
    #[default]
    Idle,
    Streaming,
    Finished,
    Failed,
}

/// Why a response failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Failure {
    /// The server sent an error payload
    Server(String),
    /// The connection failed or closed early
    Connection(String),
    /// The request did not complete before its deadline
    Timeout,
    /// Any other request error, shown with its own message
    Other(String),
}

impl Failure {
    /// Classify an error raised while opening the stream
    pub fn from_api(error: &chatdesk_api::Error) -> Self {
        if error.is_timeout() {
            Failure::Timeout
        } else if error.is_connection_error() {
            Failure::Connection(error.to_string())
        } else {
            Failure::Other(error.to_string())
        }
    }
}

/// What a single event changed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Full text so far
    Text(String),
    /// Server asked for a contact field
    Field(String),
    /// Responding agent identified
    Agent(AgentId),
    /// Response closed normally
    Finished,
    /// Response closed with a failure; partial text is kept
    Failed(Failure),
    /// Event arrived after the response closed
    Ignored,
}

/// Accumulates tokens for the bot bubble currently streaming
#[derive(Debug, Clone, Default)]
pub struct StreamAssembler {
    buffer: String,
    state: AssemblerState,
    agent: Option<AgentId>,
    tokens: usize,
}

impl StreamAssembler {
    /// Create an idle assembler
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset for a new response
    pub fn start(&mut self) {
        self.buffer.clear();
        self.agent = None;
        self.tokens = 0;
        self.state = AssemblerState::Streaming;
    }

    /// Current lifecycle state
    pub fn state(&self) -> AssemblerState {
        self.state
    }

    /// Whether a response is open and accepting events
    pub fn is_streaming(&self) -> bool {
        self.state == AssemblerState::Streaming
    }

    /// Concatenation of every token received so far
    pub fn text(&self) -> &str {
        &self.buffer
    }

    /// Agent named by the last agent event of this response
    pub fn agent(&self) -> Option<&AgentId> {
        self.agent.as_ref()
    }

    /// Whether at least one token arrived
    pub fn has_tokens(&self) -> bool {
        self.tokens > 0
    }

    /// Apply one wire event
    pub fn apply(&mut self, event: &ChatEvent) -> Step {
        if !self.is_streaming() {
            return Step::Ignored;
        }

        match event {
            ChatEvent::Token { text } => {
                self.buffer.push_str(text);
                self.tokens += 1;
                Step::Text(self.buffer.clone())
            }
            ChatEvent::Field { field } => Step::Field(field.clone()),
            ChatEvent::Agent { agent } => {
                let id = AgentId::new(agent.as_str());
                self.agent = Some(id.clone());
                Step::Agent(id)
            }
            ChatEvent::Done => {
                self.state = AssemblerState::Finished;
                Step::Finished
            }
            ChatEvent::Error { message } => self.fail(Failure::Server(message.clone())),
            ChatEvent::Disconnected { reason } => self.fail(Failure::Connection(reason.clone())),
        }
    }

    /// The stream closed without a terminal event
    pub fn end_of_stream(&mut self) -> Step {
        if !self.is_streaming() {
            return Step::Ignored;
        }
        if self.has_tokens() {
            self.state = AssemblerState::Finished;
            Step::Finished
        } else {
            self.fail(Failure::Connection("stream closed before any response".to_string()))
        }
    }

    /// Abort with the given failure; partial text is kept
    pub fn fail(&mut self, failure: Failure) -> Step {
        if !self.is_streaming() {
            return Step::Ignored;
        }
        self.state = AssemblerState::Failed;
        Step::Failed(failure)
    }
}
