//! chatdesk-core: chat session state for the chatdesk client
//!
//! This crate holds the two state machines of the widget (the streaming
//! response assembler and the sequential contact-form collector) and the
//! session that drives them against a backend.

pub mod agents;
pub mod assembler;
pub mod backend;
pub mod config;
pub mod conversation;
pub mod error;
pub mod events;
pub mod extract;
pub mod form;
pub mod session;
pub mod store;

pub use agents::{AgentId, AgentProfile, AgentTone};
pub use assembler::{AssemblerState, Failure, Step, StreamAssembler};
pub use backend::{Backend, HttpBackend};
pub use config::{Messages, SessionConfig, Timeouts};
pub use conversation::{ConnectionStatus, Controls, Conversation};
pub use error::{Error, Result};
pub use events::SessionEvent;
pub use extract::extract_contact;
pub use form::{ContactDraft, FailurePolicy, FieldKind, FieldOutcome, FieldSpec, FormCollector, FormConfig, FormState};
pub use session::ChatSession;
pub use store::{CONVERSATION_COMPLETED, FlagStore, MemoryFlagStore};
