//! chatdesk-api: client for the chat widget server
//!
//! This crate talks to the widget server over HTTP: the health probe, the
//! server-sent chat stream, contact submission, lead lookup and PDF upload.

pub mod client;
pub mod error;
pub mod stream;
pub mod types;

pub use client::{ApiClient, Endpoints};
pub use error::{Error, Result};
pub use stream::{ChatEvent, ChatEventStream};
pub use types::*;
