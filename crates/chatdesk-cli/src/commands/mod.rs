//! Slash commands for interactive mode

mod agent;
mod status;
mod upload;

pub use agent::{AgentCommand, InfoCommand};
pub use status::StatusCommand;
pub use upload::UploadCommand;

use chatdesk_core::{AgentProfile, ChatSession};
use std::path::PathBuf;

/// Result of parsing a slash command
#[derive(Debug)]
pub enum CommandResult {
    /// Show a message to the user (not sent to the server)
    Message(String),
    /// Clear the visible transcript
    Clear,
    /// Reset the conversation locally and on the server
    Reset,
    /// Send this agent's selection prompt
    SelectAgent(&'static AgentProfile),
    /// Open agent selector (TUI only)
    OpenAgentSelector,
    /// Show the last stored lead
    ShowLead,
    /// Upload a PDF
    Upload(PathBuf),
    /// Probe the health endpoint
    CheckStatus,
    /// Start collecting contact details
    StartForm,
    /// Resubmit a retained contact draft
    Retry,
    /// Exit the application
    Exit,
    /// Unknown command
    Unknown(String),
}

/// Parse and execute a slash command
pub fn execute_command(input: &str, session: &ChatSession) -> Option<CommandResult> {
    let input = input.trim();

    let rest = input.strip_prefix('/')?;
    let parts: Vec<&str> = rest.splitn(2, ' ').collect();
    let command = parts[0].to_lowercase();
    let args = parts.get(1).map(|s| s.trim()).unwrap_or("");

    Some(match command.as_str() {
        "help" | "h" | "?" => CommandResult::Message(help_message()),

        "clear" | "c" => CommandResult::Clear,

        "reset" | "r" => CommandResult::Reset,

        "quit" | "exit" | "q" => CommandResult::Exit,

        "agent" | "a" => AgentCommand::execute(args),

        "info" | "i" => InfoCommand::execute(session.conversation().current_agent.as_ref()),

        "lead" | "l" => CommandResult::ShowLead,

        "upload" | "u" => {
            if args.is_empty() {
                CommandResult::Message("Usage: /upload <path-to-pdf>".to_string())
            } else {
                CommandResult::Upload(PathBuf::from(args))
            }
        }

        "status" | "s" => CommandResult::CheckStatus,

        "form" | "f" => CommandResult::StartForm,

        "retry" => CommandResult::Retry,

        _ => CommandResult::Unknown(command),
    })
}

/// Long-running work started by a message or a command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Job {
    /// Send a user message
    Send(String),
    /// Initial health probe
    Connect,
    /// Delayed re-probe after a failed stream
    Probe,
    Reset,
    Lead,
    Upload(PathBuf),
    Status,
    Retry,
}

/// What a finished job wants shown
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Nothing,
    Notice(String),
    Error(String),
    /// The conversation was reset; the transcript should be cleared
    Reset(String),
}

impl Job {
    /// Status bar text while the job runs
    pub fn label(&self) -> &'static str {
        match self {
            Job::Send(_) => "Sending...",
            Job::Connect | Job::Probe | Job::Status => "Checking connection...",
            Job::Reset => "Resetting...",
            Job::Lead => "Fetching lead...",
            Job::Upload(_) => "Uploading...",
            Job::Retry => "Submitting...",
        }
    }
}

/// Run a job against the session
pub async fn run_job(session: &mut ChatSession, job: Job, session_id: &str) -> Outcome {
    match job {
        Job::Send(text) => match session.send_message(&text).await {
            Ok(()) => Outcome::Nothing,
            Err(e) => Outcome::Error(e.to_string()),
        },
        Job::Connect => {
            session.check_connection().await;
            Outcome::Nothing
        }
        Job::Probe => {
            session.poll_probe().await;
            Outcome::Nothing
        }
        Job::Reset => match session.reset().await {
            Ok(()) => Outcome::Reset("Conversation reset.".to_string()),
            Err(chatdesk_core::Error::Busy) => {
                Outcome::Error("Wait for the current response to finish.".to_string())
            }
            Err(e) => Outcome::Reset(format!(
                "Conversation reset locally; the server reset failed: {}",
                e
            )),
        },
        Job::Lead => match session.last_lead().await {
            Ok(Some(lead)) => Outcome::Notice(crate::utils::format_lead(&lead)),
            Ok(None) => Outcome::Notice("No leads stored yet.".to_string()),
            Err(e) => Outcome::Error(format!("Failed to fetch the last lead: {}", e)),
        },
        Job::Upload(path) => match UploadCommand::run(session, &path).await {
            Ok(text) => Outcome::Notice(text),
            Err(e) => Outcome::Error(e),
        },
        Job::Status => Outcome::Notice(StatusCommand::run(session, session_id).await),
        Job::Retry => match session.retry_submission().await {
            Ok(true) => Outcome::Nothing,
            Ok(false) => Outcome::Notice("There is no contact draft to resubmit.".to_string()),
            Err(e) => Outcome::Error(e.to_string()),
        },
    }
}

/// Start local form collection; the first prompt arrives as a session event
pub fn start_form(session: &mut ChatSession) -> Option<String> {
    if session.form().is_collecting() {
        return Some("The contact form is already open.".to_string());
    }
    match session.start_form() {
        Some(_) => None,
        // The closing reply arrives as a session event
        None if session.conversation().completed => None,
        None => Some("The contact form cannot be opened right now.".to_string()),
    }
}

pub fn help_message() -> String {
    r#"Available commands:
  /help, /h, /?        Show this help message
  /agent, /a [id]      Pick an agent (general, sales, technical, contact)
  /info, /i            Show what the current agent can do
  /form, /f            Leave your contact details step by step
  /retry               Resubmit contact details kept after a failed submission
  /upload, /u <path>   Upload a PDF and show its extracted text
  /lead, /l            Show the last stored lead
  /status, /s          Check the connection to the server
  /reset, /r           Start a new conversation
  /clear, /c           Clear the transcript
  /quit, /exit, /q     Exit chatdesk

Examples:
  /agent sales         Ask to talk to the sales agent
  /upload brochure.pdf Send a document to the server"#
        .to_string()
}
