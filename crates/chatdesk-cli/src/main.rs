//! chatdesk - terminal client for the chat widget server

mod commands;
mod config;
mod session;
mod ui;
mod utils;

use chatdesk_core::{ChatSession, FlagStore, HttpBackend, MemoryFlagStore, SessionEvent};
use clap::Parser;
use std::io::{self, Write};
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::commands::{CommandResult, Job, Outcome, UploadCommand, execute_command};

/// chatdesk - talk to the virtual assistant from a terminal
#[derive(Parser, Debug)]
#[command(name = "chatdesk")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server base URL (default: http://localhost:5000)
    #[arg(short, long)]
    base_url: Option<String>,

    /// Send a single message and exit
    #[arg(short = 'c', long)]
    command: Option<String>,

    /// Resume a previous session by ID
    #[arg(short, long)]
    session: Option<String>,

    /// Color theme (dark, light)
    #[arg(long)]
    theme: Option<String>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Disable TUI mode (use simple stdin/stdout)
    #[arg(long)]
    no_tui: bool,

    /// Initialize config file
    #[arg(long)]
    init_config: bool,
}

/// Log to a file while the TUI owns the terminal, to stderr otherwise
fn init_tracing(to_file: bool) {
    use tracing_subscriber::EnvFilter;

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("chatdesk=debug"));

    if to_file {
        let dir = dirs::data_local_dir()
            .unwrap_or_else(|| std::path::PathBuf::from("."))
            .join("chatdesk");
        let file = std::fs::create_dir_all(&dir).and_then(|_| {
            std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(dir.join("chatdesk.log"))
        });
        match file {
            Ok(file) => {
                tracing_subscriber::fmt()
                    .with_env_filter(filter)
                    .with_ansi(false)
                    .with_writer(std::sync::Mutex::new(file))
                    .init();
                return;
            }
            Err(e) => eprintln!("Warning: cannot open log file: {}", e),
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

/// Open the flag store for this run; falls back to memory if the data dir is unusable
fn open_store(resume: Option<&str>) -> anyhow::Result<(Arc<dyn FlagStore>, String)> {
    if let Some(id) = resume {
        let store = session::FileFlagStore::load(id)
            .map_err(|e| anyhow::anyhow!("Error loading session: {}", e))?;
        return Ok((Arc::new(store), id.to_string()));
    }

    match session::FileFlagStore::new() {
        Ok(store) => {
            let id = store.id();
            tracing::debug!("session file: {}", store.path().display());
            Ok((Arc::new(store), id))
        }
        Err(e) => {
            tracing::warn!("Session flags will not be saved: {}", e);
            Ok((
                Arc::new(MemoryFlagStore::new()),
                uuid::Uuid::new_v4().to_string(),
            ))
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize config and exit
    if args.init_config {
        match config::Config::init() {
            Ok(path) => {
                println!("Config file created at: {}", path.display());
                println!("\nExample config:\n{}", config::example_config());
            }
            Err(e) => {
                eprintln!("Error creating config: {}", e);
                std::process::exit(1);
            }
        }
        return Ok(());
    }

    let mut cfg = config::Config::load();

    // CLI takes precedence over the config file
    if let Some(url) = args.base_url {
        cfg.server.base_url = url;
    }
    let use_tui = !args.no_tui && args.command.is_none() && cfg.use_tui();

    if args.verbose {
        init_tracing(use_tui);
    }
    tracing::info!("chatdesk starting against {}", cfg.server.base_url);

    let (store, session_id) = match open_store(args.session.as_deref()) {
        Ok(opened) => opened,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };

    let backend = Arc::new(HttpBackend::new(cfg.server.clone()));
    let mut chat = ChatSession::new(cfg.session.clone(), backend, store);

    // Non-interactive mode
    if let Some(command) = args.command {
        return run_command(&mut chat, &command, &session_id).await;
    }

    if use_tui {
        let theme_name = args.theme.as_deref().unwrap_or(cfg.theme_name());
        let theme = chatdesk_tui::Theme::by_name(theme_name);
        return ui::run_tui(&mut chat, &session_id, theme, args.session.is_some()).await;
    }

    run_interactive(&mut chat, &session_id).await
}

/// Prints session events as plain text, streaming bot text as it grows
#[derive(Default)]
struct PlainPrinter {
    /// Chars of the current bot response already printed
    printed: usize,
}

impl PlainPrinter {
    fn handle(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::ResponseStarted => {
                self.printed = 0;
            }
            SessionEvent::ResponseUpdated { text } => {
                self.print_delta(&text);
            }
            SessionEvent::ResponseFinished { text, .. } => {
                self.print_delta(&text);
                if self.printed > 0 {
                    println!();
                }
                self.printed = 0;
            }
            SessionEvent::ResponseFailed { message, .. } => {
                if self.printed > 0 {
                    println!();
                }
                self.printed = 0;
                eprintln!("Error: {}", message);
            }
            SessionEvent::AgentChanged { agent } => {
                let icon = agent.profile().map(|p| p.icon).unwrap_or("◆");
                if self.printed > 0 {
                    println!();
                }
                println!("[{} {}]", icon, agent.display_name());
            }
            SessionEvent::FieldRequested { spec } => {
                let optional = if spec.required { "" } else { ", optional" };
                println!("[{}{}: {}]", spec.label, optional, spec.placeholder);
            }
            SessionEvent::FormError { message } => {
                eprintln!("Error: {}", message);
            }
            SessionEvent::BotMessage { text } => {
                println!("{}", text);
            }
            SessionEvent::SystemMessage { text } => {
                println!("[{}]", text);
            }
            SessionEvent::ConnectionChanged { status } => {
                tracing::debug!("connection: {}", status.label());
            }
            SessionEvent::FormClosed | SessionEvent::ControlsChanged { .. } => {}
        }
    }

    fn print_delta(&mut self, text: &str) {
        let total = text.chars().count();
        if total > self.printed {
            let delta: String = text.chars().skip(self.printed).collect();
            print!("{}", delta);
            io::stdout().flush().ok();
            self.printed = total;
        }
    }
}

/// Run a job while printing the events it produces
async fn run_printed(
    chat: &mut ChatSession,
    rx: &mut broadcast::Receiver<SessionEvent>,
    printer: &mut PlainPrinter,
    job: Job,
    session_id: &str,
) -> Outcome {
    let outcome = {
        let mut job_future = std::pin::pin!(commands::run_job(chat, job, session_id));
        loop {
            tokio::select! {
                biased;
                outcome = &mut job_future => break outcome,
                event = rx.recv() => {
                    if let Ok(event) = event {
                        printer.handle(event);
                    }
                }
            }
        }
    };
    while let Ok(event) = rx.try_recv() {
        printer.handle(event);
    }

    match &outcome {
        Outcome::Nothing => {}
        Outcome::Notice(text) | Outcome::Reset(text) => println!("{}", text),
        Outcome::Error(text) => eprintln!("Error: {}", text),
    }
    outcome
}

async fn run_command(chat: &mut ChatSession, command: &str, session_id: &str) -> anyhow::Result<()> {
    println!("chatdesk> {}", command);
    println!();

    let mut rx = chat.subscribe();
    let mut printer = PlainPrinter::default();

    let job = match execute_command(command, chat) {
        Some(CommandResult::Exit) => return Ok(()),
        Some(result) => match plain_dispatch(result, chat) {
            Some(job) => job,
            None => return Ok(()),
        },
        None => Job::Send(command.to_string()),
    };

    if let Outcome::Error(_) = run_printed(chat, &mut rx, &mut printer, job, session_id).await {
        std::process::exit(1);
    }
    Ok(())
}

/// Handle the synchronous part of a command in plain mode; returns the job to run, if any
fn plain_dispatch(result: CommandResult, chat: &mut ChatSession) -> Option<Job> {
    match result {
        CommandResult::Message(msg) => println!("{}", msg),
        CommandResult::Clear => {
            // Clear the terminal screen
            print!("\x1B[2J\x1B[1;1H");
            io::stdout().flush().ok();
        }
        CommandResult::Reset => return Some(Job::Reset),
        CommandResult::SelectAgent(profile) => {
            println!("> {}", profile.selection_prompt);
            return Some(Job::Send(profile.selection_prompt.to_string()));
        }
        CommandResult::OpenAgentSelector => {
            let current = chat.conversation().current_agent.clone();
            println!("{}", commands::AgentCommand::list_agents_text(current.as_ref()));
        }
        CommandResult::ShowLead => return Some(Job::Lead),
        CommandResult::Upload(path) => match UploadCommand::preview(&path) {
            Ok(preview) => {
                println!("{}", preview);
                return Some(Job::Upload(path));
            }
            Err(e) => eprintln!("Error: {}", e),
        },
        CommandResult::CheckStatus => return Some(Job::Status),
        CommandResult::StartForm => {
            if let Some(msg) = commands::start_form(chat) {
                println!("{}", msg);
            }
        }
        CommandResult::Retry => return Some(Job::Retry),
        CommandResult::Exit => {}
        CommandResult::Unknown(cmd) => {
            println!("Unknown command: /{}", cmd);
            println!("Type /help for available commands.");
        }
    }
    None
}

async fn run_interactive(chat: &mut ChatSession, session_id: &str) -> anyhow::Result<()> {
    let mut rx = chat.subscribe();
    let mut printer = PlainPrinter::default();

    // Show minimal startup info (only if TTY)
    if io::IsTerminal::is_terminal(&io::stderr()) {
        let short: String = session_id.chars().take(8).collect();
        eprintln!("chatdesk session: {}", short);
        eprintln!();
    }

    run_printed(chat, &mut rx, &mut printer, Job::Connect, session_id).await;
    println!("{}", chat.config().messages.welcome);

    loop {
        if let Some(spec) = chat.form().current_field() {
            print!("{}> ", spec.label.to_lowercase());
        } else {
            print!("> ");
        }
        io::stdout().flush()?;

        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            // EOF
            break;
        }

        let input = input.trim();
        if input.is_empty() {
            continue;
        }

        if input.starts_with('/') {
            if let Some(result) = execute_command(input, chat) {
                if matches!(result, CommandResult::Exit) {
                    break;
                }
                if let Some(job) = plain_dispatch(result, chat) {
                    run_printed(chat, &mut rx, &mut printer, job, session_id).await;
                }
                // Events raised synchronously, e.g. the first form prompt
                while let Ok(event) = rx.try_recv() {
                    printer.handle(event);
                }
            }
        } else {
            run_printed(chat, &mut rx, &mut printer, Job::Send(input.to_string()), session_id)
                .await;
        }

        // Probe again if a stream failed
        let probe_due = chat
            .probe_due()
            .is_some_and(|due| tokio::time::Instant::now() >= due);
        if probe_due {
            run_printed(chat, &mut rx, &mut printer, Job::Probe, session_id).await;
        }

        println!();
    }

    Ok(())
}
