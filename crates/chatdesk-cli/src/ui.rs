//! TUI implementation for chatdesk

use tokio::sync::mpsc;

use chatdesk_core::{
    AgentId, AgentProfile, ChatSession, ConnectionStatus, FieldSpec, SessionEvent,
};
use chatdesk_tui::{
    Theme,
    input::Action,
    widgets::{
        AgentBadge, ChatMessage, InputBox, MessageList, Role, Selector, SelectorItem,
        SelectorState, Spinner, SuggestionBar, SuggestionState,
        message_list::calculate_message_height,
    },
};
use crossterm::event::{Event, EventStream, MouseEventKind};
use futures::StreamExt;
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState},
};
use std::time::Instant;

use crate::commands::{self, CommandResult, Job, Outcome, UploadCommand, execute_command};

const INPUT_PLACEHOLDER: &str = "Type a message...";

/// Messages sent from UI to the session handler
#[derive(Debug)]
pub enum UiMessage {
    /// User submitted a chat message
    Submit(String),
    /// Slash command
    Command(String),
    /// Agent picked in the selector (index into `AgentProfile::all()`)
    SelectAgent(usize),
    /// Leave the contact form
    CancelForm,
    /// Reset the conversation
    Reset,
    /// User requested quit
    Quit,
}

/// TUI application state
pub struct TuiState {
    /// Chat messages
    messages: Vec<ChatMessage>,
    /// Input box
    input: InputBox,
    /// Current scroll position
    scroll: usize,
    /// Whether a job is running
    is_processing: bool,
    /// Current status message
    status: String,
    theme: Theme,
    /// Text shown on the welcome screen
    welcome: String,
    /// Short session id for the status bar
    session_label: String,
    current_agent: Option<AgentId>,
    connection: ConnectionStatus,
    message_count: u64,
    completed: bool,
    /// Contact field the input box is collecting
    form_field: Option<FieldSpec>,
    /// Channel to send messages to the session handler
    ui_tx: mpsc::Sender<UiMessage>,
    /// Spinner start time for animation
    spinner_start: Instant,
    agent_selector: SelectorState,
    suggestions: SuggestionState,
}

impl TuiState {
    pub fn new(
        theme: Theme,
        welcome: String,
        session_label: String,
        ui_tx: mpsc::Sender<UiMessage>,
    ) -> Self {
        let mut input = InputBox::new().with_placeholder(INPUT_PLACEHOLDER);
        input.set_focused(true);

        Self {
            messages: vec![],
            input,
            scroll: 0,
            is_processing: false,
            status: "Ready".to_string(),
            theme,
            welcome,
            session_label,
            current_agent: None,
            connection: ConnectionStatus::Unknown,
            message_count: 0,
            completed: false,
            form_field: None,
            ui_tx,
            spinner_start: Instant::now(),
            agent_selector: SelectorState::default(),
            suggestions: SuggestionState::default(),
        }
    }

    /// Copy conversation state that does not arrive as events
    pub fn sync(&mut self, session: &ChatSession) {
        let conversation = session.conversation();
        self.message_count = conversation.message_count;
        self.completed = conversation.completed;
        self.current_agent = conversation.current_agent.clone();
        self.connection = conversation.connection.clone();
        self.is_processing = session.is_busy();
        self.input.set_enabled(conversation.controls.input_enabled);
        if let Some(spec) = session.form().current_field() {
            self.show_field(spec);
        }
    }

    fn badge(&self) -> Option<AgentBadge> {
        self.current_agent.as_ref().map(AgentBadge::for_agent)
    }

    fn streaming_message(&mut self) -> Option<&mut ChatMessage> {
        self.messages.last_mut().filter(|m| m.streaming)
    }

    /// Handle session events
    pub fn handle_session_event(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::ResponseStarted => {
                self.is_processing = true;
                self.spinner_start = Instant::now();
                self.status = "Thinking...".to_string();
                let badge = self.badge();
                self.messages.push(ChatMessage::bot_streaming().with_badge(badge));
                self.scroll_to_bottom();
            }
            SessionEvent::ResponseUpdated { text } => {
                if let Some(last) = self.streaming_message() {
                    last.content = text;
                } else {
                    let badge = self.badge();
                    let mut msg = ChatMessage::bot_streaming().with_badge(badge);
                    msg.content = text;
                    self.messages.push(msg);
                }
                self.scroll_to_bottom();
            }
            SessionEvent::AgentChanged { agent } => {
                let badge = AgentBadge::for_agent(&agent);
                if let Some(last) = self.streaming_message() {
                    last.badge = Some(badge);
                }
                self.current_agent = Some(agent);
                self.suggestions.reset();
            }
            SessionEvent::ResponseFinished { text, agent } => {
                let badge = agent.as_ref().map(AgentBadge::for_agent);
                if let Some(last) = self.streaming_message() {
                    last.content = text;
                    last.streaming = false;
                    if badge.is_some() {
                        last.badge = badge;
                    }
                }
                self.drop_empty_bubble();
                self.is_processing = false;
                self.status = "Ready".to_string();
                self.scroll_to_bottom();
            }
            SessionEvent::ResponseFailed { partial, message } => {
                if let Some(last) = self.streaming_message() {
                    last.content = partial;
                    last.streaming = false;
                }
                self.drop_empty_bubble();
                self.messages.push(ChatMessage::error(message));
                self.is_processing = false;
                self.status = "Error".to_string();
                self.scroll_to_bottom();
            }
            SessionEvent::FieldRequested { spec } => {
                self.show_field(spec);
            }
            SessionEvent::FormClosed => {
                self.form_field = None;
                self.input.set_title(None);
                self.input.set_placeholder(INPUT_PLACEHOLDER);
                self.input.set_highlight(false);
            }
            SessionEvent::FormError { message } => {
                self.messages.push(ChatMessage::error(message));
                self.scroll_to_bottom();
            }
            SessionEvent::BotMessage { text } => {
                let badge = self.badge();
                self.messages.push(ChatMessage::bot(text).with_badge(badge));
                self.scroll_to_bottom();
            }
            SessionEvent::SystemMessage { text } => {
                self.show_system_message(&text);
            }
            SessionEvent::ConnectionChanged { status } => {
                self.connection = status;
            }
            SessionEvent::ControlsChanged { controls } => {
                self.input.set_enabled(controls.input_enabled);
                self.is_processing = controls.loading;
                if controls.loading {
                    self.spinner_start = Instant::now();
                } else {
                    self.status = "Ready".to_string();
                }
            }
        }
    }

    fn show_field(&mut self, spec: FieldSpec) {
        let title = if spec.required {
            format!("{} *", spec.label)
        } else {
            format!("{} (optional)", spec.label)
        };
        self.input.set_title(Some(title));
        self.input.set_placeholder(spec.placeholder);
        self.input.set_highlight(true);
        self.form_field = Some(spec);
    }

    /// A stream that closed without text leaves no bubble
    fn drop_empty_bubble(&mut self) {
        if self
            .messages
            .last()
            .is_some_and(|m| m.role == Role::Bot && m.content.is_empty())
        {
            self.messages.pop();
        }
    }

    fn scroll_to_bottom(&mut self) {
        // Will be calculated during render based on content height
        self.scroll = usize::MAX;
    }

    /// Show a system message
    pub fn show_system_message(&mut self, content: &str) {
        self.messages.push(ChatMessage::system(content));
        self.scroll_to_bottom();
    }

    pub fn show_error(&mut self, content: &str) {
        self.messages.push(ChatMessage::error(content));
        self.scroll_to_bottom();
    }

    /// Show what a finished job reported
    pub fn apply_outcome(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Nothing => {}
            Outcome::Notice(text) => self.show_system_message(&text),
            Outcome::Error(text) => self.show_error(&text),
            Outcome::Reset(text) => {
                self.messages.clear();
                self.current_agent = None;
                self.suggestions.reset();
                self.show_system_message(&text);
            }
        }
    }

    /// Suggestions of the current agent; the general agent's before anyone answered
    fn suggestion_list(&self) -> &'static [&'static str] {
        if self.form_field.is_some() || self.completed {
            return &[];
        }
        self.current_agent
            .as_ref()
            .and_then(|a| a.profile())
            .or_else(|| AgentProfile::lookup("general"))
            .map(|p| p.suggestions)
            .unwrap_or(&[])
    }

    fn cycle_suggestion(&mut self, forward: bool, width: u16) {
        let list = self.suggestion_list();
        let index = if forward {
            self.suggestions.next(list.len())
        } else {
            self.suggestions.prev(list.len())
        };
        if let Some(text) = index.and_then(|i| list.get(i)) {
            self.input.set_content(*text, width);
        }
    }

    fn open_agent_selector(&mut self) {
        self.agent_selector.selected = self
            .current_agent
            .as_ref()
            .and_then(|a| AgentProfile::all().iter().position(|p| p.id == a.as_str()))
            .unwrap_or(0);
        self.agent_selector.show();
    }

    /// Handle keyboard action
    pub async fn handle_action(&mut self, action: Action, width: u16) -> bool {
        // Handle agent selector if visible
        if self.agent_selector.visible {
            let count = AgentProfile::all().len();
            match action {
                Action::Up => self.agent_selector.up(count),
                Action::Down | Action::Tab => self.agent_selector.down(count),
                Action::Submit => {
                    let selected = self.agent_selector.selected;
                    self.agent_selector.hide();
                    let _ = self.ui_tx.send(UiMessage::SelectAgent(selected)).await;
                }
                Action::Escape | Action::AgentSelect => self.agent_selector.hide(),
                Action::Quit | Action::Interrupt => {
                    let _ = self.ui_tx.send(UiMessage::Quit).await;
                    return false;
                }
                // Ignore other actions while selector is open
                _ => {}
            }
            return true;
        }

        match action {
            Action::Submit => {
                let content = self.input.content().trim().to_string();
                if !content.is_empty() && !self.is_processing && self.input.is_enabled() {
                    self.input.clear();
                    self.suggestions.reset();

                    if content.starts_with('/') {
                        let _ = self.ui_tx.send(UiMessage::Command(content)).await;
                    } else {
                        self.messages.push(ChatMessage::user(&content));
                        self.scroll_to_bottom();
                        let _ = self.ui_tx.send(UiMessage::Submit(content)).await;
                    }
                }
                true
            }
            Action::Quit | Action::Interrupt => {
                let _ = self.ui_tx.send(UiMessage::Quit).await;
                false
            }
            Action::Eof if self.input.content().is_empty() => {
                let _ = self.ui_tx.send(UiMessage::Quit).await;
                false
            }
            Action::Escape => {
                if self.form_field.is_some() {
                    let _ = self.ui_tx.send(UiMessage::CancelForm).await;
                } else {
                    self.input.clear();
                    self.suggestions.reset();
                }
                true
            }
            Action::Tab => {
                self.cycle_suggestion(true, width);
                true
            }
            Action::BackTab => {
                self.cycle_suggestion(false, width);
                true
            }
            Action::PageUp => {
                self.scroll = self.scroll.saturating_sub(10);
                true
            }
            Action::PageDown => {
                self.scroll = self.scroll.saturating_add(10);
                true
            }
            Action::Clear => {
                self.messages.clear();
                self.status = "Cleared".to_string();
                true
            }
            Action::Reset => {
                if !self.is_processing {
                    let _ = self.ui_tx.send(UiMessage::Reset).await;
                }
                true
            }
            Action::AgentSelect => {
                // Open agent selector (only when not processing)
                if !self.is_processing {
                    self.open_agent_selector();
                }
                true
            }
            _ => {
                if self.input.handle_action(&action, width) {
                    self.suggestions.reset();
                }
                true
            }
        }
    }

    /// Render the UI
    pub fn render(&mut self, frame: &mut Frame) {
        let size = frame.area();
        let suggestion_height = if self.suggestion_list().is_empty() { 0 } else { 1 };

        // Layout: messages (flex), suggestions (0-1), status bar (1), input (3)
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(1),
                Constraint::Length(suggestion_height),
                Constraint::Length(1),
                Constraint::Length(3),
            ])
            .split(size);

        self.render_messages(frame, chunks[0]);

        if suggestion_height > 0 {
            let bar = SuggestionBar::new(self.suggestion_list(), self.suggestions, &self.theme);
            frame.render_widget(bar, chunks[1]);
        }

        self.render_status(frame, chunks[2]);

        self.input
            .render(chunks[3], frame.buffer_mut(), &self.theme);

        if self.agent_selector.visible {
            self.render_agent_selector(frame, size);
        }
    }

    fn render_agent_selector(&self, frame: &mut Frame, area: Rect) {
        let current = self.current_agent.as_ref().map(|a| a.as_str());
        let items: Vec<SelectorItem> = AgentProfile::all()
            .iter()
            .map(|p| SelectorItem::for_agent(p, current == Some(p.id), &self.theme))
            .collect();

        let selector = Selector::new("Select agent", items, &self.theme)
            .with_selected(self.agent_selector.selected);

        selector.render_centered(area, frame.buffer_mut());
    }

    fn render_welcome(&self) -> Paragraph<'_> {
        let key = |k: &'static str, what: &'static str| {
            Line::from(vec![
                Span::styled(format!("    {:<10}", k), self.theme.accent_style()),
                Span::styled(what, self.theme.base_style()),
            ])
        };

        let mut lines = vec![
            Line::from(""),
            Line::from(vec![
                Span::styled("  ✉ ", self.theme.accent_bold()),
                Span::styled("chatdesk", self.theme.base_style().add_modifier(Modifier::BOLD)),
                Span::styled(" - virtual assistant", self.theme.dim_style()),
            ]),
            Line::from(""),
        ];
        for line in self.welcome.lines() {
            lines.push(Line::from(Span::styled(format!("  {}", line), self.theme.base_style())));
        }
        lines.extend([
            Line::from(""),
            Line::from(""),
            Line::from(Span::styled("  Keybindings", self.theme.warning_style())),
            Line::from(""),
            key("Enter", "Send message"),
            key("Tab", "Cycle suggested questions"),
            key("Ctrl+K", "Select agent"),
            key("Ctrl+R", "Reset conversation"),
            key("Ctrl+L", "Clear transcript"),
            key("Esc", "Leave the contact form"),
            key("Ctrl+C", "Quit"),
            key("PgUp/Dn", "Scroll history"),
            Line::from(""),
            Line::from(Span::styled("  Type /help for commands", self.theme.dim_style())),
        ]);
        Paragraph::new(lines)
    }

    fn render_messages(&mut self, frame: &mut Frame, area: Rect) {
        let title = match self.current_agent.as_ref() {
            Some(agent) => format!(" chatdesk │ {} ", agent.display_name()),
            None => " chatdesk ".to_string(),
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(self.theme.border_style())
            .title(title);

        let inner = block.inner(area);
        frame.render_widget(block, area);

        if inner.height == 0 || self.messages.is_empty() {
            frame.render_widget(self.render_welcome(), inner);
            return;
        }

        // Calculate scroll
        let content_height =
            calculate_message_height(&self.messages, &self.theme, inner.width as usize);

        if self.scroll == usize::MAX {
            // Auto-scroll to bottom
            self.scroll = content_height.saturating_sub(inner.height as usize);
        } else {
            self.scroll = self
                .scroll
                .min(content_height.saturating_sub(inner.height as usize));
        }

        let message_list = MessageList::new(&self.messages, &self.theme).scroll(self.scroll);
        frame.render_widget(message_list, inner);

        if content_height > inner.height as usize {
            let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight)
                .begin_symbol(Some("↑"))
                .end_symbol(Some("↓"))
                .track_symbol(Some("│"))
                .thumb_symbol("█");

            let mut scrollbar_state = ScrollbarState::new(content_height)
                .position(self.scroll)
                .viewport_content_length(inner.height as usize);

            frame.render_stateful_widget(scrollbar, inner, &mut scrollbar_state);
        }
    }

    fn connection_style(&self) -> Style {
        match self.connection {
            ConnectionStatus::Connected => self.theme.success_style(),
            ConnectionStatus::Degraded { .. } => self.theme.warning_style(),
            ConnectionStatus::Disconnected { .. } => self.theme.error_style(),
            ConnectionStatus::Unknown => self.theme.dim_style(),
        }
    }

    fn render_status(&self, frame: &mut Frame, area: Rect) {
        if self.is_processing {
            let spinner =
                Spinner::new(&self.status, &self.theme).with_start_time(self.spinner_start);
            frame.render_widget(spinner, area);
            return;
        }

        let connection = format!("● {}", self.connection.label());
        let mut left = format!(" │ {} msgs │ {}", self.message_count, self.session_label);
        if self.completed {
            left.push_str(" │ details sent");
        }
        left.push_str(&format!(" │ {}", self.status));
        let right_content = "Ctrl+K: agent │ Tab: suggest │ Ctrl+C: quit";

        let left_width = connection.chars().count() + left.chars().count();
        let right_width = right_content.chars().count();
        let available = area.width as usize;

        let mut spans = vec![
            Span::styled(connection, self.connection_style()),
            Span::styled(left, self.theme.dim_style()),
        ];
        if left_width + right_width + 2 <= available {
            spans.push(Span::raw(" ".repeat(available - left_width - right_width)));
            spans.push(Span::styled(right_content, self.theme.dim_style()));
        }

        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }
}

/// What the outer loop should do with a parsed command
enum Next {
    Continue,
    Run(Job),
    Exit,
}

fn dispatch_command(
    result: CommandResult,
    state: &mut TuiState,
    session: &mut ChatSession,
) -> Next {
    match result {
        CommandResult::Message(msg) => state.show_system_message(&msg),
        CommandResult::Clear => {
            state.messages.clear();
            state.status = "Cleared".to_string();
        }
        CommandResult::Reset => return Next::Run(Job::Reset),
        CommandResult::SelectAgent(profile) => return select_agent(profile, state),
        CommandResult::OpenAgentSelector => state.open_agent_selector(),
        CommandResult::ShowLead => return Next::Run(Job::Lead),
        CommandResult::Upload(path) => match UploadCommand::preview(&path) {
            Ok(preview) => {
                state.show_system_message(&preview);
                return Next::Run(Job::Upload(path));
            }
            Err(e) => state.show_error(&e),
        },
        CommandResult::CheckStatus => return Next::Run(Job::Status),
        CommandResult::StartForm => {
            if let Some(msg) = commands::start_form(session) {
                state.show_system_message(&msg);
            }
        }
        CommandResult::Retry => return Next::Run(Job::Retry),
        CommandResult::Exit => return Next::Exit,
        CommandResult::Unknown(cmd) => {
            state.show_system_message(&format!(
                "Unknown command: /{}\nType /help for available commands.",
                cmd
            ));
        }
    }
    Next::Continue
}

/// Send the agent's selection prompt as if the user typed it
fn select_agent(profile: &'static AgentProfile, state: &mut TuiState) -> Next {
    state.messages.push(ChatMessage::user(profile.selection_prompt));
    state.scroll_to_bottom();
    Next::Run(Job::Send(profile.selection_prompt.to_string()))
}

/// Run the TUI application
pub async fn run_tui(
    session: &mut ChatSession,
    session_id: &str,
    theme: Theme,
    resumed: bool,
) -> anyhow::Result<()> {
    use crossterm::{
        execute,
        terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
    };
    use ratatui::{Terminal, backend::CrosstermBackend};
    use std::io;

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let (ui_tx, mut ui_rx) = mpsc::channel::<UiMessage>(32);

    let session_label: String = session_id.chars().take(8).collect();
    let mut state = TuiState::new(
        theme,
        session.config().messages.welcome.clone(),
        session_label,
        ui_tx,
    );
    state.sync(session);
    if resumed {
        state.show_system_message(&format!("Resumed session {}", session_id));
    }

    let mut session_rx = session.subscribe();

    let mut event_stream = EventStream::new();

    // Tick interval for animations and the delayed health probe
    let mut tick_interval = tokio::time::interval(std::time::Duration::from_millis(80));

    // Work to start at the top of the next iteration, so the future can borrow the session
    let mut pending_job: Option<Job> = Some(Job::Connect);

    let result = loop {
        if let Some(job) = pending_job.take() {
            state.is_processing = !matches!(job, Job::Connect | Job::Probe);
            state.spinner_start = Instant::now();
            state.status = job.label().to_string();

            let outcome = {
                let mut job_future = std::pin::pin!(commands::run_job(session, job, session_id));

                // Poll it alongside other events until completion
                loop {
                    terminal.draw(|frame| state.render(frame))?;
                    let area_width = terminal.size()?.width;

                    tokio::select! {
                        biased;

                        outcome = &mut job_future => break outcome,

                        event = session_rx.recv() => {
                            if let Ok(event) = event {
                                state.handle_session_event(event);
                            }
                        }

                        // Typing keeps working while the job runs
                        event = event_stream.next() => {
                            match event {
                                Some(Ok(Event::Key(key))) => {
                                    let action = chatdesk_tui::input::key_to_action(key);
                                    match action {
                                        Action::Quit | Action::Interrupt => {
                                            disable_raw_mode()?;
                                            execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
                                            terminal.show_cursor()?;
                                            return Ok(());
                                        }
                                        Action::PageUp => state.scroll = state.scroll.saturating_sub(10),
                                        Action::PageDown => state.scroll = state.scroll.saturating_add(10),
                                        Action::Submit => {}
                                        _ => {
                                            state.input.handle_action(&action, area_width);
                                        }
                                    }
                                }
                                Some(Ok(Event::Paste(text))) => {
                                    state.input.handle_action(&Action::Paste(text), area_width);
                                }
                                Some(Ok(Event::Mouse(mouse))) => match mouse.kind {
                                    MouseEventKind::ScrollUp => state.scroll = state.scroll.saturating_sub(3),
                                    MouseEventKind::ScrollDown => state.scroll = state.scroll.saturating_add(3),
                                    _ => {}
                                },
                                Some(Err(_)) | None => {
                                    disable_raw_mode()?;
                                    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
                                    terminal.show_cursor()?;
                                    return Ok(());
                                }
                                _ => {}
                            }
                        }

                        _ = tick_interval.tick() => {}
                    }
                }
            };

            // Drain remaining session events after the job completes
            while let Ok(event) = session_rx.try_recv() {
                state.handle_session_event(event);
            }
            state.apply_outcome(outcome);
            state.sync(session);
            if !state.is_processing && state.status != "Error" {
                state.status = "Ready".to_string();
            }

            terminal.draw(|frame| state.render(frame))?;
            continue;
        }

        terminal.draw(|frame| state.render(frame))?;

        let area_width = terminal.size()?.width;

        tokio::select! {
            biased;

            event = session_rx.recv() => {
                if let Ok(event) = event {
                    state.handle_session_event(event);
                }
            }

            event = event_stream.next() => {
                match event {
                    Some(Ok(Event::Key(key))) => {
                        let action = chatdesk_tui::input::key_to_action(key);
                        if !state.handle_action(action, area_width).await {
                            break Ok(());
                        }
                    }
                    Some(Ok(Event::Paste(text))) => {
                        state.handle_action(Action::Paste(text), area_width).await;
                    }
                    Some(Ok(Event::Mouse(mouse))) => match mouse.kind {
                        MouseEventKind::ScrollUp => state.scroll = state.scroll.saturating_sub(3),
                        MouseEventKind::ScrollDown => state.scroll = state.scroll.saturating_add(3),
                        _ => {}
                    },
                    Some(Ok(Event::Resize(_, _))) => {}
                    Some(Err(e)) => {
                        break Err(anyhow::anyhow!("Event error: {}", e));
                    }
                    None => {
                        break Ok(());
                    }
                    _ => {}
                }
            }

            // Tick: spinner frames and the delayed probe
            _ = tick_interval.tick() => {
                let probe_due = session
                    .probe_due()
                    .is_some_and(|due| tokio::time::Instant::now() >= due);
                if probe_due && !session.is_busy() {
                    pending_job = Some(Job::Probe);
                }
            }

            msg = ui_rx.recv() => {
                match msg {
                    Some(UiMessage::Submit(content)) => {
                        pending_job = Some(Job::Send(content));
                    }
                    Some(UiMessage::Command(cmd)) => {
                        if let Some(result) = execute_command(&cmd, session) {
                            match dispatch_command(result, &mut state, session) {
                                Next::Continue => {}
                                Next::Run(job) => pending_job = Some(job),
                                Next::Exit => break Ok(()),
                            }
                        }
                    }
                    Some(UiMessage::SelectAgent(index)) => {
                        if let Some(profile) = AgentProfile::all().get(index) {
                            if let Next::Run(job) = select_agent(profile, &mut state) {
                                pending_job = Some(job);
                            }
                        }
                    }
                    Some(UiMessage::CancelForm) => {
                        session.cancel_form();
                        state.show_system_message("Contact form closed.");
                    }
                    Some(UiMessage::Reset) => {
                        pending_job = Some(Job::Reset);
                    }
                    Some(UiMessage::Quit) | None => {
                        break Ok(());
                    }
                }
            }
        }
    };

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}
