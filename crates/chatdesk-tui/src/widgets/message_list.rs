//! Chat bubbles and the scrolling message list

use crate::theme::Theme;
use crate::widgets::markdown::render_markdown;
use chatdesk_core::{AgentId, AgentTone};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Modifier,
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};

/// Who a bubble belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Bot,
    System,
    Error,
}

/// Agent identity shown above a bot bubble
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentBadge {
    pub icon: String,
    pub name: String,
    pub tone: AgentTone,
}

impl AgentBadge {
    /// Badge for any agent id; unknown ids show the raw id
    pub fn for_agent(agent: &AgentId) -> Self {
        match agent.profile() {
            Some(profile) => Self {
                icon: profile.icon.to_string(),
                name: profile.name.to_string(),
                tone: profile.tone,
            },
            None => Self {
                icon: "◆".to_string(),
                name: agent.as_str().to_string(),
                tone: AgentTone::Other,
            },
        }
    }
}

/// A single bubble in the chat
#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
    pub badge: Option<AgentBadge>,
    /// Bot text still arriving
    pub streaming: bool,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            badge: None,
            streaming: false,
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn bot(content: impl Into<String>) -> Self {
        Self::new(Role::Bot, content)
    }

    /// Empty bot bubble waiting for tokens
    pub fn bot_streaming() -> Self {
        Self {
            streaming: true,
            ..Self::new(Role::Bot, "")
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self::new(Role::Error, content)
    }

    pub fn with_badge(mut self, badge: Option<AgentBadge>) -> Self {
        self.badge = badge;
        self
    }
}

/// Render one bubble into lines; every role goes through here
pub fn render_message(msg: &ChatMessage, theme: &Theme, width: usize) -> Vec<Line<'static>> {
    let mut lines = Vec::new();

    let (prefix, label, style) = match (msg.role, &msg.badge) {
        (Role::User, _) => ("▶ ", "You".to_string(), theme.accent_bold()),
        (Role::Bot, Some(badge)) => (
            "◀ ",
            format!("{} {}", badge.icon, badge.name),
            theme.agent_style(badge.tone),
        ),
        (Role::Bot, None) => (
            "◀ ",
            "Assistant".to_string(),
            theme.success_style().add_modifier(Modifier::BOLD),
        ),
        (Role::System, _) => ("● ", "Info".to_string(), theme.dim_style()),
        (Role::Error, _) => ("✖ ", "Error".to_string(), theme.error_style()),
    };

    let header = if msg.streaming {
        format!("{}{} ▌", prefix, label)
    } else {
        format!("{}{}", prefix, label)
    };
    lines.push(Line::from(Span::styled(header, style)));

    let content_width = width.saturating_sub(2).max(1);
    match msg.role {
        Role::Bot if msg.content.is_empty() && msg.streaming => {
            lines.push(Line::from(Span::styled(
                "  typing…".to_string(),
                theme.warning_style(),
            )));
        }
        Role::Bot => {
            for line in render_markdown(&msg.content, theme, content_width) {
                let mut spans = vec![Span::raw("  ")];
                spans.extend(line.spans);
                lines.push(Line::from(spans));
            }
        }
        role => {
            let style = match role {
                Role::Error => theme.error_style(),
                Role::System => theme.dim_style(),
                _ => theme.base_style(),
            };
            for line in textwrap::wrap(&msg.content, content_width) {
                lines.push(Line::from(Span::styled(format!("  {}", line), style)));
            }
        }
    }

    lines.push(Line::from(""));
    lines
}

/// Total height of the rendered bubbles
pub fn calculate_message_height(messages: &[ChatMessage], theme: &Theme, width: usize) -> usize {
    messages
        .iter()
        .map(|msg| render_message(msg, theme, width).len())
        .sum()
}

/// Widget for displaying a list of chat messages
pub struct MessageList<'a> {
    messages: &'a [ChatMessage],
    theme: &'a Theme,
    scroll: usize,
}

impl<'a> MessageList<'a> {
    pub fn new(messages: &'a [ChatMessage], theme: &'a Theme) -> Self {
        Self {
            messages,
            theme,
            scroll: 0,
        }
    }

    /// Set scroll offset in lines
    pub fn scroll(mut self, scroll: usize) -> Self {
        self.scroll = scroll;
        self
    }
}

impl Widget for MessageList<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width == 0 || area.height == 0 {
            return;
        }

        let width = area.width as usize;
        let visible: Vec<Line> = self
            .messages
            .iter()
            .flat_map(|msg| render_message(msg, self.theme, width))
            .skip(self.scroll)
            .take(area.height as usize)
            .collect();

        Paragraph::new(visible).render(area, buf);
    }
}
