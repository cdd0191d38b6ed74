//! Color theme support

use chatdesk_core::AgentTone;
use ratatui::style::{Color, Modifier, Style};

/// Color theme for the UI
#[derive(Debug, Clone)]
pub struct Theme {
    pub bg: Color,
    pub fg: Color,
    /// Secondary text
    pub dim: Color,
    /// Prompts, user bubbles, focused borders
    pub accent: Color,
    pub error: Color,
    pub success: Color,
    /// Form-mode highlight
    pub warning: Color,
    pub border: Color,
    pub selection_bg: Color,
    pub code: Color,
    pub link: Color,
    /// Badge colors per agent tone
    pub agent_general: Color,
    pub agent_sales: Color,
    pub agent_technical: Color,
    pub agent_contact: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self::dark()
    }
}

impl Theme {
    /// Dark theme (default)
    pub fn dark() -> Self {
        Self {
            bg: Color::Reset,
            fg: Color::White,
            dim: Color::DarkGray,
            accent: Color::Cyan,
            error: Color::Red,
            success: Color::Green,
            warning: Color::Yellow,
            border: Color::DarkGray,
            selection_bg: Color::DarkGray,
            code: Color::Magenta,
            link: Color::Blue,
            agent_general: Color::LightBlue,
            agent_sales: Color::LightGreen,
            agent_technical: Color::LightMagenta,
            agent_contact: Color::LightYellow,
        }
    }

    /// Light theme
    pub fn light() -> Self {
        Self {
            bg: Color::White,
            fg: Color::Black,
            dim: Color::Gray,
            accent: Color::Blue,
            error: Color::Red,
            success: Color::Green,
            warning: Color::Rgb(180, 120, 0),
            border: Color::Gray,
            selection_bg: Color::LightBlue,
            code: Color::Magenta,
            link: Color::Blue,
            agent_general: Color::Blue,
            agent_sales: Color::Rgb(0, 130, 60),
            agent_technical: Color::Magenta,
            agent_contact: Color::Rgb(170, 110, 0),
        }
    }

    /// Pick a theme by name, falling back to dark
    pub fn by_name(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "light" => Self::light(),
            _ => Self::dark(),
        }
    }

    pub fn base_style(&self) -> Style {
        Style::default().fg(self.fg).bg(self.bg)
    }

    pub fn dim_style(&self) -> Style {
        Style::default().fg(self.dim)
    }

    pub fn accent_style(&self) -> Style {
        Style::default().fg(self.accent)
    }

    pub fn accent_bold(&self) -> Style {
        Style::default()
            .fg(self.accent)
            .add_modifier(Modifier::BOLD)
    }

    pub fn error_style(&self) -> Style {
        Style::default().fg(self.error)
    }

    pub fn success_style(&self) -> Style {
        Style::default().fg(self.success)
    }

    pub fn warning_style(&self) -> Style {
        Style::default().fg(self.warning)
    }

    pub fn code_style(&self) -> Style {
        Style::default().fg(self.code)
    }

    pub fn border_style(&self) -> Style {
        Style::default().fg(self.border)
    }

    /// Badge color for an agent tone
    pub fn agent_color(&self, tone: AgentTone) -> Color {
        match tone {
            AgentTone::General => self.agent_general,
            AgentTone::Sales => self.agent_sales,
            AgentTone::Technical => self.agent_technical,
            AgentTone::Contact => self.agent_contact,
            AgentTone::Other => self.dim,
        }
    }

    /// Bold badge style for an agent tone
    pub fn agent_style(&self, tone: AgentTone) -> Style {
        Style::default()
            .fg(self.agent_color(tone))
            .add_modifier(Modifier::BOLD)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_tone_uses_dim() {
        let theme = Theme::dark();
        assert_eq!(theme.agent_color(AgentTone::Other), theme.dim);
        assert_ne!(
            theme.agent_color(AgentTone::Sales),
            theme.agent_color(AgentTone::Technical)
        );
    }

    #[test]
    fn test_by_name() {
        assert_eq!(Theme::by_name("LIGHT").bg, Color::White);
        assert_eq!(Theme::by_name("solarized").bg, Color::Reset);
    }
}
