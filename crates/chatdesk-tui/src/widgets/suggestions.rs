//! Suggested follow-up questions for the current agent

use crate::theme::Theme;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Modifier,
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};

/// Which chip Tab last put into the input
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SuggestionState {
    pub cursor: Option<usize>,
}

impl SuggestionState {
    /// Advance to the next chip, wrapping around
    pub fn next(&mut self, count: usize) -> Option<usize> {
        if count == 0 {
            self.cursor = None;
            return None;
        }
        let next = self.cursor.map(|i| (i + 1) % count).unwrap_or(0);
        self.cursor = Some(next);
        self.cursor
    }

    /// Step back to the previous chip, wrapping around
    pub fn prev(&mut self, count: usize) -> Option<usize> {
        if count == 0 {
            self.cursor = None;
            return None;
        }
        let prev = match self.cursor {
            Some(0) | None => count - 1,
            Some(i) => i - 1,
        };
        self.cursor = Some(prev);
        self.cursor
    }

    pub fn reset(&mut self) {
        self.cursor = None;
    }
}

/// One-line chip bar
pub struct SuggestionBar<'a> {
    suggestions: &'a [&'a str],
    state: SuggestionState,
    theme: &'a Theme,
}

impl<'a> SuggestionBar<'a> {
    pub fn new(suggestions: &'a [&'a str], state: SuggestionState, theme: &'a Theme) -> Self {
        Self {
            suggestions,
            state,
            theme,
        }
    }
}

impl Widget for SuggestionBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if self.suggestions.is_empty() || area.height == 0 {
            return;
        }

        let mut spans = vec![Span::styled("Tab ▸ ", self.theme.dim_style())];
        for (i, suggestion) in self.suggestions.iter().enumerate() {
            let style = if self.state.cursor == Some(i) {
                self.theme.accent_bold().add_modifier(Modifier::REVERSED)
            } else {
                self.theme.accent_style()
            };
            spans.push(Span::styled(format!("[{}]", suggestion), style));
            spans.push(Span::raw(" "));
        }

        Paragraph::new(Line::from(spans)).render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_wraps() {
        let mut state = SuggestionState::default();
        assert_eq!(state.next(2), Some(0));
        assert_eq!(state.next(2), Some(1));
        assert_eq!(state.next(2), Some(0));
    }

    #[test]
    fn test_prev_from_start() {
        let mut state = SuggestionState::default();
        assert_eq!(state.prev(3), Some(2));
        assert_eq!(state.prev(3), Some(1));
    }

    #[test]
    fn test_empty_list_clears_cursor() {
        let mut state = SuggestionState { cursor: Some(1) };
        assert_eq!(state.next(0), None);
        assert_eq!(state.cursor, None);
    }
}
