//! Single-line message input
//!
//! In form mode the box carries the field label as its title, the field
//! placeholder and a highlighted border.

use crate::input::Action;
use crate::theme::Theme;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Style,
    widgets::{Block, Borders, Paragraph, Widget},
};
use unicode_width::UnicodeWidthChar;

/// Single-line text input widget
#[derive(Debug, Default)]
pub struct InputBox {
    content: String,
    /// Cursor position in chars
    cursor: usize,
    /// Horizontal scroll offset in columns
    scroll: usize,
    placeholder: String,
    title: Option<String>,
    focused: bool,
    /// Form-field highlight
    highlight: bool,
    /// False while a response is loading
    enabled: bool,
}

impl InputBox {
    pub fn new() -> Self {
        Self {
            enabled: true,
            ..Default::default()
        }
    }

    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = placeholder.into();
        self
    }

    pub fn set_placeholder(&mut self, placeholder: impl Into<String>) {
        self.placeholder = placeholder.into();
    }

    pub fn set_title(&mut self, title: Option<String>) {
        self.title = title;
    }

    pub fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
    }

    pub fn set_highlight(&mut self, highlight: bool) {
        self.highlight = highlight;
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// Replace the content and move the cursor to the end
    pub fn set_content(&mut self, content: impl Into<String>, width: u16) {
        self.content = content.into();
        self.cursor = self.content.chars().count();
        self.update_scroll(width as usize);
    }

    pub fn clear(&mut self) {
        self.content.clear();
        self.cursor = 0;
        self.scroll = 0;
    }

    /// Take the content, leaving the box empty
    pub fn take(&mut self) -> String {
        let content = std::mem::take(&mut self.content);
        self.cursor = 0;
        self.scroll = 0;
        content
    }

    fn byte_offset(&self, char_index: usize) -> usize {
        self.content
            .char_indices()
            .nth(char_index)
            .map(|(i, _)| i)
            .unwrap_or(self.content.len())
    }

    fn columns_before(&self, char_index: usize) -> usize {
        self.content
            .chars()
            .take(char_index)
            .map(|c| c.width().unwrap_or(0))
            .sum()
    }

    fn remove_char_at(&mut self, char_index: usize) {
        let start = self.byte_offset(char_index);
        let end = self.byte_offset(char_index + 1);
        self.content.drain(start..end);
    }

    /// Apply an editing action; returns true if it was consumed
    pub fn handle_action(&mut self, action: &Action, width: u16) -> bool {
        let len = self.content.chars().count();

        let handled = match action {
            Action::Char(c) => {
                self.insert_char(*c);
                true
            }
            Action::Backspace if self.cursor > 0 => {
                self.cursor -= 1;
                self.remove_char_at(self.cursor);
                true
            }
            Action::Delete if self.cursor < len => {
                self.remove_char_at(self.cursor);
                true
            }
            Action::Left if self.cursor > 0 => {
                self.cursor -= 1;
                true
            }
            Action::Right if self.cursor < len => {
                self.cursor += 1;
                true
            }
            Action::Home => {
                self.cursor = 0;
                true
            }
            Action::End => {
                self.cursor = len;
                true
            }
            Action::ClearLine => {
                self.clear();
                true
            }
            Action::DeleteWord => {
                let chars: Vec<char> = self.content.chars().collect();
                let mut start = self.cursor;
                while start > 0 && chars[start - 1] == ' ' {
                    start -= 1;
                }
                while start > 0 && chars[start - 1] != ' ' {
                    start -= 1;
                }
                let (from, to) = (self.byte_offset(start), self.byte_offset(self.cursor));
                self.content.drain(from..to);
                self.cursor = start;
                true
            }
            Action::Paste(text) => {
                for c in text.chars() {
                    if c == '\n' || c == '\r' {
                        if self.cursor > 0 && !self.content.ends_with(' ') {
                            self.insert_char(' ');
                        }
                    } else {
                        self.insert_char(c);
                    }
                }
                true
            }
            _ => false,
        };

        if handled {
            self.update_scroll(width as usize);
        }
        handled
    }

    fn insert_char(&mut self, c: char) {
        let at = self.byte_offset(self.cursor);
        self.content.insert(at, c);
        self.cursor += 1;
    }

    fn update_scroll(&mut self, width: usize) {
        let visible = width.saturating_sub(4).max(1);
        let cursor_col = self.columns_before(self.cursor);

        if cursor_col < self.scroll {
            self.scroll = cursor_col;
        } else if cursor_col >= self.scroll + visible {
            self.scroll = cursor_col + 1 - visible;
        }
    }

    /// Render the input box
    pub fn render(&self, area: Rect, buf: &mut Buffer, theme: &Theme) {
        let border = if self.highlight {
            theme.warning_style()
        } else if self.focused && self.enabled {
            theme.accent_style()
        } else {
            theme.border_style()
        };
        let mut block = Block::default().borders(Borders::ALL).border_style(border);
        if let Some(title) = &self.title {
            block = block.title(format!(" {} ", title)).title_style(border);
        }

        let inner = block.inner(area);
        block.render(area, buf);

        let (text, style) = if self.content.is_empty() {
            (self.placeholder.clone(), theme.dim_style())
        } else {
            let mut skipped = 0;
            let mut used = 0;
            let mut visible = String::new();
            for c in self.content.chars() {
                let w = c.width().unwrap_or(0);
                if skipped < self.scroll {
                    skipped += w;
                    continue;
                }
                if used + w > inner.width as usize {
                    break;
                }
                visible.push(c);
                used += w;
            }
            let style = if self.enabled {
                theme.base_style()
            } else {
                theme.dim_style()
            };
            (visible, style)
        };
        Paragraph::new(text).style(style).render(inner, buf);

        if self.focused && self.enabled && inner.width > 0 {
            let x = self.columns_before(self.cursor).saturating_sub(self.scroll);
            if x < inner.width as usize {
                if let Some(cell) = buf.cell_mut((inner.x + x as u16, inner.y)) {
                    cell.set_style(Style::default().bg(theme.accent));
                }
            }
        }
    }
}
