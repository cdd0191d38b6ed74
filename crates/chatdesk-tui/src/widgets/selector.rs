//! Popup for choosing an agent

use crate::Theme;
use chatdesk_core::AgentProfile;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, HighlightSpacing, List, ListItem, ListState, Widget},
};
use unicode_width::UnicodeWidthStr;

const MAX_POPUP_WIDTH: u16 = 72;

/// An entry in the selector
pub struct SelectorItem<'a> {
    pub icon: &'a str,
    pub label: &'a str,
    pub description: Option<&'a str>,
    /// Currently active entry
    pub is_current: bool,
    pub style: Style,
}

impl<'a> SelectorItem<'a> {
    /// Entry for an agent profile, colored by its tone
    pub fn for_agent(profile: &'a AgentProfile, is_current: bool, theme: &Theme) -> Self {
        Self {
            icon: profile.icon,
            label: profile.name,
            description: Some(profile.description),
            is_current,
            style: theme.agent_style(profile.tone),
        }
    }
}

/// A centered popup list
pub struct Selector<'a> {
    title: &'a str,
    items: Vec<SelectorItem<'a>>,
    selected: usize,
    theme: &'a Theme,
}

impl<'a> Selector<'a> {
    pub fn new(title: &'a str, items: Vec<SelectorItem<'a>>, theme: &'a Theme) -> Self {
        let selected = items.iter().position(|item| item.is_current).unwrap_or(0);
        Self {
            title,
            items,
            selected,
            theme,
        }
    }

    pub fn with_selected(mut self, index: usize) -> Self {
        self.selected = index.min(self.items.len().saturating_sub(1));
        self
    }

    /// Popup size: two rows per item plus borders
    fn popup_size(&self) -> (u16, u16) {
        let widest = self
            .items
            .iter()
            .map(|item| {
                let label = item.icon.width() + item.label.width() + 6;
                let desc = item.description.map(|d| d.width() + 6).unwrap_or(0);
                label.max(desc)
            })
            .max()
            .unwrap_or(0)
            .max(self.title.width() + 4);
        let width = (widest as u16).clamp(24, MAX_POPUP_WIDTH);
        let height = (self.items.len() as u16 * 2 + 2).min(22);
        (width, height)
    }

    fn list_item(&self, index: usize, item: &SelectorItem<'_>) -> ListItem<'static> {
        let marker = if item.is_current { "● " } else { "  " };
        let label_style = if index == self.selected {
            Style::default()
                .bg(self.theme.selection_bg)
                .fg(self.theme.fg)
                .add_modifier(Modifier::BOLD)
        } else {
            item.style
        };

        let mut lines = vec![Line::from(vec![
            Span::styled(marker.to_string(), self.theme.accent_style()),
            Span::styled(format!("{} {}", item.icon, item.label), label_style),
        ])];
        if let Some(desc) = item.description {
            lines.push(Line::from(Span::styled(
                format!("    {}", desc),
                self.theme.dim_style(),
            )));
        }
        ListItem::new(lines)
    }

    /// Render the selector centered in the given area
    pub fn render_centered(&self, area: Rect, buf: &mut Buffer) {
        let (width, height) = self.popup_size();
        let x = area.x + area.width.saturating_sub(width) / 2;
        let y = area.y + area.height.saturating_sub(height) / 2;
        let popup = Rect::new(x, y, width.min(area.width), height.min(area.height));

        Clear.render(popup, buf);

        let block = Block::default()
            .title(format!(" {} ", self.title))
            .title_style(self.theme.accent_bold())
            .borders(Borders::ALL)
            .border_style(self.theme.accent_style());

        let items: Vec<ListItem> = self
            .items
            .iter()
            .enumerate()
            .map(|(i, item)| self.list_item(i, item))
            .collect();
        let list = List::new(items)
            .block(block)
            .highlight_spacing(HighlightSpacing::Always);

        let mut state = ListState::default();
        state.select(Some(self.selected));
        ratatui::widgets::StatefulWidget::render(list, popup, buf, &mut state);
    }
}

/// Visibility and cursor of a selector popup
#[derive(Debug, Default)]
pub struct SelectorState {
    pub selected: usize,
    pub visible: bool,
}

impl SelectorState {
    pub fn show(&mut self) {
        self.visible = true;
    }

    pub fn hide(&mut self) {
        self.visible = false;
    }

    pub fn up(&mut self, item_count: usize) {
        if item_count == 0 {
            return;
        }
        self.selected = if self.selected == 0 {
            item_count - 1
        } else {
            self.selected - 1
        };
    }

    pub fn down(&mut self, item_count: usize) {
        if item_count == 0 {
            return;
        }
        self.selected = (self.selected + 1) % item_count;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_wraps_around() {
        let mut state = SelectorState::default();
        state.up(4);
        assert_eq!(state.selected, 3);
        state.down(4);
        assert_eq!(state.selected, 0);
        state.down(0);
        assert_eq!(state.selected, 0);
    }

    #[test]
    fn test_selector_starts_on_current_agent() {
        let theme = Theme::dark();
        let items: Vec<SelectorItem> = AgentProfile::all()
            .iter()
            .map(|p| SelectorItem::for_agent(p, p.id == "EngineerAgent", &theme))
            .collect();
        let selector = Selector::new("Select agent", items, &theme);
        assert_eq!(selector.selected, 2);

        let (width, height) = selector.popup_size();
        assert!(width <= MAX_POPUP_WIDTH);
        assert_eq!(height, 10);
    }

    #[test]
    fn test_render_does_not_panic_in_tiny_area() {
        let theme = Theme::dark();
        let items = vec![SelectorItem::for_agent(&AgentProfile::all()[0], false, &theme)];
        let selector = Selector::new("Select agent", items, &theme);
        let area = Rect::new(0, 0, 10, 3);
        let mut buf = Buffer::empty(area);
        selector.render_centered(area, &mut buf);
    }
}
