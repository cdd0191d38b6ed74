//! Markdown rendering for bot bubbles
//!
//! Output lines are already wrapped to the requested width, so the number of
//! lines returned is the height the bubble occupies.

use crate::theme::Theme;
use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Options, Parser, Tag, TagEnd};
use ratatui::{
    style::{Modifier, Style},
    text::{Line, Span},
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Convert markdown text to styled, wrapped lines
pub fn render_markdown(text: &str, theme: &Theme, width: usize) -> Vec<Line<'static>> {
    let mut renderer = Renderer::new(theme, width.max(4));
    for event in Parser::new_ext(text, Options::ENABLE_STRIKETHROUGH) {
        renderer.event(event);
    }
    renderer.finish()
}

/// Cut `text` to at most `width` columns, marking the cut with an ellipsis
pub fn truncate_to_width(text: &str, width: usize) -> String {
    if text.width() <= width {
        return text.to_string();
    }
    let mut out = String::new();
    let mut used = 0;
    for c in text.chars() {
        let w = c.width().unwrap_or(0);
        if used + w + 1 > width {
            break;
        }
        out.push(c);
        used += w;
    }
    out.push('…');
    out
}

struct Renderer<'t> {
    theme: &'t Theme,
    width: usize,
    lines: Vec<Line<'static>>,
    current: Vec<Span<'static>>,
    styles: Vec<Style>,
    /// Next number per open list; `None` for bullet lists
    lists: Vec<Option<u64>>,
    /// Marker for the first line of the current list item
    marker: Option<String>,
    quote_depth: usize,
    code: Option<String>,
    link: Option<(String, String)>,
}

impl<'t> Renderer<'t> {
    fn new(theme: &'t Theme, width: usize) -> Self {
        Self {
            theme,
            width,
            lines: Vec::new(),
            current: Vec::new(),
            styles: vec![theme.base_style()],
            lists: Vec::new(),
            marker: None,
            quote_depth: 0,
            code: None,
            link: None,
        }
    }

    fn style(&self) -> Style {
        self.styles.last().copied().unwrap_or_default()
    }

    fn push_style(&mut self, f: impl FnOnce(Style) -> Style) {
        let next = f(self.style());
        self.styles.push(next);
    }

    fn pop_style(&mut self) {
        if self.styles.len() > 1 {
            self.styles.pop();
        }
    }

    fn blank(&mut self) {
        if self.lines.last().is_some_and(|l| l.width() > 0) {
            self.lines.push(Line::from(""));
        }
    }

    fn prefixes(&mut self) -> (String, String) {
        let quote = "│ ".repeat(self.quote_depth);
        let indent = "  ".repeat(self.lists.len().saturating_sub(1));
        match self.marker.take() {
            Some(marker) => {
                let pad = " ".repeat(marker.width());
                (
                    format!("{}{}{}", quote, indent, marker),
                    format!("{}{}{}", quote, indent, pad),
                )
            }
            None if !self.lists.is_empty() => {
                let pad = format!("{}{}  ", quote, indent);
                (pad.clone(), pad)
            }
            None => (quote.clone(), quote),
        }
    }

    /// Wrap the pending spans into finished lines
    fn flush(&mut self) {
        if self.current.is_empty() {
            return;
        }
        let spans = std::mem::take(&mut self.current);
        let (first, rest) = self.prefixes();
        let mut wrapper = Wrapper::new(first, rest, self.theme.dim_style(), self.width);
        for span in spans {
            wrapper.push(&span.content, span.style);
        }
        self.lines.extend(wrapper.finish());
    }

    fn event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(tag) => self.end(tag),
            Event::Text(text) => {
                if let Some(code) = self.code.as_mut() {
                    code.push_str(&text);
                } else {
                    if let Some((_, label)) = self.link.as_mut() {
                        label.push_str(&text);
                    }
                    let style = self.style();
                    self.current.push(Span::styled(text.into_string(), style));
                }
            }
            Event::Code(code) => {
                let style = self.theme.code_style().add_modifier(Modifier::BOLD);
                self.current.push(Span::styled(format!("`{}`", code), style));
            }
            Event::SoftBreak => self.current.push(Span::raw(" ")),
            Event::HardBreak => self.flush(),
            Event::Rule => {
                self.flush();
                let rule = "─".repeat(self.width.min(40));
                self.lines.push(Line::from(Span::styled(rule, self.theme.dim_style())));
            }
            _ => {}
        }
    }

    fn start(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Heading { level, .. } => {
                self.flush();
                let accent = self.theme.accent_style();
                self.styles.push(match level {
                    HeadingLevel::H1 => accent.add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
                    HeadingLevel::H2 => accent.add_modifier(Modifier::BOLD),
                    _ => accent,
                });
            }
            Tag::Paragraph => self.flush(),
            Tag::CodeBlock(kind) => {
                self.flush();
                if let CodeBlockKind::Fenced(lang) = kind {
                    if !lang.is_empty() {
                        self.lines
                            .push(Line::from(Span::styled(format!("  {}", lang), self.theme.dim_style())));
                    }
                }
                self.code = Some(String::new());
            }
            Tag::List(start) => {
                self.flush();
                self.lists.push(start);
            }
            Tag::Item => {
                self.flush();
                let marker = match self.lists.last_mut() {
                    Some(Some(n)) => {
                        let marker = format!("{}. ", n);
                        *n += 1;
                        marker
                    }
                    _ => "• ".to_string(),
                };
                self.marker = Some(marker);
            }
            Tag::BlockQuote(_) => {
                self.flush();
                self.quote_depth += 1;
                self.push_style(|s| s.add_modifier(Modifier::ITALIC));
            }
            Tag::Emphasis => self.push_style(|s| s.add_modifier(Modifier::ITALIC)),
            Tag::Strong => self.push_style(|s| s.add_modifier(Modifier::BOLD)),
            Tag::Strikethrough => self.push_style(|s| s.add_modifier(Modifier::CROSSED_OUT)),
            Tag::Link { dest_url, .. } => {
                let link = self.theme.link;
                self.push_style(|s| s.fg(link).add_modifier(Modifier::UNDERLINED));
                self.link = Some((dest_url.into_string(), String::new()));
            }
            _ => {}
        }
    }

    fn end(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Heading(_) => {
                self.flush();
                self.pop_style();
            }
            TagEnd::Paragraph => {
                self.flush();
                if self.lists.is_empty() {
                    self.blank();
                }
            }
            TagEnd::CodeBlock => {
                let code = self.code.take().unwrap_or_default();
                let style = self.theme.code_style();
                let max = self.width.saturating_sub(2);
                for line in code.lines() {
                    let shown = truncate_to_width(line, max);
                    self.lines.push(Line::from(Span::styled(format!("  {}", shown), style)));
                }
                self.blank();
            }
            TagEnd::List(_) => {
                self.flush();
                self.lists.pop();
                if self.lists.is_empty() {
                    self.blank();
                }
            }
            TagEnd::Item => self.flush(),
            TagEnd::BlockQuote(_) => {
                self.flush();
                self.quote_depth = self.quote_depth.saturating_sub(1);
                self.pop_style();
                self.blank();
            }
            TagEnd::Emphasis | TagEnd::Strong | TagEnd::Strikethrough => self.pop_style(),
            TagEnd::Link => {
                self.pop_style();
                if let Some((url, label)) = self.link.take() {
                    if !url.is_empty() && url != label {
                        self.current
                            .push(Span::styled(format!(" ({})", url), self.theme.dim_style()));
                    }
                }
            }
            _ => {}
        }
    }

    fn finish(mut self) -> Vec<Line<'static>> {
        self.flush();
        while self.lines.last().is_some_and(|l| l.width() == 0) {
            self.lines.pop();
        }
        self.lines
    }
}

/// Greedy word wrapper over styled text
struct Wrapper {
    rest: String,
    prefix_style: Style,
    avail: usize,
    lines: Vec<Line<'static>>,
    line: Vec<Span<'static>>,
    used: usize,
}

impl Wrapper {
    fn new(first: String, rest: String, prefix_style: Style, width: usize) -> Self {
        let avail = width.saturating_sub(first.width().max(rest.width())).max(1);
        let line = if first.is_empty() {
            vec![]
        } else {
            vec![Span::styled(first, prefix_style)]
        };
        Self {
            rest,
            prefix_style,
            avail,
            lines: Vec::new(),
            line,
            used: 0,
        }
    }

    fn trim_line_end(&mut self) {
        if let Some(last) = self.line.last_mut() {
            let trimmed = last.content.trim_end();
            if trimmed.len() != last.content.len() {
                last.content = trimmed.to_string().into();
            }
        }
    }

    fn break_line(&mut self) {
        self.trim_line_end();
        self.lines.push(Line::from(std::mem::take(&mut self.line)));
        if !self.rest.is_empty() {
            self.line.push(Span::styled(self.rest.clone(), self.prefix_style));
        }
        self.used = 0;
    }

    fn emit(&mut self, text: &str, style: Style) {
        self.used += text.width();
        self.line.push(Span::styled(text.to_string(), style));
    }

    fn push(&mut self, text: &str, style: Style) {
        for piece in text.split_inclusive(' ') {
            let mut pending = if self.used == 0 {
                piece.trim_start()
            } else {
                piece
            };

            while !pending.is_empty() {
                let needed = pending.trim_end().width();
                if self.used + needed <= self.avail {
                    self.emit(pending, style);
                    break;
                }
                if self.used > 0 {
                    self.break_line();
                    pending = pending.trim_start();
                    continue;
                }
                // A single word wider than the line
                let split = split_at_width(pending, self.avail);
                self.emit(&pending[..split], style);
                self.break_line();
                pending = &pending[split..];
            }
        }
    }

    fn finish(mut self) -> Vec<Line<'static>> {
        if self.used > 0 {
            self.trim_line_end();
            self.lines.push(Line::from(self.line));
        }
        self.lines
    }
}

/// Byte index where `text` exceeds `width` columns; always at least one char
fn split_at_width(text: &str, width: usize) -> usize {
    let mut used = 0;
    for (i, c) in text.char_indices() {
        let w = c.width().unwrap_or(0);
        if used + w > width && i > 0 {
            return i;
        }
        used += w;
    }
    text.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain(lines: &[Line]) -> Vec<String> {
        lines
            .iter()
            .map(|l| l.spans.iter().map(|s| s.content.as_ref()).collect())
            .collect()
    }

    #[test]
    fn test_simple_text() {
        let theme = Theme::dark();
        let lines = render_markdown("Hello, world!", &theme, 80);
        assert_eq!(plain(&lines), vec!["Hello, world!"]);
    }

    #[test]
    fn test_paragraph_wraps_to_width() {
        let theme = Theme::dark();
        let text = "We offer consulting, cloud migration and support plans for companies of every size.";
        let lines = render_markdown(text, &theme, 24);
        assert!(lines.len() > 1);
        for line in &lines {
            assert!(line.width() <= 24, "{:?}", line);
        }
        let joined = plain(&lines).join(" ");
        assert_eq!(joined.split_whitespace().count(), text.split_whitespace().count());
    }

    #[test]
    fn test_list_items_get_markers() {
        let theme = Theme::dark();
        let lines = render_markdown("- Sales\n- Support\n\n1. First\n2. Second", &theme, 40);
        let text = plain(&lines);
        assert!(text.contains(&"• Sales".to_string()));
        assert!(text.contains(&"2. Second".to_string()));
    }

    #[test]
    fn test_code_block_with_wide_chars_is_truncated() {
        let theme = Theme::dark();
        let md = "```\nlet saludo = \"¿Qué tal? ñandú ñandú ñandú ñandú\";\n```";
        let lines = render_markdown(md, &theme, 20);
        assert!(lines.iter().all(|l| l.width() <= 20));
        assert!(plain(&lines)[0].ends_with('…'));
    }

    #[test]
    fn test_link_shows_destination() {
        let theme = Theme::dark();
        let lines = render_markdown("See [pricing](https://example.com/pricing)", &theme, 80);
        assert_eq!(plain(&lines), vec!["See pricing (https://example.com/pricing)"]);
    }

    #[test]
    fn test_partial_markdown_while_streaming() {
        let theme = Theme::dark();
        let lines = render_markdown("**Our plans", &theme, 80);
        assert_eq!(lines.len(), 1);
    }

    #[test]
    fn test_truncate_to_width() {
        assert_eq!(truncate_to_width("short", 10), "short");
        assert_eq!(truncate_to_width("abcdefghij", 5), "abcd…");
    }
}
