use crossterm::event::KeyCode;
use pulldown_cmark::{Event, Parser, Tag, TagEnd};
use tui::{
    style::{Color, Modifier, Style},
    text::{Span, Spans},
};

/// Apply a typing key to a text field. Returns true if the value changed.
pub fn edit_text(value: &mut String, key: KeyCode) -> bool {
    match key {
        KeyCode::Char(c) => {
            value.push(c);
            true
        }
        KeyCode::Backspace => value.pop().is_some(),
        _ => false,
    }
}

/// Like [`edit_text`] but only accepts characters of a decimal number.
pub fn edit_number(value: &mut String, key: KeyCode) -> bool {
    match key {
        KeyCode::Char(c) if c.is_ascii_digit() => edit_text(value, key),
        KeyCode::Char('.') if !value.contains('.') => edit_text(value, key),
        KeyCode::Backspace => edit_text(value, key),
        _ => false,
    }
}

/// Render the Markdown returned by the assistant as styled terminal lines.
///
/// Headings, lists, strong/emphasis, inline code, code blocks and rules are
/// kept; anything else degrades to its plain text.
pub fn markdown_lines(text: &str) -> Vec<Spans<'static>> {
    let mut out = MarkdownLines::default();

    for event in Parser::new(text) {
        match event {
            Event::Start(Tag::Heading { .. }) => {
                out.begin_block();
                out.heading = true;
            }
            Event::End(TagEnd::Heading(_)) => {
                out.flush();
                out.heading = false;
            }
            Event::Start(Tag::Paragraph) => {
                if out.lists.is_empty() {
                    out.begin_block();
                }
            }
            Event::End(TagEnd::Paragraph) => out.flush(),
            Event::Start(Tag::List(first)) => {
                if out.lists.is_empty() {
                    out.begin_block();
                } else {
                    out.flush();
                }
                out.lists.push(first);
            }
            Event::End(TagEnd::List(_)) => {
                out.lists.pop();
            }
            Event::Start(Tag::Item) => {
                out.flush();
                let indent = "  ".repeat(out.lists.len());
                let marker = match out.lists.last_mut() {
                    Some(Some(n)) => {
                        let marker = format!("{n}. ");
                        *n += 1;
                        marker
                    }
                    _ => "• ".to_string(),
                };
                out.current.push(Span::raw(format!("{indent}{marker}")));
            }
            Event::End(TagEnd::Item) => out.flush(),
            Event::Start(Tag::Strong) => out.strong += 1,
            Event::End(TagEnd::Strong) => out.strong = out.strong.saturating_sub(1),
            Event::Start(Tag::Emphasis) => out.emphasis += 1,
            Event::End(TagEnd::Emphasis) => out.emphasis = out.emphasis.saturating_sub(1),
            Event::Start(Tag::CodeBlock(_)) => {
                out.begin_block();
                out.code_block = true;
            }
            Event::End(TagEnd::CodeBlock) => {
                out.flush();
                out.code_block = false;
            }
            Event::Text(text) if out.code_block => {
                let style = Style::default().fg(Color::Yellow);
                for line in text.lines() {
                    out.current.push(Span::styled(line.to_string(), style));
                    out.flush();
                }
            }
            Event::Text(text) | Event::Html(text) | Event::InlineHtml(text) => {
                let style = out.style();
                out.current.push(Span::styled(text.into_string(), style));
            }
            Event::Code(code) => {
                let style = out.style().fg(Color::Yellow);
                out.current.push(Span::styled(code.into_string(), style));
            }
            Event::SoftBreak | Event::HardBreak => out.flush(),
            Event::Rule => {
                out.begin_block();
                out.lines.push(Spans::from(Span::styled(
                    "─".repeat(24),
                    Style::default().fg(Color::DarkGray),
                )));
            }
            _ => {}
        }
    }

    out.flush();
    out.lines
}

#[derive(Default)]
struct MarkdownLines {
    lines: Vec<Spans<'static>>,
    current: Vec<Span<'static>>,
    // Next number for ordered lists, None for bullets.
    lists: Vec<Option<u64>>,
    strong: usize,
    emphasis: usize,
    heading: bool,
    code_block: bool,
}

impl MarkdownLines {
    fn flush(&mut self) {
        if !self.current.is_empty() {
            self.lines.push(Spans::from(std::mem::take(&mut self.current)));
        }
    }

    /// Top-level blocks are separated by one blank line.
    fn begin_block(&mut self) {
        self.flush();
        if !self.lines.is_empty() {
            self.lines.push(Spans::from(""));
        }
    }

    fn style(&self) -> Style {
        let mut style = Style::default();
        if self.heading {
            style = style.fg(Color::Cyan).add_modifier(Modifier::BOLD);
        }
        if self.strong > 0 {
            style = style.add_modifier(Modifier::BOLD);
        }
        if self.emphasis > 0 {
            style = style.add_modifier(Modifier::ITALIC);
        }
        style
    }
}
