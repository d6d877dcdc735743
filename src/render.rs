//! Turning assistant replies into terminal lines
//!
//! Replies may carry light markdown. `MarkdownRenderer` styles the common
//! pieces (bold, italic, inline code, headings, lists, fenced code) and
//! `PlainTextRenderer` prints the text as-is with its line breaks. Which one
//! is used is decided once at startup.

use std::iter::Peekable;
use std::str::Chars;
use std::sync::OnceLock;

use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use regex::Regex;

pub trait MessageRenderer: Send + Sync {
    fn render(&self, content: &str) -> Vec<Line<'static>>;

    fn name(&self) -> &'static str;
}

pub struct PlainTextRenderer;

impl MessageRenderer for PlainTextRenderer {
    fn render(&self, content: &str) -> Vec<Line<'static>> {
        content.lines().map(|line| Line::raw(line.to_string())).collect()
    }

    fn name(&self) -> &'static str {
        "plain"
    }
}

pub struct MarkdownRenderer;

impl MessageRenderer for MarkdownRenderer {
    fn render(&self, content: &str) -> Vec<Line<'static>> {
        let mut lines = Vec::new();
        let mut in_code_block = false;

        for line in content.lines() {
            if line.trim_start().starts_with("```") {
                in_code_block = !in_code_block;
                continue;
            }

            if in_code_block {
                lines.push(Line::from(Span::styled(format!("  {}", line), code_style())));
            } else {
                lines.push(parse_markdown_line(line));
            }
        }

        lines
    }

    fn name(&self) -> &'static str {
        "markdown"
    }
}

pub fn select_renderer(plain: bool) -> Box<dyn MessageRenderer> {
    if plain {
        Box::new(PlainTextRenderer)
    } else {
        Box::new(MarkdownRenderer)
    }
}

fn code_style() -> Style {
    Style::default().fg(Color::LightBlue)
}

fn numbered_item() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\s*)(\d+)[.)]\s+(.*)$").expect("valid list regex"))
}

/// Parse one line of markdown into a styled line
fn parse_markdown_line(text: &str) -> Line<'static> {
    let trimmed = text.trim_start();

    // Headings
    let level = trimmed.chars().take_while(|c| *c == '#').count();
    if (1..=6).contains(&level) && trimmed[level..].starts_with(' ') {
        let heading = trimmed[level..].trim().to_string();
        return Line::from(Span::styled(
            heading,
            Style::default().add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
        ));
    }

    // Bullets
    if let Some(rest) = trimmed
        .strip_prefix("- ")
        .or_else(|| trimmed.strip_prefix("* "))
        .or_else(|| trimmed.strip_prefix("+ "))
    {
        let indent = " ".repeat(text.len() - trimmed.len());
        let mut spans = vec![Span::raw(format!("{}• ", indent))];
        spans.extend(parse_inline(rest));
        return Line::from(spans);
    }

    // Numbered items
    if let Some(caps) = numbered_item().captures(text) {
        let mut spans = vec![Span::raw(format!("{}{}. ", &caps[1], &caps[2]))];
        spans.extend(parse_inline(&caps[3]));
        return Line::from(spans);
    }

    let spans = parse_inline(text);
    if spans.is_empty() {
        Line::default()
    } else {
        Line::from(spans)
    }
}

/// Collect text up to a closing delimiter. Returns the text and whether the
/// delimiter was found.
fn take_delimited(chars: &mut Peekable<Chars>, delim: char, double: bool) -> (String, bool) {
    let mut inner = String::new();

    while let Some(c) = chars.next() {
        if c == delim && (!double || chars.peek() == Some(&delim)) {
            if double {
                chars.next();
            }
            return (inner, true);
        }
        inner.push(c);
    }

    (inner, false)
}

/// Convert **bold**, *italic* and `code` to styled spans
fn parse_inline(text: &str) -> Vec<Span<'static>> {
    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut chars = text.chars().peekable();
    let mut current_text = String::new();

    while let Some(c) = chars.next() {
        let (opening, delim, double, style) = match c {
            '*' if chars.peek() == Some(&'*') => {
                chars.next();
                ("**", '*', true, Style::default().add_modifier(Modifier::BOLD))
            }
            '*' if chars.peek().is_some_and(|n| !n.is_whitespace()) => {
                ("*", '*', false, Style::default().add_modifier(Modifier::ITALIC))
            }
            '`' => ("`", '`', false, code_style()),
            _ => {
                current_text.push(c);
                continue;
            }
        };

        let (inner, found_close) = take_delimited(&mut chars, delim, double);

        if found_close && !inner.is_empty() {
            if !current_text.is_empty() {
                spans.push(Span::raw(std::mem::take(&mut current_text)));
            }
            spans.push(Span::styled(inner, style));
        } else {
            // No closing delimiter, treat as literal
            current_text.push_str(opening);
            current_text.push_str(&inner);
            if found_close {
                current_text.push_str(opening);
            }
        }
    }

    if !current_text.is_empty() {
        spans.push(Span::raw(current_text));
    }

    spans
}
