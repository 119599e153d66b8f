//! Formatter for the constrained markdown subset the backend's report
//! generator emits: `##` headings, `**bold**` spans, inline links, bullet
//! and numbered list lines, blank-line paragraph breaks. One parser feeds
//! two renderers: HTML fragments for the printable export and styled lines
//! for the report pane. Nested lists, inline code and tables are not part
//! of the subset and pass through as plain text.

use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Inline {
    Text(String),
    Bold(String),
    Link { label: String, url: String },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Block {
    Heading(Vec<Inline>),
    /// One entry per list item. Numbered items land here too; ordering
    /// semantics are intentionally discarded and everything renders as
    /// bullets.
    List(Vec<Vec<Inline>>),
    /// One entry per source line; single newlines inside a paragraph
    /// become line breaks, not new paragraphs.
    Paragraph(Vec<Vec<Inline>>),
}

/// Parse report markdown into blocks. Blank lines separate paragraphs but do
/// not split lists: two bullet runs with only blank lines between them merge
/// into a single list (the adjacent-list-boundary cleanup).
pub fn parse(input: &str) -> Vec<Block> {
    let mut blocks: Vec<Block> = Vec::new();
    let mut paragraph: Vec<Vec<Inline>> = Vec::new();

    let flush_paragraph = |blocks: &mut Vec<Block>, paragraph: &mut Vec<Vec<Inline>>| {
        if !paragraph.is_empty() {
            blocks.push(Block::Paragraph(std::mem::take(paragraph)));
        }
    };

    for raw_line in input.lines() {
        let line = raw_line.trim_end();
        if line.trim().is_empty() {
            flush_paragraph(&mut blocks, &mut paragraph);
            continue;
        }

        if let Some(text) = heading_text(line) {
            flush_paragraph(&mut blocks, &mut paragraph);
            blocks.push(Block::Heading(parse_inlines(text)));
            continue;
        }

        if let Some(item) = list_item_text(line) {
            flush_paragraph(&mut blocks, &mut paragraph);
            let inlines = parse_inlines(item);
            match blocks.last_mut() {
                Some(Block::List(items)) => items.push(inlines),
                _ => blocks.push(Block::List(vec![inlines])),
            }
            continue;
        }

        paragraph.push(parse_inlines(line.trim()));
    }
    flush_paragraph(&mut blocks, &mut paragraph);
    blocks
}

fn heading_text(line: &str) -> Option<&str> {
    line.strip_prefix("## ").map(str::trim)
}

fn list_item_text(line: &str) -> Option<&str> {
    let trimmed = line.trim_start();
    if let Some(rest) = trimmed.strip_prefix("* ").or_else(|| trimmed.strip_prefix("- ")) {
        return Some(rest.trim());
    }
    // numbered lines ("1. item") are demoted to bullets
    let digits = trimmed.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits > 0 {
        if let Some(rest) = trimmed[digits..].strip_prefix(". ") {
            return Some(rest.trim());
        }
    }
    None
}

/// Scan a single line for `**bold**` spans and `[label](url)` links.
fn parse_inlines(text: &str) -> Vec<Inline> {
    let mut inlines = Vec::new();
    let mut plain = String::new();
    let chars: Vec<char> = text.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        if chars[i] == '*' && i + 1 < chars.len() && chars[i + 1] == '*' {
            if let Some(end) = find_seq(&chars, i + 2, &['*', '*']) {
                if end > i + 2 {
                    push_plain(&mut inlines, &mut plain);
                    inlines.push(Inline::Bold(chars[i + 2..end].iter().collect()));
                    i = end + 2;
                    continue;
                }
            }
        }
        if chars[i] == '[' {
            if let Some(close) = find_seq(&chars, i + 1, &[']']) {
                if close + 1 < chars.len() && chars[close + 1] == '(' {
                    if let Some(paren) = find_seq(&chars, close + 2, &[')']) {
                        push_plain(&mut inlines, &mut plain);
                        inlines.push(Inline::Link {
                            label: chars[i + 1..close].iter().collect(),
                            url: chars[close + 2..paren].iter().collect(),
                        });
                        i = paren + 1;
                        continue;
                    }
                }
            }
        }
        plain.push(chars[i]);
        i += 1;
    }
    push_plain(&mut inlines, &mut plain);
    inlines
}

fn push_plain(inlines: &mut Vec<Inline>, plain: &mut String) {
    if !plain.is_empty() {
        inlines.push(Inline::Text(std::mem::take(plain)));
    }
}

fn find_seq(chars: &[char], from: usize, needle: &[char]) -> Option<usize> {
    (from..chars.len().saturating_sub(needle.len() - 1))
        .find(|&i| chars[i..i + needle.len()] == *needle)
}

// ── HTML rendering ──────────────────────────────────────────────────────────

/// Render report markdown as HTML fragments: `##` → `<h3>`, bold →
/// `<strong>`, links → new-tab anchors, merged `<ul>` lists, `<p>` blocks
/// with `<br>` for intra-paragraph newlines.
pub fn to_html(input: &str) -> String {
    let mut out = String::new();
    for block in parse(input) {
        match block {
            Block::Heading(inlines) => {
                out.push_str("<h3>");
                render_inlines_html(&mut out, &inlines);
                out.push_str("</h3>\n");
            }
            Block::List(items) => {
                out.push_str("<ul>\n");
                for item in items {
                    out.push_str("<li>");
                    render_inlines_html(&mut out, &item);
                    out.push_str("</li>\n");
                }
                out.push_str("</ul>\n");
            }
            Block::Paragraph(lines) => {
                out.push_str("<p>");
                for (i, line) in lines.iter().enumerate() {
                    if i > 0 {
                        out.push_str("<br>");
                    }
                    render_inlines_html(&mut out, line);
                }
                out.push_str("</p>\n");
            }
        }
    }
    out
}

fn render_inlines_html(out: &mut String, inlines: &[Inline]) {
    for inline in inlines {
        match inline {
            Inline::Text(t) => out.push_str(&escape_html(t)),
            Inline::Bold(t) => {
                out.push_str("<strong>");
                out.push_str(&escape_html(t));
                out.push_str("</strong>");
            }
            Inline::Link { label, url } => {
                out.push_str(&format!(
                    "<a href=\"{}\" target=\"_blank\" rel=\"noopener\">{}</a>",
                    escape_html(url),
                    escape_html(label)
                ));
            }
        }
    }
}

pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

// ── Terminal rendering ──────────────────────────────────────────────────────

/// Render report markdown as styled lines for the report pane.
pub fn to_text(input: &str) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    for block in parse(input) {
        match block {
            Block::Heading(inlines) => {
                if !lines.is_empty() {
                    lines.push(Line::default());
                }
                let mut spans = vec![];
                render_inlines_text(&mut spans, &inlines, heading_style());
                lines.push(Line::from(spans));
            }
            Block::List(items) => {
                for item in items {
                    let mut spans = vec![Span::styled("  • ", Style::default().fg(Color::Cyan))];
                    render_inlines_text(&mut spans, &item, Style::default());
                    lines.push(Line::from(spans));
                }
                lines.push(Line::default());
            }
            Block::Paragraph(para) => {
                for line in para {
                    let mut spans = vec![];
                    render_inlines_text(&mut spans, &line, Style::default());
                    lines.push(Line::from(spans));
                }
                lines.push(Line::default());
            }
        }
    }
    while lines.last().is_some_and(|l| l.spans.is_empty()) {
        lines.pop();
    }
    lines
}

fn heading_style() -> Style {
    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
}

fn render_inlines_text(spans: &mut Vec<Span<'static>>, inlines: &[Inline], base: Style) {
    for inline in inlines {
        match inline {
            Inline::Text(t) => spans.push(Span::styled(t.clone(), base)),
            Inline::Bold(t) => spans.push(Span::styled(
                t.clone(),
                base.add_modifier(Modifier::BOLD),
            )),
            Inline::Link { label, url } => {
                spans.push(Span::styled(
                    label.clone(),
                    base.fg(Color::Blue).add_modifier(Modifier::UNDERLINED),
                ));
                spans.push(Span::styled(
                    format!(" ({})", url),
                    Style::default().fg(Color::DarkGray),
                ));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heading_then_single_list() {
        let html = to_html("## Title\n\n* a\n* b");
        assert_eq!(
            html,
            "<h3>Title</h3>\n<ul>\n<li>a</li>\n<li>b</li>\n</ul>\n"
        );
        assert_eq!(html.matches("<ul>").count(), 1);
    }

    #[test]
    fn test_adjacent_lists_merge_across_blank_lines() {
        let blocks = parse("* a\n* b\n\n* c");
        assert_eq!(blocks.len(), 1);
        match &blocks[0] {
            Block::List(items) => assert_eq!(items.len(), 3),
            other => panic!("expected a single list, got {:?}", other),
        }
    }

    #[test]
    fn test_numbered_items_become_bullets() {
        let html = to_html("1. first\n2. second");
        assert_eq!(html, "<ul>\n<li>first</li>\n<li>second</li>\n</ul>\n");
        assert!(!html.contains("<ol>"));
    }

    #[test]
    fn test_bold_and_links() {
        let html = to_html("The **S&P 500** rallied - [Source](https://example.com/a?x=1)");
        assert!(html.contains("<strong>S&amp;P 500</strong>"));
        assert!(html.contains(
            "<a href=\"https://example.com/a?x=1\" target=\"_blank\" rel=\"noopener\">Source</a>"
        ));
    }

    #[test]
    fn test_paragraph_breaks_and_line_breaks() {
        let html = to_html("first line\nsecond line\n\nnew paragraph");
        assert_eq!(
            html,
            "<p>first line<br>second line</p>\n<p>new paragraph</p>\n"
        );
    }

    #[test]
    fn test_unclosed_bold_is_plain_text() {
        let blocks = parse("a **dangling marker");
        assert_eq!(
            blocks,
            vec![Block::Paragraph(vec![vec![Inline::Text(
                "a **dangling marker".to_string()
            )]])]
        );
    }

    #[test]
    fn test_list_closed_by_paragraph() {
        let blocks = parse("* a\n\nparagraph\n\n* b");
        assert_eq!(blocks.len(), 3);
        assert!(matches!(blocks[0], Block::List(_)));
        assert!(matches!(blocks[1], Block::Paragraph(_)));
        assert!(matches!(blocks[2], Block::List(_)));
    }

    #[test]
    fn test_terminal_rendering_has_bullets_and_heading() {
        let lines = to_text("## Summary\n\n* one\n* two");
        let flat: Vec<String> = lines
            .iter()
            .map(|l| l.spans.iter().map(|s| s.content.as_ref()).collect())
            .collect();
        assert_eq!(flat[0], "Summary");
        assert!(flat.iter().filter(|l| l.starts_with("  • ")).count() == 2);
    }
}
