//! Markdown-subset renderer with inline citation markers.
//!
//! Scan order is fixed: fenced code, blank-line paragraphs, list/line
//! classification, bold, italic, and citation markers last, so a marker inside
//! emphasis is still resolved. Unterminated delimiters stay literal text. The
//! renderer keeps no state between calls; streaming text is re-rendered whole
//! on every delta.

use crate::CitationLookup;

const FENCE: &str = "```";
const BOLD: &str = "**";
const BULLET: &str = "- ";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RenderTree {
    pub blocks: Vec<Block>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    /// Verbatim; never scanned for emphasis or citations.
    Code {
        language: Option<String>,
        code: String,
    },
    /// Lines are separated by [`Inline::LineBreak`].
    Paragraph(Vec<Inline>),
    BulletList(Vec<ListItem>),
    NumberedList(Vec<ListItem>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListItem {
    /// The number written in the source for numbered lists.
    pub number: Option<u64>,
    pub content: Vec<Inline>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inline {
    Text(String),
    Bold(Vec<Inline>),
    Italic(Vec<Inline>),
    Citation(CitationBadge),
    LineBreak,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CitationBadge {
    pub number: u32,
    /// Present when the number resolved; unresolved badges show the number only.
    pub target: Option<CitationTarget>,
}

impl CitationBadge {
    pub fn is_interactive(&self) -> bool {
        self.target.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CitationTarget {
    pub document_id: String,
    pub page: u32,
    pub snippet: String,
}

/// Renders `text`, resolving citation markers through `lookup`.
pub fn render<L: CitationLookup + ?Sized>(text: &str, lookup: &L) -> RenderTree {
    let mut blocks = Vec::new();
    for segment in split_fences(text) {
        match segment {
            Segment::Code { language, code } => blocks.push(Block::Code {
                language: language.map(str::to_string),
                code: code.to_string(),
            }),
            Segment::Prose(prose) => render_prose(prose, lookup, &mut blocks),
        }
    }
    RenderTree { blocks }
}

/// Renders a single line of inline markup (no blocks).
pub fn render_inline<L: CitationLookup + ?Sized>(text: &str, lookup: &L) -> Vec<Inline> {
    let mut out = Vec::new();
    parse_bold(text, lookup, &mut out);
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Segment<'a> {
    Prose(&'a str),
    Code {
        language: Option<&'a str>,
        code: &'a str,
    },
}

fn split_fences(text: &str) -> Vec<Segment<'_>> {
    let mut segments = Vec::new();
    let mut rest = text;
    while let Some(open) = rest.find(FENCE) {
        let body_start = open + FENCE.len();
        let Some(close) = rest[body_start..].find(FENCE) else {
            // unmatched fence: the remainder is prose
            break;
        };
        if open > 0 {
            segments.push(Segment::Prose(&rest[..open]));
        }
        segments.push(code_segment(&rest[body_start..body_start + close]));
        rest = &rest[body_start + close + FENCE.len()..];
    }
    if !rest.is_empty() {
        segments.push(Segment::Prose(rest));
    }
    segments
}

fn code_segment(body: &str) -> Segment<'_> {
    let Some(newline) = body.find('\n') else {
        return Segment::Code {
            language: None,
            code: body,
        };
    };

    let first_line = body[..newline].trim();
    let remainder = &body[newline + 1..];
    let (language, code) = if first_line.is_empty() {
        (None, remainder)
    } else if !first_line.contains(char::is_whitespace) {
        (Some(first_line), remainder)
    } else {
        (None, body)
    };

    Segment::Code {
        language,
        code: code.trim_end_matches(&['\n', '\r'][..]),
    }
}

fn render_prose<L: CitationLookup + ?Sized>(prose: &str, lookup: &L, blocks: &mut Vec<Block>) {
    for paragraph in split_paragraphs(prose) {
        let mut pending: Option<Block> = None;
        for line in paragraph {
            match classify(line) {
                LineKind::Bullet(text) => {
                    let item = ListItem {
                        number: None,
                        content: render_inline(text, lookup),
                    };
                    if let Some(Block::BulletList(items)) = pending.as_mut() {
                        items.push(item);
                    } else {
                        blocks.extend(pending.take());
                        pending = Some(Block::BulletList(vec![item]));
                    }
                }
                LineKind::Numbered(number, text) => {
                    let item = ListItem {
                        number: Some(number),
                        content: render_inline(text, lookup),
                    };
                    if let Some(Block::NumberedList(items)) = pending.as_mut() {
                        items.push(item);
                    } else {
                        blocks.extend(pending.take());
                        pending = Some(Block::NumberedList(vec![item]));
                    }
                }
                LineKind::Plain(text) => {
                    let inlines = render_inline(text, lookup);
                    if let Some(Block::Paragraph(existing)) = pending.as_mut() {
                        existing.push(Inline::LineBreak);
                        existing.extend(inlines);
                    } else {
                        blocks.extend(pending.take());
                        pending = Some(Block::Paragraph(inlines));
                    }
                }
            }
        }
        blocks.extend(pending);
    }
}

/// Groups non-blank lines; blank (or whitespace-only) lines separate groups.
fn split_paragraphs(prose: &str) -> Vec<Vec<&str>> {
    let mut paragraphs = Vec::new();
    let mut current = Vec::new();
    for line in prose.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                paragraphs.push(std::mem::take(&mut current));
            }
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        paragraphs.push(current);
    }
    paragraphs
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineKind<'a> {
    Bullet(&'a str),
    Numbered(u64, &'a str),
    Plain(&'a str),
}

fn classify(line: &str) -> LineKind<'_> {
    let trimmed = line.trim_start();
    if let Some(rest) = trimmed.strip_prefix(BULLET) {
        return LineKind::Bullet(rest.trim_end());
    }
    if let Some((number, rest)) = numbered_item(trimmed) {
        return LineKind::Numbered(number, rest.trim_end());
    }
    LineKind::Plain(line.trim())
}

/// `<digits>. rest`
fn numbered_item(line: &str) -> Option<(u64, &str)> {
    let digits = line.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }
    let rest = line[digits..].strip_prefix(". ")?;
    let number = line[..digits].parse().ok()?;
    Some((number, rest))
}

fn parse_bold<L: CitationLookup + ?Sized>(text: &str, lookup: &L, out: &mut Vec<Inline>) {
    let mut rest = text;
    while let Some(open) = rest.find(BOLD) {
        let inner_start = open + BOLD.len();
        let Some(close) = rest[inner_start..].find(BOLD) else {
            break;
        };
        if close == 0 {
            // `****` has nothing to embolden; keep the stars as text
            parse_italic(&rest[..inner_start + BOLD.len()], lookup, out);
            rest = &rest[inner_start + BOLD.len()..];
            continue;
        }

        parse_italic(&rest[..open], lookup, out);
        let mut inner = Vec::new();
        parse_bold(&rest[inner_start..inner_start + close], lookup, &mut inner);
        out.push(Inline::Bold(inner));
        rest = &rest[inner_start + close + BOLD.len()..];
    }
    parse_italic(rest, lookup, out);
}

fn parse_italic<L: CitationLookup + ?Sized>(text: &str, lookup: &L, out: &mut Vec<Inline>) {
    let stars = single_stars(text);
    let mut cursor = 0;
    for pair in stars.chunks_exact(2) {
        let (open, close) = (pair[0], pair[1]);
        parse_citations(&text[cursor..open], lookup, out);
        let mut inner = Vec::new();
        parse_citations(&text[open + 1..close], lookup, &mut inner);
        out.push(Inline::Italic(inner));
        cursor = close + 1;
    }
    parse_citations(&text[cursor..], lookup, out);
}

/// Byte offsets of `*` characters that are not part of a `**` run.
fn single_stars(text: &str) -> Vec<usize> {
    let bytes = text.as_bytes();
    (0..bytes.len())
        .filter(|&i| {
            bytes[i] == b'*'
                && (i == 0 || bytes[i - 1] != b'*')
                && bytes.get(i + 1) != Some(&b'*')
        })
        .collect()
}

fn parse_citations<L: CitationLookup + ?Sized>(text: &str, lookup: &L, out: &mut Vec<Inline>) {
    let mut rest = text;
    while let Some(open) = rest.find('[') {
        let after = &rest[open + 1..];
        let digits = after.bytes().take_while(u8::is_ascii_digit).count();
        if digits > 0 && after.as_bytes().get(digits) == Some(&b']') {
            if let Ok(number) = after[..digits].parse::<u32>() {
                push_text(out, &rest[..open]);
                out.push(Inline::Citation(badge(number, lookup)));
                rest = &after[digits + 1..];
                continue;
            }
        }
        push_text(out, &rest[..open + 1]);
        rest = after;
    }
    push_text(out, rest);
}

fn badge<L: CitationLookup + ?Sized>(number: u32, lookup: &L) -> CitationBadge {
    CitationBadge {
        number,
        target: lookup.resolve(number).map(|citation| CitationTarget {
            document_id: citation.document_id.clone(),
            page: citation.page,
            snippet: citation.snippet.clone(),
        }),
    }
}

fn push_text(out: &mut Vec<Inline>, text: &str) {
    if text.is_empty() {
        return;
    }
    if let Some(Inline::Text(existing)) = out.last_mut() {
        existing.push_str(text);
    } else {
        out.push(Inline::Text(text.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::{classify, numbered_item, single_stars, split_fences, LineKind, Segment};

    #[test]
    fn fences_split_prose_and_code() {
        let segments = split_fences("before\n```rust\nlet x = 1;\n```\nafter");
        assert_eq!(
            segments,
            vec![
                Segment::Prose("before\n"),
                Segment::Code {
                    language: Some("rust"),
                    code: "let x = 1;",
                },
                Segment::Prose("\nafter"),
            ]
        );
    }

    #[test]
    fn unmatched_fence_is_prose() {
        assert_eq!(
            split_fences("a ``` b"),
            vec![Segment::Prose("a ``` b")]
        );
    }

    #[test]
    fn inline_fence_has_no_language() {
        assert_eq!(
            split_fences("```x [1]```"),
            vec![Segment::Code {
                language: None,
                code: "x [1]",
            }]
        );
    }

    #[test]
    fn line_classification() {
        assert_eq!(classify("  - item "), LineKind::Bullet("item"));
        assert_eq!(classify("12. twelve"), LineKind::Numbered(12, "twelve"));
        assert_eq!(classify("12.no space"), LineKind::Plain("12.no space"));
        assert_eq!(classify("-dash"), LineKind::Plain("-dash"));
        assert_eq!(numbered_item("3.14 is pi"), None);
    }

    #[test]
    fn double_stars_are_not_single() {
        assert_eq!(single_stars("*a* **b** *"), vec![0, 2, 10]);
    }
}
