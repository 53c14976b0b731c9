use regex::{Captures, Regex};
use std::borrow::Cow;
use std::sync::LazyLock;

// Compile regex once, reuse across calls
static MARKDOWN_LINK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[([^\]\n]+)\]\(([^)\n]+)\)").unwrap()
});

static WIKILINK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[\[([^\[\]\n|#]+)(?:#([^\[\]\n|]+))?(?:\|([^\[\]\n]+))?\]\]").unwrap()
});

// Looser forms used only to flatten link markup inside titles
static ANY_WIKILINK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"!?\[\[([^\[\]\n]+)\]\]").unwrap()
});

static ANY_MARKDOWN_LINK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"!?\[([^\]\n]*)\]\(([^)\n]*)\)").unwrap()
});

static FENCED_CODE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```[^\n]*\n.*?```|~~~[^\n]*\n.*?~~~").unwrap()
});

static INLINE_CODE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"`[^`]*`").unwrap()
});

/// The two link syntaxes the engine rewrites.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LinkKind {
    /// `[display](target)`
    Markdown,
    /// `[[target#anchor|display]]`
    Wiki,
}

/// One link found while scanning a document's text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LinkOccurrence {
    pub kind: LinkKind,
    /// Byte offset of the opening `[`
    pub start: usize,
    /// Byte offset just past the closing `)` or `]]`
    pub end: usize,
    pub display: Option<String>,
    /// Target as written in the text, e.g. `"my%20note.md#part"` or `"folder/note2"`
    pub raw_target: String,
    /// Reference to resolve: percent-decoded and without `#fragment` for markdown
    /// links, the path before `#`/`|` for wikilinks
    pub target: String,
    /// Wikilink sub-heading or block reference (the part after `#`)
    pub anchor: Option<String>,
}

impl LinkOccurrence {
    pub fn has_anchor(&self) -> bool {
        self.anchor.is_some()
    }
}

/// Build a set of byte ranges that are inside code blocks or inline code.
fn build_excluded_ranges(markdown: &str) -> Vec<(usize, usize)> {
    let mut ranges = Vec::new();
    for m in FENCED_CODE_RE.find_iter(markdown) {
        ranges.push((m.start(), m.end()));
    }
    for m in INLINE_CODE_RE.find_iter(markdown) {
        ranges.push((m.start(), m.end()));
    }
    ranges
}

/// Returns true if the byte offset falls within any excluded range.
fn is_excluded(offset: usize, excluded: &[(usize, usize)]) -> bool {
    excluded.iter().any(|&(start, end)| offset >= start && offset < end)
}

/// Percent-decode a markdown link target and drop any `#fragment`.
/// Falls back to the raw target if it is not valid percent-encoding.
fn normalize_markdown_target(raw: &str) -> String {
    let decoded = urlencoding::decode(raw)
        .map(Cow::into_owned)
        .unwrap_or_else(|_| raw.to_string());
    match decoded.find('#') {
        Some(idx) => decoded[..idx].to_string(),
        None => decoded,
    }
}

/// Extract rewritable markdown links (`[display](target)`) from the text.
///
/// Skips image embeds (`![alt](src)`), checkbox markers caught by the pattern
/// (`[ ](...)`, `[x](...)`), same-document anchors (`[Top](#top)`), and anything
/// inside code blocks or inline code.
pub fn extract_markdown_links(markdown: &str) -> Vec<LinkOccurrence> {
    let excluded = build_excluded_ranges(markdown);
    let bytes = markdown.as_bytes();
    let mut occurrences = Vec::new();

    for cap in MARKDOWN_LINK_RE.captures_iter(markdown) {
        let full_match = cap.get(0).unwrap();
        let start = full_match.start();

        if start > 0 && bytes[start - 1] == b'!' {
            continue;
        }
        if full_match.as_str().starts_with("[ ]") || full_match.as_str().starts_with("[x]") {
            continue;
        }
        if is_excluded(start, &excluded) {
            continue;
        }

        let raw_target = &cap[2];
        let target = normalize_markdown_target(raw_target);
        if target.is_empty() {
            continue;
        }

        occurrences.push(LinkOccurrence {
            kind: LinkKind::Markdown,
            start,
            end: full_match.end(),
            display: Some(cap[1].to_string()),
            raw_target: raw_target.to_string(),
            target,
            anchor: None,
        });
    }

    occurrences
}

/// Extract wikilinks (`[[path#anchor|display]]`) from the text, anchored ones
/// included. Skips embeds (`![[...]]`) and anything inside code blocks or
/// inline code.
pub fn extract_wikilinks(markdown: &str) -> Vec<LinkOccurrence> {
    let excluded = build_excluded_ranges(markdown);
    let bytes = markdown.as_bytes();
    let mut occurrences = Vec::new();

    for cap in WIKILINK_RE.captures_iter(markdown) {
        let full_match = cap.get(0).unwrap();
        let start = full_match.start();
        if start > 0 && bytes[start - 1] == b'!' {
            continue;
        }
        if is_excluded(start, &excluded) {
            continue;
        }

        let path = &cap[1];
        if path.trim().is_empty() {
            continue;
        }

        let inner_end = cap
            .get(2)
            .map(|m| m.end())
            .unwrap_or_else(|| cap.get(1).unwrap().end());

        occurrences.push(LinkOccurrence {
            kind: LinkKind::Wiki,
            start,
            end: full_match.end(),
            display: cap.get(3).map(|m| m.as_str().to_string()),
            raw_target: markdown[cap.get(1).unwrap().start()..inner_end].to_string(),
            target: path.to_string(),
            anchor: cap.get(2).map(|m| m.as_str().to_string()),
        });
    }

    occurrences
}

/// `[display](target)`
///
/// `display` is inserted verbatim. A `]` or newline in it yields text that no
/// longer parses as a link.
pub fn format_markdown_link(display: &str, raw_target: &str) -> String {
    format!("[{}]({})", display, raw_target)
}

/// `[[path|display]]`, or `[[path]]` without display text.
///
/// Neither part is escaped. A `[`, `]` or newline in `display` breaks the link.
pub fn format_wikilink(path: &str, display: Option<&str>) -> String {
    match display {
        Some(display) => format!("[[{}|{}]]", path, display),
        None => format!("[[{}]]", path),
    }
}

/// Reduce any link markup in `text` to its visible text.
///
/// `[[a|b]]` becomes `b`, `[[a#h]]` becomes `a#h`, `[b](a)` becomes `b`.
pub fn strip_link_markup(text: &str) -> Cow<'_, str> {
    if !text.contains('[') {
        return Cow::Borrowed(text);
    }

    let without_wikilinks = ANY_WIKILINK_RE.replace_all(text, |cap: &Captures| {
        let inner = &cap[1];
        match inner.find('|') {
            Some(pipe_idx) => inner[pipe_idx + 1..].to_string(),
            None => inner.to_string(),
        }
    });
    let stripped = ANY_MARKDOWN_LINK_RE.replace_all(&without_wikilinks, "$1");
    Cow::Owned(stripped.into_owned())
}

/// A text edit: replace `remove_len` bytes at `offset` with `insert_text`.
#[derive(Debug, PartialEq, Eq)]
pub struct TextEdit {
    /// Byte offset in source
    pub offset: usize,
    /// Number of bytes to remove
    pub remove_len: usize,
    /// Replacement text
    pub insert_text: String,
}

impl TextEdit {
    /// Replace the whole span of `occurrence`.
    pub fn replace(occurrence: &LinkOccurrence, insert_text: String) -> Self {
        Self {
            offset: occurrence.start,
            remove_len: occurrence.end - occurrence.start,
            insert_text,
        }
    }
}

/// Apply non-overlapping edits to a snapshot, producing a new string.
/// Edits are applied in reverse offset order so earlier offsets stay valid.
pub fn apply_edits(source: &str, mut edits: Vec<TextEdit>) -> String {
    edits.sort_by(|a, b| b.offset.cmp(&a.offset));
    let mut text = source.to_string();
    for edit in &edits {
        text.replace_range(edit.offset..edit.offset + edit.remove_len, &edit.insert_text);
    }
    text
}
