use crate::types::{DocNode, FormValues};
use tracing::trace;

/// Collect `sid → value text` for every `tag` element under `section`, in
/// document order. Elements without a `sid` are skipped; an element without a
/// `value` child maps to the empty string.
pub fn extract_values(section: &DocNode, tag: &str) -> FormValues {
    let mut values = FormValues::new();
    for node in section.descendants(tag) {
        let Some(sid) = node.attr("sid") else {
            trace!(tag, "skipping element without sid");
            continue;
        };
        let value = node
            .first_descendant("value")
            .map(DocNode::text)
            .unwrap_or_default();
        values.insert(sid, value);
    }
    values
}

/// Characters that end a line besides `\n` and `\r`: vertical tab, form
/// feed, the file/group/record separators, NEL and the Unicode line and
/// paragraph separators.
const OTHER_LINE_BREAKS: [char; 8] = [
    '\u{0b}', '\u{0c}', '\u{1c}', '\u{1d}', '\u{1e}', '\u{85}', '\u{2028}', '\u{2029}',
];

/// Split field text into lines. `\r\n` counts as one break.
/// Empty text has no lines; a trailing terminator adds no empty line.
pub fn split_lines(text: &str) -> Vec<&str> {
    let mut lines = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        let is_break = c == '\n' || c == '\r' || OTHER_LINE_BREAKS.contains(&c);
        if !is_break {
            continue;
        }
        lines.push(&text[start..i]);
        start = i + c.len_utf8();
        if c == '\r' {
            if let Some(&(j, '\n')) = chars.peek() {
                chars.next();
                start = j + 1;
            }
        }
    }
    if start < text.len() {
        lines.push(&text[start..]);
    }
    lines
}
