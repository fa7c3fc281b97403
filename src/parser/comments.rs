//! Documentation comments
//!
//! Comments are not part of the parse tree. The parser collects them in
//! source order, and [`ParseResult::comment_for`] binds them to declarations
//! afterwards:
//!
//! - a comment on the line directly above a declaration documents it, unless
//!   another declaration of the same scope also ends on that line;
//! - a comment starting on the declaration's own line always documents it.

use super::ast::{ParseResult, SymbolId};

impl ParseResult {
    /// Sanitized text of the comment documenting `id`, if any.
    pub fn comment_for(&self, id: SymbolId) -> Option<String> {
        let symbol = self.symbol(id);
        let start_line = symbol.range.start.line;
        let line_above = start_line.checked_sub(1);
        let crowded = line_above.is_some_and(|line| {
            self.siblings(id)
                .any(|sibling| self.symbol(sibling).range.end.line == line)
        });

        for comment in &self.comments {
            if comment.range.end.line > symbol.range.end.line {
                break;
            }
            if !crowded && Some(comment.range.end.line) == line_above {
                return Some(sanitize_comment(&comment.text));
            }
            if comment.range.start.line == start_line {
                return Some(sanitize_comment(&comment.text));
            }
        }

        None
    }

    /// Declarations sharing a scope with `id`, plus a struct's own members.
    fn siblings(&self, id: SymbolId) -> impl Iterator<Item = SymbolId> + '_ {
        let symbol = self.symbol(id);
        let outer = symbol.scope.map(|scope| self.scope(scope));
        let inner = symbol
            .inner_scope()
            .filter(|_| self.type_name(id) == Some("struct"))
            .map(|scope| self.scope(scope));

        outer
            .into_iter()
            .chain(inner)
            .flat_map(|scope| scope.definitions.values().copied())
            .filter(move |sibling| *sibling != id && self.symbol(*sibling).is_declaration())
    }
}

/// Strip comment markers and surrounding whitespace.
///
/// Block comments also lose the leading ` *` decoration of every line.
pub fn sanitize_comment(text: &str) -> String {
    let is_block = text.starts_with("/*");
    let text = strip_markers(text);

    if is_block {
        text.lines()
            .map(|line| line.trim_start_matches(|c: char| c == ' ' || c == '*'))
            .collect::<Vec<_>>()
            .join("\n")
            .trim()
            .to_string()
    } else {
        text.trim().to_string()
    }
}

/// Remove every `/*`, `*/` and `//`, scanning left to right.
fn strip_markers(text: &str) -> String {
    let mut stripped = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(ch) = rest.chars().next() {
        match ["/*", "*/", "//"].iter().find(|marker| rest.starts_with(**marker)) {
            Some(marker) => rest = &rest[marker.len()..],
            None => {
                stripped.push(ch);
                rest = &rest[ch.len_utf8()..];
            }
        }
    }

    stripped
}
