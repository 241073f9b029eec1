//! Parsers for VB sources: doc-comment extraction, declaration
//! decomposition and XML doc fields.

pub mod extract;
pub mod signature;
pub mod xmldoc;

/// Number of leading whitespace characters (not bytes) in `line`.
pub(crate) fn indent_width(line: &str) -> usize {
    line.chars().take_while(|c| c.is_whitespace()).count()
}

/// Drop up to `width` leading whitespace characters from `line`.
pub(crate) fn strip_indent(line: &str, width: usize) -> &str {
    let cut = line
        .char_indices()
        .take_while(|(_, c)| c.is_whitespace())
        .take(width)
        .last()
        .map(|(i, c)| i + c.len_utf8())
        .unwrap_or(0);
    &line[cut..]
}
