//! Doc-comment extractor: a line-by-line scanner over a VB source file.
//!
//! Collects `'''` comment lines and pairs them with the `Function`/`Sub`
//! declaration that follows. Comment runs that end without a declaration
//! become module-level blocks.

use super::signature;
use crate::model::DocBlock;
use regex::Regex;
use std::io::{self, BufRead};
use std::sync::LazyLock;

// -- Regex patterns -----------------------------------------------------------

static RE_SIGNATURE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"^[[:blank:]]*",
        r"(?:(?:Public|Private|Friend|Protected|Protected[[:blank:]]+Friend|Private[[:blank:]]+Protected)[[:blank:]]+)?",
        r"(?:Function|Sub)[[:blank:]]+\w+[[:blank:]]*\(.*\)"
    ))
    .unwrap()
});

const COMMENT_MARKER: &str = "'''";
const CONTINUATION: &str = " _";
/// Byte-order mark Visual Studio writes at the start of source files.
const BOM: char = '\u{FEFF}';

// -- Scanner state ------------------------------------------------------------

#[derive(Default)]
struct ScanState {
    /// Comment text waiting for a declaration
    pending: String,
    /// Physical lines joined by ` _` continuations
    continued: String,
}

impl ScanState {
    fn process_line(&mut self, raw: &str) -> Option<DocBlock> {
        let line = raw.trim_end();
        let line = line.strip_prefix(BOM).unwrap_or(line);

        // Join `... _` continuations into one logical line, comments excluded
        if !line.trim_start().starts_with('\'') {
            if let Some(head) = line.strip_suffix(CONTINUATION) {
                self.continued.push_str(head.trim_end());
                self.continued.push(' ');
                return None;
            }
        }
        let logical;
        let line = if self.continued.is_empty() {
            line
        } else {
            logical = format!("{}{}", std::mem::take(&mut self.continued), line.trim_start());
            logical.as_str()
        };

        // 1. Declaration line
        if RE_SIGNATURE.is_match(line) {
            let comment = std::mem::take(&mut self.pending);
            return Some(DocBlock::function_level(comment, signature::strip_comment(line)));
        }

        // 2. Doc comment line
        if let Some(text) = line.trim_start().strip_prefix(COMMENT_MARKER) {
            let text = text.strip_prefix(' ').unwrap_or(text);
            concat_str(&mut self.pending, text);
            return None;
        }

        // 3. Anything else closes an open comment run
        self.flush()
    }

    fn flush(&mut self) -> Option<DocBlock> {
        if self.pending.is_empty() {
            return None;
        }
        Some(DocBlock::module_level(std::mem::take(&mut self.pending)))
    }
}

/// Concatenate strings with a newline separator.
fn concat_str(dest: &mut String, text: &str) {
    if !dest.is_empty() {
        dest.push('\n');
    }
    dest.push_str(text);
}

// -- Public API ---------------------------------------------------------------

/// Lazy, single-pass stream of [`DocBlock`]s read from `reader`.
pub struct DocBlocks<R> {
    lines: io::Lines<R>,
    state: ScanState,
    finished: bool,
}

/// Start scanning `reader` for doc blocks.
pub fn doc_blocks<R: BufRead>(reader: R) -> DocBlocks<R> {
    DocBlocks {
        lines: reader.lines(),
        state: ScanState::default(),
        finished: false,
    }
}

impl<R: BufRead> Iterator for DocBlocks<R> {
    type Item = io::Result<DocBlock>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        loop {
            match self.lines.next() {
                Some(Ok(line)) => {
                    if let Some(block) = self.state.process_line(&line) {
                        return Some(Ok(block));
                    }
                }
                Some(Err(e)) => {
                    self.finished = true;
                    return Some(Err(e));
                }
                None => {
                    self.finished = true;
                    return self.state.flush().map(Ok);
                }
            }
        }
    }
}

/// Scan an in-memory source text.
pub fn parse(input: &str) -> Vec<DocBlock> {
    let mut state = ScanState::default();
    let mut blocks: Vec<DocBlock> = input
        .lines()
        .filter_map(|line| state.process_line(line))
        .collect();
    blocks.extend(state.flush());
    blocks
}
