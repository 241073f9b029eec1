//! reStructuredText rendering.

pub mod rst;

use unicode_width::UnicodeWidthChar;

/// Column width of `text` as a terminal or reST parser sees it: East-Asian
/// wide and fullwidth characters take two columns, everything else one.
pub fn display_width(text: &str) -> usize {
    text.chars()
        .map(|c| if c.width() == Some(2) { 2 } else { 1 })
        .sum()
}

/// Section heading with an underline matching the title's display width.
pub fn heading(title: &str, underline: char) -> String {
    let rule: String = std::iter::repeat(underline)
        .take(display_width(title))
        .collect();
    format!("{}\n{}\n", title, rule)
}

/// Label target line, e.g. `.. _module1.add:`.
pub fn label_target(label: &str) -> String {
    format!(".. _{}:\n", label)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_heading() {
        assert_eq!(heading("Test", '-'), "Test\n----\n");
    }

    #[test]
    fn fullwidth_heading_doubles_underline() {
        assert_eq!(heading("テスト", '-'), "テスト\n------\n");
    }

    #[test]
    fn mixed_width() {
        assert_eq!(display_width("Module１"), 8);
        assert_eq!(display_width("モジュールA"), 11);
    }
}
