//! XML doc-comment model.
//!
//! Doc comments use the .NET XML documentation shape:
//!
//! ```text
//! <summary>Adds two numbers</summary>
//! <param name="a">First operand</param>
//! <returns>The sum</returns>
//! ```
//!
//! The comment text is wrapped in a synthetic root element and parsed with
//! `quick-xml`; each top-level element becomes one field.

use crate::error::{Error, Result};
use super::{indent_width, strip_indent};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

/// Tags whose `name` attribute names a parameter.
pub const PARAM_TAGS: &[&str] = &["param", "parameter", "arg", "argument"];

/// Tags describing the return value.
pub const RETURN_TAGS: &[&str] = &["returns", "return"];

/// Field name to text content, in the order fields first appeared.
///
/// Keys are bare tag names (`summary`) or `"<tag> <name>"` for elements
/// carrying a `name` attribute (`param a`). Repeated `remarks` concatenate
/// with a newline; any other repeated key keeps the last value.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FieldMap {
    entries: Vec<(String, String)>,
}

impl FieldMap {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn insert(&mut self, key: String, value: String) {
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((k, existing)) if k == "remarks" => {
                existing.push('\n');
                existing.push_str(&value);
            }
            Some((_, existing)) => *existing = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Parameter fields as `(parameter name, text)` in encounter order.
    pub fn params(&self) -> impl Iterator<Item = (&str, &str)> {
        self.iter().filter_map(|(key, value)| {
            let (tag, name) = key.split_once(' ')?;
            PARAM_TAGS.contains(&tag).then_some((name, value))
        })
    }

    /// Text of the `returns` (or `return`) field.
    pub fn returns(&self) -> Option<&str> {
        RETURN_TAGS.iter().find_map(|tag| self.get(tag))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Inline element open inside a field.
enum Inline {
    Code,
    /// `<see cref="...">text</see>`: byte offset where the link text starts
    See { cref: String, start: usize },
    Other,
}

/// Parse doc-comment text into a [`FieldMap`].
pub fn parse_fields(text: &str) -> Result<FieldMap> {
    let wrapped = format!("<root>{}</root>", text);
    let mut reader = Reader::from_str(&wrapped);
    let malformed = |reason: String| Error::doc_comment(text, reason);

    let mut fields = FieldMap::default();
    // 1 = inside the synthetic root, 2 = inside a field element
    let mut depth = 0usize;
    let mut current: Option<(String, String)> = None;
    let mut inline: Vec<Inline> = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                depth += 1;
                if depth == 2 {
                    current = Some((field_key(&e).map_err(malformed)?, String::new()));
                } else if let Some((_, content)) = current.as_mut() {
                    inline.push(open_inline(&e, content).map_err(malformed)?);
                }
            }
            Ok(Event::Empty(e)) => {
                if depth == 1 {
                    fields.insert(field_key(&e).map_err(malformed)?, String::new());
                } else if let Some((_, content)) = current.as_mut() {
                    content.push_str(&empty_inline(&e).map_err(malformed)?);
                }
            }
            Ok(Event::End(_)) => {
                if depth == 2 {
                    if let Some((key, content)) = current.take() {
                        fields.insert(key, clean_text(&content));
                    }
                } else if let (Some(open), Some((_, content))) = (inline.pop(), current.as_mut()) {
                    close_inline(open, content);
                }
                depth = depth.saturating_sub(1);
            }
            Ok(Event::Text(t)) => {
                let unescaped = t.unescape().map_err(|e| malformed(e.to_string()))?;
                if let Some((_, content)) = current.as_mut() {
                    content.push_str(&unescaped);
                }
            }
            Ok(Event::CData(c)) => {
                if let Some((_, content)) = current.as_mut() {
                    content.push_str(&String::from_utf8_lossy(&c.into_inner()));
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(malformed(e.to_string())),
            Ok(_) => {}
        }
    }

    if depth != 0 {
        return Err(malformed("unclosed element".to_string()));
    }
    Ok(fields)
}

fn tag_name(e: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(e.name().as_ref()).into_owned()
}

fn attribute(e: &BytesStart<'_>, name: &str) -> std::result::Result<Option<String>, String> {
    match e.try_get_attribute(name).map_err(|err| err.to_string())? {
        Some(attr) => Ok(Some(
            attr.unescape_value()
                .map_err(|err| err.to_string())?
                .into_owned(),
        )),
        None => Ok(None),
    }
}

/// Map key for a top-level element.
fn field_key(e: &BytesStart<'_>) -> std::result::Result<String, String> {
    let tag = tag_name(e);
    Ok(match attribute(e, "name")? {
        Some(name) => format!("{} {}", tag, name),
        None => tag,
    })
}

fn open_inline(e: &BytesStart<'_>, content: &mut String) -> std::result::Result<Inline, String> {
    Ok(match tag_name(e).as_str() {
        "c" => {
            content.push_str("``");
            Inline::Code
        }
        "see" => match attribute(e, "cref")? {
            Some(cref) => Inline::See {
                cref,
                start: content.len(),
            },
            None => Inline::Other,
        },
        _ => Inline::Other,
    })
}

fn close_inline(open: Inline, content: &mut String) {
    match open {
        Inline::Code => content.push_str("``"),
        Inline::See { cref, start } => {
            let text = content.split_off(start);
            let text = text.trim();
            if text.is_empty() {
                content.push_str(&format!(":vb:func:`{}`", cref));
            } else {
                content.push_str(&format!(":vb:func:`{} <{}>`", text, cref));
            }
        }
        Inline::Other => {}
    }
}

/// Markup for a self-closing element inside a field.
fn empty_inline(e: &BytesStart<'_>) -> std::result::Result<String, String> {
    Ok(match tag_name(e).as_str() {
        "see" => attribute(e, "cref")?
            .map(|cref| format!(":vb:func:`{}`", cref))
            .unwrap_or_default(),
        "paramref" | "typeparamref" => attribute(e, "name")?
            .map(|name| format!("*{}*", name))
            .unwrap_or_default(),
        _ => String::new(),
    })
}

/// Strip the indentation comment blocks carry.
///
/// The first line is taken as-is (it follows the opening tag); the common
/// indentation of the remaining lines is removed, then leading and trailing
/// blank lines are dropped.
pub fn clean_text(text: &str) -> String {
    let lines: Vec<&str> = text.lines().map(str::trim_end).collect();
    let Some((first, rest)) = lines.split_first() else {
        return String::new();
    };

    let indent = rest
        .iter()
        .filter(|l| !l.trim().is_empty())
        .map(|l| indent_width(l))
        .min()
        .unwrap_or(0);

    let mut cleaned: Vec<&str> = Vec::with_capacity(lines.len());
    cleaned.push(first.trim_start());
    cleaned.extend(rest.iter().map(|l| strip_indent(l, indent)));

    while cleaned.first().is_some_and(|l| l.is_empty()) {
        cleaned.remove(0);
    }
    while cleaned.last().is_some_and(|l| l.is_empty()) {
        cleaned.pop();
    }
    cleaned.join("\n")
}
