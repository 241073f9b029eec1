//! Splits a raw VB declaration into its parts.
//!
//! `Public Function Add(ByVal a As Integer, ByVal b As Integer) As Integer`
//! becomes access `Public`, kind `Function`, name `Add`, two typed
//! parameters and return type `Integer`. Each step is a separate function
//! so edge cases can be exercised on their own.

use crate::error::{Error, Result};
use crate::model::{AccessModifier, Declaration, Parameter, Passing, ProcKind};

/// The three textual zones of a declaration.
#[derive(Debug, PartialEq, Eq)]
pub struct Zones<'a> {
    /// Everything before the parameter list
    pub head: &'a str,
    /// Text between the outer parentheses, if present
    pub params: Option<&'a str>,
    /// Everything after the parameter list
    pub tail: &'a str,
}

/// Decompose a declaration string into a [`Declaration`].
pub fn decompose(raw: &str) -> Result<Declaration> {
    let raw = strip_comment(raw);
    let zones = split_zones(raw)?;
    let (access, kind, name) = parse_head(zones.head, raw)?;
    let parameters = match zones.params {
        Some(list) => parse_params(list, raw)?,
        None => Vec::new(),
    };
    let return_type = parse_return(zones.tail, kind, raw)?;

    Ok(Declaration {
        access,
        kind,
        name,
        parameters,
        return_type,
    })
}

/// Drop a trailing `'` comment that sits outside string literals.
pub fn strip_comment(raw: &str) -> &str {
    let mut in_string = false;
    for (i, c) in raw.char_indices() {
        match c {
            '"' => in_string = !in_string,
            '\'' if !in_string => return raw[..i].trim(),
            _ => {}
        }
    }
    raw.trim()
}

/// Split `raw` at the outermost parameter list.
///
/// Without parentheses the head runs up to the first ` As `.
pub fn split_zones(raw: &str) -> Result<Zones<'_>> {
    let raw = raw.trim();
    let Some(open) = raw.find('(') else {
        return Ok(match raw.find(" As ") {
            Some(pos) => Zones {
                head: &raw[..pos],
                params: None,
                tail: &raw[pos..],
            },
            None => Zones {
                head: raw,
                params: None,
                tail: "",
            },
        });
    };

    let close = matching_paren(raw, open)
        .ok_or_else(|| Error::signature(raw, "unbalanced parentheses"))?;
    Ok(Zones {
        head: &raw[..open],
        params: Some(&raw[open + 1..close]),
        tail: &raw[close + 1..],
    })
}

/// Byte index of the `)` closing the `(` at `open`. Quoted strings are skipped.
fn matching_paren(text: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    for (i, c) in text.char_indices().skip_while(|(i, _)| *i < open) {
        match c {
            '"' => in_string = !in_string,
            '(' if !in_string => depth += 1,
            ')' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Parse the head zone into access modifier, kind and name.
pub fn parse_head(head: &str, raw: &str) -> Result<(AccessModifier, ProcKind, String)> {
    let tokens: Vec<&str> = head.split_whitespace().collect();
    let (access, consumed) = parse_access(&tokens);
    let rest = &tokens[consumed..];

    let kind = match rest.first() {
        Some(&"Function") => ProcKind::Function,
        Some(&"Sub") => ProcKind::Sub,
        Some(other) => {
            return Err(Error::signature(
                raw,
                format!("expected `Function` or `Sub`, found `{}`", other),
            ))
        }
        None => return Err(Error::signature(raw, "missing `Function` or `Sub` keyword")),
    };

    let name = match &rest[1..] {
        [] => return Err(Error::signature(raw, "missing function name")),
        [name] => *name,
        [_, extra, ..] => {
            return Err(Error::signature(raw, format!("unexpected `{}` after name", extra)))
        }
    };
    if !name.chars().all(|c| c.is_alphanumeric() || c == '_') {
        return Err(Error::signature(raw, format!("invalid function name `{}`", name)));
    }

    Ok((access, kind, name.to_string()))
}

/// Match the longest access modifier at the start of `tokens`.
/// Returns the modifier and the number of tokens it used.
fn parse_access(tokens: &[&str]) -> (AccessModifier, usize) {
    match tokens {
        ["Protected", "Friend", ..] => (AccessModifier::ProtectedFriend, 2),
        ["Private", "Protected", ..] => (AccessModifier::PrivateProtected, 2),
        ["Public", ..] => (AccessModifier::Public, 1),
        ["Private", ..] => (AccessModifier::Private, 1),
        ["Friend", ..] => (AccessModifier::Friend, 1),
        ["Protected", ..] => (AccessModifier::Protected, 1),
        _ => (AccessModifier::None, 0),
    }
}

/// Parse the text between the parentheses.
pub fn parse_params(list: &str, raw: &str) -> Result<Vec<Parameter>> {
    if list.trim().is_empty() {
        return Ok(Vec::new());
    }
    split_params(list)
        .into_iter()
        .map(|entry| parse_param(entry, raw))
        .collect()
}

/// Split a parameter list on top-level commas.
///
/// Commas inside quotes or nested parentheses (`= Array(1, 2)`) do not split.
pub fn split_params(list: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut in_string = false;
    let mut start = 0;
    for (i, c) in list.char_indices() {
        match c {
            '"' => in_string = !in_string,
            '(' if !in_string => depth += 1,
            ')' if !in_string => depth = depth.saturating_sub(1),
            ',' if !in_string && depth == 0 => {
                parts.push(list[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(list[start..].trim());
    parts
}

/// Parse one parameter entry such as `Optional ByVal count As Long = 10`.
pub fn parse_param(entry: &str, raw: &str) -> Result<Parameter> {
    let Some((decl, typed)) = entry.split_once(" As ") else {
        return Err(Error::signature(
            raw,
            format!("parameter `{}` has no `As Type` clause", entry),
        ));
    };

    let (ty, default) = match typed.split_once('=') {
        Some((ty, default)) => (ty.trim(), Some(default.trim().to_string())),
        None => (typed.trim(), None),
    };
    if ty.is_empty() {
        return Err(Error::signature(raw, format!("parameter `{}` has an empty type", entry)));
    }

    let mut param = Parameter {
        ty: ty.to_string(),
        default,
        ..Default::default()
    };

    let mut tokens: Vec<&str> = decl.split_whitespace().collect();
    let Some(name) = tokens.pop() else {
        return Err(Error::signature(raw, format!("parameter `{}` has no name", entry)));
    };
    for modifier in tokens {
        match modifier {
            "Optional" => param.optional = true,
            "ParamArray" => param.param_array = true,
            "ByVal" => param.passing = Some(Passing::ByVal),
            "ByRef" => param.passing = Some(Passing::ByRef),
            other => {
                return Err(Error::signature(
                    raw,
                    format!("unknown parameter modifier `{}`", other),
                ))
            }
        }
    }

    match name.strip_suffix("()") {
        Some(bare) => {
            param.name = bare.to_string();
            param.is_array = true;
        }
        None => param.name = name.to_string(),
    }
    if param.name.is_empty() {
        return Err(Error::signature(raw, format!("parameter `{}` has no name", entry)));
    }

    Ok(param)
}

/// Parse the trailing `As ReturnType` zone.
///
/// A `Function` must declare a return type and a `Sub` must not.
pub fn parse_return(tail: &str, kind: ProcKind, raw: &str) -> Result<String> {
    let tail = tail.trim();
    let return_type = if tail.is_empty() {
        ""
    } else if let Some(ty) = tail.strip_prefix("As ") {
        ty.trim()
    } else {
        return Err(Error::signature(
            raw,
            format!("unexpected `{}` after parameter list", tail),
        ));
    };

    match kind {
        ProcKind::Function if return_type.is_empty() => {
            Err(Error::signature(raw, "function has no return type"))
        }
        ProcKind::Sub if !return_type.is_empty() => {
            Err(Error::signature(raw, "sub cannot declare a return type"))
        }
        _ => Ok(return_type.to_string()),
    }
}
