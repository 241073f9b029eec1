//! Cross-reference label generation.
//!
//! Turns qualified names such as `Module1.Function1` into identifiers that
//! are legal reST targets and HTML anchors. Segments that would not survive
//! as-is (spaces, non-ASCII names) can be replaced by a short MD5 digest.

use md5::{Digest, Md5};
use regex::Regex;
use std::sync::LazyLock;

// ASCII punctuation: `!-/`, `:-@`, `[-\``, `{-~`
static RE_INVALID_SYMBOLS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[!-/:-@\[-`{-~]").unwrap());

static RE_SAFE_SEGMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9_\-]+$").unwrap());

static RE_NON_ID_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9]+").unwrap());

static RE_NON_ID_AT_ENDS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[-0-9]+|-+$").unwrap());

/// Number of hex digits of the digest kept for an encoded segment.
const DIGEST_LEN: usize = 8;

/// Build a safe label from a dot-separated qualified name.
///
/// With `encode_invalid` set, a segment that still contains characters
/// outside `[a-zA-Z0-9_-]` after punctuation is hyphenated is replaced by
/// the first 8 hex digits of the MD5 digest of the original segment (an
/// `x` is prepended when the digest starts with a digit). Two distinct
/// encoded segments collide only when their digests share that prefix.
pub fn to_safe_label(name: &str, encode_invalid: bool) -> String {
    name.split('.')
        .map(|segment| make_id(&sanitize_segment(segment, encode_invalid)))
        .collect::<Vec<_>>()
        .join(".")
}

fn sanitize_segment(segment: &str, encode_invalid: bool) -> String {
    let hyphenated = RE_INVALID_SYMBOLS.replace_all(segment, "-");
    if !encode_invalid || RE_SAFE_SEGMENT.is_match(&hyphenated) {
        return hyphenated.into_owned();
    }
    digest_segment(segment)
}

fn digest_segment(segment: &str) -> String {
    let mut hasher = Md5::new();
    hasher.update(segment.as_bytes());
    let mut digest = hex::encode(hasher.finalize());
    digest.truncate(DIGEST_LEN);
    if digest.starts_with(|c: char| c.is_ascii_digit()) {
        format!("x{}", digest)
    } else {
        digest
    }
}

/// Normalize text into a document identifier, modelled on docutils'
/// `make_id` without its Unicode decomposition step.
///
/// Lowercases, drops non-ASCII characters outright (`café` becomes `caf`,
/// not `cafe`), collapses every run of characters outside `[a-z0-9]`
/// (whitespace included) into a single `-`, then strips leading
/// digits/hyphens and trailing hyphens.
pub fn make_id(text: &str) -> String {
    let lowered = text.to_lowercase();
    let collapsed = lowered.split_whitespace().collect::<Vec<_>>().join(" ");
    let ascii: String = collapsed.chars().filter(|c| c.is_ascii()).collect();
    let id = RE_NON_ID_CHARS.replace_all(&ascii, "-");
    RE_NON_ID_AT_ENDS.replace_all(&id, "").into_owned()
}
