//! Error taxonomy shared by every stage of the pipeline.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while generating or cross-referencing documentation.
///
/// Each variant carries the offending raw text or path so a failed build
/// points straight at what needs fixing.
#[derive(Error, Debug)]
pub enum Error {
    #[error("malformed signature `{raw}`: {reason}")]
    MalformedSignature { raw: String, reason: String },

    #[error("malformed doc comment: {reason}\n{text}")]
    MalformedDocComment { text: String, reason: String },

    #[error("source directory not found: {}", .0.display())]
    MissingSourceDirectory(PathBuf),

    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("in {}: {source}", path.display())]
    InFile {
        path: PathBuf,
        #[source]
        source: Box<Error>,
    },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    pub(crate) fn signature(raw: &str, reason: impl Into<String>) -> Self {
        Error::MalformedSignature {
            raw: raw.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn doc_comment(text: &str, reason: impl Into<String>) -> Self {
        Error::MalformedDocComment {
            text: text.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn in_file(path: impl Into<PathBuf>, source: Error) -> Self {
        Error::InFile {
            path: path.into(),
            source: Box::new(source),
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_file_message_carries_inner_error() {
        let err = Error::in_file(
            "macros/Module1.bas",
            Error::signature("Sub Broken(x)", "parameter `x` has no `As Type` clause"),
        );
        let message = err.to_string();
        assert!(
            message.starts_with("in macros/Module1.bas: malformed signature `Sub Broken(x)`"),
            "{}",
            message
        );
        assert!(std::error::Error::source(&err).is_some());
    }
}
