//! Build configuration loaded from `vbdoc.toml`.
//!
//! ```toml
//! enable_autodoc = true
//! autodoc_paths = [
//!     ["../macros", "modules", "Modules"],
//!     ["../lib", "library", "Library", { "__page__" = "Intro text", "Module1.Add" = "See also: Subtract" }],
//! ]
//! ```
//!
//! Source directories are relative to the directory holding the config
//! file; output names are relative to the documentation source directory.

use crate::error::{Error, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Supplementary markup keyed by `__page__`, a module name, or `Module.Function`.
pub type NotesIndex = HashMap<String, String>;

/// Notes key for text placed directly under the page title.
pub const PAGE_NOTE_KEY: &str = "__page__";

/// Default extensions recognised as VB source files.
pub const DEFAULT_EXTENSIONS: &[&str] = &["bas", "vb", "vbs"];

/// One `(source_dir, output_name, title[, notes])` entry.
#[derive(Debug, Clone, PartialEq)]
pub struct AutodocPath {
    pub source: PathBuf,
    pub output: String,
    pub title: String,
    pub notes: NotesIndex,
}

/// Validated configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub enable_autodoc: bool,
    pub autodoc_paths: Vec<AutodocPath>,
    pub encode_invalid_labels: bool,
    pub add_function_labels: bool,
    pub add_docname_to_labels: bool,
    pub docname_label_delimiter: String,
    pub add_module_labels: bool,
    pub source_extensions: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            enable_autodoc: false,
            autodoc_paths: Vec::new(),
            encode_invalid_labels: true,
            add_function_labels: true,
            add_docname_to_labels: false,
            docname_label_delimiter: "-".to_string(),
            add_module_labels: false,
            source_extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
        }
    }
}

/// On-disk shape before `autodoc_paths` entries are validated.
#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawConfig {
    enable_autodoc: bool,
    autodoc_paths: Vec<toml::Value>,
    encode_invalid_labels: bool,
    add_function_labels: bool,
    add_docname_to_labels: bool,
    docname_label_delimiter: String,
    add_module_labels: bool,
    source_extensions: Vec<String>,
}

impl Default for RawConfig {
    fn default() -> Self {
        let defaults = Config::default();
        Self {
            enable_autodoc: defaults.enable_autodoc,
            autodoc_paths: Vec::new(),
            encode_invalid_labels: defaults.encode_invalid_labels,
            add_function_labels: defaults.add_function_labels,
            add_docname_to_labels: defaults.add_docname_to_labels,
            docname_label_delimiter: defaults.docname_label_delimiter,
            add_module_labels: defaults.add_module_labels,
            source_extensions: defaults.source_extensions,
        }
    }
}

impl Config {
    /// Read and validate a config file.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(Error::FileNotFound(path.to_path_buf()));
        }
        let text = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Self::from_toml_str(&text)
    }

    /// Parse and validate config text.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let raw: RawConfig =
            toml::from_str(text).map_err(|e| Error::InvalidConfiguration(e.to_string()))?;

        let autodoc_paths = raw
            .autodoc_paths
            .iter()
            .enumerate()
            .map(|(i, value)| AutodocPath::from_value(i, value))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            enable_autodoc: raw.enable_autodoc,
            autodoc_paths,
            encode_invalid_labels: raw.encode_invalid_labels,
            add_function_labels: raw.add_function_labels,
            add_docname_to_labels: raw.add_docname_to_labels,
            docname_label_delimiter: raw.docname_label_delimiter,
            add_module_labels: raw.add_module_labels,
            source_extensions: raw.source_extensions,
        })
    }

    /// Whether `path` has one of the configured source extensions.
    pub fn is_source_file(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| {
                self.source_extensions
                    .iter()
                    .any(|s| s.eq_ignore_ascii_case(ext))
            })
    }
}

impl AutodocPath {
    fn from_value(index: usize, value: &toml::Value) -> Result<Self> {
        let invalid = |msg: String| Error::InvalidConfiguration(format!("autodoc_paths[{}]: {}", index, msg));

        let items = value
            .as_array()
            .ok_or_else(|| invalid(format!("expected an array, found {}", value.type_str())))?;
        if items.len() < 3 {
            return Err(invalid(format!(
                "expected (source, output, title[, notes]), found {} element(s)",
                items.len()
            )));
        }
        if items.len() > 4 {
            return Err(invalid(format!("too many elements: {}", items.len())));
        }

        let string_at = |i: usize, what: &str| -> Result<String> {
            items[i]
                .as_str()
                .map(str::to_string)
                .ok_or_else(|| invalid(format!("{} must be a string", what)))
        };

        let notes = match items.get(3) {
            None => NotesIndex::new(),
            Some(value) => {
                let table = value
                    .as_table()
                    .ok_or_else(|| invalid("notes must be a table".to_string()))?;
                table
                    .iter()
                    .map(|(key, note)| {
                        note.as_str()
                            .map(|text| (key.clone(), text.to_string()))
                            .ok_or_else(|| invalid(format!("note `{}` must be a string", key)))
                    })
                    .collect::<Result<NotesIndex>>()?
            }
        };

        Ok(Self {
            source: PathBuf::from(string_at(0, "source")?),
            output: string_at(1, "output")?,
            title: string_at(2, "title")?,
            notes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::from_toml_str("").unwrap();
        assert!(!config.enable_autodoc);
        assert!(config.encode_invalid_labels);
        assert!(config.add_function_labels);
        assert!(!config.add_docname_to_labels);
        assert_eq!(config.docname_label_delimiter, "-");
        assert!(!config.add_module_labels);
        assert!(config.autodoc_paths.is_empty());
    }

    #[test]
    fn paths_with_and_without_notes() {
        let config = Config::from_toml_str(
            r#"
enable_autodoc = true
autodoc_paths = [
    ["../macros", "modules", "Modules"],
    ["../lib", "library", "Library", { "__page__" = "Intro", "Module1.Add" = "See also: Subtract" }],
]
"#,
        )
        .unwrap();
        assert!(config.enable_autodoc);
        assert_eq!(config.autodoc_paths.len(), 2);
        assert_eq!(config.autodoc_paths[0].source, PathBuf::from("../macros"));
        assert_eq!(config.autodoc_paths[0].output, "modules");
        assert!(config.autodoc_paths[0].notes.is_empty());
        let notes = &config.autodoc_paths[1].notes;
        assert_eq!(notes.get(PAGE_NOTE_KEY).map(String::as_str), Some("Intro"));
        assert_eq!(notes.get("Module1.Add").map(String::as_str), Some("See also: Subtract"));
    }

    #[test]
    fn short_entry_is_invalid() {
        let err = Config::from_toml_str(r#"autodoc_paths = [["../macros", "modules"]]"#).unwrap_err();
        match err {
            Error::InvalidConfiguration(msg) => assert!(msg.contains("autodoc_paths[0]"), "{}", msg),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn non_string_title_is_invalid() {
        assert!(Config::from_toml_str(r#"autodoc_paths = [["a", "b", 3]]"#).is_err());
    }

    #[test]
    fn unknown_key_is_invalid() {
        assert!(matches!(
            Config::from_toml_str("vb_autodoc = true"),
            Err(Error::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn source_extension_match() {
        let config = Config::default();
        assert!(config.is_source_file(Path::new("Module1.bas")));
        assert!(config.is_source_file(Path::new("Class1.VB")));
        assert!(!config.is_source_file(Path::new("notes.txt")));
    }
}
