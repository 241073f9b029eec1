//! Drives the domain over a tree of reST pages.
//!
//! Two passes, in order: every `vb:` directive on every page is registered
//! into the [`BuildSession`], then every `:vb:func:` / `:vb:type:` role is
//! resolved against it.

use super::directive::{DirectiveKind, FunctionDirective};
use super::{BuildSession, Link, RoleKind, DOMAIN};
use crate::error::{Error, Result};
use crate::parser::{indent_width, strip_indent};
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::{debug, warn};

// -- Regex patterns -----------------------------------------------------------

static RE_DIRECTIVE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\.\.[[:blank:]]+([a-z]+):([a-z]+)::[[:blank:]]*(.*)$").unwrap());

static RE_OPTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^:([A-Za-z][\w-]*):[[:blank:]]*(.*)$").unwrap());

static RE_ROLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r":([a-z]+):([a-z]+):`([^`]+)`").unwrap());

// -- Documents ----------------------------------------------------------------

/// One reST source page.
#[derive(Debug, Clone)]
pub struct RstDocument {
    /// Path relative to the source directory, without `.rst`, `/`-separated
    pub docname: String,
    pub path: PathBuf,
    pub text: String,
}

/// Load every `.rst` file below `srcdir`, sorted by docname.
pub fn load_documents(srcdir: &Path) -> Result<Vec<RstDocument>> {
    if !srcdir.is_dir() {
        return Err(Error::MissingSourceDirectory(srcdir.to_path_buf()));
    }
    let pattern = format!(
        "{}/**/*.rst",
        glob::Pattern::escape(&srcdir.to_string_lossy())
    );
    let paths = glob::glob(&pattern)
        .map_err(|e| Error::InvalidConfiguration(format!("invalid glob pattern {}: {}", pattern, e)))?;

    let mut docs = Vec::new();
    for path in paths.filter_map(|r| r.ok()).filter(|p| p.is_file()) {
        let text = fs::read_to_string(&path).map_err(|e| Error::io(&path, e))?;
        docs.push(RstDocument {
            docname: docname_for(srcdir, &path),
            path,
            text,
        });
    }
    docs.sort_by(|a, b| a.docname.cmp(&b.docname));
    Ok(docs)
}

/// `srcdir/api/modules.rst` → `api/modules`
pub fn docname_for(srcdir: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(srcdir).unwrap_or(path).with_extension("");
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

// -- Directives ---------------------------------------------------------------

/// A top-level directive with its options and dedented content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectiveBlock {
    pub domain: String,
    pub name: String,
    pub argument: String,
    pub options: Vec<(String, String)>,
    pub content: String,
    /// 1-based line of the directive marker
    pub line: usize,
}

impl DirectiveBlock {
    pub fn option(&self, name: &str) -> Option<&str> {
        self.options
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Find every top-level directive in `text`.
pub fn directives(text: &str) -> Vec<DirectiveBlock> {
    let lines: Vec<&str> = text.lines().collect();
    let mut blocks = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        let Some(caps) = RE_DIRECTIVE.captures(lines[i]) else {
            i += 1;
            continue;
        };
        let start = i;
        i += 1;

        // Body: following blank or indented lines
        let body_start = i;
        while i < lines.len() && (lines[i].trim().is_empty() || lines[i].starts_with(char::is_whitespace)) {
            i += 1;
        }
        let body = dedent(&lines[body_start..i]);

        let mut options = Vec::new();
        let mut rest = body.as_slice();
        while let Some((first, tail)) = rest.split_first() {
            match RE_OPTION.captures(first) {
                Some(opt) => {
                    options.push((opt[1].to_string(), opt[2].trim().to_string()));
                    rest = tail;
                }
                None => break,
            }
        }
        let content = rest.join("\n").trim_matches('\n').to_string();

        blocks.push(DirectiveBlock {
            domain: caps[1].to_string(),
            name: caps[2].to_string(),
            argument: caps[3].trim().to_string(),
            options,
            content,
            line: start + 1,
        });
    }
    blocks
}

/// Remove the common indentation of non-blank lines.
fn dedent(lines: &[&str]) -> Vec<String> {
    let indent = lines
        .iter()
        .filter(|l| !l.trim().is_empty())
        .map(|l| indent_width(l))
        .min()
        .unwrap_or(0);
    lines
        .iter()
        .map(|l| strip_indent(l, indent).trim_end().to_string())
        .collect()
}

/// Register the `vb` directives of every document, replacing whatever the
/// session held for those pages. Returns the number of functions registered.
pub fn register_documents(docs: &[RstDocument], session: &mut BuildSession) -> Result<usize> {
    let mut count = 0;
    for doc in docs {
        session.clear_doc(&doc.docname);
        for block in directives(&doc.text).into_iter().filter(|b| b.domain == DOMAIN) {
            match DirectiveKind::from_name(&block.name) {
                Some(DirectiveKind::Function) => {
                    let directive = FunctionDirective {
                        signature: &block.argument,
                        module: block.option("module"),
                        content: &block.content,
                    };
                    let node = directive
                        .run(&doc.docname, session)
                        .map_err(|e| Error::in_file(&doc.path, e))?;
                    debug!(docname = %doc.docname, label = %node.label, "registered function");
                    count += 1;
                }
                Some(DirectiveKind::Module) => {}
                None => warn!(
                    docname = %doc.docname,
                    line = block.line,
                    "unknown directive {}:{}",
                    block.domain,
                    block.name
                ),
            }
        }
    }
    Ok(count)
}

// -- References ---------------------------------------------------------------

/// A role occurrence and what it resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub docname: String,
    pub line: usize,
    pub role: String,
    /// Role text between the backquotes
    pub text: String,
    pub link: Option<Link>,
}

/// Resolve every `vb` role in every document.
pub fn resolve_documents(docs: &[RstDocument], session: &BuildSession) -> Vec<Resolution> {
    let mut resolutions = Vec::new();
    for doc in docs {
        for (index, line) in doc.text.lines().enumerate() {
            for caps in RE_ROLE.captures_iter(line) {
                if &caps[1] != DOMAIN {
                    continue;
                }
                let role = caps[2].to_string();
                let text = caps[3].to_string();
                let link = match RoleKind::from_name(&role) {
                    Some(kind) => session.resolve_role(kind, &text),
                    None => {
                        warn!(docname = %doc.docname, line = index + 1, "unknown role vb:{}", role);
                        None
                    }
                };
                if link.is_none() {
                    warn!(docname = %doc.docname, line = index + 1, "unresolved reference :vb:{}:`{}`", role, text);
                }
                resolutions.push(Resolution {
                    docname: doc.docname.clone(),
                    line: index + 1,
                    role,
                    text,
                    link,
                });
            }
        }
    }
    resolutions
}
