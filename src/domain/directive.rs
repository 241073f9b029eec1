//! `vb:function` and `vb:module` directives.

use super::{BuildSession, ObjectKind};
use crate::error::Result;
use crate::model::Declaration;
use crate::parser::signature;
use regex::Regex;
use std::sync::LazyLock;
use tracing::warn;

static RE_FIELD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^:([A-Za-z]+)(?:[[:blank:]]+([^:]+?))?:(?:[[:blank:]]+(.*))?$").unwrap());

/// Directives the domain understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectiveKind {
    Function,
    /// Accepted and ignored
    Module,
}

impl DirectiveKind {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "function" => Some(DirectiveKind::Function),
            "module" => Some(DirectiveKind::Module),
            _ => None,
        }
    }
}

/// A `.. vb:function::` directive as written on a page.
#[derive(Debug, Clone, Copy)]
pub struct FunctionDirective<'a> {
    /// Required argument: the raw declaration
    pub signature: &'a str,
    /// `:module:` option
    pub module: Option<&'a str>,
    /// Dedented directive body
    pub content: &'a str,
}

/// Result of processing a function directive.
#[derive(Debug)]
pub struct SignatureNode {
    pub declaration: Declaration,
    /// `Module.Name`, or just `Name` without a module
    pub qualified: String,
    /// Anchor the object was registered under
    pub label: String,
    pub title: String,
    pub body: FunctionBody,
}

impl FunctionDirective<'_> {
    /// Decompose the signature and register the function in `session`.
    pub fn run(&self, docname: &str, session: &mut BuildSession) -> Result<SignatureNode> {
        let declaration = signature::decompose(self.signature)?;
        let qualified = match self.module.map(str::trim) {
            Some(module) if !module.is_empty() => format!("{}.{}", module, declaration.name),
            _ => declaration.name.clone(),
        };
        let title = declaration.title();
        let label = session.register(&qualified, docname, ObjectKind::Function, &title);

        let body = FunctionBody::parse(self.content);
        for field in body.fields.iter().filter(|f| f.name == "param") {
            if let Some(ref name) = field.arg {
                if declaration.parameter(name).is_none() {
                    warn!(function = %qualified, param = %name, "documented parameter not in signature");
                }
            }
        }

        Ok(SignatureNode {
            declaration,
            qualified,
            label,
            title,
            body,
        })
    }
}

/// One `:name arg: body` entry of a field list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub arg: Option<String>,
    pub body: String,
}

/// Directive body split into prose paragraphs and field-list entries.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FunctionBody {
    pub paragraphs: Vec<String>,
    pub fields: Vec<Field>,
}

impl FunctionBody {
    pub fn parse(content: &str) -> Self {
        let mut body = FunctionBody::default();
        let mut paragraph: Vec<&str> = Vec::new();
        let mut in_field = false;

        for line in content.lines() {
            if line.trim().is_empty() {
                flush_paragraph(&mut body, &mut paragraph);
                in_field = false;
                continue;
            }
            if let Some(caps) = RE_FIELD.captures(line) {
                flush_paragraph(&mut body, &mut paragraph);
                body.fields.push(Field {
                    name: caps[1].to_string(),
                    arg: caps.get(2).map(|m| m.as_str().trim().to_string()),
                    body: caps.get(3).map(|m| m.as_str().to_string()).unwrap_or_default(),
                });
                in_field = true;
                continue;
            }
            if in_field && line.starts_with(char::is_whitespace) {
                if let Some(field) = body.fields.last_mut() {
                    if !field.body.is_empty() {
                        field.body.push('\n');
                    }
                    field.body.push_str(line.trim());
                }
                continue;
            }
            in_field = false;
            paragraph.push(line);
        }
        flush_paragraph(&mut body, &mut paragraph);
        body
    }
}

fn flush_paragraph(body: &mut FunctionBody, paragraph: &mut Vec<&str>) {
    if !paragraph.is_empty() {
        body.paragraphs.push(paragraph.join("\n"));
        paragraph.clear();
    }
}
