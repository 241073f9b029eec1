//! Data model for parsed Visual Basic documentation.

use std::fmt;

/// Access modifier written in front of a declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AccessModifier {
    #[default]
    None,
    Public,
    Private,
    Friend,
    Protected,
    ProtectedFriend,
    PrivateProtected,
}

impl AccessModifier {
    /// Source keyword(s), or `None` when the declaration had no modifier.
    pub fn keyword(self) -> Option<&'static str> {
        match self {
            AccessModifier::None => None,
            AccessModifier::Public => Some("Public"),
            AccessModifier::Private => Some("Private"),
            AccessModifier::Friend => Some("Friend"),
            AccessModifier::Protected => Some("Protected"),
            AccessModifier::ProtectedFriend => Some("Protected Friend"),
            AccessModifier::PrivateProtected => Some("Private Protected"),
        }
    }
}

/// Procedure kind: `Function` returns a value, `Sub` does not.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcKind {
    Function,
    Sub,
}

impl ProcKind {
    pub fn keyword(self) -> &'static str {
        match self {
            ProcKind::Function => "Function",
            ProcKind::Sub => "Sub",
        }
    }
}

/// Argument passing mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Passing {
    ByVal,
    ByRef,
}

/// One entry of a declaration's parameter list.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Parameter {
    /// Bare identifier, without modifiers or the `()` array suffix
    pub name: String,
    /// Declared type from the `As Type` clause
    pub ty: String,
    pub passing: Option<Passing>,
    pub optional: bool,
    pub param_array: bool,
    /// Name was written with a `()` suffix
    pub is_array: bool,
    /// Default value of an `Optional` parameter
    pub default: Option<String>,
}

impl Parameter {
    /// Type as shown in a `:type:` field. Arrays keep their `()` suffix.
    pub fn display_type(&self) -> String {
        if self.is_array {
            format!("{}()", self.ty)
        } else {
            self.ty.clone()
        }
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.optional {
            f.write_str("Optional ")?;
        }
        match self.passing {
            Some(Passing::ByVal) => f.write_str("ByVal ")?,
            Some(Passing::ByRef) => f.write_str("ByRef ")?,
            None => {}
        }
        if self.param_array {
            f.write_str("ParamArray ")?;
        }
        f.write_str(&self.name)?;
        if self.is_array {
            f.write_str("()")?;
        }
        write!(f, " As {}", self.ty)?;
        if let Some(ref default) = self.default {
            write!(f, " = {}", default)?;
        }
        Ok(())
    }
}

/// A decomposed `Function`/`Sub` declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub access: AccessModifier,
    pub kind: ProcKind,
    pub name: String,
    pub parameters: Vec<Parameter>,
    /// Empty for `Sub`
    pub return_type: String,
}

impl Declaration {
    /// Look up a parameter by name. VB identifiers are case-insensitive.
    pub fn parameter(&self, name: &str) -> Option<&Parameter> {
        self.parameters
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
    }

    /// Display title used for cross-reference link text, e.g. `Add()`.
    pub fn title(&self) -> String {
        format!("{}()", self.name)
    }
}

impl fmt::Display for Declaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(access) = self.access.keyword() {
            write!(f, "{} ", access)?;
        }
        write!(f, "{} {}(", self.kind.keyword(), self.name)?;
        for (i, param) in self.parameters.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", param)?;
        }
        f.write_str(")")?;
        if !self.return_type.is_empty() {
            write!(f, " As {}", self.return_type)?;
        }
        Ok(())
    }
}

/// Accumulated doc-comment text, optionally attached to a declaration line.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DocBlock {
    /// Comment body with the `'''` markers removed (may be empty)
    pub comment: String,
    /// Raw declaration line; `None` for a module-level block
    pub signature: Option<String>,
}

impl DocBlock {
    pub fn module_level(comment: impl Into<String>) -> Self {
        Self {
            comment: comment.into(),
            signature: None,
        }
    }

    pub fn function_level(comment: impl Into<String>, signature: impl Into<String>) -> Self {
        Self {
            comment: comment.into(),
            signature: Some(signature.into()),
        }
    }
}

/// One source file: the module name (file stem) and its blocks in source order.
#[derive(Debug, Default)]
pub struct ModuleEntry {
    pub name: String,
    pub blocks: Vec<DocBlock>,
}
