//! The `vb` cross-reference domain.
//!
//! A [`BuildSession`] holds every object registered during one build. It is
//! passed explicitly into directive processing and reference resolution, so
//! separate builds never share state. Within a build, registration runs to
//! completion before any reference is resolved.

pub mod directive;
pub mod scan;

use crate::label::to_safe_label;
use std::collections::HashMap;
use tracing::warn;

pub use directive::{FunctionBody, FunctionDirective, SignatureNode};

/// Domain name used as the directive and role prefix.
pub const DOMAIN: &str = "vb";

/// Kind of a registered object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    Function,
    /// Reserved for the `vb:module` directive, which registers nothing yet
    Module,
}

impl ObjectKind {
    pub fn name(self) -> &'static str {
        match self {
            ObjectKind::Function => "function",
            ObjectKind::Module => "module",
        }
    }
}

/// An addressable object: owning page, anchor, kind and display title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisteredObject {
    pub docname: String,
    pub label: String,
    pub kind: ObjectKind,
    pub title: String,
}

/// A resolved reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub docname: String,
    pub anchor: String,
    pub text: String,
}

/// Reference roles exposed to page authors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleKind {
    /// `:vb:func:`, functions only
    Func,
    /// `:vb:type:`, any registered object
    Type,
}

impl RoleKind {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "func" => Some(RoleKind::Func),
            "type" => Some(RoleKind::Type),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            RoleKind::Func => "func",
            RoleKind::Type => "type",
        }
    }
}

/// Role text split into target and optional explicit link text.
///
/// `` `Module1.Add` `` has no explicit text; `` `add them <Module1.Add>` ``
/// links `Module1.Add` with the text `add them`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference<'a> {
    pub target: &'a str,
    pub text: Option<&'a str>,
}

impl<'a> Reference<'a> {
    pub fn parse(raw: &'a str) -> Self {
        let raw = raw.trim();
        if let Some(inner) = raw.strip_suffix('>') {
            if let Some(open) = inner.rfind('<') {
                let text = inner[..open].trim();
                let target = inner[open + 1..].trim();
                if !text.is_empty() && !target.is_empty() {
                    return Reference {
                        target,
                        text: Some(text),
                    };
                }
            }
        }
        Reference {
            target: raw,
            text: None,
        }
    }
}

/// Objects registered during one documentation build.
#[derive(Debug)]
pub struct BuildSession {
    objects: HashMap<String, RegisteredObject>,
    encode_invalid: bool,
}

impl Default for BuildSession {
    fn default() -> Self {
        Self::new(true)
    }
}

impl BuildSession {
    /// New empty session. `encode_invalid` must match the label setting used
    /// when the pages were generated.
    pub fn new(encode_invalid: bool) -> Self {
        Self {
            objects: HashMap::new(),
            encode_invalid,
        }
    }

    /// Label under which `name` is stored and looked up.
    pub fn label_for(&self, name: &str) -> String {
        to_safe_label(name, self.encode_invalid)
    }

    /// Register an object. A label registered twice keeps the last
    /// registration; the overwrite is logged.
    pub fn register(&mut self, name: &str, docname: &str, kind: ObjectKind, title: &str) -> String {
        let label = self.label_for(name);
        let object = RegisteredObject {
            docname: docname.to_string(),
            label: label.clone(),
            kind,
            title: title.to_string(),
        };
        self.insert(object);
        label
    }

    fn insert(&mut self, object: RegisteredObject) {
        if let Some(previous) = self.objects.insert(object.label.clone(), object) {
            let current = &self.objects[&previous.label];
            warn!(
                label = %previous.label,
                previous = %previous.docname,
                current = %current.docname,
                "duplicate object description, last registration wins"
            );
        }
    }

    pub fn get(&self, name: &str) -> Option<&RegisteredObject> {
        self.objects.get(&self.label_for(name))
    }

    /// Resolve `target` only if it was registered with `expected` kind.
    pub fn resolve_exact(&self, target: &str, expected: ObjectKind, text: Option<&str>) -> Option<Link> {
        self.get(target)
            .filter(|object| object.kind == expected)
            .map(|object| link_to(object, text))
    }

    /// Resolve `target` regardless of kind.
    pub fn resolve_any(&self, target: &str, text: Option<&str>) -> Option<(ObjectKind, Link)> {
        self.get(target).map(|object| (object.kind, link_to(object, text)))
    }

    /// Resolve role text such as `` Module1.Add `` or `` add <Module1.Add> ``.
    pub fn resolve_role(&self, role: RoleKind, raw: &str) -> Option<Link> {
        let reference = Reference::parse(raw);
        match role {
            RoleKind::Func => self.resolve_exact(reference.target, ObjectKind::Function, reference.text),
            RoleKind::Type => self
                .resolve_any(reference.target, reference.text)
                .map(|(_, link)| link),
        }
    }

    /// All objects, sorted by label.
    pub fn objects(&self) -> Vec<&RegisteredObject> {
        let mut objects: Vec<_> = self.objects.values().collect();
        objects.sort_by(|a, b| a.label.cmp(&b.label));
        objects
    }

    /// Drop every object owned by `docname` before that page is re-read.
    pub fn clear_doc(&mut self, docname: &str) {
        self.objects.retain(|_, object| object.docname != docname);
    }

    /// Fold the objects of an isolated session into this one.
    pub fn merge(&mut self, other: BuildSession) {
        let mut incoming: Vec<_> = other.objects.into_values().collect();
        incoming.sort_by(|a, b| a.label.cmp(&b.label));
        for object in incoming {
            self.insert(object);
        }
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

fn link_to(object: &RegisteredObject, text: Option<&str>) -> Link {
    Link {
        docname: object.docname.clone(),
        anchor: object.label.clone(),
        text: text.unwrap_or(object.title.as_str()).to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> BuildSession {
        let mut session = BuildSession::new(true);
        session.register("Module1.Add", "modules", ObjectKind::Function, "Add()");
        session
    }

    #[test]
    fn any_kind_uses_registered_title() {
        let (kind, link) = session().resolve_any("Module1.Add", None).unwrap();
        assert_eq!(kind, ObjectKind::Function);
        assert_eq!(
            link,
            Link {
                docname: "modules".to_string(),
                anchor: "module1.add".to_string(),
                text: "Add()".to_string(),
            }
        );
    }

    #[test]
    fn explicit_text_overrides_title() {
        let link = session().resolve_role(RoleKind::Func, "add them <Module1.Add>").unwrap();
        assert_eq!(link.text, "add them");
        assert_eq!(link.anchor, "module1.add");
    }

    #[test]
    fn exact_kind_mismatch_is_not_found() {
        let session = session();
        assert!(session.resolve_exact("Module1.Add", ObjectKind::Module, None).is_none());
        assert!(session.resolve_exact("Module1.Add", ObjectKind::Function, None).is_some());
    }

    #[test]
    fn unknown_target_is_not_found() {
        assert!(session().resolve_role(RoleKind::Type, "Module1.Sub").is_none());
    }

    #[test]
    fn lookup_uses_sanitized_label() {
        assert!(session().resolve_any("module1.add", None).is_some());
    }

    #[test]
    fn last_registration_wins() {
        let mut session = session();
        session.register("Module1.Add", "other", ObjectKind::Function, "Add()");
        assert_eq!(session.len(), 1);
        assert_eq!(session.get("Module1.Add").unwrap().docname, "other");
    }

    #[test]
    fn clear_doc_removes_owned_objects() {
        let mut session = session();
        session.register("Module2.Mul", "more", ObjectKind::Function, "Mul()");
        session.clear_doc("modules");
        assert!(session.get("Module1.Add").is_none());
        assert!(session.get("Module2.Mul").is_some());
    }

    #[test]
    fn merge_isolated_sessions() {
        let mut main = session();
        let mut other = BuildSession::new(true);
        other.register("Module2.Mul", "more", ObjectKind::Function, "Mul()");
        main.merge(other);
        let labels: Vec<_> = main.objects().iter().map(|o| o.label.clone()).collect();
        assert_eq!(labels, vec!["module1.add", "module2.mul"]);
    }

    #[test]
    fn reference_parsing() {
        assert_eq!(
            Reference::parse("Module1.Add"),
            Reference { target: "Module1.Add", text: None }
        );
        assert_eq!(
            Reference::parse("the sum <Module1.Add>"),
            Reference { target: "Module1.Add", text: Some("the sum") }
        );
        assert_eq!(
            Reference::parse("<Module1.Add>"),
            Reference { target: "<Module1.Add>", text: None }
        );
    }
}
