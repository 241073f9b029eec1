//! vbdoc — reStructuredText API pages from Visual Basic `'''` doc comments,
//! plus a `vb` cross-reference domain for resolving links between pages.

pub mod autodoc;
pub mod config;
pub mod domain;
pub mod error;
pub mod label;
pub mod model;
pub mod parser;
pub mod render;

pub use config::Config;
pub use domain::BuildSession;
pub use error::{Error, Result};
