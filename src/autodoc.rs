//! Page generator — turns a directory of VB modules into one reST page.
//!
//! For each configured `(source, output, title, notes)` entry, every source
//! file becomes a section headed by its module name. Module-level comments
//! render as prose and each declaration as a `vb:function` directive. Notes
//! are injected after the page title, module heading, or function block
//! they are keyed to. A page is written only once it has been assembled
//! completely in memory.

use crate::config::{AutodocPath, Config, NotesIndex, PAGE_NOTE_KEY};
use crate::error::{Error, Result};
use crate::label::to_safe_label;
use crate::model::{DocBlock, ModuleEntry};
use crate::parser::{extract, signature, xmldoc};
use crate::render::{self, rst};
use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Renders pages for one configured entry.
pub struct PageGenerator<'a> {
    config: &'a Config,
    /// Output document name, used to prefix labels
    docname: &'a str,
    notes: &'a NotesIndex,
}

impl<'a> PageGenerator<'a> {
    pub fn new(config: &'a Config, docname: &'a str, notes: &'a NotesIndex) -> Self {
        Self {
            config,
            docname,
            notes,
        }
    }

    /// Assemble the page for every source file in `source_dir`.
    pub fn generate(&self, source_dir: &Path, title: &str) -> Result<String> {
        let files = collect_source_files(source_dir, self.config)?;
        if files.is_empty() {
            warn!(dir = %source_dir.display(), "no source files found");
        }

        let mut page = render::heading(title, '=');
        page.push('\n');
        self.push_note(&mut page, PAGE_NOTE_KEY);

        for path in &files {
            let module = read_module(path)?;
            let section = self
                .render_module(&module)
                .map_err(|e| Error::in_file(path, e))?;
            page.push_str(&section);
        }
        Ok(page)
    }

    /// Render one module section.
    pub fn render_module(&self, module: &ModuleEntry) -> Result<String> {
        let mut out = String::from("\n");

        if self.config.add_module_labels {
            out.push_str(&render::label_target(&self.label(&module.name)));
            out.push('\n');
        }
        out.push_str(&render::heading(&module.name, '-'));
        out.push('\n');
        self.push_note(&mut out, &module.name);

        for block in &module.blocks {
            self.render_block(block, &module.name, &mut out)?;
        }

        debug!(module = %module.name, blocks = module.blocks.len(), "rendered module");
        Ok(out)
    }

    fn render_block(&self, block: &DocBlock, module: &str, out: &mut String) -> Result<()> {
        let fields = xmldoc::parse_fields(&block.comment)?;

        let Some(ref sig) = block.signature else {
            out.push_str(&rst::render_module_doc(&fields));
            return Ok(());
        };

        let decl = signature::decompose(sig)?;
        let qualified = format!("{}.{}", module, decl.name);
        if self.config.add_function_labels {
            out.push_str(&render::label_target(&self.label(&qualified)));
            out.push('\n');
        }
        out.push_str(&rst::render_function(sig, &decl, &fields, module));
        out.push('\n');
        self.push_note(out, &qualified);
        Ok(())
    }

    /// Label for a qualified name, with the docname prefix when configured.
    pub fn label(&self, qualified: &str) -> String {
        let encode = self.config.encode_invalid_labels;
        let label = to_safe_label(qualified, encode);
        if self.config.add_docname_to_labels {
            format!(
                "{}{}{}",
                to_safe_label(self.docname, encode),
                self.config.docname_label_delimiter,
                label
            )
        } else {
            label
        }
    }

    fn push_note(&self, out: &mut String, key: &str) {
        if let Some(note) = self.notes.get(key) {
            out.push_str(note.trim_end());
            out.push_str("\n\n");
        }
    }
}

/// Source files in `dir` with a configured extension, sorted by name.
pub fn collect_source_files(dir: &Path, config: &Config) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(Error::MissingSourceDirectory(dir.to_path_buf()));
    }
    let entries = fs::read_dir(dir).map_err(|e| Error::io(dir, e))?;
    let mut files: Vec<PathBuf> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|p| p.is_file() && config.is_source_file(p))
        .collect();
    files.sort();
    Ok(files)
}

/// Module name from a file path: `macros/Module1.bas` → `Module1`.
pub fn module_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Stream a source file through the extractor.
pub fn read_module(path: &Path) -> Result<ModuleEntry> {
    let file = File::open(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => Error::FileNotFound(path.to_path_buf()),
        _ => Error::io(path, e),
    })?;
    let blocks = extract::doc_blocks(BufReader::new(file))
        .collect::<std::io::Result<Vec<_>>>()
        .map_err(|e| Error::io(path, e))?;
    Ok(ModuleEntry {
        name: module_name(path),
        blocks,
    })
}

/// Run every configured entry and write its page under `srcdir`.
///
/// All source directories are checked before any page is written. Returns
/// the paths written.
pub fn generate_all(config: &Config, confdir: &Path, srcdir: &Path) -> Result<Vec<PathBuf>> {
    if !config.enable_autodoc {
        info!("autodoc disabled, nothing to generate");
        return Ok(Vec::new());
    }

    for entry in &config.autodoc_paths {
        let dir = confdir.join(&entry.source);
        if !dir.is_dir() {
            return Err(Error::MissingSourceDirectory(dir));
        }
    }

    let mut written = Vec::new();
    for entry in &config.autodoc_paths {
        written.push(generate_entry(config, entry, confdir, srcdir)?);
    }
    Ok(written)
}

fn generate_entry(
    config: &Config,
    entry: &AutodocPath,
    confdir: &Path,
    srcdir: &Path,
) -> Result<PathBuf> {
    let generator = PageGenerator::new(config, &entry.output, &entry.notes);
    let page = generator.generate(&confdir.join(&entry.source), &entry.title)?;

    let dest = srcdir.join(format!("{}.rst", entry.output));
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }
    fs::write(&dest, page).map_err(|e| Error::io(&dest, e))?;
    info!(page = %dest.display(), "wrote page");
    Ok(dest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const ADD_MODULE: &str = "''' <summary>Math helpers</summary>\n\
        \n\
        Option Explicit\n\
        \n\
        '''<summary>Adds two numbers</summary>\n\
        Public Function Add(ByVal a As Integer, ByVal b As Integer) As Integer\n\
        \x20   Add = a + b\n\
        End Function\n";

    fn module(name: &str, source: &str) -> ModuleEntry {
        ModuleEntry {
            name: name.to_string(),
            blocks: extract::parse(source),
        }
    }

    #[test]
    fn module_section_layout() {
        let config = Config::default();
        let notes = NotesIndex::new();
        let generator = PageGenerator::new(&config, "modules", &notes);
        let out = generator.render_module(&module("Module1", ADD_MODULE)).unwrap();
        assert!(out.starts_with("\nModule1\n-------\n\nMath helpers\n\n"), "{}", out);
        assert!(out.contains(".. _module1.add:\n\n.. vb:function:: Public Function Add("));
        assert!(out.contains("   :module: Module1\n"));
        assert!(out.contains("   Adds two numbers\n"));
    }

    #[test]
    fn function_note_follows_block() {
        let config = Config::default();
        let notes: NotesIndex = [("Module1.Add".to_string(), "See also: Subtract".to_string())]
            .into_iter()
            .collect();
        let generator = PageGenerator::new(&config, "modules", &notes);
        let out = generator.render_module(&module("Module1", ADD_MODULE)).unwrap();
        assert!(
            out.ends_with(":rtype: Integer\n\n\nSee also: Subtract\n\n"),
            "{}",
            out
        );
    }

    #[test]
    fn module_note_follows_heading() {
        let config = Config::default();
        let notes: NotesIndex = [("Module1".to_string(), "Legacy module.".to_string())]
            .into_iter()
            .collect();
        let generator = PageGenerator::new(&config, "modules", &notes);
        let out = generator.render_module(&module("Module1", ADD_MODULE)).unwrap();
        assert!(out.starts_with("\nModule1\n-------\n\nLegacy module.\n\nMath helpers\n\n"));
    }

    #[test]
    fn label_options() {
        let config = Config {
            add_docname_to_labels: true,
            docname_label_delimiter: "--".to_string(),
            add_module_labels: true,
            add_function_labels: false,
            ..Config::default()
        };
        let notes = NotesIndex::new();
        let generator = PageGenerator::new(&config, "api/modules", &notes);
        assert_eq!(generator.label("Module1.Add"), "api-modules--module1.add");
        let out = generator.render_module(&module("Module1", ADD_MODULE)).unwrap();
        assert!(out.starts_with("\n.. _api-modules--module1:\n\nModule1\n"));
        assert!(!out.contains(".. _api-modules--module1.add:"));
    }

    #[test]
    fn malformed_signature_aborts_module() {
        let config = Config::default();
        let notes = NotesIndex::new();
        let generator = PageGenerator::new(&config, "modules", &notes);
        let err = generator
            .render_module(&module("Broken", "Public Function Bad(x) As Long\n"))
            .unwrap_err();
        assert!(matches!(err, Error::MalformedSignature { .. }));
    }

    #[test]
    fn trailing_comment_does_not_abort_module() {
        let config = Config::default();
        let notes = NotesIndex::new();
        let generator = PageGenerator::new(&config, "modules", &notes);
        let source = "'''<summary>Doubles</summary>\n\
            Public Function Twice(ByVal a As Long) As Long ' doubles a\n\
            End Function\n\
            Public Sub Run() ' entry point\n";
        let out = generator.render_module(&module("Module1", source)).unwrap();
        assert!(out.contains(".. vb:function:: Public Function Twice(ByVal a As Long) As Long\n"));
        assert!(out.contains("   :rtype: Long\n"));
        assert!(out.contains(".. vb:function:: Public Sub Run()\n"));
        assert!(!out.contains("doubles a"));
    }

    #[test]
    fn malformed_doc_comment_aborts_module() {
        let config = Config::default();
        let notes = NotesIndex::new();
        let generator = PageGenerator::new(&config, "modules", &notes);
        let err = generator
            .render_module(&module("Broken", "'''<summary>a & b</summary>\nSub Run()\nEnd Sub\n"))
            .unwrap_err();
        assert!(matches!(err, Error::MalformedDocComment { .. }));
    }

    #[test]
    fn malformed_doc_comment_leaves_page_unwritten() {
        let conf = TempDir::new().unwrap();
        fs::create_dir(conf.path().join("bad")).unwrap();
        fs::write(
            conf.path().join("bad/Broken.bas"),
            "'''<summary>a & b</summary>\nSub Run()\nEnd Sub\n",
        )
        .unwrap();
        let config = Config::from_toml_str(
            "enable_autodoc = true\nautodoc_paths = [[\"bad\", \"broken\", \"Broken\"]]\n",
        )
        .unwrap();
        let err = generate_all(&config, conf.path(), conf.path()).unwrap_err();
        assert!(matches!(err, Error::InFile { .. }));
        assert!(err.to_string().contains("a & b"), "{}", err);
        assert!(!conf.path().join("broken.rst").exists());
    }

    #[test]
    fn page_from_directory_is_sorted() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("Zeta.bas"), "Sub Z()\nEnd Sub\n").unwrap();
        fs::write(dir.path().join("Alpha.vb"), "Sub A()\nEnd Sub\n").unwrap();
        fs::write(dir.path().join("readme.txt"), "Sub Ignored()\n").unwrap();

        let config = Config::default();
        let notes: NotesIndex = [(PAGE_NOTE_KEY.to_string(), "Intro.".to_string())]
            .into_iter()
            .collect();
        let page = PageGenerator::new(&config, "modules", &notes)
            .generate(dir.path(), "Modules")
            .unwrap();
        assert!(page.starts_with("Modules\n=======\n\nIntro.\n\n"));
        let alpha = page.find("Alpha\n-----").unwrap();
        let zeta = page.find("Zeta\n----").unwrap();
        assert!(alpha < zeta);
        assert!(!page.contains("Ignored"));
    }

    #[test]
    fn missing_directory_is_reported() {
        let config = Config::default();
        let err = collect_source_files(Path::new("/nonexistent/vbdoc"), &config).unwrap_err();
        assert!(matches!(err, Error::MissingSourceDirectory(_)));
    }

    #[test]
    fn generate_all_checks_every_directory_first() {
        let conf = TempDir::new().unwrap();
        fs::create_dir(conf.path().join("good")).unwrap();
        fs::write(conf.path().join("good/M.bas"), "Sub A()\nEnd Sub\n").unwrap();
        let config = Config::from_toml_str(
            r#"
enable_autodoc = true
autodoc_paths = [["good", "first", "First"], ["missing", "second", "Second"]]
"#,
        )
        .unwrap();
        let err = generate_all(&config, conf.path(), conf.path()).unwrap_err();
        assert!(matches!(err, Error::MissingSourceDirectory(_)));
        assert!(!conf.path().join("first.rst").exists());
    }

    #[test]
    fn disabled_autodoc_writes_nothing() {
        let conf = TempDir::new().unwrap();
        let config = Config::default();
        assert!(generate_all(&config, conf.path(), conf.path()).unwrap().is_empty());
    }
}
