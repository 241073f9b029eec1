//! vbdoc — generate reST documentation from Visual Basic doc comments.
//!
//! - **stdin mode**: `vbdoc < Module1.bas` renders one module to stdout
//! - **generate**: `vbdoc generate -c docs/vbdoc.toml` writes one page per
//!   `autodoc_paths` entry
//! - **xref**: `vbdoc xref docs/` resolves `:vb:func:` / `:vb:type:` roles

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing::{warn, Level};
use tracing_subscriber::FmtSubscriber;
use vbdoc::autodoc::{self, PageGenerator};
use vbdoc::config::{Config, NotesIndex};
use vbdoc::domain::{scan, BuildSession, Reference};
use vbdoc::model::ModuleEntry;
use vbdoc::parser::extract;

#[derive(Parser)]
#[command(
    name = "vbdoc",
    version,
    about = "Generate reStructuredText API docs from Visual Basic doc comments"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Module name used for the section heading in stdin mode
    #[arg(long, default_value = "Module")]
    module: String,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Write one page per configured autodoc_paths entry
    Generate {
        /// Configuration file
        #[arg(short = 'c', long, default_value = "vbdoc.toml")]
        config: PathBuf,

        /// Documentation source directory (defaults to the config directory)
        #[arg(long)]
        srcdir: Option<PathBuf>,

        /// Force enable_autodoc on
        #[arg(short = 'D', long)]
        define_autodoc: bool,
    },
    /// Resolve vb roles across the .rst pages of a source directory
    Xref {
        /// Documentation source directory
        srcdir: PathBuf,

        /// Configuration file (for label settings)
        #[arg(short = 'c', long)]
        config: Option<PathBuf>,

        /// Exit with an error when any reference is unresolved
        #[arg(long)]
        strict: bool,

        /// Also print every registered object as `docname label kind "title"`
        #[arg(long)]
        inventory: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("failed to install logging subscriber")?;

    match cli.command {
        None => stdin_mode(&cli.module),
        Some(Commands::Generate {
            ref config,
            ref srcdir,
            define_autodoc,
        }) => generate(config, srcdir.as_deref(), define_autodoc),
        Some(Commands::Xref {
            ref srcdir,
            ref config,
            strict,
            inventory,
        }) => xref(srcdir, config.as_deref(), strict, inventory),
    }
}

/// stdin mode: read one module, render its section to stdout.
fn stdin_mode(name: &str) -> Result<()> {
    let mut input = String::new();
    io::stdin()
        .read_to_string(&mut input)
        .context("failed to read stdin")?;

    let config = Config::default();
    let notes = NotesIndex::new();
    let generator = PageGenerator::new(&config, name, &notes);
    let module = ModuleEntry {
        name: name.to_string(),
        blocks: extract::parse(&input),
    };
    let section = generator
        .render_module(&module)
        .with_context(|| format!("failed to render module {}", name))?;
    print!("{}", section.trim_start_matches('\n'));
    Ok(())
}

fn generate(config_path: &Path, srcdir: Option<&Path>, define_autodoc: bool) -> Result<()> {
    let mut config = Config::load(config_path)
        .with_context(|| format!("failed to load {}", config_path.display()))?;
    if define_autodoc {
        config.enable_autodoc = true;
    }

    let confdir = match config_path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let srcdir = srcdir.map(Path::to_path_buf).unwrap_or_else(|| confdir.clone());

    let written = autodoc::generate_all(&config, &confdir, &srcdir)
        .context("documentation generation failed")?;
    for path in written {
        println!("{}", path.display());
    }
    Ok(())
}

fn xref(srcdir: &Path, config_path: Option<&Path>, strict: bool, inventory: bool) -> Result<()> {
    let config = match config_path {
        Some(path) => Config::load(path).with_context(|| format!("failed to load {}", path.display()))?,
        None => Config::default(),
    };

    let docs = scan::load_documents(srcdir)
        .with_context(|| format!("failed to read pages from {}", srcdir.display()))?;
    let mut session = BuildSession::new(config.encode_invalid_labels);
    scan::register_documents(&docs, &mut session)?;

    if inventory {
        for object in session.objects() {
            println!(
                "{} {} {} \"{}\"",
                object.docname,
                object.label,
                object.kind.name(),
                object.title
            );
        }
    }

    let mut unresolved = 0;
    for resolution in scan::resolve_documents(&docs, &session) {
        let target = Reference::parse(&resolution.text).target;
        match resolution.link {
            Some(link) => println!(
                "{}: {} -> {}#{} \"{}\"",
                resolution.docname, target, link.docname, link.anchor, link.text
            ),
            None => unresolved += 1,
        }
    }

    if unresolved > 0 {
        if strict {
            anyhow::bail!("{} unresolved reference(s)", unresolved);
        }
        warn!(count = unresolved, "unresolved references");
    }
    Ok(())
}
