//! The generation pipeline and writing its output.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::{debug, info};

use crate::config::GeneratorConfig;
use crate::spec::{
    build_operations, extract_operation_definitions, filter_definitions, load_document,
    ApiDocument, Operation,
};

use super::compile::Compiler;
use super::emit::{sort_operations, EmitOptions, HandlerEmitter};
use super::templates::{render_handlers, render_setup, AiScaffold, SetupTarget};

/// Environment variable naming the formatter binary
pub const PRETTIER_BIN_ENV: &str = "OAS_MOCKGEN_PRETTIER_BIN";

/// One generated source file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    /// File name relative to the output directory (`handlers.js`)
    pub name: String,
    pub contents: String,
}

/// Everything a generation run produces
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedOutput {
    /// `handlers` first, then the `browser`, `node` and `native` setup modules
    pub files: Vec<GeneratedFile>,
}

impl GeneratedOutput {
    /// The handlers module
    pub fn handlers(&self) -> Option<&GeneratedFile> {
        self.files.iter().find(|f| f.name.starts_with("handlers."))
    }
}

/// Extract, filter and resolve the operations of `document`
///
/// # Errors
///
/// Returns an error if the configured filters are invalid.
pub fn collect_operations(
    document: &ApiDocument,
    config: &GeneratorConfig,
) -> anyhow::Result<Vec<Operation>> {
    let definitions = extract_operation_definitions(document);
    let extracted = definitions.len();
    let definitions = filter_definitions(definitions, &config.filter_options())?;
    debug!(extracted, kept = definitions.len(), "filtered operations");
    Ok(build_operations(document, &definitions))
}

/// Operations in the order handlers are emitted
///
/// # Errors
///
/// Returns an error if the configured filters are invalid.
pub fn ordered_operations(
    document: &ApiDocument,
    config: &GeneratorConfig,
) -> anyhow::Result<Vec<Operation>> {
    let mut operations = collect_operations(document, config)?;
    sort_operations(&mut operations);
    Ok(operations)
}

/// Run the whole pipeline on an already-loaded document
///
/// # Errors
///
/// Returns an error for invalid filters, inconsistent AI settings or a
/// template failure.
pub fn generate_from_document(
    document: &ApiDocument,
    config: &GeneratorConfig,
) -> anyhow::Result<GeneratedOutput> {
    let ai = AiScaffold::from_config(&config.ai)?;
    let operations = collect_operations(document, config)?;

    let options = EmitOptions {
        static_mode: config.static_mode,
        ai: ai.is_some(),
        echo_request_body: config.echo_request_body,
        seed: config.seed,
    };
    let mut emitter = HandlerEmitter::new(Compiler::new(config.max_array_length), options);
    let emitted = emitter.emit(operations);
    info!(
        handlers = emitted.handlers.len(),
        functions = emitted.functions.len(),
        static_mode = config.static_mode,
        "emitted handlers"
    );

    let ext = config.extension();
    let base_url = config.base_url.resolve(&document.info);
    let mut files = vec![GeneratedFile {
        name: format!("handlers.{ext}"),
        contents: render_handlers(&emitted, &base_url, ai, config.typescript, config.static_mode)?,
    }];
    for target in SetupTarget::ALL {
        files.push(GeneratedFile {
            name: format!("{}.{ext}", target.file_stem()),
            contents: render_setup(target)?,
        });
    }
    Ok(GeneratedOutput { files })
}

/// Load `source` (path or URL) and generate
///
/// # Errors
///
/// Returns an error if the document cannot be loaded or generation fails.
pub fn generate_from_spec(source: &str, config: &GeneratorConfig) -> anyhow::Result<GeneratedOutput> {
    let document = load_document(source)?;
    generate_from_document(&document, config)
}

/// Write every file into `dir`, creating it if needed
///
/// # Errors
///
/// Returns an error if the directory or a file cannot be written.
pub fn write_output(output: &GeneratedOutput, dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    fs::create_dir_all(dir)
        .with_context(|| format!("failed to create output directory {}", dir.display()))?;
    let mut written = Vec::with_capacity(output.files.len());
    for file in &output.files {
        let path = dir.join(&file.name);
        fs::write(&path, &file.contents)
            .with_context(|| format!("failed to write {}", path.display()))?;
        info!(path = %path.display(), "wrote file");
        written.push(path);
    }
    Ok(written)
}

/// Print the handlers module to `out`
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn print_handlers<W: Write>(output: &GeneratedOutput, out: &mut W) -> anyhow::Result<()> {
    if let Some(handlers) = output.handlers() {
        out.write_all(handlers.contents.as_bytes())
            .context("failed to print handlers")?;
    }
    Ok(())
}

/// Run the formatter over `dir`
///
/// # Errors
///
/// Returns an error if the formatter cannot be started or exits unsuccessfully.
pub fn format_output(dir: &Path) -> anyhow::Result<()> {
    let bin = std::env::var(PRETTIER_BIN_ENV).unwrap_or_else(|_| "prettier".to_string());
    let mut cmd = std::process::Command::new(&bin);
    cmd.arg("--write").arg(dir);
    let status = cmd
        .status()
        .with_context(|| format!("failed to run formatter `{bin}`"))?;
    if !status.success() {
        anyhow::bail!("{bin} failed with {status}");
    }
    Ok(())
}
