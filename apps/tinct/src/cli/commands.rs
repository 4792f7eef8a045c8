//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.

use super::OutputFormat;
use crate::theme::ResolvedStyle;
use crate::units::{
    FileWriter, JsonFormatter, StdoutWriter, ThemeSource, VimFormatter, layered_styles,
};
use std::path::{Path, PathBuf};
use tinct_core::{Pipeline, PipelineMetadata, RunSummary, TinctError};

/// How command results are printed.
#[derive(Debug, Clone, Copy, Default)]
pub struct Output {
    pub json_mode: bool,
    pub quiet: bool,
}

impl Output {
    fn json(self, value: &serde_json::Value) -> Result<(), TinctError> {
        println!("{}", render_json(value)?);
        Ok(())
    }
}

fn render_json(value: &impl serde::Serialize) -> Result<String, TinctError> {
    serde_json::to_string_pretty(value).map_err(|e| TinctError::SerializationError(e.to_string()))
}

// =============================================================================
// PATH VALIDATION
// =============================================================================

/// Validate an input theme path.
///
/// Canonicalizes the path (resolving symlinks and "..") and ensures it
/// names an existing regular file.
fn validate_file_path(path: &Path) -> Result<PathBuf, TinctError> {
    let canonical = path.canonicalize().map_err(|e| {
        TinctError::IoError(format!("Invalid file path '{}': {}", path.display(), e))
    })?;

    if !canonical.is_file() {
        return Err(TinctError::IoError(format!(
            "Path '{}' is not a regular file",
            path.display()
        )));
    }

    Ok(canonical)
}

/// Create the output directory if needed and return its canonical form.
fn prepare_output_dir(path: &Path) -> Result<PathBuf, TinctError> {
    std::fs::create_dir_all(path).map_err(|e| {
        TinctError::IoError(format!(
            "Cannot create output directory '{}': {}",
            path.display(),
            e
        ))
    })?;

    let canonical = path.canonicalize().map_err(|e| {
        TinctError::IoError(format!(
            "Invalid output directory '{}': {}",
            path.display(),
            e
        ))
    })?;

    if !canonical.is_dir() {
        return Err(TinctError::IoError(format!(
            "Output directory '{}' is not a valid directory",
            path.display()
        )));
    }

    Ok(canonical)
}

// =============================================================================
// PIPELINE ASSEMBLY
// =============================================================================

/// Build a pipeline with one source per theme.
///
/// Each theme is read once, here; later runs work from that snapshot.
///
/// Metadata comes from the last theme that declares any; otherwise the
/// theme is named after the last file's stem.
pub fn open_pipeline(themes: &[PathBuf]) -> Result<Pipeline, TinctError> {
    if themes.is_empty() {
        return Err(TinctError::InvalidArgument(
            "at least one theme file is required".to_string(),
        ));
    }

    let mut sources = Vec::with_capacity(themes.len());
    let mut last_stem = String::new();
    for (priority, path) in themes.iter().enumerate() {
        let path = validate_file_path(path)?;
        let priority = i32::try_from(priority)
            .map_err(|_| TinctError::InvalidArgument("too many theme files".to_string()))?;
        last_stem = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        sources.push(ThemeSource::load(&path)?.with_priority(priority));
    }

    let metadata = sources
        .iter()
        .rev()
        .find_map(|source| source.theme().metadata.clone())
        .unwrap_or_else(|| PipelineMetadata::new(last_stem));

    let mut pipeline = Pipeline::new(metadata);
    for source in sources {
        pipeline.register_collector(source)?;
    }
    Ok(pipeline)
}

fn register_formatters(
    pipeline: &mut Pipeline,
    formats: &[OutputFormat],
) -> Result<(), TinctError> {
    let mut formats = formats.to_vec();
    formats.sort_unstable();
    formats.dedup();

    for format in formats {
        match format {
            OutputFormat::Vim => pipeline.register_formatter(VimFormatter)?,
            OutputFormat::Json => pipeline.register_formatter(JsonFormatter)?,
        }
    }
    Ok(())
}

fn diagnostic_lines(pipeline: &Pipeline) -> Vec<String> {
    pipeline
        .diagnostics()
        .snapshot()
        .iter()
        .map(ToString::to_string)
        .collect()
}

fn summary_json(pipeline: &Pipeline, summary: &RunSummary) -> serde_json::Value {
    serde_json::json!({
        "theme": pipeline.metadata().name,
        "summary": summary,
        "diagnostics": diagnostic_lines(pipeline),
    })
}

// =============================================================================
// BUILD COMMAND
// =============================================================================

/// Render the theme and write (or print) the results.
pub fn cmd_build(
    themes: &[PathBuf],
    out: &Path,
    formats: &[OutputFormat],
    to_stdout: bool,
    output: Output,
) -> Result<(), TinctError> {
    let mut pipeline = open_pipeline(themes)?;
    register_formatters(&mut pipeline, formats)?;

    if to_stdout {
        pipeline.register_writer(StdoutWriter)?;
    } else {
        pipeline.register_writer(FileWriter::new(prepare_output_dir(out)?))?;
    }

    let summary = pipeline.run()?;

    // Stdout carries the rendered files themselves.
    if to_stdout {
        return Ok(());
    }

    let written: Vec<PathBuf> = pipeline
        .get_writers::<FileWriter>(true)?
        .iter()
        .flat_map(|writer| writer.written())
        .collect();

    if output.json_mode {
        let mut report = summary_json(&pipeline, &summary);
        report["written"] = serde_json::json!(
            written
                .iter()
                .map(|path| path.to_string_lossy().into_owned())
                .collect::<Vec<_>>()
        );
        output.json(&report)?;
        return Ok(());
    }
    if output.quiet {
        return Ok(());
    }

    let groups = layered_styles(&pipeline.source_items()?).len();
    println!("Built {}", pipeline.metadata().name);
    println!("  Sources:     {}", summary.collectors);
    println!("  Groups:      {}", groups);
    println!("  Diagnostics: {}", summary.diagnostics);
    for path in &written {
        println!("  Wrote {}", path.display());
    }

    Ok(())
}

// =============================================================================
// CHECK COMMAND
// =============================================================================

/// Resolve and format every output without writing.
pub fn cmd_check(themes: &[PathBuf], strict: bool, output: Output) -> Result<(), TinctError> {
    let mut pipeline = open_pipeline(themes)?;
    register_formatters(&mut pipeline, &[OutputFormat::Vim, OutputFormat::Json])?;

    let summary = pipeline.run()?;
    let diagnostics = diagnostic_lines(&pipeline);

    if output.json_mode {
        output.json(&summary_json(&pipeline, &summary))?;
    } else if !output.quiet {
        let groups = layered_styles(&pipeline.source_items()?).len();
        println!("Theme {} is valid", pipeline.metadata().name);
        println!("  Sources:     {}", summary.collectors);
        println!("  Groups:      {}", groups);
        println!("  Diagnostics: {}", diagnostics.len());
        for line in &diagnostics {
            println!("    - {line}");
        }
    }

    if strict && !diagnostics.is_empty() {
        return Err(TinctError::InvalidTheme(format!(
            "{} diagnostic(s) reported in strict mode",
            diagnostics.len()
        )));
    }
    Ok(())
}

// =============================================================================
// RESOLVE COMMAND
// =============================================================================

/// Look up the final style of one group across all themes.
pub fn resolve_group(themes: &[PathBuf], group: &str) -> Result<ResolvedStyle, TinctError> {
    let mut pipeline = open_pipeline(themes)?;
    let resolved = pipeline.get_source_items::<ResolvedStyle>(true)?;

    // Later sources override earlier ones.
    resolved
        .iter()
        .rev()
        .find(|style| style.group.as_str() == group)
        .map(|style| style.as_ref().clone())
        .ok_or_else(|| TinctError::NotFound(format!("group '{group}' has no style")))
}

/// Print the style `group` resolves to.
pub fn cmd_resolve(themes: &[PathBuf], group: &str, output: Output) -> Result<(), TinctError> {
    let resolved = resolve_group(themes, group)?;

    if output.json_mode {
        let value = serde_json::to_value(&resolved)
            .map_err(|e| TinctError::SerializationError(e.to_string()))?;
        output.json(&value)?;
        return Ok(());
    }

    let style = &resolved.style;
    let mut parts: Vec<String> = [("fg", &style.fg), ("bg", &style.bg), ("sp", &style.sp)]
        .into_iter()
        .filter_map(|(slot, color)| color.as_ref().map(|c| format!("{slot}={c}")))
        .collect();
    parts.extend(style.attributes().into_iter().map(str::to_string));

    if parts.is_empty() {
        println!("{}: (no attributes)", resolved.group);
    } else {
        println!("{}: {}", resolved.group, parts.join(" "));
    }
    Ok(())
}
