//! Writers for rendered files.

use super::RenderedFile;
use std::cell::RefCell;
use std::io::Write as _;
use std::path::{Component, Path, PathBuf};
use tinct_core::{Contents, Pipeline, TinctError, Writer};

// =============================================================================
// FILE WRITER
// =============================================================================

/// Writes every rendered file under an output directory.
#[derive(Debug)]
pub struct FileWriter {
    out_dir: PathBuf,
    written: RefCell<Vec<PathBuf>>,
}

impl FileWriter {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
            written: RefCell::new(Vec::new()),
        }
    }

    /// Files written by the last run, in artifact order.
    pub fn written(&self) -> Vec<PathBuf> {
        self.written.borrow().clone()
    }

    /// Join a rendered path onto the output directory.
    ///
    /// Rendered paths must stay inside the output directory: absolute
    /// paths and `..` components are rejected.
    fn target(&self, relative: &Path) -> Result<PathBuf, TinctError> {
        let contained = relative
            .components()
            .all(|component| matches!(component, Component::Normal(_) | Component::CurDir));
        if !contained || relative.as_os_str().is_empty() {
            return Err(TinctError::InvalidArgument(format!(
                "rendered path '{}' escapes the output directory",
                relative.display()
            )));
        }
        Ok(self.out_dir.join(relative))
    }
}

impl Writer for FileWriter {
    fn name(&self) -> &str {
        "files"
    }

    fn write(&self, contents: &Contents, _pipeline: &mut Pipeline) -> Result<(), TinctError> {
        let mut written = Vec::new();
        for file in contents.of_type::<RenderedFile>() {
            let target = self.target(&file.path)?;
            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    TinctError::IoError(format!(
                        "Cannot create directory '{}': {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
            std::fs::write(&target, &file.text).map_err(|e| {
                TinctError::IoError(format!("Cannot write '{}': {}", target.display(), e))
            })?;

            tracing::info!(path = %target.display(), bytes = file.text.len(), "wrote");
            written.push(target);
        }

        *self.written.borrow_mut() = written;
        Ok(())
    }
}

// =============================================================================
// STDOUT WRITER
// =============================================================================

/// Prints rendered files to standard output.
///
/// With more than one file each is preceded by a `==> path <==` header.
#[derive(Debug, Default)]
pub struct StdoutWriter;

impl StdoutWriter {
    fn render(contents: &Contents) -> String {
        let files: Vec<&RenderedFile> = contents.of_type::<RenderedFile>().collect();
        if let [single] = files.as_slice() {
            return single.text.clone();
        }

        files
            .iter()
            .map(|file| format!("==> {} <==\n{}", file.path.display(), file.text))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl Writer for StdoutWriter {
    fn name(&self) -> &str {
        "stdout"
    }

    fn write(&self, contents: &Contents, _pipeline: &mut Pipeline) -> Result<(), TinctError> {
        let text = Self::render(contents);
        let mut stdout = std::io::stdout().lock();
        stdout
            .write_all(text.as_bytes())
            .and_then(|()| stdout.flush())
            .map_err(|e| TinctError::IoError(format!("Cannot write to stdout: {e}")))
    }
}

// =============================================================================
// TESTS
// =============================================================================
