//! Formatters for resolved styles.

use super::{RenderedFile, layered_styles};
use crate::theme::Style;
use std::fmt::Write as _;
use std::path::PathBuf;
use tinct_core::{Artifact, Formatter, Pipeline, PipelineMetadata, SourceItems, TinctError};

fn theme_name(metadata: &PipelineMetadata) -> Result<&str, TinctError> {
    let name = metadata.name.trim();
    if name.is_empty() {
        return Err(TinctError::InvalidTheme(
            "theme has no [metadata] name".to_string(),
        ));
    }
    Ok(name)
}

// =============================================================================
// VIM
// =============================================================================

/// Renders a Vim colorscheme of `:highlight` commands.
///
/// Output lands at `colors/<name>.vim`.
#[derive(Debug, Default)]
pub struct VimFormatter;

impl VimFormatter {
    fn highlight(group: &str, style: &Style) -> String {
        let mut line = format!("hi {group}");
        for (key, color) in [("guifg", &style.fg), ("guibg", &style.bg), ("guisp", &style.sp)] {
            if let Some(color) = color {
                let _ = write!(line, " {key}={color}");
            }
        }
        let attributes = style.attributes();
        if attributes.is_empty() {
            line.push_str(" gui=NONE");
        } else {
            let _ = write!(line, " gui={}", attributes.join(","));
        }
        line
    }
}

impl Formatter for VimFormatter {
    fn name(&self) -> &str {
        "vim"
    }

    fn format(&self, items: &SourceItems, pipeline: &mut Pipeline) -> Result<Artifact, TinctError> {
        let metadata = pipeline.metadata();
        let name = theme_name(metadata)?;

        let mut text = String::new();
        let _ = writeln!(text, "\" Name: {name}");
        for (label, value) in [
            ("Version", &metadata.version),
            ("Author", &metadata.author),
            ("Description", &metadata.description),
            ("License", &metadata.license),
        ] {
            if !value.is_empty() {
                let _ = writeln!(text, "\" {label}: {value}");
            }
        }
        text.push_str("\" Generated by tinct\n\n");
        text.push_str("hi clear\n");
        text.push_str("if exists(\"syntax_on\")\n  syntax reset\nendif\n");
        let _ = writeln!(text, "let g:colors_name = \"{name}\"\n");

        for (group, style) in layered_styles(items) {
            text.push_str(&Self::highlight(group.as_str(), style));
            text.push('\n');
        }

        Ok(Artifact::new(RenderedFile {
            path: PathBuf::from("colors").join(format!("{name}.vim")),
            text,
        }))
    }
}

// =============================================================================
// JSON
// =============================================================================

/// Renders metadata and styles as a JSON document at `<name>.json`.
#[derive(Debug, Default)]
pub struct JsonFormatter;

impl Formatter for JsonFormatter {
    fn name(&self) -> &str {
        "json"
    }

    fn priority(&self) -> i32 {
        10
    }

    fn format(&self, items: &SourceItems, pipeline: &mut Pipeline) -> Result<Artifact, TinctError> {
        let metadata = pipeline.metadata();
        let name = theme_name(metadata)?;

        let mut groups = serde_json::Map::new();
        for (group, style) in layered_styles(items) {
            let style = serde_json::to_value(style)
                .map_err(|e| TinctError::SerializationError(e.to_string()))?;
            groups.insert(group.to_string(), style);
        }

        let mut document = serde_json::Map::new();
        let metadata = serde_json::to_value(metadata)
            .map_err(|e| TinctError::SerializationError(e.to_string()))?;
        document.insert("metadata".to_string(), metadata);
        document.insert("groups".to_string(), serde_json::Value::Object(groups));

        let mut text = serde_json::to_string_pretty(&document)
            .map_err(|e| TinctError::SerializationError(e.to_string()))?;
        text.push('\n');

        Ok(Artifact::new(RenderedFile {
            path: PathBuf::from(format!("{name}.json")),
            text,
        }))
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn highlight_line_lists_colors_then_attributes() {
        let style = Style {
            fg: Some("#707070".to_string()),
            sp: Some("#ff0000".to_string()),
            italic: true,
            undercurl: true,
            ..Style::default()
        };
        assert_eq!(
            VimFormatter::highlight("Comment", &style),
            "hi Comment guifg=#707070 guisp=#ff0000 gui=italic,undercurl"
        );
    }

    #[test]
    fn plain_style_clears_attributes() {
        let style = Style {
            bg: Some("#000000".to_string()),
            ..Style::default()
        };
        assert_eq!(
            VimFormatter::highlight("Normal", &style),
            "hi Normal guibg=#000000 gui=NONE"
        );
    }

    #[test]
    fn unnamed_theme_is_rejected() {
        let metadata = PipelineMetadata::new("  ");
        let result = theme_name(&metadata);
        assert!(matches!(result, Err(TinctError::InvalidTheme(_))));
    }
}
