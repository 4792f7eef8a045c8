//! # Theme Files
//!
//! TOML theme definitions.
//!
//! ```toml
//! include = ["base.toml"]
//!
//! [metadata]
//! name = "dusk"
//! version = "1.0.0"
//!
//! [styles]
//! Normal = { fg = "#c0c0c0", bg = "#1c1c1c" }
//! Comment = { fg = "#707070", italic = true }
//!
//! [links]
//! "@comment" = "Comment"
//! ```
//!
//! `styles` assign terminal styles, `links` alias one group to another.
//! Includes are resolved relative to the including file.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use tinct_core::{GroupResolver, PipelineMetadata, TinctError};

/// Maximum theme file size (4 MB).
const MAX_THEME_FILE_SIZE: u64 = 4 * 1024 * 1024;

/// Maximum include nesting.
const MAX_INCLUDE_DEPTH: usize = 32;

// =============================================================================
// GROUPS AND STYLES
// =============================================================================

/// A highlight group name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Group(pub String);

impl Group {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A terminal style: colors plus attributes.
///
/// Colors are passed through verbatim to the formatters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Style {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fg: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bg: Option<String>,
    /// Special color (underline/undercurl).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sp: Option<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub bold: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub italic: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub underline: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub undercurl: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub strikethrough: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub reverse: bool,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl Style {
    /// Enabled attributes in a fixed order.
    #[must_use]
    pub fn attributes(&self) -> Vec<&'static str> {
        [
            (self.bold, "bold"),
            (self.italic, "italic"),
            (self.underline, "underline"),
            (self.undercurl, "undercurl"),
            (self.strikethrough, "strikethrough"),
            (self.reverse, "reverse"),
        ]
        .into_iter()
        .filter_map(|(on, name)| on.then_some(name))
        .collect()
    }

    fn colors(&self) -> impl Iterator<Item = (&'static str, &String)> {
        [("fg", &self.fg), ("bg", &self.bg), ("sp", &self.sp)]
            .into_iter()
            .filter_map(|(slot, color)| color.as_ref().map(|c| (slot, c)))
    }
}

/// A group together with the style it resolved to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedStyle {
    pub group: Group,
    pub style: Style,
}

// =============================================================================
// THEME FILE
// =============================================================================

/// Parsed contents of one theme file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ThemeFile {
    #[serde(default)]
    pub include: Vec<PathBuf>,
    #[serde(default)]
    pub metadata: Option<PipelineMetadata>,
    #[serde(default)]
    pub styles: BTreeMap<String, Style>,
    #[serde(default)]
    pub links: BTreeMap<String, String>,
}

impl ThemeFile {
    /// Parse theme TOML.
    pub fn parse(text: &str) -> Result<Self, TinctError> {
        let theme: ThemeFile =
            toml::from_str(text).map_err(|e| TinctError::SerializationError(e.to_string()))?;
        theme.validate()?;
        Ok(theme)
    }

    /// Read and parse a theme file.
    pub fn load(path: &Path) -> Result<Self, TinctError> {
        let metadata = std::fs::metadata(path).map_err(|e| {
            TinctError::IoError(format!("Cannot read theme '{}': {}", path.display(), e))
        })?;
        if metadata.len() > MAX_THEME_FILE_SIZE {
            return Err(TinctError::InvalidTheme(format!(
                "'{}' is {} bytes, maximum is {} bytes",
                path.display(),
                metadata.len(),
                MAX_THEME_FILE_SIZE
            )));
        }

        let text = std::fs::read_to_string(path).map_err(|e| {
            TinctError::IoError(format!("Cannot read theme '{}': {}", path.display(), e))
        })?;
        Self::parse(&text).map_err(|e| match e {
            TinctError::SerializationError(msg) => {
                TinctError::SerializationError(format!("{}: {}", path.display(), msg))
            }
            other => other,
        })
    }

    /// Reject group names and colors that are empty or contain whitespace.
    pub fn validate(&self) -> Result<(), TinctError> {
        let names = self
            .styles
            .keys()
            .chain(self.links.keys())
            .chain(self.links.values());
        for name in names {
            if name.is_empty() || name.contains(char::is_whitespace) {
                return Err(TinctError::InvalidTheme(format!(
                    "invalid group name '{name}'"
                )));
            }
        }

        for (group, style) in &self.styles {
            for (slot, color) in style.colors() {
                if color.trim().is_empty() || color.contains(char::is_whitespace) {
                    return Err(TinctError::InvalidTheme(format!(
                        "group {group}: invalid {slot} color '{color}'"
                    )));
                }
            }
        }

        Ok(())
    }

    /// Includes resolved against the directory of `path`.
    #[must_use]
    pub fn include_paths(&self, path: &Path) -> Vec<PathBuf> {
        let base = path.parent().unwrap_or(Path::new("."));
        self.include
            .iter()
            .map(|include| {
                if include.is_absolute() {
                    include.clone()
                } else {
                    base.join(include)
                }
            })
            .collect()
    }
}

// =============================================================================
// LAYERED THEME
// =============================================================================

/// A theme file with its includes flattened into one assignment set.
///
/// Included files are lower layers. When a layer assigns a group, that
/// group's assignment from every lower layer is dropped, whether it was
/// a style or a link. Within a single file a group listed in both tables
/// is kept as is so the resolver can report it.
#[derive(Debug, Clone, Default)]
pub struct Theme {
    pub metadata: Option<PipelineMetadata>,
    pub styles: BTreeMap<String, Style>,
    pub links: BTreeMap<String, String>,
    /// Every file that contributed, lowest layer first.
    pub files: Vec<PathBuf>,
}

impl Theme {
    /// Load `path` and everything it includes.
    pub fn load(path: &Path) -> Result<Self, TinctError> {
        let mut theme = Theme::default();
        let mut stack = Vec::new();
        theme.layer(path, &mut stack)?;
        Ok(theme)
    }

    fn layer(&mut self, path: &Path, stack: &mut Vec<PathBuf>) -> Result<(), TinctError> {
        let canonical = path.canonicalize().map_err(|e| {
            TinctError::IoError(format!("Invalid theme path '{}': {}", path.display(), e))
        })?;
        if stack.contains(&canonical) {
            return Err(TinctError::InvalidTheme(format!(
                "include cycle through '{}'",
                canonical.display()
            )));
        }
        if stack.len() >= MAX_INCLUDE_DEPTH {
            return Err(TinctError::InvalidTheme(format!(
                "includes nested deeper than {MAX_INCLUDE_DEPTH}"
            )));
        }

        let file = ThemeFile::load(&canonical)?;
        stack.push(canonical.clone());
        for include in file.include_paths(&canonical) {
            self.layer(&include, stack)?;
        }
        stack.pop();

        tracing::debug!(
            theme = %canonical.display(),
            styles = file.styles.len(),
            links = file.links.len(),
            "layer"
        );
        self.overlay(file);
        self.files.push(canonical);
        Ok(())
    }

    fn overlay(&mut self, file: ThemeFile) {
        for group in file.styles.keys().chain(file.links.keys()) {
            self.styles.remove(group);
            self.links.remove(group);
        }
        self.styles.extend(file.styles);
        self.links.extend(file.links);
        if file.metadata.is_some() {
            self.metadata = file.metadata;
        }
    }

    /// Feed every assignment into a resolver: styles first, then links.
    ///
    /// A group that appears in both tables keeps its style; the link is
    /// reported as a duplicate assignment.
    pub fn apply(&self, resolver: &mut GroupResolver<Group, Style>) {
        for (group, style) in &self.styles {
            resolver.set(Group::new(group), style.clone());
        }
        for (from, to) in &self.links {
            resolver.link(Group::new(from), Group::new(to));
        }
    }

    /// Resolve every group that has a style at the end of its chain.
    pub fn resolve(
        &self,
        resolver: &mut GroupResolver<Group, Style>,
    ) -> Result<Vec<ResolvedStyle>, TinctError> {
        self.apply(resolver);
        Ok(resolver
            .collect_resolved()?
            .into_iter()
            .map(|(group, style)| ResolvedStyle { group, style })
            .collect())
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const DUSK: &str = r##"
        include = ["base.toml"]

        [metadata]
        name = "dusk"
        version = "1.0.0"

        [styles]
        Normal = { fg = "#c0c0c0", bg = "#1c1c1c" }
        Comment = { fg = "#707070", italic = true }

        [links]
        "@comment" = "Comment"
        Todo = "Comment"
    "##;

    #[test]
    fn parses_all_sections() {
        let theme = ThemeFile::parse(DUSK).expect("parse");

        assert_eq!(theme.include, vec![PathBuf::from("base.toml")]);
        assert_eq!(theme.metadata.map(|m| m.name), Some("dusk".to_string()));
        assert_eq!(theme.styles.len(), 2);
        assert_eq!(theme.links.get("Todo").map(String::as_str), Some("Comment"));
        assert!(theme.styles["Comment"].italic);
    }

    #[test]
    fn unknown_style_keys_are_rejected() {
        let result = ThemeFile::parse("[styles]\nNormal = { fg = \"#fff\", blink = true }");
        assert!(matches!(result, Err(TinctError::SerializationError(_))));
    }

    #[test]
    fn blank_colors_are_rejected() {
        let result = ThemeFile::parse("[styles]\nNormal = { fg = \"  \" }");
        assert!(matches!(result, Err(TinctError::InvalidTheme(_))));
    }

    fn single(text: &str) -> Theme {
        let mut theme = Theme::default();
        theme.overlay(ThemeFile::parse(text).expect("parse"));
        theme
    }

    fn write(dir: &Path, name: &str, text: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, text).expect("write theme");
        path
    }

    #[test]
    fn apply_resolves_links_through_styles() {
        let theme = single(DUSK);
        let mut resolver = GroupResolver::new();
        theme.apply(&mut resolver);

        let todo = resolver.resolve(&Group::new("Todo")).expect("resolve");
        assert_eq!(todo.map(|s| s.fg), Some(Some("#707070".to_string())));
        assert!(resolver.diagnostics().is_empty());
    }

    #[test]
    fn group_in_both_tables_keeps_style() {
        let theme = single(
            "[styles]\nComment = { fg = \"#707070\" }\nTodo = { fg = \"#ffff00\" }\n[links]\nTodo = \"Comment\"",
        );
        let mut resolver = GroupResolver::new();
        theme.apply(&mut resolver);

        let todo = resolver.resolve(&Group::new("Todo")).expect("resolve");
        assert_eq!(todo.and_then(|s| s.fg), Some("#ffff00".to_string()));
        assert_eq!(resolver.diagnostics().len(), 1);
    }

    #[test]
    fn attributes_in_fixed_order() {
        let style = Style {
            reverse: true,
            bold: true,
            ..Style::default()
        };
        assert_eq!(style.attributes(), vec!["bold", "reverse"]);
    }

    #[test]
    fn include_paths_are_relative_to_theme() {
        let theme = ThemeFile::parse(DUSK).expect("parse");
        let paths = theme.include_paths(Path::new("themes/dusk.toml"));
        assert_eq!(paths, vec![PathBuf::from("themes/base.toml")]);
    }

    #[test]
    fn including_file_overrides_lower_layers() {
        let dir = tempfile::tempdir().expect("tempdir");
        write(
            dir.path(),
            "base.toml",
            r##"
            [metadata]
            name = "base"
            [styles]
            Comment = { fg = "#707070" }
            Todo = { fg = "#ff0000" }
            [links]
            String = "Comment"
            "##,
        );
        let root = write(
            dir.path(),
            "dusk.toml",
            r##"
            include = ["base.toml"]
            [metadata]
            name = "dusk"
            [styles]
            String = { fg = "#00ff00" }
            [links]
            Todo = "Comment"
            "##,
        );

        let theme = Theme::load(&root).expect("load");
        assert_eq!(theme.files.len(), 2);
        assert_eq!(theme.metadata.as_ref().map(|m| m.name.as_str()), Some("dusk"));
        assert!(!theme.links.contains_key("String"));
        assert!(!theme.styles.contains_key("Todo"));

        let mut resolver = GroupResolver::new();
        let resolved = theme.resolve(&mut resolver).expect("resolve");
        let todo = resolved.iter().find(|r| r.group.as_str() == "Todo").expect("Todo");
        assert_eq!(todo.style.fg.as_deref(), Some("#707070"));
        assert!(resolver.diagnostics().is_empty());
    }

    #[test]
    fn include_cycles_are_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        write(dir.path(), "a.toml", "include = [\"b.toml\"]");
        let b = write(dir.path(), "b.toml", "include = [\"a.toml\"]");

        let result = Theme::load(&b);
        assert!(matches!(result, Err(TinctError::InvalidTheme(_))));
    }

    #[test]
    fn missing_include_is_io_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let root = write(dir.path(), "root.toml", "include = [\"gone.toml\"]");

        let result = Theme::load(&root);
        assert!(matches!(result, Err(TinctError::IoError(_))));
    }
}
