//! End-to-end tests for the build, check and resolve commands.

// Allow unwrap and panic in tests - these are standard for test code
#![allow(clippy::unwrap_used, clippy::panic)]

use std::path::{Path, PathBuf};
use tinct::cli::{Output, OutputFormat, cmd_build, cmd_check, open_pipeline, resolve_group};
use tinct::theme::ResolvedStyle;
use tinct_core::TinctError;

const QUIET: Output = Output {
    json_mode: false,
    quiet: true,
};

const BASE: &str = r##"
[metadata]
name = "base"

[styles]
Normal = { fg = "#c0c0c0", bg = "#1c1c1c" }
Comment = { fg = "#707070", italic = true }
String = { fg = "#98c379" }

[links]
Todo = "Comment"
"@comment" = "Comment"
"##;

const DUSK: &str = r##"
include = ["base.toml"]

[metadata]
name = "dusk"
version = "1.2.0"
author = "tinct"

[styles]
Comment = { fg = "#5c6370", italic = true }
"##;

fn write(dir: &Path, name: &str, text: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, text).unwrap();
    path
}

fn build(themes: &[PathBuf], out: &Path, formats: &[OutputFormat]) {
    cmd_build(themes, out, formats, false, QUIET).unwrap();
}

// =============================================================================
// BUILD
// =============================================================================

#[test]
fn test_build_writes_vim_and_json() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "base.toml", BASE);
    let dusk = write(dir.path(), "dusk.toml", DUSK);
    let out = dir.path().join("dist");

    build(&[dusk], &out, &[OutputFormat::Vim, OutputFormat::Json]);

    let vim = std::fs::read_to_string(out.join("colors/dusk.vim")).unwrap();
    assert!(vim.starts_with("\" Name: dusk\n\" Version: 1.2.0\n\" Author: tinct\n"));
    assert!(vim.contains("let g:colors_name = \"dusk\""));
    assert!(vim.contains("hi Comment guifg=#5c6370 gui=italic\n"));
    assert!(vim.contains("hi Todo guifg=#5c6370 gui=italic\n"));
    assert!(vim.contains("hi @comment guifg=#5c6370 gui=italic\n"));
    assert!(vim.contains("hi Normal guifg=#c0c0c0 guibg=#1c1c1c gui=NONE\n"));

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(out.join("dusk.json")).unwrap()).unwrap();
    assert_eq!(json["metadata"]["name"], "dusk");
    assert_eq!(json["groups"]["Todo"]["fg"], "#5c6370");
    assert_eq!(json["groups"]["Todo"]["italic"], true);
    assert!(json["groups"]["String"].get("bold").is_none());
}

#[test]
fn test_build_selected_format_only() {
    let dir = tempfile::tempdir().unwrap();
    let base = write(dir.path(), "base.toml", BASE);
    let out = dir.path().join("dist");

    build(&[base], &out, &[OutputFormat::Json, OutputFormat::Json]);

    assert!(out.join("base.json").is_file());
    assert!(!out.join("colors").exists());
}

#[test]
fn test_build_is_deterministic() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "base.toml", BASE);
    let dusk = write(dir.path(), "dusk.toml", DUSK);
    let first = dir.path().join("first");
    let second = dir.path().join("second");

    build(std::slice::from_ref(&dusk), &first, &[OutputFormat::Vim, OutputFormat::Json]);
    build(&[dusk], &second, &[OutputFormat::Json, OutputFormat::Vim]);

    for file in ["colors/dusk.vim", "dusk.json"] {
        assert_eq!(
            std::fs::read(first.join(file)).unwrap(),
            std::fs::read(second.join(file)).unwrap()
        );
    }
}

#[test]
fn test_theme_without_metadata_is_named_after_file() {
    let dir = tempfile::tempdir().unwrap();
    let theme = write(dir.path(), "ember.toml", "[styles]\nNormal = { fg = \"#ffffff\" }");
    let out = dir.path().join("dist");

    build(&[theme], &out, &[OutputFormat::Vim]);

    let vim = std::fs::read_to_string(out.join("colors/ember.vim")).unwrap();
    assert!(vim.contains("let g:colors_name = \"ember\""));
}

// =============================================================================
// LAYERING
// =============================================================================

#[test]
fn test_later_theme_overrides_earlier() {
    let dir = tempfile::tempdir().unwrap();
    let base = write(dir.path(), "base.toml", BASE);
    let accent = write(
        dir.path(),
        "accent.toml",
        "[styles]\nString = { fg = \"#e5c07b\", bold = true }",
    );

    let string = resolve_group(&[base.clone(), accent.clone()], "String").unwrap();
    assert_eq!(string.style.fg.as_deref(), Some("#e5c07b"));
    assert!(string.style.bold);

    let string = resolve_group(&[accent, base], "String").unwrap();
    assert_eq!(string.style.fg.as_deref(), Some("#98c379"));
}

#[test]
fn test_links_resolve_across_includes() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "base.toml", BASE);
    let dusk = write(dir.path(), "dusk.toml", DUSK);

    let todo = resolve_group(&[dusk], "Todo").unwrap();
    assert_eq!(todo.style.fg.as_deref(), Some("#5c6370"));
}

#[test]
fn test_resolve_unknown_group_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let base = write(dir.path(), "base.toml", BASE);

    let result = resolve_group(&[base], "Keyword");
    assert!(matches!(result, Err(TinctError::NotFound(_))));
}

#[test]
fn test_same_theme_twice_is_duplicate_source() {
    let dir = tempfile::tempdir().unwrap();
    let base = write(dir.path(), "base.toml", BASE);

    let result = open_pipeline(&[base.clone(), base]);
    assert!(matches!(result, Err(TinctError::DuplicateName { .. })));
}

#[test]
fn test_pipeline_keeps_theme_read_at_open() {
    let dir = tempfile::tempdir().unwrap();
    let base = write(dir.path(), "base.toml", BASE);

    let mut pipeline = open_pipeline(std::slice::from_ref(&base)).unwrap();
    std::fs::write(&base, "[styles]\nString = { fg = \"#ff0000\" }").unwrap();

    assert_eq!(pipeline.metadata().name, "base");
    let resolved = pipeline.get_source_items::<ResolvedStyle>(true).unwrap();
    let string = resolved
        .iter()
        .find(|style| style.group.as_str() == "String")
        .unwrap();
    assert_eq!(string.style.fg.as_deref(), Some("#98c379"));
    assert!(resolved.iter().any(|style| style.group.as_str() == "Todo"));
}

// =============================================================================
// CHECK
// =============================================================================

#[test]
fn test_check_reports_duplicates_only_in_strict_mode() {
    let dir = tempfile::tempdir().unwrap();
    let theme = write(
        dir.path(),
        "dup.toml",
        "[styles]\nComment = { fg = \"#707070\" }\nTodo = { fg = \"#ffff00\" }\n[links]\nTodo = \"Comment\"",
    );

    assert!(cmd_check(std::slice::from_ref(&theme), false, QUIET).is_ok());

    let result = cmd_check(&[theme], true, QUIET);
    assert!(matches!(result, Err(TinctError::InvalidTheme(_))));
}

#[test]
fn test_check_fails_on_link_cycle() {
    let dir = tempfile::tempdir().unwrap();
    let theme = write(
        dir.path(),
        "cycle.toml",
        "[links]\nA = \"B\"\nB = \"C\"\nC = \"A\"",
    );

    let err = cmd_check(&[theme], false, QUIET).unwrap_err();
    assert!(matches!(err, TinctError::UnitFailed { .. }));
    assert!(matches!(err.root_cause(), TinctError::CycleDetected { .. }));
}

#[test]
fn test_check_fails_on_dangling_link() {
    let dir = tempfile::tempdir().unwrap();
    let theme = write(dir.path(), "dangling.toml", "[links]\nTodo = \"Missing\"");

    let err = cmd_check(&[theme], false, QUIET).unwrap_err();
    assert!(matches!(err.root_cause(), TinctError::UnresolvedGroup(_)));
}

#[test]
fn test_missing_theme_file() {
    let dir = tempfile::tempdir().unwrap();

    let result = cmd_check(&[dir.path().join("nope.toml")], false, QUIET);
    assert!(matches!(result, Err(TinctError::IoError(_))));
}
