//! Config file loading and startup precedence

mod common;

use std::path::PathBuf;

use code_studio::cli::{CliArgs, StartupConfig};
use code_studio::config::{EditorConfig, DEFAULT_PREVIEW_FILE};
use code_studio::model::AppModel;
use code_studio::syntax::LanguageTag;
use code_studio::theme::ThemeId;
use tempfile::TempDir;

#[test]
fn test_missing_config_file_gives_defaults() {
    let dir = TempDir::new().unwrap();
    let config = EditorConfig::load_from(&dir.path().join("config.yaml"));
    assert_eq!(config, EditorConfig::default());
    assert_eq!(config.preview_file, PathBuf::from(DEFAULT_PREVIEW_FILE));
}

#[test]
fn test_config_file_is_read() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.yaml");
    std::fs::write(
        &path,
        "theme: solarized-light\nlanguage: html\nfont_size: 18\npreview_file: /tmp/p.html\n",
    )
    .unwrap();

    let config = EditorConfig::load_from(&path);
    assert_eq!(config.theme_id(), ThemeId::SolarizedLight);
    assert_eq!(config.language_tag(), LanguageTag::Html);
    assert_eq!(config.font_size, 18.0);
    assert_eq!(config.preview_file, PathBuf::from("/tmp/p.html"));
    assert_eq!(config.font_path, None);
}

#[test]
fn test_malformed_config_falls_back_to_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.yaml");
    std::fs::write(&path, "theme: [unclosed\n").unwrap();
    assert_eq!(EditorConfig::load_from(&path), EditorConfig::default());
}

#[test]
fn test_unknown_ids_fall_back() {
    let config = EditorConfig::from_yaml("theme: neon\nlanguage: cobol\n").unwrap();
    assert_eq!(config.theme_id(), ThemeId::Default);
    assert_eq!(config.language_tag(), LanguageTag::Python);
}

#[test]
fn test_partial_config_keeps_other_defaults() {
    let config = EditorConfig::from_yaml("theme: Dark Red\n").unwrap();
    assert_eq!(config.theme_id(), ThemeId::DarkRed);
    assert_eq!(config.font_size, EditorConfig::default().font_size);
    assert_eq!(config.language_tag(), LanguageTag::Python);
}

#[test]
fn test_cli_flags_override_config() {
    let editor = EditorConfig::from_yaml("theme: dark-blue\nlanguage: python\n").unwrap();
    let args = CliArgs {
        file: None,
        language: Some(LanguageTag::Html),
        theme: Some(ThemeId::LightGray),
    };
    let startup = args.into_config(editor);
    assert_eq!(startup.language, LanguageTag::Html);
    assert_eq!(startup.theme, ThemeId::LightGray);
}

#[test]
fn test_startup_file_is_loaded_unmodified() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("hello.py");
    std::fs::write(&path, "def hi():\n    print('hi')\n").unwrap();

    let args = CliArgs {
        file: Some(path.clone()),
        language: None,
        theme: None,
    };
    let model = AppModel::new(800, 600, args.into_config(EditorConfig::default()));

    assert_eq!(model.document.text(), "def hi():\n    print('hi')\n");
    assert_eq!(model.document.language, LanguageTag::Python);
    assert!(!model.document.is_modified);
    assert_eq!(model.document.file_path, Some(path));
    assert!(!model.document.line_highlights(0).is_empty());
}

#[test]
fn test_missing_startup_file_opens_empty_buffer() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("absent.html");
    let startup = StartupConfig {
        file: Some(path.clone()),
        language: LanguageTag::Html,
        theme: ThemeId::Default,
        editor: EditorConfig::default(),
    };
    let model = AppModel::new(800, 600, startup);

    assert_eq!(model.document.text(), "");
    assert_eq!(model.document.file_path, Some(path));
    assert!(model.ui.status_message.starts_with("Error loading"));
}

#[test]
fn test_fresh_model_matches_startup_state() {
    let model = AppModel::new(800, 600, common::startup(LanguageTag::Python));
    assert_eq!(model.document.text(), "");
    assert!(!model.document.is_modified);
    assert!(model.output.is_empty());
    assert_eq!(model.theme_id, ThemeId::Default);
    assert_eq!(model.editor.cursor.line, 0);
    assert_eq!(model.editor.cursor.column, 0);
}
