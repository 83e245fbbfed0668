//! Command-line argument parsing
//!
//! Supports:
//! - Loading a file into the buffer at startup
//! - Overriding the configured language and theme

use std::path::PathBuf;

use clap::Parser;

use crate::config::EditorConfig;
use crate::syntax::LanguageTag;
use crate::theme::ThemeId;

/// A minimal code editor with a built-in script runner
#[derive(Parser, Debug)]
#[command(name = "code-studio", version, about = "A minimal code editor")]
pub struct CliArgs {
    /// File to load into the buffer
    #[arg(value_name = "FILE")]
    pub file: Option<PathBuf>,

    /// Initial language (python, html)
    #[arg(short, long, value_name = "LANG")]
    pub language: Option<LanguageTag>,

    /// Initial theme (e.g. default, dark-blue, solarized-light)
    #[arg(short, long, value_name = "THEME")]
    pub theme: Option<ThemeId>,
}

/// Startup settings after merging CLI arguments over the config file
#[derive(Debug, Clone)]
pub struct StartupConfig {
    pub file: Option<PathBuf>,
    pub language: LanguageTag,
    pub theme: ThemeId,
    pub editor: EditorConfig,
}

impl CliArgs {
    /// Merge with the loaded config
    ///
    /// Precedence for the language: `--language`, then the file extension,
    /// then the config file.
    pub fn into_config(self, editor: EditorConfig) -> StartupConfig {
        let language = self
            .language
            .or_else(|| self.file.as_deref().and_then(LanguageTag::from_path))
            .unwrap_or_else(|| editor.language_tag());
        let theme = self.theme.unwrap_or_else(|| editor.theme_id());

        StartupConfig {
            file: self.file,
            language,
            theme,
            editor,
        }
    }
}
