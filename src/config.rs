//! Editor configuration
//!
//! Reads user preferences from `~/.config/code-studio/config.yaml`. The file
//! is optional; a missing or malformed file means defaults. Runtime theme and
//! language switches are never written back.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::syntax::LanguageTag;
use crate::theme::ThemeId;

/// Default name of the HTML preview file, relative to the working directory
pub const DEFAULT_PREVIEW_FILE: &str = "temp_preview.html";

/// Editor configuration loaded at startup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Startup theme id (e.g. "default", "solarized-dark")
    pub theme: String,
    /// Startup language id (e.g. "python", "html")
    pub language: String,
    /// Font size in pixels
    pub font_size: f32,
    /// Monospace font file; a system font is searched when unset
    pub font_path: Option<PathBuf>,
    /// Where the HTML preview is written
    pub preview_file: PathBuf,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            theme: ThemeId::Default.id().to_string(),
            language: LanguageTag::Python.id().to_string(),
            font_size: 14.0,
            font_path: None,
            preview_file: PathBuf::from(DEFAULT_PREVIEW_FILE),
        }
    }
}

impl EditorConfig {
    /// Load config from the user config dir, or return defaults if not found
    pub fn load() -> Self {
        let Some(path) = crate::config_paths::config_file() else {
            tracing::debug!("No config directory available, using defaults");
            return Self::default();
        };
        Self::load_from(&path)
    }

    /// Load config from an explicit path, falling back to defaults
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            tracing::debug!(
                "Config file not found at {}, using defaults",
                path.display()
            );
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(content) => match Self::from_yaml(&content) {
                Ok(config) => {
                    tracing::info!("Loaded config from {}", path.display());
                    config
                }
                Err(e) => {
                    tracing::warn!("Failed to parse config at {}: {}", path.display(), e);
                    Self::default()
                }
            },
            Err(e) => {
                tracing::warn!("Failed to read config at {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn from_yaml(content: &str) -> Result<Self, String> {
        // An empty file deserializes to `()`, not a mapping
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let mut config: Self = serde_yaml::from_str(content).map_err(|e| e.to_string())?;
        if !(config.font_size.is_finite() && config.font_size >= 6.0) {
            tracing::warn!("Ignoring font_size {}, using default", config.font_size);
            config.font_size = Self::default().font_size;
        }
        Ok(config)
    }

    /// Configured theme, or Default if the id is unknown
    pub fn theme_id(&self) -> ThemeId {
        ThemeId::from_id(&self.theme).unwrap_or_else(|| {
            tracing::warn!("Unknown theme '{}' in config, using Default", self.theme);
            ThemeId::Default
        })
    }

    /// Configured language, or Python if the id is unknown
    pub fn language_tag(&self) -> LanguageTag {
        LanguageTag::from_id(&self.language).unwrap_or_else(|| {
            tracing::warn!(
                "Unknown language '{}' in config, using Python",
                self.language
            );
            LanguageTag::Python
        })
    }
}
