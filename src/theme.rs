//! Theme system for the editor
//!
//! Six fixed themes, each a YAML file embedded at compile time. A theme is
//! applied by replacing the whole [`Theme`] value; switching is never
//! persisted, the configured theme is the one used at startup.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use crate::syntax::HighlightCategory;

// Embed theme YAML files at compile time
pub const DEFAULT_YAML: &str = include_str!("../themes/default.yaml");
pub const DARK_BLUE_YAML: &str = include_str!("../themes/dark-blue.yaml");
pub const DARK_RED_YAML: &str = include_str!("../themes/dark-red.yaml");
pub const LIGHT_GRAY_YAML: &str = include_str!("../themes/light-gray.yaml");
pub const SOLARIZED_DARK_YAML: &str = include_str!("../themes/solarized-dark.yaml");
pub const SOLARIZED_LIGHT_YAML: &str = include_str!("../themes/solarized-light.yaml");

/// Identifier of a built-in theme, in menu order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ThemeId {
    #[default]
    Default,
    DarkBlue,
    DarkRed,
    LightGray,
    SolarizedDark,
    SolarizedLight,
}

impl ThemeId {
    /// All themes in the order the Themes menu lists them
    pub const ALL: &'static [ThemeId] = &[
        ThemeId::Default,
        ThemeId::DarkBlue,
        ThemeId::DarkRed,
        ThemeId::LightGray,
        ThemeId::SolarizedDark,
        ThemeId::SolarizedLight,
    ];

    /// Stable identifier for config and CLI (e.g. "dark-blue")
    pub fn id(self) -> &'static str {
        match self {
            ThemeId::Default => "default",
            ThemeId::DarkBlue => "dark-blue",
            ThemeId::DarkRed => "dark-red",
            ThemeId::LightGray => "light-gray",
            ThemeId::SolarizedDark => "solarized-dark",
            ThemeId::SolarizedLight => "solarized-light",
        }
    }

    /// Menu label
    pub fn label(self) -> &'static str {
        match self {
            ThemeId::Default => "Default",
            ThemeId::DarkBlue => "Dark Blue",
            ThemeId::DarkRed => "Dark Red",
            ThemeId::LightGray => "Light Gray",
            ThemeId::SolarizedDark => "Solarized Dark",
            ThemeId::SolarizedLight => "Solarized Light",
        }
    }

    /// Embedded YAML source
    pub fn yaml(self) -> &'static str {
        match self {
            ThemeId::Default => DEFAULT_YAML,
            ThemeId::DarkBlue => DARK_BLUE_YAML,
            ThemeId::DarkRed => DARK_RED_YAML,
            ThemeId::LightGray => LIGHT_GRAY_YAML,
            ThemeId::SolarizedDark => SOLARIZED_DARK_YAML,
            ThemeId::SolarizedLight => SOLARIZED_LIGHT_YAML,
        }
    }

    /// Look up a theme by id or label, ignoring case, spaces and underscores
    pub fn from_id(value: &str) -> Option<Self> {
        let normalized: String = value
            .trim()
            .chars()
            .map(|c| match c {
                ' ' | '_' => '-',
                c => c.to_ascii_lowercase(),
            })
            .collect();
        ThemeId::ALL.iter().copied().find(|t| t.id() == normalized)
    }
}

impl fmt::Display for ThemeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ThemeId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ThemeId::from_id(s).ok_or_else(|| {
            let known: Vec<&str> = ThemeId::ALL.iter().map(|t| t.id()).collect();
            format!("unknown theme '{}' (expected one of: {})", s, known.join(", "))
        })
    }
}

/// RGBA color (0-255 per channel)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    /// Create a new color from RGB values (alpha defaults to 255)
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Create a new color from RGBA values
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Convert to ARGB u32 for softbuffer
    pub fn to_argb_u32(&self) -> u32 {
        ((self.a as u32) << 24) | ((self.r as u32) << 16) | ((self.g as u32) << 8) | (self.b as u32)
    }

    /// Return a new color with the specified alpha value
    pub const fn with_alpha(&self, a: u8) -> Self {
        Self {
            r: self.r,
            g: self.g,
            b: self.b,
            a,
        }
    }

    /// Perceived brightness, 0-255
    pub fn luminance(&self) -> u8 {
        ((self.r as u32 * 299 + self.g as u32 * 587 + self.b as u32 * 114) / 1000) as u8
    }

    pub fn is_light(&self) -> bool {
        self.luminance() > 128
    }

    /// Shift toward the contrasting end: light colors darken, dark colors lighten
    pub fn shade(&self, amount: u8) -> Self {
        let step = |c: u8| {
            if self.is_light() {
                c.saturating_sub(amount)
            } else {
                c.saturating_add(amount)
            }
        };
        Self {
            r: step(self.r),
            g: step(self.g),
            b: step(self.b),
            a: self.a,
        }
    }

    /// Parse from "#RRGGBB" or "#RRGGBBAA" hex string
    pub fn from_hex(s: &str) -> Result<Self, String> {
        let s = s.trim_start_matches('#');
        let channel = |range: std::ops::Range<usize>| {
            s.get(range)
                .ok_or_else(|| format!("Invalid color format: {}", s))
                .and_then(|hex| u8::from_str_radix(hex, 16).map_err(|e| e.to_string()))
        };
        match s.len() {
            6 => Ok(Color::rgb(channel(0..2)?, channel(2..4)?, channel(4..6)?)),
            8 => Ok(Color::rgba(
                channel(0..2)?,
                channel(2..4)?,
                channel(4..6)?,
                channel(6..8)?,
            )),
            _ => Err(format!("Invalid color format: {}", s)),
        }
    }
}

/// Raw theme data as parsed from YAML
#[derive(Debug, Clone, Deserialize)]
pub struct ThemeData {
    pub version: u32,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub ui: UiThemeData,
    #[serde(default)]
    pub syntax: SyntaxThemeData,
}

/// UI theme colors (raw strings from YAML)
#[derive(Debug, Clone, Deserialize)]
pub struct UiThemeData {
    pub window: WindowThemeData,
    pub editor: EditorThemeData,
    pub output: PaneThemeData,
    #[serde(default)]
    pub status_bar: Option<PaneThemeData>,
    #[serde(default)]
    pub overlay: OverlayThemeData,
}

/// Window chrome: menu bar, toolbar, dialog frames
#[derive(Debug, Clone, Deserialize)]
pub struct WindowThemeData {
    pub background: String,
    #[serde(default)]
    pub foreground: Option<String>,
    #[serde(default)]
    pub button_background: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EditorThemeData {
    pub background: String,
    pub foreground: String,
    #[serde(default)]
    pub cursor_color: Option<String>,
    #[serde(default)]
    pub current_line_background: Option<String>,
}

/// A plain background/foreground pair
#[derive(Debug, Clone, Deserialize)]
pub struct PaneThemeData {
    pub background: String,
    pub foreground: String,
}

/// Overlay colors (all optional, derived from the window colors)
#[derive(Debug, Clone, Deserialize, Default)]
pub struct OverlayThemeData {
    #[serde(default)]
    pub border: Option<String>,
    #[serde(default)]
    pub background: Option<String>,
    #[serde(default)]
    pub foreground: Option<String>,
    #[serde(default)]
    pub input_background: Option<String>,
    #[serde(default)]
    pub selection_background: Option<String>,
}

/// Syntax colors (all optional, defaulting to the fixed palette)
#[derive(Debug, Clone, Deserialize, Default)]
pub struct SyntaxThemeData {
    #[serde(default)]
    pub keyword: Option<String>,
    #[serde(default)]
    pub function: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub string: Option<String>,
    #[serde(default)]
    pub number: Option<String>,
}

/// Resolved theme with parsed colors
#[derive(Debug, Clone, PartialEq)]
pub struct Theme {
    pub name: String,
    pub window: WindowTheme,
    pub editor: EditorTheme,
    pub output: PaneTheme,
    pub status_bar: PaneTheme,
    pub overlay: OverlayTheme,
    pub syntax: SyntaxTheme,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WindowTheme {
    pub background: Color,
    pub foreground: Color,
    pub button_background: Color,
    /// Foreground for disabled toolbar buttons
    pub disabled_foreground: Color,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EditorTheme {
    pub background: Color,
    pub foreground: Color,
    pub cursor_color: Color,
    pub current_line_background: Color,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PaneTheme {
    pub background: Color,
    pub foreground: Color,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OverlayTheme {
    /// Optional border color (None = no border)
    pub border: Option<Color>,
    pub background: Color,
    pub foreground: Color,
    /// Input field background color
    pub input_background: Color,
    /// Hovered or selected entry in menus
    pub selection_background: Color,
}

/// Colors for highlight categories
#[derive(Debug, Clone, PartialEq)]
pub struct SyntaxTheme {
    pub keyword: Color,
    pub function: Color,
    pub comment: Color,
    pub string: Color,
    pub number: Color,
}

impl Default for SyntaxTheme {
    fn default() -> Self {
        Self {
            keyword: Color::rgb(0xFF, 0x00, 0x00),
            function: Color::rgb(0x00, 0xFF, 0x00),
            comment: Color::rgb(0x80, 0x80, 0x80),
            string: Color::rgb(0x00, 0xFF, 0xFF),
            number: Color::rgb(0xFF, 0xFF, 0x00),
        }
    }
}

impl SyntaxTheme {
    pub fn color_for(&self, category: HighlightCategory) -> Color {
        match category {
            HighlightCategory::Keyword => self.keyword,
            HighlightCategory::CallIdentifier => self.function,
            HighlightCategory::Comment => self.comment,
            HighlightCategory::StringLiteral => self.string,
            HighlightCategory::Number => self.number,
        }
    }
}

fn parse_optional(value: &Option<String>) -> Result<Option<Color>, String> {
    value.as_deref().map(Color::from_hex).transpose()
}

impl Theme {
    /// Load theme from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self, String> {
        let data: ThemeData =
            serde_yaml::from_str(yaml).map_err(|e| format!("YAML parse error: {}", e))?;
        Self::from_data(data)
    }

    /// Resolve a built-in theme, falling back to the hardcoded default
    pub fn for_id(id: ThemeId) -> Self {
        match Theme::from_yaml(id.yaml()) {
            Ok(theme) => theme,
            Err(e) => {
                tracing::warn!("Failed to load theme '{}': {}", id.id(), e);
                Theme::fallback()
            }
        }
    }

    /// Convert raw theme data to resolved theme
    pub fn from_data(data: ThemeData) -> Result<Self, String> {
        let ui = &data.ui;

        let editor_bg = Color::from_hex(&ui.editor.background)?;
        let editor_fg = Color::from_hex(&ui.editor.foreground)?;
        let editor = EditorTheme {
            background: editor_bg,
            foreground: editor_fg,
            cursor_color: parse_optional(&ui.editor.cursor_color)?.unwrap_or(editor_fg),
            current_line_background: parse_optional(&ui.editor.current_line_background)?
                .unwrap_or(editor_bg),
        };

        let window_bg = Color::from_hex(&ui.window.background)?;
        let window_fg = parse_optional(&ui.window.foreground)?.unwrap_or(editor_fg);
        let window = WindowTheme {
            background: window_bg,
            foreground: window_fg,
            button_background: parse_optional(&ui.window.button_background)?
                .unwrap_or_else(|| window_bg.shade(0x20)),
            disabled_foreground: window_fg.with_alpha(0x70),
        };

        let output = PaneTheme {
            background: Color::from_hex(&ui.output.background)?,
            foreground: Color::from_hex(&ui.output.foreground)?,
        };

        let status_bar = match &ui.status_bar {
            Some(bar) => PaneTheme {
                background: Color::from_hex(&bar.background)?,
                foreground: Color::from_hex(&bar.foreground)?,
            },
            None => PaneTheme {
                background: window_bg.shade(0x14),
                foreground: window_fg,
            },
        };

        let overlay = OverlayTheme {
            border: parse_optional(&ui.overlay.border)?,
            background: parse_optional(&ui.overlay.background)?
                .unwrap_or_else(|| window_bg.shade(0x10)),
            foreground: parse_optional(&ui.overlay.foreground)?.unwrap_or(window_fg),
            input_background: parse_optional(&ui.overlay.input_background)?.unwrap_or(editor_bg),
            selection_background: parse_optional(&ui.overlay.selection_background)?
                .unwrap_or(Color::rgb(0x26, 0x4F, 0x78)),
        };

        let defaults = SyntaxTheme::default();
        let syntax = SyntaxTheme {
            keyword: parse_optional(&data.syntax.keyword)?.unwrap_or(defaults.keyword),
            function: parse_optional(&data.syntax.function)?.unwrap_or(defaults.function),
            comment: parse_optional(&data.syntax.comment)?.unwrap_or(defaults.comment),
            string: parse_optional(&data.syntax.string)?.unwrap_or(defaults.string),
            number: parse_optional(&data.syntax.number)?.unwrap_or(defaults.number),
        };

        Ok(Theme {
            name: data.name,
            window,
            editor,
            output,
            status_bar,
            overlay,
            syntax,
        })
    }

    /// Hardcoded copy of the Default theme, used if YAML parsing fails
    fn fallback() -> Self {
        let chrome = Color::rgb(0x2E, 0x2E, 0x2E);
        let white = Color::rgb(0xFF, 0xFF, 0xFF);
        Theme {
            name: "Default".to_string(),
            window: WindowTheme {
                background: chrome,
                foreground: white,
                button_background: chrome.shade(0x20),
                disabled_foreground: white.with_alpha(0x70),
            },
            editor: EditorTheme {
                background: chrome,
                foreground: white,
                cursor_color: white,
                current_line_background: chrome,
            },
            output: PaneTheme {
                background: Color::rgb(0x00, 0x00, 0x00),
                foreground: Color::rgb(0x00, 0xFF, 0x00),
            },
            status_bar: PaneTheme {
                background: chrome.shade(0x14),
                foreground: white,
            },
            overlay: OverlayTheme {
                border: None,
                background: chrome.shade(0x10),
                foreground: white,
                input_background: chrome,
                selection_background: Color::rgb(0x26, 0x4F, 0x78),
            },
            syntax: SyntaxTheme::default(),
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::for_id(ThemeId::Default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_matches_embedded_default() {
        assert_eq!(Theme::fallback(), Theme::from_yaml(DEFAULT_YAML).unwrap());
    }

    #[test]
    fn test_shade_direction() {
        assert_eq!(Color::rgb(0x10, 0x10, 0x10).shade(0x10), Color::rgb(0x20, 0x20, 0x20));
        assert_eq!(Color::rgb(0xF0, 0xF0, 0xF0).shade(0x10), Color::rgb(0xE0, 0xE0, 0xE0));
        assert_eq!(Color::rgb(0xFF, 0x00, 0x00).shade(0x80).r, 0xFF);
    }

    #[test]
    fn test_from_hex_rejects_bad_input() {
        assert!(Color::from_hex("#12345").is_err());
        assert!(Color::from_hex("#zzzzzz").is_err());
        assert!(Color::from_hex("#ééé").is_err());
    }
}
