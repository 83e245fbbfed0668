//! Monospace font discovery
//!
//! The editor draws with a Courier-like monospace face. A font file set in
//! the config wins; otherwise well-known system locations are searched.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use fontdue::{Font, FontSettings};

/// System font files tried in order, Courier-metric faces first
const SYSTEM_FONT_CANDIDATES: &[&str] = &[
    // Linux
    "/usr/share/fonts/truetype/liberation/LiberationMono-Regular.ttf",
    "/usr/share/fonts/liberation-mono/LiberationMono-Regular.ttf",
    "/usr/share/fonts/TTF/LiberationMono-Regular.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSansMono.ttf",
    "/usr/share/fonts/dejavu-sans-mono-fonts/DejaVuSansMono.ttf",
    "/usr/share/fonts/TTF/DejaVuSansMono.ttf",
    "/usr/share/fonts/truetype/freefont/FreeMono.ttf",
    "/usr/share/fonts/gnu-free/FreeMono.otf",
    // macOS
    "/System/Library/Fonts/Supplemental/Courier New.ttf",
    "/Library/Fonts/Courier New.ttf",
    "/System/Library/Fonts/Menlo.ttc",
    // Windows
    "C:\\Windows\\Fonts\\cour.ttf",
    "C:\\Windows\\Fonts\\consola.ttf",
];

/// Load the configured font, falling back to the first system font found
pub fn load_monospace_font(configured: Option<&Path>) -> Result<Font> {
    if let Some(path) = configured {
        match load_font_file(path) {
            Ok(font) => return Ok(font),
            Err(e) => tracing::warn!("Configured font unusable, searching system fonts: {:#}", e),
        }
    }

    for path in candidate_paths() {
        if !path.exists() {
            continue;
        }
        match load_font_file(&path) {
            Ok(font) => {
                tracing::info!("Using font {}", path.display());
                return Ok(font);
            }
            Err(e) => tracing::debug!("Skipping font {}: {:#}", path.display(), e),
        }
    }

    Err(anyhow!(
        "No monospace font found; set font_path in the config file"
    ))
}

fn candidate_paths() -> impl Iterator<Item = PathBuf> {
    let user_fonts = dirs::font_dir()
        .into_iter()
        .flat_map(|dir| {
            ["LiberationMono-Regular.ttf", "DejaVuSansMono.ttf"]
                .into_iter()
                .map(move |name| dir.join(name))
        });
    user_fonts.chain(SYSTEM_FONT_CANDIDATES.iter().map(PathBuf::from))
}

fn load_font_file(path: &Path) -> Result<Font> {
    let bytes =
        std::fs::read(path).with_context(|| format!("Failed to read font {}", path.display()))?;
    Font::from_bytes(bytes, FontSettings::default())
        .map_err(|e| anyhow!("Failed to parse font {}: {}", path.display(), e))
}
