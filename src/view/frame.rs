//! Drawing primitives over the softbuffer pixel slice

use fontdue::Font;

use crate::model::Rect;
use crate::syntax::HighlightSpan;
use crate::theme::SyntaxTheme;

use super::geometry::TAB_WIDTH;
use super::GlyphCache;

/// Blend a foreground color onto a background color using alpha compositing.
///
/// Both colors are in ARGB format (0xAARRGGBB). Returns the blended color
/// with full opacity (alpha = 0xFF).
#[inline]
pub fn blend_colors(bg: u32, fg: u32, alpha: f32) -> u32 {
    let bg_r = ((bg >> 16) & 0xFF) as f32;
    let bg_g = ((bg >> 8) & 0xFF) as f32;
    let bg_b = (bg & 0xFF) as f32;

    let fg_r = ((fg >> 16) & 0xFF) as f32;
    let fg_g = ((fg >> 8) & 0xFF) as f32;
    let fg_b = (fg & 0xFF) as f32;

    let final_r = (bg_r * (1.0 - alpha) + fg_r * alpha) as u32;
    let final_g = (bg_g * (1.0 - alpha) + fg_g * alpha) as u32;
    let final_b = (bg_b * (1.0 - alpha) + fg_b * alpha) as u32;

    0xFF000000 | (final_r << 16) | (final_g << 8) | final_b
}

/// Flatten a translucent ARGB color onto an opaque background
#[inline]
pub fn flatten(bg: u32, fg: u32) -> u32 {
    let alpha = ((fg >> 24) & 0xFF) as f32 / 255.0;
    blend_colors(bg, fg, alpha)
}

/// Pixel-space box, start inclusive and end exclusive
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct PixelBox {
    x0: usize,
    y0: usize,
    x1: usize,
    y1: usize,
}

impl PixelBox {
    fn from_rect(rect: Rect) -> Self {
        let px = |v: f32| v.max(0.0) as usize;
        Self {
            x0: px(rect.x),
            y0: px(rect.y),
            x1: px(rect.right()),
            y1: px(rect.bottom()),
        }
    }

    fn intersect(self, other: PixelBox) -> Self {
        Self {
            x0: self.x0.max(other.x0),
            y0: self.y0.max(other.y0),
            x1: self.x1.min(other.x1),
            y1: self.y1.min(other.y1),
        }
    }

    fn contains(&self, x: usize, y: usize) -> bool {
        (self.x0..self.x1).contains(&x) && (self.y0..self.y1).contains(&y)
    }
}

/// Mutable view over the window's ARGB pixels
///
/// Every write goes through the current clip box, so callers can pass
/// rectangles that hang off the edge of the window.
pub struct Frame<'a> {
    pixels: &'a mut [u32],
    stride: usize,
    bounds: PixelBox,
    clip: PixelBox,
}

impl<'a> Frame<'a> {
    /// Wrap `pixels`; a short buffer only exposes its complete rows
    pub fn new(pixels: &'a mut [u32], width: usize, height: usize) -> Self {
        let rows = if width == 0 {
            0
        } else {
            height.min(pixels.len() / width)
        };
        let bounds = PixelBox {
            x0: 0,
            y0: 0,
            x1: width,
            y1: rows,
        };
        Self {
            pixels,
            stride: width,
            bounds,
            clip: bounds,
        }
    }

    /// Constrain subsequent drawing to `rect`
    pub fn set_clip(&mut self, rect: Rect) {
        self.clip = PixelBox::from_rect(rect).intersect(self.bounds);
    }

    pub fn clear_clip(&mut self) {
        self.clip = self.bounds;
    }

    pub fn clear(&mut self, color: u32) {
        self.pixels.fill(color);
    }

    /// Opaque fill, no blending
    pub fn fill_rect(&mut self, rect: Rect, color: u32) {
        self.fill_box(PixelBox::from_rect(rect), color);
    }

    fn fill_box(&mut self, area: PixelBox, color: u32) {
        let area = area.intersect(self.clip);
        for y in area.y0..area.y1 {
            let row = y * self.stride;
            if let Some(span) = self.pixels.get_mut(row + area.x0..row + area.x1) {
                span.fill(color);
            }
        }
    }

    /// Mix `color` into the pixel at `(x, y)` with the given opacity
    #[inline]
    fn blend_at(&mut self, x: usize, y: usize, color: u32, alpha: f32) {
        if !self.clip.contains(x, y) {
            return;
        }
        if let Some(pixel) = self.pixels.get_mut(y * self.stride + x) {
            *pixel = blend_colors(*pixel, color, alpha);
        }
    }

    /// Glyph coverage is the 0-255 alpha from the rasterizer
    #[inline]
    fn blend_coverage(&mut self, x: usize, y: usize, color: u32, coverage: u8) {
        self.blend_at(x, y, color, coverage as f32 / 255.0);
    }

    /// Darken everything inside the clip box, used behind modal dialogs
    pub fn dim(&mut self, alpha: u8) {
        let strength = alpha as f32 / 255.0;
        let area = self.clip;
        for y in area.y0..area.y1 {
            for x in area.x0..area.x1 {
                self.blend_at(x, y, 0xFF000000, strength);
            }
        }
    }

    /// Filled box with a 1px opaque outline
    pub fn draw_bordered_rect(&mut self, rect: Rect, fill_color: u32, border_color: u32) {
        let outer = PixelBox::from_rect(rect);
        self.fill_box(outer, fill_color);

        let border = border_color | 0xFF000000;
        let last_x = outer.x1.saturating_sub(1).max(outer.x0);
        let last_y = outer.y1.saturating_sub(1).max(outer.y0);
        let edges = [
            PixelBox { y1: outer.y0 + 1, ..outer },
            PixelBox { y0: last_y, ..outer },
            PixelBox { x1: outer.x0 + 1, ..outer },
            PixelBox { x0: last_x, ..outer },
        ];
        for edge in edges {
            self.fill_box(edge, border);
        }
    }
}

/// Text rendering context wrapping font and glyph cache.
pub struct TextPainter<'a> {
    font: &'a Font,
    glyph_cache: &'a mut GlyphCache,
    font_size: f32,
    ascent: f32,
    char_width: f32,
    line_height: usize,
}

impl<'a> TextPainter<'a> {
    pub fn new(
        font: &'a Font,
        glyph_cache: &'a mut GlyphCache,
        font_size: f32,
        ascent: f32,
        char_width: f32,
        line_height: usize,
    ) -> Self {
        Self {
            font,
            glyph_cache,
            font_size,
            ascent,
            char_width,
            line_height,
        }
    }

    /// Character width for monospace layout calculations
    #[inline]
    pub fn char_width(&self) -> f32 {
        self.char_width
    }

    #[inline]
    pub fn line_height(&self) -> usize {
        self.line_height
    }

    /// Draw one glyph with its left edge at `x`; returns the advance
    fn draw_glyph(
        &mut self,
        frame: &mut Frame,
        x: f32,
        baseline: f32,
        ch: char,
        color: u32,
    ) -> f32 {
        let key = (ch, self.font_size.to_bits());
        let font = self.font;
        let font_size = self.font_size;
        let (metrics, bitmap) = self
            .glyph_cache
            .entry(key)
            .or_insert_with(|| font.rasterize(ch, font_size));

        let glyph_top = baseline - metrics.height as f32 - metrics.ymin as f32;

        for bitmap_y in 0..metrics.height {
            for bitmap_x in 0..metrics.width {
                let Some(&alpha) = bitmap.get(bitmap_y * metrics.width + bitmap_x) else {
                    continue;
                };
                if alpha == 0 {
                    continue;
                }
                let px = x as isize + bitmap_x as isize + metrics.xmin as isize;
                let py = (glyph_top + bitmap_y as f32) as isize;
                if px >= 0 && py >= 0 {
                    frame.blend_coverage(px as usize, py as usize, color, alpha);
                }
            }
        }

        metrics.advance_width
    }

    /// Draw text at the specified position
    pub fn draw(&mut self, frame: &mut Frame, x: usize, y: usize, text: &str, color: u32) {
        self.draw_colored(frame, x, y, text, |_| color);
    }

    /// Draw text with syntax highlighting
    ///
    /// Spans are measured in characters of `text`; characters outside every
    /// span use `default_color`.
    #[allow(clippy::too_many_arguments)]
    pub fn draw_with_highlights(
        &mut self,
        frame: &mut Frame,
        x: usize,
        y: usize,
        text: &str,
        spans: &[HighlightSpan],
        syntax_theme: &SyntaxTheme,
        default_color: u32,
    ) {
        if spans.is_empty() {
            self.draw(frame, x, y, text, default_color);
            return;
        }

        let mut span_idx = 0;
        self.draw_colored(frame, x, y, text, |col| {
            while span_idx < spans.len() && spans[span_idx].end_col <= col {
                span_idx += 1;
            }
            match spans.get(span_idx) {
                Some(span) if col >= span.start_col => {
                    syntax_theme.color_for(span.category).to_argb_u32()
                }
                _ => default_color,
            }
        });
    }

    /// Shared glyph loop: tabs advance to the next tab stop
    fn draw_colored(
        &mut self,
        frame: &mut Frame,
        x: usize,
        y: usize,
        text: &str,
        mut color_at: impl FnMut(usize) -> u32,
    ) {
        let baseline = y as f32 + self.ascent;
        let mut visual_col = 0;

        for (col, ch) in text.chars().enumerate() {
            if ch == '\t' {
                visual_col += TAB_WIDTH - (visual_col % TAB_WIDTH);
                continue;
            }
            let color = color_at(col);
            let glyph_x = x as f32 + visual_col as f32 * self.char_width;
            self.draw_glyph(frame, glyph_x, baseline, ch, color);
            visual_col += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pixel(buffer: &[u32], width: usize, x: usize, y: usize) -> u32 {
        buffer[y * width + x]
    }

    #[test]
    fn test_fill_rect_covers_only_rect() {
        let mut buffer = vec![0u32; 100 * 100];
        let mut frame = Frame::new(&mut buffer, 100, 100);
        frame.fill_rect(Rect::new(10.0, 10.0, 20.0, 20.0), 0xFFFF0000);

        assert_eq!(pixel(&buffer, 100, 15, 15), 0xFFFF0000);
        assert_eq!(pixel(&buffer, 100, 5, 5), 0);
        assert_eq!(pixel(&buffer, 100, 30, 30), 0);
    }

    #[test]
    fn test_dim_darkens_toward_black() {
        let mut buffer = vec![0xFFFFFFFF_u32; 10 * 10];
        Frame::new(&mut buffer, 10, 10).dim(128);

        let r = (pixel(&buffer, 10, 5, 5) >> 16) & 0xFF;
        assert!(r > 100 && r < 160, "R channel: {}", r);
    }

    #[test]
    fn test_offscreen_rect_is_clipped() {
        let mut buffer = vec![0u32; 10 * 10];
        let mut frame = Frame::new(&mut buffer, 10, 10);
        frame.fill_rect(Rect::new(-5.0, -5.0, 200.0, 8.0), 0xFF00FF00);
        frame.fill_rect(Rect::new(50.0, 50.0, 5.0, 5.0), 0xFFFFFFFF);

        assert_eq!(pixel(&buffer, 10, 0, 0), 0xFF00FF00);
        assert_eq!(pixel(&buffer, 10, 9, 2), 0xFF00FF00);
        assert_eq!(pixel(&buffer, 10, 0, 3), 0);
        assert_eq!(buffer.iter().filter(|&&p| p == 0xFFFFFFFF).count(), 0);
    }

    #[test]
    fn test_short_buffer_drops_partial_rows() {
        let mut buffer = vec![0u32; 10 * 5 + 3];
        let mut frame = Frame::new(&mut buffer, 10, 10);
        frame.fill_rect(Rect::new(0.0, 0.0, 10.0, 10.0), 0xFF010101);

        assert_eq!(pixel(&buffer, 10, 9, 4), 0xFF010101);
        assert_eq!(&buffer[50..], &[0, 0, 0]);
    }

    #[test]
    fn test_clip_restricts_fill_rect() {
        let mut buffer = vec![0u32; 100 * 100];
        let mut frame = Frame::new(&mut buffer, 100, 100);
        frame.set_clip(Rect::new(10.0, 10.0, 30.0, 30.0));
        frame.fill_rect(Rect::new(0.0, 0.0, 100.0, 100.0), 0xFFFF0000);
        frame.clear_clip();
        frame.fill_rect(Rect::new(0.0, 0.0, 2.0, 2.0), 0xFF0000FF);

        assert_eq!(pixel(&buffer, 100, 10, 10), 0xFFFF0000);
        assert_eq!(pixel(&buffer, 100, 39, 39), 0xFFFF0000);
        assert_eq!(pixel(&buffer, 100, 40, 40), 0);
        assert_eq!(pixel(&buffer, 100, 5, 5), 0);
        assert_eq!(pixel(&buffer, 100, 1, 1), 0xFF0000FF);
    }

    #[test]
    fn test_bordered_rect_has_border_and_fill() {
        let mut buffer = vec![0u32; 20 * 20];
        Frame::new(&mut buffer, 20, 20).draw_bordered_rect(
            Rect::new(2.0, 2.0, 10.0, 10.0),
            0xFF111111,
            0x00222222,
        );

        assert_eq!(pixel(&buffer, 20, 2, 2), 0xFF222222);
        assert_eq!(pixel(&buffer, 20, 11, 11), 0xFF222222);
        assert_eq!(pixel(&buffer, 20, 6, 6), 0xFF111111);
        assert_eq!(pixel(&buffer, 20, 12, 12), 0);
    }

    #[test]
    fn test_flatten_half_alpha() {
        let mixed = flatten(0xFF000000, 0x80FFFFFF);
        let g = (mixed >> 8) & 0xFF;
        assert!(g > 110 && g < 140, "G channel: {}", g);
        assert_eq!(flatten(0xFF000000, 0xFF123456), 0xFF123456);
    }
}
