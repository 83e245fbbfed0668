//! View module - CPU rendering with softbuffer and fontdue
//!
//! The renderer draws the whole window every frame: menu bar, toolbar,
//! editor pane, output pane, status bar and the active modal.

pub mod dialogs;
pub mod font;
pub mod frame;
pub mod geometry;
pub mod hit_test;

pub use frame::{Frame, TextPainter};
pub use geometry::{char_col_to_visual_col, pixel_to_cursor};
pub use hit_test::{click_msg, wheel_msg};

use std::collections::HashMap;
use std::num::NonZeroU32;
use std::rc::Rc;

use anyhow::{anyhow, Result};
use fontdue::{Font, LineMetrics, Metrics};
use softbuffer::Surface;
use winit::window::Window;

use crate::model::layout::{gutter_border_x, text_start_x, BAR_PADDING_PX};
use crate::model::{AppModel, Layout, ModalId, Rect, ToolbarItem, LINE_NUMBER_GUTTER_CHARS};
use crate::syntax::HighlightSpan;

use self::frame::flatten;
use self::geometry::visible_slice;

pub type GlyphCacheKey = (char, u32);

pub type GlyphCache = HashMap<GlyphCacheKey, (Metrics, Vec<u8>)>;

pub struct Renderer {
    font: Font,
    surface: Surface<Rc<Window>, Rc<Window>>,
    width: u32,
    height: u32,
    font_size: f32,
    line_metrics: LineMetrics,
    glyph_cache: GlyphCache,
    char_width: f32,
}

fn non_zero(value: u32) -> NonZeroU32 {
    NonZeroU32::new(value).unwrap_or(NonZeroU32::MIN)
}

impl Renderer {
    /// Create a renderer for `window`, using the font settings from the config
    pub fn new(
        window: Rc<Window>,
        context: &softbuffer::Context<Rc<Window>>,
        model: &AppModel,
    ) -> Result<Self> {
        let scale_factor = window.scale_factor();
        let size = window.inner_size();
        let (width, height) = (size.width, size.height);

        let mut surface = Surface::new(context, Rc::clone(&window))
            .map_err(|e| anyhow!("Failed to create surface: {}", e))?;
        surface
            .resize(non_zero(width), non_zero(height))
            .map_err(|e| anyhow!("Failed to resize surface: {}", e))?;

        let font = font::load_monospace_font(model.config.font_path.as_deref())?;
        let font_size = model.config.font_size * scale_factor as f32;

        let line_metrics = font
            .horizontal_line_metrics(font_size)
            .ok_or_else(|| anyhow!("Font missing horizontal line metrics"))?;

        let (metrics, _) = font.rasterize('M', font_size);
        let char_width = metrics.advance_width;

        Ok(Self {
            font,
            surface,
            width,
            height,
            font_size,
            line_metrics,
            glyph_cache: HashMap::new(),
            char_width,
        })
    }

    pub fn char_width(&self) -> f32 {
        self.char_width
    }

    pub fn line_height(&self) -> usize {
        self.line_metrics.new_line_size.ceil() as usize
    }

    pub fn render(&mut self, model: &AppModel) -> Result<()> {
        if self.width != model.window_size.0 || self.height != model.window_size.1 {
            self.width = model.window_size.0;
            self.height = model.window_size.1;
            self.surface
                .resize(non_zero(self.width), non_zero(self.height))
                .map_err(|e| anyhow!("Failed to resize surface: {}", e))?;
        }

        let layout = model.layout();
        let line_height = self.line_height();
        let (width, height) = (self.width as usize, self.height as usize);

        let mut buffer = self
            .surface
            .buffer_mut()
            .map_err(|e| anyhow!("Failed to get buffer: {}", e))?;

        {
            let mut frame = Frame::new(&mut buffer, width, height);
            let mut painter = TextPainter::new(
                &self.font,
                &mut self.glyph_cache,
                self.font_size,
                self.line_metrics.ascent,
                self.char_width,
                line_height,
            );

            frame.clear(model.theme.window.background.to_argb_u32());
            render_menu_bar(&mut frame, &mut painter, &layout, model);
            render_toolbar(&mut frame, &mut painter, &layout, model);
            render_editor(&mut frame, &mut painter, &layout, model);
            render_output(&mut frame, &mut painter, &layout, model);
            render_status_bar(&mut frame, &mut painter, &layout, model);
            dialogs::render_modal(&mut frame, &mut painter, &layout, model);
        }

        buffer
            .present()
            .map_err(|e| anyhow!("Failed to present buffer: {}", e))?;
        Ok(())
    }
}

/// Vertically centered y for one line of text inside `rect`
fn text_y(rect: Rect, line_height: usize) -> usize {
    (rect.y + ((rect.height - line_height as f32) / 2.0).max(0.0)) as usize
}

fn render_menu_bar(
    frame: &mut Frame,
    painter: &mut TextPainter,
    layout: &Layout,
    model: &AppModel,
) {
    let window = &model.theme.window;
    frame.fill_rect(layout.menu_bar, window.button_background.to_argb_u32());
    if model.ui.modal_id() == Some(ModalId::ThemeMenu) {
        frame.fill_rect(
            layout.themes_menu,
            model.theme.overlay.selection_background.to_argb_u32(),
        );
    }
    painter.draw(
        frame,
        (layout.themes_menu.x + BAR_PADDING_PX) as usize,
        text_y(layout.themes_menu, painter.line_height()),
        "Themes",
        window.foreground.to_argb_u32(),
    );
}

fn render_toolbar(
    frame: &mut Frame,
    painter: &mut TextPainter,
    layout: &Layout,
    model: &AppModel,
) {
    let window = &model.theme.window;
    let language = model.document.language;
    let running = model.run_state.is_running();
    let button_bg = window.button_background.to_argb_u32();
    let fg = window.foreground.to_argb_u32();
    let muted = flatten(button_bg, window.disabled_foreground.to_argb_u32());

    for &(item, rect) in &layout.toolbar_items {
        let enabled = match item {
            ToolbarItem::Run => !running,
            ToolbarItem::Stop => running,
            _ => true,
        };
        let color = if enabled { fg } else { muted };

        if item.is_clickable() {
            frame.draw_bordered_rect(rect, button_bg, muted);
        }
        painter.draw(
            frame,
            (rect.x + BAR_PADDING_PX) as usize,
            text_y(rect, painter.line_height()),
            &item.text(language),
            color,
        );
    }
}

fn render_editor(
    frame: &mut Frame,
    painter: &mut TextPainter,
    layout: &Layout,
    model: &AppModel,
) {
    let theme = &model.theme;
    let rect = layout.editor;
    let char_width = painter.char_width();
    let line_height = painter.line_height();
    let editor = &model.editor;
    let document = &model.document;

    frame.fill_rect(rect, theme.editor.background.to_argb_u32());

    let gutter_x = rect.x + gutter_border_x(char_width);
    let text_x = (rect.x + text_start_x(char_width)) as usize;
    let gutter_fg = flatten(
        theme.editor.background.to_argb_u32(),
        theme.window.disabled_foreground.to_argb_u32(),
    );
    frame.fill_rect(Rect::new(gutter_x, rect.y, 1.0, rect.height), gutter_fg);

    frame.set_clip(rect);
    let last_line = (editor.viewport.top_line + editor.viewport.visible_lines + 1)
        .min(document.line_count());
    for (row, line_idx) in (editor.viewport.top_line..last_line).enumerate() {
        let y = rect.y as usize + row * line_height;

        if line_idx == editor.cursor.line {
            frame.fill_rect(
                Rect::new(gutter_x + 1.0, y as f32, rect.width, line_height as f32),
                theme.editor.current_line_background.to_argb_u32(),
            );
        }

        let number = format!(
            "{:>width$}",
            line_idx + 1,
            width = LINE_NUMBER_GUTTER_CHARS - 1
        );
        painter.draw(frame, rect.x as usize, y, &number, gutter_fg);

        let Some(line_text) = document.line_text(line_idx) else {
            continue;
        };
        let left = editor.viewport.left_column;
        let shown = visible_slice(&line_text, left);
        let spans: Vec<_> = document
            .line_highlights(line_idx)
            .iter()
            .filter(|span| span.end_col > left)
            .map(|span| HighlightSpan {
                start_col: span.start_col.saturating_sub(left),
                end_col: span.end_col - left,
                category: span.category,
            })
            .collect();
        frame.set_clip(Rect::new(
            gutter_x + 1.0,
            rect.y,
            rect.right() - gutter_x - 1.0,
            rect.height,
        ));
        painter.draw_with_highlights(
            frame,
            text_x,
            y,
            shown,
            &spans,
            &theme.syntax,
            theme.editor.foreground.to_argb_u32(),
        );
        frame.set_clip(rect);

        if line_idx == editor.cursor.line
            && model.ui.cursor_visible
            && !model.ui.has_modal()
            && editor.cursor.column >= left
        {
            let visual = char_col_to_visual_col(shown, editor.cursor.column - left);
            let cursor_x = text_x as f32 + visual as f32 * char_width;
            frame.fill_rect(
                Rect::new(cursor_x, y as f32, 2.0, line_height as f32),
                theme.editor.cursor_color.to_argb_u32(),
            );
        }
    }
    frame.clear_clip();
}

fn render_output(
    frame: &mut Frame,
    painter: &mut TextPainter,
    layout: &Layout,
    model: &AppModel,
) {
    let pane = &model.theme.output;
    let rect = layout.output;
    let line_height = painter.line_height();

    frame.fill_rect(rect, pane.background.to_argb_u32());
    frame.fill_rect(
        Rect::new(rect.x, rect.y, rect.width, 1.0),
        model.theme.window.background.to_argb_u32(),
    );

    frame.set_clip(rect);
    let top = rect.y as usize + (BAR_PADDING_PX / 2.0) as usize;
    let lines = model
        .output
        .lines_from(model.output.scroll_offset)
        .take(model.output.visible_lines + 1);
    for (row, line) in lines.enumerate() {
        painter.draw(
            frame,
            (rect.x + BAR_PADDING_PX) as usize,
            top + row * line_height,
            line,
            pane.foreground.to_argb_u32(),
        );
    }
    frame.clear_clip();
}

/// Text segments of the status bar, left and right aligned
pub fn status_bar_segments(model: &AppModel) -> (String, String) {
    let cursor = &model.editor.cursor;
    let left = format!(
        "{}  |  Ln {}, Col {}  |  {}",
        model.document.language.label(),
        cursor.line + 1,
        cursor.column + 1,
        model.run_state.label(),
    );
    (left, model.ui.status_message.clone())
}

fn render_status_bar(
    frame: &mut Frame,
    painter: &mut TextPainter,
    layout: &Layout,
    model: &AppModel,
) {
    let pane = &model.theme.status_bar;
    let rect = layout.status_bar;
    let fg = pane.foreground.to_argb_u32();
    let y = text_y(rect, painter.line_height());

    frame.fill_rect(rect, pane.background.to_argb_u32());

    let (left, right) = status_bar_segments(model);
    painter.draw(frame, (rect.x + BAR_PADDING_PX) as usize, y, &left, fg);

    let left_end =
        rect.x + BAR_PADDING_PX + (left.chars().count() + 2) as f32 * painter.char_width();
    let right_width = right.chars().count() as f32 * painter.char_width();
    let right_x = (rect.right() - BAR_PADDING_PX - right_width).max(left_end);
    frame.set_clip(rect);
    painter.draw(frame, right_x as usize, y, &right, fg);
    frame.clear_clip();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::StartupConfig;
    use crate::config::EditorConfig;
    use crate::syntax::LanguageTag;
    use crate::theme::ThemeId;

    #[test]
    fn test_status_bar_segments() {
        let mut model = AppModel::new(
            800,
            600,
            StartupConfig {
                file: None,
                language: LanguageTag::Html,
                theme: ThemeId::Default,
                editor: EditorConfig::default(),
            },
        );
        model.ui.set_status("Saved");
        let (left, right) = status_bar_segments(&model);
        assert_eq!(left, "Language: Html  |  Ln 1, Col 1  |  Ready");
        assert_eq!(right, "Saved");
    }
}
