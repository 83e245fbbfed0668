//! Modal rendering: Info, Debug and input prompt dialogs plus dropdowns

use crate::model::layout::BAR_PADDING_PX;
use crate::model::{AppModel, DialogSize, Layout, ModalState, Rect};

use super::frame::{Frame, TextPainter};
use super::geometry::{menu_entry_rects, menu_labels};

pub const INFO_TITLE: &str = "About Code Studio";

pub const INFO_TEXT: &str = "\
Code Studio v0.1.0
developed by: Analog Algorithm Studios

Supported Languages:
- Python
- HTML
-C# AND C++ REMOVED.

Shortcuts:
- Ctrl+S: Save file
- Ctrl+R: Run code
- Ctrl+Q: Close application

Themes:
- Default (Dark)
- Dark Blue
- Dark Red
- Light Gray
- Solarized Dark
- Solarized Light

Enjoy coding!";

pub const DEBUG_TITLE: &str = "Debug Information";

pub const DEBUG_TEXT: &str = "\
To install Python packages using pip, open a terminal or command prompt and run:

pip install <package-name>

Example:
pip install PyExample

Backend Code:
This is the current backend code running in the editor.";

pub const INPUT_TITLE: &str = "Input";

/// Draw the active modal, if any, over the rest of the window
pub fn render_modal(
    frame: &mut Frame,
    painter: &mut TextPainter,
    layout: &Layout,
    model: &AppModel,
) {
    let Some(modal) = &model.ui.active_modal else {
        return;
    };

    match modal {
        ModalState::ThemeMenu(menu) | ModalState::LanguageMenu(menu) => {
            render_menu(frame, painter, layout, model, modal, menu.selected_index);
        }
        ModalState::Info => {
            frame.dim(96);
            let body = dialog_shell(frame, painter, layout, model, DialogSize::Large, INFO_TITLE);
            draw_lines(frame, painter, model, body, INFO_TEXT.lines());
            draw_hint(frame, painter, model, body, "Enter / Esc: Close");
        }
        ModalState::Debug(state) => {
            frame.dim(96);
            let body = dialog_shell(frame, painter, layout, model, DialogSize::Large, DEBUG_TITLE);
            render_debug_body(frame, painter, model, body, state.scroll_offset);
        }
        ModalState::InputPrompt(state) => {
            frame.dim(96);
            let body = dialog_shell(frame, painter, layout, model, DialogSize::Prompt, INPUT_TITLE);
            render_input_body(frame, painter, model, body, &state.prompt, &state.input);
        }
    }
}

/// Background, border and title; returns the rect left for the body
fn dialog_shell(
    frame: &mut Frame,
    painter: &mut TextPainter,
    layout: &Layout,
    model: &AppModel,
    size: DialogSize,
    title: &str,
) -> Rect {
    let overlay = &model.theme.overlay;
    let rect = layout.dialog(size);
    let bg = overlay.background.to_argb_u32();
    let border = overlay.border.unwrap_or(overlay.foreground).to_argb_u32();
    frame.draw_bordered_rect(rect, bg, border);

    let line_height = painter.line_height() as f32;
    let title_bar = Rect::new(
        rect.x + 1.0,
        rect.y + 1.0,
        rect.width - 2.0,
        line_height + BAR_PADDING_PX,
    );
    frame.fill_rect(title_bar, overlay.input_background.to_argb_u32());
    painter.draw(
        frame,
        (rect.x + BAR_PADDING_PX) as usize,
        (title_bar.y + BAR_PADDING_PX / 2.0) as usize,
        title,
        overlay.foreground.to_argb_u32(),
    );

    Rect::new(
        rect.x + BAR_PADDING_PX,
        title_bar.bottom() + BAR_PADDING_PX,
        (rect.width - 2.0 * BAR_PADDING_PX).max(0.0),
        (rect.bottom() - title_bar.bottom() - 2.0 * BAR_PADDING_PX).max(0.0),
    )
}

/// Draw lines top-down inside `body`, clipped to it; returns the y below the
/// last line drawn
fn draw_lines<'t>(
    frame: &mut Frame,
    painter: &mut TextPainter,
    model: &AppModel,
    body: Rect,
    lines: impl Iterator<Item = &'t str>,
) -> f32 {
    let line_height = painter.line_height() as f32;
    let color = model.theme.overlay.foreground.to_argb_u32();
    let mut y = body.y;
    frame.set_clip(body);
    for line in lines {
        if y >= body.bottom() {
            break;
        }
        painter.draw(frame, body.x as usize, y as usize, line, color);
        y += line_height;
    }
    frame.clear_clip();
    y
}

fn draw_hint(
    frame: &mut Frame,
    painter: &mut TextPainter,
    model: &AppModel,
    body: Rect,
    hint: &str,
) {
    let line_height = painter.line_height() as f32;
    let width = hint.chars().count() as f32 * painter.char_width();
    let color = model.theme.window.disabled_foreground.to_argb_u32();
    let color = super::frame::flatten(model.theme.overlay.background.to_argb_u32(), color);
    painter.draw(
        frame,
        (body.right() - width).max(body.x) as usize,
        (body.bottom() - line_height).max(body.y) as usize,
        hint,
        color,
    );
}

/// Install hint followed by a read-only, scrollable echo of the buffer
fn render_debug_body(
    frame: &mut Frame,
    painter: &mut TextPainter,
    model: &AppModel,
    body: Rect,
    scroll_offset: usize,
) {
    let overlay = &model.theme.overlay;
    let line_height = painter.line_height() as f32;
    let text_bottom = draw_lines(frame, painter, model, body, DEBUG_TEXT.lines());

    let echo = Rect::new(
        body.x,
        text_bottom + BAR_PADDING_PX,
        body.width,
        (body.bottom() - text_bottom - BAR_PADDING_PX - line_height).max(0.0),
    );
    let border = overlay.border.unwrap_or(overlay.foreground).to_argb_u32();
    frame.draw_bordered_rect(echo, overlay.input_background.to_argb_u32(), border);

    let inner = Rect::new(
        echo.x + BAR_PADDING_PX,
        echo.y + BAR_PADDING_PX / 2.0,
        (echo.width - 2.0 * BAR_PADDING_PX).max(0.0),
        (echo.height - BAR_PADDING_PX).max(0.0),
    );
    let document = &model.document;
    let rows = (inner.height / line_height).ceil() as usize;
    let lines = (scroll_offset..document.line_count())
        .take(rows)
        .filter_map(|idx| document.line_text(idx))
        .collect::<Vec<_>>();
    draw_lines(frame, painter, model, inner, lines.iter().map(|l| l.as_ref()));

    draw_hint(frame, painter, model, body, "Up/Down: Scroll  Esc: Close");
}

/// Prompt text above a single-line text field
fn render_input_body(
    frame: &mut Frame,
    painter: &mut TextPainter,
    model: &AppModel,
    body: Rect,
    prompt: &str,
    input: &str,
) {
    let overlay = &model.theme.overlay;
    let line_height = painter.line_height() as f32;
    let char_width = painter.char_width();
    let fg = overlay.foreground.to_argb_u32();

    draw_lines(frame, painter, model, body, std::iter::once(prompt));

    let field = Rect::new(
        body.x,
        body.y + line_height + BAR_PADDING_PX / 2.0,
        body.width,
        line_height + BAR_PADDING_PX,
    );
    let border = overlay.border.unwrap_or(overlay.foreground).to_argb_u32();
    frame.draw_bordered_rect(field, overlay.input_background.to_argb_u32(), border);

    // Keep the end of long input visible
    let fits = ((field.width - 2.0 * BAR_PADDING_PX) / char_width).floor().max(1.0) as usize;
    let count = input.chars().count();
    let shown: String = input.chars().skip(count.saturating_sub(fits - 1)).collect();
    let text_x = field.x + BAR_PADDING_PX;
    let text_y = field.y + BAR_PADDING_PX / 2.0;
    frame.set_clip(field);
    painter.draw(frame, text_x as usize, text_y as usize, &shown, fg);
    frame.clear_clip();

    if model.ui.cursor_visible {
        let cursor_x = text_x + shown.chars().count() as f32 * char_width;
        frame.fill_rect(
            Rect::new(cursor_x, text_y, 2.0, line_height),
            model.theme.editor.cursor_color.to_argb_u32(),
        );
    }

    draw_hint(frame, painter, model, body, "Enter: OK  Esc: Cancel");
}

/// Dropdown list with the highlighted entry drawn in the selection color
fn render_menu(
    frame: &mut Frame,
    painter: &mut TextPainter,
    layout: &Layout,
    model: &AppModel,
    modal: &ModalState,
    selected_index: usize,
) {
    let overlay = &model.theme.overlay;
    let labels = menu_labels(modal.id());
    let rects = menu_entry_rects(layout, modal.id());
    let (Some(first), Some(last)) = (rects.first(), rects.last()) else {
        return;
    };

    let outline = Rect::new(first.x, first.y, first.width, last.bottom() - first.y);
    let border = overlay.border.unwrap_or(overlay.foreground).to_argb_u32();
    frame.draw_bordered_rect(outline, overlay.background.to_argb_u32(), border);

    for (index, (rect, label)) in rects.iter().zip(labels).enumerate() {
        if index == selected_index {
            let inset = Rect::new(rect.x + 1.0, rect.y + 1.0, rect.width - 2.0, rect.height - 2.0);
            frame.fill_rect(inset, overlay.selection_background.to_argb_u32());
        }
        painter.draw(
            frame,
            (rect.x + BAR_PADDING_PX) as usize,
            (rect.y + BAR_PADDING_PX / 2.0) as usize,
            label,
            overlay.foreground.to_argb_u32(),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_info_text_lists_every_theme() {
        for theme in ["Dark Blue", "Dark Red", "Light Gray", "Solarized Dark", "Solarized Light"] {
            assert!(INFO_TEXT.contains(theme), "missing {}", theme);
        }
        assert!(INFO_TEXT.contains("Ctrl+R: Run code"));
    }

    #[test]
    fn test_debug_text_has_install_hint() {
        assert!(DEBUG_TEXT.contains("pip install <package-name>"));
        assert!(DEBUG_TEXT.ends_with("running in the editor."));
    }
}
