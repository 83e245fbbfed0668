//! Mouse hit testing: map a click or wheel event to the message it triggers
//!
//! Pure functions over the model and layout so the runtime stays thin and
//! the mapping can be tested without a window.

use crate::messages::{AppMsg, EditorMsg, ModalMsg, Msg, RunMsg, UiMsg};
use crate::model::{AppModel, DialogSize, Layout, ModalId, ToolbarItem};

use super::geometry::{menu_entry_rects, pixel_to_cursor};

/// Message for a toolbar button
fn toolbar_msg(item: ToolbarItem) -> Option<Msg> {
    match item {
        ToolbarItem::Run => Some(Msg::Run(RunMsg::Start)),
        ToolbarItem::Stop => Some(Msg::Run(RunMsg::Cancel)),
        ToolbarItem::Save => Some(Msg::App(AppMsg::SaveRequested)),
        ToolbarItem::LanguageSelector => Some(Msg::Ui(UiMsg::OpenLanguageMenu)),
        ToolbarItem::LanguageLabel => None,
        ToolbarItem::Info => Some(Msg::Ui(UiMsg::OpenInfo)),
        ToolbarItem::Debug => Some(Msg::Ui(UiMsg::OpenDebug)),
    }
}

/// Message for a left click at window coordinates
pub fn click_msg(model: &AppModel, layout: &Layout, x: f64, y: f64) -> Option<Msg> {
    let (fx, fy) = (x as f32, y as f32);

    if let Some(modal) = model.ui.modal_id() {
        return modal_click_msg(modal, layout, fx, fy);
    }

    if layout.themes_menu.contains(fx, fy) {
        return Some(Msg::Ui(UiMsg::OpenThemeMenu));
    }
    if let Some(item) = layout.toolbar_item_at(fx, fy) {
        return toolbar_msg(item);
    }
    if layout.editor.contains(fx, fy) {
        let (line, column) = pixel_to_cursor(x, y, layout, model);
        return Some(Msg::Editor(EditorMsg::SetCursorPosition { line, column }));
    }
    None
}

fn modal_click_msg(modal: ModalId, layout: &Layout, x: f32, y: f32) -> Option<Msg> {
    let cancel = Some(Msg::Ui(UiMsg::Modal(ModalMsg::Cancel)));
    match modal {
        ModalId::ThemeMenu | ModalId::LanguageMenu => {
            let entries = menu_entry_rects(layout, modal);
            if let Some(index) = entries.iter().position(|r| r.contains(x, y)) {
                return Some(Msg::Ui(UiMsg::Modal(ModalMsg::SelectIndex(index))));
            }
            cancel
        }
        ModalId::Info | ModalId::Debug => {
            if layout.dialog(DialogSize::Large).contains(x, y) {
                None
            } else {
                cancel
            }
        }
        // The prompt belongs to a running script; only Stop gets through
        ModalId::InputPrompt => match layout.toolbar_item_at(x, y) {
            Some(ToolbarItem::Stop) => Some(Msg::Run(RunMsg::Cancel)),
            _ => None,
        },
    }
}

/// Message for a vertical wheel movement of `lines` (positive scrolls down)
pub fn wheel_msg(model: &AppModel, layout: &Layout, x: f64, y: f64, lines: i32) -> Option<Msg> {
    if lines == 0 {
        return None;
    }
    let (fx, fy) = (x as f32, y as f32);

    match model.ui.modal_id() {
        Some(ModalId::Debug) => Some(Msg::Ui(UiMsg::Modal(ModalMsg::Scroll(lines)))),
        Some(_) => None,
        None if layout.editor.contains(fx, fy) => Some(Msg::Editor(EditorMsg::Scroll(lines))),
        None if layout.output.contains(fx, fy) => Some(Msg::Editor(EditorMsg::ScrollOutput(lines))),
        None => None,
    }
}
