//! UI message handlers (status bar, cursor blink, dialogs, dropdowns)

use std::time::Duration;

use crate::commands::Cmd;
use crate::messages::{AppMsg, ModalMsg, UiMsg};
use crate::model::{AppModel, DebugDialogState, ModalId, ModalState};
use crate::syntax::LanguageTag;
use crate::theme::ThemeId;

use super::run::answer_input;

/// Cursor blink half-period
pub const CURSOR_BLINK_INTERVAL: Duration = Duration::from_millis(500);

/// Handle UI messages (status bar, cursor blink, modals)
pub fn update_ui(model: &mut AppModel, msg: UiMsg) -> Option<Cmd> {
    match msg {
        UiMsg::SetStatus(message) => {
            model.ui.set_status(message);
            Some(Cmd::Redraw)
        }

        UiMsg::BlinkCursor => {
            if model.ui.update_cursor_blink(CURSOR_BLINK_INTERVAL) {
                Some(Cmd::Redraw)
            } else {
                None
            }
        }

        UiMsg::OpenInfo => open_modal(model, ModalState::Info),
        UiMsg::OpenDebug => open_modal(model, ModalState::Debug(DebugDialogState::default())),
        UiMsg::OpenThemeMenu => {
            // Clicking the menu title again closes it
            if model.ui.modal_id() == Some(ModalId::ThemeMenu) {
                model.ui.close_modal();
                return Some(Cmd::Redraw);
            }
            let state = ModalState::theme_menu(model.theme_id);
            open_modal(model, state)
        }
        UiMsg::OpenLanguageMenu => {
            if model.ui.modal_id() == Some(ModalId::LanguageMenu) {
                model.ui.close_modal();
                return Some(Cmd::Redraw);
            }
            let state = ModalState::language_menu(model.document.language);
            open_modal(model, state)
        }

        UiMsg::Modal(modal_msg) => update_modal(model, modal_msg),
    }
}

/// Open a modal unless a script is waiting on the input prompt
fn open_modal(model: &mut AppModel, state: ModalState) -> Option<Cmd> {
    if model.ui.modal_id() == Some(ModalId::InputPrompt) {
        return None;
    }
    model.ui.open_modal(state);
    Some(Cmd::Redraw)
}

/// Handle modal-specific messages
fn update_modal(model: &mut AppModel, msg: ModalMsg) -> Option<Cmd> {
    match model.ui.modal_id()? {
        ModalId::InputPrompt => update_input_prompt(model, msg),
        ModalId::Info => match msg {
            ModalMsg::Confirm | ModalMsg::Cancel => close(model),
            _ => None,
        },
        ModalId::Debug => update_debug_dialog(model, msg),
        ModalId::ThemeMenu | ModalId::LanguageMenu => update_menu(model, msg),
    }
}

fn update_input_prompt(model: &mut AppModel, msg: ModalMsg) -> Option<Cmd> {
    let Some(ModalState::InputPrompt(state)) = model.ui.active_modal.as_mut() else {
        return None;
    };

    match msg {
        ModalMsg::InsertChar(ch) => state.input.push(ch),
        ModalMsg::DeleteBackward => {
            state.input.pop();
        }
        ModalMsg::Confirm => {
            let answer = std::mem::take(&mut state.input);
            return answer_input(model, Some(answer));
        }
        ModalMsg::Cancel => return answer_input(model, None),
        _ => return None,
    }
    model.reset_cursor_blink();
    Some(Cmd::Redraw)
}

fn update_debug_dialog(model: &mut AppModel, msg: ModalMsg) -> Option<Cmd> {
    let delta = match msg {
        ModalMsg::Scroll(delta) => delta as isize,
        ModalMsg::SelectNext => 1,
        ModalMsg::SelectPrevious => -1,
        ModalMsg::Confirm | ModalMsg::Cancel => return close(model),
        _ => return None,
    };

    let max = model.document.line_count().saturating_sub(1) as isize;
    let Some(ModalState::Debug(state)) = model.ui.active_modal.as_mut() else {
        return None;
    };
    state.scroll_offset = (state.scroll_offset as isize + delta).clamp(0, max) as usize;
    Some(Cmd::Redraw)
}

/// Themes menu and language dropdown share keyboard and click handling
fn update_menu(model: &mut AppModel, msg: ModalMsg) -> Option<Cmd> {
    let is_theme = model.ui.modal_id() == Some(ModalId::ThemeMenu);
    let count = model
        .ui
        .active_modal
        .as_ref()
        .map_or(0, ModalState::entry_count);
    if count == 0 {
        return close(model);
    }
    let menu = match model.ui.active_modal.as_mut() {
        Some(ModalState::ThemeMenu(menu) | ModalState::LanguageMenu(menu)) => menu,
        _ => return None,
    };

    let pick = match msg {
        ModalMsg::SelectNext => {
            menu.selected_index = (menu.selected_index + 1) % count;
            return Some(Cmd::Redraw);
        }
        ModalMsg::SelectPrevious => {
            menu.selected_index = (menu.selected_index + count - 1) % count;
            return Some(Cmd::Redraw);
        }
        ModalMsg::SelectIndex(index) if index < count => index,
        ModalMsg::Confirm => menu.selected_index.min(count - 1),
        ModalMsg::Cancel => return close(model),
        _ => return None,
    };

    model.ui.close_modal();
    if is_theme {
        super::theme::update_theme(model, ThemeId::ALL[pick])
    } else {
        super::app::update_app(model, AppMsg::SetLanguage(LanguageTag::SELECTABLE[pick]))
    }
}

fn close(model: &mut AppModel) -> Option<Cmd> {
    model.ui.close_modal();
    Some(Cmd::Redraw)
}
