//! Keyboard input handling
//!
//! Shortcuts and editing keys come from the keymap. This file handles what
//! the keymap cannot express:
//! - Modal input routing (when a dialog or dropdown has focus)
//! - Character input (regular typing)

use winit::keyboard::{Key, NamedKey};

use code_studio::commands::Cmd;
use code_studio::keymap::{keystroke_from_winit, Keymap};
use code_studio::messages::{DocumentMsg, ModalMsg, Msg, UiMsg};
use code_studio::model::AppModel;
use code_studio::update::update;

/// Modifier state at the time of a key press
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyMods {
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
    pub logo: bool,
}

/// Dispatch every message of a sequence, keeping the last command produced
fn dispatch(model: &mut AppModel, msgs: Vec<Msg>) -> Option<Cmd> {
    let mut result = None;
    for msg in msgs {
        result = update(model, msg).or(result);
    }
    result
}

/// Handle a key press
pub fn handle_key(
    model: &mut AppModel,
    keymap: &Keymap,
    key: &Key,
    mods: KeyMods,
) -> Option<Cmd> {
    let keystroke = keystroke_from_winit(key, mods.ctrl, mods.shift, mods.alt, mods.logo);
    if let Some(keystroke) = keystroke {
        if let Some(command) = keymap.lookup(&keystroke) {
            // Run, Save and Quit stay live behind dialogs; editing keys go to the modal
            if !(model.ui.has_modal() && command.is_editing()) {
                return dispatch(model, command.to_msgs());
            }
        }
    }

    if model.ui.has_modal() {
        return handle_modal_key(model, key, mods);
    }

    match key {
        Key::Named(NamedKey::Space) if !(mods.ctrl || mods.logo) => {
            update(model, Msg::Document(DocumentMsg::InsertChar(' ')))
        }

        Key::Character(s) if !(mods.ctrl || mods.logo) => {
            let msgs = s
                .chars()
                .map(|ch| Msg::Document(DocumentMsg::InsertChar(ch)))
                .collect();
            dispatch(model, msgs)
        }

        _ => None,
    }
}

/// Handle keyboard input when a modal is active.
///
/// This captures focus and routes keys to the modal instead of the editor.
fn handle_modal_key(model: &mut AppModel, key: &Key, mods: KeyMods) -> Option<Cmd> {
    let modal = |msg| Msg::Ui(UiMsg::Modal(msg));

    match key {
        Key::Named(NamedKey::Escape) => update(model, modal(ModalMsg::Cancel)),
        Key::Named(NamedKey::Enter) => update(model, modal(ModalMsg::Confirm)),

        Key::Named(NamedKey::ArrowUp) => update(model, modal(ModalMsg::SelectPrevious)),
        Key::Named(NamedKey::ArrowDown) => update(model, modal(ModalMsg::SelectNext)),
        Key::Named(NamedKey::PageUp) => update(model, modal(ModalMsg::Scroll(-10))),
        Key::Named(NamedKey::PageDown) => update(model, modal(ModalMsg::Scroll(10))),

        Key::Named(NamedKey::Backspace) => update(model, modal(ModalMsg::DeleteBackward)),

        Key::Character(s) if !(mods.ctrl || mods.logo) => {
            let msgs = s.chars().map(|ch| modal(ModalMsg::InsertChar(ch))).collect();
            dispatch(model, msgs)
        }
        Key::Named(NamedKey::Space) if !(mods.ctrl || mods.logo) => {
            update(model, modal(ModalMsg::InsertChar(' ')))
        }

        // Block all other keys when modal is active (consume but don't act)
        _ => Some(Cmd::Redraw),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use code_studio::cli::StartupConfig;
    use code_studio::config::EditorConfig;
    use code_studio::keymap::embedded_keymap;
    use code_studio::model::{ModalId, RunState};
    use code_studio::syntax::LanguageTag;
    use code_studio::theme::ThemeId;

    fn model() -> AppModel {
        AppModel::new(
            800,
            600,
            StartupConfig {
                file: None,
                language: LanguageTag::Python,
                theme: ThemeId::Default,
                editor: EditorConfig::default(),
            },
        )
    }

    fn ctrl() -> KeyMods {
        KeyMods {
            ctrl: true,
            ..KeyMods::default()
        }
    }

    #[test]
    fn test_typing_inserts_characters() {
        let mut model = model();
        let keymap = embedded_keymap();
        handle_key(&mut model, &keymap, &Key::Character("p".into()), KeyMods::default());
        handle_key(&mut model, &keymap, &Key::Named(NamedKey::Space), KeyMods::default());
        handle_key(&mut model, &keymap, &Key::Character("x".into()), KeyMods::default());
        assert_eq!(model.document.text(), "p x");
    }

    #[test]
    fn test_ctrl_r_starts_run_instead_of_typing() {
        let mut model = model();
        let keymap = embedded_keymap();
        model.document.set_text("print(1)");
        let cmd = handle_key(&mut model, &keymap, &Key::Character("r".into()), ctrl());
        assert!(matches!(cmd, Some(Cmd::StartEvaluation { .. })));
        assert_eq!(model.run_state, RunState::Evaluating);
        assert_eq!(model.document.text(), "print(1)");
    }

    #[test]
    fn test_modal_captures_typing() {
        let mut model = model();
        let keymap = embedded_keymap();
        update(&mut model, Msg::Ui(UiMsg::OpenInfo));
        handle_key(&mut model, &keymap, &Key::Character("a".into()), KeyMods::default());
        handle_key(&mut model, &keymap, &Key::Named(NamedKey::Backspace), KeyMods::default());
        assert_eq!(model.document.text(), "");

        handle_key(&mut model, &keymap, &Key::Named(NamedKey::Escape), KeyMods::default());
        assert_eq!(model.ui.modal_id(), None);
    }

    #[test]
    fn test_ctrl_q_works_behind_dialog() {
        let mut model = model();
        let keymap = embedded_keymap();
        update(&mut model, Msg::Ui(UiMsg::OpenDebug));
        assert_eq!(model.ui.modal_id(), Some(ModalId::Debug));
        let cmd = handle_key(&mut model, &keymap, &Key::Character("q".into()), ctrl());
        assert_eq!(cmd, Some(Cmd::Quit));
    }
}
