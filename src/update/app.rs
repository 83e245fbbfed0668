//! App message handlers (file operations, window events)

use crate::commands::Cmd;
use crate::messages::AppMsg;
use crate::model::AppModel;

/// Handle app messages (file operations, window events)
pub fn update_app(model: &mut AppModel, msg: AppMsg) -> Option<Cmd> {
    match msg {
        AppMsg::Resize(width, height) => {
            model.resize(width, height);
            Some(Cmd::Redraw)
        }

        // Save always asks for a path, like "Save As"
        AppMsg::SaveRequested => {
            if model.ui.is_saving {
                model.ui.set_status("Save already in progress");
                return Some(Cmd::Redraw);
            }
            Some(Cmd::ShowSaveFileDialog {
                suggested_path: model.document.file_path.clone(),
            })
        }

        AppMsg::SaveDialogResult { path } => match path {
            Some(path) => {
                let content = model.document.text();
                model.ui.is_saving = true;
                model.ui.saving_revision = model.document.revision();
                model.ui.set_status("Saving...");
                Some(Cmd::SaveFile { path, content })
            }
            None => None,
        },

        AppMsg::SaveCompleted(result) => {
            model.ui.is_saving = false;
            match result {
                Ok(path) => {
                    model.ui.set_status(format!("Saved: {}", path.display()));
                    model.document.file_path = Some(path);
                    // Edits made while the file was being written stay unsaved
                    if model.document.revision() == model.ui.saving_revision {
                        model.document.is_modified = false;
                    }
                    Some(Cmd::Redraw)
                }
                Err(e) => {
                    tracing::warn!("Save failed: {}", e);
                    model.ui.set_status(format!("Error saving file: {}", e));
                    Some(Cmd::batch(vec![
                        Cmd::ShowErrorDialog {
                            title: "Save Error".to_string(),
                            message: e,
                        },
                        Cmd::Redraw,
                    ]))
                }
            }
        }

        AppMsg::SetLanguage(language) => {
            if model.document.language != language {
                model.document.set_language(language);
                tracing::info!("Language switched to {}", language.display_name());
            }
            model.ui.set_status(language.label());
            Some(Cmd::Redraw)
        }

        AppMsg::Quit => Some(Cmd::Quit),
    }
}
