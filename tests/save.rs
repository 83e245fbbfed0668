//! Save flow: dialog request, background write result, status and title

mod common;

use std::path::PathBuf;

use code_studio::commands::Cmd;
use code_studio::messages::{AppMsg, DocumentMsg, Msg};
use code_studio::update::update;
use common::test_model;

fn app(msg: AppMsg) -> Msg {
    Msg::App(msg)
}

#[test]
fn test_save_always_asks_for_a_path() {
    let mut model = test_model("print(1)", 0, 0);
    let cmd = update(&mut model, app(AppMsg::SaveRequested));
    assert_eq!(
        cmd,
        Some(Cmd::ShowSaveFileDialog {
            suggested_path: None
        })
    );

    model.document.file_path = Some(PathBuf::from("/tmp/old.py"));
    let cmd = update(&mut model, app(AppMsg::SaveRequested));
    assert_eq!(
        cmd,
        Some(Cmd::ShowSaveFileDialog {
            suggested_path: Some(PathBuf::from("/tmp/old.py"))
        })
    );
}

#[test]
fn test_cancelled_dialog_does_nothing() {
    let mut model = test_model("print(1)", 0, 0);
    let cmd = update(&mut model, app(AppMsg::SaveDialogResult { path: None }));
    assert_eq!(cmd, None);
    assert!(!model.ui.is_saving);
}

#[test]
fn test_chosen_path_writes_buffer_text() {
    let mut model = test_model("line one\nline two\n", 0, 0);
    let path = PathBuf::from("/tmp/out.py");
    let cmd = update(
        &mut model,
        app(AppMsg::SaveDialogResult {
            path: Some(path.clone()),
        }),
    );

    assert_eq!(
        cmd,
        Some(Cmd::SaveFile {
            path,
            content: "line one\nline two\n".to_string()
        })
    );
    assert!(model.ui.is_saving);
    assert_eq!(model.ui.status_message, "Saving...");
}

#[test]
fn test_second_save_while_writing_is_refused() {
    let mut model = test_model("x", 0, 0);
    update(
        &mut model,
        app(AppMsg::SaveDialogResult {
            path: Some(PathBuf::from("/tmp/a.py")),
        }),
    );
    let cmd = update(&mut model, app(AppMsg::SaveRequested));
    assert_eq!(cmd, Some(Cmd::Redraw));
    assert_eq!(model.ui.status_message, "Save already in progress");
}

#[test]
fn test_save_success_clears_modified_flag() {
    let mut model = test_model("", 0, 0);
    update(&mut model, Msg::Document(DocumentMsg::InsertChar('x')));
    assert!(model.document.is_modified);

    let path = PathBuf::from("/tmp/script.py");
    update(
        &mut model,
        app(AppMsg::SaveDialogResult {
            path: Some(path.clone()),
        }),
    );
    update(&mut model, app(AppMsg::SaveCompleted(Ok(path.clone()))));

    assert!(!model.ui.is_saving);
    assert!(!model.document.is_modified);
    assert_eq!(model.document.file_path, Some(path));
    assert_eq!(model.ui.status_message, "Saved: /tmp/script.py");
    assert_eq!(model.window_title(), "script.py - Code Studio");
}

#[test]
fn test_edit_during_save_stays_modified() {
    let mut model = test_model("", 0, 0);
    update(&mut model, Msg::Document(DocumentMsg::InsertChar('a')));
    let path = PathBuf::from("/tmp/script.py");
    update(
        &mut model,
        app(AppMsg::SaveDialogResult {
            path: Some(path.clone()),
        }),
    );
    // Typed after the content snapshot was handed to the writer
    update(&mut model, Msg::Document(DocumentMsg::InsertChar('b')));
    update(&mut model, app(AppMsg::SaveCompleted(Ok(path.clone()))));

    assert!(!model.ui.is_saving);
    assert!(model.document.is_modified);
    assert_eq!(model.document.file_path, Some(path));
    assert_eq!(model.window_title(), "script.py* - Code Studio");
}

#[test]
fn test_save_failure_reports_error() {
    let mut model = test_model("x", 0, 0);
    update(
        &mut model,
        app(AppMsg::SaveDialogResult {
            path: Some(PathBuf::from("/nope/a.py")),
        }),
    );
    let cmd = update(
        &mut model,
        app(AppMsg::SaveCompleted(Err("permission denied".to_string()))),
    );

    assert_eq!(
        cmd.map(Cmd::flatten),
        Some(vec![
            Cmd::ShowErrorDialog {
                title: "Save Error".to_string(),
                message: "permission denied".to_string(),
            },
            Cmd::Redraw,
        ])
    );
    assert!(!model.ui.is_saving);
    assert_eq!(model.ui.status_message, "Error saving file: permission denied");
    assert_eq!(model.document.file_path, None);
}

#[test]
fn test_title_marks_unsaved_changes() {
    let mut model = test_model("", 0, 0);
    assert_eq!(model.window_title(), "Code Studio");

    model.document.file_path = Some(PathBuf::from("/tmp/notes.py"));
    update(&mut model, Msg::Document(DocumentMsg::InsertChar('a')));
    assert_eq!(model.window_title(), "notes.py* - Code Studio");
}
