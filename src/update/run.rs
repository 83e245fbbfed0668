//! Run button handlers: dispatch, streamed output, input prompts, results

use crate::commands::Cmd;
use crate::messages::RunMsg;
use crate::model::{AppModel, InputPromptState, ModalId, ModalState, RunState};
use crate::run::{plan_run, RunPlan};

/// Handle run messages
pub fn update_run(model: &mut AppModel, msg: RunMsg) -> Option<Cmd> {
    match msg {
        RunMsg::Start => start_run(model),

        RunMsg::Cancel => {
            if !model.run_state.is_running() {
                return None;
            }
            if model.ui.modal_id() == Some(ModalId::InputPrompt) {
                model.ui.close_modal();
            }
            model.ui.set_status("Stopping...");
            Some(Cmd::batch(vec![Cmd::CancelEvaluation, Cmd::Redraw]))
        }

        RunMsg::Output(chunk) => {
            model.output.write(&chunk);
            Some(Cmd::Redraw)
        }

        RunMsg::InputRequested(prompt) => {
            if !model.run_state.is_running() {
                return None;
            }
            model.run_state = RunState::AwaitingInput {
                prompt: prompt.clone(),
            };
            model.ui.open_modal(ModalState::InputPrompt(InputPromptState {
                prompt,
                input: String::new(),
            }));
            model.reset_cursor_blink();
            Some(Cmd::Redraw)
        }

        RunMsg::Finished(result) => {
            model.run_state = RunState::Idle;
            if model.ui.modal_id() == Some(ModalId::InputPrompt) {
                model.ui.close_modal();
            }
            match result {
                Ok(()) => model.ui.set_status("Run finished"),
                Err(e) => {
                    model.output.append_error(&e);
                    model.ui.set_status("Run failed");
                }
            }
            Some(Cmd::Redraw)
        }

        RunMsg::PreviewFinished(result) => match result {
            Ok(path) => {
                model
                    .ui
                    .set_status(format!("Preview opened: {}", path.display()));
                Some(Cmd::Redraw)
            }
            Err(e) => {
                tracing::warn!("Preview failed: {}", e);
                model.ui.set_status(format!("Preview failed: {}", e));
                Some(Cmd::batch(vec![
                    Cmd::ShowErrorDialog {
                        title: "Preview Error".to_string(),
                        message: e,
                    },
                    Cmd::Redraw,
                ]))
            }
        },
    }
}

fn start_run(model: &mut AppModel) -> Option<Cmd> {
    if model.run_state.is_running() {
        model.ui.set_status("A script is already running");
        return Some(Cmd::Redraw);
    }

    let buffer = model.document.text();
    match plan_run(&buffer, model.document.language, &model.preview_path()) {
        RunPlan::Preview { path, content } => {
            model.ui.set_status("Opening preview...");
            Some(Cmd::batch(vec![
                Cmd::OpenPreview { path, content },
                Cmd::Redraw,
            ]))
        }
        RunPlan::Notice(line) => {
            model.output.append_line(line);
            Some(Cmd::Redraw)
        }
        RunPlan::Evaluate { source } => {
            model.run_state = RunState::Evaluating;
            model.ui.set_status("Running...");
            Some(Cmd::StartEvaluation { source })
        }
    }
}

/// Answer the pending input prompt and resume the worker
///
/// `None` (Escape) answers with an empty string.
pub(super) fn answer_input(model: &mut AppModel, answer: Option<String>) -> Option<Cmd> {
    model.ui.close_modal();
    if !matches!(model.run_state, RunState::AwaitingInput { .. }) {
        return Some(Cmd::Redraw);
    }
    model.run_state = RunState::Evaluating;
    Some(Cmd::batch(vec![
        Cmd::ProvideInput(answer.unwrap_or_default()),
        Cmd::Redraw,
    ]))
}
