//! Run button flow: planning, output log, input prompts and the worker thread

mod common;

use std::sync::mpsc;

use code_studio::commands::Cmd;
use code_studio::messages::{ModalMsg, Msg, RunMsg, UiMsg};
use code_studio::model::{ModalId, RunState};
use code_studio::run::{spawn_evaluation, CHANNEL_URL, DISCORD_URL};
use code_studio::syntax::LanguageTag;
use code_studio::update::update;
use common::{drain_until_finished, test_model, test_model_with_language};

fn run(msg: RunMsg) -> Msg {
    Msg::Run(msg)
}

fn modal(msg: ModalMsg) -> Msg {
    Msg::Ui(UiMsg::Modal(msg))
}

// ========================================================================
// Planning
// ========================================================================

#[test]
fn test_python_run_starts_evaluation() {
    let mut model = test_model("print('hi')\n", 0, 0);
    let cmd = update(&mut model, run(RunMsg::Start));

    assert_eq!(
        cmd,
        Some(Cmd::StartEvaluation {
            source: "print('hi')\n".to_string()
        })
    );
    assert_eq!(model.run_state, RunState::Evaluating);
    assert_eq!(model.ui.status_message, "Running...");
}

#[test]
fn test_second_run_is_rejected_while_running() {
    let mut model = test_model("print('hi')\n", 0, 0);
    update(&mut model, run(RunMsg::Start));
    let cmd = update(&mut model, run(RunMsg::Start));

    assert_eq!(cmd, Some(Cmd::Redraw));
    assert_eq!(model.ui.status_message, "A script is already running");
    assert_eq!(model.run_state, RunState::Evaluating);
}

#[test]
fn test_discord_notice_skips_evaluation() {
    let mut model = test_model("# join the discord\nprint(1)\n", 0, 0);
    let cmd = update(&mut model, run(RunMsg::Start));

    assert_eq!(cmd, Some(Cmd::Redraw));
    assert_eq!(model.output.text(), DISCORD_URL);
    assert_eq!(model.run_state, RunState::Idle);
}

#[test]
fn test_channel_notice_is_appended_on_its_own_line() {
    let mut model = test_model("s = 'TheVrEnthusiast'\n", 0, 0);
    model.output.write("previous output");
    update(&mut model, run(RunMsg::Start));

    assert_eq!(
        model.output.text(),
        format!("previous output\n{}", CHANNEL_URL)
    );
}

#[test]
fn test_html_run_opens_preview() {
    let mut model = test_model_with_language("<h1>Hi</h1>", LanguageTag::Html, 0, 0);
    let path = model.preview_path();
    let cmd = update(&mut model, run(RunMsg::Start));

    assert_eq!(
        cmd,
        Some(Cmd::Batch(vec![
            Cmd::OpenPreview {
                path,
                content: "<h1>Hi</h1>".to_string(),
            },
            Cmd::Redraw,
        ]))
    );
    assert_eq!(model.run_state, RunState::Idle);
    // Markup runs never write to the output log
    assert!(model.output.is_empty());

    let opened = model.preview_path();
    update(&mut model, run(RunMsg::PreviewFinished(Ok(opened))));
    assert!(model.output.is_empty());
    update(
        &mut model,
        run(RunMsg::PreviewFinished(Err("no browser".to_string()))),
    );
    assert!(model.output.is_empty());
}

#[test]
fn test_preview_failure_shows_error_dialog() {
    let mut model = test_model_with_language("<p>", LanguageTag::Html, 0, 0);
    let cmd = update(
        &mut model,
        run(RunMsg::PreviewFinished(Err("no browser".to_string()))),
    );

    assert!(matches!(
        cmd,
        Some(Cmd::Batch(ref cmds)) if matches!(cmds[0], Cmd::ShowErrorDialog { .. })
    ));
    assert_eq!(model.ui.status_message, "Preview failed: no browser");
}

// ========================================================================
// Results
// ========================================================================

#[test]
fn test_output_chunks_append_verbatim() {
    let mut model = test_model("", 0, 0);
    update(&mut model, run(RunMsg::Start));
    update(&mut model, run(RunMsg::Output("a".to_string())));
    update(&mut model, run(RunMsg::Output("b\n".to_string())));

    assert_eq!(model.output.text(), "ab\n");
}

#[test]
fn test_successful_run_returns_to_idle() {
    let mut model = test_model("print(1)", 0, 0);
    update(&mut model, run(RunMsg::Start));
    update(&mut model, run(RunMsg::Output("1\n".to_string())));
    update(&mut model, run(RunMsg::Finished(Ok(()))));

    assert_eq!(model.run_state, RunState::Idle);
    assert_eq!(model.output.text(), "1\n");
    assert_eq!(model.ui.status_message, "Run finished");
}

#[test]
fn test_failed_run_appends_error_line() {
    let mut model = test_model("print(1)\nprint(1/0)", 0, 0);
    update(&mut model, run(RunMsg::Start));
    update(&mut model, run(RunMsg::Output("1\n".to_string())));
    update(
        &mut model,
        run(RunMsg::Finished(Err("division by zero".to_string()))),
    );

    assert_eq!(
        model.output.text(),
        "1\nError executing code: division by zero"
    );
    assert_eq!(model.ui.status_message, "Run failed");
    assert_eq!(model.run_state, RunState::Idle);
}

#[test]
fn test_output_log_is_never_cleared_between_runs() {
    let mut model = test_model("print(1)", 0, 0);
    for _ in 0..2 {
        update(&mut model, run(RunMsg::Start));
        update(&mut model, run(RunMsg::Output("1\n".to_string())));
        update(&mut model, run(RunMsg::Finished(Ok(()))));
    }
    assert_eq!(model.output.text(), "1\n1\n");
}

// ========================================================================
// Input prompt
// ========================================================================

#[test]
fn test_input_request_opens_prompt_and_answer_resumes_worker() {
    let mut model = test_model("x = input('Name?')", 0, 0);
    update(&mut model, run(RunMsg::Start));
    update(&mut model, run(RunMsg::InputRequested("Name?".to_string())));

    assert_eq!(model.ui.modal_id(), Some(ModalId::InputPrompt));
    assert_eq!(
        model.run_state,
        RunState::AwaitingInput {
            prompt: "Name?".to_string()
        }
    );

    for ch in "Bob".chars() {
        update(&mut model, modal(ModalMsg::InsertChar(ch)));
    }
    update(&mut model, modal(ModalMsg::DeleteBackward));
    update(&mut model, modal(ModalMsg::InsertChar('x')));
    let cmd = update(&mut model, modal(ModalMsg::Confirm));

    assert_eq!(
        cmd,
        Some(Cmd::Batch(vec![
            Cmd::ProvideInput("Box".to_string()),
            Cmd::Redraw
        ]))
    );
    assert!(!model.ui.has_modal());
    assert_eq!(model.run_state, RunState::Evaluating);
}

#[test]
fn test_escape_on_prompt_answers_empty_string() {
    let mut model = test_model("input()", 0, 0);
    update(&mut model, run(RunMsg::Start));
    update(&mut model, run(RunMsg::InputRequested(String::new())));
    update(&mut model, modal(ModalMsg::InsertChar('z')));
    let cmd = update(&mut model, modal(ModalMsg::Cancel));

    assert_eq!(
        cmd,
        Some(Cmd::Batch(vec![Cmd::ProvideInput(String::new()), Cmd::Redraw]))
    );
}

#[test]
fn test_prompt_blocks_other_dialogs() {
    let mut model = test_model("input()", 0, 0);
    update(&mut model, run(RunMsg::Start));
    update(&mut model, run(RunMsg::InputRequested("?".to_string())));

    assert_eq!(update(&mut model, Msg::Ui(UiMsg::OpenInfo)), None);
    assert_eq!(model.ui.modal_id(), Some(ModalId::InputPrompt));
}

#[test]
fn test_stop_while_prompting_closes_prompt() {
    let mut model = test_model("input()", 0, 0);
    update(&mut model, run(RunMsg::Start));
    update(&mut model, run(RunMsg::InputRequested("?".to_string())));
    let cmd = update(&mut model, run(RunMsg::Cancel));

    assert_eq!(
        cmd,
        Some(Cmd::Batch(vec![Cmd::CancelEvaluation, Cmd::Redraw]))
    );
    assert!(!model.ui.has_modal());
    assert_eq!(model.ui.status_message, "Stopping...");
}

#[test]
fn test_stop_when_idle_does_nothing() {
    let mut model = test_model("", 0, 0);
    assert_eq!(update(&mut model, run(RunMsg::Cancel)), None);
}

#[test]
fn test_late_input_request_after_finish_is_ignored() {
    let mut model = test_model("", 0, 0);
    assert_eq!(
        update(&mut model, run(RunMsg::InputRequested("?".to_string()))),
        None
    );
    assert!(!model.ui.has_modal());
}

// ========================================================================
// Worker thread
// ========================================================================

fn output_of(msgs: &[Msg]) -> String {
    msgs.iter()
        .filter_map(|m| match m {
            Msg::Run(RunMsg::Output(chunk)) => Some(chunk.as_str()),
            _ => None,
        })
        .collect()
}

fn result_of(msgs: &[Msg]) -> Result<(), String> {
    match msgs.last() {
        Some(Msg::Run(RunMsg::Finished(result))) => result.clone(),
        other => panic!("expected Finished, got {:?}", other),
    }
}

#[test]
fn test_worker_streams_output_then_finishes() {
    let (tx, rx) = mpsc::channel();
    let handle = spawn_evaluation("for i in range(3):\n    print(i)\n".to_string(), tx).unwrap();
    let msgs = drain_until_finished(&rx);
    handle.join();

    assert_eq!(output_of(&msgs), "0\n1\n2\n");
    assert_eq!(result_of(&msgs), Ok(()));
}

#[test]
fn test_worker_reports_error_after_partial_output() {
    let (tx, rx) = mpsc::channel();
    let handle = spawn_evaluation("print('a')\nx = [1][3]\n".to_string(), tx).unwrap();
    let msgs = drain_until_finished(&rx);
    handle.join();

    assert_eq!(output_of(&msgs), "a\n");
    assert_eq!(result_of(&msgs), Err("list index out of range".to_string()));
}

#[test]
fn test_worker_waits_for_input() {
    let (tx, rx) = mpsc::channel();
    let handle = spawn_evaluation(
        "print('start')\nname = input('Who? ')\nprint('hi ' + name)\n".to_string(),
        tx,
    )
    .unwrap();

    let mut seen = Vec::new();
    loop {
        let msg = rx.recv_timeout(std::time::Duration::from_secs(10)).unwrap();
        if let Msg::Run(RunMsg::InputRequested(prompt)) = &msg {
            assert_eq!(prompt, "Who? ");
            break;
        }
        seen.push(msg);
    }
    // Output before the prompt is flushed ahead of the request
    assert_eq!(output_of(&seen), "start\n");

    handle.provide_input("Ada".to_string());
    let msgs = drain_until_finished(&rx);
    handle.join();

    assert_eq!(output_of(&msgs), "hi Ada\n");
    assert_eq!(result_of(&msgs), Ok(()));
}

#[test]
fn test_cancel_interrupts_infinite_loop() {
    let (tx, rx) = mpsc::channel();
    let handle = spawn_evaluation("n = 0\nwhile True:\n    n += 1\n".to_string(), tx).unwrap();
    handle.cancel();
    let msgs = drain_until_finished(&rx);
    handle.join();

    assert!(result_of(&msgs).is_err());
}

#[test]
fn test_cancel_interrupts_pending_input() {
    let (tx, rx) = mpsc::channel();
    let handle = spawn_evaluation("input('wait')\nprint('never')\n".to_string(), tx).unwrap();
    match rx.recv_timeout(std::time::Duration::from_secs(10)).unwrap() {
        Msg::Run(RunMsg::InputRequested(_)) => {}
        other => panic!("expected input request, got {:?}", other),
    }
    handle.cancel();
    let msgs = drain_until_finished(&rx);
    handle.join();

    assert_eq!(output_of(&msgs), "");
    assert!(result_of(&msgs).is_err());
}

#[test]
fn test_worker_result_feeds_back_into_model() {
    let mut model = test_model("print(6 * 7)\n", 0, 0);
    let Some(Cmd::StartEvaluation { source }) = update(&mut model, run(RunMsg::Start)) else {
        panic!("expected evaluation");
    };

    let (tx, rx) = mpsc::channel();
    let handle = spawn_evaluation(source, tx).unwrap();
    for msg in drain_until_finished(&rx) {
        update(&mut model, msg);
    }
    handle.join();

    assert_eq!(model.output.text(), "42\n");
    assert_eq!(model.run_state, RunState::Idle);
    assert!(!model.ui.has_modal());
}
