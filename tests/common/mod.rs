//! Shared test helpers for integration tests
//!
//! Note: Functions may appear unused because each test file compiles separately.

#![allow(dead_code)]

use std::sync::mpsc::Receiver;
use std::time::Duration;

use code_studio::cli::StartupConfig;
use code_studio::config::EditorConfig;
use code_studio::messages::{Msg, RunMsg};
use code_studio::model::{AppModel, Cursor, Document};
use code_studio::script::{self, CaptureHost, ScriptResult};
use code_studio::syntax::LanguageTag;
use code_studio::theme::ThemeId;

/// Startup settings for an untitled Python buffer with the default theme
pub fn startup(language: LanguageTag) -> StartupConfig {
    StartupConfig {
        file: None,
        language,
        theme: ThemeId::Default,
        editor: EditorConfig::default(),
    }
}

/// Create a test model with given text and cursor position
pub fn test_model(text: &str, line: usize, column: usize) -> AppModel {
    test_model_with_language(text, LanguageTag::Python, line, column)
}

pub fn test_model_with_language(
    text: &str,
    language: LanguageTag,
    line: usize,
    column: usize,
) -> AppModel {
    let mut model = AppModel::new(800, 600, startup(language));
    model.document = Document::with_text(text, language);
    model.editor.cursor = Cursor::at(line, column);
    model.ensure_cursor_visible();
    model
}

/// Helper to get buffer content as string
pub fn buffer_to_string(model: &AppModel) -> String {
    model.document.buffer.to_string()
}

/// Run a script on a thread with the worker's stack size
pub fn run_script(source: &str, inputs: &[&str]) -> (CaptureHost, ScriptResult<()>) {
    let source = source.to_string();
    let inputs: Vec<String> = inputs.iter().map(|s| s.to_string()).collect();
    std::thread::Builder::new()
        .stack_size(code_studio::run::WORKER_STACK_SIZE)
        .spawn(move || {
            let mut host = CaptureHost::with_inputs(inputs);
            let result = script::run_source(&source, &mut host);
            (host, result)
        })
        .expect("spawn script thread")
        .join()
        .expect("script thread panicked")
}

/// Output of a script that must succeed
pub fn script_output(source: &str) -> String {
    let (host, result) = run_script(source, &[]);
    if let Err(e) = result {
        panic!("script failed: {}", e);
    }
    host.output
}

/// Receive worker messages until `Finished`, or fail after a timeout
pub fn drain_until_finished(rx: &Receiver<Msg>) -> Vec<Msg> {
    let mut msgs = Vec::new();
    loop {
        let msg = rx
            .recv_timeout(Duration::from_secs(10))
            .expect("worker did not finish in time");
        let done = matches!(msg, Msg::Run(RunMsg::Finished(_)));
        msgs.push(msg);
        if done {
            return msgs;
        }
    }
}
