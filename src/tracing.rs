//! Logging setup
//!
//! # Usage
//!
//! Configure via RUST_LOG environment variable:
//! - `RUST_LOG=debug` - all debug logs
//! - `RUST_LOG=code_studio::run=debug` - module-level filtering
//! - `RUST_LOG=code_studio::update=trace` - every message through `update`
//!
//! # Log Files
//!
//! Logs are written to `~/.config/code-studio/logs/code-studio.log` with
//! daily rotation. File logging uses debug level for troubleshooting.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::config_paths::LOG_FILE_PREFIX;

/// Initialize tracing subscriber with console and file logging
///
/// Console output respects RUST_LOG and defaults to `warn`.
pub fn init() {
    let console_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let console_layer = fmt::layer()
        .with_target(true)
        .with_line_number(true)
        .with_filter(console_filter);

    let file_layer = match crate::config_paths::ensure_logs_dir() {
        Ok(logs_dir) => {
            let file_appender = tracing_appender::rolling::daily(logs_dir, LOG_FILE_PREFIX);
            Some(
                fmt::layer()
                    .with_writer(file_appender)
                    .with_ansi(false)
                    .with_target(true)
                    .with_line_number(true)
                    .with_filter(EnvFilter::new("debug")),
            )
        }
        Err(e) => {
            eprintln!("Warning: Could not initialize file logging: {}", e);
            None
        }
    };

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .init();
}

/// Short one-line description of a message for trace output
///
/// Keeps typed characters and script output out of the log.
pub fn describe_msg(msg: &crate::messages::Msg) -> String {
    use crate::messages::{DocumentMsg, Msg, RunMsg};

    match msg {
        Msg::Document(DocumentMsg::InsertChar(_)) => "Document(InsertChar)".to_string(),
        Msg::Run(RunMsg::Output(chunk)) => format!("Run(Output, {} bytes)", chunk.len()),
        Msg::Ui(crate::messages::UiMsg::Modal(crate::messages::ModalMsg::InsertChar(_))) => {
            "Ui(Modal(InsertChar))".to_string()
        }
        other => {
            let full = format!("{:?}", other);
            match full.char_indices().nth(80) {
                Some((cut, _)) => format!("{}…", &full[..cut]),
                None => full,
            }
        }
    }
}
