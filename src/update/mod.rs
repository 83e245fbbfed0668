//! Update functions for the Elm-style architecture
//!
//! All state transformations flow through these functions.

mod app;
mod document;
mod editor;
mod run;
mod theme;
mod ui;

use crate::commands::Cmd;
use crate::messages::{Msg, UiMsg};
use crate::model::AppModel;

pub use app::update_app;
pub use document::update_document;
pub use editor::update_editor;
pub use run::update_run;
pub use theme::update_theme;
pub use ui::update_ui;

/// Main update function - dispatches to sub-handlers
pub fn update(model: &mut AppModel, msg: Msg) -> Option<Cmd> {
    // Skip logging for noisy periodic messages
    if !matches!(msg, Msg::Ui(UiMsg::BlinkCursor)) {
        tracing::trace!(target: "message", msg = %crate::tracing::describe_msg(&msg), "processing");
    }

    match msg {
        Msg::Editor(m) => editor::update_editor(model, m),
        Msg::Document(m) => document::update_document(model, m),
        Msg::Ui(m) => ui::update_ui(model, m),
        Msg::App(m) => app::update_app(model, m),
        Msg::Run(m) => run::update_run(model, m),
        Msg::Theme(id) => theme::update_theme(model, id),
    }
}
