//! Command types for the Elm-style architecture
//!
//! Commands represent side effects that should be performed after an update.

use std::path::PathBuf;

/// Commands returned by update functions
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Cmd {
    /// No command - do nothing
    #[default]
    None,
    /// Request a redraw of the window
    Redraw,
    /// Execute multiple commands
    Batch(Vec<Cmd>),

    // === File Commands ===
    /// Show native save file dialog
    ShowSaveFileDialog {
        /// Suggested file path (for pre-filling name/directory)
        suggested_path: Option<PathBuf>,
    },
    /// Save file asynchronously
    SaveFile { path: PathBuf, content: String },
    /// Show a native error message box
    ShowErrorDialog { title: String, message: String },

    // === Run Commands ===
    /// Write the preview file and open it in the browser
    OpenPreview { path: PathBuf, content: String },
    /// Start the script worker thread
    StartEvaluation { source: String },
    /// Answer the worker's pending `input()` call
    ProvideInput(String),
    /// Ask the worker to stop at its next statement
    CancelEvaluation,

    // === Application Commands ===
    /// Request application exit
    Quit,
}

impl Cmd {
    /// Create a batch of commands
    pub fn batch(cmds: Vec<Cmd>) -> Self {
        Cmd::Batch(cmds)
    }

    /// Check if this command requires a redraw
    pub fn needs_redraw(&self) -> bool {
        match self {
            Cmd::None => false,
            Cmd::Redraw => true,
            Cmd::Batch(cmds) => cmds.iter().any(|c| c.needs_redraw()),
            // Dialogs and workers report back through messages
            Cmd::ShowSaveFileDialog { .. } | Cmd::ShowErrorDialog { .. } => false,
            Cmd::SaveFile { .. } | Cmd::OpenPreview { .. } => true,
            Cmd::StartEvaluation { .. } | Cmd::ProvideInput(_) | Cmd::CancelEvaluation => true,
            // Quit doesn't need redraw - app is exiting
            Cmd::Quit => false,
        }
    }

    /// Flatten nested batches (used by tests to inspect effects)
    pub fn flatten(self) -> Vec<Cmd> {
        match self {
            Cmd::Batch(cmds) => cmds.into_iter().flat_map(Cmd::flatten).collect(),
            Cmd::None => Vec::new(),
            other => vec![other],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_needs_redraw_if_any_member_does() {
        assert!(!Cmd::None.needs_redraw());
        assert!(!Cmd::batch(vec![Cmd::Quit, Cmd::None]).needs_redraw());
        assert!(Cmd::batch(vec![Cmd::Quit, Cmd::Redraw]).needs_redraw());
    }

    #[test]
    fn test_flatten_drops_none_and_nesting() {
        let cmd = Cmd::batch(vec![
            Cmd::Redraw,
            Cmd::None,
            Cmd::batch(vec![Cmd::CancelEvaluation]),
        ]);
        assert_eq!(cmd.flatten(), vec![Cmd::Redraw, Cmd::CancelEvaluation]);
    }
}
