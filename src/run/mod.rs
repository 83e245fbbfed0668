//! Execution bridge behind the Run button
//!
//! The buffer's language tag decides what Run does:
//!
//! ```text
//! Html            → write preview file → open in the default browser
//! anything else   → notice check → script worker (evaluate on a thread)
//! ```
//!
//! Planning is pure so it can be tested without threads or a browser; the
//! runtime carries out the plan through `preview` and `worker`.

pub mod preview;
pub mod worker;

use std::path::{Path, PathBuf};

use crate::syntax::LanguageTag;

pub use preview::write_and_open_preview;
pub use worker::{spawn_evaluation, ChannelHost, RunHandle, WORKER_STACK_SIZE};

/// Substring that answers Run with the community invite instead of running
pub const DISCORD_TRIGGER: &str = "discord";
pub const DISCORD_URL: &str = "https://discord.gg/H6JvfVNS";
/// Substring that answers Run with the channel link instead of running
pub const CHANNEL_TRIGGER: &str = "TheVrEnthusiast";
pub const CHANNEL_URL: &str = "https://www.youtube.com/channel/UCNmQ6yNgwT0KsL8oQgA656g";

/// What a Run request turns into
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunPlan {
    /// Write `content` to `path` and open it with the default handler
    Preview { path: PathBuf, content: String },
    /// Append a fixed line to the output log; nothing is evaluated
    Notice(&'static str),
    /// Evaluate the buffer as a script
    Evaluate { source: String },
}

/// Decide what Run does with `buffer`
///
/// The notice checks look at the raw text, comments and strings included.
pub fn plan_run(buffer: &str, language: LanguageTag, preview_path: &Path) -> RunPlan {
    if language.is_markup() {
        return RunPlan::Preview {
            path: preview_path.to_path_buf(),
            content: buffer.to_string(),
        };
    }

    if buffer.contains(DISCORD_TRIGGER) {
        RunPlan::Notice(DISCORD_URL)
    } else if buffer.contains(CHANNEL_TRIGGER) {
        RunPlan::Notice(CHANNEL_URL)
    } else {
        RunPlan::Evaluate {
            source: buffer.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn preview_path() -> PathBuf {
        PathBuf::from("temp_preview.html")
    }

    #[test]
    fn test_html_is_previewed_verbatim() {
        let plan = plan_run("<h1>discord</h1>", LanguageTag::Html, &preview_path());
        assert_eq!(
            plan,
            RunPlan::Preview {
                path: preview_path(),
                content: "<h1>discord</h1>".to_string(),
            }
        );
    }

    #[test]
    fn test_discord_wins_over_channel() {
        let plan = plan_run(
            "# TheVrEnthusiast\n# discord",
            LanguageTag::Python,
            &preview_path(),
        );
        assert_eq!(plan, RunPlan::Notice(DISCORD_URL));
    }

    #[test]
    fn test_channel_notice() {
        let plan = plan_run("x = 'TheVrEnthusiast'", LanguageTag::Python, &preview_path());
        assert_eq!(plan, RunPlan::Notice(CHANNEL_URL));
    }

    #[test]
    fn test_trigger_is_case_sensitive() {
        let plan = plan_run("print('Discord')", LanguageTag::Python, &preview_path());
        assert!(matches!(plan, RunPlan::Evaluate { .. }));
    }

    #[test]
    fn test_legacy_tags_evaluate() {
        let plan = plan_run("print(1)", LanguageTag::Cpp, &preview_path());
        assert_eq!(
            plan,
            RunPlan::Evaluate {
                source: "print(1)".to_string()
            }
        );
    }
}
