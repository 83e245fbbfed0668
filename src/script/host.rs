//! The seam between the interpreter and whatever displays its output

use std::collections::VecDeque;

/// Output sink and input source for a running script
pub trait ScriptHost {
    /// Append raw text to the output (no newline added)
    fn write_output(&mut self, text: &str);

    /// Block until the user answers an `input()` prompt.
    ///
    /// `None` means the run was cancelled while waiting.
    fn request_input(&mut self, prompt: &str) -> Option<String>;

    /// Polled between statements; returning true interrupts the script
    fn should_stop(&self) -> bool {
        false
    }

    /// Called before every statement, for hosts that batch their output
    fn poll(&mut self) {}
}

/// Host that records output in memory and answers input from a queue
#[derive(Debug, Default, Clone)]
pub struct CaptureHost {
    pub output: String,
    pub inputs: VecDeque<String>,
    pub prompts: Vec<String>,
}

impl CaptureHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_inputs<I, S>(inputs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            inputs: inputs.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }
}

impl ScriptHost for CaptureHost {
    fn write_output(&mut self, text: &str) {
        self.output.push_str(text);
    }

    /// An exhausted queue answers with an empty string, like a cancelled dialog
    fn request_input(&mut self, prompt: &str) -> Option<String> {
        self.prompts.push(prompt.to_string());
        Some(self.inputs.pop_front().unwrap_or_default())
    }
}
