//! UI state - status bar, cursor blink, dialogs and menus

use std::time::{Duration, Instant};

use crate::syntax::LanguageTag;
use crate::theme::ThemeId;

/// Identifies which modal is currently active
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModalId {
    /// Text prompt answering a script's `input()`
    InputPrompt,
    /// About text (Info button)
    Info,
    /// Install hint plus buffer echo (Debug button)
    Debug,
    /// Themes menu opened from the menu bar
    ThemeMenu,
    /// Language selector dropdown in the toolbar
    LanguageMenu,
}

/// State for the input prompt modal
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputPromptState {
    /// Prompt text passed to `input()`
    pub prompt: String,
    /// Current input text
    pub input: String,
}

/// State for the debug dialog
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DebugDialogState {
    /// First visible line of the buffer echo
    pub scroll_offset: usize,
}

/// State for a dropdown list
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MenuState {
    /// Index of the highlighted entry
    pub selected_index: usize,
}

/// Union of all modal states
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModalState {
    InputPrompt(InputPromptState),
    Info,
    Debug(DebugDialogState),
    ThemeMenu(MenuState),
    LanguageMenu(MenuState),
}

impl ModalState {
    pub fn id(&self) -> ModalId {
        match self {
            ModalState::InputPrompt(_) => ModalId::InputPrompt,
            ModalState::Info => ModalId::Info,
            ModalState::Debug(_) => ModalId::Debug,
            ModalState::ThemeMenu(_) => ModalId::ThemeMenu,
            ModalState::LanguageMenu(_) => ModalId::LanguageMenu,
        }
    }

    /// Theme menu with the current theme preselected
    pub fn theme_menu(current: ThemeId) -> Self {
        let selected_index = ThemeId::ALL.iter().position(|&t| t == current).unwrap_or(0);
        ModalState::ThemeMenu(MenuState { selected_index })
    }

    /// Language menu with the current language preselected
    pub fn language_menu(current: LanguageTag) -> Self {
        let selected_index = LanguageTag::SELECTABLE
            .iter()
            .position(|&t| t == current)
            .unwrap_or(0);
        ModalState::LanguageMenu(MenuState { selected_index })
    }

    /// Number of entries for list modals
    pub fn entry_count(&self) -> usize {
        match self {
            ModalState::ThemeMenu(_) => ThemeId::ALL.len(),
            ModalState::LanguageMenu(_) => LanguageTag::SELECTABLE.len(),
            _ => 0,
        }
    }
}

/// UI state - status messages, cursor animation, modals
#[derive(Debug, Clone)]
pub struct UiState {
    /// Message displayed in the status bar
    pub status_message: String,
    /// Whether the cursor is currently visible (for blinking)
    pub cursor_visible: bool,
    /// Timestamp of last cursor blink state change
    pub last_cursor_blink: Instant,
    /// Whether a save is in flight
    pub is_saving: bool,
    /// Document revision the in-flight save is writing
    pub saving_revision: u64,
    /// Currently active modal (if any)
    pub active_modal: Option<ModalState>,
}

impl UiState {
    pub fn new() -> Self {
        Self::with_status("")
    }

    pub fn with_status(message: impl Into<String>) -> Self {
        Self {
            status_message: message.into(),
            cursor_visible: true,
            last_cursor_blink: Instant::now(),
            is_saving: false,
            saving_revision: 0,
            active_modal: None,
        }
    }

    pub fn has_modal(&self) -> bool {
        self.active_modal.is_some()
    }

    pub fn modal_id(&self) -> Option<ModalId> {
        self.active_modal.as_ref().map(ModalState::id)
    }

    pub fn open_modal(&mut self, state: ModalState) {
        self.active_modal = Some(state);
    }

    pub fn close_modal(&mut self) {
        self.active_modal = None;
    }

    /// Reset cursor blink timer (call after user input)
    pub fn reset_cursor_blink(&mut self) {
        self.cursor_visible = true;
        self.last_cursor_blink = Instant::now();
    }

    /// Update cursor blink state based on elapsed time
    /// Returns true if the state changed (needs redraw)
    pub fn update_cursor_blink(&mut self, blink_interval: Duration) -> bool {
        if self.last_cursor_blink.elapsed() >= blink_interval {
            self.cursor_visible = !self.cursor_visible;
            self.last_cursor_blink = Instant::now();
            true
        } else {
            false
        }
    }

    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status_message = message.into();
    }
}

impl Default for UiState {
    fn default() -> Self {
        Self::new()
    }
}
