use crossterm::event::{Event, KeyEvent};
use tui_input::backend::crossterm::EventHandler;
use tui_input::Input;
use uuid::Uuid;

use crate::wallets::CoinCode;

/// Share of the screen width a dialog takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModalSize {
    Small,
    Medium,
}

impl ModalSize {
    pub fn width(self, available: u16) -> u16 {
        let wanted = match self {
            ModalSize::Small => 40,
            ModalSize::Medium => 60,
        };
        wanted.min(available)
    }
}

/// The entry a prompt or confirmation acts on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryRef {
    pub code: CoinCode,
    pub id: Uuid,
}

/// Single-line text prompt with a title, a field header and a confirm button.
pub struct PromptModal {
    pub title: String,
    pub header: String,
    pub confirm_label: String,
    pub size: ModalSize,
    target: EntryRef,
    input: Input,
}

impl PromptModal {
    pub fn new(
        header: impl Into<String>,
        title: impl Into<String>,
        confirm_label: impl Into<String>,
        initial: &str,
        size: ModalSize,
        target: EntryRef,
    ) -> Self {
        Self {
            title: title.into(),
            header: header.into(),
            confirm_label: confirm_label.into(),
            size,
            target,
            input: Input::new(initial.to_string()),
        }
    }

    pub fn target(&self) -> &EntryRef {
        &self.target
    }

    pub fn value(&self) -> &str {
        self.input.value()
    }

    pub fn visual_cursor(&self) -> usize {
        self.input.visual_cursor()
    }

    pub fn handle_key_event(&mut self, key: KeyEvent) -> bool {
        self.input.handle_event(&Event::Key(key)).is_some()
    }
}
