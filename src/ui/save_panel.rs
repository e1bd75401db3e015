//! The "Add contact" form on the left of the screen.

use crossterm::event::{Event, KeyEvent};
use tui_input::backend::crossterm::EventHandler;
use tui_input::Input;

use crate::wallets::{validate_contact, FieldError, Label};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormField {
    #[default]
    Label,
    Address,
    Wallet,
    Submit,
}

impl FormField {
    pub const ALL: [FormField; 4] = [
        FormField::Label,
        FormField::Address,
        FormField::Wallet,
        FormField::Submit,
    ];

    pub fn title(self) -> &'static str {
        match self {
            FormField::Label => "Label",
            FormField::Address => "Wallet Address",
            FormField::Wallet => "Select Wallet",
            FormField::Submit => "Add contact",
        }
    }

    pub fn placeholder(self) -> &'static str {
        match self {
            FormField::Label => "Enter label...",
            FormField::Address => "Enter address...",
            FormField::Wallet | FormField::Submit => "",
        }
    }

    fn index(self) -> usize {
        Self::ALL.iter().position(|f| *f == self).unwrap_or(0)
    }
}

/// A submit that passed validation, waiting to be written to the wallet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingSave {
    pub wallet_index: usize,
    pub entry: Label,
}

#[derive(Default)]
pub struct SaveAddressPanel {
    label: Input,
    address: Input,
    wallet_index: usize,
    focus: FormField,
    errors: Vec<FieldError>,
    /// Set after the first rejected submit; errors then track every edit.
    touched: bool,
}

impl SaveAddressPanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn focus(&self) -> FormField {
        self.focus
    }

    pub fn set_focus(&mut self, field: FormField) {
        self.focus = field;
    }

    pub fn focus_next(&mut self) {
        let len = FormField::ALL.len();
        self.focus = FormField::ALL[(self.focus.index() + 1) % len];
    }

    pub fn focus_prev(&mut self) {
        let len = FormField::ALL.len();
        self.focus = FormField::ALL[(self.focus.index() + len - 1) % len];
    }

    pub fn label(&self) -> &Input {
        &self.label
    }

    pub fn address(&self) -> &Input {
        &self.address
    }

    /// The focused text input, if the focus is on one.
    pub fn focused_input(&self) -> Option<&Input> {
        match self.focus() {
            FormField::Label => Some(&self.label),
            FormField::Address => Some(&self.address),
            FormField::Wallet | FormField::Submit => None,
        }
    }

    pub fn wallet_index(&self) -> usize {
        self.wallet_index
    }

    pub fn select_wallet(&mut self, delta: isize, wallet_count: usize) {
        if wallet_count == 0 {
            self.wallet_index = 0;
            return;
        }
        let index = self.wallet_index.min(wallet_count - 1) as isize + delta;
        self.wallet_index = index.rem_euclid(wallet_count as isize) as usize;
    }

    /// Feed a key to the focused text input. Returns true when consumed.
    pub fn handle_input(&mut self, key: KeyEvent) -> bool {
        let input = match self.focus() {
            FormField::Label => &mut self.label,
            FormField::Address => &mut self.address,
            FormField::Wallet | FormField::Submit => return false,
        };
        let consumed = input.handle_event(&Event::Key(key)).is_some();
        if consumed && self.touched {
            self.errors = validate_contact(self.label.value(), self.address.value());
        }
        consumed
    }

    pub fn label_error(&self) -> Option<FieldError> {
        self.errors.iter().copied().find(|e| e.is_label())
    }

    pub fn address_error(&self) -> Option<FieldError> {
        self.errors.iter().copied().find(|e| !e.is_label())
    }

    /// Validate and hand back what should be saved. Inline errors are kept
    /// on failure and the focus jumps to the first invalid field.
    pub fn submit(&mut self) -> Result<PendingSave, Vec<FieldError>> {
        self.errors = validate_contact(self.label.value(), self.address.value());
        if !self.errors.is_empty() {
            self.touched = true;
            if self.label_error().is_some() {
                self.set_focus(FormField::Label);
            } else {
                self.set_focus(FormField::Address);
            }
            return Err(self.errors.clone());
        }

        Ok(PendingSave {
            wallet_index: self.wallet_index,
            entry: Label {
                label: self.label.value().to_string(),
                address: self.address.value().to_string(),
            },
        })
    }

    /// Back to initial values: empty fields, first wallet, no errors.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyCode, KeyModifiers};

    fn type_text(panel: &mut SaveAddressPanel, text: &str) {
        for c in text.chars() {
            panel.handle_input(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE));
        }
    }

    #[test]
    fn test_empty_submit_shows_both_messages() {
        let mut panel = SaveAddressPanel::new();
        let errors = panel.submit().unwrap_err();
        assert_eq!(
            errors,
            vec![FieldError::LabelRequired, FieldError::AddressRequired]
        );
        assert_eq!(
            panel.label_error().map(|e| e.to_string()).as_deref(),
            Some("Label is a required field")
        );
        assert_eq!(
            panel.address_error().map(|e| e.to_string()).as_deref(),
            Some("Wallet address is a required field")
        );
        assert_eq!(panel.focus(), FormField::Label);
    }

    #[test]
    fn test_errors_clear_while_typing_after_failed_submit() {
        let mut panel = SaveAddressPanel::new();
        assert!(panel.submit().is_err());

        type_text(&mut panel, "alice");
        assert_eq!(panel.label_error(), None);
        assert_eq!(panel.address_error(), Some(FieldError::AddressRequired));
    }

    #[test]
    fn test_long_label_is_rejected() {
        let mut panel = SaveAddressPanel::new();
        type_text(&mut panel, &"a".repeat(61));
        panel.focus_next();
        type_text(&mut panel, "bc1q");

        assert_eq!(panel.submit().unwrap_err(), vec![FieldError::LabelTooLong]);
        assert_eq!(panel.focus(), FormField::Label);
    }

    #[test]
    fn test_valid_submit_and_reset() {
        let mut panel = SaveAddressPanel::new();
        type_text(&mut panel, "alice");
        panel.focus_next();
        type_text(&mut panel, "bc1qalice");
        panel.focus_next();
        panel.select_wallet(1, 3);
        panel.select_wallet(1, 3);

        let pending = panel.submit().unwrap();
        assert_eq!(pending.wallet_index, 2);
        assert_eq!(pending.entry.label, "alice");
        assert_eq!(pending.entry.address, "bc1qalice");

        panel.reset();
        assert_eq!(panel.label().value(), "");
        assert_eq!(panel.address().value(), "");
        assert_eq!(panel.wallet_index(), 0);
        assert_eq!(panel.focus(), FormField::Label);
    }

    #[test]
    fn test_wallet_selector_wraps_and_ignores_text() {
        let mut panel = SaveAddressPanel::new();
        panel.set_focus(FormField::Wallet);
        assert!(panel.focused_input().is_none());
        assert!(!panel.handle_input(KeyEvent::new(KeyCode::Char('x'), KeyModifiers::NONE)));

        panel.select_wallet(-1, 3);
        assert_eq!(panel.wallet_index(), 2);
        panel.select_wallet(1, 3);
        assert_eq!(panel.wallet_index(), 0);
        panel.select_wallet(1, 0);
        assert_eq!(panel.wallet_index(), 0);
    }

    #[test]
    fn test_focus_cycles() {
        let mut panel = SaveAddressPanel::new();
        panel.focus_prev();
        assert_eq!(panel.focus(), FormField::Submit);
        panel.focus_next();
        assert_eq!(panel.focus(), FormField::Label);
    }
}
