use std::io::{stdout, Write};
use std::process::{Command, Stdio};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::backend::{Backend, CrosstermBackend};
use ratatui::style::Style;
use ratatui::Terminal;
use tracing::{debug, info, warn};
use tui_widgets::popup::PopupState;

use crate::config::{CommandExec, Config, UiColors};
use crate::table::PagerButton;
use crate::wallets::{WalletError, Wallets};

use super::contacts::{self, AddressBookContent};
use super::draw;
use super::panes::Pane;
use super::prompt::{EntryRef, ModalSize, PromptModal};
use super::save_panel::{FormField, PendingSave, SaveAddressPanel};

#[derive(Debug, Clone)]
pub struct ConfirmModal {
    pub title: String,
    pub message: String,
    pub confirm_label: String,
    pub size: ModalSize,
    pub action: ConfirmAction,
}

/// Action to perform when the confirm modal is accepted
#[derive(Debug, Clone)]
pub enum ConfirmAction {
    /// Remove one saved address
    DeleteEntry(EntryRef),
}

/// Blocking modal shown while a wallet write runs
#[derive(Debug, Clone)]
pub struct LoadingModal {
    pub message: String,
}

/// Share modal with QR code
#[derive(Debug, Clone)]
pub struct ShareModal {
    pub title: String,
    /// QR code rendered as lines of Unicode characters
    pub qr_lines: Vec<String>,
}

pub struct App<'a> {
    wallets: &'a mut Wallets,
    config: &'a Config,
    pub focused_pane: Pane,
    pub form: SaveAddressPanel,
    pub contacts: AddressBookContent,
    pub status: Option<String>,
    // Popup state for modal dialogs (tui-widgets popup)
    pub modal_popup: PopupState,
    pub confirm_modal: Option<ConfirmModal>,
    pub prompt_modal: Option<PromptModal>,
    pub loading_modal: Option<LoadingModal>,
    pub share_modal: Option<ShareModal>,
    // Validated form submit, written from the event loop behind the loading modal
    pending_save: Option<PendingSave>,
}

impl<'a> App<'a> {
    pub fn new(wallets: &'a mut Wallets, config: &'a Config) -> Self {
        let button = Style::default().fg(draw::color(config.ui.colors.button));
        let mut contacts = AddressBookContent::new(&config.table, button);
        contacts.refresh(wallets);

        Self {
            wallets,
            config,
            focused_pane: Pane::Form,
            form: SaveAddressPanel::new(),
            contacts,
            status: None,
            modal_popup: PopupState::default(),
            confirm_modal: None,
            prompt_modal: None,
            loading_modal: None,
            share_modal: None,
            pending_save: None,
        }
    }

    pub fn run(&mut self) -> Result<()> {
        enable_raw_mode()?;
        let mut stdout = stdout();
        stdout.execute(EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;
        terminal.clear()?;

        let result = self.event_loop(&mut terminal);

        disable_raw_mode()?;
        terminal.backend_mut().execute(LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        result
    }

    fn event_loop<B>(&mut self, terminal: &mut Terminal<B>) -> Result<()>
    where
        B: Backend,
    {
        loop {
            draw::render(terminal, self)?;

            if self.process_pending(terminal)? {
                continue;
            }

            if event::poll(Duration::from_millis(250))? {
                match event::read()? {
                    Event::Key(key) => {
                        if self.handle_key(key)? {
                            break;
                        }
                    }
                    Event::Resize(_, _) => {}
                    _ => {}
                }
            }
        }
        Ok(())
    }

    /// Write a queued form submit. Returns true when there was one.
    pub fn process_pending<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<bool> {
        let Some(pending) = self.pending_save.take() else {
            return Ok(false);
        };
        self.loading(terminal, "SAVING...", |app| app.save_pending(pending))?;
        Ok(true)
    }

    /// Run `action` with the loading modal on screen.
    fn loading<B, R, F>(&mut self, terminal: &mut Terminal<B>, message: &str, action: F) -> Result<R>
    where
        B: Backend,
        F: FnOnce(&mut Self) -> R,
    {
        self.loading_modal = Some(LoadingModal {
            message: message.to_string(),
        });
        draw::render(terminal, self)?;
        let result = action(self);
        self.loading_modal = None;
        Ok(result)
    }

    fn save_pending(&mut self, pending: PendingSave) {
        let Some(code) = self
            .wallets
            .iter()
            .nth(pending.wallet_index)
            .map(|wallet| wallet.code.clone())
        else {
            self.set_status("No wallet selected");
            return;
        };

        let label = pending.entry.label.clone();
        match self.wallets.save_to_address_book(&code, pending.entry) {
            Ok(_) => {
                self.form.reset();
                self.contacts.refresh(self.wallets);
                self.set_status(format!("Saved {} to {}", label, code));
            }
            Err(err) => self.report(err),
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Result<bool> {
        // Ctrl+C always quits (hardcoded for safety)
        if key.modifiers.contains(KeyModifiers::CONTROL)
            && matches!(key.code, KeyCode::Char('c') | KeyCode::Char('C'))
        {
            return Ok(true);
        }

        if self.loading_modal.is_some() {
            return Ok(false);
        }

        if self.share_modal.is_some() {
            self.handle_share_modal_key(key);
            return Ok(false);
        }

        if self.confirm_modal.is_some() {
            self.handle_confirm_modal_key(key);
            return Ok(false);
        }

        if self.prompt_modal.is_some() {
            self.handle_prompt_key(key);
            return Ok(false);
        }

        match self.focused_pane {
            Pane::Form => self.handle_form_key(key),
            Pane::Contacts if self.contacts.is_searching() => {
                self.handle_search_key(key);
                Ok(false)
            }
            Pane::Contacts => self.handle_table_key(key),
        }
    }

    /// Quit and pane switching; only reached when no text field has focus.
    fn handle_global_key(&mut self, key: &KeyEvent) -> Option<bool> {
        let config = self.config;
        let global = &config.keys.global;
        if matches_any(key, &global.quit) {
            return Some(true);
        }
        if matches_any(key, &global.focus_form) {
            self.focus_pane(Pane::Form);
            return Some(false);
        }
        if matches_any(key, &global.focus_contacts) {
            self.focus_pane(Pane::Contacts);
            return Some(false);
        }
        None
    }

    fn handle_form_key(&mut self, key: KeyEvent) -> Result<bool> {
        let config = self.config;
        let form_keys = &config.keys.form;

        if matches_any(&key, &form_keys.submit) {
            self.submit_form();
            return Ok(false);
        }
        if matches_any(&key, &form_keys.next) {
            self.form.focus_next();
            return Ok(false);
        }
        if matches_any(&key, &form_keys.prev) {
            self.form.focus_prev();
            return Ok(false);
        }
        if matches_any(&key, &form_keys.leave) {
            self.focus_pane(self.focused_pane.other());
            return Ok(false);
        }

        match self.form.focus() {
            FormField::Label | FormField::Address => {
                self.form.handle_input(key);
                Ok(false)
            }
            FormField::Wallet | FormField::Submit => {
                let count = self.wallets.len();
                if self.form.focus() == FormField::Wallet {
                    if matches_any(&key, &form_keys.wallet_next) {
                        self.form.select_wallet(1, count);
                        return Ok(false);
                    }
                    if matches_any(&key, &form_keys.wallet_prev) {
                        self.form.select_wallet(-1, count);
                        return Ok(false);
                    }
                }
                Ok(self.handle_global_key(&key).unwrap_or(false))
            }
        }
    }

    fn submit_form(&mut self) {
        if self.wallets.is_empty() {
            self.set_status("No wallets configured");
            return;
        }
        match self.form.submit() {
            Ok(pending) => {
                debug!(wallet_index = pending.wallet_index, "queued address book save");
                self.pending_save = Some(pending);
            }
            Err(errors) => {
                debug!(count = errors.len(), "form rejected");
                self.set_status("Please fix the highlighted fields");
            }
        }
    }

    fn handle_search_key(&mut self, key: KeyEvent) {
        let config = self.config;
        let search_keys = &config.keys.search;

        if matches_any(&key, &search_keys.confirm) {
            self.contacts.finish_search();
            return;
        }
        if matches_any(&key, &search_keys.cancel) {
            self.contacts.clear_search(self.wallets);
            return;
        }
        self.contacts.handle_search_input(key, self.wallets);
    }

    fn handle_table_key(&mut self, key: KeyEvent) -> Result<bool> {
        if let Some(quit) = self.handle_global_key(&key) {
            return Ok(quit);
        }

        let config = self.config;
        let t = &config.keys.table;
        let table = self.contacts.table_mut();

        if matches_any(&key, &t.next) {
            table.select_next();
        } else if matches_any(&key, &t.prev) {
            table.select_prev();
        } else if matches_any(&key, &t.page_next) {
            table.press(PagerButton::Next);
        } else if matches_any(&key, &t.page_prev) {
            table.press(PagerButton::Previous);
        } else if matches_any(&key, &t.page_first) {
            table.press(PagerButton::First);
        } else if matches_any(&key, &t.page_last) {
            table.press(PagerButton::Last);
        } else if matches_any(&key, &t.column_next) {
            table.move_column_cursor(1);
        } else if matches_any(&key, &t.column_prev) {
            table.move_column_cursor(-1);
        } else if matches_any(&key, &t.sort) {
            if table.toggle_sort_at_cursor() {
                let message = sort_status(table.sort(), table.columns());
                self.set_status(message);
            }
        } else if matches_any(&key, &t.page_size) {
            let rows = table.cycle_rows_per_page(&config.table.page_size_options);
            self.set_status(format!("Showing {} per page", rows));
        } else if matches_any(&key, &t.search) {
            self.contacts.start_search();
        } else if matches_any(&key, &t.edit) {
            self.begin_rename();
        } else if matches_any(&key, &t.delete) {
            self.begin_delete();
        } else if matches_any(&key, &t.copy) {
            self.copy_selected_address();
        } else if matches_any(&key, &t.share) {
            self.show_share_modal();
        }

        Ok(false)
    }

    fn selected_ref(&self) -> Option<EntryRef> {
        self.contacts.selected().map(|entry| EntryRef {
            code: entry.code.clone(),
            id: entry.address_book.id,
        })
    }

    fn begin_delete(&mut self) {
        let Some(target) = self.selected_ref() else {
            self.set_status("No contact selected");
            return;
        };
        self.modal_popup = PopupState::default();
        self.confirm_modal = Some(ConfirmModal {
            title: contacts::DELETE_TITLE.to_string(),
            message: contacts::DELETE_MESSAGE.to_string(),
            confirm_label: contacts::DELETE_CONFIRM.to_string(),
            size: ModalSize::Small,
            action: ConfirmAction::DeleteEntry(target),
        });
    }

    fn begin_rename(&mut self) {
        let Some(entry) = self.contacts.selected() else {
            self.set_status("No contact selected");
            return;
        };
        let current = entry.address_book.label.clone();
        let Some(target) = self.selected_ref() else {
            return;
        };
        self.modal_popup = PopupState::default();
        self.prompt_modal = Some(PromptModal::new(
            contacts::RENAME_HEADER,
            contacts::RENAME_TITLE,
            contacts::RENAME_CONFIRM,
            &current,
            // wide enough for a label at the length limit
            ModalSize::Medium,
            target,
        ));
    }

    fn handle_confirm_modal_key(&mut self, key: KeyEvent) {
        let Some(modal) = self.confirm_modal.take() else {
            return;
        };

        let config = self.config;
        let modal_keys = &config.keys.modal;

        if matches_any(&key, &modal_keys.cancel) {
            return;
        }

        if matches_any(&key, &modal_keys.confirm) {
            match modal.action {
                ConfirmAction::DeleteEntry(target) => self.delete_entry(&target),
            }
            return;
        }

        // Put the modal back if key wasn't handled
        self.confirm_modal = Some(modal);
    }

    fn delete_entry(&mut self, target: &EntryRef) {
        match self.wallets.remove_entry(&target.code, target.id) {
            Ok(removed) => {
                self.contacts.refresh(self.wallets);
                self.set_status(format!("Deleted {}", removed.label));
            }
            Err(err) => self.report(err),
        }
    }

    fn handle_prompt_key(&mut self, key: KeyEvent) {
        let Some(mut prompt) = self.prompt_modal.take() else {
            return;
        };

        let config = self.config;
        let prompt_keys = &config.keys.prompt;

        if matches_any(&key, &prompt_keys.cancel) {
            return;
        }

        if matches_any(&key, &prompt_keys.confirm) {
            let target = prompt.target().clone();
            match self.wallets.rename_entry(&target.code, target.id, prompt.value()) {
                Ok(()) => {
                    self.contacts.refresh(self.wallets);
                    self.set_status(format!("Renamed to {}", prompt.value()));
                }
                Err(WalletError::Validation(errors)) => {
                    // Keep the prompt open so the label can be fixed.
                    if let Some(first) = errors.first() {
                        self.set_status(first.to_string());
                    }
                    self.prompt_modal = Some(prompt);
                }
                Err(err) => self.report(err),
            }
            return;
        }

        prompt.handle_key_event(key);
        self.prompt_modal = Some(prompt);
    }

    fn handle_share_modal_key(&mut self, key: KeyEvent) {
        let modal_keys = &self.config.keys.modal;
        if matches_any(&key, &modal_keys.cancel) || matches_any(&key, &modal_keys.confirm) {
            self.share_modal = None;
        }
    }

    // =========================================================================
    // Share Modal (QR Code)
    // =========================================================================

    fn show_share_modal(&mut self) {
        use qrcode::{render::unicode, QrCode};

        let Some(entry) = self.contacts.selected() else {
            self.set_status("No contact selected");
            return;
        };
        let title = format!(" {} · {} ", entry.address_book.label, entry.code);

        let code = match QrCode::new(entry.address_book.address.as_bytes()) {
            Ok(c) => c,
            Err(e) => {
                self.set_status(format!("QR generation failed: {}", e));
                return;
            }
        };

        // Half-block rendering keeps the code compact
        let qr_string = code
            .render::<unicode::Dense1x2>()
            .dark_color(unicode::Dense1x2::Dark)
            .light_color(unicode::Dense1x2::Light)
            .build();

        let qr_lines: Vec<String> = qr_string.lines().map(|s| s.to_string()).collect();

        self.modal_popup = PopupState::default();
        self.share_modal = Some(ShareModal { title, qr_lines });
    }

    fn copy_selected_address(&mut self) {
        let Some(address) = self
            .contacts
            .selected()
            .map(|entry| entry.address_book.address.clone())
        else {
            self.set_status("Nothing to copy");
            return;
        };

        if let Some(command) = self.config.commands.copy.clone() {
            match run_copy_command(&command, address.trim()) {
                Ok(_) => self.set_status("Address copied!"),
                Err(err) => {
                    warn!(error = %err, "copy command failed");
                    self.set_status(format!("Copy failed: {}", err));
                }
            }
        } else {
            self.set_status("Copy command not configured");
        }
    }

    fn focus_pane(&mut self, pane: Pane) {
        self.focused_pane = pane;
    }

    fn report(&mut self, err: WalletError) {
        warn!(error = %err, "wallet action failed");
        self.set_status(err.to_string());
    }

    fn set_status<S: Into<String>>(&mut self, message: S) {
        let message = message.into();
        info!(status = %message);
        self.status = Some(message);
    }

    pub fn ui_colors(&self) -> &UiColors {
        &self.config.ui.colors
    }

    pub fn wallets(&self) -> &Wallets {
        self.wallets
    }
}

fn sort_status<T>(sort: Option<crate::table::SortSpec>, columns: &[crate::table::Column<T>]) -> String {
    match sort {
        Some(spec) => {
            let label = columns
                .get(spec.column)
                .map(|c| c.label.to_uppercase())
                .unwrap_or_default();
            let order = match spec.order {
                crate::table::SortOrder::Descending => "descending",
                crate::table::SortOrder::Ascending => "ascending",
            };
            format!("Sorted by {} ({})", label, order)
        }
        None => "Sorting cleared".to_string(),
    }
}

fn run_copy_command(command: &CommandExec, value: &str) -> Result<()> {
    let mut child = Command::new(&command.program)
        .args(&command.args)
        .stdin(Stdio::piped())
        .spawn()
        .with_context(|| format!("failed to spawn `{}`", command.program))?;

    if let Some(mut stdin) = child.stdin.take() {
        stdin.write_all(value.as_bytes())?;
    }

    let status = child.wait()?;
    if !status.success() {
        bail!("`{}` exited with {}", command.program, status);
    }

    Ok(())
}

/// Check if the key event matches any of the bindings in the list
pub fn matches_any(event: &KeyEvent, bindings: &[String]) -> bool {
    bindings.iter().any(|b| key_matches(event, b))
}

/// Check if the key event matches a single binding string
pub fn key_matches(event: &KeyEvent, binding: &str) -> bool {
    let trimmed = binding.trim();
    if trimmed.is_empty() {
        return false;
    }

    // Ctrl/Alt/Super chords are not bindable
    let disallowed = KeyModifiers::CONTROL | KeyModifiers::ALT | KeyModifiers::SUPER;
    if event.modifiers.intersects(disallowed) {
        return false;
    }

    match trimmed.to_ascii_lowercase().as_str() {
        // Special keys
        "enter" => matches!(event.code, KeyCode::Enter),
        "tab" => matches!(event.code, KeyCode::Tab),
        "backtab" | "shift+tab" => matches!(event.code, KeyCode::BackTab),
        "backspace" => matches!(event.code, KeyCode::Backspace),
        "delete" | "del" => matches!(event.code, KeyCode::Delete),
        "esc" | "escape" => matches!(event.code, KeyCode::Esc),
        "space" => matches!(event.code, KeyCode::Char(' ')),
        // Arrow keys
        "up" => matches!(event.code, KeyCode::Up),
        "down" => matches!(event.code, KeyCode::Down),
        "left" => matches!(event.code, KeyCode::Left),
        "right" => matches!(event.code, KeyCode::Right),
        // Page navigation
        "pageup" | "page_up" => matches!(event.code, KeyCode::PageUp),
        "pagedown" | "page_down" => matches!(event.code, KeyCode::PageDown),
        "home" => matches!(event.code, KeyCode::Home),
        "end" => matches!(event.code, KeyCode::End),
        name if name.len() > 1 && name.starts_with('f') => match name[1..].parse::<u8>() {
            Ok(n) if (1..=12).contains(&n) => matches!(event.code, KeyCode::F(f) if f == n),
            _ => false,
        },
        // Single character - case-sensitive (g != G, since G requires Shift)
        _ => {
            let mut chars = trimmed.chars();
            if let (Some(first), None) = (chars.next(), chars.next()) {
                matches!(event.code, KeyCode::Char(c) if c == first)
            } else {
                false
            }
        }
    }
}
