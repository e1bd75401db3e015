//! Address book table on the right of the screen: every wallet's saved
//! addresses in one searchable, paginated list.

use crossterm::event::{Event, KeyEvent};
use ratatui::layout::Constraint;
use ratatui::style::{Modifier, Style};
use ratatui::text::Span;
use ratatui::widgets::Cell;
use tui_input::backend::crossterm::EventHandler;
use tui_input::Input;

use crate::config::TableConfig;
use crate::search;
use crate::table::widget::cell_button;
use crate::table::{CellValue, Column, TableOptions, TableView};
use crate::wallets::{AddressBookEntry, Wallets};

pub const EMPTY_TEXT: &str = "You don't have any contacts in your address book";
pub const DELETE_MESSAGE: &str = "Are you sure you want to delete this account?";
pub const DELETE_TITLE: &str = "Delete account";
pub const DELETE_CONFIRM: &str = "Delete";
pub const RENAME_HEADER: &str = "Address name";
pub const RENAME_TITLE: &str = "Rename Address";
pub const RENAME_CONFIRM: &str = "Save";

pub const LABEL_COLUMN: usize = 0;
pub const COIN_COLUMN: usize = 1;
pub const ADDRESS_COLUMN: usize = 2;

/// Flatten every wallet's entries, keep those whose address or label
/// contains `query`, newest label order first (Z to A).
pub fn collect_entries(wallets: &Wallets, query: &str) -> Vec<AddressBookEntry> {
    search::address_book_view(wallets.entries(), query)
}

/// LABEL, COIN, ADDRESS. `button` styles the trailing edit/delete actions;
/// pass `None` to leave them out.
pub fn columns(button: Option<Style>) -> Vec<Column<AddressBookEntry>> {
    let mut columns = vec![
        Column::new("Label")
            .width(Constraint::Percentage(25))
            .value(|e: &AddressBookEntry| CellValue::from(e.address_book.label.as_str()))
            .render(|ctx, _| {
                Cell::from(Span::styled(
                    ctx.item.address_book.label.clone(),
                    Style::default().add_modifier(Modifier::BOLD),
                ))
            }),
        Column::new("Coin")
            .width(Constraint::Length(6))
            .value(|e: &AddressBookEntry| CellValue::from(e.code.as_str())),
        Column::new("Address")
            .value(|e: &AddressBookEntry| CellValue::from(e.address_book.address.as_str())),
    ];

    if let Some(style) = button {
        columns.push(Column::actions().render(move |_, _| cell_button("edit", style)));
        columns.push(Column::actions().render(move |_, _| cell_button("delete", style)));
    }
    columns
}

pub struct AddressBookContent {
    search: Input,
    searching: bool,
    table: TableView<AddressBookEntry>,
}

impl AddressBookContent {
    pub fn new(config: &TableConfig, button: Style) -> Self {
        let options = TableOptions {
            can_sort: true,
            with_pagination: true,
            rows_per_page: config.rows_per_page,
            striped_rows: config.striped_rows,
            complete_icons: config.complete_icons,
            direction: config.direction,
            empty_text: Some(EMPTY_TEXT.to_string()),
            definition: Some("contacts".to_string()),
        };
        Self {
            search: Input::default(),
            searching: false,
            table: TableView::new(columns(Some(button)), options),
        }
    }

    /// Rebuild the rows from the registry with the current search text.
    pub fn refresh(&mut self, wallets: &Wallets) {
        let entries = collect_entries(wallets, self.search.value());
        self.table.set_items(entries);
    }

    pub fn search(&self) -> &Input {
        &self.search
    }

    pub fn is_searching(&self) -> bool {
        self.searching
    }

    pub fn start_search(&mut self) {
        self.searching = true;
    }

    /// Leave the search box, keeping the text.
    pub fn finish_search(&mut self) {
        self.searching = false;
    }

    /// Leave the search box and drop the query.
    pub fn clear_search(&mut self, wallets: &Wallets) {
        self.searching = false;
        if !self.search.value().is_empty() {
            self.search.reset();
            self.refresh(wallets);
        }
    }

    pub fn handle_search_input(&mut self, key: KeyEvent, wallets: &Wallets) -> bool {
        let changed = self.search.handle_event(&Event::Key(key)).is_some();
        if changed {
            self.refresh(wallets);
        }
        changed
    }

    pub fn table(&self) -> &TableView<AddressBookEntry> {
        &self.table
    }

    pub fn table_mut(&mut self) -> &mut TableView<AddressBookEntry> {
        &mut self.table
    }

    pub fn selected(&self) -> Option<&AddressBookEntry> {
        self.table.selected_item()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::wallets::{CoinCode, Label};
    use crossterm::event::{KeyCode, KeyModifiers};

    fn wallets() -> Wallets {
        let db = Database::open_in_memory().unwrap();
        let mut wallets = Wallets::open(
            db,
            &[
                ("BTC".to_string(), "Bitcoin".to_string()),
                ("LTC".to_string(), "Litecoin".to_string()),
            ],
        )
        .unwrap();
        for (code, label, address) in [
            ("BTC", "alice", "bc1alice"),
            ("LTC", "bob", "ltc1bob"),
            ("BTC", "carol", "bc1carol"),
        ] {
            wallets
                .save_to_address_book(
                    &CoinCode::new(code),
                    Label {
                        label: label.to_string(),
                        address: address.to_string(),
                    },
                )
                .unwrap();
        }
        wallets
    }

    fn content(wallets: &Wallets) -> AddressBookContent {
        let mut content = AddressBookContent::new(&TableConfig::default(), Style::default());
        content.refresh(wallets);
        content
    }

    fn labels(content: &AddressBookContent) -> Vec<String> {
        content
            .table()
            .page_rows()
            .iter()
            .map(|row| row.item.address_book.label.clone())
            .collect()
    }

    #[test]
    fn test_all_wallets_sorted_by_label_descending() {
        let wallets = wallets();
        let content = content(&wallets);
        assert_eq!(labels(&content), vec!["carol", "bob", "alice"]);
        assert_eq!(content.table().columns().len(), 5);
    }

    #[test]
    fn test_search_filters_by_label_or_address() {
        let wallets = wallets();
        let mut content = content(&wallets);
        content.start_search();
        for c in "LTC1".chars() {
            content.handle_search_input(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE), &wallets);
        }
        assert_eq!(labels(&content), vec!["bob"]);

        content.clear_search(&wallets);
        assert!(!content.is_searching());
        assert_eq!(labels(&content).len(), 3);
    }

    #[test]
    fn test_delete_removes_exactly_one_entry() {
        let mut wallets = wallets();
        let mut content = content(&wallets);
        content.table_mut().select_next();

        let selected = content.selected().cloned().unwrap();
        assert_eq!(selected.address_book.label, "bob");
        wallets
            .remove_entry(&selected.code, selected.address_book.id)
            .unwrap();
        content.refresh(&wallets);

        assert_eq!(labels(&content), vec!["carol", "alice"]);
        assert_eq!(wallets.get(&CoinCode::new("BTC")).unwrap().info.address_book.len(), 2);
    }

    #[test]
    fn test_empty_book_shows_empty_text() {
        let wallets = Wallets::open(Database::open_in_memory().unwrap(), &[]).unwrap();
        let content = content(&wallets);
        assert!(content.table().page_rows().is_empty());
        assert_eq!(content.table().options().empty_text.as_deref(), Some(EMPTY_TEXT));
        assert!(content.selected().is_none());
    }

    #[test]
    fn test_columns_without_actions() {
        let columns = columns(None);
        assert_eq!(columns.len(), 3);
        assert!(columns.iter().all(|c| c.sortable()));
    }
}
