/// The two side-by-side panes of the address book screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pane {
    /// Pane 1: save-address form
    Form,
    /// Pane 2: contacts table
    Contacts,
}

impl Pane {
    pub const ALL: [Pane; 2] = [Pane::Form, Pane::Contacts];

    pub fn title(self) -> &'static str {
        match self {
            Pane::Form => "SAVE ADDRESS",
            Pane::Contacts => "ADDRESS BOOK",
        }
    }

    pub fn digit(self) -> char {
        match self {
            Pane::Form => '1',
            Pane::Contacts => '2',
        }
    }

    pub fn other(self) -> Self {
        match self {
            Pane::Form => Pane::Contacts,
            Pane::Contacts => Pane::Form,
        }
    }
}
