//! Wallet registry: the wallets the screen knows about and their address
//! books, backed by [`Database`].

use std::fmt;

use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use crate::db::{AddressRow, Database};

pub const LABEL_MAX_CHARS: usize = 60;

#[derive(Debug, Error)]
pub enum WalletError {
    #[error("no wallet with code `{0}`")]
    UnknownWallet(CoinCode),
    #[error("no address book entry in {code} matching `{key}`")]
    EntryNotFound { code: CoinCode, key: String },
    #[error("{}", join_messages(.0))]
    Validation(Vec<FieldError>),
    #[error("stored entry `{id}` in {code} does not have a valid id")]
    CorruptEntry { code: String, id: String },
    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),
}

/// Inline form messages for a new or renamed contact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FieldError {
    #[error("Label is a required field")]
    LabelRequired,
    #[error("Label must be at most {} characters", LABEL_MAX_CHARS)]
    LabelTooLong,
    #[error("Wallet address is a required field")]
    AddressRequired,
}

impl FieldError {
    pub fn is_label(self) -> bool {
        matches!(self, FieldError::LabelRequired | FieldError::LabelTooLong)
    }
}

fn join_messages(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

pub fn validate_label(label: &str) -> Option<FieldError> {
    if label.trim().is_empty() {
        Some(FieldError::LabelRequired)
    } else if label.chars().count() > LABEL_MAX_CHARS {
        Some(FieldError::LabelTooLong)
    } else {
        None
    }
}

/// Required label (at most 60 chars) and required address. The address
/// format itself is not checked.
pub fn validate_contact(label: &str, address: &str) -> Vec<FieldError> {
    let mut errors = Vec::new();
    if let Some(err) = validate_label(label) {
        errors.push(err);
    }
    if address.trim().is_empty() {
        errors.push(FieldError::AddressRequired);
    }
    errors
}

/// Upper-case coin ticker identifying a wallet.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CoinCode(String);

impl CoinCode {
    pub fn new(code: &str) -> Self {
        Self(code.trim().to_ascii_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CoinCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Payload handed to [`Wallets::save_to_address_book`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label {
    pub label: String,
    pub address: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedAddress {
    pub id: Uuid,
    pub label: String,
    pub address: String,
}

impl SavedAddress {
    fn from_row(row: AddressRow) -> Result<Self, WalletError> {
        let id = Uuid::parse_str(&row.id).map_err(|_| WalletError::CorruptEntry {
            code: row.wallet_code.clone(),
            id: row.id.clone(),
        })?;
        Ok(Self {
            id,
            label: row.label,
            address: row.address,
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct WalletInfo {
    pub address_book: Vec<SavedAddress>,
}

#[derive(Debug, Clone)]
pub struct Wallet {
    pub code: CoinCode,
    pub name: String,
    pub info: WalletInfo,
}

/// One wallet's entry joined with the wallet code, for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressBookEntry {
    pub code: CoinCode,
    pub address_book: SavedAddress,
}

pub struct Wallets {
    db: Database,
    wallets: Vec<Wallet>,
}

impl Wallets {
    /// Register `configured` wallets `(code, name)` and load every wallet the
    /// store knows about.
    pub fn open(db: Database, configured: &[(String, String)]) -> Result<Self, WalletError> {
        for (code, name) in configured {
            let code = CoinCode::new(code);
            db.upsert_wallet(code.as_str(), name)?;
        }

        let mut wallets = Vec::new();
        for row in db.list_wallets()? {
            let address_book = db
                .address_book(&row.code)?
                .into_iter()
                .map(SavedAddress::from_row)
                .collect::<Result<Vec<_>, _>>()?;
            wallets.push(Wallet {
                code: CoinCode::new(&row.code),
                name: row.name,
                info: WalletInfo { address_book },
            });
        }

        debug!(count = wallets.len(), "loaded wallets");
        Ok(Self { db, wallets })
    }

    pub fn iter(&self) -> impl Iterator<Item = &Wallet> {
        self.wallets.iter()
    }

    pub fn len(&self) -> usize {
        self.wallets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.wallets.is_empty()
    }

    pub fn find<P>(&self, predicate: P) -> Option<&Wallet>
    where
        P: Fn(&Wallet) -> bool,
    {
        self.wallets.iter().find(|wallet| predicate(wallet))
    }

    pub fn get(&self, code: &CoinCode) -> Result<&Wallet, WalletError> {
        self.find(|wallet| &wallet.code == code)
            .ok_or_else(|| WalletError::UnknownWallet(code.clone()))
    }

    fn get_mut(&mut self, code: &CoinCode) -> Result<&mut Wallet, WalletError> {
        self.wallets
            .iter_mut()
            .find(|wallet| &wallet.code == code)
            .ok_or_else(|| WalletError::UnknownWallet(code.clone()))
    }

    /// Every wallet's entries, wallet order then insertion order.
    pub fn entries(&self) -> Vec<AddressBookEntry> {
        self.wallets
            .iter()
            .flat_map(|wallet| {
                wallet
                    .info
                    .address_book
                    .iter()
                    .map(move |saved| AddressBookEntry {
                        code: wallet.code.clone(),
                        address_book: saved.clone(),
                    })
            })
            .collect()
    }

    pub fn save_to_address_book(
        &mut self,
        code: &CoinCode,
        entry: Label,
    ) -> Result<SavedAddress, WalletError> {
        let errors = validate_contact(&entry.label, &entry.address);
        if !errors.is_empty() {
            return Err(WalletError::Validation(errors));
        }
        self.get(code)?;

        let id = Uuid::new_v4();
        let row = self.db.append_address(
            &id.to_string(),
            code.as_str(),
            &entry.label,
            &entry.address,
        )?;
        let saved = SavedAddress::from_row(row)?;
        self.get_mut(code)?.info.address_book.push(saved.clone());

        info!(wallet = %code, id = %saved.id, "saved address book entry");
        Ok(saved)
    }

    /// Remove the first entry of `code` whose address matches.
    pub fn remove_address(
        &mut self,
        code: &CoinCode,
        address: &str,
    ) -> Result<SavedAddress, WalletError> {
        let id = self
            .get(code)?
            .info
            .address_book
            .iter()
            .find(|saved| saved.address == address)
            .map(|saved| saved.id)
            .ok_or_else(|| WalletError::EntryNotFound {
                code: code.clone(),
                key: address.to_string(),
            })?;
        self.remove_entry(code, id)
    }

    pub fn remove_entry(&mut self, code: &CoinCode, id: Uuid) -> Result<SavedAddress, WalletError> {
        let wallet = self.get_mut(code)?;
        let index = wallet
            .info
            .address_book
            .iter()
            .position(|saved| saved.id == id)
            .ok_or_else(|| WalletError::EntryNotFound {
                code: code.clone(),
                key: id.to_string(),
            })?;

        self.db.delete_address(&id.to_string())?;
        let removed = self.get_mut(code)?.info.address_book.remove(index);

        info!(wallet = %code, id = %removed.id, "removed address book entry");
        Ok(removed)
    }

    /// Rename the first entry of `code` whose label matches `old_label`.
    pub fn rename_label(
        &mut self,
        code: &CoinCode,
        old_label: &str,
        new_label: &str,
    ) -> Result<(), WalletError> {
        let id = self
            .get(code)?
            .info
            .address_book
            .iter()
            .find(|saved| saved.label == old_label)
            .map(|saved| saved.id)
            .ok_or_else(|| WalletError::EntryNotFound {
                code: code.clone(),
                key: old_label.to_string(),
            })?;
        self.rename_entry(code, id, new_label)
    }

    pub fn rename_entry(
        &mut self,
        code: &CoinCode,
        id: Uuid,
        new_label: &str,
    ) -> Result<(), WalletError> {
        if let Some(err) = validate_label(new_label) {
            return Err(WalletError::Validation(vec![err]));
        }

        let wallet = self.get_mut(code)?;
        if !wallet.info.address_book.iter().any(|saved| saved.id == id) {
            return Err(WalletError::EntryNotFound {
                code: code.clone(),
                key: id.to_string(),
            });
        }

        self.db.set_label(&id.to_string(), new_label)?;
        if let Some(saved) = self
            .get_mut(code)?
            .info
            .address_book
            .iter_mut()
            .find(|saved| saved.id == id)
        {
            saved.label = new_label.to_string();
        }

        info!(wallet = %code, %id, "renamed address book entry");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> Wallets {
        let db = Database::open_in_memory().unwrap();
        Wallets::open(
            db,
            &[
                ("btc".to_string(), "Bitcoin".to_string()),
                ("LTC".to_string(), "Litecoin".to_string()),
            ],
        )
        .unwrap()
    }

    fn save(wallets: &mut Wallets, code: &str, label: &str, address: &str) -> SavedAddress {
        wallets
            .save_to_address_book(
                &CoinCode::new(code),
                Label {
                    label: label.into(),
                    address: address.into(),
                },
            )
            .unwrap()
    }

    #[test]
    fn test_open_normalizes_codes() {
        let wallets = registry();
        assert_eq!(wallets.len(), 2);
        assert!(wallets.find(|w| w.code.as_str() == "BTC").is_some());
        assert!(wallets.get(&CoinCode::new("doge")).is_err());
    }

    #[test]
    fn test_open_rejects_unparseable_entry_id() {
        let mut db = Database::open_in_memory().unwrap();
        db.upsert_wallet("BTC", "Bitcoin").unwrap();
        db.append_address("not-a-uuid", "BTC", "alice", "bc1alice").unwrap();

        match Wallets::open(db, &[]) {
            Err(WalletError::CorruptEntry { code, id }) => {
                assert_eq!(code, "BTC");
                assert_eq!(id, "not-a-uuid");
            }
            Err(other) => panic!("unexpected error: {}", other),
            Ok(_) => panic!("corrupt id was accepted"),
        }
    }

    #[test]
    fn test_save_appends_to_wallet() {
        let mut wallets = registry();
        save(&mut wallets, "BTC", "alice", "bc1alice");
        save(&mut wallets, "BTC", "bob", "bc1bob");
        save(&mut wallets, "LTC", "carol", "ltc1carol");

        let btc = wallets.get(&CoinCode::new("BTC")).unwrap();
        let labels: Vec<&str> = btc.info.address_book.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(labels, vec!["alice", "bob"]);
        assert_eq!(wallets.entries().len(), 3);
    }

    #[test]
    fn test_save_validates() {
        let mut wallets = registry();
        let err = wallets
            .save_to_address_book(
                &CoinCode::new("BTC"),
                Label {
                    label: "x".repeat(61),
                    address: " ".into(),
                },
            )
            .unwrap_err();
        match err {
            WalletError::Validation(errors) => assert_eq!(
                errors,
                vec![FieldError::LabelTooLong, FieldError::AddressRequired]
            ),
            other => panic!("unexpected error: {other}"),
        }
        assert!(wallets.entries().is_empty());
    }

    #[test]
    fn test_save_to_unknown_wallet_is_an_error() {
        let mut wallets = registry();
        let err = wallets
            .save_to_address_book(
                &CoinCode::new("XMR"),
                Label {
                    label: "a".into(),
                    address: "b".into(),
                },
            )
            .unwrap_err();
        assert!(matches!(err, WalletError::UnknownWallet(_)));
    }

    #[test]
    fn test_remove_address_removes_exactly_one() {
        let mut wallets = registry();
        save(&mut wallets, "BTC", "alice", "shared");
        save(&mut wallets, "BTC", "bob", "bc1bob");
        save(&mut wallets, "LTC", "carol", "shared");

        let removed = wallets.remove_address(&CoinCode::new("BTC"), "shared").unwrap();
        assert_eq!(removed.label, "alice");

        let remaining: Vec<(String, String)> = wallets
            .entries()
            .into_iter()
            .map(|e| (e.code.to_string(), e.address_book.label))
            .collect();
        assert_eq!(
            remaining,
            vec![
                ("BTC".to_string(), "bob".to_string()),
                ("LTC".to_string(), "carol".to_string())
            ]
        );

        assert!(matches!(
            wallets.remove_address(&CoinCode::new("BTC"), "shared"),
            Err(WalletError::EntryNotFound { .. })
        ));
    }

    #[test]
    fn test_rename_by_id_with_duplicate_labels() {
        let mut wallets = registry();
        save(&mut wallets, "BTC", "twin", "bc1first");
        let second = save(&mut wallets, "BTC", "twin", "bc1second");

        wallets
            .rename_entry(&CoinCode::new("BTC"), second.id, "renamed")
            .unwrap();
        let book = &wallets.get(&CoinCode::new("BTC")).unwrap().info.address_book;
        assert_eq!(book[0].label, "twin");
        assert_eq!(book[1].label, "renamed");
    }

    #[test]
    fn test_rename_by_label_targets_first_match() {
        let mut wallets = registry();
        save(&mut wallets, "BTC", "twin", "bc1first");
        save(&mut wallets, "BTC", "twin", "bc1second");
        wallets
            .rename_label(&CoinCode::new("BTC"), "twin", "one")
            .unwrap();
        let book = &wallets.get(&CoinCode::new("BTC")).unwrap().info.address_book;
        assert_eq!(book[0].label, "one");
        assert_eq!(book[1].label, "twin");
    }

    #[test]
    fn test_rename_rejects_empty_label() {
        let mut wallets = registry();
        let saved = save(&mut wallets, "BTC", "alice", "bc1");
        assert!(matches!(
            wallets.rename_entry(&CoinCode::new("BTC"), saved.id, "  "),
            Err(WalletError::Validation(_))
        ));
    }

    #[test]
    fn test_reopen_reads_persisted_entries() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("wallets.db");
        {
            let db = Database::open(&path).unwrap();
            let mut wallets = Wallets::open(db, &[("BTC".to_string(), "Bitcoin".to_string())]).unwrap();
            save(&mut wallets, "BTC", "alice", "bc1alice");
        }
        let wallets = Wallets::open(Database::open(&path).unwrap(), &[]).unwrap();
        assert_eq!(wallets.entries()[0].address_book.label, "alice");
    }

    #[test]
    fn test_validate_contact_messages() {
        assert!(validate_contact("ok", "addr").is_empty());
        assert_eq!(
            validate_contact("", ""),
            vec![FieldError::LabelRequired, FieldError::AddressRequired]
        );
        assert!(validate_contact(&"é".repeat(60), "a").is_empty());
        assert_eq!(
            FieldError::LabelTooLong.to_string(),
            "Label must be at most 60 characters"
        );
    }
}
