use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::BaseDirs;
use rusqlite::{params, Connection, Row, TransactionBehavior};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletRow {
    pub code: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressRow {
    pub id: String,
    pub wallet_code: String,
    pub label: String,
    pub address: String,
    pub created_at: String,
}

pub struct Database {
    conn: Connection,
}

pub fn default_db_path() -> Result<PathBuf> {
    let base = BaseDirs::new().context("unable to determine data directories")?;
    Ok(base.data_dir().join("coinbook").join("wallets.db"))
}

impl Database {
    /// Open (and create if needed) the wallet store at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
        }
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open database at {}", path.display()))?;
        let mut db = Self { conn };
        db.setup()?;
        Ok(db)
    }

    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let mut db = Self { conn };
        db.setup()?;
        Ok(db)
    }

    fn setup(&mut self) -> Result<()> {
        self.conn.pragma_update(None, "foreign_keys", "ON")?;

        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS wallets (
              code TEXT PRIMARY KEY,
              name TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS address_book (
              id          TEXT PRIMARY KEY,
              wallet_code TEXT NOT NULL REFERENCES wallets(code) ON DELETE CASCADE,
              seq         INTEGER NOT NULL,
              label       TEXT NOT NULL,
              address     TEXT NOT NULL,
              created_at  TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_address_book_wallet ON address_book(wallet_code, seq);
        "#,
        )?;
        Ok(())
    }

    /// Insert the wallet or refresh its display name.
    pub fn upsert_wallet(&self, code: &str, name: &str) -> rusqlite::Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO wallets (code, name) VALUES (?1, ?2)
            ON CONFLICT(code) DO UPDATE SET name = excluded.name
            "#,
            params![code, name],
        )?;
        Ok(())
    }

    pub fn list_wallets(&self) -> rusqlite::Result<Vec<WalletRow>> {
        let mut stmt = self
            .conn
            .prepare("SELECT code, name FROM wallets ORDER BY rowid")?;
        let rows = stmt.query_map([], |row| {
            Ok(WalletRow {
                code: row.get(0)?,
                name: row.get(1)?,
            })
        })?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    /// Entries of one wallet in insertion order.
    pub fn address_book(&self, wallet_code: &str) -> rusqlite::Result<Vec<AddressRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, wallet_code, label, address, created_at
             FROM address_book WHERE wallet_code = ?1 ORDER BY seq",
        )?;
        let rows = stmt.query_map([wallet_code], row_to_address)?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    /// Append an entry at the end of the wallet's list.
    pub fn append_address(
        &mut self,
        id: &str,
        wallet_code: &str,
        label: &str,
        address: &str,
    ) -> rusqlite::Result<AddressRow> {
        let created_at = OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .unwrap_or_default();

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let next_seq: i64 = tx.query_row(
            "SELECT COALESCE(MAX(seq), -1) + 1 FROM address_book WHERE wallet_code = ?1",
            [wallet_code],
            |row| row.get(0),
        )?;
        tx.execute(
            r#"INSERT INTO address_book (id, wallet_code, seq, label, address, created_at)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6)"#,
            params![id, wallet_code, next_seq, label, address, created_at],
        )?;
        tx.commit()?;

        Ok(AddressRow {
            id: id.to_string(),
            wallet_code: wallet_code.to_string(),
            label: label.to_string(),
            address: address.to_string(),
            created_at,
        })
    }

    /// Returns true when a row was removed.
    pub fn delete_address(&self, id: &str) -> rusqlite::Result<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM address_book WHERE id = ?1", [id])?;
        Ok(changed > 0)
    }

    /// Returns true when a row was updated.
    pub fn set_label(&self, id: &str, label: &str) -> rusqlite::Result<bool> {
        let changed = self.conn.execute(
            "UPDATE address_book SET label = ?2 WHERE id = ?1",
            params![id, label],
        )?;
        Ok(changed > 0)
    }
}

fn row_to_address(row: &Row<'_>) -> rusqlite::Result<AddressRow> {
    Ok(AddressRow {
        id: row.get(0)?,
        wallet_code: row.get(1)?,
        label: row.get(2)?,
        address: row.get(3)?,
        created_at: row.get(4)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_keeps_insertion_order() {
        let mut db = Database::open_in_memory().unwrap();
        db.upsert_wallet("BTC", "Bitcoin").unwrap();
        db.append_address("a", "BTC", "zed", "bc1zed").unwrap();
        db.append_address("b", "BTC", "amy", "bc1amy").unwrap();

        let labels: Vec<String> = db
            .address_book("BTC")
            .unwrap()
            .into_iter()
            .map(|row| row.label)
            .collect();
        assert_eq!(labels, vec!["zed", "amy"]);
    }

    #[test]
    fn test_upsert_wallet_renames() {
        let db = Database::open_in_memory().unwrap();
        db.upsert_wallet("LTC", "Lite").unwrap();
        db.upsert_wallet("LTC", "Litecoin").unwrap();
        assert_eq!(
            db.list_wallets().unwrap(),
            vec![WalletRow {
                code: "LTC".into(),
                name: "Litecoin".into()
            }]
        );
    }

    #[test]
    fn test_unknown_wallet_rejected() {
        let mut db = Database::open_in_memory().unwrap();
        assert!(db.append_address("x", "NOPE", "l", "a").is_err());
    }

    #[test]
    fn test_delete_and_relabel() {
        let mut db = Database::open_in_memory().unwrap();
        db.upsert_wallet("BTC", "Bitcoin").unwrap();
        db.append_address("a", "BTC", "old", "bc1").unwrap();

        assert!(db.set_label("a", "new").unwrap());
        assert_eq!(db.address_book("BTC").unwrap()[0].label, "new");
        assert!(db.delete_address("a").unwrap());
        assert!(!db.delete_address("a").unwrap());
        assert!(db.address_book("BTC").unwrap().is_empty());
    }

    #[test]
    fn test_open_creates_parent_dirs() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("nested").join("wallets.db");
        let db = Database::open(&path).unwrap();
        db.upsert_wallet("BTC", "Bitcoin").unwrap();
        assert!(path.exists());
    }
}
