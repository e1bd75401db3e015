use std::cmp::Reverse;

use crate::wallets::AddressBookEntry;

/// Lower-cased, trimmed query, or None when there is nothing to match.
pub fn normalize_query(query: &str) -> Option<String> {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_lowercase())
    }
}

/// Case-insensitive substring match against the label or the address.
pub fn entry_matches(entry: &AddressBookEntry, normalized: &str) -> bool {
    entry.address_book.address.to_lowercase().contains(normalized)
        || entry.address_book.label.to_lowercase().contains(normalized)
}

/// Filter by `query`, then order by label, Z first, ignoring case. Labels that
/// differ only in case fall back to a byte comparison; equal labels keep input
/// order.
pub fn address_book_view(entries: Vec<AddressBookEntry>, query: &str) -> Vec<AddressBookEntry> {
    let mut entries = match normalize_query(query) {
        Some(normalized) => entries
            .into_iter()
            .filter(|entry| entry_matches(entry, &normalized))
            .collect(),
        None => entries,
    };
    entries.sort_by_cached_key(|entry| {
        let label = &entry.address_book.label;
        Reverse((label.to_lowercase(), label.clone()))
    });
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wallets::{CoinCode, SavedAddress};
    use uuid::Uuid;

    fn entry(code: &str, label: &str, address: &str) -> AddressBookEntry {
        AddressBookEntry {
            code: CoinCode::new(code),
            address_book: SavedAddress {
                id: Uuid::new_v4(),
                label: label.to_string(),
                address: address.to_string(),
            },
        }
    }

    fn labels(entries: &[AddressBookEntry]) -> Vec<&str> {
        entries
            .iter()
            .map(|e| e.address_book.label.as_str())
            .collect()
    }

    #[test]
    fn test_normalize_query() {
        assert_eq!(normalize_query("   "), None);
        assert_eq!(normalize_query("  BoB "), Some("bob".to_string()));
    }

    #[test]
    fn test_view_sorts_descending_by_label() {
        let view = address_book_view(
            vec![
                entry("BTC", "alice", "bc1a"),
                entry("LTC", "carol", "ltc1c"),
                entry("BTC", "bob", "bc1b"),
            ],
            "",
        );
        assert_eq!(labels(&view), vec!["carol", "bob", "alice"]);
    }

    #[test]
    fn test_view_order_ignores_case() {
        let view = address_book_view(
            vec![
                entry("BTC", "alice", "bc1a"),
                entry("BTC", "Zed", "bc1z"),
                entry("LTC", "bob", "ltc1b"),
                entry("LTC", "Bob", "ltc1B"),
            ],
            "",
        );
        assert_eq!(labels(&view), vec!["Zed", "bob", "Bob", "alice"]);
    }

    #[test]
    fn test_view_matches_label_or_address() {
        let entries = vec![
            entry("BTC", "Exchange", "bc1qxyz"),
            entry("BTC", "Savings", "bc1QEXCH"),
            entry("LTC", "rent", "ltc1abc"),
        ];
        let view = address_book_view(entries, " exch ");
        assert_eq!(labels(&view), vec!["Savings", "Exchange"]);
    }
}
