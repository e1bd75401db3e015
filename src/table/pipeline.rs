//! Pure derivation stages behind [`TableView`](super::TableView).
//!
//! Each stage is a plain function over the previous stage's output, so the
//! whole sort -> filter -> paginate pipeline can be exercised without a
//! terminal.

use std::cmp::Ordering;
use std::fmt;
use std::ops::Range;

use super::Column;

/// Raw value produced by a column's value function.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    #[default]
    Null,
    Text(String),
    Number(f64),
}

impl CellValue {
    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    /// Numeric sort key. Nulls and non-numeric text count as zero.
    pub fn as_number(&self) -> f64 {
        match self {
            CellValue::Null => 0.0,
            CellValue::Number(n) => *n,
            CellValue::Text(s) => s.trim().parse().unwrap_or(0.0),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Null => Ok(()),
            CellValue::Text(s) => f.write_str(s),
            CellValue::Number(n) => write!(f, "{}", n),
        }
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        CellValue::Number(value as f64)
    }
}

impl From<u64> for CellValue {
    fn from(value: u64) -> Self {
        CellValue::Number(value as f64)
    }
}

impl From<usize> for CellValue {
    fn from(value: usize) -> Self {
        CellValue::Number(value as f64)
    }
}

impl<V: Into<CellValue>> From<Option<V>> for CellValue {
    fn from(value: Option<V>) -> Self {
        value.map(Into::into).unwrap_or(CellValue::Null)
    }
}

/// Snapshot of one cell: the raw value and its display text.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CellValues {
    pub value: CellValue,
    pub formatted: String,
}

/// Borrowed row view-model handed to renderers.
#[derive(Debug)]
pub struct RowValues<'a, T> {
    pub item: &'a T,
    pub cells: &'a [CellValues],
}

impl<T> Clone for RowValues<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for RowValues<'_, T> {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Descending,
    Ascending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortSpec {
    pub column: usize,
    pub order: SortOrder,
}

impl SortSpec {
    pub fn descending(column: usize) -> Self {
        Self {
            column,
            order: SortOrder::Descending,
        }
    }

    pub fn ascending(column: usize) -> Self {
        Self {
            column,
            order: SortOrder::Ascending,
        }
    }
}

/// Header activation: unsorted -> descending -> ascending -> unsorted on the
/// same column; any other column starts over at descending.
pub fn toggle_sort(current: Option<SortSpec>, column: usize) -> Option<SortSpec> {
    match current {
        Some(spec) if spec.column == column => match spec.order {
            SortOrder::Descending => Some(SortSpec::ascending(column)),
            SortOrder::Ascending => None,
        },
        _ => Some(SortSpec::descending(column)),
    }
}

/// Evaluate every column against every item.
pub fn materialize<T>(columns: &[Column<T>], items: &[T]) -> Vec<Vec<CellValues>> {
    items
        .iter()
        .map(|item| columns.iter().map(|column| column.cell(item)).collect())
        .collect()
}

/// Row order after applying `sort`. Returns identity order when the sort
/// column is missing or has no value function.
pub fn sort_rows<T>(
    columns: &[Column<T>],
    rows: &[Vec<CellValues>],
    sort: Option<SortSpec>,
) -> Vec<usize> {
    let mut order: Vec<usize> = (0..rows.len()).collect();

    let Some(spec) = sort else {
        return order;
    };
    let Some(column) = columns.get(spec.column) else {
        return order;
    };
    if !column.has_value() {
        return order;
    }

    let index = spec.column;
    if column.numeric {
        let key = |row: usize| rows[row].get(index).map(|c| c.value.as_number()).unwrap_or(0.0);
        order.sort_by(|&a, &b| directed(key(a).total_cmp(&key(b)), spec.order));
    } else {
        let keys: Vec<String> = rows
            .iter()
            .map(|cells| match cells.get(index) {
                Some(cell) if !cell.value.is_null() => cell.formatted.to_uppercase(),
                _ => String::new(),
            })
            .collect();
        order.sort_by(|&a, &b| directed(keys[a].cmp(&keys[b]), spec.order));
    }

    order
}

fn directed(ordering: Ordering, order: SortOrder) -> Ordering {
    match order {
        SortOrder::Ascending => ordering,
        SortOrder::Descending => ordering.reverse(),
    }
}

/// Upper-cased whitespace tokens of a filter string.
pub fn filter_tokens(filter: &str) -> Vec<String> {
    filter
        .split_whitespace()
        .map(|token| token.to_uppercase())
        .collect()
}

/// Keep rows (in the given order) whose joined formatted cells contain every
/// token.
pub fn filter_rows(rows: &[Vec<CellValues>], order: &[usize], filter: &str) -> Vec<usize> {
    let tokens = filter_tokens(filter);
    if tokens.is_empty() {
        return order.to_vec();
    }

    order
        .iter()
        .copied()
        .filter(|&row| {
            let text = rows[row]
                .iter()
                .map(|cell| cell.formatted.as_str())
                .collect::<Vec<_>>()
                .join(" ")
                .to_uppercase();
            tokens.iter().all(|token| text.contains(token.as_str()))
        })
        .collect()
}

/// Index range of `page` within `len` rows.
pub fn page_bounds(len: usize, page: usize, rows_per_page: usize) -> Range<usize> {
    let rows_per_page = rows_per_page.max(1);
    let start = page.saturating_mul(rows_per_page).min(len);
    let end = start.saturating_add(rows_per_page).min(len);
    start..end
}

/// Whether `page` no longer has any rows and must fall back to the first page.
pub fn page_out_of_range(len: usize, page: usize, rows_per_page: usize) -> bool {
    page > 0 && page.saturating_mul(rows_per_page.max(1)) >= len
}

/// Display settings fed to [`derive_view`].
#[derive(Debug, Clone, Default)]
pub struct ViewSpec {
    pub sort: Option<SortSpec>,
    pub filter: String,
    /// `(page, rows_per_page)` when pagination is on.
    pub page: Option<(usize, usize)>,
}

/// Run the whole pipeline in one go and return the indices (into `items`) of
/// the rows to display.
pub fn derive_view<T>(columns: &[Column<T>], items: &[T], spec: &ViewSpec) -> Vec<usize> {
    let rows = materialize(columns, items);
    let sorted = sort_rows(columns, &rows, spec.sort);
    let filtered = filter_rows(&rows, &sorted, &spec.filter);

    match spec.page {
        Some((page, rows_per_page)) => {
            let page = if page_out_of_range(filtered.len(), page, rows_per_page) {
                0
            } else {
                page
            };
            filtered[page_bounds(filtered.len(), page, rows_per_page)].to_vec()
        }
        None => filtered,
    }
}
