//! Reusable data table: column definitions, a staged sort/filter/paginate
//! pipeline, and the widgets that draw it.

pub mod pagination;
pub mod pipeline;
pub mod row;
pub mod widget;

use ratatui::layout::Constraint;
use ratatui::widgets::Cell;

pub use pagination::{LayoutDirection, PagerButton, Pagination};
pub use pipeline::{CellValue, CellValues, RowValues, SortOrder, SortSpec};

pub type ValueFn<T> = Box<dyn Fn(&T) -> CellValue>;
pub type FormatFn<T> = Box<dyn Fn(&CellValue, &T) -> String>;
pub type RenderFn<T> = Box<dyn Fn(CellContext<'_, T>, usize) -> Cell<'static>>;

/// What a custom cell renderer gets to look at.
pub struct CellContext<'a, T> {
    pub item: &'a T,
    pub cell: &'a CellValues,
}

/// How to derive, format and draw one column.
pub struct Column<T> {
    pub label: String,
    pub no_sort: bool,
    pub numeric: bool,
    pub width: Constraint,
    value: Option<ValueFn<T>>,
    format: Option<FormatFn<T>>,
    render: Option<RenderFn<T>>,
}

impl<T> Column<T> {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            no_sort: false,
            numeric: false,
            width: Constraint::Fill(1),
            value: None,
            format: None,
            render: None,
        }
    }

    /// Label-less column, typically a row action.
    pub fn actions() -> Self {
        Self::new("").no_sort().width(Constraint::Length(8))
    }

    pub fn value<F>(mut self, f: F) -> Self
    where
        F: Fn(&T) -> CellValue + 'static,
    {
        self.value = Some(Box::new(f));
        self
    }

    #[cfg(test)]
    pub fn format<F>(mut self, f: F) -> Self
    where
        F: Fn(&CellValue, &T) -> String + 'static,
    {
        self.format = Some(Box::new(f));
        self
    }

    pub fn render<F>(mut self, f: F) -> Self
    where
        F: Fn(CellContext<'_, T>, usize) -> Cell<'static> + 'static,
    {
        self.render = Some(Box::new(f));
        self
    }

    #[cfg(test)]
    pub fn numeric(mut self) -> Self {
        self.numeric = true;
        self
    }

    pub fn no_sort(mut self) -> Self {
        self.no_sort = true;
        self
    }

    pub fn width(mut self, width: Constraint) -> Self {
        self.width = width;
        self
    }

    pub fn has_value(&self) -> bool {
        self.value.is_some()
    }

    /// Whether activating this column's header changes the sort.
    pub fn sortable(&self) -> bool {
        self.has_value() && !self.no_sort
    }

    pub fn cell(&self, item: &T) -> CellValues {
        let value = self
            .value
            .as_ref()
            .map(|f| f(item))
            .unwrap_or(CellValue::Null);
        let formatted = match &self.format {
            Some(format) => format(&value, item),
            None => value.to_string(),
        };
        CellValues { value, formatted }
    }

    pub fn custom_render(&self) -> Option<&RenderFn<T>> {
        self.render.as_ref()
    }
}

#[derive(Debug, Clone)]
pub struct TableOptions {
    pub can_sort: bool,
    pub with_pagination: bool,
    pub rows_per_page: usize,
    pub striped_rows: bool,
    pub complete_icons: bool,
    pub direction: LayoutDirection,
    pub empty_text: Option<String>,
    /// Noun used in the page label, e.g. "contacts".
    pub definition: Option<String>,
}

impl Default for TableOptions {
    fn default() -> Self {
        Self {
            can_sort: false,
            with_pagination: false,
            rows_per_page: 10,
            striped_rows: false,
            complete_icons: false,
            direction: LayoutDirection::Ltr,
            empty_text: None,
            definition: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Stale {
    rows: bool,
    sort: bool,
    filter: bool,
}

/// Table state plus the cached output of every pipeline stage.
///
/// Mutators only mark the stages they invalidate; [`TableView::refresh`]
/// recomputes from the earliest stale stage onward.
pub struct TableView<T> {
    columns: Vec<Column<T>>,
    items: Vec<T>,
    options: TableOptions,
    filter: String,
    sort: Option<SortSpec>,
    page: usize,
    rows_per_page: usize,
    selected: usize,
    column_cursor: usize,
    rows: Vec<Vec<CellValues>>,
    sorted: Vec<usize>,
    filtered: Vec<usize>,
    stale: Stale,
}

impl<T> TableView<T> {
    pub fn new(columns: Vec<Column<T>>, options: TableOptions) -> Self {
        let rows_per_page = options.rows_per_page.max(1);
        Self {
            columns,
            items: Vec::new(),
            options,
            filter: String::new(),
            sort: None,
            page: 0,
            rows_per_page,
            selected: 0,
            column_cursor: 0,
            rows: Vec::new(),
            sorted: Vec::new(),
            filtered: Vec::new(),
            stale: Stale::default(),
        }
    }

    /// Initial sort column, descending.
    #[cfg(test)]
    pub fn with_sort_by(mut self, column: usize) -> Self {
        self.sort = Some(SortSpec::descending(column));
        self.stale.sort = true;
        self.refresh();
        self
    }

    pub fn set_items(&mut self, items: Vec<T>) {
        self.items = items;
        self.stale.rows = true;
        self.refresh();
    }

    /// Replace the column set; rows are materialized again.
    #[cfg(test)]
    pub fn set_columns(&mut self, columns: Vec<Column<T>>) {
        self.columns = columns;
        self.column_cursor = self.column_cursor.min(self.columns.len().saturating_sub(1));
        self.stale.rows = true;
        self.refresh();
    }

    #[cfg(test)]
    pub fn set_filter(&mut self, filter: &str) {
        if self.filter != filter {
            self.filter = filter.to_string();
            self.stale.filter = true;
            self.refresh();
        }
    }

    /// Activate a column header. Returns false when the column can't sort.
    pub fn toggle_sort(&mut self, column: usize) -> bool {
        if !self.options.can_sort {
            return false;
        }
        match self.columns.get(column) {
            Some(col) if col.sortable() => {}
            _ => return false,
        }
        self.sort = pipeline::toggle_sort(self.sort, column);
        self.stale.sort = true;
        self.refresh();
        true
    }

    pub fn toggle_sort_at_cursor(&mut self) -> bool {
        self.toggle_sort(self.column_cursor)
    }

    /// Move the header cursor to the next sortable column.
    pub fn move_column_cursor(&mut self, delta: isize) {
        let len = self.columns.len();
        if len == 0 {
            return;
        }
        let mut index = self.column_cursor;
        for _ in 0..len {
            index = (index as isize + delta).rem_euclid(len as isize) as usize;
            if self.columns[index].sortable() {
                self.column_cursor = index;
                return;
            }
        }
    }

    pub fn set_page(&mut self, page: usize) {
        let last = self.pagination().last_page();
        let page = page.min(last);
        if page != self.page {
            self.page = page;
            self.selected = 0;
        }
    }

    pub fn press(&mut self, button: PagerButton) -> bool {
        let pagination = self.pagination();
        if !self.options.with_pagination || button.disabled(&pagination) {
            return false;
        }
        self.set_page(button.target(&pagination));
        true
    }

    pub fn set_rows_per_page(&mut self, rows_per_page: usize) {
        let rows_per_page = rows_per_page.max(1);
        if rows_per_page != self.rows_per_page {
            self.rows_per_page = rows_per_page;
            self.page = 0;
            self.selected = 0;
        }
    }

    /// Step to the next page size in `options`, wrapping around.
    pub fn cycle_rows_per_page(&mut self, options: &[usize]) -> usize {
        if options.is_empty() {
            return self.rows_per_page;
        }
        let next = options
            .iter()
            .position(|&n| n == self.rows_per_page)
            .map(|i| options[(i + 1) % options.len()])
            .unwrap_or(options[0]);
        self.set_rows_per_page(next);
        self.rows_per_page
    }

    /// Recompute stale stages, earliest first.
    pub fn refresh(&mut self) {
        if self.stale.rows {
            self.rows = pipeline::materialize(&self.columns, &self.items);
            self.stale.rows = false;
            self.stale.sort = true;
        }

        if self.stale.sort {
            self.sorted = if self.options.can_sort {
                pipeline::sort_rows(&self.columns, &self.rows, self.sort)
            } else {
                (0..self.rows.len()).collect()
            };
            self.stale.sort = false;
            self.stale.filter = true;
        }

        if self.stale.filter {
            self.filtered = pipeline::filter_rows(&self.rows, &self.sorted, &self.filter);
            self.stale.filter = false;

            if self.options.with_pagination
                && pipeline::page_out_of_range(self.filtered.len(), self.page, self.rows_per_page)
            {
                self.page = 0;
            }
        }

        let visible = self.page_range().len();
        if visible == 0 {
            self.selected = 0;
        } else if self.selected >= visible {
            self.selected = visible - 1;
        }
    }

    fn page_range(&self) -> std::ops::Range<usize> {
        if self.options.with_pagination {
            pipeline::page_bounds(self.filtered.len(), self.page, self.rows_per_page)
        } else {
            0..self.filtered.len()
        }
    }

    /// Rows to draw for the current page.
    pub fn page_rows(&self) -> Vec<RowValues<'_, T>> {
        self.filtered[self.page_range()]
            .iter()
            .map(|&index| self.row(index))
            .collect()
    }

    fn row(&self, index: usize) -> RowValues<'_, T> {
        RowValues {
            item: &self.items[index],
            cells: &self.rows[index],
        }
    }

    pub fn select_next(&mut self) {
        let visible = self.page_range().len();
        if visible > 0 && self.selected + 1 < visible {
            self.selected += 1;
        }
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn selected_item(&self) -> Option<&T> {
        let range = self.page_range();
        self.filtered[range]
            .get(self.selected)
            .map(|&index| &self.items[index])
    }

    pub fn pagination(&self) -> Pagination {
        Pagination {
            count: self.filtered.len(),
            rows_per_page: self.rows_per_page,
            page: self.page,
        }
    }

    /// Footer is only worth drawing once there is more than a page.
    pub fn shows_pagination(&self) -> bool {
        self.options.with_pagination && self.filtered.len() >= self.rows_per_page
    }

    pub fn columns(&self) -> &[Column<T>] {
        &self.columns
    }

    pub fn options(&self) -> &TableOptions {
        &self.options
    }

    #[cfg(test)]
    pub fn materialized_len(&self) -> usize {
        self.rows.len()
    }

    pub fn filtered_len(&self) -> usize {
        self.filtered.len()
    }

    pub fn sort(&self) -> Option<SortSpec> {
        self.sort
    }

    #[cfg(test)]
    pub fn page(&self) -> usize {
        self.page
    }

    pub fn column_cursor(&self) -> usize {
        self.column_cursor
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn columns() -> Vec<Column<u32>> {
        vec![
            Column::new("N").numeric().value(|n: &u32| CellValue::from(*n as u64)),
            Column::new("Parity")
                .value(|n: &u32| CellValue::from(if n % 2 == 0 { "even" } else { "odd" })),
            Column::actions(),
        ]
    }

    fn view(options: TableOptions) -> TableView<u32> {
        let mut view = TableView::new(columns(), options);
        view.set_items((0..25).collect());
        view
    }

    fn paged() -> TableOptions {
        TableOptions {
            can_sort: true,
            with_pagination: true,
            rows_per_page: 10,
            ..TableOptions::default()
        }
    }

    fn visible(view: &TableView<u32>) -> Vec<u32> {
        view.page_rows().iter().map(|row| *row.item).collect()
    }

    #[test]
    fn test_pages_of_twenty_five_rows() {
        let mut view = view(paged());
        assert_eq!(view.materialized_len(), 25);
        assert_eq!(visible(&view), (0..10).collect::<Vec<_>>());

        view.set_page(2);
        assert_eq!(visible(&view), (20..25).collect::<Vec<_>>());
        assert!(view.shows_pagination());
    }

    #[test]
    fn test_set_page_clamps_to_last_page() {
        let mut view = view(paged());
        view.set_page(99);
        assert_eq!(view.page(), 2);
    }

    #[test]
    fn test_filter_shrinking_resets_page() {
        let mut view = view(paged());
        view.set_page(2);
        view.set_filter("1");
        // 1, 10..19, 21 -> 12 rows; page 2 starts at 20 and is out of range.
        assert_eq!(view.page(), 0);
        assert_eq!(view.filtered_len(), 12);
    }

    #[test]
    fn test_filter_keeping_page_in_range_keeps_page() {
        let mut view = view(paged());
        view.set_page(1);
        view.set_filter("odd");
        assert_eq!(view.filtered_len(), 12);
        assert_eq!(view.page(), 1);
        assert_eq!(visible(&view), vec![21, 23]);
    }

    #[test]
    fn test_rows_per_page_change_resets_page() {
        let mut view = view(paged());
        view.set_page(1);
        assert_eq!(view.cycle_rows_per_page(&[10, 25, 50]), 25);
        assert_eq!(view.page(), 0);
        assert_eq!(visible(&view).len(), 25);
        assert!(view.shows_pagination());
        assert_eq!(view.cycle_rows_per_page(&[10, 25, 50]), 50);
        assert!(!view.shows_pagination());
        assert_eq!(view.cycle_rows_per_page(&[10, 25, 50]), 10);
    }

    #[test]
    fn test_sort_toggle_cycle() {
        let mut view = view(paged());
        assert!(view.toggle_sort(0));
        assert_eq!(visible(&view), (15..25).rev().collect::<Vec<_>>());
        assert!(view.toggle_sort(0));
        assert_eq!(visible(&view), (0..10).collect::<Vec<_>>());
        assert!(view.toggle_sort(0));
        assert_eq!(view.sort(), None);
        assert_eq!(visible(&view), (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn test_replacing_columns_rematerializes() {
        let mut view = view(paged());
        view.toggle_sort(0);
        view.move_column_cursor(1);

        view.set_columns(vec![Column::new("Parity")
            .value(|n: &u32| CellValue::from(if n % 2 == 0 { "even" } else { "odd" }))]);
        assert_eq!(view.column_cursor(), 0);
        assert_eq!(view.materialized_len(), 25);
        // Still descending on column 0, now by text: "odd" before "even".
        assert_eq!(visible(&view), (0..10).map(|i| 2 * i + 1).collect::<Vec<_>>());
    }

    #[test]
    fn test_actions_column_cannot_sort() {
        let mut view = view(paged());
        assert!(!view.toggle_sort(2));
        assert!(!view.toggle_sort(7));
        assert_eq!(view.sort(), None);
    }

    #[test]
    fn test_sorting_disabled() {
        let mut view = view(TableOptions {
            can_sort: false,
            ..paged()
        });
        assert!(!view.toggle_sort(0));
        let mut view = TableView::new(columns(), paged()).with_sort_by(0);
        view.set_items(vec![3, 1, 2]);
        assert_eq!(visible(&view), vec![3, 2, 1]);
    }

    #[test]
    fn test_without_pagination_shows_everything() {
        let view = view(TableOptions::default());
        assert_eq!(visible(&view).len(), 25);
        assert!(!view.shows_pagination());
    }

    #[test]
    fn test_selection_stays_on_page() {
        let mut view = view(paged());
        for _ in 0..20 {
            view.select_next();
        }
        assert_eq!(view.selected(), 9);
        assert_eq!(view.selected_item(), Some(&9));

        view.set_page(2);
        assert_eq!(view.selected(), 0);
        assert_eq!(view.selected_item(), Some(&20));

        view.set_items(vec![]);
        assert_eq!(view.selected_item(), None);
    }

    #[test]
    fn test_pager_buttons() {
        let mut view = view(paged());
        assert!(!view.press(PagerButton::Previous));
        assert!(view.press(PagerButton::Last));
        assert_eq!(view.page(), 2);
        assert!(!view.press(PagerButton::Next));
        assert!(view.press(PagerButton::First));
        assert_eq!(view.page(), 0);
    }

    #[test]
    fn test_column_cursor_skips_unsortable() {
        let mut view = view(paged());
        view.move_column_cursor(1);
        assert_eq!(view.column_cursor(), 1);
        view.move_column_cursor(1);
        assert_eq!(view.column_cursor(), 0);
        view.move_column_cursor(-1);
        assert_eq!(view.column_cursor(), 1);
        assert!(view.toggle_sort_at_cursor());
        assert_eq!(view.sort(), Some(SortSpec::descending(1)));
    }
}
