use ratatui::layout::Alignment;
use ratatui::style::Style;
use ratatui::text::Text;
use ratatui::widgets::{Cell, Row};

use super::{CellContext, Column, RowValues};

/// Build one table row: custom renderers where a column has one, otherwise
/// the formatted text (right-aligned for numeric columns).
pub fn render_row<T>(
    columns: &[Column<T>],
    row: RowValues<'_, T>,
    index: usize,
    stripe: Option<Style>,
) -> Row<'static> {
    let cells: Vec<Cell<'static>> = columns
        .iter()
        .enumerate()
        .map(|(col, column)| {
            let Some(cell) = row.cells.get(col) else {
                return Cell::from("");
            };
            match column.custom_render() {
                Some(render) => render(
                    CellContext {
                        item: row.item,
                        cell,
                    },
                    index,
                ),
                None => default_cell(&cell.formatted, column.numeric),
            }
        })
        .collect();

    let mut out = Row::new(cells);
    if let Some(style) = stripe {
        if index % 2 == 1 {
            out = out.style(style);
        }
    }
    out
}

fn default_cell(text: &str, numeric: bool) -> Cell<'static> {
    let text = Text::from(text.to_string());
    if numeric {
        Cell::from(text.alignment(Alignment::Right))
    } else {
        Cell::from(text)
    }
}
