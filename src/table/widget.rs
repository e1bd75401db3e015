use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState};
use ratatui::Frame;

use super::row::render_row;
use super::{LayoutDirection, PagerButton, SortOrder, TableView};

const SORT_NONE: &str = " ↕";
const SORT_DESC: &str = " ▼";
const SORT_ASC: &str = " ▲";

#[derive(Debug, Clone, Copy, Default)]
pub struct TableTheme {
    pub header: Style,
    pub header_cursor: Style,
    pub selection: Style,
    pub stripe: Style,
    pub button: Style,
    pub disabled: Style,
    pub muted: Style,
}

/// Bordered frame every table sits in.
pub fn table_block<'a>(title: impl Into<Line<'a>>, style: Style) -> Block<'a> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(style)
        .title(title)
}

/// Compact inline button used for row actions.
pub fn cell_button(label: &str, style: Style) -> Cell<'static> {
    Cell::from(Span::styled(format!("[{}]", label), style))
}

pub fn draw_table<T>(
    frame: &mut Frame<'_>,
    area: Rect,
    view: &TableView<T>,
    theme: &TableTheme,
    focused: bool,
) {
    if area.width == 0 || area.height == 0 {
        return;
    }

    let pager_height = if view.shows_pagination() { 1 } else { 0 };
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(pager_height)])
        .split(area);

    let header = header_row(view, theme, focused);
    let widths: Vec<Constraint> = view.columns().iter().map(|c| c.width).collect();
    let page_rows = view.page_rows();

    if page_rows.is_empty() {
        frame.render_widget(Table::new(Vec::<Row>::new(), widths).header(header), chunks[0]);
        if let Some(text) = view.options().empty_text.as_deref() {
            let body = Rect {
                y: chunks[0].y.saturating_add(2),
                height: chunks[0].height.saturating_sub(2),
                ..chunks[0]
            };
            frame.render_widget(
                Paragraph::new(text.to_string())
                    .style(theme.muted)
                    .alignment(Alignment::Center),
                body,
            );
        }
    } else {
        let stripe = view.options().striped_rows.then_some(theme.stripe);
        let rows: Vec<Row> = page_rows
            .into_iter()
            .enumerate()
            .map(|(index, row)| render_row(view.columns(), row, index, stripe))
            .collect();

        let table = Table::new(rows, widths)
            .header(header)
            .column_spacing(1)
            .highlight_style(theme.selection);

        let mut state = TableState::default();
        if focused {
            state.select(Some(view.selected()));
        }
        frame.render_stateful_widget(table, chunks[0], &mut state);
    }

    if pager_height > 0 {
        draw_pager(frame, chunks[1], view, theme);
    }
}

fn header_row<T>(view: &TableView<T>, theme: &TableTheme, focused: bool) -> Row<'static> {
    let can_sort = view.options().can_sort;
    let sort = view.sort();

    let cells: Vec<Cell> = view
        .columns()
        .iter()
        .enumerate()
        .map(|(index, column)| {
            let mut text = column.label.to_uppercase();
            if can_sort && column.sortable() {
                text.push_str(match sort {
                    Some(spec) if spec.column == index => match spec.order {
                        SortOrder::Descending => SORT_DESC,
                        SortOrder::Ascending => SORT_ASC,
                    },
                    _ => SORT_NONE,
                });
            }
            let style = if focused && can_sort && index == view.column_cursor() {
                theme.header_cursor
            } else {
                theme.header
            };
            let line = Line::from(Span::styled(text, style));
            if column.numeric {
                Cell::from(line.alignment(Alignment::Right))
            } else {
                Cell::from(line)
            }
        })
        .collect();

    Row::new(cells).bottom_margin(1)
}

fn draw_pager<T>(frame: &mut Frame<'_>, area: Rect, view: &TableView<T>, theme: &TableTheme) {
    let options = view.options();
    let pagination = view.pagination();

    let mut spans = vec![Span::styled(
        pagination.range_label(options.definition.as_deref()),
        theme.muted,
    )];
    for button in PagerButton::visible(options.complete_icons) {
        let style = if button.disabled(&pagination) {
            theme.disabled
        } else {
            theme.button.add_modifier(Modifier::BOLD)
        };
        spans.push(Span::raw(" "));
        spans.push(Span::styled(
            format!(" {} ", button.glyph(options.direction)),
            style,
        ));
    }
    spans.push(Span::raw(" "));

    if options.direction == LayoutDirection::Rtl {
        spans.reverse();
    }

    let alignment = match options.direction {
        LayoutDirection::Ltr => Alignment::Right,
        LayoutDirection::Rtl => Alignment::Left,
    };
    frame.render_widget(Paragraph::new(Line::from(spans)).alignment(alignment), area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{CellValue, Column, TableOptions};
    use ratatui::backend::TestBackend;
    use ratatui::style::Color;
    use ratatui::Terminal;

    const WIDTH: u16 = 48;
    const HEIGHT: u16 = 16;

    fn columns() -> Vec<Column<u32>> {
        vec![
            Column::new("N")
                .numeric()
                .width(Constraint::Length(6))
                .value(|n: &u32| CellValue::from(*n as u64)),
            Column::new("Parity")
                .width(Constraint::Length(10))
                .value(|n: &u32| CellValue::from(if n % 2 == 0 { "even" } else { "odd" })),
            Column::actions().render(|_, _| cell_button("edit", Style::default())),
        ]
    }

    fn options() -> TableOptions {
        TableOptions {
            can_sort: true,
            with_pagination: true,
            rows_per_page: 10,
            striped_rows: true,
            complete_icons: true,
            definition: Some("contacts".to_string()),
            ..TableOptions::default()
        }
    }

    fn view(count: u32, options: TableOptions) -> TableView<u32> {
        let mut view = TableView::new(columns(), options);
        view.set_items((0..count).collect());
        view
    }

    fn theme() -> TableTheme {
        TableTheme {
            stripe: Style::default().bg(Color::Blue),
            ..TableTheme::default()
        }
    }

    fn render(view: &TableView<u32>) -> Terminal<TestBackend> {
        let mut terminal = Terminal::new(TestBackend::new(WIDTH, HEIGHT)).unwrap();
        terminal
            .draw(|frame| draw_table(frame, frame.area(), view, &theme(), false))
            .unwrap();
        terminal
    }

    fn line(terminal: &Terminal<TestBackend>, y: u16) -> String {
        let buf = terminal.backend().buffer();
        (0..WIDTH).map(|x| buf[(x, y)].symbol()).collect()
    }

    fn arrows(text: &str) -> usize {
        text.chars().filter(|c| matches!(c, '↕' | '▼' | '▲')).count()
    }

    #[test]
    fn test_header_sort_indicators() {
        let mut view = view(25, options());
        let header = line(&render(&view), 0);
        assert!(header.starts_with("   N ↕ PARITY ↕"), "{:?}", header);
        // the actions column is not sortable
        assert_eq!(arrows(&header), 2);

        view.toggle_sort(0);
        let header = line(&render(&view), 0);
        assert!(header.contains("N ▼"));
        assert!(header.contains("PARITY ↕"));

        view.toggle_sort(0);
        assert!(line(&render(&view), 0).contains("N ▲"));
    }

    #[test]
    fn test_no_indicators_when_sorting_disabled() {
        let view = view(
            25,
            TableOptions {
                can_sort: false,
                ..options()
            },
        );
        assert_eq!(arrows(&line(&render(&view), 0)), 0);
    }

    #[test]
    fn test_rows_are_numeric_right_aligned_and_striped() {
        let view = view(25, options());
        let terminal = render(&view);

        // header, margin, then data rows
        assert!(line(&terminal, 2).starts_with("     0 even       [edit]"));
        assert!(line(&terminal, 3).starts_with("     1 odd        [edit]"));

        let buf = terminal.backend().buffer();
        assert_eq!(buf[(0, 2)].bg, Color::Reset);
        assert_eq!(buf[(0, 3)].bg, Color::Blue);
        assert_eq!(buf[(0, 4)].bg, Color::Reset);
    }

    #[test]
    fn test_pager_shown_with_range_label() {
        let view = view(25, options());
        let pager = line(&render(&view), HEIGHT - 1);

        let label = pager.find("1-10 of 25 contacts").expect("range label");
        let first = pager.find('«').expect("first button");
        let last = pager.find('»').expect("last button");
        assert!(label < first && first < last);
        assert!(pager.trim_end().ends_with('»'));
    }

    #[test]
    fn test_pager_hidden_below_one_page() {
        let view = view(9, options());
        assert!(!view.shows_pagination());
        let terminal = render(&view);
        for y in 0..HEIGHT {
            assert!(!line(&terminal, y).contains("of 9"));
        }
        assert!(line(&terminal, 10).starts_with("     8 even"));
    }

    #[test]
    fn test_pager_shown_at_exactly_one_page() {
        let view = view(10, options());
        assert!(line(&render(&view), HEIGHT - 1).contains("1-10 of 10 contacts"));
    }

    #[test]
    fn test_rtl_pager_reverses_and_mirrors() {
        let view = view(
            25,
            TableOptions {
                direction: LayoutDirection::Rtl,
                ..options()
            },
        );
        let pager = line(&render(&view), HEIGHT - 1);

        // Left-aligned with the buttons before the label. The "last" button
        // comes first after the trailing gap and is mirrored to «.
        assert!(pager.starts_with("  « "), "{:?}", pager);
        let label = pager.find("1-10 of 25 contacts").expect("range label");
        assert!(pager.find('»').unwrap() < label);
        assert!(pager.trim_end().ends_with("contacts"));
    }

    #[test]
    fn test_empty_text_replaces_rows() {
        let view = view(
            0,
            TableOptions {
                empty_text: Some("Nothing here".to_string()),
                ..options()
            },
        );
        let terminal = render(&view);
        assert!(line(&terminal, 2).contains("Nothing here"));
    }
}
