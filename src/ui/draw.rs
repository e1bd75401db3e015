use anyhow::Result;
use ratatui::backend::Backend;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use ratatui::{Frame, Terminal};
use tui_widgets::popup::Popup;

use crate::config::RgbColor;
use crate::table::widget::{draw_table, table_block, TableTheme};
use crate::wallets::FieldError;

use super::app::App;
use super::panes::Pane;
use super::save_panel::FormField;

const FORM_WIDTH: u16 = 40;

const FORM_HELP: &str = "Tab/↑↓: field  ←→: wallet  Enter: add  Esc: address book";
const TABLE_HELP: &str =
    "j/k: row  h/l: page  [/]: column  s: sort  p: page size  /: search  e: rename  x: delete  y: copy  r: QR  q: quit";
const SEARCH_HELP: &str = "Type to filter  Enter: keep  Esc: clear";
const CONFIRM_HELP: &str = "Y/Enter: confirm  N/Esc: cancel";
const SHARE_HELP: &str = " Esc: close ";

pub fn render<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()> {
    terminal.draw(|frame| draw_frame(frame, app))?;
    Ok(())
}

fn draw_frame(frame: &mut Frame<'_>, app: &mut App) {
    let size = frame.area();
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(size);

    draw_header(frame, layout[0], app);
    draw_body(frame, layout[1], app);
    draw_footer(frame, layout[2], app);
    draw_confirm_modal(frame, size, app);
    draw_prompt_modal(frame, size, app);
    draw_loading_modal(frame, size, app);
    draw_share_modal(frame, size, app);
}

fn draw_header(frame: &mut Frame<'_>, area: Rect, app: &App) {
    let header_style = header_text_style(app);
    let wallets = app.wallets();
    let entries: usize = wallets.iter().map(|w| w.info.address_book.len()).sum();

    let mut spans = vec![Span::styled("COINBOOK", header_style.add_modifier(Modifier::BOLD))];
    for pane in Pane::ALL {
        spans.push(Span::raw("   "));
        let style = if pane == app.focused_pane {
            selection_style(app)
        } else {
            header_style
        };
        spans.push(Span::styled(
            format!("{} {}", pane.digit(), pane.title()),
            style,
        ));
    }
    spans.push(Span::styled(
        format!("   {} contacts in {} wallets", entries, wallets.len()),
        muted_style(app),
    ));

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn draw_body(frame: &mut Frame<'_>, area: Rect, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(FORM_WIDTH), Constraint::Min(0)])
        .split(area);
    draw_form(frame, chunks[0], app);
    draw_contacts(frame, chunks[1], app);
}

fn draw_form(frame: &mut Frame<'_>, area: Rect, app: &App) {
    let active = app.focused_pane == Pane::Form;
    let block = table_block(
        Span::styled(" Add contact ", header_text_style(app)),
        border_style(app, active),
    );
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if inner.width == 0 || inner.height == 0 {
        return;
    }

    // Each field: title, value, error (or blank), spacer
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),
            Constraint::Length(4),
            Constraint::Length(4),
            Constraint::Length(1),
            Constraint::Min(0),
        ])
        .split(inner);

    let form = &app.form;
    let focus = form.focus();

    draw_text_field(
        frame,
        rows[0],
        app,
        FormField::Label,
        form.label().value(),
        form.label_error(),
    );
    draw_text_field(
        frame,
        rows[1],
        app,
        FormField::Address,
        form.address().value(),
        form.address_error(),
    );
    draw_wallet_selector(frame, rows[2], app);

    let button_style = if active && focus == FormField::Submit {
        selection_style(app)
    } else {
        button_style(app)
    };
    frame.render_widget(
        Paragraph::new(Span::styled(
            format!("[ {} ]", FormField::Submit.title()),
            button_style.add_modifier(Modifier::BOLD),
        ))
        .alignment(Alignment::Right),
        rows[3],
    );

    if active {
        if let Some(input) = form.focused_input() {
            let row = if focus == FormField::Label { rows[0] } else { rows[1] };
            let x = row
                .x
                .saturating_add(input.visual_cursor() as u16)
                .min(row.x + row.width.saturating_sub(1));
            frame.set_cursor_position((x, row.y + 1));
        }
    }
}

fn draw_text_field(
    frame: &mut Frame<'_>,
    area: Rect,
    app: &App,
    field: FormField,
    value: &str,
    error: Option<FieldError>,
) {
    let focused = app.focused_pane == Pane::Form && app.form.focus() == field;
    let title_style = if focused {
        header_text_style(app).add_modifier(Modifier::BOLD)
    } else {
        header_text_style(app)
    };

    let value_line = if value.is_empty() {
        Line::from(Span::styled(field.placeholder(), muted_style(app)))
    } else {
        Line::from(value.to_string())
    };

    let mut lines = vec![Line::from(Span::styled(field.title(), title_style)), value_line];
    if let Some(error) = error {
        lines.push(Line::from(Span::styled(error.to_string(), error_style(app))));
    }

    frame.render_widget(Paragraph::new(lines), area);
}

fn draw_wallet_selector(frame: &mut Frame<'_>, area: Rect, app: &App) {
    let focused = app.focused_pane == Pane::Form && app.form.focus() == FormField::Wallet;
    let title_style = if focused {
        header_text_style(app).add_modifier(Modifier::BOLD)
    } else {
        header_text_style(app)
    };

    let value = match app.wallets().iter().nth(app.form.wallet_index()) {
        Some(wallet) => format!("‹ {} ({}) ›", wallet.name, wallet.code),
        None => "No wallets configured".to_string(),
    };
    let value_style = if focused {
        selection_style(app)
    } else {
        Style::default().add_modifier(Modifier::BOLD)
    };

    let lines = vec![
        Line::from(Span::styled(FormField::Wallet.title(), title_style)),
        Line::from(Span::styled(value, value_style)),
    ];
    frame.render_widget(Paragraph::new(lines), area);
}

fn draw_contacts(frame: &mut Frame<'_>, area: Rect, app: &App) {
    let active = app.focused_pane == Pane::Contacts;
    let block = table_block(
        Span::styled(" Address Book ", header_text_style(app)),
        border_style(app, active),
    );
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if inner.width == 0 || inner.height == 0 {
        return;
    }

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(2), Constraint::Min(0)])
        .split(inner);

    let searching = app.contacts.is_searching();
    let query = app.contacts.search().value();
    let label = "SEARCH: ";
    let value = if query.is_empty() && !searching {
        Span::styled("press / to search", muted_style(app))
    } else {
        Span::raw(query.to_string())
    };
    let label_style = if active && searching {
        selection_style(app)
    } else {
        header_text_style(app)
    };
    let mut spans = vec![Span::styled(label, label_style), value];
    if !query.is_empty() {
        let matches = app.contacts.table().filtered_len();
        spans.push(Span::styled(
            format!("  ({} {})", matches, if matches == 1 { "match" } else { "matches" }),
            muted_style(app),
        ));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), layout[0]);
    if active && searching {
        let x = layout[0]
            .x
            .saturating_add(label.len() as u16 + app.contacts.search().visual_cursor() as u16);
        frame.set_cursor_position((x, layout[0].y));
    }

    let theme = table_theme(app);
    draw_table(
        frame,
        layout[1],
        app.contacts.table(),
        &theme,
        active && !searching,
    );
}

fn table_theme(app: &App) -> TableTheme {
    let colors = app.ui_colors();
    TableTheme {
        header: header_text_style(app).add_modifier(Modifier::BOLD),
        header_cursor: selection_style(app),
        selection: selection_style(app),
        stripe: Style::default().bg(color(colors.stripe_bg)),
        button: button_style(app),
        disabled: muted_style(app),
        muted: muted_style(app),
    }
}

fn draw_footer(frame: &mut Frame<'_>, area: Rect, app: &App) {
    let message: String = if app.confirm_modal.is_some() {
        CONFIRM_HELP.to_string()
    } else if app.prompt_modal.is_some() {
        "Type a new name  Enter: save  Esc: cancel".to_string()
    } else if let Some(status) = &app.status {
        status.clone()
    } else {
        match app.focused_pane {
            Pane::Form => FORM_HELP.to_string(),
            Pane::Contacts if app.contacts.is_searching() => SEARCH_HELP.to_string(),
            Pane::Contacts => TABLE_HELP.to_string(),
        }
    };
    let colors = app.ui_colors();
    let style = Style::default()
        .fg(color(colors.status_fg))
        .bg(color(colors.status_bg));

    let background = Block::default().style(Style::default().bg(color(colors.status_bg)));
    frame.render_widget(background, area);

    frame.render_widget(Paragraph::new(message).style(style), area);
}

fn draw_confirm_modal(frame: &mut Frame<'_>, area: Rect, app: &mut App) {
    let Some(modal) = app.confirm_modal.as_ref() else {
        return;
    };

    let width = modal.size.width(area.width) as usize;
    let lines = vec![
        Line::from(modal.message.clone()),
        Line::from(""),
        Line::from(vec![
            Span::styled(
                format!("[ {} ]", modal.confirm_label),
                error_style(app).add_modifier(Modifier::BOLD),
            ),
            Span::raw("  "),
            Span::styled("[ Cancel ]", muted_style(app)),
        ]),
        Line::from(" ".repeat(width.saturating_sub(2))),
    ];

    let title_line = Line::from(Span::styled(modal.title.clone(), header_text_style(app)));
    let popup = Popup::new(Text::from(lines))
        .title(title_line)
        .border_style(border_style(app, true));

    frame.render_stateful_widget_ref(popup, area, &mut app.modal_popup);
}

fn draw_prompt_modal(frame: &mut Frame<'_>, area: Rect, app: &mut App) {
    let Some(prompt) = app.prompt_modal.as_ref() else {
        return;
    };

    let width = prompt.size.width(area.width) as usize;
    let lines = vec![
        Line::from(Span::styled(prompt.header.clone(), header_text_style(app))),
        Line::from(prompt.value().to_string()),
        Line::from(""),
        Line::from(vec![
            Span::styled(
                format!("[ {} ]", prompt.confirm_label),
                button_style(app).add_modifier(Modifier::BOLD),
            ),
            Span::raw("  "),
            Span::styled("[ Cancel ]", muted_style(app)),
        ]),
        Line::from(" ".repeat(width.saturating_sub(2))),
    ];
    let cursor = prompt.visual_cursor() as u16;

    let title_line = Line::from(Span::styled(prompt.title.clone(), header_text_style(app)));
    let popup = Popup::new(Text::from(lines))
        .title(title_line)
        .border_style(border_style(app, true));

    frame.render_stateful_widget_ref(popup, area, &mut app.modal_popup);

    if let Some(area) = app.modal_popup.area() {
        let inner = Block::default().borders(Borders::ALL).inner(*area);
        let x = inner.x.saturating_add(cursor);
        frame.set_cursor_position((x, inner.y + 1));
    }
}

fn draw_loading_modal(frame: &mut Frame<'_>, area: Rect, app: &App) {
    let Some(modal) = &app.loading_modal else {
        return;
    };

    let width = 30u16.min(area.width);
    let height = 3u16.min(area.height);

    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    let modal_area = Rect::new(x, y, width, height);

    frame.render_widget(Clear, modal_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style(app, true));

    let inner = block.inner(modal_area);
    frame.render_widget(block, modal_area);

    let text = Paragraph::new(modal.message.clone())
        .alignment(Alignment::Center)
        .style(header_text_style(app));
    frame.render_widget(text, inner);
}

fn draw_share_modal(frame: &mut Frame<'_>, area: Rect, app: &App) {
    let Some(modal) = &app.share_modal else {
        return;
    };

    let qr_width = modal
        .qr_lines
        .iter()
        .map(|l| l.chars().count())
        .max()
        .unwrap_or(0) as u16;
    let qr_height = modal.qr_lines.len() as u16;
    let title_width = modal.title.chars().count() as u16;

    // Borders plus a column of padding on each side
    let width = (qr_width.max(title_width) + 4).min(area.width);
    let height = (qr_height + 2).min(area.height);

    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    let modal_area = Rect::new(x, y, width, height);

    frame.render_widget(Clear, modal_area);

    let title = Line::from(Span::styled(modal.title.clone(), header_text_style(app)));
    let footer = Line::from(Span::styled(SHARE_HELP, header_text_style(app)));

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style(app, true))
        .title(title)
        .title_bottom(footer)
        .title_alignment(Alignment::Center);

    let inner = block.inner(modal_area);
    frame.render_widget(block, modal_area);

    let colors = app.ui_colors();
    let qr_style = Style::default()
        .fg(color(colors.selection_bg))
        .bg(Color::Reset);

    let qr_text: Vec<Line> = modal
        .qr_lines
        .iter()
        .map(|l| Line::from(Span::styled(l.clone(), qr_style)))
        .collect();

    let paragraph = Paragraph::new(qr_text).alignment(Alignment::Center);
    frame.render_widget(paragraph, inner);
}

fn selection_style(app: &App) -> Style {
    let colors = app.ui_colors();
    Style::default()
        .fg(color(colors.selection_fg))
        .bg(color(colors.selection_bg))
}

fn border_style(app: &App, active: bool) -> Style {
    let colors = app.ui_colors();
    let style = Style::default().fg(color(colors.border));
    if active {
        style.add_modifier(Modifier::BOLD)
    } else {
        style.add_modifier(Modifier::DIM)
    }
}

fn header_text_style(app: &App) -> Style {
    Style::default().fg(color(app.ui_colors().header))
}

fn muted_style(app: &App) -> Style {
    Style::default().fg(color(app.ui_colors().muted))
}

fn error_style(app: &App) -> Style {
    Style::default().fg(color(app.ui_colors().error))
}

fn button_style(app: &App) -> Style {
    Style::default().fg(color(app.ui_colors().button))
}

pub fn color(rgb: RgbColor) -> Color {
    Color::Rgb(rgb.r, rgb.g, rgb.b)
}
