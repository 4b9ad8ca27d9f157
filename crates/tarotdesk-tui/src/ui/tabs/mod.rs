//! Per-tab content rendering.
//!
//! Most tabs are a table on the left and a detail panel for the selected row
//! on the right. The helpers here keep that layout consistent.

pub mod announcements;
pub mod bookings;
pub mod content;
pub mod courses;
pub mod dashboard;
pub mod members;
pub mod messages;
pub mod products;
pub mod readings;

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Row, Table, TableState, Wrap},
    Frame,
};

use super::styles;

/// Split a tab into list (60%) and detail (40%) panels
fn split_list_detail(area: Rect) -> (Rect, Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(area);
    (chunks[0], chunks[1])
}

fn panel(title: String, focused: bool) -> Block<'static> {
    Block::default()
        .title(title)
        .title_style(styles::muted_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(focused))
}

fn row_style(selected: bool) -> Style {
    if selected {
        styles::selected_style()
    } else {
        styles::list_item_style()
    }
}

/// Render a selectable table with a header row
#[allow(clippy::too_many_arguments)]
fn render_table<'a>(
    frame: &mut Frame,
    area: Rect,
    title: String,
    header: &[&'static str],
    rows: Vec<Row<'a>>,
    widths: &[Constraint],
    selection: usize,
    focused: bool,
) {
    let empty = rows.is_empty();
    let header = Row::new(header.to_vec()).style(styles::title_style()).height(1);
    let table = Table::new(rows, widths.to_vec())
        .header(header)
        .block(panel(title, focused))
        .row_highlight_style(styles::selected_style());

    let mut state = TableState::default();
    if !empty {
        state.select(Some(selection));
    }
    frame.render_stateful_widget(table, area, &mut state);
}

/// A `label  value` line in a detail panel
fn field(label: &str, value: impl Into<String>) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("{:<12}", label), styles::muted_style()),
        Span::raw(value.into()),
    ])
}

fn flag_field(label: &str, on: bool, on_text: &'static str, off_text: &'static str) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("{:<12}", label), styles::muted_style()),
        Span::styled(if on { on_text } else { off_text }, styles::flag_style(on)),
    ])
}

fn section(title: &'static str) -> Line<'static> {
    Line::from(Span::styled(title, styles::highlight_style()))
}

/// Multi-line text, one line per paragraph
fn text_block(text: &str) -> Vec<Line<'static>> {
    text.lines().map(|l| Line::from(l.to_string())).collect()
}

fn render_detail(frame: &mut Frame, area: Rect, title: String, lines: Vec<Line<'static>>, focused: bool) {
    let paragraph = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(panel(title, focused));
    frame.render_widget(paragraph, area);
}

fn render_empty_detail(frame: &mut Frame, area: Rect, title: String, message: &'static str) {
    render_detail(
        frame,
        area,
        title,
        vec![Line::from(Span::styled(message, styles::muted_style()))],
        false,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_block_splits_lines() {
        let lines = text_block("one\ntwo\n\nfour");
        assert_eq!(lines.len(), 4);
    }
}
