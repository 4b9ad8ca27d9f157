use ratatui::{
    layout::{Constraint, Rect},
    text::{Line, Span},
    widgets::{Cell, Row},
    Frame,
};

use crate::app::App;
use crate::ui::styles;

use super::{field, flag_field, render_detail, render_empty_detail, render_table, row_style, split_list_detail, text_block};

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let (list_area, detail_area) = split_list_detail(area);
    let messages = app.visible_messages();

    let rows: Vec<Row> = messages
        .iter()
        .enumerate()
        .map(|(i, m)| {
            Row::new(vec![
                Cell::from(m.published_date.format("%Y-%m-%d").to_string()),
                Cell::from(m.title.clone()),
                Cell::from(Span::styled(if m.is_current { "current" } else { "" }, styles::success_style())),
            ])
            .style(row_style(i == app.message_selection))
        })
        .collect();

    render_table(
        frame,
        list_area,
        format!(" Weekly Messages ({}) ", messages.len()),
        &["Published", "Title", ""],
        rows,
        &[Constraint::Length(11), Constraint::Fill(1), Constraint::Length(8)],
        app.message_selection,
        true,
    );

    let Some(message) = messages.get(app.message_selection) else {
        render_empty_detail(frame, detail_area, " Message ".to_string(), "No messages");
        return;
    };

    let mut lines = vec![
        Line::from(Span::styled(message.title.clone(), styles::title_style())),
        Line::from(""),
        field("Published", message.published_date.format("%b %d, %Y").to_string()),
        flag_field("Current", message.is_current, "Yes", "No"),
        Line::from(""),
    ];
    lines.extend(text_block(&message.message_content));
    render_detail(frame, detail_area, " Message ".to_string(), lines, false);
}
