use ratatui::{
    layout::{Constraint, Rect},
    text::{Line, Span},
    widgets::{Cell, Row},
    Frame,
};

use tarotdesk_core::models::Announcement;

use crate::app::App;
use crate::ui::styles;

use super::{field, flag_field, render_detail, render_empty_detail, render_table, row_style, split_list_detail, text_block};

fn sent_label(a: &Announcement) -> String {
    match (a.is_sent, a.sent_at) {
        (true, Some(at)) => format!("Sent {}", at.format("%b %d, %Y")),
        (true, None) => "Sent".to_string(),
        (false, _) => "Not sent".to_string(),
    }
}

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let (list_area, detail_area) = split_list_detail(area);
    let announcements = app.visible_announcements();

    let rows: Vec<Row> = announcements
        .iter()
        .enumerate()
        .map(|(i, a)| {
            Row::new(vec![
                Cell::from(a.title.clone()),
                Cell::from(a.audience().to_string()),
                Cell::from(a.delivery_method.to_string()),
                Cell::from(Span::styled(styles::flag_mark(a.is_published), styles::flag_style(a.is_published))),
                Cell::from(Span::styled(styles::flag_mark(a.is_sent), styles::flag_style(a.is_sent))),
            ])
            .style(row_style(i == app.announcement_selection))
        })
        .collect();

    render_table(
        frame,
        list_area,
        format!(" Announcements ({}) ", announcements.len()),
        &["Title", "Audience", "Delivery", "Pub", "Sent"],
        rows,
        &[
            Constraint::Fill(3),
            Constraint::Length(14),
            Constraint::Length(18),
            Constraint::Length(4),
            Constraint::Length(5),
        ],
        app.announcement_selection,
        true,
    );

    let Some(announcement) = announcements.get(app.announcement_selection) else {
        render_empty_detail(frame, detail_area, " Announcement ".to_string(), "No announcements");
        return;
    };

    let mut lines = vec![
        Line::from(Span::styled(announcement.title.clone(), styles::title_style())),
        Line::from(""),
        field("Audience", announcement.audience().to_string()),
        field("Delivery", announcement.delivery_method.to_string()),
        flag_field("Status", announcement.is_published, "Published", "Draft"),
        flag_field("Sent", announcement.is_sent, "Yes", "No"),
        field("", sent_label(announcement)),
        Line::from(""),
    ];
    lines.extend(text_block(&announcement.content));
    if !announcement.can_mark_sent() && !announcement.is_sent {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "Publish before marking as sent",
            styles::muted_style(),
        )));
    }
    render_detail(frame, detail_area, " Announcement ".to_string(), lines, false);
}
