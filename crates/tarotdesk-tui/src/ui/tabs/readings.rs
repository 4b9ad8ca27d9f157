use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Cell, Paragraph, Row},
    Frame,
};

use tarotdesk_core::media::embed_url;
use tarotdesk_core::models::{CardNumber, ReadingCategory};
use tarotdesk_core::readings::available_cards;

use crate::app::App;
use crate::ui::styles;

use super::{field, panel, render_detail, render_empty_detail, render_table, row_style, split_list_detail, text_block};

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let (list_area, right) = split_list_detail(area);
    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(8), Constraint::Length(6)])
        .split(right);
    let readings = app.visible_readings();

    let rows: Vec<Row> = readings
        .iter()
        .enumerate()
        .map(|(i, r)| {
            Row::new(vec![
                Cell::from(r.category.to_string()),
                Cell::from(format!("{:>2}", r.card_number.get())),
                Cell::from(r.card_name.clone()),
            ])
            .style(row_style(i == app.reading_selection))
        })
        .collect();

    render_table(
        frame,
        list_area,
        format!(" Digital Readings ({}) - [L]ookup ", readings.len()),
        &["Category", "#", "Card"],
        rows,
        &[Constraint::Length(22), Constraint::Length(3), Constraint::Fill(1)],
        app.reading_selection,
        true,
    );

    match readings.get(app.reading_selection) {
        Some(reading) => {
            let mut lines = vec![
                Line::from(Span::styled(reading.card_name.clone(), styles::title_style())),
                Line::from(""),
                field("Category", reading.category.to_string()),
                field("Card", format!("{} ({})", reading.card_number, reading.card_number.arcana_name())),
                field("Video", reading.video_url.clone()),
                field("Embed", embed_url(&reading.video_url)),
                Line::from(""),
            ];
            if let Some(ref meaning) = reading.card_meaning {
                lines.extend(text_block(meaning));
            }
            render_detail(frame, right[0], " Reading ".to_string(), lines, false);
        }
        None => render_empty_detail(frame, right[0], " Reading ".to_string(), "No readings recorded"),
    }

    render_coverage(frame, app, right[1]);
}

/// How many of the 22 cards have a recording in each category
fn render_coverage(frame: &mut Frame, app: &App, area: Rect) {
    let total = CardNumber::all().count();
    let lines: Vec<Line> = ReadingCategory::ALL
        .iter()
        .map(|category| {
            let recorded = available_cards(&app.readings, *category).len();
            Line::from(vec![
                Span::styled(format!("{:<22}", category.to_string()), styles::muted_style()),
                Span::styled(format!("{}/{}", recorded, total), styles::flag_style(recorded == total)),
            ])
        })
        .collect();
    frame.render_widget(Paragraph::new(lines).block(panel(" Coverage ".to_string(), false)), area);
}
