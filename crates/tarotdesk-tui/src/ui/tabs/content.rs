//! Meditations and resources: the member library.

use ratatui::{
    layout::{Constraint, Rect},
    text::{Line, Span},
    widgets::{Cell, Row},
    Frame,
};

use tarotdesk_core::models::{Meditation, Resource};
use tarotdesk_core::utils::format_optional;

use crate::app::App;
use crate::ui::styles;

use super::{field, flag_field, render_detail, render_empty_detail, render_table, row_style, split_list_detail, text_block};

fn flag_cell(on: bool) -> Cell<'static> {
    Cell::from(Span::styled(styles::flag_mark(on), styles::flag_style(on)))
}

pub fn render_meditations(frame: &mut Frame, app: &App, area: Rect) {
    let (list_area, detail_area) = split_list_detail(area);
    let meditations = app.visible_meditations();

    let rows: Vec<Row> = meditations
        .iter()
        .enumerate()
        .map(|(i, m)| {
            Row::new(vec![
                Cell::from(m.title.clone()),
                Cell::from(m.category.to_string()),
                Cell::from(m.duration_minutes.map(|d| format!("{:>3}", d)).unwrap_or_default()),
                flag_cell(m.is_featured),
                flag_cell(m.is_published),
            ])
            .style(row_style(i == app.meditation_selection))
        })
        .collect();

    render_table(
        frame,
        list_area,
        format!(" Meditations ({}) ", meditations.len()),
        &["Title", "Category", "Min", "Feat", "Pub"],
        rows,
        &[
            Constraint::Fill(3),
            Constraint::Fill(1),
            Constraint::Length(4),
            Constraint::Length(5),
            Constraint::Length(4),
        ],
        app.meditation_selection,
        true,
    );

    match meditations.get(app.meditation_selection) {
        Some(m) => render_meditation_detail(frame, m, detail_area),
        None => render_empty_detail(frame, detail_area, " Meditation ".to_string(), "No meditations"),
    }
}

fn render_meditation_detail(frame: &mut Frame, meditation: &Meditation, area: Rect) {
    let mut lines = vec![
        Line::from(Span::styled(meditation.title.clone(), styles::title_style())),
        Line::from(""),
        field("Category", meditation.category.to_string()),
        field(
            "Duration",
            meditation
                .duration_minutes
                .map(|d| format!("{} min", d))
                .unwrap_or_else(|| "N/A".to_string()),
        ),
        flag_field("Status", meditation.is_published, "Published", "Draft"),
        flag_field("Featured", meditation.is_featured, "Yes", "No"),
        field("Audio", meditation.audio_url.clone()),
        Line::from(""),
    ];
    lines.extend(text_block(&format_optional(&meditation.description, "")));
    render_detail(frame, area, " Meditation ".to_string(), lines, false);
}

pub fn render_resources(frame: &mut Frame, app: &App, area: Rect) {
    let (list_area, detail_area) = split_list_detail(area);
    let resources = app.visible_resources();

    let rows: Vec<Row> = resources
        .iter()
        .enumerate()
        .map(|(i, r)| {
            Row::new(vec![
                Cell::from(r.title.clone()),
                Cell::from(r.category.to_string()),
                Cell::from(r.size_display()),
                flag_cell(r.is_featured),
                flag_cell(r.is_published),
            ])
            .style(row_style(i == app.resource_selection))
        })
        .collect();

    let category = app
        .resource_category
        .map(|c| c.to_string())
        .unwrap_or_else(|| "All".to_string());

    render_table(
        frame,
        list_area,
        format!(" Resources ({}) - [c]ategory: {} ", resources.len(), category),
        &["Title", "Category", "Size", "Feat", "Pub"],
        rows,
        &[
            Constraint::Fill(3),
            Constraint::Fill(1),
            Constraint::Length(12),
            Constraint::Length(5),
            Constraint::Length(4),
        ],
        app.resource_selection,
        true,
    );

    match resources.get(app.resource_selection) {
        Some(r) => render_resource_detail(frame, r, detail_area),
        None => render_empty_detail(frame, detail_area, " Resource ".to_string(), "No resources"),
    }
}

fn render_resource_detail(frame: &mut Frame, resource: &Resource, area: Rect) {
    let mut lines = vec![
        Line::from(Span::styled(resource.title.clone(), styles::title_style())),
        Line::from(""),
        field("Category", resource.category.to_string()),
        field("Size", resource.size_display()),
        flag_field("Status", resource.is_published, "Published", "Draft"),
        flag_field("Featured", resource.is_featured, "Yes", "No"),
        field("File", resource.file_url.clone()),
        Line::from(""),
    ];
    lines.extend(text_block(&format_optional(&resource.description, "")));
    render_detail(frame, area, " Resource ".to_string(), lines, false);
}
