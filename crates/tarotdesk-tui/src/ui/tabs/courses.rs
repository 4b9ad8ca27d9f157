use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Cell, Row},
    Frame,
};

use tarotdesk_core::utils::{format_optional, truncate};

use crate::app::{App, Focus};
use crate::ui::styles;

use super::{field, flag_field, render_detail, render_empty_detail, render_table, row_style, section};

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
        .split(area);
    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(columns[1]);

    render_modules(frame, app, columns[0]);
    render_lessons(frame, app, right[0]);
    render_lesson_detail(frame, app, right[1]);
}

fn render_modules(frame: &mut Frame, app: &App, area: Rect) {
    let modules = app.visible_modules();
    let rows: Vec<Row> = modules
        .iter()
        .enumerate()
        .map(|(i, m)| {
            Row::new(vec![
                Cell::from(format!("{:>2}", m.module.module_number)),
                Cell::from(m.module.title.clone()),
                Cell::from(format!("{:>3}", m.lessons.len())),
                Cell::from(Span::styled(
                    styles::flag_mark(m.module.is_published),
                    styles::flag_style(m.module.is_published),
                )),
            ])
            .style(row_style(i == app.module_selection))
        })
        .collect();

    render_table(
        frame,
        area,
        format!(" Modules ({}) ", modules.len()),
        &["#", "Title", "Les", "Pub"],
        rows,
        &[
            Constraint::Length(3),
            Constraint::Fill(1),
            Constraint::Length(4),
            Constraint::Length(4),
        ],
        app.module_selection,
        app.focus == Focus::List,
    );
}

fn render_lessons(frame: &mut Frame, app: &App, area: Rect) {
    let Some(module) = app.selected_module() else {
        render_empty_detail(frame, area, " Lessons ".to_string(), "Select a module");
        return;
    };

    let rows: Vec<Row> = module
        .lessons
        .iter()
        .enumerate()
        .map(|(i, l)| {
            let minutes = l.duration_minutes.map(|m| format!("{:>3}", m)).unwrap_or_default();
            let video = if l.video_url.is_some() { "▶" } else { "" };
            Row::new(vec![
                Cell::from(format!("{:>2}", l.lesson_number)),
                Cell::from(l.title.clone()),
                Cell::from(video),
                Cell::from(minutes),
                Cell::from(Span::styled(styles::flag_mark(l.is_published), styles::flag_style(l.is_published))),
            ])
            .style(row_style(app.focus == Focus::Detail && i == app.lesson_selection))
        })
        .collect();

    render_table(
        frame,
        area,
        format!(" {} - Lessons ({}) ", truncate(&module.module.label(), 40), module.lessons.len()),
        &["#", "Title", "", "Min", "Pub"],
        rows,
        &[
            Constraint::Length(3),
            Constraint::Fill(1),
            Constraint::Length(2),
            Constraint::Length(4),
            Constraint::Length(4),
        ],
        app.lesson_selection,
        app.focus == Focus::Detail,
    );
}

fn render_lesson_detail(frame: &mut Frame, app: &App, area: Rect) {
    let Some(module) = app.selected_module() else {
        render_empty_detail(frame, area, " Details ".to_string(), "");
        return;
    };

    // List focus describes the module, detail focus the lesson
    let lines = match (app.focus, app.selected_lesson()) {
        (Focus::Detail, Some(lesson)) => {
            let mut lines = vec![
                Line::from(Span::styled(lesson.title.clone(), styles::title_style())),
                flag_field("Status", lesson.is_published, "Published", "Draft"),
                field("Video", format_optional(&lesson.video_url, "None")),
                field("Resource", format_optional(&lesson.resource_url, "None")),
                Line::from(""),
            ];
            if let Some(body) = lesson.body() {
                lines.extend(super::text_block(&plain_text(body)));
            }
            lines
        }
        _ => {
            let mut lines = vec![
                Line::from(Span::styled(module.module.label(), styles::title_style())),
                flag_field("Status", module.module.is_published, "Published", "Draft"),
                field("Order", module.module.order_position.to_string()),
                Line::from(""),
            ];
            if let Some(ref description) = module.module.description {
                lines.push(section("Description"));
                lines.extend(super::text_block(description));
            }
            lines
        }
    };

    render_detail(frame, area, " Details ".to_string(), lines, false);
}

/// Strip HTML tags from lesson content, turning block ends into newlines.
pub fn plain_text(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut tag = String::new();
    let mut in_tag = false;

    for c in html.chars() {
        match (in_tag, c) {
            (false, '<') => {
                in_tag = true;
                tag.clear();
            }
            (true, '>') => {
                in_tag = false;
                let name = tag
                    .trim_start_matches('/')
                    .split(|c: char| c.is_whitespace() || c == '/')
                    .next()
                    .unwrap_or("")
                    .to_ascii_lowercase();
                if matches!(name.as_str(), "br" | "p" | "div" | "li" | "h1" | "h2" | "h3" | "h4") {
                    out.push('\n');
                }
            }
            (true, c) => tag.push(c),
            (false, c) => out.push(c),
        }
    }

    out.replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_strips_tags() {
        let html = "<h2>The Fool</h2><p>New beginnings &amp; <em>leaps</em>.</p>Line<br/>break";
        let text = plain_text(html);
        let lines: Vec<&str> = text.lines().filter(|l| !l.is_empty()).collect();
        assert_eq!(lines, vec!["The Fool", "New beginnings & leaps.", "Line", "break"]);
    }

    #[test]
    fn test_plain_text_passthrough() {
        assert_eq!(plain_text("No markup here"), "No markup here");
    }
}
