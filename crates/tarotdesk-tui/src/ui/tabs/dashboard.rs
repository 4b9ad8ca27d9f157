use chrono::Utc;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use tarotdesk_core::models::Booking;
use tarotdesk_core::utils::{format_money, truncate};

use crate::app::App;
use crate::ui::styles;

use super::{field, panel, section};

/// Number of upcoming bookings listed on the dashboard.
const UPCOMING_LIMIT: usize = 8;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    // Top: headline counts | business summary
    // Bottom: upcoming bookings | this week's message
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(11), Constraint::Min(6)])
        .split(area);
    let top = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(rows[0]);
    let bottom = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(rows[1]);

    render_counts(frame, app, top[0]);
    render_business(frame, app, top[1]);
    render_upcoming(frame, app, bottom[0]);
    render_current_message(frame, app, bottom[1]);
}

fn render_counts(frame: &mut Frame, app: &App, area: Rect) {
    let lines = match app.stats {
        Some(stats) => vec![
            section("Content"),
            field("Modules", stats.modules.to_string()),
            field("Lessons", stats.lessons.to_string()),
            field("Meditations", stats.meditations.to_string()),
            field("Resources", stats.resources.to_string()),
            Line::from(""),
            section("Members"),
            field("Total", stats.members.to_string()),
            field("Active", stats.active_members.to_string()),
        ],
        None if app.refreshing => vec![Line::from(Span::styled("Loading...", styles::muted_style()))],
        None => vec![Line::from(Span::styled("No data yet. Press [u] to load.", styles::muted_style()))],
    };
    frame.render_widget(Paragraph::new(lines).block(panel(" Overview ".to_string(), false)), area);
}

fn render_business(frame: &mut Frame, app: &App, area: Rect) {
    let members = app.member_stats();
    let bookings = app.booking_summary();

    let lines = vec![
        section("Membership"),
        field("Circle", members.circle.to_string()),
        field("VIP", members.vip.to_string()),
        field("Inactive", (members.total - members.active).to_string()),
        Line::from(""),
        section("Readings"),
        field("Upcoming", bookings.upcoming.to_string()),
        field("Completed", bookings.completed.to_string()),
        Line::from(vec![
            Span::styled(format!("{:<12}", "Revenue"), styles::muted_style()),
            Span::styled(format_money(bookings.revenue), styles::success_style()),
        ]),
    ];
    frame.render_widget(Paragraph::new(lines).block(panel(" Practice ".to_string(), false)), area);
}

fn upcoming(app: &App) -> Vec<&Booking> {
    let now = Utc::now();
    let mut upcoming: Vec<&Booking> = app
        .bookings
        .iter()
        .filter(|b| b.status.is_upcoming() && b.booking_date >= now)
        .collect();
    upcoming.sort_by_key(|b| b.booking_date);
    upcoming.truncate(UPCOMING_LIMIT);
    upcoming
}

fn render_upcoming(frame: &mut Frame, app: &App, area: Rect) {
    let bookings = upcoming(app);
    let lines: Vec<Line> = if bookings.is_empty() {
        vec![Line::from(Span::styled("No upcoming readings", styles::muted_style()))]
    } else {
        bookings
            .iter()
            .map(|b| {
                Line::from(vec![
                    Span::styled(format!("{:<20}", b.formatted_date()), styles::highlight_style()),
                    Span::raw(format!("{:<22}", truncate(app.member_name(&b.member_id), 20))),
                    Span::styled(b.reading_type.label(), styles::muted_style()),
                ])
            })
            .collect()
    };
    frame.render_widget(Paragraph::new(lines).block(panel(" Upcoming Readings ".to_string(), false)), area);
}

fn render_current_message(frame: &mut Frame, app: &App, area: Rect) {
    let lines = match app.current_message() {
        Some(message) => {
            let mut lines = vec![
                Line::from(Span::styled(message.title.clone(), styles::title_style())),
                Line::from(Span::styled(
                    message.published_date.format("%b %d, %Y").to_string(),
                    styles::muted_style(),
                )),
                Line::from(""),
            ];
            lines.extend(super::text_block(&message.message_content));
            lines
        }
        None => vec![Line::from(Span::styled("No current message", styles::muted_style()))],
    };
    let paragraph = Paragraph::new(lines)
        .wrap(ratatui::widgets::Wrap { trim: false })
        .block(panel(" This Week's Message ".to_string(), false));
    frame.render_widget(paragraph, area);
}
