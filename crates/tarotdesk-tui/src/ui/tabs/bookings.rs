use ratatui::{
    layout::{Constraint, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Cell, Row},
    Frame,
};

use tarotdesk_core::models::{Booking, BookingStatus};
use tarotdesk_core::utils::{format_money, format_optional, truncate};

use crate::app::App;
use crate::ui::styles;

use super::{field, render_detail, render_empty_detail, render_table, row_style, section, split_list_detail, text_block};

fn status_style(status: BookingStatus) -> Style {
    match status {
        BookingStatus::Pending => styles::highlight_style(),
        BookingStatus::Confirmed => styles::title_style(),
        BookingStatus::Completed => styles::success_style(),
        BookingStatus::Cancelled => styles::muted_style(),
    }
}

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let (list_area, detail_area) = split_list_detail(area);
    let bookings = app.visible_bookings();

    let rows: Vec<Row> = bookings
        .iter()
        .enumerate()
        .map(|(i, b)| {
            Row::new(vec![
                Cell::from(b.formatted_date()),
                Cell::from(truncate(app.member_name(&b.member_id), 22)),
                Cell::from(b.reading_type.label()),
                Cell::from(Span::styled(b.status.to_string(), status_style(b.status))),
                Cell::from(b.payment_amount.map(format_money).unwrap_or_default()),
            ])
            .style(row_style(i == app.booking_selection))
        })
        .collect();

    let summary = app.booking_summary();
    let status = app
        .booking_filter
        .status
        .map(|s| s.to_string())
        .unwrap_or_else(|| "All".to_string());
    let tier = app
        .booking_filter
        .tier
        .map(|t| t.to_string())
        .unwrap_or_else(|| "All".to_string());
    let title = format!(
        " Bookings ({}) - {} upcoming, {} completed, {} - [f]ilter: {} [t]ier: {} ",
        bookings.len(),
        summary.upcoming,
        summary.completed,
        format_money(summary.revenue),
        status,
        tier
    );

    render_table(
        frame,
        list_area,
        title,
        &["Date", "Member", "Reading", "Status", "Amount"],
        rows,
        &[
            Constraint::Length(19),
            Constraint::Fill(2),
            Constraint::Fill(2),
            Constraint::Length(10),
            Constraint::Length(10),
        ],
        app.booking_selection,
        true,
    );

    match bookings.get(app.booking_selection) {
        Some(booking) => render_booking_detail(frame, app, booking, detail_area),
        None => render_empty_detail(frame, detail_area, " Booking ".to_string(), "No bookings match"),
    }
}

fn render_booking_detail(frame: &mut Frame, app: &App, booking: &Booking, area: Rect) {
    let mut lines = vec![
        Line::from(Span::styled(booking.reading_type.label(), styles::title_style())),
        Line::from(""),
        field("Member", app.member_name(&booking.member_id).to_string()),
        field("Date", booking.formatted_date()),
        Line::from(vec![
            Span::styled(format!("{:<12}", "Status"), styles::muted_style()),
            Span::styled(booking.status.to_string(), status_style(booking.status)),
        ]),
        field(
            "Amount",
            booking.payment_amount.map(format_money).unwrap_or_else(|| "Not set".to_string()),
        ),
        field("List price", format_money(booking.reading_type.list_price())),
        Line::from(""),
        section("Questions"),
    ];
    lines.extend(text_block(&format_optional(&booking.customer_questions, "None")));
    lines.push(Line::from(""));
    lines.push(section("Special Requests"));
    lines.extend(text_block(&format_optional(&booking.special_requests, "None")));

    render_detail(frame, area, " Booking ".to_string(), lines, false);
}
