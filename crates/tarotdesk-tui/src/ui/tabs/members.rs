use ratatui::{
    layout::{Constraint, Rect},
    text::{Line, Span},
    widgets::{Cell, Row},
    Frame,
};

use tarotdesk_core::models::Member;
use tarotdesk_core::utils::format_date;

use crate::app::App;
use crate::ui::styles;

use super::{field, flag_field, render_detail, render_empty_detail, render_table, row_style, section, split_list_detail};

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let (list_area, detail_area) = split_list_detail(area);
    let members = app.visible_members();

    let rows: Vec<Row> = members
        .iter()
        .enumerate()
        .map(|(i, m)| {
            Row::new(vec![
                Cell::from(m.full_name.clone()),
                Cell::from(m.email.clone()),
                Cell::from(m.membership_tier.to_string()),
                Cell::from(Span::styled(m.status_label(), styles::flag_style(m.is_active))),
                Cell::from(m.renewal_display()),
            ])
            .style(row_style(i == app.member_selection))
        })
        .collect();

    let tier = app
        .member_filter
        .tier
        .map(|t| t.to_string())
        .unwrap_or_else(|| "All".to_string());
    let stats = app.member_stats();
    let title = format!(
        " Members ({} of {}, {} active) - [t]ier: {} [s]tatus: {} ",
        members.len(),
        stats.total,
        stats.active,
        tier,
        app.member_filter.status.label()
    );

    render_table(
        frame,
        list_area,
        title,
        &["Name", "Email", "Tier", "Status", "Renews"],
        rows,
        &[
            Constraint::Percentage(24),
            Constraint::Fill(3),
            Constraint::Length(14),
            Constraint::Length(9),
            Constraint::Length(13),
        ],
        app.member_selection,
        true,
    );

    match members.get(app.member_selection) {
        Some(member) => render_member_detail(frame, app, member, detail_area),
        None => render_empty_detail(frame, detail_area, " Member ".to_string(), "No members match"),
    }
}

fn render_member_detail(frame: &mut Frame, app: &App, member: &Member, area: Rect) {
    let mut lines = vec![
        Line::from(Span::styled(member.full_name.clone(), styles::title_style())),
        Line::from(""),
        field("Email", member.email.clone()),
        field("Tier", member.membership_tier.to_string()),
        field("Price", member.membership_tier.price_label()),
        flag_field("Status", member.is_active, "Active", "Inactive"),
        field("Started", format_date(member.membership_start_date)),
        field("Renews", member.renewal_display()),
        Line::from(""),
    ];

    match app.member_history.as_ref().filter(|h| h.member_id == member.id) {
        Some(history) => {
            lines.push(section("Reading History"));
            if history.entries.is_empty() {
                lines.push(Line::from(Span::styled("No readings yet", styles::muted_style())));
            }
            for entry in &history.entries {
                lines.push(Line::from(vec![
                    Span::styled(
                        format!("{}  ", entry.reading_date.format("%b %d, %Y")),
                        styles::highlight_style(),
                    ),
                    Span::raw(entry.reading_type.label()),
                ]));
                if let Some(ref notes) = entry.notes {
                    lines.push(Line::from(Span::styled(format!("  {}", notes), styles::muted_style())));
                }
            }
        }
        None => lines.push(Line::from(Span::styled(
            "[h] show reading history",
            styles::muted_style(),
        ))),
    }

    render_detail(frame, area, " Member ".to_string(), lines, false);
}
