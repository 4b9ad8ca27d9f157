use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use tarotdesk_core::media::embed_url;
use tarotdesk_core::models::{CardNumber, ReadingCategory};
use tarotdesk_core::readings::{available_cards, ReadingStep};

use crate::app::{App, AppState, Focus, Tab};
use crate::forms::FieldKind;

use super::styles;
use super::tabs::{announcements, bookings, content, courses, dashboard, members, messages, products, readings};

pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title bar
            Constraint::Length(3), // Tabs
            Constraint::Min(10),   // Main content
            Constraint::Length(2), // Status bar
        ])
        .split(frame.area());

    render_title_bar(frame, app, chunks[0]);
    render_tabs(frame, app, chunks[1]);
    render_main_area(frame, app, chunks[2]);
    render_status_bar(frame, app, chunks[3]);

    // Render overlays
    match app.state {
        AppState::ShowingHelp => render_help_overlay(frame),
        AppState::ConfirmingQuit => render_quit_overlay(frame),
        AppState::ConfirmingDelete => render_delete_overlay(frame, app),
        AppState::EditingForm => render_form_overlay(frame, app),
        AppState::LookingUp => render_lookup_overlay(frame, app),
        AppState::ViewingLesson => render_lesson_overlay(frame, app),
        AppState::AuthRequired => render_auth_overlay(frame, app),
        AppState::Normal | AppState::Searching | AppState::Quitting => {}
    }
}

fn render_title_bar(frame: &mut Frame, app: &App, area: Rect) {
    let title = "  ✦ TarotDesk";
    let help_hint = "[?] Help";
    let mut user = match (&app.user_label, app.demo_mode) {
        (Some(user), true) => format!("{}  [demo]  ", user),
        (Some(user), false) => format!("{}  ", user),
        (None, true) => "[demo]  ".to_string(),
        (None, false) => String::new(),
    };
    // Warn when the session is about to lapse
    if let Some(minutes) = app.session_minutes_left().filter(|m| *m < 10) {
        user.push_str(&format!("session {}m  ", minutes.max(0)));
    }
    let used = title.chars().count() + user.chars().count() + help_hint.len() + 4;

    let title_line = Line::from(vec![
        Span::styled(title, styles::title_style()),
        Span::raw(" ".repeat((area.width as usize).saturating_sub(used))),
        Span::styled(user, styles::muted_style()),
        Span::styled(help_hint, styles::muted_style()),
    ]);

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(styles::muted_style());

    let paragraph = Paragraph::new(title_line).block(block);
    frame.render_widget(paragraph, area);
}

fn render_tabs(frame: &mut Frame, app: &App, area: Rect) {
    let mut spans = vec![Span::raw(" ")];
    for (i, tab) in Tab::ALL.iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled(" | ", styles::muted_style()));
        }
        let label = format!("[{}] {}", tab.shortcut(), tab.title());
        if *tab == app.current_tab {
            spans.push(Span::styled(label, styles::tab_style(true)));
        } else {
            spans.push(Span::styled(label, styles::muted_style()));
        }
    }

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(styles::muted_style());

    let paragraph = Paragraph::new(Line::from(spans)).block(block);
    frame.render_widget(paragraph, area);
}

fn render_main_area(frame: &mut Frame, app: &App, area: Rect) {
    let Some(ref message) = app.error_banner else {
        render_main_content(frame, app, area);
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(0)])
        .split(area);

    let banner = Line::from(vec![
        Span::raw(" ⚠ "),
        Span::raw(message.clone()),
        Span::raw("   [Esc] dismiss "),
    ]);
    frame.render_widget(Paragraph::new(banner).style(styles::error_banner_style()), chunks[0]);
    render_main_content(frame, app, chunks[1]);
}

fn render_main_content(frame: &mut Frame, app: &App, area: Rect) {
    match app.current_tab {
        Tab::Dashboard => dashboard::render(frame, app, area),
        Tab::Members => members::render(frame, app, area),
        Tab::Bookings => bookings::render(frame, app, area),
        Tab::Courses => courses::render(frame, app, area),
        Tab::Meditations => content::render_meditations(frame, app, area),
        Tab::Resources => content::render_resources(frame, app, area),
        Tab::Announcements => announcements::render(frame, app, area),
        Tab::Readings => readings::render(frame, app, area),
        Tab::Messages => messages::render(frame, app, area),
        Tab::Products => products::render(frame, app, area),
    }
}

/// Per-tab key hints for the status bar
fn tab_shortcuts(app: &App) -> &'static str {
    match app.current_tab {
        Tab::Dashboard => "[L]ookup | [u]pdate | [q]uit",
        Tab::Members => "[n]ew [e]dit [d]el [a]ctive [h]istory [t]ier [s]tatus | [q]uit",
        Tab::Bookings => "[n]ew [e]dit [d]el [Enter] advance [x] cancel [f]ilter [t]ier | [q]uit",
        Tab::Courses => match app.focus {
            Focus::List => "[n]ew [e]dit [d]el [p]ublish [g]o to lesson [Tab] lessons | [q]uit",
            Focus::Detail => "[n]ew [e]dit [d]el [p]ublish [g]o to lesson [Tab] modules | [q]uit",
        },
        Tab::Meditations => "[n]ew [e]dit [d]el [p]ublish [f]eature | [q]uit",
        Tab::Resources => "[n]ew [e]dit [d]el [p]ublish [f]eature [c]ategory | [q]uit",
        Tab::Announcements => "[n]ew [e]dit [d]el [p]ublish [s]ent | [q]uit",
        Tab::Readings => "[n]ew [e]dit [d]el [L]ookup | [q]uit",
        Tab::Messages => "[n]ew [e]dit [d]el [c]urrent | [q]uit",
        Tab::Products => "[n]ew [e]dit [d]el [a]ctive [s]tatus | [q]uit",
    }
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let left_text = if app.state == AppState::Searching {
        format!(" /{}▌ ", app.search_query)
    } else if let Some(ref msg) = app.status_message {
        format!(" {} ", msg)
    } else if !app.search_query.is_empty() {
        format!(" Filter: {} ", app.search_query)
    } else if app.demo_mode {
        " Demo data (in memory) ".to_string()
    } else {
        let age = app
            .current_tab
            .table()
            .map(|t| app.cache_ages.age_of(t))
            .unwrap_or_else(|| app.cache_ages.last_updated());
        format!(" Updated {} ", age)
    };

    let right_text = format!(" {} ", tab_shortcuts(app));

    let width = area.width as usize;
    let padding_len = width
        .saturating_sub(left_text.chars().count())
        .saturating_sub(right_text.chars().count());
    let left_style = if app.state == AppState::Searching {
        styles::search_style()
    } else {
        styles::muted_style()
    };

    let status_line = Line::from(vec![
        Span::styled(left_text, left_style),
        Span::raw(" ".repeat(padding_len)),
        Span::styled(right_text, styles::muted_style()),
    ]);
    let paragraph = Paragraph::new(status_line).style(styles::status_bar_style());
    frame.render_widget(paragraph, area);
}

fn help_line(key: &'static str, desc: &'static str) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("  {:<10}", key), styles::help_key_style()),
        Span::styled(desc, styles::help_desc_style()),
    ])
}

fn render_help_overlay(frame: &mut Frame) {
    let area = centered_rect_fixed(60, 34, frame.area());

    // Clear the area
    frame.render_widget(Clear, area);

    let version = env!("CARGO_PKG_VERSION");

    let help_text = vec![
        Line::from(Span::styled("  ✦ TarotDesk", styles::title_style())),
        Line::from(Span::styled(format!("  version {}", version), styles::muted_style())),
        Line::from(""),
        Line::from(Span::styled(" Navigation", styles::highlight_style())),
        help_line("1-9, 0", "Switch tabs"),
        help_line("←/→", "Prev/next tab"),
        help_line("↑/↓", "Navigate list"),
        help_line("PgUp/PgDn", "Scroll a page"),
        help_line("Tab", "Modules ↔ lessons (Courses)"),
        help_line("/", "Search the current list"),
        help_line("Esc", "Clear search or dismiss error"),
        Line::from(""),
        Line::from(Span::styled(" Records", styles::highlight_style())),
        help_line("n", "New record"),
        help_line("e", "Edit selected"),
        help_line("d", "Delete selected"),
        help_line("p", "Publish / unpublish"),
        help_line("f", "Feature / unfeature"),
        help_line("a", "Activate / deactivate"),
        help_line("u", "Reload from backend"),
        Line::from(""),
        Line::from(Span::styled(" Tab specific", styles::highlight_style())),
        help_line("h", "Member reading history"),
        help_line("Enter / x", "Advance / cancel booking"),
        help_line("g", "Open a lesson by address"),
        help_line("s", "Mark announcement sent"),
        help_line("c", "Set current message"),
        help_line("L", "Digital reading lookup"),
        Line::from(""),
        help_line("q", "Quit"),
        Line::from(""),
        Line::from(Span::styled("  Press ? or Esc to close", styles::muted_style())),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    frame.render_widget(Paragraph::new(help_text).block(block), area);
}

/// Create a centered rectangle with fixed dimensions
fn centered_rect_fixed(width: u16, height: u16, r: Rect) -> Rect {
    let x = r.x + (r.width.saturating_sub(width)) / 2;
    let y = r.y + (r.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width.min(r.width), height.min(r.height))
}

fn overlay_block(title: String) -> Block<'static> {
    Block::default()
        .title(title)
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default())
}

fn confirm_line(action: &'static str) -> Line<'static> {
    Line::from(vec![
        Span::styled("   Press ", styles::muted_style()),
        Span::styled("[Y]", styles::help_key_style()),
        Span::styled(format!(" to {}, ", action), styles::muted_style()),
        Span::styled("[N]", styles::help_key_style()),
        Span::styled(" to cancel", styles::muted_style()),
    ])
}

fn render_quit_overlay(frame: &mut Frame) {
    let area = centered_rect_fixed(46, 7, frame.area());
    frame.render_widget(Clear, area);

    let lines = vec![
        Line::from(""),
        Line::from(Span::styled("   Are you sure you want to quit?", styles::highlight_style())),
        Line::from(""),
        confirm_line("quit"),
    ];

    frame.render_widget(Paragraph::new(lines).block(overlay_block(" TarotDesk ".to_string())), area);
}

fn render_delete_overlay(frame: &mut Frame, app: &App) {
    let Some(ref target) = app.delete_target else {
        return;
    };
    let area = centered_rect_fixed(60, 9, frame.area());
    frame.render_widget(Clear, area);

    let lines = vec![
        Line::from(""),
        Line::from(vec![
            Span::styled("   Delete ", styles::highlight_style()),
            Span::styled(target.label.clone(), styles::list_item_style()),
            Span::styled("?", styles::highlight_style()),
        ]),
        Line::from(Span::styled("   This cannot be undone.", styles::error_style())),
        Line::from(""),
        confirm_line("delete"),
    ];

    let block = overlay_block(format!(" Delete {} ", target.kind.noun()));
    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }).block(block), area);
}

fn render_form_overlay(frame: &mut Frame, app: &App) {
    let Some(ref form) = app.form else {
        return;
    };
    let height = form.fields.len() as u16 + 8;
    let area = centered_rect_fixed(78, height, frame.area());
    frame.render_widget(Clear, area);

    let value_width = (area.width as usize).saturating_sub(26);
    let mut lines = vec![Line::from("")];

    for (i, field) in form.fields.iter().enumerate() {
        let focused = i == form.focus;
        let value = match field.kind {
            FieldKind::Text => {
                let text = tail(&field.value, value_width.saturating_sub(2));
                if focused {
                    format!("{}▌", text)
                } else {
                    text
                }
            }
            FieldKind::Flag | FieldKind::Choice(_) => {
                if focused {
                    format!("◀ {} ▶", field.display())
                } else {
                    field.display()
                }
            }
        };
        let value_style = if focused {
            styles::selected_style()
        } else {
            styles::list_item_style()
        };
        lines.push(Line::from(vec![
            Span::styled(format!("  {:<20} ", field.label), styles::muted_style()),
            Span::styled(value, value_style),
        ]));
    }

    lines.push(Line::from(""));
    let hint = form.focused().and_then(|f| f.hint).unwrap_or("");
    lines.push(Line::from(Span::styled(format!("  {}", hint), styles::muted_style())));
    match form.error {
        Some(ref error) => lines.push(Line::from(Span::styled(format!("  {}", error), styles::error_style()))),
        None => lines.push(Line::from("")),
    }
    lines.push(Line::from(vec![
        Span::styled("  Tab/↑↓", styles::help_key_style()),
        Span::styled(" field  ", styles::muted_style()),
        Span::styled("←/→/Space", styles::help_key_style()),
        Span::styled(" change  ", styles::muted_style()),
        Span::styled("Enter", styles::help_key_style()),
        Span::styled(" save  ", styles::muted_style()),
        Span::styled("Esc", styles::help_key_style()),
        Span::styled(" cancel", styles::muted_style()),
    ]));

    frame.render_widget(Paragraph::new(lines).block(overlay_block(format!(" {} ", form.title()))), area);
}

/// Last `max` characters of a string, so the cursor end stays visible
fn tail(s: &str, max: usize) -> String {
    let count = s.chars().count();
    if count <= max {
        s.to_string()
    } else {
        format!("…{}", s.chars().skip(count - max + 1).collect::<String>())
    }
}

fn render_lookup_overlay(frame: &mut Frame, app: &App) {
    let area = centered_rect_fixed(66, 16, frame.area());
    frame.render_widget(Clear, area);

    let mut lines = vec![Line::from("")];

    match app.lookup.step() {
        ReadingStep::Initial => {
            lines.push(Line::from(Span::styled("  Choose a reading category", styles::highlight_style())));
            lines.push(Line::from(""));
            lines.push(Line::from(vec![
                Span::styled("  [l] ", styles::help_key_style()),
                Span::raw(ReadingCategory::LoveRelationships.to_string()),
            ]));
            lines.push(Line::from(vec![
                Span::styled("  [g] ", styles::help_key_style()),
                Span::raw(ReadingCategory::General.to_string()),
            ]));
        }
        ReadingStep::NumberSelection { category } => {
            lines.push(Line::from(Span::styled(format!("  {}", category), styles::highlight_style())));
            lines.push(Line::from(""));
            lines.push(Line::from(vec![
                Span::styled("  Card number (0-21): ", styles::muted_style()),
                Span::styled(format!("{}▌", app.lookup_input), styles::selected_style()),
            ]));
            let cards: Vec<String> = available_cards(&app.readings, *category)
                .iter()
                .map(CardNumber::to_string)
                .collect();
            let recorded = if cards.is_empty() {
                "none yet".to_string()
            } else {
                cards.join(", ")
            };
            lines.push(Line::from(Span::styled(format!("  Recorded: {}", recorded), styles::muted_style())));
            if let Some(ref error) = app.lookup_error {
                lines.push(Line::from(Span::styled(format!("  {}", error), styles::error_style())));
            }
            lines.push(Line::from(""));
            lines.push(Line::from(vec![
                Span::styled("  Enter", styles::help_key_style()),
                Span::styled(" look up  ", styles::muted_style()),
                Span::styled("[c]", styles::help_key_style()),
                Span::styled(" change category", styles::muted_style()),
            ]));
        }
        ReadingStep::VideoResult { reading } => {
            lines.push(Line::from(Span::styled(
                format!("  {} · {}", reading.category, reading.card_number),
                styles::muted_style(),
            )));
            lines.push(Line::from(Span::styled(format!("  {}", reading.card_name), styles::title_style())));
            lines.push(Line::from(""));
            if let Some(ref meaning) = reading.card_meaning {
                lines.push(Line::from(format!("  {}", meaning)));
                lines.push(Line::from(""));
            }
            lines.push(Line::from(vec![
                Span::styled("  Video: ", styles::muted_style()),
                Span::styled(embed_url(&reading.video_url), styles::highlight_style()),
            ]));
            lines.push(Line::from(""));
            lines.push(Line::from(vec![
                Span::styled("  [a]", styles::help_key_style()),
                Span::styled(" choose again", styles::muted_style()),
            ]));
        }
        ReadingStep::ComingSoon { category, card_number } => {
            lines.push(Line::from(Span::styled(
                format!("  {} · {}", category, card_number.arcana_name()),
                styles::muted_style(),
            )));
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled("  Coming soon", styles::highlight_style())));
            lines.push(Line::from(Span::styled(
                "  This reading has not been recorded yet.",
                styles::muted_style(),
            )));
            lines.push(Line::from(""));
            lines.push(Line::from(vec![
                Span::styled("  [a]", styles::help_key_style()),
                Span::styled(" choose again", styles::muted_style()),
            ]));
        }
    }

    let block = overlay_block(" Digital Reading Lookup · Esc to close ".to_string());
    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }).block(block), area);
}

fn render_lesson_overlay(frame: &mut Frame, app: &App) {
    let area = centered_rect_fixed(80, 24, frame.area());
    frame.render_widget(Clear, area);

    let viewer = &app.lesson_viewer;
    let mut lines = vec![
        Line::from(vec![
            Span::styled("  Address: ", styles::muted_style()),
            Span::styled(format!("{}▌", viewer.query), styles::selected_style()),
        ]),
        Line::from(""),
    ];

    if let Some(ref error) = viewer.error {
        lines.push(Line::from(Span::styled(format!("  {}", error), styles::error_style())));
    } else if let Some(ref location) = viewer.location {
        let lesson = &location.lesson;
        lines.push(Line::from(Span::styled(format!("  {}", location.module.label()), styles::muted_style())));
        lines.push(Line::from(Span::styled(
            format!("  Lesson {}: {}", lesson.lesson_number, lesson.title),
            styles::title_style(),
        )));
        if let Some(minutes) = lesson.duration_minutes {
            lines.push(Line::from(Span::styled(format!("  {} min", minutes), styles::muted_style())));
        }
        lines.push(Line::from(""));
        if let Some(ref video) = lesson.video_url {
            lines.push(Line::from(vec![
                Span::styled("  Video: ", styles::muted_style()),
                Span::styled(embed_url(video), styles::highlight_style()),
            ]));
        }
        if let Some(ref url) = lesson.resource_url {
            lines.push(Line::from(vec![
                Span::styled(format!("  {}: ", lesson.resource_label()), styles::muted_style()),
                Span::raw(url.clone()),
            ]));
        }
        lines.push(Line::from(""));
        let body = lesson.body().map(courses::plain_text).unwrap_or_default();
        for paragraph in body.lines().filter(|l| !l.trim().is_empty()) {
            lines.push(Line::from(format!("  {}", paragraph.trim())));
        }
        lines.push(Line::from(""));

        let mut nav = vec![];
        if let Some(prev) = location.previous {
            nav.push(Span::styled("  ← ", styles::help_key_style()));
            nav.push(Span::styled(
                format!("Module {} Lesson {}", prev.module_number, prev.lesson_number),
                styles::muted_style(),
            ));
        }
        if let Some(next) = location.next {
            nav.push(Span::styled("    → ", styles::help_key_style()));
            nav.push(Span::styled(
                format!("Module {} Lesson {}", next.module_number, next.lesson_number),
                styles::muted_style(),
            ));
        }
        lines.push(Line::from(nav));
    } else {
        lines.push(Line::from(Span::styled(
            "  Edit the address and press Enter to open the lesson.",
            styles::muted_style(),
        )));
    }

    let block = overlay_block(" Lesson Viewer · Enter open · ←/→ prev/next · Esc close ".to_string());
    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }).block(block), area);
}

fn render_auth_overlay(frame: &mut Frame, app: &App) {
    let area = centered_rect_fixed(60, 10, frame.area());
    frame.render_widget(Clear, area);

    let message = app
        .auth_message
        .clone()
        .unwrap_or_else(|| "Please sign in to continue.".to_string());

    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(format!("  {}", message), styles::error_style())),
        Line::from(""),
        Line::from(Span::styled(
            "  Run `tarotdesk --login` to store admin credentials,",
            styles::muted_style(),
        )),
        Line::from(Span::styled("  or start with --demo.", styles::muted_style())),
        Line::from(""),
        Line::from(vec![
            Span::styled("  [r]", styles::help_key_style()),
            Span::styled(" retry   ", styles::muted_style()),
            Span::styled("[q]", styles::help_key_style()),
            Span::styled(" quit", styles::muted_style()),
        ]),
    ];

    let block = overlay_block(" Authentication Required ".to_string());
    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }).block(block), area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_centered_rect_fits_inside() {
        let outer = Rect::new(0, 0, 100, 40);
        let r = centered_rect_fixed(60, 10, outer);
        assert_eq!(r, Rect::new(20, 15, 60, 10));

        let small = Rect::new(0, 0, 30, 5);
        let r = centered_rect_fixed(60, 10, small);
        assert_eq!(r.width, 30);
        assert_eq!(r.height, 5);
    }

    #[test]
    fn test_tail_keeps_end() {
        assert_eq!(tail("short", 10), "short");
        assert_eq!(tail("abcdefghij", 5), "…ghij");
    }
}
