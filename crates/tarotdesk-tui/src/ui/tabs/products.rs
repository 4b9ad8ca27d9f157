use ratatui::{
    layout::{Constraint, Rect},
    text::{Line, Span},
    widgets::{Cell, Row},
    Frame,
};

use tarotdesk_core::utils::format_optional;

use crate::app::App;
use crate::ui::styles;

use super::{field, flag_field, render_detail, render_empty_detail, render_table, row_style, split_list_detail, text_block};

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let (list_area, detail_area) = split_list_detail(area);
    let products = app.visible_products();

    let rows: Vec<Row> = products
        .iter()
        .enumerate()
        .map(|(i, p)| {
            Row::new(vec![
                Cell::from(format!("{:>2}", p.sort_order)),
                Cell::from(p.title.clone()),
                Cell::from(p.category.to_string()),
                Cell::from(format!("{:>9}", p.price_display())),
                Cell::from(if p.is_live_reading { "live" } else { "" }),
                Cell::from(Span::styled(styles::flag_mark(p.is_active), styles::flag_style(p.is_active))),
            ])
            .style(row_style(i == app.product_selection))
        })
        .collect();

    render_table(
        frame,
        list_area,
        format!(" Reading Products ({}) - [s]tatus: {} ", products.len(), app.product_status.label()),
        &["#", "Title", "Category", "Price", "", "On"],
        rows,
        &[
            Constraint::Length(3),
            Constraint::Fill(3),
            Constraint::Fill(1),
            Constraint::Length(10),
            Constraint::Length(5),
            Constraint::Length(3),
        ],
        app.product_selection,
        true,
    );

    let Some(product) = products.get(app.product_selection) else {
        render_empty_detail(frame, detail_area, " Product ".to_string(), "No products");
        return;
    };

    let mut lines = vec![
        Line::from(Span::styled(product.title.clone(), styles::title_style())),
        Line::from(""),
        field("Category", product.category.to_string()),
        field("Price", product.price_display()),
        field("Delivery", product.delivery_display().to_string()),
        flag_field("Status", product.is_active, "Active", "Hidden"),
        field("Sort order", product.sort_order.to_string()),
    ];
    if product.is_live_reading {
        lines.push(field("Scheduling", format_optional(&product.calendly_link, "Not set")));
    }
    if let Some(ref image) = product.image_url {
        lines.push(field("Image", image.clone()));
    }
    lines.push(Line::from(""));
    lines.extend(text_block(&format_optional(&product.description, "")));
    render_detail(frame, detail_area, " Product ".to_string(), lines, false);
}
