// src/visualizer.rs
use eframe::egui;
use egui::{Color32, Painter, Pos2, Rect, Response, Rounding, Shape, Stroke, Vec2};

/// Width of the marker strip to the right of each plot.
pub const MARKER_COLUMN_WIDTH: f32 = 70.0;
const MARKER_HEIGHT: f32 = 18.0;
const ARROW_DEPTH: f32 = 8.0;

pub fn to_color32(rgb: [u8; 3]) -> Color32 {
    Color32::from_rgb(rgb[0], rgb[1], rgb[2])
}

/// Hit box of a channel marker centred on `pixel_y` inside the marker column.
pub fn marker_rect(column: Rect, pixel_y: f32) -> Rect {
    Rect::from_min_size(
        Pos2::new(column.left() + 2.0, pixel_y - MARKER_HEIGHT / 2.0),
        Vec2::new(column.width() - 4.0, MARKER_HEIGHT),
    )
}

/// Arrow tab pointing left at the channel's baseline, with its label inside.
pub fn paint_marker(painter: &Painter, rect: Rect, color: Color32, label: &str, selected: bool) {
    let tip = rect.left_center();
    let body = Rect::from_min_max(Pos2::new(rect.left() + ARROW_DEPTH, rect.top()), rect.max);
    let outline = if selected {
        Stroke::new(1.5, Color32::WHITE)
    } else {
        Stroke::new(1.0, Color32::from_rgb(80, 80, 85))
    };
    painter.add(Shape::convex_polygon(
        vec![
            tip,
            Pos2::new(body.left(), body.top()),
            Pos2::new(body.left(), body.bottom()),
        ],
        color,
        Stroke::NONE,
    ));
    painter.rect_filled(body, Rounding::same(3.0), color);
    painter.rect_stroke(body, Rounding::same(3.0), outline);
    painter.text(
        body.center(),
        egui::Align2::CENTER_CENTER,
        label,
        egui::FontId::proportional(11.0),
        Color32::WHITE,
    );
}

/// Clickable legend entry; a dimmed swatch means the channel is hidden.
pub fn legend_chip(ui: &mut egui::Ui, color: Color32, label: &str, visible: bool) -> Response {
    let text_color = if visible {
        Color32::from_rgb(220, 220, 220)
    } else {
        Color32::from_rgb(110, 110, 110)
    };
    let galley = ui.painter().layout_no_wrap(
        label.to_owned(),
        egui::FontId::proportional(12.0),
        text_color,
    );
    let size = Vec2::new(16.0 + galley.size().x + 6.0, 18.0);
    let (rect, response) = ui.allocate_exact_size(size, egui::Sense::click());
    let painter = ui.painter();
    let swatch = Rect::from_center_size(
        Pos2::new(rect.left() + 7.0, rect.center().y),
        Vec2::new(12.0, 8.0),
    );
    if visible {
        painter.rect_filled(swatch, Rounding::same(2.0), color);
    } else {
        painter.rect_stroke(swatch, Rounding::same(2.0), Stroke::new(1.0, color));
    }
    painter.galley(
        Pos2::new(rect.left() + 16.0, rect.center().y - galley.size().y / 2.0),
        galley,
    );
    if response.hovered() {
        painter.rect_stroke(rect, Rounding::same(3.0), Stroke::new(1.0, Color32::from_rgb(60, 60, 65)));
    }
    response
}
