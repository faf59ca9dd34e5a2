use super::canvas::Canvas;
use super::text::TextOverlay;
use crate::settings::{Colors, HorizontalAnchor, Rgb, TitleSettings, VerticalAnchor};

const GRID_ALPHA: f32 = 0.12;
const GRID_WIDTH_PT: f32 = 0.5;

/// Rows per column of the special grid: high, mid, low density.
pub const SPECIAL_GRID_ROWS: [usize; 3] = [8, 4, 2];

/// Faint reference lines at every drawing-space unit.
pub fn draw_grid(canvas: &mut Canvas, color: Rgb) {
    let (xlim, ylim) = canvas.limits();
    let mut x = 1.0;
    while x < xlim {
        canvas.line((x, 0.0), (x, ylim), color, GRID_WIDTH_PT, GRID_ALPHA);
        x += 1.0;
    }
    let mut y = 1.0;
    while y < ylim {
        canvas.line((0.0, y), (xlim, y), color, GRID_WIDTH_PT, GRID_ALPHA);
        y += 1.0;
    }
}

/// Three columns tinted high, mid, low with 8, 4 and 2 rows.
pub fn draw_special_grid(canvas: &mut Canvas, colors: &Colors) {
    let (xlim, ylim) = canvas.limits();
    let column_width = xlim / 3.0;
    let tints = [colors.high, colors.mid, colors.low];

    for (col, (&rows, &tint)) in SPECIAL_GRID_ROWS.iter().zip(tints.iter()).enumerate() {
        let left = column_width * col as f32;
        if col > 0 {
            canvas.line((left, 0.0), (left, ylim), tint, GRID_WIDTH_PT * 2.0, GRID_ALPHA * 1.5);
        }
        for row in 1..rows {
            let y = ylim * row as f32 / rows as f32;
            canvas.line((left, y), (left + column_width, y), tint, GRID_WIDTH_PT, GRID_ALPHA);
        }
    }
}

/// Top-left pixel of the title box for the configured anchors.
pub fn title_origin(
    canvas_width: u32,
    canvas_height: u32,
    text_width: u32,
    font_size: f32,
    horizontal: HorizontalAnchor,
    vertical: VerticalAnchor,
) -> (i32, i32) {
    let w = canvas_width as i32;
    let h = canvas_height as i32;
    let margin = (canvas_width.min(canvas_height) as f32 * 0.04) as i32;
    let tw = text_width as i32;

    let x = match horizontal {
        HorizontalAnchor::Left => margin,
        HorizontalAnchor::Center => (w - tw) / 2,
        HorizontalAnchor::Right => w - margin - tw,
    };
    let y = match vertical {
        VerticalAnchor::Top => margin,
        VerticalAnchor::Bottom => h - margin - (font_size * 1.25) as i32,
    };
    (x.max(0), y.max(0))
}

pub fn draw_title(canvas: &mut Canvas, overlay: &TextOverlay, title: &TitleSettings) {
    let Some(text) = title.visible_text() else {
        return;
    };
    let (x, y) = title_origin(
        canvas.width(),
        canvas.height(),
        overlay.measure_width(text),
        overlay.font_size(),
        title.horizontal,
        title.vertical,
    );
    overlay.composite(canvas, text, x, y, title.color, 0.95);
}
