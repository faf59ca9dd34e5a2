use crate::settings::Rgb;

/// Opaque RGBA raster addressed in drawing space: `x` in `[0, xlim]` to the
/// right, `y` in `[0, ylim]` upward.
pub struct Canvas {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
    xlim: f32,
    ylim: f32,
    px_per_point: f32,
    shapes: usize,
    // Scratch coverage so a polyline's overlapping segments blend once
    coverage: Vec<f32>,
}

impl Canvas {
    pub fn new(width: u32, height: u32, limits: (f32, f32), dpi: f32, background: Rgb) -> Self {
        let mut pixels = Vec::with_capacity((width * height * 4) as usize);
        for _ in 0..width * height {
            pixels.extend_from_slice(&[background.0[0], background.0[1], background.0[2], 255]);
        }
        Self {
            width,
            height,
            pixels,
            xlim: limits.0,
            ylim: limits.1,
            px_per_point: dpi / 72.0,
            shapes: 0,
            coverage: vec![0.0; (width * height) as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn limits(&self) -> (f32, f32) {
        (self.xlim, self.ylim)
    }

    /// Number of strokes and shapes drawn so far.
    pub fn shape_count(&self) -> usize {
        self.shapes
    }

    #[cfg(test)]
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn into_pixels(self) -> Vec<u8> {
        self.pixels
    }

    pub fn points_to_px(&self, points: f32) -> f32 {
        points * self.px_per_point
    }

    /// Drawing-space point to pixel-space point.
    pub fn to_px(&self, x: f32, y: f32) -> (f32, f32) {
        (
            x / self.xlim * self.width as f32,
            (1.0 - y / self.ylim) * self.height as f32,
        )
    }

    /// Alpha-blend `color` into one pixel; out-of-bounds writes are dropped.
    pub fn blend_pixel(&mut self, x: i32, y: i32, color: Rgb, alpha: f32) {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return;
        }
        let a = alpha.clamp(0.0, 1.0);
        if a <= 0.0 {
            return;
        }
        let idx = ((y as u32 * self.width + x as u32) * 4) as usize;
        let inv_a = 1.0 - a;
        for c in 0..3 {
            let dst = self.pixels[idx + c] as f32;
            self.pixels[idx + c] = (color.0[c] as f32 * a + dst * inv_a).round() as u8;
        }
        self.pixels[idx + 3] = 255;
    }

    /// Stroke a polyline given in drawing space. Width is in points.
    pub fn polyline(&mut self, points: &[(f32, f32)], color: Rgb, width_pt: f32, alpha: f32) {
        if points.len() < 2 || alpha <= 0.0 {
            return;
        }
        self.shapes += 1;

        let half = (self.points_to_px(width_pt) * 0.5).max(0.5);
        let px: Vec<(f32, f32)> = points.iter().map(|&(x, y)| self.to_px(x, y)).collect();

        let mut min_x = i32::MAX;
        let mut min_y = i32::MAX;
        let mut max_x = i32::MIN;
        let mut max_y = i32::MIN;

        for seg in px.windows(2) {
            let (a, b) = (seg[0], seg[1]);
            if !(a.0.is_finite() && a.1.is_finite() && b.0.is_finite() && b.1.is_finite()) {
                continue;
            }
            let x0 = ((a.0.min(b.0) - half - 1.0).floor() as i32).max(0);
            let x1 = ((a.0.max(b.0) + half + 1.0).ceil() as i32).min(self.width as i32 - 1);
            let y0 = ((a.1.min(b.1) - half - 1.0).floor() as i32).max(0);
            let y1 = ((a.1.max(b.1) + half + 1.0).ceil() as i32).min(self.height as i32 - 1);
            if x0 > x1 || y0 > y1 {
                continue;
            }
            min_x = min_x.min(x0);
            min_y = min_y.min(y0);
            max_x = max_x.max(x1);
            max_y = max_y.max(y1);

            for y in y0..=y1 {
                for x in x0..=x1 {
                    let d = distance_to_segment((x as f32 + 0.5, y as f32 + 0.5), a, b);
                    let cov = (half + 0.5 - d).clamp(0.0, 1.0);
                    if cov > 0.0 {
                        let i = (y as u32 * self.width + x as u32) as usize;
                        self.coverage[i] = self.coverage[i].max(cov);
                    }
                }
            }
        }

        if min_x > max_x {
            return;
        }
        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let i = (y as u32 * self.width + x as u32) as usize;
                let cov = self.coverage[i];
                if cov > 0.0 {
                    self.coverage[i] = 0.0;
                    self.blend_pixel(x, y, color, alpha * cov);
                }
            }
        }
    }

    pub fn line(&mut self, from: (f32, f32), to: (f32, f32), color: Rgb, width_pt: f32, alpha: f32) {
        self.polyline(&[from, to], color, width_pt, alpha);
    }

    /// Fill an axis-aligned rectangle whose lower-left corner is `(x, y)`.
    pub fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Rgb, alpha: f32) {
        if w <= 0.0 || h <= 0.0 || alpha <= 0.0 {
            return;
        }
        self.shapes += 1;

        let (left, top) = self.to_px(x, y + h);
        let (right, bottom) = self.to_px(x + w, y);
        let x0 = (left.round() as i32).max(0);
        let x1 = (right.round() as i32).min(self.width as i32);
        let y0 = (top.round() as i32).max(0);
        let y1 = (bottom.round() as i32).min(self.height as i32);

        for py in y0..y1 {
            for px in x0..x1 {
                self.blend_pixel(px, py, color, alpha);
            }
        }
    }
}

fn distance_to_segment(p: (f32, f32), a: (f32, f32), b: (f32, f32)) -> f32 {
    let (dx, dy) = (b.0 - a.0, b.1 - a.1);
    let len_sq = dx * dx + dy * dy;
    let t = if len_sq > 0.0 {
        (((p.0 - a.0) * dx + (p.1 - a.1) * dy) / len_sq).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let (cx, cy) = (a.0 + t * dx, a.1 + t * dy);
    ((p.0 - cx).powi(2) + (p.1 - cy).powi(2)).sqrt()
}
