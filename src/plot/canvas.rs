use std::path::Path;

use ab_glyph::{FontRef, PxScale};
use anyhow::{Context, Result, anyhow};
use image::{Rgb, RgbImage, imageops};
use imageproc::drawing::{
    draw_filled_circle_mut, draw_filled_rect_mut, draw_line_segment_mut, draw_text_mut, text_size,
};
use imageproc::rect::Rect;

use crate::color;

/// DejaVu Sans, see `assets/DejaVuSans.LICENSE`.
static FONT_DATA: &[u8] = include_bytes!("../../assets/DejaVuSans.ttf");

const TITLE_SIZE: f32 = 24.0;
const LABEL_SIZE: f32 = 18.0;
const TICK_SIZE: f32 = 14.0;

/// Pixel margins around the plotting area. Titles, axis labels and tick
/// labels are drawn inside them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Margins {
    pub left: u32,
    pub right: u32,
    pub top: u32,
    pub bottom: u32,
}

impl Default for Margins {
    fn default() -> Self {
        Margins {
            left: 90,
            right: 30,
            top: 60,
            bottom: 80,
        }
    }
}

/// Closed data interval shown along one axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Range {
    pub min: f64,
    pub max: f64,
}

impl Range {
    /// A degenerate or inverted interval is widened so mapping never divides
    /// by zero.
    pub fn new(min: f64, max: f64) -> Self {
        if !(max > min) {
            return Range { min: min - 0.5, max: min + 0.5 };
        }
        Range { min, max }
    }

    /// Range of the finite values in `values`, or `[0, 1]` when none are.
    pub fn of(values: impl IntoIterator<Item = f64>) -> Self {
        let (min, max) = values
            .into_iter()
            .filter(|v| v.is_finite())
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
        if min.is_finite() { Range::new(min, max) } else { Range::new(0.0, 1.0) }
    }

    pub fn span(&self) -> f64 {
        self.max - self.min
    }
}

/// An image with a rectangular plotting area and data → pixel mapping.
pub struct Canvas {
    image: RgbImage,
    font: FontRef<'static>,
    margins: Margins,
    x: Range,
    y: Range,
}

impl Canvas {
    pub fn new(width: u32, height: u32, x: Range, y: Range) -> Result<Self> {
        let font = FontRef::try_from_slice(FONT_DATA)
            .map_err(|e| anyhow!("loading bundled chart font: {e}"))?;
        let image = RgbImage::from_pixel(width, height, color::BACKGROUND);
        Ok(Canvas {
            image,
            font,
            margins: Margins::default(),
            x,
            y,
        })
    }

    /// Replace the default margins. Call before drawing anything.
    pub fn with_margins(mut self, margins: Margins) -> Self {
        self.margins = margins;
        self
    }

    fn plot_width(&self) -> f64 {
        self.image
            .width()
            .saturating_sub(self.margins.left + self.margins.right)
            .max(1) as f64
    }

    fn plot_height(&self) -> f64 {
        self.image
            .height()
            .saturating_sub(self.margins.top + self.margins.bottom)
            .max(1) as f64
    }

    /// Data coordinates → pixel coordinates (y grows downward in pixels).
    pub fn to_px(&self, x: f64, y: f64) -> (f32, f32) {
        let px = self.margins.left as f64 + (x - self.x.min) / self.x.span() * self.plot_width();
        let py = self.margins.top as f64 + (self.y.max - y) / self.y.span() * self.plot_height();
        (px as f32, py as f32)
    }

    /// Light grid lines at `divisions` evenly spaced positions per axis.
    pub fn grid(&mut self, divisions: usize) {
        let divisions = divisions.max(1);
        for i in 0..=divisions {
            let t = i as f64 / divisions as f64;
            let gx = self.x.min + self.x.span() * t;
            let gy = self.y.min + self.y.span() * t;
            self.line((gx, self.y.min), (gx, self.y.max), color::GRID);
            self.line((self.x.min, gy), (self.x.max, gy), color::GRID);
        }
    }

    /// Left and bottom axis lines with tick marks. Every tick carries its
    /// value on the x axis; the y ticks are labelled only when `label_y`.
    pub fn axes(&mut self, divisions: usize, label_y: bool) {
        let (x0, y0) = self.to_px(self.x.min, self.y.min);
        let (x1, _) = self.to_px(self.x.max, self.y.min);
        let (_, y1) = self.to_px(self.x.min, self.y.max);
        draw_line_segment_mut(&mut self.image, (x0, y0), (x1, y0), color::AXIS);
        draw_line_segment_mut(&mut self.image, (x0, y0), (x0, y1), color::AXIS);

        let divisions = divisions.max(1);
        for i in 0..=divisions {
            let t = i as f32 / divisions as f32;
            let tx = x0 + (x1 - x0) * t;
            let ty = y0 + (y1 - y0) * t;
            draw_line_segment_mut(&mut self.image, (tx, y0), (tx, y0 + 6.0), color::AXIS);
            draw_line_segment_mut(&mut self.image, (x0 - 6.0, ty), (x0, ty), color::AXIS);

            let value = self.x.min + self.x.span() * t as f64;
            let text = tick_text(value, self.x.span());
            let (w, _) = self.text_size(&text, TICK_SIZE);
            let left = tx.round() as i32 - w as i32 / 2;
            self.text(left, y0.round() as i32 + 10, &text, TICK_SIZE);

            if label_y {
                let value = self.y.min + self.y.span() * t as f64;
                let text = tick_text(value, self.y.span());
                self.label_left_of_axis(value, &text, TICK_SIZE);
            }
        }
    }

    /// Right-aligned text just left of the y axis, centred on data `y`.
    pub fn label_left_of_axis(&mut self, y: f64, text: &str, size: f32) {
        let (x0, py) = self.to_px(self.x.min, y);
        let (w, h) = self.text_size(text, size);
        let left = x0.round() as i32 - 10 - w as i32;
        let top = py.round() as i32 - h as i32 / 2;
        self.text(left, top, text, size);
    }

    /// Chart title centred in the top margin.
    pub fn title(&mut self, text: &str) {
        let (w, h) = self.text_size(text, TITLE_SIZE);
        let left = (self.image.width() as i32 - w as i32) / 2;
        let top = (self.margins.top as i32 - h as i32) / 2;
        self.text(left, top, text, TITLE_SIZE);
    }

    /// Axis label centred under the plotting area.
    pub fn x_label(&mut self, text: &str) {
        let (w, h) = self.text_size(text, LABEL_SIZE);
        let centre = self.margins.left as f64 + self.plot_width() / 2.0;
        let left = centre.round() as i32 - w as i32 / 2;
        let top = self.image.height() as i32 - h as i32 - 12;
        self.text(left, top, text, LABEL_SIZE);
    }

    /// Axis label along the left edge, reading bottom to top.
    pub fn y_label(&mut self, text: &str) {
        let (w, h) = self.text_size(text, LABEL_SIZE);
        let mut strip = RgbImage::from_pixel(w.max(1) + 4, h.max(1) + 4, color::BACKGROUND);
        draw_text_mut(&mut strip, color::AXIS, 2, 2, PxScale::from(LABEL_SIZE), &self.font, text);
        let rotated = imageops::rotate270(&strip);

        let centre = self.margins.top as f64 + self.plot_height() / 2.0;
        let top = centre.round() as i64 - rotated.height() as i64 / 2;
        imageops::overlay(&mut self.image, &rotated, 12, top);
    }

    /// Text with its top-left corner at pixel `(x, y)`.
    pub fn text(&mut self, x: i32, y: i32, text: &str, size: f32) {
        draw_text_mut(&mut self.image, color::AXIS, x, y, PxScale::from(size), &self.font, text);
    }

    fn text_size(&self, text: &str, size: f32) -> (u32, u32) {
        text_size(PxScale::from(size), &self.font, text)
    }

    pub fn line(&mut self, from: (f64, f64), to: (f64, f64), color: Rgb<u8>) {
        let a = self.to_px(from.0, from.1);
        let b = self.to_px(to.0, to.1);
        draw_line_segment_mut(&mut self.image, a, b, color);
    }

    /// A line drawn as `dash`-pixel strokes separated by `gap`-pixel holes.
    pub fn dashed_line(&mut self, from: (f64, f64), to: (f64, f64), color: Rgb<u8>, dash: f32, gap: f32) {
        let (ax, ay) = self.to_px(from.0, from.1);
        let (bx, by) = self.to_px(to.0, to.1);
        let length = ((bx - ax).powi(2) + (by - ay).powi(2)).sqrt();
        if length == 0.0 {
            return;
        }
        let (dx, dy) = ((bx - ax) / length, (by - ay) / length);
        let mut start = 0.0f32;
        while start < length {
            let end = (start + dash).min(length);
            for offset in [-0.5f32, 0.5] {
                draw_line_segment_mut(
                    &mut self.image,
                    (ax + dx * start - dy * offset, ay + dy * start + dx * offset),
                    (ax + dx * end - dy * offset, ay + dy * end + dx * offset),
                    color,
                );
            }
            start = end + gap;
        }
    }

    pub fn polyline(&mut self, points: &[(f64, f64)], color: Rgb<u8>) {
        for pair in points.windows(2) {
            let a = self.to_px(pair[0].0, pair[0].1);
            let b = self.to_px(pair[1].0, pair[1].1);
            draw_line_segment_mut(&mut self.image, a, b, color);
            draw_line_segment_mut(&mut self.image, (a.0, a.1 + 1.0), (b.0, b.1 + 1.0), color);
        }
    }

    /// Filled rectangle spanning two data-space corners.
    pub fn fill_rect(&mut self, corner_a: (f64, f64), corner_b: (f64, f64), color: Rgb<u8>) {
        let (ax, ay) = self.to_px(corner_a.0, corner_a.1);
        let (bx, by) = self.to_px(corner_b.0, corner_b.1);
        let left = ax.min(bx).round() as i32;
        let top = ay.min(by).round() as i32;
        let width = (ax - bx).abs().round().max(1.0) as u32;
        let height = (ay - by).abs().round().max(1.0) as u32;
        draw_filled_rect_mut(&mut self.image, Rect::at(left, top).of_size(width, height), color);
    }

    pub fn dot(&mut self, x: f64, y: f64, radius: i32, color: Rgb<u8>) {
        let (px, py) = self.to_px(x, y);
        draw_filled_circle_mut(&mut self.image, (px.round() as i32, py.round() as i32), radius, color);
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        self.image
            .save(path)
            .with_context(|| format!("writing {}", path.display()))?;
        log::info!("Wrote {}", path.display());
        Ok(())
    }
}

/// Tick value with as many decimals as the axis span needs.
fn tick_text(value: f64, span: f64) -> String {
    let decimals = if span >= 50.0 {
        0
    } else if span >= 5.0 {
        1
    } else {
        2
    };
    format!("{value:.decimals$}")
}
