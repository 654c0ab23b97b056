//! Rasterises one line of outlined text onto an RGB canvas.

use image::{Rgb, RgbImage};
use rusttype::{Font, Scale, point};

/// Alpha coverage of a rectangle of the canvas.
struct Mask {
    x0: i32,
    y0: i32,
    width: usize,
    height: usize,
    alpha: Vec<f32>,
}

impl Mask {
    fn new(x0: i32, y0: i32, width: usize, height: usize) -> Self {
        Self {
            x0,
            y0,
            width,
            height,
            alpha: vec![0.0; width * height],
        }
    }

    fn get(&self, x: usize, y: usize) -> f32 {
        self.alpha[y * self.width + x]
    }

    fn raise(&mut self, x: i64, y: i64, value: f32) {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return;
        }
        let slot = &mut self.alpha[y as usize * self.width + x as usize];
        if value > *slot {
            *slot = value;
        }
    }

    /// Coverage grown by a disc of `radius` pixels.
    fn dilate(&self, radius: i32) -> Mask {
        let mut out = Mask::new(self.x0, self.y0, self.width, self.height);
        let offsets: Vec<(i64, i64)> = (-radius..=radius)
            .flat_map(|dy| (-radius..=radius).map(move |dx| (dx, dy)))
            .filter(|(dx, dy)| dx * dx + dy * dy <= radius * radius)
            .map(|(dx, dy)| (i64::from(dx), i64::from(dy)))
            .collect();
        for y in 0..self.height {
            for x in 0..self.width {
                let value = self.get(x, y);
                if value <= 0.0 {
                    continue;
                }
                for (dx, dy) in &offsets {
                    out.raise(x as i64 + dx, y as i64 + dy, value);
                }
            }
        }
        out
    }

    fn paint(&self, canvas: &mut RgbImage, color: Rgb<u8>) {
        let (cw, ch) = (i64::from(canvas.width()), i64::from(canvas.height()));
        for y in 0..self.height {
            let cy = i64::from(self.y0) + y as i64;
            if cy < 0 || cy >= ch {
                continue;
            }
            for x in 0..self.width {
                let cx = i64::from(self.x0) + x as i64;
                if cx < 0 || cx >= cw {
                    continue;
                }
                let alpha = self.get(x, y).clamp(0.0, 1.0);
                if alpha <= 0.0 {
                    continue;
                }
                let pixel = canvas.get_pixel_mut(cx as u32, cy as u32);
                for (channel, target) in pixel.0.iter_mut().zip(color.0) {
                    let blended = f32::from(*channel) * (1.0 - alpha) + f32::from(target) * alpha;
                    *channel = blended.round().clamp(0.0, 255.0) as u8;
                }
            }
        }
    }
}

/// Draws `text` with its top-left at (`x`, `top`), filled with `fill` and
/// ringed by `outline` of width `stroke`.
#[allow(clippy::too_many_arguments)]
pub(crate) fn draw_outlined_line(
    canvas: &mut RgbImage,
    font: &Font<'static>,
    scale: Scale,
    text: &str,
    x: f32,
    top: f32,
    stroke: i32,
    fill: Rgb<u8>,
    outline: Rgb<u8>,
) {
    let ascent = font.v_metrics(scale).ascent;
    let glyphs: Vec<_> = font.layout(text, scale, point(x, top + ascent)).collect();

    let Some((min_x, min_y, max_x, max_y)) = glyphs
        .iter()
        .filter_map(|glyph| glyph.pixel_bounding_box())
        .fold(None, |acc: Option<(i32, i32, i32, i32)>, bb| {
            Some(match acc {
                None => (bb.min.x, bb.min.y, bb.max.x, bb.max.y),
                Some((x0, y0, x1, y1)) => (
                    x0.min(bb.min.x),
                    y0.min(bb.min.y),
                    x1.max(bb.max.x),
                    y1.max(bb.max.y),
                ),
            })
        })
    else {
        return;
    };

    let stroke = stroke.max(0);
    let x0 = min_x - stroke;
    let y0 = min_y - stroke;
    let width = (max_x - min_x + 2 * stroke).max(0) as usize;
    let height = (max_y - min_y + 2 * stroke).max(0) as usize;
    let mut coverage = Mask::new(x0, y0, width, height);

    for glyph in &glyphs {
        let Some(bb) = glyph.pixel_bounding_box() else {
            continue;
        };
        glyph.draw(|gx, gy, value| {
            let x = i64::from(bb.min.x - x0) + i64::from(gx);
            let y = i64::from(bb.min.y - y0) + i64::from(gy);
            coverage.raise(x, y, value);
        });
    }

    if stroke > 0 {
        coverage.dilate(stroke).paint(canvas, outline);
    }
    coverage.paint(canvas, fill);
}
