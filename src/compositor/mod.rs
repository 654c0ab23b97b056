//! Draws the caption onto the generated picture.
//!
//! The setup goes in a band across the top, the punchline in a band across
//! the bottom, both in white with a black outline so they read over any
//! background. Everything scales with the image width, so the output always
//! has the same dimensions as the input.

use std::io::Cursor;
use std::path::Path;

use image::{Rgb, RgbImage};
use rusttype::Font;
use tracing::debug;

use crate::error::GenerationError;
use crate::models::{Caption, ImageAsset};

mod layout;
mod render;

use layout::{Measure, fit_font_size};

/// Text area inset from every edge, as a fraction of the width.
const PADDING_DIVISOR: u32 = 40;
/// Starting font size, as a fraction of the width.
const START_SIZE_DIVISOR: f32 = 10.0;
/// Smallest font size tried before giving up on shrinking.
const FLOOR_FONT_PX: f32 = 6.0;
/// Outline radius, as a fraction of the font size.
const STROKE_DIVISOR: f32 = 15.0;

const FILL: Rgb<u8> = Rgb([255, 255, 255]);
const OUTLINE: Rgb<u8> = Rgb([0, 0, 0]);

/// A parsed TrueType/OpenType font.
#[derive(Clone)]
pub struct MemeFont(Font<'static>);

impl std::fmt::Debug for MemeFont {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "MemeFont({} glyphs)", self.0.glyph_count())
    }
}

impl MemeFont {
    /// DejaVu Sans Bold, compiled into the binary.
    pub fn bundled() -> Result<Self, GenerationError> {
        let bytes: &'static [u8] =
            include_bytes!(concat!(env!("CARGO_MANIFEST_DIR"), "/fonts/DejaVuSans-Bold.ttf"));
        Font::try_from_bytes(bytes)
            .map(MemeFont)
            .ok_or_else(|| GenerationError::Compositing("bundled font is unreadable".to_string()))
    }

    /// Loads a font file from disk.
    pub fn from_path(path: &Path) -> Result<Self, GenerationError> {
        let bytes = std::fs::read(path).map_err(|err| {
            GenerationError::Compositing(format!("failed to read {}: {err}", path.display()))
        })?;
        Font::try_from_vec(bytes).map(MemeFont).ok_or_else(|| {
            GenerationError::Compositing(format!("{} is not a usable font", path.display()))
        })
    }

    #[cfg(test)]
    pub(crate) fn into_inner(self) -> Font<'static> {
        self.0
    }
}

/// One wrapped line and where it lands on the canvas.
#[derive(Clone, Debug, PartialEq)]
pub struct PlacedLine {
    /// The text on this line
    pub text: String,
    /// Left edge in pixels
    pub x: f32,
    /// Top edge in pixels
    pub y: f32,
    /// Advance width in pixels, outline excluded
    pub width: f32,
}

/// Where every caption line goes for a given canvas.
#[derive(Clone, Debug, PartialEq)]
pub struct MemeLayout {
    /// Font size shared by both bands
    pub font_size: f32,
    /// Outline radius in pixels
    pub stroke: i32,
    /// Setup lines, top band
    pub top: Vec<PlacedLine>,
    /// Punchline lines, bottom band
    pub bottom: Vec<PlacedLine>,
}

/// The finished picture. Only the compositor makes these.
#[derive(Clone, Debug)]
pub struct Meme {
    image: RgbImage,
}

impl Meme {
    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// The composited pixels.
    pub fn image(&self) -> &RgbImage {
        &self.image
    }

    /// PNG bytes for display or download.
    pub fn encode_png(&self) -> Result<Vec<u8>, GenerationError> {
        let mut out = Vec::new();
        self.image
            .write_to(&mut Cursor::new(&mut out), image::ImageFormat::Png)
            .map_err(|err| GenerationError::Compositing(err.to_string()))?;
        Ok(out)
    }
}

/// Overlays captions onto images. Holds no state besides the font.
#[derive(Clone, Debug)]
pub struct Compositor {
    font: MemeFont,
}

impl Compositor {
    /// Compositor drawing with `font`.
    pub fn new(font: MemeFont) -> Self {
        Self { font }
    }

    /// Works out font size, wrapping and positions for a `width` x `height` canvas.
    pub fn layout(&self, caption: &Caption, width: u32, height: u32) -> MemeLayout {
        let font = &self.font.0;
        let setup = caption.setup.trim();
        let punchline = caption.punchline.trim();
        let two_bands = !setup.is_empty() && !punchline.is_empty();

        let padding = (width / PADDING_DIVISOR).max(2);
        let band_height = (if two_bands { height / 4 } else { height / 3 }).max(1) as f32;
        let start = (width as f32 / START_SIZE_DIVISOR).max(FLOOR_FONT_PX);
        let area_width = width.saturating_sub(2 * padding).max(1) as f32;

        // The outline eats into the usable width, so fit against what's left
        // at the starting size; it only shrinks from there.
        let stroke_at = |size: f32| ((size / STROKE_DIVISOR).round() as i32).max(1);
        let fit_width = (area_width - 2.0 * stroke_at(start) as f32).max(1.0);

        let font_size = [setup, punchline]
            .iter()
            .filter(|text| !text.is_empty())
            .map(|text| fit_font_size(font, text, fit_width, band_height, start, FLOOR_FONT_PX))
            .fold(start, f32::min);
        let stroke = stroke_at(font_size);
        let measure = Measure::new(font, font_size);

        let place = |text: &str, first_top: f32| -> Vec<PlacedLine> {
            let mut y = first_top;
            measure
                .wrap(text, fit_width)
                .into_iter()
                .map(|line| {
                    let line_width = measure.width(&line);
                    let x = ((width as f32 - line_width) / 2.0).max(0.0);
                    let placed = PlacedLine {
                        text: line,
                        x,
                        y,
                        width: line_width,
                    };
                    y += measure.line_height() + measure.line_spacing();
                    placed
                })
                .collect()
        };

        let top = if setup.is_empty() {
            Vec::new()
        } else {
            place(setup, padding as f32)
        };
        let bottom = if punchline.is_empty() {
            Vec::new()
        } else {
            let lines = measure.wrap(punchline, fit_width).len();
            let block = measure.block_height(lines);
            place(punchline, (height as f32 - padding as f32 - block).max(0.0))
        };

        MemeLayout {
            font_size,
            stroke,
            top,
            bottom,
        }
    }

    /// Decodes the asset and draws the caption on a fresh copy.
    ///
    /// Only malformed image bytes fail; the asset itself is never modified.
    pub fn composite(&self, caption: &Caption, asset: &ImageAsset) -> Result<Meme, GenerationError> {
        let decoded = image::load_from_memory(asset.bytes())
            .map_err(|err| GenerationError::Compositing(err.to_string()))?;
        let mut canvas = decoded.to_rgb8();
        let layout = self.layout(caption, canvas.width(), canvas.height());
        debug!(
            "compositing {}x{} at {:.1}px, {} top / {} bottom lines",
            canvas.width(),
            canvas.height(),
            layout.font_size,
            layout.top.len(),
            layout.bottom.len()
        );

        let scale = Measure::new(&self.font.0, layout.font_size).scale();
        for line in layout.top.iter().chain(layout.bottom.iter()) {
            render::draw_outlined_line(
                &mut canvas,
                &self.font.0,
                scale,
                &line.text,
                line.x,
                line.y,
                layout.stroke,
                FILL,
                OUTLINE,
            );
        }
        Ok(Meme { image: canvas })
    }
}
