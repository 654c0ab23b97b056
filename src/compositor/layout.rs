//! Word wrapping and font-size fitting for the caption bands.

use rusttype::{Font, Scale};

/// Extra space between wrapped lines, as a fraction of the font size.
const LINE_SPACING_RATIO: f32 = 0.08;

/// Measures strings at one font size.
pub(crate) struct Measure<'a> {
    font: &'a Font<'static>,
    scale: Scale,
}

impl<'a> Measure<'a> {
    pub(crate) fn new(font: &'a Font<'static>, size: f32) -> Self {
        Self {
            font,
            scale: Scale::uniform(size),
        }
    }

    pub(crate) fn scale(&self) -> Scale {
        self.scale
    }

    /// Advance width of `text`, kerning included.
    pub(crate) fn width(&self, text: &str) -> f32 {
        let mut width = 0.0;
        let mut previous = None;
        for c in text.chars() {
            let glyph = self.font.glyph(c).scaled(self.scale);
            if let Some(prev) = previous {
                width += self.font.pair_kerning(self.scale, prev, glyph.id());
            }
            width += glyph.h_metrics().advance_width;
            previous = Some(glyph.id());
        }
        width
    }

    /// Height of a single line of text.
    pub(crate) fn line_height(&self) -> f32 {
        let v = self.font.v_metrics(self.scale);
        v.ascent - v.descent
    }

    /// Gap between consecutive lines.
    pub(crate) fn line_spacing(&self) -> f32 {
        self.scale.y * LINE_SPACING_RATIO
    }

    /// Height of `lines` stacked lines.
    pub(crate) fn block_height(&self, lines: usize) -> f32 {
        if lines == 0 {
            return 0.0;
        }
        lines as f32 * self.line_height() + (lines - 1) as f32 * self.line_spacing()
    }

    /// Greedy word wrap. Words wider than `max_width` are split between
    /// characters so no line ever exceeds it, unless a single glyph does.
    pub(crate) fn wrap(&self, text: &str, max_width: f32) -> Vec<String> {
        let mut lines = Vec::new();
        let mut current = String::new();

        for word in text.split_whitespace() {
            let pieces = if self.width(word) > max_width {
                self.break_word(word, max_width)
            } else {
                vec![word.to_string()]
            };
            for piece in pieces {
                if current.is_empty() {
                    current = piece;
                    continue;
                }
                let candidate = format!("{current} {piece}");
                if self.width(&candidate) <= max_width {
                    current = candidate;
                } else {
                    lines.push(std::mem::replace(&mut current, piece));
                }
            }
        }
        if !current.is_empty() {
            lines.push(current);
        }
        lines
    }

    fn break_word(&self, word: &str, max_width: f32) -> Vec<String> {
        let mut pieces = Vec::new();
        let mut current = String::new();
        for c in word.chars() {
            current.push(c);
            if self.width(&current) > max_width && current.chars().count() > 1 {
                current.pop();
                pieces.push(std::mem::take(&mut current));
                current.push(c);
            }
        }
        if !current.is_empty() {
            pieces.push(current);
        }
        pieces
    }
}

/// Largest size in `floor..=start` at which `text` wraps into `max_height`.
/// Returns `floor` when nothing fits.
pub(crate) fn fit_font_size(
    font: &Font<'static>,
    text: &str,
    max_width: f32,
    max_height: f32,
    start: f32,
    floor: f32,
) -> f32 {
    let step = (start / 16.0).max(1.0);
    let mut size = start.max(floor);
    loop {
        let measure = Measure::new(font, size);
        let lines = measure.wrap(text, max_width);
        if measure.block_height(lines.len()) <= max_height || size <= floor {
            return size;
        }
        size = (size - step).max(floor);
    }
}
