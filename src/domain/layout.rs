//! Greedy word wrapping and vertical centering of a text block.
//!
//! The engine only needs a width for a candidate string, so it is written
//! against [`TextMeasure`] and knows nothing about fonts or pixels.

use super::sanitize::SanitizedText;

/// Width of a run of text in surface units.
pub trait TextMeasure {
    fn measure(&self, text: &str) -> f32;
}

impl<F> TextMeasure for F
where
    F: Fn(&str) -> f32,
{
    fn measure(&self, text: &str) -> f32 {
        self(text)
    }
}

/// A wrapped line together with the point it is centered on.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedLine {
    pub text: String,
    pub x: f32,
    pub y: f32,
}

/// Geometry shared by every line of one layout pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutFrame {
    pub max_width: f32,
    pub line_height: f32,
    pub center_x: f32,
    pub center_y: f32,
}

/// Ordered lines of a rendered block. Never empty.
#[derive(Debug, Clone, PartialEq)]
pub struct LineLayout {
    lines: Vec<PlacedLine>,
    line_height: f32,
}

impl LineLayout {
    pub fn lines(&self) -> &[PlacedLine] {
        &self.lines
    }

    pub fn line_height(&self) -> f32 {
        self.line_height
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Vertical midpoint of the block, measured between the first and last line centers.
    pub fn midpoint_y(&self) -> f32 {
        match (self.lines.first(), self.lines.last()) {
            (Some(first), Some(last)) => (first.y + last.y) / 2.0,
            _ => 0.0,
        }
    }
}

/// Split `text` into lines no wider than `max_width` where possible.
///
/// Words are separated by single spaces and each committed line keeps its
/// trailing space. A word that is wider than `max_width` on its own is
/// placed alone on a line and never broken.
pub fn wrap_lines(text: &str, max_width: f32, measure: &dyn TextMeasure) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split(' ') {
        let candidate = format!("{current}{word} ");
        if measure.measure(&candidate) > max_width && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
            current.push_str(word);
            current.push(' ');
        } else {
            current = candidate;
        }
    }

    lines.push(current);
    lines
}

/// Wrap `text` and center the resulting block on the frame's center point.
pub fn layout(text: &SanitizedText, frame: LayoutFrame, measure: &dyn TextMeasure) -> LineLayout {
    let wrapped = wrap_lines(text.as_str(), frame.max_width, measure);

    let total_height = wrapped.len() as f32 * frame.line_height;
    let start_y = frame.center_y - total_height / 2.0 + frame.line_height / 2.0;

    let lines = wrapped
        .into_iter()
        .enumerate()
        .map(|(index, text)| PlacedLine {
            text,
            x: frame.center_x,
            y: start_y + index as f32 * frame.line_height,
        })
        .collect();

    LineLayout {
        lines,
        line_height: frame.line_height,
    }
}
