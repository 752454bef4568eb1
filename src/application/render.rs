//! Draws a reason onto a fixed-size surface.
//!
//! The renderer owns no mutable state: faces are resolved once when it is
//! built, and every call to [`Renderer::render`] produces a fresh surface.

use std::{borrow::Cow, sync::Arc};

use ab_glyph::{Font, FontArc, PxScale, PxScaleFont, ScaleFont, point};
use image::{Rgba, RgbaImage};
use tracing::warn;

use crate::{
    domain::{
        error::DomainError,
        layout::{LayoutFrame, LineLayout, PlacedLine, TextMeasure, layout},
        sanitize::SanitizedText,
        theme::{
            DEFAULT_BACKGROUND, DEFAULT_TEXT, GENERIC_SANS_SERIF, HexColor, RenderProfile, Theme,
            Variant,
        },
    },
    infra::fonts::{FontRegistry, FontWeight},
};

pub const DEFAULT_PADDING_FRACTION: f32 = 0.1;
const LINE_SPACING: f32 = 1.2;
/// Average advance of a glyph relative to the font size when no face is available.
const APPROX_ADVANCE: f32 = 0.6;

/// Dimensions and profile of one render. Both sides are non-zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderRequest {
    width: u32,
    height: u32,
    profile: RenderProfile,
}

impl RenderRequest {
    pub fn new(width: u32, height: u32, profile: RenderProfile) -> Result<Self, DomainError> {
        if width == 0 || height == 0 {
            return Err(DomainError::validation(format!(
                "surface must be non-empty, got {width}x{height}"
            )));
        }
        Ok(Self {
            width,
            height,
            profile,
        })
    }

    pub fn for_variant(variant: Variant, profile: RenderProfile) -> Self {
        let (width, height) = variant.dimensions();
        Self {
            width,
            height,
            profile,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn profile(&self) -> RenderProfile {
        self.profile
    }

    /// `floor(width / divisor)`, never below one pixel.
    pub fn font_size(&self) -> f32 {
        (self.width / self.profile.font_divisor()).max(1) as f32
    }
}

pub struct Renderer {
    theme: Arc<Theme>,
    themed_face: Option<FontArc>,
    plain_face: Option<FontArc>,
    padding_fraction: f32,
}

impl Renderer {
    pub fn new(fonts: &FontRegistry, theme: Arc<Theme>, padding_fraction: f32) -> Self {
        let themed_face = fonts.resolve(&theme.font_family, FontWeight::Regular);
        let plain_face = fonts
            .resolve(GENERIC_SANS_SERIF, FontWeight::Bold)
            .or_else(|| themed_face.clone());

        if themed_face.is_none() {
            warn!(
                target = "naas::render",
                family = %theme.font_family,
                "no usable font face; cards will show the background only"
            );
        }

        Self {
            theme,
            themed_face,
            plain_face,
            padding_fraction,
        }
    }

    /// Compute line positions for `text` without drawing anything.
    pub fn layout(&self, request: &RenderRequest, text: &SanitizedText) -> LineLayout {
        let style = self.style(request, text);
        let frame = self.frame(request);
        match style.face {
            Some(face) => layout(
                &style.text,
                frame,
                &GlyphMeasure::new(face, request.font_size()),
            ),
            None => layout(
                &style.text,
                frame,
                &ApproxMeasure::new(request.font_size()),
            ),
        }
    }

    /// Draw `text` onto a new surface of the requested size.
    pub fn render(&self, request: &RenderRequest, text: &SanitizedText) -> RgbaImage {
        let style = self.style(request, text);
        let background = Rgba(style.background.to_rgba());
        let mut surface = RgbaImage::from_pixel(request.width, request.height, background);

        let Some(face) = style.face else {
            return surface;
        };

        let metrics = GlyphMeasure::new(face, request.font_size());
        let lines = layout(&style.text, self.frame(request), &metrics);
        for line in lines.lines() {
            draw_line(&mut surface, &metrics, line, style.color);
        }
        surface
    }

    fn style<'a>(&'a self, request: &RenderRequest, text: &'a SanitizedText) -> Style<'a> {
        match request.profile {
            RenderProfile::Themed => Style {
                background: self.theme.background,
                color: self.theme.text,
                face: self.themed_face.as_ref(),
                text: Cow::Borrowed(text),
            },
            RenderProfile::Plain => Style {
                background: DEFAULT_BACKGROUND,
                color: DEFAULT_TEXT,
                face: self.plain_face.as_ref(),
                text: Cow::Owned(text.to_uppercase()),
            },
        }
    }

    fn frame(&self, request: &RenderRequest) -> LayoutFrame {
        let width = request.width as f32;
        LayoutFrame {
            max_width: width * (1.0 - 2.0 * self.padding_fraction),
            line_height: request.font_size() * LINE_SPACING,
            center_x: width / 2.0,
            center_y: request.height as f32 / 2.0,
        }
    }
}

struct Style<'a> {
    background: HexColor,
    color: HexColor,
    face: Option<&'a FontArc>,
    text: Cow<'a, SanitizedText>,
}

/// Advance widths of a real face at a given em size.
struct GlyphMeasure<'a> {
    font: PxScaleFont<&'a FontArc>,
}

impl<'a> GlyphMeasure<'a> {
    fn new(face: &'a FontArc, font_size: f32) -> Self {
        // PxScale is the ascent-to-descent height; convert so one em equals `font_size` pixels.
        let height = face.height_unscaled();
        let units_per_em = face.units_per_em().unwrap_or(height);
        let scale = PxScale::from(font_size * height / units_per_em);
        Self {
            font: face.as_scaled(scale),
        }
    }
}

impl TextMeasure for GlyphMeasure<'_> {
    fn measure(&self, text: &str) -> f32 {
        let mut width = 0.0;
        let mut previous = None;
        for ch in text.chars() {
            let id = self.font.glyph_id(ch);
            if let Some(prev) = previous {
                width += self.font.kern(prev, id);
            }
            width += self.font.h_advance(id);
            previous = Some(id);
        }
        width
    }
}

struct ApproxMeasure {
    advance: f32,
}

impl ApproxMeasure {
    fn new(font_size: f32) -> Self {
        Self {
            advance: font_size * APPROX_ADVANCE,
        }
    }
}

impl TextMeasure for ApproxMeasure {
    fn measure(&self, text: &str) -> f32 {
        text.chars().count() as f32 * self.advance
    }
}

/// Draw one line horizontally centered on `line.x` with its em box centered on `line.y`.
fn draw_line(
    surface: &mut RgbaImage,
    metrics: &GlyphMeasure<'_>,
    line: &PlacedLine,
    color: HexColor,
) {
    let font = &metrics.font;
    let width = metrics.measure(&line.text);
    let baseline = line.y + (font.ascent() + font.descent()) / 2.0;
    let color = color.to_rgba();
    let (surface_w, surface_h) = (i64::from(surface.width()), i64::from(surface.height()));

    let mut caret = line.x - width / 2.0;
    let mut previous = None;
    for ch in line.text.chars() {
        let id = font.glyph_id(ch);
        if let Some(prev) = previous {
            caret += font.kern(prev, id);
        }
        let glyph = id.with_scale_and_position(font.scale, point(caret, baseline));
        caret += font.h_advance(id);
        previous = Some(id);

        let Some(outlined) = font.font.outline_glyph(glyph) else {
            continue;
        };
        let bounds = outlined.px_bounds();
        outlined.draw(|x, y, coverage| {
            let px = bounds.min.x as i64 + i64::from(x);
            let py = bounds.min.y as i64 + i64::from(y);
            if px < 0 || py < 0 || px >= surface_w || py >= surface_h {
                return;
            }
            blend(surface.get_pixel_mut(px as u32, py as u32), color, coverage);
        });
    }
}

fn blend(pixel: &mut Rgba<u8>, color: [u8; 4], coverage: f32) {
    let alpha = coverage.clamp(0.0, 1.0);
    for channel in 0..3 {
        let over = f32::from(color[channel]) * alpha;
        let under = f32::from(pixel[channel]) * (1.0 - alpha);
        pixel[channel] = (over + under).round() as u8;
    }
}
