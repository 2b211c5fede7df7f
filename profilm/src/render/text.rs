use crate::foundation::core::Rgb8;
use crate::foundation::error::{ProfilmError, ProfilmResult};
use crate::render::frame::Frame;
use fontdue::{Font, FontSettings};
use std::path::Path;

/// Smallest size auto-shrink will go to.
const MIN_PX: f32 = 10.0;

/// Well-known sans-serif locations tried when no font path is configured.
const FALLBACK_FONT_PATHS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/truetype/noto/NotoSans-Regular.ttf",
    "/usr/share/fonts/noto/NotoSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// A loaded font face plus the measuring and painting the rasterizer needs.
#[derive(Debug)]
pub struct Typeface {
    font: Font,
}

impl Typeface {
    /// Parse a face from raw TTF/OTF bytes.
    pub fn from_bytes(bytes: &[u8]) -> ProfilmResult<Self> {
        let font = Font::from_bytes(bytes, FontSettings::default())
            .map_err(|e| ProfilmError::input(format!("parse font: {e}")))?;
        Ok(Self { font })
    }

    /// Load a face from `explicit`, or walk the fallback locations.
    ///
    /// A missing font is an input error: the film cannot render its
    /// monologue without one.
    pub fn load(explicit: Option<&Path>) -> ProfilmResult<Self> {
        if let Some(path) = explicit {
            let bytes = std::fs::read(path).map_err(|e| {
                ProfilmError::input(format!("read font '{}': {e}", path.display()))
            })?;
            return Self::from_bytes(&bytes);
        }
        for path in FALLBACK_FONT_PATHS {
            let Ok(bytes) = std::fs::read(path) else { continue };
            match Self::from_bytes(&bytes) {
                Ok(face) => {
                    tracing::debug!(path, "loaded fallback font");
                    return Ok(face);
                }
                Err(e) => tracing::warn!(path, error = %e, "skipping unusable font"),
            }
        }
        Err(ProfilmError::input(
            "no usable font found in the fallback locations; configure a font path",
        ))
    }

    /// Advance width of `text` at size `px`.
    pub fn measure(&self, text: &str, px: f32) -> f64 {
        text.chars().map(|ch| f64::from(self.font.metrics(ch, px).advance_width)).sum()
    }

    /// Largest size at or below `px` whose measured width fits `max_width`,
    /// found by decrementing one pixel at a time.
    pub fn fit_px(&self, text: &str, px: f32, max_width: f64) -> f32 {
        let mut px = px;
        while px > MIN_PX && self.measure(text, px) > max_width {
            px -= 1.0;
        }
        px
    }

    /// Paint `text` with its left edge at `x` and baseline at `baseline_y`.
    /// Returns the x coordinate after the last glyph.
    pub fn draw(
        &self,
        frame: &mut Frame,
        text: &str,
        x: f64,
        baseline_y: f64,
        px: f32,
        color: Rgb8,
        alpha: f64,
    ) -> f64 {
        let mut cursor = x;
        if alpha <= 0.0 {
            return cursor + self.measure(text, px);
        }
        for ch in text.chars() {
            let (metrics, bitmap) = self.font.rasterize(ch, px);
            let glyph_x = cursor + f64::from(metrics.xmin);
            let glyph_y = baseline_y - f64::from(metrics.height as i32 + metrics.ymin);
            for gy in 0..metrics.height {
                for gx in 0..metrics.width {
                    let coverage = bitmap[gy * metrics.width + gx];
                    if coverage == 0 {
                        continue;
                    }
                    frame.blend_px(
                        glyph_x as i64 + gx as i64,
                        glyph_y as i64 + gy as i64,
                        color,
                        f64::from(coverage) / 255.0 * alpha,
                    );
                }
            }
            cursor += f64::from(metrics.advance_width);
        }
        cursor
    }

    /// Paint `text` horizontally centered on `center_x`.
    pub fn draw_centered(
        &self,
        frame: &mut Frame,
        text: &str,
        center_x: f64,
        baseline_y: f64,
        px: f32,
        color: Rgb8,
        alpha: f64,
    ) {
        let width = self.measure(text, px);
        self.draw(frame, text, center_x - width / 2.0, baseline_y, px, color, alpha);
    }
}
