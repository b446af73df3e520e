use ab_glyph::{Font, GlyphId, ScaleFont, point};
use image::{Rgba, RgbaImage};
use imageproc::map::map_colors2;
use tracing::{debug, info, warn};

use crate::WatermarkConfig;
use crate::error::{Result, WatermarkError};
use crate::font::WatermarkFont;

/// Smallest size the fitting search will ever hand to the renderer.
const MIN_FONT_SIZE: u32 = 1;

/// Result of fitting the watermark text to an image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FontFit {
    pub font_size: u32,
    /// Rendered width of the text at `font_size`
    pub text_width: f32,
    /// Growth stopped at the upper size clamp
    pub capped: bool,
    /// Text is wider than the target even at the minimum size
    pub degraded: bool,
    /// The iteration guard ended the search before the step reached 1
    pub exhausted: bool,
}

/// Renders centered, semi-transparent text over an image.
pub struct Compositor {
    font: WatermarkFont,
    config: WatermarkConfig,
}

impl Compositor {
    pub fn new(font: WatermarkFont, config: WatermarkConfig) -> Self {
        Self { font, config }
    }

    /// Find the size at which `text` spans about `target_fraction` of the
    /// image width.
    ///
    /// Grows by `initial_step` while the text is narrower than the target.
    /// On overshoot the step is halved and the size backs off by the new
    /// step. Stops once the step reaches 1, so the result lands in the
    /// neighborhood of the largest fitting size rather than exactly on it.
    ///
    /// Growth can take up to `max_size / initial_step` iterations before the
    /// size cap ends it, so the iteration guard allows that many on top of
    /// `max_iterations`.
    pub fn fit_font(&self, text: &str, width: u32, height: u32) -> FontFit {
        let target = self.config.target_fraction * width as f32;
        let max_size = self
            .config
            .max_font_size
            .unwrap_or(height)
            .max(MIN_FONT_SIZE);

        let mut size = i64::from(self.config.initial_font_size.clamp(MIN_FONT_SIZE, max_size));
        let mut step = i64::from(self.config.initial_step);
        let iteration_limit = self
            .config
            .max_iterations
            .saturating_add(max_size.div_ceil(self.config.initial_step.max(1)));
        let mut capped = false;
        let mut exhausted = false;
        let mut iterations = 0;

        while step > 1 {
            let measured = self.font.text_width(text, size as u32);
            debug!(
                "Fitting iteration {}: size={} step={} width={:.1} target={:.1}",
                iterations, size, step, measured, target
            );

            if measured < target {
                if size >= i64::from(max_size) {
                    capped = true;
                    break;
                }
                size += step;
            } else {
                step /= 2;
                size -= step;
            }
            size = size.clamp(i64::from(MIN_FONT_SIZE), i64::from(max_size));

            iterations += 1;
            if step > 1 && iterations >= iteration_limit {
                exhausted = true;
                warn!(
                    "Font fitting stopped after {} iterations at size {}",
                    iterations, size
                );
                break;
            }
        }

        let font_size = size as u32;
        let text_width = self.font.text_width(text, font_size);
        let degraded = font_size == MIN_FONT_SIZE && text_width > target;

        if capped {
            warn!(
                "Watermark text capped at font size {} (width {:.1} of target {:.1})",
                font_size, text_width, target
            );
        }
        if degraded {
            warn!(
                "Watermark text is wider than {:.1}px even at font size {}",
                target, font_size
            );
        }

        FontFit {
            font_size,
            text_width,
            capped,
            degraded,
            exhausted,
        }
    }

    /// Top-left draw position. Vertical centering uses the font size as the
    /// text height.
    pub fn text_origin(&self, fit: &FontFit, width: u32, height: u32) -> (i32, i32) {
        let x = (width as f32 - fit.text_width) / 2.0;
        let y = (height as f32 - fit.font_size as f32) / 2.0;
        (x.round() as i32, y.round() as i32)
    }

    /// Draw the text onto a fully transparent canvas of the given size.
    ///
    /// Glyph coverage scales the configured opacity, so only inked pixels
    /// end up with a non-zero alpha. The color channels are the watermark
    /// color everywhere.
    pub fn render_overlay(&self, text: &str, fit: &FontFit, width: u32, height: u32) -> RgbaImage {
        let [r, g, b] = self.config.color;
        let mut overlay = RgbaImage::from_pixel(width, height, Rgba([r, g, b, 0]));
        let (x, y) = self.text_origin(fit, width, height);
        let opacity = f32::from(self.config.opacity);

        let scale = self.font.px_scale(fit.font_size);
        let scaled = self.font.font().as_scaled(scale);

        // y is the top of the line; glyphs sit on the baseline below it
        let mut caret = point(x as f32, y as f32 + scaled.ascent());
        let mut previous: Option<GlyphId> = None;

        for c in text.chars() {
            let glyph_id = scaled.glyph_id(c);
            if let Some(prev) = previous {
                caret.x += scaled.kern(prev, glyph_id);
            }
            let glyph = glyph_id.with_scale_and_position(scale, caret);
            caret.x += scaled.h_advance(glyph_id);
            previous = Some(glyph_id);

            let Some(outlined) = scaled.outline_glyph(glyph) else {
                continue;
            };
            let bounds = outlined.px_bounds();
            outlined.draw(|gx, gy, coverage| {
                let px = bounds.min.x as i64 + i64::from(gx);
                let py = bounds.min.y as i64 + i64::from(gy);
                if px < 0 || py < 0 || px >= i64::from(width) || py >= i64::from(height) {
                    return;
                }

                let alpha = (coverage.clamp(0.0, 1.0) * opacity).round() as u8;
                let pixel = overlay.get_pixel_mut(px as u32, py as u32);
                // Neighbouring glyphs may overlap at the edges
                pixel[3] = pixel[3].max(alpha);
            });
        }

        overlay
    }

    /// Produce a watermarked copy of `base`. The base image is not modified.
    pub fn watermark(&self, base: &RgbaImage, text: &str) -> Result<RgbaImage> {
        if text.is_empty() {
            return Err(WatermarkError::EmptyText);
        }

        let (width, height) = base.dimensions();
        let fit = self.fit_font(text, width, height);
        info!(
            "Fitted watermark {:?} at font size {} ({:.1}px wide on a {}x{} image)",
            text, fit.font_size, fit.text_width, width, height
        );

        let overlay = self.render_overlay(text, &fit, width, height);
        Ok(alpha_composite(base, &overlay))
    }
}

/// Porter-Duff "over": `overlay` on top of `base`, using the overlay's own
/// per-pixel alpha. Both images must have the same dimensions.
///
/// Color channels are rounded, so a fully transparent overlay pixel leaves
/// the base pixel exactly as it was.
pub fn alpha_composite(base: &RgbaImage, overlay: &RgbaImage) -> RgbaImage {
    map_colors2(base, overlay, blend_over)
}

fn blend_over(bottom: Rgba<u8>, top: Rgba<u8>) -> Rgba<u8> {
    if top[3] == 0 {
        return bottom;
    }
    let top_alpha = f32::from(top[3]) / 255.0;
    let bottom_alpha = f32::from(bottom[3]) / 255.0;

    let out_alpha = top_alpha + bottom_alpha * (1.0 - top_alpha);
    let channel = |t: u8, b: u8| {
        let premultiplied =
            f32::from(t) * top_alpha + f32::from(b) * bottom_alpha * (1.0 - top_alpha);
        (premultiplied / out_alpha).round().clamp(0.0, 255.0) as u8
    };

    Rgba([
        channel(top[0], bottom[0]),
        channel(top[1], bottom[1]),
        channel(top[2], bottom[2]),
        (out_alpha * 255.0).round().clamp(0.0, 255.0) as u8,
    ])
}
