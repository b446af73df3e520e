use ab_glyph::{Font, FontVec, GlyphId, PxScale, ScaleFont};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{Result, WatermarkError};

/// Scalable outline font used to render watermark text.
///
/// Sizes are given in pixels per em, so a size of 100 yields glyphs whose em
/// square is 100px tall. This is the unit TrueType point sizes map to at
/// 72 dpi.
pub struct WatermarkFont {
    font: FontVec,
    path: PathBuf,
}

impl WatermarkFont {
    pub fn load(path: &Path) -> Result<Self> {
        let font_data = std::fs::read(path).map_err(|e| WatermarkError::FontLoad {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let font = FontVec::try_from_vec(font_data).map_err(|_| WatermarkError::FontLoad {
            path: path.to_path_buf(),
            reason: "Failed to parse font".to_string(),
        })?;
        debug!("Loaded font from {:?}", path);

        Ok(Self {
            font,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn font(&self) -> &FontVec {
        &self.font
    }

    /// Convert an em size into the scale ab_glyph expects, which is measured
    /// from descender to ascender rather than across the em square.
    pub fn px_scale(&self, size: u32) -> PxScale {
        let units_per_em = self.font.units_per_em().unwrap_or(1000.0);
        PxScale::from(size as f32 * self.font.height_unscaled() / units_per_em)
    }

    /// Advance width of `text` at `size`, including kerning.
    pub fn text_width(&self, text: &str, size: u32) -> f32 {
        let scaled = self.font.as_scaled(self.px_scale(size));

        let mut width = 0.0;
        let mut previous: Option<GlyphId> = None;
        for c in text.chars() {
            let glyph_id = scaled.glyph_id(c);
            if let Some(prev) = previous {
                width += scaled.kern(prev, glyph_id);
            }
            width += scaled.h_advance(glyph_id);
            previous = Some(glyph_id);
        }
        width
    }
}
