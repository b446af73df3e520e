use image::codecs::{jpeg::JpegEncoder, png::PngEncoder};
use image::{DynamicImage, ImageEncoder, RgbaImage};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::{Result, WatermarkError};

/// Receives the finished image, e.g. to display or store it.
pub trait Presenter {
    fn present(&self, image: &RgbaImage) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Png,
    Jpeg,
}

impl OutputFormat {
    fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "png" => Some(OutputFormat::Png),
            "jpg" | "jpeg" => Some(OutputFormat::Jpeg),
            _ => None,
        }
    }
}

/// Writes the result to a file. The format follows the file extension;
/// JPEG output is flattened to RGB since it has no alpha channel.
#[derive(Debug, Clone)]
pub struct SavePresenter {
    path: PathBuf,
    jpeg_quality: u8,
}

impl SavePresenter {
    pub fn new(path: impl Into<PathBuf>, jpeg_quality: u8) -> Self {
        Self {
            path: path.into(),
            jpeg_quality,
        }
    }

    /// `photo.jpg` becomes `photo_watermarked.png` in the same directory.
    pub fn default_output_path(input: &Path) -> PathBuf {
        let stem = input
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("image");
        input.with_file_name(format!("{}_watermarked.png", stem))
    }

    fn save_error(&self, source: image::ImageError) -> WatermarkError {
        WatermarkError::Save {
            path: self.path.clone(),
            source,
        }
    }
}

impl Presenter for SavePresenter {
    fn present(&self, image: &RgbaImage) -> Result<()> {
        let format = OutputFormat::from_path(&self.path)
            .ok_or_else(|| WatermarkError::UnsupportedFormat(self.path.clone()))?;
        let output = BufWriter::new(File::create(&self.path)?);

        match format {
            OutputFormat::Png => {
                PngEncoder::new(output)
                    .write_image(
                        image,
                        image.width(),
                        image.height(),
                        image::ExtendedColorType::Rgba8,
                    )
                    .map_err(|e| self.save_error(e))?;
            }
            OutputFormat::Jpeg => {
                let rgb_image = DynamicImage::ImageRgba8(image.clone()).to_rgb8();
                JpegEncoder::new_with_quality(output, self.jpeg_quality)
                    .write_image(
                        &rgb_image,
                        rgb_image.width(),
                        rgb_image.height(),
                        image::ExtendedColorType::Rgb8,
                    )
                    .map_err(|e| self.save_error(e))?;
                debug!("JPEG written at quality {}", self.jpeg_quality);
            }
        }

        info!(
            "Saved watermarked image to {:?} ({}x{})",
            self.path,
            image.width(),
            image.height()
        );
        Ok(())
    }
}
