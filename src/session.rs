use image::RgbaImage;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::compositor::Compositor;
use crate::error::{Result, WatermarkError};
use crate::source::{FilePicker, ImageSource, LoadOutcome};

/// The image currently being worked on.
struct CurrentImage {
    path: PathBuf,
    image: RgbaImage,
}

/// Holds at most one loaded image and watermarks it on request.
///
/// A new load replaces the current image only when it succeeds; a cancelled
/// selection or a decode failure leaves the session as it was.
pub struct Session {
    compositor: Compositor,
    current: Option<CurrentImage>,
}

impl Session {
    pub fn new(compositor: Compositor) -> Self {
        Self {
            compositor,
            current: None,
        }
    }

    pub fn image(&self) -> Option<&RgbaImage> {
        self.current.as_ref().map(|current| &current.image)
    }

    pub fn image_path(&self) -> Option<&Path> {
        self.current.as_ref().map(|current| current.path.as_path())
    }

    /// Returns `true` when a new image was loaded.
    pub fn load(&mut self, source: &ImageSource, picker: &dyn FilePicker) -> Result<bool> {
        match source.load_image(picker)? {
            LoadOutcome::Loaded { path, image } => {
                info!("Session image replaced with {:?}", path);
                self.current = Some(CurrentImage { path, image });
                Ok(true)
            }
            LoadOutcome::Cancelled => {
                debug!("No image selected, keeping current session image");
                Ok(false)
            }
        }
    }

    pub fn clear(&mut self) {
        self.current = None;
    }

    pub fn watermark(&self, text: &str) -> Result<RgbaImage> {
        let Some(current) = &self.current else {
            return Err(WatermarkError::NoImage);
        };
        if text.is_empty() {
            return Err(WatermarkError::EmptyText);
        }

        self.compositor.watermark(&current.image, text)
    }
}
