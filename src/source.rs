use image::{ImageReader, RgbaImage};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::{Result, WatermarkError};

/// A named group of file extensions offered by a file-open prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileFilter {
    pub name: &'static str,
    pub extensions: &'static [&'static str],
}

/// File types the image source accepts.
pub const IMAGE_FILTERS: &[FileFilter] = &[
    FileFilter {
        name: "PNG Image files",
        extensions: &["png"],
    },
    FileFilter {
        name: "JPEG Image files",
        extensions: &["jpg", "jpeg"],
    },
];

/// Something that asks the user for a file. `None` means the user cancelled.
pub trait FilePicker {
    fn pick_file(&self, filters: &[FileFilter]) -> Option<PathBuf>;
}

/// Picker that always answers with a path chosen up front, e.g. on the
/// command line.
#[derive(Debug, Clone, Default)]
pub struct PathPicker {
    path: Option<PathBuf>,
}

impl PathPicker {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    pub fn cancelled() -> Self {
        Self { path: None }
    }
}

impl FilePicker for PathPicker {
    fn pick_file(&self, _filters: &[FileFilter]) -> Option<PathBuf> {
        self.path.clone()
    }
}

/// Native open-file dialog.
#[cfg(feature = "dialog")]
#[derive(Debug, Clone, Default)]
pub struct DialogPicker;

#[cfg(feature = "dialog")]
impl FilePicker for DialogPicker {
    fn pick_file(&self, filters: &[FileFilter]) -> Option<PathBuf> {
        let mut dialog = rfd::FileDialog::new();
        for filter in filters {
            dialog = dialog.add_filter(filter.name, filter.extensions);
        }
        dialog.pick_file()
    }
}

#[derive(Debug)]
pub enum LoadOutcome {
    Loaded { path: PathBuf, image: RgbaImage },
    Cancelled,
}

#[derive(Debug, Clone, Default)]
pub struct ImageSource;

impl ImageSource {
    pub fn new() -> Self {
        Self
    }

    /// Ask the picker for a file and decode it. Cancelling is not an error.
    pub fn load_image(&self, picker: &dyn FilePicker) -> Result<LoadOutcome> {
        let Some(path) = picker.pick_file(IMAGE_FILTERS) else {
            debug!("Image selection cancelled");
            return Ok(LoadOutcome::Cancelled);
        };

        let image = self.decode_path(&path)?;
        Ok(LoadOutcome::Loaded { path, image })
    }

    /// Decode a PNG or JPEG file into RGBA, adding an opaque alpha channel
    /// when the file has none.
    pub fn decode_path(&self, path: &Path) -> Result<RgbaImage> {
        if !is_supported_extension(path) {
            return Err(WatermarkError::UnsupportedFormat(path.to_path_buf()));
        }

        let decode_error = |source: image::ImageError| WatermarkError::Decode {
            path: path.to_path_buf(),
            source,
        };

        // Sniff the content as well so a mislabelled file still decodes
        let reader = ImageReader::open(path)?.with_guessed_format()?;
        let image = reader.decode().map_err(decode_error)?.to_rgba8();

        info!(
            "Loaded image {:?} ({}x{})",
            path,
            image.width(),
            image.height()
        );
        Ok(image)
    }
}

fn is_supported_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            IMAGE_FILTERS
                .iter()
                .flat_map(|filter| filter.extensions.iter())
                .any(|supported| ext.eq_ignore_ascii_case(supported))
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, Rgb, RgbImage, Rgba};
    use tempfile::TempDir;

    #[test]
    fn test_supported_extensions() {
        assert!(is_supported_extension(Path::new("photo.png")));
        assert!(is_supported_extension(Path::new("photo.JPG")));
        assert!(is_supported_extension(Path::new("photo.jpeg")));
        assert!(!is_supported_extension(Path::new("photo.gif")));
        assert!(!is_supported_extension(Path::new("photo")));
    }

    #[test]
    fn test_cancelled_selection() {
        let outcome = ImageSource::new()
            .load_image(&PathPicker::cancelled())
            .unwrap();
        assert!(matches!(outcome, LoadOutcome::Cancelled));
    }

    #[test]
    fn test_load_png_keeps_alpha() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("translucent.png");
        RgbaImage::from_pixel(40, 30, Rgba([10, 20, 30, 77]))
            .save(&path)
            .unwrap();

        let outcome = ImageSource::new()
            .load_image(&PathPicker::new(&path))
            .unwrap();
        match outcome {
            LoadOutcome::Loaded { path: loaded, image } => {
                assert_eq!(loaded, path);
                assert_eq!(image.dimensions(), (40, 30));
                assert_eq!(image.get_pixel(5, 5), &Rgba([10, 20, 30, 77]));
            }
            LoadOutcome::Cancelled => panic!("expected an image"),
        }
    }

    #[test]
    fn test_load_jpeg_adds_opaque_alpha() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("photo.jpg");
        DynamicImage::ImageRgb8(RgbImage::from_pixel(64, 48, Rgb([200, 100, 50])))
            .save(&path)
            .unwrap();

        let image = ImageSource::new().decode_path(&path).unwrap();
        assert_eq!(image.dimensions(), (64, 48));
        assert!(image.pixels().all(|p| p[3] == 255));
    }

    #[test]
    fn test_corrupt_file_is_decode_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("broken.png");
        std::fs::write(&path, b"this is not a png").unwrap();

        let result = ImageSource::new().decode_path(&path);
        assert!(matches!(result, Err(WatermarkError::Decode { .. })));
    }

    #[test]
    fn test_unsupported_extension() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("anim.gif");
        std::fs::write(&path, b"GIF89a").unwrap();

        let result = ImageSource::new().decode_path(&path);
        assert!(matches!(result, Err(WatermarkError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result = ImageSource::new().decode_path(Path::new("nowhere/missing.png"));
        assert!(matches!(result, Err(WatermarkError::Io(_))));
    }
}
