use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

pub mod compositor;
pub mod error;
pub mod font;
pub mod present;
pub mod session;
pub mod source;
pub mod startup_checks;

pub use compositor::{Compositor, FontFit, alpha_composite};
pub use error::{Result, WatermarkError};
pub use font::WatermarkFont;
pub use present::{Presenter, SavePresenter};
pub use session::Session;
pub use source::{FilePicker, ImageSource, LoadOutcome, PathPicker};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub font: FontConfig,
    #[serde(default)]
    pub watermark: WatermarkConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FontConfig {
    pub path: PathBuf,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WatermarkConfig {
    pub color: [u8; 3],
    /// Alpha of the rendered text, 0 (invisible) to 255 (opaque)
    pub opacity: u8,
    /// Maximum ratio of text width to image width
    pub target_fraction: f32,
    pub initial_font_size: u32,
    pub initial_step: u32,
    pub max_iterations: u32,
    /// Upper clamp for the fitted size. Falls back to the image height.
    pub max_font_size: Option<u32>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OutputConfig {
    pub jpeg_quality: u8,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            font: FontConfig::default(),
            watermark: WatermarkConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

impl Default for FontConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("static/DejaVuSans.ttf"),
        }
    }
}

impl Default for WatermarkConfig {
    fn default() -> Self {
        Self {
            color: [255, 255, 255],
            opacity: 130,
            target_fraction: 0.5,
            initial_font_size: 1,
            initial_step: 75,
            max_iterations: 64,
            max_font_size: None,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { jpeg_quality: 90 }
    }
}

impl Config {
    /// Load from a TOML file, or fall back to defaults when the file is absent.
    pub fn load(path: &Path) -> Result<Self> {
        let config = if path.exists() {
            let content = std::fs::read_to_string(path)?;
            toml_edit::de::from_str::<Config>(&content)?
        } else {
            info!("Config file not found at {:?}, using defaults", path);
            Config::default()
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let wm = &self.watermark;
        if !(wm.target_fraction > 0.0 && wm.target_fraction <= 1.0) {
            return Err(WatermarkError::InvalidConfig(format!(
                "target_fraction must be in (0, 1], got {}",
                wm.target_fraction
            )));
        }
        // A step of 1 would end the search before the first measurement
        if wm.initial_step < 2 {
            return Err(WatermarkError::InvalidConfig(format!(
                "initial_step must be at least 2, got {}",
                wm.initial_step
            )));
        }
        if wm.initial_font_size == 0 {
            return Err(WatermarkError::InvalidConfig(
                "initial_font_size must be positive".to_string(),
            ));
        }
        if wm.max_font_size == Some(0) {
            return Err(WatermarkError::InvalidConfig(
                "max_font_size must be positive".to_string(),
            ));
        }
        if !(1..=100).contains(&self.output.jpeg_quality) {
            return Err(WatermarkError::InvalidConfig(format!(
                "jpeg_quality must be between 1 and 100, got {}",
                self.output.jpeg_quality
            )));
        }
        Ok(())
    }
}
