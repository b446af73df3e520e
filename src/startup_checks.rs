use crate::Config;
use crate::error::WatermarkError;
use crate::font::WatermarkFont;
use thiserror::Error;
use tracing::{error, info};

#[derive(Debug, Error)]
pub enum StartupCheckError {
    #[error("Font resource missing: {0:?}")]
    FontMissing(std::path::PathBuf),

    #[error("Font resource unusable: {0}")]
    FontUnusable(WatermarkError),

    #[error("Configuration rejected: {0}")]
    InvalidConfig(WatermarkError),
}

impl StartupCheckError {
    /// There is no fallback font, so any font problem stops the program.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            StartupCheckError::FontMissing(_) | StartupCheckError::FontUnusable(_)
        )
    }
}

pub fn perform_startup_checks(config: &Config) -> Result<(), Vec<StartupCheckError>> {
    let mut errors = Vec::new();

    info!("Performing startup checks...");

    if let Err(e) = config.validate() {
        error!("Configuration is invalid: {}", e);
        errors.push(StartupCheckError::InvalidConfig(e));
    }

    let font_path = &config.font.path;
    if !font_path.exists() {
        error!("Font file does not exist: {:?}", font_path);
        errors.push(StartupCheckError::FontMissing(font_path.clone()));
    } else {
        match WatermarkFont::load(font_path) {
            Ok(font) => info!("Font loaded: {:?}", font.path()),
            Err(e) => {
                error!("Font file could not be loaded: {}", e);
                errors.push(StartupCheckError::FontUnusable(e));
            }
        }
    }

    if errors.is_empty() {
        info!("All startup checks passed");
        Ok(())
    } else {
        error!("Startup checks failed with {} errors", errors.len());
        Err(errors)
    }
}
