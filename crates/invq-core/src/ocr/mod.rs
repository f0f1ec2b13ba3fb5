//! OCR for scanned pages and images embedded in PDFs.

#[cfg(feature = "ocr")]
mod pure_engine;

#[cfg(feature = "ocr")]
pub use pure_engine::PureOcrEngine;

use image::DynamicImage;

use crate::error::OcrError;
use crate::models::config::OcrConfig;

/// Anything that can turn an image into text.
pub trait ImageOcr {
    /// Recognize the text in `image`, lines in reading order.
    fn recognize(&self, image: &DynamicImage) -> Result<String, OcrError>;
}

impl<T: ImageOcr + ?Sized> ImageOcr for Box<T> {
    fn recognize(&self, image: &DynamicImage) -> Result<String, OcrError> {
        (**self).recognize(image)
    }
}

/// Build the OCR engine described by `config`.
///
/// Returns `Ok(None)` when OCR is disabled or the model files are missing,
/// so callers can fall back to text layers only.
pub fn engine_from_config(config: &OcrConfig) -> Result<Option<Box<dyn ImageOcr>>, OcrError> {
    if !config.enabled {
        return Ok(None);
    }
    if !config.models_present() {
        tracing::warn!(
            "OCR models not found in {}, continuing without OCR",
            config.model_dir.display()
        );
        return Ok(None);
    }
    build_engine(config)
}

#[cfg(feature = "ocr")]
fn build_engine(config: &OcrConfig) -> Result<Option<Box<dyn ImageOcr>>, OcrError> {
    Ok(Some(Box::new(PureOcrEngine::from_config(config)?)))
}

#[cfg(not(feature = "ocr"))]
fn build_engine(_config: &OcrConfig) -> Result<Option<Box<dyn ImageOcr>>, OcrError> {
    tracing::warn!("invq-core was built without the `ocr` feature, continuing without OCR");
    Ok(None)
}
