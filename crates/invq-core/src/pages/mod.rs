//! Turning source documents into per-page text.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{InvqError, OcrError};
use crate::models::config::PdfConfig;
use crate::ocr::ImageOcr;
use crate::pdf::{PdfExtractor, PdfProcessor};
use crate::Result;

/// Raw text of one physical page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageText {
    /// File the page came from.
    pub source: String,
    /// Page number within the logical document (1-indexed).
    pub page: u32,
    /// Extracted text, headed by the file name and page number.
    pub text: String,
}

/// Kind of a supported input file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Image,
}

impl DocumentKind {
    /// Detect the kind from the file extension (case-insensitive).
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "pdf" => Some(DocumentKind::Pdf),
            "png" | "jpg" | "jpeg" | "tiff" | "tif" => Some(DocumentKind::Image),
            _ => None,
        }
    }
}

/// Supported files in `dir`, sorted by file name.
pub fn supported_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        if DocumentKind::from_path(&path).is_some() {
            files.push(path);
        } else {
            warn!("Skipping unsupported file: {}", path.display());
        }
    }
    files.sort();
    Ok(files)
}

/// Extracts page text from PDFs (text layer plus OCR of embedded images)
/// and image files (OCR).
pub struct PageExtractor {
    ocr: Option<Box<dyn ImageOcr>>,
    config: PdfConfig,
}

impl PageExtractor {
    /// Create an extractor. Without an OCR engine only PDF text layers are read.
    pub fn new(ocr: Option<Box<dyn ImageOcr>>, config: PdfConfig) -> Self {
        Self { ocr, config }
    }

    /// Whether an OCR engine is available.
    pub fn has_ocr(&self) -> bool {
        self.ocr.is_some()
    }

    /// Extract all pages of `input`.
    ///
    /// A directory is one logical document: its supported files are read
    /// in file name order and pages are numbered consecutively.
    pub fn extract(&self, input: &Path) -> Result<Vec<PageText>> {
        let files = if input.is_dir() {
            supported_files(input)?
        } else {
            vec![input.to_path_buf()]
        };

        let mut pages = Vec::new();
        for file in files {
            let offset = pages.len() as u32;
            let mut file_pages = self.extract_file(&file)?;
            for page in &mut file_pages {
                page.page += offset;
            }
            pages.extend(file_pages);
        }

        info!("Extracted {} pages from {}", pages.len(), input.display());
        Ok(pages)
    }

    /// Extract the pages of a single file, numbered from 1.
    pub fn extract_file(&self, path: &Path) -> Result<Vec<PageText>> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        match DocumentKind::from_path(path) {
            Some(DocumentKind::Pdf) => self.extract_pdf(&name, &fs::read(path)?),
            Some(DocumentKind::Image) => {
                let image = image::open(path)?;
                let text = self.ocr_image(&image)?;
                Ok(vec![PageText {
                    page: 1,
                    text: format!("{}\n{}", page_header(&name, 1), text),
                    source: name,
                }])
            }
            None => Err(InvqError::UnsupportedFile(path.display().to_string())),
        }
    }

    /// Extract the pages of an in-memory PDF.
    pub fn extract_pdf(&self, name: &str, data: &[u8]) -> Result<Vec<PageText>> {
        let pdf = PdfExtractor::from_bytes(data)?;
        let mut texts = pdf.page_texts()?;
        if self.config.max_pages > 0 && texts.len() > self.config.max_pages {
            warn!(
                "{} has {} pages, processing the first {}",
                name,
                texts.len(),
                self.config.max_pages
            );
            texts.truncate(self.config.max_pages);
        }

        let mut pages = Vec::with_capacity(texts.len());
        for (index, layer) in texts.into_iter().enumerate() {
            let number = index as u32 + 1;
            let mut text = format!("{}\n{}", page_header(name, number), layer);

            if self.config.ocr_embedded_images {
                if let Some(ocr) = &self.ocr {
                    self.append_image_text(&pdf, ocr.as_ref(), number, &mut text);
                }
            }

            debug!("{} page {}: {} chars", name, number, text.len());
            pages.push(PageText {
                source: name.to_string(),
                page: number,
                text,
            });
        }
        Ok(pages)
    }

    fn append_image_text(&self, pdf: &PdfExtractor, ocr: &dyn ImageOcr, page: u32, text: &mut String) {
        let images = match pdf.page_images(page) {
            Ok(images) => images,
            Err(e) => {
                warn!("Failed to extract images from page {}: {}", page, e);
                return;
            }
        };

        for (index, image) in images.iter().enumerate() {
            match ocr.recognize(image) {
                Ok(ocr_text) => {
                    text.push_str(&format!("\n--- OCR from Image {} ---\n", index + 1));
                    text.push_str(&ocr_text);
                }
                Err(e) => warn!("OCR failed for image {} on page {}: {}", index + 1, page, e),
            }
        }
    }

    fn ocr_image(&self, image: &image::DynamicImage) -> Result<String> {
        let ocr = self.ocr.as_ref().ok_or_else(|| {
            OcrError::Unavailable("image inputs need OCR models".to_string())
        })?;
        Ok(ocr.recognize(image)?)
    }
}

fn page_header(name: &str, page: u32) -> String {
    format!("=== {} | Page {} ===", name, page)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, RgbImage};
    use pretty_assertions::assert_eq;

    struct FixedOcr(&'static str);

    impl ImageOcr for FixedOcr {
        fn recognize(&self, _image: &DynamicImage) -> std::result::Result<String, OcrError> {
            Ok(self.0.to_string())
        }
    }

    fn write_png(path: &Path) {
        DynamicImage::ImageRgb8(RgbImage::new(4, 4)).save(path).unwrap();
    }

    #[test]
    fn test_document_kind() {
        assert_eq!(DocumentKind::from_path(Path::new("a/b.PDF")), Some(DocumentKind::Pdf));
        assert_eq!(DocumentKind::from_path(Path::new("scan.jpeg")), Some(DocumentKind::Image));
        assert_eq!(DocumentKind::from_path(Path::new("scan.tif")), Some(DocumentKind::Image));
        assert_eq!(DocumentKind::from_path(Path::new("notes.txt")), None);
        assert_eq!(DocumentKind::from_path(Path::new("README")), None);
    }

    #[test]
    fn test_image_file_is_single_page() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.png");
        write_png(&path);

        let extractor = PageExtractor::new(Some(Box::new(FixedOcr("GSTIN 29ABCDE"))), PdfConfig::default());
        let pages = extractor.extract(&path).unwrap();

        assert_eq!(
            pages,
            vec![PageText {
                source: "scan.png".to_string(),
                page: 1,
                text: "=== scan.png | Page 1 ===\nGSTIN 29ABCDE".to_string(),
            }]
        );
    }

    #[test]
    fn test_image_without_ocr_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.png");
        write_png(&path);

        let extractor = PageExtractor::new(None, PdfConfig::default());
        assert!(matches!(
            extractor.extract(&path),
            Err(InvqError::Ocr(OcrError::Unavailable(_)))
        ));
    }

    #[test]
    fn test_directory_pages_numbered_across_files() {
        let dir = tempfile::tempdir().unwrap();
        write_png(&dir.path().join("b_page.png"));
        write_png(&dir.path().join("a_page.png"));
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let extractor = PageExtractor::new(Some(Box::new(FixedOcr("text"))), PdfConfig::default());
        let pages = extractor.extract(dir.path()).unwrap();

        let summary: Vec<_> = pages.iter().map(|p| (p.source.as_str(), p.page)).collect();
        assert_eq!(summary, [("a_page.png", 1), ("b_page.png", 2)]);
    }

    #[test]
    fn test_unsupported_file() {
        let extractor = PageExtractor::new(None, PdfConfig::default());
        assert!(matches!(
            extractor.extract_file(Path::new("invoice.docx")),
            Err(InvqError::UnsupportedFile(_))
        ));
    }
}
