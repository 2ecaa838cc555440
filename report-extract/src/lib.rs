pub mod dicom;
pub mod error;
pub mod ocr;
pub mod pdf;
pub mod text;

use image::DynamicImage;

// Re-export commonly used types
pub use dicom::convert_dicom;
pub use error::{ExtractionError, Result};
pub use ocr::{OcrEngine, UnavailableOcr, default_engine, extract_image_text, scan_image};
pub use pdf::extract_pdf_text;
pub use text::read_plain_text;

#[cfg(feature = "ocr")]
pub use ocr::TesseractEngine;

/// Content stored in place of extracted text when a document yields nothing readable.
pub const NO_READABLE_TEXT: &str = "⚠ No readable text found in the uploaded file.";

/// Output of exactly one extractor for one uploaded file
#[derive(Debug, Clone)]
pub enum ExtractionResult {
    Text(String),
    Image(DynamicImage),
    /// A photograph or scan together with its OCR text.
    /// `text` is `None` when no OCR engine is available.
    Scan {
        image: DynamicImage,
        text: Option<String>,
    },
}

impl ExtractionResult {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ExtractionResult::Text(text) => Some(text),
            ExtractionResult::Image(_) => None,
            ExtractionResult::Scan { text, .. } => text.as_deref(),
        }
    }

    pub fn image(&self) -> Option<&DynamicImage> {
        match self {
            ExtractionResult::Text(_) => None,
            ExtractionResult::Image(image) | ExtractionResult::Scan { image, .. } => Some(image),
        }
    }

    pub fn is_image(&self) -> bool {
        self.image().is_some()
    }
}

/// Replaces empty or whitespace-only extraction output with [`NO_READABLE_TEXT`].
pub(crate) fn or_placeholder(text: String) -> String {
    if text.trim().is_empty() {
        NO_READABLE_TEXT.to_string()
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_replaces_blank_text() {
        assert_eq!(or_placeholder(String::new()), NO_READABLE_TEXT);
        assert_eq!(or_placeholder(" \n\t ".to_string()), NO_READABLE_TEXT);
        assert_eq!(or_placeholder("BP 120/80".to_string()), "BP 120/80");
    }

    #[test]
    fn test_extraction_result_accessors() {
        let text = ExtractionResult::Text("finding".to_string());
        assert_eq!(text.as_text(), Some("finding"));
        assert!(!text.is_image());

        let image = ExtractionResult::Image(DynamicImage::new_luma8(2, 2));
        assert!(image.as_text().is_none());
        assert!(image.is_image());

        let scan = ExtractionResult::Scan {
            image: DynamicImage::new_rgb8(4, 3),
            text: Some("Left wrist".to_string()),
        };
        assert_eq!(scan.as_text(), Some("Left wrist"));
        assert_eq!(scan.image().map(|i| i.width()), Some(4));

        let unread = ExtractionResult::Scan {
            image: DynamicImage::new_rgb8(4, 3),
            text: None,
        };
        assert!(unread.as_text().is_none());
        assert!(unread.is_image());
    }
}
