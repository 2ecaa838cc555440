use std::sync::Arc;

use image::DynamicImage;
use tracing::{info, warn};

use crate::{
    ExtractionResult,
    error::{ExtractionError, Result},
    or_placeholder,
};

/// Optical character recognition backend.
pub trait OcrEngine: Send + Sync {
    /// Recognise the text in a decoded image.
    fn recognize(&self, image: &DynamicImage) -> Result<String>;
}

/// Decode an uploaded image and run it through `engine`.
///
/// The recognised text is trimmed; nothing recognisable yields [`crate::NO_READABLE_TEXT`].
pub fn extract_image_text(bytes: &[u8], engine: &dyn OcrEngine) -> Result<String> {
    let image = image::load_from_memory(bytes)?;
    recognize_text(&image, engine)
}

/// Decode an uploaded photograph or scan, keeping the pixels next to its OCR text.
///
/// Builds without an OCR engine still return the image, with no text.
pub fn scan_image(bytes: &[u8], engine: &dyn OcrEngine) -> Result<ExtractionResult> {
    let image = image::load_from_memory(bytes)?;
    let text = match recognize_text(&image, engine) {
        Ok(text) => Some(text),
        Err(ExtractionError::OcrUnavailable) => {
            warn!("OCR unavailable, keeping the image without text");
            None
        }
        Err(e) => return Err(e),
    };
    Ok(ExtractionResult::Scan { image, text })
}

fn recognize_text(image: &DynamicImage, engine: &dyn OcrEngine) -> Result<String> {
    info!("Running OCR on {}x{} image", image.width(), image.height());
    let text = engine.recognize(image)?;
    Ok(or_placeholder(text.trim().to_string()))
}

/// Engine used when the crate is built without the `ocr` feature.
pub struct UnavailableOcr;

impl OcrEngine for UnavailableOcr {
    fn recognize(&self, _image: &DynamicImage) -> Result<String> {
        Err(ExtractionError::OcrUnavailable)
    }
}

/// Tesseract engine, English only.
#[cfg(feature = "ocr")]
pub struct TesseractEngine;

#[cfg(feature = "ocr")]
impl OcrEngine for TesseractEngine {
    fn recognize(&self, image: &DynamicImage) -> Result<String> {
        let mut png = Vec::new();
        image.write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)?;

        let mut tess = tesseract::Tesseract::new(None, Some("eng"))
            .map_err(|e| ExtractionError::Ocr(format!("{e:?}")))?
            .set_image_from_mem(&png)
            .map_err(|e| ExtractionError::Ocr(format!("{e:?}")))?;

        tess.get_text()
            .map_err(|e| ExtractionError::Ocr(format!("{e:?}")))
    }
}

/// The best engine this build offers.
#[cfg(feature = "ocr")]
pub fn default_engine() -> Arc<dyn OcrEngine> {
    Arc::new(TesseractEngine)
}

#[cfg(not(feature = "ocr"))]
pub fn default_engine() -> Arc<dyn OcrEngine> {
    tracing::warn!("Built without the `ocr` feature, image text recognition is disabled");
    Arc::new(UnavailableOcr)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NO_READABLE_TEXT;
    use image::ImageFormat;
    use std::io::Cursor;

    struct FixedOcr(&'static str);

    impl OcrEngine for FixedOcr {
        fn recognize(&self, _image: &DynamicImage) -> Result<String> {
            Ok(self.0.to_string())
        }
    }

    fn png_bytes() -> Vec<u8> {
        let mut buffer = Vec::new();
        DynamicImage::new_rgb8(16, 8)
            .write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
            .unwrap();
        buffer
    }

    #[test]
    fn test_ocr_text_is_trimmed() {
        let text = extract_image_text(&png_bytes(), &FixedOcr("\n  WBC 6.1  \n")).unwrap();
        assert_eq!(text, "WBC 6.1");
    }

    #[test]
    fn test_image_without_text_yields_placeholder() {
        let text = extract_image_text(&png_bytes(), &FixedOcr("  \n")).unwrap();
        assert_eq!(text, NO_READABLE_TEXT);
    }

    #[test]
    fn test_undecodable_image_is_an_error() {
        let result = extract_image_text(b"not an image", &FixedOcr("ignored"));
        assert!(matches!(result, Err(ExtractionError::ImageDecode(_))));
    }

    #[test]
    fn test_unavailable_engine_reports_error() {
        let result = extract_image_text(&png_bytes(), &UnavailableOcr);
        assert!(matches!(result, Err(ExtractionError::OcrUnavailable)));
    }

    #[test]
    fn test_scan_keeps_image_and_text() {
        let scan =
            scan_image(&png_bytes(), &FixedOcr(" Fracture of the left radius \n")).unwrap();
        match scan {
            ExtractionResult::Scan { image, text } => {
                assert_eq!((image.width(), image.height()), (16, 8));
                assert_eq!(text.as_deref(), Some("Fracture of the left radius"));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_scan_without_ocr_engine_keeps_image() {
        let scan = scan_image(&png_bytes(), &UnavailableOcr).unwrap();
        assert!(scan.is_image());
        assert!(scan.as_text().is_none());
    }

    #[test]
    fn test_scan_of_blank_image_yields_placeholder() {
        let scan = scan_image(&png_bytes(), &FixedOcr("\n")).unwrap();
        assert_eq!(scan.as_text(), Some(NO_READABLE_TEXT));
    }

    #[test]
    fn test_scan_of_undecodable_bytes_is_an_error() {
        let result = scan_image(b"not an image", &UnavailableOcr);
        assert!(matches!(result, Err(ExtractionError::ImageDecode(_))));
    }
}
