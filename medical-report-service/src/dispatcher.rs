use report_extract::{
    ExtractionResult, OcrEngine, convert_dicom, extract_pdf_text, read_plain_text, scan_image,
};
use tracing::info;

use crate::upload::normalize_mime;

/// Extractor selected for a declared MIME type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Pdf,
    PlainText,
    Image,
    Dicom,
}

impl FileKind {
    /// `None` when no extractor handles the declared type.
    pub fn classify(declared_type: &str) -> Option<Self> {
        let mime = normalize_mime(declared_type);
        match mime.as_str() {
            "application/pdf" => Some(FileKind::Pdf),
            "text/plain" => Some(FileKind::PlainText),
            "application/dicom" => Some(FileKind::Dicom),
            m if m.starts_with("image/") => Some(FileKind::Image),
            _ => None,
        }
    }
}

pub fn unsupported_message(file_name: &str, declared_type: &str) -> String {
    format!(
        "⚠ Unsupported file type: {} ({}). Please upload a PDF, TXT, PNG, JPG, or DICOM file.",
        file_name, declared_type
    )
}

/// Run the extractor for `kind`. Blocking: call from a worker thread.
pub fn extract(
    kind: FileKind,
    bytes: &[u8],
    ocr: &dyn OcrEngine,
) -> report_extract::Result<ExtractionResult> {
    info!("Dispatching {} bytes to {:?} extractor", bytes.len(), kind);

    match kind {
        FileKind::Pdf => extract_pdf_text(bytes).map(ExtractionResult::Text),
        FileKind::PlainText => Ok(ExtractionResult::Text(read_plain_text(bytes))),
        FileKind::Image => scan_image(bytes, ocr),
        FileKind::Dicom => convert_dicom(bytes).map(ExtractionResult::Image),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageFormat};
    use report_extract::{ExtractionError, NO_READABLE_TEXT, UnavailableOcr};
    use std::io::Cursor;

    #[test]
    fn test_classification() {
        assert_eq!(FileKind::classify("application/pdf"), Some(FileKind::Pdf));
        assert_eq!(
            FileKind::classify("text/plain; charset=utf-8"),
            Some(FileKind::PlainText)
        );
        assert_eq!(FileKind::classify("image/png"), Some(FileKind::Image));
        assert_eq!(FileKind::classify("IMAGE/JPEG"), Some(FileKind::Image));
        assert_eq!(FileKind::classify("application/dicom"), Some(FileKind::Dicom));
        assert_eq!(FileKind::classify("application/zip"), None);
        assert_eq!(FileKind::classify(""), None);
    }

    #[test]
    fn test_plain_text_passes_through() {
        let result = extract(FileKind::PlainText, b"Cholesterol 5.2", &UnavailableOcr).unwrap();
        assert_eq!(result.as_text(), Some("Cholesterol 5.2"));

        let blank = extract(FileKind::PlainText, b"   ", &UnavailableOcr).unwrap();
        assert_eq!(blank.as_text(), Some(NO_READABLE_TEXT));
    }

    #[test]
    fn test_image_keeps_pixels_without_ocr() {
        let mut png = Vec::new();
        DynamicImage::new_rgb8(5, 4)
            .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .unwrap();

        let result = extract(FileKind::Image, &png, &UnavailableOcr).unwrap();
        assert_eq!(result.image().map(|i| (i.width(), i.height())), Some((5, 4)));
        assert!(result.as_text().is_none());
    }

    #[test]
    fn test_dicom_decoder_failure_is_reported() {
        let result = extract(FileKind::Dicom, b"garbage", &UnavailableOcr);
        assert!(matches!(result, Err(ExtractionError::DicomParse(_))));
    }

    #[test]
    fn test_unsupported_message_names_file_and_type() {
        let message = unsupported_message("records.zip", "application/zip");
        assert!(message.contains("Unsupported file type"));
        assert!(message.contains("records.zip"));
        assert!(message.contains("application/zip"));
    }
}
