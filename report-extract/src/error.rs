use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("Failed to parse PDF: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("PDF is encrypted and cannot be read")]
    EncryptedPdf,

    #[error("Failed to decode image: {0}")]
    ImageDecode(#[from] image::ImageError),

    #[error("OCR failed: {0}")]
    Ocr(String),

    #[error("OCR support is not available in this build")]
    OcrUnavailable,

    #[error("Failed to parse DICOM data: {0}")]
    DicomParse(String),

    #[error("Failed to decode DICOM pixel data: {0}")]
    DicomPixelData(String),

    #[error("Unsupported DICOM image: {0}")]
    UnsupportedDicom(String),
}

pub type Result<T> = std::result::Result<T, ExtractionError>;
