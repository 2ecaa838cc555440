use dicom_pixeldata::PixelDecoder;
use image::DynamicImage;
use tracing::info;

use crate::error::{ExtractionError, Result};

const PREAMBLE_LEN: usize = 128;
const MAGIC: &[u8; 4] = b"DICM";

/// Photometric interpretations that map directly onto a displayable buffer.
const DISPLAYABLE_PHOTOMETRIC: [&str; 3] = ["MONOCHROME1", "MONOCHROME2", "RGB"];

/// Convert a single-frame DICOM image into a displayable pixel buffer.
pub fn convert_dicom(bytes: &[u8]) -> Result<DynamicImage> {
    let object = dicom_object::from_reader(strip_preamble(bytes))
        .map_err(|e| ExtractionError::DicomParse(e.to_string()))?;

    let photometric = object
        .element_by_name("PhotometricInterpretation")
        .map_err(|e| ExtractionError::DicomParse(e.to_string()))?
        .to_str()
        .map_err(|e| ExtractionError::DicomParse(e.to_string()))?;
    ensure_displayable_photometric(photometric.trim())?;

    let pixel_data = object
        .decode_pixel_data()
        .map_err(|e| ExtractionError::DicomPixelData(e.to_string()))?;

    ensure_single_frame(pixel_data.number_of_frames())?;

    let image = pixel_data
        .to_dynamic_image(0)
        .map_err(|e| ExtractionError::DicomPixelData(e.to_string()))?;

    info!(
        "Converted DICOM image: {}x{} ({})",
        image.width(),
        image.height(),
        photometric.trim()
    );
    Ok(image)
}

/// Skip the 128-byte file preamble so the reader starts at the `DICM` magic code.
fn strip_preamble(bytes: &[u8]) -> &[u8] {
    match bytes.get(PREAMBLE_LEN..PREAMBLE_LEN + MAGIC.len()) {
        Some(magic) if magic == MAGIC => &bytes[PREAMBLE_LEN..],
        _ => bytes,
    }
}

fn ensure_displayable_photometric(photometric: &str) -> Result<()> {
    if !DISPLAYABLE_PHOTOMETRIC.contains(&photometric) {
        return Err(ExtractionError::UnsupportedDicom(format!(
            "photometric interpretation {} is not supported",
            photometric
        )));
    }
    Ok(())
}

fn ensure_single_frame(number_of_frames: u32) -> Result<()> {
    if number_of_frames != 1 {
        return Err(ExtractionError::UnsupportedDicom(format!(
            "expected a single frame, found {}",
            number_of_frames
        )));
    }
    Ok(())
}
