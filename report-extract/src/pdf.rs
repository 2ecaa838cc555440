use lopdf::Document;
use tracing::{info, warn};

use crate::{
    error::{ExtractionError, Result},
    or_placeholder,
};

/// Extract the text of every page in document order, one page per line block.
///
/// Pages are joined with `\n` after their own trailing line breaks are removed.
/// A document with no readable text yields [`crate::NO_READABLE_TEXT`].
pub fn extract_pdf_text(bytes: &[u8]) -> Result<String> {
    let document = Document::load_mem(bytes)?;

    if document.trailer.get(b"Encrypt").is_ok() {
        return Err(ExtractionError::EncryptedPdf);
    }

    let pages = document.get_pages();
    info!("Extracting text from {} PDF pages", pages.len());

    // BTreeMap keys keep document order
    let page_texts: Vec<String> = pages
        .keys()
        .map(|page_number| match document.extract_text(&[*page_number]) {
            Ok(text) => text.trim_end_matches(['\r', '\n']).to_string(),
            Err(e) => {
                warn!("Failed to extract text from page {}: {}", page_number, e);
                String::new()
            }
        })
        .collect();

    let text = page_texts.join("\n");
    info!("PDF text extraction produced {} characters", text.len());

    Ok(or_placeholder(text))
}
