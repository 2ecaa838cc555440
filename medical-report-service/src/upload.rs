use axum::body::Bytes;

use crate::models::UploadedFile;

/// File extensions admitted at the upload boundary
pub const ACCEPTED_EXTENSIONS: [&str; 6] = ["pdf", "txt", "png", "jpg", "jpeg", "dcm"];

const OCTET_STREAM: &str = "application/octet-stream";

pub fn extension_accepted(file_name: &str) -> bool {
    extension(file_name).is_some_and(|ext| ACCEPTED_EXTENSIONS.contains(&ext.as_str()))
}

/// Build an [`UploadedFile`] from a multipart part.
///
/// Clients that omit the part type, or send the generic octet-stream type, get
/// one inferred from the extension.
pub fn uploaded_file(name: String, part_type: Option<&str>, bytes: Bytes) -> UploadedFile {
    let declared = part_type
        .map(normalize_mime)
        .filter(|mime| !mime.is_empty() && mime != OCTET_STREAM)
        .or_else(|| type_for_extension(&name).map(str::to_string))
        .unwrap_or_else(|| OCTET_STREAM.to_string());

    UploadedFile {
        name,
        content_type: declared,
        bytes,
    }
}

/// Strip parameters and lowercase, e.g. `Text/Plain; charset=UTF-8` -> `text/plain`
pub fn normalize_mime(mime: &str) -> String {
    mime.split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

fn type_for_extension(file_name: &str) -> Option<&'static str> {
    match extension(file_name)?.as_str() {
        "pdf" => Some("application/pdf"),
        "txt" => Some("text/plain"),
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "dcm" => Some("application/dicom"),
        _ => None,
    }
}

fn extension(file_name: &str) -> Option<String> {
    let (stem, ext) = file_name.rsplit_once('.')?;
    if stem.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepted_extensions() {
        assert!(extension_accepted("report.pdf"));
        assert!(extension_accepted("notes.TXT"));
        assert!(extension_accepted("xray.Jpeg"));
        assert!(extension_accepted("chest.dcm"));
        assert!(!extension_accepted("records.zip"));
        assert!(!extension_accepted("no_extension"));
        assert!(!extension_accepted(".pdf"));
    }

    #[test]
    fn test_declared_type_is_normalized() {
        let file = uploaded_file(
            "notes.txt".to_string(),
            Some("Text/Plain; charset=UTF-8"),
            Bytes::from_static(b"hi"),
        );
        assert_eq!(file.content_type, "text/plain");
    }

    #[test]
    fn test_missing_type_is_inferred_from_extension() {
        let file = uploaded_file("chest.DCM".to_string(), None, Bytes::new());
        assert_eq!(file.content_type, "application/dicom");

        let file = uploaded_file(
            "scan.jpg".to_string(),
            Some("application/octet-stream"),
            Bytes::new(),
        );
        assert_eq!(file.content_type, "image/jpeg");
    }

    #[test]
    fn test_declared_type_wins_over_extension() {
        let file = uploaded_file("scan.dcm".to_string(), Some("application/zip"), Bytes::new());
        assert_eq!(file.content_type, "application/zip");
    }

    #[test]
    fn test_unknown_extension_without_type_stays_generic() {
        let file = uploaded_file("archive.zip".to_string(), None, Bytes::new());
        assert_eq!(file.content_type, OCTET_STREAM);
    }
}
