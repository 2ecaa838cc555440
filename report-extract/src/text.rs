use crate::or_placeholder;

/// Plain-text uploads are passed through as-is; invalid UTF-8 sequences are
/// replaced rather than rejected.
pub fn read_plain_text(bytes: &[u8]) -> String {
    or_placeholder(String::from_utf8_lossy(bytes).into_owned())
}
