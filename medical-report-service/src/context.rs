use serde::{Deserialize, Serialize};

const ENTRY_SEPARATOR: &str = "\n\n";

/// Text extracted from every upload in a session, in upload order.
///
/// Entries are only ever appended; a fresh session starts with an empty context.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversationContext {
    text: String,
    sources: Vec<String>,
}

impl ConversationContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, source: impl Into<String>, text: &str) {
        if !self.sources.is_empty() {
            self.text.push_str(ENTRY_SEPARATOR);
        }
        self.text.push_str(text);
        self.sources.push(source.into());
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Names of the files that contributed text.
    pub fn sources(&self) -> &[String] {
        &self.sources
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}
