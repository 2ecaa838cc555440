use axum::body::Bytes;
use serde::{Deserialize, Serialize};

/// A file as received at the upload boundary
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub name: String,
    pub content_type: String,
    pub bytes: Bytes,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileStatus {
    Analyzed,
    Unsupported,
    Failed,
}

/// What the extractor produced, in a form the client can render
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExtractionPreview {
    Text {
        text: String,
    },
    Image {
        width: u32,
        height: u32,
        png_base64: String,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AnalysisOutcome {
    Completed { response: String },
    Failed { error: String },
}

/// One extracted artefact and the model's reading of it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportSection {
    pub extraction: ExtractionPreview,
    pub analysis: AnalysisOutcome,
}

/// Outcome for one uploaded file.
///
/// Reports and DICOM images carry one section. Photographs and scans carry
/// their OCR text first, when an engine produced any, then the image itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileReport {
    pub file_name: String,
    pub content_type: String,
    pub notice: String,
    pub status: FileStatus,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sections: Vec<ReportSection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    pub session_id: String,
    pub files: Vec<FileReport>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatRequest {
    pub question: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub session_id: String,
    pub answer: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionResponse {
    pub session_id: String,
    pub created_at: String,
    pub files_processed: usize,
    pub context_sources: Vec<String>,
    pub context: String,
}
