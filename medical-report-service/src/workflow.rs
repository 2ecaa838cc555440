use base64::{Engine as _, engine::general_purpose::STANDARD};
use image::{DynamicImage, ImageFormat};
use report_extract::{ExtractionResult, OcrEngine};
use std::{io::Cursor, sync::Arc};
use tracing::{error, info, warn};

use crate::{
    analysis::{AnalysisInvoker, AnalysisRequest},
    context::ConversationContext,
    dispatcher::{self, FileKind},
    error::Result,
    models::{
        AnalysisOutcome, ExtractionPreview, FileReport, FileStatus, ReportSection, UploadedFile,
    },
    prompts::{IMAGE_ANALYSIS_INSTRUCTION, report_analysis_prompt},
    upload,
};

/// Upload → dispatch → extract → prompt → analyze, one file at a time
#[derive(Clone)]
pub struct UploadWorkflow {
    ocr: Arc<dyn OcrEngine>,
    invoker: AnalysisInvoker,
}

impl UploadWorkflow {
    pub fn new(ocr: Arc<dyn OcrEngine>, invoker: AnalysisInvoker) -> Self {
        Self { ocr, invoker }
    }

    /// Process files strictly in upload order. A failing file never stops the rest.
    pub async fn process_all(
        &self,
        files: Vec<UploadedFile>,
        context: &mut ConversationContext,
    ) -> Vec<FileReport> {
        let mut reports = Vec::with_capacity(files.len());
        for file in files {
            reports.push(self.process(file, context).await);
        }
        reports
    }

    pub async fn process(
        &self,
        file: UploadedFile,
        context: &mut ConversationContext,
    ) -> FileReport {
        let notice = format!("✅ {} uploaded successfully!", file.name);
        info!("{} ({}, {} bytes)", notice, file.content_type, file.bytes.len());

        let kind = FileKind::classify(&file.content_type)
            .filter(|_| upload::extension_accepted(&file.name));
        let Some(kind) = kind else {
            let message = dispatcher::unsupported_message(&file.name, &file.content_type);
            warn!("{}", message);
            return report(&file, notice, FileStatus::Unsupported).with_error(message);
        };

        let extraction = match self.extract(kind, &file).await {
            Ok(extraction) => extraction,
            Err(e) => {
                error!("Failed to process {}: {}", file.name, e);
                return report(&file, notice, FileStatus::Failed)
                    .with_error(format!("Failed to process {}: {}", file.name, e));
            }
        };

        let mut sections = Vec::new();
        if let Some(text) = extraction.as_text() {
            context.append(file.name.clone(), text);
            sections.push(self.text_section(text).await);
        }
        if let Some(image) = extraction.image() {
            match self.image_section(image).await {
                Ok(section) => sections.push(section),
                Err(e) => {
                    error!("Failed to encode preview for {}: {}", file.name, e);
                    return report(&file, notice, FileStatus::Failed)
                        .with_error(format!("Failed to process {}: {}", file.name, e));
                }
            }
        }

        FileReport {
            sections,
            ..report(&file, notice, FileStatus::Analyzed)
        }
    }

    async fn extract(&self, kind: FileKind, file: &UploadedFile) -> Result<ExtractionResult> {
        let ocr = self.ocr.clone();
        let bytes = file.bytes.clone();
        let extraction =
            tokio::task::spawn_blocking(move || dispatcher::extract(kind, &bytes, ocr.as_ref()))
                .await??;
        Ok(extraction)
    }

    async fn text_section(&self, text: &str) -> ReportSection {
        let request = AnalysisRequest::Text(report_analysis_prompt(text));
        ReportSection {
            extraction: ExtractionPreview::Text {
                text: text.to_string(),
            },
            analysis: self.analyze(&request).await,
        }
    }

    async fn image_section(
        &self,
        image: &DynamicImage,
    ) -> std::result::Result<ReportSection, image::ImageError> {
        let png = encode_png(image)?;
        let extraction = ExtractionPreview::Image {
            width: image.width(),
            height: image.height(),
            png_base64: STANDARD.encode(&png),
        };
        let request = AnalysisRequest::Image {
            instruction: IMAGE_ANALYSIS_INSTRUCTION.to_string(),
            png,
        };
        Ok(ReportSection {
            extraction,
            analysis: self.analyze(&request).await,
        })
    }

    async fn analyze(&self, request: &AnalysisRequest) -> AnalysisOutcome {
        match self.invoker.invoke(request).await {
            Ok(response) => AnalysisOutcome::Completed { response },
            Err(e) => AnalysisOutcome::Failed {
                error: format!("Error in AI Analysis: {}", e),
            },
        }
    }
}

fn report(file: &UploadedFile, notice: String, status: FileStatus) -> FileReport {
    FileReport {
        file_name: file.name.clone(),
        content_type: file.content_type.clone(),
        notice,
        status,
        sections: Vec::new(),
        error: None,
    }
}

impl FileReport {
    fn with_error(mut self, message: String) -> Self {
        self.error = Some(message);
        self
    }
}

/// Encode an image as PNG for previews and vision requests
fn encode_png(image: &DynamicImage) -> std::result::Result<Vec<u8>, image::ImageError> {
    let mut buffer = Vec::new();
    image.write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)?;
    Ok(buffer)
}
