use thiserror::Error;
use tracing::{info, warn};

use crate::{
    analysis::{AnalysisError, AnalysisInvoker, AnalysisRequest},
    context::ConversationContext,
    prompts::chat_prompt,
};

pub const UPLOAD_REQUEST_MESSAGE: &str =
    "⚠ Please upload a relevant medical report or image containing the details you are asking about.";

#[derive(Error, Debug)]
pub enum ChatError {
    /// Nothing has been extracted in this session yet
    #[error("{}", UPLOAD_REQUEST_MESSAGE)]
    InsufficientContext,

    #[error("Error in AI Response: {0}")]
    Analysis(#[from] AnalysisError),
}

/// Answer a follow-up question grounded in the session's extracted text.
pub async fn answer_question(
    invoker: &AnalysisInvoker,
    context: &ConversationContext,
    question: &str,
) -> Result<String, ChatError> {
    if context.is_empty() {
        warn!("Chat question received before any text was extracted");
        return Err(ChatError::InsufficientContext);
    }

    info!(
        "Answering chat question with context from {} files",
        context.sources().len()
    );
    let request = AnalysisRequest::Text(chat_prompt(context, question));
    Ok(invoker.invoke(&request).await?)
}
