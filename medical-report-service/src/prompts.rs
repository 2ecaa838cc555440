use crate::context::ConversationContext;

pub const IMAGE_ANALYSIS_INSTRUCTION: &str = "Analyze this medical image for any abnormalities.";

pub fn report_analysis_prompt(report_text: &str) -> String {
    format!(
        "You are a medical AI expert. Analyze the following medical report and provide:
1. Key findings and possible conditions.
2. Health and lifestyle suggestions.
3. Whether a doctor consultation is required.

Medical Report:
{}",
        report_text
    )
}

pub fn chat_prompt(context: &ConversationContext, question: &str) -> String {
    format!(
        "Context from uploaded files:
{}

Now, feel free to ask any questions related to the uploaded medical report or images.
User Question: {}
Answer the user's question based on the context.",
        context.text(),
        question
    )
}
