//! Prompt builders for the support nodes.
//!
//! Kept in one place so tests can pin the exact wording the chat model
//! sees. Handler prompts are language-steered through [`SupportConfig`];
//! classification and sentiment prompts are not.

use super::config::SupportConfig;

/// Prompt asking the model to bucket a query into one of the four
/// categories. The model is told to answer with the bare category name.
#[must_use]
pub fn classify_prompt(query: &str) -> String {
    format!(
        "Categorize this query into 'Technical', 'Billing', 'General', or 'Package'. \
         Respond only with the category name. Query: {query}"
    )
}

/// Prompt asking the model for the emotional tone of a query.
#[must_use]
pub fn sentiment_prompt(query: &str) -> String {
    format!(
        "Analyze the sentiment of the following customer query. \
         Respond with either 'Positive', 'Neutral', or 'Negative'. Query: {query}"
    )
}

/// Prompt for a technical support reply.
#[must_use]
pub fn technical_prompt(config: &SupportConfig, query: &str) -> String {
    handler_prompt(config, "technical", query)
}

/// Prompt for a billing support reply.
#[must_use]
pub fn billing_prompt(config: &SupportConfig, query: &str) -> String {
    handler_prompt(config, "billing", query)
}

/// Prompt for a general support reply.
#[must_use]
pub fn general_prompt(config: &SupportConfig, query: &str) -> String {
    handler_prompt(config, "general", query)
}

fn handler_prompt(config: &SupportConfig, kind: &str, query: &str) -> String {
    format!(
        "Provide a {kind} support response to the following query. \
         Reply in {language}. Query: {query}",
        language = config.language.as_str()
    )
}

/// Prompt for the package advisor. Takes the rendered conversation history
/// and the retrieved plan context so the model can recommend a specific
/// plan rather than recite the whole lineup.
#[must_use]
pub fn package_prompt(
    config: &SupportConfig,
    query: &str,
    chat_history: &str,
    context: &str,
) -> String {
    format!(
        "You are a customer service agent. Provide a helpful response about our \
         available packages in {language} language.\n\
         Customer query: {query}\n\n\
         Previous conversation history: {chat_history}\n\n\
         Additional context: {context}\n\n\
         Provide a detailed response about our packages and help the customer choose \
         the most suitable option based on their query. Focus on the number of \
         Facebook Pages they can connect and highlight the 24/7 admin support \
         available in all packages.",
        language = config.language.as_str()
    )
}

/// Canned reply for escalated conversations. No model call is involved;
/// upset customers get a human contact immediately.
#[must_use]
pub fn escalation_message(contact: &str) -> String {
    format!("ขออภัยค่ะ คุณสามารถติดต่อเราได้ที่ {contact}")
}
