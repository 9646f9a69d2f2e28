//! LLM-backed query construction: hypothetical documents and keyword extraction.

use anyhow::Result;

use ragbench_core::traits::LanguageModel;
use ragbench_core::types::Topic;

pub const HYDE_SYSTEM_PROMPT: &str = "You write short reference passages for a document search index. \
Given a topic and its category path, write a few sentences that clearly explain the core concept of the topic. \
Start with the topic itself, answer from the perspective of an IT technical interview, \
write in English and stay within 100 words.";

const BASIC_KEYWORD_PROMPT: &str = "You are a keyword extraction expert. \
Extract 3-5 core technical keywords from the given text. \
Return only the keywords separated by spaces, nothing else.\n\
Example output: TCP handshake connection SYN ACK";

const SEARCHABLE_KEYWORD_PROMPT: &str = "You are preparing search terms for an English full-text index \
that stems words and requires every term to match.\n\
Extract 3-5 English technical terms that:\n\
1. Would appear as-is in a networking textbook\n\
2. Are plain searchable words (no numbers or abbreviations like \"1xx\")\n\
3. Name core concepts, not categories\n\n\
Example:\n\
Topic: \"HTTP status code categories\"\n\
Good: HTTP response status redirect client-error\n\
Bad: 1xx 2xx 3xx 4xx 5xx\n\n\
Return only space-separated keywords.";

/// Which instructions the keyword extractor is given.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeywordPrompt {
    /// "Extract 3-5 core technical keywords".
    Basic,
    /// Literal textbook words only; numeric class tokens such as `1xx` are ruled out.
    Searchable,
}

impl KeywordPrompt {
    pub fn system_prompt(self) -> &'static str {
        match self {
            KeywordPrompt::Basic => BASIC_KEYWORD_PROMPT,
            KeywordPrompt::Searchable => SEARCHABLE_KEYWORD_PROMPT,
        }
    }
}

pub fn hyde_user_message(topic: &Topic) -> String {
    format!("Topic: {}\nCategory Path: {}", topic.name, topic.path)
}

/// Ask the model for a passage that an ideal answer chunk might contain.
pub fn generate_hypothetical_document(llm: &dyn LanguageModel, topic: &Topic, temperature: f32) -> Result<String> {
    let passage = llm.complete(HYDE_SYSTEM_PROMPT, &hyde_user_message(topic), temperature)?;
    tracing::debug!(topic_id = topic.id, chars = passage.chars().count(), "hypothetical document generated");
    Ok(passage)
}

/// Reduce `text` to a space-separated keyword phrase.
///
/// The reply is only trimmed. Empty or odd output is passed through as-is and
/// simply matches little or nothing downstream.
pub fn extract_keywords(llm: &dyn LanguageModel, text: &str, prompt: KeywordPrompt, temperature: f32) -> Result<String> {
    let reply = llm.complete(prompt.system_prompt(), text, temperature)?;
    let keywords = reply.trim().to_string();
    tracing::debug!(?prompt, %keywords, "keywords extracted");
    Ok(keywords)
}
