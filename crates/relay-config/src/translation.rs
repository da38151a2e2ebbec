use indexmap::IndexMap;
use serde::Deserialize;

/// Constants and lookup tables used when building backend requests
///
/// Constructed once at startup and shared read-only by every request.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TranslationConfig {
    /// Sent instead of a turn whose content is empty or unrecognized
    #[serde(default = "default_fallback_content")]
    pub fallback_content: String,
    /// Origin marker attached to every user turn
    #[serde(default = "default_origin")]
    pub origin: String,
    /// Chat trigger marker of the conversation state
    #[serde(default = "default_chat_trigger_type")]
    pub chat_trigger_type: String,
    /// Acknowledgement used for the synthetic assistant turn after each system prompt
    #[serde(default = "default_system_message_response")]
    pub system_message_response: String,
    /// Frontend model name to backend model id
    #[serde(default = "default_models")]
    pub models: IndexMap<String, String>,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            fallback_content: default_fallback_content(),
            origin: default_origin(),
            chat_trigger_type: default_chat_trigger_type(),
            system_message_response: default_system_message_response(),
            models: default_models(),
        }
    }
}

impl TranslationConfig {
    /// Backend model id for a frontend model name
    ///
    /// Unknown models map to an empty id; the backend decides whether to
    /// reject the request or apply its default model.
    pub fn model_id(&self, model: &str) -> &str {
        self.models.get(model).map_or("", String::as_str)
    }
}

fn default_fallback_content() -> String {
    "answer for user qeustion".to_owned()
}

fn default_origin() -> String {
    "AI_EDITOR".to_owned()
}

fn default_chat_trigger_type() -> String {
    "MANUAL".to_owned()
}

fn default_system_message_response() -> String {
    "I will follow these instructions".to_owned()
}

fn default_models() -> IndexMap<String, String> {
    [
        ("claude-sonnet-4-20250514", "CLAUDE_SONNET_4_20250514_V1_0"),
        ("claude-3-5-haiku-20241022", "CLAUDE_3_7_SONNET_20250219_V1_0"),
    ]
    .into_iter()
    .map(|(from, to)| (from.to_owned(), to.to_owned()))
    .collect()
}
