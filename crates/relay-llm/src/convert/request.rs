//! Frontend request -> backend request

use relay_config::TranslationConfig;

use crate::protocol::backend::{
    BackendRequest, ConversationState, CurrentMessage, HistoryAssistantMessage, HistoryEntry, HistoryUserMessage,
    InputSchema, Tool, ToolResult, ToolResultText, ToolSpecification, UserInputMessage, UserInputMessageContext,
};
use crate::protocol::frontend::{
    ContentBlock, FrontendMessage, FrontendRequest, FrontendTool, MessageContent, ToolResultContent,
};

/// Status attached to every forwarded tool result
const TOOL_RESULT_STATUS: &str = "success";

/// Build the backend request for a frontend request
///
/// Never fails: content that cannot be extracted is replaced with the
/// configured fallback text.
pub fn to_backend(request: &FrontendRequest, config: &TranslationConfig, profile_arn: &str) -> BackendRequest {
    let model_id = config.model_id(&request.model);
    if model_id.is_empty() {
        tracing::debug!(model = %request.model, "no backend model id configured");
    }

    let current = request.messages.last();
    let content = current.map_or_else(
        || config.fallback_content.clone(),
        |message| message_content(&message.content, config),
    );

    let context = UserInputMessageContext {
        tool_results: current.map(tool_results).unwrap_or_default(),
        tools: request.tools.as_deref().map(tool_specifications).unwrap_or_default(),
    };

    BackendRequest {
        conversation_state: ConversationState {
            chat_trigger_type: config.chat_trigger_type.clone(),
            conversation_id: uuid::Uuid::new_v4().to_string(),
            current_message: CurrentMessage {
                user_input_message: UserInputMessage {
                    content,
                    model_id: model_id.to_owned(),
                    origin: config.origin.clone(),
                    user_input_message_context: context,
                },
            },
            history: history(request, config),
        },
        profile_arn: profile_arn.to_owned(),
    }
}

fn tool_specifications(tools: &[FrontendTool]) -> Vec<Tool> {
    tools
        .iter()
        .map(|tool| Tool {
            tool_specification: ToolSpecification {
                name: tool.name.clone(),
                description: tool.description.clone().unwrap_or_default(),
                input_schema: InputSchema {
                    json: tool.input_schema.clone(),
                },
            },
        })
        .collect()
}

fn tool_results(message: &FrontendMessage) -> Vec<ToolResult> {
    let MessageContent::Blocks(blocks) = &message.content else {
        return Vec::new();
    };

    blocks
        .iter()
        .filter_map(|block| match block {
            ContentBlock::ToolResult {
                tool_use_id, content, ..
            } => Some(ToolResult {
                content: vec![ToolResultText {
                    text: content.as_ref().map(ToolResultContent::text).unwrap_or_default(),
                }],
                status: TOOL_RESULT_STATUS.to_owned(),
                tool_use_id: tool_use_id.clone(),
            }),
            _ => None,
        })
        .collect()
}

/// Prior turns for the backend
///
/// Each system prompt entry becomes a user turn answered by a synthetic
/// acknowledgement. Then every user message before the current one becomes
/// a user turn, paired with the assistant message right after it when that
/// message is not the current one. Assistant messages without a preceding
/// user turn are dropped.
fn history(request: &FrontendRequest, config: &TranslationConfig) -> Vec<HistoryEntry> {
    let system = request.system_entries();
    let messages = &request.messages;

    if system.is_empty() && messages.len() <= 1 {
        return Vec::new();
    }

    let model_id = config.model_id(&request.model);
    let user_turn = |content: String| {
        HistoryEntry::UserInputMessage(HistoryUserMessage {
            content,
            model_id: model_id.to_owned(),
            origin: config.origin.clone(),
        })
    };
    let assistant_turn = |content: String| {
        HistoryEntry::AssistantResponseMessage(HistoryAssistantMessage {
            content,
            tool_uses: Vec::new(),
        })
    };

    let mut history = Vec::with_capacity(system.len() * 2 + messages.len());

    for entry in system {
        history.push(user_turn(entry.to_owned()));
        history.push(assistant_turn(config.system_message_response.clone()));
    }

    let prior = messages.len().saturating_sub(1);
    let mut i = 0;
    while i < prior {
        let message = &messages[i];
        if message.is_user() {
            history.push(user_turn(message_content(&message.content, config)));

            if let Some(next) = messages.get(i + 1)
                && i + 1 < prior
                && next.is_assistant()
            {
                history.push(assistant_turn(message_content(&next.content, config)));
                i += 1;
            }
        }
        i += 1;
    }

    history
}

/// Flatten message content into the single text the backend accepts
///
/// Text blocks and tool results are joined with newlines. Empty or
/// unrecognized content becomes the configured fallback.
pub fn message_content(content: &MessageContent, config: &TranslationConfig) -> String {
    match content {
        MessageContent::Text(text) if text.is_empty() => config.fallback_content.clone(),
        MessageContent::Text(text) => text.clone(),
        MessageContent::Blocks(blocks) => {
            let fragments: Vec<String> = blocks
                .iter()
                .filter_map(|block| match block {
                    ContentBlock::Text { text } => Some(text.clone()),
                    ContentBlock::ToolResult {
                        content: Some(content), ..
                    } => Some(content.text()),
                    _ => None,
                })
                .filter(|fragment| !fragment.is_empty())
                .collect();

            if fragments.is_empty() {
                log_unextracted(content);
                config.fallback_content.clone()
            } else {
                fragments.join("\n")
            }
        }
        MessageContent::Other(_) => {
            log_unextracted(content);
            config.fallback_content.clone()
        }
    }
}

fn log_unextracted(content: &MessageContent) {
    let dump = serde_json::to_string(content).unwrap_or_default();
    tracing::debug!(content = %dump, "no text in message content, using fallback");
}
