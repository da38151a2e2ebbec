//! Frontend (Anthropic Messages shaped) wire format types

use serde::{Deserialize, Serialize};

// -- Request types --

/// Messages API request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrontendRequest {
    /// Model identifier
    pub model: String,
    /// Maximum tokens to generate
    #[serde(default)]
    pub max_tokens: u32,
    /// Conversation messages, oldest first; the last one is the current turn
    #[serde(default)]
    pub messages: Vec<FrontendMessage>,
    /// System prompt
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<SystemPrompt>,
    /// Tool definitions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<FrontendTool>>,
    /// Whether to stream the response
    #[serde(default)]
    pub stream: bool,
    /// Sampling temperature
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    /// Accepted and ignored
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

impl FrontendRequest {
    /// System prompt entries in order, empty when there is no prompt
    pub fn system_entries(&self) -> Vec<&str> {
        match &self.system {
            None => Vec::new(),
            Some(SystemPrompt::Text(text)) => vec![text.as_str()],
            Some(SystemPrompt::Blocks(blocks)) => blocks.iter().map(|b| b.text.as_str()).collect(),
        }
    }
}

/// System prompt, either a bare string or a list of text entries
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SystemPrompt {
    Text(String),
    Blocks(Vec<SystemBlock>),
}

/// One entry of a list-form system prompt
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemBlock {
    #[serde(rename = "type", default = "text_type")]
    pub block_type: String,
    pub text: String,
}

fn text_type() -> String {
    "text".to_owned()
}

/// Conversation message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrontendMessage {
    /// Role ("user" or "assistant")
    pub role: String,
    /// Message content
    #[serde(default)]
    pub content: MessageContent,
}

impl FrontendMessage {
    pub fn is_user(&self) -> bool {
        self.role == "user"
    }

    pub fn is_assistant(&self) -> bool {
        self.role == "assistant"
    }
}

/// Message content can be a string, an array of content blocks, or
/// something this gateway does not recognize
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    /// Plain text (shorthand)
    Text(String),
    /// Array of content blocks
    Blocks(Vec<ContentBlock>),
    /// Any other JSON value
    Other(serde_json::Value),
}

impl Default for MessageContent {
    fn default() -> Self {
        Self::Other(serde_json::Value::Null)
    }
}

/// Content block in a request message
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    /// Text content
    Text { text: String },
    /// Tool use request from the assistant
    ToolUse {
        id: String,
        name: String,
        #[serde(default)]
        input: serde_json::Value,
    },
    /// Tool result from the user
    ToolResult {
        /// Tool use ID this result responds to
        tool_use_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        content: Option<ToolResultContent>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        is_error: Option<bool>,
    },
    /// Images, documents and anything newer
    #[serde(other)]
    Unknown,
}

/// Tool result payload, a string or a list of blocks
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ToolResultContent {
    Text(String),
    Blocks(Vec<ToolResultBlock>),
}

impl ToolResultContent {
    /// Flatten to plain text; list entries are joined with newlines
    pub fn text(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Blocks(blocks) => blocks
                .iter()
                .filter_map(|block| match block {
                    ToolResultBlock::Text { text } => Some(text.as_str()),
                    ToolResultBlock::Unknown => None,
                })
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }
}

/// Block inside an array-form tool result
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ToolResultBlock {
    Text {
        text: String,
    },
    #[serde(other)]
    Unknown,
}

/// Tool definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrontendTool {
    /// Tool name
    pub name: String,
    /// Human-readable description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// JSON Schema for input parameters
    #[serde(default)]
    pub input_schema: serde_json::Value,
}

// -- Response types --

/// Aggregated (non-streaming) response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    /// Response identifier
    pub id: String,
    /// Object type (always "message")
    #[serde(rename = "type")]
    pub response_type: String,
    /// Role (always "assistant")
    pub role: String,
    /// Response content blocks, in the order they were completed
    pub content: Vec<ResponseBlock>,
    /// Model name echoed from the request
    pub model: String,
    pub stop_reason: Option<String>,
    pub stop_sequence: Option<String>,
    /// Token usage
    pub usage: Usage,
}

/// Content block in a response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResponseBlock {
    /// Text response
    Text { text: String },
    /// Tool use request
    ToolUse {
        id: String,
        name: String,
        input: serde_json::Value,
    },
}

/// Token usage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

// -- Streaming types --

/// SSE event payloads
///
/// Also used to read frontend-shaped envelopes embedded in backend frames.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    /// Stream started
    MessageStart { message: StreamMessage },
    /// New content block started
    ContentBlockStart {
        index: u32,
        content_block: StreamContentBlock,
    },
    /// Incremental content within a block
    ContentBlockDelta { index: u32, delta: StreamDelta },
    /// Content block finished
    ContentBlockStop { index: u32 },
    /// Stop reason and final output usage
    MessageDelta {
        delta: MessageDeltaBody,
        usage: DeltaUsage,
    },
    /// Stream completed
    MessageStop,
    /// Keep-alive
    Ping,
    /// Terminal error
    Error { error: ErrorDetail },
}

impl StreamEvent {
    /// SSE `event:` name for this payload
    pub const fn name(&self) -> &'static str {
        match self {
            Self::MessageStart { .. } => "message_start",
            Self::ContentBlockStart { .. } => "content_block_start",
            Self::ContentBlockDelta { .. } => "content_block_delta",
            Self::ContentBlockStop { .. } => "content_block_stop",
            Self::MessageDelta { .. } => "message_delta",
            Self::MessageStop => "message_stop",
            Self::Ping => "ping",
            Self::Error { .. } => "error",
        }
    }
}

/// Partial message in a `message_start` event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamMessage {
    pub id: String,
    #[serde(rename = "type")]
    pub message_type: String,
    pub role: String,
    pub content: Vec<serde_json::Value>,
    pub model: String,
    pub stop_reason: Option<String>,
    pub stop_sequence: Option<String>,
    pub usage: Usage,
}

/// Content block in a `content_block_start` event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamContentBlock {
    /// Text block
    Text {
        #[serde(default)]
        text: String,
    },
    /// Tool use block
    ToolUse {
        id: String,
        name: String,
        #[serde(default)]
        input: serde_json::Value,
    },
}

/// Delta content in a `content_block_delta` event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamDelta {
    /// Incremental text
    TextDelta { text: String },
    /// Incremental tool input JSON
    ///
    /// `id` and `name` are carried by backend-native tool events and
    /// forwarded as-is.
    InputJsonDelta {
        partial_json: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    },
}

/// Body of a `message_delta` event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageDeltaBody {
    pub stop_reason: Option<String>,
    pub stop_sequence: Option<String>,
}

/// Usage in a `message_delta` event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeltaUsage {
    pub output_tokens: u32,
}

/// Error detail in an `error` event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorDetail {
    #[serde(rename = "type")]
    pub error_type: String,
    pub message: String,
}
