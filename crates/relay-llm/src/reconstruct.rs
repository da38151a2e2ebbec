//! Reassembly of decoded backend frames into content blocks
//!
//! Frame payloads come in two shapes. Some are already frontend stream
//! envelopes (they carry a `type` field). Most are the backend's native
//! assistant events (`{"content": ...}`, `{"name", "toolUseId", "input"}`,
//! `{"stop": true}`), which are normalized into the same envelope
//! vocabulary: text lives at block index 0, tool use at index 1.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::eventstream::EventRecord;
use crate::protocol::frontend::{ResponseBlock, StreamContentBlock, StreamDelta, StreamEvent};

/// Block index used for assistant text
pub const TEXT_INDEX: u32 = 0;

/// Block index used for tool use
pub const TOOL_INDEX: u32 = 1;

/// Classified frame payload
#[derive(Debug, Clone, PartialEq)]
pub enum BackendEvent {
    BlockStart { index: u32, block: StreamContentBlock },
    BlockDelta { index: u32, delta: StreamDelta },
    BlockStop { index: u32 },
    Unknown,
}

impl BackendEvent {
    /// Frontend stream envelope for this event
    pub fn to_stream_event(&self) -> Option<StreamEvent> {
        match self {
            Self::BlockStart { index, block } => Some(StreamEvent::ContentBlockStart {
                index: *index,
                content_block: block.clone(),
            }),
            Self::BlockDelta { index, delta } => Some(StreamEvent::ContentBlockDelta {
                index: *index,
                delta: delta.clone(),
            }),
            Self::BlockStop { index } => Some(StreamEvent::ContentBlockStop { index: *index }),
            Self::Unknown => None,
        }
    }
}

/// Classify one frame payload
///
/// A native tool event can carry both a final input fragment and the stop
/// flag, so one payload may yield more than one event.
pub fn classify(payload: &[u8]) -> Vec<BackendEvent> {
    let value: Value = match serde_json::from_slice(payload) {
        Ok(value) => value,
        Err(e) => {
            tracing::debug!(error = %e, "skipping non-JSON frame payload");
            return Vec::new();
        }
    };

    let events = if value.get("type").is_some() {
        vec![classify_envelope(value)]
    } else {
        classify_native(&value)
    };

    events.into_iter().filter(|event| *event != BackendEvent::Unknown).collect()
}

fn classify_envelope(value: Value) -> BackendEvent {
    match serde_json::from_value::<StreamEvent>(value) {
        Ok(StreamEvent::ContentBlockStart { index, content_block }) => BackendEvent::BlockStart {
            index,
            block: content_block,
        },
        Ok(StreamEvent::ContentBlockDelta { index, delta }) => BackendEvent::BlockDelta { index, delta },
        Ok(StreamEvent::ContentBlockStop { index }) => BackendEvent::BlockStop { index },
        Ok(other) => {
            tracing::debug!(event = other.name(), "ignoring envelope outside content blocks");
            BackendEvent::Unknown
        }
        Err(e) => {
            tracing::debug!(error = %e, "ignoring unrecognized envelope");
            BackendEvent::Unknown
        }
    }
}

fn classify_native(value: &Value) -> Vec<BackendEvent> {
    let str_field = |name: &str| value.get(name).and_then(Value::as_str);
    let stop = value.get("stop").and_then(Value::as_bool).unwrap_or(false);
    let name = str_field("name");
    let tool_use_id = str_field("toolUseId");

    let mut events = Vec::new();

    if let Some(input) = str_field("input") {
        if !input.is_empty() || !stop {
            events.push(BackendEvent::BlockDelta {
                index: TOOL_INDEX,
                delta: StreamDelta::InputJsonDelta {
                    partial_json: input.to_owned(),
                    id: tool_use_id.map(str::to_owned),
                    name: name.map(str::to_owned),
                },
            });
        }
    } else if let (Some(name), Some(id), false) = (name, tool_use_id, stop) {
        events.push(BackendEvent::BlockStart {
            index: TOOL_INDEX,
            block: StreamContentBlock::ToolUse {
                id: id.to_owned(),
                name: name.to_owned(),
                input: Value::Object(serde_json::Map::new()),
            },
        });
    } else if let Some(content) = str_field("content").filter(|c| !c.is_empty()) {
        events.push(BackendEvent::BlockDelta {
            index: TEXT_INDEX,
            delta: StreamDelta::TextDelta {
                text: content.to_owned(),
            },
        });
    }

    if stop {
        events.push(BackendEvent::BlockStop { index: TOOL_INDEX });
    }

    if events.is_empty() {
        tracing::debug!(payload = %value, "ignoring unrecognized backend event");
        events.push(BackendEvent::Unknown);
    }

    events
}

/// Everything derived from one backend response
#[derive(Debug, Default)]
pub struct Reconstruction {
    /// Accepted events, as frontend envelopes, in arrival order
    pub events: Vec<StreamEvent>,
    /// Materialized content blocks
    pub content: Vec<ResponseBlock>,
    /// Number of `content_block_delta` events
    pub delta_count: u32,
    /// Characters across all text blocks
    pub text_chars: usize,
}

#[derive(Debug, Default)]
struct ToolAccumulator {
    id: String,
    name: String,
    json: String,
}

/// Incremental reassembly state
#[derive(Debug, Default)]
pub struct Reconstructor {
    output: Reconstruction,
    text: BTreeMap<u32, String>,
    tool: Option<ToolAccumulator>,
}

impl Reconstructor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one decoded frame
    pub fn push_record(&mut self, record: &EventRecord) {
        for event in classify(&record.payload) {
            self.push(event);
        }
    }

    /// Feed one classified event
    pub fn push(&mut self, event: BackendEvent) {
        let Some(stream_event) = event.to_stream_event() else {
            return;
        };

        match event {
            BackendEvent::BlockStart { index, block } => match block {
                StreamContentBlock::ToolUse { id, name, .. } => {
                    let tool = self.tool.get_or_insert_with(ToolAccumulator::default);
                    tool.id = id;
                    tool.name = name;
                }
                StreamContentBlock::Text { text } => {
                    self.text.insert(index, text);
                }
            },
            BackendEvent::BlockDelta { index, delta } => {
                self.output.delta_count += 1;
                match delta {
                    StreamDelta::TextDelta { text } => {
                        self.text.entry(index).or_default().push_str(&text);
                    }
                    StreamDelta::InputJsonDelta { partial_json, id, name } => {
                        let tool = self.tool.get_or_insert_with(ToolAccumulator::default);
                        tool.json.push_str(&partial_json);
                        if let Some(id) = id {
                            tool.id = id;
                        }
                        if let Some(name) = name {
                            tool.name = name;
                        }
                    }
                }
            }
            BackendEvent::BlockStop { index } if index == TOOL_INDEX => {
                let Some(tool) = self.tool.take() else {
                    tracing::debug!("ignoring tool stop with no tool in progress");
                    return;
                };
                self.finish_tool(tool);
            }
            BackendEvent::BlockStop { index } => {
                let text = self.text.remove(&index).unwrap_or_default();
                self.finish_text(text, None);
            }
            BackendEvent::Unknown => {}
        }

        self.output.events.push(stream_event);
    }

    fn finish_text(&mut self, text: String, position: Option<usize>) {
        self.output.text_chars += text.chars().count();
        let block = ResponseBlock::Text { text };
        match position {
            Some(position) => self.output.content.insert(position, block),
            None => self.output.content.push(block),
        }
    }

    fn finish_tool(&mut self, tool: ToolAccumulator) {
        let input = parse_tool_input(&tool);
        self.output.content.push(ResponseBlock::ToolUse {
            id: tool.id,
            name: tool.name,
            input,
        });
    }

    /// Finalize blocks that never saw a stop event and return the result
    ///
    /// Native backend responses do not delimit the text block, so pending
    /// text at index 0 is placed first; other pending blocks follow in
    /// index order.
    pub fn finish(mut self) -> Reconstruction {
        let pending = std::mem::take(&mut self.text);
        for (index, text) in pending {
            if text.is_empty() {
                continue;
            }
            let position = (index == TEXT_INDEX).then_some(0);
            self.finish_text(text, position);
        }

        if let Some(tool) = self.tool.take()
            && !tool.id.is_empty()
        {
            self.finish_tool(tool);
        }

        self.output
    }
}

fn parse_tool_input(tool: &ToolAccumulator) -> Value {
    if tool.json.trim().is_empty() {
        return Value::Object(serde_json::Map::new());
    }

    match serde_json::from_str::<Value>(&tool.json) {
        Ok(value @ Value::Object(_)) => value,
        Ok(other) => {
            tracing::warn!(tool = %tool.name, input = %other, "malformed tool input: not a JSON object");
            Value::Object(serde_json::Map::new())
        }
        Err(e) => {
            tracing::warn!(tool = %tool.name, error = %e, "malformed tool input");
            Value::Object(serde_json::Map::new())
        }
    }
}

/// Reassemble a complete set of decoded frames
pub fn reconstruct(records: &[EventRecord]) -> Reconstruction {
    let mut reconstructor = Reconstructor::new();
    for record in records {
        reconstructor.push_record(record);
    }
    reconstructor.finish()
}
