//! Encoder for backend event-stream frames
//!
//! CRC fields are written as zero; the gateway does not verify them.

use bytes::{BufMut, Bytes, BytesMut};
use serde_json::Value;

const STRING_TYPE: u8 = 7;

fn put_string_header(buf: &mut BytesMut, name: &str, value: &str) {
    buf.put_u8(u8::try_from(name.len()).expect("header name fits in u8"));
    buf.put_slice(name.as_bytes());
    buf.put_u8(STRING_TYPE);
    buf.put_u16(u16::try_from(value.len()).expect("header value fits in u16"));
    buf.put_slice(value.as_bytes());
}

/// Encode one `assistantResponseEvent` frame carrying a JSON payload
pub fn frame(payload: &Value) -> Bytes {
    let payload = payload.to_string();

    let mut headers = BytesMut::new();
    put_string_header(&mut headers, ":event-type", "assistantResponseEvent");
    put_string_header(&mut headers, ":content-type", "application/json");
    put_string_header(&mut headers, ":message-type", "event");

    let total = 12 + headers.len() + payload.len() + 4;

    let mut buf = BytesMut::with_capacity(total);
    buf.put_u32(u32::try_from(total).expect("frame fits in u32"));
    buf.put_u32(u32::try_from(headers.len()).expect("headers fit in u32"));
    buf.put_u32(0);
    buf.put_slice(&headers);
    buf.put_slice(payload.as_bytes());
    buf.put_u32(0);
    buf.freeze()
}

/// Concatenate frames for each payload into one response body
pub fn body(payloads: &[Value]) -> Bytes {
    let mut buf = BytesMut::new();
    for payload in payloads {
        buf.put_slice(&frame(payload));
    }
    buf.freeze()
}

/// A reply with two text chunks followed by one tool call split across two input fragments
pub fn text_and_tool_reply() -> Bytes {
    body(&[
        serde_json::json!({ "content": "Hello " }),
        serde_json::json!({ "content": "world" }),
        serde_json::json!({ "name": "get_weather", "toolUseId": "tooluse_1" }),
        serde_json::json!({ "name": "get_weather", "toolUseId": "tooluse_1", "input": "{\"location\":" }),
        serde_json::json!({ "name": "get_weather", "toolUseId": "tooluse_1", "input": "\"Paris\"}" }),
        serde_json::json!({ "name": "get_weather", "toolUseId": "tooluse_1", "stop": true }),
    ])
}
