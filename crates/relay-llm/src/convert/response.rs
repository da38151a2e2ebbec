//! Backend response body -> aggregated frontend response

use crate::error::LlmError;
use crate::eventstream;
use crate::protocol::frontend::{MessageResponse, Usage};
use crate::reconstruct::{self, Reconstruction};

/// Marker the backend puts in the body when it rejects a request's shape
pub const IMPROPERLY_FORMED_MARKER: &str = "Improperly formed request.";

/// Decode and reassemble a complete backend response body
///
/// Frame errors are logged and whatever decoded before them is used.
pub fn decode_body(body: &[u8]) -> Reconstruction {
    let output = eventstream::decode_frames(body);
    if let Some(error) = &output.error {
        tracing::warn!(
            error = %error,
            records = output.records.len(),
            "backend response framing error, using partial records"
        );
    }

    reconstruct::reconstruct(&output.records)
}

/// Check a raw backend body for the malformed-request marker
///
/// # Errors
///
/// Returns `LlmError::InvalidRequest` carrying the raw body when the marker
/// is present.
pub fn check_rejected(body: &[u8]) -> Result<(), LlmError> {
    let text = String::from_utf8_lossy(body);
    if text.contains(IMPROPERLY_FORMED_MARKER) {
        return Err(LlmError::InvalidRequest {
            detail: text.into_owned(),
        });
    }
    Ok(())
}

/// Build the aggregated frontend response from a backend body
///
/// Usage counters are placeholders: both equal the character length of
/// the reconstructed text.
///
/// # Errors
///
/// Returns `LlmError::InvalidRequest` if the backend rejected the request.
pub fn from_backend(body: &[u8], model: &str) -> Result<MessageResponse, LlmError> {
    check_rejected(body)?;

    let reconstruction = decode_body(body);
    let chars = u32::try_from(reconstruction.text_chars).unwrap_or(u32::MAX);

    Ok(MessageResponse {
        id: super::message_id(),
        response_type: "message".to_owned(),
        role: "assistant".to_owned(),
        content: reconstruction.content,
        model: model.to_owned(),
        stop_reason: Some(super::STOP_REASON.to_owned()),
        stop_sequence: None,
        usage: Usage {
            input_tokens: chars,
            output_tokens: chars,
        },
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::protocol::frontend::ResponseBlock;

    fn frame(payload: &str) -> Vec<u8> {
        let total = 16 + payload.len();
        let mut out = Vec::new();
        out.extend_from_slice(&u32::try_from(total).unwrap().to_be_bytes());
        out.extend_from_slice(&0_u32.to_be_bytes());
        out.extend_from_slice(&[0; 4]);
        out.extend_from_slice(payload.as_bytes());
        out.extend_from_slice(&[0; 4]);
        out
    }

    #[test]
    fn aggregates_text_and_usage() {
        let mut body = frame(r#"{"content":"Hello"}"#);
        body.extend(frame(r#"{"content":" there"}"#));

        let response = from_backend(&body, "claude-sonnet-4-20250514").unwrap();

        assert_eq!(response.model, "claude-sonnet-4-20250514");
        assert_eq!(response.content, vec![ResponseBlock::Text { text: "Hello there".to_owned() }]);
        assert_eq!(response.usage.input_tokens, 11);
        assert_eq!(response.usage.output_tokens, 11);
        assert!(response.id.starts_with("msg_"));

        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["type"], "message");
        assert_eq!(value["role"], "assistant");
        assert_eq!(value["stop_reason"], "end_turn");
        assert_eq!(value["stop_sequence"], json!(null));
    }

    #[test]
    fn rejected_request_is_detected_before_decoding() {
        let body = br#"{"message":"Improperly formed request.","reason":null}"#;

        let err = from_backend(body, "m").unwrap_err();

        assert!(matches!(err, LlmError::InvalidRequest { ref detail } if detail.contains("Improperly formed")));
    }

    #[test]
    fn corrupted_tail_keeps_decoded_text() {
        let mut body = frame(r#"{"content":"partial"}"#);
        body.extend_from_slice(&[0, 0, 1, 0, 0, 0]);

        let response = from_backend(&body, "m").unwrap();

        assert_eq!(response.content, vec![ResponseBlock::Text { text: "partial".to_owned() }]);
    }

    #[test]
    fn malformed_tool_input_still_produces_response() {
        let mut body = frame(r#"{"name":"f","toolUseId":"t1"}"#);
        body.extend(frame(r#"{"name":"f","toolUseId":"t1","input":"{oops"}"#));
        body.extend(frame(r#"{"name":"f","toolUseId":"t1","stop":true}"#));

        let response = from_backend(&body, "m").unwrap();

        assert_eq!(
            response.content,
            vec![ResponseBlock::ToolUse {
                id: "t1".to_owned(),
                name: "f".to_owned(),
                input: json!({}),
            }]
        );
        assert_eq!(response.usage.output_tokens, 0);
    }

    fn envelope_body(payloads: &[serde_json::Value]) -> Vec<u8> {
        payloads.iter().flat_map(|payload| frame(&payload.to_string())).collect()
    }

    #[test]
    fn envelope_text_frames_aggregate_into_one_block() {
        let body = envelope_body(&[
            json!({ "type": "content_block_start", "index": 0, "content_block": { "type": "text", "text": "" } }),
            json!({ "type": "content_block_delta", "index": 0, "delta": { "type": "text_delta", "text": "one " } }),
            json!({ "type": "content_block_delta", "index": 0, "delta": { "type": "text_delta", "text": "two " } }),
            json!({ "type": "content_block_delta", "index": 0, "delta": { "type": "text_delta", "text": "three" } }),
            json!({ "type": "content_block_stop", "index": 0 }),
        ]);

        let response = from_backend(&body, "m").unwrap();

        assert_eq!(response.content, vec![ResponseBlock::Text { text: "one two three".to_owned() }]);
        assert_eq!(response.usage.output_tokens, 13);
    }

    #[test]
    fn envelope_tool_fragments_form_one_input() {
        let body = envelope_body(&[
            json!({ "type": "content_block_delta", "index": 1, "delta": {
                "type": "input_json_delta", "id": "toolu_9", "name": "lookup", "partial_json": "{\"a\":"
            } }),
            json!({ "type": "content_block_delta", "index": 1, "delta": {
                "type": "input_json_delta", "id": "toolu_9", "name": "lookup", "partial_json": "1}"
            } }),
            json!({ "type": "content_block_stop", "index": 1 }),
        ]);

        let response = from_backend(&body, "m").unwrap();

        assert_eq!(
            response.content,
            vec![ResponseBlock::ToolUse {
                id: "toolu_9".to_owned(),
                name: "lookup".to_owned(),
                input: json!({ "a": 1 }),
            }]
        );
    }
}
