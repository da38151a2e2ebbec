//! Binary event-stream frame decoder
//!
//! Backend responses are a sequence of length-prefixed frames:
//!
//! ```text
//! +-------------+---------------+-------------+---------+---------+-------------+
//! | total (u32) | headers (u32) | prelude crc | headers | payload | message crc |
//! +-------------+---------------+-------------+---------+---------+-------------+
//! ```
//!
//! All integers are big-endian. Checksums are skipped, not verified.

use bytes::{Buf, Bytes};
use thiserror::Error;

/// Total length, headers length and prelude checksum
const PRELUDE_LEN: usize = 12;

/// Trailing message checksum
const TRAILER_LEN: usize = 4;

/// A frame with no headers and no payload
const MIN_FRAME_LEN: usize = PRELUDE_LEN + TRAILER_LEN;

/// Frame decoding failures
///
/// Offsets are byte positions in the buffer passed to [`decode_frames`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    /// Buffer ends before the frame does
    #[error("truncated frame at offset {offset}: need {needed} bytes, {available} available")]
    Truncated {
        offset: usize,
        needed: usize,
        available: usize,
    },

    /// Declared lengths are inconsistent
    #[error("invalid frame length at offset {offset}: total {total}, headers {headers}")]
    InvalidLength { offset: usize, total: usize, headers: usize },

    /// Header section could not be parsed
    #[error("invalid header in frame at offset {offset}: {reason}")]
    InvalidHeader { offset: usize, reason: String },
}

/// Typed header value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderValue {
    Bool(bool),
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Bytes(Bytes),
    String(String),
    Timestamp(i64),
    Uuid([u8; 16]),
}

/// One decoded frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventRecord {
    /// Headers in wire order
    pub headers: Vec<(String, HeaderValue)>,
    /// Raw payload bytes
    pub payload: Bytes,
}

impl EventRecord {
    /// String value of a header, if present and string-typed
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.iter().find_map(|(key, value)| match value {
            HeaderValue::String(s) if key == name => Some(s.as_str()),
            _ => None,
        })
    }

    pub fn event_type(&self) -> Option<&str> {
        self.header(":event-type").or_else(|| self.header("event-type"))
    }

    pub fn message_type(&self) -> Option<&str> {
        self.header(":message-type").or_else(|| self.header("message-type"))
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header(":content-type").or_else(|| self.header("content-type"))
    }
}

/// Result of decoding a buffer
///
/// `records` holds every frame decoded before `error`, if any.
#[derive(Debug, Default)]
pub struct DecodeOutput {
    pub records: Vec<EventRecord>,
    pub error: Option<FrameError>,
}

/// Decode every frame in `buf`, in order
///
/// Decoding stops at the first malformed frame; the records before it are
/// still returned.
pub fn decode_frames(buf: &[u8]) -> DecodeOutput {
    let mut output = DecodeOutput::default();
    let mut offset = 0;

    while offset < buf.len() {
        match decode_frame(&buf[offset..], offset) {
            Ok((record, len)) => {
                output.records.push(record);
                offset += len;
            }
            Err(error) => {
                output.error = Some(error);
                break;
            }
        }
    }

    output
}

fn decode_frame(frame: &[u8], offset: usize) -> Result<(EventRecord, usize), FrameError> {
    if frame.len() < MIN_FRAME_LEN {
        return Err(FrameError::Truncated {
            offset,
            needed: MIN_FRAME_LEN,
            available: frame.len(),
        });
    }

    let mut prelude = &frame[..PRELUDE_LEN];
    let total = prelude.get_u32() as usize;
    let headers_len = prelude.get_u32() as usize;

    if total < MIN_FRAME_LEN {
        return Err(FrameError::InvalidLength {
            offset,
            total,
            headers: headers_len,
        });
    }

    if total > frame.len() {
        return Err(FrameError::Truncated {
            offset,
            needed: total,
            available: frame.len(),
        });
    }

    if headers_len > total - MIN_FRAME_LEN {
        return Err(FrameError::InvalidLength {
            offset,
            total,
            headers: headers_len,
        });
    }

    let headers_end = PRELUDE_LEN + headers_len;
    let headers = decode_headers(&frame[PRELUDE_LEN..headers_end])
        .map_err(|reason| FrameError::InvalidHeader { offset, reason })?;

    let payload = Bytes::copy_from_slice(&frame[headers_end..total - TRAILER_LEN]);

    Ok((EventRecord { headers, payload }, total))
}

fn decode_headers(mut section: &[u8]) -> Result<Vec<(String, HeaderValue)>, String> {
    let mut headers = Vec::new();

    while section.has_remaining() {
        let name_len = usize::from(section.get_u8());
        let name = take(&mut section, name_len, "header name")?;
        let name = String::from_utf8(name.to_vec()).map_err(|_| "header name is not UTF-8".to_owned())?;

        require(section, 1, "value type")?;
        let value = match section.get_u8() {
            0 => HeaderValue::Bool(true),
            1 => HeaderValue::Bool(false),
            2 => {
                require(section, 1, "byte value")?;
                HeaderValue::Byte(section.get_i8())
            }
            3 => {
                require(section, 2, "short value")?;
                HeaderValue::Short(section.get_i16())
            }
            4 => {
                require(section, 4, "int value")?;
                HeaderValue::Int(section.get_i32())
            }
            5 => {
                require(section, 8, "long value")?;
                HeaderValue::Long(section.get_i64())
            }
            6 => {
                require(section, 2, "byte array length")?;
                let len = usize::from(section.get_u16());
                HeaderValue::Bytes(Bytes::copy_from_slice(take(&mut section, len, "byte array")?))
            }
            7 => {
                require(section, 2, "string length")?;
                let len = usize::from(section.get_u16());
                let raw = take(&mut section, len, "string value")?;
                let value = std::str::from_utf8(raw).map_err(|_| format!("value of {name} is not UTF-8"))?;
                HeaderValue::String(value.to_owned())
            }
            8 => {
                require(section, 8, "timestamp value")?;
                HeaderValue::Timestamp(section.get_i64())
            }
            9 => {
                let raw = take(&mut section, 16, "uuid value")?;
                let mut uuid = [0; 16];
                uuid.copy_from_slice(raw);
                HeaderValue::Uuid(uuid)
            }
            other => return Err(format!("unknown value type {other} for {name}")),
        };

        headers.push((name, value));
    }

    Ok(headers)
}

fn require(section: &[u8], len: usize, what: &str) -> Result<(), String> {
    if section.remaining() < len {
        return Err(format!("{what} overruns header section"));
    }
    Ok(())
}

fn take<'a>(section: &mut &'a [u8], len: usize, what: &str) -> Result<&'a [u8], String> {
    require(section, len, what)?;
    let (head, tail) = section.split_at(len);
    *section = tail;
    Ok(head)
}
