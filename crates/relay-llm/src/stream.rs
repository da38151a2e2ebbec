//! SSE event sequence for a streamed response
//!
//! The backend answers in one piece, so the translated events are wrapped
//! in the frontend's message envelope and delivered with a pacing delay
//! before each backend-derived event.

use std::sync::Arc;
use std::time::Duration;

use futures_util::{Stream, StreamExt, stream};
use rand::Rng;
use relay_config::StreamingConfig;

use crate::protocol::frontend::{
    DeltaUsage, ErrorDetail, MessageDeltaBody, StreamContentBlock, StreamEvent, StreamMessage, Usage,
};
use crate::reconstruct::{Reconstruction, TEXT_INDEX};

/// Delay strategy applied before each backend-derived event
pub trait Pacer: Send + Sync {
    fn delay(&self) -> Duration;
}

/// Uniform random delay in `0..=max_delay`
#[derive(Debug, Clone, Copy)]
pub struct RandomPacer {
    max_delay: Duration,
}

impl RandomPacer {
    pub const fn new(max_delay: Duration) -> Self {
        Self { max_delay }
    }
}

impl Pacer for RandomPacer {
    fn delay(&self) -> Duration {
        let max = u64::try_from(self.max_delay.as_millis()).unwrap_or(u64::MAX);
        Duration::from_millis(rand::rng().random_range(0..=max))
    }
}

/// No delay at all
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPacing;

impl Pacer for NoPacing {
    fn delay(&self) -> Duration {
        Duration::ZERO
    }
}

/// Pacer selected by configuration
pub fn pacer_from_config(config: &StreamingConfig) -> Arc<dyn Pacer> {
    if config.pacing && !config.max_delay.is_zero() {
        Arc::new(RandomPacer::new(config.max_delay))
    } else {
        Arc::new(NoPacing)
    }
}

/// Full event sequence for a successful backend response
///
/// `message_start`, `ping` and a text block start come first, then every
/// backend-derived event in arrival order, then the closing text block
/// stop, `message_delta` and `message_stop`.
pub fn message_events(
    reconstruction: Reconstruction,
    model: String,
    message_id: String,
    pacer: Arc<dyn Pacer>,
) -> impl Stream<Item = StreamEvent> + Send {
    let prologue = [
        StreamEvent::MessageStart {
            message: StreamMessage {
                id: message_id,
                message_type: "message".to_owned(),
                role: "assistant".to_owned(),
                content: Vec::new(),
                model,
                stop_reason: None,
                stop_sequence: None,
                usage: Usage {
                    input_tokens: 1,
                    output_tokens: 1,
                },
            },
        },
        StreamEvent::Ping,
        StreamEvent::ContentBlockStart {
            index: TEXT_INDEX,
            content_block: StreamContentBlock::Text { text: String::new() },
        },
    ];

    let epilogue = [
        StreamEvent::ContentBlockStop { index: TEXT_INDEX },
        StreamEvent::MessageDelta {
            delta: MessageDeltaBody {
                stop_reason: Some(crate::convert::STOP_REASON.to_owned()),
                stop_sequence: None,
            },
            usage: DeltaUsage {
                output_tokens: reconstruction.delta_count,
            },
        },
        StreamEvent::MessageStop,
    ];

    let body = stream::iter(reconstruction.events).then(move |event| {
        let delay = pacer.delay();
        async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            event
        }
    });

    stream::iter(prologue).chain(body).chain(stream::iter(epilogue))
}

/// Single terminal `error` event
pub fn error_events(message: String) -> impl Stream<Item = StreamEvent> + Send {
    stream::iter([StreamEvent::Error {
        error: ErrorDetail {
            error_type: "overloaded_error".to_owned(),
            message,
        },
    }])
}
