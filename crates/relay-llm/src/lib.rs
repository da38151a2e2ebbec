//! Translation core for Relay
//!
//! Accepts Anthropic-Messages-shaped requests, forwards them to the backend
//! chat service, and turns the backend's binary event stream back into a
//! frontend response, aggregated or as SSE.

#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

pub mod backend;
pub mod convert;
pub mod error;
pub mod eventstream;
pub mod handler;
pub mod protocol;
pub mod reconstruct;
pub mod state;
pub mod stream;

pub use backend::{Backend, BackendResponse, HttpBackend};
pub use error::LlmError;
pub use handler::llm_router;
pub use state::LlmState;
pub use stream::{NoPacing, Pacer, RandomPacer};
