//! Shared building blocks for the relay crates

mod error;

pub use error::{HttpError, error_body};
