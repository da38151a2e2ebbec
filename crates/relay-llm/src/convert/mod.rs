//! Translation between the frontend and backend protocols

pub mod request;
pub mod response;

pub use request::to_backend;
pub use response::from_backend;

/// Stop reason reported for every response
pub(crate) const STOP_REASON: &str = "end_turn";

/// Fresh frontend message id
pub(crate) fn message_id() -> String {
    format!("msg_{}", uuid::Uuid::new_v4().simple())
}
