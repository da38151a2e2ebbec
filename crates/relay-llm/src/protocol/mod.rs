//! Wire format types
//!
//! Pure serde structs for the two protocols the gateway translates between.
//! Conversion logic lives in [`crate::convert`].

pub mod backend;
pub mod frontend;
