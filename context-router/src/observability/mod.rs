//! Structured logging vocabulary: event names and field helpers.

pub mod events;
pub mod fields;
