//! Provider client implementations

pub mod amadeus;
pub mod anthropic;
pub mod common;
pub mod confluent;
