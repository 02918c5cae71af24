//! Data Transfer Objects (DTOs) for the relay.
//!
//! DTOs are organized by protocol:
//! - `envelope`: WebSocket message envelope
//! - `http`: HTTP API response DTOs

pub mod envelope;
pub mod http;

pub use envelope::{Content, Envelope, MessageType, SERVER_SENDER};
