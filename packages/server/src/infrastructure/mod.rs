//! Infrastructure layer: concrete implementations of the domain traits plus the wire codec.

pub mod codec;
pub mod dto;
pub mod message_pusher;
pub mod registry;
