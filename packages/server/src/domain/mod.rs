//! Domain layer: presence relay model.
//!
//! Value objects and the `Session` entity, plus the traits the use cases depend on.
//! Concrete implementations live in the infrastructure layer.

pub mod entity;
pub mod error;
pub mod pusher;
pub mod registry;
pub mod value_object;

pub use entity::{PresenceEvent, Session};
pub use error::{MessagePushError, RegistryError, ValueObjectError};
pub use pusher::{MessagePusher, PusherChannel};
#[cfg(test)]
pub use pusher::MockMessagePusher;
pub use registry::SessionRegistry;
pub use value_object::{ConnectionId, MessageContent, UserName, UserStatus};
