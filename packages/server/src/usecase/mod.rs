//! UseCase layer: protocol dispatch, fan-out and presence announcement.

pub mod dispatcher;
pub mod error;
pub mod fan_out;
pub mod presence;

pub use dispatcher::{Connection, ConnectionState, ProtocolDispatcher};
pub use error::{FanOutError, ProtocolError};
pub use fan_out::{DeliveryReport, FanOut};
pub use presence::PresenceAnnouncer;
