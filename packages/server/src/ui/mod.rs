//! Presence-aware chat relay server implementation.

mod handler;
mod server;
mod signal;
pub mod state;

pub use server::Server;
