//! Presence-aware chat relay.
//!
//! Clients connect over WebSocket, register a unique name, and exchange broadcast and
//! private messages. Sessions that stay silent past the idle threshold are flipped to
//! INACTIVE and the change is announced to everyone.

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;

pub mod config;
