//! In-memory session registry with per-session presence watchdogs.

mod inmemory;
mod watchdog;

pub use inmemory::InMemorySessionRegistry;
