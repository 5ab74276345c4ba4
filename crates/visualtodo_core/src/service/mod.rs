//! Use-case layer over the sync engine.
//!
//! # Responsibility
//! - Own the in-memory collection for one session.
//! - Apply mutations optimistically and hand snapshots to the engine.
//! - Wire configuration, local storage and remote clients into a session.

pub mod bootstrap;
pub mod todo_service;
