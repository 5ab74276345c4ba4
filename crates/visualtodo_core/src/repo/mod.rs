//! Local persistence contracts and implementations.
//!
//! # Responsibility
//! - Define the key-to-string fallback store the sync engine mirrors into.
//! - Keep SQLite details behind the `LocalStore` trait.
//!
//! # Invariants
//! - `set` fully replaces any previous value for the key.
//! - Values survive process restarts for file-backed stores.

pub mod local_store;
