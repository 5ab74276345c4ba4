//! Domain model for the to-do collection.
//!
//! # Responsibility
//! - Define the canonical record shape shared by memory, remote and local
//!   mirror storage.
//! - Keep record-level invariants in one place.
//!
//! # Invariants
//! - Every record is identified by a stable `TodoId`.
//! - `completed_at` is set iff `completed` is true.

pub mod todo;
