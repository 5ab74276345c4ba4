//! Reconciliation of the in-memory collection with remote and local storage.
//!
//! # Responsibility
//! - Load the collection for one user, falling back to the local mirror.
//! - Persist snapshots after mutations and track connectivity.
//! - Surface non-fatal notices to the presentation layer.
//!
//! # Invariants
//! - Remote and local failures never propagate to callers.
//! - Connectivity changes only on load, persist or health outcomes.

pub mod engine;
pub mod notice;

pub use engine::{Connectivity, PersistHandle, SyncEngine};
pub use notice::{notice_channel, Notice, NoticeLevel, NoticeReceiver, NoticeSender};
