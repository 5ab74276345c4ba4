//! Remote endpoints consumed by the sync engine.
//!
//! # Responsibility
//! - Define the Record Store and Image Endpoint contracts.
//! - Provide HTTP implementations speaking the function host's JSON API.
//!
//! # Invariants
//! - Every request carries the bearer credential and the `x-user-id` header.
//! - Any non-2xx status is a `RemoteError`, never a partial success.

pub mod client;
pub mod image_endpoint;
pub mod record_store;

pub use client::{RemoteClient, RemoteError, RemoteResult};
