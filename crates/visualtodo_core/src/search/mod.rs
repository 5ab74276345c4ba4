//! Derived views over the collection.
//!
//! # Responsibility
//! - Filter and search records for display.
//! - Compute summary and memory-dashboard figures.
//!
//! # Invariants
//! - Every function here is pure over its inputs.
//! - Derived sequences keep the collection's order.

pub mod slideshow;
pub mod view;
