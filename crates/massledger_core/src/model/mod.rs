//! Domain model for intentions, fulfillment events and daily records.
//!
//! # Responsibility
//! - Define canonical data structures used by the lifecycle engine, the
//!   daily record merger and the dashboard aggregator.
//!
//! # Invariants
//! - Every entity is owned by exactly one celebrant; there are no
//!   cross-celebrant references.
//! - Fulfillment events are append-only.

pub mod fulfillment;
pub mod intention;
