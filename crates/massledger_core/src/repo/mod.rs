//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the obligation store contract used by lifecycle, merger and
//!   dashboard services.
//! - Isolate SQLite query details from business rules.
//!
//! # Invariants
//! - The store applies no business rules; it only reads and writes records.
//! - Repository APIs return semantic errors (`NotFound`) in addition to DB
//!   transport errors.

pub mod obligation_store;
