//! Use-case services over the repository layer.
//!
//! # Responsibility
//! - Enforce access control and input validation above persistence.
//!
//! # Invariants
//! - Services never bypass repository contracts.
//! - Services remain storage-agnostic; SQLite wiring is a constructor detail.

pub mod task_store;
