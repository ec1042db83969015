//! GoVector core domain types.
//!
//! Holds the pieces every other crate agrees on: the job entity and its
//! state machine, the error taxonomy with stable client-visible codes,
//! the stage plan with progress bands, upload validation, and the
//! client-side polling contract. This crate has no internal
//! dependencies.

pub mod error;
pub mod job;
pub mod poll;
pub mod stages;
pub mod types;
pub mod validation;
