//! Board display pipeline.
//!
//! # Responsibility
//! - Turn the active memo list into the ordered, filtered list shown on the
//!   board.
//!
//! # Invariants
//! - Pipeline functions are pure; they never mutate their input.

pub mod display;
