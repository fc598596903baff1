//! Domain model for the memo board.
//!
//! # Responsibility
//! - Define canonical data structures used by store, sync and display code.
//!
//! # Invariants
//! - Every memo is identified by a stable `MemoId` and owned by one user.
//! - Trash is represented by the `is_deleted` flag; hard delete only on purge.

pub mod memo;
pub mod profile;
