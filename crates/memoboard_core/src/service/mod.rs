//! Core use-case services.
//!
//! # Responsibility
//! - Hold client-side memo state and keep it in step with the backend.
//! - Keep front ends decoupled from storage and realtime details.

pub mod board;
pub mod memo_store;
pub mod profile_service;
pub mod realtime_sync;
pub mod reconcile;
pub mod reorder;
