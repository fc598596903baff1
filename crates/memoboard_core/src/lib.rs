//! Core domain logic for memoboard.
//! This crate is the single source of truth for memo board invariants.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod search;
pub mod service;

pub use config::{AppConfig, ConfigError, Preferences};
pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::memo::{
    Memo, MemoColor, MemoId, MemoPatch, MemoValidationError, OwnerId, PositionUpdate,
};
pub use model::profile::{mask_email, resolve_display_name, Profile, ProfilePatch};
pub use repo::change_feed::{ChangeEvent, ChangeFeed, ChangeSubscription, FeedPoll};
pub use repo::memo_repo::{MemoRepository, SqliteMemoRepository};
pub use repo::profile_repo::{ProfileRepository, SqliteProfileRepository};
pub use repo::{RepoError, RepoResult};
pub use search::display::{process_memos_for_display, DisplayOptions, SortKey};
pub use service::board::{BoardView, DropOutcome, DropTarget, MemoBoard};
pub use service::memo_store::{EmptyTrashReport, MemoStore, StoreError, StoreResult};
pub use service::profile_service::{ProfileService, ProfileServiceError};
pub use service::realtime_sync::{RealtimeSync, SyncReport};
pub use service::reconcile::MergeOutcome;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
