//! Client-side memo state with optimistic writes.
//!
//! # Responsibility
//! - Hold the active and trashed memo lists of one owner.
//! - Apply every mutation locally first, then persist it.
//! - Fold backend responses and realtime events into local state.
//!
//! # Invariants
//! - A memo id appears in at most one of the two lists.
//! - A failed backend write is logged and reported, but local state is kept
//!   (no rollback). Reorder failures trigger a reload instead.
//! - Unknown ids and invalid input leave state untouched.

use crate::model::memo::{Memo, MemoColor, MemoId, MemoPatch, MemoValidationError, OwnerId};
use crate::repo::change_feed::ChangeEvent;
use crate::repo::memo_repo::MemoRepository;
use crate::repo::RepoError;
use crate::service::reconcile::{merge_remote, remove_by_id, upsert_local, MergeOutcome};
use crate::service::reorder::plan_reorder;
use log::{debug, error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

pub type StoreResult<T> = Result<T, StoreError>;

/// Store-level error.
#[derive(Debug)]
pub enum StoreError {
    /// Input rejected before touching local state.
    Validation(MemoValidationError),
    /// Id is not held in the list the operation applies to.
    NotFound(MemoId),
    /// Local state was updated but the backend write failed.
    Persist {
        operation: &'static str,
        memo_id: Option<MemoId>,
        source: RepoError,
    },
    /// Fetching the owner's memos failed; local state is unchanged.
    Load(RepoError),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "memo not found: {id}"),
            Self::Persist {
                operation,
                memo_id: Some(id),
                source,
            } => write!(f, "{operation} for memo {id} was not saved: {source}"),
            Self::Persist {
                operation, source, ..
            } => write!(f, "{operation} was not saved: {source}"),
            Self::Load(err) => write!(f, "failed to load memos: {err}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::NotFound(_) => None,
            Self::Persist { source, .. } => Some(source),
            Self::Load(err) => Some(err),
        }
    }
}

impl From<MemoValidationError> for StoreError {
    fn from(value: MemoValidationError) -> Self {
        Self::Validation(value)
    }
}

/// Outcome of emptying the trash.
#[derive(Debug, Default)]
pub struct EmptyTrashReport {
    /// Ids removed from the backend.
    pub purged: Vec<MemoId>,
    /// Backend failures; these memos are already gone locally.
    pub failures: Vec<StoreError>,
}

/// Memo list state for one owner over a backend repository.
pub struct MemoStore<R: MemoRepository> {
    repo: R,
    owner: OwnerId,
    active: Vec<Memo>,
    trashed: Vec<Memo>,
}

impl<R: MemoRepository> MemoStore<R> {
    /// Creates an empty store. Call [`MemoStore::load`] to populate it.
    pub fn new(repo: R, owner: OwnerId) -> Self {
        Self {
            repo,
            owner,
            active: Vec::new(),
            trashed: Vec::new(),
        }
    }

    pub fn owner(&self) -> OwnerId {
        self.owner
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    /// Replaces local state with the backend's current rows.
    ///
    /// Returns the number of memos loaded.
    pub fn load(&mut self) -> StoreResult<usize> {
        let started_at = Instant::now();
        let memos = self.repo.fetch_memos(self.owner).map_err(|err| {
            error!(
                "event=memo_load module=store status=error duration_ms={} error={err}",
                started_at.elapsed().as_millis()
            );
            StoreError::Load(err)
        })?;

        let total = memos.len();
        let (trashed, active): (Vec<_>, Vec<_>) = memos.into_iter().partition(|m| m.is_deleted);
        self.active = active;
        self.trashed = trashed;
        info!(
            "event=memo_load module=store status=ok active={} trashed={} duration_ms={}",
            self.active.len(),
            self.trashed.len(),
            started_at.elapsed().as_millis()
        );
        Ok(total)
    }

    /// Active memos in local order (not display order).
    pub fn list(&self) -> &[Memo] {
        &self.active
    }

    /// Memos currently in the trash.
    pub fn trashed(&self) -> &[Memo] {
        &self.trashed
    }

    /// Looks up a memo in either list.
    pub fn get(&self, id: MemoId) -> Option<&Memo> {
        self.active
            .iter()
            .chain(self.trashed.iter())
            .find(|memo| memo.id == id)
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    /// Creates a memo at the end of the manual order.
    pub fn create(
        &mut self,
        title: impl Into<String>,
        content: impl Into<String>,
        color: MemoColor,
    ) -> StoreResult<Memo> {
        let memo = Memo::new(
            self.owner,
            title,
            content,
            color,
            self.active.len() as i64,
        );
        memo.validate()?;
        self.active.push(memo.clone());

        match self.repo.insert_memo(&memo) {
            Ok(stored) => {
                upsert_local(&mut self.active, &mut self.trashed, stored.clone());
                info!(
                    "event=memo_create module=store status=ok memo_id={} position={}",
                    stored.id, stored.position
                );
                Ok(stored)
            }
            Err(err) => Err(self.persist_failed("memo_create", Some(memo.id), err)),
        }
    }

    /// Applies a partial update to an active or trashed memo.
    pub fn update(&mut self, id: MemoId, patch: MemoPatch) -> StoreResult<Memo> {
        let mut candidate = self.get(id).cloned().ok_or(StoreError::NotFound(id))?;
        if patch.is_empty() {
            return Ok(candidate);
        }
        candidate.apply_patch(&patch);
        candidate.validate()?;
        upsert_local(&mut self.active, &mut self.trashed, candidate.clone());

        self.persist_patch("memo_update", id, &patch)
            .map(|stored| stored.unwrap_or(candidate))
    }

    /// Moves an active memo to the trash.
    pub fn soft_delete(&mut self, id: MemoId) -> StoreResult<Memo> {
        let mut memo = remove_by_id(&mut self.active, id).ok_or(StoreError::NotFound(id))?;
        memo.soft_delete();
        self.trashed.push(memo.clone());

        self.persist_patch("memo_trash", id, &MemoPatch::trashed(true))
            .map(|stored| stored.unwrap_or(memo))
    }

    /// Takes a memo back out of the trash, keeping its position.
    pub fn restore(&mut self, id: MemoId) -> StoreResult<Memo> {
        let mut memo = remove_by_id(&mut self.trashed, id).ok_or(StoreError::NotFound(id))?;
        memo.restore();
        self.active.push(memo.clone());

        self.persist_patch("memo_restore", id, &MemoPatch::trashed(false))
            .map(|stored| stored.unwrap_or(memo))
    }

    /// Permanently deletes one trashed memo.
    pub fn purge(&mut self, id: MemoId) -> StoreResult<()> {
        remove_by_id(&mut self.trashed, id).ok_or(StoreError::NotFound(id))?;

        match self.repo.delete_memo(self.owner, id) {
            Ok(()) => {
                info!("event=memo_purge module=store status=ok memo_id={id}");
                Ok(())
            }
            Err(err) => Err(self.persist_failed("memo_purge", Some(id), err)),
        }
    }

    /// Permanently deletes every trashed memo.
    pub fn empty_trash(&mut self) -> EmptyTrashReport {
        let ids = self.trashed.iter().map(|memo| memo.id).collect::<Vec<_>>();
        let mut report = EmptyTrashReport::default();
        for id in ids {
            match self.purge(id) {
                Ok(()) => report.purged.push(id),
                Err(err) => report.failures.push(err),
            }
        }
        info!(
            "event=trash_empty module=store status={} purged={} failed={}",
            if report.failures.is_empty() { "ok" } else { "error" },
            report.purged.len(),
            report.failures.len()
        );
        report
    }

    /// Applies a new order for a subset of active memos and renumbers all
    /// active positions densely.
    ///
    /// Returns the number of positions that changed. When persisting fails
    /// the store reloads from the backend before reporting the error.
    pub fn reorder(&mut self, ordered_ids: &[MemoId]) -> StoreResult<usize> {
        let plan = plan_reorder(&self.active, ordered_ids);
        if !plan.skipped.is_empty() {
            warn!(
                "event=memo_reorder module=store status=skip skipped_ids={}",
                plan.skipped.len()
            );
        }
        self.active = plan.memos;
        let changed = plan.updates.len();
        if changed == 0 {
            return Ok(0);
        }

        match self.repo.update_positions(self.owner, &plan.updates) {
            Ok(()) => {
                info!("event=memo_reorder module=store status=ok changed={changed}");
                Ok(changed)
            }
            Err(err) => {
                let failure = self.persist_failed("memo_reorder", None, err);
                match self.load() {
                    Ok(_) => info!("event=memo_reorder module=store status=resynced"),
                    Err(reload_err) => warn!(
                        "event=memo_reorder module=store status=error resync=failed error={reload_err}"
                    ),
                }
                Err(failure)
            }
        }
    }

    /// Folds one realtime event into local state.
    pub fn apply_remote(&mut self, event: ChangeEvent) -> MergeOutcome {
        let kind = event.kind();
        let memo_id = event.memo_id();
        let outcome = merge_remote(&mut self.active, &mut self.trashed, event);
        debug!(
            "event=realtime_merge module=store kind={kind} memo_id={memo_id} outcome={outcome:?}"
        );
        outcome
    }

    fn persist_patch(
        &mut self,
        operation: &'static str,
        id: MemoId,
        patch: &MemoPatch,
    ) -> StoreResult<Option<Memo>> {
        match self.repo.update_memo(self.owner, id, patch) {
            Ok(stored) => {
                upsert_local(&mut self.active, &mut self.trashed, stored.clone());
                info!("event={operation} module=store status=ok memo_id={id}");
                Ok(Some(stored))
            }
            Err(err) => Err(self.persist_failed(operation, Some(id), err)),
        }
    }

    fn persist_failed(
        &self,
        operation: &'static str,
        memo_id: Option<MemoId>,
        source: RepoError,
    ) -> StoreError {
        match memo_id {
            Some(id) => error!(
                "event={operation} module=store status=error memo_id={id} local_state=kept error={source}"
            ),
            None => error!(
                "event={operation} module=store status=error local_state=kept error={source}"
            ),
        }
        StoreError::Persist {
            operation,
            memo_id,
            source,
        }
    }
}
