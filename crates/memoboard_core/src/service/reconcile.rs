//! Merge of backend records into local memo lists.
//!
//! # Invariants
//! - An incoming record replaces a local copy with the same id only when
//!   `incoming.updated_at >= local.updated_at`; older records are stale.
//! - A memo lives in exactly one list: `trashed` when `is_deleted`, else
//!   `active`.
//! - Replacing within the same list keeps the memo's slot.

use crate::model::memo::{Memo, MemoId};
use crate::repo::change_feed::ChangeEvent;

/// What a merge did to local state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// Record was not known locally and was added.
    Inserted,
    /// Local copy was overwritten (possibly moving between lists).
    Replaced,
    /// Incoming record is older than the local copy.
    IgnoredStale,
    /// Delete event removed a local memo.
    Removed,
    /// Delete event for an id not held locally.
    Absent,
}

impl MergeOutcome {
    /// Returns whether local state changed.
    pub fn changed(self) -> bool {
        matches!(self, Self::Inserted | Self::Replaced | Self::Removed)
    }
}

/// Merges one realtime event under the newer-version-wins rule.
pub fn merge_remote(
    active: &mut Vec<Memo>,
    trashed: &mut Vec<Memo>,
    event: ChangeEvent,
) -> MergeOutcome {
    match event {
        ChangeEvent::Insert(memo) | ChangeEvent::Update(memo) => {
            let stale = find_local(active, trashed, memo.id)
                .is_some_and(|local| memo.updated_at < local.updated_at);
            if stale {
                return MergeOutcome::IgnoredStale;
            }
            upsert_local(active, trashed, memo)
        }
        ChangeEvent::Delete { id, .. } => {
            let removed_active = remove_by_id(active, id).is_some();
            let removed_trashed = remove_by_id(trashed, id).is_some();
            if removed_active || removed_trashed {
                MergeOutcome::Removed
            } else {
                MergeOutcome::Absent
            }
        }
    }
}

/// Places `memo` in the list matching its trash flag, unconditionally.
///
/// Used for authoritative backend responses to this client's own writes.
pub fn upsert_local(active: &mut Vec<Memo>, trashed: &mut Vec<Memo>, memo: Memo) -> MergeOutcome {
    let (target, other) = if memo.is_deleted {
        (trashed, active)
    } else {
        (active, trashed)
    };

    if let Some(slot) = target.iter_mut().find(|local| local.id == memo.id) {
        *slot = memo;
        return MergeOutcome::Replaced;
    }

    let moved = remove_by_id(other, memo.id).is_some();
    target.push(memo);
    if moved {
        MergeOutcome::Replaced
    } else {
        MergeOutcome::Inserted
    }
}

/// Removes and returns the memo with `id`.
pub fn remove_by_id(memos: &mut Vec<Memo>, id: MemoId) -> Option<Memo> {
    let index = memos.iter().position(|memo| memo.id == id)?;
    Some(memos.remove(index))
}

fn find_local<'a>(active: &'a [Memo], trashed: &'a [Memo], id: MemoId) -> Option<&'a Memo> {
    active
        .iter()
        .chain(trashed.iter())
        .find(|memo| memo.id == id)
}

#[cfg(test)]
mod tests {
    use super::{merge_remote, MergeOutcome};
    use crate::model::memo::{Memo, MemoColor};
    use crate::repo::change_feed::ChangeEvent;
    use uuid::Uuid;

    fn memo_at(updated_at: i64) -> Memo {
        let mut memo = Memo::new(Uuid::nil(), "t", "c", MemoColor::Blue, 0);
        memo.updated_at = updated_at;
        memo
    }

    #[test]
    fn insert_of_known_id_does_not_duplicate() {
        let local = memo_at(10);
        let mut active = vec![local.clone()];
        let mut trashed = Vec::new();

        let outcome = merge_remote(&mut active, &mut trashed, ChangeEvent::Insert(local));
        assert_eq!(outcome, MergeOutcome::Replaced);
        assert_eq!(active.len(), 1);
    }

    #[test]
    fn older_record_is_ignored_and_newer_wins() {
        let local = memo_at(10);
        let mut active = vec![local.clone()];
        let mut trashed = Vec::new();

        let mut stale = local.clone();
        stale.updated_at = 9;
        stale.title = "stale".to_string();
        assert_eq!(
            merge_remote(&mut active, &mut trashed, ChangeEvent::Update(stale)),
            MergeOutcome::IgnoredStale
        );
        assert_eq!(active[0].title, "t");

        let mut newer = local;
        newer.updated_at = 11;
        newer.title = "newer".to_string();
        assert_eq!(
            merge_remote(&mut active, &mut trashed, ChangeEvent::Update(newer)),
            MergeOutcome::Replaced
        );
        assert_eq!(active[0].title, "newer");
    }

    #[test]
    fn remote_trash_flag_moves_memo_between_lists() {
        let local = memo_at(1);
        let mut active = vec![local.clone()];
        let mut trashed = Vec::new();

        let mut deleted = local;
        deleted.updated_at = 2;
        deleted.is_deleted = true;
        merge_remote(&mut active, &mut trashed, ChangeEvent::Update(deleted));
        assert!(active.is_empty());
        assert_eq!(trashed.len(), 1);
        assert!(trashed[0].is_deleted);
    }

    #[test]
    fn delete_removes_from_either_list() {
        let gone = memo_at(1);
        let mut active = Vec::new();
        let mut trashed = vec![gone.clone()];
        let event = ChangeEvent::Delete {
            id: gone.id,
            owner: gone.owner,
        };
        assert_eq!(
            merge_remote(&mut active, &mut trashed, event.clone()),
            MergeOutcome::Removed
        );
        assert_eq!(
            merge_remote(&mut active, &mut trashed, event),
            MergeOutcome::Absent
        );
    }
}
