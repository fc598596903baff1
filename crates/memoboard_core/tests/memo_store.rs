use memoboard_core::db::open_db_in_memory;
use memoboard_core::repo::change_feed::ChangeSubscription;
use memoboard_core::service::reorder::is_dense;
use memoboard_core::{
    ChangeEvent, Memo, MemoColor, MemoId, MemoPatch, MemoRepository, MemoStore, MemoValidationError,
    MergeOutcome, OwnerId, PositionUpdate, RepoError, RepoResult, SqliteMemoRepository,
    StoreError,
};
use std::cell::Cell;
use uuid::Uuid;

/// Backend whose writes can be switched to fail.
struct FlakyRepo<'conn> {
    inner: SqliteMemoRepository<'conn>,
    offline: Cell<bool>,
}

impl<'conn> FlakyRepo<'conn> {
    fn new(inner: SqliteMemoRepository<'conn>) -> Self {
        Self {
            inner,
            offline: Cell::new(false),
        }
    }

    fn check(&self) -> RepoResult<()> {
        if self.offline.get() {
            return Err(RepoError::InvalidData("backend offline".to_string()));
        }
        Ok(())
    }
}

impl MemoRepository for FlakyRepo<'_> {
    fn fetch_memos(&self, owner: OwnerId) -> RepoResult<Vec<Memo>> {
        self.inner.fetch_memos(owner)
    }

    fn get_memo(&self, owner: OwnerId, id: MemoId) -> RepoResult<Option<Memo>> {
        self.inner.get_memo(owner, id)
    }

    fn insert_memo(&self, memo: &Memo) -> RepoResult<Memo> {
        self.check()?;
        self.inner.insert_memo(memo)
    }

    fn update_memo(&self, owner: OwnerId, id: MemoId, patch: &MemoPatch) -> RepoResult<Memo> {
        self.check()?;
        self.inner.update_memo(owner, id, patch)
    }

    fn delete_memo(&self, owner: OwnerId, id: MemoId) -> RepoResult<()> {
        self.check()?;
        self.inner.delete_memo(owner, id)
    }

    fn update_positions(&self, owner: OwnerId, updates: &[PositionUpdate]) -> RepoResult<()> {
        self.check()?;
        self.inner.update_positions(owner, updates)
    }

    fn subscribe(&self, owner: OwnerId) -> ChangeSubscription {
        self.inner.subscribe(owner)
    }
}

fn set_offline(store: &MemoStore<FlakyRepo<'_>>, offline: bool) {
    store.repository().offline.set(offline);
}

fn titles_by_position(memos: &[Memo]) -> Vec<String> {
    let mut sorted = memos.to_vec();
    sorted.sort_by_key(|memo| memo.position);
    sorted.into_iter().map(|memo| memo.title).collect()
}

#[test]
fn create_appends_at_end_and_persists() {
    let conn = open_db_in_memory().unwrap();
    let owner = Uuid::new_v4();
    let mut store = MemoStore::new(SqliteMemoRepository::try_new(&conn).unwrap(), owner);

    for title in ["a", "b", "c"] {
        store.create(title, "", MemoColor::Yellow).unwrap();
    }
    let positions = store.list().iter().map(|m| m.position).collect::<Vec<_>>();
    assert_eq!(positions, [0, 1, 2]);

    let mut fresh = MemoStore::new(SqliteMemoRepository::try_new(&conn).unwrap(), owner);
    assert_eq!(fresh.load().unwrap(), 3);
    assert_eq!(titles_by_position(fresh.list()), ["a", "b", "c"]);
}

#[test]
fn invalid_create_changes_nothing() {
    let conn = open_db_in_memory().unwrap();
    let mut store = MemoStore::new(
        SqliteMemoRepository::try_new(&conn).unwrap(),
        Uuid::new_v4(),
    );

    let err = store.create("  ", "", MemoColor::Red).unwrap_err();
    assert!(matches!(
        err,
        StoreError::Validation(MemoValidationError::EmptyMemo)
    ));
    assert!(store.is_empty());
    assert!(store.repository().fetch_memos(store.owner()).unwrap().is_empty());
}

#[test]
fn soft_delete_then_restore_reverses_exactly() {
    let conn = open_db_in_memory().unwrap();
    let mut store = MemoStore::new(
        SqliteMemoRepository::try_new(&conn).unwrap(),
        Uuid::new_v4(),
    );
    let first = store.create("first", "x", MemoColor::Blue).unwrap();
    let second = store.create("second", "y", MemoColor::Red).unwrap();

    let trashed = store.soft_delete(first.id).unwrap();
    assert!(trashed.is_deleted);
    assert_eq!(store.len(), 1);
    assert_eq!(store.trashed().len(), 1);
    assert!(store.list().iter().all(|memo| memo.id != first.id));

    let restored = store.restore(first.id).unwrap();
    assert!(!restored.is_deleted);
    assert_eq!(restored.position, first.position);
    assert_eq!(restored.title, first.title);
    assert_eq!(restored.content, first.content);
    assert_eq!(restored.color, first.color);
    assert!(store.trashed().is_empty());
    assert_eq!(titles_by_position(store.list()), ["first", "second"]);
    assert!(store.get(second.id).is_some());
}

#[test]
fn unknown_ids_return_not_found_and_change_nothing() {
    let conn = open_db_in_memory().unwrap();
    let mut store = MemoStore::new(
        SqliteMemoRepository::try_new(&conn).unwrap(),
        Uuid::new_v4(),
    );
    let memo = store.create("keep", "", MemoColor::Green).unwrap();
    let missing = Uuid::new_v4();

    assert!(matches!(store.soft_delete(missing), Err(StoreError::NotFound(_))));
    assert!(matches!(store.restore(memo.id), Err(StoreError::NotFound(_))));
    assert!(matches!(store.purge(memo.id), Err(StoreError::NotFound(_))));
    assert!(matches!(
        store.update(missing, MemoPatch::trashed(true)),
        Err(StoreError::NotFound(_))
    ));
    assert_eq!(store.len(), 1);
    assert!(store.trashed().is_empty());
}

#[test]
fn failed_persist_keeps_local_state() {
    let conn = open_db_in_memory().unwrap();
    let mut store = MemoStore::new(
        FlakyRepo::new(SqliteMemoRepository::try_new(&conn).unwrap()),
        Uuid::new_v4(),
    );
    let memo = store.create("original", "", MemoColor::Yellow).unwrap();

    set_offline(&store, true);
    let err = store
        .update(
            memo.id,
            MemoPatch {
                title: Some("edited".to_string()),
                ..MemoPatch::default()
            },
        )
        .unwrap_err();
    assert!(matches!(
        err,
        StoreError::Persist {
            operation: "memo_update",
            memo_id: Some(id),
            ..
        } if id == memo.id
    ));
    assert_eq!(store.get(memo.id).unwrap().title, "edited");

    let backend = store
        .repository()
        .get_memo(store.owner(), memo.id)
        .unwrap()
        .unwrap();
    assert_eq!(backend.title, "original");
}

#[test]
fn failed_create_keeps_optimistic_memo() {
    let conn = open_db_in_memory().unwrap();
    let mut store = MemoStore::new(
        FlakyRepo::new(SqliteMemoRepository::try_new(&conn).unwrap()),
        Uuid::new_v4(),
    );
    set_offline(&store, true);

    assert!(matches!(
        store.create("offline", "", MemoColor::Red),
        Err(StoreError::Persist { .. })
    ));
    assert_eq!(store.len(), 1);
    assert_eq!(store.list()[0].title, "offline");
}

#[test]
fn reorder_moves_last_memo_first_with_dense_positions() {
    let conn = open_db_in_memory().unwrap();
    let mut store = MemoStore::new(
        SqliteMemoRepository::try_new(&conn).unwrap(),
        Uuid::new_v4(),
    );
    let a = store.create("A", "", MemoColor::Yellow).unwrap();
    let b = store.create("B", "", MemoColor::Yellow).unwrap();
    let c = store.create("C", "", MemoColor::Yellow).unwrap();

    let changed = store.reorder(&[c.id, a.id, b.id]).unwrap();
    assert_eq!(changed, 3);
    assert!(is_dense(store.list()));
    assert_eq!(titles_by_position(store.list()), ["C", "A", "B"]);

    let backend = store.repository().fetch_memos(store.owner()).unwrap();
    assert_eq!(titles_by_position(&backend), ["C", "A", "B"]);
    assert!(is_dense(&backend));
}

#[test]
fn reorder_with_same_order_writes_nothing() {
    let conn = open_db_in_memory().unwrap();
    let mut store = MemoStore::new(
        SqliteMemoRepository::try_new(&conn).unwrap(),
        Uuid::new_v4(),
    );
    let a = store.create("A", "", MemoColor::Yellow).unwrap();
    let b = store.create("B", "", MemoColor::Yellow).unwrap();

    assert_eq!(store.reorder(&[a.id, b.id]).unwrap(), 0);
}

#[test]
fn failed_reorder_resyncs_from_backend() {
    let conn = open_db_in_memory().unwrap();
    let mut store = MemoStore::new(
        FlakyRepo::new(SqliteMemoRepository::try_new(&conn).unwrap()),
        Uuid::new_v4(),
    );
    let a = store.create("A", "", MemoColor::Yellow).unwrap();
    let b = store.create("B", "", MemoColor::Yellow).unwrap();

    set_offline(&store, true);
    let err = store.reorder(&[b.id, a.id]).unwrap_err();
    assert!(matches!(
        err,
        StoreError::Persist {
            operation: "memo_reorder",
            memo_id: None,
            ..
        }
    ));
    assert_eq!(titles_by_position(store.list()), ["A", "B"]);
    assert!(is_dense(store.list()));
}

#[test]
fn empty_trash_purges_everything_in_trash() {
    let conn = open_db_in_memory().unwrap();
    let mut store = MemoStore::new(
        SqliteMemoRepository::try_new(&conn).unwrap(),
        Uuid::new_v4(),
    );
    let keep = store.create("keep", "", MemoColor::Yellow).unwrap();
    for title in ["x", "y"] {
        let memo = store.create(title, "", MemoColor::Yellow).unwrap();
        store.soft_delete(memo.id).unwrap();
    }

    let report = store.empty_trash();
    assert_eq!(report.purged.len(), 2);
    assert!(report.failures.is_empty());
    assert!(store.trashed().is_empty());

    let backend = store.repository().fetch_memos(store.owner()).unwrap();
    assert_eq!(backend.len(), 1);
    assert_eq!(backend[0].id, keep.id);
}

#[test]
fn empty_trash_reports_backend_failures() {
    let conn = open_db_in_memory().unwrap();
    let mut store = MemoStore::new(
        FlakyRepo::new(SqliteMemoRepository::try_new(&conn).unwrap()),
        Uuid::new_v4(),
    );
    let memo = store.create("gone", "", MemoColor::Yellow).unwrap();
    store.soft_delete(memo.id).unwrap();

    set_offline(&store, true);
    let report = store.empty_trash();
    assert!(report.purged.is_empty());
    assert_eq!(report.failures.len(), 1);
    assert!(store.trashed().is_empty());
}

#[test]
fn load_partitions_active_and_trashed() {
    let conn = open_db_in_memory().unwrap();
    let owner = Uuid::new_v4();
    let repo = SqliteMemoRepository::try_new(&conn).unwrap();
    let kept = repo
        .insert_memo(&Memo::new(owner, "kept", "", MemoColor::Red, 0))
        .unwrap();
    let binned = repo
        .insert_memo(&Memo::new(owner, "binned", "", MemoColor::Red, 1))
        .unwrap();
    repo.update_memo(owner, binned.id, &MemoPatch::trashed(true))
        .unwrap();

    let mut store = MemoStore::new(repo, owner);
    assert_eq!(store.load().unwrap(), 2);
    assert_eq!(store.list().len(), 1);
    assert_eq!(store.list()[0].id, kept.id);
    assert_eq!(store.trashed().len(), 1);
    assert_eq!(store.trashed()[0].id, binned.id);
}

#[test]
fn apply_remote_prefers_newer_versions() {
    let conn = open_db_in_memory().unwrap();
    let mut store = MemoStore::new(
        SqliteMemoRepository::try_new(&conn).unwrap(),
        Uuid::new_v4(),
    );
    let memo = store.create("local", "", MemoColor::Yellow).unwrap();

    let mut stale = memo.clone();
    stale.title = "stale".to_string();
    stale.updated_at -= 1;
    assert_eq!(
        store.apply_remote(ChangeEvent::Update(stale)),
        MergeOutcome::IgnoredStale
    );
    assert_eq!(store.get(memo.id).unwrap().title, "local");

    let mut newer = memo.clone();
    newer.title = "remote".to_string();
    newer.updated_at += 1;
    assert_eq!(
        store.apply_remote(ChangeEvent::Update(newer)),
        MergeOutcome::Replaced
    );
    assert_eq!(store.get(memo.id).unwrap().title, "remote");
    assert_eq!(store.len(), 1);
}
