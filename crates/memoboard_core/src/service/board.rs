//! Board facade: memo store, realtime sync and explicit view state.
//!
//! # Responsibility
//! - Own the shared UI state (sort, filter, query, trash view, theme).
//! - Route drag-and-drop gestures to trash or reorder operations.
//!
//! # Invariants
//! - Reorder gestures only apply in manual (`position`) order on the active
//!   list; everything else is ignored.
//! - The realtime subscription is opened before the initial load.

use crate::config::Preferences;
use crate::model::memo::{Memo, MemoColor, MemoId, OwnerId};
use crate::repo::memo_repo::MemoRepository;
use crate::search::display::{process_memos_for_display, DisplayOptions, SortKey};
use crate::service::memo_store::{MemoStore, StoreResult};
use crate::service::realtime_sync::{RealtimeSync, SyncReport};
use crate::service::reorder::drop_order;
use log::debug;

/// View state shared by every board component.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoardView {
    pub sort: SortKey,
    pub color_filter: Option<MemoColor>,
    pub query: String,
    /// Show the trash instead of the active board.
    pub show_trash: bool,
    pub dark_mode: bool,
}

impl BoardView {
    pub fn with_preferences(sort: SortKey, preferences: Preferences) -> Self {
        Self {
            sort,
            dark_mode: preferences.dark_mode,
            ..Self::default()
        }
    }

    pub fn display_options(&self) -> DisplayOptions {
        DisplayOptions {
            sort: self.sort,
            color_filter: self.color_filter.clone(),
            query: self.query.clone(),
        }
    }

    /// Preferences to persist for the next session.
    pub fn preferences(&self) -> Preferences {
        Preferences {
            dark_mode: self.dark_mode,
        }
    }
}

/// Where a dragged memo was released.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropTarget {
    Trash,
    Memo(MemoId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropOutcome {
    Trashed,
    Reordered { changed: usize },
    Ignored,
}

/// One owner's memo board.
pub struct MemoBoard<R: MemoRepository> {
    store: MemoStore<R>,
    realtime: RealtimeSync,
    view: BoardView,
}

impl<R: MemoRepository> MemoBoard<R> {
    /// Subscribes to realtime changes, then loads the owner's memos.
    pub fn open(repo: R, owner: OwnerId, view: BoardView) -> StoreResult<Self> {
        let mut store = MemoStore::new(repo, owner);
        let realtime = RealtimeSync::connect(&store);
        store.load()?;
        Ok(Self {
            store,
            realtime,
            view,
        })
    }

    pub fn store(&self) -> &MemoStore<R> {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut MemoStore<R> {
        &mut self.store
    }

    pub fn view(&self) -> &BoardView {
        &self.view
    }

    /// Memos as the board shows them under the current view.
    pub fn displayed(&self) -> Vec<Memo> {
        let source = if self.view.show_trash {
            self.store.trashed()
        } else {
            self.store.list()
        };
        process_memos_for_display(source, &self.view.display_options())
    }

    /// Trashed memos, unfiltered.
    pub fn trash(&self) -> &[Memo] {
        self.store.trashed()
    }

    /// Handles the end of a drag gesture.
    pub fn drop_on(&mut self, active_id: MemoId, target: DropTarget) -> StoreResult<DropOutcome> {
        if self.view.show_trash {
            return Ok(DropOutcome::Ignored);
        }
        match target {
            DropTarget::Trash => {
                self.store.soft_delete(active_id)?;
                Ok(DropOutcome::Trashed)
            }
            DropTarget::Memo(over_id) => {
                let displayed = self.displayed();
                let Some(order) = drop_order(self.view.sort, &displayed, active_id, over_id)
                else {
                    debug!(
                        "event=memo_drop module=board status=skip sort={} memo_id={active_id}",
                        self.view.sort
                    );
                    return Ok(DropOutcome::Ignored);
                };
                let changed = self.store.reorder(&order)?;
                Ok(DropOutcome::Reordered { changed })
            }
        }
    }

    /// Applies pending realtime events.
    pub fn sync(&mut self) -> StoreResult<SyncReport> {
        self.realtime.pump(&mut self.store)
    }

    pub fn is_live(&self) -> bool {
        self.realtime.is_connected()
    }

    pub fn set_sort(&mut self, sort: SortKey) {
        self.view.sort = sort;
    }

    pub fn set_color_filter(&mut self, color: Option<MemoColor>) {
        self.view.color_filter = color;
    }

    pub fn set_query(&mut self, query: impl Into<String>) {
        self.view.query = query.into();
    }

    pub fn set_show_trash(&mut self, show_trash: bool) {
        self.view.show_trash = show_trash;
    }

    /// Flips the theme and returns the new `dark_mode` value.
    pub fn toggle_dark_mode(&mut self) -> bool {
        self.view.dark_mode = !self.view.dark_mode;
        self.view.dark_mode
    }
}
