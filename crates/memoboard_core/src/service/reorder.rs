//! Drag-and-drop reordering.
//!
//! # Invariants
//! - A plan renumbers every active memo densely `0..N-1`.
//! - Memos outside the visible subset keep their relative order and follow
//!   the visible ones.
//! - `updates` lists only positions that actually changed.

use crate::model::memo::{Memo, MemoId, PositionUpdate};
use crate::search::display::SortKey;
use std::collections::HashSet;

/// Result of applying a new visible order to the active list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReorderPlan {
    /// Active memos in their new order, positions already assigned.
    pub memos: Vec<Memo>,
    /// Positions to persist.
    pub updates: Vec<PositionUpdate>,
    /// Requested ids that were unknown or repeated.
    pub skipped: Vec<MemoId>,
}

/// Moves the element at `from` to `to`. Out-of-range indexes leave the
/// sequence unchanged.
pub fn move_id(ids: &[MemoId], from: usize, to: usize) -> Vec<MemoId> {
    let mut moved = ids.to_vec();
    if from >= moved.len() || to >= moved.len() {
        return moved;
    }
    let id = moved.remove(from);
    moved.insert(to, id);
    moved
}

/// Computes the visible order produced by dropping `active_id` onto
/// `over_id`.
///
/// Returns `None` when the board is not in manual order, when either id is
/// not displayed, or when the memo was dropped onto itself.
pub fn drop_order(
    sort: SortKey,
    displayed: &[Memo],
    active_id: MemoId,
    over_id: MemoId,
) -> Option<Vec<MemoId>> {
    if sort != SortKey::Position || active_id == over_id {
        return None;
    }
    let ids = displayed.iter().map(|memo| memo.id).collect::<Vec<_>>();
    let from = ids.iter().position(|id| *id == active_id)?;
    let to = ids.iter().position(|id| *id == over_id)?;
    Some(move_id(&ids, from, to))
}

/// Builds the full active order from a visible-subset order.
pub fn plan_reorder(active: &[Memo], ordered_ids: &[MemoId]) -> ReorderPlan {
    let mut seen = HashSet::with_capacity(ordered_ids.len());
    let mut skipped = Vec::new();
    let mut ordered = Vec::with_capacity(active.len());

    for id in ordered_ids {
        match active.iter().find(|memo| memo.id == *id) {
            Some(memo) if seen.insert(*id) => ordered.push(memo.clone()),
            _ => skipped.push(*id),
        }
    }

    let mut rest = active
        .iter()
        .filter(|memo| !seen.contains(&memo.id))
        .cloned()
        .collect::<Vec<_>>();
    rest.sort_by_key(|memo| memo.position);
    ordered.extend(rest);

    let mut updates = Vec::new();
    for (index, memo) in ordered.iter_mut().enumerate() {
        let position = index as i64;
        if memo.position != position {
            memo.position = position;
            updates.push(PositionUpdate {
                id: memo.id,
                position,
            });
        }
    }

    ReorderPlan {
        memos: ordered,
        updates,
        skipped,
    }
}

/// Returns whether positions are exactly a permutation of `0..N-1`.
pub fn is_dense(memos: &[Memo]) -> bool {
    let mut positions = memos.iter().map(|memo| memo.position).collect::<Vec<_>>();
    positions.sort_unstable();
    positions
        .iter()
        .enumerate()
        .all(|(index, position)| *position == index as i64)
}

#[cfg(test)]
mod tests {
    use super::{drop_order, is_dense, move_id, plan_reorder};
    use crate::model::memo::{Memo, MemoColor};
    use crate::search::display::SortKey;
    use uuid::Uuid;

    fn memos(count: usize) -> Vec<Memo> {
        (0..count)
            .map(|index| {
                Memo::new(
                    Uuid::nil(),
                    format!("m{index}"),
                    "",
                    MemoColor::Yellow,
                    index as i64,
                )
            })
            .collect()
    }

    #[test]
    fn move_id_matches_array_move_semantics() {
        let ids = memos(4).iter().map(|memo| memo.id).collect::<Vec<_>>();
        assert_eq!(move_id(&ids, 3, 0), vec![ids[3], ids[0], ids[1], ids[2]]);
        assert_eq!(move_id(&ids, 0, 2), vec![ids[1], ids[2], ids[0], ids[3]]);
        assert_eq!(move_id(&ids, 9, 0), ids);
    }

    #[test]
    fn dragging_last_before_first_renumbers_densely() {
        let active = memos(3);
        let order = drop_order(SortKey::Position, &active, active[2].id, active[0].id)
            .expect("position mode drop should reorder");
        let plan = plan_reorder(&active, &order);

        let titles = plan
            .memos
            .iter()
            .map(|memo| (memo.title.as_str(), memo.position))
            .collect::<Vec<_>>();
        assert_eq!(titles, [("m2", 0), ("m0", 1), ("m1", 2)]);
        assert_eq!(plan.updates.len(), 3);
        assert!(is_dense(&plan.memos));
    }

    #[test]
    fn hidden_memos_follow_visible_ones_in_position_order() {
        let active = memos(5);
        // Only m1 and m3 are visible, m3 dragged before m1.
        let plan = plan_reorder(&active, &[active[3].id, active[1].id]);
        let titles = plan
            .memos
            .iter()
            .map(|memo| memo.title.as_str())
            .collect::<Vec<_>>();
        assert_eq!(titles, ["m3", "m1", "m0", "m2", "m4"]);
        assert!(is_dense(&plan.memos));
    }

    #[test]
    fn unknown_and_duplicate_ids_are_skipped() {
        let active = memos(2);
        let stranger = Uuid::new_v4();
        let plan = plan_reorder(&active, &[active[1].id, stranger, active[1].id]);
        assert_eq!(plan.skipped, vec![stranger, active[1].id]);
        assert_eq!(plan.memos.len(), 2);
        assert!(is_dense(&plan.memos));
    }

    #[test]
    fn unchanged_order_produces_no_updates() {
        let active = memos(3);
        let ids = active.iter().map(|memo| memo.id).collect::<Vec<_>>();
        assert!(plan_reorder(&active, &ids).updates.is_empty());
    }

    #[test]
    fn drop_order_is_none_outside_position_mode_or_on_self() {
        let active = memos(2);
        assert!(drop_order(SortKey::Color, &active, active[0].id, active[1].id).is_none());
        assert!(drop_order(SortKey::Position, &active, active[0].id, active[0].id).is_none());
        assert!(drop_order(SortKey::Position, &active, Uuid::new_v4(), active[0].id).is_none());
    }
}
