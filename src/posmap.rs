//! Position-map editing operations
//!
//! Pure state transitions over [`PositionMap`]: each returns a new map and
//! never fails. Slots are shared across all items in a map, so row edits
//! apply to every item in lockstep.
//!
//! The one invariant these operations maintain is that within an item no
//! physical key index is assigned to two slots at once. Assignment is
//! swap-based: mapping a key to a new slot moves the displaced value into
//! the slot that previously held the key.

use crate::model::{PositionMap, PositionMapItem};

impl PositionMap {
    /// Assign `key` to `slot` for the item mapping `layout`.
    ///
    /// If the slot already holds that key, it is cleared instead (toggle).
    /// If another slot holds the key, the two slots swap values. Slots beyond
    /// the current length are created by padding with unassigned entries.
    #[must_use]
    pub fn assign(&self, layout: &str, slot: usize, key: u32) -> PositionMap {
        self.map_items(|item| {
            if item.physical_layout != layout {
                return item.positions.clone();
            }

            let mut resized = item.positions.clone();
            if resized.len() <= slot {
                resized.resize(slot + 1, None);
            }

            let displaced = resized[slot];

            resized
                .iter()
                .enumerate()
                .map(|(i, &current)| {
                    if i == slot {
                        if current == Some(key) {
                            None
                        } else {
                            Some(key)
                        }
                    } else if current == Some(key) {
                        displaced
                    } else {
                        current
                    }
                })
                .collect()
        })
    }

    /// Append an unassigned slot to every item.
    #[must_use]
    pub fn add_row(&self) -> PositionMap {
        self.map_items(|item| {
            let mut positions = item.positions.clone();
            positions.push(None);
            positions
        })
    }

    /// Remove the slot at `index` from every item, shifting later slots down.
    ///
    /// Out-of-range indices leave the map unchanged.
    #[must_use]
    pub fn remove_row(&self, index: usize) -> PositionMap {
        self.map_items(|item| {
            let mut positions = item.positions.clone();
            if index < positions.len() {
                positions.remove(index);
            }
            positions
        })
    }

    /// Clear every item's positions.
    #[must_use]
    pub fn reset(&self) -> PositionMap {
        self.map_items(|_| Vec::new())
    }

    fn map_items(&self, f: impl Fn(&PositionMapItem) -> Vec<Option<u32>>) -> PositionMap {
        PositionMap {
            id: self.id.clone(),
            complete: self.complete,
            children: self
                .children
                .iter()
                .map(|item| PositionMapItem {
                    id: item.id.clone(),
                    physical_layout: item.physical_layout.clone(),
                    positions: f(item),
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NodeId;

    fn map(items: &[(&str, &[Option<u32>])]) -> PositionMap {
        PositionMap {
            id: NodeId::new("/position_map", ""),
            complete: false,
            children: items
                .iter()
                .map(|(layout, positions)| PositionMapItem {
                    id: NodeId::new(format!("/position_map/{layout}"), ""),
                    physical_layout: layout.to_string(),
                    positions: positions.to_vec(),
                })
                .collect(),
        }
    }

    fn positions(map: &PositionMap, layout: &str) -> Vec<Option<u32>> {
        map.children
            .iter()
            .find(|item| item.physical_layout == layout)
            .unwrap()
            .positions
            .clone()
    }

    #[test]
    fn test_assign_to_empty_slot() {
        let m = map(&[("a", &[None, None])]);
        let m = m.assign("a", 1, 5);
        assert_eq!(positions(&m, "a"), vec![None, Some(5)]);
    }

    #[test]
    fn test_assign_pads_out_of_range_slot() {
        let m = map(&[("a", &[])]);
        let m = m.assign("a", 3, 1);
        assert_eq!(positions(&m, "a"), vec![None, None, None, Some(1)]);
    }

    #[test]
    fn test_assign_toggles_off_same_key() {
        let m = map(&[("a", &[Some(5)])]);
        let m = m.assign("a", 0, 5);
        assert_eq!(positions(&m, "a"), vec![None]);
    }

    #[test]
    fn test_assign_swaps_with_previous_slot() {
        let m = map(&[("a", &[Some(0), Some(1), None])]);
        let m = m.assign("a", 2, 0);
        assert_eq!(positions(&m, "a"), vec![None, Some(1), Some(0)]);
    }

    #[test]
    fn test_assign_swap_preserves_displaced_value() {
        let m = map(&[("a", &[Some(0), Some(1)])]);
        let m = m.assign("a", 0, 1);
        assert_eq!(positions(&m, "a"), vec![Some(1), Some(0)]);
    }

    #[test]
    fn test_assign_only_touches_matching_layout() {
        let m = map(&[("a", &[Some(0)]), ("b", &[Some(0)])]);
        let m = m.assign("a", 1, 0);
        assert_eq!(positions(&m, "a"), vec![None, Some(0)]);
        assert_eq!(positions(&m, "b"), vec![Some(0)]);
    }

    #[test]
    fn test_assign_never_duplicates_a_key() {
        let mut m = map(&[("a", &[])]);

        // An arbitrary burst of assignments, including repeats.
        let edits = [
            (0usize, 3u32),
            (1, 3),
            (2, 1),
            (5, 3),
            (0, 1),
            (1, 1),
            (3, 0),
            (3, 0),
            (2, 3),
        ];
        for (slot, key) in edits {
            m = m.assign("a", slot, key);

            let assigned: Vec<u32> = positions(&m, "a").into_iter().flatten().collect();
            let mut deduped = assigned.clone();
            deduped.sort_unstable();
            deduped.dedup();
            assert_eq!(assigned.len(), deduped.len(), "duplicate key after {edits:?}");
        }
    }

    #[test]
    fn test_add_row_extends_all_items() {
        let m = map(&[("a", &[Some(0)]), ("b", &[])]);
        let m = m.add_row();
        assert_eq!(positions(&m, "a"), vec![Some(0), None]);
        assert_eq!(positions(&m, "b"), vec![None]);
    }

    #[test]
    fn test_remove_row_shifts_all_items() {
        let m = map(&[("a", &[Some(0), Some(1), Some(2)]), ("b", &[Some(9), None])]);
        let m = m.remove_row(1);
        assert_eq!(positions(&m, "a"), vec![Some(0), Some(2)]);
        assert_eq!(positions(&m, "b"), vec![Some(9)]);
    }

    #[test]
    fn test_remove_row_out_of_range_is_a_noop() {
        let m = map(&[("a", &[Some(0)])]);
        let m = m.remove_row(5);
        assert_eq!(positions(&m, "a"), vec![Some(0)]);
    }

    #[test]
    fn test_add_then_remove_last_row_restores_state() {
        let original = map(&[("a", &[Some(0), Some(1)]), ("b", &[Some(2), None])]);
        let len = original.children[0].positions.len();
        let round_trip = original.add_row().remove_row(len);
        assert_eq!(round_trip, original);
    }

    #[test]
    fn test_reset_clears_all_items() {
        let m = map(&[("a", &[Some(0), Some(1)]), ("b", &[Some(2)])]);
        let m = m.reset();
        assert!(positions(&m, "a").is_empty());
        assert!(positions(&m, "b").is_empty());
    }

    #[test]
    fn test_operations_do_not_mutate_input() {
        let original = map(&[("a", &[Some(0)])]);
        let _ = original.assign("a", 0, 1);
        let _ = original.add_row();
        let _ = original.remove_row(0);
        let _ = original.reset();
        assert_eq!(positions(&original, "a"), vec![Some(0)]);
    }
}
