//! Property-based tests for selection remapping

use std::collections::BTreeSet;

use proptest::prelude::*;
use rowkeeper_core::{IndexEdit, SelectionTracker, remap_after_move};

/// Moves the element at `old` to final position `new` and reports where
/// every original index ended up
fn simulate_move(len: usize, old: usize, new: usize) -> Vec<usize> {
    let mut items: Vec<usize> = (0..len).collect();
    let moved = items.remove(old);
    items.insert(new, moved);
    let mut position = vec![0; len];
    for (index, original) in items.into_iter().enumerate() {
        position[original] = index;
    }
    position
}

fn arb_move_with_selection() -> impl Strategy<Value = (usize, usize, usize, BTreeSet<usize>)> {
    (2..30usize).prop_flat_map(|len| {
        (
            Just(len),
            0..len,
            0..len,
            prop::collection::btree_set(0..len, 0..len),
        )
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]

    /// Every selected entry is still selected at its new position
    #[test]
    fn prop_remap_follows_entries((len, old, new, selection) in arb_move_with_selection()) {
        let position = simulate_move(len, old, new);
        let expected: BTreeSet<usize> = selection.iter().map(|&i| position[i]).collect();
        prop_assert_eq!(remap_after_move(old, new, &selection), expected);
    }

    /// Remapping never changes how many entries are selected
    #[test]
    fn prop_remap_preserves_count((_, old, new, selection) in arb_move_with_selection()) {
        prop_assert_eq!(remap_after_move(old, new, &selection).len(), selection.len());
    }

    /// A removal then an insertion at the same index is the identity for
    /// unaffected entries
    #[test]
    fn prop_replace_in_place_keeps_neighbors(
        selection in prop::collection::btree_set(0..20usize, 0..10),
        index in 0..20usize,
    ) {
        let mut tracker = SelectionTracker::from_indices(selection.iter().copied());
        tracker.apply_edits(&[IndexEdit::Removed(index), IndexEdit::Inserted(index)]);
        let expected: BTreeSet<usize> = selection.into_iter().filter(|&i| i != index).collect();
        prop_assert_eq!(tracker.indices(), &expected);
    }
}

#[test]
fn forward_move_example() {
    let selection = BTreeSet::from([2, 5, 7]);
    assert_eq!(
        remap_after_move(2, 8, &selection),
        BTreeSet::from([8, 4, 6])
    );
}

#[test]
fn backward_move_example() {
    let selection = BTreeSet::from([3, 5, 8]);
    assert_eq!(
        remap_after_move(8, 2, &selection),
        BTreeSet::from([2, 4, 6])
    );
}
