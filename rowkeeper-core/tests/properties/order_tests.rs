//! Property-based tests for the order model

use std::collections::HashSet;

use proptest::prelude::*;
use rowkeeper_core::{OrderChange, OrderEntry, OrderModel, unique_group_name};

use super::strategies::distinct_entries;

/// Order length with a source index and a target index
fn arb_move() -> impl Strategy<Value = (usize, usize, usize)> {
    (2..20usize).prop_flat_map(|n| (Just(n), 0..n, 0..=n))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Moving an entry and moving it back restores the original sequence
    #[test]
    fn prop_move_round_trip_restores_order((n, from, target) in arb_move()) {
        let original = distinct_entries(n);
        let mut model = OrderModel::new(original.clone());
        let entry = original[from].clone();

        let change = model.move_entry(&entry, target).unwrap();
        let to = match change {
            OrderChange::Moved { to, .. } => to,
            other => panic!("expected a move, got {other:?}"),
        };

        // Landing before the entry now at `from` needs one extra slot when
        // the entry currently sits above that point.
        let back = if to < from { from + 1 } else { from };
        model.move_entry(&entry, back).unwrap();
        prop_assert_eq!(model.entries(), original.as_slice());
    }

    /// The final position does not depend on direction
    #[test]
    fn prop_move_lands_before_target((n, from, target) in arb_move()) {
        let original = distinct_entries(n);
        let mut model = OrderModel::new(original.clone());
        let entry = original[from].clone();
        model.move_entry(&entry, target).unwrap();

        let expected = if from < target { target - 1 } else { target };
        prop_assert_eq!(model.position(&entry), Some(expected));
        prop_assert_eq!(model.len(), n);
    }

    /// Visual and logical indices translate consistently
    #[test]
    fn prop_visual_and_logical_indices_agree(
        n in 1..20usize,
        mask in prop::collection::vec(any::<bool>(), 20),
    ) {
        let entries = distinct_entries(n);
        let visible: HashSet<OrderEntry> = entries
            .iter()
            .zip(&mask)
            .filter(|(_, shown)| **shown)
            .map(|(e, _)| e.clone())
            .collect();
        let model = OrderModel::new(entries.clone());

        let mut visual = 0;
        for (logical, entry) in entries.iter().enumerate() {
            let index = model.top_level_visual_index_of(entry, &visible);
            if visible.contains(entry) {
                prop_assert_eq!(index, Some(visual));
                prop_assert_eq!(model.insertion_logical_index_for(visual, None, &visible), logical);
                visual += 1;
            } else {
                prop_assert_eq!(index, None);
            }
        }
        prop_assert_eq!(model.visible_count(None, &visible), visual);
        prop_assert_eq!(model.insertion_logical_index_for(visual, None, &visible), n);
    }

    /// Dropping at the origin slot of a visible entry is a no-op
    #[test]
    fn prop_drop_at_origin_is_noop(
        n in 1..20usize,
        pick in any::<prop::sample::Index>(),
    ) {
        let entries = distinct_entries(n);
        let visible: HashSet<OrderEntry> = entries.iter().cloned().collect();
        let mut model = OrderModel::new(entries.clone());
        let entry = pick.get(&entries).clone();

        let origin = model.top_level_visual_index_of(&entry, &visible).unwrap();
        let logical = model.insertion_logical_index_for(origin, Some(&entry), &visible);
        let change = model.move_entry(&entry, logical).unwrap();
        prop_assert!(!change.is_change());
        prop_assert_eq!(model.entries(), entries.as_slice());
    }

    /// Synthesized names never collide
    #[test]
    fn prop_unique_group_name_avoids_taken(taken in prop::collection::btree_set(0..12u32, 0..12)) {
        let names: HashSet<String> = taken
            .iter()
            .map(|n| if *n <= 1 { "New Group".to_string() } else { format!("New Group {n}") })
            .collect();
        let name = unique_group_name("New Group", |candidate| names.contains(candidate));
        prop_assert!(!names.contains(&name));
        prop_assert!(name.starts_with("New Group"));
    }
}

#[test]
fn moving_beyond_end_clamps() {
    let mut model = OrderModel::new(distinct_entries(3));
    model.move_entry(&OrderEntry::leaf("e0"), 99).unwrap();
    assert_eq!(model.entries().last(), Some(&OrderEntry::leaf("e0")));
}
