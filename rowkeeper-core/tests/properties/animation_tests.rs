//! Property-based tests for gap easing

use std::time::Duration;

use proptest::prelude::*;
use rowkeeper_core::{GapAnimator, GapTarget};

fn arb_frame() -> impl Strategy<Value = Duration> {
    (1..200u64).prop_map(Duration::from_millis)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// A held target is approached monotonically and never overshot
    #[test]
    fn prop_gap_converges_without_overshoot(
        size in 1.0..200.0f64,
        index in 0..20usize,
        smoothing in 5.0..30.0f64,
        frame in (10..200u64).prop_map(Duration::from_millis),
    ) {
        let mut animator = GapAnimator::new(smoothing, Duration::from_millis(50));
        let target = Some(GapTarget { index, size });
        let mut previous = 0.0;
        for _ in 0..600 {
            animator.tick(target, frame);
            let gap = animator.gap(index);
            prop_assert!(gap >= previous - 1e-9, "gap shrank while target held");
            prop_assert!(gap <= size + 1e-9, "gap overshot: {} > {}", gap, size);
            previous = gap;
        }
        prop_assert!((animator.gap(index) - size).abs() < 0.01);
    }

    /// Without a target every gap closes
    #[test]
    fn prop_gaps_settle_without_target(
        opened in prop::collection::btree_map(0..10usize, 1.0..100.0f64, 0..5),
        frame in arb_frame(),
    ) {
        let mut animator = GapAnimator::default();
        for (index, size) in &opened {
            animator.open_at(*index, *size);
        }
        for _ in 0..1000 {
            animator.tick(None, frame);
            prop_assert!(animator.iter().all(|(_, gap)| gap >= 0.0));
        }
        prop_assert!(animator.is_settled());
    }

    /// A stalled frame moves no further than a capped one
    #[test]
    fn prop_stalled_frame_is_capped(size in 1.0..200.0f64, stall in 50..10_000u64) {
        let cap = Duration::from_millis(50);
        let mut stalled = GapAnimator::new(14.0, cap);
        let mut capped = GapAnimator::new(14.0, cap);
        let target = Some(GapTarget { index: 0, size });
        stalled.tick(target, Duration::from_millis(stall));
        capped.tick(target, cap);
        prop_assert!((stalled.gap(0) - capped.gap(0)).abs() < 1e-9);
    }
}
