//! Pointer gestures driven through the engine against host-style geometry

use std::time::{Duration, Instant};

use rowkeeper_core::{
    CancelReason, DragPhase, DragResolution, FilterCriteria, InMemoryProvider, ItemProvider, Leaf,
    ListEngine, MemoryStore, MoveOutcome, ORDER_KEY, ObservedEvent, Point, PressOutcome, SortKey,
    VisualRow,
};

use super::fixtures::{ROW, SharedRecorder, drag_to, geometry, grab_point, group, id, leaf, open};

const HOLD: Duration = Duration::from_millis(600);

/// Upper half of leaf `c` (rows: Favorites 0..60, Work 60..120, a, b, c)
const OVER_C: Point = Point::new(120.0, 188.0);
/// Lower half of the last row
const BELOW_C: Point = Point::new(120.0, 205.0);
const FAVORITES_HEADER: Point = Point::new(120.0, 15.0);

#[test]
fn quick_release_over_leaf_reorders() {
    let mut engine = open(MemoryStore::new());
    let resolution = drag_to(&mut engine, &leaf("a"), BELOW_C, Duration::ZERO);

    assert_eq!(
        resolution,
        Some(DragResolution::Reorder {
            entry: leaf("a"),
            from_visual: 2,
            to_visual: 4,
        })
    );
    assert_eq!(
        engine.order(),
        &[group("Favorites"), group("Work"), leaf("b"), leaf("c"), leaf("a")]
    );
    assert_eq!(engine.drag().phase(), DragPhase::Idle);
}

#[test]
fn resting_on_leaf_stacks_into_new_group() {
    let mut engine = open(MemoryStore::new());
    let resolution = drag_to(&mut engine, &leaf("a"), OVER_C, HOLD);

    assert_eq!(
        resolution,
        Some(DragResolution::Stack {
            source: id("a"),
            target: id("c"),
        })
    );
    assert_eq!(
        engine.order(),
        &[group("Favorites"), group("Work"), group("New Group"), leaf("b")]
    );
    assert_eq!(
        engine.layout().rows()[2],
        VisualRow::Group {
            name: "New Group".to_string(),
            members: vec![id("a"), id("c")],
            expanded: true,
        }
    );
}

#[test]
fn second_stack_gets_unique_name() {
    let mut engine = open(MemoryStore::new());
    drag_to(&mut engine, &leaf("b"), OVER_C, HOLD);
    assert!(engine.provider().has_group("New Group"));

    let change = engine.provider_mut().add_leaf(Leaf::new("d", "Delta"));
    engine.handle_item_change(&change);
    // Favorites 0..60, Work 60..120, a 120..150, New Group 150..240, d 240..270.
    let resolution = drag_to(&mut engine, &leaf("d"), Point::new(120.0, 130.0), HOLD);

    assert_eq!(
        resolution,
        Some(DragResolution::Stack {
            source: id("d"),
            target: id("a"),
        })
    );
    assert!(engine.provider().has_group("New Group 2"));
}

#[test]
fn releasing_on_group_header_merges() {
    let mut engine = open(MemoryStore::new());
    let resolution = drag_to(&mut engine, &leaf("b"), FAVORITES_HEADER, Duration::ZERO);

    assert_eq!(
        resolution,
        Some(DragResolution::Merge {
            leaf: id("b"),
            group: "Favorites".to_string(),
        })
    );
    assert_eq!(
        engine.order(),
        &[group("Favorites"), group("Work"), leaf("a"), leaf("c")]
    );
    assert_eq!(
        engine.layout().rows()[0],
        VisualRow::Group {
            name: "Favorites".to_string(),
            members: vec![id("b"), id("f1")],
            expanded: true,
        }
    );
}

#[test]
fn merge_wins_over_long_hover() {
    let mut engine = open(MemoryStore::new());
    let resolution = drag_to(
        &mut engine,
        &leaf("b"),
        FAVORITES_HEADER,
        Duration::from_secs(3),
    );
    assert!(matches!(resolution, Some(DragResolution::Merge { .. })));
}

#[test]
fn press_on_grouped_leaf_is_ignored() {
    let mut engine = open(MemoryStore::new());
    engine.assign_to_group(&id("a"), Some("Favorites")).unwrap();
    // Favorites now holds a and f1: 0..90, Work 90..150, b, c.
    let rows = geometry(engine.layout());
    assert_eq!(rows[0].bounds.height, ROW * 3.0);

    // Grouped leaves are not top-level rows, so the press is ignored.
    let now = Instant::now();
    assert_eq!(
        engine.pointer_down(&leaf("a"), Point::new(10.0, 45.0), &rows),
        PressOutcome::Ignored
    );
    assert!(engine.pointer_up(now).is_none());
}

#[test]
fn group_header_reorders_between_rows() {
    let mut engine = open(MemoryStore::new());
    let resolution = drag_to(&mut engine, &group("Work"), Point::new(120.0, 5.0), HOLD);

    assert_eq!(
        resolution,
        Some(DragResolution::Reorder {
            entry: group("Work"),
            from_visual: 1,
            to_visual: 0,
        })
    );
    assert_eq!(
        engine.order(),
        &[group("Work"), group("Favorites"), leaf("a"), leaf("b"), leaf("c")]
    );
}

#[test]
fn group_dragged_over_other_header_never_merges() {
    let mut engine = open(MemoryStore::new());
    let resolution = drag_to(&mut engine, &group("Work"), FAVORITES_HEADER, HOLD);
    assert!(matches!(resolution, Some(DragResolution::Reorder { .. })));
    assert_eq!(engine.order()[0], group("Work"));
}

#[test]
fn release_without_travel_is_click() {
    let mut engine = open(MemoryStore::new());
    let rows = geometry(engine.layout());
    let press = grab_point(&rows, &leaf("b"));
    let now = Instant::now();

    engine.pointer_down(&leaf("b"), press, &rows);
    assert_eq!(
        engine.pointer_move(Point::new(press.x + 2.0, press.y + 1.0), &rows, now),
        MoveOutcome::Armed
    );
    assert_eq!(
        engine.pointer_up(now),
        Some(DragResolution::Click(leaf("b")))
    );
    assert_eq!(
        engine.order(),
        &[group("Favorites"), group("Work"), leaf("a"), leaf("b"), leaf("c")]
    );
}

#[test]
fn escape_leaves_stored_order_untouched() {
    let mut engine = open(MemoryStore::new());
    let before = engine.store().backend().raw(ORDER_KEY).map(str::to_string);
    let rows = geometry(engine.layout());
    let now = Instant::now();

    engine.pointer_down(&leaf("a"), grab_point(&rows, &leaf("a")), &rows);
    assert_eq!(engine.pointer_move(BELOW_C, &rows, now), MoveOutcome::Started);
    assert_eq!(
        engine.cancel_drag(CancelReason::Escape),
        Some(DragResolution::Cancelled {
            entry: leaf("a"),
            reason: CancelReason::Escape,
        })
    );

    assert_eq!(engine.drag().phase(), DragPhase::Idle);
    assert!(engine.gaps().is_settled());
    assert!(engine.pointer_up(now + HOLD).is_none());
    assert_eq!(
        engine.store().backend().raw(ORDER_KEY).map(str::to_string),
        before
    );
}

#[test]
fn second_press_supersedes_active_drag() {
    let mut engine = open(MemoryStore::new());
    let rows = geometry(engine.layout());
    let now = Instant::now();

    engine.pointer_down(&leaf("a"), grab_point(&rows, &leaf("a")), &rows);
    engine.pointer_move(BELOW_C, &rows, now);

    let outcome = engine.pointer_down(&leaf("b"), grab_point(&rows, &leaf("b")), &rows);
    assert_eq!(
        outcome,
        PressOutcome::Superseded(DragResolution::Cancelled {
            entry: leaf("a"),
            reason: CancelReason::Superseded,
        })
    );
    assert!(!engine.drag().is_active());
}

#[test]
fn source_vanishing_mid_drag_cancels() {
    let mut engine = open(MemoryStore::new());
    let rows = geometry(engine.layout());
    let now = Instant::now();

    engine.pointer_down(&leaf("a"), grab_point(&rows, &leaf("a")), &rows);
    engine.pointer_move(OVER_C, &rows, now);

    let change = engine.provider_mut().remove_leaf(&id("a"));
    engine.handle_item_change(&change);

    assert_eq!(engine.drag().phase(), DragPhase::Idle);
    assert!(engine.pointer_up(now + HOLD).is_none());
    assert_eq!(
        engine.order(),
        &[group("Favorites"), group("Work"), leaf("b"), leaf("c")]
    );
}

#[test]
fn filter_change_mid_drag_cancels() {
    let mut engine = open(MemoryStore::new());
    let rows = geometry(engine.layout());
    let now = Instant::now();

    engine.pointer_down(&leaf("c"), grab_point(&rows, &leaf("c")), &rows);
    engine.pointer_move(Point::new(120.0, 5.0), &rows, now);
    engine.set_filters(FilterCriteria::none().with_search("a"));

    assert!(!engine.drag().is_active());
    assert!(engine.pointer_up(now).is_none());
}

#[test]
fn algorithmic_sort_bypasses_manual_placement() {
    let mut engine = open(MemoryStore::new());
    let manual = engine.order().to_vec();

    engine.set_sort_key(SortKey::Name);
    let flat: Vec<VisualRow> = ["a", "b", "c", "f1", "w1"]
        .into_iter()
        .map(|leaf| VisualRow::Leaf { id: id(leaf) })
        .collect();
    assert_eq!(engine.layout().rows(), flat.as_slice());

    let rows = geometry(engine.layout());
    assert_eq!(
        engine.pointer_down(&leaf("a"), grab_point(&rows, &leaf("a")), &rows),
        PressOutcome::Ignored
    );

    engine.set_sort_key(SortKey::Custom);
    assert_eq!(engine.order(), manual.as_slice());
    assert!(engine.layout().rows()[0].is_group());
}

#[test]
fn gap_opens_at_insertion_slot_and_closes_on_release() {
    let mut engine = open(MemoryStore::new());
    let rows = geometry(engine.layout());
    let start = Instant::now();

    engine.pointer_down(&leaf("a"), grab_point(&rows, &leaf("a")), &rows);
    engine.pointer_move(BELOW_C, &rows, start);
    // The origin slot opens instantly so the list does not jump.
    assert!(engine.gaps().gap(2) > 0.0);

    for _ in 0..120 {
        engine.tick(Duration::from_millis(16), start);
    }
    let full = ROW + engine.settings().row_margin;
    assert!((engine.gaps().gap(4) - full).abs() < 0.1);
    assert!(engine.gaps().gap(2) < 0.1);
    assert!((engine.gap_offset(4) - full).abs() < 0.2);

    engine.pointer_up(start);
    assert!(engine.gaps().is_settled());
}

#[test]
fn ready_stack_target_suspends_gap() {
    let mut engine = open(MemoryStore::new());
    let rows = geometry(engine.layout());
    let start = Instant::now();

    engine.pointer_down(&leaf("a"), grab_point(&rows, &leaf("a")), &rows);
    engine.pointer_move(OVER_C, &rows, start);
    assert!(engine.stack_target(start).is_none());
    assert_eq!(engine.stack_target(start + HOLD), Some(&id("c")));

    for _ in 0..200 {
        engine.tick(Duration::from_millis(16), start + HOLD);
    }
    assert!(engine.gaps().is_settled());
}

#[test]
fn moving_off_target_restarts_hover() {
    let mut engine = open(MemoryStore::new());
    let rows = geometry(engine.layout());
    let start = Instant::now();

    engine.pointer_down(&leaf("a"), grab_point(&rows, &leaf("a")), &rows);
    engine.pointer_move(OVER_C, &rows, start);
    // Onto b, then back over c: the hold starts over.
    engine.pointer_move(Point::new(120.0, 165.0), &rows, start + HOLD);
    engine.pointer_move(OVER_C, &rows, start + HOLD);

    assert!(engine.stack_target(start + HOLD).is_none());
    let resolution = engine.pointer_up(start + HOLD + Duration::from_millis(100));
    assert!(matches!(resolution, Some(DragResolution::Reorder { .. })));
}

#[test]
fn overlay_follows_pointer_with_grab_offset() {
    let mut engine = open(MemoryStore::new());
    let rows = geometry(engine.layout());
    let now = Instant::now();

    // Grab a 10px below its top edge.
    engine.pointer_down(&leaf("a"), Point::new(50.0, 130.0), &rows);
    assert!(engine.overlay_origin(Point::new(50.0, 130.0)).is_none());
    engine.pointer_move(Point::new(60.0, 40.0), &rows, now);

    assert_eq!(
        engine.overlay_origin(Point::new(60.0, 40.0)),
        Some(Point::new(10.0, 30.0))
    );
}

#[test]
fn observer_sees_capture_and_reorder() {
    let recorder = SharedRecorder::default();
    let mut engine = open(MemoryStore::new()).with_observer(Box::new(recorder.clone()));

    drag_to(&mut engine, &leaf("a"), BELOW_C, Duration::ZERO);

    assert_eq!(
        recorder.events(),
        vec![
            ObservedEvent::PointerCapture(true),
            ObservedEvent::PointerCapture(false),
            ObservedEvent::Reorder(2, 4),
        ]
    );
}

#[test]
fn observer_sees_group_creation() {
    let recorder = SharedRecorder::default();
    let mut engine = open(MemoryStore::new()).with_observer(Box::new(recorder.clone()));

    drag_to(&mut engine, &leaf("a"), OVER_C, HOLD);

    assert!(recorder.events().contains(&ObservedEvent::GroupCreated(
        "New Group".to_string(),
        vec![id("a"), id("c")],
    )));
}

/// Starts a drag of `a` toward `c` with a recorder attached
fn dragging_a() -> (ListEngine<InMemoryProvider, MemoryStore>, SharedRecorder, Instant) {
    let recorder = SharedRecorder::default();
    let mut engine = open(MemoryStore::new()).with_observer(Box::new(recorder.clone()));
    let rows = geometry(engine.layout());
    let now = Instant::now();

    engine.pointer_down(&leaf("a"), grab_point(&rows, &leaf("a")), &rows);
    assert_eq!(engine.pointer_move(OVER_C, &rows, now), MoveOutcome::Started);
    (engine, recorder, now)
}

/// Capture was taken once and released once, in that order
fn assert_capture_released(recorder: &SharedRecorder) {
    let captures: Vec<bool> = recorder
        .events()
        .into_iter()
        .filter_map(|event| match event {
            ObservedEvent::PointerCapture(captured) => Some(captured),
            _ => None,
        })
        .collect();
    assert_eq!(captures, vec![true, false]);
}

#[test]
fn escape_releases_capture() {
    let (mut engine, recorder, _) = dragging_a();
    engine.cancel_drag(CancelReason::Escape);
    assert_capture_released(&recorder);
}

#[test]
fn capture_loss_releases_capture() {
    let (mut engine, recorder, _) = dragging_a();
    engine.cancel_drag(CancelReason::CaptureLost);
    assert_capture_released(&recorder);
}

#[test]
fn superseding_press_releases_capture() {
    let (mut engine, recorder, _) = dragging_a();
    let rows = geometry(engine.layout());
    engine.pointer_down(&leaf("b"), grab_point(&rows, &leaf("b")), &rows);
    assert_capture_released(&recorder);
}

#[test]
fn vanished_source_releases_capture() {
    let (mut engine, recorder, _) = dragging_a();
    let change = engine.provider_mut().remove_leaf(&id("a"));
    engine.handle_item_change(&change);
    assert_capture_released(&recorder);
}

#[test]
fn filter_change_releases_capture() {
    let (mut engine, recorder, _) = dragging_a();
    engine.set_filters(FilterCriteria::none().with_search("a"));
    assert_capture_released(&recorder);
}

#[test]
fn sort_change_releases_capture() {
    let (mut engine, recorder, _) = dragging_a();
    engine.set_sort_key(SortKey::Name);
    assert_capture_released(&recorder);
}

#[test]
fn collapse_change_releases_capture() {
    let (mut engine, recorder, _) = dragging_a();
    assert_eq!(engine.toggle_collapsed("Work"), Some(true));
    assert_capture_released(&recorder);
}

#[test]
fn programmatic_move_releases_capture() {
    let (mut engine, recorder, now) = dragging_a();
    engine.move_entry(&group("Work"), 0).unwrap();
    assert_capture_released(&recorder);
    assert!(engine.pointer_up(now).is_none());
}
