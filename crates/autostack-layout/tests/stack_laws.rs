#![forbid(unsafe_code)]

//! Property tests for stack state transitions.
//!
//! | Law        | Statement                                                  |
//! |------------|------------------------------------------------------------|
//! | cumulative | `top[i] == sum(height[0..i])` after every transition       |
//! | anchor     | `position[0] == {relative, 0}` whenever the stack is non-empty |
//! | isolation  | resizing slot `k` leaves `position[j]` unchanged for `j <= k` |
//! | idempotent | repeating the last report yields no transition             |
//! | length     | sizes and positions always match the mounted slot count    |

use autostack_layout::{BoxId, BoxPosition, BoxSize, PositionMode, StackState, stack_positions};
use proptest::prelude::*;

// ── Strategies ────────────────────────────────────────────────────────────

/// Heights are whole pixels so sums stay exact in `f64`.
fn height() -> impl Strategy<Value = f64> {
    (0u32..=2_000).prop_map(f64::from)
}

fn size() -> impl Strategy<Value = BoxSize> {
    ((1u32..=1_920).prop_map(f64::from), height()).prop_map(|(w, h)| BoxSize::new(w, h))
}

/// A stack size plus a sequence of `(slot, size)` reports against it.
fn reports() -> impl Strategy<Value = (u32, Vec<(u32, BoxSize)>)> {
    (1u32..=12).prop_flat_map(|n| {
        (
            Just(n),
            proptest::collection::vec((0..n, size()), 0..=40),
        )
    })
}

fn mounted(n: u32) -> StackState {
    let mut state = StackState::new();
    for i in 0..n {
        state = state.with_mounted(BoxId(i)).expect("fresh id");
    }
    state
}

fn assert_laws(state: &StackState) {
    let sizes = state.sizes();
    let positions = state.positions();
    assert_eq!(sizes.len(), state.len());
    assert_eq!(positions.len(), state.len());

    let mut expected_top = 0.0;
    for (i, (pos, size)) in positions.iter().zip(sizes.iter()).enumerate() {
        if i == 0 {
            assert_eq!(*pos, BoxPosition::ANCHOR);
        } else {
            assert_eq!(pos.mode, PositionMode::Absolute);
            assert_eq!(pos.top, expected_top);
        }
        expected_top += size.height;
    }
    assert_eq!(positions, stack_positions(&sizes).as_slice());
}

// ─── Cumulative offset and anchor laws ───────────────────────────────────

proptest! {
    #[test]
    fn offsets_hold_after_every_report((n, updates) in reports()) {
        let mut state = mounted(n);
        assert_laws(&state);
        for (id, size) in updates {
            if let Some(next) = state.with_size(BoxId(id), size) {
                state = next;
            }
            assert_laws(&state);
        }
    }

    #[test]
    fn report_order_does_not_matter_for_final_layout(
        heights in proptest::collection::vec(height(), 1..=10),
    ) {
        let n = heights.len() as u32;
        let forward = (0..n).fold(mounted(n), |s, i| {
            let size = BoxSize::new(100.0, heights[i as usize]);
            s.with_size(BoxId(i), size).unwrap_or(s)
        });
        let backward = (0..n).rev().fold(mounted(n), |s, i| {
            let size = BoxSize::new(100.0, heights[i as usize]);
            s.with_size(BoxId(i), size).unwrap_or(s)
        });
        prop_assert_eq!(forward.positions(), backward.positions());
    }
}

// ─── Isolation ───────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn resizing_a_slot_never_moves_earlier_slots(
        (n, updates) in reports(),
        new_height in height(),
        pick in any::<prop::sample::Index>(),
    ) {
        let state = updates.into_iter().fold(mounted(n), |s, (id, size)| {
            s.with_size(BoxId(id), size).unwrap_or(s)
        });
        let k = pick.index(n as usize);
        let width = state.sizes()[k].width;
        if let Some(next) = state.with_size(BoxId(k as u32), BoxSize::new(width, new_height)) {
            prop_assert_eq!(&next.positions()[..=k], &state.positions()[..=k]);
        }
    }
}

// ─── Idempotence ─────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn repeating_a_report_is_a_no_op((n, updates) in reports()) {
        let mut state = mounted(n);
        for (id, size) in updates {
            if let Some(next) = state.with_size(BoxId(id), size) {
                state = next;
            }
            prop_assert!(state.with_size(BoxId(id), size).is_none());
        }
    }
}

// ─── Length under mount churn ────────────────────────────────────────────

proptest! {
    #[test]
    fn unmounting_never_leaves_stale_slots(
        (n, updates) in reports(),
        removals in proptest::collection::vec(any::<prop::sample::Index>(), 0..=6),
    ) {
        let mut state = updates.into_iter().fold(mounted(n), |s, (id, size)| {
            s.with_size(BoxId(id), size).unwrap_or(s)
        });
        for pick in removals {
            if state.is_empty() {
                break;
            }
            let ids: Vec<BoxId> = state.ids().collect();
            let victim = ids[pick.index(ids.len())];
            state = state.with_unmounted(victim).expect("mounted");
            prop_assert!(state.size_of(victim).is_none());
            prop_assert!(state.position_of(victim).is_none());
            assert_laws(&state);
        }
    }
}
