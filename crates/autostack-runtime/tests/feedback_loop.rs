//! The measure/layout loop against a scripted host that fires observation
//! callbacks on demand.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::Rc;

use autostack_core::{
    BoxPosition, BoxSize, ChangeCallback, Environment, Measure, MutationKind, MutationRecord,
    NodeId, ObserveError, ObserveOptions, ObserveTarget, SizeEvent, SizeObserver,
    SubscriptionHandle,
};
use autostack_layout::{BoxId, stack_positions};
use autostack_runtime::StackCoordinator;
use pretty_assertions::assert_eq;
use proptest::prelude::*;

#[derive(Default)]
struct ScriptedHost {
    heights: RefCell<BTreeMap<NodeId, f64>>,
    listeners: RefCell<BTreeMap<u64, (ObserveTarget, ChangeCallback)>>,
    next: Cell<u64>,
}

impl ScriptedHost {
    fn set_height(&self, node: NodeId, height: f64) {
        self.heights.borrow_mut().insert(node, height);
    }

    /// Change a node's height and notify its subtree observers.
    fn grow(&self, node: NodeId, height: f64) {
        self.set_height(node, height);
        self.fire(&SizeEvent::Mutation(MutationRecord::new(
            node,
            MutationKind::style(),
        )));
    }

    fn fire(&self, event: &SizeEvent) {
        let targets: Vec<ChangeCallback> = self
            .listeners
            .borrow()
            .values()
            .filter(|(target, _)| match (target, event) {
                (ObserveTarget::Viewport, SizeEvent::Viewport { .. }) => true,
                (ObserveTarget::Subtree { node, .. }, SizeEvent::Mutation(record)) => {
                    *node == record.target
                }
                _ => false,
            })
            .map(|(_, cb)| Rc::clone(cb))
            .collect();
        for cb in targets {
            cb(event);
        }
    }

    fn live(&self) -> usize {
        self.listeners.borrow().len()
    }
}

impl Measure for ScriptedHost {
    fn measure(&self, node: NodeId) -> Option<BoxSize> {
        self.heights
            .borrow()
            .get(&node)
            .map(|h| BoxSize::new(800.0, *h))
    }
}

impl SizeObserver for ScriptedHost {
    fn subscribe(
        &self,
        target: ObserveTarget,
        on_change: ChangeCallback,
    ) -> Result<SubscriptionHandle, ObserveError> {
        let handle = self.next.get() + 1;
        self.next.set(handle);
        self.listeners
            .borrow_mut()
            .insert(handle, (target, on_change));
        Ok(SubscriptionHandle(handle))
    }

    fn unsubscribe(&self, handle: SubscriptionHandle) {
        self.listeners.borrow_mut().remove(&handle.0);
    }
}

fn stack(heights: &[f64]) -> (Rc<ScriptedHost>, StackCoordinator) {
    let host = Rc::new(ScriptedHost::default());
    for (i, h) in heights.iter().enumerate() {
        host.set_height(NodeId(i as u32), *h);
    }
    let env = Environment::new(host.clone(), host.clone());
    let mut coordinator = StackCoordinator::new(env, ObserveOptions::default());
    for i in 0..heights.len() {
        coordinator.mount_box(NodeId(i as u32)).expect("mounts");
    }
    coordinator.process_pending();
    (host, coordinator)
}

#[test]
fn growing_the_second_of_four_boxes() {
    let (host, mut coordinator) = stack(&[150.0, 200.0, 100.0, 120.0]);
    assert_eq!(
        coordinator.positions(),
        vec![
            BoxPosition::ANCHOR,
            BoxPosition::absolute(150.0),
            BoxPosition::absolute(350.0),
            BoxPosition::absolute(450.0),
        ]
    );

    host.grow(NodeId(1), 250.0);
    assert_eq!(coordinator.process_pending(), 1);
    assert_eq!(
        coordinator.positions(),
        vec![
            BoxPosition::ANCHOR,
            BoxPosition::absolute(150.0),
            BoxPosition::absolute(400.0),
            BoxPosition::absolute(500.0),
        ]
    );
}

#[test]
fn repeated_identical_events_report_once() {
    let (host, mut coordinator) = stack(&[150.0, 200.0]);
    let generation = coordinator.generation();
    for _ in 0..5 {
        host.fire(&SizeEvent::Viewport {
            width: 800.0,
            height: 600.0,
        });
    }
    assert_eq!(coordinator.process_pending(), 0);
    assert_eq!(coordinator.generation(), generation);
}

#[test]
fn unmounted_box_releases_observers_and_ignores_late_events() {
    let (host, mut coordinator) = stack(&[150.0, 200.0, 100.0]);
    let before = host.live();
    assert!(coordinator.unmount_box(BoxId(1)));
    assert_eq!(host.live(), before - 2);

    host.grow(NodeId(1), 999.0);
    assert_eq!(coordinator.process_pending(), 0);
    assert_eq!(
        coordinator.positions(),
        vec![BoxPosition::ANCHOR, BoxPosition::absolute(150.0)]
    );
}

proptest! {
    #[test]
    fn any_growth_sequence_converges_to_the_fold(
        initial in prop::collection::vec(0.0f64..400.0, 1..8),
        changes in prop::collection::vec((0usize..8, 0.0f64..400.0), 0..20),
    ) {
        let (host, mut coordinator) = stack(&initial);
        let mut heights = initial.clone();
        for (index, height) in changes {
            let index = index % heights.len();
            heights[index] = height;
            host.grow(NodeId(index as u32), height);
        }
        coordinator.process_pending();

        let sizes: Vec<BoxSize> = heights.iter().map(|h| BoxSize::new(800.0, *h)).collect();
        prop_assert_eq!(coordinator.positions(), stack_positions(&sizes));
        for (i, expected) in stack_positions(&sizes).into_iter().enumerate() {
            let actual = coordinator.get(BoxId(i as u32)).map(|b| b.position());
            prop_assert_eq!(actual, Some(expected));
        }
    }
}
