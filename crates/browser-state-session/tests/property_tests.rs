//! Property-based tests for the session registry.
//!
//! Uses proptest to drive random operation sequences and verify the
//! selection invariant: the selected index is always in bounds or absent,
//! and never points at a removed session.

use std::sync::Arc;

use proptest::prelude::*;

use browser_state_engine::MemoryEngine;
use browser_state_session::{Session, SessionRegistry};

/// One randomly generated registry operation.
#[derive(Debug, Clone)]
enum Op {
    Add {
        private: bool,
        custom_tab: bool,
        selected: bool,
    },
    Remove(usize),
    Select(usize),
    RemoveSessions,
    RemoveAll,
    Snapshot,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (any::<bool>(), any::<bool>(), any::<bool>()).prop_map(|(private, custom_tab, selected)| {
            Op::Add { private, custom_tab, selected }
        }),
        3 => any::<usize>().prop_map(Op::Remove),
        2 => any::<usize>().prop_map(Op::Select),
        1 => Just(Op::RemoveSessions),
        1 => Just(Op::RemoveAll),
        1 => Just(Op::Snapshot),
    ]
}

fn apply(registry: &SessionRegistry, op: Op, counter: &mut usize) {
    match op {
        Op::Add {
            private,
            custom_tab,
            selected,
        } => {
            *counter += 1;
            let session = Session::with_flags(
                format!("https://tab{counter}.example"),
                private,
                custom_tab,
            );
            registry
                .add(session, selected, None, None)
                .expect("add without parent cannot fail");
        }
        Op::Remove(seed) => {
            let all = registry.all();
            if !all.is_empty() {
                let id = *all[seed % all.len()].id();
                registry.remove(&id, false);
            }
        }
        Op::Select(seed) => {
            let all = registry.all();
            if !all.is_empty() {
                let id = *all[seed % all.len()].id();
                registry.select(&id).expect("session taken from all()");
            }
        }
        Op::RemoveSessions => registry.remove_sessions(),
        Op::RemoveAll => registry.remove_all(),
        Op::Snapshot => {
            // Pure projection; must never disturb live state
            let _ = registry.create_snapshot();
        }
    }
}

fn assert_selection_invariant(registry: &SessionRegistry) {
    match registry.selected_index() {
        Some(index) => {
            assert!(
                index < registry.size(),
                "selected index {index} out of bounds for {} sessions",
                registry.size()
            );
            // The accessor pair must agree
            let selected = registry.selected_session().expect("index set");
            assert_eq!(registry.all()[index].id(), selected.id());
        }
        None => assert!(registry.selected_session().is_none()),
    }
}

proptest! {
    /// After any operation sequence the selection is in bounds or absent.
    #[test]
    fn selection_stays_in_bounds(ops in proptest::collection::vec(op(), 1..40)) {
        let registry = SessionRegistry::new(Arc::new(MemoryEngine::new()));
        let mut counter = 0;

        for op in ops {
            apply(&registry, op, &mut counter);
            assert_selection_invariant(&registry);
        }
    }

    /// Same invariant with a default-session factory configured: the
    /// registry repopulates itself and the selection still holds.
    #[test]
    fn selection_stays_in_bounds_with_default_factory(
        ops in proptest::collection::vec(op(), 1..40)
    ) {
        let registry = SessionRegistry::with_default_session(
            Arc::new(MemoryEngine::new()),
            || Session::new("about:home"),
        );
        let mut counter = 0;

        for op in ops {
            apply(&registry, op, &mut counter);
            assert_selection_invariant(&registry);
        }
    }

    /// Restoring a snapshot of ordinary sessions reproduces the same
    /// session set, order and selection.
    #[test]
    fn snapshot_round_trip_is_lossless(count in 1usize..8, selected in 0usize..8) {
        let source = SessionRegistry::new(Arc::new(MemoryEngine::new()));

        let mut ids = Vec::new();
        for i in 0..count {
            let session = Session::new(format!("https://tab{i}.example"));
            ids.push(*session.id());
            source.add(session, false, None, None).unwrap();
        }
        source.select(&ids[selected % count]).unwrap();

        let target = SessionRegistry::new(Arc::new(MemoryEngine::new()));
        target.restore(source.create_snapshot());

        let restored: Vec<_> = target.all().iter().map(|s| *s.id()).collect();
        prop_assert_eq!(restored, ids.clone());
        let selected_session = target.selected_session().unwrap();
        prop_assert_eq!(
            selected_session.id(),
            &ids[selected % count]
        );
    }
}
