//! Property-based invariant tests for member ordering and collection
//! reconciliation.
//!
//! 1. Iteration follows descending priority, ties in insertion order.
//! 2. Re-population leaves exactly the submitted keys as live children.
//! 3. The index counter tracks the highest integer key ever added.
//! 4. A refused population leaves the live children untouched.

use std::collections::BTreeSet;

use fos_forms::{AddFlags, Collection, Element, Fieldset, Value, ValueMap};
use proptest::prelude::*;

// ── Helpers ─────────────────────────────────────────────────────────────

fn keys_strategy() -> impl Strategy<Value = BTreeSet<usize>> {
    proptest::collection::btree_set(0usize..8, 0..6)
}

fn entries(keys: &BTreeSet<usize>) -> ValueMap {
    keys.iter()
        .map(|key| (key.to_string(), Value::from(format!("v{key}"))))
        .collect()
}

fn tags() -> Collection {
    Collection::new("tags").with_target_element(Element::text("tag"))
}

fn live_keys(collection: &Collection) -> BTreeSet<usize> {
    collection
        .names()
        .into_iter()
        .map(|name| name.parse().unwrap())
        .collect()
}

// ═════════════════════════════════════════════════════════════════════════
// 1. Priority ordering
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn iteration_follows_priority(priorities in proptest::collection::vec(-3i32..3, 0..12)) {
        let mut fieldset = Fieldset::new("f");
        for (i, priority) in priorities.iter().enumerate() {
            fieldset
                .add(Element::text(format!("e{i}")), AddFlags::default().with_priority(*priority))
                .unwrap();
        }

        let mut expected: Vec<(usize, i32)> = priorities.iter().copied().enumerate().collect();
        expected.sort_by_key(|(_, priority)| -priority);
        let expected: Vec<String> = expected.into_iter().map(|(i, _)| format!("e{i}")).collect();

        prop_assert_eq!(fieldset.names(), expected);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 2. Re-population converges on the submitted keys
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn repopulation_matches_submission(first in keys_strategy(), second in keys_strategy()) {
        let mut collection = tags();
        collection.populate_values(&entries(&first)).unwrap();
        prop_assert_eq!(live_keys(&collection), first.clone());

        collection.populate_values(&entries(&second)).unwrap();
        prop_assert_eq!(live_keys(&collection), second.clone());
        for key in &second {
            let value = collection.get(&key.to_string()).unwrap().value().cloned();
            prop_assert_eq!(value, Some(Value::from(format!("v{key}"))));
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 3. Index counter
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn counter_tracks_highest_added_key(first in keys_strategy(), second in keys_strategy()) {
        let mut collection = tags();
        collection.populate_values(&entries(&first)).unwrap();
        collection.populate_values(&entries(&second)).unwrap();

        let highest = first.iter().chain(&second).max().copied();
        prop_assert_eq!(collection.last_child_index(), highest);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 4. Refused growth is atomic
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn refused_growth_changes_nothing(first in keys_strategy(), second in keys_strategy()) {
        let mut collection = tags();
        collection.populate_values(&entries(&first)).unwrap();
        collection.set_count(first.len());
        collection.set_allow_add(false);

        let grows = second.iter().any(|key| !first.contains(key)) && second.len() > first.len();
        let result = collection.populate_values(&entries(&second));

        if grows {
            prop_assert!(result.is_err());
            prop_assert_eq!(live_keys(&collection), first);
        } else {
            prop_assert!(result.is_ok());
            prop_assert_eq!(live_keys(&collection), second);
        }
    }
}
