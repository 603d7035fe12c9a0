// tests/property_ordering.rs

use std::collections::BTreeMap;

use proptest::prelude::*;

use assetflow::engine::TriggerQueue;
use assetflow::manifest::OrderManifest;
use assetflow::types::{Category, TriggerWhileRunningBehaviour};

// Acyclic by construction: file N may only be declared after files 0..N.
fn manifest_strategy(max_files: usize) -> impl Strategy<Value = (Vec<String>, BTreeMap<String, Vec<String>>)> {
    (1..=max_files).prop_flat_map(|n| {
        proptest::collection::vec(proptest::collection::vec(any::<usize>(), 0..3), n).prop_map(
            move |raw| {
                let files: Vec<String> = (0..n).map(|i| format!("libs/f{i:02}.js")).collect();
                let mut after = BTreeMap::new();
                for (i, deps) in raw.into_iter().enumerate() {
                    if i == 0 {
                        continue;
                    }
                    let deps: Vec<String> = deps.into_iter().map(|d| files[d % i].clone()).collect();
                    if !deps.is_empty() {
                        after.insert(files[i].clone(), deps);
                    }
                }
                (files, after)
            },
        )
    })
}

proptest! {
    #[test]
    fn entry_is_last_and_declared_order_holds((mut files, after) in manifest_strategy(12), reverse in any::<bool>()) {
        files.push("app.js".to_string());
        if reverse {
            files.reverse();
        }

        let manifest = OrderManifest::new("app.js", &after);
        prop_assert!(manifest.check_acyclic().is_ok());

        let order = manifest.order(&files).unwrap();
        prop_assert_eq!(order.len(), files.len());
        prop_assert_eq!(order.last().map(String::as_str), Some("app.js"));

        let pos = |name: &str| order.iter().position(|f| f == name).unwrap();
        for (file, deps) in &after {
            for dep in deps {
                prop_assert!(pos(dep) < pos(file), "{} must follow {}", file, dep);
            }
        }
    }

    #[test]
    fn queue_never_holds_more_than_its_length(
        max in 1usize..4,
        ops in proptest::collection::vec((0usize..5, any::<bool>()), 0..40),
    ) {
        let mut queue = TriggerQueue::new(TriggerWhileRunningBehaviour::Queue, max);
        for (idx, take) in ops {
            let category = Category::ALL[idx];
            if take {
                queue.take_pending(category);
            } else {
                queue.record_trigger(category);
            }
            for c in Category::ALL {
                prop_assert!(queue.pending_for(c) <= max);
            }
        }
    }
}
