//! Layered minimal hitting-set enumeration.
//!
//! A hitting set intersects every conflict. Enumeration walks subset
//! sizes 1, 2, ... up to a bound over the sorted component universe and
//! stops at the first size that produces any hit: those sets are minimal
//! by cardinality, and the bound keeps the walk polynomial for the
//! spectrum sizes this engine targets.

use std::collections::BTreeSet;

use tracing::{debug, warn};

use crate::types::Conflict;

/// Enumerates minimal hitting sets over a conflict collection.
pub struct HittingSetEnumerator {
    max_set_size: usize,
    max_results: usize,
}

impl HittingSetEnumerator {
    pub fn new(max_set_size: usize, max_results: usize) -> Self {
        Self {
            max_set_size,
            max_results,
        }
    }

    /// All components appearing in any conflict, sorted by id.
    pub fn universe(conflicts: &[Conflict]) -> Vec<String> {
        let merged: BTreeSet<String> = conflicts
            .iter()
            .flat_map(|c| c.components().iter().cloned())
            .collect();
        merged.into_iter().collect()
    }

    /// Whether `candidate` intersects every conflict.
    pub fn is_hitting_set(candidate: &BTreeSet<String>, conflicts: &[Conflict]) -> bool {
        conflicts.iter().all(|c| c.is_hit_by(candidate))
    }

    /// Enumerate hitting sets of the smallest cardinality that admits
    /// any, in lexicographic order of sorted ids, capped at
    /// `max_results`. When no hitting set exists within `max_set_size`,
    /// the whole universe is returned as a single last-resort set.
    pub fn enumerate(&self, conflicts: &[Conflict]) -> Vec<BTreeSet<String>> {
        let universe = Self::universe(conflicts);
        if conflicts.is_empty() || universe.is_empty() {
            return Vec::new();
        }

        for size in 1..=self.max_set_size {
            let found = self.layer(&universe, size, conflicts);
            if !found.is_empty() {
                debug!(size, count = found.len(), "hitting sets found");
                return found;
            }
        }

        warn!(
            bound = self.max_set_size,
            universe = universe.len(),
            "no hitting set within size bound, falling back to full universe"
        );
        vec![universe.into_iter().collect()]
    }

    /// Lexicographic walk over all `size`-subsets of `universe`,
    /// collecting hitting sets until the result cap.
    fn layer(&self, universe: &[String], size: usize, conflicts: &[Conflict]) -> Vec<BTreeSet<String>> {
        let n = universe.len();
        if size == 0 || size > n || self.max_results == 0 {
            return Vec::new();
        }

        let mut indices: Vec<usize> = (0..size).collect();
        let mut found = Vec::new();
        loop {
            let candidate: BTreeSet<String> =
                indices.iter().map(|&i| universe[i].clone()).collect();
            if Self::is_hitting_set(&candidate, conflicts) {
                found.push(candidate);
                if found.len() >= self.max_results {
                    break;
                }
            }

            // Advance to the next combination.
            let mut i = size;
            loop {
                if i == 0 {
                    return found;
                }
                i -= 1;
                if indices[i] != i + n - size {
                    break;
                }
            }
            indices[i] += 1;
            for j in i + 1..size {
                indices[j] = indices[j - 1] + 1;
            }
        }
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn conflicts(specs: &[(&str, &[&str])]) -> Vec<Conflict> {
        specs
            .iter()
            .map(|(name, comps)| Conflict::new(set(comps), *name))
            .collect()
    }

    #[test]
    fn shared_element_yields_single_singleton() {
        let cs = conflicts(&[("t1", &["a", "b"]), ("t2", &["a", "c"])]);
        let sets = HittingSetEnumerator::new(3, 20).enumerate(&cs);
        assert_eq!(sets, vec![set(&["a"])]);
    }

    #[test]
    fn disjoint_conflicts_need_pairs() {
        let cs = conflicts(&[("t1", &["a", "b"]), ("t2", &["c", "d"])]);
        let sets = HittingSetEnumerator::new(3, 20).enumerate(&cs);
        assert_eq!(
            sets,
            vec![
                set(&["a", "c"]),
                set(&["a", "d"]),
                set(&["b", "c"]),
                set(&["b", "d"]),
            ]
        );
    }

    #[test]
    fn single_conflict_gives_each_component() {
        let cs = conflicts(&[("t1", &["x", "y"])]);
        let sets = HittingSetEnumerator::new(3, 20).enumerate(&cs);
        assert_eq!(sets, vec![set(&["x"]), set(&["y"])]);
    }

    #[test]
    fn result_cap_truncates_lexicographically() {
        let cs = conflicts(&[("t1", &["a", "b", "c", "d", "e"])]);
        let sets = HittingSetEnumerator::new(3, 2).enumerate(&cs);
        assert_eq!(sets, vec![set(&["a"]), set(&["b"])]);
    }

    #[test]
    fn exhausted_bound_falls_back_to_universe() {
        // Four pairwise-disjoint conflicts cannot be hit by 3 elements.
        let cs = conflicts(&[
            ("t1", &["a"]),
            ("t2", &["b"]),
            ("t3", &["c"]),
            ("t4", &["d"]),
        ]);
        let sets = HittingSetEnumerator::new(3, 20).enumerate(&cs);
        assert_eq!(sets, vec![set(&["a", "b", "c", "d"])]);
    }

    #[test]
    fn order_of_conflicts_does_not_matter() {
        let forward = conflicts(&[("t1", &["a", "b"]), ("t2", &["c", "d"]), ("t3", &["b", "d"])]);
        let mut reversed = forward.clone();
        reversed.reverse();
        let enumerator = HittingSetEnumerator::new(3, 20);
        assert_eq!(enumerator.enumerate(&forward), enumerator.enumerate(&reversed));
    }

    #[test]
    fn empty_conflicts_yield_nothing() {
        let sets = HittingSetEnumerator::new(3, 20).enumerate(&[]);
        assert!(sets.is_empty());
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        /// Random small conflict collections over a bounded universe.
        fn arb_conflicts() -> impl Strategy<Value = Vec<Conflict>> {
            prop::collection::vec(
                prop::collection::btree_set(prop::sample::select(vec![
                    "a", "b", "c", "d", "e", "f",
                ]), 1..4),
                1..5,
            )
            .prop_map(|sets| {
                sets.into_iter()
                    .enumerate()
                    .map(|(i, comps)| {
                        Conflict::new(
                            comps.into_iter().map(|s| s.to_string()).collect(),
                            format!("t{i}"),
                        )
                    })
                    .collect()
            })
        }

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(200))]

            /// Everything returned hits every conflict.
            #[test]
            fn prop_results_are_hitting_sets(cs in arb_conflicts()) {
                let sets = HittingSetEnumerator::new(3, 20).enumerate(&cs);
                for s in &sets {
                    prop_assert!(HittingSetEnumerator::is_hitting_set(s, &cs));
                }
            }

            /// No returned set is a proper superset of another.
            #[test]
            fn prop_no_proper_supersets(cs in arb_conflicts()) {
                let sets = HittingSetEnumerator::new(3, 20).enumerate(&cs);
                for (i, a) in sets.iter().enumerate() {
                    for (j, b) in sets.iter().enumerate() {
                        if i != j {
                            prop_assert!(!(b.is_subset(a) && b.len() < a.len()),
                                "{a:?} is a proper superset of {b:?}");
                        }
                    }
                }
            }

            /// Permuting the conflict order changes nothing.
            #[test]
            fn prop_permutation_invariant(cs in arb_conflicts()) {
                let enumerator = HittingSetEnumerator::new(3, 20);
                let forward = enumerator.enumerate(&cs);
                let mut shuffled = cs.clone();
                shuffled.reverse();
                prop_assert_eq!(forward, enumerator.enumerate(&shuffled));
            }
        }
    }
}
