//! In-memory spectrum model: program elements, observed tests, the
//! coverage matrix, and the per-element counters everything else is
//! computed from.
//!
//! The counters are an exact function of the matrix and the pass/fail
//! vector. Every mutation goes through [`Spectrum::apply_result`], which
//! recomputes them, so readers never observe stale tallies.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::AveriaError;
use crate::formula::SbflFormula;
use crate::types::{Conflict, TestResult};

/// The 2x2 coverage/verdict tally for one element.
///
/// `ef`/`ep`: covered by a failing/passing test. `nf`/`np`: not covered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementCounts {
    pub ef: usize,
    pub ep: usize,
    pub nf: usize,
    pub np: usize,
}

impl ElementCounts {
    pub fn total(&self) -> usize {
        self.ef + self.ep + self.nf + self.np
    }

    /// Tests that executed this element.
    pub fn covered(&self) -> usize {
        self.ef + self.ep
    }

    /// Tests that passed, covering or not.
    pub fn passed(&self) -> usize {
        self.ep + self.np
    }
}

/// An observed test: name and verdict. Its trace is the matrix row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCase {
    pub name: String,
    pub failed: bool,
}

impl TestCase {
    pub fn new(name: impl Into<String>, failed: bool) -> Self {
        Self {
            name: name.into(),
            failed,
        }
    }
}

/// Elements, tests, and the row-major coverage matrix, with derived
/// per-element counters.
#[derive(Debug, Clone)]
pub struct Spectrum {
    elements: Vec<String>,
    tests: Vec<TestCase>,
    matrix: Vec<Vec<bool>>,
    counts: Vec<ElementCounts>,
    index: HashMap<String, usize>,
}

impl Spectrum {
    /// Build and validate a spectrum. Dimensions must agree, element ids
    /// must be unique, and at least one test must be present.
    pub fn new(
        elements: Vec<String>,
        tests: Vec<TestCase>,
        matrix: Vec<Vec<bool>>,
    ) -> Result<Self, AveriaError> {
        if elements.is_empty() {
            return Err(AveriaError::EmptyElements);
        }
        if tests.is_empty() {
            return Err(AveriaError::NoTests);
        }
        if matrix.len() != tests.len() {
            return Err(AveriaError::RowCountMismatch {
                expected: tests.len(),
                actual: matrix.len(),
            });
        }
        for (row, cols) in matrix.iter().enumerate() {
            if cols.len() != elements.len() {
                return Err(AveriaError::ColumnCountMismatch {
                    row,
                    expected: elements.len(),
                    actual: cols.len(),
                });
            }
        }

        let mut index = HashMap::with_capacity(elements.len());
        for (j, id) in elements.iter().enumerate() {
            if index.insert(id.clone(), j).is_some() {
                return Err(AveriaError::DuplicateElement(id.clone()));
            }
        }

        let mut spectrum = Self {
            elements,
            tests,
            matrix,
            counts: Vec::new(),
            index,
        };
        spectrum.recompute_counts();
        Ok(spectrum)
    }

    pub fn elements(&self) -> &[String] {
        &self.elements
    }

    pub fn tests(&self) -> &[TestCase] {
        &self.tests
    }

    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    pub fn test_count(&self) -> usize {
        self.tests.len()
    }

    pub fn failed_count(&self) -> usize {
        self.tests.iter().filter(|t| t.failed).count()
    }

    pub fn counts(&self) -> &[ElementCounts] {
        &self.counts
    }

    /// Counters for one element id, if it exists in the spectrum.
    pub fn counts_for(&self, id: &str) -> Option<ElementCounts> {
        self.index.get(id).map(|&j| self.counts[j])
    }

    pub fn contains_element(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn covers(&self, test: usize, element: usize) -> bool {
        self.matrix[test][element]
    }

    /// The set of element ids covered by test `i`.
    pub fn trace_of(&self, test: usize) -> BTreeSet<String> {
        self.matrix[test]
            .iter()
            .enumerate()
            .filter(|(_, &covered)| covered)
            .map(|(j, _)| self.elements[j].clone())
            .collect()
    }

    /// One conflict per failed test: exactly the elements it covered.
    /// Failed tests with empty traces carry no localization signal and
    /// are skipped. Output order follows the test order.
    pub fn extract_conflicts(&self) -> Vec<Conflict> {
        let mut conflicts = Vec::new();
        for (i, test) in self.tests.iter().enumerate() {
            if !test.failed {
                continue;
            }
            let trace = self.trace_of(i);
            if trace.is_empty() {
                debug!(test = %test.name, "skipping failed test with empty trace");
                continue;
            }
            conflicts.push(Conflict::new(trace, test.name.clone()));
        }
        debug!(count = conflicts.len(), "extracted conflicts from failed tests");
        conflicts
    }

    /// Suspiciousness of one element under `formula`; zero for ids the
    /// spectrum does not know.
    pub fn score_of(&self, id: &str, formula: SbflFormula) -> f64 {
        match self.counts_for(id) {
            Some(c) => formula.score(c.np, c.nf, c.ep, c.ef),
            None => 0.0,
        }
    }

    /// Score every element and rank descending, ties broken by id. This
    /// is the classic SFL ranking report.
    pub fn ranking(&self, formula: SbflFormula) -> Vec<(f64, String)> {
        let mut ranked: Vec<(f64, String)> = self
            .elements
            .iter()
            .zip(self.counts.iter())
            .map(|(id, c)| (formula.score(c.np, c.nf, c.ep, c.ef), id.clone()))
            .collect();
        ranked.sort_by(|a, b| {
            b.0.partial_cmp(&a.0)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.1.cmp(&b.1))
        });
        ranked
    }

    /// Append an executed test: new row in the matrix built from the
    /// actual trace, then recompute all counters. Trace entries naming
    /// unknown elements are ignored.
    pub fn apply_result(&mut self, result: &TestResult) {
        for id in &result.actual_trace {
            if !self.index.contains_key(id) {
                debug!(element = %id, test = %result.name, "trace names unknown element, ignoring");
            }
        }
        let row: Vec<bool> = self
            .elements
            .iter()
            .map(|id| result.actual_trace.contains(id))
            .collect();
        self.tests.push(TestCase::new(result.name.clone(), !result.passed));
        self.matrix.push(row);
        self.recompute_counts();
    }

    fn recompute_counts(&mut self) {
        let mut counts = vec![ElementCounts::default(); self.elements.len()];
        for (i, test) in self.tests.iter().enumerate() {
            for (j, count) in counts.iter_mut().enumerate() {
                match (test.failed, self.matrix[i][j]) {
                    (true, true) => count.ef += 1,
                    (false, true) => count.ep += 1,
                    (true, false) => count.nf += 1,
                    (false, false) => count.np += 1,
                }
            }
        }
        self.counts = counts;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn ids(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn set(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn sample() -> Spectrum {
        // t0 FAIL covers {a, b}; t1 PASS covers {b, c}; t2 FAIL covers {a}
        Spectrum::new(
            ids(&["a", "b", "c"]),
            vec![
                TestCase::new("t0", true),
                TestCase::new("t1", false),
                TestCase::new("t2", true),
            ],
            vec![
                vec![true, true, false],
                vec![false, true, true],
                vec![true, false, false],
            ],
        )
        .unwrap()
    }

    #[test]
    fn counters_match_matrix() {
        let s = sample();
        let a = s.counts_for("a").unwrap();
        assert_eq!((a.ef, a.ep, a.nf, a.np), (2, 0, 0, 1));
        let b = s.counts_for("b").unwrap();
        assert_eq!((b.ef, b.ep, b.nf, b.np), (1, 1, 1, 0));
        let c = s.counts_for("c").unwrap();
        assert_eq!((c.ef, c.ep, c.nf, c.np), (0, 1, 2, 0));
    }

    #[test]
    fn rejects_row_mismatch() {
        let err = Spectrum::new(
            ids(&["a"]),
            vec![TestCase::new("t0", true)],
            vec![vec![true], vec![false]],
        )
        .unwrap_err();
        assert!(matches!(err, AveriaError::RowCountMismatch { .. }));
    }

    #[test]
    fn rejects_column_mismatch() {
        let err = Spectrum::new(
            ids(&["a", "b"]),
            vec![TestCase::new("t0", true)],
            vec![vec![true]],
        )
        .unwrap_err();
        assert!(matches!(
            err,
            AveriaError::ColumnCountMismatch { row: 0, .. }
        ));
    }

    #[test]
    fn rejects_duplicate_ids() {
        let err = Spectrum::new(
            ids(&["a", "a"]),
            vec![TestCase::new("t0", true)],
            vec![vec![true, false]],
        )
        .unwrap_err();
        assert!(matches!(err, AveriaError::DuplicateElement(id) if id == "a"));
    }

    #[test]
    fn rejects_empty_tests() {
        let err = Spectrum::new(ids(&["a"]), vec![], vec![]).unwrap_err();
        assert!(matches!(err, AveriaError::NoTests));
    }

    #[test]
    fn conflicts_come_from_failed_tests_only() {
        let s = sample();
        let conflicts = s.extract_conflicts();
        assert_eq!(conflicts.len(), 2);
        assert_eq!(conflicts[0].test_name(), "t0");
        assert_eq!(conflicts[0].components(), &set(&["a", "b"]));
        assert_eq!(conflicts[1].test_name(), "t2");
        assert_eq!(conflicts[1].components(), &set(&["a"]));
    }

    #[test]
    fn failed_test_with_empty_trace_is_skipped() {
        let s = Spectrum::new(
            ids(&["a"]),
            vec![TestCase::new("t0", true), TestCase::new("t1", true)],
            vec![vec![false], vec![true]],
        )
        .unwrap();
        let conflicts = s.extract_conflicts();
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].test_name(), "t1");
    }

    #[test]
    fn apply_result_extends_matrix_and_recomputes() {
        let mut s = sample();
        s.apply_result(&TestResult::new("t3", true, set(&["c"])));
        assert_eq!(s.test_count(), 4);
        let c = s.counts_for("c").unwrap();
        assert_eq!((c.ef, c.ep, c.nf, c.np), (0, 2, 2, 0));
        // Unknown trace elements are ignored.
        s.apply_result(&TestResult::new("t4", false, set(&["ghost"])));
        assert_eq!(s.counts_for("a").unwrap().nf, 1);
    }

    #[test]
    fn ranking_is_sorted_and_deterministic() {
        let s = sample();
        let ranked = s.ranking(SbflFormula::Barinel);
        // a: 1 - 0/2 = 1.0, b: 1 - 1/2 = 0.5, c: 1 - 1/1 = 0.0
        assert_eq!(ranked[0].1, "a");
        assert!((ranked[0].0 - 1.0).abs() < 1e-12);
        assert_eq!(ranked[1].1, "b");
        assert_eq!(ranked[2].1, "c");
    }

    #[test]
    fn trace_round_trips_through_rows() {
        let s = sample();
        assert_eq!(s.trace_of(0), set(&["a", "b"]));
        assert_eq!(s.trace_of(1), set(&["b", "c"]));
    }
}
