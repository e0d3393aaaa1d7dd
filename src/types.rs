//! Core records of the diagnosis loop: conflicts, diagnoses, candidate
//! tests, and execution results.
//!
//! Component sets are `BTreeSet<String>` throughout: set-valued equality,
//! a hash that ignores insertion order, and deterministic iteration for
//! reproducible output.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::hash::{Hash, Hasher};

/// The elements covered by a single failed test. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conflict {
    components: BTreeSet<String>,
    test_name: String,
}

impl Conflict {
    pub fn new(components: BTreeSet<String>, test_name: impl Into<String>) -> Self {
        debug_assert!(!components.is_empty(), "conflicts carry at least one component");
        Self {
            components,
            test_name: test_name.into(),
        }
    }

    pub fn components(&self) -> &BTreeSet<String> {
        &self.components
    }

    pub fn test_name(&self) -> &str {
        &self.test_name
    }

    /// Whether `candidate` contains at least one of this conflict's
    /// components — the hitting condition.
    pub fn is_hit_by(&self, candidate: &BTreeSet<String>) -> bool {
        candidate.iter().any(|c| self.components.contains(c))
    }
}

impl fmt::Display for Conflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {:?}", self.test_name, self.components)
    }
}

/// A candidate explanation: a set of components whose joint failure would
/// explain every observed test failure, with a probability.
///
/// Equality and hashing consider the component set only; the probability
/// is derived state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Diagnosis {
    components: BTreeSet<String>,
    probability: f64,
}

impl Diagnosis {
    pub fn new(components: BTreeSet<String>) -> Self {
        Self {
            components,
            probability: 0.0,
        }
    }

    pub fn with_probability(components: BTreeSet<String>, probability: f64) -> Self {
        Self {
            components,
            probability,
        }
    }

    pub fn components(&self) -> &BTreeSet<String> {
        &self.components
    }

    pub fn probability(&self) -> f64 {
        self.probability
    }

    pub fn set_probability(&mut self, probability: f64) {
        self.probability = probability;
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub fn contains(&self, component: &str) -> bool {
        self.components.contains(component)
    }

    pub fn hits(&self, conflict: &Conflict) -> bool {
        conflict.is_hit_by(&self.components)
    }

    /// Fraction of this diagnosis covered by `trace`: `|T ∩ Δ| / |Δ|`.
    pub fn overlap(&self, trace: &BTreeSet<String>) -> f64 {
        if self.components.is_empty() {
            return 0.0;
        }
        let shared = self
            .components
            .iter()
            .filter(|c| trace.contains(c.as_str()))
            .count();
        shared as f64 / self.components.len() as f64
    }
}

impl PartialEq for Diagnosis {
    fn eq(&self, other: &Self) -> bool {
        self.components == other.components
    }
}

impl Eq for Diagnosis {}

impl Hash for Diagnosis {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.components.hash(state);
    }
}

impl fmt::Display for Diagnosis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{:.3}] {{{}}}",
            self.probability,
            self.components
                .iter()
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(", ")
        )
    }
}

/// An unexecuted test candidate with a predicted trace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailableTest {
    pub name: String,
    pub estimated_trace: BTreeSet<String>,
}

impl AvailableTest {
    pub fn new(name: impl Into<String>, estimated_trace: BTreeSet<String>) -> Self {
        Self {
            name: name.into(),
            estimated_trace,
        }
    }
}

/// The outcome of executing a candidate test.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestResult {
    pub name: String,
    pub passed: bool,
    pub actual_trace: BTreeSet<String>,
}

impl TestResult {
    pub fn new(name: impl Into<String>, passed: bool, actual_trace: BTreeSet<String>) -> Self {
        Self {
            name: name.into(),
            passed,
            actual_trace,
        }
    }

    pub fn failed(&self) -> bool {
        !self.passed
    }
}
