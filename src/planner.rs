//! Entropy-based test planner.
//!
//! Scores every candidate test by the expected reduction in diagnosis
//! entropy its outcome would bring, using a parametric likelihood model:
//! a test whose predicted trace misses a diagnosis is expected to pass;
//! the more of a diagnosis it covers, the more likely it fails.

use std::collections::BTreeSet;

use tracing::debug;

use crate::config::LikelihoodParams;
use crate::rank::{entropy, normalize};
use crate::types::{AvailableTest, Diagnosis};

/// Selects the next test to execute by expected information gain.
pub struct EntropyPlanner<'a> {
    params: &'a LikelihoodParams,
    min_weight: f64,
}

impl<'a> EntropyPlanner<'a> {
    pub fn new(params: &'a LikelihoodParams, min_weight: f64) -> Self {
        Self { params, min_weight }
    }

    /// The candidate with maximum information gain, with the gain.
    /// Ties break toward the lexicographically smallest test name.
    /// Returns `None` when there is no uncertainty to reduce (one or
    /// zero diagnoses), the pool is empty, or no candidate trace could
    /// touch a diagnosis.
    pub fn select_best(
        &self,
        candidates: &[AvailableTest],
        diagnoses: &[Diagnosis],
    ) -> Option<(AvailableTest, f64)> {
        if candidates.is_empty() || diagnoses.len() <= 1 {
            return None;
        }
        if candidates.iter().all(|t| t.estimated_trace.is_empty()) {
            debug!("every candidate has an empty estimated trace");
            return None;
        }

        let current = entropy(diagnoses);
        let mut best: Option<(&AvailableTest, f64)> = None;
        for test in candidates {
            let gain = self.information_gain(test, diagnoses, current);
            debug!(test = %test.name, gain, "scored candidate");
            let better = match best {
                None => true,
                Some((chosen, best_gain)) => {
                    gain > best_gain || (gain == best_gain && test.name < chosen.name)
                }
            };
            if better {
                best = Some((test, gain));
            }
        }
        best.map(|(test, gain)| (test.clone(), gain))
    }

    /// `IG(t) = H(Ω) − [P(pass)·H(Ω|pass) + P(fail)·H(Ω|fail)]`, clamped
    /// at zero against floating-point drift.
    pub fn information_gain(
        &self,
        test: &AvailableTest,
        diagnoses: &[Diagnosis],
        current_entropy: f64,
    ) -> f64 {
        let p_pass = self.predicted_pass(test, diagnoses);
        let if_pass = self.update_for_outcome(diagnoses, &test.estimated_trace, true);
        let if_fail = self.update_for_outcome(diagnoses, &test.estimated_trace, false);
        let expected = p_pass * entropy(&if_pass) + (1.0 - p_pass) * entropy(&if_fail);
        (current_entropy - expected).max(0.0)
    }

    /// Probability the test passes, marginalized over the current
    /// diagnosis distribution and clamped into the model's band.
    pub fn predicted_pass(&self, test: &AvailableTest, diagnoses: &[Diagnosis]) -> f64 {
        let weighted: f64 = diagnoses
            .iter()
            .map(|d| d.probability() * self.conditional(d, &test.estimated_trace, true))
            .sum();
        weighted.clamp(self.params.floor, self.params.ceiling)
    }

    /// `P(outcome | Δ)` for a trace. A trace that misses the diagnosis
    /// makes a pass likely; overlap shifts mass toward failure.
    pub fn conditional(&self, diagnosis: &Diagnosis, trace: &BTreeSet<String>, passed: bool) -> f64 {
        let p = self.params;
        let hit = diagnosis.components().iter().any(|c| trace.contains(c));
        let raw = if !hit {
            if passed {
                p.pass_when_missed
            } else {
                p.fail_when_missed
            }
        } else {
            let overlap = diagnosis.overlap(trace);
            if passed {
                p.pass_hit_base - overlap
            } else {
                p.fail_hit_base + overlap
            }
        };
        raw.clamp(p.floor, p.ceiling)
    }

    /// Bayes update for an observed or hypothesized outcome: reweight by
    /// the conditional, prune weights below the threshold, renormalize.
    /// When everything prunes away the prior is kept unchanged.
    pub fn update_for_outcome(
        &self,
        diagnoses: &[Diagnosis],
        trace: &BTreeSet<String>,
        passed: bool,
    ) -> Vec<Diagnosis> {
        let mut updated: Vec<Diagnosis> = Vec::new();
        for d in diagnoses {
            let weight = d.probability() * self.conditional(d, trace, passed);
            if weight >= self.min_weight {
                updated.push(Diagnosis::with_probability(d.components().clone(), weight));
            }
        }
        let total: f64 = updated.iter().map(Diagnosis::probability).sum();
        if updated.is_empty() || total <= 0.0 {
            return diagnoses.to_vec();
        }
        normalize(&mut updated);
        updated
    }
}
