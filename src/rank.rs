//! Probability assignment over diagnoses and summary statistics.
//!
//! Each diagnosis is weighted by the mean suspiciousness of its
//! components, discounted by a parsimony prior that prefers smaller
//! explanations, then normalized into a distribution.

use std::cmp::Ordering;
use std::collections::HashMap;

use tracing::debug;

use crate::formula::SbflFormula;
use crate::spectrum::Spectrum;
use crate::types::Diagnosis;

/// Probability above which the top diagnosis is considered settled.
pub const SETTLED_PROBABILITY: f64 = 0.9;

/// Weight diagnoses by suspiciousness and parsimony, normalize, and sort
/// by probability (descending, ties broken by component sets). When every
/// raw weight is zero the distribution falls back to uniform.
pub fn assign_probabilities(
    diagnoses: &mut Vec<Diagnosis>,
    spectrum: &Spectrum,
    formula: SbflFormula,
    size_penalty: f64,
) {
    if diagnoses.is_empty() {
        return;
    }

    let scores: HashMap<&str, f64> = spectrum
        .elements()
        .iter()
        .map(|id| (id.as_str(), spectrum.score_of(id, formula)))
        .collect();

    for diagnosis in diagnoses.iter_mut() {
        let weight = raw_weight(diagnosis, &scores, size_penalty);
        diagnosis.set_probability(weight);
    }
    normalize(diagnoses);

    diagnoses.sort_by(|a, b| {
        b.probability()
            .partial_cmp(&a.probability())
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.components().cmp(b.components()))
    });
    debug!(count = diagnoses.len(), "assigned diagnosis probabilities");
}

/// Mean component suspiciousness times `size_penalty^(|Δ|-1)`. Components
/// the spectrum does not know are left out of the mean.
fn raw_weight(diagnosis: &Diagnosis, scores: &HashMap<&str, f64>, size_penalty: f64) -> f64 {
    let mut total = 0.0;
    let mut known = 0usize;
    for component in diagnosis.components() {
        if let Some(score) = scores.get(component.as_str()) {
            total += score;
            known += 1;
        }
    }
    let avg = if known > 0 { total / known as f64 } else { 0.0 };
    let penalty = size_penalty.powi(diagnosis.len() as i32 - 1);
    let weight = avg * penalty;
    if weight.is_nan() || weight < 0.0 {
        0.0
    } else {
        weight
    }
}

/// Scale probabilities to sum to one; uniform when the mass is zero.
pub fn normalize(diagnoses: &mut [Diagnosis]) {
    if diagnoses.is_empty() {
        return;
    }
    let total: f64 = diagnoses.iter().map(Diagnosis::probability).sum();
    if total > 0.0 {
        for d in diagnoses.iter_mut() {
            d.set_probability(d.probability() / total);
        }
    } else {
        let uniform = 1.0 / diagnoses.len() as f64;
        for d in diagnoses.iter_mut() {
            d.set_probability(uniform);
        }
    }
}

/// Shannon entropy of the distribution, with `0 · ln 0 = 0`.
pub fn entropy(diagnoses: &[Diagnosis]) -> f64 {
    let mut sum = 0.0;
    for d in diagnoses {
        let p = d.probability();
        if p > 0.0 {
            sum -= p * p.ln();
        }
    }
    sum
}

/// Summary of a diagnosis set used by the controller's termination
/// checks.
#[derive(Debug, Clone)]
pub struct DiagnosisStats {
    pub count: usize,
    pub entropy: f64,
    pub max_probability: f64,
    pub most_likely: Option<Diagnosis>,
}

impl DiagnosisStats {
    pub fn from_diagnoses(diagnoses: &[Diagnosis]) -> Self {
        let mut max_probability = 0.0;
        let mut most_likely = None;
        for d in diagnoses {
            if d.probability() > max_probability {
                max_probability = d.probability();
                most_likely = Some(d.clone());
            }
        }
        Self {
            count: diagnoses.len(),
            entropy: entropy(diagnoses),
            max_probability,
            most_likely,
        }
    }

    /// One diagnosis left, or one dominating the distribution.
    pub fn is_settled(&self) -> bool {
        self.count == 1 || self.max_probability > SETTLED_PROBABILITY
    }
}

impl std::fmt::Display for DiagnosisStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "count={}, entropy={:.3}, max_prob={:.3}, settled={}",
            self.count,
            self.entropy,
            self.max_probability,
            self.is_settled()
        )
    }
}
