//! Spectrum-based suspiciousness formulas.
//!
//! Each formula is a pure function over one element's 2x2 counter
//! `(ef, ep, nf, np)` — executed/not-executed crossed with failed/passed.
//! Scores are non-negative reals; any undefined ratio yields zero.

use serde::{Deserialize, Serialize};

/// Suspiciousness formula used to score program elements.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SbflFormula {
    /// `ef / sqrt((ef + nf) * (ef + ep))`
    Ochiai,
    /// `(ef/(ef+nf)) / (ef/(ef+nf) + ep/(ep+np))`
    Tarantula,
    /// `1 - ep / (ep + ef)`
    #[default]
    Barinel,
}

impl SbflFormula {
    /// Score one element. Argument order follows the classic SFL tool
    /// convention `(np, nf, ep, ef)`.
    pub fn score(&self, np: usize, nf: usize, ep: usize, ef: usize) -> f64 {
        let (np, nf, ep, ef) = (np as f64, nf as f64, ep as f64, ef as f64);
        let raw = match self {
            SbflFormula::Ochiai => {
                let denom = ((ef + nf) * (ef + ep)).sqrt();
                if denom > 0.0 {
                    ef / denom
                } else {
                    0.0
                }
            }
            SbflFormula::Tarantula => {
                if ef + nf == 0.0 || ep + np == 0.0 {
                    0.0
                } else {
                    let fail_ratio = ef / (ef + nf);
                    let pass_ratio = ep / (ep + np);
                    if fail_ratio + pass_ratio > 0.0 {
                        fail_ratio / (fail_ratio + pass_ratio)
                    } else {
                        0.0
                    }
                }
            }
            SbflFormula::Barinel => {
                if ef + ep == 0.0 {
                    0.0
                } else {
                    1.0 - ep / (ep + ef)
                }
            }
        };

        // Scores are non-negative by contract; NaN coerces to zero.
        if raw.is_nan() || raw < 0.0 {
            0.0
        } else {
            raw
        }
    }
}

impl std::fmt::Display for SbflFormula {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SbflFormula::Ochiai => write!(f, "ochiai"),
            SbflFormula::Tarantula => write!(f, "tarantula"),
            SbflFormula::Barinel => write!(f, "barinel"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-12;

    #[test]
    fn ochiai_basic() {
        // ef=2, nf=0, ep=1: 2 / sqrt(2 * 3)
        let score = SbflFormula::Ochiai.score(5, 0, 1, 2);
        assert!((score - 2.0 / 6.0f64.sqrt()).abs() < EPS);
    }

    #[test]
    fn ochiai_zero_denominator() {
        assert_eq!(SbflFormula::Ochiai.score(10, 0, 0, 0), 0.0);
        assert_eq!(SbflFormula::Ochiai.score(0, 3, 0, 0), 0.0);
    }

    #[test]
    fn tarantula_basic() {
        // fail_ratio = 1/2, pass_ratio = 1/4 -> (1/2) / (3/4) = 2/3
        let score = SbflFormula::Tarantula.score(3, 1, 1, 1);
        assert!((score - 2.0 / 3.0).abs() < EPS);
    }

    #[test]
    fn tarantula_undefined_ratios_are_zero() {
        // No failing tests at all.
        assert_eq!(SbflFormula::Tarantula.score(3, 0, 1, 0), 0.0);
        // No passing tests at all.
        assert_eq!(SbflFormula::Tarantula.score(0, 1, 0, 1), 0.0);
    }

    #[test]
    fn barinel_basic() {
        // 1 - 1/(1+3) = 0.75
        let score = SbflFormula::Barinel.score(0, 0, 1, 3);
        assert!((score - 0.75).abs() < EPS);
    }

    #[test]
    fn barinel_uncovered_element_is_zero() {
        assert_eq!(SbflFormula::Barinel.score(4, 2, 0, 0), 0.0);
    }

    #[test]
    fn scores_are_never_negative() {
        for formula in [
            SbflFormula::Ochiai,
            SbflFormula::Tarantula,
            SbflFormula::Barinel,
        ] {
            for ef in 0..4 {
                for ep in 0..4 {
                    for nf in 0..4 {
                        for np in 0..4 {
                            let s = formula.score(np, nf, ep, ef);
                            assert!(s >= 0.0, "{formula} gave {s} for {np},{nf},{ep},{ef}");
                            assert!(s.is_finite());
                        }
                    }
                }
            }
        }
    }
}
