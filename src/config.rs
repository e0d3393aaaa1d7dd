//! Session configuration.
//!
//! Every tunable lives in an explicit record passed at construction so
//! independent sessions can run with different parameters. All fields
//! have serde defaults, so partial TOML files load cleanly.

use serde::{Deserialize, Serialize};

use crate::formula::SbflFormula;

/// Top-level configuration for a fault-localization session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AveriaConfig {
    /// Suspiciousness formula used for ranking and diagnosis weighting.
    pub formula: SbflFormula,

    /// Size bound for hitting-set enumeration.
    pub max_set_size: usize,

    /// Cap on the number of returned diagnoses.
    pub max_diagnoses: usize,

    /// Parsimony prior: diagnoses of size k are weighted by
    /// `size_penalty^(k-1)`.
    pub size_penalty: f64,

    /// Prune threshold for hypothetical posterior weights.
    pub min_weight: f64,

    /// Bound on diagnose/plan/execute iterations.
    pub max_iterations: usize,

    /// Component relevance filtering.
    pub filter: FilterConfig,

    /// Test-outcome likelihood model.
    pub likelihood: LikelihoodParams,
}

impl Default for AveriaConfig {
    fn default() -> Self {
        Self {
            formula: SbflFormula::Barinel,
            max_set_size: 3,
            max_diagnoses: 20,
            size_penalty: 0.5,
            min_weight: 1e-3,
            max_iterations: 10,
            filter: FilterConfig::default(),
            likelihood: LikelihoodParams::default(),
        }
    }
}

impl AveriaConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &std::path::Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a TOML file.
    pub fn save(&self, path: &std::path::Path) -> anyhow::Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

/// Rules for excluding elements that cannot usefully appear in a
/// diagnosis.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Elements covered by more than this fraction of tests are treated
    /// as universally covered and excluded (only once the spectrum has
    /// at least one passing test to distinguish against).
    pub coverage_threshold: f64,

    /// Substrings marking constructor-like elements.
    pub constructor_sigils: Vec<String>,

    /// Substrings marking framework or infrastructure methods.
    pub framework_blocklist: Vec<String>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            coverage_threshold: 0.8,
            constructor_sigils: vec![
                "#<init>".to_string(),
                "#<clinit>".to_string(),
                "#Constructor".to_string(),
            ],
            framework_blocklist: vec![
                "#toString".to_string(),
                "#equals".to_string(),
                "#hashCode".to_string(),
                "#clone".to_string(),
                "java.lang.".to_string(),
                "junit.".to_string(),
            ],
        }
    }
}

/// Conditional-likelihood constants for the planner's outcome model.
///
/// Deliberately named rather than inlined so experimental variation does
/// not require touching planner code.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct LikelihoodParams {
    /// P(pass | diagnosis) when the test trace misses the diagnosis.
    pub pass_when_missed: f64,
    /// P(fail | diagnosis) when the test trace misses the diagnosis.
    pub fail_when_missed: f64,
    /// Base for P(pass | diagnosis) when the trace hits: `base - overlap`.
    pub pass_hit_base: f64,
    /// Base for P(fail | diagnosis) when the trace hits: `base + overlap`.
    pub fail_hit_base: f64,
    /// Lower clamp on every conditional and on the predicted pass
    /// probability.
    pub floor: f64,
    /// Upper clamp, ditto.
    pub ceiling: f64,
}

impl Default for LikelihoodParams {
    fn default() -> Self {
        Self {
            pass_when_missed: 0.9,
            fail_when_missed: 0.1,
            pass_hit_base: 0.8,
            fail_hit_base: 0.2,
            floor: 0.1,
            ceiling: 0.9,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = AveriaConfig::default();
        assert_eq!(config.formula, SbflFormula::Barinel);
        assert_eq!(config.max_set_size, 3);
        assert_eq!(config.max_diagnoses, 20);
        assert!((config.size_penalty - 0.5).abs() < f64::EPSILON);
        assert!((config.min_weight - 1e-3).abs() < f64::EPSILON);
        assert_eq!(config.max_iterations, 10);
        assert!((config.filter.coverage_threshold - 0.8).abs() < f64::EPSILON);
        assert!(config
            .filter
            .constructor_sigils
            .iter()
            .any(|s| s == "#<init>"));
    }

    #[test]
    fn toml_round_trip() {
        let mut config = AveriaConfig::default();
        config.formula = SbflFormula::Ochiai;
        config.max_set_size = 4;
        config.likelihood.pass_hit_base = 0.7;

        let text = toml::to_string_pretty(&config).unwrap();
        let back: AveriaConfig = toml::from_str(&text).unwrap();
        assert_eq!(back.formula, SbflFormula::Ochiai);
        assert_eq!(back.max_set_size, 4);
        assert!((back.likelihood.pass_hit_base - 0.7).abs() < f64::EPSILON);
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let config: AveriaConfig = toml::from_str("formula = \"tarantula\"").unwrap();
        assert_eq!(config.formula, SbflFormula::Tarantula);
        assert_eq!(config.max_iterations, 10);
        assert!((config.likelihood.pass_when_missed - 0.9).abs() < f64::EPSILON);
    }

    #[test]
    fn load_save_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("averia.toml");
        let mut config = AveriaConfig::default();
        config.max_diagnoses = 7;
        config.save(&path).unwrap();
        let back = AveriaConfig::load(&path).unwrap();
        assert_eq!(back.max_diagnoses, 7);
    }
}
