//! Component relevance filter.
//!
//! Drops elements that cannot usefully appear in a diagnosis before the
//! hitting-set enumeration sees them. Rules are evaluated in a fixed
//! order; the first matching rule excludes the element.

use tracing::debug;

use crate::config::FilterConfig;
use crate::spectrum::Spectrum;
use crate::types::Conflict;

/// Decides, per element, whether it may participate in diagnoses.
pub struct ComponentFilter<'a> {
    config: &'a FilterConfig,
}

impl<'a> ComponentFilter<'a> {
    pub fn new(config: &'a FilterConfig) -> Self {
        Self { config }
    }

    /// Exclusion rules in order: constructor-like, universally covered,
    /// framework method, never covered by a failing test.
    pub fn should_include(&self, id: &str, spectrum: &Spectrum) -> bool {
        if self.is_constructor(id) {
            return false;
        }
        if self.is_universally_covered(id, spectrum) {
            return false;
        }
        if self.is_framework(id) {
            return false;
        }
        if self.has_zero_incrimination(id, spectrum) {
            return false;
        }
        true
    }

    /// Constructor-like element ids: any configured sigil, or a
    /// `Type#Method()` shape whose method name starts uppercase (implicit
    /// initialization in SFL element ids).
    pub fn is_constructor(&self, id: &str) -> bool {
        self.config
            .constructor_sigils
            .iter()
            .any(|sigil| id.contains(sigil.as_str()))
            || has_constructor_shape(id)
    }

    /// Covered by more than `coverage_threshold` of all tests. Only
    /// meaningful once at least one test has passed; a failures-only
    /// spectrum covers everything it incriminates.
    fn is_universally_covered(&self, id: &str, spectrum: &Spectrum) -> bool {
        let Some(counts) = spectrum.counts_for(id) else {
            return false;
        };
        if counts.passed() == 0 {
            return false;
        }
        let total = counts.total();
        if total == 0 {
            return true;
        }
        counts.covered() as f64 / total as f64 > self.config.coverage_threshold
    }

    fn is_framework(&self, id: &str) -> bool {
        self.config
            .framework_blocklist
            .iter()
            .any(|marker| id.contains(marker.as_str()))
    }

    /// Never covered by any failing test (ef = 0), or unknown to the
    /// spectrum entirely.
    fn has_zero_incrimination(&self, id: &str, spectrum: &Spectrum) -> bool {
        match spectrum.counts_for(id) {
            Some(counts) => counts.ef == 0,
            None => true,
        }
    }

    /// Apply the rules to every conflict's component set. Conflicts whose
    /// filtered set is empty are dropped.
    pub fn filter_conflicts(&self, conflicts: &[Conflict], spectrum: &Spectrum) -> Vec<Conflict> {
        let mut filtered = Vec::new();
        for conflict in conflicts {
            let kept: std::collections::BTreeSet<String> = conflict
                .components()
                .iter()
                .filter(|id| self.should_include(id, spectrum))
                .cloned()
                .collect();

            let removed = conflict.components().len() - kept.len();
            if removed > 0 {
                debug!(
                    test = conflict.test_name(),
                    removed, "filtered components from conflict"
                );
            }
            if kept.is_empty() {
                debug!(test = conflict.test_name(), "conflict fully filtered, dropping");
                continue;
            }
            filtered.push(Conflict::new(kept, conflict.test_name()));
        }
        filtered
    }
}

/// Matches `...#Name()...` where `Name` starts with an uppercase ASCII
/// letter, the shape class names take in SFL element ids.
fn has_constructor_shape(id: &str) -> bool {
    let Some(pos) = id.find('#') else {
        return false;
    };
    let rest = &id[pos + 1..];
    if !rest
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_uppercase())
    {
        return false;
    }
    let after = rest.trim_start_matches(|c: char| c.is_ascii_alphabetic());
    after.starts_with("()")
}
