//! The Test–Diagnose–Plan session controller.
//!
//! Owns the spectrum and the candidate pool, drives the loop
//! (extract conflicts → enumerate hitting sets → rank → plan → execute →
//! update), and decides when to stop. Subordinate components only ever
//! see borrowed read-only views; every mutation flows through
//! [`TdpSession::run`]'s update step.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::AveriaConfig;
use crate::error::AveriaError;
use crate::filter::ComponentFilter;
use crate::hitting_set::HittingSetEnumerator;
use crate::planner::EntropyPlanner;
use crate::rank::{self, DiagnosisStats};
use crate::sources::{CandidateTestSource, SpectraLoader, TestExecutor};
use crate::spectrum::Spectrum;
use crate::types::{AvailableTest, Diagnosis};

/// How many top-ranked elements the filter fallback proposes.
const FALLBACK_TOP_K: usize = 3;

/// Phases of one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TdpState {
    Initializing,
    Diagnosing,
    Planning,
    Executing,
    Updating,
    Terminated,
}

/// Why the loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationReason {
    /// A single or dominating diagnosis was reached.
    Solved,
    /// The spectrum contains no failed tests.
    NoFailure,
    /// Candidates or iterations ran out; the result is best-effort.
    Exhausted,
    /// The cooperative cancel signal fired.
    Cancelled,
}

/// Final state of a session run.
#[derive(Debug, Clone)]
pub struct TdpOutcome {
    pub reason: TerminationReason,
    /// The most likely diagnosis at the end, if any exists.
    pub best: Option<Diagnosis>,
    /// The full final diagnosis distribution.
    pub diagnoses: Vec<Diagnosis>,
    /// Diagnose passes performed.
    pub iterations: usize,
}

/// Cooperative cancellation signal, checked at state transitions.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// One interactive fault-localization session. Owns its spectrum; runs
/// independently of any other session.
pub struct TdpSession {
    spectrum: Spectrum,
    candidates: Vec<AvailableTest>,
    config: AveriaConfig,
    cancel: CancelToken,
    state: TdpState,
    iteration: usize,
}

impl TdpSession {
    pub fn new(spectrum: Spectrum, config: AveriaConfig) -> Self {
        Self {
            spectrum,
            candidates: Vec::new(),
            config,
            cancel: CancelToken::new(),
            state: TdpState::Initializing,
            iteration: 0,
        }
    }

    /// Build a session by pulling the initial spectrum from a loader.
    pub fn from_loader(
        loader: &dyn SpectraLoader,
        config: AveriaConfig,
    ) -> Result<Self, AveriaError> {
        let spectrum = loader.load()?;
        info!(
            elements = spectrum.element_count(),
            tests = spectrum.test_count(),
            failed = spectrum.failed_count(),
            "spectrum loaded"
        );
        Ok(Self::new(spectrum, config))
    }

    /// Attach a cancel token shared with the caller.
    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    /// Pull candidates from a source into the pool. Duplicate names keep
    /// the first occurrence; trace entries outside the element universe
    /// are dropped.
    pub fn load_candidates(&mut self, source: &mut dyn CandidateTestSource) {
        for mut candidate in source.candidates() {
            if self.candidates.iter().any(|c| c.name == candidate.name) {
                warn!(test = %candidate.name, "duplicate candidate name, keeping first");
                continue;
            }
            let before = candidate.estimated_trace.len();
            candidate
                .estimated_trace
                .retain(|id| self.spectrum.contains_element(id));
            if candidate.estimated_trace.len() < before {
                warn!(
                    test = %candidate.name,
                    dropped = before - candidate.estimated_trace.len(),
                    "estimated trace named unknown elements"
                );
            }
            self.candidates.push(candidate);
        }
        debug!(pool = self.candidates.len(), "candidate pool loaded");
    }

    pub fn spectrum(&self) -> &Spectrum {
        &self.spectrum
    }

    pub fn candidates(&self) -> &[AvailableTest] {
        &self.candidates
    }

    pub fn state(&self) -> TdpState {
        self.state
    }

    pub fn iteration(&self) -> usize {
        self.iteration
    }

    /// One full diagnosis pass over the current spectrum: conflicts →
    /// filter → hitting sets → probabilities. Pure with respect to the
    /// spectrum; rebuilt from scratch every call.
    pub fn diagnose(&self) -> Vec<Diagnosis> {
        let conflicts = self.spectrum.extract_conflicts();
        if conflicts.is_empty() {
            return Vec::new();
        }

        let filter = ComponentFilter::new(&self.config.filter);
        let filtered = filter.filter_conflicts(&conflicts, &self.spectrum);
        if filtered.is_empty() {
            warn!("every conflict fully filtered, using suspiciousness fallback");
            return self.fallback_diagnoses(&conflicts);
        }

        let enumerator =
            HittingSetEnumerator::new(self.config.max_set_size, self.config.max_diagnoses);
        let mut diagnoses: Vec<Diagnosis> = enumerator
            .enumerate(&filtered)
            .into_iter()
            .map(Diagnosis::new)
            .collect();
        rank::assign_probabilities(
            &mut diagnoses,
            &self.spectrum,
            self.config.formula,
            self.config.size_penalty,
        );
        diagnoses
    }

    /// When filtering erased every conflict: the top-ranked
    /// non-constructor elements as uniformly weighted singleton
    /// diagnoses. If even those are unavailable, the whole conflict
    /// universe becomes one certain diagnosis.
    fn fallback_diagnoses(&self, conflicts: &[crate::types::Conflict]) -> Vec<Diagnosis> {
        let filter = ComponentFilter::new(&self.config.filter);
        let mut ranked: Vec<(f64, &String)> = self
            .spectrum
            .elements()
            .iter()
            .filter(|id| !filter.is_constructor(id))
            .map(|id| (self.spectrum.score_of(id, self.config.formula), id))
            .collect();
        ranked.sort_by(|a, b| {
            b.0.partial_cmp(&a.0)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.1.cmp(b.1))
        });

        let k = ranked.len().min(FALLBACK_TOP_K);
        if k == 0 {
            let universe: std::collections::BTreeSet<String> =
                HittingSetEnumerator::universe(conflicts).into_iter().collect();
            if universe.is_empty() {
                return Vec::new();
            }
            return vec![Diagnosis::with_probability(universe, 1.0)];
        }

        let uniform = 1.0 / k as f64;
        ranked
            .into_iter()
            .take(k)
            .map(|(_, id)| {
                Diagnosis::with_probability(std::iter::once(id.clone()).collect(), uniform)
            })
            .collect()
    }

    /// Drive the loop to termination. The executor is consulted once per
    /// selected test; executor errors drop the candidate and re-plan
    /// without touching the spectrum.
    pub fn run(&mut self, executor: &mut dyn TestExecutor) -> TdpOutcome {
        self.state = TdpState::Diagnosing;
        loop {
            if self.cancel.is_cancelled() {
                return self.terminate(TerminationReason::Cancelled, Vec::new());
            }
            self.iteration += 1;

            let diagnoses = self.diagnose();
            let stats = DiagnosisStats::from_diagnoses(&diagnoses);
            info!(
                iteration = self.iteration,
                count = stats.count,
                entropy = stats.entropy,
                max_prob = stats.max_probability,
                "diagnosis pass"
            );

            if diagnoses.is_empty() {
                if self.spectrum.failed_count() == 0 {
                    return self.terminate(TerminationReason::NoFailure, diagnoses);
                }
                return self.terminate(TerminationReason::Exhausted, diagnoses);
            }
            if stats.is_settled() {
                return self.terminate(TerminationReason::Solved, diagnoses);
            }
            if self.iteration >= self.config.max_iterations {
                info!(bound = self.config.max_iterations, "iteration bound reached");
                return self.terminate(TerminationReason::Exhausted, diagnoses);
            }

            self.state = TdpState::Planning;
            if self.cancel.is_cancelled() {
                return self.terminate(TerminationReason::Cancelled, diagnoses);
            }

            let params = self.config.likelihood;
            let planner = EntropyPlanner::new(&params, self.config.min_weight);
            let executed = loop {
                let Some((test, gain)) = planner.select_best(&self.candidates, &diagnoses) else {
                    break None;
                };

                self.state = TdpState::Executing;
                if self.cancel.is_cancelled() {
                    return self.terminate(TerminationReason::Cancelled, diagnoses);
                }
                info!(test = %test.name, gain, "executing selected test");

                match executor.execute(&test) {
                    Ok(result) => break Some(result),
                    Err(err) => {
                        warn!(test = %test.name, error = %err, "executor failed, dropping candidate");
                        self.candidates.retain(|c| c.name != test.name);
                        self.state = TdpState::Planning;
                    }
                }
            };

            let Some(result) = executed else {
                info!("planner starved, stopping with best-effort diagnosis");
                return self.terminate(TerminationReason::Exhausted, diagnoses);
            };

            self.state = TdpState::Updating;
            if self.cancel.is_cancelled() {
                return self.terminate(TerminationReason::Cancelled, diagnoses);
            }
            info!(
                test = %result.name,
                passed = result.passed,
                covered = result.actual_trace.len(),
                "applying test result"
            );
            self.candidates.retain(|c| c.name != result.name);
            self.spectrum.apply_result(&result);
            self.state = TdpState::Diagnosing;
        }
    }

    fn terminate(&mut self, reason: TerminationReason, diagnoses: Vec<Diagnosis>) -> TdpOutcome {
        self.state = TdpState::Terminated;
        let best = DiagnosisStats::from_diagnoses(&diagnoses).most_likely;
        TdpOutcome {
            reason,
            best,
            diagnoses,
            iterations: self.iteration,
        }
    }
}
