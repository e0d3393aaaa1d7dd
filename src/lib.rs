// Library exports for the Averia fault-localization engine
pub mod config;
pub mod engine;
pub mod error;
pub mod filter;
pub mod formula;
pub mod hitting_set;
pub mod planner;
pub mod rank;
pub mod sources;
pub mod spectrum;
pub mod types;

// Re-export key types for convenience
pub use config::{AveriaConfig, FilterConfig, LikelihoodParams};
pub use engine::{CancelToken, TdpOutcome, TdpSession, TdpState, TerminationReason};
pub use error::AveriaError;
pub use filter::ComponentFilter;
pub use formula::SbflFormula;
pub use hitting_set::HittingSetEnumerator;
pub use planner::EntropyPlanner;
pub use rank::DiagnosisStats;
pub use sources::{
    CandidateTestSource, ScriptedExecutor, SflTextLoader, SpectraLoader, StaticCandidates,
    TestExecutor,
};
pub use spectrum::{ElementCounts, Spectrum, TestCase};
pub use types::{AvailableTest, Conflict, Diagnosis, TestResult};
