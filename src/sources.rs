//! Adapter seams between the core loop and the outside world, plus the
//! bundled implementations: a loader for the external SFL tool's
//! three-file text layout, a fixed candidate pool, and a scripted
//! executor for tests and demos.

use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::AveriaError;
use crate::spectrum::{Spectrum, TestCase};
use crate::types::{AvailableTest, TestResult};

/// Supplies the initial spectrum.
pub trait SpectraLoader {
    fn load(&self) -> Result<Spectrum, AveriaError>;
}

/// Supplies unexecuted test candidates with predicted traces.
pub trait CandidateTestSource {
    fn candidates(&mut self) -> Vec<AvailableTest>;
}

/// Executes one candidate test against the system under test. May block
/// (a human, a build system); may fail recoverably.
pub trait TestExecutor {
    fn execute(&mut self, test: &AvailableTest) -> Result<TestResult, AveriaError>;
}

/// Reads the SFL tool's text output directory: `spectra.csv` (one
/// element id per line), `tests.csv` (`name,PASS|FAIL` rows), and
/// `matrix.txt` (rows of 0/1). A leading header line containing `name`
/// is skipped in the CSV files.
pub struct SflTextLoader {
    dir: PathBuf,
}

impl SflTextLoader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn read_lines(path: &Path) -> Result<Vec<String>, AveriaError> {
        let content = fs::read_to_string(path).map_err(|source| AveriaError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect())
    }

    fn strip_header(mut lines: Vec<String>) -> Vec<String> {
        if lines
            .first()
            .is_some_and(|l| l.to_lowercase().contains("name"))
        {
            lines.remove(0);
        }
        lines
    }

    fn parse_tests(lines: Vec<String>) -> Vec<TestCase> {
        Self::strip_header(lines)
            .into_iter()
            .map(|line| {
                let mut parts = line.split(',');
                let name = parts.next().unwrap_or_default().trim().to_string();
                let status = parts.next().unwrap_or_default().trim().to_lowercase();
                TestCase::new(name, status.contains("fail"))
            })
            .collect()
    }

    fn parse_matrix(
        lines: Vec<String>,
        tests: usize,
        elements: usize,
    ) -> Result<Vec<Vec<bool>>, AveriaError> {
        if lines.len() != tests {
            return Err(AveriaError::Parse {
                what: "matrix.txt",
                line: lines.len(),
                detail: format!("expected {tests} rows, found {}", lines.len()),
            });
        }
        let mut matrix = Vec::with_capacity(tests);
        for (i, line) in lines.into_iter().enumerate() {
            let bits: Vec<&str> = line
                .split(|c: char| c.is_whitespace() || c == ',')
                .filter(|s| !s.is_empty())
                .collect();
            if bits.len() != elements {
                return Err(AveriaError::Parse {
                    what: "matrix.txt",
                    line: i + 1,
                    detail: format!("expected {elements} columns, found {}", bits.len()),
                });
            }
            let mut row = Vec::with_capacity(elements);
            for (j, bit) in bits.into_iter().enumerate() {
                match bit {
                    "0" => row.push(false),
                    "1" => row.push(true),
                    other => {
                        return Err(AveriaError::Parse {
                            what: "matrix.txt",
                            line: i + 1,
                            detail: format!("column {}: expected 0 or 1, found '{other}'", j + 1),
                        })
                    }
                }
            }
            matrix.push(row);
        }
        Ok(matrix)
    }
}

impl SpectraLoader for SflTextLoader {
    fn load(&self) -> Result<Spectrum, AveriaError> {
        let elements = Self::strip_header(Self::read_lines(&self.dir.join("spectra.csv"))?);
        let tests = Self::parse_tests(Self::read_lines(&self.dir.join("tests.csv"))?);
        let matrix = Self::parse_matrix(
            Self::read_lines(&self.dir.join("matrix.txt"))?,
            tests.len(),
            elements.len(),
        )?;
        debug!(
            dir = %self.dir.display(),
            elements = elements.len(),
            tests = tests.len(),
            "parsed SFL text layout"
        );
        Spectrum::new(elements, tests, matrix)
    }
}

/// A fixed candidate pool, handed out once.
#[derive(Debug, Default)]
pub struct StaticCandidates {
    pool: Vec<AvailableTest>,
}

impl StaticCandidates {
    pub fn new(pool: Vec<AvailableTest>) -> Self {
        Self { pool }
    }
}

impl CandidateTestSource for StaticCandidates {
    fn candidates(&mut self) -> Vec<AvailableTest> {
        std::mem::take(&mut self.pool)
    }
}

/// Answers executions from a pre-recorded name → result table. Tests
/// without a recorded result fail recoverably, which also makes this the
/// simplest way to exercise executor-error paths.
#[derive(Debug, Default)]
pub struct ScriptedExecutor {
    results: HashMap<String, TestResult>,
}

impl ScriptedExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_result(mut self, result: TestResult) -> Self {
        self.results.insert(result.name.clone(), result);
        self
    }

    /// Shorthand for recording an outcome where the actual trace equals
    /// the estimate the planner saw.
    pub fn with_outcome(self, name: &str, passed: bool, trace: BTreeSet<String>) -> Self {
        self.with_result(TestResult::new(name, passed, trace))
    }
}

impl TestExecutor for ScriptedExecutor {
    fn execute(&mut self, test: &AvailableTest) -> Result<TestResult, AveriaError> {
        self.results
            .remove(&test.name)
            .ok_or_else(|| AveriaError::Executor {
                test: test.name.clone(),
                reason: "no scripted result".into(),
            })
    }
}
