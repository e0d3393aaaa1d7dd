//! Interactive fault-localization walkthrough.
//!
//! Builds a small spectrum by hand (four calculator-style methods, two
//! failing tests), then lets the session pick discriminating tests from
//! a candidate pool and replay pre-recorded outcomes until the diagnosis
//! settles.
//!
//! Run with: cargo run --example tdp_session

use std::collections::BTreeSet;

use averia::{
    AvailableTest, AveriaConfig, ScriptedExecutor, Spectrum, StaticCandidates, TdpSession,
    TestCase, TestResult,
};

fn set(names: &[&str]) -> BTreeSet<String> {
    names.iter().map(|s| s.to_string()).collect()
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    println!("Averia TDP Session Demo");
    println!("Test, Diagnose, Plan until one explanation dominates\n");

    println!("{}", "=".repeat(70));
    println!("1. INITIAL SPECTRUM");
    println!("{}\n", "=".repeat(70));

    let elements = vec![
        "demo.Calculator#add(int,int)".to_string(),
        "demo.Calculator#subtract(int,int)".to_string(),
        "demo.Calculator#multiply(int,int)".to_string(),
        "demo.Calculator#divide(int,int)".to_string(),
    ];
    let tests = vec![
        TestCase::new("testAddAndSubtract", true),
        TestCase::new("testMultiplyAndDivide", true),
        TestCase::new("testSubtractOnly", false),
    ];
    let matrix = vec![
        vec![true, true, false, false],
        vec![false, false, true, true],
        vec![false, true, false, false],
    ];
    let spectrum = Spectrum::new(elements, tests, matrix)?;

    for (i, test) in spectrum.tests().iter().enumerate() {
        println!(
            "  {:24} {}  covers {:?}",
            test.name,
            if test.failed { "FAILED" } else { "passed" },
            spectrum.trace_of(i)
        );
    }

    println!("\n{}", "=".repeat(70));
    println!("2. RUNNING THE LOOP");
    println!("{}\n", "=".repeat(70));

    let mut session = TdpSession::new(spectrum, AveriaConfig::default());

    println!("Initial diagnoses:");
    for d in session.diagnose() {
        println!("  {d}");
    }

    let mut pool = StaticCandidates::new(vec![
        AvailableTest::new("testAddNegative", set(&["demo.Calculator#add(int,int)"])),
        AvailableTest::new(
            "testMultiplyZero",
            set(&["demo.Calculator#multiply(int,int)"]),
        ),
        AvailableTest::new("testDivideOne", set(&["demo.Calculator#divide(int,int)"])),
    ]);
    session.load_candidates(&mut pool);

    // Pre-recorded ground truth: add and multiply are broken.
    let mut executor = ScriptedExecutor::new()
        .with_result(TestResult::new(
            "testAddNegative",
            false,
            set(&["demo.Calculator#add(int,int)"]),
        ))
        .with_result(TestResult::new(
            "testMultiplyZero",
            false,
            set(&["demo.Calculator#multiply(int,int)"]),
        ))
        .with_result(TestResult::new(
            "testDivideOne",
            true,
            set(&["demo.Calculator#divide(int,int)"]),
        ));

    let outcome = session.run(&mut executor);

    println!("\n{}", "=".repeat(70));
    println!("3. RESULT");
    println!("{}\n", "=".repeat(70));

    println!("  Termination: {:?}", outcome.reason);
    println!("  Iterations:  {}", outcome.iterations);
    println!("  Diagnoses:");
    for d in &outcome.diagnoses {
        println!("    {d}");
    }
    if let Some(best) = &outcome.best {
        println!("\n  Focus debugging on:");
        for component in best.components() {
            println!("    - {component}");
        }
    }

    Ok(())
}
