//! Classic SFL ranking over the external tool's text layout.
//!
//! Writes a tiny spectra/tests/matrix triple to a temp directory, loads
//! it back, and prints the per-formula suspiciousness rankings.
//!
//! Run with: cargo run --example sfl_ranking

use averia::{SbflFormula, SflTextLoader, SpectraLoader};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let dir = tempfile::tempdir()?;
    std::fs::write(
        dir.path().join("spectra.csv"),
        "name\ndemo.Calculator#add(int,int)\ndemo.Calculator#subtract(int,int)\ndemo.Calculator#multiply(int,int)\n",
    )?;
    std::fs::write(
        dir.path().join("tests.csv"),
        "name,outcome\ntestAdd,FAIL\ntestSubtract,PASS\ntestMultiply,PASS\ntestAll,FAIL\n",
    )?;
    std::fs::write(dir.path().join("matrix.txt"), "1 0 0\n0 1 0\n0 0 1\n1 1 1\n")?;

    let spectrum = SflTextLoader::new(dir.path()).load()?;
    println!(
        "Loaded {} elements across {} tests ({} failed)\n",
        spectrum.element_count(),
        spectrum.test_count(),
        spectrum.failed_count()
    );

    for formula in [
        SbflFormula::Ochiai,
        SbflFormula::Tarantula,
        SbflFormula::Barinel,
    ] {
        println!("=== {formula} ===");
        for (score, element) in spectrum.ranking(formula) {
            println!("  {score:.6}  {element}");
        }
        println!();
    }

    Ok(())
}
