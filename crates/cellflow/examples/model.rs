//! Example: a small model with a formula, a fidelity switch and a persisted output

use std::rc::Rc;

use cellflow::prelude::*;

fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    // Model inputs
    let scope = Scope::model().with("x1", 20.0)?.with("x2", 80.0)?;

    // Output with two fidelities
    let total = FidelitySet::new()
        .with("exact", Expression::parse("x1 + x2")?)
        .with("rounded", Expression::parse("ROUND((x1 + x2) / 10) * 10")?);
    let mut t = Cell::with_source("t", total).with_scope(scope.clone());

    println!("t = {:?}", t.evaluate(&[])?);
    println!(
        "t (x1 = 23) = {:?}",
        t.evaluate(&[Arg::entry("x1", 23.0), Arg::fidelity("rounded")])?
    );

    // Persist a derived value
    let store = Rc::new(MemoryStore::new());
    let mut report = Cell::with_source("report", Expression::parse("CONCAT(\"total: \", x1 + x2)")?)
        .with_scope(scope)
        .with_options(CellOptions {
            persistent: true,
            ..Default::default()
        })
        .with_store(store.clone());

    println!("report = {:?}", report.evaluate(&[])?);
    if let Some(handle) = report.url() {
        println!("stored at {}", handle);
    }
    println!("{}", report);

    Ok(())
}
