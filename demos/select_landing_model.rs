//! Landing Outcome Model Selection Example
//!
//! Runs the full selection pipeline on a seeded synthetic launch table:
//! - Standardize the features and hold out 20% of the launches
//! - Grid-search logistic regression, SVM, decision tree and KNN
//! - Rank the families by held-out accuracy
//!
//! Pass a JSON configuration file as the first argument to override the
//! defaults. Set `RUST_LOG=landfall=debug` to see every grid point.
//!
//! Run with: cargo run --release --example select_landing_model [config.json]

use landfall::prelude::*;
use tracing_subscriber::prelude::*;

const FEATURES: [&str; 6] = [
    "FlightNumber",
    "PayloadMass",
    "Flights",
    "GridFins",
    "Reused",
    "Legs",
];

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "landfall=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn main() -> landfall::Result<()> {
    init_tracing();

    let config = match std::env::args().nth(1) {
        Some(path) => SelectionConfig::from_path(path)?,
        None => SelectionConfig::default(),
    };

    let dataset = Dataset::synthetic_binary(90, FEATURES.len(), 2)?
        .with_feature_names(FEATURES.iter().map(|s| (*s).to_string()).collect())?;
    let [failed, landed] = dataset.class_counts();
    println!(
        "Dataset: {} launches, {} features ({landed} landed, {failed} did not)\n",
        dataset.n_samples(),
        dataset.n_features()
    );

    let report = ModelSelector::new(config).run(&dataset)?;
    println!("{report}");

    println!("\nJSON report:");
    println!("{}", report.to_json_string()?);
    Ok(())
}
