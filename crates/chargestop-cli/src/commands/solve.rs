//! `chargestop solve`

use anyhow::{Context, Result};
use chargestop_cli::cli::SolveArgs;
use chargestop_model::{
    solve, ModelBuilder, MultiObjectivePolicy, ObjectiveConfig, SolverConfig,
};
use std::fs;
use tracing::info;

use crate::input::load_instance;
use crate::report;

pub fn handle(args: &SolveArgs) -> Result<()> {
    let instance = load_instance(&args.input)?;
    info!(
        stations = instance.station_count(),
        input = %args.input.display(),
        "instance loaded"
    );

    let mut objective = ObjectiveConfig::new(args.objective).with_cost_basis(args.cost_basis);
    if let Some(weights) = &args.weights {
        objective = objective.with_multi_policy(MultiObjectivePolicy::Weighted {
            weights: weights.clone(),
        });
    }

    let system = ModelBuilder::new(&instance)
        .objective(objective)
        .build()
        .context("building charging stop model")?;

    let config = SolverConfig {
        backend: args.backend,
        time_limit_seconds: args.time_limit,
        verbose: args.verbose,
        ..SolverConfig::default()
    };
    let outcome = solve(&system, &config).context("solving charging stop model")?;

    let out_path = args
        .out
        .clone()
        .unwrap_or_else(|| report::default_report_path(&args.input, args.objective.as_str()));
    let text = report::render(&args.input, &instance, &outcome)?;
    fs::write(&out_path, text)
        .with_context(|| format!("writing report to {}", out_path.display()))?;

    if args.json {
        let json = serde_json::to_string_pretty(&outcome).context("serializing outcome")?;
        println!("{json}");
    } else {
        print!("{}", outcome.summary());
        println!("\nReport written to {}", out_path.display());
    }

    Ok(())
}
