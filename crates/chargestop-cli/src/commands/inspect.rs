//! `chargestop inspect`
//!
//! Validates an instance and prints its model size without solving.

use anyhow::{Context, Result};
use chargestop_cli::cli::InspectArgs;
use chargestop_model::{ModelBuilder, ObjectiveConfig, ProblemInstance};
use std::io::{self, Write};
use tabwriter::TabWriter;

use crate::input::load_instance;

pub fn handle(args: &InspectArgs) -> Result<()> {
    let instance = load_instance(&args.input)?;
    let system = ModelBuilder::new(&instance)
        .objective(ObjectiveConfig::new(args.objective))
        .build()
        .context("building charging stop model")?;
    let stats = system.statistics();

    println!("Instance {}:", args.input.display());
    print_instance(&instance)?;

    println!("\nModel ({}):", args.objective);
    let mut writer = TabWriter::new(io::stdout());
    writeln!(writer, "  Variables\t{}", stats.variables)?;
    writeln!(writer, "    binary\t{}", stats.binaries)?;
    writeln!(writer, "    continuous\t{}", stats.continuous)?;
    writeln!(writer, "  Constraints\t{}", stats.constraints)?;
    for (family, count) in &stats.by_family {
        writeln!(writer, "    {family}\t{count}")?;
    }
    writer.flush()?;
    Ok(())
}

fn print_instance(instance: &ProblemInstance) -> Result<()> {
    let join = |orders: Vec<usize>| {
        if orders.is_empty() {
            "none".to_string()
        } else {
            orders
                .iter()
                .map(|o| o.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        }
    };

    let mut writer = TabWriter::new(io::stdout());
    writeln!(writer, "  Stations\t{}", instance.station_count())?;
    writeln!(writer, "  Battery capacity\t{:.2} kWh", instance.battery_capacity())?;
    writeln!(writer, "  Reserve\t{:.2} kWh", instance.reserve_energy())?;
    writeln!(writer, "  Initial energy\t{:.2} kWh", instance.initial_energy())?;
    writeln!(writer, "  Route\t{:.2} kWh, {:.2} min", instance.route_length(), instance.nonstop_time())?;
    writeln!(writer, "  Reachable from origin\t{}", join(instance.reachable_from_origin()))?;
    writeln!(writer, "  Reaching destination\t{}", join(instance.reaching_destination()))?;
    writer.flush()?;
    Ok(())
}
