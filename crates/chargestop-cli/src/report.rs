//! Plain-text solve reports.

use anyhow::{Context, Result};
use chargestop_model::{PlanOutcome, ProblemInstance};
use std::fmt::Write as _;
use std::io::Write;
use std::path::{Path, PathBuf};
use tabwriter::TabWriter;

/// `<input-stem>_<mode>.txt` next to the input file.
pub fn default_report_path(input: &Path, mode: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "instance".to_string());
    input.with_file_name(format!("{stem}_{mode}.txt"))
}

/// Render the full report: header, KPIs, stop table and every variable.
pub fn render(input: &Path, instance: &ProblemInstance, outcome: &PlanOutcome) -> Result<String> {
    let mut s = String::new();
    writeln!(s, "Charging stop plan for {}", input.display())?;
    writeln!(s, "{}", "=".repeat(40))?;
    writeln!(s, "Objective: {}", outcome.mode)?;
    writeln!(s, "Status: {}", outcome.status)?;
    writeln!(s, "Solve time: {:.3} s", outcome.elapsed.as_secs_f64())?;
    if let Some(value) = outcome.objective_value {
        writeln!(s, "Objective value: {value:.4}")?;
    }
    if outcome.objective_values.len() > 1 {
        let stages: Vec<String> = outcome
            .objective_values
            .iter()
            .map(|v| format!("{v:.4}"))
            .collect();
        writeln!(s, "Stage values: {}", stages.join(", "))?;
    }

    let Some(assignment) = &outcome.assignment else {
        writeln!(s, "\nNo assignment available.")?;
        return Ok(s);
    };

    if let Some(kpis) = &outcome.kpis {
        writeln!(s, "\nKPIs:")?;
        for (name, value) in kpis.entries() {
            writeln!(s, "  {name}: {value:.4}")?;
        }
    }

    writeln!(s, "\nStop plan:")?;
    let mut table = TabWriter::new(Vec::new());
    writeln!(
        table,
        "ORDER\tAT (kWh)\tARRIVE (kWh)\tDEPART (kWh)\tCHARGED (kWh)\tARRIVE (min)\tDEPART (min)\tDWELL (min)"
    )?;
    for loc in &assignment.locations {
        let is_endpoint = loc.order == 0 || loc.order == instance.destination();
        if !loc.visited && !is_endpoint {
            continue;
        }
        writeln!(
            table,
            "{}\t{:.2}\t{:.2}\t{:.2}\t{:.2}\t{:.2}\t{:.2}\t{:.2}",
            location_label(loc.order, instance),
            instance.station(loc.order).energy_to_reach,
            loc.arrival_energy,
            loc.departure_energy,
            loc.charged_energy(),
            loc.arrival_time,
            loc.departure_time,
            loc.dwell_time()
        )?;
    }
    let table = table.into_inner().context("flushing stop table")?;
    s.push_str(&String::from_utf8(table).context("stop table is not UTF-8")?);

    writeln!(s, "\nAssignment:")?;
    for (name, value) in &assignment.values {
        writeln!(s, "{name} = {value}")?;
    }
    Ok(s)
}

fn location_label(order: usize, instance: &ProblemInstance) -> String {
    if order == 0 {
        "origin".to_string()
    } else if order == instance.destination() {
        "destination".to_string()
    } else {
        order.to_string()
    }
}
