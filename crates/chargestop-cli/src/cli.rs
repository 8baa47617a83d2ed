use chargestop_model::{CostBasis, MilpBackend, ObjectiveMode};
use clap::{Args, CommandFactory, Parser, Subcommand, ValueHint};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "chargestop",
    author,
    version,
    about = "Plan charging stops for an electric vehicle on a fixed route",
    long_about = None
)]
pub struct Cli {
    /// Set the logging level
    #[arg(long, default_value = "info", global = true)]
    pub log_level: tracing::Level,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Solve an instance and write a plain-text report
    Solve(SolveArgs),
    /// Validate an instance and print the size of its model
    Inspect(InspectArgs),
}

#[derive(Args, Debug)]
pub struct SolveArgs {
    /// Instance file (.toml or .json)
    #[arg(value_hint = ValueHint::FilePath)]
    pub input: PathBuf,

    /// Objective: traveltime, cost, multi or number_of_stops
    #[arg(long, default_value = "traveltime")]
    pub objective: ObjectiveMode,

    /// What station prices apply to: energy or charging_time
    #[arg(long, default_value = "energy")]
    pub cost_basis: CostBasis,

    /// Weights of (cost, travel time) for a weighted multi objective
    #[arg(long, value_delimiter = ',')]
    pub weights: Option<Vec<f64>>,

    /// MILP backend
    #[arg(long, default_value = "microlp")]
    pub backend: MilpBackend,

    /// Wall-clock limit in seconds, shared by all objective stages
    #[arg(long)]
    pub time_limit: Option<f64>,

    /// Report path (default: <input-stem>_<objective>.txt next to the input)
    #[arg(short, long, value_hint = ValueHint::FilePath)]
    pub out: Option<PathBuf>,

    /// Print the outcome as JSON on stdout
    #[arg(long)]
    pub json: bool,

    /// Forward solver output when the backend supports it
    #[arg(long)]
    pub verbose: bool,
}

#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Instance file (.toml or .json)
    #[arg(value_hint = ValueHint::FilePath)]
    pub input: PathBuf,

    /// Objective the model is assembled for
    #[arg(long, default_value = "traveltime")]
    pub objective: ObjectiveMode,
}

pub fn build_cli_command() -> clap::Command {
    Cli::command()
}
