use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    version,
    about = "pairsum - Pair-potential energies and Metropolis Monte Carlo for particle systems in a periodic box.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Set the number of threads for parallel computation.
    /// Defaults to the number of available logical cores.
    #[arg(short = 'j', long, global = true, value_name = "NUM")]
    pub threads: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Evaluate the total energy, virial and forces of a system.
    Energy(EnergyArgs),
    /// Run Metropolis Monte Carlo with translation moves.
    Mc(McArgs),
}

/// Arguments for the `energy` subcommand.
#[derive(Args, Debug)]
pub struct EnergyArgs {
    /// Path to the system description file in TOML format.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub system: PathBuf,

    /// Path to a run configuration file in TOML format (only the `[engine]` table is used).
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Also accumulate forces and report the largest force magnitude.
    #[arg(long)]
    pub forces: bool,

    /// Report the number of evaluated pairs and the closest approach.
    #[arg(long)]
    pub pair_stats: bool,

    /// Disable the long-range tail correction, overriding the config file.
    #[arg(long)]
    pub no_tail: bool,
}

/// Arguments for the `mc` subcommand.
#[derive(Args, Debug)]
pub struct McArgs {
    /// Path to the system description file in TOML format.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub system: PathBuf,

    /// Path to the run configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Path for a CSV file of sampled energies.
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    // --- Sampling Overrides ---
    /// Override the number of Monte Carlo steps.
    #[arg(short = 'n', long, value_name = "INT")]
    pub steps: Option<u64>,

    /// Override the temperature, in energy units.
    #[arg(short = 't', long, value_name = "FLOAT")]
    pub temperature: Option<f64>,

    /// Override the largest single-atom displacement per axis.
    #[arg(long, value_name = "FLOAT")]
    pub atom_step: Option<f64>,

    /// Override the largest rigid-molecule displacement per axis.
    #[arg(long, value_name = "FLOAT")]
    pub molecule_step: Option<f64>,

    /// Override the random seed.
    #[arg(long, value_name = "INT")]
    pub seed: Option<u64>,

    /// Disable the long-range tail correction, overriding the config file.
    #[arg(long)]
    pub no_tail: bool,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S monte-carlo.check-interval=500
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}
