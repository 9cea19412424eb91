//! Hopper jump trajectory-optimization CLI.
//!
//! Two modes of operation:
//! - `info`: print the assembled problem's dimensions and schedule
//! - `evaluate`: evaluate the F vector at the initial guess and report
//!   per-block residual magnitudes

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::error;

use springbok_hopper::{HopperError, JumpConfig, JumpProblem};
use springbok_nlp::OptimizationProblem;

// ---------------------------------------------------------------------------
// CLI
// ---------------------------------------------------------------------------

/// Hopper jump trajectory optimization.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Path to a TOML problem configuration (defaults apply if omitted).
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print problem dimensions and the contact-mode schedule.
    Info,
    /// Evaluate the F vector at the initial guess.
    Evaluate,
}

fn load_config(path: Option<&PathBuf>) -> Result<JumpConfig, HopperError> {
    match path {
        Some(p) => Ok(JumpConfig::from_path(p)?),
        None => Ok(JumpConfig::default()),
    }
}

fn run(cli: &Cli) -> Result<(), HopperError> {
    let config = load_config(cli.config.as_ref())?;
    let mut problem = JumpProblem::new(config)?;

    match cli.command {
        Commands::Info => {
            let vars = problem.variables();
            let (f_low, _) = problem.f_bounds();
            println!("problem:            {}", problem.name());
            println!("knotpoints:         {}", problem.config().n_knotpoints);
            println!("decision variables: {}", vars.len());
            println!(
                "  initial condition: {}, per knotpoint: {}",
                vars.initial_condition_vars(),
                vars.vars_per_knotpoint().unwrap_or(0)
            );
            println!("residual rows:      {}", f_low.len());
            println!("objective row:      {}", problem.objective_row());
            println!("contact modes:");
            for mode in problem.schedule().modes() {
                println!(
                    "  [{:>3}, {:>3}] active contacts: {:?}",
                    mode.start, mode.end, mode.active_contacts
                );
            }
        }
        Commands::Evaluate => {
            let f = problem.compute_f()?;
            let (low, upp) = problem.f_bounds();
            let obj_row = problem.objective_row();

            let mut max_violation = 0.0_f64;
            for i in 0..obj_row {
                let violation = (low[i] - f[i]).max(f[i] - upp[i]).max(0.0);
                max_violation = max_violation.max(violation);
            }
            println!("F length:               {}", f.len());
            println!("objective value:        {:.6}", f[obj_row]);
            println!("max bound violation:    {max_violation:.6}");
            println!(
                "derivatives:            {}",
                if problem.sparse_jacobian().is_unimplemented() {
                    "unimplemented (solver must difference)"
                } else {
                    "sparse triplets"
                }
            );
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}
