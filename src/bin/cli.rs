use clap::{ArgAction, Parser, Subcommand};
use colored::Colorize;
use concurrent_forces::prelude::*;
use concurrent_forces::Outcome;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Once;

#[derive(Parser)]
#[command(name = "concurrent-forces")]
#[command(about = "Solve equilibrium and resultant problems for 2D concurrent forces")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Print the report as JSON
    #[arg(long, global = true)]
    json: bool,

    /// JSON file with solver settings
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Command {
    /// Find the unknowns that put the forces in equilibrium
    Equilibrium {
        /// Forces as MAG@ANGLE in degrees; `?` or nothing marks an unknown, e.g. `10@0 ?@?`.
        /// Magnitudes may be negative; options go before the forces
        #[arg(value_name = "MAG@ANGLE", required = true, allow_hyphen_values = true)]
        forces: Vec<String>,
    },
    /// Compute or check the resultant R @ alpha of the forces
    Resultant {
        /// Forces as MAG@ANGLE in degrees; `?` or nothing marks an unknown.
        /// Magnitudes may be negative; options go before the forces
        #[arg(value_name = "MAG@ANGLE", required = true, allow_hyphen_values = true)]
        forces: Vec<String>,
        /// Resultant magnitude, unknown if omitted
        #[arg(long = "r", default_value = "", allow_hyphen_values = true)]
        r: String,
        /// Resultant angle in degrees, unknown if omitted
        #[arg(long, default_value = "", allow_hyphen_values = true)]
        alpha: String,
    },
}

static INIT: Once = Once::new();

fn init_logger(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    INIT.call_once(|| {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
    });
}

fn main() {
    let args = Args::parse();
    init_logger(args.verbose);

    if let Err(e) = run(&args) {
        eprintln!("{} {}", "Error:".red().bold(), e);
        process::exit(1);
    }
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => SolverConfig::default(),
    };
    let solver = Solver::new(config);

    match &args.command {
        Command::Equilibrium { forces } => {
            let fields = split_forces(forces)?;
            let report = solver.solve_equilibrium_text(&fields);
            if args.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
                return Ok(());
            }
            print_outcome(&report.outcome, solver.config());
            if let (Some(magnitude), Some(angle)) =
                (report.equilibrium_magnitude, report.equilibrium_angle_degrees)
            {
                print_sum("ΣF", magnitude, angle, solver.config());
            }
        }
        Command::Resultant { forces, r, alpha } => {
            let fields = split_forces(forces)?;
            let report = solver.solve_resultant_text(&fields, r, alpha);
            if args.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
                return Ok(());
            }
            print_outcome(&report.outcome, solver.config());
            if let (Some(magnitude), Some(angle)) =
                (report.resultant_magnitude, report.resultant_angle_degrees)
            {
                print_sum(report.resultant_symbol, magnitude, angle, solver.config());
            }
        }
    }
    Ok(())
}

fn load_config(path: &Path) -> Result<SolverConfig, Box<dyn std::error::Error>> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read config '{}': {e}", path.display()))?;
    Ok(SolverConfig::from_json(&text)?)
}

/// Splits `MAG@ANGLE` arguments into their two field texts.
fn split_forces(forces: &[String]) -> Result<Vec<(String, String)>, String> {
    forces
        .iter()
        .map(|force| {
            force
                .split_once('@')
                .map(|(magnitude, angle)| (magnitude.to_string(), angle.to_string()))
                .ok_or_else(|| format!("expected MAG@ANGLE, got '{force}'"))
        })
        .collect()
}

fn print_outcome(outcome: &Outcome, config: &SolverConfig) {
    if outcome.error {
        for message in &outcome.messages {
            println!("{} {}", "invalid input:".red().bold(), message);
        }
        return;
    }

    if let Some(equations) = &outcome.equations {
        println!("{}", "Equations".bright_blue().bold());
        println!("{equations}");
    }
    if !outcome.unknown_symbols.is_empty() {
        println!(
            "{} {}",
            "Unknowns:".bright_blue().bold(),
            outcome.unknown_symbols.join(", ")
        );
    }
    if let Some(strategy) = &outcome.strategy {
        println!("{} {strategy}", "Strategy:".bright_blue().bold());
    }

    for message in &outcome.messages {
        match message {
            Advisory::InEquilibrium | Advisory::Consistent => println!("{}", message.to_string().green()),
            _ => println!("{}", message.to_string().yellow()),
        }
    }

    let precision = config.magnitude_decimals as usize;
    for (i, solution) in outcome.solutions.iter().enumerate() {
        let line = format!("{solution:.precision$}");
        let line = if solution.is_physical() {
            line.green()
        } else {
            line.yellow()
        };
        println!("{} {line}", format!("Solution {}:", i + 1).bold());
        if !solution.reversed.is_empty() {
            println!(
                "  reversed direction (angle + 180°): {}",
                solution.reversed.join(", ")
            );
        }
    }
}

fn print_sum(label: &str, magnitude: f64, angle: f64, config: &SolverConfig) {
    println!(
        "{} {:.m$} @ {:.a$}°",
        format!("{label} =").bold(),
        magnitude,
        angle,
        m = config.magnitude_decimals as usize,
        a = config.angle_decimals as usize,
    );
}
