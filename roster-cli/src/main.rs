//! roster-cli: Command-line interface for the Roster shift-assignment solver
//!
//! # Commands
//!
//! - `solve`: run the solver on a problem file and write the roster
//! - `validate`: validate a problem file without solving
//! - `schema`: print example input/output documents
//!
//! Problem files are JSON by default; files ending in `.yaml`/`.yml` are
//! parsed as YAML.
//!
//! # Exit codes
//!
//! - 0: success
//! - 1: infeasible input (capacity, validation or unknown-id errors)
//! - 2: no solution found
//! - 3: I/O error

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use roster_core::models::{ApiInput, ProgressCallback};
use roster_core::solver::{SolverError, State};
use roster_core::{run_parallel_solver, run_solver_with_progress};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Parser)]
#[command(name = "roster-cli")]
#[command(version = "0.1.0")]
#[command(about = "Roster shift-assignment solver CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the solver on a problem file
    Solve {
        /// Input file path, JSON or YAML (use --stdin to read JSON from stdin)
        #[arg(value_name = "FILE")]
        input: Option<PathBuf>,

        /// Read JSON input from stdin instead of a file
        #[arg(long)]
        stdin: bool,

        /// Output file path (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,

        /// Also export persistence rows (shift_assignment + events) as JSON
        #[arg(long, value_name = "PATH")]
        export_rows: Option<PathBuf>,

        /// Number of parallel workers (overrides the file's setting)
        #[arg(short, long)]
        workers: Option<usize>,

        /// RNG seed for reproducible runs (overrides the file's setting)
        #[arg(long)]
        seed: Option<u64>,

        /// Initial annealing temperature (overrides the file's setting)
        #[arg(long)]
        initial_temperature: Option<f64>,

        /// Geometric cooling rate in (0, 1) (overrides the file's setting)
        #[arg(long)]
        cooling_rate: Option<f64>,

        /// Stop after this many consecutive rejections (overrides the file's setting)
        #[arg(long)]
        no_improvement: Option<u64>,
    },

    /// Validate a problem file without solving
    Validate {
        /// Input file path, JSON or YAML
        #[arg(value_name = "FILE")]
        input: Option<PathBuf>,

        /// Read JSON input from stdin instead of a file
        #[arg(long)]
        stdin: bool,
    },

    /// Print example JSON documents for the input/output formats
    Schema {
        /// Which schema to print: input, output, or all
        #[arg(value_name = "TYPE", default_value = "all")]
        schema_type: String,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let outcome = match cli.command {
        Commands::Solve {
            input,
            stdin,
            output,
            pretty,
            export_rows,
            workers,
            seed,
            initial_temperature,
            cooling_rate,
            no_improvement,
        } => cmd_solve(SolveArgs {
            input,
            stdin,
            output,
            pretty,
            export_rows,
            workers,
            seed,
            initial_temperature,
            cooling_rate,
            no_improvement,
        }),
        Commands::Validate { input, stdin } => cmd_validate(input, stdin),
        Commands::Schema { schema_type } => cmd_schema(&schema_type).map_err(CliError::Io),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", err);
            ExitCode::from(err.exit_code())
        }
    }
}

/// CLI failure with its process exit code.
enum CliError {
    Solver(SolverError),
    Io(anyhow::Error),
}

impl CliError {
    fn exit_code(&self) -> u8 {
        match self {
            CliError::Solver(e) => match e {
                SolverError::Capacity(_)
                | SolverError::Validation(_)
                | SolverError::NotFound(_) => 1,
                SolverError::ScheduleCreation(_) | SolverError::NoSolution(_) => 2,
            },
            CliError::Io(_) => 3,
        }
    }
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Solver(e) => write!(f, "{}", e),
            CliError::Io(e) => write!(f, "{:#}", e),
        }
    }
}

struct SolveArgs {
    input: Option<PathBuf>,
    stdin: bool,
    output: Option<PathBuf>,
    pretty: bool,
    export_rows: Option<PathBuf>,
    workers: Option<usize>,
    seed: Option<u64>,
    initial_temperature: Option<f64>,
    cooling_rate: Option<f64>,
    no_improvement: Option<u64>,
}

fn read_input(file: Option<PathBuf>, use_stdin: bool) -> Result<ApiInput> {
    if use_stdin {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .context("Failed to read from stdin")?;
        serde_json::from_str(&buffer).context("Failed to parse input JSON")
    } else if let Some(path) = file {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read file: {:?}", path))?;
        parse_input(&content, &path)
    } else {
        anyhow::bail!("Either provide an input file or use --stdin")
    }
}

fn parse_input(content: &str, path: &Path) -> Result<ApiInput> {
    let is_yaml = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"));
    if is_yaml {
        serde_yaml::from_str(content).context("Failed to parse input YAML")
    } else {
        serde_json::from_str(content).context("Failed to parse input JSON")
    }
}

fn cmd_solve(args: SolveArgs) -> Result<(), CliError> {
    let mut api_input = read_input(args.input, args.stdin).map_err(CliError::Io)?;

    if let Some(workers) = args.workers {
        api_input.solver.workers = workers;
    }
    if let Some(seed) = args.seed {
        api_input.solver.seed = Some(seed);
    }
    if let Some(temperature) = args.initial_temperature {
        api_input.solver.initial_temperature = temperature;
    }
    if let Some(rate) = args.cooling_rate {
        api_input.solver.cooling_rate = rate;
    }
    if let Some(limit) = args.no_improvement {
        api_input.solver.no_improvement_limit = limit;
    }

    let result = if api_input.solver.workers <= 1 {
        // Single worker: stream its progress to a bar.
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::with_template("{bar:40} {pos}/{len} {msg}")
                .expect("valid progress template"),
        );
        let bar_handle = bar.clone();
        let callback: ProgressCallback = Box::new(move |update| {
            bar_handle.set_length(update.estimated_iterations.max(update.iteration));
            bar_handle.set_position(update.iteration);
            bar_handle.set_message(format!(
                "cost {:.1} (best {:.1})",
                update.current_cost, update.best_cost
            ));
            true
        });
        let outcome = run_solver_with_progress(&api_input, Some(&callback));
        bar.finish_and_clear();
        outcome
    } else {
        eprintln!(
            "Running {} workers{}...",
            api_input.solver.workers,
            api_input
                .solver
                .seed
                .map(|s| format!(" (base seed {})", s))
                .unwrap_or_default()
        );
        run_parallel_solver(&api_input)
    }
    .map_err(CliError::Solver)?;

    eprintln!(
        "Final cost {:.2} (initial {:.2})",
        result.final_cost, result.initial_cost
    );

    let output_json = if args.pretty {
        serde_json::to_string_pretty(&result)
    } else {
        serde_json::to_string(&result)
    }
    .context("Failed to serialize result")
    .map_err(CliError::Io)?;

    if let Some(output_path) = args.output {
        fs::write(&output_path, &output_json)
            .with_context(|| format!("Failed to write output to {:?}", output_path))
            .map_err(CliError::Io)?;
        eprintln!("Result written to {:?}", output_path);
    } else {
        println!("{}", output_json);
    }

    if let Some(rows_path) = args.export_rows {
        let created_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0);
        let (assignments, events) = result.to_rows(created_at);
        let rows_json = serde_json::json!({
            "shift_assignment": assignments,
            "shift_assignment_event": events,
        });
        fs::write(
            &rows_path,
            serde_json::to_string_pretty(&rows_json)
                .context("Failed to serialize rows")
                .map_err(CliError::Io)?,
        )
        .with_context(|| format!("Failed to write rows to {:?}", rows_path))
        .map_err(CliError::Io)?;
        eprintln!("Persistence rows written to {:?}", rows_path);
    }

    Ok(())
}

fn cmd_validate(input: Option<PathBuf>, stdin: bool) -> Result<(), CliError> {
    let api_input = read_input(input, stdin).map_err(CliError::Io)?;

    // Domain validation plus the capacity pre-checks, without solving.
    let outcome = State::new(&api_input).and_then(|state| state.precheck());
    match outcome {
        Ok(()) => {
            println!("{{\"valid\": true, \"message\": \"Problem definition is valid\"}}");
            Ok(())
        }
        Err(e) => {
            println!(
                "{{\"valid\": false, \"error\": \"{}\"}}",
                e.to_string().replace('"', "\\\"")
            );
            Err(CliError::Solver(e))
        }
    }
}

fn cmd_schema(schema_type: &str) -> Result<()> {
    match schema_type {
        "input" => print_input_schema(),
        "output" => print_output_schema(),
        "all" => {
            println!("=== INPUT SCHEMA ===\n");
            print_input_schema()?;
            println!("\n=== OUTPUT SCHEMA ===\n");
            print_output_schema()?;
            Ok(())
        }
        _ => anyhow::bail!(
            "Unknown schema type: {}. Use: input, output, or all",
            schema_type
        ),
    }
}

fn print_input_schema() -> Result<()> {
    let example = r#"{
  "problem": {
    "people": [
      {
        "id": "alice",
        "label": "Alice",
        "shift_count": [2, 3],
        "gender": 1,
        "shift_types": {"1": {"experienced": true, "min": 1, "max": 2}},
        "unavailable": [{"start": 1719600000, "end": 1719650000}],
        "mandatory": [],
        "days_off": [{"start": 1719700000, "end": 1719786400}],
        "min_rest_seconds": 28800,
        "partners": [
          {"id": "bob", "relation": -1},
          {"id": "mallory", "relation": 1}
        ],
        "time_preferences": [
          {"window": {"start_sec": 82800, "end_sec": 25200}, "cost": 3}
        ]
      },
      {"id": "bob", "shift_count": [1, 2]}
    ],
    "shifts": [
      {
        "id": "fri-night",
        "start": 1719615600,
        "end": 1719637200,
        "capacity": [2, 4],
        "shift_type": 1,
        "restricted": false,
        "priority": 2,
        "base_cost": 3
      }
    ]
  },
  "weights": {
    "friend_factor": 100.0,
    "enemy_factor": 5000.0,
    "off_day_factor": 200.0,
    "balance_exponent": 2.0
  },
  "solver": {
    "workers": 4,
    "seed": 42,
    "initial_temperature": 1000.0,
    "cooling_rate": 0.9999,
    "no_improvement_limit": 1000,
    "logging": {"log_frequency": 333}
  }
}"#;
    println!("{}", example);
    Ok(())
}

fn print_output_schema() -> Result<()> {
    let example = r#"{
  "final_cost": 1234.5,
  "initial_cost": 5678.9,
  "assignments": {
    "fri-night": ["alice", "bob"]
  },
  "person_shifts": {
    "alice": ["fri-night"],
    "bob": ["fri-night"]
  },
  "person_costs": {
    "alice": {
      "preference": 0.0,
      "off_day": 0.0,
      "ranking": 12.0,
      "shift_type": 0.0,
      "mandatory": 0.0,
      "total": 12.0
    }
  },
  "cost": {
    "individual_total": 24.0,
    "priority": 4.0,
    "gender": 1.2,
    "balance": 9.3,
    "total": 38.5
  },
  "iterations": 6905,
  "no_improvement_count": 1000
}"#;
    println!("{}", example);
    Ok(())
}
