use clap::{Args, Parser, Subcommand};
use log::debug;
use std::path::{Path, PathBuf};

use bigm_format::{LpInput, parse_input, parse_reference, write_reference};
use bigm_solver::{
    DEFAULT_BIG_M, DEFAULT_PIVOT_TOLERANCE, DEFAULT_RANK_TOLERANCE, DEFAULT_VERIFY_TOLERANCE, Feasibility,
    SolutionStatus, Solver, to_standard_form, verify,
};

#[derive(Parser)]
#[command(name = "bigm")]
#[command(about = "Solve linear programs with the Big-M tableau simplex method", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Solve an LP input file
    Solve {
        /// The LP input file
        file: PathBuf,
        /// Reference solution to verify against
        #[arg(short, long)]
        expected: Option<PathBuf>,
        /// Absolute tolerance for verification
        #[arg(long, default_value_t = DEFAULT_VERIFY_TOLERANCE)]
        tolerance: f64,
        /// Write the computed solution in reference format
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Output format (pretty, json)
        #[arg(short, long, default_value = "pretty")]
        format: String,
        #[command(flatten)]
        solver: SolverArgs,
    },
    /// Parse an LP input file and run the feasibility analysis only
    Check {
        /// The LP input file
        file: PathBuf,
        /// Tolerance for rank and feasibility decisions
        #[arg(long, default_value_t = DEFAULT_RANK_TOLERANCE)]
        rank_tolerance: f64,
    },
}

#[derive(Args)]
struct SolverArgs {
    /// Penalty on artificial variables
    #[arg(long, default_value_t = DEFAULT_BIG_M)]
    big_m: f64,
    /// Tolerance for reduced-cost and ratio-test decisions
    #[arg(long, default_value_t = DEFAULT_PIVOT_TOLERANCE)]
    pivot_tolerance: f64,
    /// Tolerance for rank and feasibility decisions
    #[arg(long, default_value_t = DEFAULT_RANK_TOLERANCE)]
    rank_tolerance: f64,
    /// Maximum number of simplex pivots
    #[arg(long, default_value_t = 10000)]
    max_iterations: usize,
    /// Skip the zero/duplicate row pass (the QR rank pass still runs)
    #[arg(long)]
    no_pruning: bool,
}

impl SolverArgs {
    fn solver(&self) -> Solver {
        Solver::new()
            .with_big_m(self.big_m)
            .with_pivot_tolerance(self.pivot_tolerance)
            .with_rank_tolerance(self.rank_tolerance)
            .with_max_iterations(self.max_iterations)
            .with_row_pruning(!self.no_pruning)
    }
}

fn read_input(file: &Path) -> LpInput {
    let source = match std::fs::read_to_string(file) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error reading file: {}", e);
            std::process::exit(1);
        }
    };
    match parse_input(&source) {
        Ok(input) => input,
        Err(e) => {
            eprintln!("Parse error in {}: {}", file.display(), e);
            std::process::exit(1);
        }
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::new().filter_or("BIGM_LOG", "warn")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Solve {
            file,
            expected,
            tolerance,
            output,
            format,
            solver,
        } => {
            let input = read_input(&file);
            let problem = input.to_problem();
            let solution = match solver.solver().solve(&problem) {
                Ok(s) => s,
                Err(e) => {
                    eprintln!("Solver error: {}", e);
                    std::process::exit(1);
                }
            };
            debug!("solved {} in {} pivots", file.display(), solution.iterations);

            let verification = expected.map(|path| {
                let source = match std::fs::read_to_string(&path) {
                    Ok(s) => s,
                    Err(e) => {
                        eprintln!("Error reading file: {}", e);
                        std::process::exit(1);
                    }
                };
                let reference = match parse_reference(&source) {
                    Ok(r) => r,
                    Err(e) => {
                        eprintln!("Parse error in {}: {}", path.display(), e);
                        std::process::exit(1);
                    }
                };
                (verify(&solution, &reference, tolerance), reference)
            });

            if let (Some(path), Some(values), Some(objective)) = (&output, &solution.values, solution.objective_value) {
                if let Err(e) = std::fs::write(path, write_reference(objective, values)) {
                    eprintln!("Error writing {}: {}", path.display(), e);
                    std::process::exit(1);
                }
            }

            if format == "json" {
                let report = serde_json::json!({
                    "file": file.display().to_string(),
                    "constraints": input.num_constraints(),
                    "variables": input.num_variables(),
                    "solution": solution,
                    "verification": verification.as_ref().map(|(result, _)| match result {
                        Ok(v) => serde_json::json!(v),
                        Err(e) => serde_json::json!({ "error": e.to_string() }),
                    }),
                });
                match serde_json::to_string_pretty(&report) {
                    Ok(text) => println!("{}", text),
                    Err(e) => {
                        eprintln!("Error encoding report: {}", e);
                        std::process::exit(1);
                    }
                }
            } else {
                println!("Problem: {} constraints, {} variables", input.num_constraints(), input.num_variables());
                println!();
                match solution.status {
                    SolutionStatus::Optimal => {
                        println!("Status: OPTIMAL");
                        println!("Objective: {:.6}", solution.objective_value.unwrap_or(f64::NAN));
                        println!("Iterations: {}", solution.iterations);
                        println!();
                        println!("Solution:");
                        if let Some(values) = &solution.values {
                            for (name, value) in problem.assignments(values) {
                                println!("  {:<8} {:14.6}", name, value);
                            }
                        }
                    }
                    SolutionStatus::Infeasible => {
                        println!("Status: INFEASIBLE");
                        println!("No x >= 0 satisfies all constraints.");
                    }
                    SolutionStatus::Unbounded => {
                        println!("Status: UNBOUNDED");
                        println!("The problem has no finite optimal solution.");
                    }
                    SolutionStatus::IterationLimit => {
                        println!("Status: ITERATION LIMIT");
                        println!("No verdict after {} pivots.", solution.iterations);
                    }
                }

                if let Some((result, reference)) = &verification {
                    println!();
                    match result {
                        Ok(v) if v.is_match() => println!("Solution verified successfully!"),
                        Ok(v) => {
                            println!("Solution verification failed!");
                            println!("  expected objective:   {:.6}", reference.objective);
                            println!("  objective difference: {:.3e}", v.objective_difference);
                            println!("  solution difference:  {:.3e}", v.solution_difference);
                        }
                        Err(e) => println!("Solution verification failed: {}", e),
                    }
                }
            }

            let verified = verification
                .as_ref()
                .is_none_or(|(result, _)| result.as_ref().is_ok_and(|v| v.is_match()));
            if solution.status != SolutionStatus::Optimal || !verified {
                std::process::exit(1);
            }
        }
        Commands::Check { file, rank_tolerance } => {
            let input = read_input(&file);
            let standard = match to_standard_form(&input.to_problem()) {
                Ok(s) => s,
                Err(e) => {
                    eprintln!("✗ {}: {}", file.display(), e);
                    std::process::exit(1);
                }
            };

            let analyzer = Solver::new().with_rank_tolerance(rank_tolerance).analyzer();
            match analyzer.analyze(&standard) {
                Feasibility::Feasible { problem, kept_rows } => {
                    println!("✓ {} is consistent", file.display());
                    println!("  {} constraints, {} variables", input.num_constraints(), input.num_variables());
                    println!("  {} standard-form columns", standard.num_columns());
                    println!(
                        "  {} independent rows kept: {:?}",
                        problem.num_rows(),
                        kept_rows.iter().map(|i| i + 1).collect::<Vec<_>>()
                    );
                }
                Feasibility::Infeasible { residual } => {
                    eprintln!("✗ {} is infeasible", file.display());
                    eprintln!("  b is not in the column space of A (residual {:.3e})", residual);
                    std::process::exit(1);
                }
            }
        }
    }
}
