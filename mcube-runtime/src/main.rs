use anyhow::{anyhow, Result};
use clap::{arg, ArgAction, Command};
use log::info;
use mcube_algorithms::{get_help, run_algorithm, NoMonitor, Progress, ALGORITHMS};
use mcube_challenges::{Challenge, LineKind, ObjectiveFunction, Solution};
use mcube_structs::core::{OutputData, RunSettings};
use mcube_utils::{compress_obj, hex_from_u8s, jsonify, load_json_arg, TraceWriter};
use serde_json::{Map, Value};
use std::{collections::BTreeMap, fs, path::PathBuf};
use tracing_subscriber::EnvFilter;

fn cli() -> Command {
    Command::new("mcube-runtime")
        .about("Searches for or verifies magic cube solutions")
        .arg_required_else_help(true)
        .subcommand(
            Command::new("compute_solution")
                .about("Runs a search and reports the best cube found")
                .arg(
                    arg!(<SETTINGS> "Settings json string or path to json file")
                        .value_parser(clap::value_parser!(String)),
                )
                .arg(
                    arg!(<RAND_HASH> "A string used in seed generation")
                        .value_parser(clap::value_parser!(String)),
                )
                .arg(arg!(<NONCE> "Nonce value").value_parser(clap::value_parser!(u64)))
                .arg(
                    arg!(--hyperparameters [HYPERPARAMETERS] "Hyperparameters json string or path to json file")
                        .value_parser(clap::value_parser!(String)),
                )
                .arg(
                    arg!(--trace [TRACE_FILE] "If set, one 'iteration value' line per step is written to this file")
                        .value_parser(clap::value_parser!(PathBuf)),
                )
                .arg(
                    arg!(--output [OUTPUT_FILE] "If set, the output data will be saved to this file path (default json)")
                        .value_parser(clap::value_parser!(PathBuf)),
                )
                .arg(
                    arg!(--compress [COMPRESS] "If output file is set, the output data will be compressed as zlib")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("verify_solution")
                .about("Scores a solution and checks that it is a perfect magic cube")
                .arg(
                    arg!(<SETTINGS> "Settings json string or path to json file")
                        .value_parser(clap::value_parser!(String)),
                )
                .arg(
                    arg!(<SOLUTION> "Solution json string, path to json file, or '-' for stdin")
                        .value_parser(clap::value_parser!(String)),
                ),
        )
        .subcommand(Command::new("list_algorithms").about("Lists algorithms and their hyperparameters"))
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let matches = cli().get_matches();

    if let Err(e) = match matches.subcommand() {
        Some(("compute_solution", sub_m)) => compute_solution(
            sub_m.get_one::<String>("SETTINGS").unwrap().clone(),
            sub_m.get_one::<String>("RAND_HASH").unwrap().clone(),
            *sub_m.get_one::<u64>("NONCE").unwrap(),
            sub_m.get_one::<String>("hyperparameters").cloned(),
            sub_m.get_one::<PathBuf>("trace").cloned(),
            sub_m.get_one::<PathBuf>("output").cloned(),
            sub_m.get_flag("compress"),
        ),
        Some(("verify_solution", sub_m)) => verify_solution(
            sub_m.get_one::<String>("SETTINGS").unwrap().clone(),
            sub_m.get_one::<String>("SOLUTION").unwrap().clone(),
        ),
        Some(("list_algorithms", _)) => list_algorithms(),
        _ => Err(anyhow!("Invalid subcommand")),
    } {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

pub fn compute_solution(
    settings: String,
    rand_hash: String,
    nonce: u64,
    hyperparameters: Option<String>,
    trace_file: Option<PathBuf>,
    output_file: Option<PathBuf>,
    compress: bool,
) -> Result<()> {
    let settings = load_json_arg::<RunSettings>(&settings)?;
    let hyperparameters = hyperparameters
        .map(|h| load_json_arg::<Map<String, Value>>(&h))
        .transpose()?;
    let seed = settings.calc_seed(&rand_hash, nonce);
    info!(
        "{} on a {}x{}x{} cube ({:?}), seed {}",
        settings.algorithm_id,
        settings.size,
        settings.size,
        settings.size,
        settings.objective,
        hex_from_u8s(&seed)
    );

    let challenge = Challenge::generate_instance(&seed, &settings.difficulty())?;
    let (outcome, solution) = match trace_file {
        Some(path) => {
            let mut trace = TraceWriter::create(&path)?;
            let mut monitor =
                |progress: &Progress| trace.record(progress.iteration, progress.trace_value);
            let result = run_algorithm(
                &settings.algorithm_id,
                &challenge,
                &hyperparameters,
                &mut monitor,
            )?;
            trace.flush()?;
            info!("{} trace records written to {:?}", trace.records(), trace.path());
            result
        }
        None => run_algorithm(
            &settings.algorithm_id,
            &challenge,
            &hyperparameters,
            &mut NoMonitor,
        )?,
    };

    println!("Final cube:");
    print!("{}", solution.to_lattice()?);
    println!("Algorithm: {}", outcome.algorithm);
    println!("Termination: {:?}", outcome.termination);
    println!("Iterations: {}", outcome.iterations);
    println!("Elapsed: {:.3}s", outcome.elapsed_secs);
    println!("Initial error: {}", outcome.initial_error);
    println!("Final error: {}", outcome.best_error);
    for (key, value) in outcome.details.iter() {
        println!("{}: {}", key, value);
    }

    let output_data = OutputData {
        nonce,
        settings,
        hyperparameters,
        outcome,
        solution,
    };
    if let Some(path) = output_file {
        if compress {
            fs::write(&path, compress_obj(&output_data)?)?;
        } else {
            fs::write(&path, jsonify(&output_data))?;
        }
        println!("output_data written to: {:?}", path);
    }
    if !output_data.is_solved() {
        info!("No perfect cube found");
    }
    Ok(())
}

pub fn verify_solution(settings: String, solution: String) -> Result<()> {
    let settings = load_json_arg::<RunSettings>(&settings)?;
    let solution = load_json_arg::<Solution>(&solution)?;
    // scoring does not depend on the seed
    let challenge = Challenge::generate_instance(&[0u8; 32], &settings.difficulty())?;

    let error = challenge.evaluate_error(&solution)?;
    println!("Objective error: {}", error);
    if let ObjectiveFunction::MagicSum(magic_sum) = challenge.objective() {
        let lattice = solution.to_lattice()?;
        let mut breakdown = BTreeMap::<LineKind, (usize, u64, usize)>::new();
        for (kind, deviation) in magic_sum.line_deviations(&lattice) {
            let entry = breakdown.entry(kind).or_default();
            entry.0 += 1;
            entry.1 += deviation;
            if deviation == 0 {
                entry.2 += 1;
            }
        }
        println!("Magic constant: {}", magic_sum.target());
        for (kind, (lines, deviation, exact)) in breakdown {
            println!(
                "  {:?}: {} lines, {} exact, deviation {}",
                kind, lines, exact, deviation
            );
        }
    }

    match challenge.verify_solution(&solution) {
        Ok(_) => println!("Solution is valid"),
        Err(e) => {
            eprintln!("Verification error: Invalid solution: {}", e);
            std::process::exit(1);
        }
    }
    Ok(())
}

pub fn list_algorithms() -> Result<()> {
    for algorithm_id in ALGORITHMS {
        let help = get_help(algorithm_id)
            .ok_or_else(|| anyhow!("No help registered for {}", algorithm_id))?;
        println!("== {} ==", algorithm_id);
        help();
        println!();
    }
    Ok(())
}
