use anyhow::Context;
use clap::Parser;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use watersort_solver::engine::PuzzleState;
use watersort_solver::heuristics::choose_greedy_move;
use watersort_solver::solver::{solve, SearchBudget};
use watersort_solver::utils::{check_conservation, state_from_text};

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Maximum number of states to expand
    #[clap(short = 'n', long, default_value_t = 20_000)]
    max_nodes: usize,

    /// Time limit in milliseconds (0 for none)
    #[clap(short, long, default_value_t = 0)]
    time_ms: u64,

    /// Heuristic weight (1 = plain A*, larger is greedier)
    #[clap(short, long, default_value_t = 1.0)]
    weight: f64,

    /// Path to the puzzle file (one tube per line, bottom first, '.' for an empty tube)
    puzzle_file: PathBuf,
}

fn read_puzzle_file(path: &PathBuf) -> anyhow::Result<PuzzleState> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read file: {}", path.display()))?;
    let state = state_from_text(&content).context("Invalid puzzle format")?;
    check_conservation(&state).context("Invalid puzzle contents")?;
    Ok(state)
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let state = read_puzzle_file(&args.puzzle_file)?;
    println!("Loaded puzzle from {}\n", args.puzzle_file.display());
    println!("Initial state:\n{}\n", state);

    let budget = SearchBudget {
        time_limit: (args.time_ms > 0).then(|| Duration::from_millis(args.time_ms)),
        max_nodes: args.max_nodes,
        weight: args.weight,
    };
    println!("Searching with {:?}...\n", budget);

    match solve(&state, &budget) {
        Some(solution) => {
            println!("Solution found after {} nodes:\n", solution.nodes_expanded);
            println!("Moves ({}):", solution.moves.len());
            if solution.moves.is_empty() {
                println!("  Already solved.");
            }
            let mut current = state;
            for (i, mv) in solution.moves.iter().enumerate() {
                println!("  Move {}: {}", i + 1, mv);
                current = current.apply(*mv);
            }
            println!("\nFinal state:\n{}", current);
        }
        None => {
            println!("No solution found within budget.");
            match choose_greedy_move(&state) {
                Some((score, mv)) => println!("Best single move: {} (disorder after: {})", mv, score),
                None => println!("No legal move available."),
            }
        }
    }
    Ok(())
}
