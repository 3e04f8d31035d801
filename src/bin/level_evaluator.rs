use clap::Parser;
use rand::rngs::SmallRng;
use rand::SeedableRng;
use watersort_solver::generator::{LevelConfig, MAX_LEVEL};
use watersort_solver::orchestrator::{LevelOrchestrator, OrchestratorConfig};
use watersort_solver::solver::{solve, SearchBudget};

#[derive(Parser, Debug)]
#[clap(author, version, about = "Generate seeded levels and report their difficulty", long_about = None)]
struct Args {
    /// Number of puzzles generated per level
    #[clap(short = 'n', long, default_value_t = 10)]
    puzzles: usize,

    /// First seed; puzzle i of a level uses seed + i
    #[clap(short, long, default_value_t = 0)]
    seed: u64,

    /// Generation attempts per puzzle
    #[clap(short, long, default_value_t = 15)]
    attempts: usize,

    /// Levels to evaluate (defaults to all)
    #[clap(short, long)]
    levels: Vec<u32>,
}

#[derive(Default)]
struct LevelStats {
    difficulties: Vec<u32>,
    solution_lengths: Vec<usize>,
    fallbacks: usize,
    unsolved: usize,
}

fn average<T: Copy + Into<f64>>(values: &[T]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().map(|&v| v.into()).sum::<f64>() / values.len() as f64
}

fn main() {
    env_logger::init();
    let args = Args::parse();
    let levels: Vec<u32> = if args.levels.is_empty() {
        (1..=MAX_LEVEL).collect()
    } else {
        args.levels.clone()
    };
    let config = OrchestratorConfig {
        attempts: args.attempts,
        ..OrchestratorConfig::default()
    };
    let check_budget = SearchBudget::validation().with_max_nodes(100_000);

    println!("Evaluating {} puzzles for levels {:?}...", args.puzzles, levels);

    let mut report: Vec<(u32, LevelStats)> = Vec::new();
    for &level in &levels {
        let mut stats = LevelStats::default();
        for i in 0..args.puzzles {
            let seed = args.seed + i as u64;
            let rng = SmallRng::seed_from_u64(seed);
            let mut orchestrator = LevelOrchestrator::new(
                LevelConfig::for_level(level),
                level,
                config,
                rng,
            );
            let puzzle = orchestrator.generate();
            if puzzle.fell_back {
                stats.fallbacks += 1;
            }
            stats.difficulties.push(puzzle.difficulty);

            match solve(&puzzle.state, &check_budget) {
                Some(solution) => stats.solution_lengths.push(solution.moves.len()),
                None => stats.unsolved += 1,
            }
            println!(
                "  Level {} (Seed: {:<4}): disorder {:<3} accepted {:>2}/{}",
                level, seed, puzzle.difficulty, puzzle.accepted, config.attempts
            );
        }
        report.push((level, stats));
    }

    println!("\n--- Evaluation Complete ---");
    for (level, stats) in &report {
        let lengths: Vec<u32> = stats.solution_lengths.iter().map(|&l| l as u32).collect();
        println!(
            "Level {}: avg disorder = {:.2}, avg solution length = {:.2}, fallbacks = {}, unsolved = {}",
            level,
            average(&stats.difficulties),
            average(&lengths),
            stats.fallbacks,
            stats.unsolved
        );
    }
}
