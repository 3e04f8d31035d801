use clap::Parser;
use rand::rngs::SmallRng;
use rand::SeedableRng;
use std::io::{self, Write};
use watersort_solver::engine::{Game, Move};
use watersort_solver::generator::MAX_LEVEL;
use watersort_solver::orchestrator::generate_level;
use watersort_solver::solver::SearchBudget;

#[derive(Parser, Debug)]
#[clap(author, version, about = "Play the tube sorting puzzle in the terminal", long_about = None)]
struct Args {
    /// Level to play (1-5; higher values use the hardest level)
    #[clap(short, long, default_value_t = 1)]
    level: u32,

    /// Seed for level generation (random if omitted)
    #[clap(short, long)]
    seed: Option<u64>,

    /// Time limit for a hint, in milliseconds
    #[clap(long, default_value_t = 800)]
    hint_ms: u64,
}

fn new_game(level: u32, seed: Option<u64>) -> Game {
    let rng = match seed {
        Some(seed) => SmallRng::seed_from_u64(seed),
        None => SmallRng::from_entropy(),
    };
    println!("Generating level {}...", level);
    Game::new(generate_level(level, rng))
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();
    let budget = SearchBudget::hint()
        .with_time_limit(Some(std::time::Duration::from_millis(args.hint_ms)));

    let mut level = args.level.max(1);
    let mut game = new_game(level, args.seed);
    println!("Welcome to Water Sort!");

    loop {
        println!("---------------------");
        println!("Level: {}, Moves: {}", level, game.moves_made());
        println!("{}", game.current().to_string_colored());

        if game.is_solved() {
            println!();
            println!("---------------------");
            println!("🎉 LEVEL {} SOLVED in {} moves! 🎉", level, game.moves_made());
            println!("---------------------");
            if level >= MAX_LEVEL {
                break;
            }
            level += 1;
            game = new_game(level, args.seed.map(|s| s + level as u64));
            continue;
        }

        print!("Enter a pour (src dst), 'h' hint, 'u' undo, 'r' restart, 'q' quit: ");
        io::stdout().flush()?;

        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            break;
        }

        match input.trim() {
            "q" => {
                println!("Thanks for playing!");
                break;
            }
            "u" => {
                if game.undo_last_move() {
                    println!("Move undone.");
                } else {
                    println!("Nothing to undo.");
                }
            }
            "r" => {
                game.restart();
                println!("Level restarted.");
            }
            "h" => match game.hint(&budget) {
                Some(mv) => println!("Hint: pour {}", mv),
                None => println!("No hint available."),
            },
            other => {
                let parts: Vec<&str> = other.split_whitespace().collect();
                let parsed = match parts.as_slice() {
                    [src, dst] => src.parse::<usize>().ok().zip(dst.parse::<usize>().ok()),
                    _ => None,
                };
                match parsed {
                    Some((src, dst)) => match game.process_move(Move::new(src, dst)) {
                        Ok(()) => println!("Poured {} -> {}.", src, dst),
                        Err(e) => println!("Invalid move: {}.", e),
                    },
                    None => println!("Invalid input. Use 'src dst', 'h', 'u', 'r' or 'q'."),
                }
            }
        }
    }
    Ok(())
}
