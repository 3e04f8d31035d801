//! Level orchestration: generate several candidates, validate them, keep the hardest.
use crate::engine::PuzzleState;
use crate::generator::{Generator, LevelConfig};
use crate::heuristics::{disorder, neat_tube_count};
use crate::solver::{is_solvable, SearchBudget};
use log::{debug, info, warn};
use rand::Rng;

/// Settings for [`LevelOrchestrator`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OrchestratorConfig {
    /// Number of candidates generated per request.
    pub attempts: usize,
    /// Above level 1, candidates with at least this many finished tubes are rejected.
    pub neat_tube_limit: usize,
    /// Budget for the solvability check of each candidate.
    pub validation: SearchBudget,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        OrchestratorConfig {
            attempts: 15,
            neat_tube_limit: 3,
            validation: SearchBudget::validation(),
        }
    }
}

/// Outcome of one orchestration run.
#[derive(Clone, Debug)]
pub struct GeneratedPuzzle {
    pub state: PuzzleState,
    /// `disorder` of `state`; higher means harder.
    pub difficulty: u32,
    /// Candidates that passed both checks.
    pub accepted: usize,
    /// True if no candidate passed and `state` is a plain goal state.
    pub fell_back: bool,
}

/// Drives a [`Generator`] and filters its output.
pub struct LevelOrchestrator<R: Rng> {
    generator: Generator<R>,
    config: OrchestratorConfig,
}

impl<R: Rng> LevelOrchestrator<R> {
    /// Orchestrator for a level of the built-in table with default settings.
    pub fn for_level(level: u32, rng: R) -> Self {
        LevelOrchestrator {
            generator: Generator::for_level(level, rng),
            config: OrchestratorConfig::default(),
        }
    }

    pub fn new(level_config: LevelConfig, level: u32, config: OrchestratorConfig, rng: R) -> Self {
        LevelOrchestrator {
            generator: Generator::new(level_config, level, rng),
            config,
        }
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Generates a puzzle.
    ///
    /// Each attempt produces a candidate which is dropped if it is too neat
    /// (above level 1) or fails the solvability check. Among the rest the one
    /// with the highest `disorder` wins; the earliest wins ties. If nothing
    /// survives, a fresh goal state is returned instead, so this never fails.
    pub fn generate(&mut self) -> GeneratedPuzzle {
        let level = self.generator.level();
        let mut best: Option<(u32, PuzzleState)> = None;
        let mut accepted = 0;

        for attempt in 0..self.config.attempts {
            let candidate = self.generator.generate();

            let neat = neat_tube_count(&candidate);
            if level > 1 && neat >= self.config.neat_tube_limit {
                debug!("Attempt {}: rejected, {} finished tubes", attempt, neat);
                continue;
            }
            if !is_solvable(&candidate, &self.config.validation) {
                debug!("Attempt {}: rejected, not verified solvable", attempt);
                continue;
            }

            accepted += 1;
            let score = disorder(&candidate);
            debug!("Attempt {}: accepted with disorder {}", attempt, score);
            if best.as_ref().map_or(true, |(best_score, _)| score > *best_score) {
                best = Some((score, candidate));
            }
        }

        match best {
            Some((difficulty, state)) => {
                info!(
                    "Level {}: picked disorder {} from {} accepted of {} attempts",
                    level, difficulty, accepted, self.config.attempts
                );
                GeneratedPuzzle {
                    state,
                    difficulty,
                    accepted,
                    fell_back: false,
                }
            }
            None => {
                warn!(
                    "Level {}: no candidate survived {} attempts, using the goal state",
                    level, self.config.attempts
                );
                GeneratedPuzzle {
                    state: self.generator.create_goal_state(),
                    difficulty: 0,
                    accepted: 0,
                    fell_back: true,
                }
            }
        }
    }
}

/// Generates a validated puzzle for `level_config` with default orchestration settings.
///
/// `level` selects the level-dependent scramble and rejection rules.
pub fn generate_puzzle<R: Rng>(level_config: LevelConfig, level: u32, rng: R) -> PuzzleState {
    LevelOrchestrator::new(level_config, level, OrchestratorConfig::default(), rng)
        .generate()
        .state
}

/// Generates a validated puzzle for a level of the built-in table.
///
/// # Examples
/// ```
/// use rand::rngs::SmallRng;
/// use rand::SeedableRng;
/// use watersort_solver::orchestrator::generate_level;
///
/// let puzzle = generate_level(1, SmallRng::seed_from_u64(1));
/// assert_eq!(puzzle.tube_count(), 4);
/// ```
pub fn generate_level<R: Rng>(level: u32, rng: R) -> PuzzleState {
    LevelOrchestrator::for_level(level, rng).generate().state
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::CAPACITY;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    #[test]
    fn test_generate_level_one() {
        for seed in 0..3 {
            let mut orchestrator = LevelOrchestrator::for_level(1, SmallRng::seed_from_u64(seed));
            let puzzle = orchestrator.generate();
            assert!(!puzzle.fell_back);
            assert!(puzzle.accepted > 0);
            assert!(!puzzle.state.is_goal());
            assert_eq!(puzzle.difficulty, disorder(&puzzle.state));
            assert!(is_solvable(&puzzle.state, &SearchBudget::validation()));
            assert!(puzzle.state.color_counts().values().all(|&n| n == CAPACITY));
        }
    }

    #[test]
    fn test_zero_attempts_falls_back_to_goal() {
        let config = OrchestratorConfig {
            attempts: 0,
            ..OrchestratorConfig::default()
        };
        let mut orchestrator =
            LevelOrchestrator::new(LevelConfig::for_level(3), 3, config, SmallRng::seed_from_u64(5));
        let puzzle = orchestrator.generate();
        assert!(puzzle.fell_back);
        assert_eq!(puzzle.accepted, 0);
        assert_eq!(puzzle.difficulty, 0);
        assert!(puzzle.state.is_goal());
        assert_eq!(puzzle.state.tube_count(), LevelConfig::for_level(3).tube_count());
    }

    #[test]
    fn test_unverifiable_candidates_fall_back_to_goal() {
        // A validator that cannot expand any node rejects every scrambled candidate.
        let config = OrchestratorConfig {
            attempts: 4,
            validation: SearchBudget::validation().with_max_nodes(0),
            ..OrchestratorConfig::default()
        };
        let mut orchestrator =
            LevelOrchestrator::new(LevelConfig::for_level(2), 2, config, SmallRng::seed_from_u64(9));
        let puzzle = orchestrator.generate();
        assert!(puzzle.state.is_goal());
        assert!(puzzle.fell_back);
    }

    #[test]
    fn test_generate_puzzle_custom_config() {
        let level_config = LevelConfig::new(3, 2, 12).unwrap();
        let state = generate_puzzle(level_config, 1, SmallRng::seed_from_u64(21));
        assert_eq!(state.tube_count(), 5);
        assert_eq!(state.color_counts().len(), 3);
    }
}
