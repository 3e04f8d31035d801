//! Scrambling generator.
//!
//! A puzzle is built by starting from a solved goal state and walking
//! backwards with "scramble pours". Each scramble pour is only taken if the
//! ordinary forward pour in the opposite direction is legal and restores the
//! previous state exactly, so every generated puzzle can be solved by
//! replaying the walk in reverse.
use crate::engine::{InvalidMove, Move, PuzzleState, Tube, PALETTE};
use crate::heuristics::chaos_score;
use log::debug;
use rand::seq::SliceRandom;
use rand::Rng;
use thiserror::Error;

/// Extra scramble steps taken on top of a level's target depth.
pub const SAFETY_MARGIN: usize = 10;

/// Hard cap on the number of scramble steps, whatever the configuration says.
pub const MAX_WALK_STEPS: usize = 5000;

/// Highest level with its own entry in the level table.
pub const MAX_LEVEL: u32 = 5;

/// Parameters of one difficulty tier.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LevelConfig {
    /// Number of distinct colors, i.e. full tubes in the goal state.
    pub color_count: usize,
    /// Number of extra empty tubes.
    pub empty_tube_count: usize,
    /// Number of scramble steps attempted (before [`SAFETY_MARGIN`]).
    pub target_depth: usize,
}

const LEVEL_TABLE: [LevelConfig; MAX_LEVEL as usize] = [
    LevelConfig { color_count: 3, empty_tube_count: 1, target_depth: 12 },
    LevelConfig { color_count: 4, empty_tube_count: 1, target_depth: 25 },
    LevelConfig { color_count: 5, empty_tube_count: 2, target_depth: 40 },
    LevelConfig { color_count: 6, empty_tube_count: 1, target_depth: 55 },
    LevelConfig { color_count: 7, empty_tube_count: 2, target_depth: 70 },
];

/// Rejected level parameters.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    #[error("a level needs at least one color")]
    NoColors,

    #[error("{requested} colors requested but the palette only has {available}")]
    TooManyColors { requested: usize, available: usize },
}

impl LevelConfig {
    /// Creates a custom configuration, checking the color count against the palette.
    pub fn new(
        color_count: usize,
        empty_tube_count: usize,
        target_depth: usize,
    ) -> Result<Self, ConfigError> {
        if color_count == 0 {
            return Err(ConfigError::NoColors);
        }
        if color_count > PALETTE.len() {
            return Err(ConfigError::TooManyColors {
                requested: color_count,
                available: PALETTE.len(),
            });
        }
        Ok(LevelConfig {
            color_count,
            empty_tube_count,
            target_depth,
        })
    }

    /// Looks up the built-in table. Levels outside `1..=MAX_LEVEL` get the hardest tier.
    ///
    /// # Examples
    /// ```
    /// use watersort_solver::generator::{LevelConfig, MAX_LEVEL};
    /// assert_eq!(LevelConfig::for_level(1).color_count, 3);
    /// assert_eq!(LevelConfig::for_level(42), LevelConfig::for_level(MAX_LEVEL));
    /// ```
    pub fn for_level(level: u32) -> Self {
        match level {
            1..=MAX_LEVEL => LEVEL_TABLE[(level - 1) as usize],
            _ => LEVEL_TABLE[LEVEL_TABLE.len() - 1],
        }
    }

    pub fn tube_count(&self) -> usize {
        self.color_count + self.empty_tube_count
    }

    /// Total number of scramble steps the walk may take.
    pub fn walk_length(&self) -> usize {
        (self.target_depth + SAFETY_MARGIN).min(MAX_WALK_STEPS)
    }
}

/// Builds a solved state: one full tube per color, then the empty tubes.
///
/// Colors are the first `color_count` palette entries, shuffled so that a
/// tube's position says nothing about its color.
pub fn create_goal_state<R: Rng + ?Sized>(
    color_count: usize,
    empty_tube_count: usize,
    rng: &mut R,
) -> PuzzleState {
    let mut colors: Vec<_> = PALETTE.iter().copied().take(color_count).collect();
    colors.shuffle(rng);

    let mut tubes: Vec<Tube> = colors.into_iter().map(Tube::full).collect();
    tubes.extend((0..empty_tube_count).map(|_| Tube::new()));
    PuzzleState::new(tubes)
}

/// One step of a scramble walk.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScrambleStep {
    pub mv: Move,
    /// Units moved from `mv.src` to `mv.dst`.
    pub units: usize,
}

/// Result of a scramble walk, with enough information to undo it.
#[derive(Clone, Debug)]
pub struct Scramble {
    pub goal: PuzzleState,
    pub state: PuzzleState,
    pub steps: Vec<ScrambleStep>,
}

impl Scramble {
    /// Replays the inverse of every step, last first, using ordinary pours.
    ///
    /// # Returns
    /// The state reached, which equals `goal` for any walk produced by [`Generator`].
    pub fn unwind(&self) -> Result<PuzzleState, InvalidMove> {
        self.steps
            .iter()
            .rev()
            .try_fold(self.state.clone(), |state, step| state.try_apply(step.mv.inverse()))
    }
}

/// A possible scramble step together with its chaos score.
#[derive(Clone, Copy, Debug)]
struct Candidate {
    step: ScrambleStep,
    score: u32,
}

/// Generates scrambled puzzles for one level.
///
/// The random source is injected so runs can be reproduced from a seed.
pub struct Generator<R: Rng> {
    config: LevelConfig,
    level: u32,
    rng: R,
}

impl<R: Rng> Generator<R> {
    pub fn new(config: LevelConfig, level: u32, rng: R) -> Self {
        Generator { config, level, rng }
    }

    /// Generator for a level of the built-in table.
    pub fn for_level(level: u32, rng: R) -> Self {
        Generator::new(LevelConfig::for_level(level), level, rng)
    }

    pub fn config(&self) -> &LevelConfig {
        &self.config
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    /// Builds a fresh goal state for this level.
    pub fn create_goal_state(&mut self) -> PuzzleState {
        create_goal_state(
            self.config.color_count,
            self.config.empty_tube_count,
            &mut self.rng,
        )
    }

    /// Produces a scrambled start state.
    pub fn generate(&mut self) -> PuzzleState {
        self.scramble().state
    }

    /// Runs a full scramble walk from a fresh goal state.
    ///
    /// At each step the candidates are all reversible scramble pours except
    /// the one undoing the previous step. Mixing pours are preferred (see
    /// [`chaos_score`]); if none scores above zero, every candidate is treated
    /// equally. Candidates are shuffled before a stable sort by score, so
    /// ties are broken at random. The walk stops early if no candidate exists.
    pub fn scramble(&mut self) -> Scramble {
        let goal = self.create_goal_state();
        let mut state = goal.clone();
        let mut steps: Vec<ScrambleStep> = Vec::new();
        let walk_length = self.config.walk_length();

        while steps.len() < walk_length {
            let last = steps.last().map(|step| step.mv);
            let mut candidates = self.candidates(&state, last);
            if candidates.is_empty() {
                debug!("Scramble stuck after {} steps", steps.len());
                break;
            }

            if candidates.iter().all(|c| c.score == 0) {
                for candidate in candidates.iter_mut() {
                    candidate.score = 1;
                }
            } else {
                candidates.retain(|c| c.score > 0);
            }

            candidates.shuffle(&mut self.rng);
            candidates.sort_by(|a, b| b.score.cmp(&a.score));
            let chosen = candidates[0].step;

            state.transfer(chosen.mv, chosen.units);
            steps.push(chosen);
        }

        debug!(
            "Level {} scramble: {} of {} steps",
            self.level,
            steps.len(),
            walk_length
        );
        Scramble { goal, state, steps }
    }

    /// Lists every reversible scramble pour from `state`, skipping the inverse of `last`.
    ///
    /// For each (source, destination) pair one unit count is drawn at random
    /// among the counts that keep the pour reversible.
    fn candidates(&mut self, state: &PuzzleState, last: Option<Move>) -> Vec<Candidate> {
        let taboo = last.map(|mv| mv.inverse());
        let n = state.tube_count();
        let mut candidates = Vec::new();

        for src in 0..n {
            let src_tube = &state.tubes()[src];
            if src_tube.is_empty() {
                continue;
            }
            for dst in 0..n {
                let mv = Move::new(src, dst);
                if src == dst || Some(mv) == taboo {
                    continue;
                }
                let dst_tube = &state.tubes()[dst];
                let max_units = src_tube.top_run().min(dst_tube.room());
                let amounts: Vec<usize> = (1..=max_units)
                    .filter(|&units| is_reversible(state, mv, units))
                    .collect();
                if let Some(&units) = amounts.choose(&mut self.rng) {
                    candidates.push(Candidate {
                        step: ScrambleStep { mv, units },
                        score: chaos_score(src_tube, dst_tube, self.level),
                    });
                }
            }
        }
        candidates
    }
}

/// True if moving `units` units along `mv` can be undone by the forward pour `mv.inverse()`.
fn is_reversible(state: &PuzzleState, mv: Move, units: usize) -> bool {
    let mut next = state.clone();
    next.transfer(mv, units);
    let back = mv.inverse();
    next.is_legal_move(back) && next.apply(back) == *state
}
