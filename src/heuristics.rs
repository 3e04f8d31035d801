//! Scoring functions shared by the solver, the scrambler and the level orchestrator.
//!
//! - `disorder`: how far a state looks from solved. Lower is better. Guides the
//!   A* search and ranks generated puzzles by difficulty.
//! - `chaos_score`: how much a scramble pour mixes colors. Only used while scrambling.
//! - `neat_tube_count`: finished tubes, used to reject puzzles that are too easy.
//! - `choose_greedy_move`: one-step lookahead, the hint fallback when search runs out of budget.
use crate::engine::{Move, PuzzleState, Tube};

/// Penalty for every adjacent pair of differently colored units in a tube.
pub const SEAM_PENALTY: u32 = 1;

/// Penalty for every unused slot in a non-empty tube.
pub const UNFILLED_PENALTY: u32 = 1;

/// Chaos score for pouring onto a differently colored top.
pub const CHAOS_MIXING: u32 = 10;

/// Chaos score for pouring into an empty tube on the easier levels.
pub const CHAOS_EMPTY_EASY: u32 = 5;

/// Chaos score for pouring into an empty tube from [`HARD_TIER_LEVEL`] on.
pub const CHAOS_EMPTY_HARD: u32 = 1;

/// First level at which filling empty tubes stops being favoured while scrambling.
pub const HARD_TIER_LEVEL: u32 = 3;

/// Disorder contributed by a single tube.
///
/// Empty tubes contribute nothing. A full monochrome tube also scores zero.
pub fn tube_disorder(tube: &Tube) -> u32 {
    if tube.is_empty() {
        return 0;
    }
    let seams = tube
        .units()
        .windows(2)
        .filter(|pair| pair[0] != pair[1])
        .count() as u32;
    let unfilled = tube.room() as u32;
    seams * SEAM_PENALTY + unfilled * UNFILLED_PENALTY
}

/// Calculates the disorder score of a state.
///
/// The score sums, over all tubes, a penalty for each color seam inside the
/// tube and a penalty for each unused slot of a non-empty tube. It is zero
/// exactly for goal states. It is not an admissible distance estimate.
///
/// # Examples
/// ```
/// use watersort_solver::heuristics::disorder;
/// use watersort_solver::utils::state_from_str_array;
///
/// let solved = state_from_str_array(&["RRRR", "BBBB", ""]).unwrap();
/// assert_eq!(disorder(&solved), 0);
///
/// // Seams in the first two tubes, free slots in the last two.
/// let mixed = state_from_str_array(&["RBRB", "BRB", "R"]).unwrap();
/// assert!(disorder(&mixed) > 0);
/// ```
pub fn disorder(state: &PuzzleState) -> u32 {
    state.tubes().iter().map(tube_disorder).sum()
}

/// Scores how much pouring from `src` onto `dst` mixes colors.
///
/// A pour onto a different color scores highest. A pour into an empty tube
/// scores [`CHAOS_EMPTY_EASY`] below [`HARD_TIER_LEVEL`] and
/// [`CHAOS_EMPTY_HARD`] from there on. A pour onto the same color, or from an
/// empty source, scores zero.
pub fn chaos_score(src: &Tube, dst: &Tube, level: u32) -> u32 {
    let moving = match src.top() {
        Some(color) => color,
        None => return 0,
    };
    match dst.top() {
        None if level < HARD_TIER_LEVEL => CHAOS_EMPTY_EASY,
        None => CHAOS_EMPTY_HARD,
        Some(top) if top != moving => CHAOS_MIXING,
        Some(_) => 0,
    }
}

/// Counts tubes that are full and monochrome.
pub fn neat_tube_count(state: &PuzzleState) -> usize {
    state.tubes().iter().filter(|tube| tube.is_complete()).count()
}

/// Chooses the legal move whose resulting state has the lowest disorder.
///
/// Ties go to the first such move in `legal_moves` order.
///
/// # Returns
/// An `Option` containing a tuple:
///   - `u32`: The disorder of the state after the chosen move.
///   - `Move`: The chosen move.
/// Returns `None` if no legal move exists.
pub fn choose_greedy_move(state: &PuzzleState) -> Option<(u32, Move)> {
    let mut best: Option<(u32, Move)> = None;
    for mv in state.legal_moves() {
        let score = disorder(&state.apply(mv));
        if best.map_or(true, |(best_score, _)| score < best_score) {
            best = Some((score, mv));
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Color;
    use crate::utils::state_from_str_array;

    #[test]
    fn test_disorder_calculation() {
        // Tube 0: three seams. Tube 1: two seams, one free slot. Tube 2: three free slots.
        let state = state_from_str_array(&["RBRB", "BRB", "R", ""]).unwrap();
        let expected = 3 * SEAM_PENALTY + (SEAM_PENALTY * 2 + UNFILLED_PENALTY) + 3 * UNFILLED_PENALTY;
        assert_eq!(disorder(&state), expected);
    }

    #[test]
    fn test_disorder_zero_only_for_goal() {
        let goal = state_from_str_array(&["RRRR", "BBBB", "", ""]).unwrap();
        assert_eq!(disorder(&goal), 0);
        let unfinished = state_from_str_array(&["RRRR", "BBB", "B", ""]).unwrap();
        assert!(disorder(&unfinished) > 0);
        assert!(!unfinished.is_goal());
    }

    #[test]
    fn test_chaos_score_cases() {
        let red = Tube::from_units(vec![Color::Red]).unwrap();
        let blue = Tube::from_units(vec![Color::Blue]).unwrap();
        let empty = Tube::new();

        assert_eq!(chaos_score(&red, &blue, 1), CHAOS_MIXING);
        assert_eq!(chaos_score(&red, &red, 1), 0);
        assert_eq!(chaos_score(&red, &empty, 1), CHAOS_EMPTY_EASY);
        assert_eq!(chaos_score(&red, &empty, HARD_TIER_LEVEL), CHAOS_EMPTY_HARD);
        assert_eq!(chaos_score(&empty, &red, 1), 0);
        assert!(CHAOS_MIXING > CHAOS_EMPTY_EASY);
    }

    #[test]
    fn test_neat_tube_count() {
        let state = state_from_str_array(&["RRRR", "BBBB", "GGG", "G", ""]).unwrap();
        assert_eq!(neat_tube_count(&state), 2);
    }

    #[test]
    fn test_choose_greedy_move() {
        // Either way of joining the reds finishes the puzzle; the first one found wins.
        let state = state_from_str_array(&["RRR", "BBBB", "R", ""]).unwrap();
        let (score, mv) = choose_greedy_move(&state).unwrap();
        assert_eq!(mv, Move::new(0, 2));
        assert_eq!(score, 0);
        assert!(state.apply(mv).is_goal());

        // Stacking the blues in tube 0 leaves one seam; stacking them in tube 1 leaves more free slots.
        let state = state_from_str_array(&["RRB", "B", "R"]).unwrap();
        let (score, mv) = choose_greedy_move(&state).unwrap();
        assert_eq!(mv, Move::new(1, 0));
        assert_eq!(score, SEAM_PENALTY + 3 * UNFILLED_PENALTY);
    }

    #[test]
    fn test_choose_greedy_move_none_when_stuck() {
        let state = state_from_str_array(&["RBRB", "BRBR"]).unwrap();
        assert!(choose_greedy_move(&state).is_none());
    }
}
