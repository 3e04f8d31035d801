//! Weighted A* search over puzzle states.
//!
//! `solve` searches for a path to a goal state under a [`SearchBudget`].
//! `find_hint` returns the first move of that path, falling back to a greedy
//! one-step choice when the budget runs out. `is_solvable` is the validator
//! used by level generation.
use crate::engine::{Move, PuzzleState, StateKey};
use crate::heuristics::{choose_greedy_move, disorder};
use log::debug;
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};
use std::time::{Duration, Instant};

/// Limits for a single search.
///
/// The time limit and the node limit are checked independently; whichever is
/// hit first stops the search.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SearchBudget {
    /// Wall-clock limit for the search. `None` means no deadline.
    pub time_limit: Option<Duration>,
    /// Maximum number of states expanded.
    pub max_nodes: usize,
    /// Weight `w` applied to the heuristic in `g + w * h`. Values below 1 are treated as 1.
    pub weight: f64,
}

impl SearchBudget {
    /// Interactive hint budget: 800 ms, 20 000 nodes, plain A* ordering.
    pub fn hint() -> Self {
        SearchBudget {
            time_limit: Some(Duration::from_millis(800)),
            max_nodes: 20_000,
            weight: 1.0,
        }
    }

    /// Solvability check used while generating levels: no deadline, greedier ordering.
    pub fn validation() -> Self {
        SearchBudget {
            time_limit: None,
            max_nodes: 20_000,
            weight: 2.0,
        }
    }

    pub fn with_time_limit(mut self, time_limit: Option<Duration>) -> Self {
        self.time_limit = time_limit;
        self
    }

    pub fn with_max_nodes(mut self, max_nodes: usize) -> Self {
        self.max_nodes = max_nodes;
        self
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }
}

impl Default for SearchBudget {
    fn default() -> Self {
        SearchBudget::hint()
    }
}

/// A path found by the solver.
#[derive(Clone, Debug)]
pub struct Solution {
    /// Moves leading from the start state to a goal state.
    pub moves: Vec<Move>,
    /// Number of states expanded while searching.
    pub nodes_expanded: usize,
}

/// Entry in the open set. Several entries may exist for the same state at
/// different costs; the stale ones are skipped when popped.
struct SearchNode {
    f_score: f64,
    g_score: u32,
    seq: u64,
    key: StateKey,
    state: PuzzleState,
    parent: Option<(StateKey, Move)>,
}

impl Ord for SearchNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering for min-heap: lower f first, then deeper nodes, then insertion order.
        other
            .f_score
            .total_cmp(&self.f_score)
            .then_with(|| self.g_score.cmp(&other.g_score))
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for SearchNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for SearchNode {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for SearchNode {}

/// A state whose cheapest known path has been expanded.
struct Expanded {
    g_score: u32,
    parent: Option<(StateKey, Move)>,
}

/// Searches for a path from `start` to a goal state.
///
/// Nodes are ordered by `g + w * disorder`, where `g` counts moves from the
/// start. The search keeps the best `g` seen per fingerprint and skips popped
/// entries for states that were already expanded at an equal or lower cost.
///
/// # Arguments
/// * `start`: The state to solve from. It is never modified.
/// * `budget`: Time, node and weight settings.
///
/// # Returns
/// * `Some(Solution)` with the move path (empty if `start` is already solved).
/// * `None` if the budget ran out or the reachable space holds no goal.
pub fn solve(start: &PuzzleState, budget: &SearchBudget) -> Option<Solution> {
    if start.is_goal() {
        return Some(Solution {
            moves: Vec::new(),
            nodes_expanded: 0,
        });
    }

    let started = Instant::now();
    let deadline = budget.time_limit.map(|limit| started + limit);
    let weight = budget.weight.max(1.0);

    let mut open = BinaryHeap::new();
    let mut best_g: HashMap<StateKey, u32> = HashMap::new();
    let mut expanded: HashMap<StateKey, Expanded> = HashMap::new();
    let mut seq: u64 = 0;
    let mut nodes = 0;

    let start_key = start.fingerprint();
    best_g.insert(start_key.clone(), 0);
    open.push(SearchNode {
        f_score: weight * disorder(start) as f64,
        g_score: 0,
        seq,
        key: start_key,
        state: start.clone(),
        parent: None,
    });

    while let Some(node) = open.pop() {
        if let Some(done) = expanded.get(&node.key) {
            if done.g_score <= node.g_score {
                continue;
            }
        }
        if nodes >= budget.max_nodes {
            debug!("Search stopped at node limit ({} nodes)", nodes);
            return None;
        }
        if deadline.map_or(false, |d| Instant::now() >= d) {
            debug!(
                "Search stopped at deadline after {:?} ({} nodes)",
                started.elapsed(),
                nodes
            );
            return None;
        }
        nodes += 1;

        expanded.insert(
            node.key.clone(),
            Expanded {
                g_score: node.g_score,
                parent: node.parent.clone(),
            },
        );

        if node.state.is_goal() {
            let moves = reconstruct_path(&expanded, &node.key);
            debug!(
                "Solution of {} moves found after {} nodes in {:?}",
                moves.len(),
                nodes,
                started.elapsed()
            );
            return Some(Solution {
                moves,
                nodes_expanded: nodes,
            });
        }

        let next_g = node.g_score + 1;
        for mv in node.state.legal_moves() {
            let next = node.state.apply(mv);
            let key = next.fingerprint();
            if best_g.get(&key).map_or(false, |&g| g <= next_g) {
                continue;
            }
            best_g.insert(key.clone(), next_g);
            seq += 1;
            open.push(SearchNode {
                f_score: next_g as f64 + weight * disorder(&next) as f64,
                g_score: next_g,
                seq,
                key,
                state: next,
                parent: Some((node.key.clone(), mv)),
            });
        }
    }

    debug!("Search space exhausted after {} nodes without a goal", nodes);
    None
}

/// Walks parent links back from `goal` and returns the moves in play order.
fn reconstruct_path(expanded: &HashMap<StateKey, Expanded>, goal: &StateKey) -> Vec<Move> {
    let mut moves = Vec::new();
    let mut cursor = goal;
    // Parent costs strictly decrease along the chain, so it ends at the start.
    while let Some((parent, mv)) = expanded.get(cursor).and_then(|e| e.parent.as_ref()) {
        moves.push(*mv);
        cursor = parent;
    }
    moves.reverse();
    moves
}

/// Suggests the next move from `state`.
///
/// Runs [`solve`] and returns the first move of the path it finds. If the
/// search runs out of budget, falls back to the legal move that lowers
/// `disorder` the most.
///
/// # Returns
/// * `Some(Move)`: a legal move from `state`.
/// * `None`: `state` is already solved, or no legal move exists.
///
/// # Examples
/// ```
/// use watersort_solver::engine::Move;
/// use watersort_solver::solver::{find_hint, SearchBudget};
/// use watersort_solver::utils::state_from_str_array;
///
/// let state = state_from_str_array(&["RRR", "R", "BBBB"]).unwrap();
/// let hint = find_hint(&state, &SearchBudget::hint()).unwrap();
/// assert!(state.apply(hint).is_goal());
/// ```
pub fn find_hint(state: &PuzzleState, budget: &SearchBudget) -> Option<Move> {
    if state.is_goal() {
        return None;
    }
    match solve(state, budget) {
        Some(solution) => solution.moves.first().copied(),
        None => {
            let fallback = choose_greedy_move(state);
            debug!("No path within budget, greedy fallback: {:?}", fallback);
            fallback.map(|(_, mv)| mv)
        }
    }
}

/// True if [`solve`] reaches a goal from `state` within `budget`.
///
/// A `false` result means "unsolvable or too hard to verify".
pub fn is_solvable(state: &PuzzleState, budget: &SearchBudget) -> bool {
    solve(state, budget).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::state_from_str_array;
    use std::collections::HashSet;

    fn replay(start: &PuzzleState, moves: &[Move]) -> PuzzleState {
        moves.iter().fold(start.clone(), |state, &mv| {
            assert!(state.is_legal_move(mv), "solution contains illegal move {}", mv);
            state.apply(mv)
        })
    }

    #[test]
    fn test_solve_already_solved() {
        let state = state_from_str_array(&["RRRR", "BBBB", ""]).unwrap();
        let solution = solve(&state, &SearchBudget::hint()).unwrap();
        assert!(solution.moves.is_empty());
        assert_eq!(solution.nodes_expanded, 0);
        assert_eq!(find_hint(&state, &SearchBudget::hint()), None);
    }

    #[test]
    fn test_solve_one_move() {
        let state = state_from_str_array(&["RRR", "R", "BBBB"]).unwrap();
        let solution = solve(&state, &SearchBudget::hint()).unwrap();
        assert_eq!(solution.moves.len(), 1);
        assert!(replay(&state, &solution.moves).is_goal());
    }

    #[test]
    fn test_solve_path_replays_to_goal() {
        let state = state_from_str_array(&["RBRB", "BRBR", "", ""]).unwrap();
        let solution = solve(&state, &SearchBudget::hint().with_time_limit(None)).unwrap();
        assert!(!solution.moves.is_empty());
        assert!(replay(&state, &solution.moves).is_goal());
    }

    #[test]
    fn test_hint_convergence() {
        // [[A,B,A,B],[B,A,B,A],[],[]]
        let mut state = state_from_str_array(&["RBRB", "BRBR", "", ""]).unwrap();
        let budget = SearchBudget::hint().with_time_limit(None);
        let mut seen = HashSet::new();
        seen.insert(state.fingerprint());

        for _ in 0..20 {
            if state.is_goal() {
                break;
            }
            let mv = find_hint(&state, &budget).expect("unsolved state must get a hint");
            assert!(state.is_legal_move(mv));
            state = state.apply(mv);
            assert!(seen.insert(state.fingerprint()), "hint revisited a state");
        }
        assert!(state.is_goal());
    }

    #[test]
    fn test_hint_is_legal_under_tiny_budget() {
        let state = state_from_str_array(&["RBGR", "GBRB", "BGRG", "", ""]).unwrap();
        let budget = SearchBudget::hint().with_max_nodes(1);
        let mv = find_hint(&state, &budget).unwrap();
        assert!(state.is_legal_move(mv));
        assert_eq!(Some(mv), choose_greedy_move(&state).map(|(_, mv)| mv));
    }

    #[test]
    fn test_zero_deadline_falls_back_to_greedy() {
        let state = state_from_str_array(&["RBRB", "BRBR", "", ""]).unwrap();
        let budget = SearchBudget::hint().with_time_limit(Some(Duration::ZERO));
        assert!(solve(&state, &budget).is_none());
        let mv = find_hint(&state, &budget).unwrap();
        assert!(state.is_legal_move(mv));
    }

    #[test]
    fn test_no_hint_without_legal_moves() {
        let state = state_from_str_array(&["RBRB", "BRBR"]).unwrap();
        assert!(solve(&state, &SearchBudget::validation()).is_none());
        assert_eq!(find_hint(&state, &SearchBudget::hint()), None);
        assert!(!is_solvable(&state, &SearchBudget::validation()));
    }

    #[test]
    fn test_weight_still_finds_valid_path() {
        let state = state_from_str_array(&["RGBR", "GBRG", "BRGB", "", ""]).unwrap();
        let budget = SearchBudget::validation().with_weight(3.0);
        let solution = solve(&state, &budget).unwrap();
        assert!(replay(&state, &solution.moves).is_goal());
        assert!(is_solvable(&state, &budget));
    }

    #[test]
    fn test_solve_leaves_input_untouched() {
        let state = state_from_str_array(&["RBRB", "BRBR", "", ""]).unwrap();
        let snapshot = state.clone();
        let _ = solve(&state, &SearchBudget::hint());
        assert_eq!(state, snapshot);
    }
}
