//! Core state model for the tube-sorting puzzle.
//!
//! This module defines the puzzle's fundamental components:
//! - `Color`: The palette of unit colors.
//! - `Tube`: A fixed-capacity stack of colored units, bottom to top.
//! - `PuzzleState`: An ordered row of tubes, plus the pour rule (`apply`),
//!   the legality check and the goal test.
//! - `Move`: A (source, destination) pour.
//! - `Game`: A play session holding the initial snapshot, the current state
//!   and an undo history.
use crate::solver::{self, SearchBudget};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Number of units a single tube can hold.
pub const CAPACITY: usize = 4;

/// Represents the color of a single unit inside a tube.
///
/// Colors carry no structure beyond equality; the ordering derive only exists
/// so colors can key sorted maps.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Color {
    Red,
    Blue,
    Green,
    Yellow,
    Purple,
    Orange,
    Cyan,
    Pink,
    Gray,
}

/// Every color a puzzle can use, in the order levels draw them.
pub const PALETTE: [Color; 9] = [
    Color::Red,
    Color::Blue,
    Color::Green,
    Color::Yellow,
    Color::Purple,
    Color::Orange,
    Color::Cyan,
    Color::Pink,
    Color::Gray,
];

impl Color {
    /// Converts the color to its character representation.
    ///
    /// This is the character used by the text state format in `utils`.
    ///
    /// # Examples
    ///
    /// ```
    /// use watersort_solver::engine::Color;
    /// assert_eq!(Color::Red.to_char(), 'R');
    /// assert_eq!(Color::Pink.to_char(), 'K');
    /// ```
    pub fn to_char(&self) -> char {
        match self {
            Color::Red => 'R',
            Color::Blue => 'B',
            Color::Green => 'G',
            Color::Yellow => 'Y',
            Color::Purple => 'P',
            Color::Orange => 'O',
            Color::Cyan => 'C',
            Color::Pink => 'K',
            Color::Gray => 'A',
        }
    }

    /// Inverse of [`Color::to_char`]. Returns `None` for characters outside the palette.
    pub fn from_char(c: char) -> Option<Color> {
        PALETTE.iter().copied().find(|color| color.to_char() == c)
    }

    /// Returns the ANSI background color code string for terminal output.
    fn to_ansi_color_code(&self) -> &'static str {
        match self {
            Color::Red => "41",
            Color::Green => "42",
            Color::Yellow => "43",
            Color::Blue => "44",
            Color::Purple => "45",
            Color::Cyan => "46",
            Color::Orange => "48;5;208",
            Color::Pink => "48;5;205",
            Color::Gray => "100",
        }
    }

    fn code(&self) -> u8 {
        *self as u8
    }
}

/// A stack of colored units, ordered bottom to top, holding at most [`CAPACITY`] units.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Tube {
    units: Vec<Color>,
}

impl Tube {
    /// Creates an empty tube.
    pub fn new() -> Self {
        Tube {
            units: Vec::with_capacity(CAPACITY),
        }
    }

    /// Creates a full, single-colored tube.
    pub fn full(color: Color) -> Self {
        Tube {
            units: vec![color; CAPACITY],
        }
    }

    /// Creates a tube from its units, bottom first.
    ///
    /// # Returns
    /// `None` if more than [`CAPACITY`] units are given.
    pub fn from_units(units: Vec<Color>) -> Option<Self> {
        if units.len() > CAPACITY {
            return None;
        }
        Some(Tube { units })
    }

    /// The units of this tube, bottom first.
    pub fn units(&self) -> &[Color] {
        &self.units
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.units.len() >= CAPACITY
    }

    /// Number of additional units the tube can accept.
    pub fn room(&self) -> usize {
        CAPACITY.saturating_sub(self.units.len())
    }

    /// The color of the top unit, or `None` for an empty tube.
    pub fn top(&self) -> Option<Color> {
        self.units.last().copied()
    }

    /// Length of the maximal contiguous run of the top color, scanning downwards.
    ///
    /// # Examples
    /// ```
    /// use watersort_solver::engine::{Color, Tube};
    /// let tube = Tube::from_units(vec![Color::Red, Color::Blue, Color::Blue]).unwrap();
    /// assert_eq!(tube.top_run(), 2);
    /// assert_eq!(Tube::new().top_run(), 0);
    /// ```
    pub fn top_run(&self) -> usize {
        match self.top() {
            Some(top) => self.units.iter().rev().take_while(|&&c| c == top).count(),
            None => 0,
        }
    }

    /// True if every unit in the tube has the same color. Empty tubes count as monochrome.
    pub fn is_monochrome(&self) -> bool {
        self.units.windows(2).all(|pair| pair[0] == pair[1])
    }

    /// True if the tube is full and monochrome, i.e. finished.
    pub fn is_complete(&self) -> bool {
        self.is_full() && self.is_monochrome()
    }

    fn push(&mut self, color: Color) {
        self.units.push(color);
    }

    fn pop(&mut self) -> Option<Color> {
        self.units.pop()
    }
}

/// A single pour from tube `src` onto tube `dst`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Move {
    pub src: usize,
    pub dst: usize,
}

impl Move {
    pub fn new(src: usize, dst: usize) -> Self {
        Move { src, dst }
    }

    /// The pour in the opposite direction.
    pub fn inverse(&self) -> Move {
        Move {
            src: self.dst,
            dst: self.src,
        }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.src, self.dst)
    }
}

/// Why a pour was rejected.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidMove {
    #[error("cannot pour tube {0} into itself")]
    SameTube(usize),

    #[error("tube {index} does not exist (puzzle has {tube_count} tubes)")]
    OutOfBounds { index: usize, tube_count: usize },

    #[error("tube {0} is empty")]
    EmptySource(usize),

    #[error("tube {0} is full")]
    DestinationFull(usize),

    #[error("cannot pour {moving:?} onto {top:?}")]
    ColorMismatch { moving: Color, top: Color },
}

/// Canonical hash key of a [`PuzzleState`].
///
/// Two keys are equal exactly when the ordered tube sequences (with their
/// ordered contents) are equal. Each tube is encoded as its length followed by
/// its color codes, so the encoding is unambiguous.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct StateKey(Box<[u8]>);

/// The full puzzle: an ordered row of tubes.
///
/// Tube order matters for hashing and move indexing, so two states that only
/// differ by a permutation of tubes are different states.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct PuzzleState {
    tubes: Vec<Tube>,
}

impl PuzzleState {
    pub fn new(tubes: Vec<Tube>) -> Self {
        PuzzleState { tubes }
    }

    pub fn tubes(&self) -> &[Tube] {
        &self.tubes
    }

    pub fn tube(&self, index: usize) -> Option<&Tube> {
        self.tubes.get(index)
    }

    pub fn tube_count(&self) -> usize {
        self.tubes.len()
    }

    /// Checks a pour against the game rule.
    ///
    /// A pour is legal when both indices exist and differ, the source is not
    /// empty, the destination has room, and the destination is either empty or
    /// topped with the source's top color.
    ///
    /// # Returns
    /// `Ok(())` for a legal move, otherwise the first rule that is broken.
    pub fn check_move(&self, mv: Move) -> Result<(), InvalidMove> {
        let tube_count = self.tubes.len();
        for index in [mv.src, mv.dst] {
            if index >= tube_count {
                return Err(InvalidMove::OutOfBounds { index, tube_count });
            }
        }
        if mv.src == mv.dst {
            return Err(InvalidMove::SameTube(mv.src));
        }

        let src = &self.tubes[mv.src];
        let dst = &self.tubes[mv.dst];
        let moving = src.top().ok_or(InvalidMove::EmptySource(mv.src))?;
        if dst.is_full() {
            return Err(InvalidMove::DestinationFull(mv.dst));
        }
        match dst.top() {
            Some(top) if top != moving => Err(InvalidMove::ColorMismatch { moving, top }),
            _ => Ok(()),
        }
    }

    /// True iff `mv` follows the pour rule. See [`PuzzleState::check_move`].
    pub fn is_legal_move(&self, mv: Move) -> bool {
        self.check_move(mv).is_ok()
    }

    /// Every legal move from this state, ordered by source then destination.
    pub fn legal_moves(&self) -> Vec<Move> {
        let n = self.tubes.len();
        let mut moves = Vec::new();
        for src in 0..n {
            for dst in 0..n {
                let mv = Move::new(src, dst);
                if self.is_legal_move(mv) {
                    moves.push(mv);
                }
            }
        }
        moves
    }

    /// Number of units a legal pour would transfer: the source's top run,
    /// limited by the room left in the destination.
    pub fn pour_amount(&self, mv: Move) -> usize {
        self.tubes[mv.src]
            .top_run()
            .min(self.tubes[mv.dst].room())
    }

    /// Applies a pour and returns the resulting state. `self` is left untouched.
    ///
    /// The maximal same-color run on top of the source moves onto the
    /// destination, limited by the destination's remaining room.
    ///
    /// The move must be legal; check it with [`PuzzleState::is_legal_move`] first
    /// or use [`PuzzleState::try_apply`].
    ///
    /// # Examples
    /// ```
    /// use watersort_solver::engine::Move;
    /// use watersort_solver::utils::state_from_str_array;
    ///
    /// let state = state_from_str_array(&["RRB", ""]).unwrap();
    /// let next = state.apply(Move::new(0, 1));
    /// assert_eq!(next.tube(0).unwrap().len(), 2);
    /// assert_eq!(next.tube(1).unwrap().len(), 1);
    /// ```
    pub fn apply(&self, mv: Move) -> PuzzleState {
        debug_assert!(self.is_legal_move(mv), "illegal pour {}", mv);
        let amount = self.pour_amount(mv);
        let mut next = self.clone();
        next.transfer(mv, amount);
        next
    }

    /// Checked variant of [`PuzzleState::apply`].
    pub fn try_apply(&self, mv: Move) -> Result<PuzzleState, InvalidMove> {
        self.check_move(mv)?;
        Ok(self.apply(mv))
    }

    /// Moves `amount` units from the top of `mv.src` to the top of `mv.dst`
    /// one at a time, ignoring the pour rule. Used by the scrambler, which
    /// checks reversibility itself.
    pub(crate) fn transfer(&mut self, mv: Move, amount: usize) {
        for _ in 0..amount {
            match self.tubes[mv.src].pop() {
                Some(color) => self.tubes[mv.dst].push(color),
                None => break,
            }
        }
    }

    /// True iff every non-empty tube is full and monochrome. Empty tubes are ignored.
    pub fn is_goal(&self) -> bool {
        self.tubes
            .iter()
            .filter(|tube| !tube.is_empty())
            .all(Tube::is_complete)
    }

    /// Canonical value key for deduplicating states in searches.
    pub fn fingerprint(&self) -> StateKey {
        let mut bytes = Vec::with_capacity(self.tubes.len() * (CAPACITY + 1));
        for tube in &self.tubes {
            bytes.push(tube.len() as u8);
            bytes.extend(tube.units.iter().map(Color::code));
        }
        StateKey(bytes.into_boxed_slice())
    }

    /// Total number of units of each color across all tubes.
    pub fn color_counts(&self) -> BTreeMap<Color, usize> {
        let mut counts = BTreeMap::new();
        for color in self.tubes.iter().flat_map(|tube| tube.units.iter()) {
            *counts.entry(*color).or_insert(0) += 1;
        }
        counts
    }

    /// Renders the state with ANSI background colors, one tube per line.
    pub fn to_string_colored(&self) -> String {
        let mut output = String::new();
        for (idx, tube) in self.tubes.iter().enumerate() {
            output.push_str(&format!("{:>2} |", idx));
            for slot in 0..CAPACITY {
                match tube.units.get(slot) {
                    Some(color) => output.push_str(&format!(
                        "\x1b[{}m  \x1b[m",
                        color.to_ansi_color_code()
                    )),
                    None => output.push_str("  "),
                }
            }
            output.push('|');
            if idx + 1 < self.tubes.len() {
                output.push('\n');
            }
        }
        output
    }
}

impl fmt::Display for PuzzleState {
    /// One tube per line, bottom unit first, empty slots shown as `.`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, tube) in self.tubes.iter().enumerate() {
            write!(f, "{:>2} |", idx)?;
            for slot in 0..CAPACITY {
                let ch = tube.units.get(slot).map_or('.', Color::to_char);
                write!(f, "{}", ch)?;
            }
            write!(f, "|")?;
            if idx + 1 < self.tubes.len() {
                writeln!(f)?;
            }
        }
        Ok(())
    }
}

/// Applies `mv` to `state`, rejecting illegal pours. Never mutates `state`.
pub fn apply_move(state: &PuzzleState, mv: Move) -> Result<PuzzleState, InvalidMove> {
    state.try_apply(mv)
}

/// Goal test. See [`PuzzleState::is_goal`].
pub fn is_goal(state: &PuzzleState) -> bool {
    state.is_goal()
}

/// A play session.
///
/// Holds the initial snapshot (for restarts), the current state and the
/// states visited so far (for undo). The engine functions themselves stay
/// pure; all mutation happens here.
#[derive(Clone, Debug)]
pub struct Game {
    initial: PuzzleState,
    current: PuzzleState,
    history: Vec<(PuzzleState, Move)>,
}

impl Game {
    pub fn new(initial: PuzzleState) -> Self {
        Game {
            current: initial.clone(),
            initial,
            history: Vec::new(),
        }
    }

    pub fn initial(&self) -> &PuzzleState {
        &self.initial
    }

    pub fn current(&self) -> &PuzzleState {
        &self.current
    }

    /// Number of moves applied since the start or the last restart, minus undone ones.
    pub fn moves_made(&self) -> usize {
        self.history.len()
    }

    pub fn last_move(&self) -> Option<Move> {
        self.history.last().map(|(_, mv)| *mv)
    }

    /// Validates and applies a player's pour.
    ///
    /// On rejection the session is unchanged.
    pub fn process_move(&mut self, mv: Move) -> Result<(), InvalidMove> {
        let next = self.current.try_apply(mv)?;
        let previous = std::mem::replace(&mut self.current, next);
        self.history.push((previous, mv));
        Ok(())
    }

    /// Reverts the last applied move.
    ///
    /// # Returns
    /// `false` if there is nothing to undo.
    pub fn undo_last_move(&mut self) -> bool {
        match self.history.pop() {
            Some((previous, _)) => {
                self.current = previous;
                true
            }
            None => false,
        }
    }

    /// Resets to the initial snapshot and clears the history.
    pub fn restart(&mut self) {
        self.current = self.initial.clone();
        self.history.clear();
    }

    pub fn is_solved(&self) -> bool {
        self.current.is_goal()
    }

    /// Suggests the next move from the current state.
    pub fn hint(&self, budget: &SearchBudget) -> Option<Move> {
        solver::find_hint(&self.current, budget)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::state_from_str_array;

    #[test]
    fn test_tube_top_run() {
        let tube = Tube::from_units(vec![Color::Red, Color::Red, Color::Blue]).unwrap();
        assert_eq!(tube.top(), Some(Color::Blue));
        assert_eq!(tube.top_run(), 1);
        assert_eq!(Tube::full(Color::Green).top_run(), CAPACITY);
        assert!(Tube::from_units(vec![Color::Red; CAPACITY + 1]).is_none());
    }

    #[test]
    fn test_pour_moves_only_top_run() {
        // [A,A,B] onto [] moves just the B.
        let state = state_from_str_array(&["RRB", ""]).unwrap();
        let next = state.apply(Move::new(0, 1));
        assert_eq!(next.tube(0).unwrap().units(), &[Color::Red, Color::Red]);
        assert_eq!(next.tube(1).unwrap().units(), &[Color::Blue]);
    }

    #[test]
    fn test_pour_limited_by_room() {
        let state = state_from_str_array(&["BRRR", "GGR"]).unwrap();
        let mv = Move::new(0, 1);
        assert!(state.is_legal_move(mv));
        assert_eq!(state.pour_amount(mv), 1);
        let next = state.apply(mv);
        assert_eq!(next.tube(0).unwrap().units(), &[Color::Blue, Color::Red, Color::Red]);
        assert!(next.tube(1).unwrap().is_full());
    }

    #[test]
    fn test_rejects_full_destination() {
        let state = state_from_str_array(&["R", "BBBB"]).unwrap();
        assert_eq!(
            state.check_move(Move::new(0, 1)),
            Err(InvalidMove::DestinationFull(1))
        );
        assert!(apply_move(&state, Move::new(0, 1)).is_err());
    }

    #[test]
    fn test_rejects_color_mismatch() {
        let state = state_from_str_array(&["R", "B"]).unwrap();
        assert_eq!(
            state.check_move(Move::new(0, 1)),
            Err(InvalidMove::ColorMismatch {
                moving: Color::Red,
                top: Color::Blue
            })
        );
    }

    #[test]
    fn test_rejects_bad_indices_and_empty_source() {
        let state = state_from_str_array(&["R", ""]).unwrap();
        assert_eq!(state.check_move(Move::new(0, 0)), Err(InvalidMove::SameTube(0)));
        assert_eq!(
            state.check_move(Move::new(0, 5)),
            Err(InvalidMove::OutOfBounds {
                index: 5,
                tube_count: 2
            })
        );
        assert_eq!(state.check_move(Move::new(1, 0)), Err(InvalidMove::EmptySource(1)));
    }

    #[test]
    fn test_legal_pours_never_overflow_or_mix() {
        let state = state_from_str_array(&["RBRB", "BRB", "R", ""]).unwrap();
        for mv in state.legal_moves() {
            let moving = state.tube(mv.src).unwrap().top().unwrap();
            let next = state.apply(mv);
            assert!(next.tubes().iter().all(|t| t.len() <= CAPACITY));
            assert_eq!(next.color_counts(), state.color_counts());

            let moved = state.pour_amount(mv);
            let dst_after = next.tube(mv.dst).unwrap().units();
            let new_units = &dst_after[dst_after.len() - moved..];
            assert!(new_units.iter().all(|&c| c == moving), "pour {} mixed colors", mv);
        }
    }

    #[test]
    fn test_apply_does_not_touch_input() {
        let state = state_from_str_array(&["RR", ""]).unwrap();
        let snapshot = state.clone();
        let _ = state.apply(Move::new(0, 1));
        assert_eq!(state, snapshot);
    }

    #[test]
    fn test_is_goal() {
        assert!(state_from_str_array(&["RRRR", "BBBB", "", ""]).unwrap().is_goal());
        assert!(PuzzleState::default().is_goal());
        // Partially filled tube.
        assert!(!state_from_str_array(&["RRRR", "BBB", "B"]).unwrap().is_goal());
        // Full but mixed tube.
        assert!(!state_from_str_array(&["RRRB", "BBBR"]).unwrap().is_goal());
    }

    #[test]
    fn test_fingerprint_matches_equality() {
        let a = state_from_str_array(&["RB", "B", ""]).unwrap();
        let b = state_from_str_array(&["RB", "B", ""]).unwrap();
        let permuted = state_from_str_array(&["B", "RB", ""]).unwrap();
        // Same units, different split between tubes.
        let resplit = state_from_str_array(&["R", "BB", ""]).unwrap();
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_ne!(a.fingerprint(), permuted.fingerprint());
        assert_ne!(a.fingerprint(), resplit.fingerprint());
    }

    #[test]
    fn test_display_state() {
        let state = state_from_str_array(&["RRB", ""]).unwrap();
        assert_eq!(format!("{}", state), " 0 |RRB.|\n 1 |....|");
    }

    #[test]
    fn test_game_process_and_undo() {
        let start = state_from_str_array(&["RRB", "B", ""]).unwrap();
        let mut game = Game::new(start.clone());

        assert!(game.process_move(Move::new(0, 1)).is_ok());
        assert_eq!(game.moves_made(), 1);
        assert_eq!(game.last_move(), Some(Move::new(0, 1)));
        assert_eq!(game.current().tube(1).unwrap().units(), &[Color::Blue, Color::Blue]);

        // Rejected moves leave the session alone.
        let before = game.current().clone();
        assert!(game.process_move(Move::new(1, 1)).is_err());
        assert_eq!(game.current(), &before);
        assert_eq!(game.moves_made(), 1);

        assert!(game.undo_last_move());
        assert_eq!(game.current(), &start);
        assert!(!game.undo_last_move());
    }

    #[test]
    fn test_game_restart() {
        let start = state_from_str_array(&["RRB", "B", ""]).unwrap();
        let mut game = Game::new(start.clone());
        game.process_move(Move::new(0, 2)).unwrap();
        game.process_move(Move::new(0, 1)).unwrap_err();
        game.restart();
        assert_eq!(game.current(), &start);
        assert_eq!(game.moves_made(), 0);
        assert_eq!(game.initial(), &start);
    }

    #[test]
    fn test_game_solved_after_last_pour() {
        let start = state_from_str_array(&["RRR", "R", "BBBB"]).unwrap();
        let mut game = Game::new(start);
        assert!(!game.is_solved());
        game.process_move(Move::new(1, 0)).unwrap();
        assert!(game.is_solved());
        assert_eq!(game.hint(&SearchBudget::hint()), None);
    }
}
