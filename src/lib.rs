//! # Water Sort Solver Library
//!
//! This library provides the puzzle engine for the tube color-sorting game:
//! generating solvable scrambled levels, applying pours, testing for the goal
//! and suggesting hints with a bounded weighted A* search.
//!
//! It is used by three binaries:
//! - `play`: Interactive gameplay on the command line, with hints, undo and restart.
//! - `hint_solver`: Reads a puzzle from a file and prints a solution path.
//! - `level_evaluator`: Generates seeded levels and reports difficulty statistics.
//!
//! ## Modules
//! - `engine`: Colors, tubes, puzzle states, the pour rule, the goal test and
//!   the `Game` session.
//! - `heuristics`: The disorder and chaos scores and the greedy one-step move.
//! - `solver`: `solve`, `find_hint` and `is_solvable` under a `SearchBudget`.
//! - `generator`: Level configurations and the reversible scramble walk.
//! - `orchestrator`: Repeated generation with validation, keeping the hardest candidate.
//! - `utils`: Reading puzzles from text.
//!
//! The library logs through the `log` facade and never prints.

pub mod engine;
pub mod generator;
pub mod heuristics;
pub mod orchestrator;
pub mod solver;
pub mod utils;
