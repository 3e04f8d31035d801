use crate::engine::{Color, PuzzleState, Tube, CAPACITY};
use thiserror::Error;

/// Errors produced while reading a puzzle from text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("unrecognized character '{ch}' in tube {tube}")]
    UnknownColor { tube: usize, ch: char },

    #[error("tube {tube} holds {len} units, capacity is {capacity}")]
    TubeTooLong { tube: usize, len: usize, capacity: usize },

    #[error("tube {tube} has a unit above an empty slot")]
    GapInTube { tube: usize },

    #[error("color {color:?} appears {count} times, expected {expected}")]
    Unbalanced {
        color: Color,
        count: usize,
        expected: usize,
    },
}

/// Parses an array of string slices into a `PuzzleState`.
///
/// Each string slice describes one tube, bottom unit first. Valid characters are
/// the color characters of [`Color::to_char`] (`R G B Y P O C K A`) and `.`
/// for an empty slot. Empty slots may only appear above the last unit, so
/// `"RR.."`, `"RR"` and `""` are all fine but `"R.R"` is not.
///
/// # Arguments
/// * `s`: One string slice per tube.
///
/// # Returns
/// * `Ok(PuzzleState)` if parsing is successful.
/// * `Err(ParseError)` on an unknown character, an overfull tube or a gap.
///
/// # Examples
/// ```
/// use watersort_solver::engine::Color;
/// use watersort_solver::utils::state_from_str_array;
///
/// let state = state_from_str_array(&["RGB", "R...", ""]).unwrap();
/// assert_eq!(state.tube_count(), 3);
/// assert_eq!(state.tube(0).unwrap().top(), Some(Color::Blue));
/// assert!(state.tube(2).unwrap().is_empty());
///
/// assert!(state_from_str_array(&["RXB"]).is_err());
/// assert!(state_from_str_array(&["RRRRR"]).is_err());
/// ```
pub fn state_from_str_array(s: &[&str]) -> Result<PuzzleState, ParseError> {
    let mut tubes = Vec::with_capacity(s.len());
    for (idx, tube_str) in s.iter().enumerate() {
        tubes.push(parse_tube(idx, tube_str)?);
    }
    Ok(PuzzleState::new(tubes))
}

fn parse_tube(idx: usize, tube_str: &str) -> Result<Tube, ParseError> {
    let chars: Vec<char> = tube_str.trim().chars().collect();
    if chars.len() > CAPACITY {
        return Err(ParseError::TubeTooLong {
            tube: idx,
            len: chars.len(),
            capacity: CAPACITY,
        });
    }

    let mut units = Vec::with_capacity(CAPACITY);
    let mut seen_empty = false;
    for ch in chars {
        if ch == '.' {
            seen_empty = true;
            continue;
        }
        if seen_empty {
            return Err(ParseError::GapInTube { tube: idx });
        }
        let color = Color::from_char(ch).ok_or(ParseError::UnknownColor { tube: idx, ch })?;
        units.push(color);
    }
    // Length was checked above.
    Tube::from_units(units).ok_or(ParseError::TubeTooLong {
        tube: idx,
        len: CAPACITY + 1,
        capacity: CAPACITY,
    })
}

/// Parses a multi-line description, one tube per line.
///
/// Blank lines and lines starting with `#` are skipped, so an empty tube must
/// be written as `.` (or `....`). A leading `N |` index and a trailing `|`, as
/// printed by `PuzzleState`'s `Display`, are accepted too.
pub fn state_from_text(text: &str) -> Result<PuzzleState, ParseError> {
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(|line| {
            let body = line.rsplit_once('|').map_or(line, |(head, tail)| {
                if tail.trim().is_empty() {
                    head
                } else {
                    line
                }
            });
            body.split_once('|').map_or(body, |(_, tube)| tube)
        })
        .collect();
    state_from_str_array(&lines)
}

/// Checks that every color present appears exactly [`CAPACITY`] times.
pub fn check_conservation(state: &PuzzleState) -> Result<(), ParseError> {
    for (color, count) in state.color_counts() {
        if count != CAPACITY {
            return Err(ParseError::Unbalanced {
                color,
                count,
                expected: CAPACITY,
            });
        }
    }
    Ok(())
}
