//! Error types for the rules core
//!
//! Every failure is local and recoverable: the position that was passed in is
//! never touched, and the message is meant to be shown to the user verbatim.

use std::fmt;

use thiserror::Error;

use crate::conservation::ContainerRef;
use crate::{Col, Color, DraftDestination, DraftSource, PlayerIdx, Row};

/// Notation segment named in decode errors
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Segment {
    Factories,
    Center,
    Wall(PlayerIdx),
    Pattern(PlayerIdx),
    Floor(PlayerIdx),
    Scores,
    Round,
    CurrentPlayer,
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Factories => f.write_str("factories"),
            Segment::Center => f.write_str("center"),
            Segment::Wall(p) => write!(f, "player {} wall", p + 1),
            Segment::Pattern(p) => write!(f, "player {} pattern lines", p + 1),
            Segment::Floor(p) => write!(f, "player {} floor", p + 1),
            Segment::Scores => f.write_str("scores"),
            Segment::Round => f.write_str("round"),
            Segment::CurrentPlayer => f.write_str("current player"),
        }
    }
}

/// Malformed notation string
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum DecodeError {
    #[error("expected {expected} '/'-separated segments, found {found}")]
    SegmentCount { expected: usize, found: usize },

    #[error("malformed {segment}: {reason}")]
    Shape { segment: Segment, reason: String },

    #[error("invalid number in {segment}: '{value}'")]
    Number { segment: Segment, value: String },

    #[error("first player marker appears {count} times")]
    DuplicateMarker { count: usize },

    #[error(transparent)]
    Supply(#[from] ConservationError),
}

/// Rejected drafting move
#[derive(Copy, Clone, Debug, Eq, PartialEq, Error)]
pub enum MoveError {
    #[error("no factory {0}")]
    UnknownFactory(u8),

    #[error("no pattern line with index {0}")]
    UnknownPatternLine(Row),

    #[error("no player {0}")]
    UnknownPlayer(PlayerIdx),

    #[error("{from} holds no {color} tiles")]
    SourceEmpty { from: DraftSource, color: Color },

    #[error("{available} tiles must be drafted, move places {requested}")]
    QuantityMismatch { available: u8, requested: u16 },

    #[error("pattern line {} already holds {existing}, cannot add {requested}", .row + 1)]
    ColorConflict {
        row: Row,
        existing: Color,
        requested: Color,
    },

    #[error("wall row {} already has {color}", .row + 1)]
    WallRowFilled { row: Row, color: Color },

    #[error("{dest} has room for {remaining} tiles, move places {requested}")]
    CapacityExceeded {
        dest: DraftDestination,
        requested: u8,
        remaining: u8,
    },

    #[error("the center cannot hold any more {color} tiles")]
    CenterOverflow { color: Color },
}

/// Per-color tile count would leave the legal range
#[derive(Copy, Clone, Debug, Eq, PartialEq, Error)]
pub enum ConservationError {
    #[error("{total} {color} tiles on the table exceeds the supply of {supply}")]
    OverSupply { color: Color, total: u16, supply: u8 },

    #[error("{container} holds {present} {color} tiles, cannot remove {removed}")]
    UnderZero {
        color: Color,
        container: ContainerRef,
        present: u16,
        removed: u16,
    },

    #[error("{0} does not exist")]
    UnknownContainer(ContainerRef),
}

/// Why a manual board edit was refused
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum EditReason {
    UnknownPlayer(PlayerIdx),
    UnknownFactory(u8),
    UnknownPatternLine(Row),
    UnknownWallCell { row: Row, col: Col },
    ColorConflict { existing: Color, requested: Color },
    MissingColor,
    CapacityExceeded { capacity: usize, requested: usize },
    WallRowHasColor { row: Row, color: Color },
    CellOccupied { row: Row, col: Col },
    WrongWallColor {
        row: Row,
        col: Col,
        expected: Color,
        requested: Color,
    },
    MarkerMisplaced(&'static str),
    Conservation(ConservationError),
}

impl fmt::Display for EditReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EditReason::UnknownPlayer(p) => write!(f, "no player {p}"),
            EditReason::UnknownFactory(i) => write!(f, "no factory {i}"),
            EditReason::UnknownPatternLine(r) => write!(f, "no pattern line with index {r}"),
            EditReason::UnknownWallCell { row, col } => {
                write!(f, "no wall cell at index ({row}, {col})")
            }
            EditReason::ColorConflict {
                existing,
                requested,
            } => write!(f, "line holds {existing}, cannot switch to {requested}"),
            EditReason::MissingColor => f.write_str("a non-empty line needs a color"),
            EditReason::CapacityExceeded {
                capacity,
                requested,
            } => write!(f, "{requested} tiles exceed the capacity of {capacity}"),
            EditReason::WallRowHasColor { row, color } => {
                write!(f, "wall row {} already has {color}", row + 1)
            }
            EditReason::CellOccupied { row, col } => {
                write!(f, "wall cell ({}, {}) is already filled", row + 1, col + 1)
            }
            EditReason::WrongWallColor {
                row,
                col,
                expected,
                requested,
            } => write!(
                f,
                "wall cell ({}, {}) takes {expected}, not {requested}",
                row + 1,
                col + 1
            ),
            EditReason::MarkerMisplaced(why) => write!(f, "first player marker {why}"),
            EditReason::Conservation(err) => err.fmt(f),
        }
    }
}

/// Rejected manual edit, with advisory text for the user. The fix is never applied.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
#[error("{reason}")]
pub struct EditError {
    pub reason: EditReason,
    pub suggested_fix: String,
}

impl EditError {
    pub fn new(reason: EditReason, suggested_fix: impl Into<String>) -> Self {
        EditError {
            reason,
            suggested_fix: suggested_fix.into(),
        }
    }
}

impl From<ConservationError> for EditError {
    fn from(err: ConservationError) -> Self {
        let fix = match err {
            ConservationError::OverSupply { color, supply, .. } => {
                format!("remove {color} tiles elsewhere first; only {supply} exist")
            }
            ConservationError::UnderZero { container, .. } => {
                format!("check the tile count in {container}")
            }
            ConservationError::UnknownContainer(_) => "pick an existing container".to_string(),
        };
        EditError::new(EditReason::Conservation(err), fix)
    }
}
