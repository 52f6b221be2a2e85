//! Manual board edits
//!
//! Direct changes to board cells made outside of normal drafting, e.g. when a
//! user sets up a position by hand. Each edit is validated against the
//! placement rules and the tile supply before it can be applied. Rejections
//! carry an advisory fix for the user; nothing is corrected automatically.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::conservation::{ConservationValidator, ContainerRef};
use crate::error::{EditError, EditReason};
use crate::{
    line_capacity, Col, Color, PatternLine, PlayerBoard, PlayerIdx, Position, Row, TileSet, Token,
    ALL_COLORS, BOARD_SIZE, FACTORY_CAPACITY, FLOOR_CAPACITY, NUM_PLAYERS, WALL_PATTERN,
};

/// A direct change to one container on the table
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum Edit {
    /// Replace a pattern line's content. `count == 0` clears the line.
    SetPatternLine {
        player: PlayerIdx,
        row: Row,
        color: Option<Color>,
        count: u8,
    },
    /// Replace a factory's tiles
    SetFactory { factory: u8, tiles: TileSet },
    /// Fill one empty wall cell
    PlaceWallTile {
        player: PlayerIdx,
        row: Row,
        col: Col,
        color: Color,
    },
    /// Replace the loose center tiles and the marker flag
    SetCenter {
        tiles: TileSet,
        first_player_marker_available: bool,
    },
    /// Replace a floor line
    SetFloor {
        player: PlayerIdx,
        tokens: Vec<Token>,
    },
}

fn board(position: &Position, player: PlayerIdx) -> Result<&PlayerBoard, EditError> {
    position.player(player).ok_or_else(|| {
        EditError::new(
            EditReason::UnknownPlayer(player),
            format!("players are numbered 0 to {}", NUM_PLAYERS - 1),
        )
    })
}

/// Validates manual edits against placement rules and the tile supply
#[derive(Copy, Clone, Debug, Default)]
pub struct EditValidator {
    conservation: ConservationValidator,
}

impl EditValidator {
    pub fn new(conservation: ConservationValidator) -> Self {
        EditValidator { conservation }
    }

    pub fn validate(&self, position: &Position, edit: &Edit) -> Result<(), EditError> {
        match edit {
            Edit::SetPatternLine {
                player,
                row,
                color,
                count,
            } => self.check_pattern_line(position, *player, *row, *color, *count),
            Edit::SetFactory { factory, tiles } => self.check_factory(position, *factory, tiles),
            Edit::PlaceWallTile {
                player,
                row,
                col,
                color,
            } => self.check_wall_tile(position, *player, *row, *col, *color),
            Edit::SetCenter {
                tiles,
                first_player_marker_available,
            } => self.check_center(position, tiles, *first_player_marker_available),
            Edit::SetFloor { player, tokens } => self.check_floor(position, *player, tokens),
        }
    }

    /// Validate, then return the edited copy. The input is never modified.
    pub fn apply(&self, position: &Position, edit: &Edit) -> Result<Position, EditError> {
        self.validate(position, edit)?;

        let mut next = position.clone();
        match edit {
            Edit::SetPatternLine {
                player,
                row,
                color,
                count,
            } => {
                next.players[*player as usize].pattern_lines[*row as usize] = if *count == 0 {
                    PatternLine::default()
                } else {
                    PatternLine {
                        color: *color,
                        count: *count,
                    }
                };
            }
            Edit::SetFactory { factory, tiles } => {
                if let Some(slot) = next.factories.get_mut(*factory) {
                    *slot = *tiles;
                }
            }
            Edit::PlaceWallTile {
                player,
                row,
                col,
                color,
            } => {
                next.players[*player as usize].wall[*row as usize][*col as usize] = Some(*color);
            }
            Edit::SetCenter {
                tiles,
                first_player_marker_available,
            } => {
                next.center.tiles = *tiles;
                next.center.first_player_marker_available = *first_player_marker_available;
            }
            Edit::SetFloor { player, tokens } => {
                next.players[*player as usize].floor = crate::FloorLine::from_tokens(tokens);
            }
        }

        debug!(?edit, "applied edit");
        Ok(next)
    }

    fn check_pattern_line(
        &self,
        position: &Position,
        player: PlayerIdx,
        row: Row,
        color: Option<Color>,
        count: u8,
    ) -> Result<(), EditError> {
        let board = board(position, player)?;
        let r = row as usize;
        let line = board.pattern_lines.get(r).ok_or_else(|| {
            EditError::new(
                EditReason::UnknownPatternLine(row),
                format!("pattern lines are indexed 0 to {}", BOARD_SIZE - 1),
            )
        })?;
        let container = ContainerRef::PatternLine { player, row };

        let capacity = line_capacity(r);
        if count > capacity {
            return Err(EditError::new(
                EditReason::CapacityExceeded {
                    capacity: capacity as usize,
                    requested: count as usize,
                },
                format!("line {} holds at most {capacity} tiles", r + 1),
            ));
        }

        if count == 0 {
            if let Some(existing) = line.color {
                self.conservation
                    .check_set(position, existing, 0, container)?;
            }
            return Ok(());
        }

        let Some(color) = color else {
            return Err(EditError::new(
                EditReason::MissingColor,
                "pick a color or set the count to 0",
            ));
        };

        if let Some(existing) = line.color {
            if !line.is_empty() && existing != color {
                return Err(EditError::new(
                    EditReason::ColorConflict {
                        existing,
                        requested: color,
                    },
                    format!("clear line {} before staging {}", r + 1, color.name()),
                ));
            }
        }

        if board.wall_row_has(r, color) {
            return Err(EditError::new(
                EditReason::WallRowHasColor { row, color },
                format!("use a row whose wall has no {} tile yet", color.name()),
            ));
        }

        self.conservation
            .check_set(position, color, count as u16, container)?;
        Ok(())
    }

    fn check_factory(
        &self,
        position: &Position,
        factory: u8,
        tiles: &TileSet,
    ) -> Result<(), EditError> {
        if position.factories.get(factory).is_none() {
            return Err(EditError::new(
                EditReason::UnknownFactory(factory),
                format!(
                    "factories are numbered 0 to {}",
                    position.factories.num_factories.saturating_sub(1)
                ),
            ));
        }

        if tiles.len() > FACTORY_CAPACITY {
            return Err(EditError::new(
                EditReason::CapacityExceeded {
                    capacity: FACTORY_CAPACITY,
                    requested: tiles.len(),
                },
                format!("a factory holds at most {FACTORY_CAPACITY} tiles"),
            ));
        }

        let container = ContainerRef::Factory(factory);
        for color in ALL_COLORS {
            self.conservation
                .check_set(position, color, tiles.count(color) as u16, container)?;
        }
        Ok(())
    }

    fn check_wall_tile(
        &self,
        position: &Position,
        player: PlayerIdx,
        row: Row,
        col: Col,
        color: Color,
    ) -> Result<(), EditError> {
        let board = board(position, player)?;
        let (r, c) = (row as usize, col as usize);
        if r >= BOARD_SIZE || c >= BOARD_SIZE {
            return Err(EditError::new(
                EditReason::UnknownWallCell { row, col },
                format!("wall rows and columns are indexed 0 to {}", BOARD_SIZE - 1),
            ));
        }

        if board.wall[r][c].is_some() {
            return Err(EditError::new(
                EditReason::CellOccupied { row, col },
                "wall tiles stay until a new game starts",
            ));
        }

        let expected = WALL_PATTERN[r][c];
        if color != expected {
            return Err(EditError::new(
                EditReason::WrongWallColor {
                    row,
                    col,
                    expected,
                    requested: color,
                },
                format!("this cell only takes {}", expected.name()),
            ));
        }

        self.conservation
            .check_delta(position, color, 1, ContainerRef::Wall { player, row, col })?;
        Ok(())
    }

    fn check_center(
        &self,
        position: &Position,
        tiles: &TileSet,
        first_player_marker_available: bool,
    ) -> Result<(), EditError> {
        if first_player_marker_available
            && position
                .players
                .iter()
                .any(|p| p.floor.has_first_player_marker())
        {
            return Err(EditError::new(
                EditReason::MarkerMisplaced("is already on a floor line"),
                "remove it from the floor first",
            ));
        }

        for color in ALL_COLORS {
            self.conservation.check_set(
                position,
                color,
                tiles.count(color) as u16,
                ContainerRef::Center,
            )?;
        }
        Ok(())
    }

    fn check_floor(
        &self,
        position: &Position,
        player: PlayerIdx,
        tokens: &[Token],
    ) -> Result<(), EditError> {
        board(position, player)?;

        if tokens.len() > FLOOR_CAPACITY {
            return Err(EditError::new(
                EditReason::CapacityExceeded {
                    capacity: FLOOR_CAPACITY,
                    requested: tokens.len(),
                },
                format!("the floor line has {FLOOR_CAPACITY} slots"),
            ));
        }

        if tokens[1.min(tokens.len())..].contains(&Token::FirstPlayerMarker) {
            return Err(EditError::new(
                EditReason::MarkerMisplaced("must occupy the first floor slot"),
                "move the marker to the front of the floor line",
            ));
        }

        if tokens.first() == Some(&Token::FirstPlayerMarker) {
            let claimed_elsewhere = position.center.first_player_marker_available
                || position
                    .players
                    .iter()
                    .enumerate()
                    .any(|(p, board)| p != player as usize && board.floor.has_first_player_marker());
            if claimed_elsewhere {
                return Err(EditError::new(
                    EditReason::MarkerMisplaced("is already in the center or on another floor"),
                    "take the marker from where it is first",
                ));
            }
        }

        let container = ContainerRef::Floor { player };
        for color in ALL_COLORS {
            let count = tokens.iter().filter(|&&t| t == Token::Tile(color)).count();
            self.conservation
                .check_set(position, color, count as u16, container)?;
        }
        Ok(())
    }
}

/// Validate an edit against the standard tile supply
pub fn validate_edit(position: &Position, edit: &Edit) -> Result<(), EditError> {
    EditValidator::default().validate(position, edit)
}

/// Validate and apply an edit against the standard tile supply
pub fn apply_edit(position: &Position, edit: &Edit) -> Result<Position, EditError> {
    EditValidator::default().apply(position, edit)
}
