//! Tile conservation
//!
//! Every color has a fixed supply. Whatever is on the table (factories, center,
//! pattern lines, walls, floors) may never exceed it, and no container may hold
//! a negative number of tiles. The remainder lives in the bag and lid, which the
//! position does not carry.

use std::fmt;

use tracing::debug;

use crate::error::ConservationError;
use crate::{
    Col, Color, PlayerIdx, Position, Row, ALL_COLORS, BOARD_SIZE, TILES_PER_COLOR, TILE_COLORS,
};

/// A place on the table that can hold tiles
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ContainerRef {
    Factory(u8),
    Center,
    PatternLine { player: PlayerIdx, row: Row },
    Wall { player: PlayerIdx, row: Row, col: Col },
    Floor { player: PlayerIdx },
}

impl fmt::Display for ContainerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContainerRef::Factory(i) => write!(f, "factory {i}"),
            ContainerRef::Center => f.write_str("the center"),
            ContainerRef::PatternLine { player, row } => {
                write!(f, "player {player} pattern line index {row}")
            }
            ContainerRef::Wall { player, row, col } => {
                write!(f, "player {player} wall cell ({row}, {col})")
            }
            ContainerRef::Floor { player } => write!(f, "player {player} floor"),
        }
    }
}

/// Per-color count of tiles on the table
pub fn tile_counts(position: &Position) -> [u16; TILE_COLORS] {
    let mut totals = [0u16; TILE_COLORS];

    for color in ALL_COLORS {
        let ci = color as usize;

        for factory in position.factories.active() {
            totals[ci] += factory.count(color) as u16;
        }

        totals[ci] += position.center.tiles.count(color) as u16;

        for player in &position.players {
            for line in &player.pattern_lines {
                totals[ci] += line.count_of(color) as u16;
            }

            for row in &player.wall {
                totals[ci] += row.iter().filter(|&&cell| cell == Some(color)).count() as u16;
            }

            totals[ci] += player.floor.count_of(color) as u16;
        }
    }

    totals
}

/// Per-color count of tiles off the table (bag and lid together)
pub fn off_table_counts(position: &Position, supply: u8) -> [u16; TILE_COLORS] {
    tile_counts(position).map(|on_table| (supply as u16).saturating_sub(on_table))
}

/// How many `color` tiles `container` currently holds
fn container_count(
    position: &Position,
    color: Color,
    container: ContainerRef,
) -> Result<u16, ConservationError> {
    let unknown = ConservationError::UnknownContainer(container);
    let player = |p: PlayerIdx| position.player(p).ok_or(unknown);

    let count = match container {
        ContainerRef::Factory(i) => position.factories.get(i).ok_or(unknown)?.count(color),
        ContainerRef::Center => position.center.tiles.count(color),
        ContainerRef::PatternLine { player: p, row } => player(p)?
            .pattern_lines
            .get(row as usize)
            .ok_or(unknown)?
            .count_of(color),
        ContainerRef::Wall { player: p, row, col } => {
            if row as usize >= BOARD_SIZE || col as usize >= BOARD_SIZE {
                return Err(unknown);
            }
            u8::from(player(p)?.wall[row as usize][col as usize] == Some(color))
        }
        ContainerRef::Floor { player: p } => player(p)?.floor.count_of(color),
    };

    Ok(count as u16)
}

/// Checks proposed per-color changes against a fixed supply
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct ConservationValidator {
    supply: u8,
}

impl Default for ConservationValidator {
    fn default() -> Self {
        ConservationValidator {
            supply: TILES_PER_COLOR,
        }
    }
}

impl ConservationValidator {
    pub fn new(supply: u8) -> Self {
        ConservationValidator { supply }
    }

    pub fn supply(&self) -> u8 {
        self.supply
    }

    /// Validate adding `delta` tiles of `color` to `container` (negative removes).
    /// Returns the resulting table-wide total for that color.
    pub fn check_delta(
        &self,
        position: &Position,
        color: Color,
        delta: i16,
        container: ContainerRef,
    ) -> Result<u16, ConservationError> {
        let present = container_count(position, color, container)?;
        self.check_change(position, color, present, i32::from(delta), container)
    }

    /// Validate replacing the `color` count held by `container` with `target`
    pub fn check_set(
        &self,
        position: &Position,
        color: Color,
        target: u16,
        container: ContainerRef,
    ) -> Result<u16, ConservationError> {
        let present = container_count(position, color, container)?;
        let delta = i32::from(target) - i32::from(present);
        self.check_change(position, color, present, delta, container)
    }

    fn check_change(
        &self,
        position: &Position,
        color: Color,
        present: u16,
        delta: i32,
        container: ContainerRef,
    ) -> Result<u16, ConservationError> {
        let total = i32::from(tile_counts(position)[color as usize]);
        let saturate = |n: i32| u16::try_from(n).unwrap_or(u16::MAX);

        if delta < 0 {
            let removed = saturate(-delta);
            if removed > present {
                return Err(ConservationError::UnderZero {
                    color,
                    container,
                    present,
                    removed,
                });
            }
            return Ok(saturate(total + delta));
        }

        let new_total = saturate(total + delta);
        if new_total > self.supply as u16 {
            debug!(%color, new_total, supply = self.supply, %container, "edit exceeds supply");
            return Err(ConservationError::OverSupply {
                color,
                total: new_total,
                supply: self.supply,
            });
        }

        Ok(new_total)
    }

    /// Validate a whole position (used after decoding untrusted notation)
    pub fn check_position(&self, position: &Position) -> Result<(), ConservationError> {
        let totals = tile_counts(position);
        for color in ALL_COLORS {
            let total = totals[color as usize];
            if total > self.supply as u16 {
                return Err(ConservationError::OverSupply {
                    color,
                    total,
                    supply: self.supply,
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{new_game, TileSet, Token};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn empty_position() -> Position {
        Position::default()
    }

    #[test]
    fn test_tile_counts_cover_every_container() {
        let mut position = empty_position();
        position.factories.factories[0] = TileSet::from_colors([Color::Red, Color::Red]);
        position.center.tiles = TileSet::from_colors([Color::Red]);
        position.players[0].pattern_lines[2].color = Some(Color::Red);
        position.players[0].pattern_lines[2].count = 3;
        position.players[1].wall[0][2] = Some(Color::Red);
        position.players[1].floor.push(Token::Tile(Color::Red));
        position.players[1].floor.push(Token::FirstPlayerMarker);

        let totals = tile_counts(&position);
        assert_eq!(totals[Color::Red as usize], 8);
        assert_eq!(totals[Color::Blue as usize], 0);
        assert_eq!(off_table_counts(&position, 20)[Color::Red as usize], 12);
    }

    #[test]
    fn test_check_delta_accepts_within_supply() {
        let position = new_game(0, &mut StdRng::seed_from_u64(3));
        let validator = ConservationValidator::default();
        let before = tile_counts(&position)[Color::Blue as usize];

        let total = validator
            .check_delta(&position, Color::Blue, 1, ContainerRef::Center)
            .unwrap();
        assert_eq!(total, before + 1);
    }

    #[test]
    fn test_check_delta_rejects_over_supply() {
        let mut position = empty_position();
        position.center.tiles.counts[Color::Yellow as usize] = 19;
        let validator = ConservationValidator::default();

        assert!(validator
            .check_delta(&position, Color::Yellow, 1, ContainerRef::Factory(0))
            .is_ok());
        assert_eq!(
            validator.check_delta(&position, Color::Yellow, 2, ContainerRef::Factory(0)),
            Err(ConservationError::OverSupply {
                color: Color::Yellow,
                total: 21,
                supply: 20,
            })
        );
    }

    #[test]
    fn test_check_delta_rejects_removal_below_zero() {
        let mut position = empty_position();
        position.factories.factories[1] = TileSet::from_colors([Color::Black]);
        let validator = ConservationValidator::default();

        let err = validator
            .check_delta(&position, Color::Black, -2, ContainerRef::Factory(1))
            .unwrap_err();
        assert!(matches!(
            err,
            ConservationError::UnderZero {
                present: 1,
                removed: 2,
                ..
            }
        ));
    }

    #[test]
    fn test_check_delta_unknown_container() {
        let position = empty_position();
        let validator = ConservationValidator::default();
        let container = ContainerRef::Factory(7);

        assert_eq!(
            validator.check_delta(&position, Color::Red, 1, container),
            Err(ConservationError::UnknownContainer(container))
        );
    }

    #[test]
    fn test_check_set_uses_container_difference() {
        let mut position = empty_position();
        position.players[0].pattern_lines[4].color = Some(Color::White);
        position.players[0].pattern_lines[4].count = 2;
        position.center.tiles.counts[Color::White as usize] = 16;
        let validator = ConservationValidator::default();
        let line = ContainerRef::PatternLine { player: 0, row: 4 };

        assert_eq!(validator.check_set(&position, Color::White, 4, line), Ok(20));
        assert!(validator.check_set(&position, Color::White, 5, line).is_err());
        assert_eq!(validator.check_set(&position, Color::White, 0, line), Ok(16));
    }

    #[test]
    fn test_check_set_large_target_is_over_supply() {
        let position = empty_position();
        let validator = ConservationValidator::default();

        assert_eq!(
            validator.check_set(&position, Color::Red, 40_000, ContainerRef::Center),
            Err(ConservationError::OverSupply {
                color: Color::Red,
                total: 40_000,
                supply: 20,
            })
        );
        assert!(matches!(
            validator.check_set(&position, Color::Red, u16::MAX, ContainerRef::Center),
            Err(ConservationError::OverSupply {
                total: u16::MAX,
                ..
            })
        ));
    }

    #[test]
    fn test_custom_supply() {
        let mut position = empty_position();
        position.center.tiles.counts[Color::Red as usize] = 21;
        assert!(ConservationValidator::default()
            .check_position(&position)
            .is_err());
        assert!(ConservationValidator::new(25)
            .check_position(&position)
            .is_ok());
    }
}
