//! Drafting moves: validation, application and enumeration
//!
//! `apply_move` is pure. It borrows the position, checks the whole move up
//! front and only then builds the successor, so a rejected move can never leave
//! a half-applied position behind.

use tracing::debug;

use crate::error::MoveError;
use crate::{
    line_capacity, Color, DraftDestination, DraftSource, Move, PlayerBoard, Position, TileSet,
    Token, ALL_COLORS, BOARD_SIZE,
};

/// Number of `color` tiles at `source`
fn tiles_at_source(position: &Position, source: DraftSource, color: Color) -> Result<u8, MoveError> {
    match source {
        DraftSource::Factory(f) => position
            .factories
            .get(f)
            .map(|factory| factory.count(color))
            .ok_or(MoveError::UnknownFactory(f)),
        DraftSource::Center => Ok(position.center.tiles.count(color)),
    }
}

/// Center contents once the undrafted tiles of factory `f` have been pushed into it
fn center_with_leftovers(position: &Position, f: u8, drafted: Color) -> Result<TileSet, MoveError> {
    let factory = position
        .factories
        .get(f)
        .ok_or(MoveError::UnknownFactory(f))?;
    let mut center = position.center.tiles;
    for color in ALL_COLORS.into_iter().filter(|&c| c != drafted) {
        let slot = &mut center.counts[color as usize];
        *slot = slot
            .checked_add(factory.count(color))
            .ok_or(MoveError::CenterOverflow { color })?;
    }
    Ok(center)
}

fn acting_player(position: &Position) -> Result<&PlayerBoard, MoveError> {
    position
        .player(position.current_player)
        .ok_or(MoveError::UnknownPlayer(position.current_player))
}

/// Free slots on the destination line for `color`, after the color and wall checks
fn room_for(player: &PlayerBoard, dest: DraftDestination, color: Color) -> Result<u8, MoveError> {
    match dest {
        DraftDestination::Floor => Ok(0),
        DraftDestination::PatternLine(row) => {
            let r = row as usize;
            let line = player
                .pattern_lines
                .get(r)
                .ok_or(MoveError::UnknownPatternLine(row))?;

            // Pattern line homogeneity
            if let Some(existing) = line.color {
                if line.count > 0 && existing != color {
                    return Err(MoveError::ColorConflict {
                        row,
                        existing,
                        requested: color,
                    });
                }
            }

            // Wall constraint: can't stage a color already in the wall row
            if player.wall_row_has(r, color) {
                return Err(MoveError::WallRowFilled { row, color });
            }

            Ok(line_capacity(r).saturating_sub(line.count))
        }
    }
}

impl Move {
    /// Build the admissible split for drafting `color` from `source` into `dest`:
    /// fill what the pattern line can hold and send the rest to the floor.
    pub fn plan(
        position: &Position,
        source: DraftSource,
        color: Color,
        dest: DraftDestination,
    ) -> Result<Move, MoveError> {
        let available = tiles_at_source(position, source, color)?;
        if available == 0 {
            return Err(MoveError::SourceEmpty {
                from: source,
                color,
            });
        }

        let room = room_for(acting_player(position)?, dest, color)?;
        let to_pattern_line = room.min(available);

        Ok(Move {
            source,
            color,
            dest,
            to_pattern_line,
            to_floor: available - to_pattern_line,
        })
    }
}

/// Apply a drafted move for the current player and return the successor position.
///
/// The caller supplies the pattern/floor split; it is validated, never adjusted.
/// Turn and round advancement are left to the caller.
pub fn apply_move(position: &Position, mv: &Move) -> Result<Position, MoveError> {
    let p = position.current_player as usize;
    let player = acting_player(position)?;

    // Step 1: source must hold the drafted color
    let available = tiles_at_source(position, mv.source, mv.color)?;
    if available == 0 {
        return Err(MoveError::SourceEmpty {
            from: mv.source,
            color: mv.color,
        });
    }

    // Step 2: take-all rule
    let requested = mv.to_pattern_line as u16 + mv.to_floor as u16;
    if requested != available as u16 {
        return Err(MoveError::QuantityMismatch {
            available,
            requested,
        });
    }

    // Step 3: destination must accept the pattern-line share as given
    let room = room_for(player, mv.dest, mv.color)?;
    if mv.to_pattern_line > room {
        return Err(MoveError::CapacityExceeded {
            dest: mv.dest,
            requested: mv.to_pattern_line,
            remaining: room,
        });
    }

    // Step 4: factory leftovers must fit the center
    let center_after_factory = match mv.source {
        DraftSource::Factory(f) => Some(center_with_leftovers(position, f, mv.color)?),
        DraftSource::Center => None,
    };

    let mut next = position.clone();

    // Step 5: remove drafted tiles from the source
    let mut took_first_player_marker = false;
    match mv.source {
        DraftSource::Factory(f) => {
            let factory = next
                .factories
                .get_mut(f)
                .ok_or(MoveError::UnknownFactory(f))?;
            *factory = TileSet::default();
            if let Some(center) = center_after_factory {
                next.center.tiles = center;
            }
        }
        DraftSource::Center => {
            next.center.tiles.take_all(mv.color);
            // Step 6: first draft from the center claims the marker
            if next.center.first_player_marker_available {
                next.center.first_player_marker_available = false;
                took_first_player_marker = true;
            }
        }
    }

    // Step 7: place tiles
    let board = &mut next.players[p];
    if took_first_player_marker {
        if let Some(dropped) = board.floor.prepend(Token::FirstPlayerMarker) {
            debug!(player = p, ?dropped, "floor full, tile pushed off by marker");
        }
    }

    if let DraftDestination::PatternLine(row) = mv.dest {
        if mv.to_pattern_line > 0 {
            let line = &mut board.pattern_lines[row as usize];
            line.color = Some(mv.color);
            line.count += mv.to_pattern_line;
        }
    }

    let mut discarded = 0u8;
    for _ in 0..mv.to_floor {
        if !board.floor.push(Token::Tile(mv.color)) {
            discarded += 1;
        }
    }

    debug!(
        player = p,
        %mv,
        took_first_player_marker,
        discarded,
        "applied move"
    );

    Ok(next)
}

/// Enumerate every legal move for the current player, with admissible splits.
/// Floor-only drafts are always offered; full or blocked lines are skipped.
pub fn legal_moves(position: &Position) -> Vec<Move> {
    let mut moves = Vec::new();

    let sources = (0..position.factories.num_factories)
        .map(DraftSource::Factory)
        .chain(std::iter::once(DraftSource::Center));

    for source in sources {
        for color in ALL_COLORS {
            let dests = (0..BOARD_SIZE as u8)
                .map(DraftDestination::PatternLine)
                .chain(std::iter::once(DraftDestination::Floor));

            for dest in dests {
                match Move::plan(position, source, color, dest) {
                    // A full line would only be a disguised floor move
                    Ok(mv) if mv.to_pattern_line == 0 && dest != DraftDestination::Floor => {}
                    Ok(mv) => moves.push(mv),
                    Err(_) => {}
                }
            }
        }
    }

    moves
}
