//! Position notation
//!
//! ```text
//! factories/center/p1_wall/p1_pattern/p1_floor/p2_wall/p2_pattern/p2_floor/scores/round/current_player
//! ```
//!
//! Sub-fields are separated by `|`. Tiles are written with their color symbol
//! (`B Y R K W`), absent tiles with `-` and the first player marker with `1`.
//! Factories and the center are multisets and are written in color order, so
//! every position has exactly one encoding. A table with no factories writes
//! the factories segment as a single `-`.

use std::str::FromStr;

use crate::conservation::ConservationValidator;
use crate::error::{DecodeError, Segment};
use crate::{
    line_capacity, CenterPool, Color, Factories, FloorLine, PatternLine, PlayerIdx, Position,
    TileSet, Token, Wall, BOARD_SIZE, EMPTY_SYMBOL, FACTORY_CAPACITY, FIRST_PLAYER_SYMBOL,
    FLOOR_CAPACITY, MAX_FACTORIES, NUM_PLAYERS, TILES_PER_COLOR, WALL_PATTERN,
};

/// factories, center, three per player, scores, round, current player
const SEGMENT_COUNT: usize = 2 + 3 * NUM_PLAYERS + 3;

// =============================================================================
// Encoding
// =============================================================================

fn or_empty(s: String) -> String {
    if s.is_empty() {
        EMPTY_SYMBOL.to_string()
    } else {
        s
    }
}

fn encode_factory(factory: &TileSet) -> String {
    let mut out: String = factory.iter().map(Color::symbol).collect();
    while out.len() < FACTORY_CAPACITY {
        out.push(EMPTY_SYMBOL);
    }
    out
}

fn encode_center(center: &CenterPool) -> String {
    let mut out = String::new();
    if center.first_player_marker_available {
        out.push(FIRST_PLAYER_SYMBOL);
    }
    out.extend(center.tiles.iter().map(Color::symbol));
    or_empty(out)
}

fn encode_wall(wall: &Wall) -> String {
    wall.iter()
        .map(|row| {
            row.iter()
                .map(|cell| cell.map_or(EMPTY_SYMBOL, Color::symbol))
                .collect::<String>()
        })
        .collect::<Vec<_>>()
        .join("|")
}

fn encode_pattern_lines(lines: &[PatternLine; BOARD_SIZE]) -> String {
    lines
        .iter()
        .map(|line| match line.color {
            Some(color) if line.count > 0 => color.symbol().to_string().repeat(line.count as usize),
            _ => EMPTY_SYMBOL.to_string(),
        })
        .collect::<Vec<_>>()
        .join("|")
}

fn encode_floor(floor: &FloorLine) -> String {
    or_empty(floor.tokens().iter().map(|t| t.symbol()).collect())
}

/// Canonical notation string for a position. Total and deterministic.
pub fn encode(position: &Position) -> String {
    let mut segments = Vec::with_capacity(SEGMENT_COUNT);

    segments.push(or_empty(
        position
            .factories
            .active()
            .iter()
            .map(encode_factory)
            .collect::<Vec<_>>()
            .join("|"),
    ));
    segments.push(encode_center(&position.center));

    for player in &position.players {
        segments.push(encode_wall(&player.wall));
        segments.push(encode_pattern_lines(&player.pattern_lines));
        segments.push(encode_floor(&player.floor));
    }

    segments.push(
        position
            .players
            .iter()
            .map(|p| p.score.to_string())
            .collect::<Vec<_>>()
            .join(","),
    );
    segments.push(position.round.to_string());
    segments.push(position.current_player.to_string());

    segments.join("/")
}

// =============================================================================
// Decoding
// =============================================================================

fn shape(segment: Segment, reason: impl Into<String>) -> DecodeError {
    DecodeError::Shape {
        segment,
        reason: reason.into(),
    }
}

fn parse_number<T: FromStr>(value: &str, segment: Segment) -> Result<T, DecodeError> {
    value.parse().map_err(|_| DecodeError::Number {
        segment,
        value: value.to_string(),
    })
}

fn color_symbol(symbol: char, segment: Segment) -> Result<Color, DecodeError> {
    Color::from_symbol(symbol).ok_or_else(|| shape(segment, format!("unexpected symbol '{symbol}'")))
}

fn decode_factories(s: &str) -> Result<Factories, DecodeError> {
    let segment = Segment::Factories;
    if s.chars().eq([EMPTY_SYMBOL]) {
        return Ok(Factories {
            num_factories: 0,
            ..Factories::default()
        });
    }

    let entries: Vec<&str> = s.split('|').collect();
    if entries.len() > MAX_FACTORIES {
        return Err(shape(
            segment,
            format!("{} factories, at most {MAX_FACTORIES} allowed", entries.len()),
        ));
    }

    let mut factories = Factories {
        num_factories: entries.len() as u8,
        ..Factories::default()
    };
    for (i, (entry, factory)) in entries.iter().zip(factories.factories.iter_mut()).enumerate() {
        let slots = entry.chars().count();
        if slots == 0 || slots > FACTORY_CAPACITY {
            return Err(shape(
                segment,
                format!("factory {i} has {slots} slots, expected 1-{FACTORY_CAPACITY}"),
            ));
        }
        for symbol in entry.chars().filter(|&c| c != EMPTY_SYMBOL) {
            let color = color_symbol(symbol, segment)?;
            factory.counts[color as usize] += 1;
        }
    }

    Ok(factories)
}

fn decode_center(s: &str) -> Result<CenterPool, DecodeError> {
    let segment = Segment::Center;
    let mut center = CenterPool::default();
    if s.chars().eq([EMPTY_SYMBOL]) {
        return Ok(center);
    }
    if s.is_empty() {
        return Err(shape(segment, "empty center must be written as '-'"));
    }

    for symbol in s.chars() {
        if symbol == FIRST_PLAYER_SYMBOL {
            if center.first_player_marker_available {
                return Err(DecodeError::DuplicateMarker { count: 2 });
            }
            center.first_player_marker_available = true;
            continue;
        }
        let color = color_symbol(symbol, segment)?;
        let slot = &mut center.tiles.counts[color as usize];
        *slot = slot
            .checked_add(1)
            .ok_or_else(|| shape(segment, format!("too many {color} tiles")))?;
    }

    Ok(center)
}

fn decode_wall(s: &str, player: PlayerIdx) -> Result<Wall, DecodeError> {
    let segment = Segment::Wall(player);
    let rows: Vec<&str> = s.split('|').collect();
    if rows.len() != BOARD_SIZE {
        return Err(shape(
            segment,
            format!("expected {BOARD_SIZE} rows, found {}", rows.len()),
        ));
    }

    let mut wall: Wall = [[None; BOARD_SIZE]; BOARD_SIZE];
    for (r, row) in rows.iter().enumerate() {
        let cells: Vec<char> = row.chars().collect();
        if cells.len() != BOARD_SIZE {
            return Err(shape(
                segment,
                format!("row {} has {} cells, expected {BOARD_SIZE}", r + 1, cells.len()),
            ));
        }
        for (c, &symbol) in cells.iter().enumerate() {
            if symbol == EMPTY_SYMBOL {
                continue;
            }
            let color = color_symbol(symbol, segment)?;
            let expected = WALL_PATTERN[r][c];
            if color != expected {
                return Err(shape(
                    segment,
                    format!("cell ({}, {}) takes {expected}, found {color}", r + 1, c + 1),
                ));
            }
            wall[r][c] = Some(color);
        }
    }

    Ok(wall)
}

fn decode_pattern_lines(
    s: &str,
    player: PlayerIdx,
) -> Result<[PatternLine; BOARD_SIZE], DecodeError> {
    let segment = Segment::Pattern(player);
    let entries: Vec<&str> = s.split('|').collect();
    if entries.len() != BOARD_SIZE {
        return Err(shape(
            segment,
            format!("expected {BOARD_SIZE} lines, found {}", entries.len()),
        ));
    }

    let mut lines = [PatternLine::default(); BOARD_SIZE];
    for (r, (entry, line)) in entries.iter().zip(lines.iter_mut()).enumerate() {
        let capacity = line_capacity(r) as usize;
        if entry.chars().count() > capacity {
            return Err(shape(
                segment,
                format!("line {} is longer than its capacity of {capacity}", r + 1),
            ));
        }
        for symbol in entry.chars().filter(|&c| c != EMPTY_SYMBOL) {
            let color = color_symbol(symbol, segment)?;
            match line.color {
                Some(existing) if existing != color => {
                    return Err(shape(
                        segment,
                        format!("line {} mixes {existing} and {color}", r + 1),
                    ));
                }
                _ => {
                    line.color = Some(color);
                    line.count += 1;
                }
            }
        }
    }

    Ok(lines)
}

fn decode_floor(s: &str, player: PlayerIdx) -> Result<FloorLine, DecodeError> {
    let segment = Segment::Floor(player);
    if s.chars().eq([EMPTY_SYMBOL]) {
        return Ok(FloorLine::default());
    }

    let symbols: Vec<char> = s.chars().collect();
    if symbols.is_empty() || symbols.len() > FLOOR_CAPACITY {
        return Err(shape(
            segment,
            format!("{} slots, expected 1-{FLOOR_CAPACITY} or '-'", symbols.len()),
        ));
    }

    let mut floor = FloorLine::default();
    for (i, &symbol) in symbols.iter().enumerate() {
        let token = if symbol == FIRST_PLAYER_SYMBOL {
            if i != 0 {
                return Err(shape(segment, "first player marker must be the first slot"));
            }
            Token::FirstPlayerMarker
        } else {
            Token::Tile(color_symbol(symbol, segment)?)
        };
        floor.push(token);
    }

    Ok(floor)
}

fn decode_scores(s: &str) -> Result<[i16; NUM_PLAYERS], DecodeError> {
    let parts: Vec<&str> = s.split(',').collect();
    if parts.len() != NUM_PLAYERS {
        return Err(shape(
            Segment::Scores,
            format!("expected {NUM_PLAYERS} scores, found {}", parts.len()),
        ));
    }

    let mut scores = [0i16; NUM_PLAYERS];
    for (score, part) in scores.iter_mut().zip(parts) {
        *score = parse_number(part, Segment::Scores)?;
    }
    Ok(scores)
}

/// Parse a notation string against the standard supply of 20 tiles per color.
/// Never panics; every malformed input is a `DecodeError`.
pub fn decode(notation: &str) -> Result<Position, DecodeError> {
    decode_with_supply(notation, TILES_PER_COLOR)
}

/// Parse a notation string, rejecting tables holding more than `supply` tiles of a color
pub fn decode_with_supply(notation: &str, supply: u8) -> Result<Position, DecodeError> {
    let segments: Vec<&str> = notation.trim().split('/').collect();
    if segments.len() != SEGMENT_COUNT {
        return Err(DecodeError::SegmentCount {
            expected: SEGMENT_COUNT,
            found: segments.len(),
        });
    }

    let mut position = Position {
        factories: decode_factories(segments[0])?,
        center: decode_center(segments[1])?,
        ..Position::default()
    };

    for (p, player) in position.players.iter_mut().enumerate() {
        let base = 2 + 3 * p;
        let idx = p as PlayerIdx;
        player.wall = decode_wall(segments[base], idx)?;
        player.pattern_lines = decode_pattern_lines(segments[base + 1], idx)?;
        player.floor = decode_floor(segments[base + 2], idx)?;
    }

    let scores = decode_scores(segments[8])?;
    for (player, score) in position.players.iter_mut().zip(scores) {
        player.score = score;
    }

    position.round = parse_number(segments[9], Segment::Round)?;

    let current: PlayerIdx = parse_number(segments[10], Segment::CurrentPlayer)?;
    if current as usize >= NUM_PLAYERS {
        return Err(DecodeError::Number {
            segment: Segment::CurrentPlayer,
            value: segments[10].to_string(),
        });
    }
    position.current_player = current;

    let markers = usize::from(position.center.first_player_marker_available)
        + position
            .players
            .iter()
            .filter(|p| p.floor.has_first_player_marker())
            .count();
    if markers > 1 {
        return Err(DecodeError::DuplicateMarker { count: markers });
    }

    ConservationValidator::new(supply).check_position(&position)?;

    Ok(position)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConservationError;
    use crate::new_game;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const EMPTY_BOARD: &str = "-----|-----|-----|-----|-----/-|-|-|-|-/-";

    fn notation(factories: &str, center: &str, p1: &str, p2: &str, tail: &str) -> String {
        format!("{factories}/{center}/{p1}/{p2}/{tail}")
    }

    #[test]
    fn test_encode_fresh_table() {
        let mut position = Position::default();
        position.factories.factories[0] =
            TileSet::from_colors([Color::White, Color::Red, Color::Red, Color::Red]);

        assert_eq!(
            encode(&position),
            notation(
                "RRRW|----|----|----|----",
                "1",
                EMPTY_BOARD,
                EMPTY_BOARD,
                "0,0/0/0"
            )
        );
    }

    #[test]
    fn test_encode_mid_round() {
        let mut position = Position::default();
        position.factories.num_factories = 2;
        position.factories.factories[1] = TileSet::from_colors([Color::Blue, Color::Black]);
        position.center.first_player_marker_available = false;
        position.center.tiles = TileSet::from_colors([Color::Yellow, Color::Yellow]);
        position.players[0].wall[1][1] = Some(Color::Blue);
        position.players[0].pattern_lines[3] = PatternLine {
            color: Some(Color::Red),
            count: 2,
        };
        position.players[0].floor =
            FloorLine::from_tokens(&[Token::FirstPlayerMarker, Token::Tile(Color::White)]);
        position.players[0].score = 12;
        position.players[1].score = -3;
        position.round = 4;
        position.current_player = 1;

        assert_eq!(
            encode(&position),
            "----|BK--/YY/-----|-B---|-----|-----|-----/-|-|-|RR|-/1W/\
             -----|-----|-----|-----|-----/-|-|-|-|-/-/12,-3/4/1"
        );
    }

    #[test]
    fn test_decode_reads_unordered_factories() {
        let position = decode(&notation(
            "WRRR|--",
            "1KK",
            EMPTY_BOARD,
            EMPTY_BOARD,
            "0,0/1/0",
        ))
        .unwrap();

        assert_eq!(position.factories.num_factories, 2);
        assert_eq!(position.factories.factories[0].count(Color::Red), 3);
        assert_eq!(position.factories.factories[0].count(Color::White), 1);
        assert!(position.factories.factories[1].is_empty());
        assert_eq!(position.center.tiles.count(Color::Black), 2);
        assert!(position.center.first_player_marker_available);
        assert_eq!(position.round, 1);
    }

    #[test]
    fn test_round_trip_of_played_positions() {
        let mut rng = StdRng::seed_from_u64(2024);
        let mut position = new_game(0, &mut rng);
        for _ in 0..12 {
            assert_eq!(decode(&encode(&position)).unwrap(), position);
            let moves = crate::legal_moves(&position);
            let Some(mv) = moves.first() else { break };
            position = crate::apply_move(&position, mv).unwrap();
            position.current_player = 1 - position.current_player;
        }
    }

    #[test]
    fn test_wall_missing_row() {
        let err = decode(&notation(
            "--|--|--|--|--",
            "-",
            "-----|-----|-----|-----/-|-|-|-|-/-",
            EMPTY_BOARD,
            "0,0/0/0",
        ))
        .unwrap_err();
        assert!(matches!(
            err,
            DecodeError::Shape {
                segment: Segment::Wall(0),
                ..
            }
        ));
    }

    #[test]
    fn test_wall_row_too_short() {
        let err = decode(&notation(
            "----",
            "-",
            EMPTY_BOARD,
            "-----|----|-----|-----|-----/-|-|-|-|-/-",
            "0,0/0/0",
        ))
        .unwrap_err();
        assert!(matches!(
            err,
            DecodeError::Shape {
                segment: Segment::Wall(1),
                ..
            }
        ));
    }

    #[test]
    fn test_wall_color_must_match_pattern() {
        let err = decode(&notation(
            "----",
            "-",
            "R----|-----|-----|-----|-----/-|-|-|-|-/-",
            EMPTY_BOARD,
            "0,0/0/0",
        ))
        .unwrap_err();
        assert!(err.to_string().contains("takes B"));
    }

    #[test]
    fn test_pattern_line_shape_errors() {
        for pattern in ["RR|-|-|-|-", "-|RB|-|-|-", "-|-|-|-", "-|-|X|-|-"] {
            let p1 = format!("-----|-----|-----|-----|-----/{pattern}/-");
            let result = decode(&notation("----", "-", &p1, EMPTY_BOARD, "0,0/0/0"));
            assert!(
                matches!(
                    result,
                    Err(DecodeError::Shape {
                        segment: Segment::Pattern(0),
                        ..
                    })
                ),
                "pattern '{pattern}' should be rejected"
            );
        }
    }

    #[test]
    fn test_floor_errors() {
        for floor in ["RRRRRRRR", "R1", ""] {
            let p1 = format!("-----|-----|-----|-----|-----/-|-|-|-|-/{floor}");
            let result = decode(&notation("----", "-", &p1, EMPTY_BOARD, "0,0/0/0"));
            assert!(
                matches!(
                    result,
                    Err(DecodeError::Shape {
                        segment: Segment::Floor(0),
                        ..
                    })
                ),
                "floor '{floor}' should be rejected"
            );
        }
    }

    #[test]
    fn test_marker_cannot_be_in_two_places() {
        let p1 = "-----|-----|-----|-----|-----/-|-|-|-|-/1";
        let err = decode(&notation("----", "1R", p1, EMPTY_BOARD, "0,0/0/0")).unwrap_err();
        assert_eq!(err, DecodeError::DuplicateMarker { count: 2 });
    }

    #[test]
    fn test_number_errors() {
        let err = decode(&notation("----", "-", EMPTY_BOARD, EMPTY_BOARD, "0,x/0/0")).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::Number {
                segment: Segment::Scores,
                ..
            }
        ));

        let err = decode(&notation("----", "-", EMPTY_BOARD, EMPTY_BOARD, "0,0/-1/0")).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::Number {
                segment: Segment::Round,
                ..
            }
        ));

        let err = decode(&notation("----", "-", EMPTY_BOARD, EMPTY_BOARD, "0,0/0/2")).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::Number {
                segment: Segment::CurrentPlayer,
                ..
            }
        ));

        let err = decode(&notation("----", "-", EMPTY_BOARD, EMPTY_BOARD, "0/0/0")).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::Shape {
                segment: Segment::Scores,
                ..
            }
        ));
    }

    #[test]
    fn test_segment_count() {
        assert_eq!(
            decode(""),
            Err(DecodeError::SegmentCount {
                expected: 11,
                found: 1,
            })
        );
        assert!(matches!(
            decode("----/-/-/-"),
            Err(DecodeError::SegmentCount { found: 4, .. })
        ));
    }

    #[test]
    fn test_factory_errors() {
        for factories in ["RRRRR", "R||R", "RRQ-", "-|-|-|-|-|-|-|-|-|-"] {
            let result = decode(&notation(factories, "-", EMPTY_BOARD, EMPTY_BOARD, "0,0/0/0"));
            assert!(
                matches!(
                    result,
                    Err(DecodeError::Shape {
                        segment: Segment::Factories,
                        ..
                    })
                ),
                "factories '{factories}' should be rejected"
            );
        }
    }

    #[test]
    fn test_center_overflow_is_an_error_not_a_panic() {
        let center = "R".repeat(300);
        let result = decode(&notation("----", &center, EMPTY_BOARD, EMPTY_BOARD, "0,0/0/0"));
        assert!(matches!(
            result,
            Err(DecodeError::Shape {
                segment: Segment::Center,
                ..
            })
        ));
    }

    #[test]
    fn test_decode_rejects_tiles_beyond_supply() {
        let center = "R".repeat(21);
        let text = notation("----", &center, EMPTY_BOARD, EMPTY_BOARD, "0,0/0/0");
        assert_eq!(
            decode(&text).unwrap_err(),
            DecodeError::Supply(ConservationError::OverSupply {
                color: Color::Red,
                total: 21,
                supply: TILES_PER_COLOR,
            })
        );

        // 255 in the center still fits a u8, the factory red pushes it past any supply
        let center = "R".repeat(255);
        let result = decode(&notation("RB--", &center, EMPTY_BOARD, EMPTY_BOARD, "0,0/0/0"));
        assert!(matches!(result, Err(DecodeError::Supply(_))));

        let text = notation("----", &center, EMPTY_BOARD, EMPTY_BOARD, "0,0/0/0");
        assert!(decode_with_supply(&text, u8::MAX).is_ok());
    }

    #[test]
    fn test_zero_factories_round_trip() {
        let mut position = Position::default();
        position.factories.num_factories = 0;
        position.center.tiles = TileSet::from_colors([Color::Blue]);

        let text = encode(&position);
        assert_eq!(text, notation("-", "1B", EMPTY_BOARD, EMPTY_BOARD, "0,0/0/0"));
        assert_eq!(decode(&text).unwrap(), position);

        // a lone empty factory is still written with its four slots
        position.factories.num_factories = 1;
        let text = encode(&position);
        assert!(text.starts_with("----/"));
        assert_eq!(decode(&text).unwrap(), position);
    }

    #[test]
    fn test_display_and_from_str_agree() {
        let position = new_game(1, &mut StdRng::seed_from_u64(8));
        let text = position.to_string();
        assert_eq!(text, encode(&position));
        assert_eq!(text.parse::<Position>().unwrap(), position);
    }
}
