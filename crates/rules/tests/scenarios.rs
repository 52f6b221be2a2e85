use azul_rules::{
    apply_edit, apply_move, decode, encode, validate_edit, Color, DecodeError, DraftDestination,
    DraftSource, Edit, EditReason, Move, PatternLine, Position, RulesConfig, Session, TileSet,
    Token,
};

#[test]
fn factory_draft_fills_line_and_moves_leftovers() {
    let mut position = Position::default();
    position.factories.factories[0] =
        TileSet::from_colors([Color::Red, Color::Red, Color::Red, Color::White]);

    let mv = Move {
        source: DraftSource::Factory(0),
        color: Color::Red,
        dest: DraftDestination::PatternLine(2),
        to_pattern_line: 3,
        to_floor: 0,
    };
    let next = apply_move(&position, &mv).unwrap();

    assert_eq!(
        next.players[0].pattern_lines[2],
        PatternLine {
            color: Some(Color::Red),
            count: 3,
        }
    );
    assert!(next.players[0].floor.tokens().is_empty());
    assert_eq!(next.center.tiles, TileSet::from_colors([Color::White]));
    assert!(next.factories.factories[0].is_empty());
}

#[test]
fn center_draft_takes_first_player_marker() {
    let mut position = Position::default();
    position.center.tiles = TileSet::from_colors([Color::Black, Color::Black]);

    let mv = Move {
        source: DraftSource::Center,
        color: Color::Black,
        dest: DraftDestination::Floor,
        to_pattern_line: 0,
        to_floor: 2,
    };
    let next = apply_move(&position, &mv).unwrap();

    assert_eq!(
        next.players[0].floor.tokens(),
        &[
            Token::FirstPlayerMarker,
            Token::Tile(Color::Black),
            Token::Tile(Color::Black),
        ]
    );
    assert!(next.first_player_taken());
    assert!(encode(&next).contains("/1KK/"));
}

#[test]
fn edit_with_conflicting_color_is_rejected() {
    let mut position = Position::default();
    position.players[0].pattern_lines[0] = PatternLine {
        color: Some(Color::Blue),
        count: 1,
    };

    let err = validate_edit(
        &position,
        &Edit::SetPatternLine {
            player: 0,
            row: 0,
            color: Some(Color::Yellow),
            count: 1,
        },
    )
    .unwrap_err();

    assert!(matches!(err.reason, EditReason::ColorConflict { .. }));
    assert!(apply_edit(
        &position,
        &Edit::SetPatternLine {
            player: 0,
            row: 0,
            color: Some(Color::Yellow),
            count: 1,
        }
    )
    .is_err());
}

#[test]
fn two_undos_after_three_edits_return_to_first_edit() {
    let mut session = Session::new(Position::default(), RulesConfig::default());
    let edits = [
        Edit::SetPatternLine {
            player: 0,
            row: 1,
            color: Some(Color::Red),
            count: 2,
        },
        Edit::SetFactory {
            factory: 3,
            tiles: TileSet::from_colors([Color::Blue, Color::Yellow]),
        },
        Edit::PlaceWallTile {
            player: 1,
            row: 4,
            col: 4,
            color: Color::Blue,
        },
    ];

    session.edit(&edits[0]).unwrap();
    let after_first = session.position().clone();
    session.edit(&edits[1]).unwrap();
    session.edit(&edits[2]).unwrap();

    assert!(session.undo());
    assert!(session.undo());
    assert_eq!(session.position(), &after_first);
    assert_eq!(session.notation(), encode(&after_first));
}

#[test]
fn wall_missing_a_row_fails_to_decode() {
    let notation = "----|----|----|----|----/-/-----|-----|-----|-----/-|-|-|-|-/-/\
                    -----|-----|-----|-----|-----/-|-|-|-|-/-/0,0/0/0";

    let err = decode(notation).unwrap_err();
    assert!(matches!(err, DecodeError::Shape { .. }));
}

#[test]
fn garbage_never_panics() {
    for input in ["", "/", "//////////", "x/y/z", "🦀", "1/1/1/1/1/1/1/1/1/1/1"] {
        assert!(decode(input).is_err(), "{input:?} should not decode");
    }
}
