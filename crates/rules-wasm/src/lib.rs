use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use wasm_bindgen::prelude::*;

use azul_rules::{
    legal_moves, new_game, Color, DraftDestination, DraftSource, Edit, Move, Position,
    RulesConfig, Session, SessionError, Token, NUM_PLAYERS,
};

fn color_slug(color: Color) -> &'static str {
    match color {
        Color::Blue => "blue",
        Color::Yellow => "amber",
        Color::Red => "rose",
        Color::Black => "zinc",
        Color::White => "slate",
    }
}

fn token_slug(token: Token) -> &'static str {
    match token {
        Token::Tile(color) => color_slug(color),
        Token::FirstPlayerMarker => "origin",
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum SourceView {
    Factory { index: u8 },
    Center,
}

impl From<DraftSource> for SourceView {
    fn from(source: DraftSource) -> Self {
        match source {
            DraftSource::Factory(index) => SourceView::Factory { index },
            DraftSource::Center => SourceView::Center,
        }
    }
}

impl From<SourceView> for DraftSource {
    fn from(view: SourceView) -> Self {
        match view {
            SourceView::Factory { index } => DraftSource::Factory(index),
            SourceView::Center => DraftSource::Center,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum DestView {
    Pattern { row: u8 },
    Floor,
}

impl From<DraftDestination> for DestView {
    fn from(dest: DraftDestination) -> Self {
        match dest {
            DraftDestination::PatternLine(row) => DestView::Pattern { row },
            DraftDestination::Floor => DestView::Floor,
        }
    }
}

impl From<DestView> for DraftDestination {
    fn from(view: DestView) -> Self {
        match view {
            DestView::Pattern { row } => DraftDestination::PatternLine(row),
            DestView::Floor => DraftDestination::Floor,
        }
    }
}

/// Move as sent by the board UI. Without a split the admissible one is used.
#[derive(Deserialize, Debug)]
struct MoveInput {
    source: SourceView,
    color: Color,
    dest: DestView,
    #[serde(default)]
    to_pattern_line: Option<u8>,
    #[serde(default)]
    to_floor: Option<u8>,
}

#[derive(Serialize)]
struct MoveDetail {
    label: String,
    source: SourceView,
    color: String,
    dest: DestView,
    to_pattern_line: u8,
    to_floor: u8,
}

#[derive(Serialize)]
struct PatternLineView {
    color: Option<String>,
    count: u8,
    capacity: u8,
}

#[derive(Serialize)]
struct PlayerView {
    pattern_lines: Vec<PatternLineView>,
    wall: Vec<Vec<Option<String>>>,
    floor: Vec<String>,
    score: i16,
}

#[derive(Serialize)]
struct BoardView {
    notation: String,
    current_player: u8,
    round: u16,
    factories: Vec<Vec<String>>,
    center: Vec<String>,
    has_origin: bool,
    players: Vec<PlayerView>,
    can_undo: bool,
    can_redo: bool,
}

/// Error payload handed to the UI; edits carry a suggested fix
#[derive(Serialize, Debug)]
struct ErrorView {
    message: String,
    suggested_fix: Option<String>,
}

impl From<SessionError> for ErrorView {
    fn from(err: SessionError) -> Self {
        let suggested_fix = match &err {
            SessionError::Edit(edit) => Some(edit.suggested_fix.clone()),
            _ => None,
        };
        ErrorView {
            message: err.to_string(),
            suggested_fix,
        }
    }
}

fn to_js_error(err: impl Into<ErrorView>) -> JsValue {
    let view = err.into();
    serde_wasm_bindgen::to_value(&view).unwrap_or_else(|_| JsValue::from_str(&view.message))
}

fn board_view(session: &Session) -> BoardView {
    let position = session.position();

    let factories = position
        .factories
        .active()
        .iter()
        .map(|factory| factory.iter().map(|c| color_slug(c).to_string()).collect())
        .collect();

    let center = position
        .center
        .tiles
        .iter()
        .map(|c| color_slug(c).to_string())
        .collect();

    let players = position
        .players
        .iter()
        .map(|player| PlayerView {
            pattern_lines: player
                .pattern_lines
                .iter()
                .enumerate()
                .map(|(r, line)| PatternLineView {
                    color: line.color.map(|c| color_slug(c).to_string()),
                    count: line.count,
                    capacity: azul_rules::line_capacity(r),
                })
                .collect(),
            wall: player
                .wall
                .iter()
                .map(|row| {
                    row.iter()
                        .map(|cell| cell.map(|c| color_slug(c).to_string()))
                        .collect()
                })
                .collect(),
            floor: player
                .floor
                .tokens()
                .iter()
                .map(|&t| token_slug(t).to_string())
                .collect(),
            score: player.score,
        })
        .collect();

    BoardView {
        notation: session.notation().to_string(),
        current_player: position.current_player,
        round: position.round,
        factories,
        center,
        has_origin: position.center.first_player_marker_available,
        players,
        can_undo: session.can_undo(),
        can_redo: session.can_redo(),
    }
}

fn move_details(position: &Position) -> Vec<MoveDetail> {
    legal_moves(position)
        .into_iter()
        .map(|mv| MoveDetail {
            label: mv.to_string(),
            source: mv.source.into(),
            color: color_slug(mv.color).to_string(),
            dest: mv.dest.into(),
            to_pattern_line: mv.to_pattern_line,
            to_floor: mv.to_floor,
        })
        .collect()
}

#[wasm_bindgen]
pub struct BoardHandle {
    session: Session,
}

/// Deal a fresh board from a seed
#[wasm_bindgen]
pub fn new_board(seed: u64, starting_player: u8) -> Result<BoardHandle, JsValue> {
    if starting_player as usize >= NUM_PLAYERS {
        return Err(JsValue::from_str("starting player must be 0 or 1"));
    }
    let mut rng = StdRng::seed_from_u64(seed);
    let position = new_game(starting_player, &mut rng);
    Ok(BoardHandle {
        session: Session::new(position, RulesConfig::default()),
    })
}

/// Open a board from notation, e.g. one pasted by the user
#[wasm_bindgen]
pub fn board_from_notation(notation: &str) -> Result<BoardHandle, JsValue> {
    Session::from_notation(notation, RulesConfig::default())
        .map(|session| BoardHandle { session })
        .map_err(to_js_error)
}

impl BoardHandle {
    fn play(&mut self, input: MoveInput) -> Result<(), SessionError> {
        let source = input.source.into();
        let dest = input.dest.into();
        let mv = match (input.to_pattern_line, input.to_floor) {
            (Some(to_pattern_line), Some(to_floor)) => Move {
                source,
                color: input.color,
                dest,
                to_pattern_line,
                to_floor,
            },
            _ => Move::plan(self.session.position(), source, input.color, dest)?,
        };
        self.session.apply_move(&mv)?;
        Ok(())
    }
}

#[wasm_bindgen]
impl BoardHandle {
    #[wasm_bindgen]
    pub fn notation(&self) -> String {
        self.session.notation().to_string()
    }

    #[wasm_bindgen]
    pub fn current_player(&self) -> u8 {
        self.session.position().current_player
    }

    #[wasm_bindgen]
    pub fn round(&self) -> u16 {
        self.session.position().round
    }

    #[wasm_bindgen]
    pub fn scores(&self) -> Vec<i16> {
        self.session
            .position()
            .players
            .iter()
            .map(|p| p.score)
            .collect()
    }

    #[wasm_bindgen]
    pub fn legal_move_strings(&self) -> Vec<String> {
        legal_moves(self.session.position())
            .iter()
            .map(Move::to_string)
            .collect()
    }

    #[wasm_bindgen]
    pub fn legal_move_details(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(&move_details(self.session.position()))
            .map_err(|e| JsValue::from_str(&format!("Failed to serialize moves: {e}")))
    }

    #[wasm_bindgen]
    pub fn state_view(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(&board_view(&self.session))
            .map_err(|e| JsValue::from_str(&format!("Failed to serialize board: {e}")))
    }

    /// Apply `{ source, color, dest, to_pattern_line?, to_floor? }` and return the new view
    #[wasm_bindgen]
    pub fn apply_move(&mut self, input: JsValue) -> Result<JsValue, JsValue> {
        let input: MoveInput = serde_wasm_bindgen::from_value(input)
            .map_err(|e| JsValue::from_str(&format!("Malformed move: {e}")))?;
        self.play(input).map_err(to_js_error)?;
        self.state_view()
    }

    /// Apply a manual edit and return the new view
    #[wasm_bindgen]
    pub fn edit(&mut self, edit: JsValue) -> Result<JsValue, JsValue> {
        let edit: Edit = serde_wasm_bindgen::from_value(edit)
            .map_err(|e| JsValue::from_str(&format!("Malformed edit: {e}")))?;
        self.session.edit(&edit).map_err(to_js_error)?;
        self.state_view()
    }

    /// Replace the board with a notation string (undoable)
    #[wasm_bindgen]
    pub fn load(&mut self, notation: &str) -> Result<(), JsValue> {
        self.session.load(notation).map_err(to_js_error)?;
        Ok(())
    }

    #[wasm_bindgen]
    pub fn undo(&mut self) -> bool {
        self.session.undo()
    }

    #[wasm_bindgen]
    pub fn redo(&mut self) -> bool {
        self.session.redo()
    }

    #[wasm_bindgen]
    pub fn can_undo(&self) -> bool {
        self.session.can_undo()
    }

    #[wasm_bindgen]
    pub fn can_redo(&self) -> bool {
        self.session.can_redo()
    }
}
