//! Azul Rules Core
//!
//! Position model and pure rule functions for a two-player Azul board: drafting
//! moves, manual board edits, tile conservation, the text notation and bounded
//! undo history. The core object is a single `Position` (plain data). Rules are
//! free functions that borrow a position and hand back a new one.

use std::fmt;
use std::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Serialize};

mod apply;
mod config;
mod conservation;
mod edit;
mod error;
mod history;
mod notation;
mod session;

pub use apply::{apply_move, legal_moves};
pub use config::{ConfigError, RulesConfig};
pub use conservation::{off_table_counts, tile_counts, ConservationValidator, ContainerRef};
pub use edit::{apply_edit, validate_edit, Edit, EditValidator};
pub use error::{ConservationError, DecodeError, EditError, EditReason, MoveError, Segment};
pub use history::{History, DEFAULT_HISTORY_CAPACITY};
pub use notation::{decode, decode_with_supply, encode};
pub use session::{AnalysisEngine, Confirmation, RemoteError, Session, SessionError, Verdict};

// =============================================================================
// Section 1: Basic types and constants
// =============================================================================

/// Index into the players array: 0..NUM_PLAYERS-1
pub type PlayerIdx = u8;

/// Row index (0..=4)
pub type Row = u8;

/// Column index (0..=4)
pub type Col = u8;

pub const BOARD_SIZE: usize = 5;
pub const NUM_PLAYERS: usize = 2;
pub const MAX_FACTORIES: usize = 9;
pub const FACTORIES_PER_GAME: usize = 5;
pub const FACTORY_CAPACITY: usize = 4;
pub const FLOOR_CAPACITY: usize = 7;
pub const TILE_COLORS: usize = 5;
pub const TILES_PER_COLOR: u8 = 20;

/// Notation symbol for an absent tile
pub const EMPTY_SYMBOL: char = '-';

/// Notation symbol for the first-player marker
pub const FIRST_PLAYER_SYMBOL: char = '1';

/// Tile colors (order fixed for serialization)
#[repr(u8)]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum Color {
    Blue = 0,
    Yellow = 1,
    Red = 2,
    Black = 3,
    White = 4,
}

impl Color {
    /// Convert from u8 index to Color
    pub fn from_index(idx: u8) -> Option<Color> {
        match idx {
            0 => Some(Color::Blue),
            1 => Some(Color::Yellow),
            2 => Some(Color::Red),
            3 => Some(Color::Black),
            4 => Some(Color::White),
            _ => None,
        }
    }

    /// Single-character notation symbol
    pub fn symbol(self) -> char {
        match self {
            Color::Blue => 'B',
            Color::Yellow => 'Y',
            Color::Red => 'R',
            Color::Black => 'K',
            Color::White => 'W',
        }
    }

    pub fn from_symbol(symbol: char) -> Option<Color> {
        match symbol {
            'B' => Some(Color::Blue),
            'Y' => Some(Color::Yellow),
            'R' => Some(Color::Red),
            'K' => Some(Color::Black),
            'W' => Some(Color::White),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Color::Blue => "blue",
            Color::Yellow => "yellow",
            Color::Red => "red",
            Color::Black => "black",
            Color::White => "white",
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

impl FromStr for Color {
    type Err = String;

    /// Accepts a notation symbol (`R`) or a color name (`red`)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            if let Some(color) = Color::from_symbol(c.to_ascii_uppercase()) {
                return Ok(color);
            }
        }
        ALL_COLORS
            .into_iter()
            .find(|color| color.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown tile color '{s}'"))
    }
}

pub const ALL_COLORS: [Color; TILE_COLORS] = [
    Color::Blue,
    Color::Yellow,
    Color::Red,
    Color::Black,
    Color::White,
];

// =============================================================================
// Section 2: Wall layout constants
// =============================================================================

/// Wall pattern: WALL_PATTERN[row][col] = Color expected at that cell.
/// Each row is the row above shifted one column to the right.
pub const WALL_PATTERN: [[Color; BOARD_SIZE]; BOARD_SIZE] = [
    // row 0
    [
        Color::Blue,
        Color::Yellow,
        Color::Red,
        Color::Black,
        Color::White,
    ],
    // row 1
    [
        Color::White,
        Color::Blue,
        Color::Yellow,
        Color::Red,
        Color::Black,
    ],
    // row 2
    [
        Color::Black,
        Color::White,
        Color::Blue,
        Color::Yellow,
        Color::Red,
    ],
    // row 3
    [
        Color::Red,
        Color::Black,
        Color::White,
        Color::Blue,
        Color::Yellow,
    ],
    // row 4
    [
        Color::Yellow,
        Color::Red,
        Color::Black,
        Color::White,
        Color::Blue,
    ],
];

/// Destination column lookup: WALL_DEST_COL[row][color_index] => col
pub const WALL_DEST_COL: [[u8; TILE_COLORS]; BOARD_SIZE] = [
    // row 0: Blue=0, Yellow=1, Red=2, Black=3, White=4
    [0, 1, 2, 3, 4],
    // row 1: White=0, Blue=1, Yellow=2, Red=3, Black=4
    [1, 2, 3, 4, 0],
    // row 2: Black=0, White=1, Blue=2, Yellow=3, Red=4
    [2, 3, 4, 0, 1],
    // row 3: Red=0, Black=1, White=2, Blue=3, Yellow=4
    [3, 4, 0, 1, 2],
    // row 4: Yellow=0, Red=1, Black=2, White=3, Blue=4
    [4, 0, 1, 2, 3],
];

/// Capacity of pattern line `row` (row index + 1)
pub fn line_capacity(row: usize) -> u8 {
    (row + 1) as u8
}

// =============================================================================
// Section 3: Factory and Center data structures
// =============================================================================

/// Unordered multiset of colored tiles, stored as per-color counts
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct TileSet {
    pub counts: [u8; TILE_COLORS],
}

impl TileSet {
    pub fn from_colors(colors: impl IntoIterator<Item = Color>) -> Self {
        let mut set = TileSet::default();
        for color in colors {
            let slot = &mut set.counts[color as usize];
            *slot = slot.saturating_add(1);
        }
        set
    }

    pub fn count(&self, color: Color) -> u8 {
        self.counts[color as usize]
    }

    pub fn len(&self) -> usize {
        self.counts.iter().map(|&c| c as usize).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.iter().all(|&c| c == 0)
    }

    /// Remove every tile of `color`, returning how many were taken
    pub fn take_all(&mut self, color: Color) -> u8 {
        std::mem::take(&mut self.counts[color as usize])
    }

    /// Tiles in canonical color order
    pub fn iter(&self) -> impl Iterator<Item = Color> + '_ {
        ALL_COLORS
            .into_iter()
            .flat_map(move |color| std::iter::repeat_n(color, self.count(color) as usize))
    }
}

/// All factories (max 9; only first `num_factories` valid, the rest stay empty)
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Factories {
    pub num_factories: u8,
    pub factories: [TileSet; MAX_FACTORIES],
}

impl Default for Factories {
    fn default() -> Self {
        Factories {
            num_factories: FACTORIES_PER_GAME as u8,
            factories: [TileSet::default(); MAX_FACTORIES],
        }
    }
}

impl Factories {
    pub fn active(&self) -> &[TileSet] {
        &self.factories[..self.num_factories as usize]
    }

    pub fn get(&self, index: u8) -> Option<&TileSet> {
        self.active().get(index as usize)
    }

    pub fn get_mut(&mut self, index: u8) -> Option<&mut TileSet> {
        let n = self.num_factories as usize;
        self.factories[..n].get_mut(index as usize)
    }
}

/// Center pool: loose tiles plus the one-shot first player marker
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct CenterPool {
    pub tiles: TileSet,
    /// True at round start; cleared for good once someone drafts from the center
    pub first_player_marker_available: bool,
}

/// Token on a floor line
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum Token {
    Tile(Color),
    FirstPlayerMarker,
}

impl Token {
    pub fn symbol(self) -> char {
        match self {
            Token::Tile(color) => color.symbol(),
            Token::FirstPlayerMarker => FIRST_PLAYER_SYMBOL,
        }
    }
}

// =============================================================================
// Section 4: Player board structures
// =============================================================================

/// A single pattern line (one of 5 rows, capacities 1-5)
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct PatternLine {
    pub color: Option<Color>, // None => empty; Some(c) => all tiles are c
    pub count: u8,            // 0..=capacity(row_index)
}

impl PatternLine {
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Number of tiles of `color` staged on this line
    pub fn count_of(&self, color: Color) -> u8 {
        if self.color == Some(color) {
            self.count
        } else {
            0
        }
    }
}

/// Wall: 5x5 grid, each cell either empty (None) or holding its pattern color
pub type Wall = [[Option<Color>; BOARD_SIZE]; BOARD_SIZE];

/// Floor line: ordered physical slots; only `slots[..len]` are meaningful
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FloorLine {
    pub len: u8,
    pub slots: [Token; FLOOR_CAPACITY],
}

impl Default for FloorLine {
    fn default() -> Self {
        FloorLine {
            len: 0,
            slots: [Token::Tile(Color::Blue); FLOOR_CAPACITY], // placeholder
        }
    }
}

impl PartialEq for FloorLine {
    fn eq(&self, other: &Self) -> bool {
        self.tokens() == other.tokens()
    }
}

impl Eq for FloorLine {}

impl FloorLine {
    pub fn from_tokens(tokens: &[Token]) -> Self {
        let mut floor = FloorLine::default();
        for &token in tokens {
            floor.push(token);
        }
        floor
    }

    pub fn tokens(&self) -> &[Token] {
        &self.slots[..self.len as usize]
    }

    pub fn is_full(&self) -> bool {
        self.len as usize >= FLOOR_CAPACITY
    }

    /// Append a token; returns false when the line is full and the token is discarded
    pub fn push(&mut self, token: Token) -> bool {
        if self.is_full() {
            return false;
        }
        self.slots[self.len as usize] = token;
        self.len += 1;
        true
    }

    /// Insert a token in the first slot. Returns the token pushed off the end, if any.
    pub fn prepend(&mut self, token: Token) -> Option<Token> {
        let dropped = if self.is_full() {
            self.len -= 1;
            Some(self.slots[self.len as usize])
        } else {
            None
        };
        self.slots.copy_within(0..self.len as usize, 1);
        self.slots[0] = token;
        self.len += 1;
        dropped
    }

    pub fn count_of(&self, color: Color) -> u8 {
        self.tokens()
            .iter()
            .filter(|&&t| t == Token::Tile(color))
            .count() as u8
    }

    pub fn has_first_player_marker(&self) -> bool {
        self.tokens().contains(&Token::FirstPlayerMarker)
    }
}

/// Complete board for one player
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct PlayerBoard {
    pub wall: Wall,
    pub pattern_lines: [PatternLine; BOARD_SIZE],
    pub floor: FloorLine,
    /// Maintained by the external scoring collaborator; carried, never computed here
    pub score: i16,
}

impl PlayerBoard {
    /// True if `color` already sits on the wall in `row`
    pub fn wall_row_has(&self, row: usize, color: Color) -> bool {
        let col = WALL_DEST_COL[row][color as usize] as usize;
        self.wall[row][col].is_some()
    }
}

// =============================================================================
// Section 5: Top-level Position
// =============================================================================

/// Complete, self-contained snapshot of the table
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub factories: Factories,
    pub center: CenterPool,
    pub players: [PlayerBoard; NUM_PLAYERS],
    pub round: u16,
    /// Whose turn it is
    pub current_player: PlayerIdx,
}

impl Default for Position {
    fn default() -> Self {
        Position {
            factories: Factories::default(),
            center: CenterPool {
                tiles: TileSet::default(),
                first_player_marker_available: true,
            },
            players: std::array::from_fn(|_| PlayerBoard::default()),
            round: 0,
            current_player: 0,
        }
    }
}

impl Position {
    /// Whether the first player marker has left the center this round
    pub fn first_player_taken(&self) -> bool {
        !self.center.first_player_marker_available
    }

    pub fn player(&self, idx: PlayerIdx) -> Option<&PlayerBoard> {
        self.players.get(idx as usize)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&encode(self))
    }
}

impl FromStr for Position {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        decode(s)
    }
}

// =============================================================================
// Section 6: Move representation
// =============================================================================

/// Source of tiles for drafting
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum DraftSource {
    Factory(u8), // index 0..num_factories-1
    Center,
}

impl fmt::Display for DraftSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DraftSource::Factory(i) => write!(f, "F{i}"),
            DraftSource::Center => f.write_str("C"),
        }
    }
}

impl FromStr for DraftSource {
    type Err = String;

    /// `F0`..`F8` or `C` / `center`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("c") || s.eq_ignore_ascii_case("center") {
            return Ok(DraftSource::Center);
        }
        s.strip_prefix(&['F', 'f'][..])
            .and_then(|idx| idx.parse::<u8>().ok())
            .map(DraftSource::Factory)
            .ok_or_else(|| format!("invalid source '{s}' (expected F<index> or C)"))
    }
}

/// Destination for drafted tiles
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum DraftDestination {
    PatternLine(Row), // 0..4
    Floor,
}

impl fmt::Display for DraftDestination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DraftDestination::PatternLine(r) => write!(f, "L{}", r + 1),
            DraftDestination::Floor => f.write_str("Floor"),
        }
    }
}

impl FromStr for DraftDestination {
    type Err = String;

    /// `L1`..`L5` (1-based, as printed) or `floor`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("floor") {
            return Ok(DraftDestination::Floor);
        }
        s.strip_prefix(&['L', 'l'][..])
            .and_then(|n| n.parse::<u8>().ok())
            .filter(|n| (1..=BOARD_SIZE as u8).contains(n))
            .map(|n| DraftDestination::PatternLine(n - 1))
            .ok_or_else(|| format!("invalid destination '{s}' (expected L1-L5 or floor)"))
    }
}

/// A drafted move: every tile of `color` at `source`, split between the
/// destination pattern line and the floor by the caller.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Move {
    pub source: DraftSource,
    pub color: Color,
    pub dest: DraftDestination,
    pub to_pattern_line: u8,
    pub to_floor: u8,
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} -> {} ({}+{})",
            self.source, self.color, self.dest, self.to_pattern_line, self.to_floor
        )
    }
}

// =============================================================================
// Section 7: Game setup
// =============================================================================

/// Draw a single random tile from the off-table supply.
/// Returns None if every tile is already on the table.
fn draw_tile(supply: &mut [u8; TILE_COLORS], rng: &mut impl Rng) -> Option<Color> {
    let total: u32 = supply.iter().map(|&c| c as u32).sum();
    if total == 0 {
        return None;
    }

    let mut pick = rng.random_range(0..total);
    for (i, count) in supply.iter_mut().enumerate() {
        if pick < *count as u32 {
            *count -= 1;
            return Color::from_index(i as u8);
        }
        pick -= *count as u32;
    }

    None
}

/// Fresh position for the start of a game: five factories of four tiles drawn
/// from the full supply and the first player marker waiting in the center.
pub fn new_game(starting_player: PlayerIdx, rng: &mut impl Rng) -> Position {
    assert!(
        (starting_player as usize) < NUM_PLAYERS,
        "Invalid starting player"
    );

    let mut position = Position {
        current_player: starting_player,
        ..Position::default()
    };

    let mut supply = [TILES_PER_COLOR; TILE_COLORS];
    for factory in &mut position.factories.factories[..FACTORIES_PER_GAME] {
        for _ in 0..FACTORY_CAPACITY {
            if let Some(color) = draw_tile(&mut supply, rng) {
                factory.counts[color as usize] += 1;
            }
        }
    }

    position
}

// =============================================================================
// Debug assertions for invariants
// =============================================================================

#[cfg(debug_assertions)]
pub fn assert_position_invariants(position: &Position) {
    let totals = tile_counts(position);
    for color in ALL_COLORS {
        assert!(
            totals[color as usize] <= TILES_PER_COLOR as u16,
            "Tile supply exceeded for {color:?}: {} on the table",
            totals[color as usize]
        );
    }

    for factory in position.factories.active() {
        assert!(factory.len() <= FACTORY_CAPACITY, "Factory over capacity");
    }

    let mut markers = usize::from(position.center.first_player_marker_available);
    for (p, player) in position.players.iter().enumerate() {
        for (r, line) in player.pattern_lines.iter().enumerate() {
            assert!(
                line.count <= line_capacity(r),
                "Player {p} pattern line {r} over capacity"
            );
            assert_eq!(
                line.color.is_some(),
                line.count > 0,
                "Player {p} pattern line {r} color/count mismatch"
            );
        }

        for (r, row) in player.wall.iter().enumerate() {
            for (c, cell) in row.iter().enumerate() {
                if let Some(color) = cell {
                    assert_eq!(
                        *color, WALL_PATTERN[r][c],
                        "Player {p} wall cell ({r},{c}) holds the wrong color"
                    );
                }
            }
        }

        assert!(player.floor.len as usize <= FLOOR_CAPACITY);
        for (i, token) in player.floor.tokens().iter().enumerate() {
            if *token == Token::FirstPlayerMarker {
                assert_eq!(i, 0, "Player {p} first player marker is not first");
                markers += 1;
            }
        }
    }
    assert!(markers <= 1, "First player marker appears {markers} times");
}
