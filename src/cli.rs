//! Command-line interface for azul-board.

use std::error::Error;
use std::fmt::Write as _;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::info;

use azul_rules::{
    legal_moves, new_game, off_table_counts, Color, DraftDestination, DraftSource, Move,
    RulesConfig, Session, ALL_COLORS,
};

/// Inspect and advance Azul positions given in board notation
#[derive(Parser, Debug)]
#[command(name = "azul-board")]
#[command(about = "Apply moves to Azul positions written in board notation", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Rules configuration file (TOML)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Deal a fresh position and print its notation
    New {
        /// Random seed for the factory fill
        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Player who moves first (0 or 1)
        #[arg(long, default_value_t = 0)]
        starting_player: u8,
    },

    /// Validate a notation string and print its canonical form
    Check { notation: String },

    /// List the legal moves for the player to move
    Moves { notation: String },

    /// Apply one drafting move and print the resulting notation
    Apply {
        notation: String,

        /// Tile source: F0..F8 or C
        #[arg(long)]
        source: DraftSource,

        /// Tile color: symbol (R) or name (red)
        #[arg(long)]
        color: Color,

        /// Destination: L1..L5 or floor
        #[arg(long)]
        dest: DraftDestination,

        /// Tiles placed on the pattern line (computed when omitted)
        #[arg(long, requires = "to_floor")]
        to_line: Option<u8>,

        /// Tiles placed on the floor (computed when omitted)
        #[arg(long, requires = "to_line")]
        to_floor: Option<u8>,
    },
}

impl Cli {
    pub fn rules_config(&self) -> Result<RulesConfig, Box<dyn Error>> {
        match &self.config {
            Some(path) => Ok(RulesConfig::load(path)?),
            None => Ok(RulesConfig::default()),
        }
    }
}

/// Execute a command and return the text to print
pub fn run(cli: &Cli) -> Result<String, Box<dyn Error>> {
    let config = cli.rules_config()?;

    match &cli.command {
        Command::New {
            seed,
            starting_player,
        } => {
            if *starting_player > 1 {
                return Err(format!("starting player must be 0 or 1, got {starting_player}").into());
            }
            let mut rng = StdRng::seed_from_u64(*seed);
            let position = new_game(*starting_player, &mut rng);
            info!(seed, starting_player, "dealt new position");
            Ok(position.to_string())
        }

        Command::Check { notation } => {
            let session = Session::from_notation(notation, config.clone())?;
            let off_table = off_table_counts(session.position(), config.tiles_per_color);

            let mut out = String::new();
            writeln!(out, "{}", session.notation())?;
            let bag: Vec<String> = ALL_COLORS
                .iter()
                .map(|&color| format!("{color}={}", off_table[color as usize]))
                .collect();
            write!(out, "off table: {}", bag.join(" "))?;
            Ok(out)
        }

        Command::Moves { notation } => {
            let session = Session::from_notation(notation, config)?;
            let moves = legal_moves(session.position());
            let lines: Vec<String> = moves
                .iter()
                .enumerate()
                .map(|(i, mv)| format!("{i:>3}: {mv}"))
                .collect();
            Ok(lines.join("\n"))
        }

        Command::Apply {
            notation,
            source,
            color,
            dest,
            to_line,
            to_floor,
        } => {
            let mut session = Session::from_notation(notation, config)?;
            let mv = match (to_line, to_floor) {
                (Some(to_pattern_line), Some(to_floor)) => Move {
                    source: *source,
                    color: *color,
                    dest: *dest,
                    to_pattern_line: *to_pattern_line,
                    to_floor: *to_floor,
                },
                _ => Move::plan(session.position(), *source, *color, *dest)?,
            };
            session.apply_move(&mv)?;
            Ok(session.notation().to_string())
        }
    }
}
