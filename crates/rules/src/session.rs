//! Live game session
//!
//! Owns the current position, its canonical notation and the undo history.
//! Every accepted change follows the same path: validate, snapshot the old
//! position, replace it, re-encode. The analysis engine is consulted after the
//! fact and can only report; it never rolls a change back.

use thiserror::Error;
use tracing::{debug, warn};

use crate::config::RulesConfig;
use crate::conservation::ConservationValidator;
use crate::edit::{Edit, EditValidator};
use crate::error::{DecodeError, EditError, MoveError};
use crate::history::History;
use crate::notation::{decode_with_supply, encode};
use crate::{apply::apply_move, Move, Position, NUM_PLAYERS};

/// Answer from the analysis engine
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Verdict {
    pub legal: bool,
    pub message: Option<String>,
}

#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum RemoteError {
    #[error("analysis engine unreachable: {0}")]
    Unreachable(String),

    #[error("analysis engine error: {0}")]
    Engine(String),
}

/// Remote engine that confirms positions by notation
pub trait AnalysisEngine {
    fn confirm(&self, notation: &str) -> Result<Verdict, RemoteError>;
}

/// Outcome of asking the engine about the current position
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Confirmation {
    Confirmed,
    Rejected { message: String },
    /// The engine could not answer and the config allows proceeding anyway
    AssumedValid { error: RemoteError },
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Move(#[from] MoveError),

    #[error(transparent)]
    Edit(#[from] EditError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Remote(#[from] RemoteError),
}

#[derive(Debug)]
pub struct Session {
    position: Position,
    notation: String,
    history: History,
    validator: EditValidator,
    config: RulesConfig,
}

impl Session {
    pub fn new(position: Position, config: RulesConfig) -> Self {
        let notation = encode(&position);
        Session {
            position,
            notation,
            history: History::new(config.history_capacity),
            validator: EditValidator::new(ConservationValidator::new(config.tiles_per_color)),
            config,
        }
    }

    /// Start from untrusted notation, rejecting positions that break the supply
    pub fn from_notation(notation: &str, config: RulesConfig) -> Result<Self, SessionError> {
        let position = decode_with_supply(notation, config.tiles_per_color)?;
        Ok(Session::new(position, config))
    }

    pub fn position(&self) -> &Position {
        &self.position
    }

    /// Canonical notation of the current position
    pub fn notation(&self) -> &str {
        &self.notation
    }

    pub fn config(&self) -> &RulesConfig {
        &self.config
    }

    /// Play a drafting move for the current player and pass the turn
    pub fn apply_move(&mut self, mv: &Move) -> Result<&Position, SessionError> {
        let mut next = apply_move(&self.position, mv)?;
        next.current_player = (next.current_player + 1) % NUM_PLAYERS as u8;
        debug!(%mv, next_player = next.current_player, "session move");
        self.commit(next);
        Ok(&self.position)
    }

    /// Apply a manual board edit
    pub fn edit(&mut self, edit: &Edit) -> Result<&Position, SessionError> {
        let next = self.validator.apply(&self.position, edit)?;
        self.commit(next);
        Ok(&self.position)
    }

    /// Replace the whole position from notation. Undoable like any other change.
    pub fn load(&mut self, notation: &str) -> Result<&Position, SessionError> {
        let next = decode_with_supply(notation, self.config.tiles_per_color)?;
        self.commit(next);
        Ok(&self.position)
    }

    fn commit(&mut self, next: Position) {
        let previous = std::mem::replace(&mut self.position, next);
        self.history.push(previous);
        self.notation = encode(&self.position);
    }

    /// Step back one change. Returns false when there is nothing to undo.
    pub fn undo(&mut self) -> bool {
        match self.history.undo(&self.position) {
            Some(previous) => {
                self.position = previous;
                self.notation = encode(&self.position);
                true
            }
            None => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        match self.history.redo(&self.position) {
            Some(next) => {
                self.position = next;
                self.notation = encode(&self.position);
                true
            }
            None => false,
        }
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Ask the engine about the current position. The local state is kept
    /// whatever the answer.
    pub fn confirm(&self, engine: &impl AnalysisEngine) -> Result<Confirmation, SessionError> {
        match engine.confirm(&self.notation) {
            Ok(Verdict { legal: true, .. }) => Ok(Confirmation::Confirmed),
            Ok(Verdict {
                legal: false,
                message,
            }) => {
                let message =
                    message.unwrap_or_else(|| "position rejected by analysis engine".to_string());
                debug!(%message, "engine rejected position");
                Ok(Confirmation::Rejected { message })
            }
            Err(error) if self.config.assume_valid_on_remote_error => {
                warn!(%error, "analysis engine failed, assuming position is valid");
                Ok(Confirmation::AssumedValid { error })
            }
            Err(error) => Err(error.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{new_game, Color, DraftDestination, DraftSource, TileSet};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::cell::RefCell;

    struct ScriptedEngine {
        answer: Result<Verdict, RemoteError>,
        seen: RefCell<Vec<String>>,
    }

    impl ScriptedEngine {
        fn new(answer: Result<Verdict, RemoteError>) -> Self {
            ScriptedEngine {
                answer,
                seen: RefCell::new(Vec::new()),
            }
        }
    }

    impl AnalysisEngine for ScriptedEngine {
        fn confirm(&self, notation: &str) -> Result<Verdict, RemoteError> {
            self.seen.borrow_mut().push(notation.to_string());
            self.answer.clone()
        }
    }

    fn session_with_factory() -> Session {
        let mut position = Position::default();
        position.factories.factories[0] =
            TileSet::from_colors([Color::Red, Color::Red, Color::Red, Color::White]);
        Session::new(position, RulesConfig::default())
    }

    fn red_to_line_two() -> Move {
        Move {
            source: DraftSource::Factory(0),
            color: Color::Red,
            dest: DraftDestination::PatternLine(1),
            to_pattern_line: 2,
            to_floor: 1,
        }
    }

    #[test]
    fn test_move_passes_turn_and_reencodes() {
        let mut session = session_with_factory();
        let before = session.notation().to_string();

        session.apply_move(&red_to_line_two()).unwrap();

        assert_eq!(session.position().current_player, 1);
        assert_ne!(session.notation(), before);
        assert_eq!(session.notation(), encode(session.position()));
        assert!(session.can_undo());
    }

    #[test]
    fn test_rejected_move_changes_nothing() {
        let mut session = session_with_factory();
        let before = session.position().clone();
        let mut mv = red_to_line_two();
        mv.to_floor = 0;

        let err = session.apply_move(&mv).unwrap_err();
        assert!(matches!(
            err,
            SessionError::Move(MoveError::QuantityMismatch { .. })
        ));
        assert_eq!(session.position(), &before);
        assert!(!session.can_undo());
    }

    #[test]
    fn test_undo_redo_restore_notation() {
        let mut session = session_with_factory();
        let start = session.notation().to_string();
        session.apply_move(&red_to_line_two()).unwrap();
        let after = session.notation().to_string();

        assert!(session.undo());
        assert_eq!(session.notation(), start);
        assert!(!session.undo());

        assert!(session.redo());
        assert_eq!(session.notation(), after);
        assert!(!session.redo());
    }

    #[test]
    fn test_history_capacity_from_config() {
        let config = RulesConfig {
            history_capacity: 2,
            ..RulesConfig::default()
        };
        let mut session = Session::new(Position::default(), config);
        for row in 0..4 {
            session
                .edit(&Edit::SetPatternLine {
                    player: 0,
                    row,
                    color: Some(Color::Blue),
                    count: 1,
                })
                .unwrap();
        }

        assert!(session.undo());
        assert!(session.undo());
        assert!(!session.undo());
    }

    #[test]
    fn test_from_notation_checks_supply() {
        let position = new_game(0, &mut StdRng::seed_from_u64(11));
        let notation = encode(&position);
        let session = Session::from_notation(&notation, RulesConfig::default()).unwrap();
        assert_eq!(session.position(), &position);

        let mut flooded = Position::default();
        flooded.center.tiles.counts[Color::Black as usize] = 21;
        let err = Session::from_notation(&encode(&flooded), RulesConfig::default()).unwrap_err();
        assert!(matches!(err, SessionError::Decode(DecodeError::Supply(_))));

        let roomy = RulesConfig {
            tiles_per_color: 25,
            ..RulesConfig::default()
        };
        assert!(Session::from_notation(&encode(&flooded), roomy).is_ok());

        let err = Session::from_notation("", RulesConfig::default()).unwrap_err();
        assert!(matches!(err, SessionError::Decode(_)));
    }

    #[test]
    fn test_zero_history_capacity_can_undo_last_change() {
        let config = RulesConfig {
            history_capacity: 0,
            ..RulesConfig::default()
        };
        let start = new_game(0, &mut StdRng::seed_from_u64(11));
        let mut session = Session::new(start.clone(), config);
        let other = new_game(1, &mut StdRng::seed_from_u64(12));

        session.load(&encode(&other)).unwrap();
        assert!(session.undo());
        assert_eq!(session.position(), &start);
        assert!(!session.undo());
    }

    #[test]
    fn test_load_is_undoable() {
        let mut session = session_with_factory();
        let start = session.position().clone();
        let other = new_game(1, &mut StdRng::seed_from_u64(5));

        session.load(&encode(&other)).unwrap();
        assert_eq!(session.position(), &other);
        assert!(session.undo());
        assert_eq!(session.position(), &start);
    }

    #[test]
    fn test_confirm_sends_current_notation() {
        let session = session_with_factory();
        let engine = ScriptedEngine::new(Ok(Verdict {
            legal: true,
            message: None,
        }));

        assert_eq!(session.confirm(&engine).unwrap(), Confirmation::Confirmed);
        assert_eq!(*engine.seen.borrow(), vec![session.notation().to_string()]);
    }

    #[test]
    fn test_rejection_keeps_local_change() {
        let mut session = session_with_factory();
        session.apply_move(&red_to_line_two()).unwrap();
        let committed = session.position().clone();
        let engine = ScriptedEngine::new(Ok(Verdict {
            legal: false,
            message: Some("illegal draft".to_string()),
        }));

        assert_eq!(
            session.confirm(&engine).unwrap(),
            Confirmation::Rejected {
                message: "illegal draft".to_string()
            }
        );
        assert_eq!(session.position(), &committed);
        assert!(session.can_undo());
    }

    #[test]
    fn test_remote_failure_policy() {
        let failing = ScriptedEngine::new(Err(RemoteError::Unreachable("timeout".to_string())));

        let strict = session_with_factory();
        assert!(matches!(
            strict.confirm(&failing),
            Err(SessionError::Remote(RemoteError::Unreachable(_)))
        ));

        let lenient = Session::new(
            Position::default(),
            RulesConfig {
                assume_valid_on_remote_error: true,
                ..RulesConfig::default()
            },
        );
        assert_eq!(
            lenient.confirm(&failing).unwrap(),
            Confirmation::AssumedValid {
                error: RemoteError::Unreachable("timeout".to_string())
            }
        );
    }
}
