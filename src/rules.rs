use cozy_chess::{Board, Color, File, GameStatus, Move, Piece, Rank, Square};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RulesError {
    #[error("illegal move: {0}")]
    IllegalMove(String),
    #[error("invalid FEN: {0}")]
    InvalidFen(String),
}

/// Promotion piece chosen by the user. Parses from the single-character
/// codes the promotion dialog delivers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Promotion {
    Queen,
    Rook,
    Bishop,
    Knight,
}

impl Promotion {
    pub fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_lowercase() {
            'q' => Some(Promotion::Queen),
            'r' => Some(Promotion::Rook),
            'b' => Some(Promotion::Bishop),
            'n' => Some(Promotion::Knight),
            _ => None,
        }
    }

    pub fn piece(self) -> Piece {
        match self {
            Promotion::Queen => Piece::Queen,
            Promotion::Rook => Piece::Rook,
            Promotion::Bishop => Piece::Bishop,
            Promotion::Knight => Piece::Knight,
        }
    }
}

/// Metadata for a move the engine just applied.
#[derive(Clone, Copy, Debug)]
pub struct MoveResult {
    pub mv: Move,
    pub is_promotion: bool,
}

/// Move-legality boundary backed by cozy-chess.
///
/// The position is stored as the initial board plus a stack of
/// (move, resulting board) snapshots, so `undo_last_move` restores the
/// previous position exactly, including side to move, castling rights,
/// en-passant target and the move counters.
#[derive(Clone, Debug)]
pub struct Rules {
    init: Board,
    stack: Vec<(Move, Board)>,
}

impl Rules {
    pub fn startpos() -> Self {
        Self { init: Board::default(), stack: Vec::new() }
    }

    pub fn from_fen(fen: &str) -> Result<Self, RulesError> {
        let init = Board::from_fen(fen, false)
            .map_err(|e| RulesError::InvalidFen(format!("{fen}: {e:?}")))?;
        Ok(Self { init, stack: Vec::new() })
    }

    pub fn board(&self) -> &Board {
        self.stack.last().map_or(&self.init, |(_, b)| b)
    }

    /// Try a move given as a (source, target) square pair. For promotion
    /// moves the variant promoting to `promotion` (Queen when unspecified)
    /// is committed and the result is flagged accordingly.
    pub fn apply_move(
        &mut self,
        from: Square,
        to: Square,
        promotion: Option<Promotion>,
    ) -> Result<MoveResult, RulesError> {
        let to = self.normalize_castle_target(from, to);
        let candidates: Vec<Move> = self
            .legal_moves()
            .into_iter()
            .filter(|m| m.from == from && m.to == to)
            .collect();
        if candidates.is_empty() {
            return Err(RulesError::IllegalMove(format!("{from}{to}")));
        }
        let is_promotion = candidates[0].promotion.is_some();
        let want = if is_promotion {
            Some(promotion.unwrap_or(Promotion::Queen).piece())
        } else {
            None
        };
        let mv = candidates
            .into_iter()
            .find(|m| m.promotion == want)
            .ok_or_else(|| RulesError::IllegalMove(format!("{from}{to}")))?;
        self.commit(mv);
        Ok(MoveResult { mv, is_promotion })
    }

    /// Commit a move already known to be legal (an opponent reply picked
    /// from `legal_moves`).
    pub fn commit(&mut self, mv: Move) {
        let mut child = self.board().clone();
        child.play(mv);
        self.stack.push((mv, child));
    }

    pub fn undo_last_move(&mut self) -> bool {
        self.stack.pop().is_some()
    }

    pub fn legal_moves(&self) -> Vec<Move> {
        let mut moves = Vec::new();
        self.board().generate_moves(|ms| {
            moves.extend(ms);
            false
        });
        moves
    }

    pub fn side_to_move(&self) -> Color {
        self.board().side_to_move()
    }

    pub fn last_move(&self) -> Option<Move> {
        self.stack.last().map(|(m, _)| *m)
    }

    /// Game status with threefold repetition folded in; cozy's own status
    /// already covers checkmate, stalemate and the 50-move rule.
    pub fn status(&self) -> GameStatus {
        let status = self.board().status();
        if status != GameStatus::Ongoing {
            return status;
        }
        let repetitions = self
            .stack
            .iter()
            .filter(|(_, b)| b.same_position(self.board()))
            .count();
        if repetitions >= 3 {
            return GameStatus::Drawn;
        }
        GameStatus::Ongoing
    }

    pub fn is_game_over(&self) -> bool {
        self.status() != GameStatus::Ongoing
    }

    pub fn is_draw(&self) -> bool {
        self.status() == GameStatus::Drawn
    }

    pub fn to_fen(&self) -> String {
        format!("{}", self.board())
    }

    // Renderers report castling as the standard two-square king slide;
    // cozy-chess encodes it as king-takes-rook. Rewrite the target to the
    // rook square when the gesture matches an available castle right.
    fn normalize_castle_target(&self, from: Square, to: Square) -> Square {
        let board = self.board();
        let color = board.side_to_move();
        if board.king(color) != from {
            return to;
        }
        let back = match color {
            Color::White => Rank::First,
            Color::Black => Rank::Eighth,
        };
        if from != Square::new(File::E, back) || to.rank() != back {
            return to;
        }
        let rights = board.castle_rights(color);
        match to.file() {
            File::G => rights.short.map_or(to, |f| Square::new(f, back)),
            File::C => rights.long.map_or(to, |f| Square::new(f, back)),
            _ => to,
        }
    }
}
