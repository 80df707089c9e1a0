use std::time::{Duration, Instant};

use cozy_chess::{Color, Square};
use log::{debug, info, warn};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::rules::{Promotion, Rules, RulesError};

/// Delay between a committed human move and the opponent reply.
pub const REPLY_DELAY: Duration = Duration::from_millis(300);

/// A move awaiting promotion-piece selection. At most one exists at a time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PendingMove {
    pub source: Square,
    pub target: Square,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Outcome {
    pub over: bool,
    /// `None` with `over` set means the game is drawn.
    pub winner: Option<Color>,
}

/// Game session controller: owns the authoritative position, validates and
/// applies gestures, runs the two-phase promotion flow, detects termination
/// and drives the random-moving opponent.
///
/// Single-threaded and event-driven: every trigger (gesture, promotion
/// choice, restart, timer tick) runs to completion before the next one.
pub struct Session {
    rules: Rules,
    human: Color,
    pending: Option<PendingMove>,
    outcome: Outcome,
    reply_due: Option<Instant>,
    reply_delay: Duration,
    rng: SmallRng,
}

impl Session {
    pub fn new(human: Color) -> Self {
        let mut session = Self {
            rules: Rules::startpos(),
            human,
            pending: None,
            outcome: Outcome::default(),
            reply_due: None,
            reply_delay: REPLY_DELAY,
            rng: SmallRng::from_entropy(),
        };
        // When the human takes Black the opponent opens the game.
        if session.rules.side_to_move() != session.human {
            session.schedule_reply();
        }
        session
    }

    pub fn from_fen(fen: &str, human: Color) -> Result<Self, RulesError> {
        let mut session = Self::new(human);
        session.rules = Rules::from_fen(fen)?;
        session.reply_due = None;
        if session.rules.side_to_move() != session.human {
            session.schedule_reply();
        }
        Ok(session)
    }

    /// A drag gesture from the board. Returns whether the move was committed;
    /// a promotion-pending move returns false (the piece snaps back until the
    /// promotion dialog resolves it).
    pub fn attempt_move(&mut self, source: &str, target: &str) -> bool {
        if self.outcome.over || self.pending.is_some() {
            return false;
        }
        if self.rules.side_to_move() != self.human {
            debug!("gesture {source}{target} ignored: not the human's turn");
            return false;
        }
        let (Ok(source), Ok(target)) = (source.parse::<Square>(), target.parse::<Square>())
        else {
            return false;
        };
        let result = match self.rules.apply_move(source, target, Some(Promotion::Queen)) {
            Ok(result) => result,
            Err(_) => return false,
        };
        if result.is_promotion {
            // Roll back the tentative default-queen apply and wait for the
            // user's piece choice.
            self.rules.undo_last_move();
            self.pending = Some(PendingMove { source, target });
            return false;
        }
        if !self.detect_terminal() {
            self.schedule_reply();
        }
        true
    }

    /// Resolve the promotion dialog. No-op unless a move is pending.
    pub fn resolve_promotion(&mut self, choice: Promotion) {
        let Some(pending) = self.pending.take() else {
            debug!("promotion choice with no pending move");
            return;
        };
        if self.outcome.over {
            return;
        }
        match self.rules.apply_move(pending.source, pending.target, Some(choice)) {
            Ok(_) => {
                if !self.detect_terminal() {
                    self.schedule_reply();
                }
            }
            Err(err) => warn!("pending promotion move no longer legal: {err}"),
        }
    }

    /// Fire the scheduled opponent reply if it is due. Returns whether the
    /// session changed (position or outcome).
    pub fn tick(&mut self, now: Instant) -> bool {
        match self.reply_due {
            Some(due) if now >= due => {
                self.reply_due = None;
                self.opponent_reply()
            }
            _ => false,
        }
    }

    /// The opponent policy: one legal move chosen uniformly at random.
    /// Normally fired by the reply timer through `tick`.
    ///
    /// Guarded against stale timers: a reply firing after a restart (or
    /// after the game ended) finds it is not the automated side's turn and
    /// leaves the position untouched.
    pub fn opponent_reply(&mut self) -> bool {
        if self.outcome.over {
            debug!("opponent reply after game end, ignoring");
            return false;
        }
        if self.rules.side_to_move() == self.human {
            debug!("opponent reply fired out of turn, ignoring");
            return false;
        }
        if self.detect_terminal() {
            return true;
        }
        let moves = self.rules.legal_moves();
        let mv = moves[self.rng.gen_range(0..moves.len())];
        self.rules.commit(mv);
        debug!("opponent plays {mv}");
        // The reply itself may deliver mate or stalemate.
        self.detect_terminal();
        true
    }

    /// Reset to a fresh game. Always legal, from any state. A reply timer
    /// already scheduled is left to fire; `opponent_reply` absorbs it.
    pub fn restart(&mut self) {
        self.rules = Rules::startpos();
        self.pending = None;
        self.outcome = Outcome::default();
        if self.rules.side_to_move() != self.human {
            self.schedule_reply();
        }
    }

    pub fn fen(&self) -> String {
        self.rules.to_fen()
    }

    pub fn outcome(&self) -> Outcome {
        self.outcome
    }

    pub fn awaiting_promotion(&self) -> bool {
        self.pending.is_some()
    }

    pub fn pending_move(&self) -> Option<PendingMove> {
        self.pending
    }

    pub fn reply_pending(&self) -> bool {
        self.reply_due.is_some()
    }

    pub fn side_to_move(&self) -> Color {
        self.rules.side_to_move()
    }

    pub fn rules(&self) -> &Rules {
        &self.rules
    }

    pub fn set_reply_delay(&mut self, delay: Duration) {
        self.reply_delay = delay;
    }

    fn schedule_reply(&mut self) {
        self.reply_due = Some(Instant::now() + self.reply_delay);
    }

    // Shared terminal check: an empty legal-move set ends the game even if
    // the rules engine disagrees (stop play over silently continuing).
    fn detect_terminal(&mut self) -> bool {
        if self.outcome.over {
            return true;
        }
        let no_moves = self.rules.legal_moves().is_empty();
        let over = self.rules.is_game_over();
        if !no_moves && !over {
            return false;
        }
        if no_moves && !over {
            warn!("rules report no legal moves but not game over; stopping play");
        }
        let winner = if self.rules.is_draw() {
            None
        } else {
            // The side that just delivered the terminal condition wins.
            Some(!self.rules.side_to_move())
        };
        self.outcome = Outcome { over: true, winner };
        match winner {
            Some(color) => info!("game over, {color:?} wins"),
            None => info!("game over, drawn"),
        }
        true
    }
}
