use std::time::{Duration, Instant};

use cozy_chess::Color;
use patzer::session::{Outcome, Session};
use pretty_assertions::assert_eq;

fn far_future() -> Instant {
    Instant::now() + Duration::from_secs(3600)
}

#[test]
fn opponent_reply_on_stalemate_reports_draw_without_moving() {
    // Black to move with no legal moves: Qb6 boxes in the king on a8.
    let fen = "k7/8/1Q6/8/8/8/8/7K b - - 0 1";
    let mut session = Session::from_fen(fen, Color::White).expect("valid fen");
    let before = session.fen();
    assert!(session.opponent_reply());
    assert_eq!(session.outcome(), Outcome { over: true, winner: None });
    assert_eq!(session.fen(), before, "a terminal reply must not move");
}

#[test]
fn human_stalemates_the_opponent() {
    // Qc6-b6 stalemates the king on a8.
    let fen = "k7/8/2Q5/8/8/8/8/7K w - - 0 1";
    let mut session = Session::from_fen(fen, Color::White).expect("valid fen");
    assert!(session.attempt_move("c6", "b6"));
    assert_eq!(session.outcome(), Outcome { over: true, winner: None });
}

#[test]
fn human_mates_and_wins() {
    // Back-rank mate: Re1-e8#.
    let fen = "6k1/5ppp/8/8/8/8/8/4R2K w - - 0 1";
    let mut session = Session::from_fen(fen, Color::White).expect("valid fen");
    assert!(session.attempt_move("e1", "e8"));
    let outcome = session.outcome();
    assert!(outcome.over);
    assert_eq!(outcome.winner, Some(Color::White));
}

#[test]
fn moves_are_rejected_after_game_over() {
    let fen = "6k1/5ppp/8/8/8/8/8/4R2K w - - 0 1";
    let mut session = Session::from_fen(fen, Color::White).expect("valid fen");
    assert!(session.attempt_move("e1", "e8"));
    assert!(session.outcome().over);
    let after_mate = session.fen();
    assert!(!session.attempt_move("h1", "h2"));
    assert_eq!(session.fen(), after_mate);
    assert!(session.outcome().over);
    assert!(!session.awaiting_promotion());
}

#[test]
fn stale_reply_after_game_over_is_ignored() {
    let fen = "6k1/5ppp/8/8/8/8/8/4R2K w - - 0 1";
    let mut session = Session::from_fen(fen, Color::White).expect("valid fen");
    session.set_reply_delay(Duration::ZERO);
    assert!(session.attempt_move("e1", "e8"));
    let after_mate = session.fen();
    // No reply was scheduled for a terminal position, and forcing one
    // through must still leave the position alone.
    assert!(!session.opponent_reply());
    assert!(!session.tick(far_future()));
    assert_eq!(session.fen(), after_mate);
}

#[test]
fn restart_exits_game_over() {
    let fen = "6k1/5ppp/8/8/8/8/8/4R2K w - - 0 1";
    let mut session = Session::from_fen(fen, Color::White).expect("valid fen");
    assert!(session.attempt_move("e1", "e8"));
    assert!(session.outcome().over);
    session.restart();
    assert_eq!(session.outcome(), Outcome::default());
    assert_eq!(session.fen(), Session::new(Color::White).fen());
    assert!(session.attempt_move("e2", "e4"));
}

#[test]
fn opponent_delivered_terminal_is_flagged_immediately() {
    // Black (the automated side) to move; some replies end the game on the
    // spot: Qg3 stalemates White, Qg2 is mate. Whatever the sampled reply,
    // the outcome flag must agree with the rules engine afterwards.
    let fen = "8/8/8/8/6q1/8/5k2/7K b - - 0 1";
    let mut seen_terminal = false;
    for _ in 0..200 {
        let mut session = Session::from_fen(fen, Color::White).expect("valid fen");
        assert!(session.opponent_reply());
        let terminal =
            session.rules().is_game_over() || session.rules().legal_moves().is_empty();
        assert_eq!(session.outcome().over, terminal);
        if terminal {
            let expected = if session.rules().is_draw() {
                None
            } else {
                Some(Color::Black)
            };
            assert_eq!(session.outcome().winner, expected);
            seen_terminal = true;
        }
    }
    assert!(seen_terminal, "no terminal reply sampled in 200 tries");
}
