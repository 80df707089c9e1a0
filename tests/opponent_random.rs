use std::collections::HashMap;
use std::time::{Duration, Instant};

use cozy_chess::Color;
use patzer::session::Session;

#[test]
fn reply_is_always_a_legal_move() {
    for _ in 0..50 {
        let mut session = Session::new(Color::White);
        session.set_reply_delay(Duration::ZERO);
        assert!(session.attempt_move("e2", "e4"));
        let legal_replies = session.rules().legal_moves();
        assert!(session.tick(Instant::now() + Duration::from_secs(1)));
        let reply = session.rules().last_move().expect("a reply was committed");
        assert!(legal_replies.contains(&reply), "reply {reply} is not legal after 1. e4");
    }
}

#[test]
fn selection_is_roughly_uniform() {
    // The king on h8 has exactly three legal moves: g8, g7 and h7.
    let fen = "7k/8/8/8/8/8/8/K7 b - - 0 1";
    const TRIALS: usize = 900;
    let mut counts: HashMap<String, usize> = HashMap::new();
    for _ in 0..TRIALS {
        let mut session = Session::from_fen(fen, Color::White).expect("valid fen");
        assert!(session.opponent_reply());
        let mv = session.rules().last_move().expect("a reply was committed");
        *counts.entry(mv.to_string()).or_default() += 1;
    }
    assert_eq!(counts.len(), 3, "expected three distinct replies, got {counts:?}");
    // Expected 300 each; allow a wide band (~7 sigma) to keep this stable.
    for (mv, n) in &counts {
        assert!(
            (200..=400).contains(n),
            "move {mv} chosen {n}/{TRIALS} times, far from uniform"
        );
    }
}
