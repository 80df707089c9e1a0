use std::io::{self, BufRead, Write};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::Result;
use clap::Parser;
use cozy_chess::{Color, File, Piece, Rank, Square};
use patzer::rules::Promotion;
use patzer::session::Session;

#[derive(Parser, Debug)]
#[command(author, version, about = "Play chess against a random-moving opponent", long_about = None)]
struct Args {
    /// Your color: 'w' for white, 'b' for black
    #[arg(long, default_value = "w")]
    color: String,

    /// Opponent reply delay in milliseconds
    #[arg(long, default_value_t = 300)]
    delay_ms: u64,
}

fn parse_color(color_str: &str) -> Result<Color> {
    match color_str.to_lowercase().as_str() {
        "w" | "white" => Ok(Color::White),
        "b" | "black" => Ok(Color::Black),
        _ => anyhow::bail!("Invalid color: use 'w' or 'b'"),
    }
}

fn piece_char(piece: Piece, color: Color) -> char {
    let ch = match piece {
        Piece::Pawn => 'p',
        Piece::Knight => 'n',
        Piece::Bishop => 'b',
        Piece::Rook => 'r',
        Piece::Queen => 'q',
        Piece::King => 'k',
    };
    match color {
        Color::White => ch.to_ascii_uppercase(),
        Color::Black => ch,
    }
}

fn print_board(session: &Session) {
    let board = session.rules().board();
    println!();
    for &rank in Rank::ALL.iter().rev() {
        print!("{} ", rank as usize + 1);
        for &file in File::ALL.iter() {
            let sq = Square::new(file, rank);
            match (board.piece_on(sq), board.color_on(sq)) {
                (Some(piece), Some(color)) => print!("{} ", piece_char(piece, color)),
                _ => print!(". "),
            }
        }
        println!();
    }
    println!("  a b c d e f g h");
    println!("FEN: {}", session.fen());
}

fn announce(session: &Session) {
    let outcome = session.outcome();
    if !outcome.over {
        return;
    }
    match outcome.winner {
        Some(Color::White) => println!("\nGame over! White wins."),
        Some(Color::Black) => println!("\nGame over! Black wins."),
        None => println!("\nGame over! Draw."),
    }
    println!("Press Enter to restart.");
}

/// Let a scheduled opponent reply fire, then redraw.
fn run_pending_reply(session: &mut Session, delay: Duration) {
    if !session.reply_pending() {
        return;
    }
    thread::sleep(delay);
    if session.tick(Instant::now()) {
        print_board(session);
        announce(session);
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    let human = parse_color(&args.color)?;
    let delay = Duration::from_millis(args.delay_ms);

    println!("Patzer: chess against a random mover");
    println!("====================================");
    println!("Enter moves as square pairs (e.g., e2e4).");
    println!("On promotion, answer with one of q, r, b, n.");
    println!("Press Enter on an empty line to restart, 'quit' to exit.");

    let mut session = Session::new(human);
    session.set_reply_delay(delay);
    print_board(&session);
    run_pending_reply(&mut session, delay);

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        if session.awaiting_promotion() {
            print!("Promote to (q/r/b/n): ");
        } else {
            print!("Your move: ");
        }
        io::stdout().flush()?;

        let Some(line) = lines.next() else { break };
        let line = line?;
        let input = line.trim();

        if input == "quit" {
            break;
        }
        if input.is_empty() {
            session.restart();
            print_board(&session);
            run_pending_reply(&mut session, delay);
            continue;
        }
        if session.awaiting_promotion() {
            match input.chars().next().and_then(Promotion::from_char) {
                Some(choice) => {
                    session.resolve_promotion(choice);
                    print_board(&session);
                    announce(&session);
                    run_pending_reply(&mut session, delay);
                }
                None => println!("Choose one of q, r, b, n."),
            }
            continue;
        }
        if input.len() != 4 || !input.is_ascii() {
            println!("Enter moves like e2e4.");
            continue;
        }
        let (from, to) = input.split_at(2);
        if session.attempt_move(from, to) {
            print_board(&session);
            announce(&session);
            run_pending_reply(&mut session, delay);
        } else if session.awaiting_promotion() {
            println!("Pawn promotion! Choose a piece.");
        } else if session.outcome().over {
            println!("The game is over. Press Enter to restart.");
        } else {
            println!("Illegal move.");
        }
    }

    println!("Thanks for playing!");
    Ok(())
}
