use knight_checkers::*;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    println!("Knight Checkers Arena");
    println!("=====================\n");

    let red = Box::new(GreedyBot::new("GreedyBot".to_string()));
    let blue = Box::new(AlphaBetaBot::new("AlphaBetaBot".to_string(), 3));

    // Configure match
    let config = MatchConfig {
        time_per_move: Duration::from_secs(30),
        ..MatchConfig::default()
    };

    // Play a match
    let mut arena = Match::new(red, blue, config, true);
    let result = arena.play();

    // Display result
    println!("\n=====================");
    println!("Match Result:");
    match result {
        MatchResult::RedWins { winner_name, turns } => {
            println!("  {} wins as Red in {} turns!", winner_name, turns);
        }
        MatchResult::BlueWins { winner_name, turns } => {
            println!("  {} wins as Blue in {} turns!", winner_name, turns);
        }
        MatchResult::Tie { turns } => {
            println!("  Tie after {} turns", turns);
        }
        MatchResult::Timeout { violator, winner } => {
            println!("  {} wins by timeout (opponent: {})", winner, violator);
        }
        MatchResult::IllegalAction { violator, winner } => {
            println!("  {} wins by illegal action (opponent: {})", winner, violator);
        }
        MatchResult::TurnLimit { turns } => {
            println!("  Turn limit reached after {} turns", turns);
        }
    }
    println!(
        "  Points: Red {} - Blue {}",
        arena.game().points(Player::Red),
        arena.game().points(Player::Blue)
    );
    println!("=====================");
}
