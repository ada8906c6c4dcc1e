use crate::bot::Bot;
use crate::controller::{Action, Game, GameConfig};
use crate::game::{GameResult, Player};
use std::time::{Duration, Instant};
use tracing::{info, warn};

pub struct MatchConfig {
    pub time_per_move: Duration,
    /// Actions played before the match is called off, setup included.
    pub max_turns: usize,
    pub game: GameConfig,
}

impl Default for MatchConfig {
    fn default() -> Self {
        MatchConfig {
            time_per_move: Duration::from_secs(5),
            max_turns: 300,
            game: GameConfig {
                automated_player: None,
                ..GameConfig::default()
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchResult {
    RedWins { winner_name: String, turns: usize },
    BlueWins { winner_name: String, turns: usize },
    Tie { turns: usize },
    Timeout { violator: String, winner: String },
    IllegalAction { violator: String, winner: String },
    TurnLimit { turns: usize },
}

impl MatchResult {
    pub fn winner(&self) -> Option<&str> {
        match self {
            MatchResult::RedWins { winner_name, .. } => Some(winner_name),
            MatchResult::BlueWins { winner_name, .. } => Some(winner_name),
            MatchResult::Timeout { winner, .. } => Some(winner),
            MatchResult::IllegalAction { winner, .. } => Some(winner),
            MatchResult::Tie { .. } | MatchResult::TurnLimit { .. } => None,
        }
    }
}

/// Two bots playing one game against each other.
pub struct Match {
    config: MatchConfig,
    game: Game,
    red_bot: Box<dyn Bot>,
    blue_bot: Box<dyn Bot>,
    verbose: bool,
    turns: usize,
}

impl Match {
    pub fn new(
        red_bot: Box<dyn Bot>,
        blue_bot: Box<dyn Bot>,
        config: MatchConfig,
        verbose: bool,
    ) -> Self {
        Match {
            game: Game::new(config.game.clone()),
            config,
            red_bot,
            blue_bot,
            verbose,
            turns: 0,
        }
    }

    pub fn game(&self) -> &Game {
        &self.game
    }

    pub fn turns(&self) -> usize {
        self.turns
    }

    fn bot_name(&self, player: Player) -> &str {
        match player {
            Player::Red => self.red_bot.name(),
            Player::Blue => self.blue_bot.name(),
        }
    }

    pub fn play(&mut self) -> MatchResult {
        // Notify bots that game is starting
        self.red_bot.game_start(Player::Red);
        self.blue_bot.game_start(Player::Blue);
        info!(red = self.red_bot.name(), blue = self.blue_bot.name(), "match starting");

        if self.verbose {
            println!("Match starting:");
            println!("  Red:  {}", self.red_bot.name());
            println!("  Blue: {}", self.blue_bot.name());
            println!("\nInitial board:");
            println!("{}", self.game.board().display());
        }

        while !self.game.is_game_over() && self.turns < self.config.max_turns {
            let current_player = self.game.turn();
            if let Some(result) = self.play_turn(current_player) {
                self.red_bot.game_end();
                self.blue_bot.game_end();
                return result;
            }
        }

        // Game ended normally
        self.red_bot.game_end();
        self.blue_bot.game_end();

        let turns = self.turns;
        let result = match self.game.winner() {
            Some(GameResult::RedWins) => MatchResult::RedWins {
                winner_name: self.red_bot.name().to_string(),
                turns,
            },
            Some(GameResult::BlueWins) => MatchResult::BlueWins {
                winner_name: self.blue_bot.name().to_string(),
                turns,
            },
            Some(GameResult::Tie) => MatchResult::Tie { turns },
            None => MatchResult::TurnLimit { turns },
        };

        if self.verbose {
            match result.winner() {
                Some(name) => println!("\n{} wins!", name),
                None => println!("\nNo winner after {} turns", turns),
            }
        }
        info!(?result, "match finished");
        result
    }

    fn play_turn(&mut self, current_player: Player) -> Option<MatchResult> {
        let bot = match current_player {
            Player::Red => &mut self.red_bot,
            Player::Blue => &mut self.blue_bot,
        };

        if self.verbose {
            println!("\nTurn {}: {} to play", self.turns + 1, bot.name());
        }

        // Get action from bot with time limit
        let start = Instant::now();
        let action = bot.choose_action(&self.game, self.config.time_per_move);
        let elapsed = start.elapsed();

        self.handle_action(action, elapsed, current_player)
    }

    fn handle_action(
        &mut self,
        action: Option<Action>,
        elapsed: Duration,
        current_player: Player,
    ) -> Option<MatchResult> {
        let violator = self.bot_name(current_player).to_string();
        let winner = self.bot_name(current_player.opponent()).to_string();

        // Check timeout
        if elapsed > self.config.time_per_move {
            warn!(bot = %violator, ?elapsed, "move time exceeded");
            if self.verbose {
                println!(
                    "TIMEOUT: {} took {:?} (limit: {:?})",
                    violator, elapsed, self.config.time_per_move
                );
            }
            return Some(MatchResult::Timeout { violator, winner });
        }

        let Some(action) = action else {
            // A side without moves is a stalemate the game settles itself
            if self.verbose {
                println!("{} returned no action", violator);
            }
            self.game.check_winner();
            if self.game.is_game_over() {
                return None;
            }
            return Some(MatchResult::Tie { turns: self.turns });
        };

        if self.verbose {
            println!("{} plays: {} (took {:?})", violator, action, elapsed);
        }

        if let Err(e) = self.game.apply_action(action.clone()) {
            warn!(bot = %violator, error = %e, "illegal action");
            if self.verbose {
                println!("ILLEGAL ACTION: {} - {}", violator, e);
            }
            return Some(MatchResult::IllegalAction { violator, winner });
        }
        self.turns += 1;

        // Notify both bots of the action
        self.red_bot.notify_action(&action);
        self.blue_bot.notify_action(&action);

        if self.verbose {
            println!("{}", self.game.board().display());
        }

        None
    }
}
