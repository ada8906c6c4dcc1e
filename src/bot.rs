use crate::controller::{Action, Game, Phase};
use crate::eval::evaluate;
use crate::game::{Board, Cell, Player, Position, Rank};
use crate::search::{choose_move, successor};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use std::time::Duration;
use tracing::debug;

/// Trait that all bots must implement
pub trait Bot: Send {
    /// Get the name of the bot
    fn name(&self) -> &str;

    /// Pick the next action for the side to move in `game`.
    /// The bot has a time limit to respond
    fn choose_action(&mut self, game: &Game, time_limit: Duration) -> Option<Action>;

    /// Notified when the game starts
    fn game_start(&mut self, _player: Player) {}

    /// Notified when an action is played (by either side)
    fn notify_action(&mut self, _action: &Action) {}

    /// Notified when the game ends
    fn game_end(&mut self) {}
}

/// First free cell of the pending knight's band.
fn first_knight_placement(game: &Game) -> Option<Action> {
    game.knight_placements()
        .first()
        .copied()
        .map(Action::PlaceKnight)
}

/// Scoring cell `player` should box: an opponent normal piece one step from
/// its scoring row with that cell still empty.
pub fn box_threat(board: &Board, player: Player) -> Option<Position> {
    let opponent = player.opponent();
    board
        .pieces_on_board()
        .filter(|p| p.owner == opponent && p.rank == Rank::Normal && !p.is_king)
        .find_map(|p| {
            p.position
                .and_then(|at| at.offset(opponent.forward(), 0))
                .filter(|target| target.row == opponent.scoring_row())
                .filter(|&target| board.get(target) == Some(Cell::Empty))
        })
}

/// Picks uniformly among the legal actions.
pub struct RandomBot {
    name: String,
    rng: StdRng,
}

impl RandomBot {
    pub fn new(name: String) -> Self {
        Self::with_seed(name, 0)
    }

    pub fn with_seed(name: String, seed: u64) -> Self {
        RandomBot {
            name,
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Bot for RandomBot {
    fn name(&self) -> &str {
        &self.name
    }

    fn choose_action(&mut self, game: &Game, _time_limit: Duration) -> Option<Action> {
        match game.phase() {
            Phase::SetupBlueKnight | Phase::SetupRedKnight => game
                .knight_placements()
                .choose(&mut self.rng)
                .copied()
                .map(Action::PlaceKnight),
            Phase::Play => game
                .legal_moves()
                .choose(&mut self.rng)
                .cloned()
                .map(Action::Move),
            Phase::Terminal => None,
        }
    }
}

/// A simple greedy bot: best static evaluation one ply ahead
pub struct GreedyBot {
    name: String,
}

impl GreedyBot {
    pub fn new(name: String) -> Self {
        GreedyBot { name }
    }
}

impl Bot for GreedyBot {
    fn name(&self) -> &str {
        &self.name
    }

    fn choose_action(&mut self, game: &Game, _time_limit: Duration) -> Option<Action> {
        if game.phase() != Phase::Play {
            return first_knight_placement(game);
        }

        let board = game.board();
        let sign = match board.turn() {
            Player::Blue => 1,
            Player::Red => -1,
        };
        game.legal_moves()
            .into_iter()
            .max_by_key(|mv| sign * evaluate(&successor(board, mv)))
            .map(Action::Move)
    }
}

/// Blocks imminent scores with a box, otherwise searches `depth` plies with
/// alpha-beta.
pub struct AlphaBetaBot {
    name: String,
    depth: u8,
}

impl AlphaBetaBot {
    pub fn new(name: String, depth: u8) -> Self {
        AlphaBetaBot { name, depth }
    }
}

impl Bot for AlphaBetaBot {
    fn name(&self) -> &str {
        &self.name
    }

    fn choose_action(&mut self, game: &Game, _time_limit: Duration) -> Option<Action> {
        match game.phase() {
            Phase::SetupBlueKnight | Phase::SetupRedKnight => first_knight_placement(game),
            Phase::Play => {
                let board = game.board();
                let side = board.turn();

                if board.active_box(side).is_none() {
                    if let Some(target) = box_threat(board, side) {
                        debug!(player = %side, position = %target, "boxing a scoring threat");
                        return Some(Action::PlaceBox(target));
                    }
                }

                let (score, best) =
                    choose_move(board, self.depth, i32::MIN, i32::MAX, side == Player::Blue);
                debug!(player = %side, depth = self.depth, score, "search finished");
                best.map(Action::Move)
            }
            Phase::Terminal => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::GameConfig;

    fn pos(row: usize, col: usize) -> Position {
        Position::new(row, col)
    }

    fn play(game: &mut Game, bot: &mut dyn Bot) {
        let action = bot.choose_action(game, Duration::from_secs(5)).unwrap();
        game.apply_action(action).unwrap();
    }

    fn opened_game() -> Game {
        let mut game = Game::new(GameConfig {
            automated_player: None,
            ..GameConfig::default()
        });
        game.select(9, 1);
        game.select(2, 0);
        game
    }

    #[test]
    fn test_box_threat() {
        let mut board = Board::empty(Default::default());
        assert_eq!(box_threat(&board, Player::Blue), None);

        board.put(Player::Red, Rank::Normal, pos(10, 4)).unwrap();
        assert_eq!(box_threat(&board, Player::Blue), Some(pos(11, 4)));
        // Own pieces are not threats
        assert_eq!(box_threat(&board, Player::Red), None);

        board.put(Player::Blue, Rank::Normal, pos(11, 4)).unwrap();
        assert_eq!(box_threat(&board, Player::Blue), None);

        let mut board = Board::empty(Default::default());
        board.put(Player::Blue, Rank::Normal, pos(1, 7)).unwrap();
        assert_eq!(box_threat(&board, Player::Red), Some(pos(0, 7)));

        // Knights never score
        let mut board = Board::empty(Default::default());
        board.put(Player::Blue, Rank::Knight, pos(1, 7)).unwrap();
        assert_eq!(box_threat(&board, Player::Red), None);
    }

    #[test]
    fn test_random_bot_plays_whole_opening() {
        let mut game = Game::new(GameConfig {
            automated_player: None,
            ..GameConfig::default()
        });
        let mut bot = RandomBot::with_seed("random".to_string(), 7);

        play(&mut game, &mut bot);
        play(&mut game, &mut bot);
        assert_eq!(game.phase(), Phase::Play);

        for _ in 0..20 {
            if game.is_game_over() {
                break;
            }
            play(&mut game, &mut bot);
        }
    }

    #[test]
    fn test_random_bot_is_reproducible() {
        let game = opened_game();
        let mut first = RandomBot::with_seed("a".to_string(), 42);
        let mut second = RandomBot::with_seed("b".to_string(), 42);
        for _ in 0..5 {
            assert_eq!(
                first.choose_action(&game, Duration::from_secs(1)),
                second.choose_action(&game, Duration::from_secs(1))
            );
        }
    }

    #[test]
    fn test_greedy_bot_takes_captures() {
        let mut game = opened_game();
        // Red and Blue meet head on in column 6, Red stepping next to Blue last
        let steps = [
            ((3, 6), (4, 6)),
            ((9, 6), (8, 6)),
            ((4, 6), (5, 6)),
            ((8, 6), (7, 6)),
            ((5, 6), (6, 6)),
        ];
        for (from, to) in steps {
            let mover = game
                .legal_moves()
                .into_iter()
                .find(|mv| mv.from == pos(from.0, from.1) && mv.to == pos(to.0, to.1))
                .unwrap();
            assert!(!mover.is_capture());
            game.apply_move(&mover).unwrap();
        }
        assert_eq!(game.turn(), Player::Blue);

        let mut bot = GreedyBot::new("greedy".to_string());
        let Some(Action::Move(mv)) = bot.choose_action(&game, Duration::from_secs(1)) else {
            panic!("expected a move");
        };
        assert!(mv.is_capture());
    }

    #[test]
    fn test_alpha_beta_bot_in_each_phase() {
        let mut bot = AlphaBetaBot::new("alphabeta".to_string(), 2);
        let mut game = Game::new(GameConfig {
            automated_player: None,
            ..GameConfig::default()
        });

        assert_eq!(
            bot.choose_action(&game, Duration::from_secs(1)),
            Some(Action::PlaceKnight(pos(9, 1)))
        );
        play(&mut game, &mut bot);
        play(&mut game, &mut bot);
        assert_eq!(game.phase(), Phase::Play);

        assert!(matches!(
            bot.choose_action(&game, Duration::from_secs(1)),
            Some(Action::Move(_))
        ));

        game.check_winner_at(Duration::from_secs(1000));
        assert_eq!(bot.choose_action(&game, Duration::from_secs(1)), None);
    }
}
