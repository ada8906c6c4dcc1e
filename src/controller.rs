//! Match controller: setup placement, box placement, move application, turn
//! alternation and win evaluation, for both click-driven and automated play.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::bot::{AlphaBetaBot, Bot};
use crate::game::{
    ActiveBox, BOARD_SIZE, Board, Cell, GameError, GameResult, Move, PieceId, Player, Position,
    RuleSet,
};
use crate::movegen::{self, MoveSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    /// Red places Blue's knight in rows 9-11.
    SetupBlueKnight,
    /// Blue places Red's knight in rows 0-2.
    SetupRedKnight,
    Play,
    Terminal,
}

impl Phase {
    /// Owner of the knight being placed during setup.
    pub fn knight_to_place(&self) -> Option<Player> {
        match self {
            Phase::SetupBlueKnight => Some(Player::Blue),
            Phase::SetupRedKnight => Some(Player::Red),
            Phase::Play | Phase::Terminal => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub match_duration_secs: u64,
    /// Plies searched by the automated player.
    pub search_depth: u8,
    /// Side driven by `run_automated_turn`; `None` for pass-and-play.
    pub automated_player: Option<Player>,
    pub rules: RuleSet,
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig {
            match_duration_secs: 300,
            search_depth: 3,
            automated_player: Some(Player::Blue),
            rules: RuleSet::default(),
        }
    }
}

impl GameConfig {
    /// Parse a JSON config; missing fields keep their defaults.
    pub fn from_json(text: &str) -> Result<Self, GameError> {
        let config: GameConfig =
            serde_json::from_str(text).map_err(|e| GameError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), GameError> {
        if self.search_depth == 0 {
            return Err(GameError::InvalidConfig(
                "search_depth must be at least 1".to_string(),
            ));
        }
        if self.match_duration_secs == 0 {
            return Err(GameError::InvalidConfig(
                "match_duration_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn match_duration(&self) -> Duration {
        Duration::from_secs(self.match_duration_secs)
    }
}

/// One complete turn for whichever side is to act.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    PlaceKnight(Position),
    Move(Move),
    PlaceBox(Position),
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::PlaceKnight(pos) => write!(f, "knight @ {}", pos),
            Action::Move(mv) => write!(f, "{}", mv),
            Action::PlaceBox(pos) => write!(f, "box @ {}", pos),
        }
    }
}

/// Read-only snapshot for a renderer.
#[derive(Debug, Clone, Serialize)]
pub struct GameView {
    pub turn: Player,
    pub phase: Phase,
    pub winner: Option<GameResult>,
    pub red_points: u32,
    pub blue_points: u32,
    pub red_captures: u32,
    pub blue_captures: u32,
    pub selected: Option<Position>,
    pub valid_moves: Vec<Position>,
    pub active_boxes: Vec<ActiveBox>,
    pub placing_box: bool,
    pub elapsed_secs: u64,
    pub remaining_secs: u64,
}

impl GameView {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

#[derive(Debug, Clone)]
pub struct Game {
    board: Board,
    config: GameConfig,
    phase: Phase,
    selected: Option<PieceId>,
    valid_moves: MoveSet,
    placing_box: bool,
    started: Instant,
}

impl Game {
    pub fn new(config: GameConfig) -> Self {
        Game {
            board: Board::new(config.rules),
            config,
            phase: Phase::SetupBlueKnight,
            selected: None,
            valid_moves: MoveSet::new(),
            placing_box: false,
            started: Instant::now(),
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn turn(&self) -> Player {
        self.board.turn()
    }

    pub fn winner(&self) -> Option<GameResult> {
        self.board.result()
    }

    pub fn is_game_over(&self) -> bool {
        self.phase == Phase::Terminal
    }

    pub fn points(&self, player: Player) -> u32 {
        self.board.points(player)
    }

    pub fn captures(&self, player: Player) -> u32 {
        self.board.captures(player)
    }

    pub fn selected(&self) -> Option<PieceId> {
        self.selected
    }

    /// Destinations of the selected piece, with what each one captures.
    pub fn valid_moves(&self) -> &MoveSet {
        &self.valid_moves
    }

    pub fn valid_destinations(&self) -> Vec<Position> {
        self.valid_moves.keys().copied().collect()
    }

    pub fn active_boxes(&self) -> Vec<ActiveBox> {
        self.board.active_boxes()
    }

    pub fn is_placing_box(&self) -> bool {
        self.placing_box
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn remaining(&self) -> Duration {
        self.config.match_duration().saturating_sub(self.elapsed())
    }

    /// Every move the side to move may play. Empty outside the play phase.
    pub fn legal_moves(&self) -> Vec<Move> {
        if self.phase != Phase::Play {
            return Vec::new();
        }
        movegen::side_moves(&self.board, self.board.turn())
    }

    /// Free cells the pending knight may be dropped on, in row-major order.
    pub fn knight_placements(&self) -> Vec<Position> {
        let Some(owner) = self.phase.knight_to_place() else {
            return Vec::new();
        };
        let mut cells = Vec::new();
        for row in owner.home_band() {
            for col in 0..BOARD_SIZE {
                let pos = Position::new(row, col);
                if self.board.get(pos) == Some(Cell::Empty) {
                    cells.push(pos);
                }
            }
        }
        cells
    }

    pub fn view(&self) -> GameView {
        let elapsed = self.elapsed();
        GameView {
            turn: self.turn(),
            phase: self.phase,
            winner: self.winner(),
            red_points: self.points(Player::Red),
            blue_points: self.points(Player::Blue),
            red_captures: self.captures(Player::Red),
            blue_captures: self.captures(Player::Blue),
            selected: self.selected.and_then(|id| self.board.piece(id).position),
            valid_moves: self.valid_destinations(),
            active_boxes: self.active_boxes(),
            placing_box: self.placing_box,
            elapsed_secs: elapsed.as_secs(),
            remaining_secs: self
                .config
                .match_duration()
                .saturating_sub(elapsed)
                .as_secs(),
        }
    }

    /// Handle a click on a board cell. Returns whether the click did anything.
    pub fn select(&mut self, row: usize, col: usize) -> bool {
        let pos = Position::new(row, col);
        if !pos.in_bounds() {
            return false;
        }

        match self.phase {
            Phase::SetupBlueKnight | Phase::SetupRedKnight => self.place_knight(pos).is_ok(),
            Phase::Play => self.select_in_play(pos),
            Phase::Terminal => false,
        }
    }

    fn select_in_play(&mut self, pos: Position) -> bool {
        if self.placing_box && self.board.get(pos) == Some(Cell::Empty) {
            return self.place_box(pos).is_ok();
        }

        if let Some(id) = self.selected {
            if let Some(captures) = self.valid_moves.get(&pos).cloned() {
                if let Some(from) = self.board.piece(id).position {
                    return self.apply_move(&Move::new(id, from, pos, captures)).is_ok();
                }
            }
            self.clear_selection();
        }

        self.select_piece(pos)
    }

    fn select_piece(&mut self, pos: Position) -> bool {
        let id = match self.board.piece_at(pos) {
            Some(piece) if piece.can_be_moved_by(self.board.turn()) => piece.id,
            _ => return false,
        };
        self.selected = Some(id);
        self.valid_moves = movegen::selectable_moves(&self.board, id);
        true
    }

    fn clear_selection(&mut self) {
        self.selected = None;
        self.valid_moves.clear();
    }

    fn ensure_running(&self) -> Result<(), GameError> {
        if self.is_game_over() {
            Err(GameError::GameOver)
        } else {
            Ok(())
        }
    }

    fn ensure_play(&self) -> Result<(), GameError> {
        self.ensure_running()?;
        if self.phase != Phase::Play {
            return Err(GameError::WrongPhase);
        }
        Ok(())
    }

    /// Drop the pending knight. Each side places the *opponent's* knight
    /// inside the opponent's home band.
    pub fn place_knight(&mut self, pos: Position) -> Result<(), GameError> {
        self.ensure_running()?;
        let owner = self.phase.knight_to_place().ok_or(GameError::WrongPhase)?;
        if self.board.turn() != owner.opponent() {
            return Err(GameError::NotYourTurn);
        }
        if !pos.in_bounds() {
            return Err(GameError::OutOfBounds(pos));
        }
        let band = owner.home_band();
        if !band.contains(&pos.row) {
            return Err(GameError::IllegalMove(format!(
                "{} knight must be placed in rows {}-{}",
                owner,
                band.start,
                band.end - 1
            )));
        }

        let id = self
            .board
            .knight(owner)
            .map(|k| k.id)
            .ok_or(GameError::WrongPhase)?;
        self.board.place(id, pos)?;
        info!(knight = %owner, position = %pos, "knight placed");

        self.board.set_turn(owner);
        self.phase = match self.phase {
            Phase::SetupBlueKnight => Phase::SetupRedKnight,
            _ => Phase::Play,
        };
        self.check_winner();
        Ok(())
    }

    /// Arm the next click on an empty cell to place a box.
    pub fn request_box_placement(&mut self) -> Result<(), GameError> {
        self.ensure_play()?;
        let side = self.board.turn();
        if self.board.active_box(side).is_some() {
            return Err(GameError::BoxAlreadyActive(side));
        }
        self.placing_box = true;
        Ok(())
    }

    pub fn cancel_box_placement(&mut self) {
        self.placing_box = false;
    }

    /// Place a box for the side to move. Ends the turn.
    pub fn place_box(&mut self, pos: Position) -> Result<(), GameError> {
        self.ensure_play()?;
        let side = self.board.turn();
        if self.board.active_box(side).is_some() {
            return Err(GameError::BoxAlreadyActive(side));
        }
        self.board.add_box(pos, side)?;
        info!(player = %side, position = %pos, "box placed");

        self.placing_box = false;
        self.change_turn();
        self.check_winner();
        Ok(())
    }

    /// Play a move for the side to move. Ends the turn.
    pub fn apply_move(&mut self, mv: &Move) -> Result<(), GameError> {
        self.ensure_play()?;

        let piece = self
            .board
            .pieces()
            .get(mv.piece.0)
            .ok_or_else(|| GameError::NoPieceAt(mv.from))?;
        if piece.position != Some(mv.from) {
            return Err(GameError::NoPieceAt(mv.from));
        }
        if !piece.can_be_moved_by(self.board.turn()) {
            return Err(GameError::NotYourTurn);
        }

        let legal = movegen::selectable_moves(&self.board, mv.piece);
        if legal.get(&mv.to) != Some(&mv.captures) {
            return Err(GameError::IllegalMove(format!("Move {} is not legal", mv)));
        }

        debug!(player = %self.board.turn(), mv = %mv, "move applied");
        self.board.apply_move(mv);
        self.change_turn();
        self.check_winner();
        Ok(())
    }

    pub fn apply_action(&mut self, action: Action) -> Result<(), GameError> {
        match action {
            Action::PlaceKnight(pos) => self.place_knight(pos),
            Action::Move(mv) => self.apply_move(&mv),
            Action::PlaceBox(pos) => self.place_box(pos),
        }
    }

    /// End of turn: drop the selection, hand over the move and age the boxes.
    pub fn change_turn(&mut self) {
        self.clear_selection();
        self.placing_box = false;
        self.board.change_turn();
    }

    /// Evaluate the win conditions against the wall clock.
    pub fn check_winner(&mut self) -> Option<GameResult> {
        self.check_winner_at(self.elapsed())
    }

    /// Evaluate the win conditions as if `elapsed` had passed since the start.
    pub fn check_winner_at(&mut self, elapsed: Duration) -> Option<GameResult> {
        if self.phase == Phase::Terminal {
            return self.board.result();
        }

        let clock_expired = elapsed > self.config.match_duration();
        let result = self.board.check_result(clock_expired);
        if let Some(result) = result {
            self.phase = Phase::Terminal;
            self.clear_selection();
            self.placing_box = false;
            info!(
                ?result,
                red_points = self.board.points(Player::Red),
                blue_points = self.board.points(Player::Blue),
                clock_expired,
                "match decided"
            );
        }
        result
    }

    /// Start over with the same configuration and a fresh clock.
    pub fn reset(&mut self) {
        *self = Game::new(self.config.clone());
        info!("game reset");
    }

    pub fn is_automated_turn(&self) -> bool {
        !self.is_game_over() && self.config.automated_player == Some(self.board.turn())
    }

    /// Let the automated player act once. Returns whether the game changed.
    pub fn run_automated_turn(&mut self) -> bool {
        if !self.is_automated_turn() {
            return false;
        }

        let mut bot = AlphaBetaBot::new("automated".to_string(), self.config.search_depth);
        match bot.choose_action(self, self.remaining()) {
            Some(action) => {
                debug!(action = %action, "automated action");
                match self.apply_action(action) {
                    Ok(()) => true,
                    Err(err) => {
                        warn!(%err, "automated action rejected");
                        false
                    }
                }
            }
            None => {
                debug!(player = %self.board.turn(), "automated player has no move");
                self.check_winner().is_some()
            }
        }
    }
}

impl Default for Game {
    fn default() -> Self {
        Self::new(GameConfig::default())
    }
}
